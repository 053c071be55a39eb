//! # Reorg Notification Dispatcher
//!
//! On-demand detach/attach notification dispatcher for blockchain
//! subscribers, built on an in-process chain index.
//!
//! When a subscriber falls behind or the chain reorganizes, it asks the
//! dispatcher to replay the path from the block it currently sits on to a
//! target block. The dispatcher resolves both references, finds their
//! common ancestor, and queues an ordered sequence of *detach*
//! notifications (current block back to the ancestor) followed by *attach*
//! notifications (ancestor forward to the target). A single background
//! worker drains the queue and hands each block off to the notification
//! transport.
//!
//! ## Features
//!
//! - **Hash-keyed chain index** with height-equalizing ancestor search
//! - **Fail-fast scheduling**: block resolution and data availability are
//!   checked before anything is queued
//! - **Single FIFO queue worker** with drain-on-shutdown semantics
//! - **Correlation tokens** (16 random bytes, hex) tying every
//!   notification back to the request that scheduled it
//! - **HTTP + WebSocket API** with OpenAPI documentation
//!
//! ## Architecture
//!
//! 1. **Config Layer** ([`config`]) - Environment variable loading
//! 2. **Chain Layer** ([`chain`]) - Block index and reorg walker
//! 3. **Registry Layer** ([`registry`]) - Tracked subscriber set
//! 4. **Dispatch Layer** ([`dispatch`]) - Request surface and scheduling
//! 5. **Worker Layer** ([`worker`]) - Background notification queue
//! 6. **API Layer** ([`api`]) - Axum HTTP server and WebSocket streaming
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the service
//! cargo run --release -- serve --chain-file ./chain.json
//!
//! # One-shot reorg inspection
//! cargo run --release -- walk --chain-file ./chain.json --from 0x03...
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`error::DispatchResult<T>`](error::DispatchResult)
//! for consistent error propagation:
//!
//! ```rust
//! use reorg_dispatch::error::{DispatchError, DispatchResult};
//!
//! fn example() -> DispatchResult<()> {
//!     // Operations that can fail return DispatchResult
//!     Ok(())
//! }
//! ```
//!
//! Request-time failures (unknown block, pruned data, missing transport)
//! are fail-fast and leave the queue untouched; dispatch-time failures are
//! logged and skipped so one bad block never stalls the queue.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod app_state;
pub mod chain;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod notify;
pub mod observability;
pub mod registry;
pub mod worker;
