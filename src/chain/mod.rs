//! Chain index access and the reorg walk algorithm.
//!
//! The node process owns block storage and validation; this module only
//! reads chain metadata through two narrow traits:
//!
//! - [`ChainView`] resolves a block hash to its [`BlockRecord`] (parent
//!   link, height, data-availability flag) and exposes the current tip.
//! - [`BlockStore`] resolves a block hash to its full [`BlockPayload`] at
//!   send time.
//!
//! Traversal is index-based over a handle table keyed by hash, never over
//! raw pointers into mutable chain structures. Reads may interleave with
//! concurrent chain mutation elsewhere in the node, so a computed walk is a
//! best-effort snapshot that may be stale by send time.
//!
//! [`walker`] holds the pure walk functions: common ancestor discovery and
//! the detach/attach sequence computation.

pub mod index;
pub mod walker;

pub use index::{BlockPayload, BlockRecord, BlockStore, ChainView, InMemoryChain};
