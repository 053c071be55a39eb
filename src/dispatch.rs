//! The request surface: schedule reorg updates, list and modify
//! tracked subscribers.
//!
//! `schedule_updates` is synchronous and fail-fast: both block references
//! are resolved, data availability is checked for every block on the walk,
//! and only then is a [`WorkItem`] queued. The call returns immediately
//! with a summary; actual notification delivery happens asynchronously in
//! the worker.

use alloy::primitives::{hex, B256};
use rand::RngCore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::chain::{walker, BlockStore, ChainView};
use crate::error::{DispatchError, DispatchResult};
use crate::notify::NotificationTransport;
use crate::registry::SubscriberRegistry;
use crate::worker::{NotificationQueueWorker, WorkItem};

/// Result of a successful `schedule_updates` call.
///
/// Delivery is asynchronous; the counts describe what was queued, not what
/// was (or will be) delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSummary {
    /// Target block the notifications walk toward
    pub to_block: B256,
    /// Common ancestor used for the walk
    pub ancestor: B256,
    /// Correlation token set on every notification of this request
    pub reqtoken: String,
    /// Number of detach notifications queued
    pub detach_count: usize,
    /// Number of attach notifications queued
    pub attach_count: usize,
}

/// Owns the dispatcher core: chain access, the subscriber registry, the
/// optional transport, and the queue worker.
///
/// Explicitly owned, not a global: create it at process start, call
/// [`shutdown`](Self::shutdown) at process end.
pub struct Dispatcher {
    chain: Arc<dyn ChainView>,
    registry: SubscriberRegistry,
    transport: Option<Arc<dyn NotificationTransport>>,
    worker: NotificationQueueWorker,
}

impl Dispatcher {
    /// Create a dispatcher and spawn its queue worker.
    #[must_use]
    pub fn new(
        chain: Arc<dyn ChainView>,
        store: Arc<dyn BlockStore>,
        registry: SubscriberRegistry,
        transport: Option<Arc<dyn NotificationTransport>>,
    ) -> Self {
        let worker = NotificationQueueWorker::spawn(store, transport.clone());

        Self {
            chain,
            registry,
            transport,
            worker,
        }
    }

    /// Schedule on-demand detach/attach notifications for one subscriber.
    ///
    /// `to_block` defaults to the current chain tip. On success a work item
    /// is queued and this returns immediately; the notifications are
    /// emitted later by the worker, all carrying the returned correlation
    /// token.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::TransportUnavailable`] if no transport is
    ///   configured (checked first; nothing is queued).
    /// - [`DispatchError::BlockNotFound`] if either reference does not
    ///   resolve.
    /// - [`DispatchError::DataUnavailable`] if either reference, or any
    ///   block on the walk, lacks its data flag.
    /// - [`DispatchError::InvariantViolation`] if the two references share
    ///   no ancestor (broken chain state).
    pub fn schedule_updates(
        &self,
        subscriber_id: &str,
        from_block: B256,
        to_block: Option<B256>,
    ) -> DispatchResult<ScheduleSummary> {
        if self.transport.is_none() {
            return Err(DispatchError::transport_unavailable(
                "no notification transport is configured",
            ));
        }

        let to_hash = match to_block {
            Some(hash) => hash,
            None => {
                self.chain
                    .tip()
                    .ok_or_else(|| DispatchError::invariant("chain index has no tip"))?
                    .hash
            }
        };

        let from = self
            .chain
            .lookup(&from_block)
            .ok_or_else(|| DispatchError::block_not_found("fromblock not found"))?;
        let to = self
            .chain
            .lookup(&to_hash)
            .ok_or_else(|| DispatchError::block_not_found("toblock not found"))?;

        if !from.data_available {
            return Err(DispatchError::data_unavailable("fromblock has no data"));
        }
        if !to.data_available {
            return Err(DispatchError::data_unavailable("toblock has no data"));
        }

        let chain = self.chain.as_ref();
        let ancestor = walker::common_ancestor(chain, &from.hash, &to.hash)?;
        let detach = walker::walk_to_ancestor(chain, &from.hash, &ancestor.hash)?;
        let attach = walker::attach_sequence(chain, &to.hash, &ancestor.hash)?;

        let reqtoken = new_reqtoken();
        let item = WorkItem {
            reqtoken: reqtoken.clone(),
            detach,
            attach,
            subscribers: BTreeSet::from([subscriber_id.to_string()]),
        };

        let summary = ScheduleSummary {
            to_block: to.hash,
            ancestor: ancestor.hash,
            reqtoken,
            detach_count: item.detach.len(),
            attach_count: item.attach.len(),
        };

        info!(
            subscriber = %subscriber_id,
            from = %from.hash,
            to = %to.hash,
            ancestor = %ancestor.hash,
            detach = summary.detach_count,
            attach = summary.attach_count,
            reqtoken = %summary.reqtoken,
            "Scheduling reorg update notifications"
        );

        self.worker.enqueue(item);

        Ok(summary)
    }

    /// Snapshot the currently tracked subscriber ids.
    #[must_use]
    pub fn list_subscribers(&self) -> BTreeSet<String> {
        self.registry.list()
    }

    /// Add or remove a tracked subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidCommand`] for any command other than
    /// `add` or `remove`.
    pub fn modify_subscribers(&self, command: &str, subscriber_id: &str) -> DispatchResult<()> {
        match command {
            "add" => {
                self.registry.add(subscriber_id);
                Ok(())
            }
            "remove" => {
                self.registry.remove(subscriber_id);
                Ok(())
            }
            other => Err(DispatchError::invalid_command(format!(
                "invalid command for subscribers: {other}"
            ))),
        }
    }

    /// The subscriber registry.
    #[must_use]
    pub const fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// The queue worker, e.g. for health reporting.
    #[must_use]
    pub const fn worker(&self) -> &NotificationQueueWorker {
        &self.worker
    }

    /// Interrupt the worker and wait for the queue to drain.
    ///
    /// Items queued before this call are still fully processed.
    pub async fn shutdown(&self) {
        debug!("Dispatcher shutting down, interrupting worker");
        self.worker.interrupt();
        self.worker.join().await;
    }
}

/// Generate a fresh correlation token: 16 random bytes, hex-encoded.
fn new_reqtoken() -> String {
    let mut token = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut token);
    hex::encode(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{BlockRecord, InMemoryChain};
    use crate::notify::BroadcastTransport;
    use alloy::primitives::Bytes;

    fn h(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    /// Genesis(0)–A(1)–B(2)–C(3), plus branch B–D(4)–E(5); tip is E.
    fn reorg_chain() -> Arc<InMemoryChain> {
        let chain = InMemoryChain::new();
        chain.insert_block(BlockRecord::new(h(0), None, 0, true), Some(Bytes::new()));
        for (byte, parent, height) in [(1, 0, 1), (2, 1, 2), (3, 2, 3), (4, 2, 3), (5, 4, 4)] {
            chain.insert_block(
                BlockRecord::new(h(byte), Some(h(parent)), height, true),
                Some(Bytes::from(vec![byte])),
            );
        }
        chain.set_tip(h(5));
        Arc::new(chain)
    }

    fn dispatcher(chain: &Arc<InMemoryChain>) -> Dispatcher {
        Dispatcher::new(
            Arc::clone(chain) as Arc<dyn ChainView>,
            Arc::clone(chain) as Arc<dyn BlockStore>,
            SubscriberRegistry::new(),
            Some(Arc::new(BroadcastTransport::new(16))),
        )
    }

    #[tokio::test]
    async fn test_schedule_counts_and_ancestor() {
        let chain = reorg_chain();
        let dispatcher = dispatcher(&chain);

        let summary = dispatcher.schedule_updates("tetris", h(3), Some(h(5)));
        assert!(summary.is_ok());
        if let Ok(summary) = summary {
            assert_eq!(summary.ancestor, h(2));
            assert_eq!(summary.to_block, h(5));
            assert_eq!(summary.detach_count, 1);
            assert_eq!(summary.attach_count, 2);
            assert_eq!(summary.reqtoken.len(), 32);
        }

        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_to_block_defaults_to_tip() {
        let chain = reorg_chain();
        let dispatcher = dispatcher(&chain);

        let summary = dispatcher.schedule_updates("tetris", h(3), None);
        assert_eq!(summary.map(|s| s.to_block).ok(), Some(h(5)));

        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_from_block_rejected() {
        let chain = reorg_chain();
        let dispatcher = dispatcher(&chain);

        let err = dispatcher.schedule_updates("tetris", h(9), None);
        assert!(matches!(err, Err(DispatchError::BlockNotFound { .. })));

        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_transport_rejected_before_queuing() {
        let chain = reorg_chain();
        let dispatcher = Dispatcher::new(
            Arc::clone(&chain) as Arc<dyn ChainView>,
            Arc::clone(&chain) as Arc<dyn BlockStore>,
            SubscriberRegistry::new(),
            None,
        );

        let err = dispatcher.schedule_updates("tetris", h(3), None);
        assert!(matches!(
            err,
            Err(DispatchError::TransportUnavailable { .. })
        ));
        assert_eq!(dispatcher.worker().pending(), 0);

        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_modify_subscribers_commands() {
        let chain = reorg_chain();
        let dispatcher = dispatcher(&chain);

        assert!(dispatcher.modify_subscribers("add", "tetris").is_ok());
        assert!(dispatcher.list_subscribers().contains("tetris"));

        assert!(dispatcher.modify_subscribers("remove", "tetris").is_ok());
        assert!(dispatcher.list_subscribers().is_empty());

        let err = dispatcher.modify_subscribers("purge", "tetris");
        assert!(matches!(err, Err(DispatchError::InvalidCommand { .. })));

        dispatcher.shutdown().await;
    }

    #[test]
    fn test_reqtokens_are_unique() {
        let a = new_reqtoken();
        let b = new_reqtoken();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
