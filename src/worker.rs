//! Background worker draining the notification work queue.
//!
//! A single consumer task drains an unbounded FIFO fed by any number of
//! producer threads. The lifecycle is cooperative: [`interrupt`] stops
//! acceptance of new work but never cancels queued items; the consumer
//! observes the queue's closed signal only after every buffered item has
//! been processed, so [`join`] returns with the queue fully drained.
//!
//! Within one item, detach notifications strictly precede attach
//! notifications, each list in its computed order. Items are processed in
//! FIFO order relative to completed [`enqueue`] calls.
//!
//! Failure policy at this stage is best-effort: a block whose payload can
//! no longer be read (pruned since request validation) or whose transport
//! send fails loses that single notification, never the rest of the batch.
//!
//! [`enqueue`]: NotificationQueueWorker::enqueue
//! [`interrupt`]: NotificationQueueWorker::interrupt
//! [`join`]: NotificationQueueWorker::join

use alloy::primitives::B256;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::chain::BlockStore;
use crate::notify::{BlockNotification, Direction, NotificationTransport};

/// One unit of queued work: the ordered detach/attach lists of one
/// reorg-resolution request, plus its correlation token and the interested
/// subscriber set.
///
/// Built once by the request path, moved into the queue, moved out by the
/// worker, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Correlation token unique to the originating request
    pub reqtoken: String,
    /// Blocks leaving the active chain, child-before-parent order
    pub detach: Vec<B256>,
    /// Blocks entering the active chain, parent-before-child order
    pub attach: Vec<B256>,
    /// Subscriber ids interested in this item, frozen at enqueue time
    pub subscribers: BTreeSet<String>,
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "work(subscribers: ")?;
        let mut first = true;
        for id in &self.subscribers {
            if !first {
                write!(f, "|")?;
            }
            first = false;
            write!(f, "{id}")?;
        }
        write!(
            f,
            ", {} detaches, {} attaches)",
            self.detach.len(),
            self.attach.len()
        )
    }
}

/// Observable lifecycle state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// Accepting work, queue empty
    Idle,
    /// Accepting work, items pending
    Draining,
    /// No longer accepting work, finishing the queue
    Interrupted,
    /// Consumer task exited; queue was empty and interrupted
    Terminated,
}

impl WorkerStatus {
    /// Lowercase tag for health reporting.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Draining => "draining",
            Self::Interrupted => "interrupted",
            Self::Terminated => "terminated",
        }
    }
}

/// Single-consumer notification queue worker.
///
/// The sender slot and the channel are the only shared mutable state; the
/// slot's mutex establishes the interrupt race rule: an enqueue that takes
/// the lock after [`interrupt`] has returned is dropped, one that took it
/// before is delivered and drained.
///
/// [`interrupt`]: Self::interrupt
pub struct NotificationQueueWorker {
    sender: Mutex<Option<mpsc::UnboundedSender<WorkItem>>>,
    pending: Arc<AtomicUsize>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationQueueWorker {
    /// Spawn the consumer task.
    ///
    /// `transport` may be absent when no transport is configured; the
    /// request path rejects scheduling in that case, so a queued item
    /// without a transport is unexpected and is dropped with a warning.
    #[must_use]
    pub fn spawn(
        store: Arc<dyn BlockStore>,
        transport: Option<Arc<dyn NotificationTransport>>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        let handle = tokio::spawn(run_loop(rx, store, transport, Arc::clone(&pending)));

        Self {
            sender: Mutex::new(Some(tx)),
            pending,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Queue one work item. Never blocks.
    ///
    /// If the worker is already interrupted the item is logged and silently
    /// dropped; scheduling is best-effort and this is not a caller error.
    pub fn enqueue(&self, item: WorkItem) {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);

        match guard.as_ref() {
            Some(tx) => {
                debug!(item = %item, "Enqueueing work item");
                self.pending.fetch_add(1, Ordering::SeqCst);
                if tx.send(item).is_err() {
                    // Consumer gone; nothing will drain this.
                    self.pending.fetch_sub(1, Ordering::SeqCst);
                    warn!("Work queue receiver dropped, item lost");
                }
            }
            None => {
                debug!(item = %item, "Not enqueueing work item, worker interrupted");
            }
        }
    }

    /// Stop accepting new work. One-shot and idempotent.
    ///
    /// Items already queued are unaffected; the consumer drains them and
    /// only then observes the closed channel and exits.
    pub fn interrupt(&self) {
        let mut guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);

        if guard.take().is_some() {
            info!("Notification worker interrupted, draining remaining queue");
        } else {
            debug!("Notification worker already interrupted");
        }
    }

    /// Wait for the consumer task to finish.
    ///
    /// Returns once the queue is fully drained and the task has exited.
    /// Call [`interrupt`](Self::interrupt) first, or this waits forever.
    pub async fn join(&self) {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!(error = %err, "Notification worker task failed");
            }
        }
    }

    /// Items accepted but not yet fully processed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Whether the worker still accepts new work.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Observable lifecycle state.
    #[must_use]
    pub fn status(&self) -> WorkerStatus {
        let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        let finished = handle.as_ref().map_or(true, JoinHandle::is_finished);

        if finished {
            WorkerStatus::Terminated
        } else if self.is_interrupted() {
            WorkerStatus::Interrupted
        } else if self.pending() > 0 {
            WorkerStatus::Draining
        } else {
            WorkerStatus::Idle
        }
    }
}

/// Consumer loop: pop, process, repeat; exit once the channel is closed
/// and drained.
async fn run_loop(
    mut rx: mpsc::UnboundedReceiver<WorkItem>,
    store: Arc<dyn BlockStore>,
    transport: Option<Arc<dyn NotificationTransport>>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(item) = rx.recv().await {
        debug!(item = %item, "Popped work item for processing");
        process_item(&item, store.as_ref(), transport.as_deref());
        pending.fetch_sub(1, Ordering::SeqCst);
        debug!(item = %item, "Finished processing work item");
    }

    info!("Work queue drained, notification worker terminating");
}

/// Emit all notifications of one item: detach order first, then attach
/// order. Runs outside any lock so producers stay unblocked.
fn process_item(
    item: &WorkItem,
    store: &dyn BlockStore,
    transport: Option<&dyn NotificationTransport>,
) {
    for hash in &item.detach {
        send_one(item, Direction::Detach, hash, store, transport);
    }
    for hash in &item.attach {
        send_one(item, Direction::Attach, hash, store, transport);
    }
}

/// Send a single (block, direction) notification, skipping on failure.
fn send_one(
    item: &WorkItem,
    direction: Direction,
    hash: &B256,
    store: &dyn BlockStore,
    transport: Option<&dyn NotificationTransport>,
) {
    let Some(transport) = transport else {
        warn!(block = %hash, "No transport configured, dropping notification");
        return;
    };

    let payload = match store.block_payload(hash) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(block = %hash, error = %err, "Reading block failed, skipping notification");
            return;
        }
    };

    let notification = BlockNotification {
        subscribers: item.subscribers.clone(),
        direction,
        reqtoken: item.reqtoken.clone(),
        payload,
    };

    if let Err(err) = transport.send(notification) {
        warn!(block = %hash, direction = %direction, error = %err, "Sending notification failed, skipping");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{BlockRecord, InMemoryChain};
    use crate::error::DispatchResult;
    use alloy::primitives::Bytes;
    use std::sync::Mutex as StdMutex;

    struct RecordingTransport {
        sent: StdMutex<Vec<BlockNotification>>,
    }

    impl RecordingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: StdMutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<BlockNotification> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl NotificationTransport for RecordingTransport {
        fn send(&self, notification: BlockNotification) -> DispatchResult<()> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notification);
            Ok(())
        }
    }

    fn h(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    fn chain_with_blocks(bytes: &[u8]) -> Arc<InMemoryChain> {
        let chain = InMemoryChain::new();
        let mut parent = None;
        for (height, &byte) in bytes.iter().enumerate() {
            chain.insert_block(
                BlockRecord::new(h(byte), parent, height as u64, true),
                Some(Bytes::from(vec![byte])),
            );
            parent = Some(h(byte));
        }
        Arc::new(chain)
    }

    fn item(token: &str, detach: Vec<B256>, attach: Vec<B256>) -> WorkItem {
        WorkItem {
            reqtoken: token.to_string(),
            detach,
            attach,
            subscribers: BTreeSet::from(["tetris".to_string()]),
        }
    }

    #[test]
    fn test_work_item_display() {
        let mut work = item("tok", vec![h(1)], vec![h(2), h(3)]);
        work.subscribers.insert("chess".to_string());

        assert_eq!(
            work.to_string(),
            "work(subscribers: chess|tetris, 1 detaches, 2 attaches)"
        );
    }

    #[tokio::test]
    async fn test_detach_precedes_attach_within_item() {
        let chain = chain_with_blocks(&[0, 1, 2, 3]);
        let transport = RecordingTransport::new();
        let worker = NotificationQueueWorker::spawn(chain, Some(transport.clone()));

        worker.enqueue(item("tok", vec![h(3)], vec![h(1), h(2)]));
        worker.interrupt();
        worker.join().await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].direction, Direction::Detach);
        assert_eq!(sent[0].payload.hash, h(3));
        assert_eq!(sent[1].direction, Direction::Attach);
        assert_eq!(sent[1].payload.hash, h(1));
        assert_eq!(sent[2].direction, Direction::Attach);
        assert_eq!(sent[2].payload.hash, h(2));
    }

    #[tokio::test]
    async fn test_missing_payload_skips_single_notification() {
        let chain = chain_with_blocks(&[0, 1, 2]);
        // Metadata survives but the data is gone, as after a prune.
        chain.prune_payload(&h(1));

        let transport = RecordingTransport::new();
        let worker = NotificationQueueWorker::spawn(chain, Some(transport.clone()));

        worker.enqueue(item("tok", vec![], vec![h(1), h(2)]));
        worker.interrupt();
        worker.join().await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload.hash, h(2));
    }

    #[tokio::test]
    async fn test_enqueue_after_interrupt_is_dropped() {
        let chain = chain_with_blocks(&[0, 1]);
        let transport = RecordingTransport::new();
        let worker = NotificationQueueWorker::spawn(chain, Some(transport.clone()));

        worker.interrupt();
        worker.enqueue(item("tok", vec![h(1)], vec![]));
        worker.join().await;

        assert!(transport.sent().is_empty());
        assert_eq!(worker.pending(), 0);
    }

    #[tokio::test]
    async fn test_interrupt_is_idempotent() {
        let chain = chain_with_blocks(&[0]);
        let worker = NotificationQueueWorker::spawn(chain, None);

        worker.interrupt();
        worker.interrupt();
        worker.join().await;

        assert!(worker.is_interrupted());
        assert_eq!(worker.status(), WorkerStatus::Terminated);
    }

    #[tokio::test]
    async fn test_status_reflects_lifecycle() {
        let chain = chain_with_blocks(&[0]);
        let worker = NotificationQueueWorker::spawn(chain, None);

        assert_eq!(worker.status(), WorkerStatus::Idle);

        worker.interrupt();
        worker.join().await;
        assert_eq!(worker.status(), WorkerStatus::Terminated);
    }
}
