//! Block records and the in-memory chain index.

use alloy::primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use crate::error::{DispatchError, DispatchResult};

/// Metadata record for one block in the chain index.
///
/// Stores the minimal information the walker needs:
/// - Block hash and parent hash (to follow the chain backward)
/// - Height (to equalize walks from two tips)
/// - Data-availability flag (checked before any notification is queued)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Block hash
    pub hash: B256,

    /// Parent block hash; `None` only at genesis
    pub parent_hash: Option<B256>,

    /// Block height
    pub height: u64,

    /// Whether the full block data is available for reading
    pub data_available: bool,
}

impl BlockRecord {
    /// Create a new block record.
    #[must_use]
    pub const fn new(
        hash: B256,
        parent_hash: Option<B256>,
        height: u64,
        data_available: bool,
    ) -> Self {
        Self {
            hash,
            parent_hash,
            height,
            data_available,
        }
    }
}

/// Full block content resolved from storage at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPayload {
    /// Block hash
    pub hash: B256,

    /// Parent block hash; `None` only at genesis
    pub parent_hash: Option<B256>,

    /// Block height
    pub height: u64,

    /// Raw block data
    pub data: Bytes,
}

/// Read-only view of the chain index.
///
/// Lookups are per-block; no chain-wide lock is held across a traversal.
pub trait ChainView: Send + Sync {
    /// Resolve a block hash to its record, if the index knows it.
    fn lookup(&self, hash: &B256) -> Option<BlockRecord>;

    /// The current tip of the active chain, if any block exists.
    fn tip(&self) -> Option<BlockRecord>;
}

/// Read access to full block data, used by the dispatch worker.
pub trait BlockStore: Send + Sync {
    /// Resolve a block hash to its full payload.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::BlockNotFound`] for an unknown hash and
    /// [`DispatchError::DataUnavailable`] when the block's data has been
    /// pruned since the request was validated.
    fn block_payload(&self, hash: &B256) -> DispatchResult<BlockPayload>;
}

/// One entry of a JSON chain seed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChainFileEntry {
    hash: B256,
    #[serde(default)]
    parent_hash: Option<B256>,
    height: u64,
    #[serde(default)]
    data: Bytes,
}

struct StoredBlock {
    record: BlockRecord,
    payload: Option<Bytes>,
}

struct Inner {
    blocks: HashMap<B256, StoredBlock>,
    tip: Option<B256>,
}

/// In-memory chain index: an arena of block records keyed by hash.
///
/// Backs both [`ChainView`] and [`BlockStore`]. The node (or, in the demo
/// server, the seed file) populates it; the dispatcher core only reads.
pub struct InMemoryChain {
    inner: RwLock<Inner>,
}

impl InMemoryChain {
    /// Create an empty chain index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                blocks: HashMap::new(),
                tip: None,
            }),
        }
    }

    /// Create a chain index holding only a genesis block.
    ///
    /// The genesis hash is the all-zero hash; its payload is empty.
    #[must_use]
    pub fn with_genesis() -> Self {
        let chain = Self::new();
        chain.insert_block(
            BlockRecord::new(B256::ZERO, None, 0, true),
            Some(Bytes::new()),
        );
        chain
    }

    /// Load a chain index from a JSON seed file.
    ///
    /// The file holds an array of `{hash, parent_hash, height, data}`
    /// entries; the last entry becomes the tip.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError::ConfigError`] if the file cannot be read
    /// or parsed.
    pub fn from_file(path: &Path) -> DispatchResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DispatchError::config(
                format!("failed to read chain file {}", path.display()),
                Some(Box::new(e)),
            )
        })?;

        let entries: Vec<ChainFileEntry> = serde_json::from_str(&raw).map_err(|e| {
            DispatchError::config(
                format!("failed to parse chain file {}", path.display()),
                Some(Box::new(e)),
            )
        })?;

        let chain = Self::new();
        for entry in entries {
            chain.insert_block(
                BlockRecord::new(entry.hash, entry.parent_hash, entry.height, true),
                Some(entry.data),
            );
        }

        debug!(
            blocks = chain.len(),
            tip = ?chain.tip().map(|r| r.hash),
            "Loaded chain index from file"
        );

        Ok(chain)
    }

    /// Insert a block and make it the tip.
    ///
    /// A block inserted without a payload has metadata only; reading it
    /// through [`BlockStore`] fails, mirroring a block pruned from disk.
    pub fn insert_block(&self, record: BlockRecord, payload: Option<Bytes>) {
        let mut inner = self.write();
        let hash = record.hash;
        inner.blocks.insert(hash, StoredBlock { record, payload });
        inner.tip = Some(hash);
    }

    /// Move the tip to a known block.
    ///
    /// Ignored (with a debug log) if the hash is unknown.
    pub fn set_tip(&self, hash: B256) {
        let mut inner = self.write();
        if inner.blocks.contains_key(&hash) {
            inner.tip = Some(hash);
        } else {
            debug!(block = %hash, "set_tip ignored for unknown block");
        }
    }

    /// Flip the data-availability flag of a known block.
    pub fn set_data_available(&self, hash: &B256, available: bool) {
        let mut inner = self.write();
        if let Some(stored) = inner.blocks.get_mut(hash) {
            stored.record.data_available = available;
        }
    }

    /// Drop a block's payload while keeping its metadata.
    ///
    /// Models a block pruned from disk between request validation and the
    /// worker's send.
    pub fn prune_payload(&self, hash: &B256) {
        let mut inner = self.write();
        if let Some(stored) = inner.blocks.get_mut(hash) {
            stored.payload = None;
        }
    }

    /// Number of blocks in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().blocks.len()
    }

    /// Whether the index holds no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().blocks.is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainView for InMemoryChain {
    fn lookup(&self, hash: &B256) -> Option<BlockRecord> {
        self.read().blocks.get(hash).map(|s| s.record.clone())
    }

    fn tip(&self) -> Option<BlockRecord> {
        let inner = self.read();
        inner
            .tip
            .and_then(|hash| inner.blocks.get(&hash))
            .map(|s| s.record.clone())
    }
}

impl BlockStore for InMemoryChain {
    fn block_payload(&self, hash: &B256) -> DispatchResult<BlockPayload> {
        let inner = self.read();
        let stored = inner
            .blocks
            .get(hash)
            .ok_or_else(|| DispatchError::block_not_found(format!("block {hash} not indexed")))?;

        let data = stored.payload.clone().ok_or_else(|| {
            DispatchError::data_unavailable(format!("block {hash} has no stored data"))
        })?;

        Ok(BlockPayload {
            hash: stored.record.hash,
            parent_hash: stored.record.parent_hash,
            height: stored.record.height,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    #[test]
    fn test_insert_and_lookup() {
        let chain = InMemoryChain::with_genesis();
        chain.insert_block(
            BlockRecord::new(h(1), Some(B256::ZERO), 1, true),
            Some(Bytes::from_static(b"block-1")),
        );

        let record = chain.lookup(&h(1));
        assert!(record.is_some());
        if let Some(record) = record {
            assert_eq!(record.height, 1);
            assert_eq!(record.parent_hash, Some(B256::ZERO));
        }

        assert!(chain.lookup(&h(9)).is_none());
    }

    #[test]
    fn test_tip_follows_insertion() {
        let chain = InMemoryChain::with_genesis();
        assert_eq!(chain.tip().map(|r| r.hash), Some(B256::ZERO));

        chain.insert_block(BlockRecord::new(h(1), Some(B256::ZERO), 1, true), None);
        assert_eq!(chain.tip().map(|r| r.hash), Some(h(1)));

        // Moving the tip back models a reorg resolved elsewhere in the node.
        chain.set_tip(B256::ZERO);
        assert_eq!(chain.tip().map(|r| r.hash), Some(B256::ZERO));
    }

    #[test]
    fn test_set_tip_unknown_block_ignored() {
        let chain = InMemoryChain::with_genesis();
        chain.set_tip(h(7));
        assert_eq!(chain.tip().map(|r| r.hash), Some(B256::ZERO));
    }

    #[test]
    fn test_payload_resolution() {
        let chain = InMemoryChain::with_genesis();
        chain.insert_block(
            BlockRecord::new(h(1), Some(B256::ZERO), 1, true),
            Some(Bytes::from_static(b"payload")),
        );

        let payload = chain.block_payload(&h(1));
        assert!(payload.is_ok());
        if let Ok(payload) = payload {
            assert_eq!(payload.data.as_ref(), b"payload");
        }
    }

    #[test]
    fn test_pruned_payload_fails_resolution() {
        let chain = InMemoryChain::with_genesis();
        chain.insert_block(
            BlockRecord::new(h(1), Some(B256::ZERO), 1, true),
            Some(Bytes::from_static(b"payload")),
        );
        chain.prune_payload(&h(1));

        let err = chain.block_payload(&h(1));
        assert!(matches!(err, Err(DispatchError::DataUnavailable { .. })));
    }

    #[test]
    fn test_unknown_payload_is_not_found() {
        let chain = InMemoryChain::new();
        let err = chain.block_payload(&h(1));
        assert!(matches!(err, Err(DispatchError::BlockNotFound { .. })));
    }

    #[test]
    fn test_data_available_flag_toggle() {
        let chain = InMemoryChain::with_genesis();
        chain.set_data_available(&B256::ZERO, false);

        let record = chain.lookup(&B256::ZERO);
        assert_eq!(record.map(|r| r.data_available), Some(false));
    }
}
