//! The reorg walk: common ancestor discovery and detach/attach sequences.
//!
//! Given an old tip and a new tip that share a root, a reorg is described by
//! three pieces: their common ancestor, the blocks to detach (old tip down
//! to the ancestor, exclusive, child before parent) and the blocks to
//! attach (ancestor up to the new tip, exclusive of the ancestor, parent
//! before child). The attach list is just the detach walk from the new tip,
//! reversed.
//!
//! All functions here are pure reads over a [`ChainView`]; data-availability
//! is checked per visited block so a bad request is rejected before any
//! work is queued.

use alloy::primitives::B256;
use tracing::debug;

use crate::chain::index::{BlockRecord, ChainView};
use crate::error::{DispatchError, DispatchResult};

/// Find the deepest common ancestor of two block references.
///
/// Walks the deeper reference up to the shallower one's height, then steps
/// both in lock-step until they meet. The chain is assumed to form a single
/// rooted tree, so an ancestor always exists for well-formed state.
///
/// # Errors
///
/// Returns [`DispatchError::InvariantViolation`] if either reference is
/// unknown to the index, a parent link is missing mid-walk, or the two
/// lineages run past their roots without meeting. These indicate broken
/// chain state (e.g. a store reset), not a routine request failure.
pub fn common_ancestor(
    chain: &dyn ChainView,
    a: &B256,
    b: &B256,
) -> DispatchResult<BlockRecord> {
    let mut a_rec = resolve(chain, a)?;
    let mut b_rec = resolve(chain, b)?;

    // Equalize heights.
    while a_rec.height > b_rec.height {
        a_rec = parent_of(chain, &a_rec)?;
    }
    while b_rec.height > a_rec.height {
        b_rec = parent_of(chain, &b_rec)?;
    }

    // Walk both back until they meet.
    while a_rec.hash != b_rec.hash {
        a_rec = parent_of(chain, &a_rec)?;
        b_rec = parent_of(chain, &b_rec)?;
    }

    debug!(ancestor = %a_rec.hash, height = a_rec.height, "Common ancestor located");

    Ok(a_rec)
}

/// Walk from `from` back to `ancestor` (exclusive), collecting each visited
/// block hash in child-before-parent order.
///
/// Every visited block must have its data-available flag set; the check is
/// metadata-only and happens synchronously in the request path. If any
/// block fails it, the whole call aborts and no partial list is returned.
///
/// `from == ancestor` yields an empty sequence with zero iterations.
///
/// # Errors
///
/// Returns [`DispatchError::DataUnavailable`] if a visited block lacks its
/// data flag, and [`DispatchError::InvariantViolation`] if the walk runs
/// past the root without reaching `ancestor`.
pub fn walk_to_ancestor(
    chain: &dyn ChainView,
    from: &B256,
    ancestor: &B256,
) -> DispatchResult<Vec<B256>> {
    let mut sequence = Vec::new();
    let mut current = resolve(chain, from)?;

    while current.hash != *ancestor {
        if !current.data_available {
            return Err(DispatchError::data_unavailable(format!(
                "block {} on the walk has no data",
                current.hash
            )));
        }

        sequence.push(current.hash);
        current = parent_of(chain, &current)?;
    }

    Ok(sequence)
}

/// Compute the attach sequence: ancestor → `tip` order, ancestor excluded.
///
/// This is the same walk as [`walk_to_ancestor`] performed from the new
/// tip, reversed.
///
/// # Errors
///
/// Propagates the errors of [`walk_to_ancestor`].
pub fn attach_sequence(
    chain: &dyn ChainView,
    tip: &B256,
    ancestor: &B256,
) -> DispatchResult<Vec<B256>> {
    let mut sequence = walk_to_ancestor(chain, tip, ancestor)?;
    sequence.reverse();
    Ok(sequence)
}

fn resolve(chain: &dyn ChainView, hash: &B256) -> DispatchResult<BlockRecord> {
    chain.lookup(hash).ok_or_else(|| {
        DispatchError::invariant(format!("block {hash} missing from chain index"))
    })
}

fn parent_of(chain: &dyn ChainView, record: &BlockRecord) -> DispatchResult<BlockRecord> {
    let parent_hash = record.parent_hash.ok_or_else(|| {
        DispatchError::invariant(format!(
            "walk ran past the root at block {} without reaching the ancestor",
            record.hash
        ))
    })?;

    resolve(chain, &parent_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::index::InMemoryChain;
    use alloy::primitives::Bytes;

    fn h(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    fn add(chain: &InMemoryChain, byte: u8, parent: Option<u8>, height: u64) {
        chain.insert_block(
            BlockRecord::new(h(byte), parent.map(h), height, true),
            Some(Bytes::from(vec![byte])),
        );
    }

    /// Genesis(0)–A(1)–B(2) with branches B–C(3) and B–D(4)–E(5).
    fn forked_chain() -> InMemoryChain {
        let chain = InMemoryChain::new();
        chain.insert_block(BlockRecord::new(h(0), None, 0, true), Some(Bytes::new()));
        add(&chain, 1, Some(0), 1);
        add(&chain, 2, Some(1), 2);
        add(&chain, 3, Some(2), 3); // old branch: C
        add(&chain, 4, Some(2), 3); // new branch: D
        add(&chain, 5, Some(4), 4); // new branch: E
        chain
    }

    #[test]
    fn test_common_ancestor_across_fork() {
        let chain = forked_chain();
        let ancestor = common_ancestor(&chain, &h(3), &h(5));
        assert!(ancestor.is_ok());
        if let Ok(ancestor) = ancestor {
            assert_eq!(ancestor.hash, h(2));
            assert_eq!(ancestor.height, 2);
        }
    }

    #[test]
    fn test_common_ancestor_same_block() {
        let chain = forked_chain();
        let ancestor = common_ancestor(&chain, &h(3), &h(3));
        assert!(ancestor.is_ok());
        if let Ok(ancestor) = ancestor {
            assert_eq!(ancestor.hash, h(3));
        }
    }

    #[test]
    fn test_common_ancestor_one_is_ancestor_of_other() {
        let chain = forked_chain();
        let ancestor = common_ancestor(&chain, &h(1), &h(5));
        assert!(ancestor.is_ok());
        if let Ok(ancestor) = ancestor {
            assert_eq!(ancestor.hash, h(1));
        }
    }

    #[test]
    fn test_disconnected_roots_violate_invariant() {
        let chain = forked_chain();
        // A second root with its own lineage, never joining the first tree.
        chain.insert_block(BlockRecord::new(h(9), None, 0, true), None);

        let err = common_ancestor(&chain, &h(3), &h(9));
        assert!(matches!(err, Err(DispatchError::InvariantViolation { .. })));
    }

    #[test]
    fn test_walk_orders_child_before_parent() {
        let chain = forked_chain();
        let detach = walk_to_ancestor(&chain, &h(5), &h(2));
        assert_eq!(detach.ok(), Some(vec![h(5), h(4)]));
    }

    #[test]
    fn test_walk_from_ancestor_is_empty() {
        let chain = forked_chain();
        let detach = walk_to_ancestor(&chain, &h(2), &h(2));
        assert_eq!(detach.ok(), Some(Vec::new()));
    }

    #[test]
    fn test_attach_sequence_is_reversed_walk() {
        let chain = forked_chain();
        let attach = attach_sequence(&chain, &h(5), &h(2));
        assert_eq!(attach.ok(), Some(vec![h(4), h(5)]));
    }

    #[test]
    fn test_walk_rejects_unavailable_block() {
        let chain = forked_chain();
        chain.set_data_available(&h(4), false);

        let err = walk_to_ancestor(&chain, &h(5), &h(2));
        assert!(matches!(err, Err(DispatchError::DataUnavailable { .. })));
    }

    #[test]
    fn test_walk_past_root_violates_invariant() {
        let chain = forked_chain();
        // h(9) is not on the lineage of h(3), so the walk runs to the root.
        let err = walk_to_ancestor(&chain, &h(3), &h(9));
        assert!(matches!(err, Err(DispatchError::InvariantViolation { .. })));
    }
}
