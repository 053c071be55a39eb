//! Registry of tracked subscriber ids.
//!
//! The registry is a plain mutable set with idempotent add/remove and no
//! ordering guarantees beyond set semantics. It is read at request time;
//! the interested set captured into a work item is frozen at enqueue, so
//! later registry changes never retarget already-queued notifications.

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Mutable set of tracked subscriber ids.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    tracked: RwLock<BTreeSet<String>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with the given subscriber ids.
    #[must_use]
    pub fn with_subscribers<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tracked: RwLock::new(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Snapshot the currently tracked subscriber ids.
    #[must_use]
    pub fn list(&self) -> BTreeSet<String> {
        self.tracked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Add a subscriber id. Idempotent.
    pub fn add(&self, id: impl Into<String>) {
        let id = id.into();
        let inserted = self
            .tracked
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone());
        debug!(subscriber = %id, inserted, "Added tracked subscriber");
    }

    /// Remove a subscriber id. Idempotent.
    pub fn remove(&self, id: &str) {
        let removed = self
            .tracked
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        debug!(subscriber = %id, removed, "Removed tracked subscriber");
    }

    /// Whether the given id is currently tracked.
    #[must_use]
    pub fn is_tracked(&self, id: &str) -> bool {
        self.tracked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_list() {
        let registry = SubscriberRegistry::new();
        registry.add("tetris");
        registry.add("chess");

        let listed = registry.list();
        assert_eq!(listed.len(), 2);
        assert!(listed.contains("tetris"));
        assert!(listed.contains("chess"));
    }

    #[test]
    fn test_add_is_idempotent() {
        let registry = SubscriberRegistry::new();
        registry.add("tetris");
        registry.add("tetris");
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SubscriberRegistry::with_subscribers(["tetris"]);
        registry.remove("tetris");
        registry.remove("tetris");
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_is_tracked() {
        let registry = SubscriberRegistry::with_subscribers(["tetris"]);
        assert!(registry.is_tracked("tetris"));
        assert!(!registry.is_tracked("chess"));
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let registry = SubscriberRegistry::with_subscribers(["tetris"]);
        let snapshot = registry.list();
        registry.add("chess");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.list().len(), 2);
    }
}
