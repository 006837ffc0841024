//! Visit handling
//!
//! Ties a [`PatternStore`] and a [`VisitFilter`] together for the host: each
//! visit is decided against exactly one snapshot of the state, and purges are
//! delegated to a [`HistoryPurger`] supplied by the host.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::events::StoreEvent;
use crate::filter::{Decision, VisitFilter};
use crate::store::PatternStore;

/// Host collaborator that deletes history entries
#[cfg_attr(test, mockall::automock)]
pub trait HistoryPurger: Send + Sync {
    /// Remove every retained history entry for `address`
    fn purge(&self, address: &str) -> Result<()>;
}

/// Decides visits and forwards purges
pub struct PurgeEngine {
    store: Arc<PatternStore>,
    filter: VisitFilter,
    purger: Arc<dyn HistoryPurger>,
    updates: Mutex<broadcast::Receiver<StoreEvent>>,
}

impl PurgeEngine {
    /// Create an engine; it subscribes to `store` change events
    pub fn new(store: Arc<PatternStore>, filter: VisitFilter, purger: Arc<dyn HistoryPurger>) -> Self {
        let updates = Mutex::new(store.subscribe());
        Self {
            store,
            filter,
            purger,
            updates,
        }
    }

    /// Store the engine reads from
    pub fn store(&self) -> &Arc<PatternStore> {
        &self.store
    }

    /// Filter the engine decides with
    pub fn filter(&self) -> &VisitFilter {
        &self.filter
    }

    /// Decide `address` and purge it if required
    ///
    /// A purger failure is returned to the caller after the decision was made;
    /// nothing is retried.
    #[instrument(skip(self))]
    pub fn on_visit(&self, address: &str) -> Result<Decision> {
        let changed = self.drain_updates();
        let state = self.store.load()?;
        if changed {
            self.filter.retain_for(&state);
        }

        let decision = self.filter.decide(address, &state);
        if decision.purge {
            self.purger.purge(address)?;
            info!(address, mode = %state.mode, "Purged visit");
        } else {
            debug!(address, mode = %state.mode, "Visit retained");
        }
        Ok(decision)
    }

    /// Consume pending change events, reporting whether any arrived
    fn drain_updates(&self) -> bool {
        let mut updates = self.updates.lock();
        let mut changed = false;
        loop {
            match updates.try_recv() {
                Ok(StoreEvent::BlacklistUpdated) | Err(TryRecvError::Lagged(_)) => changed = true,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return changed,
            }
        }
    }
}

impl std::fmt::Debug for PurgeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurgeEngine")
            .field("store", &self.store)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::MemoryStorage;

    fn store_with(patterns: &str) -> Arc<PatternStore> {
        let store = Arc::new(PatternStore::new(Arc::new(MemoryStorage::new())));
        store.import_many(patterns).unwrap();
        store
    }

    #[test]
    fn test_purges_matching_visit() {
        let mut purger = MockHistoryPurger::new();
        purger
            .expect_purge()
            .withf(|address| address.to_string() == "https://evil.com/x")
            .times(1)
            .returning(|_| Ok(()));

        let engine = PurgeEngine::new(store_with("evil\\.com"), VisitFilter::new(), Arc::new(purger));
        assert!(engine.on_visit("https://evil.com/x").unwrap().purge);
    }

    #[test]
    fn test_retained_visit_not_forwarded() {
        let mut purger = MockHistoryPurger::new();
        purger.expect_purge().times(0);

        let engine = PurgeEngine::new(store_with("evil\\.com"), VisitFilter::new(), Arc::new(purger));
        assert!(!engine.on_visit("https://good.com/").unwrap().purge);
    }

    #[test]
    fn test_purger_failure_propagates() {
        let mut purger = MockHistoryPurger::new();
        purger
            .expect_purge()
            .returning(|address| Err(Error::purge(address, "history locked")));

        let engine = PurgeEngine::new(store_with("a"), VisitFilter::new(), Arc::new(purger));
        assert!(matches!(engine.on_visit("a").unwrap_err(), Error::Purge { .. }));
    }

    #[test]
    fn test_cache_pruned_after_update() {
        let mut purger = MockHistoryPurger::new();
        purger.expect_purge().returning(|_| Ok(()));

        let store = store_with("one,two");
        let engine = PurgeEngine::new(store.clone(), VisitFilter::cached(), Arc::new(purger));
        engine.on_visit("https://zzz").unwrap();
        assert_eq!(engine.filter().cached_len(), 2);

        store.remove("one").unwrap();
        engine.on_visit("https://zzz").unwrap();
        assert_eq!(engine.filter().cached_len(), 1);
    }

    #[test]
    fn test_sees_mode_change() {
        let mut purger = MockHistoryPurger::new();
        purger.expect_purge().times(1).returning(|_| Ok(()));

        let store = store_with("keep\\.me");
        let engine = PurgeEngine::new(store.clone(), VisitFilter::cached(), Arc::new(purger));
        assert!(!engine.on_visit("https://other.org").unwrap().purge);

        store.set_mode("whitelist").unwrap();
        assert!(engine.on_visit("https://other.org").unwrap().purge);
    }
}
