//! Pattern store
//!
//! Sole owner and mutator of [`BlacklistState`]. Every mutation runs as one
//! read-modify-write critical section: the duplicate check, the in-memory
//! change and the persist all happen under the same lock, so two callers
//! racing to add the same pattern cannot both succeed.
//!
//! Persisting is store-then-confirm: the full record is written, read back
//! and compared before the change becomes visible through [`PatternStore::load`].

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::events::{EventBus, StoreEvent};
use crate::state::{normalize_pattern, BlacklistState, ListMode};
use crate::storage::StateStorage;

/// Thread-safe owner of the pattern list and list mode
pub struct PatternStore {
    storage: Arc<dyn StateStorage>,
    /// Resident copy, `None` until first access or after [`reload`](Self::reload)
    resident: Mutex<Option<BlacklistState>>,
    events: EventBus,
}

impl PatternStore {
    /// Create a store over `storage` with its own event bus
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self::with_events(storage, EventBus::new())
    }

    /// Create a store that publishes on an existing bus
    pub fn with_events(storage: Arc<dyn StateStorage>, events: EventBus) -> Self {
        Self {
            storage,
            resident: Mutex::new(None),
            events,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Current state, initializing and persisting an empty one on first use
    pub fn load(&self) -> Result<BlacklistState> {
        let mut resident = self.resident.lock();
        let state = self.resident_state(&mut resident)?.clone();
        Ok(state)
    }

    /// Stored patterns in insertion order
    pub fn patterns(&self) -> Result<Vec<String>> {
        Ok(self.load()?.patterns)
    }

    /// Active list mode
    pub fn mode(&self) -> Result<ListMode> {
        Ok(self.load()?.mode)
    }

    /// Add one pattern
    ///
    /// Returns `false` without touching storage when the trimmed pattern is
    /// empty or already stored (exact, case-sensitive comparison).
    #[instrument(skip(self))]
    pub fn add(&self, pattern: &str) -> Result<bool> {
        let Some(pattern) = normalize_pattern(pattern) else {
            debug!("Rejected blank pattern");
            return Ok(false);
        };

        let added = self.mutate(|state| {
            if state.contains(pattern) {
                debug!(pattern, "Pattern already present");
                return None;
            }
            state.patterns.push(pattern.to_string());
            Some(())
        })?;

        if added.is_some() {
            info!(pattern, "Added pattern");
        }
        Ok(added.is_some())
    }

    /// Remove a pattern by exact match
    #[instrument(skip(self))]
    pub fn remove(&self, pattern: &str) -> Result<bool> {
        let removed = self.mutate(|state| {
            let index = state.patterns.iter().position(|p| p == pattern)?;
            Some(state.patterns.remove(index))
        })?;

        match removed {
            Some(pattern) => {
                info!(pattern = %pattern, "Removed pattern");
                Ok(true)
            }
            None => {
                debug!("Pattern not present");
                Ok(false)
            }
        }
    }

    /// Add every comma-separated pattern in `raw_list`
    ///
    /// Tokens are trimmed; blank tokens and ones already stored (including
    /// earlier tokens of the same batch) are skipped. The batch is persisted
    /// once, and only if at least one pattern was added.
    #[instrument(skip(self, raw_list), fields(len = raw_list.len()))]
    pub fn import_many(&self, raw_list: &str) -> Result<usize> {
        let added = self.mutate(|state| {
            let mut count = 0;
            for token in raw_list.split(',').filter_map(normalize_pattern) {
                if !state.contains(token) {
                    state.patterns.push(token.to_string());
                    count += 1;
                }
            }
            (count > 0).then_some(count)
        })?;

        let count = added.unwrap_or(0);
        info!(count, "Imported patterns");
        Ok(count)
    }

    /// Remove all patterns, keeping the list mode
    pub fn clear(&self) -> Result<()> {
        let cleared = self.mutate(|state| Some(std::mem::take(&mut state.patterns).len()))?;
        info!(count = cleared.unwrap_or(0), "Cleared patterns");
        Ok(())
    }

    /// Switch list mode by wire name
    ///
    /// Anything other than `"blacklist"` or `"whitelist"` is ignored and
    /// reported as `false`.
    pub fn set_mode(&self, mode: &str) -> Result<bool> {
        match ListMode::parse(mode) {
            Some(mode) => {
                self.set_list_mode(mode)?;
                Ok(true)
            }
            None => {
                debug!(mode, "Rejected unknown list mode");
                Ok(false)
            }
        }
    }

    /// Switch list mode, keeping the patterns
    pub fn set_list_mode(&self, mode: ListMode) -> Result<()> {
        self.mutate(|state| {
            state.mode = mode;
            Some(())
        })?;
        info!(%mode, "List mode changed");
        Ok(())
    }

    /// Comma-joined patterns, accepted back by [`import_many`](Self::import_many)
    ///
    /// Fails with [`Error::Export`] when a pattern contains a comma (such as a
    /// `{1,3}` repetition), since importing the list would split it.
    pub fn export(&self) -> Result<String> {
        let state = self.load()?;
        if let Some(pattern) = state.patterns.iter().find(|p| p.contains(',')) {
            return Err(Error::Export {
                pattern: pattern.clone(),
            });
        }
        Ok(state.patterns.join(","))
    }

    /// Forget the resident copy so the next access re-reads storage
    pub fn reload(&self) {
        *self.resident.lock() = None;
        debug!(backend = self.storage.name(), "Resident state dropped");
    }

    /// Apply `change` to a copy of the state and persist it
    ///
    /// `change` returns `None` to signal "nothing to do": no write, no event.
    /// The lock is held from the read through the confirmed write.
    fn mutate<T>(&self, change: impl FnOnce(&mut BlacklistState) -> Option<T>) -> Result<Option<T>> {
        let mut resident = self.resident.lock();
        let mut next = self.resident_state(&mut resident)?.clone();

        let Some(outcome) = change(&mut next) else {
            return Ok(None);
        };

        self.persist(&next)?;
        *resident = Some(next);
        drop(resident);

        self.events.publish(StoreEvent::BlacklistUpdated);
        Ok(Some(outcome))
    }

    fn resident_state<'a>(
        &self,
        resident: &'a mut Option<BlacklistState>,
    ) -> Result<&'a BlacklistState> {
        if resident.is_none() {
            let state = match self.storage.read()? {
                Some(mut state) => {
                    let dropped = state.normalize();
                    if dropped > 0 {
                        warn!(
                            backend = self.storage.name(),
                            dropped, "Stored record had blank or duplicate patterns"
                        );
                    }
                    info!(
                        backend = self.storage.name(),
                        patterns = state.len(),
                        mode = %state.mode,
                        "Loaded state"
                    );
                    state
                }
                None => {
                    let state = BlacklistState::new();
                    self.persist(&state)?;
                    info!(backend = self.storage.name(), "Initialized empty state");
                    state
                }
            };
            *resident = Some(state);
        }

        resident
            .as_ref()
            .ok_or_else(|| Error::storage("state not resident after load"))
    }

    fn persist(&self, state: &BlacklistState) -> Result<()> {
        self.storage.write(state)?;
        match self.storage.read()? {
            Some(ref stored) if stored == state => Ok(()),
            _ => Err(Error::StorageConfirm),
        }
    }
}

impl std::fmt::Debug for PatternStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternStore")
            .field("backend", &self.storage.name())
            .field("resident", &self.resident.lock().is_some())
            .finish()
    }
}
