//! Visit filter
//!
//! Decides whether a visited address is purged, given one snapshot of the
//! [`BlacklistState`]. Patterns are regular expressions searched anywhere in
//! the address (not anchored). A pattern the regex engine rejects never
//! matches and does not stop evaluation of the others.

use dashmap::DashMap;
use regex::Regex;
use tracing::{trace, warn};

use crate::state::{BlacklistState, ListMode};

/// Outcome for one visited address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the history entry must be removed
    pub purge: bool,
    /// Index of the first pattern that matched, if any
    pub matched: Option<usize>,
}

impl Decision {
    /// Apply list-mode polarity to a match result
    pub fn from_match(mode: ListMode, matched: Option<usize>) -> Self {
        let found = matched.is_some();
        let purge = match mode {
            ListMode::Blacklist => found,
            ListMode::Whitelist => !found,
        };
        Self { purge, matched }
    }
}

/// Evaluates addresses against pattern lists
///
/// Holds no per-call scratch state, so one filter can be shared across
/// threads. With caching enabled, compiled patterns are kept by pattern
/// text; a stale entry can never change a decision, and
/// [`retain_for`](Self::retain_for) only bounds memory.
#[derive(Debug, Default)]
pub struct VisitFilter {
    cache: Option<DashMap<String, Option<Regex>>>,
}

impl VisitFilter {
    /// Filter that compiles every pattern on every call
    pub fn new() -> Self {
        Self { cache: None }
    }

    /// Filter that keeps compiled patterns between calls
    pub fn cached() -> Self {
        Self {
            cache: Some(DashMap::new()),
        }
    }

    /// Build from the `filter.cache_patterns` setting
    pub fn with_cache(enabled: bool) -> Self {
        if enabled {
            Self::cached()
        } else {
            Self::new()
        }
    }

    /// Decide whether `address` is purged under `state`
    pub fn decide(&self, address: &str, state: &BlacklistState) -> Decision {
        let decision = Decision::from_match(state.mode, self.first_match(address, state));
        trace!(address, purge = decision.purge, matched = ?decision.matched, "Visit decided");
        decision
    }

    /// Index of the first pattern that matches `address`
    ///
    /// Later patterns are not evaluated once one matches.
    pub fn first_match(&self, address: &str, state: &BlacklistState) -> Option<usize> {
        state
            .patterns
            .iter()
            .position(|pattern| self.is_match(pattern, address))
    }

    /// Patterns in `state` that the regex engine rejects
    pub fn invalid_patterns(&self, state: &BlacklistState) -> Vec<String> {
        state
            .patterns
            .iter()
            .filter(|p| Regex::new(p).is_err())
            .cloned()
            .collect()
    }

    /// Drop cached patterns that are no longer in `state`
    pub fn retain_for(&self, state: &BlacklistState) {
        if let Some(cache) = &self.cache {
            cache.retain(|pattern, _| state.contains(pattern));
        }
    }

    /// Number of cached patterns (valid or not)
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, DashMap::len)
    }

    fn is_match(&self, pattern: &str, address: &str) -> bool {
        self.compiled(pattern)
            .is_some_and(|regex| regex.is_match(address))
    }

    fn compiled(&self, pattern: &str) -> Option<Regex> {
        let Some(cache) = &self.cache else {
            return compile(pattern);
        };

        if let Some(entry) = cache.get(pattern) {
            return entry.value().clone();
        }

        let compiled = compile(pattern);
        cache.insert(pattern.to_string(), compiled.clone());
        compiled
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(pattern, error = %e, "Pattern does not compile, treating as non-matching");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(mode: ListMode, patterns: &[&str]) -> BlacklistState {
        BlacklistState::with_patterns(mode, patterns.iter().copied())
    }

    #[test]
    fn test_blacklist_polarity() {
        let filter = VisitFilter::new();
        let s = state(ListMode::Blacklist, &["^https://evil\\.com"]);
        assert!(filter.decide("https://evil.com/x", &s).purge);
        assert!(!filter.decide("https://good.com/", &s).purge);
    }

    #[test]
    fn test_whitelist_polarity() {
        let filter = VisitFilter::new();
        let s = state(ListMode::Whitelist, &["^https://evil\\.com"]);
        assert!(!filter.decide("https://evil.com/x", &s).purge);
        assert!(filter.decide("https://good.com/", &s).purge);
    }

    #[test]
    fn test_empty_list() {
        let filter = VisitFilter::new();
        assert!(!filter.decide("https://a.com", &state(ListMode::Blacklist, &[])).purge);
        assert!(filter.decide("https://a.com", &state(ListMode::Whitelist, &[])).purge);
    }

    #[test]
    fn test_substring_search() {
        let filter = VisitFilter::new();
        let s = state(ListMode::Blacklist, &["facebook"]);
        assert!(filter.decide("https://www.facebook.com/home", &s).purge);
    }

    #[test]
    fn test_first_match_short_circuits() {
        let filter = VisitFilter::new();
        let s = state(ListMode::Blacklist, &["nomatch", "example", "com"]);
        assert_eq!(filter.first_match("https://example.com", &s), Some(1));
    }

    #[test]
    fn test_invalid_pattern_skipped() {
        let filter = VisitFilter::new();
        let s = state(ListMode::Blacklist, &["(unclosed", "example"]);
        let decision = filter.decide("https://example.com", &s);
        assert!(decision.purge);
        assert_eq!(decision.matched, Some(1));
        assert_eq!(filter.invalid_patterns(&s), vec!["(unclosed"]);
    }

    #[test]
    fn test_cache_behaves_like_uncached() {
        let cached = VisitFilter::cached();
        let plain = VisitFilter::new();
        let s = state(ListMode::Blacklist, &["[bad", "a\\.com$", "b"]);
        for address in ["https://a.com", "https://b.org", "https://c.net", "https://a.com/x"] {
            assert_eq!(cached.decide(address, &s), plain.decide(address, &s));
            assert_eq!(cached.decide(address, &s), plain.decide(address, &s));
        }
        assert_eq!(cached.cached_len(), 3);
    }

    #[test]
    fn test_retain_for() {
        let filter = VisitFilter::cached();
        filter.decide("x", &state(ListMode::Blacklist, &["a", "b"]));
        assert_eq!(filter.cached_len(), 2);

        filter.retain_for(&state(ListMode::Blacklist, &["b"]));
        assert_eq!(filter.cached_len(), 1);

        filter.retain_for(&BlacklistState::new());
        assert_eq!(filter.cached_len(), 0);
    }
}
