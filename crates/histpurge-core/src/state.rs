//! Persisted blacklist state
//!
//! The record layout is fixed by the hosts that already store it: two
//! top-level keys, `blacklist` (ordered pattern strings) and `listMode`.
//! There is no schema version field.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// A regular-expression fragment matched against visited URLs
pub type Pattern = String;

/// Decision polarity for the pattern list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    /// Matching addresses are purged
    #[default]
    Blacklist,
    /// Addresses that match nothing are purged
    Whitelist,
}

impl ListMode {
    /// Wire name of the mode
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blacklist => "blacklist",
            Self::Whitelist => "whitelist",
        }
    }

    /// Parse one of the two recognized wire names
    ///
    /// Matching is exact: `"Whitelist"` or `"white"` are not recognized.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "blacklist" => Some(Self::Blacklist),
            "whitelist" => Some(Self::Whitelist),
            _ => None,
        }
    }
}

impl fmt::Display for ListMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a recognized list mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownListMode(pub String);

impl fmt::Display for UnknownListMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown list mode '{}' (expected blacklist or whitelist)", self.0)
    }
}

impl std::error::Error for UnknownListMode {}

impl FromStr for ListMode {
    type Err = UnknownListMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownListMode(s.to_string()))
    }
}

/// The persisted aggregate owned by [`PatternStore`](crate::store::PatternStore)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlacklistState {
    /// Patterns in insertion order, no duplicates
    #[serde(rename = "blacklist", default)]
    pub patterns: Vec<Pattern>,
    /// Active list mode
    #[serde(rename = "listMode", default, deserialize_with = "lenient_mode")]
    pub mode: ListMode,
}

impl BlacklistState {
    /// Empty pattern list in blacklist mode
    pub fn new() -> Self {
        Self::default()
    }

    /// State with the given patterns and mode, as stored (no normalization)
    pub fn with_patterns<I, S>(mode: ListMode, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Pattern>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    /// Exact, case-sensitive membership test
    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.iter().any(|p| p == pattern)
    }

    /// Number of stored patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no patterns are stored
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Trim patterns, dropping blanks and later duplicates
    ///
    /// Returns how many entries were dropped.
    pub fn normalize(&mut self) -> usize {
        let before = self.patterns.len();
        let mut kept: Vec<Pattern> = Vec::with_capacity(before);
        for raw in self.patterns.drain(..) {
            if let Some(pattern) = normalize_pattern(&raw) {
                if !kept.iter().any(|p| p == pattern) {
                    kept.push(pattern.to_string());
                }
            }
        }
        self.patterns = kept;
        before - self.patterns.len()
    }
}

/// Trim a raw pattern, rejecting blank input
pub fn normalize_pattern(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

// Unrecognized stored modes read as the default
fn lenient_mode<'de, D>(deserializer: D) -> Result<ListMode, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        None => ListMode::default(),
        Some(value) => ListMode::parse(value).unwrap_or_else(|| {
            warn!(mode = value, "Unrecognized stored list mode, using blacklist");
            ListMode::default()
        }),
    })
}
