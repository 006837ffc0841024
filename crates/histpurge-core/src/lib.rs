//! # HistPurge Core
//!
//! Host-independent core of the history purger: the blacklist/whitelist
//! pattern store and the filter that decides, for each visited address,
//! whether it is purged from retained history.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Pattern store** - Ordered, de-duplicated pattern list plus list mode,
//!   persisted after every change
//! - **Visit filter** - Regex search of an address against one state snapshot
//! - **Message protocol** - Action-tagged requests from options/menu surfaces
//! - **Configuration** - TOML configuration for storage, filter and logging
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use histpurge_core::{PatternStore, VisitFilter};
//! use histpurge_core::storage::MemoryStorage;
//!
//! # fn main() -> histpurge_core::Result<()> {
//! let store = PatternStore::new(Arc::new(MemoryStorage::new()));
//! store.add(r"^https://evil\.com")?;
//!
//! let filter = VisitFilter::new();
//! let state = store.load()?;
//! assert!(filter.decide("https://evil.com/x", &state).purge);
//!
//! store.set_mode("whitelist")?;
//! assert!(!filter.decide("https://evil.com/x", &store.load()?).purge);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod filter;
pub mod protocol;
pub mod state;
pub mod storage;
pub mod store;

// Re-exports for convenience
pub use config::Config;
pub use engine::{HistoryPurger, PurgeEngine};
pub use error::{Error, Result};
pub use events::{EventBus, StoreEvent};
pub use filter::{Decision, VisitFilter};
pub use protocol::{Dispatcher, Request, Response};
pub use state::{BlacklistState, ListMode, Pattern};
pub use store::PatternStore;
