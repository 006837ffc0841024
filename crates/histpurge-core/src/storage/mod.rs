//! Persistence seam for [`BlacklistState`]
//!
//! The store only ever writes a full record and re-reads it to confirm, so a
//! backend needs nothing beyond whole-record `read`/`write`.

mod file;
mod memory;

pub use file::JsonFileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;
use crate::state::BlacklistState;

/// Durable storage for the blacklist record
///
/// Implementations must be safe to share between threads. A backend that
/// cannot be reached reports [`Error::Storage`](crate::Error::Storage); the
/// store never retries.
pub trait StateStorage: Send + Sync {
    /// Read the persisted record, `None` if nothing has been stored yet
    fn read(&self) -> Result<Option<BlacklistState>>;

    /// Replace the persisted record
    fn write(&self, state: &BlacklistState) -> Result<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
