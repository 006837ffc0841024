//! JSON file storage backend

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::StateStorage;
use crate::error::{Error, Result};
use crate::state::BlacklistState;

/// Stores the record as a single JSON object on disk
///
/// Writes land in a sibling temporary file that is then renamed over the
/// target, so readers see either the old record or the new one.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Storage backed by `path` (created on first write)
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStorage for JsonFileStorage {
    fn read(&self) -> Result<Option<BlacklistState>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::storage(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let state = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    fn write(&self, state: &BlacklistState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                Error::storage(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)
            .map_err(|e| Error::storage(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            Error::storage(format!("cannot replace {}: {e}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), patterns = state.len(), "Wrote state file");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ListMode;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("state.json"));
        assert_eq!(storage.read().unwrap(), None);
    }

    #[test]
    fn test_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested/state.json"));
        let state = BlacklistState::with_patterns(ListMode::Whitelist, ["^https://a\\.com"]);

        storage.write(&state).unwrap();
        assert_eq!(storage.read().unwrap(), Some(state));
        assert!(!storage.temp_path().exists());
    }

    #[test]
    fn test_reads_host_written_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"blacklist":["facebook"],"listMode":"blacklist"}"#).unwrap();

        let state = JsonFileStorage::new(&path).read().unwrap().unwrap();
        assert_eq!(state.patterns, vec!["facebook"]);
        assert_eq!(state.mode, ListMode::Blacklist);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let err = JsonFileStorage::new(&path).read().unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
