//! Action-tagged message protocol
//!
//! Options and context-menu surfaces talk to the core with small JSON
//! objects carrying an `action` tag:
//!
//! ```json
//! {"action":"addToBlacklist","url":"facebook\\.com"}
//! {"action":"importBlacklist","blacklist":"a,b,c"}
//! {"action":"removeFromBlacklist","url":"facebook\\.com"}
//! {"action":"clearBlacklist"}
//! {"action":"changeListMode","listMode":"whitelist"}
//! ```
//!
//! Rendering surfaces additionally use `getBlacklist` to read the state, and
//! a host forwarding history events uses `visit`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::engine::PurgeEngine;
use crate::error::{Error, Result};
use crate::state::BlacklistState;
use crate::store::PatternStore;

/// Inbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Add one pattern
    AddToBlacklist {
        /// Pattern text
        url: String,
    },
    /// Add a comma-separated batch of patterns
    ImportBlacklist {
        /// Comma-separated pattern list
        blacklist: String,
    },
    /// Remove one pattern
    RemoveFromBlacklist {
        /// Pattern text, matched exactly
        url: String,
    },
    /// Remove all patterns
    ClearBlacklist,
    /// Switch between blacklist and whitelist
    ChangeListMode {
        /// `"blacklist"` or `"whitelist"`; anything else is ignored
        #[serde(rename = "listMode")]
        list_mode: String,
    },
    /// Read the current state
    GetBlacklist,
    /// A history entry was created for `url`
    Visit {
        /// Visited address
        url: String,
    },
}

impl Request {
    /// Decode one JSON message
    pub fn decode(message: &str) -> Result<Self> {
        serde_json::from_str(message).map_err(|e| Error::Protocol(e.to_string()))
    }

    /// Wire name of the action
    pub fn action(&self) -> &'static str {
        match self {
            Self::AddToBlacklist { .. } => "addToBlacklist",
            Self::ImportBlacklist { .. } => "importBlacklist",
            Self::RemoveFromBlacklist { .. } => "removeFromBlacklist",
            Self::ClearBlacklist => "clearBlacklist",
            Self::ChangeListMode { .. } => "changeListMode",
            Self::GetBlacklist => "getBlacklist",
            Self::Visit { .. } => "visit",
        }
    }
}

/// Reply to a [`Request`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum Response {
    /// Outcome of `addToBlacklist`
    Added {
        /// Whether the pattern was stored
        added: bool,
    },
    /// Outcome of `importBlacklist`
    Imported {
        /// Number of patterns actually added
        count: usize,
    },
    /// Outcome of `removeFromBlacklist`
    Removed {
        /// Whether the pattern was present
        removed: bool,
    },
    /// Outcome of `clearBlacklist`
    Cleared,
    /// Outcome of `changeListMode`
    ModeChanged {
        /// Whether the mode value was recognized
        changed: bool,
    },
    /// Outcome of `getBlacklist`
    State(BlacklistState),
    /// Outcome of `visit`
    Decided {
        /// Whether the entry was handed to the purger
        purge: bool,
    },
}

/// Routes requests to the store (and the engine for `visit`)
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: Arc<PatternStore>,
    engine: Option<Arc<PurgeEngine>>,
}

impl Dispatcher {
    /// Dispatcher for pattern management only
    pub fn new(store: Arc<PatternStore>) -> Self {
        Self { store, engine: None }
    }

    /// Dispatcher that also handles `visit` through `engine`
    pub fn with_engine(engine: Arc<PurgeEngine>) -> Self {
        Self {
            store: engine.store().clone(),
            engine: Some(engine),
        }
    }

    /// Store the dispatcher operates on
    pub fn store(&self) -> &Arc<PatternStore> {
        &self.store
    }

    /// Decode and handle one JSON message
    pub fn handle_message(&self, message: &str) -> Result<Response> {
        self.handle(Request::decode(message)?)
    }

    /// Handle one request
    #[instrument(skip_all, fields(action = request.action()))]
    pub fn handle(&self, request: Request) -> Result<Response> {
        let response = match request {
            Request::AddToBlacklist { url } => Response::Added {
                added: self.store.add(&url)?,
            },
            Request::ImportBlacklist { blacklist } => Response::Imported {
                count: self.store.import_many(&blacklist)?,
            },
            Request::RemoveFromBlacklist { url } => Response::Removed {
                removed: self.store.remove(&url)?,
            },
            Request::ClearBlacklist => {
                self.store.clear()?;
                Response::Cleared
            }
            Request::ChangeListMode { list_mode } => Response::ModeChanged {
                changed: self.store.set_mode(&list_mode)?,
            },
            Request::GetBlacklist => Response::State(self.store.load()?),
            Request::Visit { url } => {
                let engine = self
                    .engine
                    .as_ref()
                    .ok_or_else(|| Error::Protocol("visit is not handled here".into()))?;
                Response::Decided {
                    purge: engine.on_visit(&url)?.purge,
                }
            }
        };

        debug!(?response, "Request handled");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ListMode;

    #[test]
    fn test_decode_actions() {
        assert_eq!(
            Request::decode(r#"{"action":"addToBlacklist","url":"a"}"#).unwrap(),
            Request::AddToBlacklist { url: "a".into() }
        );
        assert_eq!(
            Request::decode(r#"{"action":"importBlacklist","blacklist":"a,b"}"#).unwrap(),
            Request::ImportBlacklist { blacklist: "a,b".into() }
        );
        assert_eq!(
            Request::decode(r#"{"action":"clearBlacklist"}"#).unwrap(),
            Request::ClearBlacklist
        );
        assert_eq!(
            Request::decode(r#"{"action":"changeListMode","listMode":"whitelist"}"#).unwrap(),
            Request::ChangeListMode { list_mode: "whitelist".into() }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_action() {
        let err = Request::decode(r#"{"action":"launchMissiles"}"#).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));

        let err = Request::decode(r#"{"action":"addToBlacklist"}"#).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_state_response_wire_form() {
        let response = Response::State(BlacklistState::with_patterns(ListMode::Whitelist, ["a"]));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "result": "state", "blacklist": ["a"], "listMode": "whitelist" })
        );
    }

    #[test]
    fn test_action_names_match_wire() {
        let requests = [
            Request::AddToBlacklist { url: "a".into() },
            Request::ImportBlacklist { blacklist: "a".into() },
            Request::RemoveFromBlacklist { url: "a".into() },
            Request::ClearBlacklist,
            Request::ChangeListMode { list_mode: "a".into() },
            Request::GetBlacklist,
            Request::Visit { url: "a".into() },
        ];
        for request in requests {
            let json = serde_json::to_value(&request).unwrap();
            assert_eq!(json["action"], request.action());
        }
    }
}
