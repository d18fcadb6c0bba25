use thiserror::Error;

use rota_roster::CycleError;

use crate::gateway::SyncState;

#[derive(Debug, Error)]
pub enum SyncError {
    /// No bearer credential configured; nothing was sent.
    #[error("no credential configured")]
    MissingCredential,

    /// The document or branch does not exist (404/422).  Local state is kept.
    #[error("remote document '{path}' unreachable on branch '{branch}' (HTTP {status})")]
    RemoteReferenceInvalid {
        path: String,
        branch: String,
        status: u16,
    },

    #[error("sync failed (HTTP {status})")]
    SyncFailure { status: u16 },

    #[error("no data to push")]
    NoDataToPush,

    /// The store refused the write, typically because the content hash sent
    /// as precondition no longer matches the remote document.
    #[error("push rejected (HTTP {status}); the remote document changed since the last pull")]
    PushConflict { status: u16 },

    #[error("stream discovery failed: {0}")]
    DiscoveryFailure(String),

    #[error("a {0} is already in progress")]
    Busy(SyncState),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("cannot decode remote payload: {0}")]
    Decode(String),

    #[error("remote document is invalid: {0}")]
    InvalidDocument(#[from] CycleError),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::SyncFailure {
                status: status.as_u16(),
            },
            None => Self::Transport(err.to_string()),
        }
    }
}
