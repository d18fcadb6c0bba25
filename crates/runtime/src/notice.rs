use std::fmt;

use serde::Serialize;

use rota_sync::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
    /// Nothing was attempted; the user has to provide a credential first.
    CredentialRequired,
}

/// Short status line produced by every user-facing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.level, NoticeLevel::Error | NoticeLevel::CredentialRequired)
    }
}

impl From<&SyncError> for Notice {
    fn from(err: &SyncError) -> Self {
        match err {
            SyncError::MissingCredential => Self::new(
                NoticeLevel::CredentialRequired,
                "CREDENTIAL_REQUIRED: run `rota login --token <TOKEN>`",
            ),
            SyncError::RemoteReferenceInvalid { path, .. } => {
                Self::error(format!("REMOTE_FILE_INVALID: {path} (Check Branch?)"))
            }
            SyncError::NoDataToPush => Self::error("ERROR: NO_DATA_TO_PUSH"),
            SyncError::PushConflict { status } => {
                Self::error(format!("ERROR: PUSH_FAILED (HTTP {status}); pull before pushing again"))
            }
            SyncError::Busy(state) => Self::warning(format!("SYNC_IN_PROGRESS: {state}")),
            other => Self::error(format!("ERROR: {other}")),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warn",
            NoticeLevel::Error => "error",
            NoticeLevel::CredentialRequired => "auth",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}
