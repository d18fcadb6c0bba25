use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// A document as served by the store: transport-encoded body plus the
/// content hash identifying this version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteDocument {
    pub content: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
}

/// Body of a document write.  `sha` is the optimistic-concurrency
/// precondition; it is omitted when creating a document for the first time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutRequest {
    pub message: String,
    pub content: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// The remote side of synchronisation.
///
/// Implementations map transport outcomes onto [`SyncError`]:
/// `fetch` reports missing documents as `RemoteReferenceInvalid`, `put`
/// reports any refused write as `PushConflict`, and other non-success
/// responses become `SyncFailure`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Whether a bearer credential is available for writes and reads of
    /// private documents.
    fn has_credential(&self) -> bool;

    async fn fetch(&self, path: &str, branch: &str) -> Result<RemoteDocument, SyncError>;

    /// List the entries of a directory (`""` is the repository root).
    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, SyncError>;

    /// Write a document and return its new content hash.
    async fn put(&self, path: &str, request: &PutRequest) -> Result<String, SyncError>;
}

#[async_trait]
impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    fn has_credential(&self) -> bool {
        (**self).has_credential()
    }

    async fn fetch(&self, path: &str, branch: &str) -> Result<RemoteDocument, SyncError> {
        (**self).fetch(path, branch).await
    }

    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, SyncError> {
        (**self).list(dir).await
    }

    async fn put(&self, path: &str, request: &PutRequest) -> Result<String, SyncError> {
        (**self).put(path, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_request_omits_missing_precondition() {
        let request = PutRequest {
            message: "m".into(),
            content: "Yw==".into(),
            branch: "main".into(),
            sha: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("sha").is_none());
        assert_eq!(json["branch"], "main");

        let with_sha = PutRequest {
            sha: Some("abc".into()),
            ..request
        };
        assert_eq!(serde_json::to_value(&with_sha).unwrap()["sha"], "abc");
    }
}
