//! In-process [`ContentStore`] with the same concurrency semantics as the
//! hosted store: every write bumps the content hash and a write carrying a
//! stale hash is refused.  Used by tests and offline dry runs.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::codec::{decode_content, encode_content};
use crate::error::SyncError;
use crate::store::{ContentStore, PutRequest, RemoteDocument, RemoteEntry};

#[derive(Debug, Default)]
struct Inner {
    /// path → (decoded text, content hash)
    files: BTreeMap<String, (String, String)>,
    next_version: u64,
    listing_failure: Option<u16>,
    puts: Vec<(String, PutRequest)>,
}

#[derive(Debug)]
pub struct MemoryStore {
    credential: bool,
    inner: Mutex<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store with a credential configured.
    pub fn new() -> Self {
        Self {
            credential: true,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn without_credential() -> Self {
        Self {
            credential: false,
            ..Self::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or overwrite a document out of band (as another client would)
    /// and return its new content hash.
    pub fn insert(&self, path: &str, text: &str) -> String {
        let mut inner = self.lock();
        inner.next_version += 1;
        let sha = format!("sha-{}", inner.next_version);
        inner
            .files
            .insert(path.to_string(), (text.to_string(), sha.clone()));
        sha
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.lock().files.get(path).map(|(text, _)| text.clone())
    }

    pub fn sha(&self, path: &str) -> Option<String> {
        self.lock().files.get(path).map(|(_, sha)| sha.clone())
    }

    /// Make directory listings fail with the given HTTP status.
    pub fn fail_listing(&self, status: u16) {
        self.lock().listing_failure = Some(status);
    }

    /// Every write received so far, in order.
    pub fn puts(&self) -> Vec<(String, PutRequest)> {
        self.lock().puts.clone()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn has_credential(&self) -> bool {
        self.credential
    }

    async fn fetch(&self, path: &str, branch: &str) -> Result<RemoteDocument, SyncError> {
        let inner = self.lock();
        match inner.files.get(path) {
            Some((text, sha)) => Ok(RemoteDocument {
                content: encode_content(text),
                sha: sha.clone(),
            }),
            None => Err(SyncError::RemoteReferenceInvalid {
                path: path.to_string(),
                branch: branch.to_string(),
                status: 404,
            }),
        }
    }

    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, SyncError> {
        let inner = self.lock();
        if let Some(status) = inner.listing_failure {
            return Err(SyncError::SyncFailure { status });
        }
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir.trim_end_matches('/'))
        };
        Ok(inner
            .files
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|name| !name.contains('/'))
            .map(|name| RemoteEntry {
                name: name.to_string(),
            })
            .collect())
    }

    async fn put(&self, path: &str, request: &PutRequest) -> Result<String, SyncError> {
        let mut inner = self.lock();
        inner.puts.push((path.to_string(), request.clone()));

        let current = inner.files.get(path).map(|(_, sha)| sha.clone());
        match (&current, &request.sha) {
            (Some(current), Some(expected)) if current != expected => {
                return Err(SyncError::PushConflict { status: 409 });
            }
            (Some(_), None) => return Err(SyncError::PushConflict { status: 422 }),
            (None, Some(_)) => return Err(SyncError::PushConflict { status: 404 }),
            _ => {}
        }

        let text = decode_content(&request.content)?;
        inner.next_version += 1;
        let sha = format!("sha-{}", inner.next_version);
        inner.files.insert(path.to_string(), (text, sha.clone()));
        Ok(sha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(content: &str, sha: Option<&str>) -> PutRequest {
        PutRequest {
            message: "test".into(),
            content: encode_content(content),
            branch: "main".into(),
            sha: sha.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn fetch_returns_encoded_body_and_hash() {
        let store = MemoryStore::new();
        let sha = store.insert("a.json", "{}");
        let doc = store.fetch("a.json", "main").await.unwrap();
        assert_eq!(doc.sha, sha);
        assert_eq!(decode_content(&doc.content).unwrap(), "{}");
        assert!(matches!(
            store.fetch("missing.json", "main").await,
            Err(SyncError::RemoteReferenceInvalid { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn stale_hash_is_a_conflict() {
        let store = MemoryStore::new();
        let first = store.insert("a.json", "1");
        store.insert("a.json", "2");
        let err = store.put("a.json", &put("3", Some(&first))).await.unwrap_err();
        assert!(matches!(err, SyncError::PushConflict { status: 409 }));
        assert_eq!(store.text("a.json").as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn create_without_hash_then_update_with_it() {
        let store = MemoryStore::new();
        let created = store.put("new.json", &put("x", None)).await.unwrap();
        let updated = store.put("new.json", &put("y", Some(&created))).await.unwrap();
        assert_ne!(created, updated);
        assert_eq!(store.text("new.json").as_deref(), Some("y"));
        assert_eq!(store.puts().len(), 2);
    }

    #[tokio::test]
    async fn lists_top_level_names() {
        let store = MemoryStore::new();
        store.insert("w5g-a.json", "{}");
        store.insert("docs/readme.md", "");
        let names: Vec<String> = store
            .list("")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["w5g-a.json"]);

        store.fail_listing(503);
        assert!(matches!(
            store.list("").await,
            Err(SyncError::SyncFailure { status: 503 })
        ));
    }
}
