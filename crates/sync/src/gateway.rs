use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use rota_roster::{Cycle, CycleStore};

use crate::cache::LocalCache;
use crate::codec::{decode_content, encode_content};
use crate::error::SyncError;
use crate::store::{ContentStore, PutRequest};

/// Transfer state.  At most one pull or push runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Pulling,
    Pushing,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Pulling => "pull",
            Self::Pushing => "push",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullReport {
    pub revision: String,
    pub workers: usize,
    pub days: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    pub revision: String,
    /// Precondition sent with the write; `None` for a first-time creation.
    pub previous: Option<String>,
}

/// Returns the gateway to `Idle` when dropped, on success and error paths
/// alike.
struct TransferGuard<'a> {
    state: &'a Mutex<SyncState>,
}

impl Drop for TransferGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = SyncState::Idle;
    }
}

/// Pulls and pushes cycle documents with content-hash concurrency control.
pub struct SyncGateway<S> {
    store: S,
    branch: String,
    settle: Duration,
    state: Mutex<SyncState>,
}

impl<S: ContentStore> SyncGateway<S> {
    pub fn new(store: S, branch: impl Into<String>, settle: Duration) -> Self {
        Self {
            store,
            branch: branch.into(),
            settle,
            state: Mutex::new(SyncState::Idle),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn has_credential(&self) -> bool {
        self.store.has_credential()
    }

    fn begin(&self, next: SyncState) -> Result<TransferGuard<'_>, SyncError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != SyncState::Idle {
            return Err(SyncError::Busy(*state));
        }
        *state = next;
        Ok(TransferGuard { state: &self.state })
    }

    async fn settle(&self) {
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
    }

    /// Fetch `path`, replace the store's document and revision, mirror both
    /// into the cache and re-segment months.
    ///
    /// On any failure the store is left exactly as it was.
    pub async fn pull(
        &self,
        path: &str,
        cycles: &mut CycleStore,
        cache: &LocalCache,
        stream_label: &str,
    ) -> Result<PullReport, SyncError> {
        if !self.store.has_credential() {
            return Err(SyncError::MissingCredential);
        }
        let _guard = self.begin(SyncState::Pulling)?;
        debug!(path, branch = %self.branch, "pulling document");

        let remote = match self.store.fetch(path, &self.branch).await {
            Ok(remote) => remote,
            Err(err @ SyncError::RemoteReferenceInvalid { .. }) => {
                warn!(path, branch = %self.branch, error = %err, "remote reference invalid; keeping local state");
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let text = decode_content(&remote.content)?;
        let cycle = Cycle::from_json(&text).map_err(|err| SyncError::Decode(err.to_string()))?;
        let report = PullReport {
            revision: remote.sha.clone(),
            workers: cycle.workers.len(),
            days: cycle.day_count(),
        };
        cycles.load(cycle, Some(remote.sha), stream_label)?;

        if let Some(cycle) = cycles.cycle() {
            if let Err(err) = cache.write_document(cycle, cycles.revision()) {
                warn!(error = %err, "failed to mirror pulled document into cache");
            }
        }

        info!(path, revision = %report.revision, workers = report.workers, days = report.days, "pull complete");
        self.settle().await;
        Ok(report)
    }

    /// Write the current document back, using the held revision as the
    /// precondition, and adopt the revision returned by the store.
    pub async fn push(&self, path: &str, cycles: &mut CycleStore) -> Result<PushReport, SyncError> {
        if !self.store.has_credential() {
            return Err(SyncError::MissingCredential);
        }
        let cycle = cycles.cycle().ok_or(SyncError::NoDataToPush)?;
        let _guard = self.begin(SyncState::Pushing)?;

        let body = cycle
            .to_pretty_json()
            .map_err(|err| SyncError::Decode(err.to_string()))?;
        let previous = cycles.revision().map(str::to_string);
        let request = PutRequest {
            message: format!("SYS_SYNC_{}", Utc::now().timestamp_millis()),
            content: encode_content(&body),
            branch: self.branch.clone(),
            sha: previous.clone(),
        };
        debug!(path, precondition = ?previous, "pushing document");

        let revision = match self.store.put(path, &request).await {
            Ok(revision) => revision,
            Err(err) => {
                warn!(path, error = %err, "push failed");
                return Err(err);
            }
        };
        cycles.set_revision(revision.clone());

        info!(path, revision = %revision, "push complete");
        self.settle().await;
        Ok(PushReport { revision, previous })
    }

    /// Publish the group matrix to `file`, overwriting whatever version is
    /// there.  The current hash is looked up first; a missing file is created.
    pub async fn publish_groups(&self, file: &str, groups_json: &str) -> Result<String, SyncError> {
        if !self.store.has_credential() {
            return Err(SyncError::MissingCredential);
        }
        let _guard = self.begin(SyncState::Pushing)?;

        let existing = match self.store.fetch(file, &self.branch).await {
            Ok(remote) => Some(remote.sha),
            Err(err) => {
                debug!(file, error = %err, "no existing group settings; creating");
                None
            }
        };
        let request = PutRequest {
            message: format!("SYS_MATRIX_CONFIG_UPDATE_{}", Utc::now().timestamp_millis()),
            content: encode_content(groups_json),
            branch: self.branch.clone(),
            sha: existing,
        };
        let revision = self.store.put(file, &request).await?;
        info!(file, revision = %revision, "group settings published");
        Ok(revision)
    }
}
