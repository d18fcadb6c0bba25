//! Enumerating the cycle documents ("streams") available in the remote store.

use serde::Serialize;
use tracing::{info, warn};

use rota_config::StreamsConfig;

use crate::error::SyncError;
use crate::store::{ContentStore, RemoteEntry};

/// One selectable cycle document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stream {
    pub id: String,
    pub label: String,
    pub file: String,
}

impl Stream {
    fn new(id: &str, label: &str, file: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            file: file.to_string(),
        }
    }
}

/// Used when the store answered the listing with an error status.
pub fn offline_streams() -> Vec<Stream> {
    vec![
        Stream::new("LOCAL_DEC", "GRUDZIEN (OFFLINE)", "w5g-grudzien.json"),
        Stream::new("LOCAL_JAN", "STYCZEN (OFFLINE)", "w5g-styczen.json"),
    ]
}

/// Used when the listing could not be obtained or understood at all.
pub fn fallback_streams() -> Vec<Stream> {
    vec![Stream::new("FALLBACK", "SYSTEM_OFFLINE", "w5g-grudzien.json")]
}

fn streams_from_listing(entries: Vec<RemoteEntry>, naming: &StreamsConfig) -> Vec<Stream> {
    let mut streams: Vec<Stream> = entries
        .into_iter()
        .filter(|entry| entry.name != naming.reserved)
        .filter_map(|entry| {
            let stem = entry
                .name
                .strip_prefix(naming.prefix.as_str())?
                .strip_suffix(naming.suffix.as_str())?;
            let id = stem.to_uppercase();
            Some(Stream {
                label: id.clone(),
                id,
                file: entry.name,
            })
        })
        .collect();
    streams.sort_by(|a, b| a.id.cmp(&b.id));
    streams
}

/// List the repository root and keep the files following the naming
/// convention, sorted by id.
pub async fn try_discover<S: ContentStore + ?Sized>(
    store: &S,
    naming: &StreamsConfig,
) -> Result<Vec<Stream>, SyncError> {
    let entries = store.list("").await?;
    Ok(streams_from_listing(entries, naming))
}

/// Like [`try_discover`] but never fails: errors degrade to a fixed offline
/// list, so the result does not necessarily reflect the remote store.
pub async fn discover_streams<S: ContentStore + ?Sized>(store: &S, naming: &StreamsConfig) -> Vec<Stream> {
    match try_discover(store, naming).await {
        Ok(streams) => {
            info!(count = streams.len(), "streams discovered");
            streams
        }
        Err(SyncError::SyncFailure { status }) => {
            warn!(status, "stream listing refused; using offline list");
            offline_streams()
        }
        Err(err) => {
            warn!(error = %err, "stream discovery failed; using fallback");
            fallback_streams()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn filters_strips_and_sorts() {
        let store = MemoryStore::new();
        for name in [
            "w5g-styczen.json",
            "w5g.json",
            "index.html",
            "w5g-grudzien.json",
            "ustawienia.json",
            "w5g-notes.txt",
        ] {
            store.insert(name, "{}");
        }

        let streams = discover_streams(&store, &StreamsConfig::default()).await;
        assert_eq!(
            streams,
            vec![
                Stream::new("GRUDZIEN", "GRUDZIEN", "w5g-grudzien.json"),
                Stream::new("STYCZEN", "STYCZEN", "w5g-styczen.json"),
            ]
        );
    }

    #[tokio::test]
    async fn empty_repository_lists_nothing() {
        let store = MemoryStore::new();
        assert!(try_discover(&store, &StreamsConfig::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn refused_listing_uses_offline_list() {
        let store = MemoryStore::new();
        store.insert("w5g-luty.json", "{}");
        store.fail_listing(403);

        assert!(matches!(
            try_discover(&store, &StreamsConfig::default()).await,
            Err(SyncError::SyncFailure { status: 403 })
        ));
        let streams = discover_streams(&store, &StreamsConfig::default()).await;
        assert_eq!(streams, offline_streams());
        assert_eq!(streams[1].label, "STYCZEN (OFFLINE)");
    }

    #[test]
    fn other_failures_use_single_fallback() {
        let fallback = fallback_streams();
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback[0].id, "FALLBACK");
        assert_eq!(fallback[0].file, "w5g-grudzien.json");
    }

    #[test]
    fn custom_naming_convention() {
        let naming = StreamsConfig {
            prefix: "roster-".to_string(),
            suffix: ".json".to_string(),
            reserved: "roster.json".to_string(),
            ..Default::default()
        };
        let entries = ["roster-b.json", "roster.json", "w5g-a.json", "roster-a.json"]
            .into_iter()
            .map(|name| RemoteEntry { name: name.to_string() })
            .collect();
        let ids: Vec<String> = streams_from_listing(entries, &naming)
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["A", "B"]);
    }
}
