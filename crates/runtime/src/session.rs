use std::time::Duration;

use anyhow::Result;
use chrono::{Datelike, Local};
use tracing::{error, info, warn};

use rota_config::{AppConfig, RemoteConfig};
use rota_roster::{
    CycleError, CycleStore, FleetStats, GroupEdit, GroupTable, Operator, OperatorStats, ShiftBucket,
    Theme, daily_roster, fleet_stats, operator_stats, search_operators,
};
use rota_sync::{
    CacheSlot, ContentStore, LocalCache, Stream, SyncError, SyncGateway, SyncState, discover_streams,
};

use crate::notice::Notice;

/// Builds the content store for a given configuration.  Called once at
/// startup and again whenever the credential or repository changes.
pub type Connector<S> = Box<dyn Fn(&AppConfig) -> Result<S> + Send + Sync>;

const UNKNOWN_STREAM_LABEL: &str = "UNKNOWN_CYCLE";

/// Everything a front-end needs: the live cycle, the group matrix, the list
/// of streams and the gateway used to synchronise them.
///
/// Operations that can fail return a [`Notice`] instead of an error; the
/// failure has already been logged by the time the caller sees it.
pub struct RosterSession<S> {
    config: AppConfig,
    cache: LocalCache,
    cycles: CycleStore,
    groups: GroupTable,
    streams: Vec<Stream>,
    gateway: SyncGateway<S>,
    connect: Connector<S>,
    theme: Theme,
}

fn build_gateway<S: ContentStore>(config: &AppConfig, connect: &Connector<S>) -> Result<SyncGateway<S>> {
    let store = connect(config)?;
    Ok(SyncGateway::new(
        store,
        config.remote.branch.clone(),
        Duration::from_millis(config.sync.settle_ms),
    ))
}

/// A remote section saved at runtime wins over the file; environment
/// overrides win over both.
fn restore_remote(config: &mut AppConfig, cache: &LocalCache) {
    match cache.read(CacheSlot::Config) {
        Ok(Some(raw)) => match serde_json::from_str::<RemoteConfig>(&raw) {
            Ok(remote) => config.remote = remote,
            Err(err) => warn!(error = %err, "ignoring unreadable cached remote config"),
        },
        Ok(None) => {}
        Err(err) => warn!(error = %err, "failed to read cached remote config"),
    }
    config.apply_env_overrides();
}

fn restore_groups(cache: &LocalCache) -> GroupTable {
    match cache.read(CacheSlot::Groups) {
        Ok(Some(raw)) => GroupTable::from_saved_json(&raw).unwrap_or_else(|err| {
            error!(error = %err, "ignoring saved group matrix; using defaults");
            GroupTable::default()
        }),
        Ok(None) => GroupTable::default(),
        Err(err) => {
            warn!(error = %err, "failed to read saved group matrix; using defaults");
            GroupTable::default()
        }
    }
}

impl<S: ContentStore> RosterSession<S> {
    /// Restore the previous session: cached remote settings and group
    /// matrix, discovered streams, the last active stream (if it is still
    /// listed, else the first one), and the cached document focused on today.
    pub async fn open(mut config: AppConfig, connect: Connector<S>) -> Result<Self> {
        let cache = LocalCache::new(&config.cache.dir);
        restore_remote(&mut config, &cache);
        let groups = restore_groups(&cache);
        let gateway = build_gateway(&config, &connect)?;
        let streams = discover_streams(gateway.store(), &config.streams).await;

        let last_active = cache.read(CacheSlot::ActiveStream).unwrap_or_else(|err| {
            warn!(error = %err, "failed to read last active stream");
            None
        });
        match last_active {
            Some(path) if streams.iter().any(|s| s.file == path) => config.remote.path = path,
            _ => {
                if let Some(first) = streams.first() {
                    config.remote.path = first.file.clone();
                }
            }
        }

        let theme = Theme::from_label(&config.ui.theme);
        let mut session = Self {
            config,
            cache,
            cycles: CycleStore::new(),
            groups,
            streams,
            gateway,
            connect,
            theme,
        };
        session.restore_document();
        info!(
            path = %session.config.remote.path,
            streams = session.streams.len(),
            loaded = session.cycles.is_loaded(),
            "session opened"
        );
        Ok(session)
    }

    fn restore_document(&mut self) {
        let (cycle, revision) = match self.cache.read_document() {
            Ok(Some(cached)) => cached,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "ignoring cached document");
                return;
            }
        };
        let label = self.stream_label().to_string();
        match self.cycles.load(cycle, revision, &label) {
            Ok(()) => self.cycles.focus_day_of_month(Local::now().day()),
            Err(err) => warn!(error = %err, "cached document is inconsistent; ignoring it"),
        }
    }

    fn persist_document(&self) {
        if let Some(cycle) = self.cycles.cycle() {
            if let Err(err) = self.cache.write_document(cycle, self.cycles.revision()) {
                warn!(error = %err, "failed to write document cache");
            }
        }
    }

    fn sync_failed(&self, operation: &str, err: SyncError) -> Notice {
        match &err {
            SyncError::MissingCredential | SyncError::Busy(_) => {
                warn!(operation, error = %err, "sync not started")
            }
            _ => error!(operation, path = %self.config.remote.path, error = %err, "sync failed"),
        }
        Notice::from(&err)
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cycles(&self) -> &CycleStore {
        &self.cycles
    }

    pub fn groups(&self) -> &GroupTable {
        &self.groups
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn sync_state(&self) -> SyncState {
        self.gateway.state()
    }

    pub fn active_path(&self) -> &str {
        &self.config.remote.path
    }

    /// Label of the active stream, used to name months the document does not
    /// name itself.
    pub fn stream_label(&self) -> &str {
        self.streams
            .iter()
            .find(|s| s.file == self.config.remote.path)
            .map_or(UNKNOWN_STREAM_LABEL, |s| s.label.as_str())
    }

    // ── Synchronisation ────────────────────────────────────────────────────

    pub async fn pull(&mut self) -> Notice {
        let label = self.stream_label().to_string();
        let path = self.config.remote.path.clone();
        match self.gateway.pull(&path, &mut self.cycles, &self.cache, &label).await {
            Ok(report) => Notice::success(format!(
                "DATA_PULL_SUCCESSFUL: {} operators, {} days",
                report.workers, report.days
            )),
            Err(err) => self.sync_failed("pull", err),
        }
    }

    pub async fn push(&mut self) -> Notice {
        let path = self.config.remote.path.clone();
        match self.gateway.push(&path, &mut self.cycles).await {
            Ok(_) => {
                self.persist_document();
                Notice::success("REMOTE_STORAGE_UPDATED")
            }
            Err(err) => self.sync_failed("push", err),
        }
    }

    /// Make `path` the active stream and pull it.  The current document and
    /// its unsynced edits are dropped from memory and from the cache first,
    /// so a failed pull never leaves the previous stream's document behind.
    pub async fn switch_stream(&mut self, path: &str) -> Notice {
        if path == self.config.remote.path {
            return Notice::info(format!("STREAM_ALREADY_MOUNTED: {path}"));
        }
        info!(from = %self.config.remote.path, to = path, "mounting stream");
        self.config.remote.path = path.to_string();
        if let Err(err) = self.cache.write(CacheSlot::ActiveStream, path) {
            warn!(error = %err, "failed to record active stream");
        }
        if let Err(err) = self.cache.clear(CacheSlot::Document) {
            warn!(error = %err, "failed to drop cached document");
        }
        self.cycles.clear();
        self.pull().await
    }

    // ── Editing ────────────────────────────────────────────────────────────

    /// Edit one cell and mirror the document into the cache.  The remote
    /// store only sees the change on the next push.
    pub fn set_shift(&mut self, worker_idx: usize, day_idx: usize, raw: &str) -> Notice {
        match self.cycles.set_shift(worker_idx, day_idx, raw) {
            Ok(true) => {
                self.persist_document();
                Notice::info(format!(
                    "SHIFT_UPDATED: operator {worker_idx}, day {day_idx} = {}",
                    raw.to_uppercase()
                ))
            }
            Ok(false) => Notice::warning("NO_DATA_LOADED"),
            Err(CycleError::ReadOnly) => Notice::warning("ACCESS_RESTRICTED: unlock editing first"),
            Err(err) => {
                warn!(worker_idx, day_idx, error = %err, "edit rejected");
                Notice::error(format!("EDIT_REJECTED: {err}"))
            }
        }
    }

    pub fn toggle_lock(&mut self) -> Notice {
        if self.cycles.toggle_lock() {
            Notice::info("ACCESS_RESTRICTED")
        } else {
            Notice::warning("WRITE_ACCESS_GRANTED")
        }
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.cycles.set_locked(locked);
    }

    // ── Navigation ─────────────────────────────────────────────────────────

    pub fn step_day(&mut self, delta: isize) -> bool {
        self.cycles.step_day(delta)
    }

    pub fn step_month(&mut self, delta: isize) -> Notice {
        match self.cycles.step_month(delta) {
            Ok(true) => {
                let name = self.cycles.current_month().map(|m| m.name.clone()).unwrap_or_default();
                Notice::info(format!("MONTH: {name}"))
            }
            Ok(false) => Notice::warning("NO_DATA_LOADED"),
            Err(err) => {
                info!(error = %err, "month navigation stopped at boundary");
                Notice::warning("END_OF_DATA_STREAM. CHECK_DATA_STREAM_SELECTOR")
            }
        }
    }

    pub fn jump_to_day(&mut self, day_idx: usize) {
        self.cycles.jump_to_day(day_idx);
    }

    // ── Views ──────────────────────────────────────────────────────────────

    /// Buckets for the current day; empty when nothing is loaded.
    pub fn daily_roster(&self) -> Vec<ShiftBucket> {
        self.cycles
            .cycle()
            .map(|cycle| daily_roster(cycle, &self.groups, self.cycles.current_day()))
            .unwrap_or_default()
    }

    pub fn operator_stats(&self, worker_idx: usize) -> Option<OperatorStats> {
        operator_stats(self.cycles.cycle()?, &self.groups, worker_idx)
    }

    pub fn fleet_stats(&self) -> Option<FleetStats> {
        self.cycles.cycle().map(fleet_stats)
    }

    /// Operators matching `query` by name; empty when nothing is loaded.
    pub fn search_operators(&self, query: &str) -> Vec<(usize, &Operator)> {
        self.cycles
            .cycle()
            .map(|cycle| search_operators(cycle, query))
            .unwrap_or_default()
    }

    // ── Groups ─────────────────────────────────────────────────────────────

    /// Apply a matrix edit and save it locally.  Rejected edits leave the
    /// matrix unchanged.
    pub fn apply_group_edits(&mut self, edits: &[GroupEdit]) -> Notice {
        if let Err(err) = self.groups.apply_edits(edits) {
            warn!(error = %err, "group matrix edit rejected");
            return Notice::error(format!("MATRIX_REJECTED: {err}"));
        }
        self.save_groups()
    }

    pub fn set_group_from(&mut self, key: &str, from: i64) -> Notice {
        self.apply_group_edits(&[GroupEdit {
            key: key.to_string(),
            from: Some(from),
            ..Default::default()
        }])
    }

    pub fn save_groups(&self) -> Notice {
        let saved = self
            .groups
            .validate()
            .and_then(|()| self.groups.to_json())
            .map_err(anyhow::Error::from)
            .and_then(|json| self.cache.write(CacheSlot::Groups, &json));
        match saved {
            Ok(()) => Notice::success("MATRIX_UPDATED: Colors & Ranges Synced"),
            Err(err) => {
                error!(error = %err, "failed to save group matrix");
                Notice::error(format!("MATRIX_SAVE_FAILED: {err}"))
            }
        }
    }

    /// Publish the group matrix to the shared settings file in the remote
    /// store, overwriting the remote version.
    pub async fn publish_groups(&self) -> Notice {
        let json = match self.groups.to_json() {
            Ok(json) => json,
            Err(err) => return Notice::error(format!("SYNC_FAIL: {err}")),
        };
        let file = &self.config.streams.group_settings_file;
        match self.gateway.publish_groups(file, &json).await {
            Ok(_) => Notice::success(format!("REMOTE_CONFIG_SAVED: {file}")),
            Err(err @ (SyncError::MissingCredential | SyncError::Busy(_))) => {
                self.sync_failed("publish_groups", err)
            }
            Err(err) => {
                error!(file = %file, error = %err, "group matrix publish failed");
                Notice::error(format!("SYNC_FAIL: {err}"))
            }
        }
    }

    // ── Credentials ────────────────────────────────────────────────────────

    /// Store a new credential and repository (`owner/repo`, bare repo name,
    /// or empty for the default) and reconnect.
    pub fn login(&mut self, token: &str, repo_slug: &str) -> Notice {
        let mut config = self.config.clone();
        config.remote.token = token.trim().to_string();
        config.remote.apply_repo_slug(repo_slug);

        let gateway = match build_gateway(&config, &self.connect) {
            Ok(gateway) => gateway,
            Err(err) => {
                error!(error = %err, "failed to connect with new credentials");
                return Notice::error(format!("CONFIG_REJECTED: {err}"));
            }
        };
        let saved = serde_json::to_string_pretty(&config.remote)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.cache.write(CacheSlot::Config, &json));
        if let Err(err) = saved {
            error!(error = %err, "failed to save remote config");
            return Notice::error(format!("CONFIG_SAVE_FAILED: {err}"));
        }

        info!(repo = %config.remote.repo_slug(), "remote config updated");
        self.config = config;
        self.gateway = gateway;
        Notice::success("CONFIG_UPDATED")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rota_roster::Cycle;
    use rota_sync::{MemoryStore, offline_streams};
    use tempfile::TempDir;

    use crate::notice::NoticeLevel;

    const DEC: &str = r#"{
        "meta": { "days": [30, 31, 1, 2], "weekdays": ["PT", "SO", "ND", "PN"] },
        "workers": [
            { "id": "3", "name": "Adam", "shifts": ["1", "X", "P1", "2"] },
            { "id": "14", "name": "Beata", "shifts": ["2", "", "u", "N1"] }
        ]
    }"#;

    const JAN: &str = r#"{
        "meta": { "days": [1, 2], "weekdays": ["CZ", "PT"] },
        "workers": [ { "id": 40, "name": "Cezary", "shifts": ["2", "2"] } ]
    }"#;

    fn config(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.cache.dir = dir.path().join("cache").display().to_string();
        config.sync.settle_ms = 0;
        config
    }

    fn remote() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert("w5g-grudzien.json", DEC);
        store.insert("w5g-styczen.json", JAN);
        store.insert("w5g.json", "{}");
        store
    }

    fn shared(store: &Arc<MemoryStore>) -> Connector<Arc<MemoryStore>> {
        let store = Arc::clone(store);
        Box::new(move |_: &AppConfig| -> Result<Arc<MemoryStore>> { Ok(Arc::clone(&store)) })
    }

    async fn open(dir: &TempDir, store: &Arc<MemoryStore>) -> RosterSession<Arc<MemoryStore>> {
        RosterSession::open(config(dir), shared(store)).await.unwrap()
    }

    #[tokio::test]
    async fn fresh_session_selects_first_discovered_stream() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let session = open(&dir, &store).await;

        let ids: Vec<&str> = session.streams().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["GRUDZIEN", "STYCZEN"]);
        assert_eq!(session.active_path(), "w5g-grudzien.json");
        assert_eq!(session.stream_label(), "GRUDZIEN");
        assert!(!session.cycles().is_loaded());
        assert!(session.daily_roster().is_empty());
        assert!(session.fleet_stats().is_none());
    }

    #[tokio::test]
    async fn refused_listing_degrades_to_offline_streams() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        store.fail_listing(500);
        let session = open(&dir, &store).await;
        assert_eq!(session.streams(), offline_streams().as_slice());
        assert_eq!(session.stream_label(), "GRUDZIEN (OFFLINE)");
    }

    #[tokio::test]
    async fn reopen_restores_stream_document_and_revision() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let mut session = open(&dir, &store).await;
        let notice = session.switch_stream("w5g-styczen.json").await;
        assert_eq!(notice.level, NoticeLevel::Success);
        let revision = session.cycles().revision().map(str::to_string);
        assert!(revision.is_some());
        drop(session);

        let session = open(&dir, &store).await;
        assert_eq!(session.active_path(), "w5g-styczen.json");
        assert_eq!(session.cycles().cycle().unwrap().workers[0].name, "Cezary");
        assert_eq!(session.cycles().revision().map(str::to_string), revision);
    }

    #[tokio::test]
    async fn stale_active_stream_falls_back_to_first() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let cache = LocalCache::new(dir.path().join("cache"));
        cache.write(CacheSlot::ActiveStream, "w5g-luty.json").unwrap();

        let session = open(&dir, &store).await;
        assert_eq!(session.active_path(), "w5g-grudzien.json");
    }

    #[tokio::test]
    async fn cached_remote_config_overrides_file_values() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let cache = LocalCache::new(dir.path().join("cache"));
        cache
            .write(CacheSlot::Config, r#"{"owner":"acme","repo":"rosters","branch":"dev"}"#)
            .unwrap();

        let session = open(&dir, &store).await;
        assert_eq!(session.config().remote.repo_slug(), "acme/rosters");
        assert_eq!(session.config().remote.branch, "dev");
        assert_eq!(session.config().remote.api_base, "https://api.github.com");
    }

    #[tokio::test]
    async fn unreadable_group_matrix_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let cache = LocalCache::new(dir.path().join("cache"));
        cache.write(CacheSlot::Groups, "not json").unwrap();

        let session = open(&dir, &store).await;
        assert_eq!(session.groups(), &GroupTable::default());
    }

    #[tokio::test]
    async fn pull_edit_push_cycle() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let mut session = open(&dir, &store).await;

        assert_eq!(session.pull().await.level, NoticeLevel::Success);
        assert_eq!(session.cycles().months().len(), 2);

        let locked = session.set_shift(1, 1, "zw");
        assert_eq!(locked.level, NoticeLevel::Warning);
        assert_eq!(session.toggle_lock().level, NoticeLevel::Warning);
        assert_eq!(session.set_shift(1, 1, "zw").level, NoticeLevel::Info);

        // The edit reaches the cache before any push.
        let cache = LocalCache::new(dir.path().join("cache"));
        let (cached, _) = cache.read_document().unwrap().unwrap();
        assert_eq!(cached.workers[1].shifts[1], "ZW");
        assert!(store.puts().is_empty());

        assert_eq!(session.push().await.level, NoticeLevel::Success);
        let pushed = Cycle::from_json(&store.text("w5g-grudzien.json").unwrap()).unwrap();
        assert_eq!(pushed.workers[1].shifts, vec!["2", "ZW", "u", "N1"]);
        let (_, cached_revision) = cache.read_document().unwrap().unwrap();
        assert_eq!(cached_revision, store.sha("w5g-grudzien.json"));
        assert_eq!(session.cycles().revision().map(str::to_string), store.sha("w5g-grudzien.json"));
    }

    #[tokio::test]
    async fn push_after_remote_change_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let mut session = open(&dir, &store).await;
        session.pull().await;
        store.insert("w5g-grudzien.json", DEC);

        let notice = session.push().await;
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.starts_with("ERROR: PUSH_FAILED"));
    }

    #[tokio::test]
    async fn edits_without_document_are_ignored() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let mut session = open(&dir, &store).await;
        session.set_locked(false);
        assert_eq!(session.set_shift(0, 0, "1").message, "NO_DATA_LOADED");
        assert_eq!(session.push().await.message, "ERROR: NO_DATA_TO_PUSH");
    }

    #[tokio::test]
    async fn missing_credential_asks_for_login() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::without_credential());
        store.insert("w5g-grudzien.json", DEC);
        let mut session = open(&dir, &store).await;

        assert_eq!(session.pull().await.level, NoticeLevel::CredentialRequired);
        assert_eq!(session.publish_groups().await.level, NoticeLevel::CredentialRequired);
        assert!(!session.cycles().is_loaded());
        assert!(store.puts().is_empty());
    }

    #[tokio::test]
    async fn switching_to_missing_stream_drops_document() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let mut session = open(&dir, &store).await;
        session.pull().await;

        let same = session.switch_stream("w5g-grudzien.json").await;
        assert_eq!(same.level, NoticeLevel::Info);
        assert!(session.cycles().is_loaded());

        let missing = session.switch_stream("w5g-luty.json").await;
        assert_eq!(missing.message, "REMOTE_FILE_INVALID: w5g-luty.json (Check Branch?)");
        assert!(!session.cycles().is_loaded());
        assert_eq!(session.cycles().revision(), None);
        assert_eq!(session.stream_label(), UNKNOWN_STREAM_LABEL);
        drop(session);

        let reopened = open(&dir, &store).await;
        assert!(!reopened.cycles().is_loaded(), "previous stream's document must not come back");
    }

    #[tokio::test]
    async fn month_navigation_stops_at_edges() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let mut session = open(&dir, &store).await;
        session.pull().await;
        session.jump_to_day(0);

        let back = session.step_month(-1);
        assert_eq!(back.message, "END_OF_DATA_STREAM. CHECK_DATA_STREAM_SELECTOR");
        assert_eq!(session.cycles().current_day(), 0);

        assert_eq!(session.step_month(1).message, "MONTH: GRUDZIEN 2");
        assert_eq!(session.cycles().current_day(), 2);
        assert_eq!(session.step_month(1).level, NoticeLevel::Warning);

        assert!(session.step_day(1));
        assert!(!session.step_day(1));
        assert_eq!(session.cycles().current_day(), 3);
    }

    #[tokio::test]
    async fn month_step_after_jumping_past_the_end_reports_boundary() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let mut session = open(&dir, &store).await;
        assert_eq!(session.step_month(1).message, "NO_DATA_LOADED");

        session.pull().await;
        session.jump_to_day(99);
        let notice = session.step_month(1);
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.message, "END_OF_DATA_STREAM. CHECK_DATA_STREAM_SELECTOR");
        assert_eq!(session.cycles().current_day(), 99);
    }

    #[tokio::test]
    async fn operator_search_needs_a_document() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let mut session = open(&dir, &store).await;
        assert!(session.search_operators("").is_empty());

        session.pull().await;
        let found: Vec<usize> = session.search_operators("BEA").into_iter().map(|(idx, _)| idx).collect();
        assert_eq!(found, vec![1]);
        assert_eq!(session.search_operators("").len(), 2);
    }

    #[tokio::test]
    async fn views_follow_current_day() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let mut session = open(&dir, &store).await;
        session.pull().await;
        session.jump_to_day(3);

        let keys: Vec<String> = session.daily_roster().into_iter().map(|b| b.key).collect();
        assert_eq!(keys, vec!["1", "2"]);

        let stats = session.operator_stats(1).unwrap();
        assert_eq!(stats.group.as_deref(), Some("K"));
        assert!(session.operator_stats(9).is_none());
        assert_eq!(session.fleet_stats().unwrap().total_hours, 60);
    }

    #[tokio::test]
    async fn group_edits_are_validated_saved_and_published() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let mut session = open(&dir, &store).await;

        let duplicate = session.set_group_from("S", 0);
        assert_eq!(duplicate.level, NoticeLevel::Error);
        assert_eq!(session.groups().get("S").unwrap().from, 5);

        assert_eq!(session.set_group_from("S", 6).level, NoticeLevel::Success);
        assert_eq!(session.publish_groups().await.message, "REMOTE_CONFIG_SAVED: ustawienia.json");
        assert!(store.text("ustawienia.json").unwrap().contains("\"from\": 6"));
        drop(session);

        let session = open(&dir, &store).await;
        assert_eq!(session.groups().get("S").unwrap().from, 6);
    }

    #[tokio::test]
    async fn login_saves_remote_config() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let mut session = open(&dir, &store).await;

        let notice = session.login(" ghp_new ", "acme/rosters");
        assert_eq!(notice.message, "CONFIG_UPDATED");
        assert_eq!(session.config().remote.repo_slug(), "acme/rosters");

        let cache = LocalCache::new(dir.path().join("cache"));
        let saved: RemoteConfig =
            serde_json::from_str(&cache.read(CacheSlot::Config).unwrap().unwrap()).unwrap();
        assert_eq!(saved.token, "ghp_new");
        assert_eq!(saved.owner, "acme");
    }

    #[tokio::test]
    async fn failed_reconnect_keeps_previous_config() {
        let dir = TempDir::new().unwrap();
        let store = remote();
        let inner = Arc::clone(&store);
        let connect: Connector<Arc<MemoryStore>> = Box::new(move |config: &AppConfig| -> Result<Arc<MemoryStore>> {
            anyhow::ensure!(config.remote.owner != "broken", "cannot reach repository");
            Ok(Arc::clone(&inner))
        });
        let mut session = RosterSession::open(config(&dir), connect).await.unwrap();

        let notice = session.login("t", "broken/repo");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(session.config().remote.repo_slug(), "skokivpr/w5g.github.io");
    }
}
