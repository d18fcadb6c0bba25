use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

const DEFAULT_OWNER: &str = "skokivpr";
const DEFAULT_REPO: &str = "w5g.github.io";

// ── Remote content store ─────────────────────────────────────────────────────

/// Where the roster documents live and how to authenticate against it.
///
/// This section is also mirrored into the local cache as JSON so a credential
/// entered at runtime (`rota login`) survives restarts without rewriting the
/// TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the contents API.  Overridden by `ROTA_API_BASE`.
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Path of the currently selected cycle document inside the repo.
    pub path: String,
    /// Bearer credential.  Empty means "not configured": pull and push refuse
    /// to run and ask for one instead.  `ROTA_TOKEN` takes precedence.
    pub token: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            branch: "main".to_string(),
            path: "w5g-grudzien.json".to_string(),
            token: String::new(),
        }
    }
}

impl RemoteConfig {
    pub fn has_credential(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Apply a user-entered repository reference.
    ///
    /// `owner/repo` sets both parts, a bare name only replaces the repo, and
    /// an empty value restores the default slug.
    pub fn apply_repo_slug(&mut self, slug: &str) {
        let slug = slug.trim();
        if slug.is_empty() {
            self.owner = DEFAULT_OWNER.to_string();
            self.repo = DEFAULT_REPO.to_string();
            return;
        }
        match slug.split_once('/') {
            Some((owner, repo)) => {
                self.owner = owner.to_string();
                self.repo = repo.to_string();
            }
            None => self.repo = slug.to_string(),
        }
    }

    pub fn repo_slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

// ── Stream naming ────────────────────────────────────────────────────────────

/// File naming convention used to discover cycle documents in the repo root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamsConfig {
    pub prefix: String,
    pub suffix: String,
    /// Bare file that matches the convention but is not a cycle document.
    pub reserved: String,
    /// Remote file the group matrix is published to.
    pub group_settings_file: String,
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            prefix: "w5g-".to_string(),
            suffix: ".json".to_string(),
            reserved: "w5g.json".to_string(),
            group_settings_file: "ustawienia.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: ".rota/cache".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Cooldown after a successful pull or push before the gateway reports
    /// idle again.  Set to `0` in tests and scripts.
    pub settle_ms: u64,
    /// Per-request timeout for the HTTP client.
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settle_ms: 3000,
            request_timeout_secs: 30,
        }
    }
}

/// Display settings.  `theme` selects which of a group's two colours is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// `dark` (default) or `light`.
    pub theme: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub streams: StreamsConfig,
    pub cache: CacheConfig,
    pub sync: SyncConfig,
    pub ui: UiConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    /// Re-apply environment overrides.  Called after loading the file and
    /// again after a cached remote section replaces the file's values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = env::var("ROTA_TOKEN") {
            if !token.is_empty() {
                self.remote.token = token;
            }
        }

        if let Ok(base) = env::var("ROTA_API_BASE") {
            if !base.is_empty() {
                self.remote.api_base = base;
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
