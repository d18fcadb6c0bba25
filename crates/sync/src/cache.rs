//! Local cache mirror: four named slots persisted as opaque strings.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

use rota_roster::Cycle;

/// Top-level field carrying the content hash inside a cached document.
const REVISION_FIELD: &str = "_sha";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSlot {
    /// Remote connection settings (credential, owner, repo, path, branch).
    Config,
    /// Text of the current cycle document.
    Document,
    /// Path of the last active stream.
    ActiveStream,
    /// Group matrix JSON.
    Groups,
}

impl CacheSlot {
    fn file_name(self) -> &'static str {
        match self {
            Self::Config => "config.json",
            Self::Document => "document.json",
            Self::ActiveStream => "active_stream",
            Self::Groups => "groups.json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, slot: CacheSlot) -> PathBuf {
        self.dir.join(slot.file_name())
    }

    /// `Ok(None)` when the slot has never been written.
    pub fn read(&self, slot: CacheSlot) -> Result<Option<String>> {
        let path = self.path(slot);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Replace a slot.  The value goes to a `.tmp` sibling first and is
    /// renamed into place, so a crash never leaves a half-written slot.
    pub fn write(&self, slot: CacheSlot, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(slot);
        let tmp_path = path.with_file_name(format!("{}.tmp", slot.file_name()));

        if let Err(err) = fs::write(&tmp_path, value) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        if let Err(err) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        Ok(())
    }

    /// Cache the document together with the revision it corresponds to.
    ///
    /// The slot holds the cycle re-serialized by [`Cycle::to_pretty_json`]
    /// with the revision under `_sha`, not the raw text fetched from the
    /// remote store.
    pub fn write_document(&self, cycle: &Cycle, revision: Option<&str>) -> Result<()> {
        let mut snapshot = cycle.clone();
        match revision {
            Some(sha) => {
                snapshot
                    .extra
                    .insert(REVISION_FIELD.to_string(), Value::String(sha.to_string()));
            }
            None => {
                snapshot.extra.remove(REVISION_FIELD);
            }
        }
        self.write(CacheSlot::Document, &snapshot.to_pretty_json()?)
    }

    /// Read back a cached document and the revision stored alongside it, if
    /// any.  Plain documents without a revision are accepted too.
    pub fn read_document(&self) -> Result<Option<(Cycle, Option<String>)>> {
        let Some(raw) = self.read(CacheSlot::Document)? else {
            return Ok(None);
        };
        let mut cycle = Cycle::from_json(&raw).context("cached document is not a valid cycle")?;
        let revision = match cycle.extra.remove(REVISION_FIELD) {
            Some(Value::String(sha)) => Some(sha),
            _ => None,
        };
        Ok(Some((cycle, revision)))
    }

    /// Remove a slot; clearing an empty slot is not an error.
    pub fn clear(&self, slot: CacheSlot) -> Result<()> {
        let path = self.path(slot);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
