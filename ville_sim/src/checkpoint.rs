//! Filesystem checkpoint store.
//!
//! One folder per simulation holds a full config snapshot per step, named
//! `simulate-<YYYYMMDD-HHMM>.json` so lexical order is time order, plus a
//! single `conversation.json` that is overwritten every step.

use crate::config::{agent_config_path, ConfigTime, SimulationConfig};
use crate::error::SimError;
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use ville_env::{format_stamp, parse_stamp, Conversation};

/// Name of the conversation log inside a checkpoint folder.
pub const CONVERSATION_FILE: &str = "conversation.json";

const SNAPSHOT_PREFIX: &str = "simulate-";

/// Where a resumed run picks up.
#[derive(Debug, Clone)]
pub struct ResumePoint {
    /// Latest snapshot with `time.start` one stride past its stamp
    pub config: SimulationConfig,

    /// Steps already completed
    pub start_step: u64,
}

/// Checkpoint folder of one simulation.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Opens `dir` without touching the filesystem.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Opens `dir`, creating it if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, SimError> {
        let store = Self::open(dir);
        fs::create_dir_all(&store.dir).map_err(|e| SimError::io(&store.dir, e))?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns true if the folder exists.
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Snapshot file for a `%Y%m%d-%H:%M` stamp.
    pub fn snapshot_path(&self, stamp: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}.json", SNAPSHOT_PREFIX, stamp.replace(':', "")))
    }

    pub fn conversation_path(&self) -> PathBuf {
        self.dir.join(CONVERSATION_FILE)
    }

    /// Writes a full snapshot of `config`, keyed by its current time.
    pub fn write_snapshot(&self, config: &SimulationConfig) -> Result<PathBuf, SimError> {
        let path = self.snapshot_path(config.time.stamp());
        write_json(&path, config)?;
        Ok(path)
    }

    /// Overwrites the conversation log.
    pub fn write_conversation(&self, conversation: &Conversation) -> Result<PathBuf, SimError> {
        let path = self.conversation_path();
        write_json(&path, conversation)?;
        Ok(path)
    }

    /// Loads the conversation log, or an empty one if none was written yet.
    pub fn load_conversation(&self) -> Result<Conversation, SimError> {
        let path = self.conversation_path();
        if !path.exists() {
            return Ok(Conversation::new());
        }
        read_json(&path)
    }

    /// Snapshot files in lexical (and therefore time) order.
    pub fn snapshot_files(&self) -> Result<Vec<PathBuf>, SimError> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| SimError::io(&self.dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SimError::io(&self.dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") && name != CONVERSATION_FILE {
                names.push(name);
            }
        }
        names.sort();
        Ok(names.into_iter().map(|n| self.dir.join(n)).collect())
    }

    /// Reads the most recent snapshot.
    pub fn latest_snapshot(&self) -> Result<Option<SimulationConfig>, SimError> {
        match self.snapshot_files()?.last() {
            Some(path) => read_json(path).map(Some),
            None => Ok(None),
        }
    }

    /// Builds the resume point from the most recent snapshot.
    ///
    /// The next run starts one stride after the snapshot's time and continues
    /// the step count; agent config paths are re-pointed at `assets_root`.
    pub fn resume_point(&self, assets_root: &str) -> Result<Option<ResumePoint>, SimError> {
        let Some(mut config) = self.latest_snapshot()? else {
            return Ok(None);
        };

        let last = parse_stamp(config.time.stamp())?;
        let start = format_stamp(last + Duration::minutes(config.stride));
        debug!("resuming after {} at {} (step {})", config.time.stamp(), start, config.step);
        config.time = ConfigTime::Start { start };

        for (name, entry) in config.agents.iter_mut() {
            entry.insert(
                "config_path".into(),
                Value::from(agent_config_path(assets_root, name)),
            );
        }

        let start_step = config.step;
        Ok(Some(ResumePoint { config, start_step }))
    }
}

/// Writes pretty JSON through a `.tmp` sibling so readers never see a
/// truncated file.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SimError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| SimError::json(path, e))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json).map_err(|e| SimError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| SimError::io(path, e))
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SimError> {
    let raw = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| SimError::json(path, e))
}
