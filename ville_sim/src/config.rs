//! Run options and the evolving simulation config.
//!
//! `SimulationConfig` is the document written into every checkpoint. Keys
//! the driver does not interpret (`maze`, `agent_base`, ...) ride along in
//! `extra` so a resumed run writes them back unchanged.

use crate::checkpoint::CheckpointStore;
use crate::error::SimError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use ville_core::{CollabMode, MeetingTask, RescueTask, Task, TaskError};
use ville_env::parse_stamp;

/// Personas simulated when none are configured.
pub const DEFAULT_PERSONAS: [&str; 2] = ["简", "汤姆"];

/// Default simulated start time.
pub const DEFAULT_START: &str = "20240213-09:30";

/// Default assets tree, relative to the static root.
pub const DEFAULT_ASSETS_ROOT: &str = "assets/village";

/// Simulated time as stored in the config.
///
/// A config that has not been stepped yet (fresh or freshly resumed) holds
/// `{"start": stamp}`; after a step it holds the bare stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigTime {
    Start { start: String },
    Stamp(String),
}

impl ConfigTime {
    /// Returns the `%Y%m%d-%H:%M` stamp in either form.
    pub fn stamp(&self) -> &str {
        match self {
            ConfigTime::Start { start } => start,
            ConfigTime::Stamp(stamp) => stamp,
        }
    }
}

/// The evolving simulation config, persisted as one checkpoint per step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Minutes advanced per step
    pub stride: i64,

    pub time: ConfigTime,

    /// Number of completed steps
    #[serde(default)]
    pub step: u64,

    /// Per-agent entries, merged with each agent's dict after every step
    #[serde(default)]
    pub agents: BTreeMap<String, Map<String, Value>>,

    /// Keys carried through without interpretation
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SimulationConfig {
    /// Shared defaults for every agent entry, if any.
    pub fn agent_base(&self) -> Option<&Map<String, Value>> {
        self.extra.get("agent_base").and_then(Value::as_object)
    }
}

/// Path of a persona's static config, relative to the static root.
pub fn agent_config_path(assets_root: &str, name: &str) -> String {
    format!("{}/agents/{}/agent.json", assets_root, name.replace(' ', "_"))
}

/// Builds the config for a fresh run.
pub fn fresh_config(
    start: &str,
    stride: i64,
    personas: &[String],
    assets_root: &str,
    agent_base: Option<Map<String, Value>>,
) -> SimulationConfig {
    let mut extra = Map::new();
    let mut maze = Map::new();
    maze.insert("path".into(), Value::from(format!("{}/maze.json", assets_root)));
    extra.insert("maze".into(), Value::Object(maze));
    if let Some(base) = agent_base {
        extra.insert("agent_base".into(), Value::Object(base));
    }

    let agents = personas
        .iter()
        .map(|name| {
            let mut entry = Map::new();
            entry.insert(
                "config_path".into(),
                Value::from(agent_config_path(assets_root, name)),
            );
            (name.clone(), entry)
        })
        .collect();

    SimulationConfig {
        stride,
        time: ConfigTime::Start {
            start: start.to_string(),
        },
        step: 0,
        agents,
        extra,
    }
}

/// Special cooperative task requested for a fresh run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskMode {
    #[default]
    None,
    EddieRescue,
}

impl TaskMode {
    /// Returns all task modes.
    pub fn all() -> Vec<TaskMode> {
        vec![TaskMode::None, TaskMode::EddieRescue]
    }

    /// Returns the task mode name.
    pub fn name(&self) -> &'static str {
        match self {
            TaskMode::None => "none",
            TaskMode::EddieRescue => "eddie_rescue",
        }
    }
}

impl std::fmt::Display for TaskMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for TaskMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(TaskMode::None),
            "eddie_rescue" | "eddie-rescue" | "rescue" => Ok(TaskMode::EddieRescue),
            _ => Err(format!("Unknown task mode: {}", s)),
        }
    }
}

/// Meeting parameters from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingOptions {
    /// `%Y%m%d-%H:%M`
    pub time: String,
    pub topic: String,
    pub place: Option<String>,
}

/// A task plus who receives it and how.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub task: Task,
    pub mode: CollabMode,
    pub participants: Vec<String>,
}

/// Everything a run needs, passed explicitly into bootstrap.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Simulation name; also the checkpoint folder name
    pub name: String,
    pub checkpoints_root: PathBuf,
    pub static_root: PathBuf,

    /// Assets tree relative to `static_root`
    pub assets_root: String,

    /// Start stamp for a fresh run
    pub start: String,
    pub resume: bool,
    pub step: u64,
    pub stride: i64,
    pub collab_mode: CollabMode,
    pub meeting: Option<MeetingOptions>,
    pub task_mode: TaskMode,
    pub personas: Vec<String>,

    /// Seed for the scripted world
    pub seed: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            checkpoints_root: PathBuf::from("results/checkpoints"),
            static_root: PathBuf::from("frontend/static"),
            assets_root: DEFAULT_ASSETS_ROOT.to_string(),
            start: DEFAULT_START.to_string(),
            resume: false,
            step: 10,
            stride: 10,
            collab_mode: CollabMode::Baseline,
            meeting: None,
            task_mode: TaskMode::None,
            personas: DEFAULT_PERSONAS.iter().map(|p| p.to_string()).collect(),
            seed: 42,
        }
    }
}

impl RunOptions {
    /// Folder holding this run's checkpoints.
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.checkpoints_root.join(&self.name)
    }

    /// Rejects options that cannot produce a run.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.name.trim().is_empty() {
            return Err(SimError::config("simulation name is empty"));
        }
        if self.stride < 0 {
            return Err(SimError::config(format!("negative stride: {}", self.stride)));
        }
        if !self.resume {
            parse_stamp(&self.start)?;
        }
        self.task_requests()
            .map_err(|e| SimError::config(e.to_string()))?;
        Ok(())
    }

    /// Validates the options, then opens the checkpoint folder.
    ///
    /// A fresh run needs an unused name and creates the folder; a resumed
    /// run needs an existing one. Nothing is created when any check fails.
    pub fn open_store(&self) -> Result<CheckpointStore, SimError> {
        self.validate()?;

        let dir = self.checkpoint_dir();
        if self.resume && !dir.is_dir() {
            return Err(SimError::config(format!(
                "'{}' doesn't exist, nothing to resume",
                self.name
            )));
        }
        if !self.resume && dir.exists() {
            return Err(SimError::config(format!(
                "the name '{}' already exists, choose a new one",
                self.name
            )));
        }
        CheckpointStore::create(dir)
    }

    /// Tasks requested for a fresh run, meeting first.
    pub fn task_requests(&self) -> Result<Vec<TaskRequest>, TaskError> {
        let mut requests = Vec::new();

        if let Some(meeting) = &self.meeting {
            let task = MeetingTask::parse(&meeting.time, meeting.topic.clone(), meeting.place.clone())?;
            requests.push(TaskRequest {
                task: task.into(),
                mode: self.collab_mode,
                participants: self.personas.clone(),
            });
        }

        if self.task_mode == TaskMode::EddieRescue {
            requests.push(TaskRequest {
                task: RescueTask::default().into(),
                mode: self.collab_mode,
                participants: self.personas.clone(),
            });
        }

        Ok(requests)
    }
}
