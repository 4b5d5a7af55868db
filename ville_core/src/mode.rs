//! Coordination policies.

use serde::{Deserialize, Serialize};

/// How information about a shared goal reaches the participants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollabMode {
    /// Decentralized: every participant independently remembers the
    /// complete plan as a thought
    #[default]
    Baseline,

    /// An authoritative channel: memory plus working-state reminders and
    /// raised urgency, optionally partitioned by role
    Centralized,
}

impl CollabMode {
    /// Returns all modes.
    pub fn all() -> Vec<CollabMode> {
        vec![CollabMode::Baseline, CollabMode::Centralized]
    }

    /// Returns the mode name.
    pub fn name(&self) -> &'static str {
        match self {
            CollabMode::Baseline => "baseline",
            CollabMode::Centralized => "centralized",
        }
    }

    /// Returns a description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            CollabMode::Baseline => "soft memory injection only",
            CollabMode::Centralized => "soft memory + system reminder + raised urgency",
        }
    }
}

impl std::fmt::Display for CollabMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for CollabMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" => Ok(CollabMode::Baseline),
            "centralized" => Ok(CollabMode::Centralized),
            _ => Err(format!("Unknown collaboration mode: {}", s)),
        }
    }
}
