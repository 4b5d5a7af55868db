//! Error types for the simulation driver.

use std::path::PathBuf;
use thiserror::Error;
use ville_env::EnvError;

/// Errors that stop a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Reading or writing a checkpoint file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A checkpoint or static file is not valid JSON for its schema
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The cognition collaborator failed; the run halts
    #[error("Cognition failed for agent {agent}: {source}")]
    Cognition {
        agent: String,
        #[source]
        source: EnvError,
    },

    /// Configuration is inconsistent or malformed
    #[error("Config error: {0}")]
    Config(String),

    /// Collaborator contract violation outside of cognition
    #[error(transparent)]
    Env(#[from] EnvError),
}

impl SimError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a JSON error for `path`.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Creates a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
