//! Error types for the Ville collaborator contracts.

use thiserror::Error;

/// Errors raised by agent, world and clock collaborators.
#[derive(Debug, Error)]
pub enum EnvError {
    /// No agent is registered under this name
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),
    
    /// An address path must contain at least one location name
    #[error("Address path is empty")]
    EmptyAddress,
    
    /// The memory store rejected the `create`/`expire` arguments
    #[error("Memory store does not accept timing arguments")]
    TimingUnsupported,
    
    /// The memory store failed internally
    #[error("Memory error: {0}")]
    MemoryError(String),
    
    /// The cognition collaborator failed to produce a plan
    #[error("Cognition error: {0}")]
    CognitionError(String),
    
    /// A simulated timestamp could not be parsed
    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

impl EnvError {
    /// Creates a memory error.
    pub fn memory(msg: impl Into<String>) -> Self {
        Self::MemoryError(msg.into())
    }
    
    /// Creates a cognition error.
    pub fn cognition(msg: impl Into<String>) -> Self {
        Self::CognitionError(msg.into())
    }
}
