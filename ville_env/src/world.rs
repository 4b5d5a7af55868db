//! World contract: agent registry plus the cognition entry point.

use crate::agent::VilleAgent;
use crate::error::EnvError;
use crate::types::{AgentStatus, Conversation, ThinkOutput};

/// The game world hosting all agents.
///
/// `agent_think` is a blocking call from the scheduler's point of view; it
/// may do arbitrary work (including network calls to a language model) and
/// its errors are fatal to the run.
pub trait VilleWorld {
    /// Names of all registered agents, in a stable order.
    fn agent_names(&self) -> Vec<String>;

    /// Returns true if an agent with this name is registered.
    fn contains_agent(&self, name: &str) -> bool;

    /// Looks up an agent.
    fn agent(&self, name: &str) -> Option<&dyn VilleAgent>;

    /// Looks up an agent for mutation.
    fn agent_mut(&mut self, name: &str) -> Option<&mut dyn VilleAgent>;

    /// Asks the agent's cognition for its next plan.
    fn agent_think(&mut self, name: &str, status: &AgentStatus) -> Result<ThinkOutput, EnvError>;

    /// Dialogue log persisted alongside every checkpoint.
    fn conversation(&self) -> &Conversation;
}
