//! Per-participant record of what an injection did.

use crate::mode::CollabMode;
use crate::writer::ThoughtOutcome;
use serde::Serialize;
use ville_env::Address;

/// What one participant received.
#[derive(Debug, Clone, Serialize)]
pub struct InjectionEntry {
    pub agent: String,

    /// Role label for partitioned tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,

    /// Location the injected event is anchored at
    pub address: Address,

    /// Text written into the thought record
    pub describe: String,

    pub thought: ThoughtOutcome,

    /// A reminder was appended to `currently`
    pub reminder_appended: bool,

    /// Agent-level urgency was raised
    pub urgency_raised: bool,
}

impl InjectionEntry {
    pub fn new(
        agent: &str,
        role: Option<&'static str>,
        address: Address,
        describe: String,
        thought: ThoughtOutcome,
    ) -> Self {
        Self {
            agent: agent.to_string(),
            role,
            address,
            describe,
            thought,
            reminder_appended: false,
            urgency_raised: false,
        }
    }
}

/// Summary of one task setup.
#[derive(Debug, Clone, Serialize)]
pub struct InjectionReport {
    pub task: &'static str,
    pub mode: CollabMode,
    pub entries: Vec<InjectionEntry>,

    /// Participants that are not registered in the world
    pub skipped: Vec<String>,
}

impl InjectionReport {
    /// Creates an empty report.
    pub fn new(task: &'static str, mode: CollabMode) -> Self {
        Self {
            task,
            mode,
            entries: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Returns the first entry for `agent`.
    pub fn entry(&self, agent: &str) -> Option<&InjectionEntry> {
        self.entries.iter().find(|e| e.agent == agent)
    }

    /// Returns the first entry for `agent` for mutation.
    pub fn entry_mut(&mut self, agent: &str) -> Option<&mut InjectionEntry> {
        self.entries.iter_mut().find(|e| e.agent == agent)
    }

    /// Number of thought records actually created.
    pub fn written_count(&self) -> usize {
        self.entries.iter().filter(|e| e.thought.is_written()).count()
    }
}
