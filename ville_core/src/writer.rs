//! Memory writer - the unit of injection shared by every task.
//!
//! Three primitives, each best-effort and independent:
//! - [`write_thought`]: add one "thought" record and raise its poignancy
//! - [`append_reminder`]: extend the agent's `currently` working state
//! - [`elevate_urgency`]: raise the agent-level urgency score
//!
//! None of them returns an error. A missing capability or a failing store
//! is logged and reported through the return value so that the caller can
//! carry on with the next participant.

use serde::Serialize;
use tracing::{debug, warn};
use ville_env::{ConceptKind, ConceptTiming, EnvError, Event, VilleAgent};

/// What happened when writing a thought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ThoughtOutcome {
    /// Record created; poignancy is the value after elevation
    Recorded { poignancy: u32, timed: bool },

    /// Record created but the store exposed no handle to elevate
    Untracked { timed: bool },

    /// Agent has no memory store
    NoMemory,

    /// The memory store failed
    Failed { error: String },
}

impl ThoughtOutcome {
    /// Returns true if a record was created.
    pub fn is_written(&self) -> bool {
        matches!(self, ThoughtOutcome::Recorded { .. } | ThoughtOutcome::Untracked { .. })
    }
}

/// Writes one thought record holding `event` into the agent's memory.
///
/// The timed call is attempted first; a store that rejects timing arguments
/// gets a second call without them. The created record's poignancy is then
/// raised to `max(current, poignancy_floor)`.
pub fn write_thought(
    agent: &mut dyn VilleAgent,
    event: Event,
    poignancy_floor: u32,
    timing: ConceptTiming,
) -> ThoughtOutcome {
    let name = agent.name().to_string();
    let Some(memory) = agent.memory_mut() else {
        debug!("{}: no memory store, thought skipped", name);
        return ThoughtOutcome::NoMemory;
    };

    let added = if timing.is_empty() {
        memory.add_concept(ConceptKind::Thought, event, None).map(|id| (id, false))
    } else {
        match memory.add_concept(ConceptKind::Thought, event.clone(), Some(timing)) {
            Err(EnvError::TimingUnsupported) => {
                debug!("{}: memory store rejects timing, retrying without", name);
                memory.add_concept(ConceptKind::Thought, event, None).map(|id| (id, false))
            }
            other => other.map(|id| (id, true)),
        }
    };

    match added {
        Ok((Some(id), timed)) => match memory.concept_mut(id) {
            Some(node) => ThoughtOutcome::Recorded {
                poignancy: node.raise_poignancy(poignancy_floor),
                timed,
            },
            None => ThoughtOutcome::Untracked { timed },
        },
        Ok((None, timed)) => ThoughtOutcome::Untracked { timed },
        Err(e) => {
            warn!("{}: failed to add thought: {}", name, e);
            ThoughtOutcome::Failed { error: e.to_string() }
        }
    }
}

/// Appends `text` to the agent's `currently` working state.
///
/// Returns false if the agent has no working state.
pub fn append_reminder(agent: &mut dyn VilleAgent, text: &str) -> bool {
    let name = agent.name().to_string();
    match agent.scratch_mut() {
        Some(scratch) => {
            scratch.append_currently(text);
            true
        }
        None => {
            debug!("{}: no working state, reminder skipped", name);
            false
        }
    }
}

/// Raises the agent-level urgency to at least `floor`.
///
/// Returns false if the agent has no status or its urgency is not numeric.
pub fn elevate_urgency(agent: &mut dyn VilleAgent, floor: u32) -> bool {
    let name = agent.name().to_string();
    let Some(status) = agent.status_mut() else {
        debug!("{}: no runtime status, urgency unchanged", name);
        return false;
    };
    let raised = status.raise_poignancy(floor);
    if !raised {
        debug!("{}: non-numeric urgency, left unchanged", name);
    }
    raised
}
