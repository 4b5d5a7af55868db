//! Shared data model for the Ville simulation.

use crate::error::EnvError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered location path, outermost first (world, sector, arena, object).
///
/// Never empty: every constructor rejects an empty path, so `leaf()` always
/// has something to return.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Address(Vec<String>);

impl Address {
    /// Creates an address from its parts.
    pub fn new<I, S>(parts: I) -> Result<Self, EnvError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        if parts.is_empty() {
            return Err(EnvError::EmptyAddress);
        }
        Ok(Self(parts))
    }

    /// Returns the path components.
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Returns the innermost location name.
    pub fn leaf(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    /// Joins the path with the given separator.
    pub fn joined(&self, sep: &str) -> String {
        self.0.join(sep)
    }
}

impl TryFrom<Vec<String>> for Address {
    type Error = EnvError;

    fn try_from(parts: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(parts)
    }
}

impl From<Address> for Vec<String> {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.joined(":"))
    }
}

/// A subject-predicate-object triple anchored at a location.
///
/// This is the payload written into an agent's memory. It has no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    subject: String,
    predicate: String,
    object: String,
    address: Address,
    describe: String,
}

impl Event {
    /// Creates a new event.
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        address: Address,
        describe: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            address,
            describe: describe.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Natural-language description fed to the agent's planner.
    pub fn describe(&self) -> &str {
        &self.describe
    }
}

/// Kind of memory record held by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConceptKind {
    /// Something the agent perceived
    Event,

    /// A line of dialogue
    Chat,

    /// An internal belief or plan
    Thought,
}

/// Handle to a record inside an agent's memory store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptId(pub usize);

/// Optional lifetime bounds for a new memory record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConceptTiming {
    pub create: Option<NaiveDateTime>,
    pub expire: Option<NaiveDateTime>,
}

impl ConceptTiming {
    /// Timing with both bounds set.
    pub fn new(create: NaiveDateTime, expire: NaiveDateTime) -> Self {
        Self {
            create: Some(create),
            expire: Some(expire),
        }
    }

    /// Returns true if neither bound is set.
    pub fn is_empty(&self) -> bool {
        self.create.is_none() && self.expire.is_none()
    }
}

/// A memory record owned by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptNode {
    pub kind: ConceptKind,
    pub event: Event,
    pub create: Option<NaiveDateTime>,
    pub expire: Option<NaiveDateTime>,
    pub poignancy: u32,
}

impl ConceptNode {
    /// Creates a record with the given timing and starting poignancy.
    pub fn new(kind: ConceptKind, event: Event, timing: ConceptTiming, poignancy: u32) -> Self {
        Self {
            kind,
            event,
            create: timing.create,
            expire: timing.expire,
            poignancy,
        }
    }

    /// Raises poignancy to at least `floor` and returns the new value.
    ///
    /// Poignancy never decreases through this call.
    pub fn raise_poignancy(&mut self, floor: u32) -> u32 {
        self.poignancy = self.poignancy.max(floor);
        self.poignancy
    }
}

/// Short-lived working state fed into the agent's next planning request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scratch {
    /// Free-text description of what the agent is currently about
    pub currently: String,
}

impl Scratch {
    /// Appends text to `currently`, keeping what was there.
    pub fn append_currently(&mut self, text: &str) {
        self.currently.push_str(text);
    }
}

/// Agent-level runtime state carried as plain fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStatus {
    /// Accumulated urgency; high values make the agent reflect and replan
    pub poignancy: u32,
}

/// Tile coordinate on the world map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord(pub i32, pub i32);

/// Positional status tracked by the scheduler and handed to cognition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub coord: Coord,

    /// Pending path, cleared once consumed
    pub path: Vec<Coord>,
}

impl AgentStatus {
    /// Creates a status at `coord` with no pending path.
    pub fn at(coord: Coord) -> Self {
        Self {
            coord,
            path: Vec::new(),
        }
    }
}

/// Plan produced by the cognition collaborator for one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub path: Vec<Coord>,
}

/// Result of asking an agent to think.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkOutput {
    pub plan: Plan,
}

/// Dialogue log keyed by participant pair or session.
pub type Conversation = BTreeMap<String, serde_json::Value>;
