//! Agent capability contracts.
//!
//! Agents in a running simulation are heterogeneous: some expose a spatial
//! index, some a memory store that predates timed records, some carry their
//! runtime status as a loose key/value map. Every optional capability is
//! probed through an accessor returning `Option`, so callers can skip a
//! missing capability without treating it as a failure.

use crate::error::EnvError;
use crate::types::{Address, ConceptId, ConceptKind, ConceptNode, ConceptTiming, Event, RuntimeStatus, Scratch};
use serde_json::{Map, Value};

/// Keyword lookup of known places.
pub trait SpatialMemory {
    /// Resolves a human keyword (e.g. "Tom and Jane's bedroom") to an address.
    ///
    /// Returns `None` on a miss.
    fn find_address(&self, keyword: &str) -> Option<Address>;
}

/// An agent's associative memory store.
pub trait ConceptMemory {
    /// Adds a record and returns a handle to it if the store exposes one.
    ///
    /// Stores that predate timed records return
    /// [`EnvError::TimingUnsupported`] when `timing` is `Some`; callers are
    /// expected to retry with `None`.
    fn add_concept(
        &mut self,
        kind: ConceptKind,
        event: Event,
        timing: Option<ConceptTiming>,
    ) -> Result<Option<ConceptId>, EnvError>;

    /// Returns a mutable reference to a previously added record.
    fn concept_mut(&mut self, id: ConceptId) -> Option<&mut ConceptNode>;
}

/// Carrier of an agent-level urgency score.
///
/// Implemented both for attribute-style status structs and for mapping-style
/// status dictionaries.
pub trait UrgencyCarrier {
    /// Current urgency, or `None` if the carrier holds a non-numeric value.
    fn poignancy(&self) -> Option<f64>;

    /// Raises the urgency to at least `floor`; a higher value is kept as is.
    ///
    /// Returns false, leaving the carrier untouched, if the urgency is not
    /// numeric.
    fn raise_poignancy(&mut self, floor: u32) -> bool;
}

impl UrgencyCarrier for RuntimeStatus {
    fn poignancy(&self) -> Option<f64> {
        Some(f64::from(self.poignancy))
    }

    fn raise_poignancy(&mut self, floor: u32) -> bool {
        self.poignancy = self.poignancy.max(floor);
        true
    }
}

impl UrgencyCarrier for Map<String, Value> {
    fn poignancy(&self) -> Option<f64> {
        match self.get("poignancy") {
            None | Some(Value::Null) => Some(0.0),
            Some(value) => value.as_f64().filter(|p| p.is_finite()),
        }
    }

    fn raise_poignancy(&mut self, floor: u32) -> bool {
        match self.poignancy() {
            Some(current) if current >= f64::from(floor) => true,
            Some(_) => {
                self.insert("poignancy".to_string(), Value::from(floor));
                true
            }
            None => false,
        }
    }
}

/// A simulated person.
///
/// Only the name, current tile and dictionary form are mandatory; every
/// other capability defaults to absent.
pub trait VilleAgent {
    /// Agent identifier.
    fn name(&self) -> &str;

    /// Address of the tile the agent is standing on.
    fn tile_address(&self) -> Address;

    /// Keyword lookup of places this agent knows about.
    fn spatial(&self) -> Option<&dyn SpatialMemory> {
        None
    }

    /// Associative memory store.
    fn memory_mut(&mut self) -> Option<&mut dyn ConceptMemory> {
        None
    }

    /// Working state.
    fn scratch_mut(&mut self) -> Option<&mut Scratch> {
        None
    }

    /// Runtime status carrying the urgency score.
    fn status_mut(&mut self) -> Option<&mut dyn UrgencyCarrier> {
        None
    }

    /// Externally visible representation merged into checkpoints.
    fn to_dict(&self) -> Map<String, Value>;
}
