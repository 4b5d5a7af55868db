//! Ville Environment Abstraction Layer
//!
//! This crate defines the contracts between the simulation core and its
//! collaborators, so the same injection and stepping code can run against
//! a language-model-backed game world in production or an in-process
//! scripted world in tests.
//!
//! # Collaborators
//!
//! - **Agent** (`VilleAgent`): name, current tile, and a set of optional
//!   capabilities (spatial lookup, memory store, working state, status)
//! - **World** (`VilleWorld`): agent registry, cognition, conversation log
//! - **Clock** (`VilleClock`): simulated time that only moves on `forward`
//!
//! # Example
//!
//! ```ignore
//! use ville_env::{AgentStatus, Coord, EnvError, VilleClock, VilleWorld};
//!
//! fn step<W: VilleWorld, C: VilleClock>(
//!     world: &mut W,
//!     clock: &C,
//!     stride: i64,
//! ) -> Result<(), EnvError> {
//!     for name in world.agent_names() {
//!         let mut status = AgentStatus::at(Coord(0, 0));
//!         let plan = world.agent_think(&name, &status)?.plan;
//!         if let Some(last) = plan.path.last() {
//!             status.coord = *last;
//!         }
//!     }
//!     clock.forward(stride);
//!     Ok(())
//! }
//! ```

mod agent;
mod clock;
mod error;
mod types;
mod world;

pub use agent::{ConceptMemory, SpatialMemory, UrgencyCarrier, VilleAgent};
pub use clock::{format_stamp, parse_stamp, VilleClock, STAMP_FORMAT};
pub use error::EnvError;
pub use types::{
    Address, AgentStatus, ConceptId, ConceptKind, ConceptNode, ConceptTiming, Conversation,
    Coord, Event, Plan, RuntimeStatus, Scratch, ThinkOutput,
};
pub use world::VilleWorld;
