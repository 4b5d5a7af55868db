//! Ville Core - coordinated task injection for multi-agent social simulations
//!
//! Decides what each participant of a shared goal is told, under two
//! coordination policies, and writes it into the participant's memory and
//! working state:
//!
//! 1. **Shared goal** (`MeetingTask`): symmetric knowledge of one plan
//! 2. **Partitioned goal** (`RescueTask`): complete plan for everyone, or a
//!    role-partitioned split delivered by a central coordinator
//!
//! Injection is best-effort per participant. Missing agent capabilities are
//! skipped one by one and reported, never raised.
//!
//! # Usage
//!
//! ```ignore
//! use ville_core::{CollabMode, MeetingTask, Task};
//!
//! let task = Task::from(MeetingTask::parse("20250213-11:00", "讨论新项目", None)?);
//! let report = task.inject(CollabMode::Centralized, &participants, &mut world, &clock)?;
//! ```

mod error;
mod meeting;
mod mode;
mod report;
mod rescue;
mod resolver;
mod task;
mod writer;

#[cfg(test)]
mod test_support;

pub use error::TaskError;
pub use meeting::{MeetingTask, MEETING_POIGNANCY, MEETING_URGENCY};
pub use mode::CollabMode;
pub use report::{InjectionEntry, InjectionReport};
pub use rescue::{RescueRole, RescueScenario, RescueStep, RescueTask, DEFAULT_PRIMARY, RESCUE_BASELINE_POIGNANCY};
pub use resolver::resolve_address;
pub use task::Task;
pub use writer::{append_reminder, elevate_urgency, write_thought, ThoughtOutcome};
