//! Ville Simulation Driver
//!
//! Runs a village of generative agents step by step, persisting the whole
//! evolving config after every step so an interrupted run can be resumed
//! from the last snapshot.
//!
//! # Run lifecycle
//!
//! 1. **Bootstrap**: a fresh config (or the latest snapshot, one stride
//!    later) plus the conversation log builds the world and the clock
//! 2. **Injection**: coordination tasks are injected once, only when the run
//!    starts at step 0
//! 3. **Stepping**: each step asks every agent to think, merges the results
//!    into the config, writes a snapshot and the conversation log, then
//!    advances the clock
//!
//! # Checkpoint folder
//!
//! ```text
//! results/checkpoints/<name>/
//! ├── simulate-20240213-0930.json   one full snapshot per step
//! ├── simulate-20240213-0940.json
//! └── conversation.json             overwritten every step
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use ville_sim::{CheckpointStore, ScriptedWorld, SimClock, SimulationScheduler};
//!
//! let store = CheckpointStore::create("results/checkpoints/sim-test")?;
//! let world = ScriptedWorld::from_config(&config, store.load_conversation()?, 42)?;
//! let clock = SimClock::from_stamp(config.time.stamp())?;
//! let mut scheduler = SimulationScheduler::new(world, clock, store, config, 0, static_root)?;
//! scheduler.inject_tasks(&options.task_requests()?);
//! scheduler.simulate(10, 10)?;
//! ```

mod checkpoint;
mod clock;
mod error;
mod scheduler;
mod world;
pub mod config;

pub use checkpoint::{CheckpointStore, ResumePoint, CONVERSATION_FILE};
pub use clock::SimClock;
pub use config::{
    fresh_config, ConfigTime, MeetingOptions, RunOptions, SimulationConfig, TaskMode, TaskRequest,
};
pub use error::SimError;
pub use scheduler::{SimulationScheduler, SimulationSummary};
pub use world::{agent_seed, PlaceIndex, ScriptedAgent, ScriptedMemory, ScriptedWorld};
