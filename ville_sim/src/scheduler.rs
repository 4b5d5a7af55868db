//! Simulation scheduler - steps every agent and checkpoints each step.

use crate::checkpoint::{read_json, CheckpointStore};
use crate::clock::SimClock;
use crate::config::{ConfigTime, SimulationConfig, TaskRequest};
use crate::error::SimError;

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use ville_core::{InjectionReport, Task};
use ville_env::{AgentStatus, Coord, VilleClock, VilleWorld};

/// Outcome of one `simulate` call.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    /// Step count before the call
    pub first_step: u64,

    /// Step count after the call
    pub last_step: u64,

    /// Steps completed by this call
    pub steps_run: u64,

    /// The stop flag ended the run early
    pub stopped: bool,

    /// Simulated time after the last step
    pub final_time: String,

    /// Snapshot files written, in order
    pub checkpoints: Vec<PathBuf>,
}

/// Drives a world through checkpointed steps.
pub struct SimulationScheduler<W: VilleWorld> {
    world: W,
    clock: SimClock,
    store: CheckpointStore,

    /// Evolving config, persisted in full after every step
    config: SimulationConfig,

    /// Positional status per tracked agent, in name order
    status: BTreeMap<String, AgentStatus>,

    /// Steps already completed
    start_step: u64,

    /// Checked between steps
    stop: Option<Arc<AtomicBool>>,
}

impl<W: VilleWorld> SimulationScheduler<W> {
    /// Creates a scheduler and builds the tracked status table.
    ///
    /// An agent's starting tile is the `coord` of its config entry if it has
    /// one (a resumed run); otherwise `agent_base` merged with the persona's
    /// static config under `static_root`; otherwise `[0, 0]`.
    pub fn new(
        world: W,
        clock: SimClock,
        store: CheckpointStore,
        config: SimulationConfig,
        start_step: u64,
        static_root: &Path,
    ) -> Result<Self, SimError> {
        let mut status = BTreeMap::new();
        for (name, entry) in &config.agents {
            if !world.contains_agent(name) {
                warn!("{} is configured but not in the world, not tracked", name);
                continue;
            }
            let coord = initial_coord(entry, config.agent_base(), static_root)?;
            debug!("tracking {} from {:?}", name, coord);
            status.insert(name.clone(), AgentStatus::at(coord));
        }

        Ok(Self {
            world,
            clock,
            store,
            config,
            status,
            start_step,
            stop: None,
        })
    }

    /// Installs a flag that ends the run cleanly at the next step boundary.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Injects the requested tasks, only on a fresh run.
    ///
    /// A task that cannot be set up is logged and skipped; the run goes on
    /// without it.
    pub fn inject_tasks(&mut self, requests: &[TaskRequest]) -> Vec<InjectionReport> {
        if self.start_step != 0 {
            if !requests.is_empty() {
                info!(
                    "resuming at step {}, {} task(s) already injected",
                    self.start_step,
                    requests.len()
                );
            }
            return Vec::new();
        }

        let mut reports = Vec::new();
        for request in requests {
            // roles are only handed to agents that exist
            let participants: Vec<String> = match request.task {
                Task::Rescue(_) => request
                    .participants
                    .iter()
                    .filter(|p| self.world.contains_agent(p))
                    .cloned()
                    .collect(),
                Task::Meeting(_) => request.participants.clone(),
            };
            info!(
                "[TASK] injecting {} ({}) for {:?}",
                request.task.name(),
                request.mode,
                participants
            );
            match request
                .task
                .inject(request.mode, &participants, &mut self.world, &self.clock)
            {
                Ok(report) => {
                    info!(
                        "[TASK] {}: {} thought(s) written, {} skipped",
                        report.task,
                        report.written_count(),
                        report.skipped.len()
                    );
                    reports.push(report);
                }
                Err(e) => warn!("[TASK] {} not set up: {}", request.task.name(), e),
            }
        }
        reports
    }

    /// Runs `step` steps of `stride` minutes each.
    ///
    /// Every step thinks for each tracked agent in name order, then writes
    /// one snapshot and the conversation log, then advances the clock. A
    /// cognition failure aborts the run; the last written snapshot remains
    /// the resume point.
    pub fn simulate(&mut self, step: u64, stride: i64) -> Result<SimulationSummary, SimError> {
        let first_step = self.start_step;
        let end = first_step + step;
        let mut checkpoints = Vec::new();
        let mut stopped = false;

        for i in first_step..end {
            if self.stop_requested() {
                info!("stop requested, ending before step {}", i + 1);
                stopped = true;
                break;
            }

            let title = format!("Simulate Step[{}/{}, time: {}]", i + 1, end, self.clock.stamp());
            info!("\n{}", split_line(&title, '='));

            for (name, status) in self.status.iter_mut() {
                let plan = self
                    .world
                    .agent_think(name, status)
                    .map_err(|source| SimError::Cognition {
                        agent: name.clone(),
                        source,
                    })?
                    .plan;

                let entry = self.config.agents.entry(name.clone()).or_default();
                if let Some(agent) = self.world.agent(name) {
                    entry.extend(agent.to_dict());
                }
                if let Some(last) = plan.path.last() {
                    status.coord = *last;
                    status.path.clear();
                }
                entry.insert("coord".into(), json!([status.coord.0, status.coord.1]));
            }

            self.config.time = ConfigTime::Stamp(self.clock.stamp());
            self.config.step = i + 1;
            self.config.stride = stride;

            let path = self.store.write_snapshot(&self.config)?;
            self.store.write_conversation(self.world.conversation())?;
            debug!("checkpoint {}", path.display());
            checkpoints.push(path);

            if stride > 0 {
                self.clock.forward(stride);
            }
            self.start_step = i + 1;
        }

        Ok(SimulationSummary {
            first_step,
            last_step: self.start_step,
            steps_run: self.start_step - first_step,
            stopped,
            final_time: self.clock.stamp(),
            checkpoints,
        })
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .map(|s| s.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Steps completed so far.
    pub fn start_step(&self) -> u64 {
        self.start_step
    }

    /// Tracked status of one agent.
    pub fn status(&self, name: &str) -> Option<&AgentStatus> {
        self.status.get(name)
    }

    /// Names of the tracked agents, in stepping order.
    pub fn tracked(&self) -> Vec<&str> {
        self.status.keys().map(String::as_str).collect()
    }
}

/// Resolves an agent's starting tile.
fn initial_coord(
    entry: &Map<String, Value>,
    agent_base: Option<&Map<String, Value>>,
    static_root: &Path,
) -> Result<Coord, SimError> {
    if let Some(coord) = entry.get("coord").and_then(parse_coord) {
        return Ok(coord);
    }

    let mut merged = agent_base.cloned().unwrap_or_default();
    if let Some(config_path) = entry.get("config_path").and_then(Value::as_str) {
        let path = static_root.join(config_path);
        if path.is_file() {
            let persona: Map<String, Value> = read_json(&path)?;
            merged.extend(persona);
        } else {
            debug!("no static config at {}", path.display());
        }
    }

    Ok(merged
        .get("coord")
        .and_then(parse_coord)
        .unwrap_or_default())
}

fn parse_coord(value: &Value) -> Option<Coord> {
    serde_json::from_value(value.clone()).ok()
}

/// Centers `title` in a line of `fill` characters.
fn split_line(title: &str, fill: char) -> String {
    const WIDTH: usize = 60;
    let pad = WIDTH.saturating_sub(title.chars().count() + 2) / 2;
    let side: String = std::iter::repeat(fill).take(pad.max(3)).collect();
    format!("{} {} {}", side, title, side)
}
