//! Ville simulation CLI
//!
//! Starts or resumes a checkpointed village simulation, optionally
//! injecting a coordination task before the first step.

use anyhow::Context;
use clap::Parser;
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use ville_core::CollabMode;
use ville_sim::config::{DEFAULT_ASSETS_ROOT, DEFAULT_START};
use ville_sim::{
    fresh_config, CheckpointStore, MeetingOptions, RunOptions, ScriptedWorld, SimClock,
    SimulationScheduler, TaskMode,
};

/// Ville village simulation
#[derive(Parser, Debug)]
#[command(name = "ville-sim")]
#[command(about = "Run a checkpointed generative-agent village simulation", long_about = None)]
struct Args {
    /// Simulation name (checkpoint folder)
    #[arg(long, default_value = "")]
    name: String,

    /// Simulated start time, YYYYMMDD-HH:MM
    #[arg(long, default_value = DEFAULT_START)]
    start: String,

    /// Resume from the latest checkpoint
    #[arg(long)]
    resume: bool,

    /// Number of steps to simulate
    #[arg(long, default_value = "10")]
    step: u64,

    /// Minutes per step
    #[arg(long, default_value = "10")]
    stride: i64,

    /// Log filter (error, warn, info, debug, trace or a directive list)
    #[arg(short, long, default_value = "debug")]
    verbose: String,

    /// Log file name inside the checkpoint folder
    #[arg(long)]
    log: Option<String>,

    /// Collaboration mechanism (baseline, centralized)
    #[arg(long, default_value = "baseline")]
    collab_mode: CollabMode,

    /// Meeting time, YYYYMMDD-HH:MM; no meeting is injected if omitted
    #[arg(long)]
    meeting_time: Option<String>,

    /// Meeting topic
    #[arg(long, default_value = "讨论新项目")]
    meeting_topic: String,

    /// Meeting place keyword
    #[arg(long, default_value = "汤姆和简的卧室")]
    meeting_place: String,

    /// Special cooperative task (none, eddie_rescue)
    #[arg(long, default_value = "none")]
    task_mode: TaskMode,

    /// Root of all checkpoint folders
    #[arg(long, default_value = "results/checkpoints")]
    checkpoints: PathBuf,

    /// Root of the static persona configs
    #[arg(long, default_value = "frontend/static")]
    static_root: PathBuf,

    /// Assets tree relative to the static root
    #[arg(long, default_value = DEFAULT_ASSETS_ROOT)]
    assets_root: String,

    /// Shared agent defaults (the `agent` key is used)
    #[arg(long, default_value = "data/config.json")]
    base_config: PathBuf,

    /// Comma-separated personas
    #[arg(long, value_delimiter = ',')]
    personas: Vec<String>,

    /// Seed for the scripted world
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn run_options(&self) -> RunOptions {
        let defaults = RunOptions::default();
        RunOptions {
            name: self.name.clone(),
            checkpoints_root: self.checkpoints.clone(),
            static_root: self.static_root.clone(),
            assets_root: self.assets_root.clone(),
            start: self.start.clone(),
            resume: self.resume,
            step: self.step,
            stride: self.stride,
            collab_mode: self.collab_mode,
            meeting: self.meeting_time.as_ref().map(|time| MeetingOptions {
                time: time.clone(),
                topic: self.meeting_topic.clone(),
                place: Some(self.meeting_place.clone()),
            }),
            task_mode: self.task_mode,
            personas: if self.personas.is_empty() {
                defaults.personas
            } else {
                self.personas.clone()
            },
            seed: self.seed,
        }
    }
}

fn init_logging(filter: EnvFilter, log_file: Option<&Path>) -> anyhow::Result<()> {
    let builder = FmtSubscriber::builder().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let subscriber = builder.with_ansi(false).with_writer(Mutex::new(file)).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

/// Reads the shared agent defaults, if the file exists.
fn load_agent_base(path: &Path) -> anyhow::Result<Option<Map<String, Value>>> {
    if !path.is_file() {
        debug!("no base config at {}", path.display());
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(value.get("agent").and_then(Value::as_object).cloned())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let options = args.run_options();
    let filter = EnvFilter::try_new(&args.verbose)
        .with_context(|| format!("bad log filter '{}'", args.verbose))?;
    let requests = options.task_requests()?;

    let store = options.open_store()?;
    let log_file = args.log.as_ref().map(|f| store.dir().join(f));
    init_logging(filter, log_file.as_deref())?;

    info!("Ville simulation '{}' v{}", options.name, env!("CARGO_PKG_VERSION"));

    let (config, start_step) = if options.resume {
        match store.resume_point(&options.assets_root)? {
            Some(resume) => (resume.config, resume.start_step),
            None => {
                warn!("No checkpoint file found to resume running.");
                return Ok(());
            }
        }
    } else {
        let base = load_agent_base(&args.base_config)?;
        let config = fresh_config(
            &options.start,
            options.stride,
            &options.personas,
            &options.assets_root,
            base,
        );
        (config, 0)
    };

    let conversation = store.load_conversation()?;
    let world = ScriptedWorld::from_config(&config, conversation, options.seed)?;
    let clock = SimClock::from_stamp(config.time.stamp())?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::SeqCst);
    })
    .context("installing Ctrl-C handler")?;

    let mut scheduler =
        SimulationScheduler::new(world, clock, store, config, start_step, &options.static_root)?
            .with_stop_flag(stop);

    let reports = scheduler.inject_tasks(&requests);

    let summary = scheduler.simulate(options.step, options.stride)?;

    if args.json {
        let output = serde_json::json!({
            "name": options.name,
            "summary": summary,
            "injections": reports,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if summary.stopped {
        warn!(
            "stopped after step {} at {}; resume with --resume --name {}",
            summary.last_step, summary.final_time, options.name
        );
    } else {
        info!(
            "simulated steps {}..{} ({} checkpoints), clock now {}",
            summary.first_step + 1,
            summary.last_step,
            summary.checkpoints.len(),
            summary.final_time
        );
    }
    Ok(())
}
