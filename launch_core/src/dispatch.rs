//! Simulation Bootstrap Dispatcher: turns a parsed configuration into one
//! running simulation.
//!
//! # Stages
//! ```text
//! Idle → Parsed → Configured → FreshRun | RestartRun → Done
//! ```
//! - `Parsed → Configured`: script buffer assembled, worker pool installed,
//!   plugins loaded and signal handler installed inside the pool.
//! - Source selection: a non-empty script buffer wins over `-test`; with
//!   neither, the launch fails before any simulation object exists.
//! - The diff-test overlay and the logger are attached before the scene is
//!   built, so the very first computed state sees them.
//! - The phase-field overlay is applied after the scene is built, on both
//!   paths.
//! - Restart frame 0 starts fresh; any other frame resumes that checkpoint.

use crate::concurrency::WorkerPool;
use crate::config::Configuration;
use crate::error::{ConfigurationError, LaunchError};
use crate::overlay::{DiffTestOverlay, PhaseFieldOverlay};
use crate::script::ScriptBuffer;
use crate::services::LogHandle;
use crate::types::{Dimension, Flavor, RunMode};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// A freshly constructed simulation object, before any initialization.
pub trait Simulation {
    fn attach_diff_test(&mut self, overlay: DiffTestOverlay);
    fn attach_logger(&mut self, logger: LogHandle);
}

/// A simulation bound to its initialization source.
pub trait Scene {
    fn apply_phase_field(&mut self, overlay: &PhaseFieldOverlay);
    /// Initialize from the bound source and run to completion.
    fn start(&mut self) -> anyhow::Result<()>;
    /// Load the checkpoint tagged `frame` and run to completion. Never runs
    /// the fresh-start initialization.
    fn restart(&mut self, frame: u32) -> anyhow::Result<()>;
}

/// What differs between the two executables.
pub trait SimulationKind {
    type Simulation: Simulation;
    type Scene: Scene;

    fn flavor(&self) -> Flavor;

    fn create_simulation(&self, config: &Configuration, workers: &WorkerPool) -> Self::Simulation;

    fn scripted_scene(
        &self,
        simulation: Self::Simulation,
        script: &ScriptBuffer,
        dimension: Dimension,
    ) -> Result<Self::Scene, LaunchError>;

    fn builtin_scene(
        &self,
        simulation: Self::Simulation,
        test_number: i32,
        dimension: Dimension,
    ) -> Result<Self::Scene, LaunchError>;
}

/// Process collaborators the dispatcher calls exactly once per launch.
pub trait Services {
    fn load_plugins(&mut self) -> Result<usize, LaunchError>;
    fn install_signal_handler(&mut self);
    fn init_logging(&mut self, kind: &str) -> LogHandle;
}

// ---------------------------------------------------------------------------
// Mode selection
// ---------------------------------------------------------------------------

/// Where the initial state comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitSource<'a> {
    Script(&'a ScriptBuffer),
    Builtin { test_number: i32 },
}

impl InitSource<'_> {
    pub fn path(&self) -> InitPath {
        match self {
            InitSource::Script(_) => InitPath::Script,
            InitSource::Builtin { test_number } => InitPath::Builtin(*test_number),
        }
    }
}

/// [`InitSource`] without the borrowed buffer, for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitPath {
    Script,
    Builtin(i32),
}

/// Script first; built-in scenario only when the buffer is empty.
pub fn select_source(
    script: &ScriptBuffer,
    test_number: Option<i32>,
) -> Result<InitSource<'_>, ConfigurationError> {
    if !script.is_empty() {
        return Ok(InitSource::Script(script));
    }
    test_number
        .map(|test_number| InitSource::Builtin { test_number })
        .ok_or(ConfigurationError::NoScriptNoTestNumber)
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Parsed,
    Configured,
    FreshRun,
    RestartRun,
    Done,
}

/// What a completed launch did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchReport {
    pub source: InitPath,
    pub mode: RunMode,
    pub workers: usize,
    pub plugins: usize,
    /// Every stage visited, in order.
    pub stages: Vec<Stage>,
}

#[derive(Debug)]
struct StageTrace {
    stages: Vec<Stage>,
}

impl StageTrace {
    fn new() -> Self {
        Self {
            stages: vec![Stage::Idle],
        }
    }

    fn advance(&mut self, next: Stage) {
        let from = self.stages.last().copied().unwrap_or(Stage::Idle);
        debug!(?from, to = ?next, "dispatch stage");
        self.stages.push(next);
    }
}

pub struct Dispatcher<K, S> {
    kind: K,
    services: S,
}

impl<K, S> Dispatcher<K, S>
where
    K: SimulationKind + Sync,
    S: Services + Send,
{
    pub fn new(kind: K, services: S) -> Self {
        Self { kind, services }
    }

    /// Run one launch to completion.
    pub fn launch(&mut self, config: &Configuration) -> Result<LaunchReport, LaunchError> {
        let mut trace = StageTrace::new();
        trace.advance(Stage::Parsed);

        let script =
            ScriptBuffer::assemble(config.script_path.as_deref(), &config.inline_fragments)?;
        let workers = WorkerPool::install(config.threads)?;

        let kind = &self.kind;
        let services = &mut self.services;
        let pool = &workers;
        workers.run(move || {
            let plugins = services.load_plugins()?;
            services.install_signal_handler();
            trace.advance(Stage::Configured);

            let source = select_source(&script, config.test_number)?;
            let mode = RunMode::from_restart_frame(config.restart_frame);
            info!(
                kind = %kind.flavor(),
                source = ?source.path(),
                ?mode,
                dimension = %config.dimension,
                workers = pool.width(),
                "launching simulation"
            );

            let mut simulation = kind.create_simulation(config, pool);
            if let Some(overlay) = config.diff_test {
                simulation.attach_diff_test(overlay);
            }
            simulation.attach_logger(services.init_logging(kind.flavor().program_name()));

            let mut scene = match source {
                InitSource::Script(buffer) => {
                    kind.scripted_scene(simulation, buffer, config.dimension)?
                }
                InitSource::Builtin { test_number } => {
                    kind.builtin_scene(simulation, test_number, config.dimension)?
                }
            };
            scene.apply_phase_field(&config.phase_field);

            let outcome = match mode {
                RunMode::FreshStart => {
                    trace.advance(Stage::FreshRun);
                    scene.start()
                }
                RunMode::Restart { frame } => {
                    trace.advance(Stage::RestartRun);
                    scene.restart(frame)
                }
            };
            outcome.map_err(LaunchError::Run)?;
            trace.advance(Stage::Done);

            Ok(LaunchReport {
                source: source.path(),
                mode,
                workers: pool.width(),
                plugins,
                stages: trace.stages,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
