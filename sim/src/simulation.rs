//! MPM simulation base, run loop and the scene wrapper handed to the dispatcher.
//!
//! A simulation kind embeds an [`MpmSimulation`] and exposes it through
//! [`MpmModel`]. [`MpmScene`] binds a model to its initialization source and
//! implements the fresh-start and restart entry points.

use crate::checkpoint::{checkpoint_path, load_checkpoint, save_checkpoint, Checkpoint};
use crate::particles::{step, Particles, SphereCollider, StepParams};
use crate::scenarios::SceneSpec;
use anyhow::bail;
use launch_core::{
    interrupt_requested, Configuration, DiffTestOverlay, Dimension, LogHandle, PhaseFieldOverlay,
    Scene,
};
use nalgebra::Vector3;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Perturbation magnitude of the diff test, before scaling.
pub const DIFF_TEST_EPSILON: f64 = 1e-6;

/// Environment variable naming the checkpoint root directory.
pub const OUTPUT_DIR_ENV: &str = "MPM_OUTPUT_DIR";

/// `$MPM_OUTPUT_DIR`, or `output`.
pub fn output_root_from_env() -> PathBuf {
    std::env::var_os(OUTPUT_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("output"))
}

// ---------------------------------------------------------------------------
// Base state
// ---------------------------------------------------------------------------

/// State shared by every simulation kind.
#[derive(Debug)]
pub struct MpmSimulation {
    pub name: String,
    pub dimension: Dimension,
    pub particles: Particles,
    pub dt: f64,
    pub frame_dt: f64,
    pub end_frame: u32,
    /// Last completed frame
    pub frame: u32,
    pub time: f64,
    pub gravity: Vector3<f64>,
    pub floor: Option<f64>,
    pub colliders: Vec<SphereCollider>,
    pub percentage: f64,
    pub l0_ratio: f64,
    /// Lattice spacing of the scene, also the phase-field length unit
    pub dx: f64,
    pub seed: u64,
    /// Script bytes for script-driven runs
    pub script_source: Option<Vec<u8>>,
    pub disable_restart: bool,
    output_root: PathBuf,
    workers: usize,
    diff_test: Option<DiffTestOverlay>,
    /// Largest deviation seen by the last diff test
    diff_test_deviation: Option<f64>,
    logger: Option<LogHandle>,
}

impl MpmSimulation {
    pub fn new(config: &Configuration, output_root: &Path, workers: usize) -> Self {
        let scene = SceneSpec::scripted();
        Self {
            name: scene.name,
            dimension: config.dimension,
            particles: Particles::default(),
            dt: scene.dt,
            frame_dt: scene.frame_dt,
            end_frame: scene.end_frame,
            frame: 0,
            time: 0.0,
            gravity: scene.gravity,
            floor: scene.floor,
            colliders: scene.colliders,
            percentage: scene.percentage,
            l0_ratio: scene.l0_ratio,
            dx: scene.dx,
            seed: scene.seed,
            script_source: None,
            disable_restart: config.disable_restart,
            output_root: output_root.to_path_buf(),
            workers,
            diff_test: None,
            diff_test_deviation: None,
            logger: None,
        }
    }

    pub fn attach_diff_test(&mut self, overlay: DiffTestOverlay) {
        self.diff_test = Some(overlay);
    }

    pub fn attach_logger(&mut self, logger: LogHandle) {
        self.logger = Some(logger);
    }

    pub fn diff_test_deviation(&self) -> Option<f64> {
        self.diff_test_deviation
    }

    /// `<output root>/<scene name>`
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(&self.name)
    }

    /// Take the scene parameters. Particles are left untouched.
    pub fn configure(&mut self, scene: &SceneSpec) {
        self.name = scene.name.clone();
        self.dt = scene.dt;
        self.frame_dt = scene.frame_dt;
        self.end_frame = scene.end_frame;
        self.gravity = scene.gravity;
        self.floor = scene.floor;
        self.colliders = scene.colliders.clone();
        self.percentage = scene.percentage;
        self.l0_ratio = scene.l0_ratio;
        self.dx = scene.dx;
        self.seed = scene.seed;
        if self.dimension == Dimension::TwoD {
            self.gravity.z = 0.0;
        }
    }

    /// Override the phase-field parameters that were supplied.
    pub fn apply_phase_field(&mut self, overlay: &PhaseFieldOverlay) {
        if let Some(percentage) = overlay.percentage {
            self.percentage = percentage;
        }
        if let Some(l0_ratio) = overlay.l0_ratio {
            self.l0_ratio = l0_ratio;
        }
    }

    pub fn step_params(&self) -> StepParams {
        StepParams {
            dt: self.dt,
            gravity: self.gravity,
            floor: self.floor,
            colliders: self.colliders.clone(),
            axes: self.dimension.axes(),
        }
    }

    fn substeps_per_frame(&self) -> usize {
        ((self.frame_dt / self.dt).ceil() as usize).max(1)
    }

    /// Advance one output frame.
    pub fn advance_frame(&mut self) -> anyhow::Result<()> {
        let params = self.step_params();
        for _ in 0..self.substeps_per_frame() {
            step(&mut self.particles, &params);
        }
        self.frame += 1;
        self.time += self.frame_dt;

        if self
            .particles
            .x
            .iter()
            .any(|x| !x.iter().all(|c| c.is_finite()))
        {
            bail!("simulation diverged at frame {}", self.frame);
        }
        Ok(())
    }

    /// Perturb a copy of the state, advance both by one substep and log how
    /// far they drift apart.
    pub fn run_diff_test(&mut self, overlay: DiffTestOverlay) -> anyhow::Result<f64> {
        let epsilon = overlay.perturbation_scale * DIFF_TEST_EPSILON;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut perturbed = self.particles.clone();
        for x in perturbed.x.iter_mut() {
            let mut offset = Vector3::new(
                rng.gen::<f64>() - 0.5,
                rng.gen::<f64>() - 0.5,
                rng.gen::<f64>() - 0.5,
            );
            if self.dimension == Dimension::TwoD {
                offset.z = 0.0;
            }
            *x += offset * (2.0 * epsilon);
        }

        let params = self.step_params();
        let mut reference = self.particles.clone();
        step(&mut reference, &params);
        step(&mut perturbed, &params);

        let deviation = reference.max_deviation(&perturbed);
        if !deviation.is_finite() {
            bail!("diff test produced a non-finite deviation");
        }
        info!(epsilon, deviation, particles = self.particles.len(), "diff test");
        self.diff_test_deviation = Some(deviation);
        Ok(deviation)
    }

    /// Write the checkpoint for the current frame, unless disabled.
    pub fn write_checkpoint(&self) -> anyhow::Result<()> {
        if self.disable_restart {
            return Ok(());
        }
        let path = checkpoint_path(&self.output_dir(), self.frame);
        let checkpoint = Checkpoint {
            scene_name: self.name.clone(),
            frame: self.frame,
            time: self.time,
            axes: self.dimension.axes(),
            particles: self.particles.clone(),
        };
        save_checkpoint(&checkpoint, &path)?;
        debug!(frame = self.frame, path = %path.display(), "checkpoint written");
        Ok(())
    }

    /// Replace the state with the checkpoint of `frame`.
    pub fn restore(&mut self, frame: u32) -> anyhow::Result<()> {
        let path = checkpoint_path(&self.output_dir(), frame);
        let checkpoint = load_checkpoint(&path, self.dimension.axes())?;
        if checkpoint.scene_name != self.name {
            warn!(
                expected = %self.name,
                found = %checkpoint.scene_name,
                "checkpoint belongs to another scene"
            );
        }
        self.particles = checkpoint.particles;
        self.frame = checkpoint.frame;
        self.time = checkpoint.time;
        info!(frame, particles = self.particles.len(), "restored checkpoint");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Model seam
// ---------------------------------------------------------------------------

/// A simulation kind built on [`MpmSimulation`].
pub trait MpmModel {
    fn base(&self) -> &MpmSimulation;
    fn base_mut(&mut self) -> &mut MpmSimulation;

    /// Take the scene parameters; kinds extend this with their own.
    fn configure(&mut self, scene: &SceneSpec) {
        self.base_mut().configure(scene);
    }

    /// Called after every completed frame.
    fn end_frame(&mut self) {}
}

/// Run frames until `end_frame` or an interrupt.
pub fn run_frames<M: MpmModel + ?Sized>(model: &mut M) -> anyhow::Result<()> {
    let span = model
        .base()
        .logger
        .as_ref()
        .map(|logger| logger.span().clone())
        .unwrap_or_else(tracing::Span::none);
    let _entered = span.enter();

    if let Some(overlay) = model.base().diff_test {
        model.base_mut().run_diff_test(overlay)?;
    }

    let sim = model.base();
    info!(
        scene = %sim.name,
        dimension = %sim.dimension,
        from = sim.frame,
        to = sim.end_frame,
        particles = sim.particles.len(),
        workers = sim.workers,
        "run started"
    );
    while model.base().frame < model.base().end_frame {
        if interrupt_requested() {
            warn!(frame = model.base().frame, "interrupted, stopping");
            break;
        }
        model.base_mut().advance_frame()?;
        model.end_frame();
        model.base().write_checkpoint()?;
    }
    info!(frame = model.base().frame, time = model.base().time, "run finished");
    Ok(())
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A model bound to the scene it will initialize from.
#[derive(Debug)]
pub struct MpmScene<M> {
    model: M,
    spec: SceneSpec,
    phase_field: PhaseFieldOverlay,
}

impl<M: MpmModel> MpmScene<M> {
    pub fn new(model: M, spec: SceneSpec) -> Self {
        Self {
            model,
            spec,
            phase_field: PhaseFieldOverlay::default(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    fn prepare(&mut self) {
        self.model.configure(&self.spec);
        self.model.base_mut().apply_phase_field(&self.phase_field);
    }
}

impl<M: MpmModel> Scene for MpmScene<M> {
    fn apply_phase_field(&mut self, overlay: &PhaseFieldOverlay) {
        self.phase_field = *overlay;
        self.model.base_mut().apply_phase_field(overlay);
    }

    fn start(&mut self) -> anyhow::Result<()> {
        self.prepare();
        let dimension = self.model.base().dimension;
        let base = self.model.base_mut();
        base.particles = self.spec.sample(dimension);
        base.frame = 0;
        base.time = 0.0;
        base.write_checkpoint()?;
        run_frames(&mut self.model)
    }

    fn restart(&mut self, frame: u32) -> anyhow::Result<()> {
        self.prepare();
        self.model.base_mut().restore(frame)?;
        run_frames(&mut self.model)
    }
}
