//! Anisotropic fracture: fiber-reinforced material with a phase-field damage
//! stand-in.
//!
//! Damage grows on particles whose per-frame stretch along the fiber exceeds
//! the `percentage` threshold, measured in units of `l0 = l0_ratio * dx`.
//! The explicit model applies the increment directly; the implicit model
//! relaxes it by the viscosity `eta`.

use crate::scenarios::{FractureScenario, SceneSpec};
use crate::simulation::{output_root_from_env, MpmModel, MpmScene, MpmSimulation};
use launch_core::{
    Configuration, DiffTestOverlay, Dimension, Flavor, FractureOptions, LaunchError, LogHandle,
    ScriptBuffer, Simulation, SimulationKind, WorkerPool,
};
use nalgebra::Vector3;
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageModel {
    Explicit,
    Implicit,
}

#[derive(Debug)]
pub struct AnisoFractureSimulation {
    base: MpmSimulation,
    pub options: FractureOptions,
    pub damage_model: DamageModel,
    /// Unit fiber direction, zero for isotropic material
    pub fiber: Vector3<f64>,
}

impl AnisoFractureSimulation {
    pub fn new(base: MpmSimulation, options: FractureOptions) -> Self {
        let damage_model = if options.implicit_damage {
            DamageModel::Implicit
        } else {
            DamageModel::Explicit
        };
        Self {
            base,
            options,
            damage_model,
            fiber: Vector3::zeros(),
        }
    }

    /// Number of particles that are fully damaged.
    pub fn broken(&self) -> usize {
        self.base.particles.damage.iter().filter(|&&d| d >= 1.0).count()
    }

    fn update_damage(&mut self) {
        let base = &mut self.base;
        let l0 = base.l0_ratio * base.dx;
        if l0 <= 0.0 {
            return;
        }
        let threshold = base.percentage;
        let frame_dt = base.frame_dt;
        let fiber = self.fiber;
        let relax = match self.damage_model {
            DamageModel::Explicit => 1.0,
            DamageModel::Implicit => 1.0 / (1.0 + self.options.eta),
        };

        base.particles
            .damage
            .par_iter_mut()
            .zip(base.particles.v.par_iter())
            .for_each(|(d, v)| {
                let along = if fiber.norm() > 0.0 {
                    v.dot(&fiber).abs()
                } else {
                    v.norm()
                };
                let stretch = along * frame_dt / l0;
                if stretch > threshold {
                    *d = (*d + relax * (stretch - threshold)).min(1.0);
                }
            });
    }
}

impl MpmModel for AnisoFractureSimulation {
    fn base(&self) -> &MpmSimulation {
        &self.base
    }

    fn base_mut(&mut self) -> &mut MpmSimulation {
        &mut self.base
    }

    fn configure(&mut self, scene: &SceneSpec) {
        self.base.configure(scene);
        self.fiber = if self.options.isotropic {
            Vector3::zeros()
        } else {
            scene.fiber
        };
        if self.base.dimension == Dimension::TwoD {
            self.fiber.z = 0.0;
            if self.fiber.norm() > 0.0 {
                self.fiber.normalize_mut();
            }
        }
    }

    fn end_frame(&mut self) {
        self.update_damage();
        debug!(frame = self.base.frame, broken = self.broken(), "damage updated");
    }
}

impl Simulation for AnisoFractureSimulation {
    fn attach_diff_test(&mut self, overlay: DiffTestOverlay) {
        self.base.attach_diff_test(overlay);
    }

    fn attach_logger(&mut self, logger: LogHandle) {
        self.base.attach_logger(logger);
    }
}

/// The `anisofracture` executable's simulation kind.
#[derive(Clone, Debug)]
pub struct FractureKind {
    output_root: PathBuf,
}

impl FractureKind {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// Checkpoints under `$MPM_OUTPUT_DIR`, or `output/`.
    pub fn from_env() -> Self {
        Self::new(output_root_from_env())
    }
}

impl SimulationKind for FractureKind {
    type Simulation = AnisoFractureSimulation;
    type Scene = MpmScene<AnisoFractureSimulation>;

    fn flavor(&self) -> Flavor {
        Flavor::Fracture
    }

    fn create_simulation(&self, config: &Configuration, workers: &WorkerPool) -> Self::Simulation {
        let base = MpmSimulation::new(config, &self.output_root, workers.width());
        AnisoFractureSimulation::new(base, config.fracture.clone())
    }

    fn scripted_scene(
        &self,
        mut simulation: Self::Simulation,
        script: &ScriptBuffer,
        dimension: Dimension,
    ) -> Result<Self::Scene, LaunchError> {
        simulation.base.dimension = dimension;
        simulation.base.script_source = Some(script.as_bytes().to_vec());
        Ok(MpmScene::new(simulation, SceneSpec::scripted()))
    }

    fn builtin_scene(
        &self,
        mut simulation: Self::Simulation,
        test_number: i32,
        dimension: Dimension,
    ) -> Result<Self::Scene, LaunchError> {
        simulation.base.dimension = dimension;
        let spec = FractureScenario::build(test_number, dimension, &simulation.options)
            .map_err(LaunchError::from)?;
        Ok(MpmScene::new(simulation, spec))
    }
}
