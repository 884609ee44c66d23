//! Multi-physics coupling: MPM material interacting with rigid obstacles.

use crate::scenarios::{CouplingScenario, SceneSpec};
use crate::simulation::{output_root_from_env, MpmModel, MpmScene, MpmSimulation};
use launch_core::{
    Configuration, DiffTestOverlay, Dimension, Flavor, LaunchError, LogHandle, ScriptBuffer,
    Simulation, SimulationKind, WorkerPool,
};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug)]
pub struct CouplingSimulation {
    base: MpmSimulation,
    /// Particles in contact with an obstacle after the last frame
    pub contacts: usize,
    /// Largest `contacts` seen at any frame of the run
    pub peak_contacts: usize,
}

impl CouplingSimulation {
    pub fn new(base: MpmSimulation) -> Self {
        Self {
            base,
            contacts: 0,
            peak_contacts: 0,
        }
    }

    fn count_contacts(&self) -> usize {
        let tolerance = 0.5 * self.base.dx;
        self.base
            .particles
            .x
            .iter()
            .filter(|x| {
                self.base
                    .colliders
                    .iter()
                    .any(|c| ((*x - c.center).norm() - c.radius).abs() <= tolerance)
            })
            .count()
    }
}

impl MpmModel for CouplingSimulation {
    fn base(&self) -> &MpmSimulation {
        &self.base
    }

    fn base_mut(&mut self) -> &mut MpmSimulation {
        &mut self.base
    }

    fn end_frame(&mut self) {
        self.contacts = self.count_contacts();
        self.peak_contacts = self.peak_contacts.max(self.contacts);
        debug!(frame = self.base.frame, contacts = self.contacts, "obstacle contacts");
    }
}

impl Simulation for CouplingSimulation {
    fn attach_diff_test(&mut self, overlay: DiffTestOverlay) {
        self.base.attach_diff_test(overlay);
    }

    fn attach_logger(&mut self, logger: LogHandle) {
        self.base.attach_logger(logger);
    }
}

/// The `coupling` executable's simulation kind.
#[derive(Clone, Debug)]
pub struct CouplingKind {
    output_root: PathBuf,
}

impl CouplingKind {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(output_root_from_env())
    }
}

impl SimulationKind for CouplingKind {
    type Simulation = CouplingSimulation;
    type Scene = MpmScene<CouplingSimulation>;

    fn flavor(&self) -> Flavor {
        Flavor::Coupling
    }

    fn create_simulation(&self, config: &Configuration, workers: &WorkerPool) -> Self::Simulation {
        CouplingSimulation::new(MpmSimulation::new(config, &self.output_root, workers.width()))
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
        let spec = CouplingScenario::build(test_number, dimension).map_err(LaunchError::from)?;
        Ok(MpmScene::new(simulation, spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::checkpoint_path;
    use launch_core::{Dispatcher, OptionRegistry, Parsed, RunMode, Scene, Services};
    use tempfile::tempdir;

    struct QuietServices;

    impl Services for QuietServices {
        fn load_plugins(&mut self) -> Result<usize, LaunchError> {
            Ok(0)
        }
        fn install_signal_handler(&mut self) {}
        fn init_logging(&mut self, kind: &str) -> LogHandle {
            LogHandle::new(kind)
        }
    }

    fn configuration(args: &[&str]) -> Configuration {
        match OptionRegistry::for_flavor(Flavor::Coupling).parse(args.iter().copied()) {
            Ok(Parsed::Run(config)) => config,
            other => panic!("unexpected parse result: {other:?}"),
        }
    }

    #[test]
    fn sand_hits_the_ball_before_sliding_off() {
        let dir = tempdir().unwrap();
        let kind = CouplingKind::new(dir.path());
        let config = configuration(&["-test", "1", "-t", "2"]);
        let pool = WorkerPool::install(config.threads).unwrap();
        let sim = kind.create_simulation(&config, &pool);
        let mut scene = kind.builtin_scene(sim, 1, config.dimension).unwrap();
        scene.start().unwrap();

        let model = scene.model();
        assert!(model.peak_contacts > 0, "no particle reached the obstacle");
        assert!(model.peak_contacts >= model.contacts);
    }

    #[test]
    fn peak_contacts_survive_a_frame_without_contact() {
        let dir = tempdir().unwrap();
        let config = Configuration::new(Flavor::Coupling);
        let mut sim = CouplingSimulation::new(MpmSimulation::new(&config, dir.path(), 1));
        let spec = CouplingScenario::build(1, Dimension::TwoD).unwrap();
        sim.configure(&spec);
        let ball = spec.colliders[0].clone();

        let on_surface = ball.center + nalgebra::Vector3::new(0.0, ball.radius, 0.0);
        sim.base.particles.push(on_surface, nalgebra::Vector3::zeros(), 1.0);
        sim.end_frame();
        assert_eq!((sim.contacts, sim.peak_contacts), (1, 1));

        sim.base.particles.x[0] = nalgebra::Vector3::new(5.0, 0.0, 0.0);
        sim.end_frame();
        assert_eq!((sim.contacts, sim.peak_contacts), (0, 1));
    }

    #[test]
    fn disablerestart_suppresses_checkpoints_end_to_end() {
        let dir = tempdir().unwrap();
        let config = configuration(&["-test", "3", "-disablerestart"]);
        let mut dispatcher = Dispatcher::new(CouplingKind::new(dir.path()), QuietServices);
        let report = dispatcher.launch(&config).unwrap();
        assert_eq!(report.mode, RunMode::FreshStart);
        assert!(!dir.path().join("wall_impact").exists());
    }

    #[test]
    fn dispatcher_restarts_from_a_written_frame() {
        let dir = tempdir().unwrap();
        let mut dispatcher = Dispatcher::new(CouplingKind::new(dir.path()), QuietServices);
        dispatcher
            .launch(&configuration(&["-test", "2", "--3d"]))
            .unwrap();
        assert!(checkpoint_path(&dir.path().join("block_on_block"), 10).exists());

        let report = dispatcher
            .launch(&configuration(&["-test", "2", "--3d", "-restart", "10"]))
            .unwrap();
        assert_eq!(report.mode, RunMode::Restart { frame: 10 });
    }
}
