//! `sim`: MPM simulation kinds, built-in scenarios and checkpoints.
//!
//! Provides the two [`launch_core::SimulationKind`]s the executables launch:
//! [`FractureKind`] (anisotropic fracture) and [`CouplingKind`] (rigid
//! obstacle coupling).

pub mod checkpoint;
pub mod coupling;
pub mod error;
pub mod fracture;
pub mod particles;
pub mod scenarios;
pub mod simulation;

pub use checkpoint::{checkpoint_path, load_checkpoint, save_checkpoint, Checkpoint};
pub use coupling::{CouplingKind, CouplingSimulation};
pub use error::SimError;
pub use fracture::{AnisoFractureSimulation, DamageModel, FractureKind};
pub use particles::{Particles, SphereCollider};
pub use scenarios::{CouplingScenario, FractureScenario, SceneSpec};
pub use simulation::{MpmModel, MpmScene, MpmSimulation};
