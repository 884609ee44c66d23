//! `launch_core`: Configuration resolution and dispatch for the MPM executables.
//!
//! # Module layout
//! - [`options`]: Option Registry: flag table, parse, usage text
//! - [`config`]: the immutable Configuration Set
//! - [`script`]: Script Accumulator (file content + `-i` fragments)
//! - [`concurrency`]: scoped worker pool (`-t`)
//! - [`overlay`]: diff-test and phase-field overlays
//! - [`dispatch`]: fresh-start / restart state machine and collaborator traits
//! - [`services`]: logging, plugin discovery, signal handling
//! - [`driver`]: process entry and exit codes
//! - [`error`]: `ConfigurationError` / `LaunchError`
//! - [`types`]: `Flavor`, `Dimension`, `RunMode`

pub mod concurrency;
pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod options;
pub mod overlay;
pub mod script;
pub mod services;
pub mod types;

pub use concurrency::WorkerPool;
pub use config::{Configuration, FractureOptions};
pub use dispatch::{Dispatcher, LaunchReport, Scene, Services, Simulation, SimulationKind};
pub use error::{ConfigurationError, LaunchError};
pub use options::{OptionRegistry, Parsed};
pub use overlay::{DiffTestOverlay, PhaseFieldOverlay};
pub use script::ScriptBuffer;
pub use services::{interrupt_requested, LogHandle, ProcessServices};
pub use types::{Dimension, Flavor, RunMode};
