//! The Configuration Set: every knob the registry fills, with its default.
//!
//! Built once by [`crate::options::OptionRegistry::parse`] and only borrowed
//! afterwards. There are no process-wide parameter holders.

use crate::overlay::{DiffTestOverlay, PhaseFieldOverlay};
use crate::types::{Dimension, Flavor};
use std::path::PathBuf;

/// Fiber and material-model knobs of the fracture executable.
///
/// Orthogonal to dispatch; handed to the fracture scenarios untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct FractureOptions {
    /// Primary fiber direction.
    pub a: [f64; 3],
    /// Secondary fiber direction (orthotropic models).
    pub b: [f64; 3],
    pub alpha1: f64,
    pub alpha2: f64,
    pub fiber_scale: f64,
    pub residual: f64,
    pub percent: f64,
    pub eta: f64,
    pub youngs_modulus: f64,
    pub rho: f64,
    pub tau: f64,
    pub use_radial: bool,
    pub use_longitudinal: bool,
    pub isotropic: bool,
    pub orthotropic: bool,
    pub inextensible: bool,
    /// Implicit vs. explicit damage model.
    pub implicit_damage: bool,
    /// Scenario-specific helper index.
    pub helper: i32,
}

impl Default for FractureOptions {
    fn default() -> Self {
        Self {
            a: [0.0; 3],
            b: [0.0; 3],
            alpha1: 0.0,
            alpha2: 0.0,
            fiber_scale: 0.0,
            residual: 0.001,
            percent: 0.1,
            eta: 1.0,
            youngs_modulus: 200.0,
            rho: 2.0,
            tau: 1.0,
            use_radial: false,
            use_longitudinal: false,
            isotropic: false,
            orthotropic: false,
            inextensible: false,
            implicit_damage: false,
            helper: 0,
        }
    }
}

/// Parsed command line.
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    pub flavor: Flavor,
    /// Script file; `None` when `-script` was absent or empty.
    pub script_path: Option<PathBuf>,
    /// `-i` fragments in command-line order.
    pub inline_fragments: Vec<String>,
    pub test_number: Option<i32>,
    pub dimension: Dimension,
    /// 0 = fresh start.
    pub restart_frame: u32,
    pub diff_test: Option<DiffTestOverlay>,
    /// Worker-pool width; `None` = platform-detected maximum.
    pub threads: Option<usize>,
    pub phase_field: PhaseFieldOverlay,
    /// Coupling only: suppress checkpoint writes.
    pub disable_restart: bool,
    /// Fracture only.
    pub fracture: FractureOptions,
}

impl Configuration {
    /// All defaults, as if no flag had been supplied.
    pub fn new(flavor: Flavor) -> Self {
        Self {
            flavor,
            script_path: None,
            inline_fragments: Vec::new(),
            test_number: None,
            dimension: Dimension::default(),
            restart_frame: 0,
            diff_test: None,
            threads: None,
            phase_field: PhaseFieldOverlay::default(),
            disable_restart: false,
            fracture: FractureOptions::default(),
        }
    }
}
