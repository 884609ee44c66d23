//! `anisofracture`: anisotropic fracture simulations.
//!
//! ```text
//! anisofracture -test 1 --3d -t 8
//! anisofracture -script scene.lua -i "E = 300" -restart 12
//! ```

use launch_core::driver::run_from_env;
use launch_core::ProcessServices;
use sim::FractureKind;
use std::process::ExitCode;

fn main() -> ExitCode {
    run_from_env(FractureKind::from_env(), ProcessServices::from_env())
}
