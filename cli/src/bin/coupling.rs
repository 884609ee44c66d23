//! `coupling`: MPM material coupled with rigid obstacles.

use launch_core::driver::run_from_env;
use launch_core::ProcessServices;
use sim::CouplingKind;
use std::process::ExitCode;

fn main() -> ExitCode {
    run_from_env(CouplingKind::from_env(), ProcessServices::from_env())
}
