//! Process entry: parse, dispatch, map the outcome to an exit code.
//!
//! Exit codes: `0` for help or a completed run, `1` for any failure. Startup
//! failures print the message followed by the usage text on the error
//! stream; simulation failures print only the message.

use crate::dispatch::{Dispatcher, Services, SimulationKind};
use crate::error::LaunchError;
use crate::options::{OptionRegistry, Parsed};
use crate::services::init_tracing;
use std::io::Write;
use std::process::ExitCode;
use tracing::{error, info};

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Launch with the process arguments and real stdout/stderr.
pub fn run_from_env<K, S>(kind: K, services: S) -> ExitCode
where
    K: SimulationKind + Sync,
    S: Services + Send,
{
    init_tracing();
    let args = std::env::args().skip(1);
    let code = run(
        kind,
        services,
        args,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    );
    ExitCode::from(code as u8)
}

/// Launch with explicit arguments (program name excluded) and output streams.
pub fn run<K, S, I, T>(
    kind: K,
    services: S,
    args: I,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> i32
where
    K: SimulationKind + Sync,
    S: Services + Send,
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let registry = OptionRegistry::for_flavor(kind.flavor());
    let config = match registry.parse(args) {
        Ok(Parsed::Help(usage)) => {
            let _ = write!(out, "Usage:\n{usage}");
            return EXIT_OK;
        }
        Ok(Parsed::Run(config)) => config,
        Err(e) => return fail(&LaunchError::from(e), &registry, err),
    };

    let mut dispatcher = Dispatcher::new(kind, services);
    match dispatcher.launch(&config) {
        Ok(report) => {
            info!(stages = ?report.stages, "run complete");
            EXIT_OK
        }
        Err(e) => fail(&e, &registry, err),
    }
}

fn fail(e: &LaunchError, registry: &OptionRegistry, err: &mut dyn Write) -> i32 {
    error!("{e}");
    let _ = writeln!(err, "{e}");
    if e.shows_usage() {
        let _ = write!(err, "{}", registry.usage());
    }
    EXIT_FAILURE
}
