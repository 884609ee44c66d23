//! Error taxonomy for the launch layer.
//!
//! Two families reach the user at startup: configuration problems (bad flags,
//! missing preconditions) and IO problems (unreadable script). Both end the
//! process with exit code 1 after the usage text. Simulation-internal
//! failures are carried separately in [`LaunchError::Run`] and are reported
//! without usage text.

use std::path::PathBuf;
use thiserror::Error;

/// A rejected command line or a missing launch precondition.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("unrecognized flag: {0}")]
    UnrecognizedFlag(String),

    #[error("flag {0} expects a value")]
    MissingValue(String),

    #[error("invalid value '{value}' for flag {flag}")]
    MalformedValue { flag: String, value: String },

    #[error("No lua script loaded. Either load with -script or set -test (no script, no test number)")]
    NoScriptNoTestNumber,

    #[error("unknown built-in scenario {test_number} ({dimension})")]
    UnknownScenario { test_number: i32, dimension: String },
}

impl ConfigurationError {
    /// The command-line token that caused the failure, when there is one.
    pub fn token(&self) -> Option<&str> {
        match self {
            ConfigurationError::UnrecognizedFlag(token) => Some(token),
            ConfigurationError::MissingValue(flag) => Some(flag),
            ConfigurationError::MalformedValue { value, .. } => Some(value),
            ConfigurationError::NoScriptNoTestNumber
            | ConfigurationError::UnknownScenario { .. } => None,
        }
    }
}

/// Everything that can stop a launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("plugin loading failed: {0}")]
    Plugin(String),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error("simulation failed: {0:#}")]
    Run(#[source] anyhow::Error),
}

impl LaunchError {
    /// Startup failures are followed by the usage text; run failures are not.
    pub fn shows_usage(&self) -> bool {
        !matches!(self, LaunchError::Run(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_points_at_offending_input() {
        let err = ConfigurationError::MalformedValue {
            flag: "-test".into(),
            value: "five".into(),
        };
        assert_eq!(err.token(), Some("five"));
        assert_eq!(
            ConfigurationError::UnrecognizedFlag("-bogus".into()).token(),
            Some("-bogus")
        );
        assert_eq!(ConfigurationError::NoScriptNoTestNumber.token(), None);
    }

    #[test]
    fn precondition_message_names_both_inputs() {
        let msg = ConfigurationError::NoScriptNoTestNumber.to_string();
        assert!(msg.contains("no script, no test number"), "{msg}");
    }

    #[test]
    fn run_failures_skip_usage() {
        let run = LaunchError::Run(anyhow::anyhow!("diverged"));
        assert!(!run.shows_usage());
        let cfg = LaunchError::from(ConfigurationError::NoScriptNoTestNumber);
        assert!(cfg.shows_usage());
    }
}
