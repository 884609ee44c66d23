use launch_core::{ConfigurationError, Dimension, LaunchError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("no built-in scenario {test_number} in {dimension}")]
    UnknownScenario {
        test_number: i32,
        dimension: Dimension,
    },
}

impl From<SimError> for LaunchError {
    fn from(err: SimError) -> Self {
        match err {
            SimError::UnknownScenario {
                test_number,
                dimension,
            } => LaunchError::Configuration(ConfigurationError::UnknownScenario {
                test_number,
                dimension: dimension.to_string(),
            }),
        }
    }
}
