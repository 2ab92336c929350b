use thiserror::Error;

use crate::types::Handedness;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Invalid hand simulation configuration: {0}")]
    Configuration(String),
    #[error("No hand pose named '{0}' is registered")]
    NotFound(String),
    #[error("Failed to create simulated {handedness:?} hand controller: {reason}")]
    ControllerCreation {
        handedness: Handedness,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, SimulationError>;
