use thiserror::Error;
use tv_validation::ValidationError;

/// Simulation setup errors
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type SimulationResult<T> = Result<T, SimulationError>;
