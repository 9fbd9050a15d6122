//! Error types for the HAL crate.

use thiserror::Error;

/// Errors reported by a simulation engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Program exceeds engine capabilities.
    #[error("Program exceeds engine capabilities: {0}")]
    CircuitTooLarge(String),

    /// Program the engine cannot execute.
    #[error("Invalid program: {0}")]
    InvalidCircuit(String),

    /// Invalid number of shots.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// Unsupported feature.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Generic engine error.
    #[error("Engine error: {0}")]
    Backend(String),
}

/// Result type for engine operations.
pub type HalResult<T> = Result<T, HalError>;

/// Errors from the simulation orchestrator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimulationError {
    /// The program measures nothing, so there is nothing to count.
    #[error("Program has no measurements")]
    NoMeasurement,

    /// A shot count of zero.
    #[error("Shot count must be positive")]
    InvalidShots,

    /// The engine failed.
    #[error("Simulation failed: {0}")]
    Failure(#[from] HalError),

    /// The engine returned no outcomes.
    #[error("Simulation produced no results")]
    EmptyResult,
}

/// Result type for simulation.
pub type SimulationResult<T> = Result<T, SimulationError>;
