//! The simulation engine interface.

use async_trait::async_trait;
use qasmlab_ir::CircuitProgram;

use crate::error::HalResult;
use crate::result::Counts;

/// Executes a compiled program and reports measurement counts.
///
/// # Contract
///
/// - `run()` receives a program with every parameter bound.
/// - Programs wider than `max_qubits()` MUST fail with
///   [`HalError::CircuitTooLarge`](crate::HalError::CircuitTooLarge).
/// - Bit ordering of the returned bitstrings is engine-defined and
///   documented by each engine.
#[async_trait]
pub trait SimulationEngine: Send + Sync {
    /// Get the name of this engine.
    fn name(&self) -> &str;

    /// Widest program the engine accepts.
    fn max_qubits(&self) -> u32;

    /// Run `shots` repetitions of the program.
    async fn run(&self, program: &CircuitProgram, shots: u32) -> HalResult<Counts>;
}
