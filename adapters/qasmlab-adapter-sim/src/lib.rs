//! qasmlab local statevector engine
//!
//! A [`SimulationEngine`](qasmlab_hal::SimulationEngine) that keeps the full
//! statevector in memory. Results are sampled shot by shot, with the state
//! collapsed at each measurement.
//!
//! # Memory
//!
//! | Qubits | Statevector |
//! |--------|-------------|
//! | 10 | ~16 KB |
//! | 15 | ~512 KB |
//! | 20 | ~16 MB |
//! | 25 | ~512 MB |
//!
//! The default limit is [`DEFAULT_MAX_QUBITS`].
//!
//! # Example
//!
//! ```ignore
//! use qasmlab_adapter_sim::StatevectorEngine;
//! use qasmlab_hal::Orchestrator;
//! use qasmlab_ir::CircuitProgram;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = Orchestrator::new(StatevectorEngine::new().with_seed(7));
//!     let result = orchestrator.simulate(CircuitProgram::bell()?, 1000).await?;
//!
//!     // Roughly half "00", half "11"
//!     println!("{:?}", result.counts.sorted());
//!     Ok(())
//! }
//! ```

mod engine;
mod statevector;

pub use engine::{DEFAULT_MAX_QUBITS, StatevectorEngine};
pub use statevector::Statevector;
