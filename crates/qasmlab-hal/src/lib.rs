//! qasmlab simulation layer
//!
//! This crate sits between the compiler and a simulation engine:
//! - The [`SimulationEngine`] trait that engines implement
//! - The [`Orchestrator`], which checks a compiled program, binds its free
//!   parameters and runs it
//! - Unified result handling via [`ExecutionResult`] and [`Counts`]
//!
//! # Engines
//!
//! | Engine | Crate |
//! |--------|-------|
//! | Local statevector | `qasmlab-adapter-sim` |
//!
//! # Example: Implementing an Engine
//!
//! ```ignore
//! use async_trait::async_trait;
//! use qasmlab_hal::{Counts, HalResult, SimulationEngine};
//! use qasmlab_ir::CircuitProgram;
//!
//! struct AllZeros;
//!
//! #[async_trait]
//! impl SimulationEngine for AllZeros {
//!     fn name(&self) -> &str {
//!         "zeros"
//!     }
//!
//!     fn max_qubits(&self) -> u32 {
//!         64
//!     }
//!
//!     async fn run(&self, program: &CircuitProgram, shots: u32) -> HalResult<Counts> {
//!         let mut counts = Counts::new();
//!         counts.insert("0".repeat(program.num_clbits() as usize), u64::from(shots));
//!         Ok(counts)
//!     }
//! }
//! ```

pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod result;

pub use engine::SimulationEngine;
pub use error::{HalError, HalResult, SimulationError, SimulationResult};
pub use orchestrator::{DEFAULT_PARAMETER_VALUE, Orchestrator};
pub use result::{Counts, ExecutionResult};
