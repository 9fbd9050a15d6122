//! qasmlab circuit representation
//!
//! A compiled program is a flat, ordered list of register-resolved
//! operations. There is no control flow at this level: loops have been
//! unrolled and conditionals removed before a [`CircuitProgram`] is built.
//!
//! # Core Components
//!
//! - [`QubitId`], [`ClbitId`]: global indices into the qubit and bit spaces
//! - [`GateKind`]: the fixed gate set, each variant knowing its arity
//! - [`ParameterExpression`]: symbolic angles bound before simulation
//! - [`GateOp`], [`MeasureOp`], [`Operation`]: validated operations
//! - [`CircuitProgram`]: the operation sequence plus allocation sizes
//!
//! # Example
//!
//! ```rust
//! use qasmlab_ir::{CircuitProgram, QubitId};
//!
//! let mut program = CircuitProgram::with_size(2, 2);
//! program.h(QubitId(0)).unwrap();
//! program.cx(QubitId(0), QubitId(1)).unwrap();
//! program.measure_all().unwrap();
//!
//! assert_eq!(program.len(), 4);
//! assert!(program.has_measurements());
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Parameters |
//! |------|--------|------------|
//! | `h`, `x`, `y`, `z`, `s`, `sdg`, `t`, `tdg` | 1 | 0 |
//! | `rx`, `ry`, `rz`, `p` | 1 | 1 |
//! | `u` | 1 | 3 |
//! | `cx`, `cy`, `cz`, `ch`, `swap` | 2 | 0 |
//! | `ccx`, `cswap` | 3 | 0 |

pub mod error;
pub mod gate;
pub mod operation;
pub mod parameter;
pub mod program;
pub mod qubit;

pub use error::{IrError, IrResult};
pub use gate::{GATE_NAMES, GateKind};
pub use operation::{GateOp, MeasureOp, Operation};
pub use parameter::ParameterExpression;
pub use program::CircuitProgram;
pub use qubit::{ClbitId, QubitId};
