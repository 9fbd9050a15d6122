//! `OpenQASM` 3 compiler for qasmlab
//!
//! Turns `OpenQASM` 3 source text into a flat [`CircuitProgram`] of
//! register-resolved gates and measurements.
//!
//! # Routes
//!
//! | Route | Needs | Handles |
//! |-------|-------|---------|
//! | Direct | `full_parser` | flat programs, register broadcast |
//! | Structural | always | literal-bounded `for` loops, `if` removal |
//! | Fallback | `legacy_loader` | sources the 2.0 loader reads after conversion |
//!
//! Control flow is limited to what can be removed at compile time: `for`
//! loops with constant bounds are unrolled and `if` statements are dropped
//! with a warning.
//!
//! # Features
//!
//! `full-parser` and `legacy` (both on by default) choose the routes
//! [`Capabilities::detect`] reports, and so the routes a default
//! [`Compiler`] tries. They do not remove code: every route is compiled in,
//! and a [`CompilerConfig`] with explicit capabilities can enable any of
//! them.
//!
//! # Example: Compiling
//!
//! ```rust
//! use qasmlab_qasm3::compile;
//!
//! let source = r#"
//!     OPENQASM 3.0;
//!     qubit[3] q;
//!     bit[3] c;
//!     for int i in [0:3] { h q[i]; }
//!     measure q -> c;
//! "#;
//!
//! let program = compile(source).unwrap();
//! assert_eq!(program.num_qubits(), 3);
//! assert_eq!(program.num_measurements(), 3);
//! ```
//!
//! # Example: Round-Trip
//!
//! ```rust
//! use qasmlab_ir::CircuitProgram;
//! use qasmlab_qasm3::{compile, emit};
//!
//! let program = CircuitProgram::ghz(3).unwrap();
//! let reparsed = compile(&emit(&program)).unwrap();
//! assert_eq!(program.operations(), reparsed.operations());
//! ```

mod ast;
mod capability;
mod compiler;
mod emitter;
mod error;
mod expand;
mod legacy;
mod lexer;
mod lower;
mod parser;
mod registers;
mod resolve;
mod validate;

pub use capability::Capabilities;
pub use compiler::{CompileOutput, Compiler, CompilerConfig, Route};
pub use emitter::emit;
pub use error::{CompileError, CompileResult};
pub use expand::{DEFAULT_MAX_PASSES, DEFAULT_MAX_UNROLLED_STATEMENTS, ExpansionLimits, Expander};
pub use legacy::{LegacyLoader, Qasm2Loader, convert_to_qasm2};
pub use lower::lower_program;
pub use parser::{MAX_NESTING_DEPTH, parse_program};
pub use registers::{RegisterDecl, RegisterKind, RegisterTable};
pub use resolve::resolve;
pub use validate::{DEFAULT_MAX_DEPTH, Finding, ValidationReport, Validator};

use qasmlab_ir::CircuitProgram;

// Re-export AST types for advanced users
pub mod syntax {
    pub use crate::ast::*;
}

/// Compile with the capabilities of this build and default limits.
pub fn compile(source: &str) -> CompileResult<CircuitProgram> {
    Compiler::default().compile(source)
}
