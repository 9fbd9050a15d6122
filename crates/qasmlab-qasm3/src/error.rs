//! Error types for compilation.

use qasmlab_ir::IrError;
use thiserror::Error;

/// Errors that can occur while compiling source text into a circuit program.
///
/// Variants split into two classes. Structural errors (see
/// [`CompileError::is_structural`]) mean the source could not be taken apart
/// by the structural route and make the compiler try the legacy fallback.
/// Every other variant is a semantic error about a well-formed program and
/// aborts compilation directly.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// The full-grammar parser is not part of this build.
    #[error("Full-grammar parser is not available in this build")]
    ParseUnavailable,

    /// Lexer error (invalid token).
    #[error("Lexer error at line {line}: {message}")]
    Lexer { line: usize, message: String },

    /// Unexpected token.
    #[error("Syntax error at line {line}: expected {expected}, found {found}")]
    Syntax {
        line: usize,
        expected: String,
        found: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: expected {0}")]
    UnexpectedEof(String),

    /// Invalid version header.
    #[error("Invalid OPENQASM version: {0}")]
    InvalidVersion(String),

    /// Construct the structural route cannot handle.
    #[error("Structural error at line {line}: {message}")]
    Structural { line: usize, message: String },

    /// Reference to an undeclared register or parameter.
    #[error("Unknown symbol '{name}' at line {line}")]
    UnknownSymbol { name: String, line: usize },

    /// Index outside a register.
    #[error("Index {index} out of range for register '{register}' of size {size} at line {line}")]
    Range {
        register: String,
        index: i64,
        size: u32,
        line: usize,
    },

    /// Whole-register measurement between registers of different sizes.
    #[error(
        "Size mismatch at line {line}: register '{qubits}' has {qubit_size} qubits but '{bits}' has {bit_size} bits"
    )]
    SizeMismatch {
        qubits: String,
        qubit_size: u32,
        bits: String,
        bit_size: u32,
        line: usize,
    },

    /// Register declared twice.
    #[error("Duplicate {kind} register '{name}' at line {line}")]
    DuplicateDeclaration {
        name: String,
        kind: &'static str,
        line: usize,
    },

    /// Loop or conditional expansion needed more passes than allowed.
    #[error("Expansion of '{construct}' blocks exceeded the limit of {limit} passes")]
    ExpansionLimitExceeded {
        construct: &'static str,
        limit: usize,
    },

    /// A loop would unroll to more statements than allowed.
    #[error("Loop at line {line} unrolls to more than {limit} statements")]
    UnrollLimitExceeded { line: usize, limit: usize },

    /// Gate name outside the supported set.
    #[error("Unsupported gate '{name}' at line {line}")]
    UnsupportedGate { name: String, line: usize },

    /// Direct lowering declined a construct.
    #[error("Unsupported construct at line {line}: {construct}")]
    Unsupported { construct: String, line: usize },

    /// Operation rejected while building the program.
    #[error("Circuit error at line {line}: {source}")]
    Ir {
        line: usize,
        #[source]
        source: IrError,
    },

    /// Legacy loader rejected the converted source.
    #[error("Legacy loader error at line {line}: {message}")]
    Legacy { line: usize, message: String },

    /// Both the primary and the fallback route failed.
    #[error("Failed to compile source: {primary}; fallback failed: {fallback}")]
    Combined {
        primary: Box<CompileError>,
        fallback: Box<CompileError>,
    },
}

impl CompileError {
    /// Structural errors route compilation to the legacy fallback.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            CompileError::ParseUnavailable
                | CompileError::Lexer { .. }
                | CompileError::Syntax { .. }
                | CompileError::UnexpectedEof(_)
                | CompileError::InvalidVersion(_)
                | CompileError::Structural { .. }
                | CompileError::Unsupported { .. }
        )
    }

    /// Attach a source line to an IR error, mapping unknown gates to
    /// [`CompileError::UnsupportedGate`].
    pub fn from_ir(err: IrError, line: usize) -> Self {
        match err {
            IrError::UnknownGate(name) => CompileError::UnsupportedGate { name, line },
            source => CompileError::Ir { line, source },
        }
    }

    pub(crate) fn structural(line: usize, message: impl Into<String>) -> Self {
        CompileError::Structural {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(line: usize, construct: impl Into<String>) -> Self {
        CompileError::Unsupported {
            construct: construct.into(),
            line,
        }
    }
}

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;
    use qasmlab_ir::QubitId;

    #[test]
    fn test_structural_classification() {
        assert!(CompileError::structural(3, "while loop").is_structural());
        assert!(CompileError::ParseUnavailable.is_structural());
        assert!(
            !CompileError::UnknownSymbol {
                name: "z".into(),
                line: 1
            }
            .is_structural()
        );
        assert!(
            !CompileError::ExpansionLimitExceeded {
                construct: "for",
                limit: 10
            }
            .is_structural()
        );
    }

    #[test]
    fn test_unknown_gate_maps_to_unsupported() {
        let err = CompileError::from_ir(IrError::UnknownGate("foo".into()), 4);
        assert!(matches!(err, CompileError::UnsupportedGate { ref name, line: 4 } if name == "foo"));

        let err = CompileError::from_ir(
            IrError::DuplicateQubit {
                qubit: QubitId(0),
                gate_name: None,
            },
            2,
        );
        assert!(matches!(err, CompileError::Ir { line: 2, .. }));
    }

    #[test]
    fn test_combined_message_carries_both_causes() {
        let err = CompileError::Combined {
            primary: Box::new(CompileError::structural(1, "reset")),
            fallback: Box::new(CompileError::Legacy {
                line: 3,
                message: "reset is not supported".into(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to compile source"));
        assert!(msg.contains("Structural error at line 1"));
        assert!(msg.contains("Legacy loader error at line 3"));
    }
}
