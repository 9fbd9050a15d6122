//! Circuit loaders for the legacy dialect.

use qasmlab_ir::{CircuitProgram, GateKind};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::ast::{Expression, Operand, Spanned};
use crate::error::{CompileError, CompileResult};
use crate::lexer::Token;
use crate::lower::{bit_operand, broadcast, qubit_operand};
use crate::parser::Parser;
use crate::registers::{RegisterKind, RegisterTable};
use crate::resolve::to_parameter;

/// Turns legacy-dialect text into a circuit program.
pub trait LegacyLoader {
    /// Loader name, for logs.
    fn name(&self) -> &str;

    /// Load a program. Failures carry the loader's own diagnostic.
    fn load(&self, source: &str) -> CompileResult<CircuitProgram>;
}

/// Reader for the `OpenQASM` 2.0 subset: `qreg`/`creg`, gate calls with
/// register broadcast, `measure` and `barrier`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Qasm2Loader;

enum Qasm2Statement {
    Gate {
        name: String,
        params: Vec<Expression>,
        args: Vec<Operand>,
    },
    Measure {
        qubit: Operand,
        bit: Operand,
    },
}

impl LegacyLoader for Qasm2Loader {
    fn name(&self) -> &str {
        "qasm2"
    }

    fn load(&self, source: &str) -> CompileResult<CircuitProgram> {
        let (registers, statements) = read(source)?;
        debug!(
            statements = statements.len(),
            qubits = registers.num_qubits(),
            "Loaded OpenQASM 2.0 source"
        );

        let mut program = CircuitProgram::with_size(registers.num_qubits(), registers.num_clbits());
        let no_inputs = FxHashSet::default();
        for Spanned { node, line } in statements {
            match node {
                Qasm2Statement::Gate { name, params, args } => {
                    let params = params
                        .iter()
                        .map(|p| to_parameter(p, &no_inputs, line))
                        .collect::<CompileResult<Vec<_>>>()?;
                    let kind = GateKind::from_name(&name, params)
                        .map_err(|e| CompileError::from_ir(e, line))?;
                    let operands = args
                        .iter()
                        .map(|a| qubit_operand(&registers, a, line))
                        .collect::<CompileResult<Vec<_>>>()?;
                    for qubits in broadcast(&operands, line)? {
                        program
                            .gate(kind.clone(), qubits)
                            .map_err(|e| CompileError::from_ir(e, line))?;
                    }
                }
                Qasm2Statement::Measure { qubit, bit } => {
                    let qubits = qubit_operand(&registers, &qubit, line)?;
                    let bits = bit_operand(&registers, &bit, line)?;
                    if qubits.len() != bits.len() {
                        return Err(CompileError::Legacy {
                            line,
                            message: format!(
                                "cannot measure {} qubits into {} bits",
                                qubits.len(),
                                bits.len()
                            ),
                        });
                    }
                    for (q, c) in qubits.into_iter().zip(bits) {
                        program
                            .measure(q, c)
                            .map_err(|e| CompileError::from_ir(e, line))?;
                    }
                }
            }
        }
        Ok(program)
    }
}

/// Parse the whole source, declaring registers as they appear.
fn read(source: &str) -> CompileResult<(RegisterTable, Vec<Spanned<Qasm2Statement>>)> {
    let mut parser = Parser::new(source).map_err(|e| legacy(e, 1))?;
    let mut registers = RegisterTable::new();
    let mut statements = Vec::new();

    parser.expect(Token::OpenQasm).map_err(|e| legacy(e, 1))?;
    let version = parser.parse_version().map_err(|e| legacy(e, 1))?;
    if !version.starts_with('2') {
        return Err(CompileError::Legacy {
            line: 1,
            message: format!("expected OPENQASM 2.0, found version {version}"),
        });
    }
    parser.expect(Token::Semicolon).map_err(|e| legacy(e, 1))?;

    while !parser.is_eof() {
        let line = parser.current_line();
        if let Some(stmt) = read_statement(&mut parser, &mut registers, line).map_err(|e| legacy(e, line))? {
            statements.push(Spanned::new(stmt, line));
        }
    }
    Ok((registers, statements))
}

fn read_statement(
    parser: &mut Parser,
    registers: &mut RegisterTable,
    line: usize,
) -> CompileResult<Option<Qasm2Statement>> {
    let Some(token) = parser.peek().cloned() else {
        return Err(CompileError::UnexpectedEof("statement".into()));
    };

    match token {
        Token::Include => {
            parser.advance();
            parser.parse_string_literal()?;
            parser.expect(Token::Semicolon)?;
            Ok(None)
        }
        Token::Qreg | Token::Creg => {
            parser.advance();
            let name = parser.parse_identifier()?;
            let size = parser.parse_size()?;
            parser.expect(Token::Semicolon)?;
            let kind = if token == Token::Qreg {
                RegisterKind::Qubit
            } else {
                RegisterKind::Bit
            };
            registers.declare(kind, &name, size, line)?;
            Ok(None)
        }
        Token::Barrier => {
            parser.advance();
            parser.parse_operands()?;
            parser.expect(Token::Semicolon)?;
            Ok(None)
        }
        Token::Measure => {
            parser.advance();
            let qubit = parser.parse_operand()?;
            parser.expect(Token::Arrow)?;
            let bit = parser.parse_operand()?;
            parser.expect(Token::Semicolon)?;
            Ok(Some(Qasm2Statement::Measure { qubit, bit }))
        }
        Token::Identifier(_) | Token::GateU | Token::GateCX => {
            let name = parser.parse_gate_name()?;
            let params = if parser.consume(&Token::LParen) {
                let params = parser.parse_expression_list()?;
                parser.expect(Token::RParen)?;
                params
            } else {
                Vec::new()
            };
            let args = parser.parse_operands()?;
            parser.expect(Token::Semicolon)?;
            Ok(Some(Qasm2Statement::Gate { name, params, args }))
        }
        other => Err(CompileError::Legacy {
            line,
            message: format!("'{other}' is not supported by the OpenQASM 2.0 loader"),
        }),
    }
}

/// Re-tag front-end failures as loader diagnostics.
fn legacy(err: CompileError, line: usize) -> CompileError {
    match err {
        CompileError::Lexer { line, message } => CompileError::Legacy { line, message },
        CompileError::Syntax {
            line,
            expected,
            found,
        } => CompileError::Legacy {
            line,
            message: format!("expected {expected}, found {found}"),
        },
        CompileError::Structural { line, message } => CompileError::Legacy { line, message },
        e @ (CompileError::UnexpectedEof(_) | CompileError::InvalidVersion(_)) => {
            CompileError::Legacy {
                line,
                message: e.to_string(),
            }
        }
        other => other,
    }
}
