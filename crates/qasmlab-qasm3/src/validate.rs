//! Best-effort semantic checks over a parsed program.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::ast::{Block, Operand, Program, Statement, Type};

/// Nesting depth past which the validator stops descending.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// One reference to a register that was not declared at that point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub line: usize,
    pub symbol: String,
    pub message: String,
}

/// What the validator found. Never fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
    pub has_measurements: bool,
    /// `false` if traversal stopped at the depth limit.
    pub complete: bool,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.complete
    }
}

/// Checks that registers are declared before use.
#[derive(Debug, Clone)]
pub struct Validator {
    max_depth: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Default)]
struct Scope {
    qubits: FxHashSet<String>,
    bits: FxHashSet<String>,
}

impl Validator {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn validate(&self, program: &Program) -> ValidationReport {
        let mut report = ValidationReport {
            complete: true,
            ..ValidationReport::default()
        };
        let mut scope = Scope::default();
        self.walk(&program.statements, 0, &mut scope, &mut report);
        report
    }

    fn walk(&self, block: &Block, depth: usize, scope: &mut Scope, report: &mut ValidationReport) {
        if depth > self.max_depth {
            report.complete = false;
            return;
        }

        for stmt in block {
            let line = stmt.line;
            match &stmt.node {
                Statement::QubitDecl { name, .. } => {
                    scope.qubits.insert(name.clone());
                }
                Statement::BitDecl { name, .. } => {
                    scope.bits.insert(name.clone());
                }
                Statement::Gate(call) => check_qubits(&call.qubits, line, scope, report),
                Statement::Reset { qubits } | Statement::Barrier { qubits } => {
                    check_qubits(qubits, line, scope, report);
                }
                Statement::Measure { qubits, bits } => {
                    report.has_measurements = true;
                    check_qubits(qubits, line, scope, report);
                    for bit in bits {
                        if !scope.bits.contains(&bit.register) {
                            report.findings.push(Finding {
                                line,
                                symbol: bit.register.clone(),
                                message: format!("Bit '{}' used before declaration", bit.register),
                            });
                        }
                    }
                }
                Statement::If {
                    then_body,
                    else_body,
                    ..
                } => {
                    self.walk(then_body, depth + 1, scope, report);
                    if let Some(else_body) = else_body {
                        self.walk(else_body, depth + 1, scope, report);
                    }
                }
                Statement::For { body, .. } | Statement::While { body, .. } => {
                    self.walk(body, depth + 1, scope, report);
                }
                Statement::GateDef { qubits, body, .. } => {
                    self.walk_with_qubits(qubits.iter().cloned(), body, depth, scope, report);
                }
                Statement::Def { params, body, .. } => {
                    let qubits = params
                        .iter()
                        .filter(|p| matches!(p.ty, Type::Qubit(_)))
                        .map(|p| p.name.clone());
                    self.walk_with_qubits(qubits, body, depth, scope, report);
                }
                _ => {}
            }
        }
    }

    /// Walk a definition body with its qubit arguments in scope.
    fn walk_with_qubits(
        &self,
        args: impl Iterator<Item = String>,
        body: &Block,
        depth: usize,
        scope: &mut Scope,
        report: &mut ValidationReport,
    ) {
        let saved = scope.qubits.clone();
        scope.qubits.extend(args);
        self.walk(body, depth + 1, scope, report);
        scope.qubits = saved;
    }
}

fn check_qubits(operands: &[Operand], line: usize, scope: &Scope, report: &mut ValidationReport) {
    for op in operands {
        if !scope.qubits.contains(&op.register) {
            report.findings.push(Finding {
                line,
                symbol: op.register.clone(),
                message: format!("Qubit '{}' used before declaration", op.register),
            });
        }
    }
}
