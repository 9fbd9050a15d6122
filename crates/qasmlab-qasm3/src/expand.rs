//! Loop unrolling and conditional removal.
//!
//! Expansion rewrites a parsed program into one without `for` loops or `if`
//! statements. Loops go first: each pass unrolls the first loop found in
//! document order (looking inside conditional bodies as well) until none is
//! left. Conditionals go second: each pass replaces the first top-level `if`
//! with [`Statement::Skipped`]. Both phases are capped, and running out of
//! passes is an error rather than a silent truncation. The number of
//! statements loop unrolling may produce is capped as well.
//!
//! The output contains no construct either phase acts on, so expanding an
//! already expanded program returns it unchanged.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ast::{Block, Expression, Operand, Program, Range, Spanned, Statement};
use crate::error::{CompileError, CompileResult};

/// Default number of passes for each expansion phase.
pub const DEFAULT_MAX_PASSES: usize = 10;

/// Default cap on statements produced by loop unrolling.
pub const DEFAULT_MAX_UNROLLED_STATEMENTS: usize = 1_000_000;

/// Caps for the two expansion phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionLimits {
    pub max_loop_passes: usize,
    pub max_conditional_passes: usize,
    /// Statements all loop passes together may materialise.
    pub max_unrolled_statements: usize,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self {
            max_loop_passes: DEFAULT_MAX_PASSES,
            max_conditional_passes: DEFAULT_MAX_PASSES,
            max_unrolled_statements: DEFAULT_MAX_UNROLLED_STATEMENTS,
        }
    }
}

/// Rewrites control flow out of a program.
#[derive(Debug, Clone, Default)]
pub struct Expander {
    limits: ExpansionLimits,
}

impl Expander {
    pub fn new(limits: ExpansionLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ExpansionLimits {
        self.limits
    }

    /// Expand loops, then remove conditionals.
    pub fn expand(&self, program: &Program) -> CompileResult<Program> {
        let mut statements = program.statements.clone();

        let mut budget = self.limits.max_unrolled_statements;
        let mut passes = 0;
        while unroll_first_loop(&mut statements, &mut budget, self.limits)? {
            passes += 1;
            if passes > self.limits.max_loop_passes {
                return Err(CompileError::ExpansionLimitExceeded {
                    construct: "for",
                    limit: self.limits.max_loop_passes,
                });
            }
        }
        debug!(
            passes,
            unrolled = self.limits.max_unrolled_statements - budget,
            "Loop expansion finished"
        );

        let mut passes = 0;
        while let Some(stmt) = statements
            .iter_mut()
            .find(|s| matches!(s.node, Statement::If { .. }))
        {
            passes += 1;
            if passes > self.limits.max_conditional_passes {
                return Err(CompileError::ExpansionLimitExceeded {
                    construct: "if",
                    limit: self.limits.max_conditional_passes,
                });
            }
            warn!(line = stmt.line, "Conditional statement skipped");
            stmt.node = Statement::Skipped;
        }

        Ok(Program {
            version: program.version.clone(),
            statements,
        })
    }
}

/// Unroll the first loop in document order. Returns `false` if there is none.
///
/// `budget` is the number of statements unrolling may still produce.
fn unroll_first_loop(
    block: &mut Block,
    budget: &mut usize,
    limits: ExpansionLimits,
) -> CompileResult<bool> {
    for i in 0..block.len() {
        if let Statement::For {
            variable,
            range,
            body,
        } = &block[i].node
        {
            let line = block[i].line;
            let produced = unrolled_size(range, body, line)?;
            if produced > *budget as u128 {
                return Err(CompileError::UnrollLimitExceeded {
                    line,
                    limit: limits.max_unrolled_statements,
                });
            }
            // `produced` fits in the budget, so it fits in a usize.
            *budget -= produced as usize;
            let unrolled = unroll_loop(variable, range, body, line)?;
            block.splice(i..=i, unrolled);
            return Ok(true);
        }

        if let Statement::If {
            then_body,
            else_body,
            ..
        } = &mut block[i].node
        {
            if unroll_first_loop(then_body, budget, limits)? {
                return Ok(true);
            }
            if let Some(else_body) = else_body {
                if unroll_first_loop(else_body, budget, limits)? {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

fn loop_bound(e: &Expression, what: &str, line: usize) -> CompileResult<i64> {
    e.as_int().ok_or_else(|| {
        CompileError::structural(line, format!("loop {what} '{e}' is not an integer constant"))
    })
}

/// Constant `(start, end, step)` of a loop range with a positive step.
fn loop_range(range: &Range, line: usize) -> CompileResult<(i64, i64, i64)> {
    let start = loop_bound(&range.start, "start", line)?;
    let end = loop_bound(&range.end, "end", line)?;
    let step = match &range.step {
        Some(step) => loop_bound(step, "step", line)?,
        None => 1,
    };
    if step <= 0 {
        return Err(CompileError::structural(
            line,
            format!("loop step must be positive, got {step}"),
        ));
    }
    Ok((start, end, step))
}

/// Statements, nested ones included, that unrolling a loop produces.
fn unrolled_size(range: &Range, body: &Block, line: usize) -> CompileResult<u128> {
    let (start, end, step) = loop_range(range, line)?;
    let span = (i128::from(end) - i128::from(start)).max(0);
    let iterations = (span + i128::from(step) - 1) / i128::from(step);
    Ok(iterations.unsigned_abs() * statement_count(body) as u128)
}

fn statement_count(block: &Block) -> usize {
    block
        .iter()
        .map(|s| match &s.node {
            Statement::If {
                then_body,
                else_body,
                ..
            } => 1 + statement_count(then_body) + else_body.as_ref().map_or(0, statement_count),
            Statement::For { body, .. } | Statement::While { body, .. } => {
                1 + statement_count(body)
            }
            _ => 1,
        })
        .sum()
}

/// One copy of `body` per value of `variable`, end exclusive.
fn unroll_loop(variable: &str, range: &Range, body: &Block, line: usize) -> CompileResult<Block> {
    let (start, end, step) = loop_range(range, line)?;

    let mut unrolled = Vec::new();
    let mut value = start;
    while value < end {
        unrolled.extend(substitute_block(body, variable, value));
        match value.checked_add(step) {
            Some(next) => value = next,
            None => break,
        }
    }
    Ok(unrolled)
}

fn substitute_expr(e: &Expression, var: &str, value: i64) -> Expression {
    e.substitute(var, value).fold()
}

fn substitute_operands(operands: &[Operand], var: &str, value: i64) -> Vec<Operand> {
    operands
        .iter()
        .map(|op| Operand {
            register: op.register.clone(),
            index: op.index.as_ref().map(|i| substitute_expr(i, var, value)),
        })
        .collect()
}

fn substitute_block(block: &Block, var: &str, value: i64) -> Block {
    block
        .iter()
        .map(|s| Spanned::new(substitute_statement(&s.node, var, value), s.line))
        .collect()
}

fn substitute_statement(stmt: &Statement, var: &str, value: i64) -> Statement {
    let expr = |e: &Expression| substitute_expr(e, var, value);
    match stmt {
        Statement::Gate(call) => {
            let mut call = call.clone();
            call.params = call.params.iter().map(expr).collect();
            call.qubits = substitute_operands(&call.qubits, var, value);
            Statement::Gate(call)
        }
        Statement::Measure { qubits, bits } => Statement::Measure {
            qubits: substitute_operands(qubits, var, value),
            bits: substitute_operands(bits, var, value),
        },
        Statement::Reset { qubits } => Statement::Reset {
            qubits: substitute_operands(qubits, var, value),
        },
        Statement::Barrier { qubits } => Statement::Barrier {
            qubits: substitute_operands(qubits, var, value),
        },
        Statement::If {
            condition,
            then_body,
            else_body,
        } => Statement::If {
            condition: expr(condition),
            then_body: substitute_block(then_body, var, value),
            else_body: else_body
                .as_ref()
                .map(|b| substitute_block(b, var, value)),
        },
        Statement::For {
            variable,
            range,
            body,
        } => Statement::For {
            variable: variable.clone(),
            range: Range {
                start: expr(&range.start),
                end: expr(&range.end),
                step: range.step.as_ref().map(expr),
            },
            // An inner loop over the same name shadows the outer one.
            body: if variable == var {
                body.clone()
            } else {
                substitute_block(body, var, value)
            },
        },
        Statement::While { condition, body } => Statement::While {
            condition: expr(condition),
            body: substitute_block(body, var, value),
        },
        Statement::ClassicalDecl {
            ty,
            name,
            init,
            is_const,
        } => Statement::ClassicalDecl {
            ty: ty.clone(),
            name: name.clone(),
            init: init.as_ref().map(expr),
            is_const: *is_const,
        },
        Statement::Assignment {
            target,
            index,
            op,
            value: rhs,
        } => Statement::Assignment {
            target: target.clone(),
            index: index.as_ref().map(expr),
            op: *op,
            value: expr(rhs),
        },
        Statement::Return(e) => Statement::Return(e.as_ref().map(expr)),
        other => other.clone(),
    }
}
