//! Statement resolution: expanded syntax tree to circuit program.
//!
//! The resolver walks a flat statement sequence (no loops or conditionals)
//! and turns each gate call and measurement into register-resolved
//! operations. It accepts only literal-indexed gate arguments; anything the
//! structural route cannot handle is reported as a structural error so the
//! compiler can try the legacy route instead.

use qasmlab_ir::{CircuitProgram, ClbitId, GateKind, ParameterExpression, QubitId};
use rustc_hash::FxHashSet;
use std::f64::consts::E;

use crate::ast::{BinOp, Block, Expression, GateCall, Operand, Program, Statement};
use crate::error::{CompileError, CompileResult};
use crate::registers::{RegisterKind, RegisterTable};

/// Resolve an expanded program into a [`CircuitProgram`].
pub fn resolve(program: &Program) -> CompileResult<CircuitProgram> {
    let registers = RegisterTable::build(&program.statements)?;
    let mut resolver = Resolver::new(&registers, &program.statements);
    resolver.resolve_block(&program.statements)?;
    Ok(resolver.finish())
}

/// `input` parameter names of a block, in declaration order.
pub(crate) fn declared_inputs(statements: &Block) -> Vec<String> {
    statements
        .iter()
        .filter_map(|s| match &s.node {
            Statement::InputDecl { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

struct Resolver<'a> {
    registers: &'a RegisterTable,
    inputs: FxHashSet<String>,
    program: CircuitProgram,
}

impl<'a> Resolver<'a> {
    fn new(registers: &'a RegisterTable, statements: &Block) -> Self {
        let mut program = CircuitProgram::with_size(registers.num_qubits(), registers.num_clbits());
        let mut inputs = FxHashSet::default();
        for name in declared_inputs(statements) {
            program.declare_parameter(name.clone());
            inputs.insert(name);
        }
        Self {
            registers,
            inputs,
            program,
        }
    }

    fn finish(self) -> CircuitProgram {
        self.program
    }

    fn resolve_block(&mut self, statements: &Block) -> CompileResult<()> {
        for stmt in statements {
            let line = stmt.line;
            match &stmt.node {
                Statement::Include(_)
                | Statement::QubitDecl { .. }
                | Statement::BitDecl { .. }
                | Statement::InputDecl { .. }
                | Statement::Skipped => {}
                Statement::Gate(call) => self.resolve_gate(call, line)?,
                Statement::Measure { qubits, bits } => self.resolve_measure(qubits, bits, line)?,
                other => {
                    return Err(CompileError::structural(
                        line,
                        format!("{} is not supported", other.kind_name()),
                    ));
                }
            }
        }
        Ok(())
    }

    fn resolve_gate(&mut self, call: &GateCall, line: usize) -> CompileResult<()> {
        if !call.modifiers.is_empty() {
            return Err(CompileError::structural(
                line,
                format!("gate modifiers on '{}' are not supported", call.name),
            ));
        }

        // Operands before the gate name: an unknown register is reported first.
        let qubits = call
            .qubits
            .iter()
            .map(|op| self.resolve_gate_argument(op, line))
            .collect::<CompileResult<Vec<_>>>()?;

        let params = call
            .params
            .iter()
            .map(|p| to_parameter(p, &self.inputs, line))
            .collect::<CompileResult<Vec<_>>>()?;
        let kind = GateKind::from_name(&call.name, params)
            .map_err(|e| CompileError::from_ir(e, line))?;

        self.program
            .gate(kind, qubits)
            .map_err(|e| CompileError::from_ir(e, line))?;
        Ok(())
    }

    fn resolve_gate_argument(&self, operand: &Operand, line: usize) -> CompileResult<QubitId> {
        let index = literal_index(operand, line)?.ok_or_else(|| {
            CompileError::structural(
                line,
                format!("gate argument '{operand}' must be an indexed qubit"),
            )
        })?;
        self.registers.resolve_qubit(&operand.register, index, line)
    }

    fn resolve_measure(
        &mut self,
        qubits: &[Operand],
        bits: &[Operand],
        line: usize,
    ) -> CompileResult<()> {
        if bits.is_empty() {
            return Err(CompileError::structural(
                line,
                "measurement without a classical target",
            ));
        }
        let ([q], [c]) = (qubits, bits) else {
            return Err(CompileError::structural(
                line,
                "measure takes exactly one qubit operand and one bit operand",
            ));
        };

        match (literal_index(q, line)?, literal_index(c, line)?) {
            (None, None) => {
                let qreg = self.registers.lookup(RegisterKind::Qubit, &q.register, line)?;
                let creg = self.registers.lookup(RegisterKind::Bit, &c.register, line)?;
                if qreg.size != creg.size {
                    return Err(CompileError::SizeMismatch {
                        qubits: qreg.name.clone(),
                        qubit_size: qreg.size,
                        bits: creg.name.clone(),
                        bit_size: creg.size,
                        line,
                    });
                }
                for (qi, ci) in qreg.indices().zip(creg.indices()) {
                    self.program
                        .measure(QubitId(qi), ClbitId(ci))
                        .map_err(|e| CompileError::from_ir(e, line))?;
                }
            }
            (Some(qi), Some(ci)) => {
                let qubit = self.registers.resolve_qubit(&q.register, qi, line)?;
                let clbit = self.registers.resolve_bit(&c.register, ci, line)?;
                self.program
                    .measure(qubit, clbit)
                    .map_err(|e| CompileError::from_ir(e, line))?;
            }
            _ => {
                return Err(CompileError::structural(
                    line,
                    format!("cannot mix indexed and whole-register operands in 'measure {q} -> {c}'"),
                ));
            }
        }
        Ok(())
    }
}

/// The literal index of an operand, `None` for a whole register.
///
/// An index that still mentions a name (an unexpanded loop variable, say)
/// is a structural error.
pub(crate) fn literal_index(operand: &Operand, line: usize) -> CompileResult<Option<i64>> {
    let Some(index) = &operand.index else {
        return Ok(None);
    };
    index.as_int().map(Some).ok_or_else(|| match index.first_identifier() {
        Some(name) => CompileError::structural(
            line,
            format!("unexpanded symbol '{name}' in operand '{operand}'"),
        ),
        None => CompileError::structural(
            line,
            format!("operand index in '{operand}' is not an integer"),
        ),
    })
}

/// Convert a gate parameter into a [`ParameterExpression`].
///
/// Identifiers must name declared `input` parameters.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn to_parameter(
    expr: &Expression,
    inputs: &FxHashSet<String>,
    line: usize,
) -> CompileResult<ParameterExpression> {
    let recurse = |e: &Expression| to_parameter(e, inputs, line).map(Box::new);
    Ok(match expr {
        Expression::Int(v) => ParameterExpression::Constant(*v as f64),
        Expression::Float(v) => ParameterExpression::Constant(*v),
        Expression::Pi => ParameterExpression::Pi,
        Expression::Tau => ParameterExpression::Mul(
            Box::new(ParameterExpression::Constant(2.0)),
            Box::new(ParameterExpression::Pi),
        ),
        Expression::Euler => ParameterExpression::Constant(E),
        Expression::Identifier(name) => {
            if !inputs.contains(name) {
                return Err(CompileError::UnknownSymbol {
                    name: name.clone(),
                    line,
                });
            }
            ParameterExpression::Symbol(name.clone())
        }
        Expression::Paren(e) => to_parameter(e, inputs, line)?,
        Expression::Neg(e) => ParameterExpression::Neg(recurse(e)?),
        Expression::BinOp { left, op, right } => match op {
            BinOp::Add => ParameterExpression::Add(recurse(left)?, recurse(right)?),
            BinOp::Sub => ParameterExpression::Sub(recurse(left)?, recurse(right)?),
            BinOp::Mul => ParameterExpression::Mul(recurse(left)?, recurse(right)?),
            BinOp::Div => ParameterExpression::Div(recurse(left)?, recurse(right)?),
            _ => constant_parameter(expr, line)?,
        },
        _ => constant_parameter(expr, line)?,
    })
}

fn constant_parameter(expr: &Expression, line: usize) -> CompileResult<ParameterExpression> {
    expr.as_f64()
        .map(ParameterExpression::Constant)
        .ok_or_else(|| {
            CompileError::structural(line, format!("unsupported parameter expression '{expr}'"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::Expander;
    use crate::parser::parse_program;
    use qasmlab_ir::{IrError, Operation};
    use std::f64::consts::PI;

    fn compile(source: &str) -> CompileResult<CircuitProgram> {
        let program = parse_program(source)?;
        resolve(&Expander::default().expand(&program)?)
    }

    fn measures(program: &CircuitProgram) -> Vec<(u32, u32)> {
        program
            .operations()
            .iter()
            .filter_map(|op| match op {
                Operation::Measure(m) => Some((m.qubit.0, m.clbit.0)),
                Operation::Gate(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_bell() {
        let program = compile(
            "OPENQASM 3.0;\ninclude \"stdgates.inc\";\nqubit[2] q;\nbit[2] c;\nh q[0];\ncx q[0], q[1];\nmeasure q -> c;",
        )
        .unwrap();
        assert_eq!(program.num_qubits(), 2);
        assert_eq!(program.num_clbits(), 2);
        assert_eq!(program.len(), 4);
        assert_eq!(measures(&program), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_whole_register_measure() {
        let program = compile("qubit[3] q;\nbit[3] c;\nc = measure q;").unwrap();
        assert_eq!(measures(&program), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_whole_register_measure_uses_offsets() {
        let program = compile("qubit a;\nqubit[2] b;\nbit x;\nbit[2] y;\nmeasure b -> y;").unwrap();
        assert_eq!(measures(&program), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn test_measure_size_mismatch() {
        let err = compile("qubit[2] q;\nbit[3] c;\nmeasure q -> c;").unwrap_err();
        assert!(matches!(
            err,
            CompileError::SizeMismatch {
                qubit_size: 2,
                bit_size: 3,
                line: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_single_index_measure() {
        let program = compile("qubit[2] q;\nbit[2] c;\nmeasure q[1] -> c[0];").unwrap();
        assert_eq!(measures(&program), vec![(1, 0)]);

        let err = compile("qubit[2] q;\nbit[2] c;\nmeasure q[1] -> c[2];").unwrap_err();
        assert!(matches!(err, CompileError::Range { ref register, .. } if register == "c"));
    }

    #[test]
    fn test_measure_without_target_is_structural() {
        let err = compile("qubit[2] q;\nmeasure q;").unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_mixed_measure_is_structural() {
        let err = compile("qubit[2] q;\nbit[2] c;\nmeasure q -> c[0];").unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_unknown_register() {
        let err = compile("qubit[1] q;\nh z[0];").unwrap_err();
        assert!(matches!(err, CompileError::UnknownSymbol { ref name, line: 2 } if name == "z"));
    }

    #[test]
    fn test_unknown_measure_register() {
        let err = compile("qubit[1] q;\nmeasure q -> c;").unwrap_err();
        assert!(matches!(err, CompileError::UnknownSymbol { ref name, .. } if name == "c"));
    }

    #[test]
    fn test_out_of_range_gate_argument() {
        let err = compile("qubit[2] q;\nx q[5];").unwrap_err();
        assert!(matches!(err, CompileError::Range { index: 5, size: 2, .. }));
    }

    #[test]
    fn test_unsupported_gate() {
        let err = compile("qubit[1] q;\nfoo q[0];").unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedGate { ref name, .. } if name == "foo"));
    }

    #[test]
    fn test_unknown_register_is_reported_before_gate_name() {
        let err = compile("qubit[1] q;\nfoo z[0];").unwrap_err();
        assert!(matches!(err, CompileError::UnknownSymbol { ref name, line: 2 } if name == "z"));

        let err = compile("qubit[1] q;\nrx(alpha) z[0];").unwrap_err();
        assert!(matches!(err, CompileError::UnknownSymbol { ref name, .. } if name == "z"));
    }

    #[test]
    fn test_arity_is_checked() {
        let err = compile("qubit[2] q;\ncx q[0];").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Ir {
                source: IrError::QubitCountMismatch { .. },
                ..
            }
        ));

        let err = compile("qubit[2] q;\ncx q[1], q[1];").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Ir {
                source: IrError::DuplicateQubit { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_whole_register_gate_argument_is_structural() {
        let err = compile("qubit[2] q;\nh q;").unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_residual_constructs_are_structural() {
        for source in [
            "qubit[1] q;\nreset q[0];",
            "qubit[1] q;\nbarrier q;",
            "qubit[1] q;\nwhile (true) { x q[0]; }",
            "qubit[2] q;\nctrl @ x q[0], q[1];",
            "int n = 3;",
        ] {
            let err = compile(source).unwrap_err();
            assert!(err.is_structural(), "{source}: {err}");
        }
    }

    #[test]
    fn test_input_parameters() {
        let program = compile("input float[64] theta;\nqubit q;\nrx(theta / 2) q[0];").unwrap();
        assert_eq!(program.parameters(), ["theta"]);
        assert_eq!(program.free_parameters(), vec!["theta"]);

        let err = compile("qubit q;\nrx(phi) q[0];").unwrap_err();
        assert!(matches!(err, CompileError::UnknownSymbol { ref name, .. } if name == "phi"));
    }

    #[test]
    fn test_constant_parameters() {
        let program = compile("qubit q;\nrz(tau / 4) q[0];").unwrap();
        let Operation::Gate(g) = &program.operations()[0] else {
            panic!("expected gate");
        };
        let angle = g.kind().parameters()[0].as_f64().unwrap();
        assert!((angle - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_loop_program() {
        let program = compile(
            "qubit[4] q;\nbit[4] c;\nh q[0];\nfor int i in [0:3] { cx q[i], q[i + 1]; }\nmeasure q -> c;",
        )
        .unwrap();
        assert_eq!(program.count_ops()["cx"], 3);
        assert_eq!(program.num_measurements(), 4);
    }

    #[test]
    fn test_conditional_is_dropped() {
        let program =
            compile("qubit[1] q;\nbit[1] c;\nmeasure q[0] -> c[0];\nif (c[0] == 1) { x q[0]; }")
                .unwrap();
        assert_eq!(program.len(), 1);
        assert!(matches!(
            &program.operations()[0],
            Operation::Measure(m) if m.clbit == ClbitId(0)
        ));
    }
}
