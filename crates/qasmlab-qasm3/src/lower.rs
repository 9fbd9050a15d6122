//! Direct lowering of a parsed program, without control-flow expansion.
//!
//! This is the full-grammar route. It understands register broadcast
//! (`h q;`, `cx a, b;`) but declines any construct that needs expansion or
//! classical state, so the compiler can hand those programs to the
//! structural route.

use qasmlab_ir::{CircuitProgram, ClbitId, GateKind, QubitId};
use rustc_hash::FxHashSet;

use crate::ast::{GateCall, Operand, Program, Statement};
use crate::error::{CompileError, CompileResult};
use crate::registers::{RegisterKind, RegisterTable};
use crate::resolve::{declared_inputs, literal_index, to_parameter};

/// Lower a parsed program straight to a [`CircuitProgram`].
pub fn lower_program(program: &Program) -> CompileResult<CircuitProgram> {
    let registers = RegisterTable::build(&program.statements)?;
    let mut circuit = CircuitProgram::with_size(registers.num_qubits(), registers.num_clbits());
    let mut inputs = FxHashSet::default();
    for name in declared_inputs(&program.statements) {
        circuit.declare_parameter(name.clone());
        inputs.insert(name);
    }

    let mut lowerer = Lowerer {
        registers: &registers,
        inputs: &inputs,
        circuit,
    };
    for stmt in &program.statements {
        lowerer.lower_statement(&stmt.node, stmt.line)?;
    }
    Ok(lowerer.circuit)
}

struct Lowerer<'a> {
    registers: &'a RegisterTable,
    inputs: &'a FxHashSet<String>,
    circuit: CircuitProgram,
}

impl Lowerer<'_> {
    fn lower_statement(&mut self, stmt: &Statement, line: usize) -> CompileResult<()> {
        match stmt {
            Statement::Include(_)
            | Statement::QubitDecl { .. }
            | Statement::BitDecl { .. }
            | Statement::InputDecl { .. }
            | Statement::Barrier { .. } => Ok(()),
            Statement::Gate(call) => self.lower_gate(call, line),
            Statement::Measure { qubits, bits } => self.lower_measure(qubits, bits, line),
            other => Err(CompileError::unsupported(line, other.kind_name())),
        }
    }

    fn lower_gate(&mut self, call: &GateCall, line: usize) -> CompileResult<()> {
        if !call.modifiers.is_empty() {
            return Err(CompileError::unsupported(line, "gate modifier"));
        }

        let operands = call
            .qubits
            .iter()
            .map(|op| qubit_operand(self.registers, op, line))
            .collect::<CompileResult<Vec<_>>>()?;

        let params = call
            .params
            .iter()
            .map(|p| to_parameter(p, self.inputs, line))
            .collect::<CompileResult<Vec<_>>>()?;
        let kind = GateKind::from_name(&call.name, params)
            .map_err(|e| CompileError::from_ir(e, line))?;

        for qubits in broadcast(&operands, line)? {
            self.circuit
                .gate(kind.clone(), qubits)
                .map_err(|e| CompileError::from_ir(e, line))?;
        }
        Ok(())
    }

    fn lower_measure(&mut self, qubits: &[Operand], bits: &[Operand], line: usize) -> CompileResult<()> {
        let ([q], [c]) = (qubits, bits) else {
            return Err(CompileError::unsupported(
                line,
                "measure without exactly one qubit and one bit operand",
            ));
        };

        let qs = qubit_operand(self.registers, q, line)?;
        let cs = bit_operand(self.registers, c, line)?;
        if q.index.is_some() != c.index.is_some() {
            return Err(CompileError::unsupported(line, "mixed indexed and whole-register measure"));
        }
        if qs.len() != cs.len() {
            return Err(size_mismatch(self.registers, q, c, line));
        }

        for (qubit, clbit) in qs.into_iter().zip(cs) {
            self.circuit
                .measure(qubit, clbit)
                .map_err(|e| CompileError::from_ir(e, line))?;
        }
        Ok(())
    }
}

fn size_mismatch(registers: &RegisterTable, q: &Operand, c: &Operand, line: usize) -> CompileError {
    CompileError::SizeMismatch {
        qubits: q.register.clone(),
        qubit_size: registers.qubit(&q.register).map_or(0, |r| r.size),
        bits: c.register.clone(),
        bit_size: registers.bit(&c.register).map_or(0, |r| r.size),
        line,
    }
}

/// Qubits named by an operand: one for `q[i]`, the whole register for `q`.
pub(crate) fn qubit_operand(
    registers: &RegisterTable,
    operand: &Operand,
    line: usize,
) -> CompileResult<Vec<QubitId>> {
    match literal_index(operand, line)? {
        Some(index) => Ok(vec![registers.resolve_qubit(&operand.register, index, line)?]),
        None => {
            let decl = registers.lookup(RegisterKind::Qubit, &operand.register, line)?;
            Ok(decl.indices().map(QubitId).collect())
        }
    }
}

/// Bits named by an operand: one for `c[i]`, the whole register for `c`.
pub(crate) fn bit_operand(
    registers: &RegisterTable,
    operand: &Operand,
    line: usize,
) -> CompileResult<Vec<ClbitId>> {
    match literal_index(operand, line)? {
        Some(index) => Ok(vec![registers.resolve_bit(&operand.register, index, line)?]),
        None => {
            let decl = registers.lookup(RegisterKind::Bit, &operand.register, line)?;
            Ok(decl.indices().map(ClbitId).collect())
        }
    }
}

/// Expand register operands into one qubit tuple per application.
///
/// Single qubits repeat across the broadcast; every register operand must
/// have the same size.
pub(crate) fn broadcast(operands: &[Vec<QubitId>], line: usize) -> CompileResult<Vec<Vec<QubitId>>> {
    let width = operands.iter().map(Vec::len).max().unwrap_or(1);
    if let Some(bad) = operands.iter().find(|o| o.len() != 1 && o.len() != width) {
        return Err(CompileError::structural(
            line,
            format!(
                "cannot broadcast over registers of sizes {} and {width}",
                bad.len()
            ),
        ));
    }

    Ok((0..width)
        .map(|i| {
            operands
                .iter()
                .map(|o| if o.len() == 1 { o[0] } else { o[i] })
                .collect()
        })
        .collect())
}
