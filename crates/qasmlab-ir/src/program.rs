//! The compiled circuit program.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::gate::GateKind;
use crate::operation::{GateOp, MeasureOp, Operation};
use crate::parameter::ParameterExpression;
use crate::qubit::{ClbitId, QubitId};

/// An ordered sequence of register-resolved operations.
///
/// Every index stored in an operation is below the allocated qubit or bit
/// count; the push methods reject anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitProgram {
    num_qubits: u32,
    num_clbits: u32,
    operations: Vec<Operation>,
    /// Declared free parameters, in declaration order.
    parameters: Vec<String>,
}

impl CircuitProgram {
    /// Create an empty program over `num_qubits` qubits and `num_clbits` bits.
    pub fn with_size(num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            num_qubits,
            num_clbits,
            operations: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Declare a free parameter. Re-declaring a known name is a no-op.
    pub fn declare_parameter(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.parameters.contains(&name) {
            self.parameters.push(name);
        }
    }

    /// Append an operation after checking its indices against the allocation.
    pub fn push(&mut self, op: Operation) -> IrResult<&mut Self> {
        match &op {
            Operation::Gate(g) => {
                for q in g.qubits() {
                    self.check_qubit(*q, Some(g.kind().name()))?;
                }
            }
            Operation::Measure(m) => {
                self.check_qubit(m.qubit, None)?;
                if m.clbit.0 >= self.num_clbits {
                    return Err(IrError::ClbitNotFound {
                        clbit: m.clbit,
                        num_clbits: self.num_clbits,
                    });
                }
            }
        }
        self.operations.push(op);
        Ok(self)
    }

    fn check_qubit(&self, qubit: QubitId, gate: Option<&str>) -> IrResult<()> {
        if qubit.0 >= self.num_qubits {
            return Err(IrError::QubitNotFound {
                qubit,
                num_qubits: self.num_qubits,
                gate_name: gate.map(str::to_string),
            });
        }
        Ok(())
    }

    /// Apply a gate by kind.
    pub fn gate(&mut self, kind: GateKind, qubits: Vec<QubitId>) -> IrResult<&mut Self> {
        let op = GateOp::new(kind, qubits)?;
        self.push(Operation::Gate(op))
    }

    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::H, vec![qubit])
    }

    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::X, vec![qubit])
    }

    pub fn rx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(GateKind::Rx(theta.into()), vec![qubit])
    }

    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(GateKind::CX, vec![control, target])
    }

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.push(Operation::Measure(MeasureOp::new(qubit, clbit)))
    }

    /// Measure qubit `i` into bit `i` for every qubit that has a matching bit.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        for i in 0..self.num_qubits.min(self.num_clbits) {
            self.measure(QubitId(i), ClbitId(i))?;
        }
        Ok(self)
    }

    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn has_measurements(&self) -> bool {
        self.operations.iter().any(Operation::is_measurement)
    }

    pub fn num_measurements(&self) -> usize {
        self.operations.iter().filter(|op| op.is_measurement()).count()
    }

    /// Declared parameters.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Every parameter still unbound: declared names first, then any other
    /// symbol appearing in a gate, sorted.
    pub fn free_parameters(&self) -> Vec<String> {
        let mut used = BTreeSet::new();
        for op in &self.operations {
            if let Operation::Gate(g) = op {
                for p in g.kind().parameters() {
                    p.collect_symbols(&mut used);
                }
            }
        }

        // Bound parameters are dropped from the declaration list.
        let mut free = self.parameters.clone();
        for name in &free {
            used.remove(name);
        }
        free.extend(used);
        free
    }

    /// Bind one parameter everywhere it appears.
    pub fn bind(&mut self, name: &str, value: f64) {
        for op in &mut self.operations {
            if let Operation::Gate(g) = op {
                let bound = g.kind().map_parameters(|p| p.bind(name, value));
                *g.kind_mut() = bound;
            }
        }
        self.parameters.retain(|p| p != name);
    }

    /// Bind every free parameter to the same value.
    pub fn bind_all(&mut self, value: f64) {
        for op in &mut self.operations {
            if let Operation::Gate(g) = op {
                let bound = g.kind().map_parameters(|p| p.bind_all(value));
                *g.kind_mut() = bound;
            }
        }
        self.parameters.clear();
    }

    /// Operation counts by name.
    pub fn count_ops(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for op in &self.operations {
            *counts.entry(op.name()).or_insert(0) += 1;
        }
        counts
    }

    /// Create a Bell state program with measurements.
    pub fn bell() -> IrResult<Self> {
        let mut program = Self::with_size(2, 2);
        program
            .h(QubitId(0))?
            .cx(QubitId(0), QubitId(1))?
            .measure_all()?;
        Ok(program)
    }

    /// Create an n-qubit GHZ program with measurements.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut program = Self::with_size(n, n);
        if n == 0 {
            return Ok(program);
        }
        program.h(QubitId(0))?;
        for i in 0..n - 1 {
            program.cx(QubitId(i), QubitId(i + 1))?;
        }
        program.measure_all()?;
        Ok(program)
    }
}

impl fmt::Display for CircuitProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "CircuitProgram: {} qubits, {} bits, {} operations",
            self.num_qubits,
            self.num_clbits,
            self.operations.len()
        )?;
        for op in &self.operations {
            match op {
                Operation::Gate(g) => {
                    let params = g.kind().parameters();
                    let qubits: Vec<String> = g.qubits().iter().map(ToString::to_string).collect();
                    if params.is_empty() {
                        writeln!(f, "  {} {}", g.kind().name(), qubits.join(", "))?;
                    } else {
                        let params: Vec<String> = params.iter().map(ToString::to_string).collect();
                        writeln!(
                            f,
                            "  {}({}) {}",
                            g.kind().name(),
                            params.join(", "),
                            qubits.join(", ")
                        )?;
                    }
                }
                Operation::Measure(m) => writeln!(f, "  measure {} -> {}", m.qubit, m.clbit)?,
            }
        }
        Ok(())
    }
}
