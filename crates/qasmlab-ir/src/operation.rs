//! Operations: the elements of a [`CircuitProgram`](crate::CircuitProgram).

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::GateKind;
use crate::qubit::{ClbitId, QubitId};

/// A gate applied to an ordered list of global qubit indices.
///
/// Construction checks that the operand count matches the gate's arity and
/// that no qubit appears twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOp {
    kind: GateKind,
    qubits: Vec<QubitId>,
}

impl GateOp {
    pub fn new(kind: GateKind, qubits: Vec<QubitId>) -> IrResult<Self> {
        let expected = kind.num_qubits();
        if qubits.len() != expected as usize {
            return Err(IrError::QubitCountMismatch {
                gate_name: kind.name().to_string(),
                expected,
                got: u32::try_from(qubits.len()).unwrap_or(u32::MAX),
            });
        }

        for (i, q) in qubits.iter().enumerate() {
            if qubits[..i].contains(q) {
                return Err(IrError::DuplicateQubit {
                    qubit: *q,
                    gate_name: Some(kind.name().to_string()),
                });
            }
        }

        Ok(Self { kind, qubits })
    }

    pub fn kind(&self) -> &GateKind {
        &self.kind
    }

    pub fn qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    pub(crate) fn kind_mut(&mut self) -> &mut GateKind {
        &mut self.kind
    }
}

/// Measurement of one qubit into one classical bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureOp {
    pub qubit: QubitId,
    pub clbit: ClbitId,
}

impl MeasureOp {
    pub fn new(qubit: QubitId, clbit: ClbitId) -> Self {
        Self { qubit, clbit }
    }
}

/// A register-resolved operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    Gate(GateOp),
    Measure(MeasureOp),
}

impl Operation {
    /// Name used in summaries and emitted source.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Gate(g) => g.kind().name(),
            Operation::Measure(_) => "measure",
        }
    }

    pub fn is_measurement(&self) -> bool {
        matches!(self, Operation::Measure(_))
    }

    /// Qubits touched by this operation.
    pub fn qubits(&self) -> &[QubitId] {
        match self {
            Operation::Gate(g) => g.qubits(),
            Operation::Measure(m) => std::slice::from_ref(&m.qubit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_op_arity_checked() {
        let err = GateOp::new(GateKind::CX, vec![QubitId(0)]).unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitCountMismatch { expected: 2, got: 1, .. }
        ));
    }

    #[test]
    fn test_gate_op_rejects_duplicate_qubits() {
        let err = GateOp::new(GateKind::CCX, vec![QubitId(0), QubitId(1), QubitId(0)]).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { qubit: QubitId(0), .. }));
    }

    #[test]
    fn test_operation_qubits() {
        let op = Operation::Measure(MeasureOp::new(QubitId(2), ClbitId(0)));
        assert_eq!(op.qubits(), &[QubitId(2)]);
        assert!(op.is_measurement());
        assert_eq!(op.name(), "measure");
    }
}
