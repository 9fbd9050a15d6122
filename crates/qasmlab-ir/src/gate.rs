//! The supported gate set.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::parameter::ParameterExpression;

/// A gate from the fixed, supported gate set.
///
/// Every variant knows its arity, so operand counts are checked when a
/// [`GateOp`](crate::GateOp) is built rather than when the gate is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateKind {
    /// Hadamard gate.
    H,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// Rotation around X axis.
    Rx(ParameterExpression),
    /// Rotation around Y axis.
    Ry(ParameterExpression),
    /// Rotation around Z axis.
    Rz(ParameterExpression),
    /// Phase gate.
    P(ParameterExpression),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// Toffoli gate.
    CCX,
    /// Fredkin gate.
    CSwap,
}

/// Canonical names of every supported gate, in table order.
pub const GATE_NAMES: &[&str] = &[
    "h", "x", "y", "z", "s", "sdg", "t", "tdg", "rx", "ry", "rz", "p", "u", "cx", "cy", "cz", "ch",
    "swap", "ccx", "cswap",
];

impl GateKind {
    /// Look up a gate by source name and attach its parameters.
    ///
    /// Names are case-insensitive; `cnot`, `toffoli`, `fredkin`, `phase` and
    /// `u3` are accepted as aliases.
    pub fn from_name(name: &str, params: Vec<ParameterExpression>) -> IrResult<Self> {
        let lower = name.to_ascii_lowercase();
        let expected = match lower.as_str() {
            "rx" | "ry" | "rz" | "p" | "phase" => 1,
            "u" | "u3" => 3,
            "h" | "x" | "y" | "z" | "s" | "sdg" | "t" | "tdg" | "cx" | "cnot" | "cy" | "cz"
            | "ch" | "swap" | "ccx" | "toffoli" | "cswap" | "fredkin" => 0,
            _ => return Err(IrError::UnknownGate(name.to_string())),
        };
        if params.len() != expected {
            return Err(IrError::ParameterCountMismatch {
                gate_name: lower,
                expected,
                got: params.len(),
            });
        }

        let mut params = params.into_iter();
        let mut next = || params.next().unwrap_or(ParameterExpression::Constant(0.0));

        Ok(match lower.as_str() {
            "h" => GateKind::H,
            "x" => GateKind::X,
            "y" => GateKind::Y,
            "z" => GateKind::Z,
            "s" => GateKind::S,
            "sdg" => GateKind::Sdg,
            "t" => GateKind::T,
            "tdg" => GateKind::Tdg,
            "rx" => GateKind::Rx(next()),
            "ry" => GateKind::Ry(next()),
            "rz" => GateKind::Rz(next()),
            "p" | "phase" => GateKind::P(next()),
            "u" | "u3" => {
                let theta = next();
                let phi = next();
                let lambda = next();
                GateKind::U(theta, phi, lambda)
            }
            "cx" | "cnot" => GateKind::CX,
            "cy" => GateKind::CY,
            "cz" => GateKind::CZ,
            "ch" => GateKind::CH,
            "swap" => GateKind::Swap,
            "ccx" | "toffoli" => GateKind::CCX,
            _ => GateKind::CSwap,
        })
    }

    /// Canonical lowercase name, as emitted.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::H => "h",
            GateKind::X => "x",
            GateKind::Y => "y",
            GateKind::Z => "z",
            GateKind::S => "s",
            GateKind::Sdg => "sdg",
            GateKind::T => "t",
            GateKind::Tdg => "tdg",
            GateKind::Rx(_) => "rx",
            GateKind::Ry(_) => "ry",
            GateKind::Rz(_) => "rz",
            GateKind::P(_) => "p",
            GateKind::U(_, _, _) => "u",
            GateKind::CX => "cx",
            GateKind::CY => "cy",
            GateKind::CZ => "cz",
            GateKind::CH => "ch",
            GateKind::Swap => "swap",
            GateKind::CCX => "ccx",
            GateKind::CSwap => "cswap",
        }
    }

    /// Number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            GateKind::H
            | GateKind::X
            | GateKind::Y
            | GateKind::Z
            | GateKind::S
            | GateKind::Sdg
            | GateKind::T
            | GateKind::Tdg
            | GateKind::Rx(_)
            | GateKind::Ry(_)
            | GateKind::Rz(_)
            | GateKind::P(_)
            | GateKind::U(_, _, _) => 1,

            GateKind::CX | GateKind::CY | GateKind::CZ | GateKind::CH | GateKind::Swap => 2,

            GateKind::CCX | GateKind::CSwap => 3,
        }
    }

    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            GateKind::Rx(p) | GateKind::Ry(p) | GateKind::Rz(p) | GateKind::P(p) => vec![p],
            GateKind::U(a, b, c) => vec![a, b, c],
            _ => vec![],
        }
    }

    /// True if any parameter is still symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.parameters().iter().any(|p| p.is_symbolic())
    }

    /// Rebuild the gate with every parameter passed through `f`.
    #[must_use]
    pub fn map_parameters(&self, f: impl Fn(&ParameterExpression) -> ParameterExpression) -> Self {
        match self {
            GateKind::Rx(p) => GateKind::Rx(f(p)),
            GateKind::Ry(p) => GateKind::Ry(f(p)),
            GateKind::Rz(p) => GateKind::Rz(f(p)),
            GateKind::P(p) => GateKind::P(f(p)),
            GateKind::U(a, b, c) => GateKind::U(f(a), f(b), f(c)),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(GateKind::from_name("H", vec![]).unwrap(), GateKind::H);
        assert_eq!(GateKind::from_name("CNOT", vec![]).unwrap(), GateKind::CX);
        assert_eq!(GateKind::from_name("fredkin", vec![]).unwrap(), GateKind::CSwap);
    }

    #[test]
    fn test_every_canonical_name_resolves() {
        for name in GATE_NAMES {
            let params = match *name {
                "rx" | "ry" | "rz" | "p" => vec![ParameterExpression::Pi],
                "u" => vec![ParameterExpression::Pi; 3],
                _ => vec![],
            };
            let gate = GateKind::from_name(name, params).unwrap();
            assert_eq!(gate.name(), *name);
        }
    }

    #[test]
    fn test_arity() {
        assert_eq!(GateKind::H.num_qubits(), 1);
        assert_eq!(GateKind::Swap.num_qubits(), 2);
        assert_eq!(GateKind::CSwap.num_qubits(), 3);
    }

    #[test]
    fn test_unknown_gate() {
        let err = GateKind::from_name("foo", vec![]).unwrap_err();
        assert_eq!(err, IrError::UnknownGate("foo".into()));
    }

    #[test]
    fn test_parameter_count_checked() {
        let err = GateKind::from_name("rx", vec![]).unwrap_err();
        assert!(matches!(
            err,
            IrError::ParameterCountMismatch { expected: 1, got: 0, .. }
        ));
        assert!(GateKind::from_name("h", vec![ParameterExpression::Pi]).is_err());
    }

    #[test]
    fn test_u_parameter_order() {
        let gate = GateKind::from_name(
            "u3",
            vec![
                ParameterExpression::constant(1.0),
                ParameterExpression::constant(2.0),
                ParameterExpression::constant(3.0),
            ],
        )
        .unwrap();
        let values: Vec<_> = gate.parameters().iter().filter_map(|p| p.as_f64()).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }
}
