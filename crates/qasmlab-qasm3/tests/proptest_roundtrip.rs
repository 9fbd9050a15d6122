//! Property-based tests for the emitter and the expander.
//!
//! Tests that program → `OpenQASM` 3 → program preserves every operation and
//! that expansion is a fixed point.

use qasmlab_ir::{CircuitProgram, ClbitId, GateKind, ParameterExpression, QubitId};
use qasmlab_qasm3::syntax::Statement;
use qasmlab_qasm3::{Compiler, Expander, emit, parse_program};
use proptest::prelude::*;

/// Operations that can be applied to a program.
#[derive(Debug, Clone)]
enum Op {
    H(u32),
    X(u32),
    Y(u32),
    Z(u32),
    Rx(f64, u32),
    RzTheta(u32),
    CX(u32, u32),
    Measure(u32, u32),
}

impl Op {
    fn apply(self, program: &mut CircuitProgram) {
        let _ = match self {
            Op::H(q) => program.h(QubitId(q)),
            Op::X(q) => program.x(QubitId(q)),
            Op::Y(q) => program.gate(GateKind::Y, vec![QubitId(q)]),
            Op::Z(q) => program.gate(GateKind::Z, vec![QubitId(q)]),
            Op::Rx(angle, q) => program.rx(ParameterExpression::constant(angle), QubitId(q)),
            Op::RzTheta(q) => program.gate(
                GateKind::Rz(ParameterExpression::Mul(
                    Box::new(ParameterExpression::symbol("theta")),
                    Box::new(ParameterExpression::pi()),
                )),
                vec![QubitId(q)],
            ),
            Op::CX(c, t) => program.cx(QubitId(c), QubitId(t)),
            Op::Measure(q, c) => program.measure(QubitId(q), ClbitId(c)),
        };
    }
}

/// Generate a random operation for a program with `n` qubits and bits.
fn arb_op(n: u32) -> impl Strategy<Value = Op> {
    let single = prop_oneof![
        (0..n).prop_map(Op::H),
        (0..n).prop_map(Op::X),
        (0..n).prop_map(Op::Y),
        (0..n).prop_map(Op::Z),
        (0.0_f64..6.3, 0..n).prop_map(|(a, q)| Op::Rx(a, q)),
        (0..n).prop_map(Op::RzTheta),
        (0..n, 0..n).prop_map(|(q, c)| Op::Measure(q, c)),
    ];
    if n < 2 {
        single.boxed()
    } else {
        prop_oneof![
            4 => single,
            1 => (0..n, 0..n)
                .prop_filter("Control and target must differ", |(c, t)| c != t)
                .prop_map(|(c, t)| Op::CX(c, t)),
        ]
        .boxed()
    }
}

/// Programs with 1-5 qubits, as many bits, and 1-15 operations.
fn arb_program() -> impl Strategy<Value = CircuitProgram> {
    (1_u32..=5).prop_flat_map(|n| {
        prop::collection::vec(arb_op(n), 1..=15).prop_map(move |ops| {
            let mut program = CircuitProgram::with_size(n, n);
            program.declare_parameter("theta");
            for op in ops {
                op.apply(&mut program);
            }
            program
        })
    })
}

/// Sources with a few literal-bounded loops and conditionals.
fn arb_control_flow_source() -> impl Strategy<Value = String> {
    prop::collection::vec((0_u32..4, 1_u32..4, any::<bool>()), 0..6).prop_map(|blocks| {
        let mut source = String::from("qubit[4] q;\nbit[4] c;\n");
        for (start, len, conditional) in blocks {
            let end = (start + len).min(4);
            let body = format!("for int i in [{start}:{end}] {{ h q[i]; cx q[i], q[(i + 1) % 4]; }}");
            if conditional {
                source.push_str(&format!("if (c[0] == 1) {{ {body} }}\n"));
            } else {
                source.push_str(&body);
                source.push('\n');
            }
        }
        source
    })
}

proptest! {
    /// Emitting a program and compiling the text gives back the same program.
    #[test]
    fn test_emit_compile_roundtrip(program in arb_program()) {
        let source = emit(&program);
        let compiled = Compiler::default()
            .compile(&source)
            .expect("emitted source should compile");

        prop_assert_eq!(compiled.num_qubits(), program.num_qubits());
        prop_assert_eq!(compiled.num_clbits(), program.num_clbits());
        prop_assert_eq!(compiled.parameters(), program.parameters());
        prop_assert_eq!(compiled.operations(), program.operations());
    }

    /// Expanding an expanded program changes nothing.
    #[test]
    fn test_expansion_is_idempotent(source in arb_control_flow_source()) {
        let expander = Expander::default();
        let once = expander
            .expand(&parse_program(&source).expect("generated source should parse"))
            .expect("generated source should expand");
        let twice = expander.expand(&once).expect("expanded source should expand");
        prop_assert_eq!(&once, &twice);

        // Skipped markers render as comments; everything else re-parses.
        let reparsed = parse_program(&once.to_string()).expect("rendered source should parse");
        let kept = once
            .statements
            .iter()
            .filter(|s| s.node != Statement::Skipped)
            .count();
        prop_assert_eq!(reparsed.statements.len(), kept);
    }
}
