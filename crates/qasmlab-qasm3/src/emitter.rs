//! `OpenQASM` 3 emitter for compiled programs.

use qasmlab_ir::{CircuitProgram, GateOp, Operation, ParameterExpression};

/// Emit a program as flat `OpenQASM` 3 over one `q`/`c` register pair.
///
/// Unbound parameters become `input float[64]` declarations, so the output
/// compiles back to the same operations.
pub fn emit(program: &CircuitProgram) -> String {
    let mut emitter = Emitter::new();
    emitter.emit_program(program);
    emitter.output
}

struct Emitter {
    output: String,
}

impl Emitter {
    fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    fn emit_program(&mut self, program: &CircuitProgram) {
        self.writeln("OPENQASM 3.0;");
        self.writeln("include \"stdgates.inc\";");
        self.writeln("");

        let params = program.free_parameters();
        for name in &params {
            self.writeln(&format!("input float[64] {name};"));
        }

        let num_qubits = program.num_qubits();
        if num_qubits > 0 {
            self.writeln(&format!("qubit[{num_qubits}] q;"));
        }
        let num_clbits = program.num_clbits();
        if num_clbits > 0 {
            self.writeln(&format!("bit[{num_clbits}] c;"));
        }
        if !params.is_empty() || num_qubits > 0 || num_clbits > 0 {
            self.writeln("");
        }

        for op in program.operations() {
            match op {
                Operation::Gate(gate) => self.emit_gate(gate),
                Operation::Measure(m) => {
                    self.writeln(&format!("c[{}] = measure q[{}];", m.clbit.0, m.qubit.0));
                }
            }
        }
    }

    fn emit_gate(&mut self, gate: &GateOp) {
        let name = gate.kind().name();
        let qubits = gate
            .qubits()
            .iter()
            .map(|q| format!("q[{}]", q.0))
            .collect::<Vec<_>>()
            .join(", ");
        let params = gate.kind().parameters();
        if params.is_empty() {
            self.writeln(&format!("{name} {qubits};"));
        } else {
            let params = params
                .iter()
                .map(|p| emit_param(p))
                .collect::<Vec<_>>()
                .join(", ");
            self.writeln(&format!("{name}({params}) {qubits};"));
        }
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

fn emit_param(p: &ParameterExpression) -> String {
    match p {
        // Debug keeps the exponent form for very large or small values.
        ParameterExpression::Constant(v) => format!("{v:?}"),
        ParameterExpression::Symbol(name) => name.clone(),
        ParameterExpression::Pi => "pi".into(),
        ParameterExpression::Neg(e) => format!("-({})", emit_param(e)),
        ParameterExpression::Add(a, b) => format!("({} + {})", emit_param(a), emit_param(b)),
        ParameterExpression::Sub(a, b) => format!("({} - {})", emit_param(a), emit_param(b)),
        ParameterExpression::Mul(a, b) => format!("({} * {})", emit_param(a), emit_param(b)),
        ParameterExpression::Div(a, b) => format!("({} / {})", emit_param(a), emit_param(b)),
    }
}
