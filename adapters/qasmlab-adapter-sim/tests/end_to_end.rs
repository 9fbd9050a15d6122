//! Source text through compiler, orchestrator and statevector engine.

use qasmlab_adapter_sim::StatevectorEngine;
use qasmlab_hal::{HalError, Orchestrator, SimulationError};

fn orchestrator(seed: u64) -> Orchestrator {
    Orchestrator::new(StatevectorEngine::new().with_seed(seed))
}

// ============================================================================
// Outcomes
// ============================================================================

#[tokio::test]
async fn test_bell_from_source() {
    let source = "OPENQASM 3.0;\ninclude \"stdgates.inc\";\nqubit[2] q;\nbit[2] c;\nh q[0];\ncx q[0], q[1];\nc[0] = measure q[0];\nc[1] = measure q[1];";
    let program = qasmlab_qasm3::compile(source).unwrap();
    let result = orchestrator(1).simulate(program, 2000).await.unwrap();

    assert_eq!(result.shots, 2000);
    assert_eq!(result.num_qubits, 2);
    assert_eq!(result.counts.total(), 2000);
    assert_eq!(result.counts.get("00") + result.counts.get("11"), 2000);
}

#[tokio::test]
async fn test_bit_order_high_index_first() {
    let source = "qubit[2] q;\nbit[2] c;\nx q[0];\nc[0] = measure q[0];\nc[1] = measure q[1];";
    let program = qasmlab_qasm3::compile(source).unwrap();
    let result = orchestrator(2).simulate(program, 50).await.unwrap();
    assert_eq!(result.counts.get("01"), 50);
}

#[tokio::test]
async fn test_loop_expanded_program_runs() {
    let source = "qubit[3] q;\nbit[3] c;\nfor i in [0:3] { x q[i]; }\nfor i in [0:3] { c[i] = measure q[i]; }";
    let program = qasmlab_qasm3::compile(source).unwrap();
    let result = orchestrator(3).simulate(program, 20).await.unwrap();
    assert_eq!(result.counts.get("111"), 20);
}

#[tokio::test]
async fn test_input_parameter_bound_to_half_pi() {
    let source = "input float[64] theta;\nqubit q;\nbit c;\nrx(theta) q;\nc = measure q;";
    let program = qasmlab_qasm3::compile(source).unwrap();
    let result = orchestrator(4).simulate(program, 4000).await.unwrap();

    let ones = result.counts.probability("1");
    assert!((ones - 0.5).abs() < 0.05, "P(1) = {ones}");
}

#[tokio::test]
async fn test_legacy_source_runs() {
    let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\ncreg c[1];\nx q[0];\nmeasure q[0] -> c[0];";
    let program = qasmlab_qasm3::compile(source).unwrap();
    let result = orchestrator(5).simulate(program, 10).await.unwrap();
    assert_eq!(result.counts.get("1"), 10);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_program_without_measurement() {
    let program = qasmlab_qasm3::compile("qubit[2] q;\nh q[0];").unwrap();
    let err = orchestrator(6).simulate(program, 10).await.unwrap_err();
    assert!(matches!(err, SimulationError::NoMeasurement));
}

#[tokio::test]
async fn test_too_large_for_engine() {
    let source = "qubit[4] q;\nbit[4] c;\nh q[0];\nc[0] = measure q[0];";
    let program = qasmlab_qasm3::compile(source).unwrap();
    let orchestrator = Orchestrator::new(StatevectorEngine::new().with_max_qubits(3));
    let err = orchestrator.simulate(program, 10).await.unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Failure(HalError::CircuitTooLarge(_))
    ));
}

#[tokio::test]
async fn test_seeded_simulation_is_repeatable() {
    let source = "qubit[3] q;\nbit[3] c;\nh q[0];\nh q[1];\nh q[2];\nfor i in [0:3] { c[i] = measure q[i]; }";
    let program = qasmlab_qasm3::compile(source).unwrap();
    let a = orchestrator(9).simulate(program.clone(), 300).await.unwrap();
    let b = orchestrator(9).simulate(program, 300).await.unwrap();
    assert_eq!(a.counts, b.counts);
}
