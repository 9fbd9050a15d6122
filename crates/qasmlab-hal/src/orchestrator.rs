//! Simulation orchestrator.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;
use std::time::Instant;

use qasmlab_ir::CircuitProgram;
use tracing::{debug, info, instrument};

use crate::engine::SimulationEngine;
use crate::error::{SimulationError, SimulationResult};
use crate::result::ExecutionResult;

/// Value every free parameter is bound to before execution.
pub const DEFAULT_PARAMETER_VALUE: f64 = FRAC_PI_2;

/// Checks a program, binds its parameters and hands it to an engine.
#[derive(Clone)]
pub struct Orchestrator {
    engine: Arc<dyn SimulationEngine>,
}

impl Orchestrator {
    pub fn new(engine: impl SimulationEngine + 'static) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn from_arc(engine: Arc<dyn SimulationEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &dyn SimulationEngine {
        self.engine.as_ref()
    }

    /// Simulate a program for `shots` repetitions.
    ///
    /// Fails before reaching the engine if the program measures nothing or
    /// `shots` is zero.
    #[instrument(skip(self, program), fields(engine = self.engine.name()))]
    pub async fn simulate(
        &self,
        mut program: CircuitProgram,
        shots: u32,
    ) -> SimulationResult<ExecutionResult> {
        if !program.has_measurements() {
            return Err(SimulationError::NoMeasurement);
        }
        if shots == 0 {
            return Err(SimulationError::InvalidShots);
        }

        let free = program.free_parameters();
        if !free.is_empty() {
            debug!(?free, value = DEFAULT_PARAMETER_VALUE, "Binding free parameters");
            program.bind_all(DEFAULT_PARAMETER_VALUE);
        }

        let start = Instant::now();
        let counts = self.engine.run(&program, shots).await?;
        let elapsed = start.elapsed();

        if counts.is_empty() {
            return Err(SimulationError::EmptyResult);
        }
        info!(
            outcomes = counts.len(),
            elapsed_ms = elapsed.as_millis(),
            "Simulation finished"
        );

        Ok(ExecutionResult::new(counts, shots)
            .with_num_qubits(program.num_qubits())
            .with_execution_time(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)))
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("engine", &self.engine.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HalError, HalResult};
    use crate::result::Counts;
    use async_trait::async_trait;
    use qasmlab_ir::{ClbitId, GateKind, Operation, ParameterExpression, QubitId};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine that records calls and returns a fixed outcome.
    #[derive(Default)]
    struct MockEngine {
        calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Option<CircuitProgram>>>,
        empty: bool,
        fail: bool,
    }

    #[async_trait]
    impl SimulationEngine for MockEngine {
        fn name(&self) -> &str {
            "mock"
        }

        fn max_qubits(&self) -> u32 {
            4
        }

        async fn run(&self, program: &CircuitProgram, shots: u32) -> HalResult<Counts> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen.lock().unwrap() = Some(program.clone());
            if self.fail {
                return Err(HalError::Backend("boom".into()));
            }
            let mut counts = Counts::new();
            if !self.empty {
                counts.insert("0".repeat(program.num_clbits() as usize), u64::from(shots));
            }
            Ok(counts)
        }
    }

    fn measured(n: u32) -> CircuitProgram {
        let mut program = CircuitProgram::with_size(n, n);
        program.measure_all().unwrap();
        program
    }

    #[tokio::test]
    async fn test_simulate_returns_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orchestrator = Orchestrator::new(MockEngine {
            calls: calls.clone(),
            ..MockEngine::default()
        });

        let result = orchestrator.simulate(measured(2), 100).await.unwrap();
        assert_eq!(result.shots, 100);
        assert_eq!(result.num_qubits, 2);
        assert_eq!(result.counts.get("00"), 100);
        assert!(result.execution_time_ms.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_measurement_skips_engine() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orchestrator = Orchestrator::new(MockEngine {
            calls: calls.clone(),
            ..MockEngine::default()
        });

        let mut program = CircuitProgram::with_size(1, 1);
        program.h(QubitId(0)).unwrap();
        let err = orchestrator.simulate(program, 100).await.unwrap_err();
        assert!(matches!(err, SimulationError::NoMeasurement));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_shots_skips_engine() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orchestrator = Orchestrator::new(MockEngine {
            calls: calls.clone(),
            ..MockEngine::default()
        });

        let err = orchestrator.simulate(measured(1), 0).await.unwrap_err();
        assert!(matches!(err, SimulationError::InvalidShots));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_free_parameters_bound_to_half_pi() {
        let seen = Arc::new(Mutex::new(None));
        let orchestrator = Orchestrator::new(MockEngine {
            seen: seen.clone(),
            ..MockEngine::default()
        });

        let mut program = CircuitProgram::with_size(1, 1);
        program.declare_parameter("theta");
        program
            .rx(ParameterExpression::symbol("theta"), QubitId(0))
            .unwrap();
        program.measure(QubitId(0), ClbitId(0)).unwrap();
        orchestrator.simulate(program, 10).await.unwrap();

        let ran = seen.lock().unwrap().take().unwrap();
        assert!(ran.free_parameters().is_empty());
        match &ran.operations()[0] {
            Operation::Gate(g) => match g.kind() {
                GateKind::Rx(theta) => {
                    assert!((theta.as_f64().unwrap() - FRAC_PI_2).abs() < 1e-12);
                }
                other => panic!("expected rx, got {other:?}"),
            },
            other => panic!("expected a gate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_engine_failure_is_wrapped() {
        let orchestrator = Orchestrator::new(MockEngine {
            fail: true,
            ..MockEngine::default()
        });
        let err = orchestrator.simulate(measured(1), 10).await.unwrap_err();
        assert!(matches!(err, SimulationError::Failure(HalError::Backend(_))));
    }

    #[tokio::test]
    async fn test_empty_counts() {
        let orchestrator = Orchestrator::new(MockEngine {
            empty: true,
            ..MockEngine::default()
        });
        let err = orchestrator.simulate(measured(1), 10).await.unwrap_err();
        assert!(matches!(err, SimulationError::EmptyResult));
    }
}
