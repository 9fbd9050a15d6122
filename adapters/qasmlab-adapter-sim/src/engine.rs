//! Shot-by-shot statevector engine.

use std::time::Instant;

use async_trait::async_trait;
use qasmlab_hal::{Counts, HalError, HalResult, SimulationEngine};
use qasmlab_ir::{CircuitProgram, Operation};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, instrument};

use crate::statevector::Statevector;

/// Widest program accepted by default.
pub const DEFAULT_MAX_QUBITS: u32 = 20;

/// Local statevector engine.
///
/// Every shot replays the program from the first measurement onward,
/// collapsing the state at each measurement, so gates that follow a
/// measurement act on the collapsed state.
///
/// Bitstrings list the classical bits with the highest index first:
/// `c[n-1] ... c[1] c[0]`. Bits never written read as `0`.
#[derive(Debug, Clone)]
pub struct StatevectorEngine {
    max_qubits: u32,
    seed: Option<u64>,
}

impl StatevectorEngine {
    pub fn new() -> Self {
        Self {
            max_qubits: DEFAULT_MAX_QUBITS,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_max_qubits(mut self, max_qubits: u32) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Fix the sampling seed so repeated runs give identical counts.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn simulate(&self, program: &CircuitProgram, shots: u32) -> HalResult<Counts> {
        let num_qubits = program.num_qubits();
        if num_qubits > self.max_qubits {
            return Err(HalError::CircuitTooLarge(format!(
                "program uses {num_qubits} qubits, engine supports at most {}",
                self.max_qubits
            )));
        }

        let ops = program.operations();
        let split = ops
            .iter()
            .position(Operation::is_measurement)
            .unwrap_or(ops.len());
        let (prefix, rest) = ops.split_at(split);

        let mut initial = Statevector::new(num_qubits as usize);
        for op in prefix {
            if let Operation::Gate(gate) = op {
                initial.apply_gate(gate.kind(), &indices(gate.qubits()))?;
            }
        }

        let mut rng = self.rng();
        let mut counts = Counts::new();
        let num_clbits = program.num_clbits() as usize;

        for _ in 0..shots {
            let mut state = initial.clone();
            let mut bits = vec![false; num_clbits];
            for op in rest {
                match op {
                    Operation::Gate(gate) => {
                        state.apply_gate(gate.kind(), &indices(gate.qubits()))?;
                    }
                    Operation::Measure(m) => {
                        bits[m.clbit.index()] = state.measure(m.qubit.index(), &mut rng);
                    }
                }
            }
            counts.insert(bitstring(&bits), 1);
        }

        Ok(counts)
    }
}

impl Default for StatevectorEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimulationEngine for StatevectorEngine {
    fn name(&self) -> &str {
        "statevector"
    }

    fn max_qubits(&self) -> u32 {
        self.max_qubits
    }

    #[instrument(skip(self, program), fields(qubits = program.num_qubits()))]
    async fn run(&self, program: &CircuitProgram, shots: u32) -> HalResult<Counts> {
        let start = Instant::now();
        let counts = self.simulate(program, shots)?;
        debug!(
            shots,
            outcomes = counts.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Statevector run complete"
        );
        Ok(counts)
    }
}

fn indices(qubits: &[qasmlab_ir::QubitId]) -> Vec<usize> {
    qubits.iter().map(|q| q.index()).collect()
}

fn bitstring(bits: &[bool]) -> String {
    bits.iter().rev().map(|&b| if b { '1' } else { '0' }).collect()
}
