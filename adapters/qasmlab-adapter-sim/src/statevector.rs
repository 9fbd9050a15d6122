//! Statevector kernels.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::PI;

use qasmlab_hal::{HalError, HalResult};
use qasmlab_ir::{GateKind, ParameterExpression};

/// The state of `n` qubits as 2^n complex amplitudes. Qubit `k` is bit `k`
/// of the amplitude index.
#[derive(Debug, Clone)]
pub struct Statevector {
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
}

fn angle(p: &ParameterExpression) -> HalResult<f64> {
    p.as_f64()
        .ok_or_else(|| HalError::InvalidCircuit(format!("unbound parameter '{p}'")))
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Probability of finding `qubit` in |1⟩.
    pub fn probability_one(&self, qubit: usize) -> f64 {
        let mask = 1 << qubit;
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum()
    }

    /// Apply a gate to specific qubits.
    pub fn apply_gate(&mut self, gate: &GateKind, qubits: &[usize]) -> HalResult<()> {
        match gate {
            GateKind::H => self.apply_h(qubits[0]),
            GateKind::X => self.apply_x(qubits[0]),
            GateKind::Y => self.apply_y(qubits[0]),
            GateKind::Z => self.apply_z(qubits[0]),
            GateKind::S => self.apply_phase(qubits[0], PI / 2.0),
            GateKind::Sdg => self.apply_phase(qubits[0], -PI / 2.0),
            GateKind::T => self.apply_phase(qubits[0], PI / 4.0),
            GateKind::Tdg => self.apply_phase(qubits[0], -PI / 4.0),
            GateKind::Rx(theta) => self.apply_rx(qubits[0], angle(theta)?),
            GateKind::Ry(theta) => self.apply_ry(qubits[0], angle(theta)?),
            GateKind::Rz(theta) => self.apply_rz(qubits[0], angle(theta)?),
            GateKind::P(lambda) => self.apply_phase(qubits[0], angle(lambda)?),
            GateKind::U(theta, phi, lambda) => {
                self.apply_u(qubits[0], angle(theta)?, angle(phi)?, angle(lambda)?);
            }
            GateKind::CX => self.apply_cx(qubits[0], qubits[1]),
            GateKind::CY => self.apply_cy(qubits[0], qubits[1]),
            GateKind::CZ => self.apply_cz(qubits[0], qubits[1]),
            GateKind::CH => self.apply_ch(qubits[0], qubits[1]),
            GateKind::Swap => self.apply_swap(qubits[0], qubits[1]),
            GateKind::CCX => self.apply_ccx(qubits[0], qubits[1], qubits[2]),
            GateKind::CSwap => self.apply_cswap(qubits[0], qubits[1], qubits[2]),
        }
        Ok(())
    }

    /// Measure one qubit, collapsing the state onto the outcome.
    pub fn measure(&mut self, qubit: usize, rng: &mut impl Rng) -> bool {
        let p1 = self.probability_one(qubit);
        let outcome = rng.r#gen::<f64>() < p1;
        let p = if outcome { p1 } else { 1.0 - p1 };

        let mask = 1 << qubit;
        let scale = if p > 0.0 { 1.0 / p.sqrt() } else { 0.0 };
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) == outcome {
                *amp *= scale;
            } else {
                *amp = Complex64::new(0.0, 0.0);
            }
        }
        outcome
    }

    // =========================================================================
    // Single-qubit gate implementations
    // =========================================================================

    fn apply_x(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                self.amplitudes.swap(i, i | mask);
            }
        }
    }

    fn apply_y(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let i_val = Complex64::new(0.0, 1.0);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -i_val * self.amplitudes[j];
                self.amplitudes[j] = i_val * tmp;
            }
        }
    }

    fn apply_z(&mut self, qubit: usize) {
        self.apply_phase(qubit, PI);
    }

    fn apply_h(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = sqrt2_inv * (a + b);
                self.amplitudes[j] = sqrt2_inv * (a - b);
            }
        }
    }

    fn apply_phase(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase = Complex64::from_polar(1.0, theta);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask != 0 {
                *amp *= phase;
            }
        }
    }

    fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let neg_i_s = Complex64::new(0.0, -(theta / 2.0).sin());
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + neg_i_s * b;
                self.amplitudes[j] = neg_i_s * a + c * b;
            }
        }
    }

    fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    fn apply_rz(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            *amp *= if i & mask == 0 { phase_0 } else { phase_1 };
        }
    }

    fn apply_u(&mut self, qubit: usize, theta: f64, phi: f64, lambda: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        let e_il = Complex64::from_polar(1.0, lambda);
        let e_ip = Complex64::from_polar(1.0, phi);
        let e_ipl = Complex64::from_polar(1.0, phi + lambda);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - e_il * s * b;
                self.amplitudes[j] = e_ip * s * a + e_ipl * c * b;
            }
        }
    }

    // =========================================================================
    // Multi-qubit gate implementations
    // =========================================================================

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_cy(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        let i_val = Complex64::new(0.0, 1.0);
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                let j = i | tgt_mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -i_val * self.amplitudes[j];
                self.amplitudes[j] = i_val * tmp;
            }
        }
    }

    fn apply_cz(&mut self, control: usize, target: usize) {
        let both = (1 << control) | (1 << target);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & both == both {
                *amp = -*amp;
            }
        }
    }

    fn apply_ch(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                let j = i | tgt_mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = sqrt2_inv * (a + b);
                self.amplitudes[j] = sqrt2_inv * (a - b);
            }
        }
    }

    fn apply_swap(&mut self, q1: usize, q2: usize) {
        let mask1 = 1 << q1;
        let mask2 = 1 << q2;
        for i in 0..(1 << self.num_qubits) {
            if (i & mask1 != 0) && (i & mask2 == 0) {
                self.amplitudes.swap(i, (i & !mask1) | mask2);
            }
        }
    }

    fn apply_ccx(&mut self, c1: usize, c2: usize, target: usize) {
        let ctrl = (1 << c1) | (1 << c2);
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl == ctrl) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_cswap(&mut self, control: usize, t1: usize, t2: usize) {
        let ctrl_mask = 1 << control;
        let t1_mask = 1 << t1;
        let t2_mask = 1 << t2;
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask != 0) && (i & t1_mask != 0) && (i & t2_mask == 0) {
                self.amplitudes.swap(i, (i & !t1_mask) | t2_mask);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(1.0, 0.0)));
        assert!(sv.amplitudes[1..].iter().all(|a| approx_eq(*a, Complex64::new(0.0, 0.0))));
    }

    #[test]
    fn test_bell_state() {
        let mut sv = Statevector::new(2);
        sv.apply_gate(&GateKind::H, &[0]).unwrap();
        sv.apply_gate(&GateKind::CX, &[0, 1]).unwrap();

        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(sqrt2_inv, 0.0)));
        assert!(approx_eq(sv.amplitudes[1], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(sv.amplitudes[2], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(sv.amplitudes[3], Complex64::new(sqrt2_inv, 0.0)));
    }

    #[test]
    fn test_toffoli_and_fredkin() {
        let mut sv = Statevector::new(3);
        sv.apply_gate(&GateKind::X, &[0]).unwrap();
        sv.apply_gate(&GateKind::X, &[1]).unwrap();
        sv.apply_gate(&GateKind::CCX, &[0, 1, 2]).unwrap();
        assert!(approx_eq(sv.amplitudes[0b111], Complex64::new(1.0, 0.0)));

        sv.apply_gate(&GateKind::X, &[1]).unwrap();
        sv.apply_gate(&GateKind::CSwap, &[0, 2, 1]).unwrap();
        assert!(approx_eq(sv.amplitudes[0b011], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_rx_half_pi_splits_evenly() {
        let mut sv = Statevector::new(1);
        sv.apply_gate(&GateKind::Rx(ParameterExpression::constant(PI / 2.0)), &[0])
            .unwrap();
        assert!((sv.probability_one(0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unbound_parameter_is_an_error() {
        let mut sv = Statevector::new(1);
        let err = sv
            .apply_gate(&GateKind::Rz(ParameterExpression::symbol("theta")), &[0])
            .unwrap_err();
        assert!(matches!(err, HalError::InvalidCircuit(_)));
    }

    #[test]
    fn test_measure_collapses() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut sv = Statevector::new(2);
            sv.apply_gate(&GateKind::H, &[0]).unwrap();
            sv.apply_gate(&GateKind::CX, &[0, 1]).unwrap();
            let first = sv.measure(0, &mut rng);
            // The partner qubit is now determined.
            let expected = if first { 1.0 } else { 0.0 };
            assert!((sv.probability_one(1) - expected).abs() < 1e-12);
            assert_eq!(sv.measure(1, &mut rng), first);
        }
    }

    #[test]
    fn test_measure_deterministic() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut sv = Statevector::new(1);
        sv.apply_gate(&GateKind::X, &[0]).unwrap();
        for _ in 0..100 {
            assert!(sv.measure(0, &mut rng));
        }
    }
}
