//! Execution backends.
//!
//! The experiments only see the [`Backend`] trait, so the bundled
//! [`StatevectorSimulator`] can be swapped for any other executor.

use std::cell::RefCell;
use std::time::Instant;

use nalgebra_sparse::csr::CsrMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use crate::circuit::{Circuit, Instruction};
use crate::counts::{bitstring, Counts, Distribution};
use crate::error::BackendError;
use crate::qstate::QState;
use crate::Qbit;

/// Something that can run a circuit for a number of shots.
pub trait Backend {
    fn name(&self) -> &str;

    /// Widest circuit the backend accepts.
    fn max_qubits(&self) -> usize;

    /// Runs `circuit` `shots` times and tallies the measured bit-strings.
    fn execute(&self, circuit: &Circuit, shots: u32) -> Result<Counts, BackendError>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn max_qubits(&self) -> usize {
        (**self).max_qubits()
    }

    fn execute(&self, circuit: &Circuit, shots: u32) -> Result<Counts, BackendError> {
        (**self).execute(circuit, shots)
    }
}

enum Step {
    Unitary(CsrMatrix<Qbit>),
    Measure { qubit: usize, clbit: usize },
}

/// Noiseless state-vector simulator.
///
/// Memory grows as 4^n for the operators, so it is only meant for the
/// handful of qubits the demos use.
pub struct StatevectorSimulator {
    rng: RefCell<StdRng>,
    max_qubits: usize,
}

impl StatevectorSimulator {
    pub fn new() -> Self {
        Self {
            rng: RefCell::new(StdRng::from_os_rng()),
            max_qubits: 12,
        }
    }

    /// Reproducible sampling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = RefCell::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    fn steps(circuit: &Circuit) -> Vec<Step> {
        circuit
            .instructions()
            .iter()
            .filter_map(|inst| match inst {
                Instruction::Gate(gate) => Some(Step::Unitary(circuit.operator(gate))),
                Instruction::Barrier => None,
                Instruction::Measure { qubit, clbit } => Some(Step::Measure {
                    qubit: *qubit,
                    clbit: *clbit,
                }),
            })
            .collect()
    }

    /// True when no gate follows a measurement.
    fn measurements_are_terminal(steps: &[Step]) -> bool {
        match steps.iter().position(|s| matches!(s, Step::Measure { .. })) {
            Some(first) => steps[first..]
                .iter()
                .all(|s| matches!(s, Step::Measure { .. })),
            None => true,
        }
    }

    /// Computes the final state once and draws every shot from it.
    fn sample_terminal(&self, circuit: &Circuit, steps: &[Step], shots: u32) -> Counts {
        let mut state = QState::zero_state(circuit.num_qubits());
        let mut measurements = Vec::new();
        for step in steps {
            match step {
                Step::Unitary(op) => state.apply_operator(op),
                Step::Measure { qubit, clbit } => measurements.push((*qubit, *clbit)),
            }
        }

        let probabilities = state.probabilities();
        let mut rng = self.rng.borrow_mut();
        let mut counts = Counts::new(shots as u64);
        for _ in 0..shots {
            let basis = sample_index(&probabilities, rng.random::<f64>());
            let mut bits = vec![false; circuit.num_clbits()];
            for (qubit, clbit) in &measurements {
                bits[*clbit] = (basis >> qubit) & 1 == 1;
            }
            counts.record(&bitstring(&bits));
        }
        counts
    }

    /// Replays the whole circuit per shot, collapsing at each measurement.
    fn sample_per_shot(&self, circuit: &Circuit, steps: &[Step], shots: u32) -> Counts {
        let mut rng = self.rng.borrow_mut();
        let mut counts = Counts::new(shots as u64);
        for _ in 0..shots {
            let mut state = QState::zero_state(circuit.num_qubits());
            let mut bits = vec![false; circuit.num_clbits()];
            for step in steps {
                match step {
                    Step::Unitary(op) => state.apply_operator(op),
                    Step::Measure { qubit, clbit } => {
                        let outcome = rng.random::<f64>() < state.probability_of_one(*qubit);
                        state.collapse(*qubit, outcome);
                        bits[*clbit] = outcome;
                    }
                }
            }
            counts.record(&bitstring(&bits));
        }
        counts
    }
}

impl Default for StatevectorSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for StatevectorSimulator {
    fn name(&self) -> &str {
        "statevector_simulator"
    }

    fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    #[instrument(skip(self, circuit))]
    fn execute(&self, circuit: &Circuit, shots: u32) -> Result<Counts, BackendError> {
        if shots == 0 {
            return Err(BackendError::ZeroShots);
        }
        if circuit.num_qubits() > self.max_qubits {
            return Err(BackendError::CircuitTooLarge {
                backend: self.name().to_string(),
                num_qubits: circuit.num_qubits(),
                max_qubits: self.max_qubits,
            });
        }

        let start = Instant::now();
        let steps = Self::steps(circuit);
        let terminal = Self::measurements_are_terminal(&steps);
        debug!(
            "Starting simulation: {} qubits, {} steps, {} shots, terminal measurements: {}",
            circuit.num_qubits(),
            steps.len(),
            shots,
            terminal
        );

        let counts = if terminal {
            self.sample_terminal(circuit, &steps, shots)
        } else {
            self.sample_per_shot(circuit, &steps, shots)
        };

        debug!("Simulation completed in {:?}: {}", start.elapsed(), counts);
        Ok(counts)
    }
}

/// Picks the basis index whose cumulative probability first exceeds `r`.
fn sample_index(probabilities: &[f64], r: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, p) in probabilities.iter().enumerate() {
        cumulative += p;
        if r < cumulative {
            return i;
        }
    }
    // Rounding left r above the final sum; use the last reachable state.
    probabilities.iter().rposition(|&p| p > 0.0).unwrap_or(0)
}

/// Rejects a table whose counts do not add up to the shots it reports.
pub fn check_counts(counts: Counts) -> Result<Counts, BackendError> {
    if counts.total() != counts.shots() {
        return Err(BackendError::IncompleteCounts {
            shots: counts.shots(),
            recorded: counts.total(),
        });
    }
    Ok(counts)
}

/// Runs circuits on a backend and reports probabilities instead of counts.
pub struct Sampler<B> {
    backend: B,
}

impl<B: Backend> Sampler<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn run(&self, circuit: &Circuit, shots: u32) -> Result<Distribution, BackendError> {
        let counts = check_counts(self.backend.execute(circuit, shots)?)?;
        Ok(counts.to_distribution())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::assert_approx_eq;
    use crate::test_util::FixedOutcomeBackend;

    #[test]
    fn test_bell_counts_are_correlated() -> Result<()> {
        let circuit = Circuit::new(2, 2)
            .h(0)?
            .cnot(0, 1)?
            .measure(0, 0)?
            .measure(1, 1)?;
        let counts = StatevectorSimulator::new()
            .with_seed(7)
            .execute(&circuit, 1024)?;

        assert_eq!(1024, counts.total());
        assert!(counts.keys().all(|k| k == "00" || k == "11"));
        // Both branches show up with overwhelming probability
        assert!(counts.get("00") > 400);
        assert!(counts.get("11") > 400);

        Ok(())
    }

    #[test]
    fn test_seeded_runs_are_reproducible() -> Result<()> {
        let circuit = Circuit::new(1, 1).h(0)?.measure(0, 0)?;

        let first = StatevectorSimulator::new()
            .with_seed(42)
            .execute(&circuit, 100)?;
        let second = StatevectorSimulator::new()
            .with_seed(42)
            .execute(&circuit, 100)?;

        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn test_deterministic_circuit_gives_single_outcome() -> Result<()> {
        let circuit = Circuit::new(3, 1)
            .x(0)?
            .x(1)?
            .toffoli(0, 1, 2)?
            .measure(2, 0)?;
        let counts = StatevectorSimulator::new().execute(&circuit, 1)?;

        assert_eq!(1, counts.len());
        assert_eq!(1, counts.get("1"));

        Ok(())
    }

    #[test]
    fn test_measurement_maps_qubit_to_clbit() -> Result<()> {
        // qubit 1 into clbit 0 and qubit 0 into clbit 1
        let circuit = Circuit::new(2, 2).x(1)?.measure(1, 0)?.measure(0, 1)?;
        let counts = StatevectorSimulator::new().execute(&circuit, 5)?;

        assert_eq!(5, counts.get("01"));

        Ok(())
    }

    #[test]
    fn test_mid_circuit_measurement() -> Result<()> {
        // Measuring before the CNOT still leaves the pair correlated
        let circuit = Circuit::new(2, 2)
            .h(0)?
            .measure(0, 0)?
            .cnot(0, 1)?
            .measure(1, 1)?;
        let counts = StatevectorSimulator::new()
            .with_seed(3)
            .execute(&circuit, 200)?;

        assert_eq!(200, counts.total());
        assert!(counts.keys().all(|k| k == "00" || k == "11"));

        Ok(())
    }

    #[test]
    fn test_unmeasured_circuit_counts_empty_bitstring() -> Result<()> {
        let circuit = Circuit::new(1, 0).h(0)?;
        let counts = StatevectorSimulator::new().execute(&circuit, 3)?;

        assert_eq!(3, counts.get(""));

        Ok(())
    }

    #[test]
    fn test_wide_classical_register() -> Result<()> {
        let circuit = Circuit::new(2, 70)
            .x(0)?
            .measure(0, 65)?
            .measure(1, 69)?;
        let counts = StatevectorSimulator::new().execute(&circuit, 2)?;

        let expected = (0..70)
            .rev()
            .map(|i| if i == 65 { '1' } else { '0' })
            .collect::<String>();
        assert_eq!(2, counts.get(&expected));

        // A gate after a measurement takes the per-shot path
        let circuit = Circuit::new(2, 70)
            .x(0)?
            .measure(0, 65)?
            .x(1)?
            .measure(1, 69)?;
        let counts = StatevectorSimulator::new().execute(&circuit, 2)?;

        let expected = (0..70)
            .rev()
            .map(|i| if i == 65 || i == 69 { '1' } else { '0' })
            .collect::<String>();
        assert_eq!(2, counts.get(&expected));

        Ok(())
    }

    #[test]
    fn test_zero_shots_is_rejected() -> Result<()> {
        let circuit = Circuit::new(1, 1).measure(0, 0)?;
        let result = StatevectorSimulator::new().execute(&circuit, 0);

        assert!(matches!(result, Err(BackendError::ZeroShots)));

        Ok(())
    }

    #[test]
    fn test_too_many_qubits_is_rejected() {
        let circuit = Circuit::new(4, 0);
        let result = StatevectorSimulator::new()
            .with_max_qubits(3)
            .execute(&circuit, 1);

        assert!(matches!(
            result,
            Err(BackendError::CircuitTooLarge { num_qubits: 4, max_qubits: 3, .. })
        ));
    }

    #[test]
    fn test_sample_index() {
        let probabilities = [0.5, 0.0, 0.0, 0.5];

        assert_eq!(0, sample_index(&probabilities, 0.1));
        assert_eq!(3, sample_index(&probabilities, 0.7));
        assert_eq!(3, sample_index(&probabilities, 1.0));
    }

    #[test]
    fn test_sampler_returns_probabilities() -> Result<()> {
        let circuit = Circuit::new(1, 1).measure(0, 0)?;
        let sampler = Sampler::new(FixedOutcomeBackend::new(&[("0", 3), ("1", 1)]));

        let dist = sampler.run(&circuit, 4)?;
        assert_approx_eq!(0.75, dist.get("0"));
        assert_approx_eq!(0.25, dist.get("1"));

        Ok(())
    }

    #[test]
    fn test_backend_failure_propagates_through_sampler() -> Result<()> {
        let circuit = Circuit::new(1, 1).measure(0, 0)?;
        let sampler = Sampler::new(FixedOutcomeBackend::unavailable());

        assert!(matches!(
            sampler.run(&circuit, 1),
            Err(BackendError::Unavailable(_))
        ));

        Ok(())
    }

    struct ShortBackend;

    impl Backend for ShortBackend {
        fn name(&self) -> &str {
            "short"
        }

        fn max_qubits(&self) -> usize {
            1
        }

        fn execute(&self, _circuit: &Circuit, shots: u32) -> Result<Counts, BackendError> {
            let mut counts = Counts::new(shots as u64);
            counts.record("0");
            Ok(counts)
        }
    }

    #[test]
    fn test_sampler_rejects_incomplete_counts() -> Result<()> {
        let circuit = Circuit::new(1, 1).measure(0, 0)?;
        let sampler = Sampler::new(ShortBackend);

        assert!(matches!(
            sampler.run(&circuit, 3),
            Err(BackendError::IncompleteCounts { shots: 3, recorded: 1 })
        ));
        assert_eq!(1, sampler.run(&circuit, 1)?.len());

        Ok(())
    }
}
