//! The two demonstrations: a Bell pair and a Toffoli-based AND gate.

use tracing::{debug, info, instrument};

use crate::backend::{check_counts, Backend, Sampler};
use crate::circuit::Circuit;
use crate::classical::{check_bit, classical_and, AND_TRUTH_TABLE};
use crate::compile::compile;
use crate::counts::Counts;
use crate::error::{Error, Result};
use crate::report::single_outcome;

pub const BELL_SHOTS: u32 = 1024;

/// The AND circuit is deterministic, so one shot decides it.
pub const AND_SHOTS: u32 = 1;

/// H on qubit 0, CNOT 0 -> 1, both qubits measured in index order.
///
/// Every index is in range, so this only fails if the builders change.
pub fn bell_state_circuit() -> Result<Circuit> {
    let circuit = Circuit::new(2, 2)
        .h(0)?
        .cnot(0, 1)?
        .measure(0, 0)?
        .measure(1, 1)?;
    Ok(circuit)
}

/// Inputs flip qubits 0 and 1, a Toffoli writes their AND into qubit 2,
/// which is measured into the single classical bit.
pub fn and_gate_circuit(a: u8, b: u8) -> Result<Circuit> {
    check_bit("a", a)?;
    check_bit("b", b)?;

    let mut circuit = Circuit::new(3, 1);
    if a == 1 {
        circuit = circuit.x(0)?;
    }
    if b == 1 {
        circuit = circuit.x(1)?;
    }

    let circuit = circuit
        .barrier()
        .toffoli(0, 1, 2)?
        .barrier()
        .measure(2, 0)?;
    Ok(circuit)
}

#[derive(Debug, Clone)]
pub struct BellReport {
    pub circuit: Circuit,
    pub counts: Counts,
}

/// Builds, compiles and runs the Bell circuit.
#[instrument(skip(backend))]
pub fn run_bell_state<B: Backend + ?Sized>(backend: &B, shots: u32) -> Result<BellReport> {
    let circuit = bell_state_circuit()?;
    let compiled = compile(&circuit, backend)?;
    let counts = check_counts(backend.execute(&compiled, shots)?)?;
    info!("Bell state on {}: {}", backend.name(), counts);

    Ok(BellReport { circuit, counts })
}

/// Runs the AND circuit for one input pair and returns the measured bit
/// together with the circuit that produced it.
pub fn quantum_and<B: Backend>(sampler: &Sampler<B>, a: u8, b: u8) -> Result<(u8, Circuit)> {
    let circuit = and_gate_circuit(a, b)?;
    let dist = sampler.run(&circuit, AND_SHOTS)?;
    debug!("quantum_and({}, {}) distribution: {}", a, b, dist);

    let value = single_outcome(&dist)?;
    let measured =
        u8::try_from(value).map_err(|_| Error::MalformedOutcome(format!("{:b}", value)))?;
    Ok((measured, circuit))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    pub a: u8,
    pub b: u8,
    pub classical: u8,
    pub quantum: u8,
}

impl Comparison {
    pub fn agrees(&self) -> bool {
        self.classical == self.quantum
    }
}

/// Classical and quantum AND over every input pair.
pub fn compare_and_gate<B: Backend>(sampler: &Sampler<B>) -> Result<Vec<Comparison>> {
    AND_TRUTH_TABLE
        .iter()
        .map(|entry| {
            let classical = classical_and(entry.a, entry.b)?;
            let (quantum, _) = quantum_and(sampler, entry.a, entry.b)?;
            Ok::<_, Error>(Comparison {
                a: entry.a,
                b: entry.b,
                classical,
                quantum,
            })
        })
        .collect()
}
