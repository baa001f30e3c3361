//! Error types for circuit construction, execution and result extraction.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error surfaced by the experiments.
#[derive(Debug, Error)]
pub enum Error {
    /// A boolean input was not 0 or 1.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The circuit could not be assembled.
    #[error(transparent)]
    Circuit(#[from] CircuitError),

    /// The execution backend failed.
    #[error("Backend failure: {0}")]
    Backend(#[from] BackendError),

    /// A deterministic single-shot run produced other than exactly one outcome.
    #[error("Expected exactly one measured outcome, got {outcomes:?}")]
    InconsistentResult { outcomes: Vec<String> },

    /// An outcome key that does not read as the expected register value.
    #[error("Measured outcome '{0}' is not a valid register value")]
    MalformedOutcome(String),
}

/// Violations of the register layout of a circuit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    #[error("Qubit index {index} out of bounds for the number of qubits {num_qubits}")]
    QubitOutOfRange { index: usize, num_qubits: usize },

    #[error("Classical bit index {index} out of bounds for the number of classical bits {num_clbits}")]
    ClbitOutOfRange { index: usize, num_clbits: usize },

    #[error("Qubit {0} appears more than once in a single gate")]
    DuplicateQubit(usize),

    #[error("Classical bit {0} is already written by another measurement")]
    ClbitAlreadyMeasured(usize),
}

/// Errors raised by an execution backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend not available: {0}")]
    Unavailable(String),

    #[error("Circuit has {num_qubits} qubits but {backend} only supports {max_qubits}")]
    CircuitTooLarge {
        backend: String,
        num_qubits: usize,
        max_qubits: usize,
    },

    #[error("Number of shots must be at least 1")]
    ZeroShots,

    #[error("Backend reported {shots} shots but recorded {recorded} outcomes")]
    IncompleteCounts { shots: u64, recorded: u64 },

    #[error("Invalid circuit: {0}")]
    InvalidCircuit(#[from] CircuitError),
}
