pub mod backend;
pub mod circuit;
pub mod classical;
pub mod compile;
pub mod counts;
pub mod error;
pub mod experiments;
pub mod gates;
pub mod qstate;
pub mod report;

#[cfg(test)]
mod test_util;

use num_complex::Complex;

pub use backend::{Backend, Sampler, StatevectorSimulator};
pub use circuit::Circuit;
pub use counts::{Counts, Distribution};
pub use error::{BackendError, CircuitError, Error};
pub use qstate::QState;

pub type Qbit = Complex<f64>;
