use std::fmt::Display;

use anyhow::Result;
use nalgebra::DVector;
use nalgebra_sparse::csr::CsrMatrix;
use num_complex::Complex;

use crate::Qbit;

#[derive(Debug, Clone)]
pub struct QState {
    pub(crate) state: DVector<Qbit>,
}

impl QState {
    pub fn zero_state(num_of_qbits: usize) -> Self {
        let size = 1_usize << num_of_qbits;
        let mut state = DVector::zeros(size);
        state[0] = Complex::new(1.0, 0.0); // |0...0> state
        Self { state }
    }

    pub fn from_str(qbits: &str) -> Result<Self> {
        let index = usize::from_str_radix(qbits, 2)?;
        let mut state = DVector::zeros(1_usize << qbits.len());
        state[index] = Complex::new(1.0, 0.0);

        Ok(Self { state })
    }

    pub fn num_of_qbits(&self) -> usize {
        self.state.len().ilog2() as usize
    }

    pub(crate) fn apply_operator(&mut self, operator: &CsrMatrix<Qbit>) {
        let state = std::mem::replace(&mut self.state, DVector::zeros(0));
        self.state = operator * state;
    }

    /// Born-rule probability of every basis state, indexed like the amplitudes.
    pub fn probabilities(&self) -> Vec<f64> {
        self.state.iter().map(|amp| amp.norm_sqr()).collect()
    }

    /// Probability that measuring `qbit` yields 1.
    pub fn probability_of_one(&self, qbit: usize) -> f64 {
        let mask = 1 << qbit;
        self.state
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, amp)| amp.norm_sqr())
            .sum()
    }

    /// Projects `qbit` onto `outcome` and renormalizes.
    pub(crate) fn collapse(&mut self, qbit: usize, outcome: bool) {
        let mask = 1 << qbit;
        let mut norm = 0.0;
        for (i, amp) in self.state.iter_mut().enumerate() {
            if (i & mask != 0) != outcome {
                *amp = Complex::new(0.0, 0.0);
            } else {
                norm += amp.norm_sqr();
            }
        }

        if norm > 0.0 {
            let scale = 1.0 / norm.sqrt();
            self.state.iter_mut().for_each(|amp| *amp *= scale);
        }
    }
}

impl Display for QState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bin_width = self.num_of_qbits();

        for (i, value) in self.state.iter().enumerate() {
            writeln!(f, "|{:0width$b}>: {}", i, value, width = bin_width)?;
        }

        Ok(())
    }
}
