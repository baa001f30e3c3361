use crate::backend::Backend;
use crate::circuit::Circuit;
use crate::counts::Counts;
use crate::error::BackendError;

#[macro_export]
macro_rules! assert_approx_complex_eq {
    ($expected_re:expr, $expected_im:expr, $actual:expr) => {{
        use num_complex::Complex;
        #[inline(always)]
        pub fn approx_eq(
            expected_re: f64,
            expected_im: f64,
            actual: Complex<f64>,
            eps: f64,
        ) -> bool {
            (expected_re - actual.re).abs() < eps && (expected_im - actual.im).abs() < eps
        }

        assert!(
            approx_eq($expected_re, $expected_im, $actual, 1e-10),
            "Expected {}+{}i,  but got {}",
            $expected_re,
            $expected_im,
            $actual
        );
    }};
}

#[macro_export]
macro_rules! assert_approx_eq {
    ($expected:expr, $actual:expr) => {{
        let expected: f64 = $expected;
        let actual: f64 = $actual;
        assert!(
            (expected - actual).abs() < 1e-10,
            "Expected {}, but got {}",
            expected,
            actual
        );
    }};
}

/// Backend double that ignores the circuit and replays a fixed outcome table.
pub struct FixedOutcomeBackend {
    outcomes: Option<Vec<(String, u64)>>,
}

impl FixedOutcomeBackend {
    pub fn new(outcomes: &[(&str, u64)]) -> Self {
        Self {
            outcomes: Some(
                outcomes
                    .iter()
                    .map(|(key, count)| (key.to_string(), *count))
                    .collect(),
            ),
        }
    }

    /// Always answers with a single outcome holding every shot.
    pub fn single(key: &str) -> Self {
        Self::new(&[(key, 0)])
    }

    pub fn unavailable() -> Self {
        Self { outcomes: None }
    }
}

impl Backend for FixedOutcomeBackend {
    fn name(&self) -> &str {
        "fixed_outcome"
    }

    fn max_qubits(&self) -> usize {
        usize::MAX
    }

    fn execute(&self, _circuit: &Circuit, shots: u32) -> Result<Counts, BackendError> {
        let outcomes = self
            .outcomes
            .as_ref()
            .ok_or_else(|| BackendError::Unavailable(self.name().to_string()))?;

        // A lone zero count stands for "all shots"
        if let [(key, 0)] = outcomes.as_slice() {
            let mut counts = Counts::new(shots as u64);
            counts.record_many(key, shots as u64);
            return Ok(counts);
        }

        let total = outcomes.iter().map(|(_, count)| count).sum();
        let mut counts = Counts::new(total);
        for (key, count) in outcomes {
            counts.record_many(key, *count);
        }
        Ok(counts)
    }
}
