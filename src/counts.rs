//! Outcome tables: absolute counts and probability distributions over
//! measured bit-strings.
//!
//! Bit-strings carry one character per classical bit with classical bit 0
//! rightmost, the same order `QState` uses for basis states.

use std::collections::BTreeMap;
use std::fmt::Display;

/// Formats the classical register, indexed by clbit, as a bit-string.
pub fn bitstring(bits: &[bool]) -> String {
    bits.iter()
        .rev()
        .map(|&bit| if bit { '1' } else { '0' })
        .collect()
}

/// Number of times each bit-string was observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts {
    counts: BTreeMap<String, u64>,
    shots: u64,
}

impl Counts {
    pub fn new(shots: u64) -> Self {
        Self {
            counts: BTreeMap::new(),
            shots,
        }
    }

    pub fn record(&mut self, key: &str) {
        self.record_many(key, 1);
    }

    pub fn record_many(&mut self, key: &str, count: u64) {
        *self.counts.entry(key.to_string()).or_insert(0) += count;
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Shots requested for the run that produced these counts.
    pub fn shots(&self) -> u64 {
        self.shots
    }

    /// Sum of all recorded counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(key, count)| (key.as_str(), *count))
    }

    pub fn max_count(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    pub fn to_distribution(&self) -> Distribution {
        let total = self.total();
        if total == 0 {
            return Distribution::default();
        }

        Distribution {
            probabilities: self
                .counts
                .iter()
                .map(|(key, &count)| (key.clone(), count as f64 / total as f64))
                .collect(),
        }
    }
}

impl Display for Counts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self
            .counts
            .iter()
            .map(|(key, count)| format!("'{}': {}", key, count))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", entries)
    }
}

/// Probability of each observed bit-string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    probabilities: BTreeMap<String, f64>,
}

impl Distribution {
    pub fn get(&self, key: &str) -> f64 {
        self.probabilities.get(key).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.probabilities.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.probabilities
            .iter()
            .map(|(key, probability)| (key.as_str(), *probability))
    }

    /// Scales back to counts for `shots` runs, rounding to the nearest count.
    /// Only meant for display: rounded counts need not sum to `shots`.
    pub fn to_counts(&self, shots: u64) -> Counts {
        let mut counts = Counts::new(shots);
        for (key, probability) in self.iter() {
            let count = (probability * shots as f64).round() as u64;
            if count > 0 {
                counts.record_many(key, count);
            }
        }
        counts
    }
}

impl Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self
            .probabilities
            .iter()
            .map(|(key, probability)| format!("'{}': {:?}", key, probability))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", entries)
    }
}
