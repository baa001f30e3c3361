use crate::error::{Error, Result};

/// One row of the AND truth table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruthTableEntry {
    pub a: u8,
    pub b: u8,
    pub expected: u8,
}

pub const AND_TRUTH_TABLE: [TruthTableEntry; 4] = [
    TruthTableEntry { a: 0, b: 0, expected: 0 },
    TruthTableEntry { a: 0, b: 1, expected: 0 },
    TruthTableEntry { a: 1, b: 0, expected: 0 },
    TruthTableEntry { a: 1, b: 1, expected: 1 },
];

/// Rejects anything but 0 and 1.
pub fn check_bit(name: &str, value: u8) -> Result<()> {
    if value > 1 {
        return Err(Error::InvalidInput(format!(
            "{} must be 0 or 1, got {}",
            name, value
        )));
    }
    Ok(())
}

pub fn classical_and(a: u8, b: u8) -> Result<u8> {
    check_bit("a", a)?;
    check_bit("b", b)?;

    if a == 1 && b == 1 {
        Ok(1)
    } else {
        Ok(0)
    }
}
