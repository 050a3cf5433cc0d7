//! Types needed in multiple modules

/// Enumeration of binary symbol values
#[derive(Clone, Eq, PartialEq, Debug, Copy, Default, Hash)]
pub enum Bit {
    /// Binary symbol `0`
    #[default]
    Zero = 0,
    /// Binary symbol `1`
    One = 1,
}

impl Bit {
    /// Returns the modulo-2 sum of two bits.
    #[must_use]
    pub fn xor(self, other: Bit) -> Bit {
        if self == other {
            Bit::Zero
        } else {
            Bit::One
        }
    }

    /// Returns the hard decision for an LLR value (nonnegative values map to `Zero`).
    #[must_use]
    pub fn from_llr(llr: f64) -> Bit {
        if llr >= 0.0 {
            Bit::Zero
        } else {
            Bit::One
        }
    }
}

impl std::ops::BitXorAssign for Bit {
    fn bitxor_assign(&mut self, rhs: Bit) {
        *self = self.xor(rhs);
    }
}

/// Custom error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid input error (malformed code or decoder configuration)
    #[error("{0}")]
    InvalidInput(String),
    /// Caller-supplied sequence has the wrong length
    #[error("Invalid {what} length (expected {expected}, found {found})")]
    SizeMismatch {
        /// Name of the offending sequence
        what: &'static str,
        /// Expected length (or block length, for batched inputs)
        expected: usize,
        /// Length actually supplied
        found: usize,
    },
    /// File read/write error
    #[error("{0}")]
    FileReadWriteError(#[from] std::io::Error),
    /// Serde read/write error
    #[error("{0}")]
    SerdeReadWriteError(#[from] serde_json::Error),
}
