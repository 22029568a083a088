//! Error types for [`OMap`](crate::OMap) operations.
//!
//! Only relocation and range extraction can fail. Lookups, pushes, and
//! removals report absence through their return values instead.

use thiserror::Error;

/// Which argument of a move operation was missing from the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    /// The key being moved.
    Key,
    /// The anchor key the move is relative to.
    Mark,
}

impl core::fmt::Display for Operand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Operand::Key => f.write_str("key"),
            Operand::Mark => f.write_str("mark"),
        }
    }
}

/// Errors returned by [`OMap`](crate::OMap).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum Error {
    /// A move named a key that is not in the map.
    #[error("the {0} does not exist")]
    KeyNotFound(Operand),

    /// `try_between` was given endpoints it rejects.
    #[error("invalid range {start}..={end}")]
    InvalidRange {
        /// Requested start position, before wrap-around.
        start: isize,
        /// Requested end position, before wrap-around.
        end: isize,
    },
}

/// Result type for [`OMap`](crate::OMap) operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::KeyNotFound(Operand::Key).to_string(),
            "the key does not exist"
        );
        assert_eq!(
            Error::KeyNotFound(Operand::Mark).to_string(),
            "the mark does not exist"
        );
        assert_eq!(
            Error::InvalidRange { start: -3, end: 2 }.to_string(),
            "invalid range -3..=2"
        );
    }
}
