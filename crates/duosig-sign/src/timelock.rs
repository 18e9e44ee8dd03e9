//! Relative timelock for the recovery path of V3 addresses.

use bitcoin::{relative, Sequence};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timelock duration in blocks (~10 min each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timelock(u16);

impl Timelock {
    /// Delay before a V3 address can be spent with the user key alone.
    pub const RECOVERY: Timelock = Timelock(52_560);

    /// Get the block count
    pub fn blocks(&self) -> u16 {
        self.0
    }

    /// Sequence value that satisfies a CSV of this length exactly
    pub fn to_sequence(&self) -> Sequence {
        Sequence::from_height(self.0)
    }

    /// Whether an input with `sequence` has waited at least this long.
    pub fn is_satisfied_by(&self, sequence: Sequence) -> bool {
        match sequence.to_relative_lock_time() {
            Some(lock) => relative::LockTime::from_height(self.0).is_implied_by(lock),
            None => false,
        }
    }
}

impl fmt::Display for Timelock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.0 / 144;
        if days >= 365 {
            write!(f, "~{:.1} years ({} blocks)", days as f32 / 365.0, self.0)
        } else if days >= 30 {
            write!(f, "~{:.1} months ({} blocks)", days as f32 / 30.0, self.0)
        } else {
            write!(f, "~{} days ({} blocks)", days, self.0)
        }
    }
}
