//! Address versions.
//!
//! The version recorded on an address is the only thing that decides how its
//! inputs are signed. The set is closed: an unknown number never falls back to
//! another scheme.

use std::fmt;

/// The script scheme protecting an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressVersion {
    /// Single user key, P2PKH.
    V1,
    /// User and service 2-of-2 multisig, P2SH.
    V2,
    /// User and service 2-of-2 with a user-only recovery path after a
    /// relative timelock, P2WSH.
    V3,
    /// Submarine swap funding output refundable to the user, P2WSH.
    SubmarineSwap,
}

impl AddressVersion {
    pub const ALL: [AddressVersion; 4] = [
        AddressVersion::V1,
        AddressVersion::V2,
        AddressVersion::V3,
        AddressVersion::SubmarineSwap,
    ];

    /// Numeric value as stored on addresses.
    pub fn as_u32(self) -> u32 {
        match self {
            AddressVersion::V1 => 1,
            AddressVersion::V2 => 2,
            AddressVersion::V3 => 3,
            AddressVersion::SubmarineSwap => 101,
        }
    }

    /// Whether the signature digest commits to the spent amount (BIP-143).
    pub fn is_segwit(self) -> bool {
        match self {
            AddressVersion::V1 | AddressVersion::V2 => false,
            AddressVersion::V3 | AddressVersion::SubmarineSwap => true,
        }
    }
}

impl TryFrom<u32> for AddressVersion {
    /// The unrecognised value.
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AddressVersion::V1),
            2 => Ok(AddressVersion::V2),
            3 => Ok(AddressVersion::V3),
            101 => Ok(AddressVersion::SubmarineSwap),
            other => Err(other),
        }
    }
}

impl fmt::Display for AddressVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_versions_roundtrip() {
        for version in AddressVersion::ALL {
            assert_eq!(AddressVersion::try_from(version.as_u32()), Ok(version));
        }
    }

    #[test]
    fn test_unknown_versions_rejected() {
        for value in [0u32, 4, 5, 100, 102, u32::MAX] {
            assert_eq!(AddressVersion::try_from(value), Err(value));
        }
    }

    #[test]
    fn test_segwit_split() {
        assert!(!AddressVersion::V1.is_segwit());
        assert!(!AddressVersion::V2.is_segwit());
        assert!(AddressVersion::V3.is_segwit());
        assert!(AddressVersion::SubmarineSwap.is_segwit());
    }
}
