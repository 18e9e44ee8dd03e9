//! duosig Keys
//!
//! Key derivation for two-party cooperative addresses.
//!
//! Every protected address is identified by a derivation path such as
//! `m/schema:1'/recovery:1'/external:1/7`. Both the user and the service hold
//! an extended key sitting somewhere above that path; signing an input derives
//! both keys down to the address's path.
//!
//! Path segments may carry a descriptive label (`external:1`). Labels are
//! ignored for derivation.

pub mod master;
pub mod path;

pub use master::{DerivedKey, KeyDeriver, MasterKey};
pub use path::parse_derivation_path;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Path {path} is not derived from key path {base}")]
    NotADescendant { path: String, base: String },

    #[error("Cannot derive hardened child {0} from a public key")]
    HardenedFromPublic(String),

    #[error("Invalid extended key: {0}")]
    InvalidKey(String),

    #[error("Derivation failed: {0}")]
    DerivationFailed(String),
}
