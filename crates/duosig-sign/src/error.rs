//! Errors raised while building or signing a transaction.

use std::fmt;

use bitcoin::OutPoint;
use duosig_keys::KeyError;
use thiserror::Error;

use crate::version::AddressVersion;

/// Which side of a cooperative address a key or signature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    User,
    Service,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::User => write!(f, "user"),
            Party::Service => write!(f, "service"),
        }
    }
}

/// Failure inside a single scheme signer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemeError {
    #[error("Missing {0} signature and no {0} private key to produce one")]
    MissingSignature(Party),

    #[error("Malformed {0} signature: {1}")]
    MalformedSignature(Party, String),

    #[error("Pre-supplied {0} signature does not verify for this input")]
    InvalidSignature(Party),

    #[error("Descriptor outpoint {descriptor} does not match transaction input {input}")]
    OutpointMismatch { descriptor: OutPoint, input: OutPoint },

    #[error("Submarine swap input carries no refund details")]
    MissingSwapDetails,

    #[error("Version {0} input carries submarine swap refund details")]
    UnexpectedSwapDetails(AddressVersion),

    #[error("Refund not spendable before lock time {lock_time} (transaction lock time {tx_lock_time})")]
    RefundNotYetSpendable { lock_time: u32, tx_lock_time: u32 },

    #[error("Recovery path needs a relative lock of {blocks} blocks on the input")]
    RecoveryNotYetSpendable { blocks: u16 },

    #[error("Signature hash computation failed: {0}")]
    Sighash(String),

    #[error("Script construction failed: {0}")]
    Script(String),
}

/// Failure of a whole signing session.
///
/// Every variant raised after construction names the offending input, see
/// [`SignError::input_index`].
#[derive(Error, Debug)]
pub enum SignError {
    #[error("Failed to decode transaction: {0}")]
    Decode(String),

    #[error("Transaction has {inputs} inputs but {descriptors} input descriptors were added")]
    InputCountMismatch { inputs: usize, descriptors: usize },

    #[error("Failed to derive {party} key for input {index}: {source}")]
    Derivation {
        index: usize,
        party: Party,
        #[source]
        source: KeyError,
    },

    #[error("Can't sign input {index} of unsupported address version {version}")]
    UnsupportedVersion { index: usize, version: u32 },

    #[error("Failed to sign input {index} using version {version}: {source}")]
    Signing {
        index: usize,
        version: AddressVersion,
        #[source]
        source: SchemeError,
    },

    #[error("Failed to encode transaction: {0}")]
    Encode(String),

    #[error("Failed to start signing workers: {0}")]
    WorkerPool(String),
}

impl SignError {
    /// The input that caused the failure, if the failure is tied to one.
    pub fn input_index(&self) -> Option<usize> {
        match self {
            SignError::Derivation { index, .. }
            | SignError::UnsupportedVersion { index, .. }
            | SignError::Signing { index, .. } => Some(*index),
            _ => None,
        }
    }
}
