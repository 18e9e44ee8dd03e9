//! Signing orchestration.
//!
//! A [`PartiallySignedTransaction`] pairs an unsigned transaction skeleton with
//! one descriptor per input. Signing fans out over a rayon pool: every input is
//! signed against the same unsigned skeleton, each result lands in the slot of
//! its input index, and the slots are only written back once every input has
//! signed. A single failure leaves the skeleton untouched.

use std::fmt;

use bitcoin::consensus::{self, Encodable};
use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::{Transaction, Txid};
use duosig_keys::KeyDeriver;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::descriptor::InputDescriptor;
use crate::error::{Party, SignError};
use crate::schemes::{self, InputContext, InputUnlock};
use crate::version::AddressVersion;

/// Tuning for a signing session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignOptions {
    /// Worker threads for the per-input fan-out. `None` uses rayon's global
    /// pool; `Some(n)` builds a dedicated pool of at most one thread per input.
    pub max_workers: Option<usize>,
}

impl SignOptions {
    pub fn sequential() -> Self {
        Self {
            max_workers: Some(1),
        }
    }
}

/// A fully signed transaction, ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedTransaction {
    pub txid: Txid,
    /// Canonical serialization, witness data included.
    pub bytes: Vec<u8>,
}

impl FinalizedTransaction {
    /// Transaction id as lowercase hex, in the usual reversed byte order.
    pub fn hash(&self) -> String {
        self.txid.to_string()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

/// An unsigned transaction and the descriptors of the outputs it spends.
pub struct PartiallySignedTransaction {
    tx: Transaction,
    inputs: Vec<Box<dyn InputDescriptor>>,
}

impl PartiallySignedTransaction {
    /// Decode a hex encoded transaction, segwit framing allowed.
    pub fn new(raw_hex: &str) -> Result<Self, SignError> {
        let bytes = hex::decode(raw_hex.trim()).map_err(|e| SignError::Decode(e.to_string()))?;
        let tx: Transaction =
            consensus::deserialize(&bytes).map_err(|e| SignError::Decode(e.to_string()))?;
        Ok(Self::from_transaction(tx))
    }

    pub fn from_transaction(tx: Transaction) -> Self {
        Self {
            tx,
            inputs: Vec::new(),
        }
    }

    /// Describe the next input. Descriptors are matched to inputs by order.
    pub fn add_input<I: InputDescriptor + 'static>(&mut self, input: I) {
        self.add_boxed_input(Box::new(input));
    }

    pub fn add_boxed_input(&mut self, input: Box<dyn InputDescriptor>) {
        self.inputs.push(input);
    }

    /// Number of descriptors added so far.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// The skeleton, or the signed transaction after a successful sign.
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// Current transaction bytes, without signing anything.
    pub fn serialize(&self) -> Vec<u8> {
        consensus::serialize(&self.tx)
    }

    pub fn serialize_hex(&self) -> String {
        consensus::encode::serialize_hex(&self.tx)
    }

    /// Sign every input using rayon's global pool.
    pub fn sign<U, S>(&mut self, user: &U, service: &S) -> Result<FinalizedTransaction, SignError>
    where
        U: KeyDeriver + ?Sized,
        S: KeyDeriver + ?Sized,
    {
        self.sign_with(user, service, &SignOptions::default())
    }

    /// Sign every input, deriving each input's keys from the two masters.
    pub fn sign_with<U, S>(
        &mut self,
        user: &U,
        service: &S,
        options: &SignOptions,
    ) -> Result<FinalizedTransaction, SignError>
    where
        U: KeyDeriver + ?Sized,
        S: KeyDeriver + ?Sized,
    {
        if self.inputs.len() != self.tx.input.len() {
            return Err(SignError::InputCountMismatch {
                inputs: self.tx.input.len(),
                descriptors: self.inputs.len(),
            });
        }

        let secp = Secp256k1::new();
        let skeleton = &self.tx;
        let sign_one = |(index, input): (usize, &Box<dyn InputDescriptor>)| {
            sign_input_at(index, skeleton, input.as_ref(), user, service, &secp)
        };

        let slots: Vec<Result<InputUnlock, SignError>> = match options.max_workers {
            None => self.inputs.par_iter().enumerate().map(sign_one).collect(),
            Some(workers) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(workers.clamp(1, self.inputs.len().max(1)))
                    .build()
                    .map_err(|e| SignError::WorkerPool(e.to_string()))?;
                pool.install(|| self.inputs.par_iter().enumerate().map(sign_one).collect())
            }
        };
        // First failure by input index, not by completion order
        let unlocks = slots.into_iter().collect::<Result<Vec<_>, _>>()?;

        let mut signed = self.tx.clone();
        for (txin, unlock) in signed.input.iter_mut().zip(unlocks) {
            txin.script_sig = unlock.script_sig;
            txin.witness = unlock.witness;
        }

        let mut bytes = Vec::with_capacity(signed.total_size());
        signed
            .consensus_encode(&mut bytes)
            .map_err(|e| SignError::Encode(e.to_string()))?;
        let txid = signed.compute_txid();

        log::info!(
            "Signed {} inputs, txid {} ({} bytes)",
            signed.input.len(),
            txid,
            bytes.len()
        );
        self.tx = signed;

        Ok(FinalizedTransaction { txid, bytes })
    }
}

impl fmt::Debug for PartiallySignedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartiallySignedTransaction")
            .field("txid", &self.tx.compute_txid())
            .field("inputs", &self.tx.input.len())
            .field("descriptors", &self.inputs.len())
            .finish()
    }
}

fn sign_input_at<U, S>(
    index: usize,
    tx: &Transaction,
    input: &dyn InputDescriptor,
    user: &U,
    service: &S,
    secp: &Secp256k1<All>,
) -> Result<InputUnlock, SignError>
where
    U: KeyDeriver + ?Sized,
    S: KeyDeriver + ?Sized,
{
    let version = AddressVersion::try_from(input.address().version())
        .map_err(|version| SignError::UnsupportedVersion { index, version })?;
    let path = input.address().derivation_path();

    let user_key = user
        .derive(secp, path)
        .map_err(|source| SignError::Derivation {
            index,
            party: Party::User,
            source,
        })?;
    let service_key = service
        .derive(secp, path)
        .map_err(|source| SignError::Derivation {
            index,
            party: Party::Service,
            source,
        })?;

    log::debug!("Signing input {} (version {}, path {})", index, version, path);

    let ctx = InputContext {
        index,
        tx,
        input,
        user: &user_key,
        service: &service_key,
        secp,
    };
    schemes::sign_input(version, &ctx).map_err(|source| SignError::Signing {
        index,
        version,
        source,
    })
}
