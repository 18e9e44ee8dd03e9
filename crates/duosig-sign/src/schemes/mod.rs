//! Per-version input signers.
//!
//! Each signer rebuilds the script locking its input, computes the digest the
//! scheme signs, gathers the signatures it needs and lays out the unlocking
//! data in the order that script consumes it.

mod swap;
mod v1;
mod v2;
mod v3;

use bitcoin::address::NetworkUnchecked;
use bitcoin::ecdsa::Signature;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{All, Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Address, OutPoint, Script, ScriptBuf, Transaction, TxIn, Witness};
use duosig_keys::DerivedKey;

use crate::descriptor::InputDescriptor;
use crate::error::{Party, SchemeError};
use crate::script::{output_script, AddressKeys};
use crate::version::AddressVersion;

/// Witness element read as false by `OP_IF`.
const FALSE: &[u8] = &[];
/// Minimal true for `OP_IF` under segwit's MINIMALIF rule.
const TRUE: &[u8] = &[1];

/// Unlocking data for one input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct InputUnlock {
    pub script_sig: ScriptBuf,
    pub witness: Witness,
}

/// What a scheme signer gets to look at.
pub(crate) struct InputContext<'a> {
    pub index: usize,
    /// Unsigned skeleton. Never mutated while signers run.
    pub tx: &'a Transaction,
    pub input: &'a dyn InputDescriptor,
    pub user: &'a DerivedKey,
    pub service: &'a DerivedKey,
    pub secp: &'a Secp256k1<All>,
}

impl InputContext<'_> {
    pub fn keys(&self) -> AddressKeys {
        AddressKeys {
            user: self.user.public_key(),
            service: self.service.public_key(),
        }
    }

    pub fn txin(&self) -> Result<&TxIn, SchemeError> {
        self.tx
            .input
            .get(self.index)
            .ok_or_else(|| SchemeError::Sighash(format!("no input at index {}", self.index)))
    }

    /// Digest a `version` input signs over.
    ///
    /// Segwit versions use BIP-143, which commits to the spent amount. The
    /// others use the legacy algorithm over `script_code`.
    pub fn digest(&self, version: AddressVersion, script_code: &Script) -> Result<[u8; 32], SchemeError> {
        let mut cache = SighashCache::new(self.tx);
        if version.is_segwit() {
            let sighash = cache
                .p2wsh_signature_hash(
                    self.index,
                    script_code,
                    self.input.outpoint().amount(),
                    EcdsaSighashType::All,
                )
                .map_err(|e| SchemeError::Sighash(e.to_string()))?;
            Ok(sighash.to_byte_array())
        } else {
            let sighash = cache
                .legacy_signature_hash(self.index, script_code, EcdsaSighashType::All.to_u32())
                .map_err(|e| SchemeError::Sighash(e.to_string()))?;
            Ok(sighash.to_byte_array())
        }
    }

    /// A party's signature over `digest`, if one can be had.
    ///
    /// A signature already on the descriptor wins and must verify. Otherwise
    /// the party's derived secret key signs.
    pub fn signature(&self, party: Party, digest: [u8; 32]) -> Result<Option<Signature>, SchemeError> {
        let (supplied, key) = match party {
            Party::User => (self.input.user_signature(), self.user),
            Party::Service => (self.input.service_signature(), self.service),
        };
        let msg = Message::from_digest(digest);

        if let Some(bytes) = supplied {
            let sig = Signature::from_slice(bytes)
                .map_err(|e| SchemeError::MalformedSignature(party, e.to_string()))?;
            if sig.sighash_type != EcdsaSighashType::All {
                return Err(SchemeError::MalformedSignature(
                    party,
                    format!("unsupported sighash type {}", sig.sighash_type),
                ));
            }
            self.secp
                .verify_ecdsa(&msg, &sig.signature, &key.public_key().inner)
                .map_err(|_| SchemeError::InvalidSignature(party))?;
            return Ok(Some(sig));
        }

        Ok(key
            .secret_key()
            .map(|sk| Signature::sighash_all(self.secp.sign_ecdsa(&msg, sk))))
    }

    pub fn required_signature(&self, party: Party, digest: [u8; 32]) -> Result<Signature, SchemeError> {
        self.signature(party, digest)?
            .ok_or(SchemeError::MissingSignature(party))
    }
}

/// Sign one input with the scheme of `version`.
pub(crate) fn sign_input(
    version: AddressVersion,
    ctx: &InputContext<'_>,
) -> Result<InputUnlock, SchemeError> {
    check_outpoint(ctx)?;
    if version != AddressVersion::SubmarineSwap && ctx.input.submarine_swap().is_some() {
        return Err(SchemeError::UnexpectedSwapDetails(version));
    }
    warn_on_address_mismatch(version, ctx);

    match version {
        AddressVersion::V1 => v1::sign(ctx),
        AddressVersion::V2 => v2::sign(ctx),
        AddressVersion::V3 => v3::sign(ctx),
        AddressVersion::SubmarineSwap => swap::sign(ctx),
    }
}

fn check_outpoint(ctx: &InputContext<'_>) -> Result<(), SchemeError> {
    let prev = ctx.input.outpoint();
    let descriptor = OutPoint {
        txid: prev.txid(),
        vout: prev.index(),
    };
    let input = ctx.txin()?.previous_output;
    if descriptor != input {
        return Err(SchemeError::OutpointMismatch { descriptor, input });
    }
    Ok(())
}

fn warn_on_address_mismatch(version: AddressVersion, ctx: &InputContext<'_>) {
    let declared = ctx.input.address().address();
    if declared.is_empty() {
        return;
    }
    let expected = match output_script(version, &ctx.keys(), ctx.input.submarine_swap()) {
        Ok(script) => script,
        Err(_) => return,
    };
    let matches = declared
        .parse::<Address<NetworkUnchecked>>()
        .map(|address| address.assume_checked().script_pubkey() == expected)
        .unwrap_or(false);
    if !matches {
        log::warn!(
            "input {}: declared address {} does not match the version {} script for {}",
            ctx.index,
            declared,
            version,
            ctx.input.address().derivation_path()
        );
    }
}
