//! Locking script construction.
//!
//! Each scheme's script is rebuilt from the derived keys at signing time, so
//! every builder here must be deterministic: same keys in, same bytes out.
//!
//! ```text
//! V1    P2PKH(user)
//! V2    P2SH(2 <k_lo> <k_hi> 2 CHECKMULTISIG)            keys sorted by bytes
//! V3    P2WSH(IF <service> CHECKSIGVERIFY
//!             ELSE <delay> CSV DROP
//!             ENDIF <user> CHECKSIG)
//! Swap  P2WSH(SIZE 32 EQUAL
//!             IF SHA256 <payment_hash> EQUALVERIFY <server>
//!             ELSE DROP
//!                  IF <service> CHECKSIGVERIFY
//!                  ELSE <lock_time> CLTV DROP
//!                  ENDIF <user>
//!             ENDIF CHECKSIG)
//! ```

use bitcoin::opcodes::all::{
    OP_CHECKMULTISIG, OP_CHECKSIG, OP_CHECKSIGVERIFY, OP_CLTV, OP_CSV, OP_DROP, OP_ELSE,
    OP_ENDIF, OP_EQUAL, OP_EQUALVERIFY, OP_IF, OP_PUSHNUM_2, OP_SHA256, OP_SIZE,
};
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::{Address, Network, PublicKey, ScriptBuf};

use crate::descriptor::SubmarineSwapRefund;
use crate::error::SchemeError;
use crate::timelock::Timelock;
use crate::version::AddressVersion;

/// Keys an address is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressKeys {
    pub user: PublicKey,
    pub service: PublicKey,
}

/// Order two keys by their serialized bytes.
pub fn sorted_keys(a: PublicKey, b: PublicKey) -> [PublicKey; 2] {
    if a.to_bytes() <= b.to_bytes() {
        [a, b]
    } else {
        [b, a]
    }
}

/// `2 <k_lo> <k_hi> 2 CHECKMULTISIG`
pub fn multisig_redeem_script(keys: &AddressKeys) -> ScriptBuf {
    let [first, second] = sorted_keys(keys.user, keys.service);
    Builder::new()
        .push_opcode(OP_PUSHNUM_2)
        .push_key(&first)
        .push_key(&second)
        .push_opcode(OP_PUSHNUM_2)
        .push_opcode(OP_CHECKMULTISIG)
        .into_script()
}

/// Cooperative 2-of-2 with a user-only branch after `delay`.
pub fn recovery_witness_script(keys: &AddressKeys, delay: Timelock) -> ScriptBuf {
    Builder::new()
        .push_opcode(OP_IF)
        .push_key(&keys.service)
        .push_opcode(OP_CHECKSIGVERIFY)
        .push_opcode(OP_ELSE)
        .push_int(delay.blocks() as i64)
        .push_opcode(OP_CSV)
        .push_opcode(OP_DROP)
        .push_opcode(OP_ENDIF)
        .push_key(&keys.user)
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

/// Swap funding script: server claims with the preimage, the user refunds
/// with the service or alone after the lock time.
pub fn swap_witness_script(keys: &AddressKeys, swap: &dyn SubmarineSwapRefund) -> ScriptBuf {
    Builder::new()
        .push_opcode(OP_SIZE)
        .push_int(32)
        .push_opcode(OP_EQUAL)
        .push_opcode(OP_IF)
        .push_opcode(OP_SHA256)
        .push_slice(swap.payment_hash())
        .push_opcode(OP_EQUALVERIFY)
        .push_key(&swap.server_public_key())
        .push_opcode(OP_ELSE)
        .push_opcode(OP_DROP)
        .push_opcode(OP_IF)
        .push_key(&keys.service)
        .push_opcode(OP_CHECKSIGVERIFY)
        .push_opcode(OP_ELSE)
        .push_int(swap.lock_time() as i64)
        .push_opcode(OP_CLTV)
        .push_opcode(OP_DROP)
        .push_opcode(OP_ENDIF)
        .push_key(&keys.user)
        .push_opcode(OP_ENDIF)
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

/// The script_pubkey of an address of `version` built from `keys`.
pub fn output_script(
    version: AddressVersion,
    keys: &AddressKeys,
    swap: Option<&dyn SubmarineSwapRefund>,
) -> Result<ScriptBuf, SchemeError> {
    let script = match version {
        AddressVersion::V1 => ScriptBuf::new_p2pkh(&keys.user.pubkey_hash()),
        AddressVersion::V2 => ScriptBuf::new_p2sh(&multisig_redeem_script(keys).script_hash()),
        AddressVersion::V3 => {
            ScriptBuf::new_p2wsh(&recovery_witness_script(keys, Timelock::RECOVERY).wscript_hash())
        }
        AddressVersion::SubmarineSwap => {
            let swap = swap.ok_or(SchemeError::MissingSwapDetails)?;
            ScriptBuf::new_p2wsh(&swap_witness_script(keys, swap).wscript_hash())
        }
    };
    Ok(script)
}

/// Encode the address of `version` built from `keys`.
pub fn create_address(
    version: AddressVersion,
    keys: &AddressKeys,
    swap: Option<&dyn SubmarineSwapRefund>,
    network: Network,
) -> Result<Address, SchemeError> {
    let script = output_script(version, keys, swap)?;
    Address::from_script(&script, network).map_err(|e| SchemeError::Script(e.to_string()))
}

/// Push arbitrary data, e.g. a signature or a serialized script.
pub(crate) fn push_data(builder: Builder, data: &[u8]) -> Result<Builder, SchemeError> {
    let bytes =
        PushBytesBuf::try_from(data.to_vec()).map_err(|e| SchemeError::Script(e.to_string()))?;
    Ok(builder.push_slice(bytes))
}
