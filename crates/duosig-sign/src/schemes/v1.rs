//! V1: single user key, P2PKH.
//!
//! scriptSig: `<user_sig> <user_pubkey>`

use bitcoin::script::Builder;
use bitcoin::{ScriptBuf, Witness};

use super::{InputContext, InputUnlock};
use crate::error::{Party, SchemeError};
use crate::script::push_data;
use crate::version::AddressVersion;

pub(super) fn sign(ctx: &InputContext<'_>) -> Result<InputUnlock, SchemeError> {
    let user = ctx.user.public_key();
    let script_pubkey = ScriptBuf::new_p2pkh(&user.pubkey_hash());

    let digest = ctx.digest(AddressVersion::V1, &script_pubkey)?;
    let user_sig = ctx.required_signature(Party::User, digest)?;

    let script_sig = push_data(Builder::new(), &user_sig.to_vec())?
        .push_key(&user)
        .into_script();

    Ok(InputUnlock {
        script_sig,
        witness: Witness::new(),
    })
}
