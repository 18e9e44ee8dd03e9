//! V2: user and service 2-of-2 multisig, P2SH.
//!
//! scriptSig: `OP_0 <sig_lo> <sig_hi> <redeem_script>`, signatures in the
//! order of their keys in the redeem script.

use bitcoin::opcodes::OP_0;
use bitcoin::script::Builder;
use bitcoin::Witness;

use super::{InputContext, InputUnlock};
use crate::error::{Party, SchemeError};
use crate::script::{multisig_redeem_script, push_data, sorted_keys};
use crate::version::AddressVersion;

pub(super) fn sign(ctx: &InputContext<'_>) -> Result<InputUnlock, SchemeError> {
    let keys = ctx.keys();
    let redeem_script = multisig_redeem_script(&keys);

    let digest = ctx.digest(AddressVersion::V2, &redeem_script)?;
    let user_sig = ctx.required_signature(Party::User, digest)?;
    let service_sig = ctx.required_signature(Party::Service, digest)?;

    let [first, _] = sorted_keys(keys.user, keys.service);
    let (sig_lo, sig_hi) = if first == keys.user {
        (user_sig, service_sig)
    } else {
        (service_sig, user_sig)
    };

    // OP_0 is consumed by CHECKMULTISIG's off-by-one pop
    let builder = Builder::new().push_opcode(OP_0);
    let builder = push_data(builder, &sig_lo.to_vec())?;
    let builder = push_data(builder, &sig_hi.to_vec())?;
    let script_sig = push_data(builder, redeem_script.as_bytes())?.into_script();

    Ok(InputUnlock {
        script_sig,
        witness: Witness::new(),
    })
}
