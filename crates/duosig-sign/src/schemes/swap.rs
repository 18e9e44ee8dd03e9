//! Submarine swap refund, P2WSH.
//!
//! The swap server claims the output with the payment preimage; that path is
//! never signed here. The user refunds either together with the service or,
//! once the refund lock time has passed, alone:
//!
//! Cooperative refund: `<user_sig> <service_sig> 1 <> <witness_script>`
//! Unilateral refund:  `<user_sig> <> <> <witness_script>`
//!
//! The trailing empty element fails the preimage size check and is dropped by
//! the script.

use bitcoin::{absolute, ScriptBuf, Witness};

use super::{InputContext, InputUnlock, FALSE, TRUE};
use crate::descriptor::SubmarineSwapRefund;
use crate::error::{Party, SchemeError};
use crate::script::swap_witness_script;
use crate::version::AddressVersion;

pub(super) fn sign(ctx: &InputContext<'_>) -> Result<InputUnlock, SchemeError> {
    let swap = ctx
        .input
        .submarine_swap()
        .ok_or(SchemeError::MissingSwapDetails)?;
    let witness_script = swap_witness_script(&ctx.keys(), swap);

    let digest = ctx.digest(AddressVersion::SubmarineSwap, &witness_script)?;
    let user_sig = ctx.required_signature(Party::User, digest)?;

    let mut witness = Witness::new();
    witness.push_ecdsa_signature(&user_sig);

    match ctx.signature(Party::Service, digest)? {
        Some(service_sig) => {
            witness.push_ecdsa_signature(&service_sig);
            witness.push(TRUE);
        }
        None => {
            check_refund_lock(ctx, swap)?;
            log::debug!(
                "input {}: unilateral refund to {} after lock time {}",
                ctx.index,
                swap.refund_address(),
                swap.lock_time()
            );
            witness.push(FALSE);
        }
    }
    witness.push(FALSE);
    witness.push(witness_script.as_bytes());

    Ok(InputUnlock {
        script_sig: ScriptBuf::new(),
        witness,
    })
}

/// The transaction itself must not be valid before the refund lock time.
fn check_refund_lock(
    ctx: &InputContext<'_>,
    swap: &dyn SubmarineSwapRefund,
) -> Result<(), SchemeError> {
    let refund_lock = absolute::LockTime::from_consensus(swap.lock_time());
    let txin = ctx.txin()?;

    if !txin.sequence.enables_absolute_lock_time() || !refund_lock.is_implied_by(ctx.tx.lock_time) {
        return Err(SchemeError::RefundNotYetSpendable {
            lock_time: swap.lock_time(),
            tx_lock_time: ctx.tx.lock_time.to_consensus_u32(),
        });
    }
    Ok(())
}
