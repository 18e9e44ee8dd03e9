//! V3: user and service 2-of-2 with a user-only recovery branch, P2WSH.
//!
//! Cooperative witness: `<user_sig> <service_sig> 1 <witness_script>`
//! Recovery witness:    `<user_sig> <> <witness_script>`, only once the
//! input's relative lock covers [`Timelock::RECOVERY`].

use bitcoin::{ScriptBuf, Witness};

use super::{InputContext, InputUnlock, FALSE, TRUE};
use crate::error::{Party, SchemeError};
use crate::script::recovery_witness_script;
use crate::timelock::Timelock;
use crate::version::AddressVersion;

pub(super) fn sign(ctx: &InputContext<'_>) -> Result<InputUnlock, SchemeError> {
    let witness_script = recovery_witness_script(&ctx.keys(), Timelock::RECOVERY);

    let digest = ctx.digest(AddressVersion::V3, &witness_script)?;
    let user_sig = ctx.required_signature(Party::User, digest)?;

    let mut witness = Witness::new();
    witness.push_ecdsa_signature(&user_sig);

    match ctx.signature(Party::Service, digest)? {
        Some(service_sig) => {
            witness.push_ecdsa_signature(&service_sig);
            witness.push(TRUE);
        }
        None => {
            check_recovery_lock(ctx)?;
            log::debug!("input {}: spending through the recovery path", ctx.index);
            witness.push(FALSE);
        }
    }
    witness.push(witness_script.as_bytes());

    Ok(InputUnlock {
        script_sig: ScriptBuf::new(),
        witness,
    })
}

fn check_recovery_lock(ctx: &InputContext<'_>) -> Result<(), SchemeError> {
    let sequence = ctx.txin()?.sequence;

    // No relative lock at all: the caller meant a cooperative spend.
    if sequence.to_relative_lock_time().is_none() {
        return Err(SchemeError::MissingSignature(Party::Service));
    }

    // CSV is only enforced from transaction version 2
    if ctx.tx.version.0 < 2 || !Timelock::RECOVERY.is_satisfied_by(sequence) {
        return Err(SchemeError::RecoveryNotYetSpendable {
            blocks: Timelock::RECOVERY.blocks(),
        });
    }
    Ok(())
}
