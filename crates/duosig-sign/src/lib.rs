//! duosig-sign: signing orchestration for two-party cooperative addresses.
//!
//! Every output the wallet can spend is locked by one of a closed set of
//! script schemes shared between a user key and a service key:
//!
//! - **V1**: single user key, P2PKH
//! - **V2**: user and service 2-of-2, P2SH
//! - **V3**: user and service 2-of-2 with a user-only recovery path after
//!   ~1 year, P2WSH
//! - **Submarine swap**: refundable swap funding output, P2WSH
//!
//! [`PartiallySignedTransaction`] takes an unsigned transaction plus one
//! [`InputDescriptor`] per input, derives both keys for each input, signs
//! each input with the scheme its address version names, and returns the
//! finalized bytes and txid.
//!
//! ```no_run
//! use duosig_keys::MasterKey;
//! use duosig_sign::{InputInfo, PartiallySignedTransaction};
//!
//! # fn example(raw_hex: &str, inputs: Vec<InputInfo>, user: MasterKey, service: MasterKey)
//! #     -> Result<(), duosig_sign::SignError> {
//! let mut pst = PartiallySignedTransaction::new(raw_hex)?;
//! for input in inputs {
//!     pst.add_input(input);
//! }
//! let signed = pst.sign(&user, &service)?;
//! println!("{} {}", signed.hash(), signed.to_hex());
//! # Ok(())
//! # }
//! ```

pub mod descriptor;
pub mod error;
mod schemes;
pub mod script;
pub mod timelock;
pub mod transaction;
pub mod version;

#[cfg(test)]
mod test_utils;

pub use descriptor::{
    AddressDescriptor, AddressInfo, InputDescriptor, InputInfo, OutpointInfo, PreviousOutput,
    SubmarineSwapRefund, SwapRefundInfo,
};
pub use error::{Party, SchemeError, SignError};
pub use script::{create_address, output_script, AddressKeys};
pub use timelock::Timelock;
pub use transaction::{FinalizedTransaction, PartiallySignedTransaction, SignOptions};
pub use version::AddressVersion;
