//! Input descriptors.
//!
//! The signer only reads the small set of facts it needs about each input.
//! They are expressed as traits so callers can hand over their own wallet
//! types; the `*Info` structs are plain serde-friendly implementations.

use bitcoin::{Amount, PublicKey, Txid};
use serde::{Deserialize, Serialize};

/// Where an address's keys live and which scheme protects it.
pub trait AddressDescriptor: Send + Sync {
    /// Raw scheme version, see [`crate::AddressVersion`].
    fn version(&self) -> u32;
    /// Path both the user and service keys are derived to.
    fn derivation_path(&self) -> &str;
    /// Encoded address. Informational only.
    fn address(&self) -> &str;
}

/// The output being spent.
pub trait PreviousOutput: Send + Sync {
    fn txid(&self) -> Txid;
    fn index(&self) -> u32;
    /// Amount locked at the output. Signed over by segwit schemes.
    fn amount(&self) -> Amount;
}

/// Refund terms of a submarine swap funding output.
pub trait SubmarineSwapRefund: Send + Sync {
    fn refund_address(&self) -> &str;
    /// SHA-256 of the payment preimage.
    fn payment_hash(&self) -> [u8; 32];
    /// Key of the swap server, able to claim with the preimage.
    fn server_public_key(&self) -> PublicKey;
    /// Absolute lock time (height or timestamp) after which the user may refund alone.
    fn lock_time(&self) -> u32;
}

/// Everything needed to authorize one transaction input.
pub trait InputDescriptor: Send + Sync {
    fn outpoint(&self) -> &dyn PreviousOutput;
    fn address(&self) -> &dyn AddressDescriptor;
    /// DER signature with sighash byte, if the user already signed.
    fn user_signature(&self) -> Option<&[u8]>;
    /// DER signature with sighash byte, if the service already signed.
    fn service_signature(&self) -> Option<&[u8]>;
    /// Present iff the address is a submarine swap.
    fn submarine_swap(&self) -> Option<&dyn SubmarineSwapRefund>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub version: u32,
    pub derivation_path: String,
    #[serde(default)]
    pub address: String,
}

impl AddressDescriptor for AddressInfo {
    fn version(&self) -> u32 {
        self.version
    }

    fn derivation_path(&self) -> &str {
        &self.derivation_path
    }

    fn address(&self) -> &str {
        &self.address
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutpointInfo {
    pub txid: Txid,
    pub index: u32,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub amount: Amount,
}

impl PreviousOutput for OutpointInfo {
    fn txid(&self) -> Txid {
        self.txid
    }

    fn index(&self) -> u32 {
        self.index
    }

    fn amount(&self) -> Amount {
        self.amount
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRefundInfo {
    #[serde(default)]
    pub refund_address: String,
    #[serde(with = "hex::serde")]
    pub payment_hash: [u8; 32],
    pub server_public_key: PublicKey,
    pub lock_time: u32,
}

impl SubmarineSwapRefund for SwapRefundInfo {
    fn refund_address(&self) -> &str {
        &self.refund_address
    }

    fn payment_hash(&self) -> [u8; 32] {
        self.payment_hash
    }

    fn server_public_key(&self) -> PublicKey {
        self.server_public_key
    }

    fn lock_time(&self) -> u32 {
        self.lock_time
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputInfo {
    pub outpoint: OutpointInfo,
    pub address: AddressInfo,
    #[serde(default, with = "opt_hex", skip_serializing_if = "Option::is_none")]
    pub user_signature: Option<Vec<u8>>,
    #[serde(default, with = "opt_hex", skip_serializing_if = "Option::is_none")]
    pub service_signature: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submarine_swap: Option<SwapRefundInfo>,
}

impl InputInfo {
    pub fn new(outpoint: OutpointInfo, address: AddressInfo) -> Self {
        Self {
            outpoint,
            address,
            user_signature: None,
            service_signature: None,
            submarine_swap: None,
        }
    }

    pub fn with_user_signature(mut self, signature: Vec<u8>) -> Self {
        self.user_signature = Some(signature);
        self
    }

    pub fn with_service_signature(mut self, signature: Vec<u8>) -> Self {
        self.service_signature = Some(signature);
        self
    }

    pub fn with_submarine_swap(mut self, swap: SwapRefundInfo) -> Self {
        self.submarine_swap = Some(swap);
        self
    }
}

impl InputDescriptor for InputInfo {
    fn outpoint(&self) -> &dyn PreviousOutput {
        &self.outpoint
    }

    fn address(&self) -> &dyn AddressDescriptor {
        &self.address
    }

    fn user_signature(&self) -> Option<&[u8]> {
        self.user_signature.as_deref()
    }

    fn service_signature(&self) -> Option<&[u8]> {
        self.service_signature.as_deref()
    }

    fn submarine_swap(&self) -> Option<&dyn SubmarineSwapRefund> {
        self.submarine_swap
            .as_ref()
            .map(|swap| swap as &dyn SubmarineSwapRefund)
    }
}

mod opt_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let value: Option<String> = Option::deserialize(d)?;
        value
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
