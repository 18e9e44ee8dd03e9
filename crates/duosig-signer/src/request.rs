//! JSON signing requests and responses.

use anyhow::{Context, Result};
use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, Network};
use duosig_keys::MasterKey;
use duosig_sign::{AddressVersion, InputInfo, PartiallySignedTransaction, SignOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An extended key and the absolute path it sits at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySpec {
    /// Base58 `xprv`/`tprv`, or `xpub`/`tpub` for a signer without that key.
    pub key: String,
    pub path: String,
}

impl KeySpec {
    pub fn master(&self) -> Result<MasterKey> {
        MasterKey::from_base58(&self.key, &self.path)
            .with_context(|| format!("Invalid extended key at {}", self.path))
    }
}

/// Everything needed to sign one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignRequest {
    /// Hex encoded unsigned transaction
    pub transaction: String,
    pub user_key: KeySpec,
    pub service_key: KeySpec,
    /// One descriptor per transaction input, in input order
    pub inputs: Vec<InputInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    pub txid: String,
    pub hex: String,
}

impl SignRequest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| "Failed to parse JSON request")
    }

    /// Decode the transaction and attach the input descriptors.
    pub fn prepare(&self, network: Network) -> Result<PartiallySignedTransaction> {
        let mut pst = PartiallySignedTransaction::new(&self.transaction)
            .context("Failed to decode request transaction")?;

        for (index, input) in self.inputs.iter().enumerate() {
            check_input(index, input, network);
            pst.add_input(input.clone());
        }
        Ok(pst)
    }

    pub fn sign(&self, network: Network, options: &SignOptions) -> Result<SignResponse> {
        let user = self.user_key.master().context("Bad user key")?;
        let service = self.service_key.master().context("Bad service key")?;
        if !service.is_private() {
            log::debug!("Service key is public only, relying on pre-supplied signatures");
        }

        let mut pst = self.prepare(network)?;
        let signed = pst
            .sign_with(&user, &service, options)
            .context("Signing failed")?;

        Ok(SignResponse {
            txid: signed.hash(),
            hex: signed.to_hex(),
        })
    }
}

/// Surface descriptor oddities early. Nothing here is fatal; the signer
/// decides what can and cannot be signed.
fn check_input(index: usize, input: &InputInfo, network: Network) {
    if AddressVersion::try_from(input.address.version).is_err() {
        log::warn!(
            "Input {} declares unknown address version {}",
            index,
            input.address.version
        );
    }
    if input.address.address.is_empty() {
        return;
    }
    match input.address.address.parse::<Address<NetworkUnchecked>>() {
        Ok(address) if !address.is_valid_for_network(network) => log::warn!(
            "Input {} address {} is not a {} address",
            index,
            input.address.address,
            network
        ),
        Ok(_) => {}
        Err(e) => log::warn!(
            "Input {} address {} does not parse: {}",
            index,
            input.address.address,
            e
        ),
    }
}
