//! Shared fixtures for the signing integration tests.

#![allow(dead_code)]

use bitcoin::bip32::Xpriv;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::{
    absolute, transaction, Amount, Network, OutPoint, PublicKey, ScriptBuf, Sequence,
    Transaction, TxIn, TxOut, Txid, Witness,
};
use duosig_keys::{parse_derivation_path, MasterKey};
use duosig_sign::{
    output_script, AddressInfo, AddressKeys, AddressVersion, InputInfo, OutpointInfo,
    SubmarineSwapRefund, SwapRefundInfo,
};

pub const BASE_PATH: &str = "m/schema:1'/recovery:1'";
pub const SWAP_LOCK_TIME: u32 = 800_000;

pub fn address_path(index: u32) -> String {
    format!("{}/external:1/{}", BASE_PATH, index)
}

pub fn master_at_base(secp: &Secp256k1<All>, seed_byte: u8) -> MasterKey {
    let root = Xpriv::new_master(Network::Testnet, &[seed_byte; 64]).unwrap();
    let base = root
        .derive_priv(secp, &parse_derivation_path(BASE_PATH).unwrap())
        .unwrap();
    MasterKey::from_xpriv(base, BASE_PATH).unwrap()
}

pub fn test_swap() -> SwapRefundInfo {
    let secp = Secp256k1::new();
    let server = bitcoin::secp256k1::SecretKey::from_slice(&[0x33; 32]).unwrap();
    SwapRefundInfo {
        refund_address: String::new(),
        payment_hash: [0x42; 32],
        server_public_key: PublicKey::new(server.public_key(&secp)),
        lock_time: SWAP_LOCK_TIME,
    }
}

/// A wallet with private user and service masters.
pub struct Wallet {
    pub secp: Secp256k1<All>,
    pub user: MasterKey,
    pub service: MasterKey,
}

impl Wallet {
    pub fn new() -> Self {
        let secp = Secp256k1::new();
        let user = master_at_base(&secp, 0x01);
        let service = master_at_base(&secp, 0x02);
        Self {
            secp,
            user,
            service,
        }
    }

    pub fn public_service(&self) -> MasterKey {
        self.service.to_public(&self.secp)
    }

    pub fn keys(&self, path: &str) -> AddressKeys {
        AddressKeys {
            user: self.user.derive_to(&self.secp, path).unwrap().public_key(),
            service: self.service.derive_to(&self.secp, path).unwrap().public_key(),
        }
    }

    /// Fund an address of `version` at index `n` of the external chain.
    pub fn fund(&self, version: AddressVersion, n: u32, amount: Amount) -> Funded {
        let path = address_path(n);
        let swap = (version == AddressVersion::SubmarineSwap).then(test_swap);
        let script_pubkey = output_script(
            version,
            &self.keys(&path),
            swap.as_ref().map(|s| s as &dyn SubmarineSwapRefund),
        )
        .unwrap();

        let mut input = InputInfo::new(
            OutpointInfo {
                txid: Txid::from_byte_array([0xA0 + n as u8; 32]),
                index: n,
                amount,
            },
            AddressInfo {
                version: version.as_u32(),
                derivation_path: path,
                address: String::new(),
            },
        );
        input.submarine_swap = swap;

        Funded {
            input,
            txout: TxOut {
                value: amount,
                script_pubkey,
            },
        }
    }
}

/// A funded output and the descriptor spending it.
#[derive(Clone)]
pub struct Funded {
    pub input: InputInfo,
    pub txout: TxOut,
}

/// Unsigned transaction spending every `funded` output to a single output.
pub fn spend_all(funded: &[Funded], lock_time: u32, sequence: Sequence) -> Transaction {
    let total: Amount = funded.iter().map(|f| f.txout.value).sum();
    Transaction {
        version: transaction::Version::TWO,
        lock_time: absolute::LockTime::from_consensus(lock_time),
        input: funded
            .iter()
            .map(|f| TxIn {
                previous_output: OutPoint {
                    txid: f.input.outpoint.txid,
                    vout: f.input.outpoint.index,
                },
                script_sig: ScriptBuf::new(),
                sequence,
                witness: Witness::new(),
            })
            .collect(),
        output: vec![TxOut {
            value: total - Amount::from_sat(1_000),
            script_pubkey: ScriptBuf::new_p2pkh(&test_swap().server_public_key.pubkey_hash()),
        }],
    }
}

/// Consensus-verify a transaction against its inputs using libbitcoinconsensus.
pub fn consensus_verify(tx_bytes: &[u8], spent_outputs: &[TxOut], input_index: usize) {
    let txout = &spent_outputs[input_index];

    let all_utxos: Vec<bitcoinconsensus::Utxo> = spent_outputs
        .iter()
        .map(|o| {
            let sb = o.script_pubkey.as_bytes();
            bitcoinconsensus::Utxo {
                script_pubkey: sb.as_ptr(),
                script_pubkey_len: sb.len() as u32,
                value: o.value.to_sat() as i64,
            }
        })
        .collect();

    let result = bitcoinconsensus::verify(
        txout.script_pubkey.as_bytes(),
        txout.value.to_sat(),
        tx_bytes,
        Some(&all_utxos),
        input_index,
    );

    assert!(
        result.is_ok(),
        "consensus verification failed for input {}: {:?}",
        input_index,
        result.err()
    );
}

pub fn consensus_verify_all(tx_bytes: &[u8], funded: &[Funded]) {
    let spent: Vec<TxOut> = funded.iter().map(|f| f.txout.clone()).collect();
    for index in 0..spent.len() {
        consensus_verify(tx_bytes, &spent, index);
    }
}
