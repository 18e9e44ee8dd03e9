//! Shared test utilities for duosig-sign unit tests.
//!
//! Provides deterministic keys and a single-input signing fixture for every
//! address version.

use bitcoin::bip32::Xpriv;
use bitcoin::hashes::Hash;
use bitcoin::script::Instruction;
use bitcoin::secp256k1::{All, Secp256k1, SecretKey};
use bitcoin::{
    absolute, transaction, Amount, Network, OutPoint, PublicKey, ScriptBuf, Sequence,
    Transaction, TxIn, TxOut, Txid, Witness,
};
use duosig_keys::{parse_derivation_path, MasterKey};

use crate::descriptor::{AddressInfo, InputInfo, OutpointInfo, SubmarineSwapRefund, SwapRefundInfo};
use crate::error::{Party, SchemeError};
use crate::schemes::{sign_input, InputContext, InputUnlock};
use crate::script::{create_address, sorted_keys, AddressKeys};
use crate::version::AddressVersion;

pub const BASE_PATH: &str = "m/schema:1'/recovery:1'";
pub const ADDRESS_PATH: &str = "m/schema:1'/recovery:1'/external:1/0";
/// Block height after which the fixture's swap can be refunded alone.
pub const SWAP_LOCK_TIME: u32 = 800_000;

/// Generate a deterministic keypair from a seed byte.
///
/// The secret key is `[0x01, 0x00, ..., 0x00, seed]` (32 bytes).
pub fn test_keypair(seed_byte: u8) -> (SecretKey, PublicKey) {
    let secp = Secp256k1::new();
    let mut secret_bytes = [0u8; 32];
    secret_bytes[31] = seed_byte;
    secret_bytes[0] = 0x01;
    let sk = SecretKey::from_slice(&secret_bytes).unwrap();
    let pk = PublicKey::new(sk.public_key(&secp));
    (sk, pk)
}

pub fn test_pubkey(seed_byte: u8) -> PublicKey {
    test_keypair(seed_byte).1
}

fn master_at_base(secp: &Secp256k1<All>, seed_byte: u8) -> MasterKey {
    let root = Xpriv::new_master(Network::Testnet, &[seed_byte; 64]).unwrap();
    let base = root
        .derive_priv(secp, &parse_derivation_path(BASE_PATH).unwrap())
        .unwrap();
    MasterKey::from_xpriv(base, BASE_PATH).unwrap()
}

/// One input of `version` spent by a one-output transaction.
pub struct Fixture {
    pub version: AddressVersion,
    pub secp: Secp256k1<All>,
    pub user: MasterKey,
    pub service: MasterKey,
    pub outpoint: OutpointInfo,
    pub swap: Option<SwapRefundInfo>,
    pub tx: Transaction,
}

impl Fixture {
    pub fn new(version: AddressVersion) -> Self {
        let secp = Secp256k1::new();
        let user = master_at_base(&secp, 0x01);
        let service = master_at_base(&secp, 0x02);

        let outpoint = OutpointInfo {
            txid: Txid::from_byte_array([0x11; 32]),
            index: 1,
            amount: Amount::from_sat(50_000),
        };

        let swap = (version == AddressVersion::SubmarineSwap).then(|| SwapRefundInfo {
            refund_address: String::new(),
            payment_hash: [0x42; 32],
            server_public_key: test_pubkey(3),
            lock_time: SWAP_LOCK_TIME,
        });

        let tx = Transaction {
            version: transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint {
                    txid: outpoint.txid,
                    vout: outpoint.index,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(49_000),
                script_pubkey: ScriptBuf::new_p2pkh(&test_pubkey(9).pubkey_hash()),
            }],
        };

        Self {
            version,
            secp,
            user,
            service,
            outpoint,
            swap,
            tx,
        }
    }

    pub fn with_public_user(mut self) -> Self {
        self.user = self.user.to_public(&self.secp);
        self
    }

    pub fn with_public_service(mut self) -> Self {
        self.service = self.service.to_public(&self.secp);
        self
    }

    pub fn with_lock_time(mut self, height: u32) -> Self {
        self.tx.lock_time = absolute::LockTime::from_consensus(height);
        self
    }

    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.tx.input[0].sequence = sequence;
        self
    }

    pub fn keys(&self) -> AddressKeys {
        AddressKeys {
            user: self.user.derive_to(&self.secp, ADDRESS_PATH).unwrap().public_key(),
            service: self
                .service
                .derive_to(&self.secp, ADDRESS_PATH)
                .unwrap()
                .public_key(),
        }
    }

    pub fn user_key(&self) -> PublicKey {
        self.keys().user
    }

    /// Descriptor for the fixture's input, with its real address filled in.
    pub fn input(&self) -> InputInfo {
        let swap = self.swap.as_ref().map(|s| s as &dyn SubmarineSwapRefund);
        let address = create_address(self.version, &self.keys(), swap, Network::Testnet)
            .unwrap()
            .to_string();
        let mut input = InputInfo::new(
            self.outpoint.clone(),
            AddressInfo {
                version: self.version.as_u32(),
                derivation_path: ADDRESS_PATH.to_string(),
                address,
            },
        );
        input.submarine_swap = self.swap.clone();
        input
    }

    /// Data pushes of a script sig. `OP_0` shows up as an empty push.
    pub fn pushes(&self, script: &ScriptBuf) -> Vec<Vec<u8>> {
        script
            .instructions()
            .map(|instruction| match instruction.unwrap() {
                Instruction::PushBytes(bytes) => bytes.as_bytes().to_vec(),
                Instruction::Op(op) => panic!("unexpected opcode {} in script sig", op),
            })
            .collect()
    }

    /// Pull `party`'s signature out of a V2 script sig.
    pub fn signature_of(&self, script_sig: &ScriptBuf, party: Party) -> Vec<u8> {
        let keys = self.keys();
        let [first, _] = sorted_keys(keys.user, keys.service);
        let key = match party {
            Party::User => keys.user,
            Party::Service => keys.service,
        };
        let position = if key == first { 1 } else { 2 };
        self.pushes(script_sig).swap_remove(position)
    }
}

/// Sign the fixture's only input against `input`.
pub fn sign_single(fixture: &Fixture, input: &InputInfo) -> Result<InputUnlock, SchemeError> {
    let path = &input.address.derivation_path;
    let user = fixture.user.derive_to(&fixture.secp, path).unwrap();
    let service = fixture.service.derive_to(&fixture.secp, path).unwrap();
    let ctx = InputContext {
        index: 0,
        tx: &fixture.tx,
        input,
        user: &user,
        service: &service,
        secp: &fixture.secp,
    };
    sign_input(fixture.version, &ctx)
}
