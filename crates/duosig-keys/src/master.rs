//! Master keys and per-address derived key pairs.

use std::fmt;
use std::str::FromStr;

use bitcoin::bip32::{ChainCode, DerivationPath, Xpriv, Xpub};
use bitcoin::secp256k1::{All, Secp256k1, SecretKey};
use bitcoin::PublicKey;
use zeroize::Zeroize;

use crate::path::parse_derivation_path;
use crate::KeyError;

/// Derives the key pair protecting an address from that address's path.
///
/// Implemented by [`MasterKey`]; tests may supply their own.
pub trait KeyDeriver: Sync {
    fn derive(&self, secp: &Secp256k1<All>, path: &str) -> Result<DerivedKey, KeyError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ExtendedKey {
    Private(Xpriv),
    Public(Xpub),
}

/// An extended key together with the absolute path it was derived at.
///
/// Address paths handed to [`MasterKey::derive_to`] are absolute as well, so
/// only the part below this key's own path is derived.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKey {
    key: ExtendedKey,
    path: DerivationPath,
}

impl MasterKey {
    /// Wrap a private extended key living at `path`.
    pub fn from_xpriv(xpriv: Xpriv, path: &str) -> Result<Self, KeyError> {
        let path = parse_derivation_path(path)?;
        check_depth(xpriv.depth, &path);
        Ok(Self {
            key: ExtendedKey::Private(xpriv),
            path,
        })
    }

    /// Wrap a public-only extended key living at `path`.
    pub fn from_xpub(xpub: Xpub, path: &str) -> Result<Self, KeyError> {
        let path = parse_derivation_path(path)?;
        check_depth(xpub.depth, &path);
        Ok(Self {
            key: ExtendedKey::Public(xpub),
            path,
        })
    }

    /// Parse a base58 `xprv`/`tprv` or `xpub`/`tpub` string.
    pub fn from_base58(encoded: &str, path: &str) -> Result<Self, KeyError> {
        let encoded = encoded.trim();
        if let Ok(xpriv) = Xpriv::from_str(encoded) {
            return Self::from_xpriv(xpriv, path);
        }
        match Xpub::from_str(encoded) {
            Ok(xpub) => Self::from_xpub(xpub, path),
            Err(e) => Err(KeyError::InvalidKey(e.to_string())),
        }
    }

    /// The absolute path of this key.
    pub fn path(&self) -> &DerivationPath {
        &self.path
    }

    /// Whether this key can produce signatures.
    pub fn is_private(&self) -> bool {
        matches!(self.key, ExtendedKey::Private(_))
    }

    /// Drop the private half, keeping the same path.
    pub fn to_public(&self, secp: &Secp256k1<All>) -> MasterKey {
        let xpub = match &self.key {
            ExtendedKey::Private(xpriv) => Xpub::from_priv(secp, xpriv),
            ExtendedKey::Public(xpub) => *xpub,
        };
        MasterKey {
            key: ExtendedKey::Public(xpub),
            path: self.path.clone(),
        }
    }

    /// Derive the key pair at the absolute `path`.
    pub fn derive_to(&self, secp: &Secp256k1<All>, path: &str) -> Result<DerivedKey, KeyError> {
        let target = parse_derivation_path(path)?;

        let suffix = target
            .as_ref()
            .strip_prefix(self.path.as_ref())
            .ok_or_else(|| KeyError::NotADescendant {
                path: path.to_string(),
                base: self.path.to_string(),
            })?
            .to_vec();

        match &self.key {
            ExtendedKey::Private(xpriv) => {
                let mut child = xpriv
                    .derive_priv(secp, &suffix)
                    .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;
                let secret_key = child.private_key;
                wipe_secret(&mut child.private_key);
                wipe_chain_code(&mut child.chain_code);
                Ok(DerivedKey {
                    public_key: PublicKey::new(secret_key.public_key(secp)),
                    secret_key: Some(secret_key),
                    path: target,
                })
            }
            ExtendedKey::Public(xpub) => {
                if let Some(hardened) = suffix.iter().find(|c| c.is_hardened()) {
                    return Err(KeyError::HardenedFromPublic(hardened.to_string()));
                }
                let child = xpub
                    .derive_pub(secp, &suffix)
                    .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;
                Ok(DerivedKey {
                    public_key: PublicKey::new(child.public_key),
                    secret_key: None,
                    path: target,
                })
            }
        }
    }
}

impl KeyDeriver for MasterKey {
    fn derive(&self, secp: &Secp256k1<All>, path: &str) -> Result<DerivedKey, KeyError> {
        self.derive_to(secp, path)
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_private() { "private" } else { "public" };
        f.debug_struct("MasterKey")
            .field("kind", &kind)
            .field("path", &self.path.to_string())
            .finish()
    }
}

fn check_depth(depth: u8, path: &DerivationPath) {
    if depth as usize != path.as_ref().len() {
        log::warn!(
            "extended key depth {} does not match its declared path {}",
            depth,
            path
        );
    }
}

/// A key pair derived for one address.
///
/// Lives only for the signing of a single input. The secret half is zeroized
/// when dropped, as are the private key and chain code of the intermediate
/// extended key it was derived through.
pub struct DerivedKey {
    public_key: PublicKey,
    secret_key: Option<SecretKey>,
    path: DerivationPath,
}

impl DerivedKey {
    /// Compressed public key.
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Secret key, if the master was private.
    pub fn secret_key(&self) -> Option<&SecretKey> {
        self.secret_key.as_ref()
    }

    pub fn path(&self) -> &DerivationPath {
        &self.path
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("public_key", &self.public_key)
            .field("has_secret", &self.secret_key.is_some())
            .field("path", &self.path.to_string())
            .finish()
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        if let Some(sk) = self.secret_key.as_mut() {
            wipe_secret(sk);
        }
    }
}

fn wipe_secret(sk: &mut SecretKey) {
    // SAFETY: SecretKey is a plain 32-byte array without drop glue, and the
    // zeroed value is never used as a key again.
    unsafe { zeroize::zeroize_flat_type(sk as *mut SecretKey) }
}

fn wipe_chain_code(chain_code: &mut ChainCode) {
    let bytes: &mut [u8; 32] = chain_code.as_mut();
    bytes.zeroize();
}
