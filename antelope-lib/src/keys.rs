use k256::ecdsa::{
    signature::hazmat::RandomizedPrehashSigner, RecoveryId, Signature, SigningKey,
};
use ripemd::Ripemd160;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};
use thiserror::Error;

const WIF_VERSION: u8 = 0x80;
const K1_PRIVATE_PREFIX: &str = "PVT_K1_";
const K1_SIGNATURE_PREFIX: &str = "SIG_K1_";
const LEGACY_PUBLIC_PREFIX: &str = "EOS";

// Each attempt draws a fresh nonce; a canonical signature shows up within a
// handful of tries.
const MAX_SIGNING_ATTEMPTS: usize = 1024;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid base58 encoding")]
    Base58(#[from] bs58::decode::Error),
    #[error("invalid key length {0}")]
    Length(usize),
    #[error("invalid key version byte {0:#x}")]
    Version(u8),
    #[error("key checksum mismatch")]
    Checksum,
    #[error("invalid secp256k1 scalar")]
    Scalar,
    #[error("signing failed")]
    Signing(#[from] k256::ecdsa::Error),
    #[error("no canonical signature found after {0} attempts")]
    NonCanonical(usize),
}

/// Produces a signature over a transaction signing digest.
///
/// Implementations must not perform any chain I/O.
pub trait Signer {
    fn sign(&self, digest: &[u8; 32]) -> Result<K1Signature, KeyError>;
}

fn ripemd160_checksum(data: &[u8], suffix: &[u8]) -> [u8; 4] {
    let hash = Ripemd160::new().chain_update(data).chain_update(suffix).finalize();
    [hash[0], hash[1], hash[2], hash[3]]
}

fn double_sha256_checksum(data: &[u8]) -> [u8; 4] {
    let hash = Sha256::digest(Sha256::digest(data));
    [hash[0], hash[1], hash[2], hash[3]]
}

pub struct PrivateKey(SigningKey);

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| KeyError::Scalar)
    }

    /// Legacy `EOS...` public key string, handy for logging which key signs.
    pub fn public_key(&self) -> String {
        let point = self.0.verifying_key().to_encoded_point(true);
        let compressed = point.as_bytes();
        let mut data = compressed.to_vec();
        data.extend_from_slice(&ripemd160_checksum(compressed, b""));
        format!("{}{}", LEGACY_PUBLIC_PREFIX, bs58::encode(data).into_string())
    }

    fn from_legacy_wif(s: &str) -> Result<Self, KeyError> {
        let raw = bs58::decode(s).into_vec()?;
        if raw.len() != 37 {
            return Err(KeyError::Length(raw.len()));
        }
        if raw[0] != WIF_VERSION {
            return Err(KeyError::Version(raw[0]));
        }
        if double_sha256_checksum(&raw[..33]) != raw[33..] {
            return Err(KeyError::Checksum);
        }
        Self::from_bytes(&raw[1..33])
    }

    fn from_k1(s: &str) -> Result<Self, KeyError> {
        let raw = bs58::decode(s).into_vec()?;
        if raw.len() != 36 {
            return Err(KeyError::Length(raw.len()));
        }
        if ripemd160_checksum(&raw[..32], b"K1") != raw[32..] {
            return Err(KeyError::Checksum);
        }
        Self::from_bytes(&raw[..32])
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix(K1_PRIVATE_PREFIX) {
            Some(rest) => Self::from_k1(rest),
            None => Self::from_legacy_wif(s),
        }
    }
}

// never print key material
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKey").field(&self.public_key()).finish()
    }
}

fn is_canonical(sig: &[u8; 65]) -> bool {
    sig[1] & 0x80 == 0
        && !(sig[1] == 0 && sig[2] & 0x80 == 0)
        && sig[33] & 0x80 == 0
        && !(sig[33] == 0 && sig[34] & 0x80 == 0)
}

impl Signer for PrivateKey {
    fn sign(&self, digest: &[u8; 32]) -> Result<K1Signature, KeyError> {
        let mut rng = rand::thread_rng();
        for _ in 0..MAX_SIGNING_ATTEMPTS {
            let signature: Signature = self.0.sign_prehash_with_rng(&mut rng, digest)?;
            let signature = signature.normalize_s().unwrap_or(signature);
            let recovery_id =
                RecoveryId::trial_recovery_from_prehash(self.0.verifying_key(), digest, &signature)?;

            let mut data = [0u8; 65];
            data[0] = recovery_id.to_byte() + 27 + 4;
            data[1..].copy_from_slice(&signature.to_bytes());
            if is_canonical(&data) {
                return Ok(K1Signature(data));
            }
        }
        Err(KeyError::NonCanonical(MAX_SIGNING_ATTEMPTS))
    }
}

/// Compact recoverable signature: header byte, then `r` and `s`.
#[derive(Clone, PartialEq, Eq)]
pub struct K1Signature([u8; 65]);

impl K1Signature {
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }
}

impl fmt::Display for K1Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = self.0.to_vec();
        data.extend_from_slice(&ripemd160_checksum(&self.0, b"K1"));
        write!(f, "{}{}", K1_SIGNATURE_PREFIX, bs58::encode(data).into_string())
    }
}

impl fmt::Debug for K1Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for K1Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
