//! # crypto-sig
//!
//! secp256k1 ECDSA signing and verification, the fixed signature primitive
//! KKTP anchors are bound with (discovery/response signatures, session-end
//! authorization).
//!
//! Keys and signatures are fixed-size byte wrappers so the rest of the
//! workspace never has to reach into `k256` directly: a 33-byte compressed
//! public key, a 32-byte scalar secret key, and a 64-byte compact (`r || s`)
//! signature.
//!
//! ## Usage
//!
//! ```rust
//! use crypto_sig::{generate_key_pair, sign, verify};
//!
//! let randomness = [7u8; 32];
//! let (signing_key, verification_key) = generate_key_pair(randomness).unwrap();
//! let sig = sign(&signing_key, b"canonical pre-image bytes");
//! assert!(verify(&verification_key, b"canonical pre-image bytes", &sig));
//! assert!(!verify(&verification_key, b"tampered", &sig));
//! ```

use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature as K256Signature, SigningKey as K256SigningKey, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a secp256k1 scalar secret key, in bytes.
pub const SIGNING_KEY_SIZE: usize = 32;
/// Size of a compressed secp256k1 public key, in bytes.
pub const VERIFICATION_KEY_SIZE: usize = 33;
/// Size of a compact (`r || s`) ECDSA signature, in bytes.
pub const SIGNATURE_SIZE: usize = 64;
/// Size of the randomness consumed by [`generate_key_pair`].
pub const KEY_GENERATION_RANDOMNESS_SIZE: usize = 32;

/// Errors produced while constructing keys or signatures from raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigError {
    /// The byte string does not encode a valid secp256k1 scalar or point.
    InvalidKeyMaterial,
    /// The byte string does not encode a valid signature.
    InvalidSignature,
}

impl std::fmt::Display for SigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKeyMaterial => write!(f, "invalid secp256k1 key material"),
            Self::InvalidSignature => write!(f, "invalid secp256k1 signature encoding"),
        }
    }
}

impl std::error::Error for SigError {}

/// A secp256k1 ECDSA signing (secret) key.
///
/// Holds the raw 32-byte scalar and zeroizes it on drop; the underlying
/// `k256` key is reconstructed on demand inside [`sign`] rather than stored,
/// so there is exactly one place this crate's secret material lives.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey([u8; SIGNING_KEY_SIZE]);

impl SigningKey {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SIGNING_KEY_SIZE] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; SIGNING_KEY_SIZE]) -> Result<Self, SigError> {
        K256SigningKey::from_bytes((&bytes).into()).map_err(|_| SigError::InvalidKeyMaterial)?;
        Ok(Self(bytes))
    }

    fn to_k256(&self) -> K256SigningKey {
        K256SigningKey::from_bytes((&self.0).into())
            .expect("constructor already validated this scalar")
    }
}

impl Serialize for SigningKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SigningKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = <[u8; SIGNING_KEY_SIZE]>::deserialize(deserializer)?;
        Self::from_bytes(bytes).map_err(serde::de::Error::custom)
    }
}

/// A secp256k1 compressed public (verification) key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey([u8; VERIFICATION_KEY_SIZE]);

impl VerificationKey {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; VERIFICATION_KEY_SIZE] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; VERIFICATION_KEY_SIZE]) -> Result<Self, SigError> {
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| SigError::InvalidKeyMaterial)?;
        Ok(Self(bytes))
    }

    fn to_k256(&self) -> VerifyingKey {
        VerifyingKey::from_sec1_bytes(&self.0).expect("constructor already validated this point")
    }
}

/// A compact (`r || s`) secp256k1 ECDSA signature.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Result<Self, SigError> {
        K256Signature::from_slice(&bytes).map_err(|_| SigError::InvalidSignature)?;
        Ok(Self(bytes))
    }
}

/// Derives a signing/verification keypair from 32 bytes of key-generation
/// randomness, normally the output of a KDF over a wallet root secret.
///
/// Returns `Err` only if the randomness happens to encode the zero scalar or
/// a value at or above the curve order, which a KDF output will do with
/// negligible probability.
pub fn generate_key_pair(
    randomness: [u8; KEY_GENERATION_RANDOMNESS_SIZE],
) -> Result<(SigningKey, VerificationKey), SigError> {
    let k256_signing = K256SigningKey::from_bytes((&randomness).into())
        .map_err(|_| SigError::InvalidKeyMaterial)?;
    let verifying = VerifyingKey::from(&k256_signing);
    let mut pub_bytes = [0u8; VERIFICATION_KEY_SIZE];
    pub_bytes.copy_from_slice(verifying.to_encoded_point(true).as_bytes());
    Ok((SigningKey(randomness), VerificationKey(pub_bytes)))
}

/// Signs `message` with deterministic (RFC 6979) ECDSA nonce generation.
#[must_use]
pub fn sign(key: &SigningKey, message: &[u8]) -> Signature {
    let k256_key = key.to_k256();
    let sig: K256Signature = k256_key.sign(message);
    let mut out = [0u8; SIGNATURE_SIZE];
    out.copy_from_slice(&sig.to_bytes());
    Signature(out)
}

/// Verifies `signature` over `message` under `key`.
#[must_use]
pub fn verify(key: &VerificationKey, message: &[u8], signature: &Signature) -> bool {
    let Ok(sig) = K256Signature::from_slice(&signature.0) else {
        return false;
    };
    key.to_k256().verify(message, &sig).is_ok()
}
