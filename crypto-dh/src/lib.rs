//! # crypto-dh
//!
//! secp256k1 Diffie-Hellman, used by the handshake engine to derive the raw
//! shared secret `Z` that is then fed through [`crypto_kdf`] to produce the
//! session key.
//!
//! Keys use the same compressed-point and raw-scalar encodings as
//! [`crypto_sig`], but the two crates are kept separate: DH and signing keys
//! must never be confused, and the protocol deliberately uses a distinct
//! keypair for each (`pub_dh` vs `pub_sig`).
//!
//! ## Usage
//!
//! ```rust
//! use crypto_dh::{generate_key_pair, diffie_hellman};
//!
//! let (alice_sk, alice_pk) = generate_key_pair([1u8; 32]).unwrap();
//! let (bob_sk, bob_pk) = generate_key_pair([2u8; 32]).unwrap();
//!
//! let z_alice = diffie_hellman(&alice_sk, &bob_pk);
//! let z_bob = diffie_hellman(&bob_sk, &alice_pk);
//! assert_eq!(z_alice, z_bob);
//! ```

use k256::ecdh::diffie_hellman as k256_diffie_hellman;
use k256::{PublicKey as K256PublicKey, SecretKey as K256SecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size of a secp256k1 DH secret scalar, in bytes.
pub const SECRET_KEY_SIZE: usize = 32;
/// Size of a compressed secp256k1 DH public point, in bytes.
pub const PUBLIC_KEY_SIZE: usize = 33;
/// Size of the raw ECDH shared secret (`Z`, the shared point's x-coordinate).
pub const SHARED_SECRET_SIZE: usize = 32;
/// Size of the randomness consumed by [`generate_key_pair`].
pub const KEY_GENERATION_RANDOMNESS_SIZE: usize = 32;

/// Errors produced while constructing DH key material from raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhError {
    /// The byte string does not encode a valid secp256k1 scalar or point.
    InvalidKeyMaterial,
}

impl std::fmt::Display for DhError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid secp256k1 DH key material")
    }
}

impl std::error::Error for DhError {}

/// A secp256k1 Diffie-Hellman secret key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DhSecretKey([u8; SECRET_KEY_SIZE]);

impl DhSecretKey {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SECRET_KEY_SIZE] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; SECRET_KEY_SIZE]) -> Result<Self, DhError> {
        K256SecretKey::from_bytes((&bytes).into()).map_err(|_| DhError::InvalidKeyMaterial)?;
        Ok(Self(bytes))
    }

    fn to_k256(&self) -> K256SecretKey {
        K256SecretKey::from_bytes((&self.0).into())
            .expect("constructor already validated this scalar")
    }
}

impl Serialize for DhSecretKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DhSecretKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = <[u8; SECRET_KEY_SIZE]>::deserialize(deserializer)?;
        Self::from_bytes(bytes).map_err(serde::de::Error::custom)
    }
}

/// A secp256k1 compressed Diffie-Hellman public key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhPublicKey([u8; PUBLIC_KEY_SIZE]);

impl DhPublicKey {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Result<Self, DhError> {
        K256PublicKey::from_sec1_bytes(&bytes).map_err(|_| DhError::InvalidKeyMaterial)?;
        Ok(Self(bytes))
    }

    fn to_k256(&self) -> K256PublicKey {
        K256PublicKey::from_sec1_bytes(&self.0).expect("constructor already validated this point")
    }
}

/// Derives a DH keypair from 32 bytes of key-generation randomness.
pub fn generate_key_pair(
    randomness: [u8; KEY_GENERATION_RANDOMNESS_SIZE],
) -> Result<(DhSecretKey, DhPublicKey), DhError> {
    let secret =
        K256SecretKey::from_bytes((&randomness).into()).map_err(|_| DhError::InvalidKeyMaterial)?;
    let public = secret.public_key();
    let mut pub_bytes = [0u8; PUBLIC_KEY_SIZE];
    pub_bytes.copy_from_slice(public.to_encoded_point(true).as_bytes());
    Ok((DhSecretKey(randomness), DhPublicKey(pub_bytes)))
}

/// Computes the raw ECDH shared secret `Z = my_secret * peer_public`.
///
/// Returns the shared point's x-coordinate directly, with no additional
/// hashing: the handshake engine's own HKDF step is what turns this into a
/// session key, so hashing here would just add an unspecified extra layer.
#[must_use]
pub fn diffie_hellman(my_secret: &DhSecretKey, peer_public: &DhPublicKey) -> [u8; SHARED_SECRET_SIZE] {
    let secret = my_secret.to_k256();
    let public = peer_public.to_k256();
    let shared = k256_diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    let raw = Zeroizing::new(*shared.raw_secret_bytes());
    let mut out = [0u8; SHARED_SECRET_SIZE];
    out.copy_from_slice(raw.as_slice());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecdh_agreement() {
        let (alice_sk, alice_pk) = generate_key_pair([11u8; 32]).unwrap();
        let (bob_sk, bob_pk) = generate_key_pair([22u8; 32]).unwrap();

        let z_alice = diffie_hellman(&alice_sk, &bob_pk);
        let z_bob = diffie_hellman(&bob_sk, &alice_pk);
        assert_eq!(z_alice, z_bob);
    }

    #[test]
    fn test_different_peers_different_secrets() {
        let (alice_sk, _) = generate_key_pair([1u8; 32]).unwrap();
        let (_, bob_pk) = generate_key_pair([2u8; 32]).unwrap();
        let (_, carol_pk) = generate_key_pair([3u8; 32]).unwrap();

        assert_ne!(
            diffie_hellman(&alice_sk, &bob_pk),
            diffie_hellman(&alice_sk, &carol_pk)
        );
    }

    #[test]
    fn test_public_key_roundtrip() {
        let (_, pk) = generate_key_pair([5u8; 32]).unwrap();
        let bytes = *pk.as_bytes();
        let pk2 = DhPublicKey::from_bytes(bytes).unwrap();
        assert_eq!(pk.as_bytes(), pk2.as_bytes());
    }
}
