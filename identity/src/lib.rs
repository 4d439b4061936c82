//! # identity
//!
//! Long-term keypair bundles and deterministic derivation for KKTP
//! endpoints, grounded in the same hierarchical-derivation shape as the
//! codebase this workspace grew out of: a single root secret, obtained from
//! a passphrase via [`crypto_password_kdf`], deterministically fans out into
//! as many `(branch, index)`-addressed keypairs as the embedding wallet
//! needs.
//!
//! Each identity carries exactly the two secp256k1 keypairs KKTP anchors
//! reference: a signing keypair (`pub_sig`/signing key) and a DH keypair
//! (`pub_dh`/DH secret). The VRF binding in [`crypto_vrf`] reuses the
//! signing keypair rather than adding a third, since no anchor field names a
//! separate VRF public key.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the static root secret in bytes.
pub const ROOT_SECRET_SIZE: usize = 32;

/// A root secret from which every identity keypair is derived.
///
/// Zeroized on drop; callers should retain it only for as long as they need
/// to derive further keys, deferring to the wallet for long-term storage per
/// this protocol's non-goals around key storage at rest.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RootSecret([u8; ROOT_SECRET_SIZE]);

impl RootSecret {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ROOT_SECRET_SIZE] {
        &self.0
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; ROOT_SECRET_SIZE]) -> Self {
        Self(bytes)
    }

    /// Derives a root secret from a user passphrase via Argon2id.
    #[must_use]
    pub fn from_passphrase(passphrase: &[u8]) -> Self {
        let mut out = [0u8; ROOT_SECRET_SIZE];
        crypto_password_kdf::derive(passphrase, b"identity.root.kdf.salt---------", &mut out);
        Self(out)
    }
}

/// The public half of an identity: the two compressed secp256k1 points a
/// peer needs to verify signatures from, and to establish a shared secret
/// with, this endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityPublicKeys {
    pub pub_sig: crypto_sig::VerificationKey,
    pub pub_dh: crypto_dh::DhPublicKey,
}

/// The secret half of an identity.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct IdentitySecretKeys {
    pub sig_signing_key: crypto_sig::SigningKey,
    pub dh_secret_key: crypto_dh::DhSecretKey,
}

/// Derives one `(branch, index)`-addressed identity keypair bundle from a
/// root secret.
///
/// `branch` namespaces unrelated uses of the same root secret (e.g. one
/// branch per application built on the wallet); `index` lets a single
/// branch mint an unbounded sequence of fresh identities, recorded as a
/// session's `key_index` so the wallet can re-derive the same keys on
/// resume without having stored them itself.
#[must_use]
pub fn derive_identity_at(
    root: &RootSecret,
    branch: u32,
    index: u64,
) -> (IdentityPublicKeys, IdentitySecretKeys) {
    let prk = crypto_kdf::ExtractBuilder::new()
        .input_item(root.as_bytes())
        .input_item(&branch.to_be_bytes())
        .input_item(&index.to_be_bytes())
        .finalize(b"identity.derive.kdf.salt-------");

    let mut sig_randomness = [0u8; crypto_sig::KEY_GENERATION_RANDOMNESS_SIZE];
    prk.expand(b"identity.derive.sig", &mut sig_randomness)
        .expect("32 bytes is within the HKDF-Expand limit");

    let mut dh_randomness = [0u8; crypto_dh::KEY_GENERATION_RANDOMNESS_SIZE];
    prk.expand(b"identity.derive.dh", &mut dh_randomness)
        .expect("32 bytes is within the HKDF-Expand limit");

    let (sig_signing_key, pub_sig) =
        crypto_sig::generate_key_pair(sig_randomness).expect("HKDF output is a valid scalar");
    let (dh_secret_key, pub_dh) =
        crypto_dh::generate_key_pair(dh_randomness).expect("HKDF output is a valid scalar");

    (
        IdentityPublicKeys { pub_sig, pub_dh },
        IdentitySecretKeys {
            sig_signing_key,
            dh_secret_key,
        },
    )
}
