//! Collaborator contracts (§6): the traits the core is driven through
//! rather than depending on directly, so a real carrier-DAG client and
//! wallet can sit on one side and an in-memory fake can sit on the other
//! in tests.
//!
//! `crypto-sig`, `crypto-dh`, `crypto-rng`, and `identity` each already
//! provide the concrete operations these traits describe; the default
//! implementations here just adapt those free functions to trait objects
//! so the session engine can be written against the trait instead of the
//! concrete crate.

use crate::error::KktpError;

/// Publishes payloads to, and scans payloads from, the carrier DAG.
/// `scan` walks payloads starting from `start_hash` (`None` for the
/// earliest available), calling `on_match` synchronously for each one;
/// it stops early if `on_match` returns `true`, or once `max_seconds` of
/// wall-clock budget is exhausted.
pub trait NetworkAdapter {
    fn publish(&mut self, payload: &[u8]) -> Result<(), KktpError>;

    fn scan(
        &self,
        start_hash: Option<&[u8]>,
        max_seconds: u64,
        prefixes: &[&str],
        on_match: &mut dyn FnMut(&[u8]) -> bool,
    ) -> Result<(), KktpError>;
}

/// Signing and verification, reused by both the handshake engine and the
/// anchor factory.
pub trait SignaturePrimitives {
    fn sign(&self, key: &crypto_sig::SigningKey, message: &[u8]) -> crypto_sig::Signature;
    fn verify(
        &self,
        key: &crypto_sig::VerificationKey,
        message: &[u8],
        signature: &crypto_sig::Signature,
    ) -> bool;
}

/// VRF proving and verification.
pub trait VrfPrimitives {
    fn prove(&self, key: &crypto_sig::SigningKey, input: &[u8]) -> crypto_vrf::VrfOutput;
    fn verify(
        &self,
        key: &crypto_sig::VerificationKey,
        value: &[u8; crypto_vrf::VALUE_SIZE],
        proof: &[u8; crypto_vrf::PROOF_SIZE],
        input: &[u8],
    ) -> bool;
}

/// A source of cryptographically secure random bytes.
pub trait RandomBytes {
    fn fill(&self, buffer: &mut [u8]);
}

/// Derives an identity's keypair bundle from the wallet's root secret by
/// `(branch, index)`, mirroring [`identity::derive_identity_at`].
pub trait IdentityDerivation {
    fn derive(
        &self,
        branch: u32,
        index: u64,
    ) -> (identity::IdentityPublicKeys, identity::IdentitySecretKeys);
}

/// Opaque encrypted-record storage for resume blobs, keyed by string.
pub trait Persistence {
    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), KktpError>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KktpError>;
    fn delete(&mut self, key: &str) -> Result<(), KktpError>;

    /// Finds the most recent record whose key starts with `prefix`, if
    /// any, returning its key and contents. Used by the handover engine
    /// to locate the latest resume record for a SID prefix without the
    /// core needing to know how the store orders or indexes keys.
    fn find_latest_resume_record(&self, prefix: &str) -> Result<Option<(String, Vec<u8>)>, KktpError>;
}

/// Default [`SignaturePrimitives`] backed directly by `crypto_sig`.
pub struct DefaultSignaturePrimitives;

impl SignaturePrimitives for DefaultSignaturePrimitives {
    fn sign(&self, key: &crypto_sig::SigningKey, message: &[u8]) -> crypto_sig::Signature {
        crypto_sig::sign(key, message)
    }

    fn verify(
        &self,
        key: &crypto_sig::VerificationKey,
        message: &[u8],
        signature: &crypto_sig::Signature,
    ) -> bool {
        crypto_sig::verify(key, message, signature)
    }
}

/// Default [`VrfPrimitives`] backed directly by `crypto_vrf`.
pub struct DefaultVrfPrimitives;

impl VrfPrimitives for DefaultVrfPrimitives {
    fn prove(&self, key: &crypto_sig::SigningKey, input: &[u8]) -> crypto_vrf::VrfOutput {
        crypto_vrf::prove(key, input)
    }

    fn verify(
        &self,
        key: &crypto_sig::VerificationKey,
        value: &[u8; crypto_vrf::VALUE_SIZE],
        proof: &[u8; crypto_vrf::PROOF_SIZE],
        input: &[u8],
    ) -> bool {
        crypto_vrf::verify(key, value, proof, input)
    }
}

/// Default [`RandomBytes`] backed directly by `crypto_rng`.
pub struct DefaultRandomBytes;

impl RandomBytes for DefaultRandomBytes {
    fn fill(&self, buffer: &mut [u8]) {
        crypto_rng::fill_buffer(buffer);
    }
}

/// Default [`IdentityDerivation`] wrapping a wallet root secret.
pub struct DefaultIdentityDerivation {
    root: identity::RootSecret,
}

impl DefaultIdentityDerivation {
    #[must_use]
    pub const fn new(root: identity::RootSecret) -> Self {
        Self { root }
    }
}

impl IdentityDerivation for DefaultIdentityDerivation {
    fn derive(
        &self,
        branch: u32,
        index: u64,
    ) -> (identity::IdentityPublicKeys, identity::IdentitySecretKeys) {
        identity::derive_identity_at(&self.root, branch, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Minimal in-memory fake satisfying [`Persistence`], used across this
    /// workspace's tests instead of a mocking framework.
    #[derive(Default)]
    pub struct InMemoryPersistence {
        records: HashMap<String, Vec<u8>>,
    }

    impl Persistence for InMemoryPersistence {
        fn put(&mut self, key: &str, value: &[u8]) -> Result<(), KktpError> {
            self.records.insert(key.to_string(), value.to_vec());
            Ok(())
        }

        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KktpError> {
            Ok(self.records.get(key).cloned())
        }

        fn delete(&mut self, key: &str) -> Result<(), KktpError> {
            self.records.remove(key);
            Ok(())
        }

        fn find_latest_resume_record(
            &self,
            prefix: &str,
        ) -> Result<Option<(String, Vec<u8>)>, KktpError> {
            Ok(self
                .records
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .max_by_key(|(k, _)| k.clone())
                .map(|(k, v)| (k.clone(), v.clone())))
        }
    }

    #[test]
    fn test_in_memory_persistence_put_get_delete() {
        let mut store = InMemoryPersistence::default();
        store.put("a", b"1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
        store.delete("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_find_latest_resume_record_by_prefix() {
        let mut store = InMemoryPersistence::default();
        store.put("kktp_resume_aa", b"old").unwrap();
        store.put("kktp_resume_bb", b"new").unwrap();
        store.put("other_key", b"unrelated").unwrap();
        let (key, value) = store
            .find_latest_resume_record("kktp_resume_")
            .unwrap()
            .unwrap();
        assert!(key.starts_with("kktp_resume_"));
        assert_eq!(value, b"new");
    }

    #[test]
    fn test_default_signature_primitives_roundtrip() {
        let prims = DefaultSignaturePrimitives;
        let (sk, pk) = crypto_sig::generate_key_pair([1u8; 32]).unwrap();
        let sig = prims.sign(&sk, b"hello");
        assert!(prims.verify(&pk, b"hello", &sig));
    }

    #[test]
    fn test_default_vrf_primitives_roundtrip() {
        let prims = DefaultVrfPrimitives;
        let (sk, pk) = crypto_sig::generate_key_pair([2u8; 32]).unwrap();
        let out = prims.prove(&sk, b"input");
        assert!(prims.verify(&pk, &out.value, &out.proof, b"input"));
    }

    #[test]
    fn test_default_identity_derivation_deterministic() {
        let root = identity::RootSecret::from_passphrase(b"test");
        let derivation = DefaultIdentityDerivation::new(root);
        let (pk1, _) = derivation.derive(0, 0);
        let (pk2, _) = derivation.derive(0, 0);
        assert_eq!(pk1.pub_sig.as_bytes(), pk2.pub_sig.as_bytes());
    }
}
