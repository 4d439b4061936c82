//! Member-side group key vault (§4.10): retains old key versions so
//! messages still in flight under a recently rotated-out version keep
//! decrypting, until that version is explicitly retired.

use std::collections::BTreeMap;
use zeroize::Zeroize;

#[derive(Clone, Zeroize)]
pub struct GroupKey(pub [u8; crypto_aead::KEY_SIZE]);

impl GroupKey {
    #[must_use]
    pub fn aead_key(&self) -> crypto_aead::Key {
        crypto_aead::Key::from(self.0)
    }
}

#[derive(Default)]
pub struct KeyVault {
    versions: BTreeMap<u32, GroupKey>,
}

impl KeyVault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, version: u32, key: GroupKey) {
        self.versions.insert(version, key);
    }

    #[must_use]
    pub fn get(&self, version: u32) -> Option<&GroupKey> {
        self.versions.get(&version)
    }

    #[must_use]
    pub fn highest_known_version(&self) -> u32 {
        self.versions.keys().next_back().copied().unwrap_or(0)
    }

    /// Drops every version at or below `version`. A member calls this once
    /// it is confident no peer still has messages in flight under an old
    /// version, e.g. after observing traffic at `version + 1`.
    pub fn retire_up_to(&mut self, version: u32) {
        self.versions.retain(|v, _| *v > version);
    }

    #[must_use]
    pub fn known_versions(&self) -> Vec<u32> {
        self.versions.keys().copied().collect()
    }
}
