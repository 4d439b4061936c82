//! Lobby membership roster (§4.10): each member's public signing key,
//! display name, and join time, keyed by the signing key itself.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Member {
    pub pub_sig: crypto_sig::VerificationKey,
    pub display_name: String,
    pub join_time_millis: u64,
}

/// Keyed by the raw compressed-point bytes of `pub_sig` rather than the
/// `VerificationKey` itself, which carries no `Hash` impl.
#[derive(Default)]
pub struct Roster {
    members: HashMap<[u8; crypto_sig::VERIFICATION_KEY_SIZE], Member>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, member: Member) {
        self.members.insert(*member.pub_sig.as_bytes(), member);
    }

    pub fn remove(&mut self, pub_sig: &crypto_sig::VerificationKey) -> Option<Member> {
        self.members.remove(pub_sig.as_bytes())
    }

    #[must_use]
    pub fn contains(&self, pub_sig: &crypto_sig::VerificationKey) -> bool {
        self.members.contains_key(pub_sig.as_bytes())
    }

    #[must_use]
    pub fn get(&self, pub_sig: &crypto_sig::VerificationKey) -> Option<&Member> {
        self.members.get(pub_sig.as_bytes())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(seed: u8, name: &str) -> Member {
        let (_, pub_sig) = crypto_sig::generate_key_pair([seed; 32]).unwrap();
        Member {
            pub_sig,
            display_name: name.into(),
            join_time_millis: 0,
        }
    }

    #[test]
    fn test_add_and_remove() {
        let mut roster = Roster::new();
        let m = member(1, "alice");
        let pub_sig = m.pub_sig.clone();
        roster.add(m);
        assert!(roster.contains(&pub_sig));
        assert_eq!(roster.len(), 1);
        assert!(roster.remove(&pub_sig).is_some());
        assert!(!roster.contains(&pub_sig));
    }

    #[test]
    fn test_get_returns_display_name() {
        let mut roster = Roster::new();
        let m = member(2, "bob");
        let pub_sig = m.pub_sig.clone();
        roster.add(m);
        assert_eq!(roster.get(&pub_sig).unwrap().display_name, "bob");
    }
}
