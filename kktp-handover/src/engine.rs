//! Sovereign resume / handover engine (§4.9, REDESIGN FLAGS).
//!
//! Runs as a small state machine — `Loading`, `ScanPeer`, `ScanResponse`,
//! `ScanLock`, `Done` — driven entirely through the collaborator traits
//! already defined in `kktp_core::collaborators`, so the same engine runs
//! unmodified against a real carrier-DAG client or an in-memory fake.
//!
//! The procedure, each step gated by the overall `max_seconds` budget:
//! 1. Load the most recent persisted resume record and rehydrate the
//!    predecessor session from it.
//! 2. Scan the predecessor mailbox for a peer-initiated handover marker.
//!    If the peer got there first, pivot onto their successor anchor
//!    instead of publishing our own.
//! 3. Otherwise, publish a fresh discovery anchor of our own and scan for
//!    a matching response. If one arrives, derive the successor session.
//! 4. Scan for one confirmed inbound message on the successor mailbox to
//!    prove the peer has the same keys before retiring the predecessor.
//!    Without a response at all, publish a handover intent on the
//!    predecessor mailbox instead and let the peer find us next time.

use crate::clock::timestamp_millis;
use crate::error::HandoverError;
use crate::intent::HandoverIntent;
use kktp_core::anchors::{self, Discovery, PROTOCOL_VERSION, Response};
use kktp_core::codec::{self, DecodeResult};
use kktp_core::collaborators::{NetworkAdapter, Persistence, RandomBytes, SignaturePrimitives};
use kktp_core::handshake;
use kktp_core::persistence as vault_persistence;
use kktp_core::session::{Role, SessionContext, SessionKeyMaterial, SessionSnapshot};
use kktp_core::wire;
use std::time::Duration;
use web_time::Instant;
use zeroize::Zeroize;

/// Phase of the handover state machine, exposed mainly for logging and
/// tests; `run` drives every transition itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoverPhase {
    Loading,
    ScanPeer,
    ScanResponse,
    ScanLock,
    Done,
}

/// Result of a completed handover attempt.
pub enum HandoverOutcome {
    /// The peer had already initiated a handover; `intent` names the
    /// successor SID and anchor they are waiting on.
    Pivoted { intent: HandoverIntent },
    /// No response to our fresh discovery arrived within budget; an
    /// intent was published on the predecessor mailbox instead.
    HandoverPending,
    /// A successor session was established and a confirmed inbound
    /// message proved the peer shares its keys. The predecessor has been
    /// zeroized and its resume record deleted.
    HandoverComplete { context: SessionContext },
    /// A successor session was established but no confirming message
    /// arrived within budget. The successor is persisted and usable, but
    /// the predecessor has not been retired yet.
    HandoverNoLock { context: SessionContext },
}

fn remaining_secs(deadline: Instant) -> u64 {
    let now = Instant::now();
    if deadline <= now {
        0
    } else {
        deadline.duration_since(now).as_secs()
    }
}

/// Drives one handover attempt end to end. Borrowed collaborator
/// references live only for the duration of `run`.
pub struct HandoverEngine<'a> {
    network: &'a mut dyn NetworkAdapter,
    persistence: &'a mut dyn Persistence,
    sig: &'a dyn SignaturePrimitives,
    rng: &'a dyn RandomBytes,
    phase: HandoverPhase,
}

impl<'a> HandoverEngine<'a> {
    pub fn new(
        network: &'a mut dyn NetworkAdapter,
        persistence: &'a mut dyn Persistence,
        sig: &'a dyn SignaturePrimitives,
        rng: &'a dyn RandomBytes,
    ) -> Self {
        Self {
            network,
            persistence,
            sig,
            rng,
            phase: HandoverPhase::Loading,
        }
    }

    #[must_use]
    pub fn phase(&self) -> HandoverPhase {
        self.phase
    }

    /// Runs the handover procedure to completion or until `max_seconds`
    /// elapses. `cancel` is polled between phases for cooperative
    /// cancellation (e.g. the embedding application shutting down).
    pub fn run(
        &mut self,
        resume_key_prefix: &str,
        vault_key: &crypto_aead::Key,
        signing_key: &crypto_sig::SigningKey,
        pub_sig: &crypto_sig::VerificationKey,
        max_seconds: u64,
        cancel: &dyn Fn() -> bool,
    ) -> Result<HandoverOutcome, HandoverError> {
        let deadline = Instant::now() + Duration::from_secs(max_seconds);

        self.phase = HandoverPhase::Loading;
        let predecessor = self.load(resume_key_prefix, vault_key)?;
        tracing::info!(sid = %hexutil::encode(&predecessor.sid), "handover: loaded predecessor session");

        if cancel() {
            return Err(HandoverError::Cancelled);
        }

        self.phase = HandoverPhase::ScanPeer;
        if let Some(intent) = self.scan_peer(&predecessor, remaining_secs(deadline))? {
            tracing::info!(new_sid = %intent.new_sid, "handover: peer already initiated, pivoting");
            self.phase = HandoverPhase::Done;
            return Ok(HandoverOutcome::Pivoted { intent });
        }

        if cancel() {
            return Err(HandoverError::Cancelled);
        }

        self.phase = HandoverPhase::ScanResponse;
        let (discovery, dh_secret, sid) = self.construct_discovery(signing_key, pub_sig);
        let discovery_json = serde_json::to_string(&discovery)
            .map_err(|e| kktp_core::KktpError::SchemaInvalid(e.to_string()))?;
        self.network.publish(&wire::encode_anchor(&discovery_json))?;

        let response = self.scan_response(&discovery, remaining_secs(deadline))?;
        let Some(response) = response else {
            tracing::info!("handover: no response within budget, publishing intent on predecessor mailbox");
            self.publish_intent(&predecessor, &sid, &discovery)?;
            self.phase = HandoverPhase::Done;
            return Ok(HandoverOutcome::HandoverPending);
        };

        let peer_pub_sig = decode_pub_sig(&response.pub_sig_resp)?;
        let peer_pub_dh = decode_pub_dh(&response.pub_dh_resp)?;
        let keys = handshake::derive_session_keys(&dh_secret, &peer_pub_dh, &sid, pub_sig, &peer_pub_sig);

        let mut successor = SessionContext::new(
            sid,
            Role::Initiator,
            keys.mailbox_id,
            peer_pub_sig,
            peer_pub_dh,
            0,
            0,
            SessionKeyMaterial {
                session_key_bytes: *keys.session_key.as_bytes(),
            },
            timestamp_millis(),
        );
        successor.activate();

        if cancel() {
            return Err(HandoverError::Cancelled);
        }

        self.phase = HandoverPhase::ScanLock;
        let locked = self.scan_lock(&mut successor, remaining_secs(deadline))?;
        self.persist(resume_key_prefix, vault_key, &successor)?;

        self.phase = HandoverPhase::Done;
        if locked {
            tracing::info!(sid = %hexutil::encode(&successor.sid), "handover: lock confirmed, retiring predecessor");
            self.retire(resume_key_prefix, predecessor)?;
            Ok(HandoverOutcome::HandoverComplete { context: successor })
        } else {
            tracing::info!(sid = %hexutil::encode(&successor.sid), "handover: successor installed without lock confirmation");
            Ok(HandoverOutcome::HandoverNoLock { context: successor })
        }
    }

    fn load(
        &self,
        resume_key_prefix: &str,
        vault_key: &crypto_aead::Key,
    ) -> Result<SessionContext, HandoverError> {
        let (_, blob) = self
            .persistence
            .find_latest_resume_record(resume_key_prefix)?
            .ok_or(HandoverError::NoResumeRecord)?;
        let snapshot: SessionSnapshot = vault_persistence::from_encrypted_blob(&blob, vault_key)?;
        Ok(SessionContext::from_snapshot(snapshot))
    }

    fn scan_peer(
        &mut self,
        predecessor: &SessionContext,
        budget_secs: u64,
    ) -> Result<Option<HandoverIntent>, HandoverError> {
        let prefix = format!("KKTP:{}:", hexutil::encode(&predecessor.mailbox_id));
        let mut found: Option<HandoverIntent> = None;
        self.network
            .scan(None, budget_secs, &[&prefix], &mut |payload| {
                let Ok(wire::WirePayload::Message { json, .. }) = wire::decode(payload) else {
                    return false;
                };
                let Ok(msg) = serde_json::from_str::<anchors::Msg>(&json) else {
                    return false;
                };
                if msg.validate().is_err() || msg.sid != hexutil::encode(&predecessor.sid) {
                    return false;
                }
                let Ok(outcome) = codec::unpack(
                    &msg,
                    &predecessor.sid,
                    &predecessor.mailbox_id,
                    predecessor.recv_direction(),
                    &predecessor.recv_key(),
                ) else {
                    return false;
                };
                let DecodeResult::Plaintext(plaintext) = outcome else {
                    return false;
                };
                let Ok(value) = serde_json::from_slice::<serde_json::Value>(&plaintext) else {
                    return false;
                };
                if !HandoverIntent::is_handover(&value) {
                    return false;
                }
                found = HandoverIntent::parse(&value);
                found.is_some()
            })?;
        Ok(found)
    }

    fn construct_discovery(
        &self,
        signing_key: &crypto_sig::SigningKey,
        pub_sig: &crypto_sig::VerificationKey,
    ) -> (Discovery, crypto_dh::DhSecretKey, [u8; 32]) {
        let mut dh_randomness = [0u8; crypto_dh::KEY_GENERATION_RANDOMNESS_SIZE];
        self.rng.fill(&mut dh_randomness);
        let (dh_secret, dh_public) = crypto_dh::generate_key_pair(dh_randomness)
            .expect("rng output is not the zero scalar or curve order");
        let sid = anchors::generate_sid(None);

        let mut discovery = Discovery {
            kind: "discovery".into(),
            version: PROTOCOL_VERSION,
            sid: hexutil::encode(&sid),
            pub_sig: hexutil::encode(pub_sig.as_bytes()),
            pub_dh: hexutil::encode(dh_public.as_bytes()),
            vrf_value: None,
            vrf_proof: None,
            meta: None,
            sig: hexutil::encode(&[0u8; crypto_sig::SIGNATURE_SIZE]),
        };
        let preimage = discovery
            .signing_preimage()
            .expect("freshly constructed discovery always serializes");
        let sig = self.sig.sign(signing_key, &preimage);
        discovery.sig = hexutil::encode(sig.as_bytes());

        (discovery, dh_secret, sid)
    }

    fn scan_response(
        &mut self,
        discovery: &Discovery,
        budget_secs: u64,
    ) -> Result<Option<Response>, HandoverError> {
        let mut found: Option<Response> = None;
        self.network
            .scan(None, budget_secs, &["KKTP:ANCHOR:"], &mut |payload| {
                let Ok(wire::WirePayload::Anchor(json)) = wire::decode(payload) else {
                    return false;
                };
                let Ok(response) = serde_json::from_str::<Response>(&json) else {
                    return false;
                };
                if response.validate().is_err() || response.sid != discovery.sid {
                    return false;
                }
                if handshake::verify_response(&response, discovery).is_err() {
                    return false;
                }
                found = Some(response);
                true
            })?;
        Ok(found)
    }

    fn scan_lock(
        &mut self,
        successor: &mut SessionContext,
        budget_secs: u64,
    ) -> Result<bool, HandoverError> {
        let prefix = format!("KKTP:{}:", hexutil::encode(&successor.mailbox_id));
        let mut locked = false;
        let mut pending: Vec<(u64, Vec<u8>)> = Vec::new();
        self.network
            .scan(None, budget_secs, &[&prefix], &mut |payload| {
                let Ok(wire::WirePayload::Message { json, .. }) = wire::decode(payload) else {
                    return false;
                };
                let Ok(msg) = serde_json::from_str::<anchors::Msg>(&json) else {
                    return false;
                };
                if msg.validate().is_err() || msg.sid != hexutil::encode(&successor.sid) {
                    return false;
                }
                let Ok(DecodeResult::Plaintext(plaintext)) = codec::unpack(
                    &msg,
                    &successor.sid,
                    &successor.mailbox_id,
                    successor.recv_direction(),
                    &successor.recv_key(),
                ) else {
                    return false;
                };
                pending.push((msg.seq, plaintext));
                locked = true;
                true
            })?;
        for (seq, plaintext) in pending {
            let _ = successor.admit(seq, plaintext);
        }
        Ok(locked)
    }

    fn publish_intent(
        &mut self,
        predecessor: &SessionContext,
        new_sid: &[u8; 32],
        new_discovery: &Discovery,
    ) -> Result<(), HandoverError> {
        let intent = HandoverIntent::new(
            new_sid,
            serde_json::to_value(new_discovery)
                .map_err(|e| kktp_core::KktpError::SchemaInvalid(e.to_string()))?,
        );
        let payload = serde_json::to_vec(&intent)
            .map_err(|e| kktp_core::KktpError::SchemaInvalid(e.to_string()))?;

        let mut ctx = predecessor_copy_for_send(predecessor);
        let seq = ctx.next_outgoing_seq();
        let msg = codec::pack(
            &ctx.sid,
            &ctx.mailbox_id,
            &ctx.send_key(),
            ctx.send_direction(),
            seq,
            &payload,
        );
        let msg_json = serde_json::to_string(&msg)
            .map_err(|e| kktp_core::KktpError::SchemaInvalid(e.to_string()))?;
        self.network
            .publish(&wire::encode_message(&ctx.mailbox_id, &msg_json))?;
        Ok(())
    }

    fn persist(
        &mut self,
        resume_key_prefix: &str,
        vault_key: &crypto_aead::Key,
        ctx: &SessionContext,
    ) -> Result<(), HandoverError> {
        let blob = vault_persistence::to_encrypted_blob(&ctx.to_snapshot(), vault_key)?;
        let key = vault_persistence::resume_key(resume_key_prefix, &ctx.sid);
        self.persistence.put(&key, &blob)?;
        Ok(())
    }

    fn retire(
        &mut self,
        resume_key_prefix: &str,
        mut predecessor: SessionContext,
    ) -> Result<(), HandoverError> {
        let key = vault_persistence::resume_key(resume_key_prefix, &predecessor.sid);
        self.persistence.delete(&key)?;
        predecessor.keys.zeroize();
        Ok(())
    }
}

/// `next_outgoing_seq`/`send_key` need `&mut`/owned access; the predecessor
/// handed to `publish_intent` is only a borrow, so a cheap clone of the
/// fields needed to send one more message is made here rather than
/// threading a second mutable borrow through `run`.
fn predecessor_copy_for_send(ctx: &SessionContext) -> SessionContext {
    SessionContext::from_snapshot(ctx.to_snapshot())
}

fn decode_pub_sig(hex: &str) -> Result<crypto_sig::VerificationKey, kktp_core::KktpError> {
    let bytes: [u8; crypto_sig::VERIFICATION_KEY_SIZE] = hexutil::decode_array(hex)?;
    crypto_sig::VerificationKey::from_bytes(bytes)
        .map_err(|_| kktp_core::KktpError::SchemaInvalid("pub_sig is not a valid secp256k1 point".into()))
}

fn decode_pub_dh(hex: &str) -> Result<crypto_dh::DhPublicKey, kktp_core::KktpError> {
    let bytes: [u8; crypto_dh::PUBLIC_KEY_SIZE] = hexutil::decode_array(hex)?;
    crypto_dh::DhPublicKey::from_bytes(bytes)
        .map_err(|_| kktp_core::KktpError::SchemaInvalid("pub_dh is not a valid secp256k1 point".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kktp_core::collaborators::{DefaultRandomBytes, DefaultSignaturePrimitives};
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct InMemoryPersistence {
        records: HashMap<String, Vec<u8>>,
    }

    impl Persistence for InMemoryPersistence {
        fn put(&mut self, key: &str, value: &[u8]) -> Result<(), kktp_core::KktpError> {
            self.records.insert(key.to_string(), value.to_vec());
            Ok(())
        }
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, kktp_core::KktpError> {
            Ok(self.records.get(key).cloned())
        }
        fn delete(&mut self, key: &str) -> Result<(), kktp_core::KktpError> {
            self.records.remove(key);
            Ok(())
        }
        fn find_latest_resume_record(
            &self,
            prefix: &str,
        ) -> Result<Option<(String, Vec<u8>)>, kktp_core::KktpError> {
            Ok(self
                .records
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .max_by_key(|(k, _)| k.clone())
                .map(|(k, v)| (k.clone(), v.clone())))
        }
    }

    /// Records every published payload so scans can replay them; a real
    /// carrier DAG would persist across process restarts, this fake just
    /// needs to survive one test.
    #[derive(Default)]
    struct InMemoryNetwork {
        published: RefCell<Vec<Vec<u8>>>,
    }

    impl NetworkAdapter for InMemoryNetwork {
        fn publish(&mut self, payload: &[u8]) -> Result<(), kktp_core::KktpError> {
            self.published.borrow_mut().push(payload.to_vec());
            Ok(())
        }

        fn scan(
            &self,
            _start_hash: Option<&[u8]>,
            _max_seconds: u64,
            prefixes: &[&str],
            on_match: &mut dyn FnMut(&[u8]) -> bool,
        ) -> Result<(), kktp_core::KktpError> {
            for payload in self.published.borrow().iter() {
                let Ok(hex_str) = std::str::from_utf8(payload) else {
                    continue;
                };
                let Ok(body_bytes) = hexutil::decode(hex_str) else {
                    continue;
                };
                let Ok(body) = String::from_utf8(body_bytes) else {
                    continue;
                };
                if prefixes.iter().any(|p| body.starts_with(p)) && on_match(payload) {
                    break;
                }
            }
            Ok(())
        }
    }

    fn make_predecessor(sid: [u8; 32]) -> (SessionContext, crypto_sig::SigningKey, crypto_sig::VerificationKey) {
        let (sk, pub_sig) = crypto_sig::generate_key_pair([1u8; 32]).unwrap();
        let (_, pub_dh) = crypto_dh::generate_key_pair([2u8; 32]).unwrap();
        let mut ctx = SessionContext::new(
            sid,
            Role::Initiator,
            [3u8; 32],
            pub_sig.clone(),
            pub_dh,
            0,
            0,
            SessionKeyMaterial {
                session_key_bytes: [4u8; 32],
            },
            0,
        );
        ctx.activate();
        (ctx, sk, pub_sig)
    }

    #[test]
    fn test_load_fails_without_resume_record() {
        let mut network = InMemoryNetwork::default();
        let mut persistence = InMemoryPersistence::default();
        let sig = DefaultSignaturePrimitives;
        let rng = DefaultRandomBytes;
        let mut engine = HandoverEngine::new(&mut network, &mut persistence, &sig, &rng);
        let key = crypto_aead::Key::from([0u8; 32]);
        assert!(matches!(
            engine.load("kktp_resume_", &key),
            Err(HandoverError::NoResumeRecord)
        ));
    }

    #[test]
    fn test_no_response_within_budget_publishes_intent_and_returns_pending() {
        let mut network = InMemoryNetwork::default();
        let mut persistence = InMemoryPersistence::default();
        let (predecessor, signing_key, pub_sig) = make_predecessor([9u8; 32]);
        let key = crypto_aead::Key::from([1u8; 32]);
        let resume_key = vault_persistence::resume_key("kktp_resume_", &predecessor.sid);
        let blob =
            vault_persistence::to_encrypted_blob(&predecessor.to_snapshot(), &key).unwrap();
        persistence.put(&resume_key, &blob).unwrap();

        let sig = DefaultSignaturePrimitives;
        let rng = DefaultRandomBytes;
        let mut engine = HandoverEngine::new(&mut network, &mut persistence, &sig, &rng);

        let outcome = engine
            .run("kktp_resume_", &key, &signing_key, &pub_sig, 0, &|| false)
            .unwrap();
        assert!(matches!(outcome, HandoverOutcome::HandoverPending));
        assert_eq!(engine.phase(), HandoverPhase::Done);
    }
}
