//! Per-peer session state (§3, §4.3, §4.7).
//!
//! One [`SessionContext`] tracks everything needed to keep talking to a
//! single peer: the role played in the handshake, the derived keys and
//! mailbox ID, the outgoing sequence counter, and a bounded reorder
//! buffer for messages that arrive ahead of the next expected sequence
//! number.

use crate::anchors::{Direction, Msg, SessionEnd};
use crate::codec::{self, DecodeResult};
use crate::error::{DropReason, KktpError, UnpackOutcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zeroize::Zeroize;

/// Which side of the handshake this context played. Fixes which
/// direction tag this side sends on: the initiator always sends `AtoB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    #[must_use]
    pub const fn send_direction(self) -> Direction {
        match self {
            Self::Initiator => Direction::AtoB,
            Self::Responder => Direction::BtoA,
        }
    }

    #[must_use]
    pub const fn recv_direction(self) -> Direction {
        self.send_direction().opposite()
    }
}

/// Lifecycle state of a session, per the state machine this module
/// implements. `Killed`/`Saturated`-style terminal conditions are folded
/// into `Closed`/`Faulted`: the reason is carried by the caller (session
/// end anchor text, or the `KktpError` that faulted it), not re-encoded
/// as more enum variants here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Discovering,
    Connecting,
    Active,
    Closed,
    Faulted,
}

/// The shared AEAD session key, stored as raw bytes so the context as a
/// whole can be serialized for resume persistence; `crypto_aead::Key`
/// itself carries no `Serialize` impl since ordinary message traffic never
/// needs to serialize a bare key.
#[derive(Serialize, Deserialize, Zeroize)]
pub struct SessionKeyMaterial {
    pub session_key_bytes: [u8; crypto_aead::KEY_SIZE],
}

impl SessionKeyMaterial {
    #[must_use]
    pub fn session_key(&self) -> crypto_aead::Key {
        crypto_aead::Key::from(self.session_key_bytes)
    }
}

/// Default bound on the number of out-of-order messages held in a
/// session's reorder buffer before `BufferOverflow` is raised.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 256;

/// Full state for one peer session.
pub struct SessionContext {
    pub sid: [u8; 32],
    pub role: Role,
    pub state: SessionState,
    pub mailbox_id: [u8; 32],
    pub peer_pub_sig: crypto_sig::VerificationKey,
    pub peer_pub_dh: crypto_dh::DhPublicKey,
    pub key_branch: u32,
    pub key_index: u64,
    pub keys: SessionKeyMaterial,
    pub local_seq: u64,
    pub remote_seq: u64,
    pub max_buffer_size: usize,
    reorder_buffer: BTreeMap<u64, Vec<u8>>,
    pub last_activity_millis: u64,
}

impl SessionContext {
    #[must_use]
    pub fn new(
        sid: [u8; 32],
        role: Role,
        mailbox_id: [u8; 32],
        peer_pub_sig: crypto_sig::VerificationKey,
        peer_pub_dh: crypto_dh::DhPublicKey,
        key_branch: u32,
        key_index: u64,
        keys: SessionKeyMaterial,
        now_millis: u64,
    ) -> Self {
        Self {
            sid,
            role,
            state: SessionState::Connecting,
            mailbox_id,
            peer_pub_sig,
            peer_pub_dh,
            key_branch,
            key_index,
            keys,
            local_seq: 0,
            remote_seq: 0,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            reorder_buffer: BTreeMap::new(),
            last_activity_millis: now_millis,
        }
    }

    #[must_use]
    pub fn send_direction(&self) -> Direction {
        self.role.send_direction()
    }

    #[must_use]
    pub fn recv_direction(&self) -> Direction {
        self.role.recv_direction()
    }

    /// The session key used to encrypt outgoing messages. One shared key
    /// serves both directions (§4.5 step 5); only the AAD's direction tag
    /// distinguishes the two streams.
    #[must_use]
    pub fn send_key(&self) -> crypto_aead::Key {
        self.keys.session_key()
    }

    /// The session key used to decrypt incoming messages. Identical to
    /// [`Self::send_key`]; kept as a separate accessor so call sites read
    /// their intent even though the underlying key is shared.
    #[must_use]
    pub fn recv_key(&self) -> crypto_aead::Key {
        self.keys.session_key()
    }

    /// Allocates the next outgoing sequence number.
    pub fn next_outgoing_seq(&mut self) -> u64 {
        let seq = self.local_seq;
        self.local_seq += 1;
        seq
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Transitions out of `Connecting` once the handshake that produced this
    /// context's keys has been confirmed (§4.3 transition 3). A freshly
    /// constructed context already carries the keys from a completed
    /// handshake, so the caller calls this immediately after `new`/
    /// `from_snapshot` rather than this module re-running the handshake
    /// itself.
    pub fn activate(&mut self) {
        self.state = SessionState::Active;
        tracing::info!(sid = %hexutil::encode(&self.sid), "session: active");
    }

    /// Terminal transition on integrity or resource violation (§4.3
    /// transition 5). Once faulted, no further messages are admitted.
    fn fault(&mut self, error: &KktpError) {
        self.state = SessionState::Faulted;
        tracing::warn!(sid = %hexutil::encode(&self.sid), error = %error, "session: faulted");
    }

    /// Graceful close on an observed, validated session-end anchor (§4.3
    /// transition 4).
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
        tracing::info!(sid = %hexutil::encode(&self.sid), "session: closed");
    }

    /// Validates and applies a peer-published session-end anchor: schema,
    /// SID match, and a signature check under the peer's own signing key
    /// (so only the peer side that owns this SID can close it).
    pub fn handle_session_end(&mut self, end: &SessionEnd) -> Result<(), KktpError> {
        end.validate()?;
        let end_sid: [u8; 32] = hexutil::decode_array(&end.sid)?;
        if end_sid != self.sid {
            return Err(KktpError::SchemaInvalid(
                "session_end sid does not match this session".into(),
            ));
        }
        let pub_sig_bytes: [u8; crypto_sig::VERIFICATION_KEY_SIZE] = hexutil::decode_array(&end.pub_sig)?;
        if &pub_sig_bytes != self.peer_pub_sig.as_bytes() {
            return Err(KktpError::SchemaInvalid(
                "session_end pub_sig is not this session's peer".into(),
            ));
        }
        let sig_bytes: [u8; crypto_sig::SIGNATURE_SIZE] = hexutil::decode_array(&end.sig)?;
        let sig = crypto_sig::Signature::from_bytes(sig_bytes)
            .map_err(|_| KktpError::SchemaInvalid("session_end sig is not well-formed".into()))?;
        let preimage = end.signing_preimage()?;
        if !crypto_sig::verify(&self.peer_pub_sig, &preimage, &sig) {
            return Err(KktpError::SignatureInvalid);
        }
        self.close();
        Ok(())
    }

    pub fn note_activity(&mut self, now_millis: u64) {
        self.last_activity_millis = now_millis;
    }

    #[must_use]
    pub fn is_inactive(&self, now_millis: u64, max_inactivity_millis: u64) -> bool {
        now_millis.saturating_sub(self.last_activity_millis) > max_inactivity_millis
    }

    /// Admits one decrypted plaintext at `seq` into the reorder buffer,
    /// releasing it immediately (plus any already-buffered messages that
    /// are now consecutive) if `seq` is the next expected sequence number,
    /// buffering it if it arrived early, or reporting a replay if it is
    /// older than `remote_seq`.
    pub fn admit(&mut self, seq: u64, plaintext: Vec<u8>) -> Result<UnpackOutcome, KktpError> {
        if seq < self.remote_seq {
            tracing::debug!(seq, remote_seq = self.remote_seq, "session: dropping replayed sequence");
            return Ok(UnpackOutcome::Dropped(DropReason::SequenceReplay));
        }

        if seq == self.remote_seq {
            self.remote_seq += 1;
            let mut delivered = vec![plaintext];
            while let Some(next) = self.reorder_buffer.remove(&self.remote_seq) {
                delivered.push(next);
                self.remote_seq += 1;
            }
            if delivered.len() > 1 {
                tracing::debug!(batch_len = delivered.len(), "session: reorder buffer gap filled, delivering batch");
            }
            return Ok(if delivered.len() == 1 {
                UnpackOutcome::Delivered(delivered.into_iter().next().unwrap())
            } else {
                UnpackOutcome::DeliveredBatch(delivered)
            });
        }

        if self.reorder_buffer.contains_key(&seq) {
            tracing::debug!(seq, "session: dropping duplicate buffered sequence");
            return Ok(UnpackOutcome::Dropped(DropReason::SequenceReplay));
        }
        if self.reorder_buffer.len() >= self.max_buffer_size {
            let error = KktpError::BufferOverflow;
            tracing::warn!(seq, max_buffer_size = self.max_buffer_size, "session: reorder buffer overflow");
            self.fault(&error);
            return Err(error);
        }
        self.reorder_buffer.insert(seq, plaintext);
        Ok(UnpackOutcome::Buffered)
    }

    /// Filters, decrypts, and admits one incoming `Msg` anchor (§4.6, §4.7),
    /// the full receive-side operation of the state machine: a session that
    /// is not `Active` admits nothing, a message that fails the mailbox/SID/
    /// direction filter is a silent drop, and an AEAD authentication failure
    /// faults the session rather than returning a recoverable outcome.
    pub fn receive(&mut self, msg: &Msg) -> Result<UnpackOutcome, KktpError> {
        if !self.is_active() {
            return Err(KktpError::InvalidState);
        }
        match codec::unpack(msg, &self.sid, &self.mailbox_id, self.recv_direction(), &self.recv_key()) {
            Ok(DecodeResult::Plaintext(plaintext)) => self.admit(msg.seq, plaintext),
            Ok(DecodeResult::Dropped(reason)) => Ok(UnpackOutcome::Dropped(reason)),
            Err(error) => {
                self.fault(&error);
                Err(error)
            }
        }
    }
}

/// A flat, fully serializable snapshot of a [`SessionContext`], used by the
/// vault to persist and restore sessions across restarts without needing
/// `SessionContext` itself to carry derived, non-serializable state.
#[derive(Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub sid: [u8; 32],
    pub role: Role,
    pub state: SessionState,
    pub mailbox_id: [u8; 32],
    pub peer_pub_sig: crypto_sig::VerificationKey,
    pub peer_pub_dh: crypto_dh::DhPublicKey,
    pub key_branch: u32,
    pub key_index: u64,
    pub keys: SessionKeyMaterial,
    pub local_seq: u64,
    pub remote_seq: u64,
    pub max_buffer_size: usize,
    pub reorder_buffer: BTreeMap<u64, Vec<u8>>,
    pub last_activity_millis: u64,
}

impl SessionContext {
    #[must_use]
    pub fn to_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            sid: self.sid,
            role: self.role,
            state: self.state,
            mailbox_id: self.mailbox_id,
            peer_pub_sig: self.peer_pub_sig.clone(),
            peer_pub_dh: self.peer_pub_dh.clone(),
            key_branch: self.key_branch,
            key_index: self.key_index,
            keys: SessionKeyMaterial {
                session_key_bytes: self.keys.session_key_bytes,
            },
            local_seq: self.local_seq,
            remote_seq: self.remote_seq,
            max_buffer_size: self.max_buffer_size,
            reorder_buffer: self.reorder_buffer.clone(),
            last_activity_millis: self.last_activity_millis,
        }
    }

    #[must_use]
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            sid: snapshot.sid,
            role: snapshot.role,
            state: snapshot.state,
            mailbox_id: snapshot.mailbox_id,
            peer_pub_sig: snapshot.peer_pub_sig,
            peer_pub_dh: snapshot.peer_pub_dh,
            key_branch: snapshot.key_branch,
            key_index: snapshot.key_index,
            keys: snapshot.keys,
            local_seq: snapshot.local_seq,
            remote_seq: snapshot.remote_seq,
            max_buffer_size: snapshot.max_buffer_size,
            reorder_buffer: snapshot.reorder_buffer,
            last_activity_millis: snapshot.last_activity_millis,
        }
    }
}
