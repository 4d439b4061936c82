//! Bounded per-mailbox buffer for lobby control-plane DMs (join requests,
//! member events, key rotations) that arrive before their pairwise KKTP
//! session is ready to decrypt them (§4.10). Oldest entry is dropped first
//! on overflow; buffer contents are opaque plaintext payloads, already
//! decrypted by the caller's pairwise session codec.

use std::collections::{HashMap, VecDeque};

pub struct DmBuffer {
    bound: usize,
    queues: HashMap<[u8; 32], VecDeque<Vec<u8>>>,
}

impl DmBuffer {
    #[must_use]
    pub fn new(bound: usize) -> Self {
        Self {
            bound,
            queues: HashMap::new(),
        }
    }

    pub fn push(&mut self, mailbox_id: [u8; 32], payload: Vec<u8>) {
        let queue = self.queues.entry(mailbox_id).or_default();
        if queue.len() >= self.bound {
            queue.pop_front();
            tracing::warn!(
                mailbox_id = %hexutil::encode(&mailbox_id),
                "lobby dm buffer overflow, dropping oldest entry"
            );
        }
        queue.push_back(payload);
    }

    /// Drains every buffered payload for `mailbox_id` in arrival order,
    /// once the caller's pairwise session for it becomes ready.
    pub fn drain(&mut self, mailbox_id: &[u8; 32]) -> Vec<Vec<u8>> {
        self.queues
            .remove(mailbox_id)
            .map(Vec::from)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn pending_len(&self, mailbox_id: &[u8; 32]) -> usize {
        self.queues.get(mailbox_id).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_drain_preserves_order() {
        let mut buffer = DmBuffer::new(4);
        let mailbox = [1u8; 32];
        buffer.push(mailbox, b"a".to_vec());
        buffer.push(mailbox, b"b".to_vec());
        assert_eq!(buffer.drain(&mailbox), vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(buffer.pending_len(&mailbox), 0);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut buffer = DmBuffer::new(2);
        let mailbox = [1u8; 32];
        buffer.push(mailbox, b"a".to_vec());
        buffer.push(mailbox, b"b".to_vec());
        buffer.push(mailbox, b"c".to_vec());
        assert_eq!(buffer.drain(&mailbox), vec![b"b".to_vec(), b"c".to_vec()]);
    }
}
