//! Handover intent payload (§4.9): the plaintext published on the
//! predecessor mailbox when no response to a fresh discovery arrives
//! within budget, pointing the peer at the successor session.

use serde::{Deserialize, Serialize};

pub const INTENT_HANDOVER: &str = "handover";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoverIntent {
    pub intent: String,
    pub new_sid: String,
    pub new_anchor: serde_json::Value,
}

impl HandoverIntent {
    #[must_use]
    pub fn new(new_sid: &[u8; 32], new_anchor: serde_json::Value) -> Self {
        Self {
            intent: INTENT_HANDOVER.to_string(),
            new_sid: hexutil::encode(new_sid),
            new_anchor,
        }
    }

    #[must_use]
    pub fn is_handover(value: &serde_json::Value) -> bool {
        value.get("intent").and_then(serde_json::Value::as_str) == Some(INTENT_HANDOVER)
    }

    #[must_use]
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_json() {
        let intent = HandoverIntent::new(&[9u8; 32], serde_json::json!({"type": "discovery"}));
        let value = serde_json::to_value(&intent).unwrap();
        assert!(HandoverIntent::is_handover(&value));
        let parsed = HandoverIntent::parse(&value).unwrap();
        assert_eq!(parsed.new_sid, intent.new_sid);
    }

    #[test]
    fn test_is_handover_rejects_other_intents() {
        let value = serde_json::json!({"intent": "kick"});
        assert!(!HandoverIntent::is_handover(&value));
    }
}
