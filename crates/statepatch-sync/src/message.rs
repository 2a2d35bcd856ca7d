use serde::{Deserialize, Serialize};
use statepatch_diff::ChangeRecord;
use statepatch_types::State;

/// Default limit on an encoded message, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Messages sent from a publisher to its replicas.
///
/// Every message carries the publisher's sequence number. A `state` message
/// resets a replica to a full snapshot; each following `patch_state` must
/// carry the next sequence number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncMessage {
    /// A full snapshot.
    State { seq: u64, payload: State },
    /// A change list against the snapshot with sequence `seq - 1`.
    PatchState {
        seq: u64,
        payload: Vec<ChangeRecord>,
    },
}

impl SyncMessage {
    pub fn seq(&self) -> u64 {
        match self {
            Self::State { seq, .. } | Self::PatchState { seq, .. } => *seq,
        }
    }

    /// The wire tag of this message.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::State { .. } => "state",
            Self::PatchState { .. } => "patch_state",
        }
    }

    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use statepatch_types::Value;

    #[test]
    fn state_message_wire_shape() {
        let msg = SyncMessage::State {
            seq: 0,
            payload: [("a", 1)].into_iter().collect(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "state", "seq": 0, "payload": {"a": 1}})
        );
        assert!(msg.is_state());
        assert_eq!(msg.type_name(), "state");
    }

    #[test]
    fn patch_message_wire_shape() {
        let msg = SyncMessage::PatchState {
            seq: 3,
            payload: vec![ChangeRecord::Updated {
                key: "a".into(),
                value: Value::from(2),
            }],
        };
        let wire = json!({
            "type": "patch_state",
            "seq": 3,
            "payload": [{"key": "a", "change": "updated", "value": 2}]
        });
        assert_eq!(serde_json::to_value(&msg).unwrap(), wire);
        assert_eq!(serde_json::from_value::<SyncMessage>(wire).unwrap(), msg);
        assert_eq!(msg.seq(), 3);
        assert_eq!(msg.type_name(), "patch_state");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let wire = json!({"type": "dispatch", "seq": 0, "payload": {}});
        assert!(serde_json::from_value::<SyncMessage>(wire).is_err());
    }
}
