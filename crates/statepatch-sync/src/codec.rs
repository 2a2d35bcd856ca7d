//! Payload codecs: turn sync messages into bytes for a transport.

use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::message::{SyncMessage, MAX_MESSAGE_SIZE};

/// Encodes and decodes [`SyncMessage`]s.
pub trait PayloadCodec {
    fn encode(&self, msg: &SyncMessage) -> SyncResult<Vec<u8>>;
    fn decode(&self, data: &[u8]) -> SyncResult<SyncMessage>;
}

/// JSON codec with a size limit in both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonCodec {
    max_message_size: usize,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self { max_message_size }
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    fn check_size(&self, size: usize) -> SyncResult<()> {
        if size > self.max_message_size {
            debug!(size, max = self.max_message_size, "message exceeds size limit");
            return Err(SyncError::MessageTooLarge {
                size,
                max: self.max_message_size,
            });
        }
        Ok(())
    }
}

impl PayloadCodec for JsonCodec {
    fn encode(&self, msg: &SyncMessage) -> SyncResult<Vec<u8>> {
        let bytes = serde_json::to_vec(msg).map_err(|e| {
            debug!(error = %e, kind = msg.type_name(), "failed to encode message");
            SyncError::Serialization(e.to_string())
        })?;
        self.check_size(bytes.len())?;
        Ok(bytes)
    }

    fn decode(&self, data: &[u8]) -> SyncResult<SyncMessage> {
        self.check_size(data.len())?;
        serde_json::from_slice(data).map_err(|e| {
            debug!(error = %e, len = data.len(), "failed to decode message");
            SyncError::Deserialization(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statepatch_diff::ChangeRecord;
    use statepatch_types::{State, Value};

    fn sample_state() -> State {
        [("count", Value::from(1)), ("name", Value::from("ada"))]
            .into_iter()
            .collect()
    }

    #[test]
    fn state_roundtrip() {
        let codec = JsonCodec::new();
        let msg = SyncMessage::State {
            seq: 7,
            payload: sample_state(),
        };
        let bytes = codec.encode(&msg).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn patch_roundtrip() {
        let codec = JsonCodec::new();
        let msg = SyncMessage::PatchState {
            seq: 8,
            payload: vec![ChangeRecord::Removed { key: "name".into() }],
        };
        let bytes = codec.encode(&msg).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn encode_too_large() {
        let codec = JsonCodec::with_max_message_size(8);
        let msg = SyncMessage::State {
            seq: 0,
            payload: sample_state(),
        };
        let err = codec.encode(&msg).unwrap_err();
        assert!(matches!(err, SyncError::MessageTooLarge { max: 8, .. }));
    }

    #[test]
    fn decode_too_large() {
        let codec = JsonCodec::with_max_message_size(4);
        let err = codec.decode(b"{\"type\":\"state\"}").unwrap_err();
        assert!(matches!(err, SyncError::MessageTooLarge { size: 16, max: 4 }));
    }

    #[test]
    fn decode_garbage() {
        let err = JsonCodec::new().decode(b"not json").unwrap_err();
        assert!(matches!(err, SyncError::Deserialization(_)));
    }

    #[test]
    fn default_limit() {
        assert_eq!(JsonCodec::default().max_message_size(), 64 * 1024 * 1024);
    }
}
