//! Frame encoding.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Turns typed events into frame bytes and back.
///
/// The connection handler is generic over this, so swapping the wire
/// format never reaches the coordinator.
pub trait Codec: Send + Sync + 'static {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Fails with [`ProtocolError::Decode`] on anything that is not a
    /// well-formed `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// UTF-8 JSON, one event object per frame.
///
/// ```rust
/// use partyhall_protocol::{ClientEvent, Codec, JsonCodec, Ping};
///
/// let bytes = JsonCodec.encode(&ClientEvent::Ping(Ping { client_time: 5000 })).unwrap();
/// assert_eq!(bytes, br#"{"event":"ping","data":{"clientTime":5000}}"#);
///
/// let back: ClientEvent = JsonCodec.decode(&bytes).unwrap();
/// assert!(matches!(back, ClientEvent::Ping(Ping { client_time: 5000 })));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientEvent;

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let result: Result<ClientEvent, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_produces_utf8_json() {
        let bytes = JsonCodec.encode(&ClientEvent::ListRooms).unwrap();
        let text = std::str::from_utf8(&bytes).expect("json is utf-8");
        assert_eq!(text, r#"{"event":"listRooms"}"#);
    }
}
