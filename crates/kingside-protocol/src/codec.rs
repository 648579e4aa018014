//! Codec trait and the JSON implementation.
//!
//! The server only ever calls [`Codec::encode`] / [`Codec::decode`], so
//! the frame format can change without touching the handler or the room
//! layer.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to frame bytes and decodes them back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the life of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks JSON, the format browser clients send over
/// WebSocket text frames.
///
/// ```rust
/// use kingside_protocol::{ClientEvent, Codec, Envelope, JsonCodec, Payload};
///
/// let codec = JsonCodec;
/// let request = Envelope {
///     seq: 3,
///     timestamp: 0,
///     payload: Payload::Client(ClientEvent::CreateRoom),
/// };
///
/// let bytes = codec.encode(&request).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(request, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientEvent, Envelope, Payload};

    #[test]
    fn test_json_codec_decodes_browser_frame() {
        let frame = br#"{"seq":7,"timestamp":120,"payload":{"type":"Client","data":{"event":"username","data":"magnus"}}}"#;

        let envelope: Envelope = JsonCodec.decode(frame).unwrap();

        assert_eq!(envelope.seq, 7);
        assert_eq!(
            envelope.payload,
            Payload::Client(ClientEvent::Username("magnus".into()))
        );
    }

    #[test]
    fn test_json_codec_decode_garbage_is_decode_error() {
        let result: Result<Envelope, _> = JsonCodec.decode(b"e2e4");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
