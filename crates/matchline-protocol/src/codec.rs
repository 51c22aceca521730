//! Codec trait and implementations for turning transport frames into
//! [`InboundMessage`](crate::InboundMessage)s and requests into bytes.
//!
//! The matchmaking server speaks JSON, so [`JsonCodec`] is the codec in
//! use; the trait keeps the frame format swappable for tests.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because codecs are stored inside long-lived
/// actor tasks that Tokio may move between threads.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`), the format the
/// matchmaking server speaks.
///
/// ## Example
///
/// ```rust
/// use matchline_protocol::{Codec, InboundMessage, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = br#"{"route":"/matchmaking/1/c1","payload":{"type":"requeue"}}"#;
/// let msg: InboundMessage = codec.decode(bytes).unwrap();
/// assert_eq!(msg.route, "/matchmaking/1/c1");
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
