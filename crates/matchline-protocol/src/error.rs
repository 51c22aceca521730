//! Error types for the protocol layer.
//!
//! Each Matchline crate defines its own error enum, so a `ProtocolError`
//! always means the problem is in the bytes or routes on the wire, never in
//! matchmaking state.

/// Errors that can occur while decoding or encoding matchmaking traffic.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into JSON).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed.
    ///
    /// Common causes: malformed JSON, missing required fields, or a known
    /// event type whose payload has the wrong shape.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but violates protocol rules, e.g. an event
    /// without a `type` tag.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The message was published to a path this client does not subscribe to.
    #[error("unknown route: {0}")]
    UnknownRoute(String),
}
