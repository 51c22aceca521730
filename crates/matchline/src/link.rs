//! The boundary to the matchmaking server.

use std::future::Future;

use matchline_protocol::ServerRequest;

use crate::LinkError;

/// Sends requests to the matchmaking server.
///
/// Framing and connection management live behind this trait. The
/// coordinator only needs to know whether a request went through.
/// Implementations may be written with `async fn`.
pub trait ServerLink: Send + Sync + 'static {
    fn send(&self, request: ServerRequest) -> impl Future<Output = Result<(), LinkError>> + Send;
}
