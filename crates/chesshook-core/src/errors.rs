/// Failure writing a frame to a client connection.
///
/// Any transport error ends the affected session. It is never fatal to the
/// server.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
}
