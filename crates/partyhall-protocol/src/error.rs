/// Everything that can go wrong between raw frame bytes and typed events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("cannot encode frame: {0}")]
    Encode(#[source] serde_json::Error),

    /// Not JSON, an unknown `event` name, or a payload of the wrong shape.
    #[error("cannot decode frame: {0}")]
    Decode(#[source] serde_json::Error),

    /// The client speaks a different protocol revision.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },

    /// The opening exchange did not produce a `hello`.
    #[error("handshake failed: {0}")]
    Handshake(String),
}
