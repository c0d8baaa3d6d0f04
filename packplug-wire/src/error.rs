use thiserror::Error;

/// Errors from reading or writing one framed message (spec §4.D, §7).
#[derive(Debug, Error)]
pub enum WireError {
    #[error("truncated frame header")]
    TruncatedHeader,
    #[error("truncated frame payload")]
    TruncatedPayload,
    #[error("invalid payload size {0} (minimum is {min})", min = crate::framing::MIN_PAYLOAD_LEN)]
    InvalidPayloadSize(u64),
    #[error("malformed message")]
    MalformedMessage(#[source] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
