/// Errors from structured payload extraction.
///
/// Neither is fatal: the router renders the raw line instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// The payload after the header phrase is not valid JSON.
    #[error("malformed structured payload: {reason}")]
    MalformedPayload { reason: String },

    /// The header phrase is present but no payload follows it.
    #[error("structured header without payload")]
    MissingPayload,
}

pub type Result<T> = std::result::Result<T, ExtractError>;
