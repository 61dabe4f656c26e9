use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {field} value: {value:?}")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

/// Failures on the external-model path. Always recovered by falling back to
/// the rule-based scorer.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no API credential configured")]
    MissingCredential,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("provider returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("invalid provider response: {0}")]
    InvalidValue(#[from] UnknownVariant),

    #[error("provider returned reserved category {0}")]
    ReservedCategory(String),

    #[error("confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

/// Per-item failures inside a batch. Recorded, never fatal to the batch.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("complaint text is {len} characters, limit is {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("complaint context must be a JSON object, got {0}")]
    InvalidContext(&'static str),
}
