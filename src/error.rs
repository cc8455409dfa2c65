/// The request body is not a `{"csp-report": {...}}` JSON document.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode violation report: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Reasons a decoded report is dropped instead of logged.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The blocked URI matches an entry of the noise list.
    #[error("blocked URI ('{uri}') is an invalid resource")]
    InvalidResource { uri: String },

    /// The document URI is present but not an absolute http(s) URI.
    #[error("document URI ('{uri}') is invalid")]
    InvalidDocumentUri { uri: String },
}
