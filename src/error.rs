use thiserror::Error;

/// Failure talking to the analytics backend.
///
/// Every variant is treated the same way by the UI (the owning slot is nulled);
/// the split only exists so logs say what went wrong.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid endpoint url {url}: {reason}")]
    Url { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("http {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("invalid {what} json: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
