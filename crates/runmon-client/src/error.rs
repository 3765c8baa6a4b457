pub use reqwest::StatusCode;
use runmon_core::{FailureKind, FailureReport};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single remote call.
///
/// `purpose` is the user-facing sentence describing what was attempted.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{purpose} Unable to reach '{url}' Cause: {source}")]
    Network {
        url: String,
        purpose: &'static str,
        #[source]
        source: BoxError,
    },
    #[error(
        "{purpose} Requested resource: '{url}' Status {} Headers: {}",
        .status.as_u16(),
        render_headers(.headers)
    )]
    Http {
        url: String,
        purpose: &'static str,
        status: StatusCode,
        headers: Vec<(String, String)>,
    },
    #[error("{purpose} Unexpected response from '{url}': {source}")]
    Decode {
        url: String,
        purpose: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot build request url from '{base}': {message}")]
    InvalidUrl { base: String, message: String },
}

impl ClientError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::Network { .. } | ClientError::InvalidUrl { .. } => FailureKind::Network,
            ClientError::Http { .. } => FailureKind::Http,
            ClientError::Decode { .. } => FailureKind::Decode,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Comparable snapshot suitable for state and notifications.
    pub fn report(&self) -> FailureReport {
        FailureReport {
            kind: self.kind(),
            message: self.to_string(),
            status: self.status().map(|status| status.as_u16()),
        }
    }
}

/// Headers as a JSON array of `[name, value]` pairs.
fn render_headers(headers: &[(String, String)]) -> String {
    serde_json::to_string(headers).unwrap_or_default()
}
