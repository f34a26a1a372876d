//! Error types for RepoCard core.

use std::{error::Error, fmt, io};

/// Error type for RepoCard core operations.
#[derive(Debug)]
pub enum RepoCardError {
    /// The repository URL could not be resolved to an owner and name.
    InvalidReference(String),
    /// Repository metadata could not be fetched.
    MetadataUnavailable(String),
    /// Traversal produced no decodable files.
    NoRelevantFiles(String),
    /// A required credential was not configured.
    MissingCredential(String),
    /// The content API refused the scorecard write.
    CommitRejected {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// A remote API answered with a non-success status.
    Api {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// The HTTP transport failed before a response was received.
    Http(String),
    /// A response payload could not be decoded.
    Decode(String),
    /// An underlying I/O error.
    Io(io::Error),
    /// A catch-all error with a message.
    Other(String),
}

impl fmt::Display for RepoCardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidReference(url) => write!(f, "invalid repository url: {url}"),
            Self::MetadataUnavailable(repo) => {
                write!(f, "failed to fetch repository metadata for {repo}")
            }
            Self::NoRelevantFiles(repo) => {
                write!(f, "no relevant files found in repository {repo}")
            }
            Self::MissingCredential(name) => write!(f, "{name} is required"),
            Self::CommitRejected { status, body } => {
                write!(f, "failed to commit file: {status} - {body}")
            }
            Self::Api { status, body } => write!(f, "api error ({status}): {body}"),
            Self::Http(message) => write!(f, "request failed: {message}"),
            Self::Decode(message) => write!(f, "response decode failed: {message}"),
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl Error for RepoCardError {}

impl From<io::Error> for RepoCardError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<reqwest::Error> for RepoCardError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value.to_string())
    }
}

/// Failures raised while obtaining a model-produced score set.
///
/// These never escape the scorer: every variant degrades to the heuristic
/// fallback scorecard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    /// The model endpoint could not be reached or rejected the call.
    ModelUnavailable(String),
    /// The model answered with no text.
    EmptyResponse,
    /// The response text was not valid JSON after cleanup.
    ResponseUnparsable(String),
    /// The JSON did not have the expected `entries` shape.
    ResponseInvalidShape(String),
}

impl ScoringError {
    /// Whether another attempt against the model may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ModelUnavailable(_))
    }
}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelUnavailable(message) => write!(f, "model unavailable: {message}"),
            Self::EmptyResponse => write!(f, "model returned an empty response"),
            Self::ResponseUnparsable(message) => {
                write!(f, "response is not valid json: {message}")
            }
            Self::ResponseInvalidShape(message) => {
                write!(f, "invalid response structure: {message}")
            }
        }
    }
}

impl Error for ScoringError {}

/// Convenience result type for RepoCard core.
pub type Result<T> = std::result::Result<T, RepoCardError>;

#[cfg(test)]
mod tests {
    use super::{RepoCardError, ScoringError};
    use std::io;

    #[test]
    fn io_error_formats_message() {
        let error = RepoCardError::Io(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(format!("{error}"), "io error: boom");
    }

    #[test]
    fn commit_rejected_carries_status_and_body() {
        let error = RepoCardError::CommitRejected {
            status: 409,
            body: "sha mismatch".to_string(),
        };
        assert_eq!(format!("{error}"), "failed to commit file: 409 - sha mismatch");
    }

    #[test]
    fn missing_credential_names_variable() {
        let error = RepoCardError::MissingCredential("GITHUB_TOKEN".to_string());
        assert_eq!(format!("{error}"), "GITHUB_TOKEN is required");
    }

    #[test]
    fn from_io_error_maps_variant() {
        let error: RepoCardError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        match error {
            RepoCardError::Io(inner) => {
                assert_eq!(inner.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected Io variant, got {other:?}"),
        }
    }

    #[test]
    fn only_transport_failures_skip_retry() {
        assert!(!ScoringError::ModelUnavailable("down".to_string()).is_retryable());
        assert!(ScoringError::EmptyResponse.is_retryable());
        assert!(ScoringError::ResponseUnparsable("eof".to_string()).is_retryable());
        assert!(ScoringError::ResponseInvalidShape("entries".to_string()).is_retryable());
    }
}
