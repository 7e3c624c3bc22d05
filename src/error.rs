// Error type for every fallible library call.
//
// Validation failures are always surfaced to the caller. Everything else
// describes a failed conversation with the remote service, which the
// moderation calls absorb into a degraded verdict and the management calls
// propagate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContentSafetyError>;

#[derive(Debug, Error)]
pub enum ContentSafetyError {
    /// The client could not be built from its configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A precondition on the caller's input was violated. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network-level failure (connect, timeout, reading the body).
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote kept answering with a retryable status until the
    /// attempt budget ran out.
    #[error("remote API returned {status} after {attempts} attempts: {body}")]
    RetriesExhausted {
        attempts: u32,
        status: u16,
        body: String,
    },

    /// A non-retryable error status from the remote API.
    #[error("remote API returned {status}: {message}")]
    RemoteApi { status: u16, message: String },

    /// A success response whose body did not match the expected shape.
    #[error("failed to decode remote API response: {0}")]
    Decode(String),
}

impl ContentSafetyError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// True for failures of the remote dependency, as opposed to bad input.
    pub fn is_remote_failure(&self) -> bool {
        !matches!(self, Self::InvalidInput(_) | Self::Config(_))
    }

    /// HTTP status carried by the error, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RetriesExhausted { status, .. } | Self::RemoteApi { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_is_not_a_remote_failure() {
        assert!(!ContentSafetyError::invalid("empty text").is_remote_failure());
        assert!(ContentSafetyError::Transport("refused".into()).is_remote_failure());
        assert!(ContentSafetyError::Decode("eof".into()).is_remote_failure());
        assert!(!ContentSafetyError::Config("no key".into()).is_remote_failure());
    }

    #[test]
    fn status_is_exposed_for_http_failures() {
        let err = ContentSafetyError::RetriesExhausted {
            attempts: 3,
            status: 503,
            body: "busy".into(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(
            err.to_string(),
            "remote API returned 503 after 3 attempts: busy"
        );
        assert_eq!(ContentSafetyError::Transport("x".into()).status(), None);
    }
}
