// ── Core error types ──
//
// User-facing errors from the core layer. API errors are translated
// into categories a consumer can act on: bad credentials, an
// unreachable appliance, a stalled cycle, or invalid input.

use windhager_api::Error as ApiError;

use crate::model::OidError;

/// Unified error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Cannot connect to appliance at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Digest negotiation failed: {message}")]
    Protocol { message: String },

    #[error("Poll cycle timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Appliance API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error(transparent)]
    InvalidOid(#[from] OidError),

    #[error("Validation failed: {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` for a cycle that exceeded its timeout envelope.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    /// `true` when the appliance could not be reached at all.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }
}

impl From<ApiError> for CoreError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::DigestChallenge { message } => CoreError::Protocol { message },
            ApiError::UnsupportedQop(qop) => CoreError::Protocol {
                message: format!("unsupported qop {qop:?}"),
            },
            ApiError::Transport(ref e) => {
                let url = e.url().map(ToString::to_string).unwrap_or_default();
                CoreError::ConnectionFailed {
                    url,
                    reason: err.to_string(),
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid appliance URL: {e}"),
            },
            ApiError::Http { status, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {body}")
                },
                status: Some(status),
            },
            ApiError::Deserialization { message, .. } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_rejection_maps_to_authentication_failed() {
        let err = CoreError::from(ApiError::Authentication {
            message: "HTTP 401".into(),
        });
        assert!(err.is_auth_failure());
        assert!(!err.is_connection_failure());
    }

    #[test]
    fn digest_errors_map_to_protocol() {
        let err = CoreError::from(ApiError::UnsupportedQop("auth-int".into()));
        assert!(matches!(err, CoreError::Protocol { .. }));
        let err = CoreError::from(ApiError::DigestChallenge {
            message: "missing nonce".into(),
        });
        assert!(matches!(err, CoreError::Protocol { .. }));
    }

    #[test]
    fn http_status_is_preserved() {
        let err = CoreError::from(ApiError::Http {
            status: 503,
            body: String::new(),
        });
        match err {
            CoreError::Api { status, message } => {
                assert_eq!(status, Some(503));
                assert_eq!(message, "HTTP 503");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn timeout_is_distinguishable() {
        assert!(CoreError::Timeout { timeout_secs: 20 }.is_timeout());
        assert!(
            !CoreError::Api {
                message: "x".into(),
                status: None
            }
            .is_timeout()
        );
    }
}
