use thiserror::Error;

/// Top-level error type for the `windhager-api` crate.
///
/// Covers every failure mode of the lookup API: digest authentication,
/// transport, unexpected HTTP status and malformed payloads.
/// `windhager-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The appliance still rejects the request after the digest retry.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// `WWW-Authenticate` header could not be parsed as a Digest challenge.
    #[error("Malformed digest challenge: {message}")]
    DigestChallenge { message: String },

    /// The challenge demands a `qop` we cannot satisfy (only `auth` is supported).
    #[error("Unsupported digest qop value: {0}")]
    UnsupportedQop(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-success HTTP status that is not an authentication rejection.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the appliance rejected our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` for malformed or unsupported digest negotiation.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::DigestChallenge { .. } | Self::UnsupportedQop(_))
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the underlying request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}
