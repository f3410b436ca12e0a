// HTTP Digest authentication (RFC 2617)
//
// The appliance answers unauthenticated requests with a 401 carrying a
// `WWW-Authenticate: Digest ...` challenge. The challenge is parsed once,
// cached for the lifetime of the authenticator, and used to compute an
// `Authorization` header for every subsequent request. The nonce-count
// advances while the server nonce stays the same and restarts at 1 when
// the server hands out a new nonce.

use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};

use md5::{Digest, Md5};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use tracing::{debug, trace};

use crate::error::Error;

// ── Algorithm ───────────────────────────────────────────────────────

/// Hash algorithm negotiated through the challenge's `algorithm` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Md5,
    /// MD5 with the session variant of HA1 (`H(HA1:nonce:cnonce)`).
    Md5Sess,
    /// SHA-1.
    Sha,
}

impl DigestAlgorithm {
    /// Parse the challenge's `algorithm` value. An absent value means MD5.
    /// Returns `None` for algorithms we cannot compute.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::to_ascii_uppercase).as_deref() {
            None | Some("MD5") => Some(Self::Md5),
            Some("MD5-SESS") => Some(Self::Md5Sess),
            Some("SHA") => Some(Self::Sha),
            Some(_) => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Md5Sess => "MD5-SESS",
            Self::Sha => "SHA",
        }
    }

    /// Lowercase hex digest of `data`.
    fn hash(self, data: &str) -> String {
        match self {
            Self::Md5 | Self::Md5Sess => hex::encode(Md5::digest(data.as_bytes())),
            Self::Sha => hex::encode(Sha1::digest(data.as_bytes())),
        }
    }
}

// ── Challenge ───────────────────────────────────────────────────────

/// Parameters of a `WWW-Authenticate: Digest` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub qop: Option<String>,
    pub algorithm: Option<String>,
    pub opaque: Option<String>,
}

impl DigestChallenge {
    /// Parse a full `WWW-Authenticate` header value.
    ///
    /// Returns `Ok(None)` when the header uses a scheme other than Digest
    /// (the caller should hand back the original response), and an error
    /// when it claims to be Digest but cannot be parsed.
    pub fn from_header(value: &str) -> Result<Option<Self>, Error> {
        let value = value.trim();
        let (scheme, rest) = value.split_once(char::is_whitespace).unwrap_or((value, ""));
        if !scheme.eq_ignore_ascii_case("digest") {
            return Ok(None);
        }

        let mut challenge = Self {
            realm: String::new(),
            nonce: String::new(),
            qop: None,
            algorithm: None,
            opaque: None,
        };
        let mut has_realm = false;

        for (key, val) in parse_params(rest)? {
            match key.to_ascii_lowercase().as_str() {
                "realm" => {
                    challenge.realm = val;
                    has_realm = true;
                }
                "nonce" => challenge.nonce = val,
                "qop" => challenge.qop = Some(val),
                "algorithm" => challenge.algorithm = Some(val),
                "opaque" => challenge.opaque = Some(val),
                other => trace!(param = other, "ignoring digest challenge parameter"),
            }
        }

        if !has_realm {
            return Err(Error::DigestChallenge {
                message: "challenge has no realm".into(),
            });
        }
        if challenge.nonce.is_empty() {
            return Err(Error::DigestChallenge {
                message: "challenge has no nonce".into(),
            });
        }

        Ok(Some(challenge))
    }

    /// Resolve the `qop` to answer with: `Some("auth")`, or `None` when the
    /// server did not ask for one.
    fn negotiate_qop(&self) -> Result<Option<&'static str>, Error> {
        match self.qop.as_deref() {
            None => Ok(None),
            Some(qop) if qop.split(',').any(|q| q.trim().eq_ignore_ascii_case("auth")) => {
                Ok(Some("auth"))
            }
            Some(qop) => Err(Error::UnsupportedQop(qop.to_owned())),
        }
    }
}

/// Split `key=value, key="quoted, value"` pairs. Quoted values may contain
/// commas and backslash escapes.
fn parse_params(input: &str) -> Result<Vec<(String, String)>, Error> {
    let mut params = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && *c != ',') {
            key.push(c);
        }
        let key = key.trim().to_owned();
        if chars.next() != Some('=') || key.is_empty() {
            return Err(Error::DigestChallenge {
                message: format!("expected key=value pair near {key:?}"),
            });
        }

        while chars.next_if(|c| *c == ' ' || *c == '\t').is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'"').is_some() {
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(Error::DigestChallenge {
                    message: format!("unterminated quoted value for {key:?}"),
                });
            }
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                value.push(c);
            }
            value = value.trim().to_owned();
        }

        params.push((key, value));
    }

    Ok(params)
}

// ── Authenticator ───────────────────────────────────────────────────

#[derive(Debug, Default)]
struct DigestState {
    challenge: Option<DigestChallenge>,
    last_nonce: String,
    nonce_count: u32,
}

/// Digest credentials plus the cached challenge and nonce-count.
///
/// Shared by every request of one `WindhagerClient`. State mutation is
/// confined to short critical sections (no lock is held across `.await`).
#[derive(Debug)]
pub struct DigestAuth {
    username: String,
    password: SecretString,
    state: Mutex<DigestState>,
}

impl DigestAuth {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            state: Mutex::new(DigestState::default()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether a challenge has been received (headers can be sent preemptively).
    pub fn has_challenge(&self) -> bool {
        self.lock().challenge.is_some()
    }

    /// Cache a freshly received challenge.
    pub fn set_challenge(&self, challenge: DigestChallenge) {
        debug!(realm = %challenge.realm, "storing digest challenge");
        self.lock().challenge = Some(challenge);
    }

    /// Whether the cached challenge names an algorithm we can compute.
    pub fn supports_challenge(&self) -> bool {
        self.lock()
            .challenge
            .as_ref()
            .is_some_and(|c| DigestAlgorithm::parse(c.algorithm.as_deref()).is_some())
    }

    /// Forget the cached challenge and nonce-count (session closed).
    pub fn reset(&self) {
        *self.lock() = DigestState::default();
    }

    /// Nonce-count used by the most recent `Authorization` header.
    pub fn nonce_count(&self) -> u32 {
        self.lock().nonce_count
    }

    /// Build the `Authorization` header for `method` on `uri` (path + query).
    ///
    /// Returns `Ok(None)` when no challenge is cached or the challenge uses
    /// an algorithm we do not support.
    pub fn authorization(&self, method: &str, uri: &str) -> Result<Option<String>, Error> {
        self.authorization_with_cnonce(method, uri, &new_cnonce())
    }

    pub(crate) fn authorization_with_cnonce(
        &self,
        method: &str,
        uri: &str,
        cnonce: &str,
    ) -> Result<Option<String>, Error> {
        let mut state = self.lock();
        let Some(challenge) = state.challenge.clone() else {
            return Ok(None);
        };

        let qop = challenge.negotiate_qop()?;
        let Some(algorithm) = DigestAlgorithm::parse(challenge.algorithm.as_deref()) else {
            debug!(
                algorithm = ?challenge.algorithm,
                "unsupported digest algorithm, sending request without credentials"
            );
            return Ok(None);
        };

        if challenge.nonce == state.last_nonce {
            state.nonce_count += 1;
        } else {
            state.nonce_count = 1;
            state.last_nonce.clone_from(&challenge.nonce);
        }
        let nc = format!("{:08x}", state.nonce_count);
        drop(state);

        let mut ha1 = algorithm.hash(&format!(
            "{}:{}:{}",
            self.username,
            challenge.realm,
            self.password.expose_secret()
        ));
        if algorithm == DigestAlgorithm::Md5Sess {
            ha1 = algorithm.hash(&format!("{ha1}:{}:{cnonce}", challenge.nonce));
        }
        let ha2 = algorithm.hash(&format!("{}:{uri}", method.to_ascii_uppercase()));

        let response = match qop {
            Some(qop) => algorithm.hash(&format!(
                "{ha1}:{}:{nc}:{cnonce}:{qop}:{ha2}",
                challenge.nonce
            )),
            None => algorithm.hash(&format!("{ha1}:{}:{ha2}", challenge.nonce)),
        };

        let mut header = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{uri}\", response=\"{response}\", algorithm=\"{}\"",
            self.username,
            challenge.realm,
            challenge.nonce,
            algorithm.as_str()
        );
        if let Some(ref opaque) = challenge.opaque {
            let _ = write!(header, ", opaque=\"{opaque}\"");
        }
        if let Some(qop) = qop {
            let _ = write!(header, ", qop=\"{qop}\", nc={nc}, cnonce=\"{cnonce}\"");
        }

        Ok(Some(header))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DigestState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Client nonce: 16 hex chars from a random UUID.
fn new_cnonce() -> String {
    let mut cnonce = uuid::Uuid::new_v4().simple().to_string();
    cnonce.truncate(16);
    cnonce
}
