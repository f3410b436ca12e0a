// Lookup API HTTP client
//
// Wraps `reqwest::Client` with Windhager URL construction, the digest
// challenge/retry dance, and JSON decoding. The underlying HTTP client is
// created lazily on first use and released by `close()`.

use std::sync::{Mutex, PoisonError};

use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::digest::{DigestAuth, DigestChallenge};
use crate::error::Error;
use crate::models::{DatapointWrite, NodeDevice};
use crate::transport::TransportConfig;

/// Path of the root device list, relative to the lookup endpoint.
pub const ROOT_PATH: &str = "/1";

/// Raw HTTP client for the appliance's `/api/1.0` surface.
///
/// Every request goes through digest authentication: the first request is
/// sent bare, a `WWW-Authenticate: Digest` challenge is cached, and the
/// request is replayed once with credentials. Later requests carry the
/// `Authorization` header preemptively.
pub struct WindhagerClient {
    base_url: Url,
    transport: TransportConfig,
    http: Mutex<Option<reqwest::Client>>,
    auth: DigestAuth,
}

impl WindhagerClient {
    /// Create a client for the appliance at `base_url` (e.g. `http://192.168.1.20`).
    ///
    /// No connection is made until the first request.
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Self {
        Self {
            base_url,
            transport: transport.clone(),
            http: Mutex::new(None),
            auth: DigestAuth::new(username, password),
        }
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            base_url,
            transport: TransportConfig::default(),
            http: Mutex::new(Some(http)),
            auth: DigestAuth::new(username, password),
        }
    }

    /// The appliance base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The digest authenticator (exposed for nonce-count inspection).
    pub fn auth(&self) -> &DigestAuth {
        &self.auth
    }

    /// Whether an HTTP session is currently held.
    pub fn is_open(&self) -> bool {
        self.http_slot().is_some()
    }

    /// Release the HTTP session and forget the cached digest challenge.
    /// The next request opens a fresh session.
    pub fn close(&self) {
        if self.http_slot().take().is_some() {
            debug!(base_url = %self.base_url, "closed HTTP session");
        }
        self.auth.reset();
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/1.0/lookup/1` -- every node on the appliance bus.
    pub async fn devices(&self) -> Result<Vec<NodeDevice>, Error> {
        self.lookup(ROOT_PATH).await
    }

    /// `GET /api/1.0/lookup{path}` decoded into `T`.
    pub async fn lookup<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.lookup_url(path)?;
        let resp = self.request(Method::GET, url, None::<&()>).await?;
        let resp = check_status(resp).await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(path, body = %body, "lookup response");

        serde_json::from_str(&body).map_err(|e| {
            let preview = body.chars().take(200).collect::<String>();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    /// `PUT /api/1.0/datapoint` with `{"OID": oid, "value": value}`.
    ///
    /// The response body is not consumed; read the point back with a
    /// fresh lookup to observe the effect.
    pub async fn write_datapoint(&self, oid: &str, value: &str) -> Result<(), Error> {
        let url = self.api_url("datapoint")?;
        let body = DatapointWrite { oid, value };
        let resp = self.request(Method::PUT, url, Some(&body)).await?;
        check_status(resp).await?;
        debug!(oid, value, "datapoint written");
        Ok(())
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/1.0/{path}`
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/1.0/{path}"))?)
    }

    /// `{base}/api/1.0/lookup{path}` -- `path` starts with `/`.
    pub(crate) fn lookup_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/1.0/lookup{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a request, answering a digest challenge with exactly one retry.
    ///
    /// Returns the final response whatever its status; callers decide how
    /// to treat non-success codes.
    async fn request<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error> {
        let http = self.http()?;
        debug!("{method} {url}");

        let resp = self.send(&http, &method, &url, body).await?;
        let Some(challenge) = digest_challenge(&resp)? else {
            return Ok(resp);
        };

        let stale = self.auth.has_challenge();
        self.auth.set_challenge(challenge);

        if !self.auth.supports_challenge() {
            // Unsupported algorithm: hand back the unauthenticated failure.
            return Ok(resp);
        }
        debug!(stale, "digest challenge received, retrying {method} {url}");

        let retry = self.send(&http, &method, &url, body).await?;
        if let Some(challenge) = digest_challenge(&retry)? {
            // Keep the newest nonce for the next call, but never loop.
            self.auth.set_challenge(challenge);
        }
        Ok(retry)
    }

    async fn send<B: Serialize + Sync + ?Sized>(
        &self,
        http: &reqwest::Client,
        method: &Method,
        url: &Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error> {
        let mut builder = http.request(method.clone(), url.clone());
        if let Some(header) = self.auth.authorization(method.as_str(), &request_uri(url))? {
            builder = builder.header(AUTHORIZATION, header);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder.send().await.map_err(Error::Transport)
    }

    /// The lazily created HTTP client (cheap `Arc` clone).
    fn http(&self) -> Result<reqwest::Client, Error> {
        let mut slot = self.http_slot();
        if let Some(ref http) = *slot {
            return Ok(http.clone());
        }
        debug!(base_url = %self.base_url, "opening HTTP session");
        let http = self.transport.build_client()?;
        *slot = Some(http.clone());
        Ok(http)
    }

    fn http_slot(&self) -> std::sync::MutexGuard<'_, Option<reqwest::Client>> {
        self.http.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Extract a digest challenge from a 4xx response, if it carries one.
fn digest_challenge(resp: &reqwest::Response) -> Result<Option<DigestChallenge>, Error> {
    if !resp.status().is_client_error() {
        return Ok(None);
    }
    let Some(header) = resp
        .headers()
        .get(WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok())
    else {
        return Ok(None);
    };
    DigestChallenge::from_header(header)
}

/// Map non-success statuses to errors, keeping 401 distinct so callers can
/// tell bad credentials from an unreachable or misbehaving appliance.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "credentials rejected by appliance (HTTP 401)".into(),
        });
    }

    let body = resp.text().await.unwrap_or_default();
    Err(Error::Http {
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}

/// The digest `uri` directive: path plus query string.
fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_owned(),
    }
}
