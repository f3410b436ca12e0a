// ── Runtime controller configuration ──
//
// Describes *how* to reach one appliance. Built by the CLI from a config
// profile plus flag overrides; the core never reads files itself.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Account name the appliance's web interface uses for digest auth.
pub const DEFAULT_USERNAME: &str = "USER";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default envelope around one whole poll cycle.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(20);

/// Default interval between background refreshes.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// Configuration for connecting to an appliance.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Base URL, e.g. `http://192.168.1.20`.
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Upper bound on one refresh (discovery plus every OID read).
    pub poll_timeout: Duration,
    /// Background refresh interval. 0 disables the refresh task.
    pub refresh_interval_secs: u64,
    pub accept_invalid_certs: bool,
}

impl ControllerConfig {
    /// Config with default credentials and timings for `url`.
    pub fn new(url: Url, password: SecretString) -> Self {
        Self {
            url,
            username: DEFAULT_USERNAME.to_owned(),
            password,
            timeout: DEFAULT_TIMEOUT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            accept_invalid_certs: false,
        }
    }

    /// Host label used to derive descriptor ids: `host` or `host:port`.
    pub fn host_label(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(url: &str) -> ControllerConfig {
        ControllerConfig::new(Url::parse(url).unwrap(), SecretString::from("pw".to_string()))
    }

    #[test]
    fn defaults() {
        let cfg = config("http://192.168.1.20");
        assert_eq!(cfg.username, "USER");
        assert_eq!(cfg.poll_timeout, Duration::from_secs(20));
        assert_eq!(cfg.refresh_interval_secs, 30);
    }

    #[test]
    fn host_label_keeps_explicit_port() {
        assert_eq!(config("http://192.168.1.20/").host_label(), "192.168.1.20");
        assert_eq!(config("http://127.0.0.1:8080").host_label(), "127.0.0.1:8080");
    }
}
