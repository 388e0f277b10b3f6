// Shared transport configuration for building reqwest::Client instances.
//
// Both vendor clients share timeout and cookie settings through this
// module. Embedded switch web servers present self-signed certificates
// when they do TLS at all, so invalid certs are always tolerated.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

use crate::error::Error;

/// Shared transport configuration for building HTTP clients.
///
/// The timeout is per device, not global: every request issued through
/// the resulting client fails on its own after `timeout`, which is what
/// bounds a slow device inside a multi-target fan-out.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Config with the given per-device timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            cookie_jar: None,
        }
    }

    /// Create a config with a fresh cookie jar (for session-cookie auth).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(true)
            .user_agent("switchyard/0.1.0");

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder.build().map_err(Error::Transport)
    }
}
