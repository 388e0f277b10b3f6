use thiserror::Error;

/// Top-level error type for the `switchyard-api` crate.
///
/// Covers every failure mode a device client can hit: authentication,
/// transport, vendor protocol errors, and response decoding.
/// `switchyard-core` maps these into its own domain taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, login verification timed out, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Session has expired or was invalidated by a 401/403 response.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Vendor protocol ─────────────────────────────────────────────
    /// The device accepted the request but rejected the operation
    /// (nonzero status code in a Vimins envelope, error marker in a
    /// Sodola page, unsupported command, ...).
    #[error("Device protocol error: {message}")]
    Protocol { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Response decoding failed, with a body preview for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates auth has expired
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::SessionExpired)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Build a deserialization error carrying a bounded body preview.
    pub(crate) fn decode(err: impl std::fmt::Display, body: &str) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    }
}
