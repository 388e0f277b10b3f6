// Vimins command transport
//
// URL construction, form encoding, and envelope parsing. Every endpoint
// file builds on `get_command` / `post_command`; nothing outside this
// module touches the wire format.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::vimins::ViminsClient;

/// Wire envelope: `{"code": 0, "msg": "ok", "data": {...}}`.
/// A nonzero `code` is a vendor-level rejection.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    msg: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

impl ViminsClient {
    /// Build the read URL for a named command: `{base}/cgi/get?cmd={cmd}`.
    fn command_url(&self, cmd: &str) -> Result<Url, Error> {
        let mut url = self.base_url.join("cgi/get")?;
        url.query_pairs_mut().append_pair("cmd", cmd);
        Ok(url)
    }

    /// The single write endpoint: `{base}/cgi/set` (command in the body).
    fn set_url(&self) -> Result<Url, Error> {
        self.base_url.join("cgi/set").map_err(Error::InvalidUrl)
    }

    /// Execute a read command and return the envelope's `data`.
    pub(crate) async fn get_command(&self, cmd: &str) -> Result<serde_json::Value, Error> {
        let url = self.command_url(cmd)?;
        debug!(cmd, "vimins read");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        self.parse_envelope(resp).await
    }

    /// Execute a write command as a form-encoded POST.
    pub(crate) async fn post_command(
        &self,
        cmd: &str,
        fields: &[(&str, String)],
    ) -> Result<serde_json::Value, Error> {
        let url = self.set_url()?;
        debug!(cmd, "vimins write");

        let mut form: Vec<(&str, String)> = vec![("cmd", cmd.to_owned())];
        form.extend(fields.iter().map(|(k, v)| (*k, v.clone())));

        let resp = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        self.parse_envelope(resp).await
    }

    /// Map a reqwest error, folding timeouts into the typed variant.
    pub(crate) fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Check the HTTP status, then the envelope code.
    ///
    /// 401/403 invalidate the session before surfacing, so the next call
    /// through `ensure_session` logs in again.
    async fn parse_envelope(&self, resp: reqwest::Response) -> Result<serde_json::Value, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            self.session.invalidate().await;
            return Err(Error::SessionExpired);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(Error::Protocol {
                message: format!("HTTP {status}: {preview}"),
            });
        }

        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|e| Error::decode(e, &body))?;

        if envelope.code != 0 {
            return Err(Error::Protocol {
                message: envelope
                    .msg
                    .unwrap_or_else(|| format!("device returned code {}", envelope.code)),
            });
        }

        Ok(envelope.data)
    }
}
