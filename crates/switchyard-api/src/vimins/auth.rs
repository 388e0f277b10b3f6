// Vimins authentication
//
// Login is a three-step handshake: fetch login metadata, submit
// credentials, then poll a status command until the device reports the
// session live -- the firmware completes login asynchronously, so the
// submit response alone proves nothing.
//
// The steps here use raw requests instead of `get_command`/`post_command`
// because those invalidate the session guard on 401, and login runs while
// the caller already holds the guard's lock.

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::debug;

use crate::error::Error;
use crate::vimins::ViminsClient;

/// How many times to poll `login_status` before giving up.
const LOGIN_POLL_ATTEMPTS: u32 = 5;
/// Fixed backoff between polls.
const LOGIN_POLL_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    code: i64,
    msg: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct LoginInfo {
    /// Some firmware revisions hand out a nonce the credential submit
    /// must echo back. Absent on older revisions.
    nonce: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginStatus {
    status: Option<String>,
}

impl ViminsClient {
    /// Run the full login handshake. Callers hold the session lock.
    pub(crate) async fn login(&self) -> Result<(), Error> {
        debug!(url = %self.base_url, "vimins login");

        // Step 1: login metadata.
        let info: LoginInfo = match self.auth_get("login_info").await {
            Ok(data) => serde_json::from_value(data).unwrap_or_default(),
            Err(e) => {
                return Err(Error::Authentication {
                    message: format!("login metadata fetch failed: {e}"),
                });
            }
        };

        // Step 2: submit credentials.
        let mut form: Vec<(&str, String)> = vec![
            ("cmd", "login".to_owned()),
            ("username", self.username.clone()),
            ("password", self.password.expose_secret().to_owned()),
        ];
        if let Some(nonce) = info.nonce {
            form.push(("nonce", nonce));
        }
        self.auth_post(&form).await?;

        // Step 3: poll until the device reports the session live.
        for attempt in 1..=LOGIN_POLL_ATTEMPTS {
            let data = self.auth_get("login_status").await?;
            let status: LoginStatus = serde_json::from_value(data).unwrap_or(LoginStatus {
                status: None,
            });

            if status.status.as_deref() == Some("ok") {
                debug!(attempt, "vimins login verified");
                return Ok(());
            }

            debug!(attempt, "login not yet confirmed");
            if attempt < LOGIN_POLL_ATTEMPTS {
                tokio::time::sleep(LOGIN_POLL_DELAY).await;
            }
        }

        Err(Error::Authentication {
            message: format!(
                "login not confirmed after {LOGIN_POLL_ATTEMPTS} status polls"
            ),
        })
    }

    /// Raw read command for the auth flow. 401/403 map straight to
    /// `Authentication` (there is no session to invalidate yet).
    async fn auth_get(&self, cmd: &str) -> Result<serde_json::Value, Error> {
        let mut url = self.base_url.join("cgi/get")?;
        url.query_pairs_mut().append_pair("cmd", cmd);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        Self::parse_auth_envelope(resp).await
    }

    /// Raw write for the auth flow.
    async fn auth_post(&self, form: &[(&str, String)]) -> Result<serde_json::Value, Error> {
        let url = self.base_url.join("cgi/set")?;

        let resp = self
            .http
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        Self::parse_auth_envelope(resp).await
    }

    async fn parse_auth_envelope(resp: reqwest::Response) -> Result<serde_json::Value, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("credentials rejected (HTTP {status})"),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(Error::Authentication {
                message: format!("login endpoint returned HTTP {status}: {preview}"),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let envelope: LoginEnvelope =
            serde_json::from_str(&body).map_err(|e| Error::decode(e, &body))?;

        if envelope.code != 0 {
            return Err(Error::Authentication {
                message: envelope
                    .msg
                    .unwrap_or_else(|| format!("login rejected with code {}", envelope.code)),
            });
        }

        Ok(envelope.data)
    }
}
