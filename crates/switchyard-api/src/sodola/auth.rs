// Sodola authentication
//
// Two-stage: try HTTP Basic first (some firmware revisions honor it),
// validated by probing the root page for authenticated-UI markers. If
// that fails, locate the HTML login form, carry its hidden fields
// verbatim, submit credentials, and validate by the absence of
// login/error markers in the response.

use secrecy::ExposeSecret;
use tracing::debug;

use crate::error::Error;
use crate::sodola::html;
use crate::sodola::SodolaClient;

/// Markers that only appear once the UI considers us logged in.
const AUTHENTICATED_MARKERS: [&str; 3] = ["logout", "menu.htm", "nav_frame"];

/// Markers that betray a login page or a rejected login.
const LOGIN_MARKERS: [&str; 4] = ["type=\"password\"", "type='password'", "login failed", "password error"];

/// Pages that may carry the login form, probed in order.
const LOGIN_PAGE_CANDIDATES: [&str; 3] = ["login.htm", "login.html", ""];

impl SodolaClient {
    /// Run the full login sequence. Callers hold the session lock.
    pub(crate) async fn login(&self) -> Result<(), Error> {
        debug!(url = %self.base_url, "sodola login");

        if self.try_basic_auth().await? {
            debug!("basic auth accepted");
            self.set_basic_auth(true);
            return Ok(());
        }

        self.set_basic_auth(false);
        self.form_login().await
    }

    /// Probe the root page with Basic credentials. `Ok(true)` means the
    /// page came back looking like the authenticated UI.
    async fn try_basic_auth(&self) -> Result<bool, Error> {
        let url = self.page_url("")?;
        let resp = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !resp.status().is_success() {
            return Ok(false);
        }

        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        let lower = body.to_lowercase();

        let authenticated = AUTHENTICATED_MARKERS.iter().any(|m| lower.contains(m))
            && !LOGIN_MARKERS.iter().any(|m| lower.contains(m));
        Ok(authenticated)
    }

    /// Locate and submit the HTML login form.
    async fn form_login(&self) -> Result<(), Error> {
        // Find a page that actually carries the form.
        let mut found: Option<(String, html::LoginForm)> = None;
        for page in LOGIN_PAGE_CANDIDATES {
            match self.fetch_page_inner(page).await {
                Ok(Some(body)) => {
                    if let Some(form) = html::find_login_form(&body) {
                        found = Some((page.to_owned(), form));
                        break;
                    }
                }
                Ok(None) => {}
                Err(Error::SessionExpired) => {
                    // The login page itself 401'd: Basic is the only
                    // option and it was already rejected.
                    return Err(Error::Authentication {
                        message: "credentials rejected by basic auth, no login form offered"
                            .into(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let Some((page, form)) = found else {
            return Err(Error::Authentication {
                message: "no login form found on any candidate page".into(),
            });
        };

        let action = form.action.clone().unwrap_or(page);
        debug!(action, "submitting login form");

        let mut fields: Vec<(&str, String)> = Vec::new();
        for (name, value) in &form.hidden {
            fields.push((name.as_str(), value.clone()));
        }
        fields.push((form.user_field.as_str(), self.username.clone()));
        fields.push((
            form.pass_field.as_str(),
            self.password.expose_secret().to_owned(),
        ));

        let url = self.page_url(&action)?;
        let resp = self
            .http
            .post(url)
            .form(&fields)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("login form rejected (HTTP {status})"),
            });
        }

        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        let lower = body.to_lowercase();

        // Success is the absence of login/error markers: the device
        // redirects to (or renders) the main UI on a good login.
        if LOGIN_MARKERS.iter().any(|m| lower.contains(m)) {
            return Err(Error::Authentication {
                message: "login page re-rendered after submit (credentials rejected)".into(),
            });
        }

        debug!("form login accepted");
        Ok(())
    }
}
