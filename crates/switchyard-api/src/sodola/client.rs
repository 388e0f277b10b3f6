// Sodola page transport
//
// Authenticated GET/POST against device web pages. Basic credentials are
// attached when the probe established that mode; otherwise the cookie
// jar carries the form-login session. A 401/403 on any page invalidates
// the session so the next call re-runs the login dance.

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::sodola::SodolaClient;

impl SodolaClient {
    pub(crate) fn page_url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    /// Fetch a page as text. `Ok(None)` means the page does not exist on
    /// this firmware (404) -- candidate-list readers skip it and move on.
    pub(crate) async fn fetch_page(&self, path: &str) -> Result<Option<String>, Error> {
        match self.fetch_page_inner(path).await {
            Err(Error::SessionExpired) => {
                self.session.invalidate().await;
                Err(Error::SessionExpired)
            }
            other => other,
        }
    }

    /// Transport without session bookkeeping. The login flow calls this
    /// directly because it runs while the session lock is already held.
    pub(crate) async fn fetch_page_inner(&self, path: &str) -> Result<Option<String>, Error> {
        let url = self.page_url(path)?;
        debug!(%url, "sodola page fetch");

        let mut req = self.http.get(url);
        if self.uses_basic_auth() {
            req = req.basic_auth(
                &self.username,
                Some(secrecy::ExposeSecret::expose_secret(&self.password)),
            );
        }

        let resp = req.send().await.map_err(|e| self.map_transport(e))?;
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::SessionExpired);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(Error::Protocol {
                message: format!("page {path} returned HTTP {status}"),
            });
        }

        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        Ok(Some(body))
    }

    /// Submit a form to a CGI endpoint and return the response body.
    pub(crate) async fn submit_form(
        &self,
        path: &str,
        fields: &[(&str, String)],
    ) -> Result<String, Error> {
        let url = self.page_url(path)?;
        debug!(%url, "sodola form submit");

        let mut req = self.http.post(url).form(fields);
        if self.uses_basic_auth() {
            req = req.basic_auth(
                &self.username,
                Some(secrecy::ExposeSecret::expose_secret(&self.password)),
            );
        }

        let resp = req.send().await.map_err(|e| self.map_transport(e))?;
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            self.session.invalidate().await;
            return Err(Error::SessionExpired);
        }

        if !status.is_success() {
            return Err(Error::Protocol {
                message: format!("form {path} returned HTTP {status}"),
            });
        }

        resp.text().await.map_err(|e| self.map_transport(e))
    }

    /// These UIs answer HTTP 200 with an error string in the page body,
    /// so every write checks the body for rejection markers.
    pub(crate) fn check_write_response(path: &str, body: &str) -> Result<(), Error> {
        let lower = body.to_lowercase();
        for marker in ["error", "failed", "invalid parameter"] {
            if lower.contains(marker) {
                return Err(Error::Protocol {
                    message: format!("device rejected write to {path} ({marker})"),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}
