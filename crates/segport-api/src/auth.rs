// Session authentication
//
// Form-encoded login against `/api/session/create`. The response carries a
// `SESSIONID` cookie and an `X-XSRF-TOKEN` header; both are replayed on
// every later request. Credentials are swapped in whole after each login,
// so readers see either the old pair or the new pair, never a mix.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwapOption;
use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;

/// Login endpoint, relative to the manager root.
pub const LOGIN_PATH: &str = "/api/session/create";

/// Anti-forgery header, both on the login response and on every request.
pub const XSRF_TOKEN_HEADER: &str = "X-XSRF-TOKEN";

/// `SESSIONID=...;` (also matches the `JSESSIONID` spelling). The name must
/// start a cookie, so `NSXSESSIONID=...;` is not mistaken for it.
static SESSION_COOKIE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[;\s])(J?SESSIONID=[^;]*;)").expect("session cookie pattern")
});

// ── Header matching ──────────────────────────────────────────────────

/// Values of every header whose name equals `name` ignoring ASCII case,
/// in the order the server sent them.
///
/// A value that is not visible ASCII is an [`Error::Authentication`]:
/// the login response is the only place these headers are read.
pub fn header_values<'a>(
    headers: &'a HeaderMap,
    name: &'a str,
) -> impl Iterator<Item = Result<&'a str, Error>> + 'a {
    headers
        .iter()
        .filter(move |(key, _)| key.as_str().eq_ignore_ascii_case(name))
        .map(move |(_, value)| {
            value.to_str().map_err(|_| Error::Authentication {
                status: None,
                message: format!("malformed {name} header in login response"),
            })
        })
}

/// First value of the header called `name` (case-insensitive).
pub fn find_header<'a>(headers: &'a HeaderMap, name: &'a str) -> Result<Option<&'a str>, Error> {
    header_values(headers, name).next().transpose()
}

/// The first `SESSIONID=...;` fragment across all `Set-Cookie` headers.
pub fn extract_session_cookie(headers: &HeaderMap) -> Result<Option<String>, Error> {
    for value in header_values(headers, SET_COOKIE.as_str()) {
        if let Some(found) = SESSION_COOKIE.captures(value?).and_then(|c| c.get(1)) {
            return Ok(Some(found.as_str().to_owned()));
        }
    }
    Ok(None)
}

/// The literal `X-XSRF-TOKEN` header value.
pub fn extract_xsrf_token(headers: &HeaderMap) -> Result<Option<String>, Error> {
    Ok(find_header(headers, XSRF_TOKEN_HEADER)?.map(str::to_owned))
}

// ── Credentials ──────────────────────────────────────────────────────

/// Token and cookie captured from one login exchange.
///
/// Either part may be empty if the server omitted it; requests then go out
/// without it and the server answers 401/403.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    xsrf_token: String,
    cookie: String,
}

impl SessionCredentials {
    pub fn new(xsrf_token: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            xsrf_token: xsrf_token.into(),
            cookie: cookie.into(),
        }
    }

    /// Pull both artifacts out of a login response's headers.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, Error> {
        Ok(Self {
            xsrf_token: extract_xsrf_token(headers)?.unwrap_or_default(),
            cookie: extract_session_cookie(headers)?.unwrap_or_default(),
        })
    }

    pub fn xsrf_token(&self) -> &str {
        &self.xsrf_token
    }

    /// The `SESSIONID=...;` fragment, sent verbatim as the `Cookie` header.
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    /// Both the token and the cookie were found.
    pub fn is_complete(&self) -> bool {
        !self.xsrf_token.is_empty() && !self.cookie.is_empty()
    }

    /// Write the `X-XSRF-TOKEN` and `Cookie` headers, skipping empty parts.
    pub(crate) fn apply(&self, headers: &mut HeaderMap) -> Result<(), Error> {
        if !self.xsrf_token.is_empty() {
            headers.insert(XSRF_TOKEN_HEADER, sensitive(&self.xsrf_token)?);
        }
        if !self.cookie.is_empty() {
            headers.insert(COOKIE, sensitive(&self.cookie)?);
        }
        Ok(())
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("xsrf_token", &"[REDACTED]")
            .field("cookie", &"[REDACTED]")
            .finish()
    }
}

fn sensitive(value: &str) -> Result<HeaderValue, Error> {
    let mut header = HeaderValue::from_str(value).map_err(|e| Error::Authentication {
        status: None,
        message: format!("credential is not a valid header value: {e}"),
    })?;
    header.set_sensitive(true);
    Ok(header)
}

// ── Session ──────────────────────────────────────────────────────────

/// An authenticated (or not yet authenticated) connection to one manager.
///
/// Owns the HTTP transport and the current credential pair. Reads of the
/// credentials are lock-free; logins are serialized by an async mutex so
/// two re-authentications never race.
pub struct Session {
    base_url: Url,
    http: reqwest::Client,
    credentials: ArcSwapOption<SessionCredentials>,
    login_lock: Mutex<()>,
}

impl Session {
    /// Create an unauthenticated session.
    pub fn new(base_url: Url, http: reqwest::Client) -> Self {
        Self {
            base_url,
            http,
            credentials: ArcSwapOption::empty(),
            login_lock: Mutex::new(()),
        }
    }

    /// The manager base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Current credentials, or `None` before the first successful login.
    pub fn credentials(&self) -> Option<Arc<SessionCredentials>> {
        self.credentials.load_full()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.load().is_some()
    }

    /// Log in with username/password and store the resulting credentials.
    ///
    /// `POST /api/session/create` with form fields `j_username` and
    /// `j_password`. Any status other than 200 fails with
    /// [`Error::Authentication`] and leaves the previous credentials in place.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Arc<SessionCredentials>, Error> {
        let _guard = self.login_lock.lock().await;

        let url = self.base_url.join(LOGIN_PATH)?;
        debug!("logging in at {}", url);

        let resp = self
            .http
            .post(url)
            .header(reqwest::header::USER_AGENT, crate::transport::USER_AGENT)
            .form(&[
                ("j_username", username),
                ("j_password", password.expose_secret()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "login rejected");
            return Err(Error::Authentication {
                status: Some(status.as_u16()),
                message: format!(
                    "login failed (HTTP {status}): {}",
                    crate::error::preview(&body)
                ),
            });
        }

        let credentials = SessionCredentials::from_headers(resp.headers()).map_err(|e| match e {
            Error::Authentication { message, .. } => Error::Authentication {
                status: Some(status.as_u16()),
                message,
            },
            other => other,
        })?;

        if !credentials.is_complete() {
            warn!(
                has_token = !credentials.xsrf_token.is_empty(),
                has_cookie = !credentials.cookie.is_empty(),
                "login succeeded without a full credential pair"
            );
        }

        let credentials = Arc::new(credentials);
        self.credentials.store(Some(Arc::clone(&credentials)));
        debug!("login successful");
        Ok(credentials)
    }

    /// Stamp the current credentials onto outgoing request headers.
    pub(crate) fn apply_credentials(&self, headers: &mut HeaderMap) -> Result<(), Error> {
        match self.credentials.load().as_deref() {
            Some(credentials) => credentials.apply(headers),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::header::HeaderName;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn extracts_cookie_and_token() {
        let map = headers(&[
            ("Set-Cookie", "SESSIONID=abc123; Path=/"),
            ("X-XSRF-TOKEN", "tok456"),
        ]);
        let creds = SessionCredentials::from_headers(&map).unwrap();
        assert_eq!(creds.cookie(), "SESSIONID=abc123;");
        assert_eq!(creds.xsrf_token(), "tok456");
        assert!(creds.is_complete());
    }

    #[test]
    fn header_names_match_case_insensitively() {
        let map = headers(&[("x-xsrf-token", "lower"), ("set-cookie", "JSESSIONID=j1; Secure")]);
        assert_eq!(extract_xsrf_token(&map).unwrap().as_deref(), Some("lower"));
        assert_eq!(
            extract_session_cookie(&map).unwrap().as_deref(),
            Some("JSESSIONID=j1;")
        );
    }

    #[test]
    fn first_matching_set_cookie_wins() {
        let map = headers(&[
            ("Set-Cookie", "theme=dark; Path=/"),
            ("Set-Cookie", "SESSIONID=first; Path=/"),
            ("Set-Cookie", "SESSIONID=second; Path=/"),
        ]);
        assert_eq!(
            extract_session_cookie(&map).unwrap().as_deref(),
            Some("SESSIONID=first;")
        );
    }

    #[test]
    fn session_cookie_name_must_start_a_cookie() {
        let map = headers(&[
            ("Set-Cookie", "NSXSESSIONID=wrong; Path=/"),
            ("Set-Cookie", "lang=en; SESSIONID=right; Path=/"),
        ]);
        assert_eq!(
            extract_session_cookie(&map).unwrap().as_deref(),
            Some("SESSIONID=right;")
        );

        let only_suffix = headers(&[("Set-Cookie", "XSESSIONID=x;")]);
        assert_eq!(extract_session_cookie(&only_suffix).unwrap(), None);
    }

    #[test]
    fn cookie_without_terminator_is_ignored() {
        let map = headers(&[("Set-Cookie", "SESSIONID=abc")]);
        assert_eq!(extract_session_cookie(&map).unwrap(), None);
    }

    #[test]
    fn missing_artifacts_degrade_to_incomplete_credentials() {
        let creds = SessionCredentials::from_headers(&HeaderMap::new()).unwrap();
        assert_eq!(creds.cookie(), "");
        assert_eq!(creds.xsrf_token(), "");
        assert!(!creds.is_complete());
    }

    #[test]
    fn malformed_token_header_is_an_auth_error() {
        let mut map = HeaderMap::new();
        map.insert(
            XSRF_TOKEN_HEADER,
            HeaderValue::from_bytes(b"tok\xffen").unwrap(),
        );
        assert!(matches!(
            extract_xsrf_token(&map),
            Err(Error::Authentication { .. })
        ));
    }

    #[test]
    fn apply_skips_empty_parts() {
        let mut map = HeaderMap::new();
        SessionCredentials::new("tok", "").apply(&mut map).unwrap();
        assert_eq!(map.get(XSRF_TOKEN_HEADER).unwrap().to_str().unwrap(), "tok");
        assert!(map.get(COOKIE).is_none());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", SessionCredentials::new("sekrit", "SESSIONID=x;"));
        assert!(!rendered.contains("sekrit"));
        assert!(!rendered.contains("SESSIONID"));
    }
}
