// Segment port HTTP client
//
// Wraps a `Session` with request stamping (editors, credentials, content
// type, user agent) and response decoding. Endpoint methods live in
// `ports.rs` as inherent methods to keep this module about transport.

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue, USER_AGENT};
use reqwest::{Method, Request, StatusCode};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{Session, SessionCredentials};
use crate::error::{Error, preview};
use crate::transport::{self, TransportConfig};

/// Policy API root under which all infra objects live.
pub(crate) const POLICY_API_ROOT: [&str; 3] = ["policy", "api", "v1"];

/// Callback run on every request before the session headers are attached.
pub type RequestEditor = Arc<dyn Fn(&mut Request) -> Result<(), Error> + Send + Sync>;

/// Async client for NSX policy segment ports.
///
/// Owns a single [`Session`]; every request is stamped with its current
/// `X-XSRF-TOKEN` and session cookie.
pub struct SegmentPortClient {
    session: Session,
    editors: Vec<RequestEditor>,
}

impl SegmentPortClient {
    /// Normalize `endpoint`, build the transport and log in.
    pub async fn connect(
        endpoint: &str,
        username: &str,
        password: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = transport.normalize_endpoint(endpoint)?;
        let client = Self::new(base_url, transport)?;
        client.authenticate(username, password).await?;
        Ok(client)
    }

    /// Create an unauthenticated client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create an unauthenticated client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            session: Session::new(base_url, http),
            editors: Vec::new(),
        }
    }

    /// Add a request editor. Editors run in insertion order.
    pub fn with_request_editor(mut self, editor: RequestEditor) -> Self {
        self.editors.push(editor);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        self.session.base_url()
    }

    /// Run (or re-run) the login exchange.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Arc<SessionCredentials>, Error> {
        self.session.authenticate(username, password).await
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/policy/api/v1/infra/segments/{segment_id}/ports[/{port_id}]`
    ///
    /// Identifiers are pushed as single path segments, so they are
    /// percent-escaped but never interpreted.
    pub(crate) fn ports_url(&self, segment_id: &str, port_id: Option<&str>) -> Result<Url, Error> {
        require("segment_id", segment_id)?;
        if let Some(port_id) = port_id {
            require("port_id", port_id)?;
        }

        let mut url = self.session.base_url().clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut segments = url.path_segments_mut().map_err(|()| Error::InvalidInput {
                message: format!("endpoint '{}' cannot carry a path", self.base_url()),
            })?;
            segments.clear();
            segments.extend(POLICY_API_ROOT);
            segments.extend(["infra", "segments", segment_id, "ports"]);
            if let Some(port_id) = port_id {
                segments.push(port_id);
            }
        }
        Ok(url)
    }

    // ── Request construction ─────────────────────────────────────────

    /// Build a fully stamped request.
    ///
    /// Order: editors, then `Accept`/`User-Agent`, then the session
    /// credentials (overriding anything an editor set), then
    /// `Content-Type: application/json` on writes unless already present.
    pub fn build_request(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Request, Error> {
        let is_write = matches!(method, Method::PATCH | Method::PUT | Method::POST | Method::DELETE);

        let mut request = Request::new(method, url);
        if let Some(body) = body {
            *request.body_mut() = Some(body.into());
        }

        for editor in &self.editors {
            editor(&mut request)?;
        }

        let headers = request.headers_mut();
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(transport::USER_AGENT));
        self.session.apply_credentials(headers)?;
        if is_write && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(request)
    }

    // ── Execution ────────────────────────────────────────────────────

    /// Send a request and return its status and body text.
    pub(crate) async fn execute(&self, request: Request) -> Result<(StatusCode, String), Error> {
        debug!("{} {}", request.method(), request.url());

        let resp = self.session.http().execute(request).await?;
        let status = resp.status();
        let body = resp.text().await?;

        trace!(status = status.as_u16(), body = preview(&body), "response");
        Ok((status, body))
    }
}

fn require(name: &str, value: &str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::InvalidInput {
            message: format!("{name} must not be empty"),
        });
    }
    Ok(())
}

// ── Response mapping ─────────────────────────────────────────────────

/// Map a raw response onto `T`.
///
/// Success is exactly HTTP 200; anything else is [`Error::Api`] carrying the
/// status and raw body. The caller decides what a 404 means.
pub fn decode<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, Error> {
    if status != StatusCode::OK {
        return Err(Error::Api {
            status: status.as_u16(),
            body: body.to_owned(),
        });
    }

    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::SegmentPortList;

    fn client(base: &str) -> SegmentPortClient {
        SegmentPortClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn ports_url_resolves_collection_and_item() {
        let c = client("https://nsx.lab/ignored/prefix?x=1");
        assert_eq!(
            c.ports_url("seg-a", None).unwrap().as_str(),
            "https://nsx.lab/policy/api/v1/infra/segments/seg-a/ports"
        );
        assert_eq!(
            c.ports_url("seg-a", Some("p1")).unwrap().as_str(),
            "https://nsx.lab/policy/api/v1/infra/segments/seg-a/ports/p1"
        );
    }

    #[test]
    fn ports_url_escapes_but_does_not_interpret_identifiers() {
        let c = client("https://nsx.lab");
        let url = c.ports_url("seg a", Some("x/y")).unwrap();
        assert_eq!(
            url.path(),
            "/policy/api/v1/infra/segments/seg%20a/ports/x%2Fy"
        );
    }

    #[test]
    fn empty_identifiers_are_invalid_input() {
        let c = client("https://nsx.lab");
        assert!(matches!(
            c.ports_url("", None),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            c.ports_url("seg", Some("")),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn write_requests_default_to_json_content_type() {
        let c = client("https://nsx.lab");
        let url = c.ports_url("seg", Some("p")).unwrap();
        let req = c.build_request(Method::PATCH, url, Some(b"{}".to_vec())).unwrap();
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(req.headers()[USER_AGENT], transport::USER_AGENT);
    }

    #[test]
    fn editor_content_type_is_preserved() {
        let editor: RequestEditor = Arc::new(|req: &mut Request| {
            req.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/merge-patch+json"),
            );
            Ok(())
        });
        let c = client("https://nsx.lab").with_request_editor(editor);
        let url = c.ports_url("seg", Some("p")).unwrap();
        let req = c.build_request(Method::PATCH, url, None).unwrap();
        assert_eq!(req.headers()[CONTENT_TYPE], "application/merge-patch+json");
    }

    #[test]
    fn reads_carry_no_content_type_and_no_credentials_before_login() {
        let c = client("https://nsx.lab");
        let url = c.ports_url("seg", None).unwrap();
        let req = c.build_request(Method::GET, url, None).unwrap();
        assert!(!req.headers().contains_key(CONTENT_TYPE));
        assert!(!req.headers().contains_key("x-xsrf-token"));
        assert!(!req.headers().contains_key(reqwest::header::COOKIE));
    }

    #[test]
    fn editor_errors_abort_the_request() {
        let editor: RequestEditor = Arc::new(|_: &mut Request| {
            Err(Error::InvalidInput {
                message: "blocked".into(),
            })
        });
        let c = client("https://nsx.lab").with_request_editor(editor);
        let url = c.ports_url("seg", None).unwrap();
        assert!(c.build_request(Method::GET, url, None).is_err());
    }

    #[test]
    fn decode_maps_status_codes() {
        let not_found = decode::<SegmentPortList>(StatusCode::NOT_FOUND, "missing").unwrap_err();
        assert!(matches!(not_found, Error::Api { status: 404, .. }));

        let server = decode::<SegmentPortList>(StatusCode::INTERNAL_SERVER_ERROR, "boom")
            .unwrap_err();
        match server {
            Error::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected Api error, got: {other:?}"),
        }

        let created = decode::<SegmentPortList>(StatusCode::CREATED, "{}").unwrap_err();
        assert!(matches!(created, Error::Api { status: 201, .. }));
    }

    #[test]
    fn decode_reports_malformed_json_with_body() {
        let err = decode::<SegmentPortList>(StatusCode::OK, "{not json").unwrap_err();
        match err {
            Error::Deserialization { message, body } => {
                assert!(message.contains("body preview"));
                assert_eq!(body, "{not json");
            }
            other => panic!("expected Deserialization error, got: {other:?}"),
        }
    }
}
