// Transport configuration for building the reqwest::Client.
//
// TLS policy, timeout and endpoint normalization live here so the session
// and request code never touch builder details.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::Error;

/// Fixed tool identifier sent as `User-Agent` on every request.
///
/// Stamped per request (login and [`build_request`]) rather than on the
/// reqwest builder, so clients handed in through `with_client` send it too.
///
/// [`build_request`]: crate::SegmentPortClient::build_request
pub const USER_AGENT: &str = concat!("segport/", env!("CARGO_PKG_VERSION"));

/// Transport security policy. Callers pick exactly one.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// HTTPS, but accept any certificate (self-signed managers).
    DangerAcceptInvalid,
    /// Unencrypted HTTP by default; certificates are not verified if the
    /// endpoint names `https://` explicitly.
    Plaintext,
}

impl TlsMode {
    /// Scheme prepended to endpoints given without one.
    pub fn default_scheme(&self) -> &'static str {
        match self {
            Self::Plaintext => "http",
            Self::System | Self::CustomCa(_) | Self::DangerAcceptInvalid => "https",
        }
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Whole-request deadline enforced by the transport.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid | TlsMode::Plaintext => {
                debug!("certificate verification disabled");
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Parse a manager endpoint, adding the policy's default scheme when the
    /// caller gave a bare `host[:port]`.
    pub fn normalize_endpoint(&self, raw: &str) -> Result<Url, Error> {
        normalize_endpoint(raw, &self.tls)
    }
}

/// Parse `raw` into a base URL.
///
/// `nsx.example.com` becomes `https://nsx.example.com/` (or `http://` under
/// [`TlsMode::Plaintext`]); an explicit scheme is kept as given.
pub fn normalize_endpoint(raw: &str, tls: &TlsMode) -> Result<Url, Error> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::InvalidInput {
            message: "endpoint must not be empty".into(),
        });
    }

    let url = if raw.contains("://") {
        Url::parse(raw)?
    } else {
        let scheme = tls.default_scheme();
        debug!(scheme, "endpoint has no scheme, using default");
        Url::parse(&format!("{scheme}://{raw}"))?
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidInput {
            message: format!("unsupported endpoint scheme '{}'", url.scheme()),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidInput {
            message: format!("endpoint '{raw}' has no host"),
        });
    }

    Ok(url)
}
