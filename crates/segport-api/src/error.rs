use thiserror::Error;

/// Top-level error type for the `segport-api` crate.
///
/// Covers every failure mode of the segment port client: input
/// validation, session login, remote status codes, transport and decoding.
/// `segport-core` maps these into caller-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Input ───────────────────────────────────────────────────────
    /// A required identifier was empty or the endpoint could not be used.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected, or the login response carried unreadable credentials.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// HTTP status of the login exchange, when one was received.
        status: Option<u16>,
        message: String,
    },

    // ── Remote ──────────────────────────────────────────────────────
    /// The segment port does not exist (HTTP 404 on a single-port path).
    #[error("Segment port {port_id} not found in segment {segment_id}")]
    NotFound {
        segment_id: String,
        port_id: String,
    },

    /// Any non-200 response, surfaced verbatim.
    #[error("API error (HTTP {status}): {}", preview(body))]
    Api { status: u16, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// A 200 response whose body did not match the wire schema.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Authentication { status, .. } => *status,
            Self::NotFound { .. } => Some(404),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Api { status: 404, .. })
    }

    /// Returns `true` if the session is missing or was rejected, so a
    /// fresh login might resolve it.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::Api { status: 401 | 403, .. }
        )
    }
}

/// First 200 characters of a response body, for log and error messages.
pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
