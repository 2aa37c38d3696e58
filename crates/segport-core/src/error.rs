// ── Core error types ──
//
// Errors returned across the reconciliation boundary. Every variant
// carries enough context (status, identifiers) for a front-end to render
// a diagnostic. The `From<segport_api::Error>` impl translates
// transport-layer errors into this taxonomy.

use thiserror::Error;

/// How much of a failing payload is kept in [`CoreError::Decode`].
const EXCERPT_LEN: usize = 200;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Caller errors ────────────────────────────────────────────────
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Cannot connect to manager at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    // ── Remote outcomes ──────────────────────────────────────────────
    #[error("Segment port {port_id} not found in segment {segment_id}")]
    NotFound {
        segment_id: String,
        port_id: String,
    },

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response: {message} (payload: {excerpt})")]
    Decode { message: String, excerpt: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` for the "resource is absent" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::AuthenticationFailed { status, .. } => *status,
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<segport_api::Error> for CoreError {
    fn from(err: segport_api::Error) -> Self {
        match err {
            segport_api::Error::InvalidInput { message } => CoreError::InvalidInput { message },
            segport_api::Error::InvalidUrl(e) => CoreError::InvalidInput {
                message: format!("invalid endpoint URL: {e}"),
            },
            segport_api::Error::Authentication { status, message } => {
                CoreError::AuthenticationFailed { status, message }
            }
            segport_api::Error::NotFound {
                segment_id,
                port_id,
            } => CoreError::NotFound {
                segment_id,
                port_id,
            },
            segport_api::Error::Api { status, body } => CoreError::Api { status, body },
            segport_api::Error::Deserialization { message, body } => CoreError::Decode {
                message,
                excerpt: body.chars().take(EXCERPT_LEN).collect(),
            },
            segport_api::Error::Tls(message) => CoreError::Config { message },
            segport_api::Error::Transport(e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_not_found_keeps_identifiers() {
        let err = CoreError::from(segport_api::Error::NotFound {
            segment_id: "seg".into(),
            port_id: "p".into(),
        });
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Segment port p not found in segment seg");
    }

    #[test]
    fn decode_excerpt_is_bounded() {
        let err = CoreError::from(segport_api::Error::Deserialization {
            message: "expected value".into(),
            body: "x".repeat(1_000),
        });
        match err {
            CoreError::Decode { excerpt, .. } => assert_eq!(excerpt.len(), EXCERPT_LEN),
            other => panic!("expected Decode, got: {other:?}"),
        }
    }

    #[test]
    fn auth_status_is_preserved() {
        let err = CoreError::from(segport_api::Error::Authentication {
            status: Some(403),
            message: "login failed".into(),
        });
        assert_eq!(err.status(), Some(403));
    }
}
