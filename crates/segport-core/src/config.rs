// ── Runtime connection configuration ──
//
// These types describe *how* to reach one NSX manager. They carry
// credential data and transport tuning, but never touch disk.
// The embedding front-end builds a `ClientConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use segport_api::transport::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// HTTPS without certificate verification. What the `insecure` flag selects.
    DangerAcceptInvalid,
    /// Plain HTTP for endpoints given without a scheme.
    Plaintext,
}

impl TlsVerification {
    /// Map the front-end's `insecure` flag.
    pub fn from_insecure(insecure: bool) -> Self {
        if insecure {
            Self::DangerAcceptInvalid
        } else {
            Self::SystemDefaults
        }
    }
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
            TlsVerification::Plaintext => Self::Plaintext,
        }
    }
}

/// Configuration for one manager connection.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Manager endpoint, with or without a scheme (`nsx.example.com`).
    pub endpoint: String,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Transport deadline for each HTTP exchange.
    pub timeout: Duration,
    /// Fail the login if the manager answers 200 without both a session
    /// cookie and an XSRF token.
    pub strict_auth: bool,
}

impl ClientConfig {
    /// Connection settings with the default timeout; `insecure` skips
    /// certificate verification.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        insecure: bool,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password,
            tls: TlsVerification::from_insecure(insecure),
            timeout: Duration::from_secs(30),
            strict_auth: false,
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
        }
    }
}
