//! On-disk configuration for segport.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `segport_core::ClientConfig`. The core itself never
//! touches disk; front-ends load a profile here and hand the result in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use segport_core::{ClientConfig, TlsVerification};

const KEYRING_SERVICE: &str = "segport";
const ENV_PREFIX: &str = "SEGPORT_";
const PASSWORD_ENV: &str = "SEGPORT_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named NSX manager profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(name, profile)| (name.as_str(), profile))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub strict_auth: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
            strict_auth: false,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// A named NSX manager profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Manager endpoint, with or without a scheme (e.g., "nsx.example.com").
    pub endpoint: String,

    pub username: Option<String>,

    /// Password in plaintext. Prefer the keyring or an env var.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable name containing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Override strict login checking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_auth: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "segport", "segport").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("segport");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
///
/// Environment overrides use `__` as the nesting separator, e.g.
/// `SEGPORT_PROFILES__LAB__ENDPOINT` or `SEGPORT_DEFAULTS__TIMEOUT`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a profile's password.
///
/// Order: the profile's `password_env` variable, `SEGPORT_PASSWORD`, the
/// system keyring (`segport` / `{profile}/password`), plaintext in config.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        keyring_password,
    )
}

/// [`resolve_password`] with the environment and keyring lookups supplied
/// by the caller.
fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(val) = profile.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(val));
    }

    // 2. Global env var
    if let Some(pw) = env(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Some(pw) = keyring(profile_name) {
        return Ok(SecretString::from(pw));
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.get_password())
        .ok()
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ClientConfig` from a profile and the global defaults.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    if profile.endpoint.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("profile '{profile_name}' has no endpoint"),
        });
    }

    let username = profile
        .username
        .clone()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;
    let password = resolve_password(profile, profile_name)?;

    let insecure = profile.insecure.unwrap_or(defaults.insecure);
    let tls = match (&profile.ca_cert, insecure) {
        (_, true) => TlsVerification::DangerAcceptInvalid,
        (Some(ca_path), false) => TlsVerification::CustomCa(ca_path.clone()),
        (None, false) => TlsVerification::SystemDefaults,
    };

    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    if timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least one second".into(),
        });
    }

    Ok(ClientConfig {
        endpoint: profile.endpoint.trim().to_owned(),
        username,
        password,
        tls,
        timeout: Duration::from_secs(timeout),
        strict_auth: profile.strict_auth.unwrap_or(defaults.strict_auth),
    })
}

/// Load the config file and resolve one profile into a `ClientConfig`.
pub fn load_client_config(profile: Option<&str>) -> Result<ClientConfig, ConfigError> {
    let config = load_config()?;
    let (name, profile) = config.profile(profile)?;
    profile_to_client_config(profile, name, &config.defaults)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
timeout = 45

[profiles.lab]
endpoint = "nsx.lab.example.com"
username = "admin"
password = "plain"
insecure = true

[profiles.prod]
endpoint = "https://nsx.prod.example.com"
username = "svc"
password = "plain"
ca_cert = "/etc/segport/ca.pem"
timeout = 10
strict_auth = true
"#;

    fn write_sample(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[test]
    fn loads_profiles_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&write_sample(&dir)).unwrap();

        assert_eq!(config.default_profile.as_deref(), Some("lab"));
        assert_eq!(config.defaults.timeout, 45);
        assert!(!config.defaults.insecure);
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.profiles["prod"].timeout, Some(10));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert_eq!(config.defaults.timeout, 30);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn profile_lookup_falls_back_to_default_profile() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&write_sample(&dir)).unwrap();

        let (name, _) = config.profile(None).unwrap();
        assert_eq!(name, "lab");
        let (name, _) = config.profile(Some("prod")).unwrap();
        assert_eq!(name, "prod");
        assert!(matches!(
            config.profile(Some("staging")),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn insecure_profile_skips_verification() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&write_sample(&dir)).unwrap();
        let (name, lab) = config.profile(Some("lab")).unwrap();

        let client = profile_to_client_config(lab, name, &config.defaults).unwrap();
        assert_eq!(client.endpoint, "nsx.lab.example.com");
        assert_eq!(client.username, "admin");
        assert_eq!(client.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(client.timeout, Duration::from_secs(45));
        assert!(!client.strict_auth);
    }

    #[test]
    fn profile_overrides_win_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&write_sample(&dir)).unwrap();
        let (name, prod) = config.profile(Some("prod")).unwrap();

        let client = profile_to_client_config(prod, name, &config.defaults).unwrap();
        assert_eq!(
            client.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/segport/ca.pem"))
        );
        assert_eq!(client.timeout, Duration::from_secs(10));
        assert!(client.strict_auth);
    }

    fn password_profile() -> Profile {
        Profile {
            endpoint: "nsx".into(),
            username: Some("admin".into()),
            password: Some("plain".into()),
            password_env: Some("LAB_PASSWORD".into()),
            ..Profile::default()
        }
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| pairs.get(key).cloned()
    }

    fn resolved(env: &[(&str, &str)], keyring: &[(&str, &str)]) -> String {
        let profile = password_profile();
        resolve_password_with(&profile, "lab", lookup(env), lookup(keyring))
            .unwrap()
            .expose_secret()
            .to_owned()
    }

    #[test]
    fn password_sources_in_precedence_order() {
        let keyring = [("lab", "from-keyring")];

        assert_eq!(
            resolved(
                &[("LAB_PASSWORD", "from-profile-env"), (PASSWORD_ENV, "from-global-env")],
                &keyring
            ),
            "from-profile-env"
        );
        assert_eq!(
            resolved(&[(PASSWORD_ENV, "from-global-env")], &keyring),
            "from-global-env"
        );
        assert_eq!(resolved(&[], &keyring), "from-keyring");
        assert_eq!(resolved(&[], &[]), "plain");
    }

    #[test]
    fn no_password_source_is_no_credentials() {
        let profile = Profile {
            password: None,
            ..password_profile()
        };
        let err = resolve_password_with(&profile, "lab", lookup(&[]), lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "lab"));
    }

    #[test]
    fn missing_username_is_no_credentials() {
        let profile = Profile {
            endpoint: "nsx".into(),
            password: Some("plain".into()),
            ..Profile::default()
        };
        let err = profile_to_client_config(&profile, "bare", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { .. }));
    }

    #[test]
    fn empty_endpoint_and_zero_timeout_are_rejected() {
        let mut profile = Profile {
            endpoint: "  ".into(),
            username: Some("admin".into()),
            password: Some("plain".into()),
            ..Profile::default()
        };
        let err = profile_to_client_config(&profile, "p", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "endpoint"));

        profile.endpoint = "nsx".into();
        profile.timeout = Some(0);
        let err = profile_to_client_config(&profile, "p", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "timeout"));
    }

    #[test]
    fn saved_config_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                endpoint: "nsx.example.com".into(),
                username: Some("admin".into()),
                timeout: Some(5),
                ..Profile::default()
            },
        );
        save_config_to(&config, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("password"));

        let reloaded = load_config_from(&path).unwrap();
        let (_, profile) = reloaded.profile(None).unwrap();
        assert_eq!(profile.endpoint, "nsx.example.com");
        assert_eq!(profile.timeout, Some(5));
    }
}
