//! Configuration management for lmexport
//!
//! Two sources feed a run:
//! - [`Credentials`] come from the process environment, optionally primed from an
//!   env file (`.env` in the working directory by default).
//! - [`Settings`] come from an optional YAML file (`~/.lmexport/config.yaml`) and
//!   provide defaults that CLI flags override.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Environment variable holding the LogicMonitor API access id
pub const ACCESS_ID_VAR: &str = "ACCESS_ID";
/// Environment variable holding the LogicMonitor API access key
pub const ACCESS_KEY_VAR: &str = "ACCESS_KEY";
/// Environment variable holding the LogicMonitor company (portal) name
pub const COMPANY_VAR: &str = "COMPANY";

/// LogicMonitor API credentials, immutable for the lifetime of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_id: String,
    pub access_key: String,
    pub company: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("access_key", &mask_secret(&self.access_key))
            .field("company", &self.company)
            .finish()
    }
}

impl Credentials {
    /// Load credentials from the process environment.
    ///
    /// Empty values count as missing. All missing variables are reported at once.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load credentials through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let access_id = read(ACCESS_ID_VAR);
        let access_key = read(ACCESS_KEY_VAR);
        let company = read(COMPANY_VAR);

        match (access_id, access_key, company) {
            (Some(access_id), Some(access_key), Some(company)) => Ok(Self {
                access_id,
                access_key,
                company,
            }),
            (id, key, company) => {
                let mut missing = Vec::new();
                if id.is_none() {
                    missing.push(ACCESS_ID_VAR);
                }
                if key.is_none() {
                    missing.push(ACCESS_KEY_VAR);
                }
                if company.is_none() {
                    missing.push(COMPANY_VAR);
                }
                Err(ConfigError::MissingCredentials(missing).into())
            }
        }
    }

    /// Base URL of the REST API for this company, or for an overridden host.
    ///
    /// The override is a scheme and host (e.g. `http://127.0.0.1:1234`); the
    /// `/santaba/rest` prefix is always appended.
    pub fn base_url(&self, api_host: Option<&str>) -> String {
        match api_host {
            Some(host) => format!("{}/santaba/rest", host.trim_end_matches('/')),
            None => format!("https://{}.logicmonitor.com/santaba/rest", self.company),
        }
    }
}

/// Load an env file into the process environment.
///
/// With an explicit path the file must exist. Without one, `.env` is looked up
/// from the working directory upwards and silently skipped when absent.
/// Variables already set in the environment are never overridden.
pub fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            log::debug!("Loaded env file {}", path.display());
        }
        None => match dotenvy::dotenv() {
            Ok(found) => log::debug!("Loaded env file {}", found.display()),
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(ConfigError::EnvFile {
                    path: ".env".to_string(),
                    reason: e.to_string(),
                }
                .into());
            }
        },
    }
    Ok(())
}

/// Mask a secret for display, keeping only its last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

/// Export settings loaded from the optional YAML file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Output directory root
    pub out_dir: PathBuf,

    /// Page size for list endpoints
    pub page_size: usize,

    /// Pause between pages, in seconds
    pub sleep_secs: f64,

    /// Default `fields` query parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,

    /// Default LogicMonitor filter expression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Total attempts per request, including the first
    pub max_attempts: u32,

    /// Base delay for exponential backoff, in seconds
    pub backoff_base_secs: f64,

    /// Wait after a 429 without a usable Retry-After header, in seconds
    pub rate_limit_sleep_secs: f64,

    /// Per-request timeout, in seconds
    pub timeout_secs: f64,

    /// Request rate for a resource path once it has been rate limited
    pub throttle_per_second: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("output_modules"),
            page_size: 200,
            sleep_secs: 0.0,
            fields: None,
            filter: None,
            max_attempts: 3,
            backoff_base_secs: 1.0,
            rate_limit_sleep_secs: 30.0,
            timeout_secs: 60.0,
            throttle_per_second: 2,
        }
    }
}

impl Settings {
    /// Get the default settings file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".lmexport").join("config.yaml"))
    }

    /// Resolve the settings path from an optional override.
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load settings from an optional override path.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(Path::new(p)),
            None => {
                let default = Self::default_path()?;
                if default.exists() {
                    Self::load_from(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        settings.validate()?;

        Ok(settings)
    }

    /// Validate numeric bounds
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".to_string()).into());
        }
        if self.max_attempts == 0 {
            return Err(
                ConfigError::Invalid("max_attempts must be at least 1".to_string()).into(),
            );
        }
        if self.throttle_per_second == 0 {
            return Err(ConfigError::Invalid(
                "throttle_per_second must be at least 1".to_string(),
            )
            .into());
        }
        for (name, value) in [
            ("sleep_secs", self.sleep_secs),
            ("backoff_base_secs", self.backoff_base_secs),
            ("rate_limit_sleep_secs", self.rate_limit_sleep_secs),
            ("timeout_secs", self.timeout_secs),
        ] {
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a non-negative, representable number of seconds",
                    name
                ))
                .into());
            }
        }
        Ok(())
    }

    pub fn page_pause(&self) -> Duration {
        Duration::from_secs_f64(self.sleep_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_base_secs)
    }

    pub fn rate_limit_sleep(&self) -> Duration {
        Duration::from_secs_f64(self.rate_limit_sleep_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_credentials_from_lookup() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("ACCESS_ID", "id-123"),
            ("ACCESS_KEY", "key-secret-9876"),
            ("COMPANY", "acme"),
        ]))
        .unwrap();

        assert_eq!(creds.access_id, "id-123");
        assert_eq!(creds.company, "acme");
    }

    #[test]
    fn test_credentials_report_every_missing_variable() {
        let err = Credentials::from_lookup(lookup_from(&[("ACCESS_KEY", "k")])).unwrap_err();

        match err {
            crate::error::Error::Config(ConfigError::MissingCredentials(missing)) => {
                assert_eq!(missing, vec!["ACCESS_ID", "COMPANY"]);
            }
            other => panic!("Expected MissingCredentials, got {:?}", other),
        }
    }

    #[test]
    fn test_credentials_blank_counts_as_missing() {
        let err = Credentials::from_lookup(lookup_from(&[
            ("ACCESS_ID", "id"),
            ("ACCESS_KEY", "   "),
            ("COMPANY", "acme"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("ACCESS_KEY"));
    }

    #[test]
    fn test_credentials_debug_masks_key() {
        let creds = Credentials {
            access_id: "id".to_string(),
            access_key: "super-secret-abcd".to_string(),
            company: "acme".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("****abcd"));
    }

    #[test]
    fn test_base_url() {
        let creds = Credentials {
            access_id: "id".to_string(),
            access_key: "key".to_string(),
            company: "acme".to_string(),
        };
        assert_eq!(
            creds.base_url(None),
            "https://acme.logicmonitor.com/santaba/rest"
        );
        assert_eq!(
            creds.base_url(Some("http://127.0.0.1:8080/")),
            "http://127.0.0.1:8080/santaba/rest"
        );
    }

    #[test]
    fn test_mask_secret_short() {
        assert_eq!(mask_secret("abc"), "****");
        assert_eq!(mask_secret("abcdefgh"), "****efgh");
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.page_size, 200);
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.rate_limit_sleep(), Duration::from_secs(30));
        assert_eq!(settings.timeout(), Duration::from_secs(60));
        assert_eq!(settings.page_pause(), Duration::ZERO);
        assert_eq!(settings.out_dir, PathBuf::from("output_modules"));
    }

    #[test]
    fn test_settings_partial_yaml_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "page_size: 50\nsleep_secs: 0.25\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.page_pause(), Duration::from_millis(250));
        assert_eq!(settings.max_attempts, 3);
    }

    #[test]
    fn test_settings_explicit_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");

        let err = Settings::load_at(Some(missing.to_str().unwrap())).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_settings_rejects_zero_page_size() {
        let settings = Settings {
            page_size: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_rejects_negative_durations() {
        let settings = Settings {
            backoff_base_secs: -1.0,
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("backoff_base_secs"));
    }

    #[test]
    fn test_settings_rejects_oversized_durations() {
        for settings in [
            Settings {
                sleep_secs: 1e30,
                ..Settings::default()
            },
            Settings {
                timeout_secs: f64::INFINITY,
                ..Settings::default()
            },
            Settings {
                rate_limit_sleep_secs: f64::NAN,
                ..Settings::default()
            },
        ] {
            let err = settings.validate().unwrap_err();
            assert!(matches!(err, Error::Config(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn test_settings_yaml_oversized_sleep_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "sleep_secs: 1.0e30\n").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("sleep_secs"));
    }

    #[test]
    fn test_load_env_file_explicit_missing() {
        let temp = TempDir::new().unwrap();
        let err = load_env_file(Some(&temp.path().join("missing.env"))).unwrap_err();
        assert!(err.to_string().contains("missing.env"));
    }
}
