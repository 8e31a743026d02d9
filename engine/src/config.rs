//! TOML configuration loading and validation.
//!
//! Every table and field is optional; an empty file yields the production
//! endpoints with default pacing. Credentials never live here, see
//! [`connect`](crate::connect).

use std::path::{Path, PathBuf};
use std::time::Duration;

use modelsync_client::{ECLIPSE_BASE_URL, HttpSettings, ORION_BASE_URL};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub eclipse: ApiConfig,
    pub orion: ApiConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Connection settings for one API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Defaults to the production host of whichever table this is.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_calls_per_second")]
    pub calls_per_second: f64,
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    #[serde(default)]
    pub ca_bundle: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout(),
            calls_per_second: default_calls_per_second(),
            verify_ssl: true,
            ca_bundle: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_calls_per_second() -> f64 {
    10.0
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Fail instead of dropping an equivalent that cannot be resolved.
    #[serde(default)]
    pub strict_equivalents: bool,
    /// Tolerance type for newly created security sets.
    #[serde(default = "default_tolerance_type")]
    pub tolerance_type: String,
    #[serde(default)]
    pub tolerance_type_value: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strict_equivalents: false,
            tolerance_type: default_tolerance_type(),
            tolerance_type_value: 0.0,
        }
    }
}

fn default_tolerance_type() -> String {
    "ABSOLUTE".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl ApiConfig {
    fn validate(&self, table: &str) -> Result<()> {
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "[{table}] base_url must start with http:// or https://"
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(format!("[{table}] timeout_secs must be > 0")));
        }
        if !self.calls_per_second.is_finite() || self.calls_per_second < 0.0 {
            return Err(Error::Config(format!(
                "[{table}] calls_per_second must be >= 0"
            )));
        }
        Ok(())
    }

    fn settings(&self, default_url: &str) -> HttpSettings {
        HttpSettings {
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| default_url.to_string()),
            timeout: Duration::from_secs(self.timeout_secs),
            calls_per_second: self.calls_per_second,
            verify_ssl: self.verify_ssl,
            ca_bundle: self.ca_bundle.clone(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        self.eclipse.validate("eclipse")?;
        self.orion.validate("orion")?;
        if self.sync.tolerance_type.trim().is_empty() {
            return Err(Error::Config("[sync] tolerance_type must not be empty".into()));
        }
        if self.logging.audit_file.is_empty() {
            return Err(Error::Config("[logging] audit_file must not be empty".into()));
        }
        Ok(())
    }

    pub fn eclipse_settings(&self) -> HttpSettings {
        self.eclipse.settings(ECLIPSE_BASE_URL)
    }

    pub fn orion_settings(&self) -> HttpSettings {
        self.orion.settings(ORION_BASE_URL)
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_toml() -> &'static str {
        r#"
[eclipse]
base_url = "https://sandbox.example.com/v1"
timeout_secs = 60
calls_per_second = 5.0
verify_ssl = false

[orion]
ca_bundle = "/etc/ssl/corp.pem"

[sync]
strict_equivalents = true
tolerance_type = "BAND"
tolerance_type_value = 2.5

[logging]
dir = "./logs"
audit_file = "audit.jsonl"
"#
    }

    #[test]
    fn parse_example_config() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        assert_eq!(config.eclipse.timeout_secs, 60);
        assert!(!config.eclipse.verify_ssl);
        assert_eq!(config.orion.timeout_secs, 30);
        assert!(config.orion.verify_ssl);
        assert!(config.sync.strict_equivalents);
        assert_eq!(config.sync.tolerance_type, "BAND");
        config.validate().unwrap();
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        config.validate().unwrap();
        assert!(!config.sync.strict_equivalents);
        assert_eq!(config.sync.tolerance_type, "ABSOLUTE");
        assert_eq!(config.eclipse_settings().base_url, ECLIPSE_BASE_URL);
        assert_eq!(config.orion_settings().base_url, ORION_BASE_URL);
        assert_eq!(config.eclipse_settings().calls_per_second, 10.0);
    }

    #[test]
    fn settings_carry_tls_options() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        let eclipse = config.eclipse_settings();
        assert_eq!(eclipse.base_url, "https://sandbox.example.com/v1");
        assert_eq!(eclipse.timeout, Duration::from_secs(60));
        assert!(!eclipse.verify_ssl);
        assert_eq!(
            config.orion_settings().ca_bundle,
            Some(PathBuf::from("/etc/ssl/corp.pem"))
        );
    }

    #[test]
    fn validate_catches_bad_url() {
        let mut config = Config::default();
        config.eclipse.base_url = Some("ftp://nope".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_zero_timeout_and_negative_rate() {
        let mut config = Config::default();
        config.orion.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.eclipse.calls_per_second = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_rate_is_allowed() {
        let mut config = Config::default();
        config.eclipse.calls_per_second = 0.0;
        config.validate().unwrap();
    }

    #[test]
    fn audit_path() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        assert_eq!(config.audit_path(), PathBuf::from("./logs/audit.jsonl"));
    }

    #[test]
    fn load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/modelsync.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
        let config = Config::load_or_default(Path::new("/nonexistent/modelsync.toml")).unwrap();
        assert_eq!(config.logging.audit_file, "audit.jsonl");
    }
}
