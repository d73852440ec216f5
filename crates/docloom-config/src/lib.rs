//! Configuration management for docloom.
//!
//! Hierarchical configuration with discovery and precedence:
//! explicit path > `DOCLOOM_CONFIG` environment variable > `./docloom.toml` >
//! built-in defaults. TOML with `[service]` and `[defaults]` sections:
//!
//! ```toml
//! [service]
//! base_url = "http://127.0.0.1:8000"
//! timeout_secs = 300
//! connect_timeout_secs = 30
//! max_retries = 2
//!
//! [defaults]
//! page_limit = 10
//! document_type = "ppt"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use docloom_outline::DocumentType;
pub use docloom_utils::error::ConfigError;

/// Environment variable naming an alternative config file path.
pub const CONFIG_ENV_VAR: &str = "DOCLOOM_CONFIG";

/// Config file looked up in the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "docloom.toml";

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_page_limit() -> u32 {
    10
}

fn default_document_type() -> DocumentType {
    DocumentType::Ppt
}

/// Remote generation service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the generation service, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-call timeout cap in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Retry attempts for 5xx and transport failures. 4xx never retries.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl ServiceConfig {
    /// Per-call timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Defaults applied when the caller does not specify workflow parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default page limit for new workflow requests.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Default document type for new workflow requests.
    #[serde(default = "default_document_type")]
    pub document_type: DocumentType,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
            document_type: default_document_type(),
        }
    }
}

/// Effective docloom configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl Config {
    /// Load configuration from a specific TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, fails to
    /// parse, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Discover configuration with the standard precedence.
    ///
    /// An explicit path must exist; the `DOCLOOM_CONFIG` path must exist; a
    /// `./docloom.toml` is used when present; otherwise built-in defaults
    /// apply.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for missing explicit files or any load failure.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Some(env_path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&env_path));
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::load(local);
        }

        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.service.base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::Invalid(
                "service.base_url must not be empty".to_string(),
            ));
        }
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "service.base_url must start with http:// or https:// (got '{base}')"
            )));
        }
        if self.service.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "service.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.defaults.page_limit == 0 {
            return Err(ConfigError::Invalid(
                "defaults.page_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.service.base_url.trim_end_matches('/')
    }

    /// Minimal configuration for tests: short timeouts, no retries.
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Self {
            service: ServiceConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                timeout_secs: 1,
                connect_timeout_secs: 1,
                max_retries: 0,
            },
            defaults: DefaultsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docloom.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.service.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.defaults.page_limit, 10);
        assert_eq!(config.defaults.document_type, DocumentType::Ppt);
    }

    #[test]
    fn load_reads_partial_file_with_defaults() {
        let (_dir, path) = write_config(
            r#"
[service]
base_url = "https://gen.example.com/"

[defaults]
document_type = "word"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_url(), "https://gen.example.com");
        assert_eq!(config.service.timeout_secs, 300);
        assert_eq!(config.defaults.document_type, DocumentType::Word);
        assert_eq!(config.defaults.page_limit, 10);
    }

    #[test]
    fn load_missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn load_rejects_bad_toml() {
        let (_dir, path) = write_config("[service\nbase_url = 1");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn validate_rejects_zero_page_limit() {
        let (_dir, path) = write_config("[defaults]\npage_limit = 0");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn validate_rejects_non_http_base_url() {
        let (_dir, path) = write_config("[service]\nbase_url = \"ftp://example.com\"");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn discover_prefers_explicit_path() {
        let (_dir, path) = write_config("[service]\ntimeout_secs = 42");
        let config = Config::discover(Some(&path)).unwrap();
        assert_eq!(config.service.timeout_secs, 42);
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let mut config = Config::default();
        config.service.base_url = "http://h:1/".to_string();
        assert_eq!(config.base_url(), "http://h:1");
    }
}
