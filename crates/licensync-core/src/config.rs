//! Configuration module for licensync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::tags::{TagPolicy, Tags, RESERVED_TAG_PREFIX};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for licensync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub tags: TagsConfig,
    pub logging: LoggingConfig,
}

/// Remote License Manager endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Explicit endpoint URL. Empty means derive it from `region`.
    pub url: String,
    /// Region used to derive the endpoint URL.
    pub region: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// How many times a throttled request is retried by the transport (0 disables).
    pub max_throttle_retries: u32,
}

/// Process-wide tag settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    /// Tags merged into every license configuration.
    pub default_tags: Tags,
    /// Tag keys that are never managed.
    pub ignore_keys: Vec<String>,
    /// Tag key prefixes that are never managed.
    pub ignore_key_prefixes: Vec<String>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `text` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/licensync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("licensync")
            .join("config.yaml")
    }
}

impl EndpointConfig {
    /// The endpoint URL, derived from the region when `url` is empty.
    pub fn resolved_url(&self) -> String {
        if self.url.is_empty() {
            format!("https://license-manager.{}.amazonaws.com", self.region)
        } else {
            self.url.trim_end_matches('/').to_string()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl TagsConfig {
    /// The tag policy handed to the reconciler.
    pub fn policy(&self) -> TagPolicy {
        TagPolicy {
            default_tags: self.default_tags.clone(),
            ignore_keys: self.ignore_keys.clone(),
            ignore_key_prefixes: self.ignore_key_prefixes.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            region: "us-east-1".to_string(),
            request_timeout_secs: 30,
            max_throttle_retries: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"endpoint.request_timeout_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

const MAX_THROTTLE_RETRIES: u32 = 10;
const MAX_TAG_KEY_LEN: usize = 128;
const MAX_TAG_VALUE_LEN: usize = 256;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- endpoint ---
        let url = &self.endpoint.url;
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(ValidationError {
                field: "endpoint.url".into(),
                message: format!("must start with http:// or https://, got '{url}'"),
            });
        }
        if url.is_empty() && self.endpoint.region.trim().is_empty() {
            errors.push(ValidationError {
                field: "endpoint.region".into(),
                message: "must be set when endpoint.url is empty".into(),
            });
        }
        if self.endpoint.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "endpoint.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.endpoint.max_throttle_retries > MAX_THROTTLE_RETRIES {
            errors.push(ValidationError {
                field: "endpoint.max_throttle_retries".into(),
                message: format!("must be in range 0..={MAX_THROTTLE_RETRIES}"),
            });
        }

        // --- tags ---
        for (key, value) in &self.tags.default_tags {
            let field = format!("tags.default_tags.{key}");
            if key.is_empty() {
                errors.push(ValidationError {
                    field: "tags.default_tags".into(),
                    message: "tag keys must not be empty".into(),
                });
            } else if key.starts_with(RESERVED_TAG_PREFIX) {
                errors.push(ValidationError {
                    field,
                    message: format!("the '{RESERVED_TAG_PREFIX}' prefix is reserved"),
                });
            } else if key.chars().count() > MAX_TAG_KEY_LEN {
                errors.push(ValidationError {
                    field,
                    message: format!("key must be at most {MAX_TAG_KEY_LEN} characters"),
                });
            } else if value.chars().count() > MAX_TAG_VALUE_LEN {
                errors.push(ValidationError {
                    field,
                    message: format!("value must be at most {MAX_TAG_VALUE_LEN} characters"),
                });
            }
        }
        if self.tags.ignore_key_prefixes.iter().any(String::is_empty) {
            errors.push(ValidationError {
                field: "tags.ignore_key_prefixes".into(),
                message: "an empty prefix would ignore every tag".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use licensync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .endpoint_region("eu-west-1")
///     .default_tag("env", "prod")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- endpoint ---

    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint.url = url.into();
        self
    }

    pub fn endpoint_region(mut self, region: impl Into<String>) -> Self {
        self.config.endpoint.region = region.into();
        self
    }

    pub fn request_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.endpoint.request_timeout_secs = seconds;
        self
    }

    pub fn max_throttle_retries(mut self, retries: u32) -> Self {
        self.config.endpoint.max_throttle_retries = retries;
        self
    }

    // --- tags ---

    pub fn default_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.tags.default_tags.insert(key.into(), value.into());
        self
    }

    pub fn ignore_tag_key(mut self, key: impl Into<String>) -> Self {
        self.config.tags.ignore_keys.push(key.into());
        self
    }

    pub fn ignore_tag_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.tags.ignore_key_prefixes.push(prefix.into());
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.endpoint.url, "");
        assert_eq!(cfg.endpoint.region, "us-east-1");
        assert_eq!(cfg.endpoint.request_timeout_secs, 30);
        assert_eq!(cfg.endpoint.max_throttle_retries, 3);
        assert!(cfg.tags.default_tags.is_empty());
        assert!(cfg.tags.ignore_keys.is_empty());
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, "text");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    #[test]
    fn url_is_derived_from_region() {
        let cfg = ConfigBuilder::new().endpoint_region("eu-west-1").build();
        assert_eq!(
            cfg.endpoint.resolved_url(),
            "https://license-manager.eu-west-1.amazonaws.com"
        );

        let cfg = ConfigBuilder::new()
            .endpoint_url("http://localhost:4566/")
            .build();
        assert_eq!(cfg.endpoint.resolved_url(), "http://localhost:4566");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
endpoint:
  url: http://localhost:4566
  request_timeout_secs: 5
  max_throttle_retries: 0
tags:
  default_tags:
    env: prod
    owner: platform
  ignore_keys:
    - LastScanned
  ignore_key_prefixes:
    - "kubernetes.io/"
logging:
  level: debug
  format: json
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.endpoint.url, "http://localhost:4566");
        assert_eq!(cfg.endpoint.region, "us-east-1");
        assert_eq!(cfg.endpoint.request_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.endpoint.max_throttle_retries, 0);
        assert_eq!(cfg.tags.default_tags.get("env").map(String::as_str), Some("prod"));
        assert_eq!(cfg.tags.ignore_keys, vec!["LastScanned".to_string()]);
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, "json");

        let policy = cfg.tags.policy();
        assert!(policy.is_ignored("kubernetes.io/cluster"));
        assert_eq!(policy.default_tags.len(), 2);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"logging:\n  level: warn\n").unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.logging.format, "text");
        assert_eq!(cfg.endpoint, EndpointConfig::default());
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"not: [valid: yaml: {{{").unwrap();
        tmp.flush().unwrap();

        let result = Config::load(tmp.path());
        assert!(result.is_err());
    }

    #[test]
    fn default_path_ends_with_licensync_config() {
        let path = Config::default_path();
        assert!(path.ends_with("licensync/config.yaml"));
    }

    // -- Validation --

    #[test]
    fn validate_catches_bad_endpoint() {
        let mut cfg = Config::default();
        cfg.endpoint.url = "ftp://example.com".into();
        cfg.endpoint.request_timeout_secs = 0;
        cfg.endpoint.max_throttle_retries = 11;
        let errors = cfg.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"endpoint.url"));
        assert!(fields.contains(&"endpoint.request_timeout_secs"));
        assert!(fields.contains(&"endpoint.max_throttle_retries"));
    }

    #[test]
    fn validate_requires_region_without_url() {
        let mut cfg = Config::default();
        cfg.endpoint.region = " ".into();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "endpoint.region"));

        cfg.endpoint.url = "https://license-manager.example".into();
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validate_rejects_reserved_default_tag() {
        let result = ConfigBuilder::new()
            .default_tag("aws:createdBy", "me")
            .build_validated();
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "tags.default_tags.aws:createdBy");
    }

    #[test]
    fn validate_rejects_oversized_tags() {
        let cfg = ConfigBuilder::new()
            .default_tag("k".repeat(129), "v")
            .default_tag("ok", "v".repeat(257))
            .build();
        assert_eq!(cfg.validate().len(), 2);
    }

    #[test]
    fn validate_rejects_empty_ignore_prefix() {
        let cfg = ConfigBuilder::new().ignore_tag_key_prefix("").build();
        assert!(cfg
            .validate()
            .iter()
            .any(|e| e.field == "tags.ignore_key_prefixes"));
    }

    #[test]
    fn validate_catches_invalid_logging() {
        let cfg = ConfigBuilder::new()
            .logging_level("verbose")
            .logging_format("xml")
            .build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("valid options"));
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "logging.level".into(),
            message: "bad".into(),
        };
        assert_eq!(err.to_string(), "logging.level: bad");
    }

    // -- Builder --

    #[test]
    fn builder_overrides_and_validates() {
        let cfg = ConfigBuilder::new()
            .endpoint_url("http://127.0.0.1:9000")
            .request_timeout_secs(10)
            .max_throttle_retries(1)
            .default_tag("env", "prod")
            .ignore_tag_key("LastScanned")
            .logging_level("trace")
            .build_validated()
            .expect("valid config");
        assert_eq!(cfg.endpoint.request_timeout_secs, 10);
        assert_eq!(cfg.tags.ignore_keys, vec!["LastScanned".to_string()]);
        assert_eq!(cfg.logging.level, "trace");
    }

    #[test]
    fn config_yaml_roundtrip() {
        let cfg = ConfigBuilder::new().default_tag("env", "prod").build();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cfg);
    }
}
