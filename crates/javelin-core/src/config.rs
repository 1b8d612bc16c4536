//! Resolver configuration.
//!
//! Configuration is plain TOML deserialized with `serde`. Every field has a
//! default so an empty document (or no document at all) is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Packages whose public types are visible in every compilation unit
    /// without an import.
    #[serde(default = "ResolverConfig::default_implicit_imports")]
    pub implicit_imports: Vec<String>,

    /// Cache successful and failed type lookups inside memoizing solvers.
    #[serde(default = "ResolverConfig::default_memoize")]
    pub memoize: bool,

    #[serde(default)]
    pub logging: LogConfig,
}

impl ResolverConfig {
    fn default_implicit_imports() -> Vec<String> {
        vec!["java.lang".to_owned()]
    }

    fn default_memoize() -> bool {
        true
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn implicitly_imports(&self, package: &str) -> bool {
        self.implicit_imports.iter().any(|p| p == package)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            implicit_imports: Self::default_implicit_imports(),
            memoize: Self::default_memoize(),
            logging: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Either a simple level (`info`, `debug`, ...) or a full
    /// `tracing_subscriber::EnvFilter` directive string.
    #[serde(default = "LogConfig::default_filter")]
    pub filter: String,

    /// Emit structured JSON log lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl LogConfig {
    fn default_filter() -> String {
        "info".to_owned()
    }

    pub(crate) fn normalize_filter(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_filter();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: Self::default_filter(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // Keep the message only; the default `Display` embeds a source snippet.
        ConfigError::Toml(err.message().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ResolverConfig::from_toml_str("").unwrap();
        assert_eq!(config, ResolverConfig::default());
        assert!(config.implicitly_imports("java.lang"));
        assert!(config.memoize);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn parses_all_sections() {
        let config = ResolverConfig::from_toml_str(
            r#"
implicit_imports = ["java.lang", "java.util"]
memoize = false

[logging]
filter = "javelin_resolve=debug"
json = true
"#,
        )
        .unwrap();
        assert_eq!(config.implicit_imports, vec!["java.lang", "java.util"]);
        assert!(!config.memoize);
        assert!(config.logging.json);
        assert_eq!(config.logging.filter, "javelin_resolve=debug");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ResolverConfig::from_toml_str("memoise = true").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");
    }

    #[test]
    fn load_from_path_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("javelin.toml");
        let err = ResolverConfig::load_from_path(&missing).unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.ends_with("javelin.toml")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("javelin.toml");
        std::fs::write(&path, "memoize = false\n").unwrap();
        let config = ResolverConfig::load_from_path(&path).unwrap();
        assert!(!config.memoize);
    }

    #[test]
    fn log_filter_normalization_accepts_synonyms() {
        assert_eq!(LogConfig::normalize_filter("WARNING"), "warn");
        assert_eq!(LogConfig::normalize_filter("  "), "info");
        assert_eq!(
            LogConfig::normalize_filter("javelin_types=trace"),
            "javelin_types=trace"
        );
    }
}
