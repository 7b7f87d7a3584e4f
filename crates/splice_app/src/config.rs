//! Client configuration loaded from a RON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use splice_core::ProcessingMode;
use splice_engine::ApiSettings;

pub const DEFAULT_CONFIG_FILE: &str = "splice.ron";
pub const BASE_URL_ENV: &str = "SPLICE_BASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub overlay_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
    pub mode: ProcessingMode,
    /// Overrides the header heuristic when both columns are set.
    pub target_column: Option<String>,
    pub label_column: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub worker_recommendation_attempts: u32,
    pub log_to_file: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            base_url: api.base_url,
            overlay_path: None,
            data_path: None,
            mode: ProcessingMode::default(),
            target_column: None,
            label_column: None,
            connect_timeout_secs: api.connect_timeout.as_secs(),
            request_timeout_secs: api.request_timeout.as_secs(),
            worker_recommendation_attempts: api.worker_recommendation_attempts,
            log_to_file: false,
        }
    }
}

/// A config plus whether it came from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: ClientConfig,
    pub from_file: bool,
}

impl ClientConfig {
    /// Reads `path`. A missing file yields defaults; an unreadable or
    /// malformed one is an error.
    pub fn load(path: &Path) -> Result<LoadedConfig, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedConfig {
                    config: ClientConfig::default(),
                    from_file: false,
                });
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: ClientConfig = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(LoadedConfig {
            config,
            from_file: true,
        })
    }

    /// Applies environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.base_url = base_url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.worker_recommendation_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "worker_recommendation_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Both configured columns, if the user pinned the mapping.
    pub fn pinned_columns(&self) -> Option<(String, String)> {
        match (&self.target_column, &self.label_column) {
            (Some(target), Some(label)) => Some((target.clone(), label.clone())),
            _ => None,
        }
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            worker_recommendation_attempts: self.worker_recommendation_attempts,
            ..ApiSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;

    fn write_config(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ClientConfig::load(&dir.path().join("absent.ron")).unwrap();
        assert!(!loaded.from_file);
        assert_eq!(loaded.config, ClientConfig::default());
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let file = write_config(
            r#"(
                base_url: "http://render.local:8080",
                overlay_path: Some("intro.mp4"),
                data_path: Some("leads.csv"),
                mode: Parallel(use_extra_worker: true),
            )"#,
        );
        let loaded = ClientConfig::load(file.path()).unwrap();
        assert!(loaded.from_file);
        let config = loaded.config;
        assert_eq!(config.base_url, "http://render.local:8080");
        assert_eq!(config.overlay_path, Some(PathBuf::from("intro.mp4")));
        assert_eq!(
            config.mode,
            ProcessingMode::Parallel {
                use_extra_worker: true
            }
        );
        assert_eq!(config.worker_recommendation_attempts, 2);
        assert_eq!(config.pinned_columns(), None);
    }

    #[test]
    fn sequential_mode_and_pinned_columns_parse() {
        let file = write_config(
            r#"(mode: Sequential, target_column: Some("Domain"), label_column: Some("Company"))"#,
        );
        let config = ClientConfig::load(file.path()).unwrap().config;
        assert_eq!(config.mode, ProcessingMode::Sequential);
        assert_eq!(
            config.pinned_columns(),
            Some(("Domain".to_string(), "Company".to_string()))
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = write_config("(base_url: ");
        let err = ClientConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let file = write_config("(worker_recommendation_attempts: 0)");
        let err = ClientConfig::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "worker_recommendation_attempts",
                ..
            }
        ));
    }

    #[test]
    fn env_overrides_base_url() {
        let mut config = ClientConfig::default();
        config.apply_env_overrides(|key| (key == BASE_URL_ENV).then(|| " http://other:9000 ".to_string()));
        assert_eq!(config.base_url, "http://other:9000");

        config.apply_env_overrides(|_| Some(String::new()));
        assert_eq!(config.base_url, "http://other:9000");
    }

    #[test]
    fn api_settings_carry_timeouts() {
        let config = ClientConfig {
            connect_timeout_secs: 3,
            request_timeout_secs: 60,
            ..ClientConfig::default()
        };
        let settings = config.api_settings();
        assert_eq!(settings.connect_timeout, Duration::from_secs(3));
        assert_eq!(settings.request_timeout, Duration::from_secs(60));
    }
}
