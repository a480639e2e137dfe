//! Global Configuration (~/.kiln/config.toml)
//!
//! User-level settings that are not part of any project document.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default build executor program
pub const DEFAULT_EXECUTOR: &str = "ninja";

/// Global user configuration from ~/.kiln/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Build executor settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor: Option<ExecutorConfig>,
}

/// Build executor settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Executor program (default: "ninja")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<PathBuf>,

    /// Parallel job count passed as `-j`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(executor) = &self.executor {
            if executor.jobs == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "executor.jobs".to_string(),
                    reason: "job count must be at least 1".to_string(),
                });
            }
            if let Some(program) = &executor.program {
                if program.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "executor.program".to_string(),
                        reason: "program cannot be empty".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Get the global config file path (~/.kiln/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".kiln").join("config.toml"))
    }

    /// The executor program, falling back to `ninja`
    pub fn executor_program(&self) -> PathBuf {
        self.executor
            .as_ref()
            .and_then(|e| e.program.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXECUTOR))
    }

    /// Parallel job count, if configured
    pub fn executor_jobs(&self) -> Option<usize> {
        self.executor.as_ref().and_then(|e| e.jobs)
    }

    /// Merge another global config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &GlobalConfig) {
        if other.executor.is_some() {
            self.executor = other.executor.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_config() {
        let toml = r#"
[executor]
program = "/opt/ninja/bin/ninja"
jobs = 8
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.executor_program(),
            PathBuf::from("/opt/ninja/bin/ninja")
        );
        assert_eq!(config.executor_jobs(), Some(8));
    }

    #[test]
    fn test_default_executor() {
        let config = GlobalConfig::default();
        assert_eq!(config.executor_program(), PathBuf::from("ninja"));
        assert_eq!(config.executor_jobs(), None);
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let config = GlobalConfig {
            executor: Some(ExecutorConfig {
                program: None,
                jobs: Some(0),
            }),
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_configs() {
        let mut base = GlobalConfig::default();
        let override_config = GlobalConfig {
            executor: Some(ExecutorConfig {
                program: Some(PathBuf::from("samu")),
                jobs: None,
            }),
        };

        base.merge(&override_config);
        assert_eq!(base.executor_program(), PathBuf::from("samu"));
    }
}
