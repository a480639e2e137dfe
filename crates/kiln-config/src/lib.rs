//! kiln configuration
//!
//! Loads the inputs of a graph-compilation pass:
//! - Project document (kiln.toml)
//! - Global user configuration (~/.kiln/config.toml)
//! - Environment overrides (KILN_*)
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. Global config (~/.kiln/config.toml)
//! 2. Project document (./kiln.toml)
//! 3. Environment variables (KILN_*)
//!
//! # Example
//!
//! ```no_run
//! use kiln_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("{} units", config.project.builds.len());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Name of the project document looked up by the loader
pub const PROJECT_FILE_NAME: &str = "kiln.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use global::{ExecutorConfig, GlobalConfig};
pub use loader::{Config, ConfigLoader};
pub use project::{ProjectConfig, UnitConfig};
