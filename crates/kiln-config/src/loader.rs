//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::{ExecutorConfig, GlobalConfig};
use crate::project::ProjectConfig;
use crate::{ConfigError, ConfigResult, PROJECT_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

/// Default build output root, relative to the project root
pub const DEFAULT_BUILD_DIR: &str = "builds";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.kiln/config.toml) - lowest priority
/// 2. Project document (./kiln.toml) - overrides global
/// 3. Environment variables (KILN_*) - overrides both
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project document
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Directory containing kiln.toml
    pub manifest_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config file instead of ~/.kiln/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find kiln.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (manifest_dir, project) = self.find_project_config(start_dir)?;
        self.finish(manifest_dir, project)
    }

    /// Load configuration from a specific project document
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project = ProjectConfig::load_from_file(config_path)?;
        let manifest_dir = config_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        self.finish(manifest_dir, project)
    }

    fn finish(&mut self, manifest_dir: PathBuf, project: ProjectConfig) -> ConfigResult<Config> {
        // Global config is optional
        let mut global = self.load_global_config().unwrap_or_default();

        let project = self.apply_env_overrides(project)?;
        apply_executor_env_overrides(&mut global);

        Ok(Config {
            project,
            global,
            manifest_dir,
        })
    }

    /// Find the project document by walking up the directory tree
    fn find_project_config(&self, start_dir: &Path) -> ConfigResult<(PathBuf, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_FILE_NAME);

            if config_path.exists() {
                let project = ProjectConfig::load_from_file(&config_path)?;
                return Ok((current, project));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(ConfigError::NotFound(start_dir.join(PROJECT_FILE_NAME))),
            }
        }
    }

    /// Load global configuration from ~/.kiln/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to the project document
    ///
    /// KILN_CXX, KILN_CC, KILN_AR, KILN_FRONTEND and KILN_BUILD_DIR replace
    /// the matching document fields.
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Some(cxx) = non_empty_var("KILN_CXX") {
            config.cxx = cxx;
        }
        if let Some(cc) = non_empty_var("KILN_CC") {
            config.cc = cc;
        }
        if let Some(ar) = non_empty_var("KILN_AR") {
            config.ar = ar;
        }
        if let Some(frontend) = non_empty_var("KILN_FRONTEND") {
            config.compiler_frontend = frontend.to_lowercase();
        }
        if let Some(build_dir) = non_empty_var("KILN_BUILD_DIR") {
            config.build_dir = Some(PathBuf::from(build_dir));
        }

        config.validate()?;
        Ok(config)
    }

    /// Get the global configuration directory (~/.kiln)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".kiln"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_executor_env_overrides(global: &mut GlobalConfig) {
    if let Some(program) = non_empty_var("KILN_NINJA") {
        global
            .executor
            .get_or_insert_with(ExecutorConfig::default)
            .program = Some(PathBuf::from(program));
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Build a config from an in-memory project document rooted at `manifest_dir`
    pub fn from_project(project: ProjectConfig, manifest_dir: impl Into<PathBuf>) -> Self {
        Self {
            project,
            global: GlobalConfig::default(),
            manifest_dir: manifest_dir.into(),
        }
    }

    /// The project root: `projectRoot` resolved against the manifest directory
    pub fn project_root(&self) -> PathBuf {
        match &self.project.project_root {
            Some(root) => self.manifest_dir.join(root),
            None => self.manifest_dir.clone(),
        }
    }

    /// The build output root: `buildDir` resolved against the project root
    pub fn build_dir(&self) -> PathBuf {
        let build_dir = self
            .project
            .build_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR));
        self.project_root().join(build_dir)
    }
}
