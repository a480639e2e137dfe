//! Project Document (kiln.toml)
//!
//! The declarative description of a project's build units. Keys are camelCase
//! to match the document format; every optional list defaults to empty here so
//! downstream code never re-derives defaults.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project document from kiln.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ProjectConfig {
    /// C++ compiler (also drives linking)
    pub cxx: String,

    /// C compiler, used for `.c` sources
    pub cc: String,

    /// Archiver for static libraries
    pub ar: String,

    /// Compiler frontend: "gcc", "msvc" or "osx"
    pub compiler_frontend: String,

    /// Flags passed to every compile and link command
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,

    /// Preprocessor defines passed to every compile command
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub defines: Vec<String>,

    /// Project root, relative to the directory holding kiln.toml
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,

    /// Build output root, relative to the project root (default: "builds")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<PathBuf>,

    /// Build units in declaration order
    pub builds: Vec<UnitConfig>,
}

/// A single `[[builds]]` entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UnitConfig {
    /// Unique unit name
    pub name: String,

    /// "staticlib", "dynamiclib" or "exe"
    pub build_rule: String,

    /// Artifact file name before platform naming conventions
    pub output_name: String,

    /// Source directories, relative to the project root
    pub src_dirs: Vec<PathBuf>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_paths: Vec<PathBuf>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub library_paths: Vec<PathBuf>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub third_party_libraries: Vec<String>,

    /// Names of units this unit depends on, in declared order
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    /// Extra flags appended after the project flags
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,

    /// Extra defines appended after the project defines
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub defines: Vec<String>,
}

impl ProjectConfig {
    /// Create a project document with the given toolchain and no units
    pub fn new(
        cxx: impl Into<String>,
        cc: impl Into<String>,
        ar: impl Into<String>,
        compiler_frontend: impl Into<String>,
    ) -> Self {
        Self {
            cxx: cxx.into(),
            cc: cc.into(),
            ar: ar.into(),
            compiler_frontend: compiler_frontend.into(),
            flags: Vec::new(),
            defines: Vec::new(),
            project_root: None,
            build_dir: None,
            builds: Vec::new(),
        }
    }

    /// Set project-wide flags
    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    /// Set project-wide defines
    pub fn with_defines(mut self, defines: Vec<String>) -> Self {
        self.defines = defines;
        self
    }

    /// Set the build output root
    pub fn with_build_dir(mut self, build_dir: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(build_dir.into());
        self
    }

    /// Append a build unit
    pub fn with_unit(mut self, unit: UnitConfig) -> Self {
        self.builds.push(unit);
        self
    }

    /// Load a project document from a file
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

    /// Structural validation only; graph checks happen in the build core.
    pub fn validate(&self) -> ConfigResult<()> {
        require_non_empty("cxx", &self.cxx)?;
        require_non_empty("cc", &self.cc)?;
        require_non_empty("ar", &self.ar)?;
        require_non_empty("compilerFrontend", &self.compiler_frontend)?;

        if self.builds.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "builds".to_string(),
                reason: "at least one build unit is required".to_string(),
            });
        }

        for (index, unit) in self.builds.iter().enumerate() {
            unit.validate(index)?;
        }

        Ok(())
    }

    /// Look up a unit by name
    pub fn unit(&self, name: &str) -> Option<&UnitConfig> {
        self.builds.iter().find(|u| u.name == name)
    }

    /// Names of all units in declaration order
    pub fn unit_names(&self) -> Vec<&str> {
        self.builds.iter().map(|u| u.name.as_str()).collect()
    }
}

impl UnitConfig {
    /// Create a unit with a single source directory
    pub fn new(
        name: impl Into<String>,
        build_rule: impl Into<String>,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            build_rule: build_rule.into(),
            output_name: output_name.into(),
            src_dirs: Vec::new(),
            include_paths: Vec::new(),
            library_paths: Vec::new(),
            libraries: Vec::new(),
            third_party_libraries: Vec::new(),
            requires: Vec::new(),
            flags: Vec::new(),
            defines: Vec::new(),
        }
    }

    pub fn with_src_dirs(mut self, src_dirs: Vec<PathBuf>) -> Self {
        self.src_dirs = src_dirs;
        self
    }

    pub fn with_include_paths(mut self, include_paths: Vec<PathBuf>) -> Self {
        self.include_paths = include_paths;
        self
    }

    pub fn with_library_paths(mut self, library_paths: Vec<PathBuf>) -> Self {
        self.library_paths = library_paths;
        self
    }

    pub fn with_libraries(mut self, libraries: Vec<String>) -> Self {
        self.libraries = libraries;
        self
    }

    pub fn with_third_party_libraries(mut self, libraries: Vec<String>) -> Self {
        self.third_party_libraries = libraries;
        self
    }

    pub fn with_requires(mut self, requires: Vec<String>) -> Self {
        self.requires = requires;
        self
    }

    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_defines(mut self, defines: Vec<String>) -> Self {
        self.defines = defines;
        self
    }

    fn validate(&self, index: usize) -> ConfigResult<()> {
        let field = |name: &str| format!("builds[{}].{}", index, name);

        if self.name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field("name"),
                reason: "name cannot be empty".to_string(),
            });
        }

        if self.output_name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field("outputName"),
                reason: format!("unit '{}' has an empty output name", self.name),
            });
        }

        if self.src_dirs.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field("srcDirs"),
                reason: format!("unit '{}' must list at least one source directory", self.name),
            });
        }

        if self.requires.iter().any(|r| r.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: field("requires"),
                reason: format!("unit '{}' has an empty requirement", self.name),
            });
        }

        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "value cannot be empty".to_string(),
        });
    }
    Ok(())
}
