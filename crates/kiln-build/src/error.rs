/// Build graph compiler error types
use kiln_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Duplicate unit name '{name}': unit names must be unique")]
    DuplicateUnit { name: String },

    #[error("Invalid unit name '{name}': {reason}")]
    InvalidUnitName { name: String, reason: &'static str },

    #[error("Unit not found: {name}{}", format_required_by(.required_by))]
    UnitNotFound {
        name: String,
        required_by: Option<String>,
    },

    #[error("Circular dependency detected: {0}")]
    CyclicDependency(String),

    #[error("Unit '{unit}' has no source files in {}", format_dirs(.dirs))]
    NoSourceFiles { unit: String, dirs: Vec<PathBuf> },

    #[error("Directory declared by unit '{unit}' does not exist: {}", .path.display())]
    DirectoryNotFound { unit: String, path: PathBuf },

    #[error(
        "Unknown build rule '{rule}' for unit '{unit}': expected exe, staticlib or dynamiclib"
    )]
    UnknownBuildRule { unit: String, rule: String },

    #[error("Unknown compiler frontend '{0}': expected gcc, msvc or osx")]
    UnknownFrontend(String),

    #[error("Sources of unit '{unit}' collide on object file {}", .object.display())]
    ObjectCollision { unit: String, object: PathBuf },

    #[error("Cannot {operation} unit '{unit}' of kind {kind}")]
    UnsupportedOperation {
        unit: String,
        kind: String,
        operation: &'static str,
    },

    #[error("Failed to start build executor '{program}': {error}")]
    ExecutorSpawn { program: String, error: String },

    #[error("Build of '{target}' failed with exit code {exit_code}:\n{output}")]
    ExecutorFailed {
        target: String,
        exit_code: i32,
        output: String,
    },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a unit not found error
    pub fn unit_not_found(name: impl Into<String>) -> Self {
        Self::UnitNotFound {
            name: name.into(),
            required_by: None,
        }
    }

    /// Create a unit not found error naming the unit that required it
    pub fn missing_requirement(name: impl Into<String>, required_by: impl Into<String>) -> Self {
        Self::UnitNotFound {
            name: name.into(),
            required_by: Some(required_by.into()),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(
        unit: impl Into<String>,
        kind: impl ToString,
        operation: &'static str,
    ) -> Self {
        Self::UnsupportedOperation {
            unit: unit.into(),
            kind: kind.to_string(),
            operation,
        }
    }

    /// Whether this error was detected before any plan was written
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::DuplicateUnit { .. }
                | Self::InvalidUnitName { .. }
                | Self::UnitNotFound { .. }
                | Self::CyclicDependency(_)
                | Self::NoSourceFiles { .. }
                | Self::DirectoryNotFound { .. }
                | Self::UnknownBuildRule { .. }
                | Self::UnknownFrontend(_)
                | Self::ObjectCollision { .. }
        )
    }
}

fn format_required_by(required_by: &Option<String>) -> String {
    required_by
        .as_ref()
        .map(|r| format!(" (required by {})", r))
        .unwrap_or_default()
}

fn format_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
