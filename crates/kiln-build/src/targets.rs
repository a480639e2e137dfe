/// Build unit types
use crate::error::{BuildError, BuildResult};
use crate::paths::SourceLanguage;
use kiln_config::UnitConfig;
use std::path::PathBuf;

/// Kind of build unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Archive of object files
    StaticLibrary,
    /// Shared library
    DynamicLibrary,
    /// Executable program
    Executable,
}

impl RuleKind {
    /// Parse the document keyword for a rule kind
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "staticlib" => Some(Self::StaticLibrary),
            "dynamiclib" => Some(Self::DynamicLibrary),
            "exe" => Some(Self::Executable),
            _ => None,
        }
    }

    /// The document keyword for this rule kind
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::StaticLibrary => "staticlib",
            Self::DynamicLibrary => "dynamiclib",
            Self::Executable => "exe",
        }
    }

    /// Whether dependents link against this unit's artifact
    pub fn is_library(&self) -> bool {
        matches!(self, Self::StaticLibrary | Self::DynamicLibrary)
    }

    /// Whether this unit is produced by a link step
    pub fn is_linked(&self) -> bool {
        matches!(self, Self::DynamicLibrary | Self::Executable)
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// A named build unit as declared in the project document
#[derive(Debug, Clone, PartialEq)]
pub struct BuildUnit {
    pub name: String,
    pub kind: RuleKind,
    /// Artifact name before platform naming conventions
    pub output_name: String,
    /// Source directories, relative to the project root
    pub src_dirs: Vec<PathBuf>,
    pub include_paths: Vec<PathBuf>,
    pub library_paths: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub third_party_libraries: Vec<String>,
    /// Required unit names in declared order
    pub requires: Vec<String>,
    pub flags: Vec<String>,
    pub defines: Vec<String>,
}

impl BuildUnit {
    /// Create a new build unit
    pub fn new(name: impl Into<String>, kind: RuleKind, output_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
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

    /// Build a unit from its document entry
    pub fn from_config(config: &UnitConfig) -> BuildResult<Self> {
        let kind =
            RuleKind::from_keyword(&config.build_rule).ok_or_else(|| BuildError::UnknownBuildRule {
                unit: config.name.clone(),
                rule: config.build_rule.clone(),
            })?;

        Ok(Self {
            name: config.name.clone(),
            kind,
            output_name: config.output_name.clone(),
            src_dirs: config.src_dirs.clone(),
            include_paths: config.include_paths.clone(),
            library_paths: config.library_paths.clone(),
            libraries: config.libraries.clone(),
            third_party_libraries: config.third_party_libraries.clone(),
            requires: config.requires.clone(),
            flags: config.flags.clone(),
            defines: config.defines.clone(),
        })
    }

    pub fn with_src_dirs(mut self, src_dirs: Vec<PathBuf>) -> Self {
        self.src_dirs = src_dirs;
        self
    }

    pub fn with_include_paths(mut self, include_paths: Vec<PathBuf>) -> Self {
        self.include_paths = include_paths;
        self
    }

    pub fn with_libraries(mut self, libraries: Vec<String>) -> Self {
        self.libraries = libraries;
        self
    }

    /// Add requirements
    pub fn with_requires(mut self, requires: Vec<String>) -> Self {
        self.requires = requires;
        self
    }
}

/// One source file of a resolved unit and the object it compiles to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileInput {
    pub source: PathBuf,
    pub object: PathBuf,
    pub language: SourceLanguage,
}

/// A unit decorated with absolute directories and its build subdirectory
///
/// Constructed once per pass and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ResolvedUnit {
    pub name: String,
    pub kind: RuleKind,
    /// Declared artifact name
    pub output_name: String,
    /// Backend-specific artifact file name
    pub artifact: String,
    /// Unit build subdirectory (`<build root>/<name>`)
    pub build_dir: PathBuf,
    pub sources: Vec<CompileInput>,
    /// The unit's own include directories
    pub include_dirs: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub third_party_libraries: Vec<String>,
    pub requires: Vec<String>,
    /// Project flags followed by unit flags
    pub flags: Vec<String>,
    /// Project defines followed by unit defines
    pub defines: Vec<String>,
}

impl ResolvedUnit {
    /// Absolute path of the unit's artifact
    pub fn artifact_path(&self) -> PathBuf {
        self.build_dir.join(&self.artifact)
    }

    /// Object files in source order
    pub fn objects(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|s| s.object.clone()).collect()
    }
}
