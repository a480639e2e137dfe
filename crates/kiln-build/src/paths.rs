//! Project-relative path resolution and source discovery
//!
//! Every directory a unit declares is resolved against the project root once,
//! lexically normalized, and checked for existence. Resolved paths are absolute
//! so emitted plans do not depend on the executor's working directory.

use crate::error::{BuildError, BuildResult};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Language of a source file, selected by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    /// `.c`, compiled with the C compiler
    C,
    /// `.cpp`, `.cc`, `.cxx`, compiled with the C++ compiler
    Cpp,
}

impl SourceLanguage {
    /// Classify a path by extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("c") => Some(Self::C),
            Some("cpp" | "cc" | "cxx") => Some(Self::Cpp),
            _ => None,
        }
    }
}

/// Resolves unit directories against a project root
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for the given project root
    ///
    /// Relative roots are anchored at the current directory.
    pub fn new(root: impl AsRef<Path>) -> BuildResult<Self> {
        let root = root.as_ref();
        let root = if root.is_absolute() {
            normalize(root)
        } else {
            let cwd = std::env::current_dir().map_err(|e| BuildError::io(root, e))?;
            normalize(&cwd.join(root))
        };

        if !root.is_dir() {
            return Err(BuildError::io(
                &root,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "project root is not a directory",
                ),
            ));
        }

        Ok(Self { root })
    }

    /// The absolute project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path against the root without checking that it exists
    pub fn join(&self, path: &Path) -> PathBuf {
        normalize(&self.root.join(path))
    }

    /// Resolve one declared directory, failing if it does not exist
    pub fn resolve_dir(&self, unit: &str, dir: &Path) -> BuildResult<PathBuf> {
        let resolved = self.join(dir);
        if !resolved.is_dir() {
            return Err(BuildError::DirectoryNotFound {
                unit: unit.to_string(),
                path: resolved,
            });
        }
        Ok(resolved)
    }

    /// Resolve a list of declared directories, preserving order
    pub fn resolve_dirs(&self, unit: &str, dirs: &[PathBuf]) -> BuildResult<Vec<PathBuf>> {
        dirs.iter().map(|d| self.resolve_dir(unit, d)).collect()
    }

    /// Discover the source files directly inside already-resolved directories
    ///
    /// Files come back grouped by directory in declared order, sorted by file
    /// name within each directory. An empty result is a `NoSourceFiles` error.
    pub fn source_files(&self, unit: &str, dirs: &[PathBuf]) -> BuildResult<Vec<PathBuf>> {
        let mut sources = Vec::new();

        for dir in dirs {
            for entry in WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .follow_links(true)
                .sort_by_file_name()
            {
                let entry = entry.map_err(|e| BuildError::io(dir, e.into()))?;
                if entry.file_type().is_file() && SourceLanguage::from_path(entry.path()).is_some()
                {
                    sources.push(entry.into_path());
                }
            }
        }

        if sources.is_empty() {
            return Err(BuildError::NoSourceFiles {
                unit: unit.to_string(),
                dirs: dirs.to_vec(),
            });
        }

        Ok(sources)
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into parents
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

/// Render a path with forward slashes for use inside command arguments
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
