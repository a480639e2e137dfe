//! Runtime library search paths relative to the loading binary
//!
//! Computed from the build directory layout alone, so the resulting binaries
//! can be relocated together with their build tree.

use crate::paths::to_slash;
use std::path::{Path, PathBuf};

/// Origin marker understood by the dynamic loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginMarker {
    /// `$ORIGIN`, ELF loaders
    Origin,
    /// `@executable_path`, Darwin executables
    ExecutablePath,
    /// `@loader_path`, Darwin dynamic libraries
    LoaderPath,
}

impl OriginMarker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Origin => "$ORIGIN",
            Self::ExecutablePath => "@executable_path",
            Self::LoaderPath => "@loader_path",
        }
    }
}

/// Search entries: the bare marker, then one entry per dependency dir
///
/// Empty when there are no dynamic dependencies.
pub fn search_entries(
    marker: OriginMarker,
    unit_dir: &Path,
    dependency_dirs: &[PathBuf],
) -> Vec<String> {
    if dependency_dirs.is_empty() {
        return Vec::new();
    }

    let mut entries = vec![marker.as_str().to_string()];
    for dir in dependency_dirs {
        let relative = pathdiff::diff_paths(dir, unit_dir).unwrap_or_else(|| dir.clone());
        let entry = if relative.as_os_str().is_empty() {
            marker.as_str().to_string()
        } else {
            format!("{}/{}", marker.as_str(), to_slash(&relative))
        };
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }

    entries
}

/// `:`-joined search list, `None` when there are no dynamic dependencies
pub fn search_path(
    marker: OriginMarker,
    unit_dir: &Path,
    dependency_dirs: &[PathBuf],
) -> Option<String> {
    let entries = search_entries(marker, unit_dir, dependency_dirs);
    (!entries.is_empty()).then(|| entries.join(":"))
}

/// Linker argument embedding a search list or a single entry
///
/// ELF loaders split a `:`-joined list; Darwin records every `-rpath` as one
/// literal entry, so it needs one flag per entry.
pub fn linker_flag(search_path: &str) -> String {
    format!("-Wl,-rpath,'{}'", search_path)
}
