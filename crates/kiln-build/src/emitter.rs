//! Build plan emission and atomic commit
//!
//! A pass renders every plan file into a [`BuildPlan`] held in memory. Nothing
//! touches the disk until [`BuildPlan::commit`], which writes each file through
//! a temporary file in the same directory and skips files whose content hash
//! is unchanged so their timestamps stay put.

use crate::backend::{Backend, LinkContext};
use crate::error::{BuildError, BuildResult};
use crate::ninja::{Edge, NinjaWriter};
use crate::targets::ResolvedUnit;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Per-unit plan holding rules, variables and edges
pub const UNIT_PLAN: &str = "unit.ninja";
/// Entry plan of a unit and of the build root
pub const ENTRY_PLAN: &str = "build.ninja";
/// Compilation database at the build root
pub const COMPILE_DATABASE: &str = "compile_commands.json";
/// Root plan alias covering every unit
pub const ALL_TARGET: &str = "all";

/// One entry of the compilation database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    pub directory: PathBuf,
    pub command: String,
    pub file: PathBuf,
    pub output: PathBuf,
}

/// Outcome of committing a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Files created or replaced
    pub written: usize,
    /// Files left in place because their content matched
    pub unchanged: usize,
}

/// Every file of a plan, keyed by absolute path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    files: BTreeMap<PathBuf, String>,
}

impl BuildPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: String) {
        self.files.insert(path.into(), contents);
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Files in path order
    pub fn files(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().map(|(p, c)| (p.as_path(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file, replacing each atomically
    pub fn commit(&self) -> BuildResult<CommitStats> {
        let mut stats = CommitStats::default();

        for (path, contents) in &self.files {
            if content_matches(path, contents) {
                debug!(path = %path.display(), "plan file unchanged");
                stats.unchanged += 1;
                continue;
            }

            write_atomic(path, contents)?;
            debug!(path = %path.display(), "plan file written");
            stats.written += 1;
        }

        Ok(stats)
    }
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn content_matches(path: &Path, contents: &str) -> bool {
    match fs::read(path) {
        Ok(existing) => digest(&existing) == digest(contents.as_bytes()),
        Err(_) => false,
    }
}

fn write_atomic(path: &Path, contents: &str) -> BuildResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;

    let mut temp =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| BuildError::io(parent, e))?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| BuildError::io(temp.path(), e))?;
    temp.persist(path).map_err(|e| BuildError::io(path, e.error))?;
    Ok(())
}

/// Render a unit's `unit.ninja`
pub fn unit_plan(
    backend: &Backend,
    unit: &ResolvedUnit,
    context: &LinkContext,
) -> BuildResult<String> {
    let edges = backend.edges(unit, context)?;
    let mut writer = NinjaWriter::new();

    writer.comment(&format!(
        "{} ({}), generated by kiln. Do not edit.",
        unit.name, unit.kind
    ));
    writer.newline();

    for (key, value) in backend.unit_variables(unit, context) {
        writer.variable(&key, &value);
    }
    writer.newline();

    for rule in backend.rules() {
        writer.rule(&rule);
    }
    for edge in &edges {
        writer.build(edge);
    }

    Ok(writer.finish())
}

/// Render a unit's entry `build.ninja`
///
/// `requirements` are the unit plans of its transitive requirements in build
/// order; each is included exactly once, followed by the unit's own plan.
/// Every entry plan keeps its log and deps database in `build_root`, shared
/// with the root plan.
pub fn entry_plan(name: &str, build_root: &Path, requirements: &[PathBuf], own: &Path) -> String {
    let mut writer = NinjaWriter::new();
    writer.comment(&format!(
        "Entry plan for {}, generated by kiln. Do not edit.",
        name
    ));
    writer.newline();
    writer.variable("builddir", &build_root.display().to_string());
    writer.newline();

    for plan in requirements {
        writer.subninja(plan);
    }
    writer.subninja(own);
    writer.newline();
    writer.defaults(&[name]);

    writer.finish()
}

/// Render the build root's `build.ninja` covering every unit
pub fn root_plan(build_root: &Path, units: &[(String, PathBuf)]) -> String {
    let mut writer = NinjaWriter::new();
    writer.comment("Project plan, generated by kiln. Do not edit.");
    writer.newline();
    writer.variable("builddir", &build_root.display().to_string());
    writer.newline();

    for (_, plan) in units {
        writer.subninja(plan);
    }
    writer.newline();

    let names: Vec<PathBuf> = units.iter().map(|(n, _)| PathBuf::from(n)).collect();
    writer.build(&Edge::phony(ALL_TARGET, names));
    writer.defaults(&[ALL_TARGET]);

    writer.finish()
}

/// Compilation database entries for one unit
pub fn compile_commands(
    backend: &Backend,
    unit: &ResolvedUnit,
    context: &LinkContext,
) -> Vec<CompileCommand> {
    backend
        .compile(unit)
        .iter()
        .zip(&unit.sources)
        .map(|(edge, input)| CompileCommand {
            directory: unit.build_dir.clone(),
            command: backend.compile_command(unit, context, edge),
            file: input.source.clone(),
            output: input.object.clone(),
        })
        .collect()
}

/// Render the compilation database
pub fn compile_database(entries: &[CompileCommand]) -> BuildResult<String> {
    let mut json = serde_json::to_string_pretty(entries).map_err(|e| {
        BuildError::io(
            COMPILE_DATABASE,
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })?;
    json.push('\n');
    Ok(json)
}
