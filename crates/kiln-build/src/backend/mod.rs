//! Toolchain backends
//!
//! A [`Backend`] is built once per planning pass from the project's compiler
//! frontend and toolchain programs, then handed to every synthesis call. The
//! platform differences (artifact naming, flag spelling, rule templates,
//! runtime search paths) live in the `gcc`, `msvc` and `darwin` modules and are
//! selected by matching on [`Frontend`].

mod darwin;
mod gcc;
mod msvc;

use crate::error::{BuildError, BuildResult};
use crate::ninja::{self, Edge, Rule};
use crate::paths::SourceLanguage;
use crate::rpath::{self, OriginMarker};
use crate::targets::{ResolvedUnit, RuleKind};
use kiln_config::ProjectConfig;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Rule names shared by every backend
pub const COMPILE_RULE: &str = "compile";
pub const ARCHIVE_RULE: &str = "archive";
pub const LINK_EXE_RULE: &str = "link_exe";
pub const LINK_SHARED_RULE: &str = "link_shared";

/// Compiler frontend family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frontend {
    /// GCC and clang on ELF platforms
    Gcc,
    /// `cl.exe` and compatible
    Msvc,
    /// clang on macOS
    Darwin,
}

impl Frontend {
    /// Parse the document keyword (`gcc`, `msvc`, `osx`)
    pub fn parse(keyword: &str) -> BuildResult<Self> {
        match keyword {
            "gcc" => Ok(Self::Gcc),
            "msvc" => Ok(Self::Msvc),
            "osx" => Ok(Self::Darwin),
            other => Err(BuildError::UnknownFrontend(other.to_string())),
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Gcc => "gcc",
            Self::Msvc => "msvc",
            Self::Darwin => "osx",
        }
    }

    /// Extension of object files
    pub fn object_extension(&self) -> &'static str {
        match self {
            Self::Gcc | Self::Darwin => "o",
            Self::Msvc => "obj",
        }
    }
}

impl FromStr for Frontend {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Frontend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Compiler, C compiler and archiver programs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub cxx: String,
    pub cc: String,
    pub ar: String,
}

impl Toolchain {
    pub fn new(cxx: impl Into<String>, cc: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            cxx: cxx.into(),
            cc: cc.into(),
            ar: ar.into(),
        }
    }
}

/// A required unit as seen from a dependent's link step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDependency {
    pub name: String,
    pub kind: RuleKind,
    pub output_name: String,
    /// Backend-specific artifact file name
    pub artifact: String,
    pub build_dir: PathBuf,
}

impl LinkDependency {
    pub fn from_unit(unit: &ResolvedUnit) -> Self {
        Self {
            name: unit.name.clone(),
            kind: unit.kind,
            output_name: unit.output_name.clone(),
            artifact: unit.artifact.clone(),
            build_dir: unit.build_dir.clone(),
        }
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.build_dir.join(&self.artifact)
    }
}

/// Inputs a unit inherits from its transitive requirements
#[derive(Debug, Clone, Default)]
pub struct LinkContext {
    /// Transitive requirements in link order
    pub dependencies: Vec<LinkDependency>,
    /// Own include directories followed by those of the requirements, deduplicated
    pub include_dirs: Vec<PathBuf>,
}

impl LinkContext {
    /// Required units whose artifacts are linked
    pub fn libraries(&self) -> impl Iterator<Item = &LinkDependency> {
        self.dependencies.iter().filter(|d| d.kind.is_library())
    }

    /// Build directories of required dynamic libraries
    pub fn dynamic_library_dirs(&self) -> Vec<PathBuf> {
        self.dependencies
            .iter()
            .filter(|d| d.kind == RuleKind::DynamicLibrary)
            .map(|d| d.build_dir.clone())
            .collect()
    }
}

/// Toolchain backend for one planning pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    frontend: Frontend,
    toolchain: Toolchain,
}

impl Backend {
    pub fn new(frontend: Frontend, toolchain: Toolchain) -> Self {
        Self {
            frontend,
            toolchain,
        }
    }

    /// Backend for a project document
    pub fn from_project(project: &ProjectConfig) -> BuildResult<Self> {
        let frontend = Frontend::parse(&project.compiler_frontend)?;
        let toolchain = Toolchain::new(&project.cxx, &project.cc, &project.ar);
        Ok(Self::new(frontend, toolchain))
    }

    pub fn frontend(&self) -> Frontend {
        self.frontend
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Artifact file name for a unit kind and declared output name
    pub fn artifact_name(&self, kind: RuleKind, output_name: &str) -> String {
        match self.frontend {
            Frontend::Gcc => gcc::artifact_name(kind, output_name),
            Frontend::Msvc => msvc::artifact_name(kind, output_name),
            Frontend::Darwin => darwin::artifact_name(kind, output_name),
        }
    }

    /// Object file for a source, placed in the unit's build directory
    pub fn object_path(&self, build_dir: &Path, source: &Path) -> PathBuf {
        let stem = source.file_stem().unwrap_or(source.as_os_str());
        let mut object = build_dir.join(stem);
        object.set_extension(self.frontend.object_extension());
        object
    }

    /// The compile, archive and link rules
    pub fn rules(&self) -> Vec<Rule> {
        match self.frontend {
            Frontend::Gcc => gcc::rules(),
            Frontend::Msvc => msvc::rules(),
            Frontend::Darwin => darwin::rules(),
        }
    }

    fn rule(&self, name: &str) -> Option<Rule> {
        self.rules().into_iter().find(|r| r.name == name)
    }

    /// File-scope variables of a unit's plan, referenced by the rules
    pub fn unit_variables(
        &self,
        unit: &ResolvedUnit,
        context: &LinkContext,
    ) -> Vec<(String, String)> {
        vec![
            ("cxx".to_string(), quote(&self.toolchain.cxx)),
            ("cc".to_string(), quote(&self.toolchain.cc)),
            ("ar".to_string(), quote(&self.toolchain.ar)),
            ("flags".to_string(), self.compile_flags(unit).join(" ")),
            ("defines".to_string(), unit.defines.join(" ")),
            ("includes".to_string(), self.include_flags(context).join(" ")),
        ]
    }

    /// Unit flags plus any the frontend requires for the unit kind
    pub fn compile_flags(&self, unit: &ResolvedUnit) -> Vec<String> {
        let extra: &[&str] = match self.frontend {
            Frontend::Gcc => gcc::compile_flags(unit.kind),
            Frontend::Msvc | Frontend::Darwin => &[],
        };
        unit.flags
            .iter()
            .cloned()
            .chain(extra.iter().map(|f| f.to_string()))
            .collect()
    }

    pub fn include_flags(&self, context: &LinkContext) -> Vec<String> {
        context
            .include_dirs
            .iter()
            .map(|dir| match self.frontend {
                Frontend::Gcc | Frontend::Darwin => gcc::include_flag(dir),
                Frontend::Msvc => msvc::include_flag(dir),
            })
            .collect()
    }

    fn library_path_flag(&self, dir: &Path) -> String {
        match self.frontend {
            Frontend::Gcc | Frontend::Darwin => gcc::library_path_flag(dir),
            Frontend::Msvc => msvc::library_path_flag(dir),
        }
    }

    fn library_flag(&self, library: &str) -> String {
        match self.frontend {
            Frontend::Gcc => gcc::library_flag(library),
            Frontend::Msvc => msvc::library_flag(library),
            Frontend::Darwin => darwin::library_flag(library),
        }
    }

    fn dependency_flag(&self, dependency: &LinkDependency) -> String {
        match self.frontend {
            Frontend::Gcc => gcc::library_flag(&dependency.artifact),
            Frontend::Msvc => msvc::dependency_flag(dependency),
            Frontend::Darwin => darwin::library_flag(&dependency.output_name),
        }
    }

    fn origin_marker(&self, kind: RuleKind) -> Option<OriginMarker> {
        match self.frontend {
            Frontend::Gcc => Some(OriginMarker::Origin),
            Frontend::Msvc => None,
            Frontend::Darwin => darwin::origin_marker(kind),
        }
    }

    /// Runtime search path list for a linked unit, if it needs one
    pub fn runtime_search_path(
        &self,
        unit: &ResolvedUnit,
        context: &LinkContext,
    ) -> Option<String> {
        let marker = self.origin_marker(unit.kind)?;
        rpath::search_path(marker, &unit.build_dir, &context.dynamic_library_dirs())
    }

    /// Linker flags embedding the runtime search path
    pub fn runtime_search_flags(&self, unit: &ResolvedUnit, context: &LinkContext) -> Vec<String> {
        let Some(marker) = self.origin_marker(unit.kind) else {
            return Vec::new();
        };
        let entries =
            rpath::search_entries(marker, &unit.build_dir, &context.dynamic_library_dirs());
        if entries.is_empty() {
            return Vec::new();
        }

        match self.frontend {
            Frontend::Darwin => entries.iter().map(|e| rpath::linker_flag(e)).collect(),
            Frontend::Gcc | Frontend::Msvc => vec![rpath::linker_flag(&entries.join(":"))],
        }
    }

    /// Linker arguments in their fixed order
    ///
    /// Runtime search path, then each required library in link order, then
    /// declared library paths and libraries, then third-party libraries.
    pub fn linker_args(&self, unit: &ResolvedUnit, context: &LinkContext) -> Vec<String> {
        let mut args = Vec::new();

        args.extend(self.runtime_search_flags(unit, context));

        for dependency in context.libraries() {
            args.push(self.library_path_flag(&dependency.build_dir));
            args.push(self.dependency_flag(dependency));
        }

        for dir in &unit.library_dirs {
            args.push(self.library_path_flag(dir));
        }
        for library in unit.libraries.iter().chain(&unit.third_party_libraries) {
            args.push(self.library_flag(library));
        }

        args
    }

    /// Files a dependent's link step must wait for
    fn dependency_inputs(&self, dependency: &LinkDependency) -> Vec<PathBuf> {
        match self.frontend {
            Frontend::Msvc => msvc::dependency_inputs(dependency),
            Frontend::Gcc | Frontend::Darwin => vec![dependency.artifact_path()],
        }
    }

    /// One compile edge per source
    pub fn compile(&self, unit: &ResolvedUnit) -> Vec<Edge> {
        unit.sources
            .iter()
            .map(|input| {
                Edge::new(COMPILE_RULE, vec![input.object.clone()], vec![input.source.clone()])
                    .with_variable("compiler", self.compiler_for(input.language))
            })
            .collect()
    }

    fn compiler_for(&self, language: SourceLanguage) -> String {
        match language {
            SourceLanguage::Cpp => quote(&self.toolchain.cxx),
            SourceLanguage::C => quote(&self.toolchain.cc),
        }
    }

    /// Archive edge over all of a static library's objects
    pub fn archive(&self, unit: &ResolvedUnit) -> BuildResult<Edge> {
        if unit.kind != RuleKind::StaticLibrary {
            return Err(BuildError::unsupported(&unit.name, unit.kind, "archive"));
        }
        Ok(Edge::new(
            ARCHIVE_RULE,
            vec![unit.artifact_path()],
            unit.objects(),
        ))
    }

    /// Link edge for an executable or dynamic library
    pub fn link(&self, unit: &ResolvedUnit, context: &LinkContext) -> BuildResult<Edge> {
        let rule = match unit.kind {
            RuleKind::Executable => LINK_EXE_RULE,
            RuleKind::DynamicLibrary => LINK_SHARED_RULE,
            RuleKind::StaticLibrary => {
                return Err(BuildError::unsupported(&unit.name, unit.kind, "link"));
            }
        };

        let implicit_inputs = context
            .libraries()
            .flat_map(|d| self.dependency_inputs(d))
            .collect();

        let mut edge = Edge::new(rule, vec![unit.artifact_path()], unit.objects())
            .with_implicit_inputs(implicit_inputs)
            .with_variable("linker_args", self.linker_args(unit, context).join(" "));

        match (self.frontend, unit.kind) {
            (Frontend::Msvc, RuleKind::DynamicLibrary) => {
                edge = edge
                    .with_implicit_outputs(msvc::import_files(&unit.build_dir, &unit.artifact));
            }
            (Frontend::Darwin, RuleKind::DynamicLibrary) => {
                edge = edge.with_variable("install_name", darwin::install_name(&unit.artifact));
            }
            _ => {}
        }

        Ok(edge)
    }

    /// Every edge of a unit: compiles, archive or link, and the name alias
    pub fn edges(&self, unit: &ResolvedUnit, context: &LinkContext) -> BuildResult<Vec<Edge>> {
        let mut edges = self.compile(unit);
        let product = match unit.kind {
            RuleKind::StaticLibrary => self.archive(unit)?,
            RuleKind::DynamicLibrary | RuleKind::Executable => self.link(unit, context)?,
        };
        edges.push(product);
        edges.push(Edge::phony(&unit.name, vec![unit.artifact_path()]));
        Ok(edges)
    }

    /// Fully expanded compile command for one source of a unit
    pub fn compile_command(
        &self,
        unit: &ResolvedUnit,
        context: &LinkContext,
        edge: &Edge,
    ) -> String {
        let variables = self.unit_variables(unit, context);
        let command = self
            .rule(COMPILE_RULE)
            .map(|r| r.command)
            .unwrap_or_default();

        ninja::expand(&command, |name| match name {
            "in" => edge.inputs.first().map(|p| p.display().to_string()),
            "out" => edge.outputs.first().map(|p| p.display().to_string()),
            _ => edge
                .variable(name)
                .map(str::to_string)
                .or_else(|| {
                    variables
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| v.clone())
                }),
        })
    }
}

/// Quote a command argument containing whitespace
pub(crate) fn quote(arg: &str) -> String {
    if arg.contains(char::is_whitespace) {
        format!("\"{}\"", arg)
    } else {
        arg.to_string()
    }
}
