//! kiln build graph compiler
//!
//! Compiles a project of native build units into Ninja plans:
//! - Unit registry and dependency graph (build order, link order, cycles)
//! - GCC, MSVC and Darwin toolchain backends
//! - Origin-relative runtime search paths
//! - Per-unit plans with entry plans, a root plan and a compilation database
//! - Atomic, content-addressed plan commits
//! - Executor invocation by unit name

pub mod backend;
pub mod build_order;
pub mod builder;
pub mod emitter;
pub mod error;
pub mod executor;
pub mod ninja;
pub mod paths;
pub mod planner;
pub mod registry;
pub mod rpath;
pub mod targets;

// Re-export main types
pub use backend::{Backend, Frontend, LinkContext, LinkDependency, Toolchain};
pub use build_order::DependencyGraph;
pub use builder::{BuildContext, BuildStats, Builder};
pub use emitter::{BuildPlan, CommitStats, CompileCommand, ALL_TARGET};
pub use error::{BuildError, BuildResult};
pub use executor::{ExecutionOutput, Executor};
pub use paths::{PathResolver, SourceLanguage};
pub use planner::{PlannedBuild, Planner};
pub use registry::UnitRegistry;
pub use targets::{BuildUnit, CompileInput, ResolvedUnit, RuleKind};

// Re-export kiln-config types for convenience
pub use kiln_config::{Config, ConfigLoader, ProjectConfig, UnitConfig};
