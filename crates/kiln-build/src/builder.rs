//! Build orchestration: load, plan, commit, run
use crate::emitter::{CommitStats, ALL_TARGET};
use crate::error::BuildResult;
use crate::executor::{ExecutionOutput, Executor};
use crate::planner::{PlannedBuild, Planner};
use kiln_config::{Config, ConfigLoader};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Build statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Units in the project
    pub total_units: usize,
    /// Plan files rendered
    pub plan_files: usize,
    /// Plan files created or replaced on disk
    pub written_files: usize,
    /// Plan files left untouched
    pub unchanged_files: usize,
    /// Time spent planning and committing
    pub planning_time: Duration,
}

impl BuildStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Result of a successful generation
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub planned: PlannedBuild,
    pub stats: BuildStats,
}

/// Main builder for a project
pub struct Builder {
    config: Config,
    executor: Executor,
}

impl Builder {
    /// Create a builder for the project containing `project_path`
    ///
    /// Looks up `kiln.toml` from the given directory upwards and applies the
    /// global config and environment overrides.
    pub fn new(project_path: impl AsRef<Path>) -> BuildResult<Self> {
        let config = ConfigLoader::new().load_from_directory(project_path.as_ref())?;
        Ok(Self::from_config(config))
    }

    /// Create a builder from an already loaded configuration
    pub fn from_config(config: Config) -> Self {
        let executor = Executor::from_global(&config.global);
        Self { config, executor }
    }

    /// Replace the executor
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile the build graph without writing anything
    pub fn plan(&self) -> BuildResult<PlannedBuild> {
        Planner::from_config(&self.config).plan()
    }

    /// Plan and commit the plan files to the build directory
    pub fn generate(&self) -> BuildResult<BuildContext> {
        let start = Instant::now();
        let planned = self.plan()?;
        let CommitStats { written, unchanged } = planned.plan.commit()?;

        let stats = BuildStats {
            total_units: planned.units.len(),
            plan_files: planned.plan.len(),
            written_files: written,
            unchanged_files: unchanged,
            planning_time: start.elapsed(),
        };

        info!(
            units = stats.total_units,
            written = stats.written_files,
            unchanged = stats.unchanged_files,
            "build plan generated"
        );

        Ok(BuildContext { planned, stats })
    }

    /// Generate, then run the executor for one unit
    pub fn build(&self, target: &str) -> BuildResult<ExecutionOutput> {
        let context = self.generate()?;
        let unit = context.planned.unit(target)?;
        self.executor.run(&unit.build_dir, target)
    }

    /// Generate, then run the executor for every unit
    pub fn build_all(&self) -> BuildResult<ExecutionOutput> {
        let context = self.generate()?;
        self.executor.run(&context.planned.build_root, ALL_TARGET)
    }
}
