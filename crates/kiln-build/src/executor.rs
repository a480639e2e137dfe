//! Build executor invocation
//!
//! Runs the external incremental executor (Ninja) against a unit's build
//! directory, addressing the unit by its logical name. Output is captured and
//! handed back verbatim; a failed run is never retried.

use crate::error::{BuildError, BuildResult};
use kiln_config::GlobalConfig;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Captured result of one executor run
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    /// Logical unit name that was built
    pub target: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ExecutionOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Combined stdout and stderr
    pub fn output(&self) -> String {
        let mut output = String::new();
        if !self.stdout.is_empty() {
            output.push_str(&self.stdout);
        }
        if !self.stderr.is_empty() {
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&self.stderr);
        }
        output
    }
}

/// Invokes the executor program
#[derive(Debug, Clone)]
pub struct Executor {
    program: PathBuf,
    jobs: Option<usize>,
}

impl Executor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            jobs: None,
        }
    }

    /// Executor configured from the user's global settings
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self::new(global.executor_program()).with_jobs(global.executor_jobs())
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for building `target` from `build_dir`
    pub fn arguments(&self, build_dir: &Path, target: &str) -> Vec<String> {
        let mut args = vec!["-C".to_string(), build_dir.display().to_string()];
        if let Some(jobs) = self.jobs {
            args.push("-j".to_string());
            args.push(jobs.to_string());
        }
        args.push(target.to_string());
        args
    }

    /// Build `target` using the entry plan in `build_dir`
    pub fn run(&self, build_dir: &Path, target: &str) -> BuildResult<ExecutionOutput> {
        let args = self.arguments(build_dir, target);
        debug!(program = %self.program.display(), args = ?args, "starting executor");

        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BuildError::ExecutorSpawn {
                program: self.program.display().to_string(),
                error: e.to_string(),
            })?
            .wait_with_output()
            .map_err(|e| BuildError::ExecutorSpawn {
                program: self.program.display().to_string(),
                error: e.to_string(),
            })?;

        let result = ExecutionOutput {
            target: target.to_string(),
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            elapsed: start.elapsed(),
        };

        if !result.success() {
            return Err(BuildError::ExecutorFailed {
                target: result.target.clone(),
                exit_code: result.exit_code,
                output: result.output(),
            });
        }

        info!(
            target = %result.target,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "build finished"
        );
        Ok(result)
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::from_global(&GlobalConfig::default())
    }
}
