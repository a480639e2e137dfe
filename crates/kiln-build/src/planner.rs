//! One graph-compilation pass
//!
//! The planner turns a loaded project into a complete in-memory [`BuildPlan`]:
//! registry, dependency graph, resolved units, per-unit link contexts, and the
//! rendered plan files. Every configuration and synthesis error surfaces here,
//! before anything is written.

use crate::backend::{Backend, LinkContext, LinkDependency};
use crate::build_order::DependencyGraph;
use crate::emitter::{self, BuildPlan, COMPILE_DATABASE, ENTRY_PLAN, UNIT_PLAN};
use crate::error::{BuildError, BuildResult};
use crate::paths::{normalize, PathResolver, SourceLanguage};
use crate::registry::UnitRegistry;
use crate::targets::{BuildUnit, CompileInput, ResolvedUnit};
use kiln_config::{Config, ProjectConfig};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of a planning pass
#[derive(Debug, Clone)]
pub struct PlannedBuild {
    /// Rendered plan files, not yet on disk
    pub plan: BuildPlan,
    /// Resolved units in build order
    pub units: Vec<ResolvedUnit>,
    pub backend: Backend,
    /// Absolute build output root
    pub build_root: PathBuf,
}

impl PlannedBuild {
    pub fn unit(&self, name: &str) -> BuildResult<&ResolvedUnit> {
        self.units
            .iter()
            .find(|u| u.name == name)
            .ok_or_else(|| BuildError::unit_not_found(name))
    }

    /// Unit names in build order
    pub fn build_order(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name.as_str()).collect()
    }

    /// The entry plan the executor is pointed at for a unit
    pub fn entry_plan_path(&self, name: &str) -> BuildResult<PathBuf> {
        Ok(self.unit(name)?.build_dir.join(ENTRY_PLAN))
    }

    pub fn root_plan_path(&self) -> PathBuf {
        self.build_root.join(ENTRY_PLAN)
    }

    pub fn compile_database_path(&self) -> PathBuf {
        self.build_root.join(COMPILE_DATABASE)
    }
}

/// Build graph compiler for one project
#[derive(Debug, Clone)]
pub struct Planner {
    project: ProjectConfig,
    project_root: PathBuf,
    build_root: PathBuf,
}

impl Planner {
    /// Create a planner; a relative `build_root` is taken from `project_root`
    pub fn new(
        project: ProjectConfig,
        project_root: impl Into<PathBuf>,
        build_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project,
            project_root: project_root.into(),
            build_root: build_root.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.project.clone(), config.project_root(), config.build_dir())
    }

    /// Run the pass
    pub fn plan(&self) -> BuildResult<PlannedBuild> {
        self.project.validate()?;

        let backend = Backend::from_project(&self.project)?;
        let registry = UnitRegistry::from_project(&self.project)?;
        let graph = DependencyGraph::new(&registry);
        graph.validate()?;
        let order = graph.build_order()?;

        let resolver = PathResolver::new(&self.project_root)?;
        let build_root = normalize(&resolver.root().join(&self.build_root));

        info!(
            units = order.len(),
            frontend = %backend.frontend(),
            build_root = %build_root.display(),
            "planning build"
        );

        let mut resolved: HashMap<String, ResolvedUnit> = HashMap::new();
        for name in &order {
            let unit = registry.find(name)?;
            let unit = self.resolve(&resolver, &backend, &build_root, unit)?;
            debug!(
                unit = %unit.name,
                kind = %unit.kind,
                sources = unit.sources.len(),
                artifact = %unit.artifact,
                "resolved unit"
            );
            resolved.insert(unit.name.clone(), unit);
        }

        let mut plan = BuildPlan::new();
        let mut compile_commands = Vec::new();
        let mut root_units = Vec::new();
        let mut units = Vec::with_capacity(order.len());

        for name in &order {
            let unit = lookup(&resolved, name)?;
            let context = link_context(&graph, &resolved, unit)?;

            let own_plan = unit.build_dir.join(UNIT_PLAN);
            let requirement_plans = graph
                .requirements_of(name)?
                .iter()
                .map(|r| lookup(&resolved, r).map(|u| u.build_dir.join(UNIT_PLAN)))
                .collect::<BuildResult<Vec<_>>>()?;

            plan.insert(&own_plan, emitter::unit_plan(&backend, unit, &context)?);
            plan.insert(
                unit.build_dir.join(ENTRY_PLAN),
                emitter::entry_plan(name, &build_root, &requirement_plans, &own_plan),
            );
            compile_commands.extend(emitter::compile_commands(&backend, unit, &context));
            root_units.push((name.clone(), own_plan));

            debug!(
                unit = %name,
                requirements = requirement_plans.len(),
                "planned unit"
            );
            units.push(unit.clone());
        }

        plan.insert(
            build_root.join(ENTRY_PLAN),
            emitter::root_plan(&build_root, &root_units),
        );
        plan.insert(
            build_root.join(COMPILE_DATABASE),
            emitter::compile_database(&compile_commands)?,
        );

        Ok(PlannedBuild {
            plan,
            units,
            backend,
            build_root,
        })
    }

    fn resolve(
        &self,
        resolver: &PathResolver,
        backend: &Backend,
        build_root: &Path,
        unit: &BuildUnit,
    ) -> BuildResult<ResolvedUnit> {
        let build_dir = build_root.join(&unit.name);

        let src_dirs = resolver.resolve_dirs(&unit.name, &unit.src_dirs)?;
        let mut seen = HashSet::new();
        let mut sources = Vec::new();
        for source in resolver.source_files(&unit.name, &src_dirs)? {
            let object = backend.object_path(&build_dir, &source);
            if !seen.insert(object.clone()) {
                return Err(BuildError::ObjectCollision {
                    unit: unit.name.clone(),
                    object,
                });
            }
            let language = SourceLanguage::from_path(&source).unwrap_or(SourceLanguage::Cpp);
            sources.push(CompileInput {
                source,
                object,
                language,
            });
        }

        Ok(ResolvedUnit {
            name: unit.name.clone(),
            kind: unit.kind,
            output_name: unit.output_name.clone(),
            artifact: backend.artifact_name(unit.kind, &unit.output_name),
            build_dir,
            sources,
            include_dirs: resolver.resolve_dirs(&unit.name, &unit.include_paths)?,
            library_dirs: resolver.resolve_dirs(&unit.name, &unit.library_paths)?,
            libraries: unit.libraries.clone(),
            third_party_libraries: unit.third_party_libraries.clone(),
            requires: unit.requires.clone(),
            flags: extend(&self.project.flags, &unit.flags),
            defines: extend(&self.project.defines, &unit.defines),
        })
    }
}

fn lookup<'a>(
    resolved: &'a HashMap<String, ResolvedUnit>,
    name: &str,
) -> BuildResult<&'a ResolvedUnit> {
    resolved
        .get(name)
        .ok_or_else(|| BuildError::unit_not_found(name))
}

fn extend(global: &[String], unit: &[String]) -> Vec<String> {
    global.iter().chain(unit).cloned().collect()
}

/// Requirements in link order plus the include directories they export
fn link_context(
    graph: &DependencyGraph<'_>,
    resolved: &HashMap<String, ResolvedUnit>,
    unit: &ResolvedUnit,
) -> BuildResult<LinkContext> {
    let mut dependencies = Vec::new();
    let mut include_dirs = unit.include_dirs.clone();

    for name in graph.link_order(&unit.name)? {
        let required = lookup(resolved, &name)?;
        for dir in &required.include_dirs {
            if !include_dirs.contains(dir) {
                include_dirs.push(dir.clone());
            }
        }
        dependencies.push(LinkDependency::from_unit(required));
    }

    Ok(LinkContext {
        dependencies,
        include_dirs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::UnitConfig;
    use std::fs;
    use tempfile::TempDir;

    fn project_dir() -> TempDir {
        let temp = TempDir::new().unwrap();
        for (dir, file) in [("core", "core.cpp"), ("app", "main.cpp")] {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
            fs::write(temp.path().join(dir).join(file), "").unwrap();
        }
        fs::create_dir_all(temp.path().join("include")).unwrap();
        temp
    }

    fn project() -> ProjectConfig {
        ProjectConfig::new("g++", "gcc", "ar", "gcc")
            .with_flags(vec!["-O2".to_string()])
            .with_unit(
                UnitConfig::new("core", "staticlib", "libcore.a")
                    .with_src_dirs(vec![PathBuf::from("core")])
                    .with_include_paths(vec![PathBuf::from("include")])
                    .with_flags(vec!["-Wall".to_string()]),
            )
            .with_unit(
                UnitConfig::new("app", "exe", "app")
                    .with_src_dirs(vec![PathBuf::from("app")])
                    .with_requires(vec!["core".to_string()]),
            )
    }

    #[test]
    fn test_plan_resolves_units_in_build_order() {
        let temp = project_dir();
        let planned = Planner::new(project(), temp.path(), "builds").plan().unwrap();

        assert_eq!(planned.build_order(), vec!["core", "app"]);
        let core = planned.unit("core").unwrap();
        assert_eq!(core.flags, vec!["-O2", "-Wall"]);
        assert!(core.build_dir.ends_with("builds/core"));
        assert_eq!(core.sources[0].object, core.build_dir.join("core.o"));
    }

    #[test]
    fn test_plan_files() {
        let temp = project_dir();
        let planned = Planner::new(project(), temp.path(), "builds").plan().unwrap();

        // Two files per unit, the root plan and the compilation database.
        assert_eq!(planned.plan.len(), 6);
        assert!(planned.plan.get(&planned.root_plan_path()).is_some());
        assert!(planned.plan.get(&planned.compile_database_path()).is_some());

        let app_entry = planned
            .plan
            .get(&planned.entry_plan_path("app").unwrap())
            .unwrap();
        assert!(app_entry.contains("core/unit.ninja"));
        assert!(app_entry.contains("app/unit.ninja"));
    }

    #[test]
    fn test_requirement_includes_propagate() {
        let temp = project_dir();
        let planned = Planner::new(project(), temp.path(), "builds").plan().unwrap();
        let app_dir = &planned.unit("app").unwrap().build_dir;

        let app_plan = planned.plan.get(&app_dir.join(UNIT_PLAN)).unwrap();
        assert!(app_plan.contains("-I"));
        assert!(app_plan.contains("include"));
    }

    #[test]
    fn test_nothing_written_before_commit() {
        let temp = project_dir();
        let planned = Planner::new(project(), temp.path(), "builds").plan().unwrap();

        assert!(!planned.build_root.exists());
    }

    #[test]
    fn test_object_collision() {
        let temp = project_dir();
        fs::create_dir_all(temp.path().join("more")).unwrap();
        fs::write(temp.path().join("more").join("core.cpp"), "").unwrap();

        let project = ProjectConfig::new("g++", "gcc", "ar", "gcc").with_unit(
            UnitConfig::new("core", "staticlib", "libcore.a")
                .with_src_dirs(vec![PathBuf::from("core"), PathBuf::from("more")]),
        );

        match Planner::new(project, temp.path(), "builds").plan() {
            Err(BuildError::ObjectCollision { unit, object }) => {
                assert_eq!(unit, "core");
                assert!(object.ends_with("core.o"));
            }
            other => panic!("Expected ObjectCollision, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_frontend() {
        let temp = project_dir();
        let mut project = project();
        project.compiler_frontend = "watcom".to_string();

        assert!(matches!(
            Planner::new(project, temp.path(), "builds").plan(),
            Err(BuildError::UnknownFrontend(_))
        ));
    }
}
