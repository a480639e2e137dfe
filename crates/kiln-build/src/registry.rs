//! Unit registry
//!
//! Holds the named build units of one project in declaration order. `find` is
//! the single lookup used by the dependency graph and by every backend, so a
//! missing name always surfaces as the same `UnitNotFound` error.

use crate::emitter::{ALL_TARGET, COMPILE_DATABASE, ENTRY_PLAN};
use crate::error::{BuildError, BuildResult};
use crate::targets::BuildUnit;
use kiln_config::ProjectConfig;
use std::collections::HashMap;

/// Registry of build units by name
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    units: Vec<BuildUnit>,
    index: HashMap<String, usize>,
}

impl UnitRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from every unit of a project document
    pub fn from_project(project: &ProjectConfig) -> BuildResult<Self> {
        let mut registry = Self::new();
        for config in &project.builds {
            registry.register(BuildUnit::from_config(config)?)?;
        }
        Ok(registry)
    }

    /// Register a unit, rejecting duplicate and invalid names
    pub fn register(&mut self, unit: BuildUnit) -> BuildResult<()> {
        check_name(&unit.name)?;
        if self.index.contains_key(&unit.name) {
            return Err(BuildError::DuplicateUnit { name: unit.name });
        }
        self.index.insert(unit.name.clone(), self.units.len());
        self.units.push(unit);
        Ok(())
    }

    /// Look up a unit by name
    pub fn find(&self, name: &str) -> BuildResult<&BuildUnit> {
        self.index
            .get(name)
            .map(|&i| &self.units[i])
            .ok_or_else(|| BuildError::unit_not_found(name))
    }

    /// Whether a unit with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Units in declaration order
    pub fn units(&self) -> &[BuildUnit] {
        &self.units
    }

    /// Get unit count
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Unit names double as build subdirectories and plan aliases
fn check_name(name: &str) -> BuildResult<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name == "." || name == ".." {
        "must not be a relative directory"
    } else if name.contains(['/', '\\']) {
        "must not contain path separators"
    } else if name == ALL_TARGET {
        "reserved for the project-wide target"
    } else if name == ENTRY_PLAN || name == COMPILE_DATABASE {
        "reserved for a file in the build directory"
    } else {
        return Ok(());
    };

    Err(BuildError::InvalidUnitName {
        name: name.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::RuleKind;
    use kiln_config::UnitConfig;

    fn lib(name: &str) -> BuildUnit {
        BuildUnit::new(name, RuleKind::StaticLibrary, format!("lib{}.a", name))
    }

    #[test]
    fn test_register_and_find() {
        let mut registry = UnitRegistry::new();
        registry.register(lib("a")).unwrap();
        registry.register(lib("b")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find("b").unwrap().output_name, "libb.a");
        assert!(registry.contains("a"));
    }

    #[test]
    fn test_duplicate_name() {
        let mut registry = UnitRegistry::new();
        registry.register(lib("a")).unwrap();

        match registry.register(lib("a")) {
            Err(BuildError::DuplicateUnit { name }) => assert_eq!(name, "a"),
            other => panic!("Expected DuplicateUnit, got {:?}", other),
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reserved_and_path_like_names() {
        for name in ["all", "", ".", "..", "../x", "/abs", "a/b", "a\\b", "build.ninja"] {
            let mut registry = UnitRegistry::new();
            match registry.register(lib(name)) {
                Err(BuildError::InvalidUnitName { name: rejected, .. }) => {
                    assert_eq!(rejected, name)
                }
                other => panic!("Expected InvalidUnitName for {:?}, got {:?}", name, other),
            }
            assert!(registry.is_empty());
        }

        let mut registry = UnitRegistry::new();
        registry.register(lib("all-tools")).unwrap();
        registry.register(lib("core.v2")).unwrap();
    }

    #[test]
    fn test_find_missing_names_identifier() {
        let registry = UnitRegistry::new();
        let err = registry.find("ghost").unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let mut registry = UnitRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(lib(name)).unwrap();
        }

        let names: Vec<_> = registry.units().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_from_project_duplicate() {
        let project = ProjectConfig::new("g++", "gcc", "ar", "gcc")
            .with_unit(UnitConfig::new("app", "exe", "app"))
            .with_unit(UnitConfig::new("app", "exe", "app2"));

        assert!(matches!(
            UnitRegistry::from_project(&project),
            Err(BuildError::DuplicateUnit { .. })
        ));
    }
}
