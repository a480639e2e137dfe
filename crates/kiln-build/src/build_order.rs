//! Build and link order computation over unit `requires` chains
//!
//! Orders come from a depth-first walk in declared order, so a project's
//! declaration order survives wherever it does not conflict with dependencies.
use crate::error::{BuildError, BuildResult};
use crate::registry::UnitRegistry;
use std::collections::HashSet;

/// Dependency graph view over a unit registry
#[derive(Debug, Clone, Copy)]
pub struct DependencyGraph<'a> {
    registry: &'a UnitRegistry,
}

/// Direction a walk takes through each unit's `requires`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Declared,
    Reversed,
}

/// Mutable state of one depth-first walk
#[derive(Default)]
struct WalkState {
    visited: HashSet<String>,
    stack: Vec<String>,
    order: Vec<String>,
}

impl<'a> DependencyGraph<'a> {
    /// Create a graph over the given registry
    pub fn new(registry: &'a UnitRegistry) -> Self {
        Self { registry }
    }

    /// Check that every `requires` entry names a registered unit
    pub fn validate(&self) -> BuildResult<()> {
        for unit in self.registry.units() {
            for required in &unit.requires {
                if !self.registry.contains(required) {
                    return Err(BuildError::missing_requirement(required, &unit.name));
                }
            }
        }
        Ok(())
    }

    /// Units that must be built for `name`, dependencies first, ending with `name`
    pub fn build_order_for(&self, name: &str) -> BuildResult<Vec<String>> {
        let mut state = WalkState::default();
        self.visit(name, None, Walk::Declared, &mut state)?;
        Ok(state.order)
    }

    /// Every unit in the project, dependencies first, each exactly once
    pub fn build_order(&self) -> BuildResult<Vec<String>> {
        let mut state = WalkState::default();
        for unit in self.registry.units() {
            self.visit(&unit.name, None, Walk::Declared, &mut state)?;
        }
        Ok(state.order)
    }

    /// Transitive requirements of `name` in linker order
    ///
    /// Every unit precedes the units it depends on, and siblings keep their
    /// declared order. `name` itself is not included.
    pub fn link_order(&self, name: &str) -> BuildResult<Vec<String>> {
        let mut state = WalkState::default();
        self.visit(name, None, Walk::Reversed, &mut state)?;

        let mut order = state.order;
        order.pop();
        order.reverse();
        Ok(order)
    }

    /// Transitive requirements of `name` in build order, excluding `name`
    pub fn requirements_of(&self, name: &str) -> BuildResult<Vec<String>> {
        let mut order = self.build_order_for(name)?;
        order.pop();
        Ok(order)
    }

    fn visit(
        &self,
        name: &str,
        required_by: Option<&str>,
        walk: Walk,
        state: &mut WalkState,
    ) -> BuildResult<()> {
        if let Some(start) = state.stack.iter().position(|n| n == name) {
            let mut cycle = state.stack[start..].to_vec();
            cycle.push(name.to_string());
            return Err(BuildError::CyclicDependency(cycle.join(" -> ")));
        }

        if state.visited.contains(name) {
            return Ok(());
        }

        let unit = match required_by {
            Some(parent) if !self.registry.contains(name) => {
                return Err(BuildError::missing_requirement(name, parent));
            }
            _ => self.registry.find(name)?,
        };

        state.stack.push(name.to_string());
        match walk {
            Walk::Declared => {
                for required in &unit.requires {
                    self.visit(required, Some(name), walk, state)?;
                }
            }
            Walk::Reversed => {
                for required in unit.requires.iter().rev() {
                    self.visit(required, Some(name), walk, state)?;
                }
            }
        }
        state.stack.pop();

        state.visited.insert(name.to_string());
        state.order.push(name.to_string());
        Ok(())
    }
}
