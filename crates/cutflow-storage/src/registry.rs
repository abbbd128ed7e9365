//! Name-keyed storage of one information scope.

use std::collections::HashMap;

use cutflow_core::{CutflowError, Result};

use crate::container::ContainerStore;
use crate::variable::Variable;

/// Variables and containers of one scope. Scalars and containers live in
/// separate namespaces.
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    name: String,
    variables: Vec<Variable>,
    variable_index: HashMap<String, usize>,
    containers: Vec<ContainerStore>,
    container_index: HashMap<String, usize>,
}

impl VariableRegistry {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_variable(&self, name: &str) -> Option<usize> {
        self.variable_index.get(name).copied()
    }

    pub fn find_container(&self, name: &str) -> Option<usize> {
        self.container_index.get(name).copied()
    }

    pub(crate) fn insert_variable(&mut self, variable: Variable) -> Result<usize> {
        if self.variable_index.contains_key(variable.name()) {
            return Err(self.duplicate("variable", variable.name()));
        }
        let index = self.variables.len();
        self.variable_index.insert(variable.name().to_string(), index);
        self.variables.push(variable);
        Ok(index)
    }

    pub(crate) fn insert_container(&mut self, container: ContainerStore) -> Result<usize> {
        if self.container_index.contains_key(container.name()) {
            return Err(self.duplicate("container", container.name()));
        }
        let index = self.containers.len();
        self.container_index.insert(container.name().to_string(), index);
        self.containers.push(container);
        Ok(index)
    }

    pub(crate) fn duplicate(&self, kind: &'static str, name: &str) -> CutflowError {
        CutflowError::DuplicateName {
            kind,
            name: name.to_string(),
            scope: self.name.clone(),
        }
    }

    pub fn variable(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    pub(crate) fn variable_mut(&mut self, index: usize) -> Option<&mut Variable> {
        self.variables.get_mut(index)
    }

    pub fn container(&self, index: usize) -> Option<&ContainerStore> {
        self.containers.get(index)
    }

    pub(crate) fn container_mut(&mut self, index: usize) -> Option<&mut ContainerStore> {
        self.containers.get_mut(index)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn containers(&self) -> &[ContainerStore] {
        &self.containers
    }
}
