//! The job-wide registry context.

use std::collections::HashMap;
use std::sync::Arc;

use cutflow_core::{
    Collection, CutflowError, IdentityMatcher, ObjectMatcher, Result, SelectionObject, Value,
    ValueKind, Variation,
};
use cutflow_systematics::VariationCatalog;
use tracing::{debug, info, trace};

use crate::container::{Branch, ContainerStore};
use crate::group::VariationGroup;
use crate::registry::VariableRegistry;
use crate::sharing::{self, OutputUnit};
use crate::variable::{Variable, VariableOptions};

const SHARED_SCOPE: &str = "shared";

/// Index of an information scope opened on a [`RegistryDirectory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// Where an entry is registered or looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeRef {
    /// Entries common to every scope.
    Shared,
    Scope(ScopeId),
}

impl From<ScopeId> for ScopeRef {
    fn from(id: ScopeId) -> Self {
        ScopeRef::Scope(id)
    }
}

/// Handle to a registered scalar variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableHandle {
    scope: ScopeRef,
    index: usize,
}

impl VariableHandle {
    pub fn scope(&self) -> ScopeRef {
        self.scope
    }
}

/// Handle to a registered container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerHandle {
    scope: ScopeRef,
    index: usize,
}

impl ContainerHandle {
    pub fn scope(&self) -> ScopeRef {
        self.scope
    }
}

/// Identity of the event being processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventInfo {
    pub number: u64,
    /// The event only feeds bookkeeping and is not selected.
    pub bookkeeping: bool,
}

/// Owns every registry, group and the event generation of one job.
///
/// Setup registers scopes, variables, containers and groups, then calls
/// [`lock`](Self::lock). From then on registrations fail while values keep
/// being written once per event and variation.
pub struct RegistryDirectory {
    catalog: Arc<VariationCatalog>,
    shared: VariableRegistry,
    scopes: Vec<VariableRegistry>,
    groups: HashMap<String, VariationGroup>,
    matcher: Box<dyn ObjectMatcher>,
    locked: bool,
    generation: u64,
    event: EventInfo,
}

impl RegistryDirectory {
    pub fn new(catalog: Arc<VariationCatalog>) -> Self {
        Self {
            catalog,
            shared: VariableRegistry::new(SHARED_SCOPE),
            scopes: Vec::new(),
            groups: HashMap::new(),
            matcher: Box::new(IdentityMatcher),
            locked: false,
            generation: 0,
            event: EventInfo::default(),
        }
    }

    /// Replaces the element identity predicate used by consistency checks.
    pub fn with_matcher(mut self, matcher: impl ObjectMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn catalog(&self) -> &Arc<VariationCatalog> {
        &self.catalog
    }

    // ========================================================================
    // Setup phase
    // ========================================================================

    /// Opens the registry of a new information scope.
    pub fn open_scope(&mut self, name: &str) -> Result<ScopeId> {
        self.check_unlocked(name)?;
        if name == SHARED_SCOPE || self.scopes.iter().any(|s| s.name() == name) {
            return Err(CutflowError::DuplicateName {
                kind: "scope",
                name: name.to_string(),
                scope: "directory".to_string(),
            });
        }
        self.scopes.push(VariableRegistry::new(name));
        info!(event = "scope_opened", scope = name);
        Ok(ScopeId(self.scopes.len() - 1))
    }

    pub fn scope(&self, name: &str) -> Option<ScopeId> {
        self.scopes.iter().position(|s| s.name() == name).map(ScopeId)
    }

    pub fn registry(&self, scope: ScopeRef) -> Option<&VariableRegistry> {
        match scope {
            ScopeRef::Shared => Some(&self.shared),
            ScopeRef::Scope(ScopeId(id)) => self.scopes.get(id),
        }
    }

    fn registry_mut(&mut self, scope: ScopeRef) -> Option<&mut VariableRegistry> {
        match scope {
            ScopeRef::Shared => Some(&mut self.shared),
            ScopeRef::Scope(ScopeId(id)) => self.scopes.get_mut(id),
        }
    }

    /// Registers a scalar variable.
    ///
    /// Shared variables are checked against the shared registry only,
    /// scoped variables against the shared registry and their own scope.
    ///
    /// # Errors
    ///
    /// Fails after [`lock`](Self::lock), for an empty or duplicate name and
    /// for a scope that was never opened.
    pub fn register_variable(
        &mut self,
        scope: ScopeRef,
        name: &str,
        kind: ValueKind,
        options: VariableOptions,
    ) -> Result<VariableHandle> {
        self.check_new_name(scope, name)?;
        if scope != ScopeRef::Shared && self.shared.find_variable(name).is_some() {
            return Err(self.shared.duplicate("variable", name));
        }
        let common = scope == ScopeRef::Shared;
        let registry = self.registry_mut(scope).ok_or_else(|| unknown_scope(scope))?;
        let index = registry.insert_variable(Variable::new(name, kind, options, common))?;
        debug!(variable = name, scope = registry.name(), kind = %kind, "variable registered");
        Ok(VariableHandle { scope, index })
    }

    /// Registers a container. Containers have their own namespace.
    pub fn register_container(
        &mut self,
        scope: ScopeRef,
        name: &str,
        options: VariableOptions,
    ) -> Result<ContainerHandle> {
        self.check_new_name(scope, name)?;
        if scope != ScopeRef::Shared && self.shared.find_container(name).is_some() {
            return Err(self.shared.duplicate("container", name));
        }
        let common = scope == ScopeRef::Shared;
        let registry = self.registry_mut(scope).ok_or_else(|| unknown_scope(scope))?;
        let index = registry.insert_container(ContainerStore::new(name, options, common))?;
        debug!(container = name, scope = registry.name(), "container registered");
        Ok(ContainerHandle { scope, index })
    }

    fn check_new_name(&self, scope: ScopeRef, name: &str) -> Result<()> {
        self.check_unlocked(name)?;
        if name.is_empty() {
            return Err(CutflowError::Config(format!(
                "empty name in scope '{}'",
                self.scope_name(scope)
            )));
        }
        Ok(())
    }

    fn check_unlocked(&self, name: &str) -> Result<()> {
        if self.locked {
            return Err(CutflowError::Locked {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Adds an element branch to a container. Refused once it was filled
    /// and after [`lock`](Self::lock).
    pub fn add_branch(
        &mut self,
        handle: ContainerHandle,
        name: &str,
        kind: ValueKind,
        save_variations: bool,
    ) -> Result<()> {
        self.check_unlocked(name)?;
        self.container_mut(handle)?.add_branch(name, kind, save_variations)
    }

    /// Writes the container branch `name` to every output unit.
    pub fn broadcast_branch(&mut self, handle: ContainerHandle, name: &str) -> Result<()> {
        self.check_unlocked(name)?;
        self.container_mut(handle)?.broadcast_to_all_outputs(name);
        Ok(())
    }

    /// Writes the variable to every output unit.
    pub fn broadcast_variable(&mut self, handle: VariableHandle) -> Result<()> {
        if self.locked {
            let name = self.variable(handle)?.name().to_string();
            self.check_unlocked(&name)?;
        }
        self.variable_mut(handle)?.set_broadcast();
        Ok(())
    }

    /// Creates a variation group for `object`.
    ///
    /// # Errors
    ///
    /// Fails after [`lock`](Self::lock), for an empty or duplicate name,
    /// for `Other` and for objects that only carry weights.
    pub fn create_group(&mut self, name: &str, object: SelectionObject) -> Result<()> {
        if name.is_empty() {
            return Err(CutflowError::Config("variation group without a name".to_string()));
        }
        match object {
            SelectionObject::Other => {
                return Err(CutflowError::Config(format!(
                    "variation group '{}' has no object type",
                    name
                )));
            }
            SelectionObject::EventWeight | SelectionObject::BTag => {
                return Err(CutflowError::Config(format!(
                    "variation group '{}': {} groups do not make sense for weights",
                    name, object
                )));
            }
            _ => {}
        }
        self.check_unlocked(name)?;
        if self.groups.contains_key(name) {
            return Err(CutflowError::DuplicateName {
                kind: "variation group",
                name: name.to_string(),
                scope: "directory".to_string(),
            });
        }
        let group = VariationGroup::new(name, object, Arc::clone(&self.catalog));
        self.groups.insert(name.to_string(), group);
        info!(event = "group_created", group = name, object = %object);
        Ok(())
    }

    pub fn group(&self, name: &str) -> Option<&VariationGroup> {
        self.groups.get(name)
    }

    fn known_group(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(CutflowError::Config("empty variation group name".to_string()));
        }
        if !self.groups.contains_key(name) {
            return Err(CutflowError::Config(format!(
                "unknown variation group '{}'",
                name
            )));
        }
        Ok(())
    }

    /// Tags a variable with a variation group. A variable has at most one.
    pub fn assign_variable_group(&mut self, handle: VariableHandle, group: &str) -> Result<()> {
        self.check_unlocked(group)?;
        self.known_group(group)?;
        self.variable_mut(handle)?.set_group(group)
    }

    /// Tags a container with a variation group. A container has at most one.
    pub fn assign_container_group(&mut self, handle: ContainerHandle, group: &str) -> Result<()> {
        self.check_unlocked(group)?;
        self.known_group(group)?;
        self.container_mut(handle)?.set_group(group)
    }

    /// Ends the setup phase. Idempotent.
    pub fn lock(&mut self) {
        if self.locked {
            return;
        }
        self.locked = true;
        let registries = std::iter::once(&self.shared).chain(self.scopes.iter());
        let (variables, containers) = registries.fold((0usize, 0usize), |(v, c), r| {
            (v + r.variables().len(), c + r.containers().len())
        });
        info!(
            event = "registry_locked",
            scopes = self.scopes.len() as u64,
            variables = variables as u64,
            containers = containers as u64,
        );
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Drops every registry, group and cached value and unlocks.
    pub fn reset(&mut self) {
        self.shared = VariableRegistry::new(SHARED_SCOPE);
        self.scopes.clear();
        self.groups.clear();
        self.locked = false;
        self.generation = 0;
        self.event = EventInfo::default();
        info!(event = "registry_reset");
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Finds a variable visible from `scope`, shared entries first.
    pub fn resolve_variable(&self, scope: ScopeRef, name: &str) -> Option<VariableHandle> {
        if let Some(index) = self.shared.find_variable(name) {
            return Some(VariableHandle {
                scope: ScopeRef::Shared,
                index,
            });
        }
        match scope {
            ScopeRef::Shared => None,
            ScopeRef::Scope(ScopeId(id)) => {
                let index = self.scopes.get(id)?.find_variable(name)?;
                Some(VariableHandle { scope, index })
            }
        }
    }

    /// Finds a container visible from `scope`, shared entries first.
    pub fn resolve_container(&self, scope: ScopeRef, name: &str) -> Option<ContainerHandle> {
        if let Some(index) = self.shared.find_container(name) {
            return Some(ContainerHandle {
                scope: ScopeRef::Shared,
                index,
            });
        }
        match scope {
            ScopeRef::Shared => None,
            ScopeRef::Scope(ScopeId(id)) => {
                let index = self.scopes.get(id)?.find_container(name)?;
                Some(ContainerHandle { scope, index })
            }
        }
    }

    fn visible(&self, scope: ScopeRef) -> impl Iterator<Item = &VariableRegistry> {
        let scoped = match scope {
            ScopeRef::Shared => None,
            ScopeRef::Scope(_) => self.registry(scope),
        };
        std::iter::once(&self.shared).chain(scoped)
    }

    /// Variables visible from `scope`, shared entries first.
    pub fn variables(&self, scope: ScopeRef) -> impl Iterator<Item = &Variable> {
        self.visible(scope).flat_map(|r| r.variables().iter())
    }

    /// Containers visible from `scope`, shared entries first.
    pub fn containers(&self, scope: ScopeRef) -> impl Iterator<Item = &ContainerStore> {
        self.visible(scope).flat_map(|r| r.containers().iter())
    }

    pub fn variable(&self, handle: VariableHandle) -> Result<&Variable> {
        self.registry(handle.scope)
            .and_then(|r| r.variable(handle.index))
            .ok_or_else(|| stale(handle.scope, "variable"))
    }

    fn variable_mut(&mut self, handle: VariableHandle) -> Result<&mut Variable> {
        self.registry_mut(handle.scope)
            .and_then(|r| r.variable_mut(handle.index))
            .ok_or_else(|| stale(handle.scope, "variable"))
    }

    pub fn container(&self, handle: ContainerHandle) -> Result<&ContainerStore> {
        self.registry(handle.scope)
            .and_then(|r| r.container(handle.index))
            .ok_or_else(|| stale(handle.scope, "container"))
    }

    fn container_mut(&mut self, handle: ContainerHandle) -> Result<&mut ContainerStore> {
        self.registry_mut(handle.scope)
            .and_then(|r| r.container_mut(handle.index))
            .ok_or_else(|| stale(handle.scope, "container"))
    }

    fn scope_name(&self, scope: ScopeRef) -> &str {
        self.registry(scope).map(VariableRegistry::name).unwrap_or("?")
    }

    // ========================================================================
    // Run phase
    // ========================================================================

    /// Starts a new event. Every cached value becomes stale.
    pub fn begin_event(&mut self, number: u64, bookkeeping: bool) {
        self.generation += 1;
        self.event = EventInfo {
            number,
            bookkeeping,
        };
        trace!(event_number = number, generation = self.generation, bookkeeping, "event started");
    }

    pub fn event(&self) -> EventInfo {
        self.event
    }

    /// Counter bumped by every [`begin_event`](Self::begin_event).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn check_variation(&self, variation: &Variation) -> Result<()> {
        if self.catalog.contains(variation) {
            Ok(())
        } else {
            Err(CutflowError::UnknownVariation(variation.to_string()))
        }
    }

    /// Writes `value` for `variation` into the current event.
    pub fn write(&mut self, handle: VariableHandle, variation: &Variation, value: Value) -> Result<()> {
        self.check_variation(variation)?;
        let generation = self.generation;
        self.variable_mut(handle)?.write(variation, value, generation)
    }

    /// Writes a common variable, shared by every variation.
    pub fn write_shared(&mut self, handle: VariableHandle, value: Value) -> Result<()> {
        if handle.scope != ScopeRef::Shared {
            let name = self.variable(handle)?.name().to_string();
            return Err(CutflowError::Config(format!(
                "'{}' is not a common variable",
                name
            )));
        }
        self.write(handle, &Variation::nominal(), value)
    }

    /// Writes by name, resolving through `scope`.
    pub fn write_named(
        &mut self,
        scope: ScopeRef,
        name: &str,
        variation: &Variation,
        value: Value,
    ) -> Result<()> {
        let handle = self
            .resolve_variable(scope, name)
            .ok_or_else(|| CutflowError::UnknownVariable(name.to_string()))?;
        self.write(handle, variation, value)
    }

    /// Reads the value written for `variation` in the current event.
    ///
    /// # Errors
    ///
    /// [`CutflowError::Unset`] when nothing was written this event.
    pub fn read(&self, handle: VariableHandle, variation: &Variation) -> Result<&Value> {
        self.variable(handle)?.read(variation, self.generation)
    }

    pub fn is_set(&self, handle: VariableHandle, variation: &Variation) -> bool {
        self.variable(handle)
            .map(|v| v.is_set(variation, self.generation))
            .unwrap_or(false)
    }

    /// Stores a collection for `variation`, checking grouped containers
    /// against their nominal collection.
    ///
    /// # Errors
    ///
    /// [`CutflowError::Consistency`] when the nominal collection is missing
    /// or holds different objects.
    pub fn fill(&mut self, handle: ContainerHandle, variation: &Variation, collection: Collection) -> Result<()> {
        self.check_variation(variation)?;
        let generation = self.generation;
        let registry = match handle.scope {
            ScopeRef::Shared => &mut self.shared,
            ScopeRef::Scope(ScopeId(id)) => self
                .scopes
                .get_mut(id)
                .ok_or_else(|| stale(handle.scope, "container"))?,
        };
        let container = registry
            .container_mut(handle.index)
            .ok_or_else(|| stale(handle.scope, "container"))?;
        let group = container
            .group()
            .map(|name| {
                self.groups
                    .get(name)
                    .ok_or_else(|| CutflowError::Config(format!("unknown variation group '{}'", name)))
            })
            .transpose()?;
        container.fill(variation, collection, generation, group, self.matcher.as_ref())
    }

    pub fn collection(&self, handle: ContainerHandle, variation: &Variation) -> Result<&Collection> {
        self.container(handle)?.collection(variation, self.generation)
    }

    /// Reads `field` of element `index` of a container.
    pub fn element_field(
        &self,
        handle: ContainerHandle,
        variation: &Variation,
        index: usize,
        field: &str,
    ) -> Result<Option<Value>> {
        self.container(handle)?
            .element_field(variation, self.generation, index, field)
    }

    // ========================================================================
    // Output selection
    // ========================================================================

    /// Variables of `scope` and the shared scope written to `unit`.
    pub fn variables_for(&self, scope: ScopeRef, unit: &OutputUnit) -> Vec<&Variable> {
        self.variables(scope)
            .filter(|v| {
                v.options().save_tree
                    && sharing::writes_to(
                        v.group().and_then(|g| self.groups.get(g)),
                        v.is_broadcast(),
                        v.options().save_variations,
                        unit,
                    )
            })
            .collect()
    }

    /// Branches of a container written to `unit`.
    pub fn branches_for(&self, handle: ContainerHandle, unit: &OutputUnit) -> Result<Vec<&Branch>> {
        let container = self.container(handle)?;
        let group = container.group().and_then(|g| self.groups.get(g));
        Ok(container.branches_for(group, unit))
    }
}

impl std::fmt::Debug for RegistryDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryDirectory")
            .field("scopes", &self.scopes.len())
            .field("groups", &self.groups.len())
            .field("locked", &self.locked)
            .field("generation", &self.generation)
            .finish()
    }
}

fn unknown_scope(scope: ScopeRef) -> CutflowError {
    CutflowError::Config(format!("scope {:?} was never opened", scope))
}

fn stale(scope: ScopeRef, kind: &str) -> CutflowError {
    CutflowError::UnknownVariable(format!("stale {} handle in {:?}", kind, scope))
}
