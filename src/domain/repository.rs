//! Dependency repository: the mutation surface over a graph store
//!
//! Every operation validates against the current snapshot before it
//! touches state, so a rejected request leaves the store unchanged.

use chrono::Utc;

use super::dependency::{Dependency, DependencyError, DependencyPatch, DependencyType};
use super::graph::{GraphStore, GraphViolation};
use super::id::{DependencyId, ItemId};
use super::validate::{DependencyValidator, ValidationRules};

/// Create/update/delete/list for the dependencies of one schedule
#[derive(Debug, Default, Clone)]
pub struct DependencyRepository {
    store: GraphStore,
    rules: ValidationRules,
}

impl DependencyRepository {
    pub fn new(store: GraphStore, rules: ValidationRules) -> Self {
        Self { store, rules }
    }

    /// Read access for projections and queries
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Invariant violations in the current state, under this repository's rules
    pub fn audit(&self) -> Vec<GraphViolation> {
        self.store.audit(self.rules.allow_parallel_edges)
    }

    fn validator(&self) -> DependencyValidator<'_> {
        DependencyValidator::new(&self.store, self.rules)
    }

    /// Creates `predecessor -> successor` after validation
    pub fn create(
        &mut self,
        predecessor: &ItemId,
        successor: &ItemId,
        dep_type: DependencyType,
        lag: i64,
    ) -> Result<Dependency, DependencyError> {
        let valid = self.validator().validate_create(predecessor, successor, lag)?;

        let id = self.allocate_id(&valid.predecessor, &valid.successor);
        let edge = Dependency::new(id, valid.predecessor, valid.successor, dep_type, valid.lag);
        self.store.insert_edge(edge.clone());

        Ok(edge)
    }

    /// Changes type and/or lag of an existing edge
    pub fn update(
        &mut self,
        id: &DependencyId,
        patch: DependencyPatch,
    ) -> Result<Dependency, DependencyError> {
        let valid = self.validator().validate_update(id, &patch)?;

        let edge = self
            .store
            .edge_mut(&valid.id)
            .ok_or_else(|| DependencyError::NotFound(valid.id.clone()))?;
        if let Some(dep_type) = valid.dep_type {
            edge.dep_type = dep_type;
        }
        if let Some(lag) = valid.lag {
            edge.lag = lag;
        }

        Ok(edge.clone())
    }

    /// Removes an edge
    ///
    /// Removing an edge cannot introduce a cycle, so nothing is re-checked.
    pub fn delete(&mut self, id: &DependencyId) -> Result<Dependency, DependencyError> {
        self.store
            .remove_edge(id)
            .ok_or_else(|| DependencyError::NotFound(id.clone()))
    }

    /// All edges in insertion order
    pub fn list(&self) -> Vec<Dependency> {
        self.store.edges().cloned().collect()
    }

    /// Pre-submit check: would `predecessor -> successor` close a cycle?
    pub fn would_create_cycle(&self, predecessor: &ItemId, successor: &ItemId) -> bool {
        self.store.would_create_cycle(predecessor, successor)
    }

    fn allocate_id(&self, predecessor: &ItemId, successor: &ItemId) -> DependencyId {
        let now = Utc::now();
        let mut attempt = 0;
        loop {
            let id = DependencyId::generate(predecessor, successor, now, attempt);
            if !self.store.contains_edge(&id) {
                return id;
            }
            attempt += 1;
        }
    }
}
