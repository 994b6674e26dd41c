//! Validation of proposed dependency mutations
//!
//! Structural checks run first; the cycle search runs last because it is
//! the only check that walks the graph.

use super::dependency::{DependencyError, DependencyPatch, DependencyType, Lag};
use super::graph::GraphStore;
use super::id::{DependencyId, ItemId};

/// Policy knobs applied on top of the graph invariants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationRules {
    /// Permit more than one edge for the same ordered (predecessor, successor) pair
    pub allow_parallel_edges: bool,

    /// Upper bound for lag in days (None = unbounded)
    pub max_lag_days: Option<u32>,
}

/// A create request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCreate {
    pub predecessor: ItemId,
    pub successor: ItemId,
    pub lag: Lag,
}

/// An update request that passed validation, ready to merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidUpdate {
    pub id: DependencyId,
    pub dep_type: Option<DependencyType>,
    pub lag: Option<Lag>,
}

/// Checks proposed creates and updates against a graph snapshot
pub struct DependencyValidator<'a> {
    store: &'a GraphStore,
    rules: ValidationRules,
}

impl<'a> DependencyValidator<'a> {
    pub fn new(store: &'a GraphStore, rules: ValidationRules) -> Self {
        Self { store, rules }
    }

    /// Validates a new edge `predecessor -> successor`
    pub fn validate_create(
        &self,
        predecessor: &ItemId,
        successor: &ItemId,
        lag: i64,
    ) -> Result<ValidCreate, DependencyError> {
        if predecessor == successor {
            return Err(DependencyError::SelfDependency(predecessor.clone()));
        }

        for endpoint in [predecessor, successor] {
            if !self.store.contains_item(endpoint) {
                return Err(DependencyError::MissingEndpoint(endpoint.clone()));
            }
        }

        let lag = self.validate_lag(lag)?;

        if !self.rules.allow_parallel_edges {
            if let Some(existing) = self.store.edge_between(predecessor, successor) {
                return Err(DependencyError::DuplicateEdge {
                    existing: existing.id.clone(),
                    predecessor: predecessor.clone(),
                    successor: successor.clone(),
                });
            }
        }

        if self.store.would_create_cycle(predecessor, successor) {
            return Err(DependencyError::CyclicDependency {
                predecessor: predecessor.clone(),
                successor: successor.clone(),
            });
        }

        Ok(ValidCreate {
            predecessor: predecessor.clone(),
            successor: successor.clone(),
            lag,
        })
    }

    /// Validates an in-place change of type and/or lag
    ///
    /// Endpoints cannot change on update, so there is no cycle re-check.
    pub fn validate_update(
        &self,
        id: &DependencyId,
        patch: &DependencyPatch,
    ) -> Result<ValidUpdate, DependencyError> {
        if !self.store.contains_edge(id) {
            return Err(DependencyError::NotFound(id.clone()));
        }

        let lag = patch.lag.map(|days| self.validate_lag(days)).transpose()?;

        Ok(ValidUpdate {
            id: id.clone(),
            dep_type: patch.dep_type,
            lag,
        })
    }

    fn validate_lag(&self, days: i64) -> Result<Lag, DependencyError> {
        let lag = Lag::new(days)?;
        match self.rules.max_lag_days {
            Some(max) if lag.days() > max => Err(DependencyError::InvalidLag(format!(
                "{} (maximum is {})",
                days, max
            ))),
            _ => Ok(lag),
        }
    }
}
