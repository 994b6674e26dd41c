//! Schedule dependency graphs
//!
//! Directed, typed, lagged dependencies between the phases, tasks and
//! milestones of a construction schedule. Every mutation keeps the graph
//! acyclic; list, matrix and timeline projections are derived read-only.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{
    Dependency, DependencyError, DependencyId, DependencyRepository, DependencyType, GraphStore,
    ItemId, Lag, ScheduleId, ScheduleItem,
};
