//! Domain models for schedule dependencies
//!
//! Contains the dependency graph, its validation rules and the read-only
//! projections, without any I/O concerns.

mod id;
mod item;
mod dependency;
mod cycle;
mod graph;
mod validate;
mod repository;
pub mod projection;

pub use id::{DependencyId, IdError, ItemId, ScheduleId};
pub use item::{ItemKind, ScheduleItem};
pub use dependency::{Dependency, DependencyError, DependencyPatch, DependencyType, Lag};
pub use cycle::would_create_cycle;
pub use graph::{GraphStore, GraphViolation};
pub use validate::{DependencyValidator, ValidCreate, ValidUpdate, ValidationRules};
pub use repository::DependencyRepository;
