//! Read-only projections over a graph store
//!
//! List, matrix and timeline views are recomputed from the store on every
//! call and never keep their own copy of the edges.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use super::dependency::{Dependency, DependencyType, Lag};
use super::graph::GraphStore;
use super::id::{DependencyId, ItemId};

/// One endpoint with its resolved display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub id: ItemId,
    pub name: String,
}

impl Endpoint {
    fn resolve(store: &GraphStore, id: &ItemId) -> Self {
        Self {
            id: id.clone(),
            name: store.item_name(id).to_string(),
        }
    }
}

/// A row of the flat dependency list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    pub id: DependencyId,
    pub predecessor: Endpoint,
    pub successor: Endpoint,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    pub lag: Lag,
}

/// Flat enumeration of edges, names joined from the item cache
pub fn list_view(store: &GraphStore) -> Vec<ListRow> {
    store
        .edges()
        .map(|edge| ListRow {
            id: edge.id.clone(),
            predecessor: Endpoint::resolve(store, &edge.predecessor_id),
            successor: Endpoint::resolve(store, &edge.successor_id),
            dep_type: edge.dep_type,
            lag: edge.lag,
        })
        .collect()
}

/// Content of one matrix cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MatrixCell {
    /// The diagonal: an item cannot depend on itself
    Diagonal,
    /// An edge exists for this ordered pair
    Linked {
        id: DependencyId,
        #[serde(rename = "type")]
        dep_type: DependencyType,
        lag: Lag,
    },
    /// No edge; `creatable` is false when adding one would close a cycle
    Empty { creatable: bool },
}

/// Square predecessor x successor matrix over all known items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixView {
    /// Item ids in provider order; rows are predecessors, columns successors
    pub items: Vec<Endpoint>,
    pub cells: Vec<Vec<MatrixCell>>,
}

impl MatrixView {
    pub fn cell(&self, predecessor: usize, successor: usize) -> Option<&MatrixCell> {
        self.cells.get(predecessor)?.get(successor)
    }
}

/// Builds the matrix view
///
/// Each cell surfaces at most one edge (the first inserted for the pair).
pub fn matrix_view(store: &GraphStore) -> MatrixView {
    let items: Vec<Endpoint> = store
        .items()
        .map(|i| Endpoint {
            id: i.id.clone(),
            name: i.name.clone(),
        })
        .collect();

    let cells = items
        .iter()
        .map(|row| {
            items
                .iter()
                .map(|col| {
                    if row.id == col.id {
                        return MatrixCell::Diagonal;
                    }
                    match store.edge_between(&row.id, &col.id) {
                        Some(edge) => MatrixCell::Linked {
                            id: edge.id.clone(),
                            dep_type: edge.dep_type,
                            lag: edge.lag,
                        },
                        None => MatrixCell::Empty {
                            creatable: !store.would_create_cycle(&row.id, &col.id),
                        },
                    }
                })
                .collect()
        })
        .collect();

    MatrixView { items, cells }
}

/// Date span of a schedule item, when the item is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One predecessor -> successor card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineCard {
    pub id: DependencyId,
    pub predecessor: Endpoint,
    pub predecessor_span: Option<Span>,
    pub successor: Endpoint,
    pub successor_span: Option<Span>,
    pub badge: &'static str,
    pub lag: Lag,
}

/// Cards ordered by the topological position of predecessor, then successor
///
/// Falls back to insertion order if the stored graph is cyclic.
pub fn timeline_view(store: &GraphStore) -> Vec<TimelineCard> {
    let rank: HashMap<ItemId, usize> = store
        .topological_order()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(pos, id)| (id, pos))
        .collect();

    let mut edges: Vec<&Dependency> = store.edges().collect();
    if !rank.is_empty() {
        // sort_by_key is stable, so parallel edges keep insertion order
        edges.sort_by_key(|e| (rank.get(&e.predecessor_id), rank.get(&e.successor_id)));
    }

    edges
        .into_iter()
        .map(|edge| TimelineCard {
            id: edge.id.clone(),
            predecessor: Endpoint::resolve(store, &edge.predecessor_id),
            predecessor_span: span(store, &edge.predecessor_id),
            successor: Endpoint::resolve(store, &edge.successor_id),
            successor_span: span(store, &edge.successor_id),
            badge: edge.dep_type.badge(),
            lag: edge.lag,
        })
        .collect()
}

fn span(store: &GraphStore, id: &ItemId) -> Option<Span> {
    store.item(id).map(|i| Span {
        start: i.start,
        end: i.end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{ItemKind, ScheduleItem};

    fn id(s: &str) -> ItemId {
        s.parse().unwrap()
    }

    fn item(s: &str, day: u32) -> ScheduleItem {
        let d = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        ScheduleItem::new(id(s), s.to_uppercase(), ItemKind::Task, d, d)
    }

    fn edge(n: u32, from: &str, to: &str, dep_type: DependencyType) -> Dependency {
        Dependency::new(
            format!("dep{}", n).parse().unwrap(),
            id(from),
            id(to),
            dep_type,
            Lag::from(n),
        )
    }

    fn store() -> GraphStore {
        GraphStore::from_parts(
            [item("a", 1), item("b", 2), item("c", 3)],
            // inserted out of topological order on purpose
            [
                edge(1, "b", "c", DependencyType::StartToStart),
                edge(2, "a", "b", DependencyType::FinishToStart),
            ],
        )
    }

    #[test]
    fn list_resolves_names() {
        let rows = list_view(&store());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].predecessor.name, "B");
        assert_eq!(rows[0].successor.name, "C");
        assert_eq!(rows[1].id.as_str(), "dep2");
    }

    #[test]
    fn list_uses_id_for_unknown_items() {
        let store = GraphStore::from_parts(
            [item("a", 1)],
            [edge(1, "a", "gone", DependencyType::FinishToStart)],
        );
        let rows = list_view(&store);
        assert_eq!(rows[0].successor.name, "gone");
    }

    #[test]
    fn matrix_cells() {
        let m = matrix_view(&store());
        assert_eq!(m.items.len(), 3);

        assert_eq!(m.cell(0, 0), Some(&MatrixCell::Diagonal));
        assert!(matches!(
            m.cell(0, 1),
            Some(MatrixCell::Linked { dep_type: DependencyType::FinishToStart, .. })
        ));
        // a -> c is a legal shortcut
        assert_eq!(m.cell(0, 2), Some(&MatrixCell::Empty { creatable: true }));
        // c -> a would close a cycle
        assert_eq!(m.cell(2, 0), Some(&MatrixCell::Empty { creatable: false }));
        assert!(m.cell(3, 0).is_none());
    }

    #[test]
    fn timeline_follows_topology() {
        let cards = timeline_view(&store());
        let ids: Vec<_> = cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["dep2", "dep1"]);

        assert_eq!(cards[1].badge, "SS");
        assert_eq!(cards[0].predecessor_span.unwrap().start.to_string(), "2024-05-01");
    }

    #[test]
    fn projections_track_store_changes() {
        let mut store = store();
        assert_eq!(list_view(&store).len(), 2);

        store.remove_edge(&"dep1".parse().unwrap());
        assert_eq!(list_view(&store).len(), 1);
        assert_eq!(timeline_view(&store).len(), 1);
        assert_eq!(matrix_view(&store).cell(1, 2), Some(&MatrixCell::Empty { creatable: true }));
    }

    #[test]
    fn matrix_json_shape() {
        let m = matrix_view(&store());
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["cells"][0][0]["state"], "diagonal");
        assert_eq!(json["cells"][0][1]["state"], "linked");
        assert_eq!(json["cells"][0][1]["type"], "FinishToStart");
        assert_eq!(json["cells"][2][0]["creatable"], false);
    }
}
