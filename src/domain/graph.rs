//! Graph store for one schedule
//!
//! Holds the item reference cache and the dependency edges, keyed by id in
//! insertion order, with secondary indices grouping edges by predecessor and
//! by successor. Read queries never mutate; mutation is reserved to the
//! repository, which validates first.
//! Uses petgraph for topological ordering and whole-graph audits.

use indexmap::IndexMap;
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use thiserror::Error;

use super::cycle;
use super::dependency::Dependency;
use super::id::{DependencyId, ItemId};
use super::item::ScheduleItem;

/// An invariant violation found in loaded data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphViolation {
    #[error("Dependency {edge} references unknown item {item}")]
    UnknownEndpoint { edge: DependencyId, item: ItemId },

    #[error("Dependency {0} links an item to itself")]
    SelfLoop(DependencyId),

    #[error("Dependency id {0} is used by more than one record")]
    DuplicateId(DependencyId),

    #[error("Dependencies {first} and {second} both link {predecessor} -> {successor}")]
    DuplicatePair {
        first: DependencyId,
        second: DependencyId,
        predecessor: ItemId,
        successor: ItemId,
    },

    #[error("Dependency graph contains a cycle")]
    Cycle,
}

/// In-memory dependency graph for a single schedule
#[derive(Debug, Default, Clone)]
pub struct GraphStore {
    items: IndexMap<ItemId, ScheduleItem>,
    edges: IndexMap<DependencyId, Dependency>,

    /// predecessor -> ids of edges leaving it, in insertion order
    by_predecessor: HashMap<ItemId, Vec<DependencyId>>,

    /// successor -> ids of edges entering it, in insertion order
    by_successor: HashMap<ItemId, Vec<DependencyId>>,

    /// loaded records whose id was already taken; the first record wins
    shadowed: Vec<Dependency>,
}

impl GraphStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from provider items and persisted edges
    ///
    /// Edges are loaded as-is; call [`GraphStore::audit`] to find records
    /// that break the graph invariants. A record reusing an earlier id is
    /// set aside rather than replacing it, see [`GraphStore::duplicate_ids`].
    pub fn from_parts(
        items: impl IntoIterator<Item = ScheduleItem>,
        edges: impl IntoIterator<Item = Dependency>,
    ) -> Self {
        let mut store = Self::new();
        store.set_items(items);
        for edge in edges {
            if store.edges.contains_key(&edge.id) {
                store.shadowed.push(edge);
            } else {
                store.insert_edge(edge);
            }
        }
        store
    }

    /// Ids that appeared on more than one loaded record
    ///
    /// Only the first record with each id is part of the graph. Writing the
    /// store back would lose the others.
    pub fn duplicate_ids(&self) -> impl Iterator<Item = &DependencyId> {
        self.shadowed.iter().map(|e| &e.id)
    }

    /// Replaces the item reference cache
    pub fn set_items(&mut self, items: impl IntoIterator<Item = ScheduleItem>) {
        self.items = items.into_iter().map(|i| (i.id.clone(), i)).collect();
    }

    /// Returns the item with the given id
    pub fn item(&self, id: &ItemId) -> Option<&ScheduleItem> {
        self.items.get(id)
    }

    /// Returns true if the item is known
    pub fn contains_item(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    /// Iterates over items in provider order
    pub fn items(&self) -> impl Iterator<Item = &ScheduleItem> {
        self.items.values()
    }

    /// Returns the display name for an item, falling back to its id
    pub fn item_name<'a>(&'a self, id: &'a ItemId) -> &'a str {
        self.items
            .get(id)
            .map(|i| i.name.as_str())
            .unwrap_or_else(|| id.as_str())
    }

    /// Returns the edge with the given id
    pub fn edge(&self, id: &DependencyId) -> Option<&Dependency> {
        self.edges.get(id)
    }

    /// Returns true if the edge id is in use
    pub fn contains_edge(&self, id: &DependencyId) -> bool {
        self.edges.contains_key(id)
    }

    /// Iterates over edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Dependency> {
        self.edges.values()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of items
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Edges whose predecessor is `node`
    pub fn outgoing(&self, node: &ItemId) -> Vec<&Dependency> {
        self.indexed(&self.by_predecessor, node)
    }

    /// Edges whose successor is `node`
    pub fn incoming(&self, node: &ItemId) -> Vec<&Dependency> {
        self.indexed(&self.by_successor, node)
    }

    /// The first inserted edge from `predecessor` to `successor`, if any
    pub fn edge_between(&self, predecessor: &ItemId, successor: &ItemId) -> Option<&Dependency> {
        self.by_predecessor
            .get(predecessor)?
            .iter()
            .filter_map(|id| self.edges.get(id))
            .find(|e| e.links(predecessor, successor))
    }

    fn indexed(&self, index: &HashMap<ItemId, Vec<DependencyId>>, node: &ItemId) -> Vec<&Dependency> {
        index
            .get(node)
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default()
    }

    /// Returns true if adding `predecessor -> successor` would close a cycle
    ///
    /// Same search as [`cycle::would_create_cycle`], walking the predecessor
    /// index instead of rescanning every edge.
    pub fn would_create_cycle(&self, predecessor: &ItemId, successor: &ItemId) -> bool {
        if predecessor == successor {
            return true;
        }
        cycle::reaches(successor, predecessor, |node| {
            self.by_predecessor
                .get(node)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .filter_map(|id| self.edges.get(id))
                .map(|e| &e.successor_id)
        })
    }

    /// Item ids ordered so every predecessor precedes its successors
    ///
    /// Items referenced only by edges are included after the known ones.
    /// Returns `None` if the edge set is cyclic.
    pub fn topological_order(&self) -> Option<Vec<ItemId>> {
        let (graph, _) = self.to_petgraph();
        let order = toposort(&graph, None).ok()?;
        Some(order.into_iter().map(|idx| graph[idx].clone()).collect())
    }

    /// Checks the whole store against the graph invariants
    ///
    /// Repeated ordered pairs are reported unless `allow_parallel_edges`.
    pub fn audit(&self, allow_parallel_edges: bool) -> Vec<GraphViolation> {
        let mut violations: Vec<GraphViolation> = self
            .duplicate_ids()
            .cloned()
            .map(GraphViolation::DuplicateId)
            .collect();

        for edge in self.edges.values() {
            if edge.predecessor_id == edge.successor_id {
                violations.push(GraphViolation::SelfLoop(edge.id.clone()));
            }
            for endpoint in [&edge.predecessor_id, &edge.successor_id] {
                if !self.items.contains_key(endpoint) {
                    violations.push(GraphViolation::UnknownEndpoint {
                        edge: edge.id.clone(),
                        item: endpoint.clone(),
                    });
                }
            }
        }

        if !allow_parallel_edges {
            let mut first_by_pair: HashMap<(&ItemId, &ItemId), &DependencyId> = HashMap::new();
            for edge in self.edges.values() {
                let pair = (&edge.predecessor_id, &edge.successor_id);
                match first_by_pair.get(&pair) {
                    Some(first) => violations.push(GraphViolation::DuplicatePair {
                        first: (*first).clone(),
                        second: edge.id.clone(),
                        predecessor: edge.predecessor_id.clone(),
                        successor: edge.successor_id.clone(),
                    }),
                    None => {
                        first_by_pair.insert(pair, &edge.id);
                    }
                }
            }
        }

        let (graph, _) = self.to_petgraph();
        if is_cyclic_directed(&graph) {
            violations.push(GraphViolation::Cycle);
        }

        violations
    }

    /// Builds a petgraph view of the store (nodes: items, edges: dependencies)
    fn to_petgraph(&self) -> (DiGraph<ItemId, ()>, HashMap<ItemId, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut node_map: HashMap<ItemId, NodeIndex> = HashMap::new();

        for id in self.items.keys() {
            let idx = graph.add_node(id.clone());
            node_map.insert(id.clone(), idx);
        }

        for edge in self.edges.values() {
            let from = *node_map
                .entry(edge.predecessor_id.clone())
                .or_insert_with(|| graph.add_node(edge.predecessor_id.clone()));
            let to = *node_map
                .entry(edge.successor_id.clone())
                .or_insert_with(|| graph.add_node(edge.successor_id.clone()));
            graph.add_edge(from, to, ());
        }

        (graph, node_map)
    }

    pub(crate) fn insert_edge(&mut self, edge: Dependency) {
        if let Some(old) = self.edges.get(&edge.id).cloned() {
            self.unindex(&old);
        }
        self.by_predecessor
            .entry(edge.predecessor_id.clone())
            .or_default()
            .push(edge.id.clone());
        self.by_successor
            .entry(edge.successor_id.clone())
            .or_default()
            .push(edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
    }

    pub(crate) fn remove_edge(&mut self, id: &DependencyId) -> Option<Dependency> {
        let edge = self.edges.shift_remove(id)?;
        self.unindex(&edge);
        Some(edge)
    }

    pub(crate) fn edge_mut(&mut self, id: &DependencyId) -> Option<&mut Dependency> {
        self.edges.get_mut(id)
    }

    fn unindex(&mut self, edge: &Dependency) {
        for (index, key) in [
            (&mut self.by_predecessor, &edge.predecessor_id),
            (&mut self.by_successor, &edge.successor_id),
        ] {
            if let Some(ids) = index.get_mut(key) {
                ids.retain(|id| id != &edge.id);
                if ids.is_empty() {
                    index.remove(key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dependency::{DependencyType, Lag};
    use crate::domain::item::ItemKind;

    fn id(s: &str) -> ItemId {
        s.parse().unwrap()
    }

    fn item(s: &str) -> ScheduleItem {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ScheduleItem::new(id(s), format!("Item {}", s), ItemKind::Task, day, day)
    }

    fn edge(n: u32, from: &str, to: &str) -> Dependency {
        Dependency::new(
            format!("dep{}", n).parse().unwrap(),
            id(from),
            id(to),
            DependencyType::FinishToStart,
            Lag::from(n),
        )
    }

    fn abc() -> GraphStore {
        GraphStore::from_parts(
            [item("a"), item("b"), item("c")],
            [edge(1, "a", "b"), edge(2, "b", "c"), edge(3, "a", "c")],
        )
    }

    #[test]
    fn empty_store() {
        let store = GraphStore::new();
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.item_count(), 0);
        assert!(store.audit(false).is_empty());
    }

    #[test]
    fn outgoing_and_incoming() {
        let store = abc();

        let out: Vec<_> = store.outgoing(&id("a")).iter().map(|e| e.id.to_string()).collect();
        assert_eq!(out, vec!["dep1", "dep3"]);

        let inc: Vec<_> = store.incoming(&id("c")).iter().map(|e| e.id.to_string()).collect();
        assert_eq!(inc, vec!["dep2", "dep3"]);

        assert!(store.outgoing(&id("c")).is_empty());
        assert!(store.incoming(&id("zz")).is_empty());
    }

    #[test]
    fn edge_between_is_directional() {
        let store = abc();
        assert_eq!(store.edge_between(&id("a"), &id("b")).unwrap().id.as_str(), "dep1");
        assert!(store.edge_between(&id("b"), &id("a")).is_none());
    }

    #[test]
    fn edge_between_returns_first_inserted() {
        let mut store = abc();
        store.insert_edge(edge(9, "a", "b"));
        assert_eq!(store.edge_between(&id("a"), &id("b")).unwrap().id.as_str(), "dep1");
    }

    #[test]
    fn remove_edge_updates_indices() {
        let mut store = abc();
        let removed = store.remove_edge(&"dep1".parse().unwrap()).unwrap();
        assert_eq!(removed.predecessor_id, id("a"));

        assert!(store.edge_between(&id("a"), &id("b")).is_none());
        assert_eq!(store.outgoing(&id("a")).len(), 1);
        assert!(store.incoming(&id("b")).is_empty());
        assert!(store.remove_edge(&"dep1".parse().unwrap()).is_none());
    }

    #[test]
    fn edges_keep_insertion_order_after_removal() {
        let mut store = abc();
        store.remove_edge(&"dep2".parse().unwrap());
        let ids: Vec<_> = store.edges().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["dep1", "dep3"]);
    }

    #[test]
    fn reinserting_same_id_replaces_index_entries() {
        let mut store = abc();
        store.insert_edge(edge(1, "c", "a"));
        assert!(store.edge_between(&id("a"), &id("b")).is_none());
        assert_eq!(store.incoming(&id("a")).len(), 1);
        assert_eq!(store.edge_count(), 3);
    }

    #[test]
    fn indexed_cycle_check() {
        let store = abc();
        assert!(store.would_create_cycle(&id("c"), &id("a")));
        assert!(store.would_create_cycle(&id("b"), &id("a")));
        assert!(store.would_create_cycle(&id("a"), &id("a")));
        assert!(!store.would_create_cycle(&id("a"), &id("c")));
    }

    #[test]
    fn topological_order() {
        let store = abc();
        let order = store.topological_order().unwrap();

        let pos = |s: &str| order.iter().position(|i| i == &id(s)).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
    }

    #[test]
    fn audit_reports_violations() {
        let store = GraphStore::from_parts(
            [item("a"), item("b")],
            [edge(1, "a", "b"), edge(2, "b", "a"), edge(3, "a", "ghost"), edge(4, "b", "b")],
        );

        let violations = store.audit(false);
        assert!(violations.contains(&GraphViolation::Cycle));
        assert!(violations.contains(&GraphViolation::SelfLoop("dep4".parse().unwrap())));
        assert!(violations.contains(&GraphViolation::UnknownEndpoint {
            edge: "dep3".parse().unwrap(),
            item: id("ghost"),
        }));
        assert!(store.topological_order().is_none());
    }

    #[test]
    fn item_name_falls_back_to_id() {
        let store = abc();
        let known = id("a");
        let unknown = id("ghost");
        assert_eq!(store.item_name(&known), "Item a");
        assert_eq!(store.item_name(&unknown), "ghost");
    }

    #[test]
    fn repeated_id_keeps_first_record_and_is_audited() {
        let mut second = edge(2, "b", "c");
        second.id = "dep1".parse().unwrap();
        let store = GraphStore::from_parts(
            [item("a"), item("b"), item("c")],
            [edge(1, "a", "b"), second],
        );

        assert_eq!(store.edge_count(), 1);
        assert!(store.edge_between(&id("a"), &id("b")).is_some());
        assert!(store.incoming(&id("c")).is_empty());

        let dupes: Vec<_> = store.duplicate_ids().map(|d| d.to_string()).collect();
        assert_eq!(dupes, vec!["dep1"]);
        assert_eq!(
            store.audit(true),
            vec![GraphViolation::DuplicateId("dep1".parse().unwrap())]
        );
    }

    #[test]
    fn repeated_pair_audited_unless_parallel_edges_allowed() {
        let store = GraphStore::from_parts(
            [item("a"), item("b")],
            [edge(1, "a", "b"), edge(2, "a", "b")],
        );

        assert_eq!(
            store.audit(false),
            vec![GraphViolation::DuplicatePair {
                first: "dep1".parse().unwrap(),
                second: "dep2".parse().unwrap(),
                predecessor: id("a"),
                successor: id("b"),
            }]
        );
        assert!(store.audit(true).is_empty());
    }
}
