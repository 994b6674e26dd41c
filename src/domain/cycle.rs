//! Cycle detection for proposed dependency edges
//!
//! Adding `P -> S` closes a cycle iff `S` already reaches `P` through
//! existing edges. The check is a breadth-first search from `S` and is
//! cheap enough to run before every single proposed edge.

use std::collections::{HashMap, HashSet, VecDeque};

use super::dependency::Dependency;
use super::id::ItemId;

/// Returns true if adding `predecessor -> successor` to `edges` would create a cycle
///
/// Pure function of its arguments: the same edge set always gives the same
/// answer.
pub fn would_create_cycle<'a, I>(predecessor: &ItemId, successor: &ItemId, edges: I) -> bool
where
    I: IntoIterator<Item = &'a Dependency>,
{
    if predecessor == successor {
        return true;
    }

    let mut adjacency: HashMap<&ItemId, Vec<&ItemId>> = HashMap::new();
    for edge in edges {
        adjacency
            .entry(&edge.predecessor_id)
            .or_default()
            .push(&edge.successor_id);
    }

    reaches(successor, predecessor, |node| {
        adjacency.get(node).map(Vec::as_slice).unwrap_or_default().iter().copied()
    })
}

/// Breadth-first reachability from `start` to `target`
///
/// `successors` yields the direct successors of a node. Used by the graph
/// store to run the same search over its predecessor index.
pub(crate) fn reaches<'a, F, I>(start: &'a ItemId, target: &ItemId, successors: F) -> bool
where
    F: Fn(&'a ItemId) -> I,
    I: Iterator<Item = &'a ItemId>,
{
    if start == target {
        return true;
    }

    let mut visited: HashSet<&ItemId> = HashSet::new();
    let mut queue: VecDeque<&ItemId> = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for next in successors(current) {
            if next == target {
                return true;
            }
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dependency::{DependencyType, Lag};

    fn id(s: &str) -> ItemId {
        s.parse().unwrap()
    }

    fn edge(n: usize, from: &str, to: &str) -> Dependency {
        Dependency::new(
            format!("dep{}", n).parse().unwrap(),
            id(from),
            id(to),
            DependencyType::FinishToStart,
            Lag::ZERO,
        )
    }

    #[test]
    fn self_edge_is_a_cycle() {
        assert!(would_create_cycle(&id("x"), &id("x"), &[]));
    }

    #[test]
    fn empty_graph_has_no_cycle() {
        assert!(!would_create_cycle(&id("a"), &id("b"), &[]));
    }

    #[test]
    fn direct_cycle() {
        let edges = vec![edge(1, "a", "b")];
        assert!(would_create_cycle(&id("b"), &id("a"), &edges));
    }

    #[test]
    fn indirect_cycle() {
        let edges = vec![edge(1, "a", "b"), edge(2, "b", "c")];

        assert!(would_create_cycle(&id("c"), &id("a"), &edges));
        // Parallel shortcut, not a cycle
        assert!(!would_create_cycle(&id("a"), &id("c"), &edges));
    }

    #[test]
    fn unrelated_branches() {
        let edges = vec![edge(1, "a", "b"), edge(2, "c", "d")];
        assert!(!would_create_cycle(&id("d"), &id("a"), &edges));
        assert!(!would_create_cycle(&id("b"), &id("c"), &edges));
    }

    #[test]
    fn diamond_revisits_are_bounded() {
        let edges = vec![
            edge(1, "a", "b"),
            edge(2, "a", "c"),
            edge(3, "b", "d"),
            edge(4, "c", "d"),
        ];

        assert!(would_create_cycle(&id("d"), &id("a"), &edges));
        assert!(!would_create_cycle(&id("b"), &id("c"), &edges));
    }

    #[test]
    fn deterministic() {
        let edges = vec![edge(1, "a", "b"), edge(2, "b", "c")];
        let first = would_create_cycle(&id("c"), &id("a"), &edges);
        let second = would_create_cycle(&id("c"), &id("a"), &edges);
        assert_eq!(first, second);
    }

    #[test]
    fn seed_schedule() {
        let chain = [
            ("item1-1", "item1-2"),
            ("item1-2", "item1-3"),
            ("item1-3", "item2-1"),
            ("item2-1", "item2-2"),
            ("item2-2", "item2-3"),
            ("item2-3", "item2-4"),
        ];

        let mut edges = Vec::new();
        for (n, (from, to)) in chain.iter().enumerate() {
            assert!(!would_create_cycle(&id(from), &id(to), &edges));
            edges.push(edge(n, from, to));
        }

        assert!(would_create_cycle(&id("item2-4"), &id("item1-1"), &edges));
    }

    #[test]
    fn performance_long_chain() {
        use std::time::Instant;

        let edges: Vec<_> = (0..500)
            .map(|i| edge(i, &format!("n{}", i), &format!("n{}", i + 1)))
            .collect();

        let start = Instant::now();
        assert!(would_create_cycle(&id("n500"), &id("n0"), &edges));
        let duration = start.elapsed();

        assert!(duration.as_millis() < 50, "Cycle check took {:?}", duration);
    }
}
