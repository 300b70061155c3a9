// ABOUTME: Iterative three-color DFS cycle extraction with canonical rotation and dedup.

use crate::builder::DependencyEdge;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, PartialEq)]
enum Color {
    Unvisited,
    InStack,
    Done,
}

/// Canonical form: rotate the cycle so it starts at its lexicographically
/// smallest vertex. `A->B->C->A` is stored once regardless of entry point.
fn canonicalize(cycle: &[String]) -> Vec<String> {
    if cycle.is_empty() {
        return Vec::new();
    }
    let min_idx = cycle
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut rotated = Vec::with_capacity(cycle.len());
    rotated.extend_from_slice(&cycle[min_idx..]);
    rotated.extend_from_slice(&cycle[..min_idx]);
    rotated
}

/// Find import cycles among resolved internal edges. Self-loops are kept
/// only when a file genuinely imports itself.
pub fn find_cycles(nodes: &BTreeSet<String>, edges: &[DependencyEdge]) -> Vec<Vec<String>> {
    let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for edge in edges.iter().filter(|e| e.is_resolved && !e.is_external) {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .insert(edge.target.as_str());
    }

    let mut colors: BTreeMap<&str, Color> = nodes
        .iter()
        .map(|n| (n.as_str(), Color::Unvisited))
        .collect();
    let mut found: BTreeSet<Vec<String>> = BTreeSet::new();

    for start in nodes {
        if colors[start.as_str()] != Color::Unvisited {
            continue;
        }

        // Explicit stack of (node, children, next child index); `path`
        // mirrors the in-stack chain for slice extraction on back-edges.
        let mut stack: Vec<(&str, Vec<&str>, usize)> = Vec::new();
        let mut path: Vec<&str> = Vec::new();

        let children: Vec<&str> = adjacency
            .get(start.as_str())
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        colors.insert(start.as_str(), Color::InStack);
        path.push(start.as_str());
        stack.push((start.as_str(), children, 0));

        while !stack.is_empty() {
            let next = {
                let top = stack.last_mut().expect("stack is non-empty");
                if top.2 < top.1.len() {
                    let next = top.1[top.2];
                    top.2 += 1;
                    Some(next)
                } else {
                    None
                }
            };

            let Some(next) = next else {
                let (node, _, _) = stack.pop().expect("stack is non-empty");
                colors.insert(node, Color::Done);
                path.pop();
                continue;
            };

            match colors.get(next).copied().unwrap_or(Color::Done) {
                Color::Unvisited => {
                    let grandchildren: Vec<&str> = adjacency
                        .get(next)
                        .map(|s| s.iter().copied().collect())
                        .unwrap_or_default();
                    colors.insert(next, Color::InStack);
                    path.push(next);
                    stack.push((next, grandchildren, 0));
                }
                Color::InStack => {
                    if let Some(pos) = path.iter().position(|&p| p == next) {
                        let cycle: Vec<String> =
                            path[pos..].iter().map(|s| s.to_string()).collect();
                        found.insert(canonicalize(&cycle));
                    }
                }
                Color::Done => {}
            }
        }
    }

    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str) -> DependencyEdge {
        DependencyEdge {
            source: source.to_string(),
            target: target.to_string(),
            module: target.to_string(),
            line_number: 1,
            import_type: "import".to_string(),
            is_external: false,
            is_resolved: true,
        }
    }

    fn node_set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn three_node_cycle_is_canonical() {
        let nodes = node_set(&["x.py", "y.py", "z.py"]);
        let edges = vec![edge("x.py", "y.py"), edge("y.py", "z.py"), edge("z.py", "x.py")];
        let cycles = find_cycles(&nodes, &edges);
        assert_eq!(cycles, vec![vec!["x.py", "y.py", "z.py"]]);
    }

    #[test]
    fn canonical_regardless_of_entry_point() {
        // Same ring but node names ordered so DFS enters mid-cycle.
        let nodes = node_set(&["b.py", "c.py", "a.py"]);
        let edges = vec![edge("b.py", "c.py"), edge("c.py", "a.py"), edge("a.py", "b.py")];
        let cycles = find_cycles(&nodes, &edges);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0][0], "a.py");
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let nodes = node_set(&["a.py", "b.py", "c.py"]);
        let edges = vec![edge("a.py", "b.py"), edge("b.py", "c.py")];
        assert!(find_cycles(&nodes, &edges).is_empty());
    }

    #[test]
    fn self_loop_is_a_single_node_cycle() {
        let nodes = node_set(&["a.py"]);
        let edges = vec![edge("a.py", "a.py")];
        let cycles = find_cycles(&nodes, &edges);
        assert_eq!(cycles, vec![vec!["a.py"]]);
    }

    #[test]
    fn two_distinct_cycles_both_reported() {
        let nodes = node_set(&["a.py", "b.py", "m.py", "n.py"]);
        let edges = vec![
            edge("a.py", "b.py"),
            edge("b.py", "a.py"),
            edge("m.py", "n.py"),
            edge("n.py", "m.py"),
        ];
        let cycles = find_cycles(&nodes, &edges);
        assert_eq!(cycles.len(), 2);
    }

    #[test]
    fn external_edges_do_not_create_cycles() {
        let nodes = node_set(&["a.py"]);
        let mut e = edge("a.py", "requests");
        e.is_external = true;
        e.is_resolved = false;
        assert!(find_cycles(&nodes, &[e]).is_empty());
    }
}
