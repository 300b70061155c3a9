// ABOUTME: Call-kind refinement of the import graph plus BFS downstream tracing from seed files.

use crate::builder::DependencyGraph;
use serde::{Deserialize, Serialize};
use specgraph_core::{Result, SpecGraphError};
use specgraph_parser::{extract_call_tokens, extract_function_names};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::Path;

pub const DEFAULT_MAX_TRACE_DEPTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Call,
    ImportReference,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEdge {
    pub source: String,
    pub target: String,
    pub edge_kind: EdgeKind,
    pub called_symbols: Vec<String>,
    pub call_signal_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracedDependent {
    pub path: String,
    pub depth: usize,
    pub via_path: String,
    pub edge_kind: EdgeKind,
    pub called_symbols: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceResult {
    pub seeds: Vec<String>,
    pub max_depth: usize,
    pub dependents: Vec<TracedDependent>,
    pub call_edge_count: usize,
    pub import_reference_edge_count: usize,
}

/// Refine each resolved import edge with call evidence: an edge is
/// call-kind when a call token in the source matches a function name
/// defined in the target.
pub fn refine_call_edges(root: &Path, graph: &DependencyGraph) -> Vec<CallEdge> {
    let mut content_cache: HashMap<String, String> = HashMap::new();
    let mut load = |cache: &mut HashMap<String, String>, path: &str| -> String {
        if let Some(content) = cache.get(path) {
            return content.clone();
        }
        let content = std::fs::read(root.join(path))
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default();
        cache.insert(path.to_string(), content.clone());
        content
    };

    let mut pairs: BTreeSet<(&str, &str)> = BTreeSet::new();
    for edge in graph.edges.iter().filter(|e| e.is_resolved && !e.is_external) {
        pairs.insert((edge.source.as_str(), edge.target.as_str()));
    }

    let mut edges = Vec::with_capacity(pairs.len());
    for (source, target) in pairs {
        let source_content = load(&mut content_cache, source);
        let target_content = load(&mut content_cache, target);

        let call_tokens = extract_call_tokens(&source_content);
        let target_language = graph
            .node_languages
            .get(target)
            .copied()
            .unwrap_or(specgraph_core::Language::Unknown);
        let function_names = extract_function_names(&target_content, target_language);

        let called_symbols: Vec<String> = call_tokens
            .intersection(&function_names)
            .cloned()
            .collect();
        let edge_kind = if called_symbols.is_empty() {
            EdgeKind::ImportReference
        } else {
            EdgeKind::Call
        };
        edges.push(CallEdge {
            source: source.to_string(),
            target: target.to_string(),
            edge_kind,
            call_signal_count: called_symbols.len(),
            called_symbols,
        });
    }
    edges
}

/// BFS outward from seed files over the reverse call graph, recording each
/// dependent once at its shallowest depth. On equal depth a call edge
/// outranks an import reference for trace provenance.
pub fn trace_downstream(
    root: &Path,
    graph: &DependencyGraph,
    seeds: &[String],
    max_depth: usize,
) -> Result<TraceResult> {
    if seeds.is_empty() {
        return Err(SpecGraphError::InvalidInput(
            "Downstream trace requires at least one seed file".to_string(),
        ));
    }

    let call_edges = refine_call_edges(root, graph);
    let call_edge_count = call_edges
        .iter()
        .filter(|e| e.edge_kind == EdgeKind::Call)
        .count();
    let import_reference_edge_count = call_edges.len() - call_edge_count;

    // Reverse adjacency: target -> inbound edges.
    let mut reverse: BTreeMap<&str, Vec<&CallEdge>> = BTreeMap::new();
    for edge in &call_edges {
        reverse.entry(edge.target.as_str()).or_default().push(edge);
    }
    for inbound in reverse.values_mut() {
        inbound.sort_by(|a, b| a.source.cmp(&b.source));
    }

    let seed_set: BTreeSet<&str> = seeds.iter().map(String::as_str).collect();
    let mut recorded: BTreeMap<String, TracedDependent> = BTreeMap::new();
    let mut queue: VecDeque<(String, usize)> = seeds
        .iter()
        .map(|s| (s.clone(), 0usize))
        .collect();
    let mut visited_depth: BTreeMap<String, usize> = seeds
        .iter()
        .map(|s| (s.clone(), 0usize))
        .collect();

    while let Some((node, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let Some(inbound) = reverse.get(node.as_str()) else {
            continue;
        };
        for edge in inbound {
            let dependent = edge.source.as_str();
            if seed_set.contains(dependent) {
                continue;
            }
            let next_depth = depth + 1;
            match visited_depth.get(dependent) {
                None => {
                    visited_depth.insert(dependent.to_string(), next_depth);
                    recorded.insert(
                        dependent.to_string(),
                        TracedDependent {
                            path: dependent.to_string(),
                            depth: next_depth,
                            via_path: node.clone(),
                            edge_kind: edge.edge_kind,
                            called_symbols: edge.called_symbols.clone(),
                        },
                    );
                    queue.push_back((dependent.to_string(), next_depth));
                }
                Some(&existing) if existing == next_depth => {
                    // Same depth via another path: prefer call provenance.
                    if let Some(entry) = recorded.get_mut(dependent) {
                        if entry.edge_kind == EdgeKind::ImportReference
                            && edge.edge_kind == EdgeKind::Call
                        {
                            entry.via_path = node.clone();
                            entry.edge_kind = EdgeKind::Call;
                            entry.called_symbols = edge.called_symbols.clone();
                        }
                    }
                }
                _ => {}
            }
        }
    }

    let mut dependents: Vec<TracedDependent> = recorded.into_values().collect();
    dependents.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.path.cmp(&b.path)));

    Ok(TraceResult {
        seeds: seeds.to_vec(),
        max_depth,
        dependents,
        call_edge_count,
        import_reference_edge_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_graph, GraphConfig};
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        // c imports b, b imports a; b calls a's function, c only re-exports.
        fs::write(dir.path().join("a.py"), "def alpha(): ...\n").unwrap();
        fs::write(
            dir.path().join("b.py"),
            "import a\n\ndef beta():\n    return a.alpha()\n",
        )
        .unwrap();
        fs::write(dir.path().join("c.py"), "import b\n").unwrap();
        dir
    }

    #[test]
    fn call_edges_detect_symbol_intersection() {
        let dir = fixture();
        let graph = build_graph(&GraphConfig::new(dir.path())).unwrap();
        let edges = refine_call_edges(dir.path(), &graph);
        let b_to_a = edges
            .iter()
            .find(|e| e.source == "b.py" && e.target == "a.py")
            .unwrap();
        assert_eq!(b_to_a.edge_kind, EdgeKind::Call);
        assert_eq!(b_to_a.called_symbols, vec!["alpha".to_string()]);
        assert_eq!(b_to_a.call_signal_count, 1);

        let c_to_b = edges
            .iter()
            .find(|e| e.source == "c.py" && e.target == "b.py")
            .unwrap();
        assert_eq!(c_to_b.edge_kind, EdgeKind::ImportReference);
    }

    #[test]
    fn downstream_trace_records_shallowest_depth() {
        let dir = fixture();
        let graph = build_graph(&GraphConfig::new(dir.path())).unwrap();
        let result = trace_downstream(
            dir.path(),
            &graph,
            &["a.py".to_string()],
            DEFAULT_MAX_TRACE_DEPTH,
        )
        .unwrap();
        let paths: Vec<(&str, usize)> = result
            .dependents
            .iter()
            .map(|d| (d.path.as_str(), d.depth))
            .collect();
        assert_eq!(paths, vec![("b.py", 1), ("c.py", 2)]);
        assert_eq!(result.dependents[0].edge_kind, EdgeKind::Call);
        assert_eq!(result.dependents[0].via_path, "a.py");
    }

    #[test]
    fn max_depth_caps_traversal() {
        let dir = fixture();
        let graph = build_graph(&GraphConfig::new(dir.path())).unwrap();
        let result =
            trace_downstream(dir.path(), &graph, &["a.py".to_string()], 1).unwrap();
        assert_eq!(result.dependents.len(), 1);
        assert_eq!(result.dependents[0].path, "b.py");
    }

    #[test]
    fn empty_seeds_is_an_input_error() {
        let dir = fixture();
        let graph = build_graph(&GraphConfig::new(dir.path())).unwrap();
        assert!(trace_downstream(dir.path(), &graph, &[], 5).is_err());
    }

    #[test]
    fn reachable_dependents_have_edge_chains() {
        let dir = fixture();
        let graph = build_graph(&GraphConfig::new(dir.path())).unwrap();
        let result = trace_downstream(
            dir.path(),
            &graph,
            &["a.py".to_string()],
            DEFAULT_MAX_TRACE_DEPTH,
        )
        .unwrap();
        // Every traced dependent must have an edge pointing at its via_path.
        for dependent in &result.dependents {
            assert!(graph.edges.iter().any(|e| e.source == dependent.path
                && e.target == dependent.via_path));
        }
    }
}
