// ABOUTME: C4 model generation: context, containers (top components), and per-container
// ABOUTME: component expansion, with relationships aggregated from dependency edges.

use crate::inventory::{ComponentClass, ComponentInventory};
use serde::{Deserialize, Serialize};
use specgraph_core::paths;
use specgraph_graph::DependencyGraph;
use std::collections::BTreeMap;

/// Containers kept in the container diagram, largest first.
pub const MAX_CONTAINERS: usize = 20;

/// Stable slug for C4 identifiers.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    let trimmed = out.trim_matches('_').to_string();
    if trimmed.is_empty() {
        "root".to_string()
    } else {
        trimmed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalSystem {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub description: String,
    pub weight: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextModel {
    pub system: String,
    pub actors: Vec<Actor>,
    pub external_systems: Vec<ExternalSystem>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub container_type: String,
    pub technology: String,
    pub languages: Vec<String>,
    pub description: String,
    pub file_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerModel {
    pub system: String,
    pub containers: Vec<Container>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentNode {
    pub id: String,
    pub name: String,
    pub language: String,
    pub file_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentModel {
    pub containers: BTreeMap<String, Vec<ComponentNode>>,
    pub relationships: BTreeMap<String, Vec<Relationship>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct C4Model {
    pub context: ContextModel,
    pub containers: ContainerModel,
    pub components: ComponentModel,
}

fn container_type(class: ComponentClass) -> &'static str {
    match class {
        ComponentClass::Api => "web_api",
        ComponentClass::Service => "service",
        ComponentClass::Repository | ComponentClass::Data => "data_store",
        ComponentClass::Frontend => "web_app",
        ComponentClass::Worker => "worker",
        ComponentClass::Test => "test_suite",
        ComponentClass::Infrastructure => "infrastructure",
        ComponentClass::Module => "library",
    }
}

fn top_segment(path: &str) -> String {
    let segments = paths::segments(path);
    if segments.len() > 1 {
        segments[0].clone()
    } else {
        ".".to_string()
    }
}

fn second_segment(path: &str) -> String {
    let segments = paths::segments(path);
    if segments.len() > 2 {
        segments[1].clone()
    } else {
        paths::stem(path).to_lowercase()
    }
}

/// Generate the three-level C4 model from the component inventory and the
/// dependency graph. The structured output never depends on LLM input.
pub fn generate_c4(
    system_name: &str,
    inventory: &ComponentInventory,
    graph: &DependencyGraph,
) -> C4Model {
    let kept: Vec<_> = inventory.components.iter().take(MAX_CONTAINERS).collect();

    let containers: Vec<Container> = kept
        .iter()
        .map(|component| {
            let technology = component
                .languages
                .first()
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());
            Container {
                id: slug(&component.name),
                name: component.name.clone(),
                container_type: container_type(component.classification).to_string(),
                technology,
                languages: component.languages.clone(),
                description: format!(
                    "{} component with {} files",
                    component.classification.as_str(),
                    component.file_count
                ),
                file_count: component.file_count,
            }
        })
        .collect();
    let container_ids: BTreeMap<String, String> = kept
        .iter()
        .map(|c| (c.name.clone(), slug(&c.name)))
        .collect();

    // Aggregate resolved edges that cross component boundaries.
    let mut cross: BTreeMap<(String, String), usize> = BTreeMap::new();
    let mut intra: BTreeMap<String, BTreeMap<(String, String), usize>> = BTreeMap::new();
    for edge in graph.edges.iter().filter(|e| e.is_resolved && !e.is_external) {
        let source_top = top_segment(&edge.source);
        let target_top = top_segment(&edge.target);
        if source_top != target_top {
            let (Some(source_id), Some(target_id)) =
                (container_ids.get(&source_top), container_ids.get(&target_top))
            else {
                continue;
            };
            *cross
                .entry((source_id.clone(), target_id.clone()))
                .or_default() += 1;
        } else if container_ids.contains_key(&source_top) {
            let source_second = second_segment(&edge.source);
            let target_second = second_segment(&edge.target);
            if source_second != target_second {
                let container_id = container_ids[&source_top].clone();
                *intra
                    .entry(container_id)
                    .or_default()
                    .entry((source_second, target_second))
                    .or_default() += 1;
            }
        }
    }

    let container_relationships: Vec<Relationship> = cross
        .into_iter()
        .map(|((source, target), weight)| Relationship {
            description: format!("{source} imports from {target} ({weight} edges)"),
            source,
            target,
            weight,
        })
        .collect();

    // Expand each container into second-segment components.
    let mut component_map: BTreeMap<String, Vec<ComponentNode>> = BTreeMap::new();
    for component in &kept {
        let container_id = slug(&component.name);
        let mut groups: BTreeMap<String, (usize, BTreeMap<String, usize>)> = BTreeMap::new();
        for file in &component.files {
            let group = second_segment(file);
            let language = crate::inventory_language(file);
            let entry = groups.entry(group).or_default();
            entry.0 += 1;
            *entry.1.entry(language).or_default() += 1;
        }
        let nodes: Vec<ComponentNode> = groups
            .into_iter()
            .map(|(name, (file_count, languages))| {
                let language = languages
                    .into_iter()
                    .max_by_key(|(_, count)| *count)
                    .map(|(l, _)| l)
                    .unwrap_or_else(|| "unknown".to_string());
                ComponentNode {
                    id: format!("{container_id}_{}", slug(&name)),
                    name,
                    language,
                    file_count,
                }
            })
            .collect();
        component_map.insert(container_id, nodes);
    }

    let component_relationships: BTreeMap<String, Vec<Relationship>> = intra
        .into_iter()
        .map(|(container_id, edges)| {
            let relationships = edges
                .into_iter()
                .map(|((source, target), weight)| Relationship {
                    source: format!("{container_id}_{}", slug(&source)),
                    target: format!("{container_id}_{}", slug(&target)),
                    description: format!("{source} uses {target}"),
                    weight,
                })
                .collect();
            (container_id, relationships)
        })
        .collect();

    let mut external_systems = Vec::new();
    if graph.external_module_count > 0 {
        external_systems.push(ExternalSystem {
            id: "external_dependencies".to_string(),
            name: "External dependencies".to_string(),
            description: format!(
                "{} unresolved external modules",
                graph.external_module_count
            ),
        });
    }

    let mut context_relationships = vec![Relationship {
        source: "user".to_string(),
        target: slug(system_name),
        description: "uses".to_string(),
        weight: 1,
    }];
    for external in &external_systems {
        context_relationships.push(Relationship {
            source: slug(system_name),
            target: external.id.clone(),
            description: "depends on".to_string(),
            weight: 1,
        });
    }

    C4Model {
        context: ContextModel {
            system: system_name.to_string(),
            actors: vec![Actor {
                id: "user".to_string(),
                name: "User".to_string(),
                description: "Primary user of the system".to_string(),
            }],
            external_systems,
            relationships: context_relationships,
        },
        containers: ContainerModel {
            system: system_name.to_string(),
            containers,
            relationships: container_relationships,
        },
        components: ComponentModel {
            containers: component_map,
            relationships: component_relationships,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::build_inventory;
    use specgraph_core::Language;
    use specgraph_graph::DependencyEdge;

    fn graph_with_edges(nodes: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        DependencyGraph {
            root: ".".to_string(),
            nodes: nodes.iter().map(|s| s.to_string()).collect(),
            node_languages: nodes
                .iter()
                .map(|s| (s.to_string(), Language::Python))
                .collect(),
            edges: edges
                .iter()
                .map(|(s, t)| DependencyEdge {
                    source: s.to_string(),
                    target: t.to_string(),
                    module: t.to_string(),
                    line_number: 1,
                    import_type: "import".to_string(),
                    is_external: false,
                    is_resolved: true,
                })
                .collect(),
            cycles: Vec::new(),
            cycle_count: 0,
            external_module_count: 0,
        }
    }

    fn fixture_model() -> C4Model {
        let files: Vec<(String, Language)> = vec![
            ("api/users.py".to_string(), Language::Python),
            ("api/orders.py".to_string(), Language::Python),
            ("services/billing/core.py".to_string(), Language::Python),
            ("services/auth/tokens.py".to_string(), Language::Python),
        ];
        let inventory = build_inventory(&files, None);
        let graph = graph_with_edges(
            &[
                "api/users.py",
                "api/orders.py",
                "services/billing/core.py",
                "services/auth/tokens.py",
            ],
            &[
                ("api/users.py", "services/auth/tokens.py"),
                ("api/orders.py", "services/billing/core.py"),
                ("services/billing/core.py", "services/auth/tokens.py"),
            ],
        );
        generate_c4("acme", &inventory, &graph)
    }

    #[test]
    fn containers_have_stable_slug_ids() {
        let model = fixture_model();
        let ids: Vec<&str> = model
            .containers
            .containers
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert!(ids.contains(&"api"));
        assert!(ids.contains(&"services"));
    }

    #[test]
    fn cross_component_edges_aggregate_with_weight() {
        let model = fixture_model();
        let rel = model
            .containers
            .relationships
            .iter()
            .find(|r| r.source == "api" && r.target == "services")
            .unwrap();
        assert_eq!(rel.weight, 2);
        assert!(!rel.description.is_empty());
    }

    #[test]
    fn components_expand_from_second_segment() {
        let model = fixture_model();
        let services = &model.components.containers["services"];
        let names: Vec<&str> = services.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"billing"));
        assert!(names.contains(&"auth"));
        // api files have no third segment; they fall back to file stems.
        let api = &model.components.containers["api"];
        assert!(api.iter().any(|c| c.name == "users"));
    }

    #[test]
    fn intra_container_relationships_reference_component_ids() {
        let model = fixture_model();
        let rels = &model.components.relationships["services"];
        assert!(rels
            .iter()
            .any(|r| r.source == "services_billing" && r.target == "services_auth"));
    }

    #[test]
    fn slug_normalizes_names() {
        assert_eq!(slug("User Service!"), "user_service");
        assert_eq!(slug("__"), "root");
        assert_eq!(slug("a--b"), "a_b");
    }
}
