// ABOUTME: Component inventory by top-level path segment plus architecture-pattern inference.
// ABOUTME: The heuristic summary is always produced; LLM refinement only ever adds prose.

use serde::{Deserialize, Serialize};
use specgraph_core::{hints, paths, Language};
use specgraph_graph::DependencyGraph;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentClass {
    Api,
    Service,
    Repository,
    Data,
    Frontend,
    Worker,
    Test,
    Infrastructure,
    Module,
}

impl ComponentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentClass::Api => "api",
            ComponentClass::Service => "service",
            ComponentClass::Repository => "repository",
            ComponentClass::Data => "data",
            ComponentClass::Frontend => "frontend",
            ComponentClass::Worker => "worker",
            ComponentClass::Test => "test",
            ComponentClass::Infrastructure => "infrastructure",
            ComponentClass::Module => "module",
        }
    }
}

/// Fixed keyword table classifying a component by its name.
const CLASS_KEYWORDS: &[(ComponentClass, &[&str])] = &[
    (ComponentClass::Api, &["api", "apis", "routes", "controllers", "endpoints", "rest", "graphql", "handlers"]),
    (ComponentClass::Service, &["service", "services", "domain", "business", "logic", "usecases", "backend"]),
    (ComponentClass::Repository, &["repository", "repositories", "dao", "persistence"]),
    (ComponentClass::Data, &["data", "db", "database", "models", "migrations", "schema", "storage", "entities"]),
    (ComponentClass::Frontend, &["frontend", "ui", "web", "client", "views", "components", "pages", "app"]),
    (ComponentClass::Worker, &["worker", "workers", "jobs", "tasks", "queue", "scheduler", "cron"]),
    (ComponentClass::Test, &["test", "tests", "spec", "specs", "e2e", "fixtures"]),
    (ComponentClass::Infrastructure, &["infra", "infrastructure", "deploy", "docker", "k8s", "terraform", "ops", "scripts", "ci"]),
];

pub fn classify_component(name: &str) -> ComponentClass {
    let lowered = name.to_lowercase();
    for (class, keywords) in CLASS_KEYWORDS {
        if keywords.iter().any(|k| lowered == *k || lowered.contains(k)) {
            return *class;
        }
    }
    ComponentClass::Module
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub classification: ComponentClass,
    pub file_count: usize,
    pub languages: Vec<String>,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub pattern: String,
    pub confidence: f64,
    pub evidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInventory {
    pub components: Vec<Component>,
    pub patterns: Vec<DetectedPattern>,
    pub summary: String,
}

/// Group scoped files into components by first path segment, skipping the
/// noise set; root-level files group under ".".
pub fn build_inventory(
    files: &[(String, Language)],
    graph: Option<&DependencyGraph>,
) -> ComponentInventory {
    let mut grouped: BTreeMap<String, Vec<(String, Language)>> = BTreeMap::new();
    for (path, language) in files {
        let segments = paths::segments(path);
        let top = if segments.len() > 1 {
            segments[0].clone()
        } else {
            ".".to_string()
        };
        if hints::NOISE_PARTS.contains(&top.as_str()) {
            continue;
        }
        grouped
            .entry(top)
            .or_default()
            .push((path.clone(), *language));
    }

    let mut components: Vec<Component> = grouped
        .into_iter()
        .map(|(name, mut entries)| {
            entries.sort();
            let languages: BTreeSet<String> = entries
                .iter()
                .filter(|(_, l)| *l != Language::Unknown)
                .map(|(_, l)| l.as_str().to_string())
                .collect();
            Component {
                classification: classify_component(&name),
                file_count: entries.len(),
                languages: languages.into_iter().collect(),
                files: entries.into_iter().map(|(p, _)| p).collect(),
                name,
            }
        })
        .collect();
    components.sort_by(|a, b| {
        b.file_count
            .cmp(&a.file_count)
            .then_with(|| a.name.cmp(&b.name))
    });

    let patterns = infer_patterns(&components, graph);
    let summary = heuristic_summary(&components, &patterns);

    ComponentInventory {
        components,
        patterns,
        summary,
    }
}

fn infer_patterns(
    components: &[Component],
    graph: Option<&DependencyGraph>,
) -> Vec<DetectedPattern> {
    let classes: BTreeSet<ComponentClass> =
        components.iter().map(|c| c.classification).collect();
    let mut patterns = Vec::new();

    let layered: BTreeSet<ComponentClass> = [
        ComponentClass::Api,
        ComponentClass::Service,
        ComponentClass::Repository,
        ComponentClass::Data,
    ]
    .into_iter()
    .collect();
    if layered.is_subset(&classes) {
        patterns.push(DetectedPattern {
            pattern: "layered_architecture".to_string(),
            confidence: 0.86,
            evidence: "api, service, repository, and data components all present".to_string(),
        });
    }

    if classes.contains(&ComponentClass::Frontend) && classes.contains(&ComponentClass::Api) {
        patterns.push(DetectedPattern {
            pattern: "frontend_backend_split".to_string(),
            confidence: 0.75,
            evidence: "distinct frontend and api components".to_string(),
        });
    }

    let service_count = components
        .iter()
        .filter(|c| c.classification == ComponentClass::Service)
        .count();
    if service_count >= 3 {
        patterns.push(DetectedPattern {
            pattern: "service_oriented".to_string(),
            confidence: 0.7,
            evidence: format!("{service_count} service-classified components"),
        });
    }

    if classes.contains(&ComponentClass::Worker) {
        patterns.push(DetectedPattern {
            pattern: "background_processing".to_string(),
            confidence: 0.7,
            evidence: "worker/job components present".to_string(),
        });
    }

    if let Some(graph) = graph {
        if graph.cycle_count > 0 {
            patterns.push(DetectedPattern {
                pattern: "cyclic_dependency_hotspot".to_string(),
                confidence: 0.9,
                evidence: format!("{} import cycles detected", graph.cycle_count),
            });
        }
    }

    if classes.contains(&ComponentClass::Test) {
        patterns.push(DetectedPattern {
            pattern: "dedicated_test_suite".to_string(),
            confidence: 0.6,
            evidence: "test components present".to_string(),
        });
    }

    patterns
}

fn heuristic_summary(components: &[Component], patterns: &[DetectedPattern]) -> String {
    let total_files: usize = components.iter().map(|c| c.file_count).sum();
    let languages: BTreeSet<&str> = components
        .iter()
        .flat_map(|c| c.languages.iter().map(String::as_str))
        .collect();
    let top: Vec<&str> = components
        .iter()
        .take(5)
        .map(|c| c.name.as_str())
        .collect();
    let pattern_names: Vec<&str> = patterns.iter().map(|p| p.pattern.as_str()).collect();

    let mut summary = format!(
        "{} components over {} files ({}).",
        components.len(),
        total_files,
        if languages.is_empty() {
            "no detected languages".to_string()
        } else {
            languages.into_iter().collect::<Vec<_>>().join(", ")
        }
    );
    if !top.is_empty() {
        summary.push_str(&format!(" Largest: {}.", top.join(", ")));
    }
    if !pattern_names.is_empty() {
        summary.push_str(&format!(" Patterns: {}.", pattern_names.join(", ")));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> Vec<(String, Language)> {
        paths
            .iter()
            .map(|p| {
                let language = if p.ends_with(".py") {
                    Language::Python
                } else if p.ends_with(".ts") {
                    Language::TypeScript
                } else {
                    Language::Unknown
                };
                (p.to_string(), language)
            })
            .collect()
    }

    #[test]
    fn groups_by_first_segment_and_classifies() {
        let inventory = build_inventory(
            &files(&[
                "api/users.py",
                "api/orders.py",
                "services/billing.py",
                "repositories/user_repo.py",
                "data/models.py",
                "README.md",
            ]),
            None,
        );
        let by_name = |name: &str| {
            inventory
                .components
                .iter()
                .find(|c| c.name == name)
                .unwrap()
        };
        assert_eq!(by_name("api").classification, ComponentClass::Api);
        assert_eq!(by_name("services").classification, ComponentClass::Service);
        assert_eq!(
            by_name("repositories").classification,
            ComponentClass::Repository
        );
        assert_eq!(by_name("data").classification, ComponentClass::Data);
        // Root-level files bucket under ".".
        assert!(inventory.components.iter().any(|c| c.name == "."));
    }

    #[test]
    fn layered_architecture_detected_at_fixed_confidence() {
        let inventory = build_inventory(
            &files(&[
                "api/a.py",
                "services/b.py",
                "repositories/c.py",
                "data/d.py",
            ]),
            None,
        );
        let layered = inventory
            .patterns
            .iter()
            .find(|p| p.pattern == "layered_architecture")
            .unwrap();
        assert!((layered.confidence - 0.86).abs() < f64::EPSILON);
    }

    #[test]
    fn noise_directories_are_excluded() {
        let inventory = build_inventory(
            &files(&["node_modules/pkg/index.ts", "src/app.ts"]),
            None,
        );
        assert!(!inventory.components.iter().any(|c| c.name == "node_modules"));
        assert!(inventory.components.iter().any(|c| c.name == "src"));
    }

    #[test]
    fn summary_is_always_present() {
        let inventory = build_inventory(&[], None);
        assert!(!inventory.summary.is_empty());
        assert!(inventory.components.is_empty());
    }
}
