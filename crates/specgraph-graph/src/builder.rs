// ABOUTME: Builds the file-level dependency graph by resolving imports per language.
// ABOUTME: Resolution is deterministic and order-independent; unresolved modules become external.

use crate::cycles;
use serde::{Deserialize, Serialize};
use specgraph_core::{paths, Language, Result};
use specgraph_parser::{extract_imports, scanner, ImportRecord, ScanConfig};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: String,
    pub target: String,
    pub module: String,
    pub line_number: usize,
    pub import_type: String,
    pub is_external: bool,
    pub is_resolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub root: String,
    pub nodes: Vec<String>,
    pub node_languages: BTreeMap<String, Language>,
    pub edges: Vec<DependencyEdge>,
    pub cycles: Vec<Vec<String>>,
    pub cycle_count: usize,
    pub external_module_count: usize,
}

impl DependencyGraph {
    /// Forward adjacency over resolved internal edges.
    pub fn adjacency(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut adj: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for edge in self.edges.iter().filter(|e| e.is_resolved) {
            adj.entry(edge.source.as_str())
                .or_default()
                .insert(edge.target.as_str());
        }
        adj
    }

    /// Reverse adjacency (target -> sources), materialized on demand.
    pub fn reverse_adjacency(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut rev: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for edge in self.edges.iter().filter(|e| e.is_resolved) {
            rev.entry(edge.target.as_str())
                .or_default()
                .insert(edge.source.as_str());
        }
        rev
    }
}

#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub root: PathBuf,
    pub recursive: bool,
    pub extensions: Option<Vec<String>>,
    pub include_external: bool,
}

impl GraphConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: true,
            extensions: None,
            include_external: false,
        }
    }
}

struct Workspace {
    /// All scoped file paths (POSIX, root-relative).
    files: BTreeSet<String>,
    /// Language per file.
    languages: BTreeMap<String, Language>,
    /// alias -> candidate paths; only unique aliases resolve.
    aliases: HashMap<String, BTreeSet<String>>,
}

impl Workspace {
    fn contains(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    fn resolve_alias(&self, alias: &str) -> Option<&String> {
        let candidates = self.aliases.get(alias)?;
        if candidates.len() == 1 {
            candidates.iter().next()
        } else {
            None
        }
    }
}

fn build_alias_index(files: &BTreeSet<String>) -> HashMap<String, BTreeSet<String>> {
    let mut aliases: HashMap<String, BTreeSet<String>> = HashMap::new();
    let mut add = |aliases: &mut HashMap<String, BTreeSet<String>>, alias: String, path: &str| {
        if alias.is_empty() {
            return;
        }
        aliases.entry(alias).or_default().insert(path.to_string());
    };

    for path in files {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let parent = paths::parent(path);
        let stem = paths::stem(path);

        match file_name {
            "__init__.py" => {
                // Package file: the package dot-path aliases the package.
                if !parent.is_empty() {
                    add(&mut aliases, parent.replace('/', "."), path);
                    if let Some(last) = parent.rsplit('/').next() {
                        add(&mut aliases, last.to_string(), path);
                    }
                }
            }
            "index.ts" | "index.tsx" | "index.js" | "index.jsx" => {
                // Barrel file: the parent directory aliases the module.
                if !parent.is_empty() {
                    add(&mut aliases, parent.to_string(), path);
                    if let Some(last) = parent.rsplit('/').next() {
                        add(&mut aliases, last.to_string(), path);
                    }
                }
            }
            "mod.rs" => {
                if !parent.is_empty() {
                    if let Some(last) = parent.rsplit('/').next() {
                        add(&mut aliases, last.to_string(), path);
                    }
                }
            }
            _ => {}
        }

        // Dotted path without extension and the bare stem.
        let dotted = match path.rsplit_once('.') {
            Some((without_ext, _)) => without_ext.replace('/', "."),
            None => path.replace('/', "."),
        };
        add(&mut aliases, dotted, path);
        add(&mut aliases, stem.to_string(), path);
    }
    aliases
}

/// Candidate extensions when resolving a relative JS/TS import.
const JS_SUFFIXES: &[&str] = &[
    "", ".ts", ".tsx", ".js", ".jsx", "/index.ts", "/index.tsx", "/index.js", "/index.jsx",
];

fn resolve_relative(
    ws: &Workspace,
    source: &str,
    module: &str,
    language: Language,
) -> Option<String> {
    let base = paths::parent(source);
    let joined = paths::join(base, module);
    let candidates: Vec<String> = match language {
        Language::TypeScript | Language::JavaScript => JS_SUFFIXES
            .iter()
            .map(|suffix| format!("{joined}{suffix}"))
            .collect(),
        Language::Php => vec![joined.clone(), format!("{joined}.php")],
        Language::Ruby => vec![joined.clone(), format!("{joined}.rb")],
        _ => vec![joined.clone()],
    };
    candidates.into_iter().find(|c| ws.contains(c))
}

fn resolve_python(ws: &Workspace, source: &str, module: &str) -> Option<String> {
    let (dots, remainder) = {
        let trimmed = module.trim_start_matches('.');
        (module.len() - trimmed.len(), trimmed)
    };

    let base = if dots == 0 {
        String::new()
    } else {
        // One dot anchors at the source package; each further dot ascends.
        let mut dir = paths::parent(source).to_string();
        for _ in 1..dots {
            dir = paths::parent(&dir).to_string();
        }
        dir
    };

    let rel = remainder.replace('.', "/");
    let candidates = if rel.is_empty() {
        vec![paths::join(&base, "__init__.py")]
    } else {
        vec![
            paths::join(&base, &format!("{rel}/__init__.py")),
            paths::join(&base, &format!("{rel}.py")),
        ]
    };
    candidates.into_iter().find(|c| ws.contains(c))
}

fn resolve_package_path(ws: &Workspace, module: &str, extension: &str) -> Option<String> {
    let rel = module.trim_end_matches(".*").replace('.', "/");
    let candidate = format!("{rel}.{extension}");
    if ws.contains(&candidate) {
        return Some(candidate);
    }
    // Tolerate a single leading source-root segment (src/main/java style
    // trees register through the alias index instead).
    None
}

fn resolve_rust(ws: &Workspace, source: &str, record: &ImportRecord) -> Option<String> {
    let module = record.module.as_str();
    if record.import_type == specgraph_parser::ImportType::Mod {
        let base = paths::parent(source);
        let candidates = [
            paths::join(base, &format!("{module}.rs")),
            paths::join(base, &format!("{module}/mod.rs")),
        ];
        return candidates.into_iter().find(|c| ws.contains(c));
    }

    let segments: Vec<&str> = module.split("::").collect();
    match segments.first().copied() {
        Some("crate") => {
            let rel = segments[1..].join("/");
            if rel.is_empty() {
                return None;
            }
            let candidates = [
                format!("src/{rel}.rs"),
                format!("src/{rel}/mod.rs"),
                format!("{rel}.rs"),
                format!("{rel}/mod.rs"),
            ];
            candidates.into_iter().find(|c| ws.contains(c))
        }
        Some("super") => {
            let mut base = paths::parent(paths::parent(source)).to_string();
            let mut rest = &segments[1..];
            while rest.first() == Some(&"super") {
                base = paths::parent(&base).to_string();
                rest = &rest[1..];
            }
            let rel = rest.join("/");
            if rel.is_empty() {
                return None;
            }
            let candidates = [
                paths::join(&base, &format!("{rel}.rs")),
                paths::join(&base, &format!("{rel}/mod.rs")),
            ];
            candidates.into_iter().find(|c| ws.contains(c))
        }
        Some("self") => {
            let base = paths::parent(source);
            let rel = segments[1..].join("/");
            if rel.is_empty() {
                return None;
            }
            let candidates = [
                paths::join(base, &format!("{rel}.rs")),
                paths::join(base, &format!("{rel}/mod.rs")),
            ];
            candidates.into_iter().find(|c| ws.contains(c))
        }
        _ => None,
    }
}

fn resolve_import(
    ws: &Workspace,
    source: &str,
    language: Language,
    record: &ImportRecord,
) -> Option<String> {
    let module = record.module.as_str();

    if language.supports_relative_imports() && (module.starts_with('.') || module.starts_with('/'))
    {
        if let Some(path) = resolve_relative(ws, source, module, language) {
            return Some(path);
        }
    }

    match language {
        Language::Python => {
            if let Some(path) = resolve_python(ws, source, module) {
                return Some(path);
            }
        }
        Language::Java => {
            if let Some(path) = resolve_package_path(ws, module, "java") {
                return Some(path);
            }
        }
        Language::CSharp => {
            if let Some(path) = resolve_package_path(ws, module, "cs") {
                return Some(path);
            }
        }
        Language::Rust => {
            if let Some(path) = resolve_rust(ws, source, record) {
                return Some(path);
            }
        }
        Language::Ruby => {
            // require paths are extensionless and root-relative.
            let candidate = format!("{}.rb", paths::normalize_relative(module));
            if ws.contains(&candidate) {
                return Some(candidate);
            }
        }
        _ => {}
    }

    // Last resort: unique alias lookup.
    ws.resolve_alias(module)
        .or_else(|| ws.resolve_alias(module.trim_start_matches('.')))
        .cloned()
}

/// Build the dependency graph for every target-language file in scope.
pub fn build_graph(config: &GraphConfig) -> Result<DependencyGraph> {
    let scan = scanner::scan_directory(&ScanConfig {
        root: config.root.clone(),
        recursive: config.recursive,
        extensions: config.extensions.clone(),
    })?;

    let mut files = BTreeSet::new();
    let mut languages = BTreeMap::new();
    for file in &scan.files {
        files.insert(file.node.path.clone());
        languages.insert(file.node.path.clone(), file.node.language);
    }
    let aliases = build_alias_index(&files);
    let ws = Workspace {
        files,
        languages,
        aliases,
    };

    let mut edges: Vec<DependencyEdge> = Vec::new();
    let mut seen: HashSet<(String, String, String, usize)> = HashSet::new();
    let mut external_modules: BTreeSet<String> = BTreeSet::new();

    for source in &ws.files {
        let language = ws.languages[source];
        if !language.is_target() {
            continue;
        }
        let abs = config.root.join(source);
        let Ok(bytes) = std::fs::read(&abs) else {
            continue;
        };
        let content = String::from_utf8_lossy(&bytes);
        for record in extract_imports(&content, language) {
            let resolved = resolve_import(&ws, source, language, &record);
            let (target, is_external, is_resolved) = match resolved {
                Some(target) => (target, false, true),
                None => {
                    external_modules.insert(record.module.clone());
                    if !config.include_external {
                        continue;
                    }
                    (record.module.clone(), true, false)
                }
            };
            let key = (
                source.clone(),
                target.clone(),
                record.module.clone(),
                record.line_number,
            );
            if !seen.insert(key) {
                continue;
            }
            edges.push(DependencyEdge {
                source: source.clone(),
                target,
                module: record.module,
                line_number: record.line_number,
                import_type: record.import_type.as_str().to_string(),
                is_external,
                is_resolved,
            });
        }
    }

    let cycles = cycles::find_cycles(&ws.files, &edges);
    debug!(
        nodes = ws.files.len(),
        edges = edges.len(),
        cycles = cycles.len(),
        "dependency graph built"
    );

    Ok(DependencyGraph {
        root: paths::to_posix(&config.root),
        nodes: ws.files.iter().cloned().collect(),
        node_languages: ws.languages,
        cycle_count: cycles.len(),
        cycles,
        edges,
        external_module_count: external_modules.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn python_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/__init__.py"), "").unwrap();
        fs::write(
            dir.path().join("a/m.py"),
            "from . import helpers\ndef f(x: int) -> int: ...\n",
        )
        .unwrap();
        fs::write(dir.path().join("a/helpers.py"), "def g(): ...\n").unwrap();
        dir
    }

    #[test]
    fn python_relative_import_resolves_to_sibling() {
        let dir = python_fixture();
        let graph = build_graph(&GraphConfig::new(dir.path())).unwrap();
        assert!(graph.edges.iter().any(|e| {
            e.source == "a/m.py"
                && e.target == "a/helpers.py"
                && !e.is_external
                && e.is_resolved
        }));
        // Resolved targets are always graph nodes.
        for edge in graph.edges.iter().filter(|e| !e.is_external) {
            assert!(graph.nodes.contains(&edge.target));
        }
    }

    #[test]
    fn typescript_relative_and_index_resolution() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/utils")).unwrap();
        fs::write(
            dir.path().join("src/app.ts"),
            "import { helper } from './utils';\nimport { x } from './other';\n",
        )
        .unwrap();
        fs::write(dir.path().join("src/utils/index.ts"), "export const helper = 1;\n").unwrap();
        fs::write(dir.path().join("src/other.ts"), "export const x = 2;\n").unwrap();
        let graph = build_graph(&GraphConfig::new(dir.path())).unwrap();
        assert!(graph
            .edges
            .iter()
            .any(|e| e.source == "src/app.ts" && e.target == "src/utils/index.ts"));
        assert!(graph
            .edges
            .iter()
            .any(|e| e.source == "src/app.ts" && e.target == "src/other.ts"));
    }

    #[test]
    fn unresolved_modules_are_external_and_excluded_by_default() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("m.py"), "import requests\n").unwrap();
        let graph = build_graph(&GraphConfig::new(dir.path())).unwrap();
        assert!(graph.edges.is_empty());
        assert_eq!(graph.external_module_count, 1);

        let mut config = GraphConfig::new(dir.path());
        config.include_external = true;
        let graph = build_graph(&config).unwrap();
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.edges[0].is_external);
        assert!(!graph.edges[0].is_resolved);
    }

    #[test]
    fn java_package_expansion() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("com/acme")).unwrap();
        fs::write(
            dir.path().join("Main.java"),
            "import com.acme.Service;\npublic class Main {}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("com/acme/Service.java"),
            "public class Service {}\n",
        )
        .unwrap();
        let graph = build_graph(&GraphConfig::new(dir.path())).unwrap();
        assert!(graph
            .edges
            .iter()
            .any(|e| e.source == "Main.java" && e.target == "com/acme/Service.java"));
    }

    #[test]
    fn rust_crate_and_mod_resolution() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/graph")).unwrap();
        fs::write(
            dir.path().join("src/lib.rs"),
            "mod util;\nuse crate::graph::builder;\n",
        )
        .unwrap();
        fs::write(dir.path().join("src/util.rs"), "pub fn u() {}\n").unwrap();
        fs::write(dir.path().join("src/graph/builder.rs"), "pub fn b() {}\n").unwrap();
        let graph = build_graph(&GraphConfig::new(dir.path())).unwrap();
        assert!(graph
            .edges
            .iter()
            .any(|e| e.source == "src/lib.rs" && e.target == "src/util.rs"));
        assert!(graph
            .edges
            .iter()
            .any(|e| e.source == "src/lib.rs" && e.target == "src/graph/builder.rs"));
    }

    #[test]
    fn no_duplicate_edges() {
        let dir = python_fixture();
        let graph = build_graph(&GraphConfig::new(dir.path())).unwrap();
        let mut keys: Vec<_> = graph
            .edges
            .iter()
            .map(|e| (&e.source, &e.target, &e.module, e.line_number))
            .collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(before, keys.len());
    }

    #[test]
    fn deterministic_across_runs() {
        let dir = python_fixture();
        let a = build_graph(&GraphConfig::new(dir.path())).unwrap();
        let b = build_graph(&GraphConfig::new(dir.path())).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
