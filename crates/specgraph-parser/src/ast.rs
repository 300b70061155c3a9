// ABOUTME: Tree-sitter adapter producing bounded AST summaries with a parser cache.
// ABOUTME: Degrades to a simple line-count parse when the runtime is unavailable.

use serde::{Deserialize, Serialize};
use specgraph_core::{Language, Result, SpecGraphError};
use std::path::Path;

/// Default ceiling on serialized nodes in one summary.
pub const DEFAULT_MAX_SERIALIZED_NODES: usize = 500;
/// Default ceiling on serialized depth in one summary.
pub const DEFAULT_MAX_SERIALIZED_DEPTH: usize = 6;

/// Parsers kept alive across invocations, one per canonical language.
#[cfg(feature = "ast")]
const PARSER_CACHE_CAPACITY: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstNodeSummary {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub named: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_range: Option<[usize; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_range: Option<LineRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_range: Option<LineRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<AstNodeSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children_truncated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstSummary {
    pub backend: String,
    pub language: Language,
    pub root: String,
    pub node_count: usize,
    pub depth: usize,
    pub has_error: bool,
    pub byte_range: [usize; 2],
    pub line_range: LineRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ast: Option<AstNodeSummary>,
    pub serialized_node_count: usize,
    pub serialized_limit: usize,
    pub serialized_depth_limit: usize,
}

/// Fallback summary when the Tree-sitter runtime is unavailable: the file
/// is treated as a flat module whose node count is its line count.
pub fn simple_parse(content: &str, language: Language) -> AstSummary {
    let line_count = content.lines().count();
    AstSummary {
        backend: "simple".to_string(),
        language,
        root: "module".to_string(),
        node_count: line_count,
        depth: 1,
        has_error: false,
        byte_range: [0, content.len()],
        line_range: LineRange {
            start: 1,
            end: line_count.max(1),
        },
        ast: None,
        serialized_node_count: 0,
        serialized_limit: 0,
        serialized_depth_limit: 0,
    }
}

#[cfg(feature = "ast")]
mod backend {
    use super::*;
    use lru::LruCache;
    use parking_lot::Mutex;
    use std::num::NonZeroUsize;
    use tree_sitter::{Node, Parser};

    pub struct TreeSitterAdapter {
        parsers: Mutex<LruCache<Language, Parser>>,
    }

    impl Default for TreeSitterAdapter {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TreeSitterAdapter {
        pub fn new() -> Self {
            let capacity =
                NonZeroUsize::new(PARSER_CACHE_CAPACITY).expect("cache capacity is nonzero");
            Self {
                parsers: Mutex::new(LruCache::new(capacity)),
            }
        }

        /// Whether the Tree-sitter runtime was compiled in.
        pub fn is_available(&self) -> bool {
            true
        }

        fn grammar(language: Language) -> Option<tree_sitter::Language> {
            let grammar = match language {
                Language::Rust => tree_sitter_rust::LANGUAGE.into(),
                Language::Python => tree_sitter_python::LANGUAGE.into(),
                Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
                Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                Language::Go => tree_sitter_go::LANGUAGE.into(),
                Language::Java => tree_sitter_java::LANGUAGE.into(),
                Language::C | Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
                Language::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
                Language::Ruby => tree_sitter_ruby::LANGUAGE.into(),
                Language::Php => tree_sitter_php::LANGUAGE_PHP.into(),
                _ => return None,
            };
            Some(grammar)
        }

        pub fn supports(&self, language: Language) -> bool {
            Self::grammar(language).is_some()
        }

        pub fn parse_file(&self, path: &Path, language: Language) -> Result<AstSummary> {
            if !path.exists() {
                return Err(SpecGraphError::NotFound(format!(
                    "File not found: {}",
                    path.display()
                )));
            }
            let bytes = std::fs::read(path)?;
            let content = String::from_utf8_lossy(&bytes);
            self.parse_content(
                &content,
                language,
                DEFAULT_MAX_SERIALIZED_NODES,
                DEFAULT_MAX_SERIALIZED_DEPTH,
            )
        }

        /// Parse source content into a bounded structural summary. Budget
        /// exhaustion truncates the serialized tree; it never fails.
        pub fn parse_content(
            &self,
            content: &str,
            language: Language,
            max_serialized_nodes: usize,
            max_serialized_depth: usize,
        ) -> Result<AstSummary> {
            let grammar = Self::grammar(language).ok_or_else(|| {
                SpecGraphError::TreeSitter(format!(
                    "Unsupported Tree-sitter language: {language}"
                ))
            })?;

            let mut parsers = self.parsers.lock();
            if parsers.get(&language).is_none() {
                let mut parser = Parser::new();
                parser.set_language(&grammar).map_err(|e| {
                    SpecGraphError::TreeSitter(format!(
                        "Failed to initialize parser for {language}: {e}"
                    ))
                })?;
                parsers.put(language, parser);
            }
            let parser = parsers
                .get_mut(&language)
                .expect("parser was just inserted");

            let tree = parser.parse(content, None).ok_or_else(|| {
                SpecGraphError::TreeSitter(format!("Tree-sitter returned no tree for {language}"))
            })?;
            drop(parsers);

            let root = tree.root_node();
            let (node_count, depth) = count_nodes_and_depth(root);

            let serialized_limit = max_serialized_nodes.max(1);
            let serialized_depth_limit = max_serialized_depth.max(1);
            let mut remaining = serialized_limit;
            let ast = serialize_node(root, 1, serialized_depth_limit, &mut remaining);
            let serialized_node_count = serialized_limit - remaining;

            Ok(AstSummary {
                backend: "tree_sitter".to_string(),
                language,
                root: root.kind().to_string(),
                node_count,
                depth,
                has_error: root.has_error(),
                byte_range: [root.start_byte(), root.end_byte()],
                line_range: LineRange {
                    start: root.start_position().row + 1,
                    end: root.end_position().row + 1,
                },
                ast: Some(ast),
                serialized_node_count,
                serialized_limit,
                serialized_depth_limit,
            })
        }
    }

    fn count_nodes_and_depth(root: Node<'_>) -> (usize, usize) {
        let mut stack = vec![(root, 1usize)];
        let mut count = 0usize;
        let mut max_depth = 0usize;
        while let Some((node, depth)) = stack.pop() {
            count += 1;
            max_depth = max_depth.max(depth);
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                stack.push((child, depth + 1));
            }
        }
        (count, max_depth)
    }

    fn serialize_node(
        node: Node<'_>,
        depth: usize,
        max_depth: usize,
        remaining: &mut usize,
    ) -> AstNodeSummary {
        if *remaining == 0 {
            return AstNodeSummary {
                node_type: node.kind().to_string(),
                named: None,
                byte_range: None,
                line_range: None,
                column_range: None,
                child_count: None,
                children: None,
                children_truncated: None,
                truncated: Some(true),
            };
        }
        *remaining -= 1;

        let mut summary = AstNodeSummary {
            node_type: node.kind().to_string(),
            named: Some(node.is_named()),
            byte_range: Some([node.start_byte(), node.end_byte()]),
            line_range: Some(LineRange {
                start: node.start_position().row + 1,
                end: node.end_position().row + 1,
            }),
            column_range: Some(LineRange {
                start: node.start_position().column + 1,
                end: node.end_position().column + 1,
            }),
            child_count: None,
            children: None,
            children_truncated: None,
            truncated: None,
        };

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = if node.named_child_count() > 0 {
            node.named_children(&mut cursor).collect()
        } else {
            node.children(&mut cursor).collect()
        };
        summary.child_count = Some(children.len());
        if children.is_empty() {
            return summary;
        }

        if depth >= max_depth {
            summary.children_truncated = Some(true);
            return summary;
        }

        let mut serialized = Vec::new();
        for child in &children {
            if *remaining == 0 {
                break;
            }
            serialized.push(serialize_node(*child, depth + 1, max_depth, remaining));
        }
        summary.children_truncated = Some(serialized.len() < children.len());
        if !serialized.is_empty() {
            summary.children = Some(serialized);
        }
        summary
    }
}

#[cfg(not(feature = "ast"))]
mod backend {
    use super::*;

    /// Stub adapter compiled when the `ast` feature is off: always reports
    /// itself unavailable so callers take the simple-parse path.
    pub struct TreeSitterAdapter;

    impl Default for TreeSitterAdapter {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TreeSitterAdapter {
        pub fn new() -> Self {
            Self
        }

        pub fn is_available(&self) -> bool {
            false
        }

        pub fn supports(&self, _language: Language) -> bool {
            false
        }

        pub fn parse_file(&self, _path: &Path, _language: Language) -> Result<AstSummary> {
            Err(SpecGraphError::TreeSitter(
                "Tree-sitter runtime is unavailable".to_string(),
            ))
        }

        pub fn parse_content(
            &self,
            _content: &str,
            _language: Language,
            _max_serialized_nodes: usize,
            _max_serialized_depth: usize,
        ) -> Result<AstSummary> {
            Err(SpecGraphError::TreeSitter(
                "Tree-sitter runtime is unavailable".to_string(),
            ))
        }
    }
}

pub use backend::TreeSitterAdapter;

#[cfg(all(test, feature = "ast"))]
mod tests {
    use super::*;

    #[test]
    fn parses_python_module_summary() {
        let adapter = TreeSitterAdapter::new();
        assert!(adapter.is_available());
        let summary = adapter
            .parse_content(
                "def f(x):\n    return x\n",
                Language::Python,
                DEFAULT_MAX_SERIALIZED_NODES,
                DEFAULT_MAX_SERIALIZED_DEPTH,
            )
            .unwrap();
        assert_eq!(summary.backend, "tree_sitter");
        assert_eq!(summary.root, "module");
        assert!(!summary.has_error);
        assert!(summary.node_count > 3);
        assert!(summary.serialized_node_count <= summary.serialized_limit);
        assert!(summary.ast.is_some());
    }

    #[test]
    fn node_budget_of_one_serializes_single_node() {
        let adapter = TreeSitterAdapter::new();
        let summary = adapter
            .parse_content("def f():\n    pass\n", Language::Python, 1, 6)
            .unwrap();
        assert_eq!(summary.serialized_node_count, 1);
        let ast = summary.ast.unwrap();
        // Root consumed the whole budget; its children are truncated stubs
        // or missing entirely.
        assert!(ast.children.is_none() || ast.children_truncated == Some(true));
    }

    #[test]
    fn depth_budget_marks_truncation() {
        let adapter = TreeSitterAdapter::new();
        let summary = adapter
            .parse_content(
                "def f():\n    if True:\n        return 1\n",
                Language::Python,
                500,
                1,
            )
            .unwrap();
        let ast = summary.ast.unwrap();
        assert_eq!(ast.children_truncated, Some(true));
        assert!(ast.children.is_none());
    }

    #[test]
    fn unsupported_language_is_an_error_not_a_panic() {
        let adapter = TreeSitterAdapter::new();
        let err = adapter
            .parse_content("x", Language::Markdown, 10, 2)
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported"));
    }

    #[test]
    fn parser_cache_reuses_entries() {
        let adapter = TreeSitterAdapter::new();
        for _ in 0..3 {
            adapter
                .parse_content("fn main() {}", Language::Rust, 50, 4)
                .unwrap();
        }
    }

    #[test]
    fn simple_parse_counts_lines() {
        let summary = simple_parse("a\nb\nc\n", Language::Unknown);
        assert_eq!(summary.backend, "simple");
        assert_eq!(summary.root, "module");
        assert_eq!(summary.node_count, 3);
        assert_eq!(summary.depth, 1);
    }
}
