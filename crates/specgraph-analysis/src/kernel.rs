// ABOUTME: Contract-analysis kernel: public contract-surface extraction and revision loading.
// ABOUTME: Shared by the breaking-change detector and the downstream tracer; the single owner
// ABOUTME: of `git show` content loading.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use specgraph_core::{paths, Language};
use specgraph_git::GitRunner;
use specgraph_parser::{extract_classes, extract_functions};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    Function,
    Method,
    Class,
    Interface,
    Type,
    Enum,
    Endpoint,
    SchemaKey,
}

impl ContractKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractKind::Function => "function",
            ContractKind::Method => "method",
            ContractKind::Class => "class",
            ContractKind::Interface => "interface",
            ContractKind::Type => "type",
            ContractKind::Enum => "enum",
            ContractKind::Endpoint => "endpoint",
            ContractKind::SchemaKey => "schema_key",
        }
    }

    /// Kinds whose removal is a high-severity break.
    pub fn is_high_value(&self) -> bool {
        matches!(
            self,
            ContractKind::Endpoint | ContractKind::Interface | ContractKind::SchemaKey
        )
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEntry {
    pub kind: ContractKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// A file's contract surface keyed by `{kind}:{name}` (endpoints use
/// `endpoint:{METHOD}:{route}`).
pub type ContractSurface = BTreeMap<String, ContractEntry>;

fn entry_key(entry: &ContractEntry) -> String {
    format!("{}:{}", entry.kind, entry.name)
}

fn insert(surface: &mut ContractSurface, entry: ContractEntry) {
    surface.insert(entry_key(&entry), entry);
}

static ROUTE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:app|router|api|server)\.(get|post|put|delete|patch|head|options)\s*\(\s*['"]([^'"]+)['"]"#)
        .expect("static route pattern must compile")
});
static PY_ROUTE_DECORATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@(?:\w+\.)?(route|get|post|put|delete|patch)\s*\(\s*['"]([^'"]+)['"]"#)
        .expect("static route pattern must compile")
});
static PY_ROUTE_METHODS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"methods\s*=\s*\[([^\]]*)\]"#).expect("static route pattern must compile")
});
static JAVA_MAPPING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@(Get|Post|Put|Delete|Patch|Request)Mapping\s*\(\s*(?:value\s*=\s*)?['"]([^'"]+)['"]"#)
        .expect("static route pattern must compile")
});
static TS_TYPE_ALIAS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*export\s+type\s+(\w+)").expect("static pattern must compile")
});
static TS_ENUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*export\s+(?:const\s+)?enum\s+(\w+)").expect("static pattern"));
static YAML_TOP_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_][\w.-]*)\s*:\s*(.*)$").expect("static pattern"));

fn is_exported(language: Language, line: &str, name: &str) -> bool {
    match language {
        Language::Python => !name.starts_with('_'),
        Language::TypeScript | Language::JavaScript => {
            line.contains("export") || line.contains("module.exports")
        }
        Language::Rust => line.trim_start().starts_with("pub"),
        Language::Go => name
            .chars()
            .next()
            .map(|c| c.is_ascii_uppercase())
            .unwrap_or(false),
        Language::Java | Language::CSharp => line.contains("public"),
        _ => true,
    }
}

fn extract_endpoints(content: &str, language: Language, surface: &mut ContractSurface) {
    for line in content.lines() {
        for caps in ROUTE_CALL.captures_iter(line) {
            let method = caps[1].to_uppercase();
            let route = caps[2].to_string();
            insert(
                surface,
                ContractEntry {
                    kind: ContractKind::Endpoint,
                    name: format!("{method}:{route}"),
                    signature: None,
                },
            );
        }
        if language == Language::Python {
            if let Some(caps) = PY_ROUTE_DECORATOR.captures(line) {
                let verb = &caps[1];
                let route = caps[2].to_string();
                let methods: Vec<String> = if verb == "route" {
                    // Look ahead on the same line for an explicit method list.
                    PY_ROUTE_METHODS
                        .captures(line)
                        .map(|m| {
                            m[1].split(',')
                                .map(|s| s.trim().trim_matches(['\'', '"']).to_uppercase())
                                .filter(|s| !s.is_empty())
                                .collect()
                        })
                        .unwrap_or_else(|| vec!["GET".to_string()])
                } else {
                    vec![verb.to_uppercase()]
                };
                for method in methods {
                    insert(
                        surface,
                        ContractEntry {
                            kind: ContractKind::Endpoint,
                            name: format!("{method}:{route}"),
                            signature: None,
                        },
                    );
                }
            }
        }
        if language == Language::Java {
            if let Some(caps) = JAVA_MAPPING.captures(line) {
                let method = match &caps[1] {
                    "Request" => "GET".to_string(),
                    verb => verb.to_uppercase(),
                };
                insert(
                    surface,
                    ContractEntry {
                        kind: ContractKind::Endpoint,
                        name: format!("{}:{}", method, &caps[2]),
                        signature: None,
                    },
                );
            }
        }
    }
}

fn extract_json_surface(content: &str, surface: &mut ContractSurface) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(content) else {
        return;
    };
    let Some(object) = value.as_object() else {
        return;
    };
    for (key, value) in object {
        let shape = match value {
            serde_json::Value::Object(_) => "object",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::Bool(_) => "boolean",
            serde_json::Value::Null => "null",
        };
        insert(
            surface,
            ContractEntry {
                kind: ContractKind::SchemaKey,
                name: key.clone(),
                signature: Some(shape.to_string()),
            },
        );
    }
}

fn extract_yaml_surface(content: &str, surface: &mut ContractSurface) {
    let mut lines = content.lines().peekable();
    while let Some(line) = lines.next() {
        let Some(caps) = YAML_TOP_KEY.captures(line) else {
            continue;
        };
        let key = caps[1].to_string();
        let rest = caps[2].trim();
        let shape = if !rest.is_empty() && !rest.starts_with('#') {
            "scalar"
        } else {
            match lines.peek() {
                Some(next) if next.trim_start().starts_with('-') => "list",
                Some(next) if next.starts_with(' ') || next.starts_with('\t') => "mapping",
                _ => "scalar",
            }
        };
        insert(
            surface,
            ContractEntry {
                kind: ContractKind::SchemaKey,
                name: key,
                signature: Some(shape.to_string()),
            },
        );
    }
}

/// Extract the public contract surface of a file: exported functions and
/// classes, declared interfaces/types/enums, route-bound endpoints, and
/// top-level schema keys for JSON/YAML.
pub fn extract_contract_surface(content: &str, language: Language) -> ContractSurface {
    let mut surface = ContractSurface::new();

    match language {
        Language::Json => {
            extract_json_surface(content, &mut surface);
            return surface;
        }
        Language::Yaml => {
            extract_yaml_surface(content, &mut surface);
            return surface;
        }
        _ => {}
    }
    if !language.is_target() {
        return surface;
    }

    for function in extract_functions(content, language) {
        if !is_exported(language, &function.line_content, &function.name) {
            continue;
        }
        insert(
            &mut surface,
            ContractEntry {
                kind: ContractKind::Function,
                name: function.name,
                signature: function.signature,
            },
        );
    }

    for class in extract_classes(content, language) {
        let kind = if class.line_content.contains("interface") {
            ContractKind::Interface
        } else if class.line_content.contains("enum") {
            ContractKind::Enum
        } else {
            ContractKind::Class
        };
        if !is_exported(language, &class.line_content, &class.name) {
            continue;
        }
        insert(
            &mut surface,
            ContractEntry {
                kind,
                name: class.name,
                signature: class.extends.map(|base| format!("extends {base}")),
            },
        );
    }

    if language == Language::TypeScript {
        for line in content.lines() {
            if let Some(caps) = TS_TYPE_ALIAS.captures(line) {
                insert(
                    &mut surface,
                    ContractEntry {
                        kind: ContractKind::Type,
                        name: caps[1].to_string(),
                        signature: None,
                    },
                );
            }
            if let Some(caps) = TS_ENUM.captures(line) {
                insert(
                    &mut surface,
                    ContractEntry {
                        kind: ContractKind::Enum,
                        name: caps[1].to_string(),
                        signature: None,
                    },
                );
            }
        }
    }

    extract_endpoints(content, language, &mut surface);
    surface
}

/// Before/after content for one file across a revision pair. `None` means
/// the side does not exist (created or deleted file) or could not load.
#[derive(Debug, Clone, Default)]
pub struct RevisionPair {
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Load before-content from `base_ref` (honoring a rename's old path) and
/// after-content from the working tree or `target_ref`.
pub async fn load_revision_pair(
    runner: &GitRunner,
    base_ref: &str,
    target_ref: Option<&str>,
    path: &str,
    old_path: Option<&str>,
) -> RevisionPair {
    let before_path = old_path.unwrap_or(path);
    let before = runner.show(base_ref, before_path).await.ok();
    let after = match target_ref {
        Some(target) => runner.show(target, path).await.ok(),
        None => tokio::fs::read(runner.repo().join(path))
            .await
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
    };
    RevisionPair { before, after }
}

/// Language guess for a repo-relative path, extension only; used when
/// classifying revision content that may no longer exist on disk.
pub fn language_for_path(path: &str) -> Language {
    paths::extension(path)
        .and_then(|ext| specgraph_parser::detector::language_for_extension(&ext))
        .unwrap_or(Language::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typescript_exported_surface() {
        let content = concat!(
            "export function getUser(id: string): User { return find(id); }\n",
            "function internalHelper() {}\n",
            "export interface User { id: string }\n",
            "export type UserId = string;\n",
        );
        let surface = extract_contract_surface(content, Language::TypeScript);
        assert!(surface.contains_key("function:getUser"));
        assert!(!surface.contains_key("function:internalHelper"));
        assert!(surface.contains_key("interface:User"));
        assert!(surface.contains_key("type:UserId"));
    }

    #[test]
    fn python_private_names_are_not_contract() {
        let content = "def public_fn(): ...\ndef _private_fn(): ...\n";
        let surface = extract_contract_surface(content, Language::Python);
        assert!(surface.contains_key("function:public_fn"));
        assert!(!surface.contains_key("function:_private_fn"));
    }

    #[test]
    fn endpoints_key_by_method_and_route() {
        let ts = "app.get('/users', handler);\nrouter.post('/users', create);\n";
        let surface = extract_contract_surface(ts, Language::TypeScript);
        assert!(surface.contains_key("endpoint:GET:/users"));
        assert!(surface.contains_key("endpoint:POST:/users"));

        let py = "@app.route('/items', methods=['GET', 'POST'])\ndef items(): ...\n";
        let surface = extract_contract_surface(py, Language::Python);
        assert!(surface.contains_key("endpoint:GET:/items"));
        assert!(surface.contains_key("endpoint:POST:/items"));
    }

    #[test]
    fn json_top_level_keys_with_shapes() {
        let content = r#"{"name": "app", "ports": [80], "debug": false}"#;
        let surface = extract_contract_surface(content, Language::Json);
        assert_eq!(
            surface["schema_key:name"].signature.as_deref(),
            Some("string")
        );
        assert_eq!(
            surface["schema_key:ports"].signature.as_deref(),
            Some("array")
        );
        assert_eq!(
            surface["schema_key:debug"].signature.as_deref(),
            Some("boolean")
        );
    }

    #[test]
    fn yaml_top_level_keys() {
        let content = "name: app\nservices:\n  web:\n    image: x\nports:\n- 80\n";
        let surface = extract_contract_surface(content, Language::Yaml);
        assert_eq!(
            surface["schema_key:name"].signature.as_deref(),
            Some("scalar")
        );
        assert_eq!(
            surface["schema_key:services"].signature.as_deref(),
            Some("mapping")
        );
        assert_eq!(
            surface["schema_key:ports"].signature.as_deref(),
            Some("list")
        );
    }

    #[test]
    fn go_capitalization_marks_exports() {
        let content = "func Public() {}\nfunc private() {}\n";
        let surface = extract_contract_surface(content, Language::Go);
        assert!(surface.contains_key("function:Public"));
        assert!(!surface.contains_key("function:private"));
    }

    #[test]
    fn language_for_path_by_extension() {
        assert_eq!(language_for_path("src/api/users.ts"), Language::TypeScript);
        assert_eq!(language_for_path("schema.json"), Language::Json);
        assert_eq!(language_for_path("README"), Language::Unknown);
    }
}
