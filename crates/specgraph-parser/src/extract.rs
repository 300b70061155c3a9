// ABOUTME: Regex-based per-language extraction of functions, classes, imports, and call tokens.
// ABOUTME: Strict fallback family; behavioral contract is fixed by the seed expectations.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use specgraph_core::Language;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    pub line_number: usize,
    pub line_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    pub line_number: usize,
    pub line_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportType {
    Import,
    From,
    FromMember,
    Static,
    SideEffect,
    Require,
    Dynamic,
    Use,
    Mod,
    Using,
    Include,
    RequireRelative,
}

impl ImportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportType::Import => "import",
            ImportType::From => "from",
            ImportType::FromMember => "from_member",
            ImportType::Static => "static",
            ImportType::SideEffect => "side_effect",
            ImportType::Require => "require",
            ImportType::Dynamic => "dynamic",
            ImportType::Use => "use",
            ImportType::Mod => "mod",
            ImportType::Using => "using",
            ImportType::Include => "include",
            ImportType::RequireRelative => "require_relative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportRecord {
    pub module: String,
    pub import_type: ImportType,
    pub line_number: usize,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static extraction pattern must compile")
}

static PY_FUNC: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*(?:async\s+)?def\s+(\w+)\s*\(([^)]*)\)\s*(?:->\s*([^:]+?))?\s*:"));
static PY_CLASS: Lazy<Regex> = Lazy::new(|| re(r"^\s*class\s+(\w+)\s*(?:\(([^)]*)\))?\s*:"));
static PY_IMPORT: Lazy<Regex> = Lazy::new(|| re(r"^\s*import\s+([\w.]+(?:\s*,\s*[\w.]+)*)"));
static PY_FROM: Lazy<Regex> = Lazy::new(|| re(r"^\s*from\s+([\w.]*\.?[\w.]*)\s+import\s+(.+)$"));

static JS_FUNC: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(\w+)\s*\(([^)]*)\)"));
static JS_ARROW: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(?:\(([^)]*)\)|(\w+))\s*=>")
});
static JS_CLASS: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)(?:\s+extends\s+([\w.]+))?"));
static TS_INTERFACE: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*(?:export\s+)?interface\s+(\w+)(?:\s+extends\s+([\w,.\s<>]+?))?\s*\{"));
static JS_STATIC_IMPORT: Lazy<Regex> =
    Lazy::new(|| re(r#"^\s*import\s+[\w*\s{},$]+?\s+from\s+['"]([^'"]+)['"]"#));
static JS_SIDE_EFFECT: Lazy<Regex> = Lazy::new(|| re(r#"^\s*import\s+['"]([^'"]+)['"]"#));
static JS_EXPORT_FROM: Lazy<Regex> =
    Lazy::new(|| re(r#"^\s*export\s+(?:\*|\{[^}]*\})\s+from\s+['"]([^'"]+)['"]"#));
static JS_REQUIRE: Lazy<Regex> = Lazy::new(|| re(r#"require\s*\(\s*['"]([^'"]+)['"]\s*\)"#));
static JS_DYNAMIC: Lazy<Regex> = Lazy::new(|| re(r#"import\s*\(\s*['"]([^'"]+)['"]\s*\)"#));

static GO_FUNC: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*func\s+(?:\([^)]*\)\s+)?(\w+)\s*\(([^)]*)\)\s*([^\{]*)"));
static GO_TYPE: Lazy<Regex> = Lazy::new(|| re(r"^\s*type\s+(\w+)\s+(struct|interface)\b"));
static GO_IMPORT_SINGLE: Lazy<Regex> = Lazy::new(|| re(r#"^\s*import\s+(?:\w+\s+)?"([^"]+)""#));
static GO_IMPORT_LINE: Lazy<Regex> = Lazy::new(|| re(r#"^\s*(?:\w+\s+|\.\s+|_\s+)?"([^"]+)"\s*$"#));

static JAVA_METHOD: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:public|protected|private)\s+(?:static\s+)?(?:final\s+)?[\w<>\[\],\s]+?\s+(\w+)\s*\(([^)]*)\)")
});
static JAVA_CLASS: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:public\s+|abstract\s+|final\s+)*(?:class|interface|enum)\s+(\w+)(?:\s+extends\s+([\w.<>]+))?")
});
static JAVA_IMPORT: Lazy<Regex> = Lazy::new(|| re(r"^\s*import\s+(?:static\s+)?([\w.]+(?:\.\*)?)\s*;"));

static CSHARP_METHOD: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:public|protected|private|internal)\s+(?:static\s+|async\s+|virtual\s+|override\s+|sealed\s+)*[\w<>\[\],?\s]+?\s+(\w+)\s*\(([^)]*)\)")
});
static CSHARP_CLASS: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:public\s+|internal\s+|abstract\s+|sealed\s+|partial\s+|static\s+)*(?:class|interface|record|struct)\s+(\w+)(?:\s*:\s*([\w.,\s<>]+))?")
});
static CSHARP_USING: Lazy<Regex> = Lazy::new(|| re(r"^\s*using\s+(?:\w+\s*=\s*)?([\w.]+)\s*;"));

static RUST_FN: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+(\w+)\s*(?:<[^>]*>)?\s*\(([^)]*)\)\s*(?:->\s*([^\{;]+))?")
});
static RUST_TYPE: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait|union)\s+(\w+)")
});
static RUST_USE: Lazy<Regex> = Lazy::new(|| re(r"^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+([\w:]+)"));
static RUST_MOD: Lazy<Regex> = Lazy::new(|| re(r"^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+(\w+)\s*;"));

static PHP_FUNC: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:public\s+|protected\s+|private\s+|static\s+|abstract\s+|final\s+)*function\s+(\w+)\s*\(([^)]*)\)")
});
static PHP_CLASS: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:abstract\s+|final\s+)?(?:class|interface|trait)\s+(\w+)(?:\s+extends\s+([\w\\]+))?")
});
static PHP_USE: Lazy<Regex> = Lazy::new(|| re(r"^\s*use\s+([\w\\]+)\s*(?:as\s+\w+)?\s*;"));
static PHP_INCLUDE: Lazy<Regex> =
    Lazy::new(|| re(r#"^\s*(?:require|include)(?:_once)?\s*\(?\s*['"]([^'"]+)['"]"#));

static RUBY_DEF: Lazy<Regex> = Lazy::new(|| re(r"^\s*def\s+(?:self\.)?(\w+[?!]?)\s*(?:\(([^)]*)\))?"));
static RUBY_CLASS: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*(?:class|module)\s+(\w+)(?:\s*<\s*([\w:]+))?"));
static RUBY_REQUIRE: Lazy<Regex> =
    Lazy::new(|| re(r#"^\s*require\s+['"]([^'"]+)['"]"#));
static RUBY_REQUIRE_RELATIVE: Lazy<Regex> =
    Lazy::new(|| re(r#"^\s*require_relative\s+['"]([^'"]+)['"]"#));

/// Extract function declarations for a language over raw file content.
pub fn extract_functions(content: &str, language: Language) -> Vec<FunctionRecord> {
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_number = idx + 1;
        let record = match language {
            Language::Python => PY_FUNC.captures(line).map(|c| FunctionRecord {
                name: c[1].to_string(),
                line_number,
                line_content: line.trim().to_string(),
                signature: Some(python_signature(&c)),
            }),
            Language::JavaScript | Language::TypeScript => {
                extract_js_function(line, line_number)
            }
            Language::Go => GO_FUNC.captures(line).map(|c| FunctionRecord {
                name: c[1].to_string(),
                line_number,
                line_content: line.trim().to_string(),
                signature: Some(go_signature(&c)),
            }),
            Language::Java => JAVA_METHOD.captures(line).and_then(|c| {
                let name = c[1].to_string();
                // Constructor-looking or control-flow false positives.
                if matches!(name.as_str(), "if" | "for" | "while" | "switch" | "catch") {
                    return None;
                }
                Some(FunctionRecord {
                    name,
                    line_number,
                    line_content: line.trim().to_string(),
                    signature: Some(format!("({})", c[2].trim())),
                })
            }),
            Language::CSharp => CSHARP_METHOD.captures(line).and_then(|c| {
                let name = c[1].to_string();
                if matches!(name.as_str(), "if" | "for" | "while" | "switch" | "catch") {
                    return None;
                }
                Some(FunctionRecord {
                    name,
                    line_number,
                    line_content: line.trim().to_string(),
                    signature: Some(format!("({})", c[2].trim())),
                })
            }),
            Language::Rust => RUST_FN.captures(line).map(|c| FunctionRecord {
                name: c[1].to_string(),
                line_number,
                line_content: line.trim().to_string(),
                signature: Some(rust_signature(&c)),
            }),
            Language::Php => PHP_FUNC.captures(line).map(|c| FunctionRecord {
                name: c[1].to_string(),
                line_number,
                line_content: line.trim().to_string(),
                signature: Some(format!("({})", c[2].trim())),
            }),
            Language::Ruby => RUBY_DEF.captures(line).map(|c| FunctionRecord {
                name: c[1].to_string(),
                line_number,
                line_content: line.trim().to_string(),
                signature: c
                    .get(2)
                    .map(|params| format!("({})", params.as_str().trim())),
            }),
            _ => None,
        };
        if let Some(record) = record {
            out.push(record);
        }
    }
    out
}

fn python_signature(caps: &regex::Captures<'_>) -> String {
    let params = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    match caps.get(3) {
        Some(ret) => format!("({}) -> {}", params, ret.as_str().trim()),
        None => format!("({params})"),
    }
}

fn go_signature(caps: &regex::Captures<'_>) -> String {
    let params = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    let ret = caps.get(3).map(|m| m.as_str().trim()).unwrap_or("");
    if ret.is_empty() {
        format!("({params})")
    } else {
        format!("({params}) {ret}")
    }
}

fn rust_signature(caps: &regex::Captures<'_>) -> String {
    let params = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    match caps.get(3) {
        Some(ret) => format!("({}) -> {}", params, ret.as_str().trim()),
        None => format!("({params})"),
    }
}

// TS return-type annotations stay out of the signature; the parameter
// list alone is the contract. Return-type drift is the type analyzer's
// concern.
fn extract_js_function(line: &str, line_number: usize) -> Option<FunctionRecord> {
    if let Some(c) = JS_FUNC.captures(line) {
        return Some(FunctionRecord {
            name: c[1].to_string(),
            line_number,
            line_content: line.trim().to_string(),
            signature: Some(format!("({})", c[2].trim())),
        });
    }
    if let Some(c) = JS_ARROW.captures(line) {
        let params = c
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .or_else(|| c.get(3).map(|m| m.as_str().to_string()))
            .unwrap_or_default();
        return Some(FunctionRecord {
            name: c[1].to_string(),
            line_number,
            line_content: line.trim().to_string(),
            signature: Some(format!("({params})")),
        });
    }
    None
}

/// Extract class-like declarations (classes, interfaces, structs, traits).
pub fn extract_classes(content: &str, language: Language) -> Vec<ClassRecord> {
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_number = idx + 1;
        let record = match language {
            Language::Python => PY_CLASS.captures(line).map(|c| ClassRecord {
                name: c[1].to_string(),
                line_number,
                line_content: line.trim().to_string(),
                extends: c
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|s| !s.is_empty()),
            }),
            Language::JavaScript | Language::TypeScript => JS_CLASS
                .captures(line)
                .map(|c| ClassRecord {
                    name: c[1].to_string(),
                    line_number,
                    line_content: line.trim().to_string(),
                    extends: c.get(2).map(|m| m.as_str().to_string()),
                })
                .or_else(|| {
                    if language == Language::TypeScript {
                        TS_INTERFACE.captures(line).map(|c| ClassRecord {
                            name: c[1].to_string(),
                            line_number,
                            line_content: line.trim().to_string(),
                            extends: c.get(2).map(|m| m.as_str().trim().to_string()),
                        })
                    } else {
                        None
                    }
                }),
            Language::Go => GO_TYPE.captures(line).map(|c| ClassRecord {
                name: c[1].to_string(),
                line_number,
                line_content: line.trim().to_string(),
                extends: None,
            }),
            Language::Java => JAVA_CLASS.captures(line).map(|c| ClassRecord {
                name: c[1].to_string(),
                line_number,
                line_content: line.trim().to_string(),
                extends: c.get(2).map(|m| m.as_str().to_string()),
            }),
            Language::CSharp => CSHARP_CLASS.captures(line).map(|c| ClassRecord {
                name: c[1].to_string(),
                line_number,
                line_content: line.trim().to_string(),
                extends: c.get(2).map(|m| m.as_str().trim().to_string()),
            }),
            Language::Rust => RUST_TYPE.captures(line).map(|c| ClassRecord {
                name: c[1].to_string(),
                line_number,
                line_content: line.trim().to_string(),
                extends: None,
            }),
            Language::Php => PHP_CLASS.captures(line).map(|c| ClassRecord {
                name: c[1].to_string(),
                line_number,
                line_content: line.trim().to_string(),
                extends: c.get(2).map(|m| m.as_str().to_string()),
            }),
            Language::Ruby => RUBY_CLASS.captures(line).map(|c| ClassRecord {
                name: c[1].to_string(),
                line_number,
                line_content: line.trim().to_string(),
                extends: c.get(2).map(|m| m.as_str().to_string()),
            }),
            _ => None,
        };
        if let Some(record) = record {
            out.push(record);
        }
    }
    out
}

/// Extract import statements, normalized per language. Records are
/// deduplicated by `(module, type, line_number)`.
pub fn extract_imports(content: &str, language: Language) -> Vec<ImportRecord> {
    let mut seen: HashSet<(String, ImportType, usize)> = HashSet::new();
    let mut out = Vec::new();
    let mut push = |record: ImportRecord, out: &mut Vec<ImportRecord>| {
        let key = (
            record.module.clone(),
            record.import_type,
            record.line_number,
        );
        if seen.insert(key) {
            out.push(record);
        }
    };

    let mut in_go_import_block = false;
    for (idx, line) in content.lines().enumerate() {
        let line_number = idx + 1;
        match language {
            Language::Python => {
                if let Some(c) = PY_FROM.captures(line) {
                    let package = c[1].to_string();
                    push(
                        ImportRecord {
                            module: package.clone(),
                            import_type: ImportType::From,
                            line_number,
                        },
                        &mut out,
                    );
                    for member in c[2].split(',') {
                        let member = member
                            .trim()
                            .split_whitespace()
                            .next()
                            .unwrap_or("")
                            .trim_start_matches('(');
                        if member.is_empty() || member == "*" || member == "\\" {
                            continue;
                        }
                        let synthesized = if package.ends_with('.') {
                            format!("{package}{member}")
                        } else {
                            format!("{package}.{member}")
                        };
                        push(
                            ImportRecord {
                                module: synthesized,
                                import_type: ImportType::FromMember,
                                line_number,
                            },
                            &mut out,
                        );
                    }
                } else if let Some(c) = PY_IMPORT.captures(line) {
                    for module in c[1].split(',') {
                        push(
                            ImportRecord {
                                module: module.trim().to_string(),
                                import_type: ImportType::Import,
                                line_number,
                            },
                            &mut out,
                        );
                    }
                }
            }
            Language::JavaScript | Language::TypeScript => {
                if let Some(c) = JS_STATIC_IMPORT.captures(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::Static,
                            line_number,
                        },
                        &mut out,
                    );
                } else if let Some(c) = JS_SIDE_EFFECT.captures(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::SideEffect,
                            line_number,
                        },
                        &mut out,
                    );
                } else if let Some(c) = JS_EXPORT_FROM.captures(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::Static,
                            line_number,
                        },
                        &mut out,
                    );
                }
                for c in JS_REQUIRE.captures_iter(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::Require,
                            line_number,
                        },
                        &mut out,
                    );
                }
                for c in JS_DYNAMIC.captures_iter(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::Dynamic,
                            line_number,
                        },
                        &mut out,
                    );
                }
            }
            Language::Go => {
                let trimmed = line.trim();
                if trimmed.starts_with("import (") || trimmed == "import(" {
                    in_go_import_block = true;
                    continue;
                }
                if in_go_import_block {
                    if trimmed.starts_with(')') {
                        in_go_import_block = false;
                    } else if let Some(c) = GO_IMPORT_LINE.captures(line) {
                        push(
                            ImportRecord {
                                module: c[1].to_string(),
                                import_type: ImportType::Import,
                                line_number,
                            },
                            &mut out,
                        );
                    }
                    continue;
                }
                if let Some(c) = GO_IMPORT_SINGLE.captures(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::Import,
                            line_number,
                        },
                        &mut out,
                    );
                }
            }
            Language::Java => {
                if let Some(c) = JAVA_IMPORT.captures(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::Import,
                            line_number,
                        },
                        &mut out,
                    );
                }
            }
            Language::CSharp => {
                if let Some(c) = CSHARP_USING.captures(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::Using,
                            line_number,
                        },
                        &mut out,
                    );
                }
            }
            Language::Rust => {
                if let Some(c) = RUST_USE.captures(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::Use,
                            line_number,
                        },
                        &mut out,
                    );
                } else if let Some(c) = RUST_MOD.captures(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::Mod,
                            line_number,
                        },
                        &mut out,
                    );
                }
            }
            Language::Php => {
                if let Some(c) = PHP_USE.captures(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::Use,
                            line_number,
                        },
                        &mut out,
                    );
                } else if let Some(c) = PHP_INCLUDE.captures(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::Include,
                            line_number,
                        },
                        &mut out,
                    );
                }
            }
            Language::Ruby => {
                if let Some(c) = RUBY_REQUIRE_RELATIVE.captures(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::RequireRelative,
                            line_number,
                        },
                        &mut out,
                    );
                } else if let Some(c) = RUBY_REQUIRE.captures(line) {
                    push(
                        ImportRecord {
                            module: c[1].to_string(),
                            import_type: ImportType::Require,
                            line_number,
                        },
                        &mut out,
                    );
                }
            }
            _ => {}
        }
    }
    out
}

static CALL_TOKEN: Lazy<Regex> = Lazy::new(|| re(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\("));

const CALL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "match", "catch", "return", "new", "function", "def", "fn",
    "class", "super", "print", "println", "printf", "assert", "typeof", "sizeof", "await", "do",
    "elif", "unless", "until", "raise", "throw", "yield", "lambda", "select", "case", "in",
];

/// Identifiers that appear in call position, minus control-flow keywords.
/// Used to refine import edges into call-kind edges.
pub fn extract_call_tokens(content: &str) -> BTreeSet<String> {
    CALL_TOKEN
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .filter(|token| !CALL_KEYWORDS.contains(&token.as_str()))
        .collect()
}

/// Names of functions defined in the content, as a set.
pub fn extract_function_names(content: &str, language: Language) -> BTreeSet<String> {
    extract_functions(content, language)
        .into_iter()
        .map(|f| f.name)
        .collect()
}
