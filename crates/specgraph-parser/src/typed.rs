// ABOUTME: Heuristic type-aware extraction for statically-typed languages.
// ABOUTME: Feeds the type-system change analyzer; outputs are comparable across revisions.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use specgraph_core::{Language, Result, SpecGraphError};
use std::collections::BTreeSet;

/// Type literals treated as unsafe escape hatches.
pub const UNSAFE_TYPE_MARKERS: &[&str] = &["any", "unknown", "dynamic", "object"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    pub kind: String,
    pub line_number: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedSymbol {
    pub name: String,
    pub symbol_type: String,
    pub kind: String,
    pub line_number: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    pub line_number: usize,
}

impl FunctionSignature {
    /// Canonical rendering used when signatures are diffed across revisions.
    pub fn render(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| match &p.param_type {
                Some(t) => format!("{}: {}", p.name, t),
                None => p.name.clone(),
            })
            .collect();
        match &self.return_type {
            Some(ret) => format!("({}) -> {}", params.join(", "), ret),
            None => format!("({})", params.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredSymbol {
    pub name: String,
    pub line_number: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSummary {
    pub explicit_symbol_count: usize,
    pub inferred_symbol_count: usize,
    pub explicit_type_ratio: f64,
    pub unique_type_count: usize,
    pub unsafe_type_usage_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeAnalysis {
    pub language: Language,
    pub type_definitions: Vec<TypeDefinition>,
    pub typed_symbols: Vec<TypedSymbol>,
    pub function_signatures: Vec<FunctionSignature>,
    pub generic_usages: Vec<String>,
    pub cast_count: usize,
    pub inferred_symbols: Vec<InferredSymbol>,
    pub summary: TypeSummary,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static type pattern must compile")
}

static TS_TYPE_DEF: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*(?:export\s+)?(interface|type|enum|class)\s+(\w+)"));
static TS_TYPED_VAR: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*(?:export\s+)?(?:const|let|var|readonly)\s+(\w+)\s*:\s*([\w\[\]<>,.|&\s]+?)\s*[=;]"));
static TS_INFERRED_VAR: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*="));
static TS_FUNC: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(\w+)\s*\(([^)]*)\)\s*(?::\s*([^\{]+))?")
});
static TS_CAST: Lazy<Regex> = Lazy::new(|| re(r"\bas\s+[\w\[\]<>.]+"));
static GENERIC: Lazy<Regex> = Lazy::new(|| re(r"\b\w+<[\w\[\]<>,.\s]+>"));

static JAVA_FIELD: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:public|protected|private)\s+(?:static\s+)?(?:final\s+)?([\w<>\[\],.]+)\s+(\w+)\s*[=;]")
});
static JAVA_LOCAL: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*([A-Z][\w<>\[\],.]*)\s+(\w+)\s*="));
static JAVA_VAR: Lazy<Regex> = Lazy::new(|| re(r"^\s*var\s+(\w+)\s*="));
static JAVA_CAST: Lazy<Regex> = Lazy::new(|| re(r"\(\s*[A-Z][\w<>\[\].]*\s*\)\s*\w"));
static JAVA_TYPE_DEF: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*(?:public\s+|abstract\s+|final\s+)*(class|interface|enum|record)\s+(\w+)"));
static JAVA_METHOD_SIG: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:public|protected|private)\s+(?:static\s+)?(?:final\s+)?([\w<>\[\],.]+)\s+(\w+)\s*\(([^)]*)\)")
});

static CSHARP_CAST: Lazy<Regex> = Lazy::new(|| re(r"\bas\s+[\w<>\[\].?]+|\(\s*[A-Z][\w<>\[\].]*\s*\)\s*\w"));

static GO_TYPED_VAR: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*var\s+(\w+)\s+([\w\[\]*.]+)"));
static GO_INFERRED: Lazy<Regex> = Lazy::new(|| re(r"^\s*(\w+)\s*:="));
static GO_TYPE_DEF: Lazy<Regex> = Lazy::new(|| re(r"^\s*type\s+(\w+)\s+(struct|interface|func|\w+)"));
static GO_FUNC_SIG: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*func\s+(?:\([^)]*\)\s+)?(\w+)\s*\(([^)]*)\)\s*([^\{]*)"));
static GO_ASSERT: Lazy<Regex> = Lazy::new(|| re(r"\.\(\s*[\w.*\[\]]+\s*\)"));

static RUST_TYPED_LET: Lazy<Regex> =
    Lazy::new(|| re(r"^\s*let\s+(?:mut\s+)?(\w+)\s*:\s*([^=;]+?)\s*[=;]"));
static RUST_INFERRED_LET: Lazy<Regex> = Lazy::new(|| re(r"^\s*let\s+(?:mut\s+)?(\w+)\s*="));
static RUST_TYPE_DEF: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:pub(?:\([^)]*\))?\s+)?(struct|enum|trait|type|union)\s+(\w+)")
});
static RUST_FN_SIG: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+(\w+)\s*(?:<[^>]*>)?\s*\(([^)]*)\)\s*(?:->\s*([^\{;]+))?")
});
static RUST_CAST: Lazy<Regex> = Lazy::new(|| re(r"\bas\s+[\w:<>&\[\]]+"));

static CPP_TYPED: Lazy<Regex> = Lazy::new(|| {
    re(r"^\s*(?:const\s+)?(int|long|float|double|char|bool|auto|size_t|std::[\w:<>]+|[A-Z]\w*)\s*[*&]?\s+(\w+)\s*[=;(]")
});
static CPP_CAST: Lazy<Regex> =
    Lazy::new(|| re(r"(?:static_cast|dynamic_cast|reinterpret_cast|const_cast)\s*<[^>]+>"));

fn split_params(raw: &str, typed_style: TypedStyle) -> Vec<Parameter> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| match typed_style {
            TypedStyle::ColonAfter => match p.split_once(':') {
                Some((name, ty)) => Parameter {
                    name: name.trim().trim_start_matches("mut ").to_string(),
                    param_type: Some(ty.trim().to_string()),
                },
                None => Parameter {
                    name: p.to_string(),
                    param_type: None,
                },
            },
            TypedStyle::TypeFirst => {
                let mut parts = p.rsplitn(2, char::is_whitespace);
                let name = parts.next().unwrap_or(p).to_string();
                let ty = parts.next().map(|t| t.trim().to_string());
                Parameter {
                    name,
                    param_type: ty,
                }
            }
            TypedStyle::TypeAfter => {
                let mut parts = p.splitn(2, char::is_whitespace);
                let name = parts.next().unwrap_or(p).to_string();
                let ty = parts.next().map(|t| t.trim().to_string());
                Parameter {
                    name,
                    param_type: ty,
                }
            }
        })
        .collect()
}

#[derive(Clone, Copy)]
enum TypedStyle {
    /// `name: Type` (TypeScript, Rust)
    ColonAfter,
    /// `Type name` (Java, C#, C++)
    TypeFirst,
    /// `name Type` (Go)
    TypeAfter,
}

/// Analyze typed structure of a statically-typed source file. Returns an
/// error for languages outside the statically-typed set.
pub fn analyze_types(content: &str, language: Language) -> Result<TypeAnalysis> {
    if !language.is_statically_typed() {
        return Err(SpecGraphError::InvalidInput(format!(
            "Type-aware analysis does not apply to {language}"
        )));
    }

    let mut type_definitions = Vec::new();
    let mut typed_symbols = Vec::new();
    let mut function_signatures = Vec::new();
    let mut generic_usages = BTreeSet::new();
    let mut cast_count = 0usize;
    let mut inferred_symbols = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_number = idx + 1;
        match language {
            Language::TypeScript => {
                if let Some(c) = TS_TYPE_DEF.captures(line) {
                    type_definitions.push(TypeDefinition {
                        name: c[2].to_string(),
                        kind: c[1].to_string(),
                        line_number,
                    });
                }
                if let Some(c) = TS_TYPED_VAR.captures(line) {
                    typed_symbols.push(TypedSymbol {
                        name: c[1].to_string(),
                        symbol_type: c[2].trim().to_string(),
                        kind: "variable".to_string(),
                        line_number,
                    });
                } else if let Some(c) = TS_INFERRED_VAR.captures(line) {
                    inferred_symbols.push(InferredSymbol {
                        name: c[1].to_string(),
                        line_number,
                    });
                }
                if let Some(c) = TS_FUNC.captures(line) {
                    function_signatures.push(FunctionSignature {
                        name: c[1].to_string(),
                        parameters: split_params(&c[2], TypedStyle::ColonAfter),
                        return_type: c.get(3).map(|m| m.as_str().trim().to_string()),
                        line_number,
                    });
                }
                cast_count += TS_CAST.find_iter(line).count();
            }
            Language::Java | Language::CSharp => {
                if let Some(c) = JAVA_TYPE_DEF.captures(line) {
                    type_definitions.push(TypeDefinition {
                        name: c[2].to_string(),
                        kind: c[1].to_string(),
                        line_number,
                    });
                }
                if let Some(c) = JAVA_METHOD_SIG.captures(line) {
                    let return_type = c[1].trim().to_string();
                    function_signatures.push(FunctionSignature {
                        name: c[2].to_string(),
                        parameters: split_params(&c[3], TypedStyle::TypeFirst),
                        return_type: (return_type != "void").then_some(return_type),
                        line_number,
                    });
                } else if let Some(c) = JAVA_FIELD.captures(line) {
                    typed_symbols.push(TypedSymbol {
                        name: c[2].to_string(),
                        symbol_type: c[1].trim().to_string(),
                        kind: "field".to_string(),
                        line_number,
                    });
                } else if let Some(c) = JAVA_VAR.captures(line) {
                    inferred_symbols.push(InferredSymbol {
                        name: c[1].to_string(),
                        line_number,
                    });
                } else if let Some(c) = JAVA_LOCAL.captures(line) {
                    typed_symbols.push(TypedSymbol {
                        name: c[2].to_string(),
                        symbol_type: c[1].trim().to_string(),
                        kind: "variable".to_string(),
                        line_number,
                    });
                }
                cast_count += if language == Language::CSharp {
                    CSHARP_CAST.find_iter(line).count()
                } else {
                    JAVA_CAST.find_iter(line).count()
                };
            }
            Language::Go => {
                if let Some(c) = GO_TYPE_DEF.captures(line) {
                    type_definitions.push(TypeDefinition {
                        name: c[1].to_string(),
                        kind: c[2].to_string(),
                        line_number,
                    });
                }
                if let Some(c) = GO_FUNC_SIG.captures(line) {
                    let ret = c[3].trim().to_string();
                    function_signatures.push(FunctionSignature {
                        name: c[1].to_string(),
                        parameters: split_params(&c[2], TypedStyle::TypeAfter),
                        return_type: (!ret.is_empty()).then_some(ret),
                        line_number,
                    });
                } else if let Some(c) = GO_TYPED_VAR.captures(line) {
                    typed_symbols.push(TypedSymbol {
                        name: c[1].to_string(),
                        symbol_type: c[2].to_string(),
                        kind: "variable".to_string(),
                        line_number,
                    });
                } else if let Some(c) = GO_INFERRED.captures(line) {
                    inferred_symbols.push(InferredSymbol {
                        name: c[1].to_string(),
                        line_number,
                    });
                }
                cast_count += GO_ASSERT.find_iter(line).count();
            }
            Language::Rust => {
                if let Some(c) = RUST_TYPE_DEF.captures(line) {
                    type_definitions.push(TypeDefinition {
                        name: c[2].to_string(),
                        kind: c[1].to_string(),
                        line_number,
                    });
                }
                if let Some(c) = RUST_FN_SIG.captures(line) {
                    function_signatures.push(FunctionSignature {
                        name: c[1].to_string(),
                        parameters: split_params(&c[2], TypedStyle::ColonAfter),
                        return_type: c.get(3).map(|m| m.as_str().trim().to_string()),
                        line_number,
                    });
                } else if let Some(c) = RUST_TYPED_LET.captures(line) {
                    typed_symbols.push(TypedSymbol {
                        name: c[1].to_string(),
                        symbol_type: c[2].trim().to_string(),
                        kind: "variable".to_string(),
                        line_number,
                    });
                } else if let Some(c) = RUST_INFERRED_LET.captures(line) {
                    inferred_symbols.push(InferredSymbol {
                        name: c[1].to_string(),
                        line_number,
                    });
                }
                cast_count += RUST_CAST.find_iter(line).count();
            }
            Language::C | Language::Cpp => {
                if let Some(c) = CPP_TYPED.captures(line) {
                    typed_symbols.push(TypedSymbol {
                        name: c[2].to_string(),
                        symbol_type: c[1].to_string(),
                        kind: "variable".to_string(),
                        line_number,
                    });
                }
                cast_count += CPP_CAST.find_iter(line).count();
            }
            _ => unreachable!("guarded by is_statically_typed"),
        }
        for m in GENERIC.find_iter(line) {
            generic_usages.insert(m.as_str().to_string());
        }
    }

    let explicit = typed_symbols.len()
        + function_signatures
            .iter()
            .filter(|f| f.parameters.iter().any(|p| p.param_type.is_some()) || f.return_type.is_some())
            .count();
    let inferred = inferred_symbols.len();
    let explicit_type_ratio = if explicit + inferred == 0 {
        1.0
    } else {
        explicit as f64 / (explicit + inferred) as f64
    };

    let mut unique_types: BTreeSet<String> = BTreeSet::new();
    for symbol in &typed_symbols {
        unique_types.insert(symbol.symbol_type.clone());
    }
    for sig in &function_signatures {
        for p in &sig.parameters {
            if let Some(t) = &p.param_type {
                unique_types.insert(t.clone());
            }
        }
        if let Some(ret) = &sig.return_type {
            unique_types.insert(ret.clone());
        }
    }

    let unsafe_type_usage_count = count_unsafe_usages(content);

    Ok(TypeAnalysis {
        language,
        summary: TypeSummary {
            explicit_symbol_count: explicit,
            inferred_symbol_count: inferred,
            explicit_type_ratio,
            unique_type_count: unique_types.len(),
            unsafe_type_usage_count,
        },
        type_definitions,
        typed_symbols,
        function_signatures,
        generic_usages: generic_usages.into_iter().collect(),
        cast_count,
        inferred_symbols,
    })
}

/// Count whole-word unsafe type markers used in type position.
pub fn count_unsafe_usages(content: &str) -> usize {
    static UNSAFE_RE: Lazy<Regex> =
        Lazy::new(|| re(r":\s*(any|unknown|dynamic|object)\b|\bas\s+(any|unknown|dynamic|object)\b|\b(dynamic|object)\s+\w+\s*[=;]"));
    UNSAFE_RE.find_iter(content).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typescript_symbols_and_ratio() {
        let content = concat!(
            "export interface User { id: string }\n",
            "const count: number = 1;\n",
            "const inferred = compute();\n",
            "export function getUser(id: string): User { return lookup(id); }\n",
        );
        let analysis = analyze_types(content, Language::TypeScript).unwrap();
        assert_eq!(analysis.type_definitions.len(), 1);
        assert_eq!(analysis.typed_symbols.len(), 1);
        assert_eq!(analysis.inferred_symbols.len(), 1);
        let sig = &analysis.function_signatures[0];
        assert_eq!(sig.name, "getUser");
        assert_eq!(sig.render(), "(id: string) -> User");
        // explicit = typed var + typed function, inferred = 1
        assert!((analysis.summary.explicit_type_ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn unsafe_markers_are_counted() {
        let content = "let a: any = 1;\nconst b = x as unknown;\nlet c: string = 's';\n";
        assert_eq!(count_unsafe_usages(content), 2);
    }

    #[test]
    fn rust_let_bindings() {
        let content = "let x: u32 = 1;\nlet y = 2;\nfn add(a: u32, b: u32) -> u32 { a + b }\n";
        let analysis = analyze_types(content, Language::Rust).unwrap();
        assert_eq!(analysis.typed_symbols.len(), 1);
        assert_eq!(analysis.inferred_symbols.len(), 1);
        assert_eq!(
            analysis.function_signatures[0].render(),
            "(a: u32, b: u32) -> u32"
        );
        // `1;` after `as` is not present; no casts here
        assert_eq!(analysis.cast_count, 0);
    }

    #[test]
    fn go_assertions_count_as_casts() {
        let content = "var n int = 1\nv := raw.(string)\nfunc Get(id string) string { return id }\n";
        let analysis = analyze_types(content, Language::Go).unwrap();
        assert_eq!(analysis.cast_count, 1);
        assert_eq!(analysis.typed_symbols.len(), 1);
        assert_eq!(analysis.inferred_symbols.len(), 1);
    }

    #[test]
    fn dynamic_language_is_rejected() {
        assert!(analyze_types("x = 1", Language::Python).is_err());
    }

    #[test]
    fn empty_file_ratio_defaults_to_one() {
        let analysis = analyze_types("", Language::TypeScript).unwrap();
        assert!((analysis.summary.explicit_type_ratio - 1.0).abs() < f64::EPSILON);
        assert_eq!(analysis.summary.unique_type_count, 0);
    }
}
