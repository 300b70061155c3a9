// ABOUTME: Dynamic-language construct scanner: eval, reflection, runtime hooks, serialization risks.
// ABOUTME: Produces a bounded 0-100 risk score from weighted category counts.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use specgraph_core::{Language, Result, SpecGraphError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicFinding {
    pub construct: String,
    pub line_number: usize,
    pub line_content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstructCounts {
    pub functions: usize,
    pub classes: usize,
    pub conditionals: usize,
    pub loops: usize,
    pub exception_handlers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicAnalysis {
    pub language: Language,
    pub construct_counts: ConstructCounts,
    pub dangerous_constructs: Vec<DynamicFinding>,
    pub runtime_hooks: Vec<DynamicFinding>,
    pub reflection_usages: Vec<DynamicFinding>,
    pub dynamic_imports: Vec<DynamicFinding>,
    pub serialization_risks: Vec<DynamicFinding>,
    pub metaprogramming_usages: Vec<DynamicFinding>,
    pub risk_score: u32,
}

struct CategoryPatterns {
    dangerous: Vec<(&'static str, Regex)>,
    hooks: Vec<(&'static str, Regex)>,
    reflection: Vec<(&'static str, Regex)>,
    dynamic_imports: Vec<(&'static str, Regex)>,
    serialization: Vec<(&'static str, Regex)>,
    metaprogramming: Vec<(&'static str, Regex)>,
}

fn re(p: &str) -> Regex {
    Regex::new(p).expect("static dynamic pattern must compile")
}

static PYTHON_PATTERNS: Lazy<CategoryPatterns> = Lazy::new(|| CategoryPatterns {
    dangerous: vec![
        ("eval", re(r"\beval\s*\(")),
        ("exec", re(r"\bexec\s*\(")),
        ("compile", re(r"\bcompile\s*\(")),
    ],
    hooks: vec![
        ("magic_method", re(r"\bdef\s+__(?:getattr|setattr|delattr|getattribute|call|new|init_subclass)__")),
    ],
    reflection: vec![
        ("getattr", re(r"\bgetattr\s*\(")),
        ("setattr", re(r"\bsetattr\s*\(")),
        ("hasattr", re(r"\bhasattr\s*\(")),
        ("vars", re(r"\bvars\s*\(")),
        ("globals", re(r"\bglobals\s*\(")),
    ],
    dynamic_imports: vec![
        ("importlib", re(r"\bimportlib\.import_module\s*\(")),
        ("__import__", re(r"\b__import__\s*\(")),
    ],
    serialization: vec![
        ("pickle", re(r"\bpickle\.(?:load|loads)\s*\(")),
        ("yaml_load", re(r"\byaml\.load\s*\(")),
        ("marshal", re(r"\bmarshal\.(?:load|loads)\s*\(")),
    ],
    metaprogramming: vec![
        ("type_call", re(r"\btype\s*\(\s*\w+\s*,")),
        ("metaclass", re(r"\bmetaclass\s*=")),
    ],
});

static JS_PATTERNS: Lazy<CategoryPatterns> = Lazy::new(|| CategoryPatterns {
    dangerous: vec![
        ("eval", re(r"\beval\s*\(")),
        ("function_constructor", re(r"\bnew\s+Function\s*\(")),
        ("set_timeout_string", re(r#"\bsetTimeout\s*\(\s*['"]"#)),
    ],
    hooks: vec![("proxy", re(r"\bnew\s+Proxy\s*\("))],
    reflection: vec![
        ("reflect", re(r"\bReflect\.\w+\s*\(")),
        ("object_define", re(r"\bObject\.defineProperty\s*\(")),
    ],
    dynamic_imports: vec![("dynamic_import", re(r#"\bimport\s*\(\s*[^)]"#))],
    serialization: vec![("json_parse_reviver", re(r"\bJSON\.parse\s*\([^)]*,"))],
    metaprogramming: vec![
        ("prototype_mutation", re(r"\.__proto__\s*=")),
        ("object_assign_proto", re(r"\bObject\.setPrototypeOf\s*\(")),
    ],
});

static PHP_PATTERNS: Lazy<CategoryPatterns> = Lazy::new(|| CategoryPatterns {
    dangerous: vec![
        ("eval", re(r"\beval\s*\(")),
        ("create_function", re(r"\bcreate_function\s*\(")),
        ("variable_function", re(r"\$\w+\s*\(\s*")),
    ],
    hooks: vec![("magic_method", re(r"\bfunction\s+__(?:get|set|call|callStatic|invoke)\b"))],
    reflection: vec![("reflection_class", re(r"\bnew\s+Reflection\w+\s*\("))],
    dynamic_imports: vec![
        ("variable_include", re(r"\b(?:include|require)(?:_once)?\s*\(?\s*\$")),
    ],
    serialization: vec![("unserialize", re(r"\bunserialize\s*\("))],
    metaprogramming: vec![("class_alias", re(r"\bclass_alias\s*\("))],
});

static RUBY_PATTERNS: Lazy<CategoryPatterns> = Lazy::new(|| CategoryPatterns {
    dangerous: vec![
        ("eval", re(r"\beval\s*\(")),
        ("instance_eval", re(r"\binstance_eval\b")),
        ("class_eval", re(r"\bclass_eval\b")),
    ],
    hooks: vec![("method_missing", re(r"\bdef\s+method_missing\b"))],
    reflection: vec![
        ("send", re(r"\.send\s*\(")),
        ("public_send", re(r"\.public_send\s*\(")),
        ("instance_variable_get", re(r"\binstance_variable_get\b")),
    ],
    dynamic_imports: vec![("dynamic_require", re(r"\brequire\s+[^'\x22]"))],
    serialization: vec![
        ("marshal", re(r"\bMarshal\.(?:load|restore)\b")),
        ("yaml_load", re(r"\bYAML\.load\b")),
    ],
    metaprogramming: vec![
        ("define_method", re(r"\bdefine_method\b")),
        ("const_set", re(r"\bconst_set\b")),
    ],
});

fn patterns_for(language: Language) -> Option<&'static CategoryPatterns> {
    match language {
        Language::Python => Some(&PYTHON_PATTERNS),
        Language::JavaScript => Some(&JS_PATTERNS),
        Language::Php => Some(&PHP_PATTERNS),
        Language::Ruby => Some(&RUBY_PATTERNS),
        _ => None,
    }
}

static FUNC_COUNT: Lazy<Regex> =
    Lazy::new(|| re(r"(?m)^\s*(?:async\s+)?(?:def|function)\s+\w+|=>"));
static CLASS_COUNT: Lazy<Regex> = Lazy::new(|| re(r"(?m)^\s*class\s+\w+"));
static COND_COUNT: Lazy<Regex> =
    Lazy::new(|| re(r"\b(?:if|elif|elsif|elseif|unless|switch|case)\b"));
static LOOP_COUNT: Lazy<Regex> = Lazy::new(|| re(r"\b(?:for|while|until|loop|each)\b"));
static EXCEPT_COUNT: Lazy<Regex> =
    Lazy::new(|| re(r"\b(?:try|except|catch|rescue|finally|ensure)\b"));

fn scan_category(
    content: &str,
    patterns: &[(&'static str, Regex)],
) -> Vec<DynamicFinding> {
    let mut findings = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        for (construct, regex) in patterns {
            if regex.is_match(line) {
                findings.push(DynamicFinding {
                    construct: (*construct).to_string(),
                    line_number: idx + 1,
                    line_content: line.trim().to_string(),
                });
            }
        }
    }
    findings
}

/// Scan a dynamic-language file for risky runtime constructs. Returns an
/// error for languages outside the dynamic set.
pub fn analyze_dynamic(content: &str, language: Language) -> Result<DynamicAnalysis> {
    let patterns = patterns_for(language).ok_or_else(|| {
        SpecGraphError::InvalidInput(format!(
            "Dynamic-construct analysis does not apply to {language}"
        ))
    })?;

    let construct_counts = ConstructCounts {
        functions: FUNC_COUNT.find_iter(content).count(),
        classes: CLASS_COUNT.find_iter(content).count(),
        conditionals: COND_COUNT.find_iter(content).count(),
        loops: LOOP_COUNT.find_iter(content).count(),
        exception_handlers: EXCEPT_COUNT.find_iter(content).count(),
    };

    let dangerous_constructs = scan_category(content, &patterns.dangerous);
    let runtime_hooks = scan_category(content, &patterns.hooks);
    let reflection_usages = scan_category(content, &patterns.reflection);
    let dynamic_imports = scan_category(content, &patterns.dynamic_imports);
    let serialization_risks = scan_category(content, &patterns.serialization);
    let metaprogramming_usages = scan_category(content, &patterns.metaprogramming);

    let risk_score = (4 * dangerous_constructs.len()
        + 3 * serialization_risks.len()
        + 2 * (dynamic_imports.len() + runtime_hooks.len() + metaprogramming_usages.len())
        + reflection_usages.len())
    .min(100) as u32;

    Ok(DynamicAnalysis {
        language,
        construct_counts,
        dangerous_constructs,
        runtime_hooks,
        reflection_usages,
        dynamic_imports,
        serialization_risks,
        metaprogramming_usages,
        risk_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_eval_and_pickle_scored() {
        let content = concat!(
            "import pickle\n",
            "def load(blob):\n",
            "    data = pickle.loads(blob)\n",
            "    return eval(data)\n",
        );
        let analysis = analyze_dynamic(content, Language::Python).unwrap();
        assert_eq!(analysis.dangerous_constructs.len(), 1);
        assert_eq!(analysis.serialization_risks.len(), 1);
        // 4*1 + 3*1 = 7
        assert_eq!(analysis.risk_score, 7);
    }

    #[test]
    fn javascript_proxy_and_reflect() {
        let content = "const p = new Proxy(target, handler);\nReflect.get(p, 'x');\n";
        let analysis = analyze_dynamic(content, Language::JavaScript).unwrap();
        assert_eq!(analysis.runtime_hooks.len(), 1);
        assert_eq!(analysis.reflection_usages.len(), 1);
        // 2*1 + 1*1 = 3
        assert_eq!(analysis.risk_score, 3);
    }

    #[test]
    fn ruby_method_missing_is_a_hook() {
        let content = "def method_missing(name, *args)\n  super\nend\n";
        let analysis = analyze_dynamic(content, Language::Ruby).unwrap();
        assert_eq!(analysis.runtime_hooks.len(), 1);
        assert_eq!(analysis.runtime_hooks[0].construct, "method_missing");
    }

    #[test]
    fn risk_score_is_capped() {
        let mut content = String::new();
        for _ in 0..40 {
            content.push_str("eval(x)\n");
        }
        let analysis = analyze_dynamic(&content, Language::Python).unwrap();
        assert_eq!(analysis.risk_score, 100);
    }

    #[test]
    fn static_language_rejected() {
        assert!(analyze_dynamic("fn main() {}", Language::Rust).is_err());
    }

    #[test]
    fn construct_counts_tally() {
        let content = "def a():\n    if x:\n        for i in y:\n            pass\n";
        let analysis = analyze_dynamic(content, Language::Python).unwrap();
        assert_eq!(analysis.construct_counts.functions, 1);
        assert_eq!(analysis.construct_counts.conditionals, 1);
        assert_eq!(analysis.construct_counts.loops, 1);
    }
}
