// ABOUTME: Line-classifier state machine and heuristic code metrics per file.
// ABOUTME: Inline-comment lines count as code; import statements tally separately
// ABOUTME: so code_lines reflects executable logic only.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use specgraph_core::{ComplexityLevel, Language};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeMetrics {
    pub total_lines: usize,
    pub code_lines: usize,
    pub import_lines: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub decision_points: usize,
    pub cyclomatic_complexity: u32,
    pub complexity_level: ComplexityLevel,
    pub maintainability_index: f64,
    pub max_line_length: usize,
    pub avg_line_length: f64,
}

struct CommentSyntax {
    line_markers: &'static [&'static str],
    block_markers: &'static [(&'static str, &'static str)],
}

fn syntax_for(language: Language) -> CommentSyntax {
    match language {
        Language::Python => CommentSyntax {
            line_markers: &["#"],
            // Triple-quoted strings double as docstrings.
            block_markers: &[("\"\"\"", "\"\"\""), ("'''", "'''")],
        },
        Language::Ruby => CommentSyntax {
            line_markers: &["#"],
            block_markers: &[("=begin", "=end")],
        },
        Language::Shell | Language::Yaml => CommentSyntax {
            line_markers: &["#"],
            block_markers: &[],
        },
        Language::Html | Language::Markdown => CommentSyntax {
            line_markers: &[],
            block_markers: &[("<!--", "-->")],
        },
        Language::Sql => CommentSyntax {
            line_markers: &["--"],
            block_markers: &[("/*", "*/")],
        },
        Language::Php => CommentSyntax {
            line_markers: &["//", "#"],
            block_markers: &[("/*", "*/")],
        },
        Language::Json => CommentSyntax {
            line_markers: &[],
            block_markers: &[],
        },
        _ => CommentSyntax {
            line_markers: &["//"],
            block_markers: &[("/*", "*/")],
        },
    }
}

fn decision_patterns(language: Language) -> &'static [Regex] {
    static PYTHON: Lazy<Vec<Regex>> = Lazy::new(|| {
        compile(&[
            r"\bif\b", r"\belif\b", r"\bfor\b", r"\bwhile\b", r"\bexcept\b", r"\band\b",
            r"\bor\b",
        ])
    });
    static JSLIKE: Lazy<Vec<Regex>> = Lazy::new(|| {
        compile(&[
            r"\bif\b",
            r"\bfor\b",
            r"\bwhile\b",
            r"\bcase\b",
            r"\bcatch\b",
            r"&&",
            r"\|\|",
            r"\s\?\s",
        ])
    });
    static GO: Lazy<Vec<Regex>> = Lazy::new(|| {
        compile(&[
            r"\bif\b", r"\bfor\b", r"\bcase\b", r"\bselect\b", r"&&", r"\|\|",
        ])
    });
    static RUST: Lazy<Vec<Regex>> = Lazy::new(|| {
        compile(&[
            r"\bif\b", r"\bwhile\b", r"\bfor\b", r"\bloop\b", r"\bmatch\b", r"&&", r"\|\|",
        ])
    });
    static PHP: Lazy<Vec<Regex>> = Lazy::new(|| {
        compile(&[
            r"\bif\b",
            r"\belseif\b",
            r"\bfor\b",
            r"\bforeach\b",
            r"\bwhile\b",
            r"\bcase\b",
            r"\bcatch\b",
            r"&&",
            r"\|\|",
        ])
    });
    static RUBY: Lazy<Vec<Regex>> = Lazy::new(|| {
        compile(&[
            r"\bif\b",
            r"\belsif\b",
            r"\bunless\b",
            r"\bwhile\b",
            r"\buntil\b",
            r"\bwhen\b",
            r"\brescue\b",
            r"&&",
            r"\|\|",
        ])
    });
    static NONE: Lazy<Vec<Regex>> = Lazy::new(Vec::new);

    match language {
        Language::Python => &PYTHON,
        Language::JavaScript
        | Language::TypeScript
        | Language::Java
        | Language::CSharp
        | Language::C
        | Language::Cpp => &JSLIKE,
        Language::Go => &GO,
        Language::Rust => &RUST,
        Language::Php => &PHP,
        Language::Ruby => &RUBY,
        _ => &NONE,
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static decision pattern must compile"))
        .collect()
}

static CSHARP_USING_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^using\s+(?:static\s+)?[\w.]+(?:\s*=\s*[\w.]+)?\s*;")
        .expect("static import pattern must compile")
});

/// Whether a code line is an import/using/include statement. Imports are
/// tallied under `import_lines`, not `code_lines`.
fn is_import_line(code_text: &str, language: Language) -> bool {
    let trimmed = code_text.trim_start();
    match language {
        Language::Python => trimmed.starts_with("import ") || trimmed.starts_with("from "),
        Language::JavaScript | Language::TypeScript => trimmed.starts_with("import "),
        Language::Go => trimmed.starts_with("import ") || trimmed.starts_with("import("),
        Language::Java => trimmed.starts_with("import "),
        Language::CSharp => CSHARP_USING_LINE.is_match(trimmed),
        Language::Rust => trimmed.starts_with("use ") || trimmed.starts_with("pub use "),
        Language::Php => {
            trimmed.starts_with("use ")
                || trimmed.starts_with("require ")
                || trimmed.starts_with("require(")
                || trimmed.starts_with("require_once")
                || trimmed.starts_with("include ")
                || trimmed.starts_with("include(")
                || trimmed.starts_with("include_once")
        }
        Language::Ruby => {
            trimmed.starts_with("require ")
                || trimmed.starts_with("require(")
                || trimmed.starts_with("require_relative ")
        }
        Language::C | Language::Cpp => trimmed.starts_with("#include"),
        _ => false,
    }
}

#[derive(Debug, PartialEq)]
enum LineKind {
    Blank,
    Comment,
    Code,
}

struct LineClassifier {
    syntax: CommentSyntax,
    in_block: Option<&'static str>,
}

impl LineClassifier {
    fn new(language: Language) -> Self {
        Self {
            syntax: syntax_for(language),
            in_block: None,
        }
    }

    /// Classify one line, carrying block-comment state across calls.
    /// Returns the kind plus the code text outside comments (for decision
    /// counting).
    fn classify<'a>(&mut self, line: &'a str) -> (LineKind, String) {
        if line.trim().is_empty() && self.in_block.is_none() {
            return (LineKind::Blank, String::new());
        }

        let mut rest = line;
        let mut code_text = String::new();
        let mut saw_comment = false;

        loop {
            if let Some(end) = self.in_block {
                saw_comment = true;
                match rest.find(end) {
                    Some(idx) => {
                        rest = &rest[idx + end.len()..];
                        self.in_block = None;
                    }
                    None => {
                        rest = "";
                        break;
                    }
                }
                continue;
            }

            let line_marker = self
                .syntax
                .line_markers
                .iter()
                .filter_map(|m| rest.find(m).map(|i| (i, *m)))
                .min_by_key(|(i, _)| *i);
            let block_marker = self
                .syntax
                .block_markers
                .iter()
                .filter_map(|(start, end)| rest.find(start).map(|i| (i, *start, *end)))
                .min_by_key(|(i, _, _)| *i);

            match (line_marker, block_marker) {
                (Some((li, _)), Some((bi, bstart, bend))) if bi < li => {
                    code_text.push_str(&rest[..bi]);
                    saw_comment = true;
                    rest = &rest[bi + bstart.len()..];
                    self.in_block = Some(bend);
                }
                (Some((li, _)), _) => {
                    code_text.push_str(&rest[..li]);
                    saw_comment = true;
                    rest = "";
                    break;
                }
                (None, Some((bi, bstart, bend))) => {
                    code_text.push_str(&rest[..bi]);
                    saw_comment = true;
                    rest = &rest[bi + bstart.len()..];
                    self.in_block = Some(bend);
                }
                (None, None) => {
                    code_text.push_str(rest);
                    break;
                }
            }
        }
        let _ = rest;

        if code_text.trim().is_empty() {
            if saw_comment {
                (LineKind::Comment, String::new())
            } else {
                (LineKind::Blank, String::new())
            }
        } else {
            (LineKind::Code, code_text)
        }
    }
}

/// Compute heuristic metrics for one file's content.
pub fn compute_metrics(content: &str, language: Language) -> CodeMetrics {
    let mut classifier = LineClassifier::new(language);
    let patterns = decision_patterns(language);

    let mut total_lines = 0usize;
    let mut code_lines = 0usize;
    let mut import_lines = 0usize;
    let mut comment_lines = 0usize;
    let mut blank_lines = 0usize;
    let mut decision_points = 0usize;
    let mut max_line_length = 0usize;
    let mut length_sum = 0usize;

    for line in content.lines() {
        total_lines += 1;
        let length = line.chars().count();
        max_line_length = max_line_length.max(length);
        length_sum += length;

        let (kind, code_text) = classifier.classify(line);
        match kind {
            LineKind::Blank => blank_lines += 1,
            LineKind::Comment => comment_lines += 1,
            LineKind::Code => {
                if is_import_line(&code_text, language) {
                    import_lines += 1;
                    continue;
                }
                code_lines += 1;
                for pattern in patterns {
                    decision_points += pattern.find_iter(&code_text).count();
                }
            }
        }
    }

    let cyclomatic_complexity = decision_points as u32 + 1;
    let avg_line_length = if total_lines == 0 {
        0.0
    } else {
        length_sum as f64 / total_lines as f64
    };
    let maintainability_index = (100.0
        - 1.5 * cyclomatic_complexity as f64
        - 0.08 * avg_line_length
        - 0.01 * (code_lines.saturating_sub(comment_lines)) as f64)
        .clamp(0.0, 100.0);

    CodeMetrics {
        total_lines,
        code_lines,
        import_lines,
        comment_lines,
        blank_lines,
        decision_points,
        cyclomatic_complexity,
        complexity_level: ComplexityLevel::from_complexity(cyclomatic_complexity),
        maintainability_index,
        max_line_length,
        avg_line_length,
    }
}
