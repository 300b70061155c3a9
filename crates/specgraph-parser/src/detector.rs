// ABOUTME: Maps a file to a language via extension, shebang, and content regex voting.
// ABOUTME: Detection over unknown or binary files must never fail.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use specgraph_core::{paths, Language, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Window read for shebang and content voting when the extension is unknown.
const CONTENT_WINDOW_BYTES: usize = 32 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Extension,
    Shebang,
    Content,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageDetection {
    pub language: Language,
    pub extension: String,
    pub detected_by: DetectionMethod,
    pub confidence: f64,
    pub is_target_language: bool,
}

impl LanguageDetection {
    fn new(
        language: Language,
        extension: String,
        detected_by: DetectionMethod,
        confidence: f64,
    ) -> Self {
        Self {
            is_target_language: language.is_target(),
            language,
            extension,
            detected_by,
            confidence,
        }
    }
}

pub fn language_for_extension(ext: &str) -> Option<Language> {
    let lang = match ext.trim_start_matches('.').to_lowercase().as_str() {
        "py" | "pyi" => Language::Python,
        "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
        "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
        "java" => Language::Java,
        "go" => Language::Go,
        "cs" => Language::CSharp,
        "rs" => Language::Rust,
        "php" | "phtml" | "php3" | "php4" | "php5" => Language::Php,
        "rb" | "rake" | "gemspec" => Language::Ruby,
        "c" => Language::C,
        "cpp" | "cxx" | "cc" | "hpp" | "hxx" | "h" => Language::Cpp,
        "json" => Language::Json,
        "yaml" | "yml" => Language::Yaml,
        "md" | "markdown" => Language::Markdown,
        "html" | "htm" => Language::Html,
        "css" | "scss" | "less" => Language::Css,
        "sh" | "bash" | "zsh" => Language::Shell,
        "sql" => Language::Sql,
        _ => return None,
    };
    Some(lang)
}

/// Detect the language of a file. Decision order: known extension, then
/// shebang on the first line, then content regex voting over a bounded
/// window. Unreadable or binary files degrade to `unknown`.
pub fn detect_language(path: &Path) -> Result<LanguageDetection> {
    let posix = paths::to_posix(path);
    let extension = paths::extension(&posix).unwrap_or_default();

    if let Some(language) = language_for_extension(&extension) {
        return Ok(LanguageDetection::new(
            language,
            extension,
            DetectionMethod::Extension,
            0.98,
        ));
    }

    let window = match read_window(path) {
        Ok(window) => window,
        Err(err) => {
            tracing::debug!(path = %posix, error = %err, "unreadable file treated as unknown");
            return Ok(LanguageDetection::new(
                Language::Unknown,
                extension,
                DetectionMethod::Unknown,
                0.35,
            ));
        }
    };
    let content = String::from_utf8_lossy(&window);

    if let Some(language) = detect_by_shebang(&content) {
        return Ok(LanguageDetection::new(
            language,
            extension,
            DetectionMethod::Shebang,
            0.9,
        ));
    }

    if let Some((language, score)) = vote_by_content(&content) {
        let confidence = (0.45 + 0.12 * score as f64).min(0.9);
        return Ok(LanguageDetection::new(
            language,
            extension,
            DetectionMethod::Content,
            confidence,
        ));
    }

    Ok(LanguageDetection::new(
        Language::Unknown,
        extension,
        DetectionMethod::Unknown,
        0.35,
    ))
}

fn read_window(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; CONTENT_WINDOW_BYTES];
    let mut read_total = 0;
    loop {
        let n = file.read(&mut buf[read_total..])?;
        if n == 0 {
            break;
        }
        read_total += n;
        if read_total == buf.len() {
            break;
        }
    }
    buf.truncate(read_total);
    Ok(buf)
}

fn detect_by_shebang(content: &str) -> Option<Language> {
    let first_line = content.lines().next()?.trim();
    if !first_line.starts_with("#!") {
        return None;
    }
    let lowered = first_line.to_lowercase();
    if lowered.contains("python") {
        Some(Language::Python)
    } else if lowered.contains("node") {
        Some(Language::JavaScript)
    } else if lowered.contains("php") {
        Some(Language::Php)
    } else if lowered.contains("ruby") {
        Some(Language::Ruby)
    } else {
        None
    }
}

struct VotePatterns {
    language: Language,
    patterns: [&'static str; 5],
}

static VOTE_FAMILIES: Lazy<Vec<(Language, Vec<Regex>)>> = Lazy::new(|| {
    let families = [
        VotePatterns {
            language: Language::Python,
            patterns: [
                r"(?m)^\s*def\s+\w+\s*\(",
                r"(?m)^\s*import\s+\w+",
                r"(?m)^\s*from\s+[\w.]+\s+import\s",
                r"(?m)^\s*class\s+\w+\s*[(:]",
                r"(?m)^\s*if\s+__name__\s*==",
            ],
        },
        VotePatterns {
            language: Language::JavaScript,
            patterns: [
                r"(?m)\bfunction\s+\w+\s*\(",
                r"(?m)\b(?:const|let|var)\s+\w+\s*=",
                r"(?m)\brequire\s*\(\s*['\x22]",
                r"(?m)\bmodule\.exports\b",
                r"(?m)=>\s*\{",
            ],
        },
        VotePatterns {
            language: Language::TypeScript,
            patterns: [
                r"(?m)\binterface\s+\w+\s*\{",
                r"(?m):\s*(?:string|number|boolean|void)\b",
                r"(?m)\bexport\s+(?:type|interface|enum)\b",
                r"(?m)\bimplements\s+\w+",
                r"(?m)<\w+(?:,\s*\w+)*>\s*\(",
            ],
        },
        VotePatterns {
            language: Language::Java,
            patterns: [
                r"(?m)\bpublic\s+class\s+\w+",
                r"(?m)\bprivate\s+\w+\s+\w+\s*;",
                r"(?m)^\s*package\s+[\w.]+\s*;",
                r"(?m)\bSystem\.out\.println\b",
                r"(?m)^\s*import\s+java[\w.]*\s*;",
            ],
        },
        VotePatterns {
            language: Language::Go,
            patterns: [
                r"(?m)^\s*package\s+\w+\s*$",
                r"(?m)\bfunc\s+\w+\s*\(",
                r"(?m):=",
                r#"(?m)^\s*import\s+(?:\(|")"#,
                r"(?m)\bfmt\.Print",
            ],
        },
        VotePatterns {
            language: Language::CSharp,
            patterns: [
                r"(?m)^\s*using\s+System[\w.]*\s*;",
                r"(?m)\bnamespace\s+[\w.]+",
                r"(?m)\bpublic\s+(?:class|interface|record)\s+\w+",
                r"(?m)\bConsole\.Write",
                r"(?m)\basync\s+Task\b",
            ],
        },
        VotePatterns {
            language: Language::Rust,
            patterns: [
                r"(?m)\bfn\s+\w+\s*\(",
                r"(?m)\blet\s+(?:mut\s+)?\w+",
                r"(?m)\buse\s+[\w:]+\s*;",
                r"(?m)\bimpl\s+\w+",
                r"(?m)\bmatch\s+\w+\s*\{",
            ],
        },
        VotePatterns {
            language: Language::Php,
            patterns: [
                r"(?m)<\?php",
                r"(?m)\$\w+\s*=",
                r"(?m)\bfunction\s+\w+\s*\(",
                r"(?m)\becho\s",
                r"(?m)->\w+\s*\(",
            ],
        },
        VotePatterns {
            language: Language::Ruby,
            patterns: [
                r"(?m)^\s*def\s+\w+",
                r"(?m)^\s*end\s*$",
                r"(?m)^\s*require(?:_relative)?\s+['\x22]",
                r"(?m)\bputs\s",
                r"(?m)^\s*class\s+\w+\s*(?:<\s*\w+)?\s*$",
            ],
        },
    ];

    families
        .into_iter()
        .map(|family| {
            let regexes = family
                .patterns
                .iter()
                .map(|p| Regex::new(p).expect("static vote pattern must compile"))
                .collect();
            (family.language, regexes)
        })
        .collect()
});

/// Score each language family by pattern hits; the winner must strictly
/// beat the runner-up and score at least 2.
fn vote_by_content(content: &str) -> Option<(Language, usize)> {
    let mut scores: Vec<(Language, usize)> = VOTE_FAMILIES
        .iter()
        .map(|(language, regexes)| {
            let score = regexes.iter().filter(|re| re.is_match(content)).count();
            (*language, score)
        })
        .collect();
    scores.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let (winner, top) = scores[0];
    let runner_up = scores.get(1).map(|(_, s)| *s).unwrap_or(0);
    if top >= 2 && top > runner_up {
        Some((winner, top))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    #[test]
    fn extension_detection_wins_first() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "m.py", b"not even python");
        let det = detect_language(&path).unwrap();
        assert_eq!(det.language, Language::Python);
        assert_eq!(det.detected_by, DetectionMethod::Extension);
        assert!((det.confidence - 0.98).abs() < f64::EPSILON);
        assert!(det.is_target_language);
    }

    #[test]
    fn shebang_detection_for_extensionless_script() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "runme", b"#!/usr/bin/env python3\nprint('hi')\n");
        let det = detect_language(&path).unwrap();
        assert_eq!(det.language, Language::Python);
        assert_eq!(det.detected_by, DetectionMethod::Shebang);
        assert!((det.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn content_voting_picks_clear_winner() {
        let dir = TempDir::new().unwrap();
        let code = b"package main\n\nimport \"fmt\"\n\nfunc main() {\n  x := 1\n  fmt.Println(x)\n}\n";
        let path = write_file(&dir, "mainfile", code);
        let det = detect_language(&path).unwrap();
        assert_eq!(det.language, Language::Go);
        assert_eq!(det.detected_by, DetectionMethod::Content);
        assert!(det.confidence >= 0.45 + 0.12 * 2.0 - 1e-9);
        assert!(det.confidence <= 0.9);
    }

    #[test]
    fn binary_content_degrades_to_unknown() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "blob", &[0u8, 159, 146, 150, 255, 0, 7]);
        let det = detect_language(&path).unwrap();
        assert_eq!(det.language, Language::Unknown);
        assert_eq!(det.detected_by, DetectionMethod::Unknown);
        assert!((det.confidence - 0.35).abs() < f64::EPSILON);
    }

    #[test]
    fn large_file_still_detected_by_extension() {
        let dir = TempDir::new().unwrap();
        let body = vec![b'x'; CONTENT_WINDOW_BYTES * 2];
        let path = write_file(&dir, "big.rs", &body);
        let det = detect_language(&path).unwrap();
        assert_eq!(det.language, Language::Rust);
        assert_eq!(det.detected_by, DetectionMethod::Extension);
    }

    #[test]
    fn missing_file_is_unknown_not_error() {
        let det = detect_language(Path::new("/nonexistent/zzz")).unwrap();
        assert_eq!(det.language, Language::Unknown);
    }
}
