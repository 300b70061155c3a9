// ABOUTME: Repository tree walker that detects languages and aggregates code metrics.
// ABOUTME: Per-language and per-directory summaries over a bounded, deterministic file list.

use crate::detector::{self, LanguageDetection};
use crate::metrics::{self, CodeMetrics};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use specgraph_core::{hints, paths, FileNode, Language, Result, SpecGraphError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub root: PathBuf,
    pub recursive: bool,
    /// Optional dotted-suffix filter, e.g. [".py", ".ts"].
    pub extensions: Option<Vec<String>>,
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: true,
            extensions: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedFile {
    #[serde(flatten)]
    pub node: FileNode,
    pub detection: LanguageDetection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<CodeMetrics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageSummary {
    pub file_count: usize,
    pub total_lines: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub total_complexity: u64,
    pub max_complexity: u32,
    pub avg_complexity: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySummary {
    pub file_count: usize,
    pub code_lines: usize,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanTotals {
    pub file_count: usize,
    pub total_lines: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub root: String,
    pub files: Vec<ScannedFile>,
    pub languages: BTreeMap<String, LanguageSummary>,
    pub directories: BTreeMap<String, DirectorySummary>,
    pub totals: ScanTotals,
}

fn extension_globset(extensions: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut added = false;
    for ext in extensions {
        let suffix = ext.trim_start_matches('.');
        match Glob::new(&format!("**/*.{suffix}")) {
            Ok(glob) => {
                builder.add(glob);
                added = true;
            }
            Err(e) => warn!("Invalid extension filter '{ext}': {e}"),
        }
    }
    if added {
        builder.build().ok()
    } else {
        None
    }
}

fn is_noise(path: &str) -> bool {
    paths::segments(path)
        .iter()
        .any(|segment| hints::NOISE_PARTS.contains(&segment.as_str()))
}

/// Collect files in scope, detect each one, and aggregate metrics.
/// An empty directory yields a success result with zeroed counts.
pub fn scan_directory(config: &ScanConfig) -> Result<ScanResult> {
    if !config.root.is_dir() {
        return Err(SpecGraphError::InvalidInput(format!(
            "Not a directory: {}",
            config.root.display()
        )));
    }

    let include_set = config
        .extensions
        .as_deref()
        .and_then(extension_globset);

    let mut walker = WalkBuilder::new(&config.root);
    walker
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .ignore(true);
    if !config.recursive {
        walker.max_depth(Some(1));
    }

    let mut files = Vec::new();
    for entry in walker.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Walker error: {e}");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(rel) = paths::relative_to(&config.root, path) else {
            continue;
        };
        if is_noise(&rel) {
            continue;
        }
        if let Some(ref set) = include_set {
            if !set.is_match(&rel) {
                continue;
            }
        }
        files.push((rel, path.to_path_buf()));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    debug!(root = %config.root.display(), count = files.len(), "scan collected files");

    let mut scanned = Vec::with_capacity(files.len());
    let mut languages: BTreeMap<String, LanguageSummary> = BTreeMap::new();
    let mut directories: BTreeMap<String, DirectorySummary> = BTreeMap::new();
    let mut totals = ScanTotals::default();

    for (rel, abs) in files {
        let detection = detector::detect_language(&abs)?;
        let size = std::fs::metadata(&abs).map(|m| m.len()).unwrap_or(0);
        let language = detection.language;

        let file_metrics = if language != Language::Unknown {
            match std::fs::read(&abs) {
                Ok(bytes) => {
                    let content = String::from_utf8_lossy(&bytes);
                    Some(metrics::compute_metrics(&content, language))
                }
                Err(e) => {
                    warn!(path = %rel, "failed to read file for metrics: {e}");
                    None
                }
            }
        } else {
            None
        };

        if let Some(m) = &file_metrics {
            totals.total_lines += m.total_lines;
            totals.code_lines += m.code_lines;
            totals.comment_lines += m.comment_lines;
            totals.blank_lines += m.blank_lines;

            let summary = languages.entry(language.as_str().to_string()).or_default();
            summary.file_count += 1;
            summary.total_lines += m.total_lines;
            summary.code_lines += m.code_lines;
            summary.comment_lines += m.comment_lines;
            summary.blank_lines += m.blank_lines;
            summary.total_complexity += u64::from(m.cyclomatic_complexity);
            summary.max_complexity = summary.max_complexity.max(m.cyclomatic_complexity);

            let dir = {
                let parent = paths::parent(&rel);
                if parent.is_empty() {
                    ".".to_string()
                } else {
                    parent.to_string()
                }
            };
            let dir_summary = directories.entry(dir).or_default();
            dir_summary.file_count += 1;
            dir_summary.code_lines += m.code_lines;
            let lang_name = language.as_str().to_string();
            if !dir_summary.languages.contains(&lang_name) {
                dir_summary.languages.push(lang_name);
                dir_summary.languages.sort();
            }
        }
        totals.file_count += 1;

        scanned.push(ScannedFile {
            node: FileNode {
                path: rel,
                language,
                extension: detection.extension.clone(),
                size,
            },
            detection,
            metrics: file_metrics,
        });
    }

    for summary in languages.values_mut() {
        if summary.file_count > 0 {
            summary.avg_complexity = summary.total_complexity as f64 / summary.file_count as f64;
        }
    }

    Ok(ScanResult {
        root: paths::to_posix(&config.root),
        files: scanned,
        languages,
        directories,
        totals,
    })
}
