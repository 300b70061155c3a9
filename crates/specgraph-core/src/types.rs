use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed language set recognized across the toolchain. Non-code siblings
/// (json, yaml, markdown, ...) participate in metrics and contract-surface
/// extraction only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Go,
    CSharp,
    Rust,
    Php,
    Ruby,
    C,
    Cpp,
    Json,
    Yaml,
    Markdown,
    Html,
    Css,
    Shell,
    Sql,
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Go => "go",
            Language::CSharp => "csharp",
            Language::Rust => "rust",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Markdown => "markdown",
            Language::Html => "html",
            Language::Css => "css",
            Language::Shell => "shell",
            Language::Sql => "sql",
            Language::Unknown => "unknown",
        }
    }

    /// Languages the analysis pipeline targets for symbol extraction.
    pub fn is_target(&self) -> bool {
        matches!(
            self,
            Language::TypeScript
                | Language::JavaScript
                | Language::Python
                | Language::Java
                | Language::Go
                | Language::CSharp
                | Language::Rust
                | Language::Php
                | Language::Ruby
        )
    }

    /// Languages eligible for the type-aware analyzer.
    pub fn is_statically_typed(&self) -> bool {
        matches!(
            self,
            Language::TypeScript
                | Language::Java
                | Language::Go
                | Language::CSharp
                | Language::Rust
                | Language::C
                | Language::Cpp
        )
    }

    /// Languages eligible for the dynamic-construct analyzer.
    pub fn is_dynamic(&self) -> bool {
        matches!(
            self,
            Language::Python | Language::JavaScript | Language::Php | Language::Ruby
        )
    }

    /// Languages whose import syntax supports filesystem-relative modules.
    pub fn supports_relative_imports(&self) -> bool {
        matches!(
            self,
            Language::TypeScript | Language::JavaScript | Language::Php | Language::Ruby
        )
    }

    pub fn is_code(&self) -> bool {
        !matches!(
            self,
            Language::Json
                | Language::Yaml
                | Language::Markdown
                | Language::Html
                | Language::Css
                | Language::Sql
                | Language::Unknown
        )
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lang = match s.trim().to_lowercase().as_str() {
            "python" | "py" => Language::Python,
            "javascript" | "js" | "jsx" => Language::JavaScript,
            "typescript" | "ts" | "tsx" => Language::TypeScript,
            "java" => Language::Java,
            "go" | "golang" => Language::Go,
            "csharp" | "c#" | "c_sharp" => Language::CSharp,
            "rust" | "rs" => Language::Rust,
            "php" => Language::Php,
            "ruby" | "rb" => Language::Ruby,
            "c" => Language::C,
            "cpp" | "c++" | "cxx" => Language::Cpp,
            "json" => Language::Json,
            "yaml" | "yml" => Language::Yaml,
            "markdown" | "md" => Language::Markdown,
            "html" => Language::Html,
            "css" => Language::Css,
            "shell" | "sh" | "bash" => Language::Shell,
            "sql" => Language::Sql,
            _ => Language::Unknown,
        };
        Ok(lang)
    }
}

/// Severity levels for findings, ordered most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate risk levels, ordered most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "critical",
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-file change impact. Merge priority when multiple raw git statuses
/// land on one path: delete > create > modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactKind {
    Create,
    Modify,
    Delete,
}

impl ImpactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactKind::Create => "create",
            ImpactKind::Modify => "modify",
            ImpactKind::Delete => "delete",
        }
    }

    fn priority(&self) -> u8 {
        match self {
            ImpactKind::Delete => 2,
            ImpactKind::Create => 1,
            ImpactKind::Modify => 0,
        }
    }

    /// Merge two impact signals on the same path.
    pub fn merge(self, other: ImpactKind) -> ImpactKind {
        if other.priority() > self.priority() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for ImpactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cyclomatic-complexity bucket. Thresholds: <=10 / <=20 / <=40 / else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityLevel {
    pub fn from_complexity(cc: u32) -> Self {
        match cc {
            0..=10 => ComplexityLevel::Low,
            11..=20 => ComplexityLevel::Medium,
            21..=40 => ComplexityLevel::High,
            _ => ComplexityLevel::VeryHigh,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityLevel::Low => "low",
            ComplexityLevel::Medium => "medium",
            ComplexityLevel::High => "high",
            ComplexityLevel::VeryHigh => "very_high",
        }
    }
}

/// A file node within a repository scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub path: String,
    pub language: Language,
    pub extension: String,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_roundtrip_aliases() {
        assert_eq!("ts".parse::<Language>().unwrap(), Language::TypeScript);
        assert_eq!("c#".parse::<Language>().unwrap(), Language::CSharp);
        assert_eq!("c_sharp".parse::<Language>().unwrap(), Language::CSharp);
        assert_eq!("weird".parse::<Language>().unwrap(), Language::Unknown);
    }

    #[test]
    fn target_set_matches_detector_contract() {
        for lang in [
            Language::TypeScript,
            Language::JavaScript,
            Language::Python,
            Language::Java,
            Language::Go,
            Language::CSharp,
            Language::Rust,
            Language::Php,
            Language::Ruby,
        ] {
            assert!(lang.is_target(), "{lang} should be a target language");
        }
        assert!(!Language::C.is_target());
        assert!(!Language::Json.is_target());
    }

    #[test]
    fn impact_merge_priority() {
        assert_eq!(
            ImpactKind::Modify.merge(ImpactKind::Delete),
            ImpactKind::Delete
        );
        assert_eq!(
            ImpactKind::Create.merge(ImpactKind::Modify),
            ImpactKind::Create
        );
        assert_eq!(
            ImpactKind::Delete.merge(ImpactKind::Create),
            ImpactKind::Delete
        );
    }

    #[test]
    fn complexity_thresholds() {
        assert_eq!(ComplexityLevel::from_complexity(10), ComplexityLevel::Low);
        assert_eq!(
            ComplexityLevel::from_complexity(11),
            ComplexityLevel::Medium
        );
        assert_eq!(ComplexityLevel::from_complexity(40), ComplexityLevel::High);
        assert_eq!(
            ComplexityLevel::from_complexity(41),
            ComplexityLevel::VeryHigh
        );
    }

    #[test]
    fn severity_orders_most_severe_first() {
        let mut severities = vec![Severity::Low, Severity::Critical, Severity::Medium];
        severities.sort();
        assert_eq!(
            severities,
            vec![Severity::Critical, Severity::Medium, Severity::Low]
        );
    }
}
