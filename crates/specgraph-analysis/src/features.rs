// ABOUTME: Groups impacted files into product-feature buckets with communication priority.

use serde::{Deserialize, Serialize};
use specgraph_core::{paths, ImpactKind};
use specgraph_git::ChangeClassification;
use std::collections::BTreeMap;

pub const DEFAULT_MAX_FEATURES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureBucket {
    pub feature: String,
    pub files: Vec<String>,
    pub file_count: usize,
    pub has_deletions: bool,
    pub communication_priority: CommunicationPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub features: Vec<FeatureBucket>,
    pub unattributed: Vec<String>,
    pub truncated: bool,
}

/// Keyword table mapping path tokens to product features.
const FEATURE_KEYWORDS: &[(&str, &[&str])] = &[
    ("authentication", &["auth", "login", "session", "oauth", "token"]),
    ("billing", &["billing", "payment", "invoice", "subscription", "checkout"]),
    ("user-management", &["user", "users", "account", "profile", "member"]),
    ("search", &["search", "query", "filter"]),
    ("notifications", &["notification", "email", "webhook", "alert"]),
    ("reporting", &["report", "export", "analytics", "metrics", "dashboard"]),
    ("admin", &["admin", "settings", "config"]),
    ("api", &["api", "endpoint", "routes", "controller", "handler"]),
    ("data-layer", &["db", "database", "migration", "repository", "storage", "model"]),
    ("frontend", &["ui", "component", "view", "page", "frontend"]),
];

/// Features whose changes always warrant a high-priority communication.
const SENSITIVE_FEATURES: &[&str] = &["authentication", "billing", "api", "data-layer"];

fn feature_for_path(path: &str) -> Option<&'static str> {
    let tokens: Vec<String> = path
        .split(|c: char| !c.is_ascii_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    for (feature, keywords) in FEATURE_KEYWORDS {
        if tokens.iter().any(|t| keywords.contains(&t.as_str())) {
            return Some(feature);
        }
    }
    None
}

/// Attribute changed files to product features. Files that match no
/// keyword fall back to their first path segment; leftovers are reported
/// as unattributed.
pub fn attribute_features(
    classification: &ChangeClassification,
    max_features: usize,
) -> FeatureAttribution {
    let mut buckets: BTreeMap<String, (Vec<String>, bool)> = BTreeMap::new();
    let mut unattributed: Vec<String> = Vec::new();

    for file in &classification.files {
        let is_delete = file.impact == ImpactKind::Delete;
        let feature = feature_for_path(&file.path).map(|f| f.to_string()).or_else(|| {
            let segments = paths::segments(&file.path);
            if segments.len() > 1 {
                Some(segments[0].clone())
            } else {
                None
            }
        });
        match feature {
            Some(feature) => {
                let bucket = buckets.entry(feature).or_insert_with(|| (Vec::new(), false));
                bucket.0.push(file.path.clone());
                bucket.1 |= is_delete;
            }
            None => unattributed.push(file.path.clone()),
        }
    }

    let mut features: Vec<FeatureBucket> = buckets
        .into_iter()
        .map(|(feature, (mut files, has_deletions))| {
            files.sort();
            let communication_priority = if SENSITIVE_FEATURES.contains(&feature.as_str())
                || has_deletions
            {
                CommunicationPriority::High
            } else if files.len() >= 3 {
                CommunicationPriority::Medium
            } else {
                CommunicationPriority::Low
            };
            FeatureBucket {
                feature,
                file_count: files.len(),
                files,
                has_deletions,
                communication_priority,
            }
        })
        .collect();

    // Largest buckets first; ties stay alphabetical.
    features.sort_by(|a, b| {
        b.file_count
            .cmp(&a.file_count)
            .then_with(|| a.feature.cmp(&b.feature))
    });
    let truncated = features.len() > max_features;
    features.truncate(max_features);
    unattributed.sort();

    FeatureAttribution {
        features,
        unattributed,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specgraph_git::FileImpact;

    fn classification_of(paths: &[(&str, ImpactKind)]) -> ChangeClassification {
        let files: Vec<FileImpact> = paths
            .iter()
            .map(|(path, impact)| FileImpact {
                path: path.to_string(),
                impact: *impact,
                raw_statuses: vec!["M".to_string()],
                old_path: None,
            })
            .collect();
        ChangeClassification {
            mode: "working_tree".to_string(),
            base_ref: None,
            target_ref: None,
            create: Vec::new(),
            modify: files.iter().map(|f| f.path.clone()).collect(),
            delete: Vec::new(),
            files,
        }
    }

    #[test]
    fn keyword_buckets_and_priorities() {
        let classification = classification_of(&[
            ("src/auth/login.py", ImpactKind::Modify),
            ("src/auth/session.py", ImpactKind::Modify),
            ("src/reports/export.py", ImpactKind::Modify),
        ]);
        let attribution = attribute_features(&classification, DEFAULT_MAX_FEATURES);
        let auth = attribution
            .features
            .iter()
            .find(|f| f.feature == "authentication")
            .unwrap();
        assert_eq!(auth.file_count, 2);
        assert_eq!(auth.communication_priority, CommunicationPriority::High);
        let reporting = attribution
            .features
            .iter()
            .find(|f| f.feature == "reporting")
            .unwrap();
        assert_eq!(reporting.communication_priority, CommunicationPriority::Low);
    }

    #[test]
    fn deletions_raise_priority() {
        let classification = classification_of(&[("docs/guide.md", ImpactKind::Delete)]);
        let attribution = attribute_features(&classification, DEFAULT_MAX_FEATURES);
        assert_eq!(
            attribution.features[0].communication_priority,
            CommunicationPriority::High
        );
    }

    #[test]
    fn unmatched_files_fall_back_to_first_segment() {
        let classification = classification_of(&[("weirdplace/thing.xyz", ImpactKind::Modify)]);
        let attribution = attribute_features(&classification, DEFAULT_MAX_FEATURES);
        assert_eq!(attribution.features[0].feature, "weirdplace");
    }

    #[test]
    fn max_features_truncates() {
        let paths: Vec<(String, ImpactKind)> = (0..6)
            .map(|i| (format!("area{i}/file.py"), ImpactKind::Modify))
            .collect();
        let refs: Vec<(&str, ImpactKind)> =
            paths.iter().map(|(p, i)| (p.as_str(), *i)).collect();
        let classification = classification_of(&refs);
        let attribution = attribute_features(&classification, 3);
        assert_eq!(attribution.features.len(), 3);
        assert!(attribution.truncated);
    }
}
