// ABOUTME: Test-impact assessor: classifies tests, relates them to changed sources by
// ABOUTME: path-token overlap, and sizes the regression scope.

use serde::{Deserialize, Serialize};
use specgraph_core::{hints, paths};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionScope {
    Smoke,
    TargetedRegression,
    BroadRegression,
    FullSuite,
}

impl RegressionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegressionScope::Smoke => "smoke",
            RegressionScope::TargetedRegression => "targeted_regression",
            RegressionScope::BroadRegression => "broad_regression",
            RegressionScope::FullSuite => "full_suite",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestImpactReport {
    pub test_file_count: usize,
    pub directly_changed_tests: Vec<String>,
    pub downstream_impacted_tests: Vec<String>,
    pub related_tests: BTreeMap<String, Vec<String>>,
    pub impacted_tests: Vec<String>,
    pub coverage_gaps: Vec<String>,
    pub regression_scope: RegressionScope,
}

/// A file is a test when a path segment is a test directory, the file name
/// carries a known test suffix, or the stem is test-shaped.
pub fn is_test_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    if paths::segments(&lower)
        .iter()
        .rev()
        .skip(1)
        .any(|segment| hints::TEST_DIR_HINTS.contains(&segment.as_str()))
    {
        return true;
    }
    let name = lower.rsplit('/').next().unwrap_or(&lower);
    if hints::TEST_FILE_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
    {
        return true;
    }
    let stem = paths::stem(&lower);
    stem.starts_with("test_") || stem.ends_with("_test") || stem.ends_with("_spec")
}

/// Meaningful path tokens for relating sources to tests: length >= 3,
/// excluding noise tokens and the test-directory set.
pub fn path_tokens(path: &str) -> BTreeSet<String> {
    path.split(|c: char| !c.is_ascii_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| t.len() >= hints::MIN_RELATION_TOKEN_LEN)
        .filter(|t| !hints::NOISE_TOKENS.contains(&t.as_str()))
        .filter(|t| !hints::TEST_DIR_HINTS.contains(&t.as_str()))
        .collect()
}

/// Assess which tests a change set impacts. `all_files` is the scoped
/// repository listing; `downstream` the traced dependent paths.
pub fn assess_test_impact(
    changed_files: &[String],
    downstream: &[String],
    all_files: &[String],
) -> TestImpactReport {
    let test_files: Vec<&String> = all_files.iter().filter(|f| is_test_file(f)).collect();

    let directly_changed_tests: BTreeSet<String> = changed_files
        .iter()
        .filter(|f| is_test_file(f))
        .cloned()
        .collect();

    let downstream_impacted_tests: BTreeSet<String> = downstream
        .iter()
        .filter(|f| is_test_file(f))
        .cloned()
        .collect();

    let changed_sources: Vec<&String> = changed_files
        .iter()
        .filter(|f| !is_test_file(f))
        .collect();

    let mut related_tests: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for source in &changed_sources {
        let source_tokens = path_tokens(source);
        if source_tokens.is_empty() {
            continue;
        }
        let mut matches: Vec<String> = Vec::new();
        for test in &test_files {
            let test_tokens = path_tokens(test);
            if source_tokens.intersection(&test_tokens).next().is_some() {
                matches.push((*test).clone());
            }
        }
        if !matches.is_empty() {
            matches.sort();
            related_tests.insert((*source).clone(), matches);
        }
    }

    let mut impacted: BTreeSet<String> = BTreeSet::new();
    impacted.extend(directly_changed_tests.iter().cloned());
    impacted.extend(downstream_impacted_tests.iter().cloned());
    for tests in related_tests.values() {
        impacted.extend(tests.iter().cloned());
    }

    let coverage_gaps: Vec<String> = changed_sources
        .iter()
        .filter(|source| {
            !related_tests.contains_key(**source)
                && !downstream_impacted_tests
                    .iter()
                    .any(|t| path_tokens(t).intersection(&path_tokens(source)).next().is_some())
        })
        .map(|s| (*s).clone())
        .collect();

    let impacted_count = impacted.len();
    let changed_count = changed_files.len();
    let gap_count = coverage_gaps.len();
    let regression_scope = if impacted_count >= 40 || changed_count >= 25 {
        RegressionScope::FullSuite
    } else if impacted_count >= 10 || changed_count >= 8 || gap_count >= 5 {
        RegressionScope::BroadRegression
    } else if impacted_count > 0 || changed_count > 0 {
        RegressionScope::TargetedRegression
    } else {
        RegressionScope::Smoke
    };

    TestImpactReport {
        test_file_count: test_files.len(),
        directly_changed_tests: directly_changed_tests.into_iter().collect(),
        downstream_impacted_tests: downstream_impacted_tests.into_iter().collect(),
        related_tests,
        impacted_tests: impacted.into_iter().collect(),
        coverage_gaps,
        regression_scope,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_file_classification() {
        assert!(is_test_file("tests/test_users.py"));
        assert!(is_test_file("src/users.test.ts"));
        assert!(is_test_file("src/__tests__/orders.ts"));
        assert!(is_test_file("features/login.feature"));
        assert!(is_test_file("spec/models/user_spec.rb"));
        assert!(!is_test_file("src/users.ts"));
        assert!(!is_test_file("src/contest.py"));
    }

    #[test]
    fn related_tests_by_token_overlap() {
        let changed = strings(&["src/users/service.py"]);
        let all = strings(&[
            "src/users/service.py",
            "tests/test_users.py",
            "tests/test_orders.py",
        ]);
        let report = assess_test_impact(&changed, &[], &all);
        assert_eq!(
            report.related_tests["src/users/service.py"],
            vec!["tests/test_users.py"]
        );
        assert_eq!(report.impacted_tests, vec!["tests/test_users.py"]);
        assert!(report.coverage_gaps.is_empty());
    }

    #[test]
    fn coverage_gap_when_nothing_relates() {
        let changed = strings(&["src/billing/invoice.py"]);
        let all = strings(&["src/billing/invoice.py", "tests/test_users.py"]);
        let report = assess_test_impact(&changed, &[], &all);
        assert_eq!(report.coverage_gaps, vec!["src/billing/invoice.py"]);
        assert_eq!(report.regression_scope, RegressionScope::TargetedRegression);
    }

    #[test]
    fn noise_tokens_do_not_relate() {
        // "src" and "index" are noise; they must not link unrelated files.
        let changed = strings(&["src/index.ts"]);
        let all = strings(&["src/index.ts", "tests/utils.test.ts"]);
        let report = assess_test_impact(&changed, &[], &all);
        assert!(report.related_tests.is_empty());
    }

    #[test]
    fn regression_scope_thresholds() {
        let changed: Vec<String> = (0..25).map(|i| format!("src/mod{i}.py")).collect();
        let report = assess_test_impact(&changed, &[], &changed);
        assert_eq!(report.regression_scope, RegressionScope::FullSuite);

        let changed: Vec<String> = (0..8).map(|i| format!("src/mod{i}.py")).collect();
        let report = assess_test_impact(&changed, &[], &changed);
        assert_eq!(report.regression_scope, RegressionScope::BroadRegression);

        let report = assess_test_impact(&[], &[], &[]);
        assert_eq!(report.regression_scope, RegressionScope::Smoke);
    }

    #[test]
    fn downstream_tests_count_as_impacted() {
        let changed = strings(&["src/core_lib.py"]);
        let downstream = strings(&["tests/test_core_lib.py"]);
        let all = strings(&["src/core_lib.py", "tests/test_core_lib.py"]);
        let report = assess_test_impact(&changed, &downstream, &all);
        assert!(report
            .impacted_tests
            .contains(&"tests/test_core_lib.py".to_string()));
    }
}
