// ABOUTME: Change-procedure generator: the ordered end-to-end steps for landing a change.

use crate::naming::ChangeType;
use serde::{Deserialize, Serialize};
use specgraph_analysis::RegressionScope;
use specgraph_core::RiskLevel;

pub const DEFAULT_MAX_STEPS: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureStep {
    pub order: usize,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeProcedure {
    pub objective: String,
    pub change_type: ChangeType,
    pub steps: Vec<ProcedureStep>,
    pub step_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ProcedureRequest {
    pub objective: String,
    pub change_type: Option<ChangeType>,
    pub risk_level: Option<RiskLevel>,
    pub regression_scope: Option<RegressionScope>,
    pub has_breaking_changes: bool,
    pub max_steps: Option<usize>,
}

/// Generate the ordered procedure for landing a change, composed from the
/// lower-level analysis signals.
pub fn generate_procedure(request: &ProcedureRequest) -> ChangeProcedure {
    let change_type = request.change_type.unwrap_or(ChangeType::Feature);
    let mut steps: Vec<(String, String, Option<String>)> = Vec::new();

    steps.push((
        "Scope the change".to_string(),
        format!(
            "Identify the files and components involved in: {}",
            request.objective
        ),
        Some("analyze_change_scope".to_string()),
    ));
    steps.push((
        "Classify the change set".to_string(),
        "Diff the working tree or target refs into create/modify/delete groups".to_string(),
        Some("classify_file_impact".to_string()),
    ));
    steps.push((
        "Trace downstream impact".to_string(),
        "Walk reverse dependencies from the changed files to find affected consumers".to_string(),
        Some("trace_downstream_dependencies".to_string()),
    ));
    if request.has_breaking_changes {
        steps.push((
            "Review contract breaks".to_string(),
            "Enumerate removed or re-signed public symbols and notify consumers".to_string(),
            Some("detect_breaking_changes".to_string()),
        ));
    }
    steps.push((
        "Assess risk".to_string(),
        "Aggregate change, contract, type, and test signals into a risk level".to_string(),
        Some("assess_change_risk".to_string()),
    ));
    steps.push((
        "Create the working branch".to_string(),
        "Branch from the base using the generated naming convention".to_string(),
        Some("generate_git_workflow".to_string()),
    ));
    steps.push((
        "Implement in planned commits".to_string(),
        "Land contract changes first, then implementation by scope, then tests".to_string(),
        Some("plan_commit_sequence".to_string()),
    ));

    let test_description = match request.regression_scope {
        Some(RegressionScope::FullSuite) => {
            "Run the full test suite; the change set is too broad to target".to_string()
        }
        Some(RegressionScope::BroadRegression) => {
            "Run impacted suites plus the broad regression set".to_string()
        }
        Some(RegressionScope::TargetedRegression) => {
            "Run the impacted and related tests".to_string()
        }
        _ => "Run the smoke suite".to_string(),
    };
    steps.push((
        "Validate with tests".to_string(),
        test_description,
        Some("assess_test_impact".to_string()),
    ));

    if matches!(
        request.risk_level,
        Some(RiskLevel::High) | Some(RiskLevel::Critical)
    ) || request.has_breaking_changes
    {
        steps.push((
            "Stage the rollout".to_string(),
            "Ship behind a flag with phased exposure and a rehearsed rollback".to_string(),
            Some("generate_rollout_plan".to_string()),
        ));
    }
    steps.push((
        "Merge and monitor".to_string(),
        "Merge per the workflow policy and watch the validation gates".to_string(),
        None,
    ));

    let cap = request.max_steps.unwrap_or(DEFAULT_MAX_STEPS).max(1);
    let truncated: Vec<ProcedureStep> = steps
        .into_iter()
        .take(cap)
        .enumerate()
        .map(|(idx, (title, description, tool_hint))| ProcedureStep {
            order: idx + 1,
            title,
            description,
            tool_hint,
        })
        .collect();

    ChangeProcedure {
        objective: request.objective.clone(),
        change_type,
        step_count: truncated.len(),
        steps: truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_procedure_is_ordered() {
        let procedure = generate_procedure(&ProcedureRequest {
            objective: "add export".to_string(),
            ..Default::default()
        });
        let orders: Vec<usize> = procedure.steps.iter().map(|s| s.order).collect();
        let expected: Vec<usize> = (1..=procedure.step_count).collect();
        assert_eq!(orders, expected);
        assert!(procedure.steps.iter().any(|s| s.title == "Assess risk"));
    }

    #[test]
    fn breaking_changes_add_contract_review() {
        let procedure = generate_procedure(&ProcedureRequest {
            objective: "drop legacy endpoint".to_string(),
            has_breaking_changes: true,
            ..Default::default()
        });
        assert!(procedure
            .steps
            .iter()
            .any(|s| s.title == "Review contract breaks"));
        assert!(procedure
            .steps
            .iter()
            .any(|s| s.title == "Stage the rollout"));
    }

    #[test]
    fn regression_scope_shapes_test_step() {
        let procedure = generate_procedure(&ProcedureRequest {
            objective: "x".to_string(),
            regression_scope: Some(RegressionScope::FullSuite),
            ..Default::default()
        });
        let test_step = procedure
            .steps
            .iter()
            .find(|s| s.title == "Validate with tests")
            .unwrap();
        assert!(test_step.description.contains("full test suite"));
    }

    #[test]
    fn max_steps_caps_output() {
        let procedure = generate_procedure(&ProcedureRequest {
            objective: "x".to_string(),
            max_steps: Some(3),
            ..Default::default()
        });
        assert_eq!(procedure.step_count, 3);
    }
}
