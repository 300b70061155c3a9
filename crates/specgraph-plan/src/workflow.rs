// ABOUTME: Git workflow generator: branch naming, PR template, required checks, merge policy.

use crate::naming::{branch_name, normalize_ticket, resolve_change_type, ChangeSignals, ChangeType};
use serde::{Deserialize, Serialize};
use specgraph_core::RiskLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchNaming {
    pub prefix: String,
    pub branch_name: String,
    pub base_branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrTemplate {
    pub title: String,
    pub sections: Vec<String>,
    pub checklist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergePolicy {
    pub strategy: String,
    pub delete_branch_after_merge: bool,
    pub require_up_to_date: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitWorkflow {
    pub change_type: ChangeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,
    pub branch_naming: BranchNaming,
    pub pr_template: PrTemplate,
    pub required_checks: Vec<String>,
    pub merge_policy: MergePolicy,
    pub workflow_model: String,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowRequest {
    pub objective: String,
    pub ticket_id: Option<String>,
    pub change_type: Option<String>,
    pub base_branch: Option<String>,
    pub signals: ChangeSignals,
}

/// Generate the git workflow for a change. Breaking changes force a
/// merge-commit strategy behind release gates; everything else squashes
/// onto trunk.
pub fn generate_git_workflow(request: &WorkflowRequest) -> GitWorkflow {
    let change_type = resolve_change_type(request.change_type.as_deref(), &request.signals);
    let ticket = normalize_ticket(request.ticket_id.as_deref());
    let base_branch = request
        .base_branch
        .clone()
        .filter(|b| !b.trim().is_empty())
        .unwrap_or_else(|| "main".to_string());
    let branch = branch_name(change_type, request.ticket_id.as_deref(), &request.objective);

    let is_breaking = change_type == ChangeType::Breaking;
    let high_risk = matches!(
        request.signals.risk_level,
        Some(RiskLevel::High) | Some(RiskLevel::Critical)
    );

    let mut required_checks = vec![
        "lint".to_string(),
        "unit tests".to_string(),
        "build".to_string(),
    ];
    if is_breaking {
        required_checks.push("API/contract compatibility review".to_string());
    }
    if high_risk || is_breaking {
        required_checks.push("full regression suite".to_string());
    }

    let merge_policy = if is_breaking {
        MergePolicy {
            strategy: "merge-commit".to_string(),
            delete_branch_after_merge: true,
            require_up_to_date: true,
        }
    } else {
        MergePolicy {
            strategy: "squash".to_string(),
            delete_branch_after_merge: true,
            require_up_to_date: high_risk,
        }
    };

    let workflow_model = if is_breaking {
        "trunk-based-with-release-gates".to_string()
    } else {
        "trunk-based".to_string()
    };

    let title = match &ticket {
        Some(ticket) => format!("[{ticket}] {}", request.objective),
        None => request.objective.clone(),
    };
    let mut sections = vec![
        "## Summary".to_string(),
        "## Changes".to_string(),
        "## Testing".to_string(),
    ];
    if is_breaking {
        sections.push("## Breaking changes and migration notes".to_string());
    }
    let mut checklist = vec![
        "Tests cover the changed behavior".to_string(),
        "Documentation updated where needed".to_string(),
    ];
    if is_breaking {
        checklist.push("Downstream consumers notified of contract changes".to_string());
    }
    if high_risk {
        checklist.push("Rollback plan linked".to_string());
    }

    GitWorkflow {
        change_type,
        branch_naming: BranchNaming {
            prefix: change_type.as_str().to_string(),
            branch_name: branch,
            base_branch,
        },
        pr_template: PrTemplate {
            title,
            sections,
            checklist,
        },
        required_checks,
        merge_policy,
        workflow_model,
        ticket,
    }
}
