// ABOUTME: Rollback-plan generator: triggers plus ordered recovery steps.

use serde::{Deserialize, Serialize};
use specgraph_core::RiskLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackStep {
    pub order: usize,
    pub action: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackPlan {
    pub triggers: Vec<String>,
    pub steps: Vec<RollbackStep>,
    pub data_safety_checks: Vec<String>,
    pub estimated_recovery: String,
}

#[derive(Debug, Clone, Default)]
pub struct RollbackRequest {
    pub risk_level: Option<RiskLevel>,
    pub uses_feature_flag: bool,
    pub has_schema_changes: bool,
    pub include_data_safety_checks: bool,
    pub deployment_environment: Option<String>,
}

/// Generate the rollback plan. The step order is fixed: stop exposure
/// first, then revert code, then verify, then communicate.
pub fn generate_rollback_plan(request: &RollbackRequest) -> RollbackPlan {
    let mut triggers = vec![
        "Error rate exceeds the pre-change baseline by 2x for 10 minutes".to_string(),
        "Health checks fail on any instance after deploy".to_string(),
        "P95 latency regresses by more than 50%".to_string(),
    ];
    if request.has_schema_changes {
        triggers.push("Migration failures or data integrity alerts".to_string());
    }
    if matches!(
        request.risk_level,
        Some(RiskLevel::High) | Some(RiskLevel::Critical)
    ) {
        triggers.push("Any customer-reported breakage attributable to the change".to_string());
    }

    let mut actions: Vec<(String, String)> = Vec::new();
    actions.push((
        "pause_rollout".to_string(),
        "Halt any in-progress phased rollout".to_string(),
    ));
    if request.uses_feature_flag {
        actions.push((
            "disable_flag".to_string(),
            "Flip the kill switch; exposure drops to 0% without a deploy".to_string(),
        ));
    }
    actions.push((
        "revert_commits".to_string(),
        "Revert the change commits on the base branch (git revert, no force-push)".to_string(),
    ));
    if request.has_schema_changes {
        actions.push((
            "restore_schema_compatibility".to_string(),
            "Run the contract phase only after confirming no consumers read the old shape"
                .to_string(),
        ));
    }
    actions.push((
        "redeploy_previous".to_string(),
        "Deploy the last known-good build".to_string(),
    ));
    actions.push((
        "verify_recovery".to_string(),
        "Confirm error rates and latency return to baseline".to_string(),
    ));
    actions.push((
        "communicate".to_string(),
        "Notify stakeholders and open an incident review".to_string(),
    ));

    let steps = actions
        .into_iter()
        .enumerate()
        .map(|(idx, (action, detail))| RollbackStep {
            order: idx + 1,
            action,
            detail,
        })
        .collect();

    let data_safety_checks = if request.include_data_safety_checks {
        vec![
            "Snapshot the database before applying migrations".to_string(),
            "Verify dual-written data matches before contract phase".to_string(),
            "Keep reversible migrations for one release cycle".to_string(),
        ]
    } else {
        Vec::new()
    };

    let estimated_recovery = if request.uses_feature_flag {
        "minutes (flag flip)".to_string()
    } else if request.has_schema_changes {
        "hours (schema restore involved)".to_string()
    } else {
        "under an hour (revert and redeploy)".to_string()
    };

    RollbackPlan {
        triggers,
        steps,
        data_safety_checks,
        estimated_recovery,
    }
}
