// ABOUTME: Multi-phase rollout planner: complexity/risk profile chooses the phase count,
// ABOUTME: each phase carries entry criteria, actions, validation gates, and exit criteria.

use serde::{Deserialize, Serialize};
use specgraph_core::{ComplexityLevel, RiskLevel};

pub const DEFAULT_MAX_PHASES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutPhase {
    pub phase_number: usize,
    pub name: String,
    pub exposure_percent: u8,
    pub entry_criteria: Vec<String>,
    pub actions: Vec<String>,
    pub validation_gates: Vec<String>,
    pub exit_criteria: Vec<String>,
    pub min_observation_window: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutPlan {
    pub complexity_profile: String,
    pub phase_count: usize,
    pub phases: Vec<RolloutPhase>,
    pub environments: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RolloutRequest {
    pub complexity_level: Option<ComplexityLevel>,
    pub risk_level: Option<RiskLevel>,
    pub environments: Vec<String>,
    pub max_phases: Option<usize>,
}

fn profile(complexity: Option<ComplexityLevel>, risk: Option<RiskLevel>) -> (String, usize) {
    let complexity_rank = match complexity {
        Some(ComplexityLevel::VeryHigh) => 3,
        Some(ComplexityLevel::High) => 2,
        Some(ComplexityLevel::Medium) => 1,
        _ => 0,
    };
    let risk_rank = match risk {
        Some(RiskLevel::Critical) => 3,
        Some(RiskLevel::High) => 2,
        Some(RiskLevel::Medium) => 1,
        _ => 0,
    };
    match complexity_rank.max(risk_rank) {
        3 => ("complex_high_risk".to_string(), 5),
        2 => ("elevated".to_string(), 4),
        1 => ("standard".to_string(), 3),
        _ => ("simple".to_string(), 2),
    }
}

fn exposure_for(phase: usize, total: usize) -> u8 {
    if phase == total {
        return 100;
    }
    match (total, phase) {
        (5, 1) => 1,
        (5, 2) => 10,
        (5, 3) => 25,
        (5, 4) => 50,
        (4, 1) => 5,
        (4, 2) => 25,
        (4, 3) => 50,
        (3, 1) => 10,
        (3, 2) => 50,
        (2, 1) => 25,
        _ => 50,
    }
}

fn window_for(risk: Option<RiskLevel>, is_final: bool) -> String {
    let base = match risk {
        Some(RiskLevel::Critical) => "48h",
        Some(RiskLevel::High) => "24h",
        Some(RiskLevel::Medium) => "12h",
        _ => "4h",
    };
    if is_final {
        "24h".to_string()
    } else {
        base.to_string()
    }
}

/// Plan a phased rollout. The `(complexity, risk)` profile picks the phase
/// count; `max_phases` caps it.
pub fn generate_rollout_plan(request: &RolloutRequest) -> RolloutPlan {
    let (complexity_profile, natural_count) =
        profile(request.complexity_level, request.risk_level);
    let cap = request.max_phases.unwrap_or(DEFAULT_MAX_PHASES).max(1);
    let phase_count = natural_count.min(cap);

    let environments = if request.environments.is_empty() {
        vec!["staging".to_string(), "production".to_string()]
    } else {
        request.environments.clone()
    };

    let phases: Vec<RolloutPhase> = (1..=phase_count)
        .map(|n| {
            let is_first = n == 1;
            let is_final = n == phase_count;
            let exposure = exposure_for(n, phase_count);
            let name = if is_first {
                "canary".to_string()
            } else if is_final {
                "general_availability".to_string()
            } else {
                format!("expansion_{}", n - 1)
            };

            let mut entry_criteria = if is_first {
                vec![
                    "All required checks green on the release branch".to_string(),
                    "Rollback plan reviewed and actionable".to_string(),
                ]
            } else {
                vec![format!("Phase {} exit criteria met", n - 1)]
            };
            if is_final {
                entry_criteria.push("No open incidents attributable to this change".to_string());
            }

            let actions = vec![
                format!("Raise exposure to {exposure}% in {}", environments.last().map(String::as_str).unwrap_or("production")),
                "Announce the phase in the release channel".to_string(),
            ];
            let validation_gates = vec![
                "Error rate within baseline envelope".to_string(),
                "Latency within baseline envelope".to_string(),
                "No elevated support volume".to_string(),
            ];
            let exit_criteria = vec![format!(
                "Validation gates hold for the full observation window at {exposure}% exposure"
            )];

            RolloutPhase {
                phase_number: n,
                name,
                exposure_percent: exposure,
                entry_criteria,
                actions,
                validation_gates,
                exit_criteria,
                min_observation_window: window_for(request.risk_level, is_final),
            }
        })
        .collect();

    RolloutPlan {
        complexity_profile,
        phase_count,
        phases,
        environments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_scales_with_risk_and_complexity() {
        let simple = generate_rollout_plan(&RolloutRequest::default());
        assert_eq!(simple.phase_count, 2);
        assert_eq!(simple.complexity_profile, "simple");

        let hot = generate_rollout_plan(&RolloutRequest {
            complexity_level: Some(ComplexityLevel::VeryHigh),
            risk_level: Some(RiskLevel::Critical),
            ..Default::default()
        });
        assert_eq!(hot.phase_count, 5);
        assert_eq!(hot.complexity_profile, "complex_high_risk");
        assert_eq!(hot.phases[0].exposure_percent, 1);
    }

    #[test]
    fn final_phase_always_reaches_everyone() {
        for risk in [None, Some(RiskLevel::High), Some(RiskLevel::Critical)] {
            let plan = generate_rollout_plan(&RolloutRequest {
                risk_level: risk,
                ..Default::default()
            });
            assert_eq!(plan.phases.last().unwrap().exposure_percent, 100);
            assert_eq!(
                plan.phases.last().unwrap().name,
                "general_availability"
            );
        }
    }

    #[test]
    fn phases_chain_entry_to_exit() {
        let plan = generate_rollout_plan(&RolloutRequest {
            risk_level: Some(RiskLevel::High),
            ..Default::default()
        });
        for (idx, phase) in plan.phases.iter().enumerate() {
            assert_eq!(phase.phase_number, idx + 1);
            if idx > 0 {
                assert!(phase.entry_criteria[0].contains(&format!("Phase {}", idx)));
            }
            assert!(!phase.validation_gates.is_empty());
            assert!(!phase.min_observation_window.is_empty());
        }
    }

    #[test]
    fn max_phases_caps_the_plan() {
        let plan = generate_rollout_plan(&RolloutRequest {
            risk_level: Some(RiskLevel::Critical),
            max_phases: Some(3),
            ..Default::default()
        });
        assert_eq!(plan.phase_count, 3);
        assert_eq!(plan.phases.last().unwrap().exposure_percent, 100);
    }
}
