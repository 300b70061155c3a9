// ABOUTME: Feature-flag strategy generator: flag key, phased exposure, kill switch, monitoring.

use crate::naming::slug;
use serde::{Deserialize, Serialize};
use specgraph_core::RiskLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposurePhase {
    pub phase: usize,
    pub exposure_percent: u8,
    pub audience: String,
    pub minimum_duration: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KillSwitch {
    pub key: String,
    pub behavior: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSupport {
    pub variants: Vec<String>,
    pub assignment: String,
    pub success_metric_hint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlagStrategy {
    pub flag_key: String,
    pub phases: Vec<ExposurePhase>,
    pub kill_switch: KillSwitch,
    pub monitoring: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment: Option<ExperimentSupport>,
    pub cleanup: String,
}

#[derive(Debug, Clone, Default)]
pub struct FlagRequest {
    pub objective: String,
    pub flag_key_prefix: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub include_experiment_support: bool,
}

fn exposure_schedule(risk_level: Option<RiskLevel>) -> Vec<(u8, &'static str, &'static str)> {
    match risk_level {
        Some(RiskLevel::Critical) => vec![
            (1, "internal users only", "24h"),
            (5, "canary cohort", "24h"),
            (25, "quarter of traffic", "48h"),
            (50, "half of traffic", "48h"),
            (100, "everyone", "24h"),
        ],
        Some(RiskLevel::High) => vec![
            (5, "canary cohort", "24h"),
            (25, "quarter of traffic", "24h"),
            (50, "half of traffic", "24h"),
            (100, "everyone", "12h"),
        ],
        Some(RiskLevel::Medium) => vec![
            (10, "canary cohort", "12h"),
            (50, "half of traffic", "12h"),
            (100, "everyone", "6h"),
        ],
        _ => vec![(25, "canary cohort", "6h"), (100, "everyone", "2h")],
    }
}

/// Build the feature-flag strategy for a change. Exposure phases scale
/// with risk; the kill switch always exists.
pub fn generate_flag_strategy(request: &FlagRequest) -> FeatureFlagStrategy {
    let prefix = request
        .flag_key_prefix
        .as_deref()
        .map(|p| slug(p, 3))
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "rollout".to_string());
    let objective_slug = {
        let s = slug(&request.objective, 4);
        if s.is_empty() {
            "change".to_string()
        } else {
            s
        }
    };
    let flag_key = format!("{prefix}.{}", objective_slug.replace('-', "_"));

    let phases: Vec<ExposurePhase> = exposure_schedule(request.risk_level)
        .into_iter()
        .enumerate()
        .map(|(idx, (percent, audience, duration))| ExposurePhase {
            phase: idx + 1,
            exposure_percent: percent,
            audience: audience.to_string(),
            minimum_duration: duration.to_string(),
        })
        .collect();

    let experiment = request.include_experiment_support.then(|| ExperimentSupport {
        variants: vec!["control".to_string(), "treatment".to_string()],
        assignment: "sticky per user id".to_string(),
        success_metric_hint: format!("primary metric for {}", request.objective),
    });

    FeatureFlagStrategy {
        kill_switch: KillSwitch {
            key: format!("{flag_key}.kill_switch"),
            behavior: "Force exposure to 0% immediately; overrides all phases".to_string(),
        },
        monitoring: vec![
            "error rate split by flag state".to_string(),
            "latency split by flag state".to_string(),
            "business metric guardrails".to_string(),
            "flag evaluation volume".to_string(),
        ],
        experiment,
        cleanup: "Remove the flag and dead code paths after one full release at 100%".to_string(),
        flag_key,
        phases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_key_from_prefix_and_objective() {
        let strategy = generate_flag_strategy(&FlagRequest {
            objective: "new billing engine".to_string(),
            flag_key_prefix: Some("billing".to_string()),
            ..Default::default()
        });
        assert_eq!(strategy.flag_key, "billing.new_billing_engine");
        assert!(strategy.kill_switch.key.ends_with(".kill_switch"));
    }

    #[test]
    fn high_risk_gets_slower_schedule() {
        let low = generate_flag_strategy(&FlagRequest {
            objective: "x".to_string(),
            risk_level: Some(RiskLevel::Low),
            ..Default::default()
        });
        let critical = generate_flag_strategy(&FlagRequest {
            objective: "x".to_string(),
            risk_level: Some(RiskLevel::Critical),
            ..Default::default()
        });
        assert!(critical.phases.len() > low.phases.len());
        assert_eq!(critical.phases[0].exposure_percent, 1);
        assert_eq!(critical.phases.last().unwrap().exposure_percent, 100);
    }

    #[test]
    fn phases_reach_full_exposure_monotonically() {
        for risk in [
            None,
            Some(RiskLevel::Medium),
            Some(RiskLevel::High),
            Some(RiskLevel::Critical),
        ] {
            let strategy = generate_flag_strategy(&FlagRequest {
                objective: "change".to_string(),
                risk_level: risk,
                ..Default::default()
            });
            let mut previous = 0u8;
            for phase in &strategy.phases {
                assert!(phase.exposure_percent > previous);
                previous = phase.exposure_percent;
            }
            assert_eq!(previous, 100);
        }
    }

    #[test]
    fn experiment_support_is_optional() {
        let without = generate_flag_strategy(&FlagRequest::default());
        assert!(without.experiment.is_none());
        let with = generate_flag_strategy(&FlagRequest {
            include_experiment_support: true,
            ..Default::default()
        });
        assert_eq!(with.experiment.unwrap().variants.len(), 2);
    }
}
