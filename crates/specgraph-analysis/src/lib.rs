pub mod breaking;
pub mod features;
pub mod findings;
pub mod kernel;
pub mod risk;
pub mod test_impact;
pub mod typeflow;

pub use breaking::{detect_breaking_changes, BreakingChangeReport, DEFAULT_MAX_FINDINGS};
pub use features::{attribute_features, FeatureAttribution, DEFAULT_MAX_FEATURES};
pub use findings::Finding;
pub use kernel::{extract_contract_surface, load_revision_pair, ContractKind, ContractSurface};
pub use risk::{aggregate_risk, Confidence, RiskInputs, RiskReport};
pub use test_impact::{assess_test_impact, is_test_file, RegressionScope, TestImpactReport};
pub use typeflow::{analyze_type_changes, TypeSafetyReport};
