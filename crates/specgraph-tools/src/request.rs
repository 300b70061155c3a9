// ABOUTME: Sum-typed tool requests: one variant per tool, each with a validated input record.
// ABOUTME: Unknown tool names fail at deserialization; they cannot reach the executor.

use serde::{Deserialize, Serialize};

fn default_directory() -> String {
    ".".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    specgraph_graph::DEFAULT_MAX_TRACE_DEPTH
}

fn default_max_findings() -> usize {
    specgraph_analysis::DEFAULT_MAX_FINDINGS
}

fn default_max_features() -> usize {
    specgraph_analysis::DEFAULT_MAX_FEATURES
}

fn default_max_nodes() -> usize {
    specgraph_parser::ast::DEFAULT_MAX_SERIALIZED_NODES
}

fn default_max_ast_depth() -> usize {
    specgraph_parser::ast::DEFAULT_MAX_SERIALIZED_DEPTH
}

fn default_max_steps() -> usize {
    specgraph_plan::DEFAULT_MAX_STEPS
}

fn default_max_commits() -> usize {
    specgraph_plan::DEFAULT_MAX_COMMITS
}

fn default_max_phases() -> usize {
    specgraph_plan::DEFAULT_MAX_PHASES
}

fn default_max_questions() -> usize {
    specgraph_arch::DEFAULT_MAX_QUESTIONS
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default = "default_true")]
    pub recursive: bool,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileArgs {
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParseAstArgs {
    pub file_path: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_max_nodes")]
    pub max_serialized_nodes: usize,
    #[serde(default = "default_max_ast_depth")]
    pub max_serialized_depth: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default = "default_true")]
    pub recursive: bool,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub include_external_dependencies: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiffArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default)]
    pub base_ref: Option<String>,
    #[serde(default)]
    pub target_ref: Option<String>,
    #[serde(default)]
    pub include_untracked: bool,
    #[serde(default)]
    pub subdirectory: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default)]
    pub seeds: Option<Vec<String>>,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub base_ref: Option<String>,
    #[serde(default)]
    pub include_untracked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreakingArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    pub base_ref: String,
    #[serde(default)]
    pub target_ref: Option<String>,
    #[serde(default = "default_max_findings")]
    pub max_findings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeChangeArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    pub base_ref: String,
    #[serde(default)]
    pub target_ref: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default)]
    pub base_ref: Option<String>,
    #[serde(default)]
    pub target_ref: Option<String>,
    #[serde(default)]
    pub include_untracked: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default)]
    pub base_ref: Option<String>,
    #[serde(default)]
    pub target_ref: Option<String>,
    #[serde(default)]
    pub include_untracked: bool,
    #[serde(default = "default_max_features")]
    pub max_features: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchitectureArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default = "default_true")]
    pub recursive: bool,
    #[serde(default)]
    pub system_name: Option<String>,
    #[serde(default)]
    pub use_llm: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnotateArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default)]
    pub system_name: Option<String>,
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    #[serde(default)]
    pub operations: Vec<specgraph_arch::AnnotationOp>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcedureArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub change_type: Option<String>,
    #[serde(default)]
    pub base_ref: Option<String>,
    #[serde(default)]
    pub include_untracked: bool,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub change_type: Option<String>,
    #[serde(default)]
    pub base_branch: Option<String>,
    #[serde(default)]
    pub base_ref: Option<String>,
    #[serde(default)]
    pub include_untracked: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommitArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub change_type: Option<String>,
    #[serde(default)]
    pub base_ref: Option<String>,
    #[serde(default)]
    pub include_untracked: bool,
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RollbackArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default)]
    pub base_ref: Option<String>,
    #[serde(default)]
    pub include_untracked: bool,
    #[serde(default = "default_true")]
    pub include_data_safety_checks: bool,
    #[serde(default)]
    pub deployment_environment: Option<String>,
    #[serde(default)]
    pub uses_feature_flag: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub flag_key_prefix: Option<String>,
    #[serde(default)]
    pub include_experiment_support: bool,
    #[serde(default)]
    pub base_ref: Option<String>,
    #[serde(default)]
    pub include_untracked: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RolloutArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default)]
    pub base_ref: Option<String>,
    #[serde(default)]
    pub include_untracked: bool,
    #[serde(default)]
    pub environments: Vec<String>,
    #[serde(default = "default_max_phases")]
    pub max_phases: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationArgs {
    #[serde(default = "default_directory")]
    pub directory_path: String,
    #[serde(default)]
    pub base_ref: Option<String>,
    #[serde(default)]
    pub include_untracked: bool,
    #[serde(default)]
    pub migration_tool: Option<String>,
    #[serde(default)]
    pub database_engine: Option<String>,
    #[serde(default)]
    pub deployment_environment: Option<String>,
    #[serde(default = "default_true")]
    pub include_command_examples: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrepareRepositoryArgs {
    pub repository_url: String,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub directory_scope: Option<Vec<String>>,
}

/// The closed tool set. Dispatch by name is a tagged deserialization; an
/// unknown name is an input error, never a runtime lookup miss.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolRequest {
    DetectLanguage(FileArgs),
    ParseAst(ParseAstArgs),
    ExtractSymbols(FileArgs),
    AnalyzeCodeMetrics(FileArgs),
    AnalyzeTypeUsage(FileArgs),
    AnalyzeDynamicConstructs(FileArgs),
    ScanDirectory(ScopeArgs),
    BuildDependencyGraph(GraphArgs),
    ClassifyFileImpact(DiffArgs),
    TraceDownstreamDependencies(TraceArgs),
    DetectBreakingChanges(BreakingArgs),
    AnalyzeTypeSystemChanges(TypeChangeArgs),
    AssessTestImpact(RiskArgs),
    AssessChangeRisk(RiskArgs),
    AttributeFeatures(FeatureArgs),
    InferArchitecture(ArchitectureArgs),
    GenerateC4Model(ArchitectureArgs),
    RenderC4Diagrams(ArchitectureArgs),
    AnnotateArchitecture(AnnotateArgs),
    GenerateChangeProcedure(ProcedureArgs),
    GenerateGitWorkflow(WorkflowArgs),
    PlanCommitSequence(CommitArgs),
    GenerateRollbackPlan(RollbackArgs),
    GenerateFeatureFlagStrategy(FlagArgs),
    GenerateRolloutPlan(RolloutArgs),
    GenerateMigrationStrategy(MigrationArgs),
    PrepareRepository(PrepareRepositoryArgs),
}

impl ToolRequest {
    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolRequest::DetectLanguage(_) => "detect_language",
            ToolRequest::ParseAst(_) => "parse_ast",
            ToolRequest::ExtractSymbols(_) => "extract_symbols",
            ToolRequest::AnalyzeCodeMetrics(_) => "analyze_code_metrics",
            ToolRequest::AnalyzeTypeUsage(_) => "analyze_type_usage",
            ToolRequest::AnalyzeDynamicConstructs(_) => "analyze_dynamic_constructs",
            ToolRequest::ScanDirectory(_) => "scan_directory",
            ToolRequest::BuildDependencyGraph(_) => "build_dependency_graph",
            ToolRequest::ClassifyFileImpact(_) => "classify_file_impact",
            ToolRequest::TraceDownstreamDependencies(_) => "trace_downstream_dependencies",
            ToolRequest::DetectBreakingChanges(_) => "detect_breaking_changes",
            ToolRequest::AnalyzeTypeSystemChanges(_) => "analyze_type_system_changes",
            ToolRequest::AssessTestImpact(_) => "assess_test_impact",
            ToolRequest::AssessChangeRisk(_) => "assess_change_risk",
            ToolRequest::AttributeFeatures(_) => "attribute_features",
            ToolRequest::InferArchitecture(_) => "infer_architecture",
            ToolRequest::GenerateC4Model(_) => "generate_c4_model",
            ToolRequest::RenderC4Diagrams(_) => "render_c4_diagrams",
            ToolRequest::AnnotateArchitecture(_) => "annotate_architecture",
            ToolRequest::GenerateChangeProcedure(_) => "generate_change_procedure",
            ToolRequest::GenerateGitWorkflow(_) => "generate_git_workflow",
            ToolRequest::PlanCommitSequence(_) => "plan_commit_sequence",
            ToolRequest::GenerateRollbackPlan(_) => "generate_rollback_plan",
            ToolRequest::GenerateFeatureFlagStrategy(_) => "generate_feature_flag_strategy",
            ToolRequest::GenerateRolloutPlan(_) => "generate_rollout_plan",
            ToolRequest::GenerateMigrationStrategy(_) => "generate_migration_strategy",
            ToolRequest::PrepareRepository(_) => "prepare_repository",
        }
    }
}
