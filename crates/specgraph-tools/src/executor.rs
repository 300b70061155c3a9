// ABOUTME: Async tool executor: dispatches sum-typed requests, composes sub-signals, and
// ABOUTME: converts every outcome into the uniform result envelope. Nothing here panics
// ABOUTME: through the public surface.

use crate::request::*;
use serde_json::{json, Value as JsonValue};
use specgraph_ai::{CompletionProvider, LlmEnrichment, TaskComplexity};
use specgraph_analysis::{
    aggregate_risk, assess_test_impact, attribute_features, detect_breaking_changes, is_test_file,
    risk::RiskInputs, BreakingChangeReport, RiskReport, TestImpactReport, TypeSafetyReport,
};
use specgraph_arch as arch;
use specgraph_core::envelope::{self, SignalStatus};
use specgraph_core::{paths, ImpactKind, Language, Result, SpecGraphError};
use specgraph_git::{
    classify_changes, ChangeClassification, CloneCache, CloneCacheConfig, CloneCredentials,
    DiffMode, GitRunner,
};
use specgraph_graph::{build_graph, trace_downstream, DependencyGraph, GraphConfig};
use specgraph_parser::{
    analyze_dynamic, analyze_types, ast, compute_metrics, detect_language, extract_classes,
    extract_functions, extract_imports, scan_directory, ScanConfig, TreeSitterAdapter,
};
use specgraph_plan as plan;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ToolExecutor {
    llm: Option<Arc<dyn CompletionProvider>>,
    clone_cache: CloneCache,
    credentials: CloneCredentials,
    adapter: TreeSitterAdapter,
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the change-aware tools share: classification plus the
/// derived sub-signals, each optional so one failure never sinks the rest.
struct ChangeSignalBundle {
    status: SignalStatus,
    classification: Option<ChangeClassification>,
    breaking: Option<BreakingChangeReport>,
    type_safety: Option<TypeSafetyReport>,
    test_impact: Option<TestImpactReport>,
    cycle_count: Option<usize>,
}

impl ToolExecutor {
    pub fn new() -> Self {
        Self {
            llm: None,
            clone_cache: CloneCache::new(CloneCacheConfig::from_env()),
            credentials: CloneCredentials::default(),
            adapter: TreeSitterAdapter::new(),
        }
    }

    pub fn with_llm(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.llm = Some(provider);
        self
    }

    pub fn with_credentials(mut self, credentials: CloneCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Execute a request and return its envelope. This is the boundary:
    /// every internal error becomes `{status: "error", error}`.
    pub async fn execute(&self, request: ToolRequest) -> JsonValue {
        let tool = request.tool_name();
        debug!(tool, "executing tool");
        envelope::from_result(self.run(request).await)
    }

    /// Execute a raw JSON request (`{"tool": name, ...args}`).
    pub async fn execute_value(&self, value: JsonValue) -> JsonValue {
        match serde_json::from_value::<ToolRequest>(value) {
            Ok(request) => self.execute(request).await,
            Err(err) => envelope::error(format!("invalid tool request: {err}")),
        }
    }

    async fn run(&self, request: ToolRequest) -> Result<JsonValue> {
        match request {
            ToolRequest::DetectLanguage(args) => self.detect_language(&args),
            ToolRequest::ParseAst(args) => self.parse_ast(&args),
            ToolRequest::ExtractSymbols(args) => self.extract_symbols(&args),
            ToolRequest::AnalyzeCodeMetrics(args) => self.code_metrics(&args),
            ToolRequest::AnalyzeTypeUsage(args) => self.type_usage(&args),
            ToolRequest::AnalyzeDynamicConstructs(args) => self.dynamic_constructs(&args),
            ToolRequest::ScanDirectory(args) => self.scan(&args),
            ToolRequest::BuildDependencyGraph(args) => self.dependency_graph(&args),
            ToolRequest::ClassifyFileImpact(args) => self.classify(&args).await,
            ToolRequest::TraceDownstreamDependencies(args) => self.trace(&args).await,
            ToolRequest::DetectBreakingChanges(args) => self.breaking(&args).await,
            ToolRequest::AnalyzeTypeSystemChanges(args) => self.type_changes(&args).await,
            ToolRequest::AssessTestImpact(args) => self.test_impact(&args).await,
            ToolRequest::AssessChangeRisk(args) => self.change_risk(&args).await,
            ToolRequest::AttributeFeatures(args) => self.features(&args).await,
            ToolRequest::InferArchitecture(args) => self.infer_architecture(&args).await,
            ToolRequest::GenerateC4Model(args) => self.c4_model(&args),
            ToolRequest::RenderC4Diagrams(args) => self.c4_diagrams(&args),
            ToolRequest::AnnotateArchitecture(args) => self.annotate(&args),
            ToolRequest::GenerateChangeProcedure(args) => self.procedure(&args).await,
            ToolRequest::GenerateGitWorkflow(args) => self.workflow(&args).await,
            ToolRequest::PlanCommitSequence(args) => self.commits(&args).await,
            ToolRequest::GenerateRollbackPlan(args) => self.rollback(&args).await,
            ToolRequest::GenerateFeatureFlagStrategy(args) => self.flags(&args).await,
            ToolRequest::GenerateRolloutPlan(args) => self.rollout(&args).await,
            ToolRequest::GenerateMigrationStrategy(args) => self.migration(&args).await,
            ToolRequest::PrepareRepository(args) => self.prepare_repository(&args).await,
        }
    }

    // ---- leaf tools -----------------------------------------------------

    fn detect_language(&self, args: &FileArgs) -> Result<JsonValue> {
        let detection = detect_language(Path::new(&args.file_path))?;
        envelope::success(&detection)
    }

    fn read_source(&self, file_path: &str) -> Result<(PathBuf, Language, String)> {
        let path = PathBuf::from(file_path);
        if !path.is_file() {
            return Err(SpecGraphError::NotFound(format!(
                "File not found: {file_path}"
            )));
        }
        let detection = detect_language(&path)?;
        let bytes = std::fs::read(&path)?;
        Ok((
            path,
            detection.language,
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }

    fn parse_ast(&self, args: &ParseAstArgs) -> Result<JsonValue> {
        let (path, detected, content) = self.read_source(&args.file_path)?;
        let language = match &args.language {
            Some(raw) => raw.parse::<Language>().unwrap_or(Language::Unknown),
            None => detected,
        };

        if self.adapter.is_available() && self.adapter.supports(language) {
            match self.adapter.parse_content(
                &content,
                language,
                args.max_serialized_nodes,
                args.max_serialized_depth,
            ) {
                Ok(summary) => return envelope::success(&summary),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "tree-sitter parse failed; falling back");
                    let mut value = serde_json::to_value(ast::simple_parse(&content, language))?;
                    value["parse_warning"] = json!(err.to_string());
                    return Ok(value);
                }
            }
        }

        let mut value = serde_json::to_value(ast::simple_parse(&content, language))?;
        if !self.adapter.is_available() {
            value["parse_warning"] = json!("Tree-sitter runtime is unavailable");
        } else {
            value["parse_warning"] = json!(format!("no grammar for {language}"));
        }
        Ok(value)
    }

    fn extract_symbols(&self, args: &FileArgs) -> Result<JsonValue> {
        let (_, language, content) = self.read_source(&args.file_path)?;
        let functions = extract_functions(&content, language);
        let classes = extract_classes(&content, language);
        let imports = extract_imports(&content, language);
        let (function_count, class_count, import_count) =
            (functions.len(), classes.len(), imports.len());
        Ok(json!({
            "file_path": args.file_path,
            "language": language,
            "functions": functions,
            "classes": classes,
            "imports": imports,
            "function_count": function_count,
            "class_count": class_count,
            "import_count": import_count,
        }))
    }

    fn code_metrics(&self, args: &FileArgs) -> Result<JsonValue> {
        let (_, language, content) = self.read_source(&args.file_path)?;
        let metrics = compute_metrics(&content, language);
        let mut value = serde_json::to_value(&metrics)?;
        value["file_path"] = json!(args.file_path);
        value["language"] = json!(language);
        Ok(value)
    }

    fn type_usage(&self, args: &FileArgs) -> Result<JsonValue> {
        let (_, language, content) = self.read_source(&args.file_path)?;
        let analysis = analyze_types(&content, language)?;
        envelope::success(&analysis)
    }

    fn dynamic_constructs(&self, args: &FileArgs) -> Result<JsonValue> {
        let (_, language, content) = self.read_source(&args.file_path)?;
        let analysis = analyze_dynamic(&content, language)?;
        envelope::success(&analysis)
    }

    fn scan(&self, args: &ScopeArgs) -> Result<JsonValue> {
        let result = scan_directory(&ScanConfig {
            root: PathBuf::from(&args.directory_path),
            recursive: args.recursive,
            extensions: args.extensions.clone(),
        })?;
        envelope::success(&result)
    }

    fn dependency_graph(&self, args: &GraphArgs) -> Result<JsonValue> {
        let graph = self.build_graph_for(
            &args.directory_path,
            args.recursive,
            args.extensions.clone(),
            args.include_external_dependencies,
        )?;
        envelope::success(&graph)
    }

    fn build_graph_for(
        &self,
        directory_path: &str,
        recursive: bool,
        extensions: Option<Vec<String>>,
        include_external: bool,
    ) -> Result<DependencyGraph> {
        build_graph(&GraphConfig {
            root: PathBuf::from(directory_path),
            recursive,
            extensions,
            include_external,
        })
    }

    // ---- git-backed tools ----------------------------------------------

    async fn classification_for(
        &self,
        directory_path: &str,
        base_ref: Option<&str>,
        target_ref: Option<&str>,
        include_untracked: bool,
        subdirectory: Option<&str>,
    ) -> Result<ChangeClassification> {
        let runner = GitRunner::new(directory_path);
        let mode = match base_ref {
            Some(base) => DiffMode::RefDiff {
                base_ref: base.to_string(),
                target_ref: target_ref.map(|s| s.to_string()),
            },
            None => DiffMode::WorkingTree { include_untracked },
        };
        classify_changes(&runner, &mode, subdirectory).await
    }

    async fn classify(&self, args: &DiffArgs) -> Result<JsonValue> {
        let classification = self
            .classification_for(
                &args.directory_path,
                args.base_ref.as_deref(),
                args.target_ref.as_deref(),
                args.include_untracked,
                args.subdirectory.as_deref(),
            )
            .await?;
        envelope::success(&classification)
    }

    async fn trace(&self, args: &TraceArgs) -> Result<JsonValue> {
        let graph = self.build_graph_for(&args.directory_path, true, None, false)?;

        let seeds: Vec<String> = match &args.seeds {
            Some(seeds) if !seeds.is_empty() => {
                seeds.iter().map(|s| paths::normalize_relative(s)).collect()
            }
            _ => {
                // Auto-detect from the change set.
                let classification = self
                    .classification_for(
                        &args.directory_path,
                        args.base_ref.as_deref(),
                        None,
                        args.include_untracked,
                        None,
                    )
                    .await?;
                classification
                    .files
                    .iter()
                    .filter(|f| f.impact != ImpactKind::Delete)
                    .map(|f| f.path.clone())
                    .collect()
            }
        };

        if seeds.is_empty() {
            return Ok(json!({
                "seeds": [],
                "max_depth": args.max_depth,
                "dependents": [],
                "call_edge_count": 0,
                "import_reference_edge_count": 0,
            }));
        }

        let result = trace_downstream(
            Path::new(&args.directory_path),
            &graph,
            &seeds,
            args.max_depth,
        )?;
        envelope::success(&result)
    }

    async fn breaking(&self, args: &BreakingArgs) -> Result<JsonValue> {
        let runner = GitRunner::new(&args.directory_path);
        let classification = self
            .classification_for(
                &args.directory_path,
                Some(&args.base_ref),
                args.target_ref.as_deref(),
                false,
                None,
            )
            .await?;
        let report = detect_breaking_changes(
            &runner,
            &classification,
            &args.base_ref,
            args.target_ref.as_deref(),
            args.max_findings,
        )
        .await?;
        envelope::success(&report)
    }

    async fn type_changes(&self, args: &TypeChangeArgs) -> Result<JsonValue> {
        let runner = GitRunner::new(&args.directory_path);
        let classification = self
            .classification_for(
                &args.directory_path,
                Some(&args.base_ref),
                args.target_ref.as_deref(),
                false,
                None,
            )
            .await?;
        let report = specgraph_analysis::analyze_type_changes(
            &runner,
            &classification,
            &args.base_ref,
            args.target_ref.as_deref(),
        )
        .await?;
        envelope::success(&report)
    }

    async fn scoped_file_list(&self, directory_path: &str) -> Result<Vec<String>> {
        let scan = scan_directory(&ScanConfig::new(directory_path))?;
        Ok(scan.files.into_iter().map(|f| f.node.path).collect())
    }

    async fn test_impact_report(
        &self,
        directory_path: &str,
        classification: &ChangeClassification,
    ) -> Result<TestImpactReport> {
        let all_files = self.scoped_file_list(directory_path).await?;
        let changed: Vec<String> = classification.files.iter().map(|f| f.path.clone()).collect();

        // Downstream dependents of the changed non-test sources.
        let seeds: Vec<String> = classification
            .files
            .iter()
            .filter(|f| f.impact != ImpactKind::Delete && !is_test_file(&f.path))
            .map(|f| f.path.clone())
            .collect();
        let downstream: Vec<String> = if seeds.is_empty() {
            Vec::new()
        } else {
            let graph = self.build_graph_for(directory_path, true, None, false)?;
            trace_downstream(
                Path::new(directory_path),
                &graph,
                &seeds,
                specgraph_graph::DEFAULT_MAX_TRACE_DEPTH,
            )
            .map(|r| r.dependents.into_iter().map(|d| d.path).collect())
            .unwrap_or_default()
        };

        Ok(assess_test_impact(&changed, &downstream, &all_files))
    }

    async fn test_impact(&self, args: &RiskArgs) -> Result<JsonValue> {
        let classification = self
            .classification_for(
                &args.directory_path,
                args.base_ref.as_deref(),
                args.target_ref.as_deref(),
                args.include_untracked,
                None,
            )
            .await?;
        let report = self
            .test_impact_report(&args.directory_path, &classification)
            .await?;
        envelope::success(&report)
    }

    /// Gather every change-derived sub-signal, tolerating individual
    /// failures. Used by the risk aggregate and the planning generators.
    async fn gather_signals(
        &self,
        directory_path: &str,
        base_ref: Option<&str>,
        target_ref: Option<&str>,
        include_untracked: bool,
    ) -> ChangeSignalBundle {
        let mut status = SignalStatus::new();
        let runner = GitRunner::new(directory_path);
        let diff_base = base_ref.unwrap_or("HEAD");

        let classification = match self
            .classification_for(
                directory_path,
                base_ref,
                target_ref,
                include_untracked,
                None,
            )
            .await
        {
            Ok(c) => {
                status.record_success("change_classification");
                Some(c)
            }
            Err(err) => {
                status.record_error("change_classification", &err);
                None
            }
        };

        let breaking = match &classification {
            Some(classification) => {
                match detect_breaking_changes(
                    &runner,
                    classification,
                    diff_base,
                    target_ref,
                    specgraph_analysis::DEFAULT_MAX_FINDINGS,
                )
                .await
                {
                    Ok(report) => {
                        status.record_success("breaking_changes");
                        Some(report)
                    }
                    Err(err) => {
                        status.record_error("breaking_changes", &err);
                        None
                    }
                }
            }
            None => {
                status.record_unavailable("breaking_changes");
                None
            }
        };

        let type_safety = match &classification {
            Some(classification) => {
                match specgraph_analysis::analyze_type_changes(
                    &runner,
                    classification,
                    diff_base,
                    target_ref,
                )
                .await
                {
                    Ok(report) => {
                        status.record_success("type_safety");
                        Some(report)
                    }
                    Err(err) => {
                        status.record_error("type_safety", &err);
                        None
                    }
                }
            }
            None => {
                status.record_unavailable("type_safety");
                None
            }
        };

        let test_impact = match &classification {
            Some(classification) => {
                match self.test_impact_report(directory_path, classification).await {
                    Ok(report) => {
                        status.record_success("test_impact");
                        Some(report)
                    }
                    Err(err) => {
                        status.record_error("test_impact", &err);
                        None
                    }
                }
            }
            None => {
                status.record_unavailable("test_impact");
                None
            }
        };

        let cycle_count = self
            .build_graph_for(directory_path, true, None, false)
            .map(|g| g.cycle_count)
            .ok();

        ChangeSignalBundle {
            status,
            classification,
            breaking,
            type_safety,
            test_impact,
            cycle_count,
        }
    }

    fn risk_from_bundle(&self, bundle: &ChangeSignalBundle) -> RiskReport {
        aggregate_risk(
            &RiskInputs {
                classification: bundle.classification.as_ref(),
                breaking: bundle.breaking.as_ref(),
                type_safety: bundle.type_safety.as_ref(),
                test_impact: bundle.test_impact.as_ref(),
                cycle_count: bundle.cycle_count,
            },
            &bundle.status,
        )
    }

    async fn change_risk(&self, args: &RiskArgs) -> Result<JsonValue> {
        let bundle = self
            .gather_signals(
                &args.directory_path,
                args.base_ref.as_deref(),
                args.target_ref.as_deref(),
                args.include_untracked,
            )
            .await;
        let report = self.risk_from_bundle(&bundle);
        let mut value = serde_json::to_value(&report)?;
        value["signal_status"] = serde_json::to_value(&bundle.status)?;
        Ok(value)
    }

    async fn features(&self, args: &FeatureArgs) -> Result<JsonValue> {
        let classification = self
            .classification_for(
                &args.directory_path,
                args.base_ref.as_deref(),
                args.target_ref.as_deref(),
                args.include_untracked,
                None,
            )
            .await?;
        let attribution = attribute_features(&classification, args.max_features);
        envelope::success(&attribution)
    }

    // ---- architecture tools --------------------------------------------

    fn inventory_for(
        &self,
        directory_path: &str,
        recursive: bool,
    ) -> Result<(arch::ComponentInventory, DependencyGraph)> {
        let scan = scan_directory(&ScanConfig {
            root: PathBuf::from(directory_path),
            recursive,
            extensions: None,
        })?;
        let files: Vec<(String, Language)> = scan
            .files
            .iter()
            .map(|f| (f.node.path.clone(), f.node.language))
            .collect();
        let graph = self.build_graph_for(directory_path, recursive, None, false)?;
        let inventory = arch::build_inventory(&files, Some(&graph));
        Ok((inventory, graph))
    }

    fn system_name_for(&self, directory_path: &str, explicit: Option<&str>) -> String {
        if let Some(name) = explicit {
            if !name.trim().is_empty() {
                return name.trim().to_string();
            }
        }
        Path::new(directory_path)
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "system".to_string())
    }

    async fn infer_architecture(&self, args: &ArchitectureArgs) -> Result<JsonValue> {
        let (inventory, _) = self.inventory_for(&args.directory_path, args.recursive)?;
        let mut value = serde_json::to_value(&inventory)?;

        let enrichment = if args.use_llm {
            match &self.llm {
                Some(provider) if provider.is_available().await => {
                    let prompt = format!(
                        "Describe this codebase architecture in two sentences.\n{}",
                        inventory.summary
                    );
                    match provider.complete(&prompt, TaskComplexity::Standard).await {
                        Ok(text) => LlmEnrichment::from_summary(provider.provider_name(), text),
                        Err(err) => {
                            warn!(error = %err, "LLM refinement failed");
                            LlmEnrichment::failed()
                        }
                    }
                }
                _ => LlmEnrichment::unavailable(),
            }
        } else {
            LlmEnrichment::unavailable()
        };
        value["llm_enrichment"] = serde_json::to_value(&enrichment)?;
        Ok(value)
    }

    fn c4_model(&self, args: &ArchitectureArgs) -> Result<JsonValue> {
        let (inventory, graph) = self.inventory_for(&args.directory_path, args.recursive)?;
        let system = self.system_name_for(&args.directory_path, args.system_name.as_deref());
        let model = arch::generate_c4(&system, &inventory, &graph);
        envelope::success(&model)
    }

    fn c4_diagrams(&self, args: &ArchitectureArgs) -> Result<JsonValue> {
        let (inventory, graph) = self.inventory_for(&args.directory_path, args.recursive)?;
        let system = self.system_name_for(&args.directory_path, args.system_name.as_deref());
        let model = arch::generate_c4(&system, &inventory, &graph);
        let diagrams = arch::render(&model);
        envelope::success(&diagrams)
    }

    fn annotate(&self, args: &AnnotateArgs) -> Result<JsonValue> {
        let (inventory, graph) = self.inventory_for(&args.directory_path, true)?;
        let system = self.system_name_for(&args.directory_path, args.system_name.as_deref());
        let model = arch::generate_c4(&system, &inventory, &graph);
        let questions = arch::generate_questions(&model, args.max_questions);
        let outcome = arch::apply_annotations(&model, &args.operations);
        Ok(json!({
            "questions": questions,
            "applied": outcome.applied,
            "rejected": outcome.rejected,
            "confirmed_questions": outcome.confirmed_questions,
            "rejected_questions": outcome.rejected_questions,
            "model": outcome.model,
        }))
    }

    // ---- planning tools -------------------------------------------------

    fn change_signals_for_planning(
        &self,
        bundle: &ChangeSignalBundle,
        risk: &RiskReport,
    ) -> plan::ChangeSignals {
        let (created, deleted, modified) = bundle
            .classification
            .as_ref()
            .map(|c| (c.create.len(), c.delete.len(), c.modify.len()))
            .unwrap_or((0, 0, 0));
        plan::ChangeSignals {
            breaking_count: bundle
                .breaking
                .as_ref()
                .map(|b| b.finding_count)
                .unwrap_or(0),
            is_urgent: false,
            deleted_count: deleted,
            created_count: created,
            modified_count: modified,
            risk_level: Some(risk.risk_level),
        }
    }

    async fn procedure(&self, args: &ProcedureArgs) -> Result<JsonValue> {
        let bundle = self
            .gather_signals(
                &args.directory_path,
                args.base_ref.as_deref(),
                None,
                args.include_untracked,
            )
            .await;
        let risk = self.risk_from_bundle(&bundle);
        let signals = self.change_signals_for_planning(&bundle, &risk);
        let change_type = plan::resolve_change_type(args.change_type.as_deref(), &signals);
        let procedure = plan::generate_procedure(&plan::ProcedureRequest {
            objective: args.objective.clone(),
            change_type: Some(change_type),
            risk_level: Some(risk.risk_level),
            regression_scope: bundle.test_impact.as_ref().map(|t| t.regression_scope),
            has_breaking_changes: signals.breaking_count > 0,
            max_steps: Some(args.max_steps),
        });
        let mut value = serde_json::to_value(&procedure)?;
        value["signal_status"] = serde_json::to_value(&bundle.status)?;
        Ok(value)
    }

    async fn workflow(&self, args: &WorkflowArgs) -> Result<JsonValue> {
        let bundle = self
            .gather_signals(
                &args.directory_path,
                args.base_ref.as_deref(),
                None,
                args.include_untracked,
            )
            .await;
        let risk = self.risk_from_bundle(&bundle);
        let signals = self.change_signals_for_planning(&bundle, &risk);
        let workflow = plan::generate_git_workflow(&plan::WorkflowRequest {
            objective: args.objective.clone(),
            ticket_id: args.ticket_id.clone(),
            change_type: args.change_type.clone(),
            base_branch: args.base_branch.clone(),
            signals,
        });
        let mut value = serde_json::to_value(&workflow)?;
        value["signal_status"] = serde_json::to_value(&bundle.status)?;
        Ok(value)
    }

    async fn commits(&self, args: &CommitArgs) -> Result<JsonValue> {
        let bundle = self
            .gather_signals(
                &args.directory_path,
                args.base_ref.as_deref(),
                None,
                args.include_untracked,
            )
            .await;
        let Some(classification) = &bundle.classification else {
            return Err(SpecGraphError::Git(
                "commit planning requires a classifiable change set".to_string(),
            ));
        };
        let risk = self.risk_from_bundle(&bundle);
        let signals = self.change_signals_for_planning(&bundle, &risk);
        let change_type = plan::resolve_change_type(args.change_type.as_deref(), &signals);
        let sequence = plan::plan_commit_sequence(
            classification,
            change_type,
            &args.objective,
            args.ticket_id.as_deref(),
            args.max_commits,
        );
        let mut value = serde_json::to_value(&sequence)?;
        value["signal_status"] = serde_json::to_value(&bundle.status)?;
        Ok(value)
    }

    async fn rollback(&self, args: &RollbackArgs) -> Result<JsonValue> {
        let bundle = self
            .gather_signals(
                &args.directory_path,
                args.base_ref.as_deref(),
                None,
                args.include_untracked,
            )
            .await;
        let risk = self.risk_from_bundle(&bundle);
        let has_schema_changes = bundle
            .breaking
            .as_ref()
            .map(|b| {
                b.findings
                    .iter()
                    .any(|f| f.category.contains("schema") || f.symbol.is_none())
            })
            .unwrap_or(false)
            || bundle
                .classification
                .as_ref()
                .map(|c| {
                    c.files.iter().any(|f| {
                        let lower = f.path.to_lowercase();
                        lower.contains("migration") || lower.contains("schema")
                    })
                })
                .unwrap_or(false);
        let rollback = plan::generate_rollback_plan(&plan::RollbackRequest {
            risk_level: Some(risk.risk_level),
            uses_feature_flag: args.uses_feature_flag,
            has_schema_changes,
            include_data_safety_checks: args.include_data_safety_checks,
            deployment_environment: args.deployment_environment.clone(),
        });
        let mut value = serde_json::to_value(&rollback)?;
        value["signal_status"] = serde_json::to_value(&bundle.status)?;
        Ok(value)
    }

    async fn flags(&self, args: &FlagArgs) -> Result<JsonValue> {
        let bundle = self
            .gather_signals(
                &args.directory_path,
                args.base_ref.as_deref(),
                None,
                args.include_untracked,
            )
            .await;
        let risk = self.risk_from_bundle(&bundle);
        let strategy = plan::generate_flag_strategy(&plan::FlagRequest {
            objective: args.objective.clone(),
            flag_key_prefix: args.flag_key_prefix.clone(),
            risk_level: Some(risk.risk_level),
            include_experiment_support: args.include_experiment_support,
        });
        let mut value = serde_json::to_value(&strategy)?;
        value["signal_status"] = serde_json::to_value(&bundle.status)?;
        Ok(value)
    }

    async fn rollout(&self, args: &RolloutArgs) -> Result<JsonValue> {
        let bundle = self
            .gather_signals(
                &args.directory_path,
                args.base_ref.as_deref(),
                None,
                args.include_untracked,
            )
            .await;
        let risk = self.risk_from_bundle(&bundle);
        // Complexity proxies from the scan aggregate.
        let complexity = scan_directory(&ScanConfig::new(&args.directory_path))
            .ok()
            .and_then(|scan| {
                scan.languages
                    .values()
                    .map(|l| l.max_complexity)
                    .max()
                    .map(specgraph_core::ComplexityLevel::from_complexity)
            });
        let rollout = plan::generate_rollout_plan(&plan::RolloutRequest {
            complexity_level: complexity,
            risk_level: Some(risk.risk_level),
            environments: args.environments.clone(),
            max_phases: Some(args.max_phases),
        });
        let mut value = serde_json::to_value(&rollout)?;
        value["signal_status"] = serde_json::to_value(&bundle.status)?;
        Ok(value)
    }

    async fn migration(&self, args: &MigrationArgs) -> Result<JsonValue> {
        let bundle = self
            .gather_signals(
                &args.directory_path,
                args.base_ref.as_deref(),
                None,
                args.include_untracked,
            )
            .await;
        let risk = self.risk_from_bundle(&bundle);
        let schema_change_count = bundle
            .classification
            .as_ref()
            .map(|c| {
                c.files
                    .iter()
                    .filter(|f| {
                        let lower = f.path.to_lowercase();
                        lower.contains("migration")
                            || lower.contains("schema")
                            || lower.ends_with(".sql")
                    })
                    .count()
            })
            .unwrap_or(0);
        let strategy = plan::generate_migration_strategy(&plan::MigrationRequest {
            risk_level: Some(risk.risk_level),
            breaking_count: bundle
                .breaking
                .as_ref()
                .map(|b| b.finding_count)
                .unwrap_or(0),
            schema_change_count,
            deployment_environment: args.deployment_environment.clone(),
            migration_tool: args.migration_tool.clone(),
            database_engine: args.database_engine.clone(),
            include_command_examples: args.include_command_examples,
        });
        let mut value = serde_json::to_value(&strategy)?;
        value["signal_status"] = serde_json::to_value(&bundle.status)?;
        Ok(value)
    }

    async fn prepare_repository(&self, args: &PrepareRepositoryArgs) -> Result<JsonValue> {
        let outcome = self
            .clone_cache
            .prepare(
                &args.repository_url,
                args.branch_name.as_deref(),
                args.directory_scope.as_deref(),
                &self.credentials,
            )
            .await?;
        envelope::success(&outcome)
    }
}
