// ABOUTME: JSON input schemas for every tool in the catalog.
// ABOUTME: Schemas mirror the ToolRequest records; the catalog is enumerable for agents.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: JsonValue,
}

pub struct ToolCatalog;

fn schema(name: &str, description: &str, parameters: JsonValue) -> ToolSchema {
    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

fn scope_properties() -> JsonValue {
    json!({
        "directory_path": {"type": "string", "default": ".", "description": "Repository-rooted directory to analyze"},
        "recursive": {"type": "boolean", "default": true},
        "extensions": {"type": "array", "items": {"type": "string"}, "description": "Optional dotted-suffix filter, e.g. [\".py\", \".ts\"]"}
    })
}

fn diff_properties() -> JsonValue {
    json!({
        "directory_path": {"type": "string", "default": "."},
        "base_ref": {"type": "string", "description": "Base git ref; omit for the working tree"},
        "target_ref": {"type": "string", "description": "Target git ref; omit to diff against the working tree"},
        "include_untracked": {"type": "boolean", "default": false}
    })
}

impl ToolCatalog {
    pub fn all() -> Vec<ToolSchema> {
        vec![
            schema(
                "detect_language",
                "Detect the programming language of a file via extension, shebang, and content voting.",
                json!({
                    "type": "object",
                    "properties": {"file_path": {"type": "string"}},
                    "required": ["file_path"]
                }),
            ),
            schema(
                "parse_ast",
                "Produce a bounded Tree-sitter AST summary for a file; degrades to a line-count parse when the runtime is unavailable.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": {"type": "string"},
                        "language": {"type": "string", "description": "Override the detected language"},
                        "max_serialized_nodes": {"type": "integer", "minimum": 1, "default": 500},
                        "max_serialized_depth": {"type": "integer", "minimum": 1, "default": 6}
                    },
                    "required": ["file_path"]
                }),
            ),
            schema(
                "extract_symbols",
                "Extract functions, classes, and normalized imports from one source file.",
                json!({
                    "type": "object",
                    "properties": {"file_path": {"type": "string"}},
                    "required": ["file_path"]
                }),
            ),
            schema(
                "analyze_code_metrics",
                "Compute line, comment, complexity, and maintainability metrics for a file.",
                json!({
                    "type": "object",
                    "properties": {"file_path": {"type": "string"}},
                    "required": ["file_path"]
                }),
            ),
            schema(
                "analyze_type_usage",
                "Extract typed symbols, signatures, generics, and casts from a statically-typed file.",
                json!({
                    "type": "object",
                    "properties": {"file_path": {"type": "string"}},
                    "required": ["file_path"]
                }),
            ),
            schema(
                "analyze_dynamic_constructs",
                "Scan a dynamic-language file for eval, reflection, runtime hooks, and serialization risks.",
                json!({
                    "type": "object",
                    "properties": {"file_path": {"type": "string"}},
                    "required": ["file_path"]
                }),
            ),
            schema(
                "scan_directory",
                "Walk a directory tree, detect languages, and aggregate metrics per language and directory.",
                json!({"type": "object", "properties": scope_properties(), "required": []}),
            ),
            schema(
                "build_dependency_graph",
                "Resolve imports to file nodes and emit edges, reverse edges, and canonicalized cycles.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "recursive": {"type": "boolean", "default": true},
                        "extensions": {"type": "array", "items": {"type": "string"}},
                        "include_external_dependencies": {"type": "boolean", "default": false}
                    },
                    "required": []
                }),
            ),
            schema(
                "classify_file_impact",
                "Classify changed files into create/modify/delete groups from the working tree or a ref diff.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "base_ref": {"type": "string"},
                        "target_ref": {"type": "string"},
                        "include_untracked": {"type": "boolean", "default": false},
                        "subdirectory": {"type": "string", "description": "Restrict the diff to one subdirectory"}
                    },
                    "required": []
                }),
            ),
            schema(
                "trace_downstream_dependencies",
                "BFS the reverse call graph from seed files (auto-detected from the change set when omitted).",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "seeds": {"type": "array", "items": {"type": "string"}},
                        "max_depth": {"type": "integer", "minimum": 1, "maximum": 10, "default": 5},
                        "base_ref": {"type": "string"},
                        "include_untracked": {"type": "boolean", "default": false}
                    },
                    "required": []
                }),
            ),
            schema(
                "detect_breaking_changes",
                "Diff public contract surfaces across revisions: removals, signature changes, lost contract files.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "base_ref": {"type": "string"},
                        "target_ref": {"type": "string"},
                        "max_findings": {"type": "integer", "minimum": 1, "default": 200}
                    },
                    "required": ["base_ref"]
                }),
            ),
            schema(
                "analyze_type_system_changes",
                "Diff typed symbols and signatures across revisions for statically-typed files.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "base_ref": {"type": "string"},
                        "target_ref": {"type": "string"}
                    },
                    "required": ["base_ref"]
                }),
            ),
            schema(
                "assess_test_impact",
                "Classify test files, relate them to changed sources, and size the regression scope.",
                json!({"type": "object", "properties": diff_properties(), "required": []}),
            ),
            schema(
                "assess_change_risk",
                "Aggregate change, contract, type, and test signals into a weighted risk score and level.",
                json!({"type": "object", "properties": diff_properties(), "required": []}),
            ),
            schema(
                "attribute_features",
                "Group impacted files into product-feature buckets with communication priorities.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "base_ref": {"type": "string"},
                        "target_ref": {"type": "string"},
                        "include_untracked": {"type": "boolean", "default": false},
                        "max_features": {"type": "integer", "minimum": 1, "default": 10}
                    },
                    "required": []
                }),
            ),
            schema(
                "infer_architecture",
                "Build the component inventory and infer architecture patterns, optionally LLM-refined.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "recursive": {"type": "boolean", "default": true},
                        "system_name": {"type": "string"},
                        "use_llm": {"type": "boolean", "default": false}
                    },
                    "required": []
                }),
            ),
            schema(
                "generate_c4_model",
                "Generate the C4 context/container/component model from the inferred architecture.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "recursive": {"type": "boolean", "default": true},
                        "system_name": {"type": "string"}
                    },
                    "required": []
                }),
            ),
            schema(
                "render_c4_diagrams",
                "Render the C4 model as three Mermaid flowcharts plus a combined markdown blob.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "recursive": {"type": "boolean", "default": true},
                        "system_name": {"type": "string"}
                    },
                    "required": []
                }),
            ),
            schema(
                "annotate_architecture",
                "Produce confirmation questions over the inferred model and apply annotation operations to a copy.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "system_name": {"type": "string"},
                        "max_questions": {"type": "integer", "minimum": 1, "default": 10},
                        "operations": {"type": "array", "items": {"type": "object"}, "description": "Tagged annotation operations (op: set_system_name, rename_container, ...)"}
                    },
                    "required": []
                }),
            ),
            schema(
                "generate_change_procedure",
                "Generate the ordered end-to-end procedure for landing a change.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "objective": {"type": "string"},
                        "ticket_id": {"type": "string"},
                        "change_type": {"type": "string", "description": "feature|fix|hotfix|refactor|chore|breaking|exp; heuristic fallback on unknown"},
                        "base_ref": {"type": "string"},
                        "include_untracked": {"type": "boolean", "default": false},
                        "max_steps": {"type": "integer", "minimum": 1, "default": 12}
                    },
                    "required": []
                }),
            ),
            schema(
                "generate_git_workflow",
                "Generate branch naming, PR template, required checks, and merge policy for a change.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "objective": {"type": "string"},
                        "ticket_id": {"type": "string"},
                        "change_type": {"type": "string"},
                        "base_branch": {"type": "string", "default": "main"},
                        "base_ref": {"type": "string"},
                        "include_untracked": {"type": "boolean", "default": false}
                    },
                    "required": []
                }),
            ),
            schema(
                "plan_commit_sequence",
                "Plan ordered conventional commits over the change set with file scopes.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "objective": {"type": "string"},
                        "ticket_id": {"type": "string"},
                        "change_type": {"type": "string"},
                        "base_ref": {"type": "string"},
                        "include_untracked": {"type": "boolean", "default": false},
                        "max_commits": {"type": "integer", "minimum": 1, "default": 12}
                    },
                    "required": []
                }),
            ),
            schema(
                "generate_rollback_plan",
                "Generate rollback triggers and ordered recovery steps for a change.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "base_ref": {"type": "string"},
                        "include_untracked": {"type": "boolean", "default": false},
                        "include_data_safety_checks": {"type": "boolean", "default": true},
                        "deployment_environment": {"type": "string"},
                        "uses_feature_flag": {"type": "boolean", "default": false}
                    },
                    "required": []
                }),
            ),
            schema(
                "generate_feature_flag_strategy",
                "Generate a flag key, phased exposure schedule, kill switch, and monitoring list.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "objective": {"type": "string"},
                        "flag_key_prefix": {"type": "string"},
                        "include_experiment_support": {"type": "boolean", "default": false},
                        "base_ref": {"type": "string"},
                        "include_untracked": {"type": "boolean", "default": false}
                    },
                    "required": []
                }),
            ),
            schema(
                "generate_rollout_plan",
                "Plan a multi-phase rollout with entry/exit criteria sized by complexity and risk.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "base_ref": {"type": "string"},
                        "include_untracked": {"type": "boolean", "default": false},
                        "environments": {"type": "array", "items": {"type": "string"}},
                        "max_phases": {"type": "integer", "minimum": 1, "maximum": 5, "default": 5}
                    },
                    "required": []
                }),
            ),
            schema(
                "generate_migration_strategy",
                "Select expand-contract, staged, or direct migration with per-tool command hints.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory_path": {"type": "string", "default": "."},
                        "base_ref": {"type": "string"},
                        "include_untracked": {"type": "boolean", "default": false},
                        "migration_tool": {"type": "string", "description": "alembic|django|prisma|flyway|liquibase or any; unknown tools get generic hints"},
                        "database_engine": {"type": "string"},
                        "deployment_environment": {"type": "string"},
                        "include_command_examples": {"type": "boolean", "default": true}
                    },
                    "required": []
                }),
            ),
            schema(
                "prepare_repository",
                "Clone a repository or reuse the cached copy; resolves branch and commit SHA.",
                json!({
                    "type": "object",
                    "properties": {
                        "repository_url": {"type": "string"},
                        "branch_name": {"type": "string"},
                        "directory_scope": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["repository_url"]
                }),
            ),
        ]
    }

    pub fn get_by_name(name: &str) -> Option<ToolSchema> {
        Self::all().into_iter().find(|s| s.name == name)
    }

    pub fn tool_names() -> Vec<String> {
        Self::all().into_iter().map(|s| s.name).collect()
    }
}
