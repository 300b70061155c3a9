// End-to-end scenarios driving the tool surface over real fixture repositories.

use serde_json::json;
use specgraph_tools::ToolExecutor;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .expect("git must be runnable in tests");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn init_repo(dir: &Path) {
    git(dir, &["init", "-q", "-b", "main"]);
    git(dir, &["config", "user.email", "dev@example.com"]);
    git(dir, &["config", "user.name", "Dev"]);
}

fn commit_all(dir: &Path, message: &str) {
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", message]);
}

#[tokio::test]
async fn python_minimal_repo_pipeline() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("a")).unwrap();
    fs::write(dir.path().join("a/__init__.py"), "").unwrap();
    fs::write(
        dir.path().join("a/m.py"),
        "from . import helpers\ndef f(x: int) -> int: ...\n",
    )
    .unwrap();
    fs::write(dir.path().join("a/helpers.py"), "def g(): ...\n").unwrap();
    let executor = ToolExecutor::new();
    let root = dir.path().to_string_lossy().to_string();

    let detection = executor
        .execute_value(json!({
            "tool": "detect_language",
            "file_path": dir.path().join("a/m.py").to_string_lossy(),
        }))
        .await;
    assert_eq!(detection["status"], "success");
    assert_eq!(detection["language"], "python");
    assert_eq!(detection["detected_by"], "extension");

    let graph = executor
        .execute_value(json!({"tool": "build_dependency_graph", "directory_path": root}))
        .await;
    let edges = graph["edges"].as_array().unwrap();
    assert!(edges
        .iter()
        .any(|e| e["source"] == "a/m.py" && e["target"] == "a/helpers.py"));

    let metrics = executor
        .execute_value(json!({
            "tool": "analyze_code_metrics",
            "file_path": dir.path().join("a/m.py").to_string_lossy(),
        }))
        .await;
    // One line of code: the import is tallied separately.
    assert_eq!(metrics["code_lines"], 1);
    assert_eq!(metrics["import_lines"], 1);
    assert_eq!(metrics["cyclomatic_complexity"], 1);
}

#[tokio::test]
async fn cycle_detection_canonical_rotation() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("x.py"), "import y\n").unwrap();
    fs::write(dir.path().join("y.py"), "import z\n").unwrap();
    fs::write(dir.path().join("z.py"), "import x\n").unwrap();
    let executor = ToolExecutor::new();

    let graph = executor
        .execute_value(json!({
            "tool": "build_dependency_graph",
            "directory_path": dir.path().to_string_lossy(),
        }))
        .await;
    assert_eq!(graph["status"], "success");
    assert_eq!(graph["cycle_count"], 1);
    assert_eq!(graph["cycles"][0], json!(["x.py", "y.py", "z.py"]));
}

#[tokio::test]
async fn cycle_feeds_risk_factor() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    fs::write(dir.path().join("x.py"), "import y\n").unwrap();
    fs::write(dir.path().join("y.py"), "import z\n").unwrap();
    fs::write(dir.path().join("z.py"), "import x\n").unwrap();
    commit_all(dir.path(), "init");
    fs::write(dir.path().join("x.py"), "import y\nVALUE = 2\n").unwrap();

    let executor = ToolExecutor::new();
    let risk = executor
        .execute_value(json!({
            "tool": "assess_change_risk",
            "directory_path": dir.path().to_string_lossy(),
        }))
        .await;
    assert_eq!(risk["status"], "success");
    let factors: Vec<&str> = risk["risk_factors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert!(factors.contains(&"cyclic_dependency_hotspot"), "{factors:?}");
}

#[tokio::test]
async fn breaking_change_in_typescript_signature() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(
        dir.path().join("src/users.ts"),
        "export function getUser(id: string): User { return find(id); }\n",
    )
    .unwrap();
    commit_all(dir.path(), "init");
    fs::write(
        dir.path().join("src/users.ts"),
        "export function getUser(id: string, tenant: string): User { return find(id, tenant); }\n",
    )
    .unwrap();

    let executor = ToolExecutor::new();
    let report = executor
        .execute_value(json!({
            "tool": "detect_breaking_changes",
            "directory_path": dir.path().to_string_lossy(),
            "base_ref": "HEAD",
        }))
        .await;
    assert_eq!(report["status"], "success");
    let findings = report["findings"].as_array().unwrap();
    let finding = findings
        .iter()
        .find(|f| f["category"] == "api_contract_signature_change")
        .expect("signature change finding");
    assert_eq!(finding["severity"], "medium");
    assert_eq!(finding["old_signature"], "(id: string)");
    assert_eq!(finding["new_signature"], "(id: string, tenant: string)");

    let risk = executor
        .execute_value(json!({
            "tool": "assess_change_risk",
            "directory_path": dir.path().to_string_lossy(),
        }))
        .await;
    let breaking_factor = risk["risk_factors"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "breaking_change_risk")
        .expect("breaking change factor");
    assert_eq!(breaking_factor["severity"], "medium");
}

#[tokio::test]
async fn deletion_cascade_on_contract_file() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    fs::create_dir_all(dir.path().join("src/api")).unwrap();
    fs::write(
        dir.path().join("src/api/users.ts"),
        concat!(
            "export function getUser(id: string): User { return find(id); }\n",
            "export function listUsers(): User[] { return all(); }\n",
        ),
    )
    .unwrap();
    commit_all(dir.path(), "init");
    fs::remove_file(dir.path().join("src/api/users.ts")).unwrap();

    let executor = ToolExecutor::new();
    let classification = executor
        .execute_value(json!({
            "tool": "classify_file_impact",
            "directory_path": dir.path().to_string_lossy(),
        }))
        .await;
    assert_eq!(classification["delete"][0], "src/api/users.ts");

    let report = executor
        .execute_value(json!({
            "tool": "detect_breaking_changes",
            "directory_path": dir.path().to_string_lossy(),
            "base_ref": "HEAD",
        }))
        .await;
    let findings = report["findings"].as_array().unwrap();
    let removals: Vec<_> = findings
        .iter()
        .filter(|f| f["category"] == "api_contract_removal")
        .collect();
    assert!(removals.len() >= 2, "one removal per exported symbol");
    for removal in removals {
        assert_eq!(removal["severity"], "high");
    }
}

#[tokio::test]
async fn deleted_contract_file_without_surface() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    fs::create_dir_all(dir.path().join("src/api")).unwrap();
    fs::write(dir.path().join("src/api/notes.ts"), "// placeholder\n").unwrap();
    commit_all(dir.path(), "init");
    fs::remove_file(dir.path().join("src/api/notes.ts")).unwrap();

    let executor = ToolExecutor::new();
    let report = executor
        .execute_value(json!({
            "tool": "detect_breaking_changes",
            "directory_path": dir.path().to_string_lossy(),
            "base_ref": "HEAD",
        }))
        .await;
    let findings = report["findings"].as_array().unwrap();
    assert!(findings
        .iter()
        .any(|f| f["category"] == "deleted_api_contract_file" && f["severity"] == "high"));
}

#[tokio::test]
async fn git_workflow_for_breaking_change() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    fs::create_dir_all(dir.path().join("src/api")).unwrap();
    fs::write(
        dir.path().join("src/api/users.ts"),
        "export function getUser(id: string): User { return find(id); }\n",
    )
    .unwrap();
    commit_all(dir.path(), "init");
    // Remove the exported function: a contract removal, hence breaking.
    fs::write(dir.path().join("src/api/users.ts"), "const nothing = 1;\n").unwrap();

    let executor = ToolExecutor::new();
    let workflow = executor
        .execute_value(json!({
            "tool": "generate_git_workflow",
            "directory_path": dir.path().to_string_lossy(),
            "objective": "drop user lookup endpoint",
            "ticket_id": "279",
        }))
        .await;
    assert_eq!(workflow["status"], "success");
    let branch = workflow["branch_naming"]["branch_name"].as_str().unwrap();
    assert!(
        branch.starts_with("breaking/TICKET-279-"),
        "branch was {branch}"
    );
    assert_eq!(workflow["merge_policy"]["strategy"], "merge-commit");
    let checks: Vec<&str> = workflow["required_checks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    assert!(checks.contains(&"API/contract compatibility review"));
    assert_eq!(workflow["workflow_model"], "trunk-based-with-release-gates");
}

#[tokio::test]
async fn empty_repository_yields_zeroed_success() {
    let dir = TempDir::new().unwrap();
    let executor = ToolExecutor::new();
    let root = dir.path().to_string_lossy().to_string();

    let scan = executor
        .execute_value(json!({"tool": "scan_directory", "directory_path": root}))
        .await;
    assert_eq!(scan["status"], "success");
    assert_eq!(scan["totals"]["file_count"], 0);

    let graph = executor
        .execute_value(json!({"tool": "build_dependency_graph", "directory_path": root}))
        .await;
    assert_eq!(graph["status"], "success");
    assert_eq!(graph["cycle_count"], 0);
    assert_eq!(graph["edges"], json!([]));
}

#[tokio::test]
async fn reruns_are_deterministic() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("x.py"), "import y\n").unwrap();
    fs::write(dir.path().join("y.py"), "def h(): ...\n").unwrap();
    let executor = ToolExecutor::new();
    let request = json!({
        "tool": "build_dependency_graph",
        "directory_path": dir.path().to_string_lossy(),
    });
    let first = executor.execute_value(request.clone()).await;
    let second = executor.execute_value(request).await;
    assert_eq!(first, second);
}
