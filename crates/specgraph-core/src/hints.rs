// ABOUTME: Closed lexical hint sets used across analyzers.
// ABOUTME: These sets are part of the tool contract; keep them stable.

/// Top-level directory names excluded from component inventories and scans.
pub const NOISE_PARTS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    "node_modules",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".venv",
    "venv",
    "env",
    "dist",
    "build",
    "target",
    "out",
    "coverage",
    ".next",
    ".nuxt",
    "vendor",
    ".tox",
];

/// Directory names that mark a path as part of a public API contract.
pub const API_PATH_HINTS: &[&str] = &["api", "schema", "schemas", "contract", "contracts", "interface", "interfaces", "dto"];

/// File extensions that mark a file as contract-bearing.
pub const CONTRACT_EXTENSIONS: &[&str] = &[".proto", ".graphql", ".avsc", ".yaml", ".yml", ".json"];

/// Directory names that mark a path as test code.
pub const TEST_DIR_HINTS: &[&str] = &[
    "test",
    "tests",
    "__tests__",
    "spec",
    "specs",
    "e2e",
    "integration",
];

/// Test file suffixes (matched against the lowercased file name).
pub const TEST_FILE_SUFFIXES: &[&str] = &[
    "_test.py",
    "_tests.py",
    ".test.ts",
    ".test.tsx",
    ".spec.ts",
    ".spec.tsx",
    ".test.js",
    ".test.jsx",
    ".spec.js",
    "_test.go",
    "_spec.rb",
    "_test.rb",
    "test.java",
    "tests.java",
    "test.cs",
    "tests.cs",
    "test.php",
    ".feature",
];

/// Tokens ignored when relating source files to tests by path-token overlap.
pub const NOISE_TOKENS: &[&str] = &[
    "src", "lib", "app", "apps", "main", "index", "core", "common", "utils", "util", "shared",
    "internal", "pkg", "mod", "module", "modules", "impl",
];

/// Minimum token length considered meaningful for test relation.
pub const MIN_RELATION_TOKEN_LEN: usize = 3;

/// True when any path segment is a contract-hint directory or the file
/// carries a contract-bearing extension. Purely lexical.
pub fn is_contract_hint_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    let has_hint_dir = lower
        .split('/')
        .rev()
        .skip(1)
        .any(|segment| API_PATH_HINTS.contains(&segment));
    if has_hint_dir {
        return true;
    }
    CONTRACT_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_hint_matches_api_directory() {
        assert!(is_contract_hint_path("src/api/users.ts"));
        assert!(is_contract_hint_path("backend/schemas/order.py"));
        assert!(is_contract_hint_path("specs/openapi.yaml"));
        assert!(is_contract_hint_path("idl/events.proto"));
    }

    #[test]
    fn contract_hint_ignores_plain_sources() {
        assert!(!is_contract_hint_path("src/services/user_service.py"));
        assert!(!is_contract_hint_path("lib/helpers.rb"));
    }

    #[test]
    fn file_named_api_is_not_a_directory_hint() {
        // Only directory segments count for the name-based hint; the file
        // itself must match by extension.
        assert!(!is_contract_hint_path("src/api.ts"));
        assert!(is_contract_hint_path("src/api.json"));
    }
}
