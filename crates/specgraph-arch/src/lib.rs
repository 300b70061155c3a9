pub mod annotate;
pub mod c4;
pub mod inventory;
pub mod mermaid;

pub use annotate::{
    apply_annotations, generate_questions, AnnotationOp, AnnotationOutcome, ConfirmationQuestion,
    DEFAULT_MAX_QUESTIONS,
};
pub use c4::{generate_c4, C4Model, MAX_CONTAINERS};
pub use inventory::{build_inventory, classify_component, Component, ComponentInventory};
pub use mermaid::{render, MermaidDiagrams};

/// Language name for a repo-relative path, extension only.
pub(crate) fn inventory_language(path: &str) -> String {
    specgraph_core::paths::extension(path)
        .and_then(|ext| specgraph_parser::detector::language_for_extension(&ext))
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
