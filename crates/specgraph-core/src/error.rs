use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpecGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Git error: {0}")]
    Git(String),

    #[error("Git command timed out: {0}")]
    GitTimeout(String),

    #[error("Repository clone error: {0}")]
    CloneCache(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, SpecGraphError>;
