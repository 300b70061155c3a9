pub mod envelope;
pub mod error;
pub mod hints;
pub mod paths;
pub mod types;

pub use error::{Result, SpecGraphError};
pub use types::{ComplexityLevel, FileNode, ImpactKind, Language, RiskLevel, Severity};
