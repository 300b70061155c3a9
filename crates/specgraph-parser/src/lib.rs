pub mod ast;
pub mod detector;
pub mod dynamic;
pub mod extract;
pub mod metrics;
pub mod scanner;
pub mod typed;

pub use ast::{simple_parse, AstSummary, TreeSitterAdapter};
pub use detector::{detect_language, DetectionMethod, LanguageDetection};
pub use dynamic::{analyze_dynamic, DynamicAnalysis};
pub use extract::{
    extract_call_tokens, extract_classes, extract_function_names, extract_functions,
    extract_imports, ClassRecord, FunctionRecord, ImportRecord, ImportType,
};
pub use metrics::{compute_metrics, CodeMetrics};
pub use scanner::{scan_directory, ScanConfig, ScanResult};
pub use typed::{analyze_types, TypeAnalysis, UNSAFE_TYPE_MARKERS};
