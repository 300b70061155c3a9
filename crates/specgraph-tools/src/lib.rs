pub mod executor;
pub mod request;
pub mod schemas;

pub use executor::ToolExecutor;
pub use request::ToolRequest;
pub use schemas::{ToolCatalog, ToolSchema};
