// ABOUTME: CLI front end: parses a tool request from flags or raw JSON and prints the envelope.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use specgraph_tools::{ToolCatalog, ToolExecutor};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "specgraph", about = "Brownfield repository analysis toolchain", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the tool catalog with input schemas.
    Tools {
        /// Print only tool names.
        #[arg(long)]
        names: bool,
    },
    /// Execute a raw JSON tool request: '{"tool": "...", ...}'.
    Run {
        /// The request payload.
        json: String,
    },
    /// Scan a directory and aggregate code metrics.
    Scan {
        #[arg(default_value = ".")]
        directory: String,
        #[arg(long)]
        no_recursive: bool,
    },
    /// Build the dependency graph for a directory.
    Graph {
        #[arg(default_value = ".")]
        directory: String,
        /// Include unresolved external modules as edges.
        #[arg(long)]
        external: bool,
    },
    /// Aggregate change risk for a repository.
    Risk {
        #[arg(default_value = ".")]
        directory: String,
        #[arg(long)]
        base_ref: Option<String>,
        #[arg(long)]
        include_untracked: bool,
    },
    /// Generate the C4 model (or Mermaid diagrams) for a repository.
    C4 {
        #[arg(default_value = ".")]
        directory: String,
        #[arg(long)]
        system_name: Option<String>,
        /// Emit Mermaid diagrams instead of the structured model.
        #[arg(long)]
        mermaid: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let executor = ToolExecutor::new();

    let output = match cli.command {
        Command::Tools { names } => {
            if names {
                serde_json::to_value(ToolCatalog::tool_names())?
            } else {
                serde_json::to_value(ToolCatalog::all())?
            }
        }
        Command::Run { json } => {
            let request: serde_json::Value = serde_json::from_str(&json)?;
            executor.execute_value(request).await
        }
        Command::Scan {
            directory,
            no_recursive,
        } => {
            executor
                .execute_value(json!({
                    "tool": "scan_directory",
                    "directory_path": directory,
                    "recursive": !no_recursive,
                }))
                .await
        }
        Command::Graph {
            directory,
            external,
        } => {
            executor
                .execute_value(json!({
                    "tool": "build_dependency_graph",
                    "directory_path": directory,
                    "include_external_dependencies": external,
                }))
                .await
        }
        Command::Risk {
            directory,
            base_ref,
            include_untracked,
        } => {
            let mut request = json!({
                "tool": "assess_change_risk",
                "directory_path": directory,
                "include_untracked": include_untracked,
            });
            if let Some(base) = base_ref {
                request["base_ref"] = json!(base);
            }
            executor.execute_value(request).await
        }
        Command::C4 {
            directory,
            system_name,
            mermaid,
        } => {
            let tool = if mermaid {
                "render_c4_diagrams"
            } else {
                "generate_c4_model"
            };
            let mut request = json!({
                "tool": tool,
                "directory_path": directory,
            });
            if let Some(name) = system_name {
                request["system_name"] = json!(name);
            }
            executor.execute_value(request).await
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
