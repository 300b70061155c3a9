// ABOUTME: Injected completion capability: trait, task-complexity hint, lenient parsing.
// ABOUTME: Analyzers stay valid without any provider; refinement only ever adds prose.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub type AiResult<T> = anyhow::Result<T>;

/// Routing hint for providers that select models by task weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskComplexity {
    Simple,
    Standard,
    Complex,
}

/// The single capability the core consumes. Implementations decide model,
/// transport, and retries; tools only thread the complexity hint through.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a plain-text completion.
    async fn complete(&self, prompt: &str, complexity: TaskComplexity) -> AiResult<String>;

    /// Whether the provider is ready; callers degrade gracefully when not.
    async fn is_available(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &str;
}

/// Strip markdown code fences from a model response.
pub fn strip_code_fences(response: &str) -> String {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the info string on the opening fence line.
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    let body = rest.strip_suffix("```").unwrap_or(rest);
    body.trim().to_string()
}

/// Extract the first balanced `{...}` block from a response.
pub fn extract_first_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in response[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&response[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Lenient JSON parse: strip fences, then take the first `{...}` block.
/// Returns `None` on any failure; structured results must stay valid
/// without refinement.
pub fn parse_json_leniently(response: &str) -> Option<JsonValue> {
    let cleaned = strip_code_fences(response);
    if let Ok(value) = serde_json::from_str::<JsonValue>(&cleaned) {
        if value.is_object() {
            return Some(value);
        }
    }
    let block = extract_first_json_object(&cleaned)?;
    serde_json::from_str(block).ok()
}

/// Enrichment block attached to envelopes when a provider was consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmEnrichment {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl LlmEnrichment {
    pub fn unavailable() -> Self {
        Self {
            status: "unavailable".to_string(),
            summary: None,
            provider: None,
        }
    }

    pub fn from_summary(provider: &str, summary: String) -> Self {
        Self {
            status: "success".to_string(),
            summary: Some(summary),
            provider: Some(provider.to_string()),
        }
    }

    pub fn failed() -> Self {
        Self {
            status: "parse_failure".to_string(),
            summary: None,
            provider: None,
        }
    }
}

/// Deterministic provider for tests: echoes a canned response.
pub struct StaticProvider {
    pub response: String,
}

#[async_trait]
impl CompletionProvider for StaticProvider {
    async fn complete(&self, _prompt: &str, _complexity: TaskComplexity) -> AiResult<String> {
        Ok(self.response.clone())
    }

    fn provider_name(&self) -> &str {
        "static"
    }
}
