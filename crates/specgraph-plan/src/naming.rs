// ABOUTME: Ticket tokens, slugs, branch names, and change-type resolution shared by the
// ABOUTME: planning generators.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use specgraph_core::RiskLevel;

pub const MAX_BRANCH_LENGTH: usize = 80;
pub const MAX_TICKET_LENGTH: usize = 32;
pub const MAX_SLUG_TOKENS: usize = 6;

static PROJECT_TICKET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*-\d+$").expect("static pattern"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("static pattern"));

/// Normalize free-form ticket input: bare digits become `TICKET-N`,
/// `PROJ-123` shapes are preserved uppercased, anything else is
/// slug-uppercased and truncated.
pub fn normalize_ticket(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if DIGITS.is_match(raw) {
        return Some(format!("TICKET-{raw}"));
    }
    if PROJECT_TICKET.is_match(raw) {
        return Some(raw.to_uppercase());
    }
    let slugged = slug(raw, MAX_SLUG_TOKENS).to_uppercase();
    if slugged.is_empty() {
        return None;
    }
    Some(slugged.chars().take(MAX_TICKET_LENGTH).collect())
}

/// Lowercase, non-alphanumerics to `-`, collapse runs, cap token count.
pub fn slug(text: &str, max_tokens: usize) -> String {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .take(max_tokens)
        .collect();
    tokens.join("-")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Feature,
    Fix,
    Hotfix,
    Refactor,
    Chore,
    Breaking,
    Exp,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Feature => "feature",
            ChangeType::Fix => "fix",
            ChangeType::Hotfix => "hotfix",
            ChangeType::Refactor => "refactor",
            ChangeType::Chore => "chore",
            ChangeType::Breaking => "breaking",
            ChangeType::Exp => "exp",
        }
    }

    /// Conventional-commit type for messages.
    pub fn commit_type(&self) -> &'static str {
        match self {
            ChangeType::Feature | ChangeType::Exp => "feat",
            ChangeType::Fix | ChangeType::Hotfix => "fix",
            ChangeType::Refactor | ChangeType::Breaking => "refactor",
            ChangeType::Chore => "chore",
        }
    }

    /// Lenient parse; unknown values fall through to heuristic resolution.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "feature" | "feat" => Some(ChangeType::Feature),
            "fix" | "bugfix" | "bug" => Some(ChangeType::Fix),
            "hotfix" => Some(ChangeType::Hotfix),
            "refactor" => Some(ChangeType::Refactor),
            "chore" => Some(ChangeType::Chore),
            "breaking" => Some(ChangeType::Breaking),
            "exp" | "experiment" => Some(ChangeType::Exp),
            _ => None,
        }
    }
}

/// Signals feeding change-type resolution when no explicit type is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeSignals {
    pub breaking_count: usize,
    pub is_urgent: bool,
    pub deleted_count: usize,
    pub created_count: usize,
    pub modified_count: usize,
    pub risk_level: Option<RiskLevel>,
}

/// Resolution order: breaking > hotfix > refactor on deletions > feature on
/// creations > fix on high risk > chore.
pub fn resolve_change_type(explicit: Option<&str>, signals: &ChangeSignals) -> ChangeType {
    if let Some(parsed) = explicit.and_then(ChangeType::parse) {
        return parsed;
    }
    if signals.breaking_count > 0 {
        return ChangeType::Breaking;
    }
    if signals.is_urgent {
        return ChangeType::Hotfix;
    }
    if signals.deleted_count > 0 {
        return ChangeType::Refactor;
    }
    if signals.created_count > 0 {
        return ChangeType::Feature;
    }
    if matches!(
        signals.risk_level,
        Some(RiskLevel::High) | Some(RiskLevel::Critical)
    ) {
        return ChangeType::Fix;
    }
    ChangeType::Chore
}

/// `<prefix>/<TICKET-or-scope>-<slug>`, capped at 80 chars.
pub fn branch_name(change_type: ChangeType, ticket: Option<&str>, objective: &str) -> String {
    let prefix = change_type.as_str();
    let objective_slug = slug(objective, MAX_SLUG_TOKENS);
    let middle = match normalize_ticket(ticket) {
        Some(ticket) => ticket,
        None => slug(objective, 2).to_uppercase(),
    };
    let mut name = if objective_slug.is_empty() {
        format!("{prefix}/{middle}")
    } else {
        format!("{prefix}/{middle}-{objective_slug}")
    };
    if name.len() > MAX_BRANCH_LENGTH {
        name.truncate(MAX_BRANCH_LENGTH);
        let trimmed = name.trim_end_matches('-').to_string();
        name = trimmed;
    }
    name
}

/// `<type>(<scope>): <summary> [<TICKET>]` per conventional commits.
pub fn commit_message(
    change_type: ChangeType,
    scope: &str,
    summary: &str,
    ticket: Option<&str>,
) -> String {
    let scope_slug = slug(scope, 2);
    let header = if scope_slug.is_empty() {
        format!("{}: {}", change_type.commit_type(), summary)
    } else {
        format!("{}({}): {}", change_type.commit_type(), scope_slug, summary)
    };
    match normalize_ticket(ticket) {
        Some(ticket) => format!("{header} [{ticket}]"),
        None => header,
    }
}
