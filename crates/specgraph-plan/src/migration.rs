// ABOUTME: Database migration strategy: expand-contract, staged, or direct, with per-tool
// ABOUTME: command hints for recognized migration tools.

use serde::{Deserialize, Serialize};
use specgraph_core::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationKind {
    ExpandContract,
    StagedMigration,
    DirectMigration,
}

impl MigrationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationKind::ExpandContract => "expand_contract",
            MigrationKind::StagedMigration => "staged_migration",
            MigrationKind::DirectMigration => "direct_migration",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationPhase {
    pub phase_number: usize,
    pub name: String,
    pub description: String,
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationStrategy {
    pub strategy: MigrationKind,
    pub rationale: String,
    pub phases: Vec<MigrationPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration_tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_engine: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MigrationRequest {
    pub risk_level: Option<RiskLevel>,
    pub breaking_count: usize,
    pub schema_change_count: usize,
    pub deployment_environment: Option<String>,
    pub migration_tool: Option<String>,
    pub database_engine: Option<String>,
    pub include_command_examples: bool,
}

fn choose_strategy(request: &MigrationRequest) -> (MigrationKind, String) {
    let production = request
        .deployment_environment
        .as_deref()
        .map(|e| e.eq_ignore_ascii_case("production") || e.eq_ignore_ascii_case("prod"))
        .unwrap_or(true);
    let risky = matches!(
        request.risk_level,
        Some(RiskLevel::High) | Some(RiskLevel::Critical)
    );

    if request.schema_change_count == 0 && request.breaking_count == 0 {
        return (
            MigrationKind::DirectMigration,
            "No schema or contract changes detected; a direct migration is safe".to_string(),
        );
    }
    if production && (request.breaking_count > 0 || risky) {
        return (
            MigrationKind::ExpandContract,
            "Breaking or high-risk schema changes in production require expand-contract"
                .to_string(),
        );
    }
    if request.schema_change_count > 0 {
        return (
            MigrationKind::StagedMigration,
            "Schema changes without breaking consumers; stage the migration per environment"
                .to_string(),
        );
    }
    (
        MigrationKind::DirectMigration,
        "Low-risk change outside production".to_string(),
    )
}

fn tool_commands(tool: Option<&str>, action: &str) -> Vec<String> {
    match tool.map(|t| t.to_lowercase()) {
        Some(t) if t == "alembic" => match action {
            "generate" => vec!["alembic revision --autogenerate -m \"<description>\"".to_string()],
            "apply" => vec!["alembic upgrade head".to_string()],
            "rollback" => vec!["alembic downgrade -1".to_string()],
            _ => vec![],
        },
        Some(t) if t == "django" => match action {
            "generate" => vec!["python manage.py makemigrations".to_string()],
            "apply" => vec!["python manage.py migrate".to_string()],
            "rollback" => vec!["python manage.py migrate <app> <previous_migration>".to_string()],
            _ => vec![],
        },
        Some(t) if t == "prisma" => match action {
            "generate" => vec!["prisma migrate dev --name <description>".to_string()],
            "apply" => vec!["prisma migrate deploy".to_string()],
            "rollback" => vec!["prisma migrate resolve --rolled-back <migration>".to_string()],
            _ => vec![],
        },
        Some(t) if t == "flyway" => match action {
            "generate" => vec!["create V<version>__<description>.sql under db/migration".to_string()],
            "apply" => vec!["flyway migrate".to_string()],
            "rollback" => vec!["flyway undo".to_string()],
            _ => vec![],
        },
        Some(t) if t == "liquibase" => match action {
            "generate" => vec!["liquibase generate-changelog".to_string()],
            "apply" => vec!["liquibase update".to_string()],
            "rollback" => vec!["liquibase rollback-count 1".to_string()],
            _ => vec![],
        },
        _ => match action {
            "generate" => vec!["<create a migration with your schema tool>".to_string()],
            "apply" => vec!["<apply pending migrations>".to_string()],
            "rollback" => vec!["<roll back the last migration>".to_string()],
            _ => vec![],
        },
    }
}

/// Select and elaborate the migration strategy for a change set.
pub fn generate_migration_strategy(request: &MigrationRequest) -> MigrationStrategy {
    let (strategy, rationale) = choose_strategy(request);
    let tool = request.migration_tool.as_deref();
    let commands = |action: &str| {
        if request.include_command_examples {
            tool_commands(tool, action)
        } else {
            Vec::new()
        }
    };

    let phases: Vec<MigrationPhase> = match strategy {
        MigrationKind::ExpandContract => vec![
            MigrationPhase {
                phase_number: 1,
                name: "expand".to_string(),
                description: "Add new columns/tables additively; old readers keep working"
                    .to_string(),
                commands: commands("generate")
                    .into_iter()
                    .chain(commands("apply"))
                    .collect(),
            },
            MigrationPhase {
                phase_number: 2,
                name: "dual_write".to_string(),
                description: "Write both shapes during cutover; backfill historical rows"
                    .to_string(),
                commands: Vec::new(),
            },
            MigrationPhase {
                phase_number: 3,
                name: "migrate_readers".to_string(),
                description: "Move readers to the new shape behind the rollout".to_string(),
                commands: Vec::new(),
            },
            MigrationPhase {
                phase_number: 4,
                name: "contract".to_string(),
                description: "Remove the old shape only after a stable bake period".to_string(),
                commands: commands("generate"),
            },
        ],
        MigrationKind::StagedMigration => vec![
            MigrationPhase {
                phase_number: 1,
                name: "prepare".to_string(),
                description: "Generate and review migrations".to_string(),
                commands: commands("generate"),
            },
            MigrationPhase {
                phase_number: 2,
                name: "apply_staging".to_string(),
                description: "Apply to staging and run verification".to_string(),
                commands: commands("apply"),
            },
            MigrationPhase {
                phase_number: 3,
                name: "apply_production".to_string(),
                description: "Apply to production inside a maintenance-safe window".to_string(),
                commands: commands("apply"),
            },
        ],
        MigrationKind::DirectMigration => vec![MigrationPhase {
            phase_number: 1,
            name: "apply".to_string(),
            description: "Apply the migration directly; no consumer coordination needed"
                .to_string(),
            commands: commands("apply"),
        }],
    };

    MigrationStrategy {
        strategy,
        rationale,
        phases,
        migration_tool: request.migration_tool.clone(),
        database_engine: request.database_engine.clone(),
    }
}
