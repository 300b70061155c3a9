// ABOUTME: Architecture annotation interface: confirmation questions and user operations
// ABOUTME: applied to a deep copy of the inferred C4 model; invalid ops go to `rejected`.

use crate::c4::{C4Model, Relationship};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const DEFAULT_MAX_QUESTIONS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationQuestion {
    pub id: String,
    pub kind: String,
    pub subject: String,
    pub question: String,
}

/// Closed operation schema over the inferred model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AnnotationOp {
    SetSystemName {
        name: String,
    },
    RenameContainer {
        container_id: String,
        new_name: String,
    },
    RetypeContainer {
        container_id: String,
        new_type: String,
    },
    RedescribeContainer {
        container_id: String,
        description: String,
    },
    AddContainerRelationship {
        source: String,
        target: String,
        description: String,
    },
    RemoveContainerRelationship {
        source: String,
        target: String,
    },
    RenameComponent {
        container_id: String,
        component_id: String,
        new_name: String,
    },
    AddComponentRelationship {
        container_id: String,
        source: String,
        target: String,
        description: String,
    },
    RemoveComponentRelationship {
        container_id: String,
        source: String,
        target: String,
    },
    ConfirmQuestion {
        question_id: String,
    },
    RejectQuestion {
        question_id: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedOp {
    pub operation: JsonValue,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationOutcome {
    pub model: C4Model,
    pub applied: Vec<JsonValue>,
    pub rejected: Vec<RejectedOp>,
    pub confirmed_questions: Vec<String>,
    pub rejected_questions: Vec<String>,
}

/// Produce bounded confirmation questions over the inferred model.
pub fn generate_questions(model: &C4Model, max_questions: usize) -> Vec<ConfirmationQuestion> {
    let mut questions = Vec::new();
    let mut counter = 0usize;
    let mut next_id = |counter: &mut usize| {
        *counter += 1;
        format!("q{counter}")
    };

    questions.push(ConfirmationQuestion {
        id: next_id(&mut counter),
        kind: "system_name".to_string(),
        subject: model.context.system.clone(),
        question: format!(
            "Is `{}` the right name for this system?",
            model.context.system
        ),
    });

    for container in &model.containers.containers {
        questions.push(ConfirmationQuestion {
            id: next_id(&mut counter),
            kind: "container_type".to_string(),
            subject: container.id.clone(),
            question: format!(
                "Container `{}` was classified as `{}`. Is that correct?",
                container.name, container.container_type
            ),
        });
    }

    for relationship in &model.containers.relationships {
        questions.push(ConfirmationQuestion {
            id: next_id(&mut counter),
            kind: "container_relationship".to_string(),
            subject: format!("{}->{}", relationship.source, relationship.target),
            question: format!(
                "Does `{}` really depend on `{}` ({})?",
                relationship.source, relationship.target, relationship.description
            ),
        });
    }

    questions.truncate(max_questions.max(1));
    questions
}

fn apply_one(model: &mut C4Model, op: &AnnotationOp) -> Result<Option<String>, String> {
    match op {
        AnnotationOp::SetSystemName { name } => {
            if name.trim().is_empty() {
                return Err("system name must not be empty".to_string());
            }
            model.context.system = name.clone();
            model.containers.system = name.clone();
            Ok(None)
        }
        AnnotationOp::RenameContainer {
            container_id,
            new_name,
        } => {
            let container = model
                .containers
                .containers
                .iter_mut()
                .find(|c| c.id == *container_id)
                .ok_or_else(|| format!("unknown container: {container_id}"))?;
            container.name = new_name.clone();
            Ok(None)
        }
        AnnotationOp::RetypeContainer {
            container_id,
            new_type,
        } => {
            const VALID: &[&str] = &[
                "web_api",
                "service",
                "data_store",
                "web_app",
                "worker",
                "test_suite",
                "infrastructure",
                "library",
            ];
            if !VALID.contains(&new_type.as_str()) {
                return Err(format!("unknown container type: {new_type}"));
            }
            let container = model
                .containers
                .containers
                .iter_mut()
                .find(|c| c.id == *container_id)
                .ok_or_else(|| format!("unknown container: {container_id}"))?;
            container.container_type = new_type.clone();
            Ok(None)
        }
        AnnotationOp::RedescribeContainer {
            container_id,
            description,
        } => {
            let container = model
                .containers
                .containers
                .iter_mut()
                .find(|c| c.id == *container_id)
                .ok_or_else(|| format!("unknown container: {container_id}"))?;
            container.description = description.clone();
            Ok(None)
        }
        AnnotationOp::AddContainerRelationship {
            source,
            target,
            description,
        } => {
            let known = |id: &str| model.containers.containers.iter().any(|c| c.id == id);
            if !known(source) {
                return Err(format!("unknown container: {source}"));
            }
            if !known(target) {
                return Err(format!("unknown container: {target}"));
            }
            let exists = model
                .containers
                .relationships
                .iter()
                .any(|r| r.source == *source && r.target == *target);
            if exists {
                return Err(format!("relationship {source}->{target} already exists"));
            }
            model.containers.relationships.push(Relationship {
                source: source.clone(),
                target: target.clone(),
                description: description.clone(),
                weight: 1,
            });
            Ok(None)
        }
        AnnotationOp::RemoveContainerRelationship { source, target } => {
            let before = model.containers.relationships.len();
            model
                .containers
                .relationships
                .retain(|r| !(r.source == *source && r.target == *target));
            if model.containers.relationships.len() == before {
                return Err(format!("no relationship {source}->{target}"));
            }
            Ok(None)
        }
        AnnotationOp::RenameComponent {
            container_id,
            component_id,
            new_name,
        } => {
            let components = model
                .components
                .containers
                .get_mut(container_id)
                .ok_or_else(|| format!("unknown container: {container_id}"))?;
            let component = components
                .iter_mut()
                .find(|c| c.id == *component_id)
                .ok_or_else(|| format!("unknown component: {component_id}"))?;
            component.name = new_name.clone();
            Ok(None)
        }
        AnnotationOp::AddComponentRelationship {
            container_id,
            source,
            target,
            description,
        } => {
            let components = model
                .components
                .containers
                .get(container_id)
                .ok_or_else(|| format!("unknown container: {container_id}"))?;
            let known = |id: &str| components.iter().any(|c| c.id == id);
            if !known(source) || !known(target) {
                return Err(format!(
                    "component relationship endpoints must exist in {container_id}"
                ));
            }
            model
                .components
                .relationships
                .entry(container_id.clone())
                .or_default()
                .push(Relationship {
                    source: source.clone(),
                    target: target.clone(),
                    description: description.clone(),
                    weight: 1,
                });
            Ok(None)
        }
        AnnotationOp::RemoveComponentRelationship {
            container_id,
            source,
            target,
        } => {
            let relationships = model
                .components
                .relationships
                .get_mut(container_id)
                .ok_or_else(|| format!("unknown container: {container_id}"))?;
            let before = relationships.len();
            relationships.retain(|r| !(r.source == *source && r.target == *target));
            if relationships.len() == before {
                return Err(format!("no relationship {source}->{target}"));
            }
            Ok(None)
        }
        AnnotationOp::ConfirmQuestion { question_id } => Ok(Some(question_id.clone())),
        AnnotationOp::RejectQuestion { question_id } => Ok(Some(format!("!{question_id}"))),
    }
}

/// Apply a list of operations to a deep copy of the inferred model.
/// Valid operations land in `applied`; invalid ones in `rejected` with the
/// error reason. The input model is never mutated.
pub fn apply_annotations(model: &C4Model, operations: &[AnnotationOp]) -> AnnotationOutcome {
    let mut updated = model.clone();
    let mut applied = Vec::new();
    let mut rejected = Vec::new();
    let mut confirmed_questions = Vec::new();
    let mut rejected_questions = Vec::new();

    for op in operations {
        let as_json = serde_json::to_value(op).unwrap_or(JsonValue::Null);
        match apply_one(&mut updated, op) {
            Ok(None) => applied.push(as_json),
            Ok(Some(marker)) => {
                if let Some(question_id) = marker.strip_prefix('!') {
                    rejected_questions.push(question_id.to_string());
                } else {
                    confirmed_questions.push(marker);
                }
                applied.push(as_json);
            }
            Err(reason) => rejected.push(RejectedOp {
                operation: as_json,
                reason,
            }),
        }
    }

    AnnotationOutcome {
        model: updated,
        applied,
        rejected,
        confirmed_questions,
        rejected_questions,
    }
}
