// ABOUTME: Stateless Mermaid rendering of the C4 model: three flowcharts plus a markdown blob.

use crate::c4::{slug, C4Model, Relationship};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MermaidDiagrams {
    pub context: String,
    pub container: String,
    pub component: String,
    pub markdown: String,
}

fn escape_label(label: &str) -> String {
    label.replace('"', "&quot;")
}

fn node(prefix: &str, name: &str, label: &str) -> String {
    format!("    {}_{}[\"{}\"]\n", prefix, slug(name), escape_label(label))
}

/// Emit edges, eliding duplicates with the same source, target, and
/// description.
fn edges(
    lines: &mut String,
    relationships: &[Relationship],
    resolve: impl Fn(&str) -> String,
) {
    let mut seen: BTreeSet<(String, String, String)> = BTreeSet::new();
    for rel in relationships {
        let source = resolve(&rel.source);
        let target = resolve(&rel.target);
        let key = (source.clone(), target.clone(), rel.description.clone());
        if !seen.insert(key) {
            continue;
        }
        lines.push_str(&format!(
            "    {} -->|\"{}\"| {}\n",
            source,
            escape_label(&rel.description),
            target
        ));
    }
}

/// Render the three C4 levels as Mermaid flowcharts. Node ids derive from
/// `prefix_ + snake(name)`; output is deterministic for a given model.
pub fn render(model: &C4Model) -> MermaidDiagrams {
    let context = render_context(model);
    let container = render_container(model);
    let component = render_component(model);
    let markdown = format!(
        "## System Context\n\n```mermaid\n{context}```\n\n## Containers\n\n```mermaid\n{container}```\n\n## Components\n\n```mermaid\n{component}```\n"
    );
    MermaidDiagrams {
        context,
        container,
        component,
        markdown,
    }
}

fn render_context(model: &C4Model) -> String {
    let mut out = String::from("flowchart LR\n");
    for actor in &model.context.actors {
        out.push_str(&node("actor", &actor.id, &actor.name));
    }
    out.push_str(&node("system", &model.context.system, &model.context.system));
    for external in &model.context.external_systems {
        out.push_str(&node("ext", &external.id, &external.name));
    }
    let system_slug = slug(&model.context.system);
    edges(&mut out, &model.context.relationships, |id| {
        if model.context.actors.iter().any(|a| a.id == id) {
            format!("actor_{}", slug(id))
        } else if model.context.external_systems.iter().any(|e| e.id == id) {
            format!("ext_{}", slug(id))
        } else if slug(id) == system_slug {
            format!("system_{system_slug}")
        } else {
            format!("system_{}", slug(id))
        }
    });
    out
}

fn render_container(model: &C4Model) -> String {
    let mut out = String::from("flowchart TB\n");
    for container in &model.containers.containers {
        let label = format!("{} ({})", container.name, container.container_type);
        out.push_str(&node("container", &container.id, &label));
    }
    edges(&mut out, &model.containers.relationships, |id| {
        format!("container_{}", slug(id))
    });
    out
}

fn render_component(model: &C4Model) -> String {
    let mut out = String::from("flowchart LR\n");
    for (container_id, components) in &model.components.containers {
        out.push_str(&format!(
            "    subgraph {}[\"{}\"]\n",
            container_id,
            escape_label(container_id)
        ));
        for component in components {
            out.push_str(&format!(
                "        component_{}[\"{}\"]\n",
                slug(&component.id),
                escape_label(&component.name)
            ));
        }
        out.push_str("    end\n");
    }
    for relationships in model.components.relationships.values() {
        edges(&mut out, relationships, |id| {
            format!("component_{}", slug(id))
        });
    }
    out
}
