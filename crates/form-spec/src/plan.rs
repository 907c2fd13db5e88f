//! Read-only render plan derived from a [`FormConfig`].
//!
//! Descriptors that miss a required key are dropped from the plan and
//! reported as [`Diagnostic`]s instead of failing the build.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::spec::{
    button::ButtonConfig,
    field::{Content, FieldConfig, FieldKind, OptionConfig},
    form::FormConfig,
    section::SectionConfig,
};

/// Why a descriptor was left out of the render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingSectionId,
    MissingSectionFields,
    MissingFieldName,
    MissingFieldType,
    MissingTemplate,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingSectionId => "section has no id",
            SkipReason::MissingSectionFields => "section has no fields",
            SkipReason::MissingFieldName => "field has no name",
            SkipReason::MissingFieldType => "field has no type",
            SkipReason::MissingTemplate => "template field without template path",
        }
    }
}

/// A skipped descriptor, addressed by its position in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub path: String,
    pub index: usize,
    pub reason: SkipReason,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason.as_str())
    }
}

/// How a single field is turned into nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldStrategy {
    Input { input_type: String },
    Select { options: Vec<OptionConfig> },
    Textarea,
    Template { path: String },
    Image,
}

#[derive(Debug, Clone)]
pub struct FieldPlan<'a> {
    pub config: &'a FieldConfig,
    pub name: &'a str,
    pub strategy: FieldStrategy,
    pub label: Content,
    pub label_after: bool,
}

impl FieldPlan<'_> {
    pub fn control_id(&self) -> &str {
        self.config.id.as_deref().unwrap_or(self.name)
    }
}

#[derive(Debug, Clone)]
pub struct SectionPlan<'a> {
    pub id: &'a str,
    pub fields: Vec<FieldPlan<'a>>,
    pub buttons: &'a [ButtonConfig],
    pub nav_attributes: &'a Map<String, Value>,
}

#[derive(Debug, Clone)]
pub enum Layout<'a> {
    Sections(Vec<SectionPlan<'a>>),
    Fields(Vec<FieldPlan<'a>>),
    Empty,
}

#[derive(Debug, Clone)]
pub struct RenderPlan<'a> {
    pub layout: Layout<'a>,
    pub buttons: &'a [ButtonConfig],
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> RenderPlan<'a> {
    /// Sections take precedence over a flat field list when both are given.
    pub fn from_config(config: &'a FormConfig) -> Self {
        let mut diagnostics = Vec::new();

        let layout = match (config.sections.as_deref(), config.fields.as_deref()) {
            (Some(sections), _) if !sections.is_empty() => {
                Layout::Sections(plan_sections(config, sections, &mut diagnostics))
            }
            (_, Some(fields)) if !fields.is_empty() => {
                Layout::Fields(plan_fields(config, "fields", fields, &mut diagnostics))
            }
            _ => Layout::Empty,
        };

        for diagnostic in &diagnostics {
            warn!(path = %diagnostic.path, reason = diagnostic.reason.as_str(), "skipping descriptor");
        }

        RenderPlan {
            layout,
            buttons: config.buttons.as_deref().unwrap_or_default(),
            diagnostics,
        }
    }
}

fn plan_sections<'a>(
    config: &'a FormConfig,
    sections: &'a [SectionConfig],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<SectionPlan<'a>> {
    let mut planned = Vec::new();
    for (index, section) in sections.iter().enumerate() {
        let path = format!("sections[{}]", index);
        let id = section.id.as_deref().filter(|id| !id.trim().is_empty());
        let Some(id) = id else {
            diagnostics.push(skip(path, index, SkipReason::MissingSectionId));
            continue;
        };
        let Some(fields) = section.fields.as_deref() else {
            diagnostics.push(skip(path, index, SkipReason::MissingSectionFields));
            continue;
        };

        planned.push(SectionPlan {
            id,
            fields: plan_fields(config, &format!("{}.fields", path), fields, diagnostics),
            buttons: section.buttons.as_deref().unwrap_or_default(),
            nav_attributes: &section.attributes,
        });
    }
    planned
}

fn plan_fields<'a>(
    config: &'a FormConfig,
    path: &str,
    fields: &'a [FieldConfig],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<FieldPlan<'a>> {
    let mut planned = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let field_path = format!("{}[{}]", path, index);
        let Some(name) = field.name.as_deref().filter(|name| !name.trim().is_empty()) else {
            diagnostics.push(skip(field_path, index, SkipReason::MissingFieldName));
            continue;
        };
        let Some(kind) = field.kind.as_ref() else {
            diagnostics.push(skip(field_path, index, SkipReason::MissingFieldType));
            continue;
        };
        let Some(strategy) = resolve_strategy(config, field, kind) else {
            diagnostics.push(skip(field_path, index, SkipReason::MissingTemplate));
            continue;
        };

        planned.push(FieldPlan {
            config: field,
            name,
            strategy,
            label: field
                .label()
                .unwrap_or_else(|| Content::Text(name.to_string())),
            label_after: field.label_after.unwrap_or_else(|| config.label_after()),
        });
    }
    planned
}

/// Picks the rendering strategy; a configured template always wins.
fn resolve_strategy(
    config: &FormConfig,
    field: &FieldConfig,
    kind: &FieldKind,
) -> Option<FieldStrategy> {
    if let (Some(base), Some(fragment)) = (config.template_path.as_deref(), field.template.as_deref())
    {
        return Some(FieldStrategy::Template {
            path: resolve_template_path(base, config.template_server_part.as_deref(), fragment),
        });
    }

    let strategy = match kind {
        FieldKind::Template => return None,
        FieldKind::Select => FieldStrategy::Select {
            options: field.options.clone().unwrap_or_default(),
        },
        FieldKind::Textarea => FieldStrategy::Textarea,
        FieldKind::Image => FieldStrategy::Image,
        FieldKind::Input(input_type) => FieldStrategy::Input {
            input_type: input_type.clone(),
        },
    };
    Some(strategy)
}

/// Joins the template base and fragment, then strips the server-side prefix.
pub fn resolve_template_path(base: &str, server_part: Option<&str>, fragment: &str) -> String {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        fragment.trim_start_matches('/')
    );
    match server_part.filter(|prefix| !prefix.is_empty()) {
        Some(prefix) => joined
            .strip_prefix(prefix)
            .map(str::to_string)
            .unwrap_or(joined),
        None => joined,
    }
}

fn skip(path: String, index: usize, reason: SkipReason) -> Diagnostic {
    Diagnostic {
        path,
        index,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> FormConfig {
        serde_json::from_value(value).expect("config")
    }

    #[test]
    fn sections_win_over_flat_fields() {
        let config = config(json!({
            "form": { "action": "/x" },
            "title": "T",
            "sections": [{ "id": "a", "fields": [{ "name": "n", "type": "text" }] }],
            "fields": [{ "name": "flat", "type": "text" }]
        }));
        let plan = RenderPlan::from_config(&config);
        assert!(matches!(plan.layout, Layout::Sections(ref sections) if sections.len() == 1));
    }

    #[test]
    fn skipped_descriptors_are_reported_with_paths() {
        let config = config(json!({
            "form": { "action": "/x" },
            "title": "T",
            "sections": [
                { "fields": [] },
                { "id": "b", "fields": [{ "type": "text" }, { "name": "ok", "type": "text" }] }
            ]
        }));
        let plan = RenderPlan::from_config(&config);
        assert_eq!(
            plan.diagnostics,
            vec![
                skip("sections[0]".into(), 0, SkipReason::MissingSectionId),
                skip("sections[1].fields[0]".into(), 0, SkipReason::MissingFieldName),
            ]
        );
    }

    #[test]
    fn template_path_strips_server_prefix() {
        assert_eq!(
            resolve_template_path("/srv/site/templates/", Some("/srv/site"), "/fields/city.hbs"),
            "/templates/fields/city.hbs"
        );
        assert_eq!(resolve_template_path("tpl", None, "a.hbs"), "tpl/a.hbs");
    }

    #[test]
    fn template_type_without_path_is_skipped() {
        let config = config(json!({
            "form": { "action": "/x" },
            "title": "T",
            "fields": [{ "name": "bio", "type": "template", "template": "bio.hbs" }]
        }));
        let plan = RenderPlan::from_config(&config);
        assert!(matches!(plan.layout, Layout::Fields(ref fields) if fields.is_empty()));
        assert_eq!(plan.diagnostics[0].reason, SkipReason::MissingTemplate);
    }
}
