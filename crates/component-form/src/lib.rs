use std::sync::Arc;

use futures::executor::block_on;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use form_spec::{
    ConfigError, ControlRef, Document, FormAssembler, FormConfig, OptionConfig, RenderPlan,
    RenderedForm, StaticTemplates, TemplateReport, config_schema as form_config_schema,
    parse_config,
};

const DEFAULT_CONFIG: &str = include_str!("../../form-spec/tests/fixtures/wizard_form.json");

/// Config key holding inline templates, keyed by resolved template path.
const TEMPLATES_KEY: &str = "templates";

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse values: {0}")]
    ValuesParse(#[source] serde_json::Error),
    #[error("failed to parse options: {0}")]
    OptionsParse(#[source] serde_json::Error),
    #[error("invalid form config: {0}")]
    Config(#[from] ConfigError),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

struct LoadedConfig {
    form: FormConfig,
    templates: Option<StaticTemplates>,
}

struct Rendered {
    form: RenderedForm<Document>,
    templates: Vec<TemplateReport>,
}

fn load_config(config_json: &str) -> Result<LoadedConfig, ComponentError> {
    let source = if config_json.trim().is_empty() {
        DEFAULT_CONFIG
    } else {
        config_json
    };
    let raw: Value = serde_json::from_str(source).map_err(ComponentError::ConfigParse)?;

    let templates = raw
        .get(TEMPLATES_KEY)
        .and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(path, markup)| {
                    markup.as_str().map(|markup| (path.clone(), markup.to_string()))
                })
                .collect::<StaticTemplates>()
        });

    Ok(LoadedConfig {
        form: parse_config(&raw)?,
        templates,
    })
}

fn parse_values(values_json: &str) -> Result<Option<Value>, ComponentError> {
    if values_json.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(values_json)
        .map(Some)
        .map_err(ComponentError::ValuesParse)
}

fn render(config_json: &str, values_json: &str) -> Result<Rendered, ComponentError> {
    let loaded = load_config(config_json)?;
    let values = parse_values(values_json)?;

    let mut assembler = FormAssembler::new();
    if let Some(templates) = loaded.templates {
        debug!(templates = templates.len(), "using inline templates");
        assembler = assembler.with_fetcher(Arc::new(templates));
    }
    let mut form = assembler.build(&loaded.form)?;
    let templates = block_on(form.settle_templates());
    if let Some(values) = values {
        form.apply_values(&values)?;
    }
    Ok(Rendered { form, templates })
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

pub fn describe() -> String {
    respond(Ok(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "operations": ["describe", "config_schema", "check", "render_html", "render_tree", "populate_options"],
        "config_schema": form_config_schema(),
    })))
}

pub fn config_schema() -> String {
    respond(Ok(form_config_schema()))
}

/// Validates a config without rendering and lists the descriptors a render
/// would skip.
pub fn check(config_json: &str) -> String {
    let result = match load_config(config_json) {
        Ok(loaded) => {
            let plan = RenderPlan::from_config(&loaded.form);
            serde_json::to_value(&plan.diagnostics)
                .map(|diagnostics| json!({ "valid": true, "diagnostics": diagnostics }))
                .map_err(ComponentError::JsonEncode)
        }
        Err(ComponentError::Config(err)) => Ok(json!({ "valid": false, "error": err.to_string() })),
        Err(err) => Err(err),
    };
    respond(result)
}

pub fn render_html(config_json: &str, values_json: &str) -> String {
    respond_string(render(config_json, values_json).map(|rendered| rendered.form.to_html()))
}

pub fn render_tree(config_json: &str, values_json: &str) -> String {
    respond(render(config_json, values_json).and_then(|rendered| {
        let diagnostics =
            serde_json::to_value(rendered.form.diagnostics()).map_err(ComponentError::JsonEncode)?;
        let templates =
            serde_json::to_value(&rendered.templates).map_err(ComponentError::JsonEncode)?;
        Ok(json!({
            "tree": rendered.form.to_json(),
            "diagnostics": diagnostics,
            "templates": templates,
        }))
    }))
}

/// Renders the form, then replaces the options of the select named
/// `control` and returns the resulting markup.
pub fn populate_options(
    config_json: &str,
    control: &str,
    options_json: &str,
    include_empty: bool,
) -> String {
    respond_string(render(config_json, "").and_then(|mut rendered| {
        let options: Vec<OptionConfig> =
            serde_json::from_str(options_json).map_err(ComponentError::OptionsParse)?;
        rendered
            .form
            .populate_options(ControlRef::from(control), &options, include_empty)?;
        Ok(rendered.form.to_html())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn templated_config() -> Value {
        json!({
            "form": { "action": "/order" },
            "title": "Order",
            "templatePath": "/tpl",
            "fields": [
                { "name": "city", "type": "template", "template": "city.hbs", "text": "City" }
            ],
            "templates": {
                "/tpl/city.hbs": "<input name=\"{{name}}\" title=\"{{label}}\">"
            }
        })
    }

    #[test]
    fn describe_lists_operations() {
        let payload = describe();
        let parsed: Value = serde_json::from_str(&payload).expect("json");
        assert_eq!(parsed["name"], "component-form");
        assert!(
            parsed["operations"]
                .as_array()
                .expect("operations")
                .contains(&json!("render_html"))
        );
        assert!(parsed["config_schema"]["properties"]["form"].is_object());
    }

    #[test]
    fn check_reports_skipped_descriptors() {
        let result = check("");
        let parsed: Value = serde_json::from_str(&result).expect("json");
        assert_eq!(parsed["valid"], true);
        let diagnostics = parsed["diagnostics"].as_array().expect("diagnostics");
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0]["path"], "sections[1]");
        assert_eq!(diagnostics[0]["reason"], "missing_section_id");
    }

    #[test]
    fn check_flags_missing_action() {
        let config = json!({ "form": {}, "title": "T" });
        let parsed: Value = serde_json::from_str(&check(&config.to_string())).expect("json");
        assert_eq!(parsed["valid"], false);
        assert!(
            parsed["error"]
                .as_str()
                .expect("error")
                .contains("form.action")
        );
    }

    #[test]
    fn render_html_applies_values() {
        let html = render_html("", r#"{"qty": 3, "photo": "me.png"}"#);
        assert!(html.starts_with("<div id=\"formParent\">"));
        assert!(html.contains("value=\"3\""));
        assert!(html.contains("src=\"me.png\""));
    }

    #[test]
    fn render_html_surfaces_config_errors() {
        let config = json!({ "form": { "action": "/x" } });
        let output = render_html(&config.to_string(), "");
        let parsed: Value = serde_json::from_str(&output).expect("json");
        assert_eq!(parsed["error"], "invalid form config: form title is missing");
    }

    #[test]
    fn render_html_rejects_non_record_values() {
        let output = render_html("", "[1, 2]");
        let parsed: Value = serde_json::from_str(&output).expect("json");
        assert!(parsed["error"].as_str().expect("error").contains("key/value record"));
    }

    #[test]
    fn render_tree_settles_inline_templates() {
        let output = render_tree(&templated_config().to_string(), "");
        let parsed: Value = serde_json::from_str(&output).expect("json");
        assert_eq!(parsed["tree"]["tag"], "div");
        assert_eq!(parsed["templates"][0]["field"], "city");
        assert_eq!(parsed["templates"][0]["status"]["status"], "settled");
    }

    #[test]
    fn templates_without_inline_markup_are_unavailable() {
        let mut config = templated_config();
        config.as_object_mut().expect("object").remove("templates");
        let output = render_tree(&config.to_string(), "");
        let parsed: Value = serde_json::from_str(&output).expect("json");
        assert_eq!(parsed["templates"][0]["status"]["status"], "unavailable");
    }

    #[test]
    fn render_html_includes_template_markup() {
        let html = render_html(&templated_config().to_string(), "");
        assert!(html.contains("<input name=\"city\" title=\"City\">"));
    }

    #[test]
    fn populate_options_rewrites_select() {
        let options = json!([{ "value": "x", "text": "Ex" }]);
        let html = populate_options("", "country", &options.to_string(), true);
        assert!(html.contains("<option value=\"\"></option><option value=\"x\">Ex</option>"));
    }

    #[test]
    fn populate_options_reports_unknown_control() {
        let output = populate_options("", "nope", "[]", false);
        let parsed: Value = serde_json::from_str(&output).expect("json");
        assert_eq!(parsed["error"], "invalid form config: no control named 'nope'");
    }
}
