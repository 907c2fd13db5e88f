use serde_json::json;

use form_spec::{ConfigError, parse_config};

#[test]
fn title_may_be_html_or_text_alone() {
    let html_only = json!({ "form": { "action": "/x" }, "title": { "html": "<h1>T</h1>" } });
    assert!(parse_config(&html_only).is_ok());

    let text_only = json!({ "form": { "action": "/x" }, "title": { "text": "T" } });
    assert!(parse_config(&text_only).is_ok());

    let blank = json!({ "form": { "action": "/x" }, "title": { "html": " ", "text": "" } });
    assert_eq!(parse_config(&blank).err(), Some(ConfigError::MissingTitle));
}

#[test]
fn form_checks_run_before_title_checks() {
    let raw = json!({ "form": {} });
    assert_eq!(parse_config(&raw).err(), Some(ConfigError::MissingAction));

    let raw = json!({ "form": ["action"], "title": "T" });
    assert_eq!(parse_config(&raw).err(), Some(ConfigError::FormNotRecord));

    let raw = json!({ "form": { "action": 5 }, "title": "T" });
    assert_eq!(parse_config(&raw).err(), Some(ConfigError::MissingAction));
}

#[test]
fn non_list_sections_fall_through_to_fields() {
    let raw = json!({
        "form": { "action": "/x" },
        "title": "T",
        "sections": "nope",
        "fields": [{ "name": "a", "type": "text" }]
    });
    let config = parse_config(&raw).expect("config");
    assert_eq!(config.sections, None);
    assert_eq!(config.fields.expect("fields").len(), 1);
}

#[test]
fn wrong_typed_title_reads_as_missing() {
    let raw = json!({ "form": { "action": "/x" }, "title": 5 });
    assert_eq!(parse_config(&raw).err(), Some(ConfigError::MissingTitle));
}

#[test]
fn non_record_documents_surface_parse_errors() {
    let raw = json!("form");
    assert!(matches!(parse_config(&raw), Err(ConfigError::Parse(_))));
}

#[test]
fn unknown_keys_are_kept_as_pass_through_attributes() {
    let raw = json!({
        "form": { "action": "/x" },
        "title": "T",
        "fields": [{ "name": "a", "type": "text", "data-role": "primary" }]
    });
    let config = parse_config(&raw).expect("config");
    let fields = config.fields.expect("fields");
    assert_eq!(fields[0].attributes.get("data-role"), Some(&json!("primary")));
}
