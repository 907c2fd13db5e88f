use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::spec::{
    button::ButtonConfig,
    lenient,
    field::{Content, FieldConfig},
    section::SectionConfig,
};

/// Class kept on an image display until it receives a value.
pub const DEFAULT_STOP_IMAGE_CLASS: &str = "image-stub";

/// Title block content and extra attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct TitleBlock {
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub html: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Form title, given either as plain text or as a block description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TitleConfig {
    Text(String),
    Block(TitleBlock),
}

impl TitleConfig {
    pub fn content(&self) -> Option<Content> {
        match self {
            TitleConfig::Text(text) => Content::pick(None, Some(text)),
            TitleConfig::Block(block) => Content::pick(block.html.as_deref(), block.text.as_deref()),
        }
    }

    pub fn attributes(&self) -> Option<&Map<String, Value>> {
        match self {
            TitleConfig::Text(_) => None,
            TitleConfig::Block(block) => Some(&block.attributes),
        }
    }
}

/// Top-level declarative form description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    /// Attributes of the submission container; `action` is mandatory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<TitleConfig>,
    #[serde(
        default,
        deserialize_with = "lenient::list",
        skip_serializing_if = "Option::is_none"
    )]
    pub sections: Option<Vec<SectionConfig>>,
    #[serde(
        default,
        deserialize_with = "lenient::list",
        skip_serializing_if = "Option::is_none"
    )]
    pub fields: Option<Vec<FieldConfig>>,
    #[serde(
        default,
        deserialize_with = "lenient::list",
        skip_serializing_if = "Option::is_none"
    )]
    pub buttons: Option<Vec<ButtonConfig>>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub label_after: bool,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub invisible_class: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_class: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub current_number: usize,
    #[serde(default = "default_stop_image_class")]
    pub stop_image_class: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub template_path: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub template_server_part: Option<String>,
}

fn default_stop_image_class() -> String {
    DEFAULT_STOP_IMAGE_CLASS.to_string()
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            form: None,
            title: None,
            sections: None,
            fields: None,
            buttons: None,
            label_after: false,
            invisible_class: None,
            current_class: None,
            current_number: 0,
            stop_image_class: default_stop_image_class(),
            template_path: None,
            template_server_part: None,
        }
    }
}

impl FormConfig {
    /// Form attributes when `form` is a key/value record.
    pub fn form_attributes(&self) -> Option<&Map<String, Value>> {
        self.form.as_ref().and_then(Value::as_object)
    }

    pub fn action(&self) -> Option<&str> {
        self.form_attributes()
            .and_then(|form| form.get("action"))
            .and_then(Value::as_str)
            .filter(|action| !action.trim().is_empty())
    }

    /// Labels follow their controls when either the top-level flag or the
    /// `labelAfter` routing hint inside `form` is set.
    pub fn label_after(&self) -> bool {
        self.label_after
            || self
                .form_attributes()
                .and_then(|form| form.get("labelAfter"))
                .and_then(Value::as_bool)
                .unwrap_or(false)
    }

    /// Visibility classes, present only when both are configured.
    pub fn visibility_classes(&self) -> Option<(&str, &str)> {
        match (self.invisible_class.as_deref(), self.current_class.as_deref()) {
            (Some(invisible), Some(current)) if !invisible.is_empty() && !current.is_empty() => {
                Some((invisible, current))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stop_image_class_defaults_per_instance() {
        let config: FormConfig = serde_json::from_value(json!({
            "form": { "action": "/save" },
            "title": "Profile"
        }))
        .expect("config");
        assert_eq!(config.stop_image_class, DEFAULT_STOP_IMAGE_CLASS);
        assert_eq!(config.action(), Some("/save"));
    }

    #[test]
    fn title_accepts_block_and_text() {
        let block: TitleConfig =
            serde_json::from_value(json!({ "html": "<b>Hi</b>", "class": "title" })).expect("block");
        assert_eq!(block.content(), Some(Content::Markup("<b>Hi</b>".into())));
        let text: TitleConfig = serde_json::from_value(json!("Plain")).expect("text");
        assert_eq!(text.content(), Some(Content::Text("Plain".into())));
    }
}
