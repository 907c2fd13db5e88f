use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::spec::lenient;

/// Text or markup placed inside a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Markup(String),
    Text(String),
}

impl Content {
    /// Markup wins over text; blank strings count as absent.
    pub fn pick(html: Option<&str>, text: Option<&str>) -> Option<Self> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.filter(|value| !value.trim().is_empty())
        }
        present(html)
            .map(|html| Content::Markup(html.to_string()))
            .or_else(|| present(text).map(|text| Content::Text(text.to_string())))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Content::Markup(value) | Content::Text(value) => value,
        }
    }
}

/// Rendering strategy requested by a field's `type`.
///
/// Any type that is not one of the named strategies renders as an `input`
/// carrying that type (`text`, `number`, `email`, `hidden`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    Select,
    Textarea,
    Template,
    Image,
    Input(String),
}

impl From<String> for FieldKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "select" => FieldKind::Select,
            "textarea" => FieldKind::Textarea,
            "template" => FieldKind::Template,
            "image" => FieldKind::Image,
            _ => FieldKind::Input(value),
        }
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Select => write!(f, "select"),
            FieldKind::Textarea => write!(f, "textarea"),
            FieldKind::Template => write!(f, "template"),
            FieldKind::Image => write!(f, "image"),
            FieldKind::Input(kind) => write!(f, "{}", kind),
        }
    }
}

/// One entry of a select control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct OptionConfig {
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl OptionConfig {
    pub fn new(value: impl Into<Value>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Accepts either a full option object or a bare scalar used as the value.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value.clone()).unwrap_or_else(|_| Self {
                value: value.clone(),
                ..Self::default()
            }),
            other => Self {
                value: other.clone(),
                ..Self::default()
            },
        }
    }

    /// Label content, falling back to the option value.
    pub fn label(&self) -> Content {
        Content::pick(self.html.as_deref(), self.text.as_deref())
            .unwrap_or_else(|| Content::Text(value_to_display(&self.value)))
    }
}

/// Declarative description of one form control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub kind: Option<FieldKind>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub html: Option<String>,
    #[serde(
        default,
        alias = "title",
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::options",
        skip_serializing_if = "Option::is_none"
    )]
    pub options: Option<Vec<OptionConfig>>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub template: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub field_wrapper: Option<Map<String, Value>>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub label_after: Option<bool>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl FieldConfig {
    /// Id used for label association, falling back to the field name.
    pub fn control_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }

    /// Label content: markup, then text, then the field name.
    pub fn label(&self) -> Option<Content> {
        Content::pick(self.html.as_deref(), self.text.as_deref())
            .or_else(|| self.name.clone().map(Content::Text))
    }
}

/// Display form of a JSON value as it would appear in an attribute.
pub fn value_to_display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => num.to_string(),
        other => other.to_string(),
    }
}
