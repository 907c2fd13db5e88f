use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::spec::field::Content;
use crate::spec::lenient;

/// Role applied to buttons that do not declare a `type`.
pub const DEFAULT_BUTTON_TYPE: &str = "button";

/// Button attached to the form root or to a single section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct ButtonConfig {
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub html: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ButtonConfig {
    pub fn kind_or_default(&self) -> &str {
        self.kind.as_deref().unwrap_or(DEFAULT_BUTTON_TYPE)
    }

    pub fn content(&self) -> Option<Content> {
        Content::pick(self.html.as_deref(), self.text.as_deref())
    }
}
