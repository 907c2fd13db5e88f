use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::spec::{button::ButtonConfig, field::FieldConfig, lenient};

/// A titled group of fields with its own navigation entry.
///
/// Keys other than `id`, `fields` and `buttons` end up on the navigation
/// entry (for example `text` as its display label).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct SectionConfig {
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
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
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}
