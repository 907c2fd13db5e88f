use serde_json::Value;

use crate::spec::form::FormConfig;

/// JSON schema describing [`FormConfig`] documents.
pub fn config_schema() -> Value {
    let schema = schemars::schema_for!(FormConfig);
    serde_json::to_value(schema).unwrap_or(Value::Null)
}
