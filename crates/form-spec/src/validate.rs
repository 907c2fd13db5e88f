use serde_json::Value;

use crate::error::ConfigError;
use crate::spec::form::FormConfig;

/// Checks the mandatory parts of a configuration before any node exists.
pub fn validate(config: &FormConfig) -> Result<(), ConfigError> {
    let form = config.form.as_ref().ok_or(ConfigError::MissingForm)?;
    if !form.is_object() {
        return Err(ConfigError::FormNotRecord);
    }
    if config.action().is_none() {
        return Err(ConfigError::MissingAction);
    }

    let has_title = config
        .title
        .as_ref()
        .and_then(|title| title.content())
        .is_some();
    if !has_title {
        return Err(ConfigError::MissingTitle);
    }

    Ok(())
}

/// Parses a raw JSON document into a validated configuration.
pub fn parse_config(raw: &Value) -> Result<FormConfig, ConfigError> {
    let config: FormConfig =
        serde_json::from_value(raw.clone()).map_err(|err| ConfigError::Parse(err.to_string()))?;
    validate(&config)?;
    Ok(config)
}
