use thiserror::Error;

/// Schema violations surfaced synchronously to the caller.
///
/// Raised before any node is created (building) or mutated (binding).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("form attributes are missing")]
    MissingForm,
    #[error("form attributes must be a key/value record")]
    FormNotRecord,
    #[error("form submission target (form.action) is missing")]
    MissingAction,
    #[error("form title is missing")]
    MissingTitle,
    #[error("form values must be a key/value record of <control name>: <value>")]
    ValuesNotRecord,
    #[error("no control named '{0}'")]
    UnknownControl(String),
    #[error("node {0} is not a select control")]
    NotASelect(String),
    #[error("failed to parse form config: {0}")]
    Parse(String),
}
