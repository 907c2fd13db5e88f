//! Field deserializers that read malformed descriptor values as absent.
//!
//! A wrong-typed key inside a section or field must not fail the whole
//! document; the render plan reports the descriptor as skipped instead.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::spec::field::OptionConfig;

/// Reads `None` for any value that does not fit `T`.
pub(crate) fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Reads `T::default()` for any value that does not fit `T`.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Non-arrays read as `None`. Entries that do not fit `T` become
/// `T::default()` so diagnostics keep the entry's index.
pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
        )),
        _ => Ok(None),
    }
}

/// Select options; bare scalars become the option value.
pub(crate) fn options<'de, D>(deserializer: D) -> Result<Option<Vec<OptionConfig>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(items.iter().map(OptionConfig::from_value).collect())),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Default)]
    struct Sample {
        #[serde(default, deserialize_with = "super::optional")]
        name: Option<String>,
        #[serde(default, deserialize_with = "super::list")]
        tags: Option<Vec<String>>,
        #[serde(default, deserialize_with = "super::or_default")]
        count: usize,
    }

    #[test]
    fn wrong_types_read_as_absent() {
        let read: Sample =
            serde_json::from_value(json!({ "name": 7, "tags": "a", "count": "many" })).expect("read");
        assert_eq!(read.name, None);
        assert_eq!(read.tags, None);
        assert_eq!(read.count, 0);
    }

    #[test]
    fn list_entries_keep_their_positions() {
        let read: Sample = serde_json::from_value(json!({ "tags": ["a", 2, "c"] })).expect("read");
        assert_eq!(read.tags, Some(vec!["a".to_string(), String::new(), "c".to_string()]));
    }
}
