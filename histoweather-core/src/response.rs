use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Column-oriented time series: a `time` column plus one column per variable.
pub type Columns = HashMap<String, Vec<String>>;

/// One upstream response, kept as delivered.
///
/// Leaf values are stored as strings. Numbers and booleans are rendered with
/// their JSON text, nulls become empty strings; nothing is parsed numerically
/// on ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    #[serde(deserialize_with = "leaf")]
    pub latitude: String,

    #[serde(deserialize_with = "leaf")]
    pub longitude: String,

    #[serde(default, deserialize_with = "snapshot")]
    pub current: Option<HashMap<String, String>>,

    #[serde(default, deserialize_with = "columns")]
    pub hourly: Option<Columns>,

    #[serde(default, deserialize_with = "columns")]
    pub daily: Option<Columns>,
}

fn to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn leaf<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(to_text)
}

fn snapshot<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<HashMap<String, String>>, D::Error> {
    let raw = Option::<HashMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw.map(|map| map.into_iter().map(|(k, v)| (k, to_text(v))).collect()))
}

fn columns<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Columns>, D::Error> {
    let raw = Option::<HashMap<String, Vec<Value>>>::deserialize(deserializer)?;
    Ok(raw.map(|map| {
        map.into_iter()
            .map(|(k, values)| (k, values.into_iter().map(to_text).collect()))
            .collect()
    }))
}
