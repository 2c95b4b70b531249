//! The immutable bus message.

use super::payload::Payload;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version stamped on every message built by this crate.
pub const SCHEMA_VERSION: &str = "1.0";

/// A typed value travelling from one tab to its subscribers.
///
/// Fields are private: once built, a message cannot be changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireMessage")]
pub struct Message {
    source_tab_id: String,
    source_tab_type: String,
    data_type: String,
    #[serde(rename = "data")]
    payload: Payload,
    #[serde(default)]
    metadata: Map<String, Value>,
    timestamp: String,
    #[serde(rename = "version")]
    schema_version: String,
}

/// Wire form before `data` is decoded against `data_type`.
#[derive(Deserialize)]
struct WireMessage {
    source_tab_id: String,
    source_tab_type: String,
    data_type: String,
    data: Value,
    #[serde(default)]
    metadata: Map<String, Value>,
    timestamp: String,
    version: String,
}

impl TryFrom<WireMessage> for Message {
    type Error = serde_json::Error;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let payload = Payload::from_wire(&wire.data_type, wire.data)?;
        Ok(Self {
            source_tab_id: wire.source_tab_id,
            source_tab_type: wire.source_tab_type,
            data_type: wire.data_type,
            payload,
            metadata: wire.metadata,
            timestamp: wire.timestamp,
            schema_version: wire.version,
        })
    }
}

impl Message {
    /// Build a message stamped with the current local time and [`SCHEMA_VERSION`].
    pub fn new(
        source_tab_id: impl Into<String>,
        source_tab_type: impl Into<String>,
        data_type: impl Into<String>,
        payload: Payload,
        metadata: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            source_tab_id: source_tab_id.into(),
            source_tab_type: source_tab_type.into(),
            data_type: data_type.into(),
            payload,
            metadata: metadata.unwrap_or_default(),
            timestamp: now_iso8601(),
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }

    pub fn source_tab_id(&self) -> &str {
        &self.source_tab_id
    }

    pub fn source_tab_type(&self) -> &str {
        &self.source_tab_type
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Wire form of the message (the shape [`validate_raw_message`](super::validate_raw_message) checks).
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Current local time in ISO-8601 with microseconds.
pub(crate) fn now_iso8601() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::payload::SerializedTable;

    #[test]
    fn test_new_stamps_version_and_timestamp() {
        let msg = Message::new("tab_1", "spreadsheet", "text", Payload::Text("hi".into()), None);
        assert_eq!(msg.schema_version(), SCHEMA_VERSION);
        assert!(chrono::NaiveDateTime::parse_from_str(msg.timestamp(), "%Y-%m-%dT%H:%M:%S%.f").is_ok());
        assert!(msg.metadata().is_empty());
    }

    #[test]
    fn test_wire_keys() {
        let msg = Message::new("tab_1", "spreadsheet", "text", Payload::Text("hi".into()), None);
        let value = msg.to_json().unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "source_tab_id",
            "source_tab_type",
            "data_type",
            "data",
            "metadata",
            "timestamp",
            "version",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_table_data_is_written_and_read_untagged() {
        let table = SerializedTable::from_rows(vec!["a".into()], vec![vec![serde_json::json!(1)]]);
        let msg = Message::new("s_1", "spreadsheet", "dataframe", Payload::Table(table), None);
        let value = msg.to_json().unwrap();
        assert_eq!(value["data"]["columns"], serde_json::json!(["a"]));
        assert!(value["data"].get("kind").is_none());

        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }
}
