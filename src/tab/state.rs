//! Persisted per-tab state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque, tab-type-specific state map.
///
/// The core only reads `type`, `tab_id`, `tab_name` and `detached`;
/// everything else belongs to the tab content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabState(Map<String, Value>);

impl TabState {
    pub fn new(tab_type: &str, tab_id: &str) -> Self {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::from(tab_type));
        map.insert("tab_id".to_string(), Value::from(tab_id));
        Self(map)
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn tab_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn tab_id(&self) -> Option<&str> {
        self.0.get("tab_id").and_then(Value::as_str)
    }

    pub fn tab_name(&self) -> Option<&str> {
        self.0.get("tab_name").and_then(Value::as_str)
    }

    pub fn is_detached(&self) -> bool {
        self.0
            .get("detached")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn is_home(&self) -> bool {
        self.tab_type() == Some(super::HOME_TAB_TYPE)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let state = TabState::new("fitting", "fitting_2")
            .with("tab_name", "Fit")
            .with("detached", true);
        assert_eq!(state.tab_type(), Some("fitting"));
        assert_eq!(state.tab_id(), Some("fitting_2"));
        assert_eq!(state.tab_name(), Some("Fit"));
        assert!(state.is_detached());
        assert!(!state.is_home());
    }

    #[test]
    fn test_transparent_serde() {
        let state: TabState = serde_json::from_value(json!({"type": "home", "tab_id": "home", "x": 1})).unwrap();
        assert!(state.is_home());
        assert_eq!(state.get("x"), Some(&json!(1)));
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"type": "home", "tab_id": "home", "x": 1})
        );
    }

    #[test]
    fn test_missing_identity_is_none() {
        let state = TabState::from_map(Map::new());
        assert_eq!(state.tab_type(), None);
        assert_eq!(state.tab_id(), None);
    }
}
