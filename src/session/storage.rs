//! File I/O for session persistence
//!
//! Sessions are stored next to the config file, in
//! `~/.config/workbench/complete_session.json`

use super::{SESSION_VERSION, SessionSnapshot};
use crate::config::Config;
use crate::tab::TabState;
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Get the path to the session state file
pub fn session_path() -> PathBuf {
    Config::config_dir().join("complete_session.json")
}

/// A session file as found on disk.
#[derive(Debug, Clone)]
pub enum LoadedSession {
    /// Snapshot in the current format
    Current(SessionSnapshot),
    /// Older or unrecognised layout: every tab state found in the file
    Legacy(Vec<TabState>),
}

impl LoadedSession {
    pub fn is_legacy(&self) -> bool {
        matches!(self, LoadedSession::Legacy(_))
    }
}

/// Reads and writes the session file at a fixed path.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(session_path())
    }
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the snapshot atomically (temp file + rename).
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create session directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize session state")?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write session state to {:?}", tmp))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move session state into {:?}", self.path))?;

        log::info!(
            "Saved session state ({} windows, {} tabs) to {:?}",
            snapshot.window_count,
            snapshot.tab_count(),
            self.path
        );
        Ok(())
    }

    /// Load the session file.
    ///
    /// Returns `None` if the file doesn't exist or is empty.
    /// Returns an error if the file exists but is not JSON.
    pub fn load(&self) -> Result<Option<LoadedSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session state from {:?}", self.path))?;
        if contents.trim().is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session state from {:?}", self.path))?;
        let loaded = classify(value)?;

        match &loaded {
            LoadedSession::Current(snapshot) => log::info!(
                "Loaded session state ({} windows) from {:?}",
                snapshot.detached_windows.len() + 1,
                self.path
            ),
            LoadedSession::Legacy(tabs) => log::info!(
                "Loaded legacy session ({} tabs) from {:?}",
                tabs.len(),
                self.path
            ),
        }
        Ok(Some(loaded))
    }

    /// Remove the session file. Returns true if a file was removed.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove session state file {:?}", self.path))?;
        log::info!("Cleared session state {:?}", self.path);
        Ok(true)
    }
}

fn classify(value: Value) -> Result<LoadedSession> {
    match &value {
        Value::Array(items) => Ok(LoadedSession::Legacy(tab_states(items))),
        Value::Object(map) => {
            let version = map.get("version").and_then(Value::as_str);
            if version == Some(SESSION_VERSION) {
                match serde_json::from_value::<SessionSnapshot>(value.clone()) {
                    Ok(snapshot) => return Ok(LoadedSession::Current(snapshot)),
                    Err(e) => log::warn!("Session snapshot malformed ({}), using legacy loader", e),
                }
            } else {
                log::warn!(
                    "Session version {:?} does not match {}, using legacy loader",
                    version,
                    SESSION_VERSION
                );
            }
            Ok(LoadedSession::Legacy(legacy_tabs(&value)))
        }
        other => bail!("Unrecognised session layout: {}", other),
    }
}

/// Collect tab states from every place older layouts kept them.
fn legacy_tabs(value: &Value) -> Vec<TabState> {
    let mut tabs = Vec::new();
    if let Some(items) = value.get("tabs").and_then(Value::as_array) {
        tabs.extend(tab_states(items));
    }
    if let Some(items) = value
        .get("main_window")
        .and_then(|w| w.get("tabs"))
        .and_then(Value::as_array)
    {
        tabs.extend(tab_states(items));
    }
    if let Some(windows) = value.get("detached_windows").and_then(Value::as_array) {
        for window in windows {
            if let Some(items) = window.get("tabs").and_then(Value::as_array) {
                tabs.extend(tab_states(items));
            }
        }
    }
    tabs
}

fn tab_states(items: &[Value]) -> Vec<TabState> {
    items
        .iter()
        .filter_map(|item| item.as_object().cloned().map(TabState::from_map))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::WindowState;
    use crate::window::{Geometry, WindowKind};
    use tempfile::tempdir;

    fn sample_snapshot() -> SessionSnapshot {
        SessionSnapshot {
            version: SESSION_VERSION.to_string(),
            timestamp: "2025-01-01T00:00:00".to_string(),
            main_window: WindowState {
                kind: WindowKind::Main,
                title: String::new(),
                geometry: Some(Geometry::new(0, 0, 1200, 800)),
                tabs: vec![
                    TabState::new("home", "home"),
                    TabState::new("spreadsheet", "spreadsheet_1"),
                ],
            },
            detached_windows: vec![WindowState {
                kind: WindowKind::Detached,
                title: "Workbench - Fit".to_string(),
                geometry: Some(Geometry::new(300, 200, 800, 600)),
                tabs: vec![TabState::new("fitting", "fitting_2").with("detached", true)],
            }],
            window_count: 2,
            shutdown_reason: "main_window_closed".to_string(),
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp = tempdir().unwrap();
        let store = SessionStore::new(temp.path().join("nonexistent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_load_empty_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("empty.json");
        std::fs::write(&path, "  \n").unwrap();
        assert!(SessionStore::new(path).load().unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("corrupt.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(SessionStore::new(path).load().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = tempdir().unwrap();
        let store = SessionStore::new(temp.path().join("nested").join("session.json"));
        store.save(&sample_snapshot()).unwrap();
        assert!(!store.path().with_extension("json.tmp").exists());

        let Some(LoadedSession::Current(loaded)) = store.load().unwrap() else {
            panic!("expected current-format session");
        };
        assert_eq!(loaded.window_count, 2);
        assert_eq!(loaded.main_window.tabs.len(), 2);
        assert_eq!(
            loaded.detached_windows[0].geometry,
            Some(Geometry::new(300, 200, 800, 600))
        );
        assert!(loaded.detached_windows[0].tabs[0].is_detached());
    }

    #[test]
    fn test_bare_array_is_legacy() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("old.json");
        std::fs::write(
            &path,
            r#"[{"type": "spreadsheet", "tab_id": "s1"}, 42, {"type": "fitting", "tab_id": "f1"}]"#,
        )
        .unwrap();

        let Some(LoadedSession::Legacy(tabs)) = SessionStore::new(path).load().unwrap() else {
            panic!("expected legacy session");
        };
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[1].tab_id(), Some("f1"));
    }

    #[test]
    fn test_version_mismatch_is_legacy() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("v1.json");
        std::fs::write(
            &path,
            r#"{"version": "1.0", "main_window": {"tabs": [{"type": "a", "tab_id": "a_1"}]},
                "detached_windows": [{"tabs": [{"type": "b", "tab_id": "b_1"}]}]}"#,
        )
        .unwrap();

        let loaded = SessionStore::new(path).load().unwrap().unwrap();
        let LoadedSession::Legacy(tabs) = loaded else {
            panic!("expected legacy session");
        };
        let ids: Vec<_> = tabs.iter().filter_map(|t| t.tab_id()).collect();
        assert_eq!(ids, vec!["a_1", "b_1"]);
    }

    #[test]
    fn test_missing_version_is_legacy() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("noversion.json");
        std::fs::write(&path, r#"{"tabs": [{"type": "a", "tab_id": "a_1"}]}"#).unwrap();
        assert!(SessionStore::new(path).load().unwrap().unwrap().is_legacy());
    }

    #[test]
    fn test_clear() {
        let temp = tempdir().unwrap();
        let store = SessionStore::new(temp.path().join("session.json"));
        assert!(!store.clear().unwrap());
        store.save(&sample_snapshot()).unwrap();
        assert!(store.clear().unwrap());
        assert!(!store.exists());
    }
}
