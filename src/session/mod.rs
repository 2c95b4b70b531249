//! Session snapshot types for save/restore across restarts
//!
//! On shutdown every window and the state of each of its tabs is written to a
//! JSON snapshot; on startup the snapshot is replayed through a
//! [`TabFactory`](crate::tab::TabFactory). Older files (a bare array of tab
//! states, or a different format version) go through a legacy loader that
//! puts every tab into the main window.

pub mod capture;
pub mod restore;
pub mod storage;

pub use capture::capture_snapshot;
pub use restore::{RestoreReport, restore_session};
pub use storage::{LoadedSession, SessionStore, session_path};

use crate::tab::{TabId, TabState};
use crate::window::{Geometry, WindowError, WindowKind};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Snapshot format written by this version
pub const SESSION_VERSION: &str = "2.0";

/// `shutdown_reason` recorded by the shutdown sequence
pub const SHUTDOWN_REASON: &str = "main_window_closed";

/// Title used for a tab whose state carries no name
pub const DEFAULT_TAB_NAME: &str = "Untitled Tab";

/// Everything needed to rebuild the window/tab tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: String,
    /// When the snapshot was taken (ISO 8601)
    pub timestamp: String,
    pub main_window: WindowState,
    #[serde(default)]
    pub detached_windows: Vec<WindowState>,
    #[serde(default)]
    pub window_count: usize,
    #[serde(default)]
    pub shutdown_reason: String,
}

/// A single window in the saved session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowState {
    #[serde(rename = "window_type", default = "default_kind")]
    pub kind: WindowKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// Tab states in strip order; non-object entries are dropped on load
    #[serde(default, deserialize_with = "lenient_tabs")]
    pub tabs: Vec<TabState>,
}

fn default_kind() -> WindowKind {
    WindowKind::Main
}

fn lenient_tabs<'de, D>(deserializer: D) -> Result<Vec<TabState>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(map) => Some(TabState::from_map(map)),
            other => {
                log::warn!("Skipping malformed tab state: {}", other);
                None
            }
        })
        .collect())
}

impl WindowState {
    pub fn empty_main() -> Self {
        Self {
            kind: WindowKind::Main,
            title: String::new(),
            geometry: None,
            tabs: Vec::new(),
        }
    }
}

impl SessionSnapshot {
    /// Total number of saved tabs across all windows.
    pub fn tab_count(&self) -> usize {
        self.main_window.tabs.len()
            + self
                .detached_windows
                .iter()
                .map(|w| w.tabs.len())
                .sum::<usize>()
    }
}

/// Why a single tab or window could not be restored.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("tab state is missing `{0}`")]
    MissingField(&'static str),

    #[error("tab {0} is already open")]
    DuplicateTab(TabId),

    #[error("failed to restore tab {tab_id}: {source:#}")]
    Restore {
        tab_id: TabId,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Window(#[from] WindowError),
}
