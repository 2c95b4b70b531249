//! Capture the current window/tab tree into a [`SessionSnapshot`]

use super::{SESSION_VERSION, SessionSnapshot, WindowState};
use crate::bus::now_iso8601;
use crate::window::{WindowHierarchy, WindowNode};

/// Snapshot every window of `hierarchy`.
///
/// Tabs whose state cannot be read are logged and left out; they never
/// abort the capture.
pub fn capture_snapshot(hierarchy: &WindowHierarchy, reason: &str) -> SessionSnapshot {
    let main_window = hierarchy
        .main_window()
        .map(capture_window)
        .unwrap_or_else(WindowState::empty_main);
    let detached_windows: Vec<WindowState> = hierarchy
        .detached_windows()
        .iter()
        .map(capture_window)
        .collect();

    SessionSnapshot {
        version: SESSION_VERSION.to_string(),
        timestamp: now_iso8601(),
        main_window,
        window_count: detached_windows.len() + 1,
        detached_windows,
        shutdown_reason: reason.to_string(),
    }
}

fn capture_window(node: &WindowNode) -> WindowState {
    let mut tabs = Vec::with_capacity(node.tab_count());
    for entry in node.strip().tabs() {
        let Ok(content) = entry.content.try_borrow() else {
            log::warn!("Tab {} is busy, not saved", entry.tab_id);
            continue;
        };
        match content.state() {
            Ok(mut state) => {
                if state.tab_name().is_none() {
                    state.insert("tab_name", entry.title.clone());
                }
                if !node.is_main() {
                    state.insert("detached", true);
                }
                tabs.push(state);
            }
            Err(e) => log::error!("Error getting state of tab {}: {:#}", entry.tab_id, e),
        }
    }

    WindowState {
        kind: node.kind(),
        title: if node.is_main() {
            String::new()
        } else {
            node.title.clone()
        },
        geometry: Some(node.geometry),
        tabs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DragConfig, WindowConfig};
    use crate::tab::{TabContent, TabRef, TabState};
    use crate::window::{Geometry, Point, WindowKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Note {
        id: String,
        fail: bool,
    }

    impl TabContent for Note {
        fn tab_id(&self) -> &str {
            &self.id
        }
        fn tab_type(&self) -> &str {
            "note"
        }
        fn state(&self) -> anyhow::Result<TabState> {
            if self.fail {
                anyhow::bail!("no state");
            }
            Ok(TabState::new("note", &self.id))
        }
        fn display_name(&self) -> String {
            format!("Note {}", self.id)
        }
        fn set_display_name(&mut self, _name: &str) {}
    }

    fn note(id: &str, fail: bool) -> TabRef {
        Rc::new(RefCell::new(Note {
            id: id.to_string(),
            fail,
        }))
    }

    #[test]
    fn test_capture_marks_detached_and_skips_failures() {
        let mut h = WindowHierarchy::new(&WindowConfig::default(), &DragConfig::default());
        let main = h
            .register_main_window(WindowNode::main("W", Geometry::new(0, 0, 1200, 800)))
            .unwrap();
        h.add_tab(main, note("note_1", false)).unwrap();
        h.add_tab(main, note("note_2", true)).unwrap();
        h.add_tab(main, note("note_3", false)).unwrap();
        h.detach_tab(main, 3, Point::new(200, 200)).unwrap();

        let snapshot = capture_snapshot(&h, "test");
        assert_eq!(snapshot.version, "2.0");
        assert_eq!(snapshot.window_count, 2);
        assert_eq!(snapshot.shutdown_reason, "test");

        let main_tabs: Vec<_> = snapshot
            .main_window
            .tabs
            .iter()
            .map(|t| t.tab_id().unwrap())
            .collect();
        assert_eq!(main_tabs, vec!["home", "note_1"]);
        assert_eq!(snapshot.main_window.tabs[1].tab_name(), Some("Note note_1"));
        assert!(!snapshot.main_window.tabs[1].is_detached());

        let detached = &snapshot.detached_windows[0];
        assert_eq!(detached.kind, WindowKind::Detached);
        assert_eq!(detached.title, "Workbench - Note note_3");
        assert!(detached.tabs[0].is_detached());
    }
}
