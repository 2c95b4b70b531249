//! Ordered tab container owned by every window

use super::{TabId, TabRef};
use crate::drag::DropZone;

/// A tab in a strip: content plus the title shown on the tab.
#[derive(Clone)]
pub struct TabEntry {
    pub tab_id: TabId,
    pub title: String,
    pub icon: Option<String>,
    pub content: TabRef,
}

impl TabEntry {
    /// Build an entry from the content's own id, name and icon.
    pub fn from_content(content: TabRef) -> Self {
        let (tab_id, title, icon) = {
            let c = content.borrow();
            (c.tab_id().to_string(), c.display_name(), c.icon())
        };
        Self {
            tab_id,
            title,
            icon,
            content,
        }
    }
}

impl std::fmt::Debug for TabEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabEntry")
            .field("tab_id", &self.tab_id)
            .field("title", &self.title)
            .finish()
    }
}

/// Drag mode of a strip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StripMode {
    #[default]
    Normal,
    /// Another strip's tab is being dragged; this strip is a drop candidate
    ExternalDrag,
}

/// Manages the ordered tabs of a single window
///
/// When `pinned_first` is set (main window) the tab at index 0 can never be
/// removed or moved, and no other tab can be placed before it.
#[derive(Debug, Default)]
pub struct TabStrip {
    /// All tabs in this window, in order
    tabs: Vec<TabEntry>,
    /// Currently active tab ID
    active_tab_id: Option<TabId>,
    pinned_first: bool,
    mode: StripMode,
    drop_zone: Option<DropZone>,
}

impl TabStrip {
    /// Create a new empty strip
    pub fn new(pinned_first: bool) -> Self {
        Self {
            pinned_first,
            ..Self::default()
        }
    }

    /// Lowest index a movable tab may occupy
    fn min_index(&self) -> usize {
        usize::from(self.pinned_first && !self.tabs.is_empty())
    }

    fn is_pinned(&self, index: usize) -> bool {
        self.pinned_first && index == 0
    }

    /// Whether the tab at `index` may be dragged, detached or closed
    pub fn is_detachable(&self, index: usize) -> bool {
        index < self.tabs.len() && !self.is_pinned(index)
    }

    /// Append a tab and make it active
    pub fn add_tab(&mut self, entry: TabEntry) -> usize {
        let index = self.tabs.len();
        self.insert_tab_at(entry, index)
    }

    /// Insert a tab at a specific index and make it active.
    ///
    /// The index is clamped to `min_index..=len`. Returns the final index.
    pub fn insert_tab_at(&mut self, entry: TabEntry, index: usize) -> usize {
        let clamped = index.clamp(self.min_index(), self.tabs.len());
        let id = entry.tab_id.clone();
        self.tabs.insert(clamped, entry);
        log::info!(
            "Inserted tab {} at index {} (total: {})",
            id,
            clamped,
            self.tabs.len()
        );
        self.active_tab_id = Some(id);
        clamped
    }

    /// Remove a tab by ID, returning it with its former index.
    ///
    /// Refuses the pinned tab. If the active tab is removed, the neighbour
    /// at the same index (or the previous one) becomes active.
    pub fn remove_tab(&mut self, id: &str) -> Option<(TabEntry, usize)> {
        let idx = self.index_of(id)?;
        if self.is_pinned(idx) {
            log::warn!("Refusing to remove pinned tab {}", id);
            return None;
        }

        let entry = self.tabs.remove(idx);
        if self.active_tab_id.as_deref() == Some(id) {
            self.active_tab_id = if self.tabs.is_empty() {
                None
            } else {
                let new_idx = idx.min(self.tabs.len() - 1);
                Some(self.tabs[new_idx].tab_id.clone())
            };
        }
        log::info!("Removed tab {} (index {})", id, idx);
        Some((entry, idx))
    }

    /// Move a tab to a specific index (used by drag-and-drop reordering)
    /// Returns true if the tab was actually moved, false if not found,
    /// pinned, or already at the target
    pub fn move_tab_to_index(&mut self, id: &str, target_index: usize) -> bool {
        let Some(current_idx) = self.index_of(id) else {
            return false;
        };
        if self.is_pinned(current_idx) {
            return false;
        }

        let clamped_target =
            target_index.clamp(self.min_index(), self.tabs.len().saturating_sub(1));
        if clamped_target == current_idx {
            return false;
        }

        let entry = self.tabs.remove(current_idx);
        self.tabs.insert(clamped_target, entry);
        log::debug!(
            "Moved tab {} from index {} to {}",
            id,
            current_idx,
            clamped_target
        );
        true
    }

    /// Switch to a tab by ID
    pub fn switch_to(&mut self, id: &str) -> bool {
        if self.index_of(id).is_some() {
            self.active_tab_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Change the title shown on a tab
    pub fn set_title(&mut self, id: &str, title: &str) -> bool {
        match self.tabs.iter_mut().find(|t| t.tab_id == id) {
            Some(entry) => {
                entry.title = title.to_string();
                true
            }
            None => false,
        }
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.tab_id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, index: usize) -> Option<&TabEntry> {
        self.tabs.get(index)
    }

    pub fn tab(&self, id: &str) -> Option<&TabEntry> {
        self.tabs.iter().find(|t| t.tab_id == id)
    }

    /// Get the number of tabs
    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tabs(&self) -> &[TabEntry] {
        &self.tabs
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.tabs.iter().map(|t| t.tab_id.clone()).collect()
    }

    /// Drain all tabs, including a pinned one
    pub fn drain_tabs(&mut self) -> Vec<TabEntry> {
        self.active_tab_id = None;
        std::mem::take(&mut self.tabs)
    }

    pub fn active_tab_id(&self) -> Option<&str> {
        self.active_tab_id.as_deref()
    }

    pub fn mode(&self) -> StripMode {
        self.mode
    }

    pub fn set_external_drag(&mut self, active: bool) {
        self.mode = if active {
            StripMode::ExternalDrag
        } else {
            StripMode::Normal
        };
        if !active {
            self.drop_zone = None;
        }
    }

    pub fn drop_zone(&self) -> Option<DropZone> {
        self.drop_zone
    }

    /// Only strips in `ExternalDrag` mode show drop feedback.
    pub fn set_drop_zone(&mut self, zone: Option<DropZone>) {
        self.drop_zone = if self.mode == StripMode::ExternalDrag {
            zone
        } else {
            None
        };
    }
}
