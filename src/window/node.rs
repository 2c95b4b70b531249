//! A window: identity, geometry and its tab strip.

use super::geometry::{Geometry, Point};
use crate::config::DragConfig;
use crate::drag::DropZone;
use crate::tab::{HomeTab, TabEntry, TabRef, TabStrip};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Unique window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(uuid::Uuid);

impl WindowId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell windows apart in logs
        let s = self.0.simple().to_string();
        f.write_str(&s[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// The single authoritative window holding the Home tab
    Main,
    Detached,
}

/// One top-level window.
#[derive(Debug)]
pub struct WindowNode {
    id: WindowId,
    kind: WindowKind,
    pub title: String,
    pub geometry: Geometry,
    pub(crate) strip: TabStrip,
}

impl WindowNode {
    /// Main window with the Home tab pinned at index 0.
    pub fn main(title: &str, geometry: Geometry) -> Self {
        let mut strip = TabStrip::new(true);
        let home: TabRef = Rc::new(RefCell::new(HomeTab::default()));
        strip.add_tab(TabEntry::from_content(home));
        Self {
            id: WindowId::new(),
            kind: WindowKind::Main,
            title: title.to_string(),
            geometry,
            strip,
        }
    }

    /// Empty detached window.
    pub fn detached(title: &str, geometry: Geometry) -> Self {
        Self {
            id: WindowId::new(),
            kind: WindowKind::Detached,
            title: title.to_string(),
            geometry,
            strip: TabStrip::new(false),
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn is_main(&self) -> bool {
        self.kind == WindowKind::Main
    }

    pub fn strip(&self) -> &TabStrip {
        &self.strip
    }

    pub fn tab_count(&self) -> usize {
        self.strip.tab_count()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.geometry.contains(p)
    }

    pub fn title_bar_bounds(&self, layout: &DragConfig) -> Geometry {
        Geometry::new(
            self.geometry.x,
            self.geometry.y,
            self.geometry.width,
            layout.title_bar_height,
        )
    }

    /// The tab strip sits directly below the title bar.
    pub fn strip_bounds(&self, layout: &DragConfig) -> Geometry {
        Geometry::new(
            self.geometry.x,
            self.geometry.y + layout.title_bar_height as i32,
            self.geometry.width,
            layout.tab_strip_height,
        )
    }

    /// Index of the tab under the pointer, if any.
    pub fn tab_index_at(&self, p: Point, layout: &DragConfig) -> Option<usize> {
        if !self.strip_bounds(layout).contains(p) || layout.tab_width == 0 {
            return None;
        }
        let idx = ((p.x - self.geometry.x) / layout.tab_width as i32) as usize;
        (idx < self.strip.tab_count()).then_some(idx)
    }

    /// Insertion index for a drop at `p`: before the first tab whose center
    /// lies right of the pointer, or after the last tab.
    pub fn insertion_index_at(&self, p: Point, layout: &DragConfig) -> usize {
        let width = layout.tab_width as i32;
        (0..self.strip.tab_count())
            .find(|&i| p.x < self.geometry.x + i as i32 * width + width / 2)
            .unwrap_or(self.strip.tab_count())
    }

    /// Drop zone under `p`, `None` when the pointer is outside the window.
    pub fn drop_zone_at(&self, p: Point, layout: &DragConfig) -> Option<DropZone> {
        if !self.contains(p) {
            None
        } else if self.strip_bounds(layout).contains(p) {
            Some(DropZone::TabBar {
                insert_index: self.insertion_index_at(p, layout),
            })
        } else if self.title_bar_bounds(layout).contains(p) {
            Some(DropZone::WindowTitle)
        } else {
            Some(DropZone::EmptySpace)
        }
    }
}
