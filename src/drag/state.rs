//! Drag states, the in-flight operation and its floating preview.

use crate::tab::TabId;
use crate::window::{Point, WindowId};

/// Phase of a tab drag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DragState {
    #[default]
    None,
    /// Pointer is down on a tab, threshold not yet exceeded
    Preparing,
    /// Dragging within the source strip
    Reordering,
    /// Dragging outside the source strip (release detaches or moves)
    Detaching,
    /// Mode of non-source strips while another strip's tab is dragged
    ExternalDrag,
    /// Release received, tab ownership being transferred
    Completing,
}

impl DragState {
    /// Past the threshold and showing a preview.
    pub fn is_dragging(self) -> bool {
        matches!(self, DragState::Reordering | DragState::Detaching)
    }
}

/// Floating, semi-transparent copy of the dragged tab that follows the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct DragPreview {
    pub title: String,
    pub icon: Option<String>,
    pub position: Point,
    pub size: (u32, u32),
    pub opacity: f32,
    offset: i32,
    visible: bool,
}

impl DragPreview {
    pub const OPACITY: f32 = 0.7;

    pub fn new(title: &str, icon: Option<String>, tab_size: (u32, u32), offset: i32) -> Self {
        Self {
            title: title.to_string(),
            icon,
            position: Point::default(),
            // Padded by 5px on every side around the tab
            size: (tab_size.0 + 10, tab_size.1 + 10),
            opacity: Self::OPACITY,
            offset,
            visible: true,
        }
    }

    /// Move next to the pointer, offset so it never sits under it.
    pub fn update_position(&mut self, pointer: Point) {
        self.position = pointer.offset(self.offset, self.offset);
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// One in-progress tab drag.
///
/// `source_window` is a back-reference by id; the tab content itself stays in
/// its source strip until the drag completes.
#[derive(Debug, Clone, PartialEq)]
pub struct DragOperation {
    pub source_tab_index: usize,
    pub source_window: WindowId,
    pub tab_id: TabId,
    pub title: String,
    pub icon: Option<String>,
    pub drag_start_position: Point,
    pub current_position: Point,
    pub current_state: DragState,
    pub preview: Option<DragPreview>,
}

impl DragOperation {
    pub fn new(
        source_window: WindowId,
        source_tab_index: usize,
        tab_id: TabId,
        title: String,
        icon: Option<String>,
        start: Point,
    ) -> Self {
        Self {
            source_tab_index,
            source_window,
            tab_id,
            title,
            icon,
            drag_start_position: start,
            current_position: start,
            current_state: DragState::Preparing,
            preview: None,
        }
    }

    /// Dispose of the preview.
    pub fn cleanup(&mut self) {
        if let Some(mut preview) = self.preview.take() {
            preview.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_tracks_pointer_with_offset() {
        let mut preview = DragPreview::new("Fit", None, (120, 30), 10);
        preview.update_position(Point::new(100, 200));
        assert_eq!(preview.position, Point::new(110, 210));
        assert_eq!(preview.size, (130, 40));
        assert_eq!(preview.opacity, DragPreview::OPACITY);
    }

    #[test]
    fn test_cleanup_disposes_preview() {
        let mut op = DragOperation::new(
            WindowId::new(),
            1,
            "fitting_1".into(),
            "Fit".into(),
            None,
            Point::new(0, 0),
        );
        op.preview = Some(DragPreview::new("Fit", None, (120, 30), 10));
        op.cleanup();
        assert!(op.preview.is_none());
        assert_eq!(op.current_state, DragState::Preparing);
    }
}
