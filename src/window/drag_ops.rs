//! Pointer-driven tab dragging across the windows of a hierarchy.

use super::hierarchy::WindowHierarchy;
use super::{Point, WindowError, WindowId};
use crate::drag::{
    DragError, DragOperation, DragOutcome, DragPreview, DragState, DropIndicator, DropZone,
    classify, exceeds_threshold,
};

impl WindowHierarchy {
    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    /// Pointer down inside `window`.
    ///
    /// Returns `Ok(true)` when a drag entered `Preparing`, `Ok(false)` when
    /// the pointer is not over a tab. Pressing a tab that cannot leave its
    /// position (the Home tab) is an error.
    pub fn pointer_pressed(&mut self, window: WindowId, position: Point) -> Result<bool, WindowError> {
        if self.shutdown_in_progress {
            return Ok(false);
        }
        let node = self
            .window(window)
            .ok_or(WindowError::UnknownWindow(window))?;
        let Some(index) = node.tab_index_at(position, &self.layout) else {
            return Ok(false);
        };
        if !node.strip().is_detachable(index) {
            return Err(DragError::NotDetachable { index }.into());
        }
        let Some(entry) = node.strip().get(index) else {
            return Ok(false);
        };

        let op = DragOperation::new(
            window,
            index,
            entry.tab_id.clone(),
            entry.title.clone(),
            entry.icon.clone(),
            position,
        );
        self.drag.begin(op)?;
        self.set_external_drag(Some(window));
        Ok(true)
    }

    /// Pointer moved while a drag may be active. Returns the resulting state.
    pub fn pointer_moved(&mut self, position: Point) -> DragState {
        let Some(op) = self.drag.active_mut() else {
            return DragState::None;
        };
        op.current_position = position;
        let (source, start, state) = (op.source_window, op.drag_start_position, op.current_state);

        if state == DragState::Preparing
            && !exceeds_threshold(start, position, self.layout.threshold_px)
        {
            return state;
        }
        let Some(strip_bounds) = self.window(source).map(|n| n.strip_bounds(&self.layout)) else {
            return state;
        };

        let next = classify(
            position,
            strip_bounds,
            self.layout.bounds_margin_px,
            self.layout.tab_detach_enabled,
        );
        self.drag.transition(next);

        let tab_size = (self.layout.tab_width, self.layout.tab_strip_height);
        let offset = self.layout.preview_offset;
        if let Some(op) = self.drag.active_mut() {
            if op.preview.is_none() {
                op.preview = Some(DragPreview::new(&op.title, op.icon.clone(), tab_size, offset));
            }
            if let Some(preview) = op.preview.as_mut() {
                preview.update_position(position);
            }
        }

        let detaching = next == DragState::Detaching;
        let layout = &self.layout;
        for node in self.main.iter_mut().chain(self.detached.iter_mut()) {
            if node.id() == source {
                continue;
            }
            let zone = if detaching {
                node.drop_zone_at(position, layout)
            } else {
                None
            };
            node.strip.set_drop_zone(zone);
        }
        next
    }

    /// Pointer released: complete, or cancel, the active drag.
    ///
    /// A failed completion is logged and the drag force-cleaned; the tab
    /// stays in its source window.
    pub fn pointer_released(&mut self, position: Point) -> DragOutcome {
        if !self.drag.is_active() {
            return DragOutcome::Idle;
        }
        let state = self.pointer_moved(position);
        if state == DragState::Preparing {
            debug_log!("DRAG", "Released before threshold, treating as click");
            self.drag.finish(false);
            self.set_external_drag(None);
            return DragOutcome::Cancelled;
        }
        let Some(op) = self.drag.active().cloned() else {
            return DragOutcome::Idle;
        };

        self.drag.transition(DragState::Completing);
        let result = match state {
            DragState::Reordering => self.complete_reorder(&op, position),
            _ => self.complete_detach(&op, position),
        };

        let outcome = match result {
            Ok(outcome) => {
                self.drag.finish(true);
                outcome
            }
            Err(e) => {
                log::error!("Drag of tab {} failed: {}", op.tab_id, e);
                self.drag.finish(false);
                DragOutcome::Failed {
                    tab_id: op.tab_id.clone(),
                    reason: e.to_string(),
                }
            }
        };
        self.set_external_drag(None);
        debug_info!("DRAG", "Drag finished: {:?}", outcome);
        outcome
    }

    /// Abort the active drag (Escape). Returns false when nothing was active.
    pub fn cancel_drag(&mut self) -> bool {
        let Some(op) = self.drag.finish(false) else {
            return false;
        };
        debug_info!("DRAG", "Drag of {} cancelled", op.tab_id);
        self.set_external_drag(None);
        true
    }

    /// Feedback for the current detach target: a foreign window's drop zone,
    /// or a new window when nothing is under the pointer.
    pub fn drop_indicator(&self) -> Option<DropIndicator> {
        let op = self.drag.active()?;
        if op.current_state != DragState::Detaching {
            return None;
        }
        Some(
            match self.drop_target(op.source_window, op.current_position) {
                Some((window, zone)) => {
                    let count = self.window(window).map_or(0, |n| n.tab_count());
                    zone.indicator(count)
                }
                None => DropIndicator::NewWindow,
            },
        )
    }

    /// Topmost foreign window under `position` and its drop zone. Detached
    /// windows stack above the main window, newest first.
    fn drop_target(&self, exclude: WindowId, position: Point) -> Option<(WindowId, DropZone)> {
        self.detached
            .iter()
            .rev()
            .chain(self.main.iter())
            .filter(|n| n.id() != exclude)
            .find_map(|n| {
                n.drop_zone_at(position, &self.layout)
                    .map(|zone| (n.id(), zone))
            })
    }

    /// Put every strip but `source` into `ExternalDrag`, or clear all strips
    /// when `source` is `None`.
    fn set_external_drag(&mut self, source: Option<WindowId>) {
        for node in self.windows_mut() {
            let external = source.is_some_and(|s| s != node.id());
            node.strip.set_external_drag(external);
        }
    }

    fn complete_reorder(
        &mut self,
        op: &DragOperation,
        position: Point,
    ) -> Result<DragOutcome, WindowError> {
        let node = self
            .window(op.source_window)
            .ok_or(WindowError::UnknownWindow(op.source_window))?;
        let from = node
            .strip()
            .index_of(&op.tab_id)
            .ok_or_else(|| WindowError::UnknownTab(op.tab_id.clone()))?;
        let insert = node.insertion_index_at(position, &self.layout);

        // Dropping on either side of itself is a no-op
        if insert == from || insert == from + 1 {
            return Ok(DragOutcome::Reordered {
                tab_id: op.tab_id.clone(),
                from,
                to: from,
            });
        }
        let target = if insert > from { insert - 1 } else { insert };
        self.reorder_tab(op.source_window, &op.tab_id, target)?;
        let to = self.find_tab(&op.tab_id).map_or(from, |(_, idx)| idx);
        Ok(DragOutcome::Reordered {
            tab_id: op.tab_id.clone(),
            from,
            to,
        })
    }

    fn complete_detach(
        &mut self,
        op: &DragOperation,
        position: Point,
    ) -> Result<DragOutcome, WindowError> {
        if let Some((target, zone)) = self.drop_target(op.source_window, position) {
            let count = self.window(target).map_or(0, |n| n.tab_count());
            let moved =
                self.move_tab_to_window(&op.tab_id, target, Some(zone.target_index(count)))?;
            return Ok(DragOutcome::MovedToWindow {
                tab_id: op.tab_id.clone(),
                window: moved.window,
                index: moved.index,
                closed_source: moved.closed_source,
            });
        }

        let index = self
            .find_tab(&op.tab_id)
            .filter(|(window, _)| *window == op.source_window)
            .map(|(_, idx)| idx)
            .ok_or_else(|| WindowError::UnknownTab(op.tab_id.clone()))?;
        let window = self.detach_tab(op.source_window, index, position)?;
        Ok(DragOutcome::Detached {
            tab_id: op.tab_id.clone(),
            window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DragConfig, WindowConfig};
    use crate::tab::{StripMode, TabContent, TabRef, TabState};
    use crate::window::{Geometry, WindowNode};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Plain(String);

    impl TabContent for Plain {
        fn tab_id(&self) -> &str {
            &self.0
        }
        fn tab_type(&self) -> &str {
            "plain"
        }
        fn state(&self) -> anyhow::Result<TabState> {
            Ok(TabState::new("plain", &self.0))
        }
        fn display_name(&self) -> String {
            self.0.clone()
        }
        fn set_display_name(&mut self, _name: &str) {}
    }

    fn plain(id: &str) -> TabRef {
        Rc::new(RefCell::new(Plain(id.to_string())))
    }

    /// Main window at the origin, 800 wide; strip spans y 28..58.
    fn setup(ids: &[&str]) -> (WindowHierarchy, WindowId) {
        let mut h = WindowHierarchy::new(&WindowConfig::default(), &DragConfig::default());
        let main = h
            .register_main_window(WindowNode::main("W", Geometry::new(0, 0, 800, 600)))
            .unwrap();
        for id in ids {
            h.add_tab(main, plain(id)).unwrap();
        }
        (h, main)
    }

    #[test]
    fn test_press_on_home_is_refused() {
        let (mut h, main) = setup(&["a"]);
        let err = h.pointer_pressed(main, Point::new(10, 40)).unwrap_err();
        assert!(matches!(
            err,
            WindowError::Drag(DragError::NotDetachable { index: 0 })
        ));
        assert!(!h.is_dragging());
    }

    #[test]
    fn test_click_without_movement_cancels() {
        let (mut h, main) = setup(&["a"]);
        assert!(h.pointer_pressed(main, Point::new(130, 40)).unwrap());
        assert_eq!(h.pointer_moved(Point::new(133, 42)), DragState::Preparing);
        assert_eq!(h.pointer_released(Point::new(133, 42)), DragOutcome::Cancelled);
        assert!(!h.is_dragging());
    }

    #[test]
    fn test_reorder_within_strip() {
        let (mut h, main) = setup(&["a", "b", "c"]);
        // "a" at index 1 (x 120..240), drop right of "c"'s center (x 420)
        h.pointer_pressed(main, Point::new(130, 40)).unwrap();
        assert_eq!(h.pointer_moved(Point::new(300, 40)), DragState::Reordering);
        assert!(h.drag().active().unwrap().preview.is_some());

        let outcome = h.pointer_released(Point::new(450, 40));
        assert_eq!(
            outcome,
            DragOutcome::Reordered {
                tab_id: "a".to_string(),
                from: 1,
                to: 3
            }
        );
        assert_eq!(
            h.main_window().unwrap().strip().tab_ids(),
            vec!["home", "b", "c", "a"]
        );
    }

    #[test]
    fn test_reorder_never_reaches_home_slot() {
        let (mut h, main) = setup(&["a", "b"]);
        h.pointer_pressed(main, Point::new(250, 40)).unwrap();
        h.pointer_moved(Point::new(5, 40));
        h.pointer_released(Point::new(5, 40));
        assert_eq!(
            h.main_window().unwrap().strip().tab_ids(),
            vec!["home", "b", "a"]
        );
    }

    #[test]
    fn test_detach_to_empty_space_and_cleanup() {
        let (mut h, main) = setup(&["a"]);
        h.pointer_pressed(main, Point::new(130, 40)).unwrap();
        assert_eq!(h.pointer_moved(Point::new(400, 400)), DragState::Detaching);
        // No other window under the pointer
        assert_eq!(h.drop_indicator(), Some(DropIndicator::NewWindow));
        h.pointer_moved(Point::new(1000, 700));

        let outcome = h.pointer_released(Point::new(1000, 700));
        let DragOutcome::Detached { tab_id, window } = outcome else {
            panic!("expected detach, got {outcome:?}");
        };
        assert_eq!(tab_id, "a");
        assert_eq!(h.window(window).unwrap().strip().tab_ids(), vec!["a"]);
        assert!(!h.is_dragging());
        assert!(
            h.windows()
                .all(|n| n.strip().mode() == StripMode::Normal && n.strip().drop_zone().is_none())
        );
    }

    #[test]
    fn test_cancel_drag_force_cleans() {
        let (mut h, main) = setup(&["a"]);
        h.pointer_pressed(main, Point::new(130, 40)).unwrap();
        h.pointer_moved(Point::new(400, 400));
        assert!(h.cancel_drag());
        assert!(!h.cancel_drag());
        assert_eq!(h.drag().state(), DragState::None);
        assert_eq!(
            h.main_window().unwrap().strip().tab_ids(),
            vec!["home", "a"]
        );
    }
}
