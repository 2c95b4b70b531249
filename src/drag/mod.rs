//! Tab drag-and-drop state machine.
//!
//! `None -> Preparing -> {Reordering | Detaching} -> Completing -> None`.
//! Strips other than the source sit in `ExternalDrag` while a drag is
//! active and report a [`DropZone`] when the pointer is over their window.
//!
//! This module holds the pure parts (states, thresholds, classification and
//! the single drag slot). Pointer handling that moves tabs between windows
//! lives on [`WindowHierarchy`](crate::window::WindowHierarchy).

mod drop_zone;
mod manager;
mod state;

pub use drop_zone::{DropIndicator, DropZone};
pub use manager::{DragEvent, DragManager};
pub use state::{DragOperation, DragPreview, DragState};

use crate::tab::TabId;
use crate::window::{Geometry, Point, WindowId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DragError {
    #[error("a drag of tab {tab_id} is already in progress")]
    AlreadyActive { tab_id: TabId },

    #[error("tab at index {index} cannot be dragged")]
    NotDetachable { index: usize },
}

/// What a pointer release did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// No drag was active
    Idle,
    /// Released before the threshold: treated as a click
    Cancelled,
    /// Tab moved within its strip (`to` is its final index)
    Reordered { tab_id: TabId, from: usize, to: usize },
    /// Tab moved into another existing window
    MovedToWindow {
        tab_id: TabId,
        window: WindowId,
        index: usize,
        /// Source detached window closed because it became empty
        closed_source: bool,
    },
    /// Tab placed into a newly created detached window
    Detached { tab_id: TabId, window: WindowId },
    /// Completion failed; the drag was force-cleaned and the tab left where it was
    Failed { tab_id: TabId, reason: String },
}

/// True once the pointer has travelled strictly more than `threshold`.
pub fn exceeds_threshold(start: Point, current: Point, threshold: i32) -> bool {
    start.manhattan_distance(current) > threshold
}

/// Decide between reordering and detaching for the current pointer position.
pub fn classify(
    pointer: Point,
    strip_bounds: Geometry,
    margin: i32,
    detach_enabled: bool,
) -> DragState {
    if !detach_enabled || strip_bounds.expanded(margin).contains(pointer) {
        DragState::Reordering
    } else {
        DragState::Detaching
    }
}
