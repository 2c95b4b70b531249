//! Window/tab hierarchy.
//!
//! One main window (holding the pinned Home tab) plus any number of detached
//! windows. [`WindowHierarchy`] owns every [`WindowNode`], the drag slot and
//! the shutdown sequence.

mod drag_ops;
mod geometry;
mod hierarchy;
mod node;
pub mod placement;

pub use geometry::{Geometry, Point};
pub use hierarchy::{CloseOutcome, HierarchyEvent, MoveResult, ShutdownReport, WindowHierarchy};
pub use node::{WindowId, WindowKind, WindowNode};

use crate::drag::DragError;
use crate::tab::TabId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("main window is already registered")]
    MainAlreadyRegistered,

    #[error("no main window registered")]
    NoMainWindow,

    #[error("expected a {expected:?} window")]
    WrongKind { expected: WindowKind },

    #[error("window {0} is not registered")]
    UnknownWindow(WindowId),

    #[error("tab {0} not found in any window")]
    UnknownTab(TabId),

    #[error("no detachable tab at index {index} in window {window}")]
    InvalidIndex { window: WindowId, index: usize },

    #[error("the Home tab cannot be closed, moved or detached")]
    HomeTabProtected,

    #[error("tab {0} is already present in the target window")]
    DuplicateTab(TabId),

    #[error("detached window limit of {0} reached")]
    LimitReached(usize),

    #[error("shutdown in progress")]
    ShuttingDown,

    #[error(transparent)]
    Drag(#[from] DragError),
}
