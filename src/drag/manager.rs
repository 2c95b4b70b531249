//! The single process-wide drag slot.

use super::{DragError, DragOperation, DragState};
use crate::events::EventEmitter;
use crate::tab::TabId;
use crate::window::WindowId;

/// Drag lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Started {
        tab_id: TabId,
        source_window: WindowId,
    },
    StateChanged {
        tab_id: TabId,
        from: DragState,
        to: DragState,
    },
    Ended {
        tab_id: TabId,
        /// False when the drag was cancelled or force-cleaned
        completed: bool,
    },
}

/// Holds at most one [`DragOperation`].
#[derive(Debug, Default)]
pub struct DragManager {
    active: Option<DragOperation>,
    events: EventEmitter<DragEvent>,
}

impl DragManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&mut self) -> &mut EventEmitter<DragEvent> {
        &mut self.events
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&DragOperation> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut DragOperation> {
        self.active.as_mut()
    }

    pub fn state(&self) -> DragState {
        self.active
            .as_ref()
            .map_or(DragState::None, |op| op.current_state)
    }

    /// Occupy the slot. Fails if another drag is in flight.
    pub fn begin(&mut self, op: DragOperation) -> Result<(), DragError> {
        if let Some(active) = &self.active {
            return Err(DragError::AlreadyActive {
                tab_id: active.tab_id.clone(),
            });
        }
        debug_info!(
            "DRAG",
            "Drag registered: {} from window {}",
            op.tab_id,
            op.source_window
        );
        self.events.emit(&DragEvent::Started {
            tab_id: op.tab_id.clone(),
            source_window: op.source_window,
        });
        self.active = Some(op);
        Ok(())
    }

    /// Move the active operation to `to`, emitting a change event when the
    /// state actually differs.
    pub fn transition(&mut self, to: DragState) -> Option<DragState> {
        let op = self.active.as_mut()?;
        let from = op.current_state;
        if from == to {
            return Some(from);
        }
        op.current_state = to;
        debug_log!("DRAG", "{}: {:?} -> {:?}", op.tab_id, from, to);
        self.events.emit(&DragEvent::StateChanged {
            tab_id: op.tab_id.clone(),
            from,
            to,
        });
        Some(from)
    }

    /// Clear the slot, dispose the preview and emit `Ended`.
    pub fn finish(&mut self, completed: bool) -> Option<DragOperation> {
        let mut op = self.active.take()?;
        op.cleanup();
        op.current_state = DragState::None;
        self.events.emit(&DragEvent::Ended {
            tab_id: op.tab_id.clone(),
            completed,
        });
        Some(op)
    }
}
