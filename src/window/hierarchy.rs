//! Ownership of all windows, tab movement between them and the shutdown
//! sequence.

use super::node::{WindowId, WindowKind, WindowNode};
use super::placement::smart_position;
use super::{Point, WindowError};
use crate::bus::DataBus;
use crate::config::{DragConfig, WindowConfig};
use crate::drag::{DragEvent, DragManager};
use crate::events::EventEmitter;
use crate::session::{self, SessionStore};
use crate::tab::{TabEntry, TabId, TabRef};

/// Hierarchy lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyEvent {
    WindowRegistered { window: WindowId, kind: WindowKind },
    WindowClosed { window: WindowId },
    TabDetached { tab_id: TabId, window: WindowId },
    /// A tab returned to the main window
    TabReattached { tab_id: TabId },
    TabMoved {
        tab_id: TabId,
        from: WindowId,
        to: WindowId,
        index: usize,
    },
    ShutdownStarted,
    AllWindowsClosing,
    SessionSaved { window_count: usize },
    QuitRequested,
}

/// Where a moved tab ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult {
    pub window: WindowId,
    pub index: usize,
    /// The source detached window was closed because it became empty
    pub closed_source: bool,
}

/// Result of a shutdown request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Shutdown had already started; nothing was done
    pub already_in_progress: bool,
    pub session_saved: bool,
    pub windows_closed: usize,
    pub bus_shut_down: bool,
    pub errors: Vec<String>,
}

/// Result of [`WindowHierarchy::request_close`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The main window was closed: the whole application shut down
    Shutdown(ShutdownReport),
    /// A detached window was closed
    Closed {
        /// Single orphaned tab moved back to the main window
        reattached: Option<TabId>,
        /// Tabs closed and removed from the bus
        closed_tabs: Vec<TabId>,
    },
}

/// Owner of the main window, all detached windows and the drag slot.
pub struct WindowHierarchy {
    pub(super) main: Option<WindowNode>,
    pub(super) detached: Vec<WindowNode>,
    pub(super) shutdown_in_progress: bool,
    pub(super) quit_requested: bool,
    pub(super) cascade_counter: u32,
    pub(super) drag: DragManager,
    pub(super) events: EventEmitter<HierarchyEvent>,
    pub(super) window_config: WindowConfig,
    pub(super) layout: DragConfig,
}

impl std::fmt::Debug for WindowHierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowHierarchy")
            .field("main", &self.main.as_ref().map(WindowNode::id))
            .field("detached", &self.detached.len())
            .field("shutdown_in_progress", &self.shutdown_in_progress)
            .field("drag", &self.drag.state())
            .finish()
    }
}

pub(super) fn detached_title(app_title: &str, tab_title: &str) -> String {
    format!("{app_title} - {tab_title}")
}

impl WindowHierarchy {
    pub fn new(window_config: &WindowConfig, layout: &DragConfig) -> Self {
        Self {
            main: None,
            detached: Vec::new(),
            shutdown_in_progress: false,
            quit_requested: false,
            cascade_counter: 0,
            drag: DragManager::new(),
            events: EventEmitter::new(),
            window_config: window_config.clone(),
            layout: layout.clone(),
        }
    }

    pub fn events(&mut self) -> &mut EventEmitter<HierarchyEvent> {
        &mut self.events
    }

    pub fn drag(&self) -> &DragManager {
        &self.drag
    }

    pub fn drag_events(&mut self) -> &mut EventEmitter<DragEvent> {
        self.drag.events()
    }

    pub fn window_config(&self) -> &WindowConfig {
        &self.window_config
    }

    pub fn layout(&self) -> &DragConfig {
        &self.layout
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_in_progress
    }

    /// Set once the shutdown sequence has asked the event loop to exit.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    // ---------------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------------

    pub fn main_window(&self) -> Option<&WindowNode> {
        self.main.as_ref()
    }

    pub fn main_window_id(&self) -> Option<WindowId> {
        self.main.as_ref().map(WindowNode::id)
    }

    pub fn detached_windows(&self) -> &[WindowNode] {
        &self.detached
    }

    /// Main window first, then detached windows in creation order.
    pub fn windows(&self) -> impl Iterator<Item = &WindowNode> {
        self.main.iter().chain(self.detached.iter())
    }

    pub(super) fn windows_mut(&mut self) -> impl Iterator<Item = &mut WindowNode> {
        self.main.iter_mut().chain(self.detached.iter_mut())
    }

    pub fn window_count(&self) -> usize {
        self.windows().count()
    }

    pub fn window(&self, id: WindowId) -> Option<&WindowNode> {
        self.windows().find(|n| n.id() == id)
    }

    pub(super) fn window_mut(&mut self, id: WindowId) -> Option<&mut WindowNode> {
        self.windows_mut().find(|n| n.id() == id)
    }

    /// Window holding `tab_id` and the tab's index there.
    pub fn find_tab(&self, tab_id: &str) -> Option<(WindowId, usize)> {
        self.windows()
            .find_map(|n| n.strip().index_of(tab_id).map(|idx| (n.id(), idx)))
    }

    pub fn tab_content(&self, tab_id: &str) -> Option<TabRef> {
        self.windows()
            .find_map(|n| n.strip().tab(tab_id))
            .map(|entry| entry.content.clone())
    }

    pub fn all_tab_ids(&self) -> Vec<TabId> {
        self.windows().flat_map(|n| n.strip().tab_ids()).collect()
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Register the main window. Allowed exactly once.
    pub fn register_main_window(&mut self, node: WindowNode) -> Result<WindowId, WindowError> {
        if node.kind() != WindowKind::Main {
            return Err(WindowError::WrongKind {
                expected: WindowKind::Main,
            });
        }
        if self.main.is_some() {
            return Err(WindowError::MainAlreadyRegistered);
        }
        let id = node.id();
        self.main = Some(node);
        log::info!("Main window registered: {}", id);
        self.events.emit(&HierarchyEvent::WindowRegistered {
            window: id,
            kind: WindowKind::Main,
        });
        Ok(id)
    }

    pub fn register_detached_window(&mut self, node: WindowNode) -> Result<WindowId, WindowError> {
        if node.kind() != WindowKind::Detached {
            return Err(WindowError::WrongKind {
                expected: WindowKind::Detached,
            });
        }
        if self.shutdown_in_progress {
            return Err(WindowError::ShuttingDown);
        }
        if let Some(max) = self.window_config.max_detached_windows
            && self.detached.len() >= max
        {
            log::warn!("Cannot open detached window: limit of {} reached", max);
            return Err(WindowError::LimitReached(max));
        }
        let id = node.id();
        self.detached.push(node);
        debug_info!(
            "WINDOW",
            "Detached window registered: {} (total: {})",
            id,
            self.detached.len()
        );
        self.events.emit(&HierarchyEvent::WindowRegistered {
            window: id,
            kind: WindowKind::Detached,
        });
        Ok(id)
    }

    /// Remove a detached window without touching its tabs.
    pub fn unregister_detached_window(&mut self, id: WindowId) -> Option<WindowNode> {
        let idx = self.detached.iter().position(|n| n.id() == id)?;
        let node = self.detached.remove(idx);
        debug_info!(
            "WINDOW",
            "Detached window unregistered: {} (remaining: {})",
            id,
            self.detached.len()
        );
        self.events.emit(&HierarchyEvent::WindowClosed { window: id });
        Some(node)
    }

    // ---------------------------------------------------------------------
    // Tab operations
    // ---------------------------------------------------------------------

    /// Append a tab to a window and make it active.
    pub fn add_tab(&mut self, window: WindowId, content: TabRef) -> Result<usize, WindowError> {
        self.insert_into(window, TabEntry::from_content(content), None)
            .map_err(|(err, _)| err)
    }

    /// Insert an entry, handing it back when the window refuses it.
    pub(super) fn insert_into(
        &mut self,
        window: WindowId,
        entry: TabEntry,
        index: Option<usize>,
    ) -> Result<usize, (WindowError, TabEntry)> {
        let Some(node) = self.window_mut(window) else {
            return Err((WindowError::UnknownWindow(window), entry));
        };
        if node.strip.contains(&entry.tab_id) {
            let id = entry.tab_id.clone();
            return Err((WindowError::DuplicateTab(id), entry));
        }
        Ok(match index {
            Some(i) => node.strip.insert_tab_at(entry, i),
            None => node.strip.add_tab(entry),
        })
    }

    /// Put a removed tab back where it came from. Falls back to the main
    /// window so the tab is never lost.
    fn roll_back(&mut self, window: WindowId, entry: TabEntry, index: usize) {
        if let Err((err, entry)) = self.insert_into(window, entry, Some(index)) {
            log::error!(
                "Could not return tab {} to window {}: {}",
                entry.tab_id,
                window,
                err
            );
            if let Some(main) = self.main.as_mut() {
                main.strip.add_tab(entry);
            }
        }
    }

    /// Close an emptied detached window. Returns true if it was closed.
    fn close_if_empty(&mut self, window: WindowId) -> bool {
        let empty = self
            .window(window)
            .is_some_and(|n| !n.is_main() && n.strip().is_empty());
        empty && self.unregister_detached_window(window).is_some()
    }

    /// Close a tab and remove it from the bus. The Home tab is refused.
    pub fn close_tab(&mut self, tab_id: &str, bus: &mut DataBus) -> Result<(), WindowError> {
        let (window, idx) = self
            .find_tab(tab_id)
            .ok_or_else(|| WindowError::UnknownTab(tab_id.to_string()))?;
        let node = self
            .window_mut(window)
            .ok_or(WindowError::UnknownWindow(window))?;
        if !node.strip.is_detachable(idx) {
            return Err(WindowError::HomeTabProtected);
        }
        node.strip.remove_tab(tab_id);

        if bus.is_registered(tab_id) {
            bus.unregister_tab(tab_id);
        }
        self.close_if_empty(window);
        log::info!("Closed tab {}", tab_id);
        Ok(())
    }

    /// Rename a tab: strip title, content display name and, for a detached
    /// window showing only this tab, the window title.
    pub fn rename_tab(&mut self, tab_id: &str, name: &str) -> Result<(), WindowError> {
        let (window, _) = self
            .find_tab(tab_id)
            .ok_or_else(|| WindowError::UnknownTab(tab_id.to_string()))?;
        let app_title = self.window_config.app_title.clone();
        let node = self
            .window_mut(window)
            .ok_or(WindowError::UnknownWindow(window))?;

        node.strip.set_title(tab_id, name);
        if let Some(entry) = node.strip.tab(tab_id) {
            match entry.content.try_borrow_mut() {
                Ok(mut content) => content.set_display_name(name),
                Err(_) => log::warn!("Tab {} is busy, display name not updated", tab_id),
            }
        }
        if !node.is_main() && node.strip.tab_count() == 1 {
            node.title = detached_title(&app_title, name);
        }
        Ok(())
    }

    /// Move a tab within its window.
    pub fn reorder_tab(
        &mut self,
        window: WindowId,
        tab_id: &str,
        index: usize,
    ) -> Result<bool, WindowError> {
        let node = self
            .window_mut(window)
            .ok_or(WindowError::UnknownWindow(window))?;
        let current = node
            .strip
            .index_of(tab_id)
            .ok_or_else(|| WindowError::UnknownTab(tab_id.to_string()))?;
        if !node.strip.is_detachable(current) {
            return Err(WindowError::HomeTabProtected);
        }
        Ok(node.strip.move_tab_to_index(tab_id, index))
    }

    /// Move the tab at `index` of `window` into a new detached window placed
    /// near `position`.
    ///
    /// The destination is created and registered before the tab leaves its
    /// source, so a failed window creation leaves the tab untouched.
    pub fn detach_tab(
        &mut self,
        window: WindowId,
        index: usize,
        position: Point,
    ) -> Result<WindowId, WindowError> {
        if self.shutdown_in_progress {
            return Err(WindowError::ShuttingDown);
        }
        let source = self
            .window(window)
            .ok_or(WindowError::UnknownWindow(window))?;
        if !source.strip().is_detachable(index) {
            return Err(if source.is_main() && index == 0 {
                WindowError::HomeTabProtected
            } else {
                WindowError::InvalidIndex { window, index }
            });
        }
        let Some(entry) = source.strip().get(index) else {
            return Err(WindowError::InvalidIndex { window, index });
        };
        let tab_id = entry.tab_id.clone();
        let title = detached_title(&self.window_config.app_title, &entry.title);

        let geometry = smart_position(position, self.cascade_counter, &self.window_config);
        let new_id = self.register_detached_window(WindowNode::detached(&title, geometry))?;
        self.cascade_counter = self.cascade_counter.wrapping_add(1);

        let removed = self
            .window_mut(window)
            .and_then(|n| n.strip.remove_tab(&tab_id));
        let Some((entry, from)) = removed else {
            self.unregister_detached_window(new_id);
            return Err(WindowError::UnknownTab(tab_id));
        };
        if let Err((err, entry)) = self.insert_into(new_id, entry, None) {
            self.roll_back(window, entry, from);
            self.unregister_detached_window(new_id);
            return Err(err);
        }

        self.close_if_empty(window);
        log::info!("Detached tab {} into window {}", tab_id, new_id);
        self.events.emit(&HierarchyEvent::TabDetached {
            tab_id,
            window: new_id,
        });
        Ok(new_id)
    }

    /// Move a tab into another existing window at `index` (append when
    /// `None`). The tab is rolled back to its source position if the target
    /// refuses it.
    pub fn move_tab_to_window(
        &mut self,
        tab_id: &str,
        target: WindowId,
        index: Option<usize>,
    ) -> Result<MoveResult, WindowError> {
        let (source, from) = self
            .find_tab(tab_id)
            .ok_or_else(|| WindowError::UnknownTab(tab_id.to_string()))?;

        if source == target {
            if let Some(index) = index {
                self.reorder_tab(target, tab_id, index)?;
            }
            let index = self
                .find_tab(tab_id)
                .map_or(from, |(_, idx)| idx);
            return Ok(MoveResult {
                window: target,
                index,
                closed_source: false,
            });
        }
        if self.window(target).is_none() {
            return Err(WindowError::UnknownWindow(target));
        }

        let source_node = self
            .window_mut(source)
            .ok_or(WindowError::UnknownWindow(source))?;
        if !source_node.strip.is_detachable(from) {
            return Err(WindowError::HomeTabProtected);
        }
        let (entry, from) = source_node
            .strip
            .remove_tab(tab_id)
            .ok_or_else(|| WindowError::UnknownTab(tab_id.to_string()))?;

        let index = match self.insert_into(target, entry, index) {
            Ok(index) => index,
            Err((err, entry)) => {
                log::warn!("Move of tab {} refused: {}", tab_id, err);
                self.roll_back(source, entry, from);
                return Err(err);
            }
        };

        let closed_source = self.close_if_empty(source);
        log::info!(
            "Moved tab {} from window {} to window {} at index {}",
            tab_id,
            source,
            target,
            index
        );
        if self.main_window_id() == Some(target) {
            self.events.emit(&HierarchyEvent::TabReattached {
                tab_id: tab_id.to_string(),
            });
        } else {
            self.events.emit(&HierarchyEvent::TabMoved {
                tab_id: tab_id.to_string(),
                from: source,
                to: target,
                index,
            });
        }
        Ok(MoveResult {
            window: target,
            index,
            closed_source,
        })
    }

    /// Move every tab of a detached window back into the main window and
    /// close it.
    pub fn reattach_window(&mut self, window: WindowId) -> Result<Vec<TabId>, WindowError> {
        if self.main.is_none() {
            return Err(WindowError::NoMainWindow);
        }
        if self.main_window_id() == Some(window) {
            return Err(WindowError::WrongKind {
                expected: WindowKind::Detached,
            });
        }
        let mut node = self
            .unregister_detached_window(window)
            .ok_or(WindowError::UnknownWindow(window))?;

        let mut moved = Vec::new();
        for entry in node.strip.drain_tabs() {
            let tab_id = entry.tab_id.clone();
            if let Some(main) = self.main.as_mut() {
                main.strip.add_tab(entry);
            }
            self.events.emit(&HierarchyEvent::TabReattached {
                tab_id: tab_id.clone(),
            });
            moved.push(tab_id);
        }
        log::info!("Reattached {} tab(s) from window {}", moved.len(), window);
        Ok(moved)
    }

    // ---------------------------------------------------------------------
    // Closing and shutdown
    // ---------------------------------------------------------------------

    /// Close entry point for any window.
    ///
    /// Closing the main window runs the full shutdown sequence. Closing a
    /// detached window outside shutdown recovers a single orphaned tab into
    /// the main window; otherwise its tabs are closed.
    pub fn request_close(
        &mut self,
        window: WindowId,
        bus: &mut DataBus,
        store: &SessionStore,
    ) -> Result<CloseOutcome, WindowError> {
        if self.main_window_id() == Some(window) {
            return Ok(CloseOutcome::Shutdown(self.initiate_shutdown(bus, store)));
        }
        if self.window(window).is_none() {
            return Err(WindowError::UnknownWindow(window));
        }

        if self
            .drag
            .active()
            .is_some_and(|op| op.source_window == window)
        {
            self.cancel_drag();
        }

        let Some(mut node) = self.unregister_detached_window(window) else {
            return Err(WindowError::UnknownWindow(window));
        };
        let mut tabs = node.strip.drain_tabs();

        if self.shutdown_in_progress {
            return Ok(CloseOutcome::Closed {
                reattached: None,
                closed_tabs: tabs.into_iter().map(|t| t.tab_id).collect(),
            });
        }

        // Exactly one tab that can still report its state is worth saving
        let recovered_name = match tabs.as_slice() {
            [only] if self.main.is_some() => only
                .content
                .try_borrow()
                .ok()
                .and_then(|content| content.state().ok())
                .map(|state| {
                    state
                        .tab_name()
                        .unwrap_or(session::DEFAULT_TAB_NAME)
                        .to_string()
                }),
            _ => None,
        };
        if let Some(name) = recovered_name
            && let Some(mut entry) = tabs.pop()
        {
            entry.title = name;
            let tab_id = entry.tab_id.clone();
            if let Some(main) = self.main.as_mut() {
                main.strip.add_tab(entry);
            }
            log::info!("Reattached orphaned tab {} to main window", tab_id);
            self.events.emit(&HierarchyEvent::TabReattached {
                tab_id: tab_id.clone(),
            });
            return Ok(CloseOutcome::Closed {
                reattached: Some(tab_id),
                closed_tabs: Vec::new(),
            });
        }

        let mut closed_tabs = Vec::new();
        for entry in tabs {
            if bus.is_registered(&entry.tab_id) {
                bus.unregister_tab(&entry.tab_id);
            }
            closed_tabs.push(entry.tab_id);
        }
        log::info!(
            "Closed window {} with {} tab(s)",
            window,
            closed_tabs.len()
        );
        Ok(CloseOutcome::Closed {
            reattached: None,
            closed_tabs,
        })
    }

    /// Run the application shutdown sequence once.
    ///
    /// Save the session, announce closing, close every detached window, shut
    /// the bus down and request quit. A failing step is recorded in the
    /// report and the sequence continues.
    pub fn initiate_shutdown(&mut self, bus: &mut DataBus, store: &SessionStore) -> ShutdownReport {
        if self.shutdown_in_progress {
            log::info!("Shutdown already in progress");
            return ShutdownReport {
                already_in_progress: true,
                ..ShutdownReport::default()
            };
        }
        self.shutdown_in_progress = true;
        debug_info!("SHUTDOWN", "Initiating application shutdown");
        self.events.emit(&HierarchyEvent::ShutdownStarted);
        self.cancel_drag();

        let mut report = ShutdownReport::default();

        let snapshot = session::capture_snapshot(self, session::SHUTDOWN_REASON);
        match store.save(&snapshot) {
            Ok(()) => {
                report.session_saved = true;
                self.events.emit(&HierarchyEvent::SessionSaved {
                    window_count: snapshot.window_count,
                });
            }
            Err(e) => {
                log::error!("Failed to save session: {:#}", e);
                report.errors.push(format!("session save failed: {e:#}"));
            }
        }

        self.events.emit(&HierarchyEvent::AllWindowsClosing);
        for node in std::mem::take(&mut self.detached) {
            debug_log!("SHUTDOWN", "Closing detached window {}", node.id());
            self.events
                .emit(&HierarchyEvent::WindowClosed { window: node.id() });
            report.windows_closed += 1;
        }

        bus.shutdown();
        report.bus_shut_down = true;

        self.quit_requested = true;
        self.events.emit(&HierarchyEvent::QuitRequested);
        debug_info!(
            "SHUTDOWN",
            "Shutdown complete ({} detached windows closed)",
            report.windows_closed
        );
        report
    }
}
