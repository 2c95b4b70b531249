//! Rebuild windows and tabs from a loaded session

use super::storage::LoadedSession;
use super::{SessionError, SessionSnapshot, WindowState};
use crate::bus::DataBus;
use crate::tab::{TabFactory, TabId, TabRef, TabState, connect_to_bus};
use crate::window::placement::{restore_geometry, screen_bounds, smart_position};
use crate::window::{WindowError, WindowHierarchy, WindowId, WindowNode};

/// What a restore produced. Failures are per tab or per window; everything
/// else was restored.
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// The file was read with the legacy loader
    pub legacy: bool,
    pub restored_tabs: Vec<TabId>,
    pub restored_windows: Vec<WindowId>,
    pub failures: Vec<SessionError>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Replay `session` into `hierarchy`, registering each restored tab on the
/// bus.
///
/// Main-window tabs come first, then each detached window. The Home tab is
/// never recreated: it already sits at index 0 of the main window.
pub fn restore_session(
    hierarchy: &mut WindowHierarchy,
    bus: &mut DataBus,
    factory: &dyn TabFactory,
    session: LoadedSession,
) -> RestoreReport {
    let mut report = RestoreReport::default();
    let Some(main) = hierarchy.main_window_id() else {
        report.failures.push(WindowError::NoMainWindow.into());
        return report;
    };

    match session {
        LoadedSession::Current(snapshot) => {
            restore_snapshot(hierarchy, bus, factory, main, snapshot, &mut report);
        }
        LoadedSession::Legacy(tabs) => {
            log::info!("Restoring legacy session ({} tabs)", tabs.len());
            report.legacy = true;
            restore_into(hierarchy, bus, factory, main, &tabs, &mut report);
        }
    }

    log::info!(
        "Session restored: {} tabs, {} detached windows, {} failures",
        report.restored_tabs.len(),
        report.restored_windows.len(),
        report.failures.len()
    );
    report
}

fn restore_snapshot(
    hierarchy: &mut WindowHierarchy,
    bus: &mut DataBus,
    factory: &dyn TabFactory,
    main: WindowId,
    snapshot: SessionSnapshot,
    report: &mut RestoreReport,
) {
    restore_into(hierarchy, bus, factory, main, &snapshot.main_window.tabs, report);

    for (cascade_index, window) in snapshot.detached_windows.iter().enumerate() {
        let result = restore_window(
            hierarchy,
            bus,
            factory,
            main,
            window,
            cascade_index as u32,
            report,
        );
        if let Err(e) = result {
            log::error!("Failed to restore detached window: {}", e);
            report.failures.push(e);
        }
    }
}

fn restore_window(
    hierarchy: &mut WindowHierarchy,
    bus: &mut DataBus,
    factory: &dyn TabFactory,
    main: WindowId,
    state: &WindowState,
    cascade_index: u32,
    report: &mut RestoreReport,
) -> Result<(), SessionError> {
    let mut tabs: Vec<TabRef> = Vec::new();
    for tab_state in state.tabs.iter().filter(|t| !t.is_home()) {
        match restore_tab(hierarchy, factory, tab_state) {
            Ok(tab) => tabs.push(tab),
            Err(e) => {
                log::error!("{}", e);
                report.failures.push(e);
            }
        }
    }
    if tabs.is_empty() {
        log::warn!("Skipping detached window {:?}: no restorable tabs", state.title);
        return Ok(());
    }

    let config = hierarchy.window_config();
    let geometry = match state.geometry {
        Some(saved) => restore_geometry(saved, cascade_index, config),
        None => smart_position(screen_bounds(config).origin(), cascade_index, config),
    };
    let title = if state.title.is_empty() {
        let first = tabs[0].borrow().display_name();
        format!("{} - {}", hierarchy.window_config().app_title, first)
    } else {
        state.title.clone()
    };

    // A window that cannot be created hands its tabs to the main window
    let node = WindowNode::detached(&title, geometry);
    let (target, result) = match hierarchy.register_detached_window(node) {
        Ok(id) => {
            report.restored_windows.push(id);
            (id, Ok(()))
        }
        Err(e) => (main, Err(SessionError::from(e))),
    };
    for tab in tabs {
        attach(hierarchy, bus, target, tab, report);
    }
    result
}

fn restore_into(
    hierarchy: &mut WindowHierarchy,
    bus: &mut DataBus,
    factory: &dyn TabFactory,
    window: WindowId,
    states: &[TabState],
    report: &mut RestoreReport,
) {
    for state in states.iter().filter(|t| !t.is_home()) {
        match restore_tab(hierarchy, factory, state) {
            Ok(tab) => attach(hierarchy, bus, window, tab, report),
            Err(e) => {
                log::error!("{}", e);
                report.failures.push(e);
            }
        }
    }
}

fn restore_tab(
    hierarchy: &WindowHierarchy,
    factory: &dyn TabFactory,
    state: &TabState,
) -> Result<TabRef, SessionError> {
    state.tab_type().ok_or(SessionError::MissingField("type"))?;
    let tab_id = state
        .tab_id()
        .ok_or(SessionError::MissingField("tab_id"))?;
    if hierarchy.find_tab(tab_id).is_some() {
        return Err(SessionError::DuplicateTab(tab_id.to_string()));
    }

    let tab = factory
        .restore(state)
        .map_err(|source| SessionError::Restore {
            tab_id: tab_id.to_string(),
            source,
        })?;
    if let Some(name) = state.tab_name() {
        tab.borrow_mut().set_display_name(name);
    }
    Ok(tab)
}

fn attach(
    hierarchy: &mut WindowHierarchy,
    bus: &mut DataBus,
    window: WindowId,
    tab: TabRef,
    report: &mut RestoreReport,
) {
    let tab_id = tab.borrow().tab_id().to_string();
    match hierarchy.add_tab(window, tab.clone()) {
        Ok(_) => {
            if !connect_to_bus(bus, &tab) {
                log::warn!("Restored tab {} could not join the data bus", tab_id);
            }
            report.restored_tabs.push(tab_id);
        }
        Err(e) => {
            log::error!("Failed to place restored tab {}: {}", tab_id, e);
            report.failures.push(e.into());
        }
    }
}

/// Highest `N` among ids shaped `"{type}_{N}"`, so new tab ids never collide
/// with restored ones.
pub fn highest_tab_number<'a>(ids: impl IntoIterator<Item = &'a str>) -> u32 {
    ids.into_iter()
        .filter_map(|id| id.rsplit_once('_'))
        .filter_map(|(_, n)| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}
