//! The application context: one bus, one window hierarchy, one tab factory.
//!
//! Constructed once at startup and passed by reference to whatever drives
//! it (an event loop, a menu, a test).

use crate::bus::{DataBus, Payload};
use crate::config::{Config, StartupBehavior};
use crate::drag::{DragOutcome, DragState};
use crate::session::restore::highest_tab_number;
use crate::session::{self, LoadedSession, RestoreReport, SessionStore};
use crate::tab::{TabFactory, TabId, connect_to_bus};
use crate::window::{
    CloseOutcome, Geometry, Point, ShutdownReport, WindowError, WindowHierarchy, WindowId,
    WindowNode,
};
use anyhow::Context;

pub struct Workbench {
    config: Config,
    bus: DataBus,
    hierarchy: WindowHierarchy,
    factory: Box<dyn TabFactory>,
    store: SessionStore,
    main_window: WindowId,
    /// Suffix of the last generated `"{type}_{n}"` tab id
    tab_counter: u32,
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("hierarchy", &self.hierarchy)
            .field("bus", &self.bus)
            .field("store", &self.store)
            .field("tab_counter", &self.tab_counter)
            .finish()
    }
}

impl Workbench {
    /// Create the bus and the main window (holding only the Home tab).
    ///
    /// The session file comes from `config.session.session_file`, or the
    /// default location.
    pub fn new(config: Config, factory: Box<dyn TabFactory>) -> Result<Self, WindowError> {
        let store = config
            .session
            .session_file
            .clone()
            .map_or_else(SessionStore::default, SessionStore::new);
        Self::with_store(config, factory, store)
    }

    pub fn with_store(
        config: Config,
        factory: Box<dyn TabFactory>,
        store: SessionStore,
    ) -> Result<Self, WindowError> {
        let bus = DataBus::new(&config.bus);
        let mut hierarchy = WindowHierarchy::new(&config.windows, &config.drag);
        let geometry = Geometry::new(
            0,
            0,
            config.windows.main_width,
            config.windows.main_height,
        );
        let main_window =
            hierarchy.register_main_window(WindowNode::main(&config.windows.app_title, geometry))?;

        Ok(Self {
            config,
            bus,
            hierarchy,
            factory,
            store,
            main_window,
            tab_counter: 0,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bus(&self) -> &DataBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut DataBus {
        &mut self.bus
    }

    pub fn hierarchy(&self) -> &WindowHierarchy {
        &self.hierarchy
    }

    pub fn hierarchy_mut(&mut self) -> &mut WindowHierarchy {
        &mut self.hierarchy
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn main_window_id(&self) -> WindowId {
        self.main_window
    }

    // ---------------------------------------------------------------------
    // Session
    // ---------------------------------------------------------------------

    /// Apply the configured startup behavior. Load failures are logged and
    /// leave the Home tab alone.
    pub fn startup(&mut self) -> Option<RestoreReport> {
        match self.config.session.startup_behavior {
            StartupBehavior::HomeOnly => {
                log::info!("Startup: Home tab only");
                None
            }
            StartupBehavior::RestoreSession => match self.restore_session() {
                Ok(report) => report,
                Err(e) => {
                    log::error!("Failed to restore session: {:#}", e);
                    None
                }
            },
        }
    }

    /// Load the session file and replay it. `Ok(None)` when there is no
    /// session to restore.
    pub fn restore_session(&mut self) -> anyhow::Result<Option<RestoreReport>> {
        let Some(loaded) = self.store.load().context("Failed to load session")? else {
            log::info!("No saved session, starting with Home tab only");
            return Ok(None);
        };
        Ok(Some(self.restore_loaded(loaded)))
    }

    /// Replay an already loaded session.
    pub fn restore_loaded(&mut self, loaded: LoadedSession) -> RestoreReport {
        let report = session::restore_session(
            &mut self.hierarchy,
            &mut self.bus,
            self.factory.as_ref(),
            loaded,
        );
        let restored = highest_tab_number(report.restored_tabs.iter().map(String::as_str));
        self.tab_counter = self.tab_counter.max(restored);
        report
    }

    pub fn save_session(&self) -> anyhow::Result<()> {
        let snapshot = session::capture_snapshot(&self.hierarchy, "manual_save");
        self.store.save(&snapshot)
    }

    pub fn clear_session(&self) -> anyhow::Result<bool> {
        self.store.clear()
    }

    // ---------------------------------------------------------------------
    // Tabs
    // ---------------------------------------------------------------------

    /// Create a tab of `tab_type` in the main window and join it to the bus.
    pub fn open_tab(&mut self, tab_type: &str) -> anyhow::Result<TabId> {
        let tab_id = format!("{}_{}", tab_type, self.tab_counter + 1);
        let tab = self
            .factory
            .create(tab_type, &tab_id)
            .with_context(|| format!("Failed to create {} tab", tab_type))?;
        let created_id = tab.borrow().tab_id().to_string();
        anyhow::ensure!(
            created_id == tab_id,
            "Factory created tab {} when asked for {}",
            created_id,
            tab_id
        );
        self.tab_counter += 1;

        self.hierarchy
            .add_tab(self.main_window, tab.clone())
            .with_context(|| format!("Failed to add tab {}", tab_id))?;
        if !connect_to_bus(&mut self.bus, &tab) {
            log::warn!("Tab {} could not join the data bus", tab_id);
        }
        log::info!("Opened tab {}", tab_id);
        Ok(tab_id)
    }

    pub fn close_tab(&mut self, tab_id: &str) -> Result<(), WindowError> {
        self.hierarchy.close_tab(tab_id, &mut self.bus)
    }

    pub fn rename_tab(&mut self, tab_id: &str, name: &str) -> Result<(), WindowError> {
        self.hierarchy.rename_tab(tab_id, name)
    }

    /// Detach a tab into a new window placed near `position`.
    pub fn detach_tab(&mut self, tab_id: &str, position: Point) -> Result<WindowId, WindowError> {
        let (window, index) = self
            .hierarchy
            .find_tab(tab_id)
            .ok_or_else(|| WindowError::UnknownTab(tab_id.to_string()))?;
        self.hierarchy.detach_tab(window, index, position)
    }

    /// The tab's current exportable data, if it exchanges data at all.
    pub fn export_from(&self, tab_id: &str) -> Option<(String, Payload)> {
        let tab = self.hierarchy.tab_content(tab_id)?;
        let mut content = tab.try_borrow_mut().ok()?;
        content.data_exchange()?.exportable_data()
    }

    /// Publish a tab's exportable data on the bus.
    pub fn publish_from(&mut self, tab_id: &str) -> bool {
        let Some((data_type, payload)) = self.export_from(tab_id) else {
            log::warn!("Tab {} has no exportable data", tab_id);
            return false;
        };
        self.bus.publish(tab_id, &data_type, payload, None)
    }

    // ---------------------------------------------------------------------
    // Windows
    // ---------------------------------------------------------------------

    pub fn request_close(&mut self, window: WindowId) -> Result<CloseOutcome, WindowError> {
        self.hierarchy
            .request_close(window, &mut self.bus, &self.store)
    }

    /// Close the main window: save, close everything, stop the bus.
    pub fn shutdown(&mut self) -> ShutdownReport {
        self.hierarchy.initiate_shutdown(&mut self.bus, &self.store)
    }

    pub fn pointer_pressed(&mut self, window: WindowId, position: Point) -> Result<bool, WindowError> {
        self.hierarchy.pointer_pressed(window, position)
    }

    pub fn pointer_moved(&mut self, position: Point) -> DragState {
        self.hierarchy.pointer_moved(position)
    }

    pub fn pointer_released(&mut self, position: Point) -> DragOutcome {
        self.hierarchy.pointer_released(position)
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.hierarchy.cancel_drag()
    }
}
