use anyhow::Result;
use workbench::cli;
use workbench::tab::{TabFactory, TabRef, TabState};
use workbench::{Workbench, debug};

/// Restores every tab as an inert placeholder carrying its saved state, so a
/// headless run round-trips the session file unchanged.
struct PlaceholderFactory;

struct Placeholder {
    state: TabState,
    tab_id: String,
    tab_type: String,
    name: String,
}

impl workbench::TabContent for Placeholder {
    fn tab_id(&self) -> &str {
        &self.tab_id
    }

    fn tab_type(&self) -> &str {
        &self.tab_type
    }

    fn state(&self) -> Result<TabState> {
        Ok(self.state.clone().with("tab_name", self.name.as_str()))
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn set_display_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
}

impl TabFactory for PlaceholderFactory {
    fn create(&self, tab_type: &str, tab_id: &str) -> Result<TabRef> {
        self.restore(&TabState::new(tab_type, tab_id))
    }

    fn restore(&self, state: &TabState) -> Result<TabRef> {
        let tab_type = state
            .tab_type()
            .ok_or_else(|| anyhow::anyhow!("tab state has no type"))?;
        let tab_id = state
            .tab_id()
            .ok_or_else(|| anyhow::anyhow!("tab state has no tab_id"))?;
        // Placement is recorded by the window that holds the tab
        let mut saved = state.as_map().clone();
        saved.remove("detached");
        Ok(std::rc::Rc::new(std::cell::RefCell::new(Placeholder {
            state: TabState::from_map(saved),
            tab_id: tab_id.to_string(),
            tab_type: tab_type.to_string(),
            name: state.tab_name().unwrap_or(tab_id).to_string(),
        })))
    }
}

fn main() -> Result<()> {
    // Process CLI arguments first (before logging init for cleaner output)
    let options = match cli::process_cli() {
        cli::CliResult::Exit(code) => {
            if code == 0 {
                return Ok(());
            }
            std::process::exit(code);
        }
        cli::CliResult::Continue(options) => options,
    };
    // Routes all log::info!() etc. to the debug log file; mirrors to stderr
    // when RUST_LOG is set. CLI --log-level wins over RUST_LOG, which wins
    // over the config file.
    debug::init_log_bridge(options.log_level);

    let config = options.load_config();
    if options.log_level.is_none() && std::env::var_os("RUST_LOG").is_none() {
        debug::set_log_level(config.log_level.to_level_filter());
    }
    log::info!("Starting workbench {}", workbench::VERSION);

    let mut bench = Workbench::new(config, Box::new(PlaceholderFactory))?;
    if let Some(report) = bench.startup() {
        for failure in &report.failures {
            log::warn!("Restore: {}", failure);
        }
    }

    let hierarchy = bench.hierarchy();
    log::info!(
        "Workbench ready: {} window(s), {} tab(s), {} on the data bus",
        hierarchy.window_count(),
        hierarchy.all_tab_ids().len(),
        bench.bus().statistics().total_registered_tabs
    );

    let report = bench.shutdown();
    for error in &report.errors {
        eprintln!("workbench: error: {error}");
    }
    log::info!(
        "Shutdown complete (session saved: {}, windows closed: {})",
        report.session_saved,
        report.windows_closed
    );
    Ok(())
}
