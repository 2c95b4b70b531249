//! Shared integration test helpers for the workbench.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{TestFactory, test_workbench};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a subset
//! of helpers are used per file.

#![allow(dead_code)]

use serde_json::{Map, Value, json};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tempfile::TempDir;
use workbench::bus::{Message, Payload, SerializedTable};
use workbench::config::Config;
use workbench::session::SessionStore;
use workbench::tab::{SupportsDataExchange, TabContent, TabFactory, TabRef, TabState};
use workbench::Workbench;

/// Messages received by one tab, shared with the test.
pub type Inbox = Rc<RefCell<Vec<Message>>>;

/// Inboxes of every tab a [`TestFactory`] built, by tab id.
#[derive(Clone, Default)]
pub struct Inboxes(Rc<RefCell<HashMap<String, Inbox>>>);

impl Inboxes {
    pub fn messages(&self, tab_id: &str) -> Vec<Message> {
        self.0
            .borrow()
            .get(tab_id)
            .map(|inbox| inbox.borrow().clone())
            .unwrap_or_default()
    }

    pub fn count(&self, tab_id: &str) -> usize {
        self.messages(tab_id).len()
    }

    fn register(&self, tab_id: &str) -> Inbox {
        let inbox = Inbox::default();
        self.0
            .borrow_mut()
            .insert(tab_id.to_string(), Rc::clone(&inbox));
        inbox
    }
}

/// Tab content used across the integration tests.
///
/// `spreadsheet` tabs export a small table as `dataframe`; `fitting` and
/// `plotting` tabs consume `dataframe`; `notes` tabs do not exchange data;
/// `broken` tabs cannot report their state.
pub struct TestTab {
    tab_id: String,
    tab_type: String,
    name: String,
    supported: Vec<String>,
    inbox: Inbox,
    extra: Map<String, Value>,
}

impl TestTab {
    fn exchanges_data(&self) -> bool {
        !self.supported.is_empty()
    }
}

impl TabContent for TestTab {
    fn tab_id(&self) -> &str {
        &self.tab_id
    }

    fn tab_type(&self) -> &str {
        &self.tab_type
    }

    fn state(&self) -> anyhow::Result<TabState> {
        if self.tab_type == "broken" {
            anyhow::bail!("state unavailable");
        }
        let mut state = TabState::new(&self.tab_type, &self.tab_id).with("tab_name", self.name.as_str());
        for (key, value) in &self.extra {
            state.insert(key, value.clone());
        }
        Ok(state)
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn set_display_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn data_exchange(&mut self) -> Option<&mut dyn SupportsDataExchange> {
        if self.exchanges_data() {
            Some(self)
        } else {
            None
        }
    }
}

impl SupportsDataExchange for TestTab {
    fn on_data_received(&mut self, message: &Message) -> anyhow::Result<()> {
        self.inbox.borrow_mut().push(message.clone());
        Ok(())
    }

    fn supported_data_types(&self) -> Vec<String> {
        self.supported.clone()
    }

    fn exportable_data(&self) -> Option<(String, Payload)> {
        (self.tab_type == "spreadsheet").then(|| ("dataframe".to_string(), sample_table()))
    }

    fn default_subscriptions(&self) -> Vec<String> {
        if self.tab_type == "spreadsheet" {
            Vec::new()
        } else {
            self.supported.clone()
        }
    }
}

/// Builds [`TestTab`]s; types listed in `failing_types` fail to restore.
#[derive(Clone, Default)]
pub struct TestFactory {
    pub inboxes: Inboxes,
    pub failing_types: Vec<String>,
}

impl TestFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(types: &[&str]) -> Self {
        Self {
            failing_types: types.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    fn build(&self, tab_type: &str, tab_id: &str, name: &str, extra: Map<String, Value>) -> TabRef {
        let supported = match tab_type {
            "spreadsheet" | "fitting" | "plotting" => vec!["dataframe".to_string()],
            _ => Vec::new(),
        };
        Rc::new(RefCell::new(TestTab {
            tab_id: tab_id.to_string(),
            tab_type: tab_type.to_string(),
            name: name.to_string(),
            supported,
            inbox: self.inboxes.register(tab_id),
            extra,
        }))
    }
}

impl TabFactory for TestFactory {
    fn create(&self, tab_type: &str, tab_id: &str) -> anyhow::Result<TabRef> {
        match tab_type {
            "unknown" => anyhow::bail!("unknown tab type"),
            // Ignores the id it was asked for
            "mislabelled" => Ok(self.build(tab_type, "mislabelled", "mislabelled", Map::new())),
            _ => Ok(self.build(tab_type, tab_id, tab_id, Map::new())),
        }
    }

    fn restore(&self, state: &TabState) -> anyhow::Result<TabRef> {
        let tab_type = state
            .tab_type()
            .ok_or_else(|| anyhow::anyhow!("missing type"))?;
        if self.failing_types.iter().any(|t| t == tab_type) {
            anyhow::bail!("cannot restore {tab_type}");
        }
        let tab_id = state
            .tab_id()
            .ok_or_else(|| anyhow::anyhow!("missing tab_id"))?;
        let mut extra = state.as_map().clone();
        for key in ["type", "tab_id", "tab_name", "detached"] {
            extra.remove(key);
        }
        let name = state.tab_name().unwrap_or(tab_id);
        Ok(self.build(tab_type, tab_id, name, extra))
    }
}

/// Two-column numeric table.
pub fn sample_table() -> Payload {
    Payload::Table(SerializedTable::from_rows(
        vec!["x".to_string(), "y".to_string()],
        vec![vec![json!(1.0), json!(2.0)], vec![json!(2.0), json!(4.1)]],
    ))
}

/// Workbench with a session file inside a fresh temp dir.
///
/// The `TempDir` must be kept alive for the duration of the test.
pub fn test_workbench(factory: TestFactory) -> (Workbench, TempDir) {
    test_workbench_with(Config::default(), factory)
}

pub fn test_workbench_with(config: Config, factory: TestFactory) -> (Workbench, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = SessionStore::new(temp_dir.path().join("complete_session.json"));
    let bench = Workbench::with_store(config, Box::new(factory), store)
        .expect("Failed to create workbench");
    (bench, temp_dir)
}

/// Ids of the tabs in the main window, in strip order.
pub fn main_tab_ids(bench: &Workbench) -> Vec<String> {
    bench
        .hierarchy()
        .main_window()
        .map(|w| w.strip().tab_ids())
        .unwrap_or_default()
}
