//! The non-closable Home tab.

use super::{TabContent, TabState};

pub const HOME_TAB_ID: &str = "home";
pub const HOME_TAB_TYPE: &str = "home";

/// Landing tab pinned to index 0 of the main window.
#[derive(Debug, Clone)]
pub struct HomeTab {
    name: String,
}

impl Default for HomeTab {
    fn default() -> Self {
        Self {
            name: "Home".to_string(),
        }
    }
}

impl TabContent for HomeTab {
    fn tab_id(&self) -> &str {
        HOME_TAB_ID
    }

    fn tab_type(&self) -> &str {
        HOME_TAB_TYPE
    }

    fn state(&self) -> anyhow::Result<TabState> {
        Ok(TabState::new(HOME_TAB_TYPE, HOME_TAB_ID).with("tab_name", self.name.as_str()))
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn set_display_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn is_home(&self) -> bool {
        true
    }
}
