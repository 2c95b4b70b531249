//! The top-level [`Config`] struct and its per-subsystem sections.
//!
//! Every field carries a serde default so a config file only needs to list
//! the values it overrides.

use crate::defaults;
use crate::error::ConfigError;
use crate::types::{LogLevel, StartupBehavior};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Data bus tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Maximum number of messages kept in the bounded history ring
    #[serde(default = "defaults::max_message_history")]
    pub max_message_history: usize,

    /// Run structural validation on every published message
    #[serde(default = "defaults::enable_validation")]
    pub enable_validation: bool,

    /// Log a one-line summary of every publish at debug level
    #[serde(default = "defaults::enable_logging")]
    pub enable_logging: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_message_history: defaults::max_message_history(),
            enable_validation: defaults::enable_validation(),
            enable_logging: defaults::enable_logging(),
        }
    }
}

/// Drag-and-drop geometry and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragConfig {
    /// Manhattan distance the pointer must travel before a press becomes a drag
    #[serde(default = "defaults::drag_threshold_px")]
    pub threshold_px: i32,

    /// Margin around the source window inside which a drag stays a reorder
    #[serde(default = "defaults::bounds_margin_px")]
    pub bounds_margin_px: i32,

    /// Width of a single tab in the tab strip
    #[serde(default = "defaults::tab_width")]
    pub tab_width: u32,

    /// Height of the tab strip below the title bar
    #[serde(default = "defaults::tab_strip_height")]
    pub tab_strip_height: u32,

    /// Height of the window title bar (attach-window drop zone)
    #[serde(default = "defaults::title_bar_height")]
    pub title_bar_height: u32,

    /// Offset of the floating preview from the pointer, on both axes
    #[serde(default = "defaults::preview_offset")]
    pub preview_offset: i32,

    /// When false every drag is treated as a reorder within its window
    #[serde(default = "defaults::tab_detach_enabled")]
    pub tab_detach_enabled: bool,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            threshold_px: defaults::drag_threshold_px(),
            bounds_margin_px: defaults::bounds_margin_px(),
            tab_width: defaults::tab_width(),
            tab_strip_height: defaults::tab_strip_height(),
            title_bar_height: defaults::title_bar_height(),
            preview_offset: defaults::preview_offset(),
            tab_detach_enabled: defaults::tab_detach_enabled(),
        }
    }
}

/// Window sizing, titles and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Application title; detached windows are titled "{app_title} - {tab}"
    #[serde(default = "defaults::app_title")]
    pub app_title: String,

    #[serde(default = "defaults::main_width")]
    pub main_width: u32,

    #[serde(default = "defaults::main_height")]
    pub main_height: u32,

    /// Size of newly detached windows
    #[serde(default = "defaults::default_width")]
    pub default_width: u32,

    #[serde(default = "defaults::default_height")]
    pub default_height: u32,

    /// Per-window cascade step for new detached windows
    #[serde(default = "defaults::cascade_offset")]
    pub cascade_offset: i32,

    /// Number of cascade steps before wrapping back to the origin
    #[serde(default = "defaults::cascade_cycle")]
    pub cascade_cycle: u32,

    /// Optional cap on simultaneously open detached windows
    #[serde(default)]
    pub max_detached_windows: Option<usize>,

    /// Logical screen size used for clamping window placement
    #[serde(default = "defaults::screen_width")]
    pub screen_width: u32,

    #[serde(default = "defaults::screen_height")]
    pub screen_height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            app_title: defaults::app_title(),
            main_width: defaults::main_width(),
            main_height: defaults::main_height(),
            default_width: defaults::default_width(),
            default_height: defaults::default_height(),
            cascade_offset: defaults::cascade_offset(),
            cascade_cycle: defaults::cascade_cycle(),
            max_detached_windows: None,
            screen_width: defaults::screen_width(),
            screen_height: defaults::screen_height(),
        }
    }
}

/// Session persistence settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub startup_behavior: StartupBehavior,

    /// Override for the session file location (defaults to the config dir)
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub drag: DragConfig,

    #[serde(default)]
    pub windows: WindowConfig,

    #[serde(default)]
    pub session: SessionConfig,

    /// Level for the debug log file
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Config {
    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bus.max_message_history == 0 {
            return Err(ConfigError::Validation(
                "bus.max_message_history must be at least 1".to_string(),
            ));
        }
        if self.drag.tab_width == 0 {
            return Err(ConfigError::Validation(
                "drag.tab_width must be greater than 0".to_string(),
            ));
        }
        if self.drag.threshold_px < 0 {
            return Err(ConfigError::Validation(
                "drag.threshold_px must not be negative".to_string(),
            ));
        }
        if self.windows.cascade_cycle == 0 {
            return Err(ConfigError::Validation(
                "windows.cascade_cycle must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
