//! Default values for configuration fields.
//!
//! Each function backs a `#[serde(default = "...")]` attribute so that a
//! partially written config file still deserializes.

// ---------------------------------------------------------------------------
// Data bus
// ---------------------------------------------------------------------------

pub fn max_message_history() -> usize {
    100
}

pub fn enable_validation() -> bool {
    true
}

pub fn enable_logging() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Drag and drop
// ---------------------------------------------------------------------------

pub fn drag_threshold_px() -> i32 {
    10 // Manhattan distance before a press becomes a drag
}

pub fn bounds_margin_px() -> i32 {
    20
}

pub fn tab_width() -> u32 {
    120
}

pub fn tab_strip_height() -> u32 {
    30
}

pub fn title_bar_height() -> u32 {
    28
}

pub fn preview_offset() -> i32 {
    10
}

pub fn tab_detach_enabled() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

pub fn app_title() -> String {
    "Workbench".to_string()
}

pub fn main_width() -> u32 {
    1200
}

pub fn main_height() -> u32 {
    800
}

pub fn default_width() -> u32 {
    800
}

pub fn default_height() -> u32 {
    600
}

pub fn cascade_offset() -> i32 {
    30
}

pub fn cascade_cycle() -> u32 {
    10
}

pub fn screen_width() -> u32 {
    1920
}

pub fn screen_height() -> u32 {
    1080
}
