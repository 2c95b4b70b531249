//! Configuration system for the workbench core.
//!
//! This crate provides configuration loading, saving, and default values
//! for the data bus, the drag-and-drop state machine, window placement and
//! session persistence. It includes:
//!
//! - [`Config`] and its per-subsystem sections
//! - Default values (`defaults`)
//! - YAML persistence with atomic writes
//! - Typed [`ConfigError`] values for callers that want to match on failures

pub mod config;
pub mod defaults;
pub mod error;
mod persistence;
mod types;

pub use config::{BusConfig, Config, DragConfig, SessionConfig, WindowConfig};
pub use error::ConfigError;
pub use types::{LogLevel, StartupBehavior};
