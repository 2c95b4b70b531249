//! Command-line interface for the workbench.
//!
//! This module handles CLI argument parsing and the `session` subcommands.

use crate::config::Config;
use crate::session::{LoadedSession, SessionSnapshot, SessionStore, WindowState};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// workbench - Multi-window tab workbench core
#[derive(Parser)]
#[command(name = "workbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (default: ~/.config/workbench/config.yaml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Session file to read and write
    #[arg(long, value_name = "PATH", global = true)]
    pub session_file: Option<PathBuf>,

    /// Log level (overrides RUST_LOG and the config file)
    #[arg(long, value_name = "LEVEL", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Start with only the Home tab, ignoring any saved session
    #[arg(long)]
    pub no_restore: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect or remove the saved session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// Print the saved window/tab tree
    Show,
    /// Delete the saved session file
    Clear,
}

/// Log levels accepted on the command line
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for log::LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Runtime options passed from CLI to the application
#[derive(Clone, Debug, Default)]
pub struct RuntimeOptions {
    pub config_path: Option<PathBuf>,
    pub session_file: Option<PathBuf>,
    /// Log level from `--log-level`, highest precedence
    pub log_level: Option<log::LevelFilter>,
    pub no_restore: bool,
}

impl RuntimeOptions {
    /// Load the config (explicit path or default location) and apply the
    /// command-line overrides. A broken config file falls back to defaults.
    pub fn load_config(&self) -> Config {
        let loaded = match &self.config_path {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        };
        let mut config = loaded.unwrap_or_else(|e| {
            log::error!("Failed to load config: {}; using defaults", e);
            Config::default()
        });
        self.apply_to(&mut config);
        config
    }

    pub fn apply_to(&self, config: &mut Config) {
        if let Some(path) = &self.session_file {
            config.session.session_file = Some(path.clone());
        }
        if self.no_restore {
            config.session.startup_behavior = crate::config::StartupBehavior::HomeOnly;
        }
    }
}

/// Result of CLI processing
pub enum CliResult {
    /// Continue with normal application startup
    Continue(RuntimeOptions),
    /// Exit with the given code (subcommand completed)
    Exit(i32),
}

/// Process CLI arguments and handle subcommands
pub fn process_cli() -> CliResult {
    process(Cli::parse())
}

fn process(cli: Cli) -> CliResult {
    let options = RuntimeOptions {
        config_path: cli.config,
        session_file: cli.session_file,
        log_level: cli.log_level.map(Into::into),
        no_restore: cli.no_restore,
    };

    match cli.command {
        Some(Commands::Session { action }) => {
            let config = options.load_config();
            let store = config
                .session
                .session_file
                .clone()
                .map_or_else(SessionStore::default, SessionStore::new);
            let result = match action {
                SessionAction::Show => show_session(&store),
                SessionAction::Clear => clear_session(&store),
            };
            match result {
                Ok(()) => CliResult::Exit(0),
                Err(e) => {
                    eprintln!("workbench: error: {e:#}");
                    CliResult::Exit(1)
                }
            }
        }
        None => CliResult::Continue(options),
    }
}

fn show_session(store: &SessionStore) -> anyhow::Result<()> {
    println!("Session file: {}", store.path().display());
    match store.load()? {
        None => println!("No saved session."),
        Some(LoadedSession::Current(snapshot)) => print!("{}", describe_snapshot(&snapshot)),
        Some(LoadedSession::Legacy(tabs)) => {
            println!("Legacy session with {} tab(s):", tabs.len());
            for tab in &tabs {
                println!(
                    "  - {} ({})",
                    tab.tab_id().unwrap_or("?"),
                    tab.tab_type().unwrap_or("?")
                );
            }
        }
    }
    Ok(())
}

fn clear_session(store: &SessionStore) -> anyhow::Result<()> {
    if store.clear()? {
        println!("Removed {}", store.path().display());
    } else {
        println!("No saved session at {}", store.path().display());
    }
    Ok(())
}

/// Human-readable window/tab tree of a snapshot.
pub fn describe_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut out = format!(
        "Session v{} saved {} ({} windows, {} tabs)\n",
        snapshot.version,
        snapshot.timestamp,
        snapshot.window_count,
        snapshot.tab_count()
    );
    describe_window(&mut out, "Main window", &snapshot.main_window);
    for (i, window) in snapshot.detached_windows.iter().enumerate() {
        let label = if window.title.is_empty() {
            format!("Detached window {}", i + 1)
        } else {
            format!("Detached window {}: {}", i + 1, window.title)
        };
        describe_window(&mut out, &label, window);
    }
    out
}

fn describe_window(out: &mut String, label: &str, window: &WindowState) {
    match window.geometry {
        Some(g) => out.push_str(&format!(
            "{} at ({}, {}) {}x{}\n",
            label, g.x, g.y, g.width, g.height
        )),
        None => out.push_str(&format!("{}\n", label)),
    }
    for tab in &window.tabs {
        out.push_str(&format!(
            "  - {} [{}] {}\n",
            tab.tab_id().unwrap_or("?"),
            tab.tab_type().unwrap_or("?"),
            tab.tab_name().unwrap_or("")
        ));
    }
}
