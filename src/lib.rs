// Library exports for testing and embedding in a UI shell
//
// The core is single-threaded: tab contents are shared as `Rc<RefCell<..>>`
// and the only lock in the crate is the `parking_lot::Mutex` guarding the
// process-wide debug log file.

/// Application version (root crate version, for use by sub-crates).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[macro_use]
pub mod debug;

pub mod bus;
pub mod cli;
pub mod config {
    //! Configuration re-exports from the workbench-config crate.
    pub use workbench_config::*;
}
pub mod drag;
pub mod events;
pub mod session;
pub mod tab;
pub mod window;
pub mod workbench;

pub use bus::{BusEvent, BusStatistics, DataBus, Message, Payload};
pub use tab::{SupportsDataExchange, TabContent, TabFactory, TabId, TabRef, TabState};
pub use window::{Geometry, Point, WindowHierarchy, WindowId, WindowKind, WindowNode};
pub use workbench::Workbench;
