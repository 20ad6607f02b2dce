//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build catalog + resolver → Start listener
//!
//! Reload (startup.rs):
//!     Config file changed → watcher reloads → catalog/excludes swapped
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then resolver, then listener
//! - Ordered shutdown: stop accept, drain, close
//! - A failed reload never takes the service down

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run_config_reload, Services};
