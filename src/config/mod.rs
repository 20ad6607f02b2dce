//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, pattern warnings)
//!     → RedirectConfig (validated, immutable)
//!     → rule catalog + resolver settings
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → catalog snapshot and exclude list swapped atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A failed reload keeps the running configuration

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ContentConfig, ListenerConfig, LogFormat, ObservabilityConfig, PublicUrlConfig,
    RedirectConfig, ResolverConfig, ResolverMode, SiteConfig, TimeoutConfig, UpstreamConfig,
};
pub use validation::{pattern_warnings, validate_config, PatternWarning, ValidationError};
pub use watcher::ConfigWatcher;
