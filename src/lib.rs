//! Redirect resolver library.
//!
//! Resolves request paths to redirect, permanent-redirect or forward targets
//! from a set of stored URL rules, optionally scoped by site.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod rules;

pub use config::schema::RedirectConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::Resolver;
pub use rules::{ActionType, Catalog, ResolvedTarget, Rule};
