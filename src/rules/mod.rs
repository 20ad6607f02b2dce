//! Rule model and collaborator interfaces.
//!
//! # Data Flow
//! ```text
//! RedirectConfig (rules, sites, content)
//!     → catalog.rs (immutable CatalogSnapshot behind ArcSwap)
//!     → store.rs traits (RuleStore, SiteRegistry, ContentResolver)
//!     → consumed per request by the routing engine
//!
//! On reload:
//!     new RedirectConfig → Catalog::replace → next request sees new rules
//! ```
//!
//! # Design Decisions
//! - Rules are read-only here; authoring happens elsewhere
//! - Every request reads the current snapshot (no rule caching in the engine)
//! - Collaborators are traits so other storage backends can be plugged in

pub mod catalog;
pub mod store;
pub mod types;

pub use catalog::{Catalog, CatalogSnapshot};
pub use store::{ContentResolver, RuleStore, SiteRegistry};
pub use types::{
    ActionType, ContentLink, LookupError, LookupResult, MatchOutcome, ParamSet, ResolvedTarget,
    Rule, SiteScope, UriMapping, DEFAULT_SITE, FORWARD_PREFIX, PERMANENT_PREFIX, REDIRECT_PREFIX,
    WEBSITE_REPOSITORY,
};
