//! Routing subsystem: rule matching and target resolution.
//!
//! # Data Flow
//! ```text
//! Incoming path (+ query)
//!     → resolver.rs (pipeline, deployment strategies)
//!     → site.rs (site segment) + matcher.rs (exclude, exact, patterns)
//!     → pattern.rs (compiled patterns, cached)
//!     → target.rs + placeholder.rs (target URL)
//!     → Return: ResolvedTarget or None
//!
//! Editor tooling:
//!     Rule → public_url.rs → shareable short URL / target URL / preview
//! ```
//!
//! # Design Decisions
//! - Rules are read from the store on every request
//! - Compiled regexes are cached by pattern string, never rules
//! - Deterministic: same store contents always resolve the same way
//! - First match wins (store order)

pub mod matcher;
pub mod pattern;
pub mod placeholder;
pub mod public_url;
pub mod resolver;
pub mod site;
pub mod target;

pub use matcher::{ExcludeRules, RuleMatcher};
pub use pattern::{compile, match_pattern, CacheStats, CompiledPattern, PatternCache, PatternError};
pub use placeholder::resolve_placeholders;
pub use public_url::PublicUrlService;
pub use resolver::{
    HeadlessPaths, HeadlessUrls, PathExtractor, Resolver, StandardPaths, StandardUrls,
    UrlPostprocessor,
};
pub use site::extract_site;
pub use target::{is_external_link, TargetUrlBuilder};
