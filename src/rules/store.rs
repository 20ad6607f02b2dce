//! Collaborator interfaces consumed by the routing engine.

use std::sync::Arc;

use crate::rules::types::{ContentLink, LookupResult, Rule, SiteScope, UriMapping};

/// Query interface over stored rules.
pub trait RuleStore: Send + Sync {
    /// First non-pattern rule whose source equals `path` in `site`.
    fn find_exact(&self, path: &str, site: &SiteScope) -> LookupResult<Option<Arc<Rule>>>;

    /// All pattern rules visible in `site`, in store order.
    fn find_pattern_rules(&self, site: &SiteScope) -> LookupResult<Vec<Arc<Rule>>>;
}

/// Site (tenant) registry.
pub trait SiteRegistry: Send + Sync {
    /// Whether `name` is a registered site.
    fn site_exists(&self, name: &str) -> LookupResult<bool>;

    /// Site assigned to a request path when the path carries no site prefix.
    fn resolve_assigned_site(&self, path: &str) -> SiteScope;

    /// URI mappings of a site. Sites without mappings return an empty list.
    fn uri_mappings(&self, _site: &SiteScope) -> Vec<UriMapping> {
        Vec::new()
    }
}

/// Resolves content identifiers to links.
pub trait ContentResolver: Send + Sync {
    fn resolve_by_id(&self, id: &str) -> LookupResult<Option<ContentLink>>;
}
