//! In-memory rule catalog built from configuration.
//!
//! # Responsibilities
//! - Serve rule, site and content lookups from an immutable snapshot
//! - Swap the snapshot atomically when configuration is reloaded
//!
//! # Design Decisions
//! - Readers never block: `ArcSwap::load` per query
//! - Rules keep their configured order (first registered wins)
//! - Exact lookup checks the older `redirect` field before `from_url`

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::schema::RedirectConfig;
use crate::rules::store::{ContentResolver, RuleStore, SiteRegistry};
use crate::rules::types::{ContentLink, LookupResult, Rule, SiteScope, UriMapping};

/// Immutable view over rules, sites and content.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    rules: Vec<Arc<Rule>>,
    /// Site names in configured order, for assigned-site resolution.
    site_order: Vec<String>,
    sites: HashMap<String, Vec<UriMapping>>,
    content: HashMap<String, ContentLink>,
    fallback_site: Option<String>,
}

impl CatalogSnapshot {
    /// Build a snapshot from configuration.
    pub fn from_config(config: &RedirectConfig) -> Self {
        let mut sites = HashMap::new();
        let mut site_order = Vec::with_capacity(config.sites.len());
        for site in &config.sites {
            if sites.insert(site.name.clone(), site.mappings.clone()).is_none() {
                site_order.push(site.name.clone());
            }
        }

        let content = config
            .content
            .iter()
            .map(|c| (c.id.clone(), c.link.clone()))
            .collect();

        Self {
            rules: config.rules.iter().cloned().map(Arc::new).collect(),
            site_order,
            sites,
            content,
            fallback_site: config
                .resolver
                .fallback_site
                .clone()
                .filter(|s| !s.is_empty()),
        }
    }

    /// Number of rules in the snapshot.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// All rules in configured order.
    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    /// Rule by name.
    pub fn rule(&self, name: &str) -> Option<Arc<Rule>> {
        self.rules.iter().find(|r| r.name == name).cloned()
    }
}

/// Shared, hot-swappable catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    inner: Arc<ArcSwap<CatalogSnapshot>>,
}

impl Catalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(snapshot)),
        }
    }

    pub fn from_config(config: &RedirectConfig) -> Self {
        Self::new(CatalogSnapshot::from_config(config))
    }

    /// Replace the current snapshot.
    pub fn replace(&self, snapshot: CatalogSnapshot) {
        tracing::info!(rules = snapshot.rule_count(), sites = snapshot.sites.len(), "Rule catalog replaced");
        self.inner.store(Arc::new(snapshot));
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.inner.load_full()
    }
}

impl RuleStore for Catalog {
    fn find_exact(&self, path: &str, site: &SiteScope) -> LookupResult<Option<Arc<Rule>>> {
        let snapshot = self.inner.load();
        let candidates = || {
            snapshot
                .rules
                .iter()
                .filter(|r| !r.use_pattern && r.applies_to(site))
        };

        let found = candidates()
            .find(|r| !r.redirect.is_empty() && r.redirect == path)
            .or_else(|| candidates().find(|r| !r.from_url.is_empty() && r.from_url == path))
            .cloned();

        tracing::debug!(path = %path, site = %site, found = found.is_some(), "Exact rule lookup");
        Ok(found)
    }

    fn find_pattern_rules(&self, site: &SiteScope) -> LookupResult<Vec<Arc<Rule>>> {
        let snapshot = self.inner.load();
        let rules: Vec<_> = snapshot
            .rules
            .iter()
            .filter(|r| r.use_pattern && r.applies_to(site) && !r.source().is_empty())
            .cloned()
            .collect();

        tracing::debug!(site = %site, count = rules.len(), "Pattern rule lookup");
        Ok(rules)
    }
}

impl SiteRegistry for Catalog {
    fn site_exists(&self, name: &str) -> LookupResult<bool> {
        Ok(self.inner.load().sites.contains_key(name))
    }

    fn resolve_assigned_site(&self, path: &str) -> SiteScope {
        let snapshot = self.inner.load();
        let mapped = snapshot.site_order.iter().find(|name| {
            snapshot.sites.get(*name).is_some_and(|mappings| {
                mappings
                    .iter()
                    .any(|m| !m.handle_prefix.is_empty() && path.starts_with(&m.handle_prefix))
            })
        });

        match mapped {
            Some(name) => SiteScope::Named(name.clone()),
            None => snapshot.fallback_site.clone().into(),
        }
    }

    fn uri_mappings(&self, site: &SiteScope) -> Vec<UriMapping> {
        site.name()
            .and_then(|name| self.inner.load().sites.get(name).cloned())
            .unwrap_or_default()
    }
}

impl ContentResolver for Catalog {
    fn resolve_by_id(&self, id: &str) -> LookupResult<Option<ContentLink>> {
        Ok(self.inner.load().content.get(id).cloned())
    }
}
