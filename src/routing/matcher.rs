//! Rule matching logic.
//!
//! # Responsibilities
//! - Reject excluded paths before any store query
//! - Determine the effective site scope of a request
//! - Find the rule for a path: exact lookup first, then ordered patterns
//!
//! # Design Decisions
//! - Store failures degrade to "no rule" (logged + counted)
//! - A broken rule pattern skips that rule only
//! - A broken exclude pattern fails open: the path stays a candidate
//! - First matching pattern rule wins; the store's order is authoritative

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::observability::metrics;
use crate::routing::pattern::PatternCache;
use crate::rules::{MatchOutcome, ParamSet, RuleStore, SiteRegistry, SiteScope};

/// Ordered exclude regexes, replaceable at runtime.
#[derive(Debug)]
pub struct ExcludeRules {
    patterns: ArcSwap<Vec<String>>,
    cache: Arc<PatternCache>,
}

impl ExcludeRules {
    pub fn new(patterns: Vec<String>, cache: Arc<PatternCache>) -> Self {
        Self {
            patterns: ArcSwap::from_pointee(patterns),
            cache,
        }
    }

    /// Replace the exclude list.
    pub fn replace(&self, patterns: Vec<String>) {
        tracing::info!(count = patterns.len(), "Exclude patterns replaced");
        self.patterns.store(Arc::new(patterns));
    }

    /// Current exclude list.
    pub fn patterns(&self) -> Arc<Vec<String>> {
        self.patterns.load_full()
    }

    /// Whether `path` fully matches any exclude pattern.
    ///
    /// Empty patterns are ignored. A pattern that does not compile is
    /// reported and does not exclude.
    pub fn is_excluded(&self, path: &str) -> bool {
        let patterns = self.patterns.load();
        patterns
            .iter()
            .filter(|expression| !expression.is_empty())
            .any(|expression| match self.cache.exclude_pattern(expression) {
                Ok(regex) => regex.is_match(path),
                Err(e) => {
                    tracing::error!(pattern = %expression, error = %e, "Malformed exclude pattern ignored");
                    metrics::record_pattern_error("exclude");
                    false
                }
            })
    }
}

/// Finds the rule that applies to a path in a site scope.
pub struct RuleMatcher {
    store: Arc<dyn RuleStore>,
    registry: Arc<dyn SiteRegistry>,
    patterns: Arc<PatternCache>,
}

impl RuleMatcher {
    pub fn new(
        store: Arc<dyn RuleStore>,
        registry: Arc<dyn SiteRegistry>,
        patterns: Arc<PatternCache>,
    ) -> Self {
        Self {
            store,
            registry,
            patterns,
        }
    }

    /// Explicit site if one was extracted, else the registry's assignment.
    pub fn effective_scope(&self, explicit: Option<String>, path: &str) -> SiteScope {
        match explicit {
            Some(site) => SiteScope::Named(site),
            None => self.registry.resolve_assigned_site(path),
        }
    }

    /// Exact rule first, then the first pattern rule that matches.
    pub fn find_match(&self, path: &str, site: &SiteScope) -> Option<MatchOutcome> {
        if path.len() <= 1 {
            return None;
        }

        match self.store.find_exact(path, site) {
            Ok(Some(rule)) => {
                tracing::debug!(path = %path, site = %site, rule = %rule.name, "Exact rule matched");
                return Some(MatchOutcome {
                    rule,
                    params: ParamSet::new(),
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(path = %path, site = %site, error = %e, "Exact rule lookup failed");
                metrics::record_store_error("exact");
            }
        }

        self.find_pattern_match(path, site)
    }

    fn find_pattern_match(&self, path: &str, site: &SiteScope) -> Option<MatchOutcome> {
        let rules = match self.store.find_pattern_rules(site) {
            Ok(rules) => rules,
            Err(e) => {
                tracing::warn!(site = %site, error = %e, "Pattern rule lookup failed");
                metrics::record_store_error("pattern");
                return None;
            }
        };

        for rule in rules {
            let compiled = match self.patterns.rule_pattern(rule.source()) {
                Ok(compiled) => compiled,
                Err(e) => {
                    tracing::error!(rule = %rule.name, error = %e, "Skipping rule with malformed pattern");
                    metrics::record_pattern_error("rule");
                    continue;
                }
            };

            if let Some(params) = compiled.match_and_extract(path) {
                tracing::debug!(
                    path = %path,
                    site = %site,
                    rule = %rule.name,
                    pattern = %compiled.source(),
                    params = params.len(),
                    "Pattern rule matched"
                );
                return Some(MatchOutcome { rule, params });
            }
        }

        tracing::debug!(path = %path, site = %site, "No rule matched");
        None
    }
}
