//! Resolution pipeline.
//!
//! # Data Flow
//! ```text
//! request path (+ query)
//!     → PathExtractor (standard: as-is, headless: after endpoint)
//!     → root / exclude check
//!     → site.rs (leading site segment) / registry assignment
//!     → PathExtractor lookup mapping (headless: site URI mapping)
//!     → matcher.rs (exact, then ordered patterns)
//!     → target.rs (template, content, suffix, prefix)
//!     → UrlPostprocessor (headless: endpoint on forwards)
//!     → ResolvedTarget
//! ```
//!
//! # Design Decisions
//! - Every failure ends in `None`; callers cannot tell "no rule" from "broken rule"
//! - Deployment differences are two strategies fixed at construction
//! - The resolver is `Send + Sync`; share it through `Arc`

use std::sync::Arc;
use std::time::Instant;

use crate::config::{ResolverConfig, ResolverMode};
use crate::observability::metrics;
use crate::routing::matcher::{ExcludeRules, RuleMatcher};
use crate::routing::pattern::{CacheStats, PatternCache};
use crate::routing::site::extract_site;
use crate::routing::target::TargetUrlBuilder;
use crate::rules::{
    ActionType, Catalog, ContentResolver, ResolvedTarget, RuleStore, SiteRegistry, SiteScope,
    WEBSITE_REPOSITORY,
};

/// Turns request paths into lookup paths.
pub trait PathExtractor: Send + Sync {
    /// Candidate path from the raw request path.
    fn extract(&self, request_path: &str) -> String;

    /// Path used for rule lookup once the site is known.
    fn lookup_path(&self, path: &str, site: &SiteScope, registry: &dyn SiteRegistry) -> String;
}

/// Adjusts built targets for the deployment.
pub trait UrlPostprocessor: Send + Sync {
    /// Whether targets are built as public (external) links.
    fn as_external(&self) -> bool;

    fn postprocess(&self, target: ResolvedTarget) -> ResolvedTarget;
}

/// Request path is the candidate path.
#[derive(Debug, Clone, Default)]
pub struct StandardPaths;

impl PathExtractor for StandardPaths {
    fn extract(&self, request_path: &str) -> String {
        request_path.to_string()
    }

    fn lookup_path(&self, path: &str, _site: &SiteScope, _registry: &dyn SiteRegistry) -> String {
        path.to_string()
    }
}

/// Candidate path lives below an API endpoint.
#[derive(Debug, Clone)]
pub struct HeadlessPaths {
    endpoint: String,
}

impl HeadlessPaths {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl PathExtractor for HeadlessPaths {
    fn extract(&self, request_path: &str) -> String {
        if self.endpoint.trim().is_empty() {
            return String::new();
        }
        request_path
            .find(&self.endpoint)
            .map(|pos| request_path[pos + self.endpoint.len()..].to_string())
            .unwrap_or_default()
    }

    /// Rewrite through the site's first `website` mapping. No mapping, no path.
    fn lookup_path(&self, path: &str, site: &SiteScope, registry: &dyn SiteRegistry) -> String {
        registry
            .uri_mappings(site)
            .into_iter()
            .find(|m| m.repository == WEBSITE_REPOSITORY)
            .map(|m| {
                if m.handle_prefix.is_empty() {
                    path.to_string()
                } else {
                    path.replace(&m.handle_prefix, &m.uri_prefix)
                }
            })
            .unwrap_or_else(|| {
                tracing::debug!(site = %site, "Site has no website mapping");
                String::new()
            })
    }
}

/// Targets are used unchanged.
#[derive(Debug, Clone, Default)]
pub struct StandardUrls;

impl UrlPostprocessor for StandardUrls {
    fn as_external(&self) -> bool {
        false
    }

    fn postprocess(&self, target: ResolvedTarget) -> ResolvedTarget {
        target
    }
}

/// Forwards are routed back through the API endpoint.
#[derive(Debug, Clone)]
pub struct HeadlessUrls {
    endpoint: String,
}

impl HeadlessUrls {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl UrlPostprocessor for HeadlessUrls {
    fn as_external(&self) -> bool {
        true
    }

    fn postprocess(&self, mut target: ResolvedTarget) -> ResolvedTarget {
        if target.action == ActionType::Forward && !self.endpoint.trim().is_empty() {
            target.url = format!("{}{}", self.endpoint, target.url);
        }
        target
    }
}

/// Resolves request paths to redirect/forward targets.
pub struct Resolver {
    registry: Arc<dyn SiteRegistry>,
    excludes: ExcludeRules,
    matcher: RuleMatcher,
    targets: TargetUrlBuilder,
    paths: Box<dyn PathExtractor>,
    urls: Box<dyn UrlPostprocessor>,
    patterns: Arc<PatternCache>,
}

impl Resolver {
    /// Assemble a resolver from its collaborators.
    pub fn new(
        store: Arc<dyn RuleStore>,
        registry: Arc<dyn SiteRegistry>,
        content: Arc<dyn ContentResolver>,
        config: &ResolverConfig,
    ) -> Self {
        let (paths, urls): (Box<dyn PathExtractor>, Box<dyn UrlPostprocessor>) = match config.mode {
            ResolverMode::Standard => (Box::new(StandardPaths), Box::new(StandardUrls)),
            ResolverMode::Headless => (
                Box::new(HeadlessPaths::new(&config.headless_endpoint)),
                Box::new(HeadlessUrls::new(&config.headless_endpoint)),
            ),
        };

        Self::with_strategies(store, registry, content, config, paths, urls)
    }

    /// Assemble a resolver with explicit deployment strategies.
    pub fn with_strategies(
        store: Arc<dyn RuleStore>,
        registry: Arc<dyn SiteRegistry>,
        content: Arc<dyn ContentResolver>,
        config: &ResolverConfig,
        paths: Box<dyn PathExtractor>,
        urls: Box<dyn UrlPostprocessor>,
    ) -> Self {
        let patterns = Arc::new(PatternCache::new());

        Self {
            excludes: ExcludeRules::new(config.excludes.clone(), Arc::clone(&patterns)),
            matcher: RuleMatcher::new(store, Arc::clone(&registry), Arc::clone(&patterns)),
            targets: TargetUrlBuilder::new(content, &config.context_path),
            registry,
            paths,
            urls,
            patterns,
        }
    }

    /// Resolver over an in-memory catalog.
    pub fn from_catalog(catalog: &Catalog, config: &ResolverConfig) -> Self {
        let shared = Arc::new(catalog.clone());
        Self::new(shared.clone(), shared.clone(), shared, config)
    }

    /// Resolve a request path without query string.
    pub fn resolve(&self, request_path: &str) -> Option<ResolvedTarget> {
        self.resolve_request(request_path, None)
    }

    /// `<prefix><url>` for a request path, or empty when nothing applies.
    pub fn resolve_uri(&self, request_path: &str) -> String {
        self.resolve(request_path)
            .map(|target| target.dispatch_uri())
            .unwrap_or_default()
    }

    /// Resolve a request. A non-empty `query` becomes the origin suffix `?<query>`.
    pub fn resolve_request(&self, request_path: &str, query: Option<&str>) -> Option<ResolvedTarget> {
        let start = Instant::now();

        let path = self.paths.extract(request_path);
        if path.len() <= 1 {
            tracing::debug!(path = %request_path, "Root request, not a candidate");
            metrics::record_resolution("root", start);
            return None;
        }

        if self.excludes.is_excluded(&path) {
            tracing::debug!(path = %path, "Path excluded");
            metrics::record_resolution("excluded", start);
            return None;
        }

        let (explicit_site, remainder) = extract_site(&path, self.registry.as_ref());
        let site = self.matcher.effective_scope(explicit_site, &path);
        let lookup = self.paths.lookup_path(&remainder, &site, self.registry.as_ref());

        tracing::debug!(path = %path, site = %site, lookup = %lookup, "Resolving");

        let Some(outcome) = self.matcher.find_match(&lookup, &site) else {
            metrics::record_resolution("no_match", start);
            return None;
        };

        let origin_suffix = query
            .filter(|q| !q.is_empty())
            .map(|q| format!("?{}", q))
            .unwrap_or_default();

        let Some(target) = self.targets.build_target(
            &outcome.rule,
            &outcome.params,
            self.urls.as_external(),
            &origin_suffix,
        ) else {
            metrics::record_resolution("empty_target", start);
            return None;
        };

        let target = self.urls.postprocess(target);
        tracing::debug!(
            path = %path,
            site = %site,
            rule = %outcome.rule.name,
            target = %target,
            "Resolved"
        );
        metrics::record_resolution(target.action.label(), start);
        Some(target)
    }

    /// Replace the exclude list (config reload).
    pub fn update_excludes(&self, excludes: Vec<String>) {
        self.excludes.replace(excludes);
    }

    /// Compiled pattern cache counters.
    pub fn pattern_cache_stats(&self) -> CacheStats {
        self.patterns.stats()
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("excludes", &self.excludes.patterns())
            .field("patterns", &self.patterns.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentConfig, RedirectConfig, SiteConfig};
    use crate::rules::{ContentLink, Rule, UriMapping};

    fn config() -> RedirectConfig {
        let mut config = RedirectConfig::default();
        config.sites.push(SiteConfig {
            name: "Dotmar".into(),
            mappings: vec![UriMapping {
                repository: WEBSITE_REPOSITORY.into(),
                handle_prefix: "/dotmar".into(),
                uri_prefix: String::new(),
            }],
        });
        config.content.push(ContentConfig {
            id: "123".into(),
            link: ContentLink {
                internal_path: "/internal/page.html".into(),
                external_link: "http://www.example.com/internal/page.html".into(),
            },
        });
        config.rules = vec![
            Rule {
                name: "xmas".into(),
                from_url: "/xmas".into(),
                link: "123".into(),
                ..Default::default()
            },
            Rule {
                name: "site-forward".into(),
                from_url: "/test".into(),
                site: "Dotmar".into(),
                to_url: "/internal/test".into(),
                redirect_type: "forward".into(),
                ..Default::default()
            },
            Rule {
                name: "blog".into(),
                from_url: "/blog/{year}/{month}".into(),
                use_pattern: true,
                to_url: "/archives/{year}-{month}".into(),
                ..Default::default()
            },
        ];
        config
    }

    fn resolver(config: &RedirectConfig) -> Resolver {
        Resolver::from_catalog(&Catalog::from_config(config), &config.resolver)
    }

    #[test]
    fn test_standard_resolution() {
        let r = resolver(&config());
        assert_eq!(r.resolve_uri("/xmas"), "redirect:/internal/page.html");
        assert_eq!(r.resolve_uri("/blog/2023/12"), "redirect:/archives/2023-12");
        assert_eq!(r.resolve_uri("/blog/2023"), "");
        assert_eq!(r.resolve_uri("/"), "");
    }

    #[test]
    fn test_site_prefixed_forward() {
        let r = resolver(&config());
        assert_eq!(r.resolve_uri("/Dotmar/test"), "forward:/internal/test");
        assert_eq!(r.resolve_uri("/test"), "");
    }

    #[test]
    fn test_query_becomes_suffix() {
        let r = resolver(&config());
        let target = r.resolve_request("/xmas", Some("utm=mail")).unwrap();
        assert_eq!(target.url, "/internal/page.html?utm=mail");
        let target = r.resolve_request("/xmas", Some("")).unwrap();
        assert_eq!(target.url, "/internal/page.html");
    }

    #[test]
    fn test_excludes_and_reload() {
        let mut cfg = config();
        cfg.resolver.excludes = vec!["(".into(), "/xmas".into()];
        let r = resolver(&cfg);
        assert!(r.resolve("/xmas").is_none());
        assert!(r.resolve("/blog/2023/12").is_some());

        r.update_excludes(vec!["/blog/.*".into()]);
        assert!(r.resolve("/xmas").is_some());
        assert!(r.resolve("/blog/2023/12").is_none());
    }

    #[test]
    fn test_headless_resolution() {
        let mut cfg = config();
        cfg.resolver.mode = ResolverMode::Headless;
        cfg.resolver.headless_endpoint = "/.rest/pages".into();
        cfg.resolver.fallback_site = Some("Dotmar".into());
        cfg.rules.push(Rule {
            name: "headless-forward".into(),
            from_url: "/promo".into(),
            site: "Dotmar".into(),
            to_url: "/landing".into(),
            redirect_type: "forward".into(),
            ..Default::default()
        });
        cfg.rules.push(Rule {
            name: "headless-redirect".into(),
            from_url: "/sale".into(),
            site: "Dotmar".into(),
            link: "123".into(),
            ..Default::default()
        });
        let r = resolver(&cfg);

        assert_eq!(
            r.resolve_uri("/.rest/pages/dotmar/promo"),
            "forward:/.rest/pages/landing"
        );
        assert_eq!(
            r.resolve_uri("/.rest/pages/sale"),
            "redirect:http://www.example.com/internal/page.html"
        );
        assert_eq!(r.resolve_uri("/dotmar/promo"), "");
        assert_eq!(r.resolve_uri("/.rest/pages/"), "");
    }

    #[test]
    fn test_headless_forwards_stay_internal() {
        let mut cfg = config();
        cfg.resolver.mode = ResolverMode::Headless;
        cfg.resolver.headless_endpoint = "/.rest/pages".into();
        cfg.resolver.context_path = "/author".into();
        cfg.resolver.fallback_site = Some("Dotmar".into());
        cfg.rules.push(Rule {
            name: "content-forward".into(),
            site: "Dotmar".into(),
            from_url: "/news".into(),
            link: "123".into(),
            redirect_type: "forward".into(),
            ..Default::default()
        });
        cfg.rules.push(Rule {
            name: "path-forward".into(),
            site: "Dotmar".into(),
            from_url: "/promo".into(),
            to_url: "/landing".into(),
            redirect_type: "forward".into(),
            ..Default::default()
        });
        cfg.rules.push(Rule {
            name: "path-redirect".into(),
            site: "Dotmar".into(),
            from_url: "/sale".into(),
            to_url: "/landing".into(),
            ..Default::default()
        });
        let r = resolver(&cfg);

        let target = r.resolve("/author/.rest/pages/news").unwrap();
        assert_eq!(target.action, ActionType::Forward);
        assert!(!target.url.contains("http://"));
        assert_eq!(target.dispatch_uri(), "forward:/.rest/pages/internal/page.html");

        assert_eq!(
            r.resolve_uri("/author/.rest/pages/promo"),
            "forward:/.rest/pages/landing"
        );
        assert_eq!(
            r.resolve_uri("/author/.rest/pages/sale"),
            "redirect:/author/landing"
        );
    }

    #[test]
    fn test_headless_without_website_mapping() {
        let mut cfg = config();
        cfg.resolver.mode = ResolverMode::Headless;
        cfg.resolver.headless_endpoint = "/api".into();
        cfg.sites[0].mappings.clear();
        cfg.resolver.fallback_site = Some("Dotmar".into());
        let r = resolver(&cfg);
        assert_eq!(r.resolve_uri("/api/test"), "");
    }

    #[test]
    fn test_headless_paths() {
        let paths = HeadlessPaths::new("/api/v1");
        assert_eq!(paths.extract("/ctx/api/v1/page"), "/page");
        assert_eq!(paths.extract("/page"), "");
        assert_eq!(HeadlessPaths::new(" ").extract("/api/v1/page"), "");
    }

    #[test]
    fn test_headless_forward_postprocessing() {
        let urls = HeadlessUrls::new("/api");
        let forward = urls.postprocess(ResolvedTarget::new(ActionType::Forward, "/a"));
        assert_eq!(forward.dispatch_uri(), "forward:/api/a");
        let redirect = urls.postprocess(ResolvedTarget::new(ActionType::Redirect, "/a"));
        assert_eq!(redirect.dispatch_uri(), "redirect:/a");
    }
}
