//! Public URLs for rules, as shown to editors.
//!
//! The authoring instance knows its own base URL; public links are derived
//! from it by removing the authoring context path and adding the public one.

use std::sync::Arc;

use crate::config::PublicUrlConfig;
use crate::routing::target::{is_external_link, TargetUrlBuilder};
use crate::rules::{ContentResolver, ParamSet, Rule};

/// Builds shareable URLs for rules.
pub struct PublicUrlService {
    base_url: String,
    target_context_path: String,
    content: Arc<dyn ContentResolver>,
    targets: TargetUrlBuilder,
}

impl PublicUrlService {
    pub fn new(
        config: &PublicUrlConfig,
        content: Arc<dyn ContentResolver>,
        context_path: impl Into<String>,
    ) -> Self {
        Self {
            base_url: public_base(&config.default_base_url, &config.context_path),
            target_context_path: config.target_context_path.clone(),
            targets: TargetUrlBuilder::new(Arc::clone(&content), context_path),
            content,
        }
    }

    /// Public base URL (authoring base without its context path).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Public short URL of the rule source.
    pub fn public_redirect_url(&self, rule: &Rule) -> String {
        format!("{}{}{}", self.base_url, self.target_context_path, rule.source())
    }

    /// Public URL of the rule target. Empty when the target is unknown.
    pub fn public_target_url(&self, rule: &Rule) -> String {
        if !rule.to_url.is_empty() {
            if is_external_link(&rule.to_url) {
                return rule.to_url.clone();
            }
            return format!("{}{}{}", self.base_url, self.target_context_path, rule.to_url);
        }

        if rule.link.is_empty() || is_external_link(&rule.link) {
            return rule.link.clone();
        }

        match self.content.resolve_by_id(&rule.link) {
            Ok(Some(link)) => link.external_link,
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(rule = %rule.name, error = %e, "Content lookup failed for public URL");
                String::new()
            }
        }
    }

    /// Internal preview link of the rule target (no prefix, no request suffix).
    pub fn preview_url(&self, rule: &Rule) -> String {
        self.targets
            .target_link(rule, &ParamSet::new(), false, false, "")
    }
}

fn public_base(default_base_url: &str, context_path: &str) -> String {
    let base = default_base_url.trim_end_matches('/');
    if context_path.is_empty() {
        return base.to_string();
    }
    match base.strip_suffix(context_path) {
        Some(stripped) => stripped.to_string(),
        None => base.replacen(context_path, "", 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ContentLink, LookupResult};

    struct Content;

    impl ContentResolver for Content {
        fn resolve_by_id(&self, id: &str) -> LookupResult<Option<ContentLink>> {
            Ok((id == "123-456-789").then(|| ContentLink {
                internal_path: "/author/context/page.html".into(),
                external_link: "http://www.noice.work/context/page.html".into(),
            }))
        }
    }

    fn service(target_context_path: &str) -> PublicUrlService {
        let config = PublicUrlConfig {
            default_base_url: "http://www.noice.work/author".into(),
            context_path: "/author".into(),
            target_context_path: target_context_path.into(),
        };
        PublicUrlService::new(&config, Arc::new(Content), "/author")
    }

    fn rule(link: &str) -> Rule {
        Rule {
            redirect: "/noice".into(),
            link: link.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_external_target() {
        let s = service("");
        let r = rule("http://www.noice.work");
        assert_eq!(s.public_target_url(&r), "http://www.noice.work");
        assert_eq!(s.public_redirect_url(&r), "http://www.noice.work/noice");
    }

    #[test]
    fn test_internal_target() {
        let s = service("");
        let r = rule("123-456-789");
        assert_eq!(s.public_target_url(&r), "http://www.noice.work/context/page.html");
        assert_eq!(s.public_redirect_url(&r), "http://www.noice.work/noice");
    }

    #[test]
    fn test_target_context_path() {
        let s = service("/public");
        assert_eq!(
            s.public_redirect_url(&rule("http://www.noice.work")),
            "http://www.noice.work/public/noice"
        );
        assert_eq!(
            s.public_target_url(&rule("123-456-789")),
            "http://www.noice.work/context/page.html"
        );
    }

    #[test]
    fn test_to_url_target() {
        let s = service("/public");
        let r = Rule {
            from_url: "/sale".into(),
            to_url: "/shop/sale".into(),
            ..Default::default()
        };
        assert_eq!(s.public_target_url(&r), "http://www.noice.work/public/shop/sale");
        assert_eq!(s.public_target_url(&rule("unknown")), "");
    }

    #[test]
    fn test_preview_url() {
        let s = service("");
        assert_eq!(s.preview_url(&rule("123-456-789")), "/context/page.html");
        let r = Rule {
            redirect: "/noice".into(),
            link: "123-456-789".into(),
            link_suffix: "#top".into(),
            redirect_type: "forward".into(),
            ..Default::default()
        };
        assert_eq!(s.preview_url(&r), "/context/page.html#top");
    }
}
