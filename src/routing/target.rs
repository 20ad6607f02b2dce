//! Target URL assembly.
//!
//! # Responsibilities
//! - Pick the target template (`to_url`, else `link`) and fill placeholders
//! - Reject external targets for forwards
//! - Resolve content identifiers through the content resolver
//! - Append the suffix and the action prefix
//!
//! # Design Decisions
//! - An empty string means "no target" at every step
//! - `to_url` paths are not rewritten across sites; site mapping is the
//!   dispatcher's concern

use std::sync::Arc;

use crate::routing::placeholder::resolve_placeholders;
use crate::rules::{ActionType, ContentLink, ContentResolver, ParamSet, ResolvedTarget, Rule};

/// Whether `link` is an absolute http(s) URL.
pub fn is_external_link(link: &str) -> bool {
    starts_with_ignore_case(link, "http://") || starts_with_ignore_case(link, "https://")
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Builds target URLs for matched rules.
pub struct TargetUrlBuilder {
    content: Arc<dyn ContentResolver>,
    context_path: String,
}

impl TargetUrlBuilder {
    pub fn new(content: Arc<dyn ContentResolver>, context_path: impl Into<String>) -> Self {
        Self {
            content,
            context_path: context_path.into(),
        }
    }

    /// Target URL with suffix, without action prefix. Empty when there is none.
    pub fn target_link(
        &self,
        rule: &Rule,
        params: &ParamSet,
        is_forward: bool,
        as_external: bool,
        origin_suffix: &str,
    ) -> String {
        let from_to_url = !rule.to_url.is_empty();
        let template = if from_to_url { &rule.to_url } else { &rule.link };
        if template.is_empty() {
            return String::new();
        }

        let link = if params.is_empty() {
            template.clone()
        } else {
            resolve_placeholders(template, params)
        };

        let mut url = if is_external_link(&link) {
            if is_forward {
                tracing::debug!(rule = %rule.name, target = %link, "External target refused for forward");
                String::new()
            } else {
                link
            }
        } else if from_to_url {
            self.internal_path(link, as_external)
        } else {
            self.content_link(&link, as_external)
        };

        if !url.is_empty() && !is_forward {
            let suffix = self.suffix(rule, origin_suffix);
            if !suffix.is_empty() {
                if params.is_empty() {
                    url.push_str(suffix);
                } else {
                    url.push_str(&resolve_placeholders(suffix, params));
                }
            }
        }

        url
    }

    /// Action-prefixed target, or `None` when the rule has no usable target.
    pub fn build_target(
        &self,
        rule: &Rule,
        params: &ParamSet,
        as_external: bool,
        origin_suffix: &str,
    ) -> Option<ResolvedTarget> {
        let action = rule.action_type();
        let is_forward = action == ActionType::Forward;
        // Forwards stay inside this deployment.
        let as_external = as_external && !is_forward;
        let url = self.target_link(rule, params, is_forward, as_external, origin_suffix);

        if url.is_empty() {
            tracing::debug!(rule = %rule.name, "Rule produced no target");
            None
        } else {
            Some(ResolvedTarget::new(action, url))
        }
    }

    /// `<prefix><url>`, or empty when the rule has no usable target.
    pub fn build(
        &self,
        rule: &Rule,
        params: &ParamSet,
        as_external: bool,
        origin_suffix: &str,
    ) -> String {
        self.build_target(rule, params, as_external, origin_suffix)
            .map(|target| target.dispatch_uri())
            .unwrap_or_default()
    }

    fn internal_path(&self, path: String, as_external: bool) -> String {
        if as_external && !self.context_path.trim().is_empty() && !path.starts_with(&self.context_path)
        {
            format!("{}{}", self.context_path, path)
        } else {
            path
        }
    }

    fn content_link(&self, id: &str, as_external: bool) -> String {
        match self.content.resolve_by_id(id) {
            Ok(Some(ContentLink {
                internal_path,
                external_link,
            })) => {
                if as_external {
                    external_link
                } else {
                    self.strip_context_path(internal_path)
                }
            }
            Ok(None) => {
                tracing::debug!(id = %id, "Target content not found");
                String::new()
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Target content lookup failed");
                String::new()
            }
        }
    }

    fn strip_context_path(&self, path: String) -> String {
        if self.context_path.is_empty() {
            return path;
        }
        match path.find(&self.context_path) {
            Some(pos) => path[pos + self.context_path.len()..].to_string(),
            None => path,
        }
    }

    /// Dedicated suffix, else generic suffix, else the request's own.
    fn suffix<'a>(&self, rule: &'a Rule, origin_suffix: &'a str) -> &'a str {
        if !rule.to_url_suffix.is_empty() {
            &rule.to_url_suffix
        } else if !rule.link_suffix.is_empty() {
            &rule.link_suffix
        } else {
            origin_suffix
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{LookupError, LookupResult};

    struct Content;

    impl ContentResolver for Content {
        fn resolve_by_id(&self, id: &str) -> LookupResult<Option<ContentLink>> {
            match id {
                "123" => Ok(Some(ContentLink {
                    internal_path: "/ctx/internal/forward/page.html".into(),
                    external_link: "http://www.example.com/internal/forward/page.html".into(),
                })),
                "boom" => Err(LookupError::Content("unavailable".into())),
                _ => Ok(None),
            }
        }
    }

    fn builder(context_path: &str) -> TargetUrlBuilder {
        TargetUrlBuilder::new(Arc::new(Content), context_path)
    }

    #[test]
    fn test_external_redirect() {
        let rule = Rule {
            link: "http://example.com".into(),
            ..Default::default()
        };
        assert_eq!(builder("").build(&rule, &ParamSet::new(), false, ""), "redirect:http://example.com");
    }

    #[test]
    fn test_external_forward_is_refused() {
        let rule = Rule {
            to_url: "HTTPS://example.com/a".into(),
            redirect_type: "forward".into(),
            ..Default::default()
        };
        assert_eq!(builder("").build(&rule, &ParamSet::new(), false, ""), "");
        assert!(builder("").build_target(&rule, &ParamSet::new(), false, "").is_none());
    }

    #[test]
    fn test_permanent_content_link_with_suffix() {
        let rule = Rule {
            link: "123".into(),
            link_suffix: "#anchor1".into(),
            kind: "301".into(),
            ..Default::default()
        };
        assert_eq!(
            builder("/ctx").build(&rule, &ParamSet::new(), false, ""),
            "permanent:/internal/forward/page.html#anchor1"
        );
    }

    #[test]
    fn test_content_link_as_external() {
        let rule = Rule {
            link: "123".into(),
            ..Default::default()
        };
        assert_eq!(
            builder("/ctx").target_link(&rule, &ParamSet::new(), false, true, ""),
            "http://www.example.com/internal/forward/page.html"
        );
    }

    #[test]
    fn test_unknown_or_failing_content_is_empty() {
        for id in ["missing", "boom"] {
            let rule = Rule {
                link: id.into(),
                ..Default::default()
            };
            assert_eq!(builder("").build(&rule, &ParamSet::new(), false, ""), "");
        }
    }

    #[test]
    fn test_to_url_path_and_context() {
        let rule = Rule {
            to_url: "/products".into(),
            ..Default::default()
        };
        let b = builder("/ctx");
        assert_eq!(b.target_link(&rule, &ParamSet::new(), false, false, ""), "/products");
        assert_eq!(b.target_link(&rule, &ParamSet::new(), false, true, ""), "/ctx/products");

        let rule = Rule {
            to_url: "/ctx/products".into(),
            ..Default::default()
        };
        assert_eq!(b.target_link(&rule, &ParamSet::new(), false, true, ""), "/ctx/products");
    }

    #[test]
    fn test_placeholders_in_target_and_suffix() {
        let rule = Rule {
            to_url: "/archives/{year}-{month}".into(),
            to_url_suffix: "#m{month}".into(),
            ..Default::default()
        };
        let params: ParamSet = [("year", "2023"), ("month", "12")].into_iter().collect();
        assert_eq!(
            builder("").build(&rule, &params, false, ""),
            "redirect:/archives/2023-12#m12"
        );
    }

    #[test]
    fn test_suffix_precedence() {
        let b = builder("");
        let mut rule = Rule {
            to_url: "/t".into(),
            ..Default::default()
        };
        assert_eq!(b.target_link(&rule, &ParamSet::new(), false, false, "?q=1"), "/t?q=1");

        rule.link_suffix = "#generic".into();
        assert_eq!(b.target_link(&rule, &ParamSet::new(), false, false, "?q=1"), "/t#generic");

        rule.to_url_suffix = "#dedicated".into();
        assert_eq!(b.target_link(&rule, &ParamSet::new(), false, false, "?q=1"), "/t#dedicated");
    }

    #[test]
    fn test_forward_gets_no_suffix() {
        let rule = Rule {
            to_url: "/internal".into(),
            to_url_suffix: "#x".into(),
            redirect_type: "forward".into(),
            ..Default::default()
        };
        assert_eq!(builder("").build(&rule, &ParamSet::new(), false, "?q=1"), "forward:/internal");
    }

    #[test]
    fn test_forward_is_built_internal() {
        let b = builder("/ctx");
        let content_forward = Rule {
            link: "123".into(),
            redirect_type: "forward".into(),
            ..Default::default()
        };
        assert_eq!(
            b.build(&content_forward, &ParamSet::new(), true, ""),
            "forward:/internal/forward/page.html"
        );

        let path_forward = Rule {
            to_url: "/landing".into(),
            redirect_type: "forward".into(),
            ..Default::default()
        };
        assert_eq!(b.build(&path_forward, &ParamSet::new(), true, ""), "forward:/landing");
    }

    #[test]
    fn test_no_target() {
        assert_eq!(builder("").build(&Rule::default(), &ParamSet::new(), false, "?q"), "");
    }
}
