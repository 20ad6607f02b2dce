//! Rule records and the values that flow through resolution.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Site value stored on rules that apply when no site can be resolved.
pub const DEFAULT_SITE: &str = "default";

/// Dispatch prefix for temporary redirects.
pub const REDIRECT_PREFIX: &str = "redirect:";
/// Dispatch prefix for permanent (301) redirects.
pub const PERMANENT_PREFIX: &str = "permanent:";
/// Dispatch prefix for server-side forwards.
pub const FORWARD_PREFIX: &str = "forward:";

/// What the dispatcher should do with a resolved target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Temporary redirect (302).
    #[default]
    Redirect,
    /// Permanent redirect (301).
    PermanentRedirect,
    /// Internal rewrite without a client round trip.
    Forward,
}

impl ActionType {
    /// Parse a stored action value. Unknown and empty values mean `Redirect`.
    pub fn from_stored(value: &str) -> Self {
        match value.trim() {
            "forward" => ActionType::Forward,
            "301" | "permanent" => ActionType::PermanentRedirect,
            _ => ActionType::Redirect,
        }
    }

    /// Prefix understood by the dispatcher.
    pub fn prefix(&self) -> &'static str {
        match self {
            ActionType::Redirect => REDIRECT_PREFIX,
            ActionType::PermanentRedirect => PERMANENT_PREFIX,
            ActionType::Forward => FORWARD_PREFIX,
        }
    }

    /// Metric/log label.
    pub fn label(&self) -> &'static str {
        match self {
            ActionType::Redirect => "redirect",
            ActionType::PermanentRedirect => "permanent",
            ActionType::Forward => "forward",
        }
    }
}

/// A stored redirect rule.
///
/// The record carries two generations of field names. Newer rules use
/// `from_url` / `to_url` / `to_url_suffix` / `redirect_type`; older ones use
/// `redirect` / `link` / `link_suffix` / `type`. The accessors below apply
/// the newer-first fallback so callers never look at the raw fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    /// Identifier for logs and the management CLI.
    pub name: String,

    /// Source path or pattern (newer schema).
    pub from_url: String,

    /// Source path or pattern (older schema).
    pub redirect: String,

    /// Site the rule belongs to; empty or `default` means no site.
    pub site: String,

    /// Match `source` as a pattern instead of by equality.
    pub use_pattern: bool,

    /// Direct target path or absolute URL.
    pub to_url: String,

    /// Content identifier or absolute URL.
    pub link: String,

    /// Suffix appended to `to_url` targets.
    pub to_url_suffix: String,

    /// Suffix appended to `link` targets.
    pub link_suffix: String,

    /// Action (newer schema).
    pub redirect_type: String,

    /// Action (older schema).
    #[serde(rename = "type")]
    pub kind: String,
}

impl Rule {
    /// Source path or pattern, `from_url` first.
    pub fn source(&self) -> &str {
        if self.from_url.is_empty() {
            &self.redirect
        } else {
            &self.from_url
        }
    }

    /// Resolved action type, `redirect_type` first.
    pub fn action_type(&self) -> ActionType {
        if self.redirect_type.trim().is_empty() {
            ActionType::from_stored(&self.kind)
        } else {
            ActionType::from_stored(&self.redirect_type)
        }
    }

    /// Whether the rule carries the default-site sentinel.
    pub fn is_default_site(&self) -> bool {
        self.site.is_empty() || self.site == DEFAULT_SITE
    }

    /// Whether the rule is visible for requests in `scope`.
    pub fn applies_to(&self, scope: &SiteScope) -> bool {
        match scope {
            SiteScope::NoSite => self.is_default_site(),
            SiteScope::Named(name) => self.site == *name,
        }
    }
}

/// Site a request was resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SiteScope {
    /// No site could be resolved for the request.
    #[default]
    NoSite,
    /// A registered site.
    Named(String),
}

impl SiteScope {
    /// Site name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            SiteScope::NoSite => None,
            SiteScope::Named(name) => Some(name),
        }
    }
}

impl From<Option<String>> for SiteScope {
    fn from(name: Option<String>) -> Self {
        name.map(SiteScope::Named).unwrap_or(SiteScope::NoSite)
    }
}

impl fmt::Display for SiteScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteScope::NoSite => write!(f, "[no site]"),
            SiteScope::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Values captured from a pattern match.
///
/// Keys are either the 1-based group index ("1", "2", ...) or a group name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamSet {
    values: HashMap<String, String>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = ParamSet::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// A rule that matched a request, with the values it captured.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Shared handle into the store's snapshot.
    pub rule: Arc<Rule>,
    pub params: ParamSet,
}

/// Final resolution result handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTarget {
    pub action: ActionType,
    pub url: String,
}

impl ResolvedTarget {
    pub fn new(action: ActionType, url: impl Into<String>) -> Self {
        Self {
            action,
            url: url.into(),
        }
    }

    /// `<prefix><url>` form consumed by dispatchers.
    pub fn dispatch_uri(&self) -> String {
        format!("{}{}", self.action.prefix(), self.url)
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.action.prefix(), self.url)
    }
}

/// Resolved content node reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentLink {
    /// Path inside this deployment (e.g. `/internal/page.html`).
    pub internal_path: String,
    /// Absolute public link.
    pub external_link: String,
}

/// URI mapping of a site (repository handle prefix to public URI prefix).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UriMapping {
    /// Repository the mapping applies to (`website` for pages).
    pub repository: String,
    pub handle_prefix: String,
    pub uri_prefix: String,
}

/// Repository name of page content.
pub const WEBSITE_REPOSITORY: &str = "website";

/// Failures reported by external collaborators.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Rule store query failed.
    #[error("rule store query failed: {0}")]
    Store(String),

    /// Site registry lookup failed.
    #[error("site registry lookup failed: {0}")]
    Registry(String),

    /// Content lookup failed.
    #[error("content lookup failed: {0}")]
    Content(String),
}

/// Result type for collaborator lookups.
pub type LookupResult<T> = Result<T, LookupError>;
