//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (rules reference registered sites)
//! - Validate addresses and URLs
//! - Report malformed patterns as warnings
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RedirectConfig → Result<(), Vec<ValidationError>>
//! - Pattern problems never reject a config; the resolver skips such rules
//!   at runtime and reports them there

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{RedirectConfig, ResolverMode};
use crate::routing::pattern;

/// A semantic problem that rejects a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Listener bind address is not a socket address.
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    /// Upstream address is not a socket address.
    #[error("invalid upstream address '{0}'")]
    InvalidUpstreamAddress(String),

    /// Metrics address is not a socket address.
    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    /// Public base URL does not parse.
    #[error("invalid public base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Rule has neither `from_url` nor `redirect`.
    #[error("rule '{0}' has no source path")]
    MissingSource(String),

    /// Rule references a site that is not registered.
    #[error("rule '{rule}' references unknown site '{site}'")]
    UnknownSite { rule: String, site: String },

    /// Site registered twice.
    #[error("duplicate site '{0}'")]
    DuplicateSite(String),

    /// Site with an empty name.
    #[error("site without a name")]
    UnnamedSite,

    /// Headless mode needs an endpoint prefix.
    #[error("headless mode requires resolver.headless_endpoint")]
    MissingHeadlessEndpoint,

    /// Request timeout of zero.
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// A pattern that will not compile. The rule or exclude stays inert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternWarning {
    /// `rule '<name>'` or `exclude #<index>`.
    pub location: String,
    pub pattern: String,
    pub reason: String,
}

impl std::fmt::Display for PatternWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: pattern '{}' does not compile: {}", self.location, self.pattern, self.reason)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &RedirectConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Some(address) = &config.upstream.address {
        if address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidUpstreamAddress(address.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let base_url = &config.public_url.default_base_url;
    if !base_url.is_empty() {
        if let Err(e) = url::Url::parse(base_url) {
            errors.push(ValidationError::InvalidBaseUrl {
                url: base_url.clone(),
                reason: e.to_string(),
            });
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.resolver.mode == ResolverMode::Headless
        && config.resolver.headless_endpoint.trim().is_empty()
    {
        errors.push(ValidationError::MissingHeadlessEndpoint);
    }

    let mut sites = HashSet::new();
    for site in &config.sites {
        if site.name.is_empty() {
            errors.push(ValidationError::UnnamedSite);
        } else if !sites.insert(site.name.as_str()) {
            errors.push(ValidationError::DuplicateSite(site.name.clone()));
        }
    }

    for rule in &config.rules {
        if rule.source().is_empty() {
            errors.push(ValidationError::MissingSource(rule.name.clone()));
        }
        if !rule.is_default_site() && !sites.contains(rule.site.as_str()) {
            errors.push(ValidationError::UnknownSite {
                rule: rule.name.clone(),
                site: rule.site.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Patterns (rule and exclude) that fail to compile.
pub fn pattern_warnings(config: &RedirectConfig) -> Vec<PatternWarning> {
    let mut warnings = Vec::new();

    for (index, exclude) in config.resolver.excludes.iter().enumerate() {
        if let Err(e) = pattern::compile_full_match(exclude) {
            warnings.push(PatternWarning {
                location: format!("exclude #{}", index),
                pattern: exclude.clone(),
                reason: e.to_string(),
            });
        }
    }

    for rule in config.rules.iter().filter(|r| r.use_pattern) {
        if let Err(e) = pattern::compile(rule.source()) {
            warnings.push(PatternWarning {
                location: format!("rule '{}'", rule.name),
                pattern: rule.source().to_string(),
                reason: e.to_string(),
            });
        }
    }

    warnings
}
