//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the resolver.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::rules::{ContentLink, Rule, UriMapping};

/// Root configuration for the redirect resolver.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RedirectConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream that receives forwards and unresolved requests.
    pub upstream: UpstreamConfig,

    /// Resolution behaviour (deployment mode, excludes).
    pub resolver: ResolverConfig,

    /// Public URL generation for authoring tools.
    pub public_url: PublicUrlConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Registered sites.
    pub sites: Vec<SiteConfig>,

    /// Content nodes addressable by id from rule `link` fields.
    pub content: Vec<ContentConfig>,

    /// Redirect rules, in evaluation order.
    pub rules: Vec<Rule>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000"). Without it, unresolved
    /// requests get a 404 and forwards a 502.
    pub address: Option<String>,
}

/// Deployment flavour of the resolution pipeline.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolverMode {
    /// Request path is used as-is.
    #[default]
    Standard,
    /// Request path lives below an API endpoint prefix.
    Headless,
}

/// Resolution behaviour.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResolverConfig {
    /// Pipeline flavour.
    pub mode: ResolverMode,

    /// Endpoint prefix for headless mode (e.g., "/.rest/delivery/pages/v1").
    pub headless_endpoint: String,

    /// Context path of this deployment.
    pub context_path: String,

    /// Site assumed when neither a path prefix nor a site mapping applies.
    pub fallback_site: Option<String>,

    /// Regexes for paths that are never redirect candidates (full match).
    pub excludes: Vec<String>,
}

/// Public URL generation settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PublicUrlConfig {
    /// Default base URL of the authoring instance (e.g., "http://example.com/author").
    pub default_base_url: String,

    /// Context path contained in `default_base_url`.
    pub context_path: String,

    /// Context path of the public instance.
    pub target_context_path: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A registered site.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Site name as it appears in path prefixes and rule `site` fields.
    pub name: String,

    /// Repository URI mappings.
    pub mappings: Vec<UriMapping>,
}

/// A content node addressable by identifier.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContentConfig {
    pub id: String,

    #[serde(flatten)]
    pub link: ContentLink,
}
