//! Startup orchestration and config reload wiring.
//!
//! # Responsibilities
//! - Build the rule catalog and resolver from a validated config
//! - Report broken patterns once at startup
//! - Apply reloaded configs to the running services
//!
//! # Design Decisions
//! - Fail fast: an invalid config at startup is fatal
//! - Reload swaps rules, sites, content and excludes only; listener,
//!   upstream and resolver mode need a restart

use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::{pattern_warnings, ConfigWatcher, RedirectConfig};
use crate::routing::Resolver;
use crate::rules::{Catalog, CatalogSnapshot};

/// Long-lived services shared by the server and the reload task.
#[derive(Clone)]
pub struct Services {
    pub catalog: Catalog,
    pub resolver: Arc<Resolver>,
}

impl Services {
    /// Build services from a validated configuration.
    pub fn from_config(config: &RedirectConfig) -> Self {
        for warning in pattern_warnings(config) {
            tracing::warn!(%warning, "Broken pattern will be skipped at runtime");
        }

        let catalog = Catalog::from_config(config);
        let resolver = Arc::new(Resolver::from_catalog(&catalog, &config.resolver));

        tracing::info!(
            rules = config.rules.len(),
            sites = config.sites.len(),
            excludes = config.resolver.excludes.len(),
            mode = ?config.resolver.mode,
            "Resolver initialized"
        );

        Self { catalog, resolver }
    }

    /// Apply a reloaded configuration.
    pub fn apply(&self, config: &RedirectConfig) {
        self.catalog.replace(CatalogSnapshot::from_config(config));
        self.resolver.update_excludes(config.resolver.excludes.clone());
    }
}

/// Watch `path` and apply every successfully reloaded config until shutdown.
pub async fn run_config_reload(
    path: &Path,
    services: Services,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), notify::Error> {
    let (watcher, mut updates) = ConfigWatcher::new(path);
    // Dropping the handle stops the watch.
    let _handle = watcher.run()?;

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(config) => {
                    services.apply(&config);
                    tracing::info!(rules = config.rules.len(), "Configuration reloaded");
                }
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }

    tracing::info!("Config reload task stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    fn rule(source: &str, target: &str) -> Rule {
        Rule {
            name: source.into(),
            from_url: source.into(),
            to_url: target.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_swaps_rules_and_excludes() {
        let mut config = RedirectConfig::default();
        config.rules = vec![rule("/old", "/new")];
        let services = Services::from_config(&config);
        assert_eq!(services.resolver.resolve_uri("/old"), "redirect:/new");

        config.rules = vec![rule("/other", "/elsewhere")];
        config.resolver.excludes = vec!["/other".into()];
        services.apply(&config);

        assert_eq!(services.resolver.resolve_uri("/old"), "");
        assert_eq!(services.resolver.resolve_uri("/other"), "");

        config.resolver.excludes.clear();
        services.apply(&config);
        assert_eq!(services.resolver.resolve_uri("/other"), "redirect:/elsewhere");
    }
}
