//! Leading site segment extraction.

use crate::rules::SiteRegistry;

/// Split an optional leading site segment off `path`.
///
/// Returns `(Some(site), remainder)` when the first segment names a
/// registered site, otherwise `(None, path)` unchanged. Registry failures
/// are logged and treated as "not a site".
pub fn extract_site(path: &str, registry: &dyn SiteRegistry) -> (Option<String>, String) {
    let unchanged = || (None, path.to_string());

    if path.len() <= 1 || !path.starts_with('/') {
        return unchanged();
    }

    let trimmed = &path[1..];
    let Some(slash) = trimmed.find('/') else {
        return unchanged();
    };
    if slash == 0 {
        return unchanged();
    }

    let candidate = &trimmed[..slash];
    let remainder = &trimmed[slash..];

    match registry.site_exists(candidate) {
        Ok(true) => {
            tracing::debug!(path = %path, site = %candidate, remainder = %remainder, "Site prefix extracted");
            (Some(candidate.to_string()), remainder.to_string())
        }
        Ok(false) => unchanged(),
        Err(e) => {
            tracing::warn!(path = %path, candidate = %candidate, error = %e, "Site lookup failed, treating as no site");
            unchanged()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{LookupError, LookupResult, SiteScope};

    struct Sites(&'static [&'static str]);

    impl SiteRegistry for Sites {
        fn site_exists(&self, name: &str) -> LookupResult<bool> {
            Ok(self.0.contains(&name))
        }

        fn resolve_assigned_site(&self, _path: &str) -> SiteScope {
            SiteScope::NoSite
        }
    }

    struct Broken;

    impl SiteRegistry for Broken {
        fn site_exists(&self, _name: &str) -> LookupResult<bool> {
            Err(LookupError::Registry("unavailable".into()))
        }

        fn resolve_assigned_site(&self, _path: &str) -> SiteScope {
            SiteScope::NoSite
        }
    }

    #[test]
    fn test_known_site_is_stripped() {
        let sites = Sites(&["Dotmar"]);
        assert_eq!(
            extract_site("/Dotmar/test", &sites),
            (Some("Dotmar".to_string()), "/test".to_string())
        );
        assert_eq!(
            extract_site("/Dotmar/a/b", &sites),
            (Some("Dotmar".to_string()), "/a/b".to_string())
        );
    }

    #[test]
    fn test_unknown_site_is_unchanged() {
        let sites = Sites(&["Dotmar"]);
        assert_eq!(
            extract_site("/NonExistentSite/test", &sites),
            (None, "/NonExistentSite/test".to_string())
        );
    }

    #[test]
    fn test_paths_without_site_segment() {
        let sites = Sites(&["Dotmar"]);
        assert_eq!(extract_site("/", &sites), (None, "/".to_string()));
        assert_eq!(extract_site("", &sites), (None, String::new()));
        assert_eq!(extract_site("Dotmar/test", &sites), (None, "Dotmar/test".to_string()));
        assert_eq!(extract_site("/Dotmar", &sites), (None, "/Dotmar".to_string()));
        assert_eq!(extract_site("//test", &sites), (None, "//test".to_string()));
    }

    #[test]
    fn test_registry_failure_means_no_site() {
        assert_eq!(
            extract_site("/Dotmar/test", &Broken),
            (None, "/Dotmar/test".to_string())
        );
    }
}
