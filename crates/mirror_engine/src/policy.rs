use std::fmt;

use mirror_core::{is_excluded_path, is_page_path, same_site, ResourceCategory, ResourceToggles};
use url::Url;

/// Why a referenced asset is left out of the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedScheme,
    /// Extension-less or page-typed URL; pages link to it as a page.
    PageLike,
    ExcludedExtension,
    CrossDomain,
    CategoryDisabled(ResourceCategory),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedScheme => write!(f, "unsupported scheme"),
            SkipReason::PageLike => write!(f, "no asset extension"),
            SkipReason::ExcludedExtension => write!(f, "excluded file type"),
            SkipReason::CrossDomain => write!(f, "different domain"),
            SkipReason::CategoryDisabled(category) => write!(f, "{category} disabled"),
        }
    }
}

/// Which assets get downloaded. The content processor asks the same
/// question so it only points pages at files that will exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePolicy {
    base_url: Url,
    toggles: ResourceToggles,
    same_domain_only: bool,
}

impl ResourcePolicy {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            toggles: ResourceToggles::default(),
            same_domain_only: true,
        }
    }

    pub fn with_toggles(mut self, toggles: ResourceToggles) -> Self {
        self.toggles = toggles;
        self
    }

    pub fn same_domain_only(mut self, enabled: bool) -> Self {
        self.same_domain_only = enabled;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn toggles(&self) -> ResourceToggles {
        self.toggles
    }

    pub fn decide(&self, url: &Url) -> Result<ResourceCategory, SkipReason> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SkipReason::UnsupportedScheme);
        }
        if is_page_path(url.path()) {
            return Err(SkipReason::PageLike);
        }
        if is_excluded_path(url.path()) {
            return Err(SkipReason::ExcludedExtension);
        }
        if self.same_domain_only && !same_site(&self.base_url, url) {
            return Err(SkipReason::CrossDomain);
        }
        let category = ResourceCategory::from_url(url);
        if !self.toggles.allows(category) {
            return Err(SkipReason::CategoryDisabled(category));
        }
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn www_prefix_counts_as_same_domain() {
        let policy = ResourcePolicy::new(url("https://example.com/"));
        assert_eq!(
            policy.decide(&url("https://www.example.com/a.png")),
            Ok(ResourceCategory::Images)
        );
        assert_eq!(
            policy.decide(&url("https://cdn.other.net/a.png")),
            Err(SkipReason::CrossDomain)
        );
    }

    #[test]
    fn toggles_and_exclusions_apply() {
        let policy = ResourcePolicy::new(url("https://example.com/")).same_domain_only(false);
        assert_eq!(
            policy.decide(&url("https://example.com/movie.mp4")),
            Err(SkipReason::CategoryDisabled(ResourceCategory::Videos))
        );
        assert_eq!(
            policy.decide(&url("https://example.com/file.zip")),
            Err(SkipReason::ExcludedExtension)
        );
        assert_eq!(
            policy.decide(&url("https://cdn.other.net/lib.js")),
            Ok(ResourceCategory::Scripts)
        );
        assert_eq!(
            policy.decide(&url("https://example.com/data.json")),
            Ok(ResourceCategory::Other)
        );
    }

    #[test]
    fn page_like_urls_are_not_assets() {
        let policy = ResourcePolicy::new(url("https://example.com/"));
        for raw in [
            "https://example.com/api/avatar",
            "https://example.com/",
            "https://example.com/about.html",
        ] {
            assert_eq!(policy.decide(&url(raw)), Err(SkipReason::PageLike), "{raw}");
        }
        assert_eq!(
            policy.decide(&url("https://example.com/avatar.png?size=2")),
            Ok(ResourceCategory::Images)
        );
    }
}
