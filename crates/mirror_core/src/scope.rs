use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::category::is_excluded_path;
use crate::pathmap::netloc;

pub const MAX_DEPTH_LIMIT: u32 = 20;
pub const MAX_EXCLUDE_PATTERNS: usize = 100;
pub const MAX_PATTERN_LEN: usize = 200;
pub const DEFAULT_MAX_DEPTH: u32 = 3;
pub const DEFAULT_MAX_PAGES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("max depth {0} exceeds the limit of {MAX_DEPTH_LIMIT}")]
    DepthOutOfRange(u32),
    #[error("max pages must be at least 1")]
    NoPages,
    #[error("too many exclude patterns ({0}, max {MAX_EXCLUDE_PATTERNS})")]
    TooManyPatterns(usize),
    #[error("exclude pattern longer than {MAX_PATTERN_LEN} characters: {0}")]
    PatternTooLong(String),
    #[error("invalid exclude pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// How a user-entered seed should be turned into a crawlable URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedUrl {
    /// The input already carried an http(s) scheme.
    Ready(Url),
    /// No scheme: try `https` first, fall back to `http`.
    Probe { https: Url, http: Url },
}

pub fn parse_seed(raw: &str) -> Result<SeedUrl, ScopeError> {
    let trimmed = raw.trim();
    let invalid = |message: String| ScopeError::InvalidUrl {
        url: trimmed.to_string(),
        message,
    };
    if trimmed.is_empty() {
        return Err(invalid("empty url".to_string()));
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        let url = Url::parse(trimmed).map_err(|err| invalid(err.to_string()))?;
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        return Ok(SeedUrl::Ready(url));
    }
    let https = Url::parse(&format!("https://{trimmed}")).map_err(|err| invalid(err.to_string()))?;
    let http = Url::parse(&format!("http://{trimmed}")).map_err(|err| invalid(err.to_string()))?;
    Ok(SeedUrl::Probe { https, http })
}

/// A user exclusion rule, matched against the URL path.
#[derive(Debug, Clone)]
pub enum ExcludePattern {
    /// Plain substring containment.
    Substring(String),
    /// `*` wildcards, anchored at the start of the path.
    Wildcard { source: String, regex: Regex },
}

impl ExcludePattern {
    pub fn parse(pattern: &str) -> Result<Self, ScopeError> {
        if pattern.chars().count() > MAX_PATTERN_LEN {
            return Err(ScopeError::PatternTooLong(pattern.to_string()));
        }
        if !pattern.contains('*') {
            return Ok(ExcludePattern::Substring(pattern.to_string()));
        }
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^{body}")).map_err(|err| ScopeError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        Ok(ExcludePattern::Wildcard {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            ExcludePattern::Substring(needle) => path.contains(needle.as_str()),
            ExcludePattern::Wildcard { regex, .. } => regex.is_match(path),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExcludePattern::Substring(needle) => needle,
            ExcludePattern::Wildcard { source, .. } => source,
        }
    }
}

/// Immutable admission rules for one crawl.
#[derive(Debug, Clone)]
pub struct CrawlScope {
    base_url: Url,
    base_domain: String,
    max_depth: u32,
    max_pages: usize,
    same_domain_only: bool,
    include_subdomains: bool,
    exclude_patterns: Vec<ExcludePattern>,
}

impl CrawlScope {
    pub fn builder(base_url: Url) -> CrawlScopeBuilder {
        CrawlScopeBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn same_domain_only(&self) -> bool {
        self.same_domain_only
    }

    pub fn include_subdomains(&self) -> bool {
        self.include_subdomains
    }

    pub fn exclude_patterns(&self) -> &[ExcludePattern] {
        &self.exclude_patterns
    }

    /// Admission predicate for a crawl target.
    pub fn should_crawl(&self, url: &Url, depth: u32, pages_processed: usize) -> bool {
        if depth > self.max_depth {
            return false;
        }
        if pages_processed >= self.max_pages {
            return false;
        }
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        if !self.admits_domain(url) {
            return false;
        }
        let path = url.path();
        if self.exclude_patterns.iter().any(|p| p.matches(path)) {
            return false;
        }
        !is_excluded_path(path)
    }

    pub fn admits_domain(&self, url: &Url) -> bool {
        if !self.same_domain_only {
            return true;
        }
        let Some(domain) = netloc(url) else {
            return false;
        };
        if self.include_subdomains {
            domain == self.base_domain || domain.ends_with(&format!(".{}", self.base_domain))
        } else {
            domain == self.base_domain
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlScopeBuilder {
    base_url: Url,
    max_depth: u32,
    max_pages: usize,
    same_domain_only: bool,
    include_subdomains: bool,
    exclude_patterns: Vec<String>,
}

impl CrawlScopeBuilder {
    fn new(base_url: Url) -> Self {
        Self {
            base_url,
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            same_domain_only: true,
            include_subdomains: false,
            exclude_patterns: Vec::new(),
        }
    }

    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn same_domain_only(mut self, enabled: bool) -> Self {
        self.same_domain_only = enabled;
        self
    }

    pub fn include_subdomains(mut self, enabled: bool) -> Self {
        self.include_subdomains = enabled;
        self
    }

    /// Blank entries are dropped; surrounding whitespace is trimmed.
    pub fn exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    pub fn build(self) -> Result<CrawlScope, ScopeError> {
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ScopeError::DepthOutOfRange(self.max_depth));
        }
        if self.max_pages == 0 {
            return Err(ScopeError::NoPages);
        }
        if self.exclude_patterns.len() > MAX_EXCLUDE_PATTERNS {
            return Err(ScopeError::TooManyPatterns(self.exclude_patterns.len()));
        }
        let base_domain = netloc(&self.base_url).ok_or_else(|| ScopeError::InvalidUrl {
            url: self.base_url.to_string(),
            message: "missing host".to_string(),
        })?;
        let exclude_patterns = self
            .exclude_patterns
            .iter()
            .map(|p| ExcludePattern::parse(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CrawlScope {
            base_url: self.base_url,
            base_domain,
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            same_domain_only: self.same_domain_only,
            include_subdomains: self.include_subdomains,
            exclude_patterns,
        })
    }
}
