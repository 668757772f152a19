use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mirror_core::{parse_seed, CrawlScope, ProgressUpdate, ScopeError, SeedUrl};
use mirror_logging::{mirror_debug, mirror_info, mirror_warn};
use url::Url;

use crate::control::{Cancelled, RunControl};
use crate::decode::decode_html;
use crate::fetch::{Fetcher, ProgressSink};
use crate::links::LinkExtractor;
use crate::{EngineEvent, FailureKind, UrlError};

/// Turns user input into the crawl's base URL. Scheme-less input is probed
/// over https first and falls back to http.
pub async fn resolve_seed_url(raw: &str, fetcher: &dyn Fetcher) -> Result<Url, ScopeError> {
    match parse_seed(raw)? {
        SeedUrl::Ready(url) => Ok(url),
        SeedUrl::Probe { https, http } => match fetcher.probe(&https).await {
            Ok(final_url) => {
                mirror_debug!("Seed {} answered over https as {}", raw, final_url);
                Ok(final_url)
            }
            Err(err) => {
                mirror_info!("https probe for {} failed ({}), using http", raw, err);
                Ok(http)
            }
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CrawlTarget {
    url: Url,
    depth: u32,
}

/// A fetched HTML page, decoded to UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub url: Url,
    pub html: String,
    pub depth: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStats {
    pub pages_discovered: usize,
    pub pages_processed: usize,
    pub resources_found: usize,
    pub errors: usize,
    pub elapsed: Duration,
    pub pages_per_second: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CrawlOutput {
    /// In the order they were fetched.
    pub pages: Vec<PageRecord>,
    /// Resource URL to the page that referenced it last.
    pub resources: BTreeMap<Url, Url>,
    pub errors: Vec<UrlError>,
    pub stats: CrawlStats,
}

/// Breadth-first, one request at a time.
pub struct Crawler {
    scope: CrawlScope,
    fetcher: Arc<dyn Fetcher>,
    extractor: LinkExtractor,
}

impl Crawler {
    pub fn new(scope: CrawlScope, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            scope,
            fetcher,
            extractor: LinkExtractor::new(),
        }
    }

    pub fn scope(&self) -> &CrawlScope {
        &self.scope
    }

    pub async fn crawl(
        &self,
        sink: &dyn ProgressSink,
        control: &RunControl,
    ) -> Result<CrawlOutput, Cancelled> {
        let started = Instant::now();
        let mut output = CrawlOutput::default();
        let mut queue: VecDeque<CrawlTarget> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();

        let base = self.scope.base_url().clone();
        visited.insert(base.to_string());
        queue.push_back(CrawlTarget {
            url: base,
            depth: 0,
        });
        output.stats.pages_discovered = 1;

        while let Some(target) = queue.pop_front() {
            control.checkpoint().await?;

            let processed = output.stats.pages_processed;
            if processed >= self.scope.max_pages() {
                mirror_info!("Page budget of {} reached", self.scope.max_pages());
                break;
            }
            if !self.scope.should_crawl(&target.url, target.depth, processed) {
                mirror_debug!("Skipping {} at depth {}", target.url, target.depth);
                continue;
            }

            sink.emit(EngineEvent::Progress(ProgressUpdate::status(
                format!(
                    "Crawling ({}/{})",
                    processed + 1,
                    self.scope.max_pages()
                ),
                Some(target.url.to_string()),
            )));

            let fetched = self.fetcher.fetch(&target.url).await;
            if control.is_cancelled() {
                return Err(Cancelled);
            }

            let fetched = match fetched {
                Ok(fetched) => fetched,
                Err(err) => {
                    if matches!(err.kind, FailureKind::UnsupportedContentType { .. }) {
                        mirror_debug!("Ignoring non-HTML response from {}", target.url);
                    } else {
                        mirror_warn!("Failed to fetch {}: {}", target.url, err);
                        output
                            .errors
                            .push(UrlError::new(target.url.as_str(), err.to_string()));
                    }
                    continue;
                }
            };
            if !fetched.metadata.is_html() {
                mirror_debug!("Ignoring non-HTML response from {}", target.url);
                continue;
            }

            let decoded = decode_html(&fetched.bytes, fetched.metadata.content_type.as_deref());
            if decoded.had_errors {
                mirror_debug!(
                    "Lossy decode of {} as {}",
                    target.url,
                    decoded.encoding_label
                );
            }
            output.stats.pages_processed += 1;
            mirror_info!(
                "Fetched page {} (depth {}, {} bytes)",
                target.url,
                target.depth,
                fetched.metadata.byte_len
            );

            let collect_links = target.depth < self.scope.max_depth();
            let refs = self
                .extractor
                .extract(&decoded.html, &target.url, collect_links);

            for link in refs.links {
                if visited.contains(link.as_str()) {
                    continue;
                }
                let depth = target.depth + 1;
                if !self
                    .scope
                    .should_crawl(&link, depth, output.stats.pages_processed)
                {
                    continue;
                }
                visited.insert(link.to_string());
                queue.push_back(CrawlTarget { url: link, depth });
                output.stats.pages_discovered += 1;
            }

            for resource in refs.resources {
                output.resources.insert(resource, target.url.clone());
            }

            output.pages.push(PageRecord {
                url: target.url,
                html: decoded.html,
                depth: target.depth,
            });
        }

        let elapsed = started.elapsed();
        output.stats.resources_found = output.resources.len();
        output.stats.errors = output.errors.len();
        output.stats.elapsed = elapsed;
        output.stats.pages_per_second = if elapsed.as_secs_f64() > 0.0 {
            output.stats.pages_processed as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        mirror_info!(
            "Crawl finished: {} pages, {} resources, {} errors in {:.1}s",
            output.stats.pages_processed,
            output.stats.resources_found,
            output.stats.errors,
            elapsed.as_secs_f64()
        );
        Ok(output)
    }
}
