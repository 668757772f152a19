use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use mirror_core::{
    netloc, CrawlScope, PathMapper, Phase, ProgressUpdate, ResourceToggles, ScopeError,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES, DEFAULT_RESOURCE_ROOT,
};
use mirror_logging::{mirror_error, mirror_info, mirror_warn};
use thiserror::Error;
use url::Url;

use crate::control::{Cancelled, RunControl};
use crate::crawler::{resolve_seed_url, CrawlStats, Crawler};
use crate::downloader::{DownloadStats, Downloader};
use crate::fetch::{FetchSettings, Fetcher, ProgressSink, ReqwestFetcher};
use crate::launcher::write_launcher;
use crate::persist::{
    ensure_output_dir, remove_output_tree, unique_output_dir, write_bytes, PersistError,
};
use crate::policy::ResourcePolicy;
use crate::report::{write_report, MirrorReport};
use crate::rewrite::ContentProcessor;
use crate::{EngineEvent, UrlError};

const DEFAULT_OUTPUT_PREFIX: &str = "captures_";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("run cancelled")]
    Cancelled,
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("invalid crawl settings: {0}")]
    Scope(ScopeError),
    #[error("output error: {0}")]
    Persist(#[from] PersistError),
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl From<Cancelled> for PipelineError {
    fn from(_: Cancelled) -> Self {
        PipelineError::Cancelled
    }
}

impl From<ScopeError> for PipelineError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::InvalidUrl { url, message } => PipelineError::InvalidUrl { url, message },
            other => PipelineError::Scope(other),
        }
    }
}

/// Everything one mirroring run needs.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub url: String,
    /// `None` mirrors into `captures_<domain>` in the working directory.
    pub output_dir: Option<PathBuf>,
    pub max_depth: u32,
    pub max_pages: usize,
    pub same_domain_only: bool,
    pub include_subdomains: bool,
    pub exclude_patterns: Vec<String>,
    pub resources: ResourceToggles,
    /// Only download assets hosted on the seed's domain.
    pub same_domain_resources: bool,
    /// Mirror just the seed page and its assets.
    pub single_page: bool,
    pub resource_root: String,
    pub base_href: Option<String>,
    pub fetch: FetchSettings,
    pub resource_max_bytes: u64,
}

impl MirrorConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output_dir: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            same_domain_only: true,
            include_subdomains: true,
            exclude_patterns: Vec::new(),
            resources: ResourceToggles::default(),
            same_domain_resources: true,
            single_page: false,
            resource_root: DEFAULT_RESOURCE_ROOT.to_string(),
            base_href: None,
            fetch: FetchSettings::default(),
            resource_max_bytes: FetchSettings::for_resources().max_bytes,
        }
    }

    fn resource_fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            allowed_content_types: Vec::new(),
            max_bytes: self.resource_max_bytes,
            ..self.fetch.clone()
        }
    }

    fn scope(&self, base_url: Url) -> Result<CrawlScope, ScopeError> {
        let max_depth = if self.single_page { 0 } else { self.max_depth };
        CrawlScope::builder(base_url)
            .max_depth(max_depth)
            .max_pages(self.max_pages)
            .same_domain_only(self.same_domain_only)
            .include_subdomains(self.include_subdomains)
            .exclude_patterns(&self.exclude_patterns)
            .build()
    }
}

/// `captures_<host>` with anything outside `[A-Za-z0-9_.-]` replaced.
pub fn default_output_dir(base_url: &Url) -> PathBuf {
    let domain = netloc(base_url).unwrap_or_default();
    let domain = domain.strip_prefix("www.").unwrap_or(&domain);
    let mut safe = String::with_capacity(domain.len());
    for c in domain.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            safe.push(c);
        } else if !safe.ends_with('_') {
            safe.push('_');
        }
    }
    if safe.is_empty() {
        safe.push_str("site");
    }
    PathBuf::from(format!("{DEFAULT_OUTPUT_PREFIX}{safe}"))
}

pub struct MirrorPipeline {
    config: MirrorConfig,
}

struct RunTotals {
    pages_written: usize,
    crawl: CrawlStats,
    downloads: DownloadStats,
    errors: Vec<UrlError>,
}

impl MirrorPipeline {
    pub fn new(config: MirrorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub async fn run(
        &self,
        sink: &dyn ProgressSink,
        control: &RunControl,
    ) -> Result<MirrorReport, PipelineError> {
        let pages = ReqwestFetcher::new(self.config.fetch.clone())
            .map_err(|err| PipelineError::Runtime(err.to_string()))?;
        let resources = ReqwestFetcher::new(self.config.resource_fetch_settings())
            .map_err(|err| PipelineError::Runtime(err.to_string()))?;
        self.run_with(Arc::new(pages), Arc::new(resources), sink, control)
            .await
    }

    /// Same as [`MirrorPipeline::run`] with caller-provided fetchers for
    /// pages and for assets.
    pub async fn run_with(
        &self,
        page_fetcher: Arc<dyn Fetcher>,
        resource_fetcher: Arc<dyn Fetcher>,
        sink: &dyn ProgressSink,
        control: &RunControl,
    ) -> Result<MirrorReport, PipelineError> {
        let started_at = Utc::now();
        enter_phase(sink, Phase::Preparing);

        let base_url = resolve_seed_url(&self.config.url, page_fetcher.as_ref()).await?;
        let scope = self.config.scope(base_url.clone())?;
        control.checkpoint().await?;

        let requested = self
            .config
            .output_dir
            .clone()
            .unwrap_or_else(|| default_output_dir(&base_url));
        let output_dir = unique_output_dir(&requested);
        ensure_output_dir(&output_dir)?;
        mirror_info!("Mirroring {} into {}", base_url, output_dir.display());

        let result = self
            .mirror_into(&output_dir, scope, page_fetcher, resource_fetcher, sink, control)
            .await;

        match result {
            Ok(totals) => {
                let report = MirrorReport::new(
                    base_url.to_string(),
                    output_dir,
                    started_at,
                    &totals.crawl,
                    totals.pages_written,
                    &totals.downloads,
                    totals.errors,
                );
                if let Err(err) = write_report(&report.output_dir, &report) {
                    mirror_warn!("Failed to write run report: {}", err);
                }
                sink.emit(EngineEvent::Progress(ProgressUpdate::percent(100, "Finished")));
                Ok(report)
            }
            Err(PipelineError::Cancelled) => {
                mirror_info!("Run cancelled, removing {}", output_dir.display());
                if let Err(err) = remove_output_tree(&output_dir) {
                    mirror_error!("Failed to remove {}: {}", output_dir.display(), err);
                }
                Err(PipelineError::Cancelled)
            }
            Err(err) => Err(err),
        }
    }

    async fn mirror_into(
        &self,
        output_dir: &Path,
        scope: CrawlScope,
        page_fetcher: Arc<dyn Fetcher>,
        resource_fetcher: Arc<dyn Fetcher>,
        sink: &dyn ProgressSink,
        control: &RunControl,
    ) -> Result<RunTotals, PipelineError> {
        let base_url = scope.base_url().clone();
        let mapper = PathMapper::new(output_dir).with_resource_root(&self.config.resource_root);
        let policy = ResourcePolicy::new(base_url.clone())
            .with_toggles(self.config.resources)
            .same_domain_only(self.config.same_domain_resources);

        enter_phase(sink, Phase::Crawling);
        let crawler = Crawler::new(scope, page_fetcher);
        let crawl = crawler.crawl(sink, control).await?;
        let mut errors = crawl.errors.clone();

        enter_phase(sink, Phase::Processing);
        let mut processor = ContentProcessor::new()
            .with_mapper(mapper.clone())
            .with_resource_policy(policy.clone());
        if let Some(base_href) = &self.config.base_href {
            processor = processor.with_base_href(base_href.clone());
        }
        let total = crawl.pages.len();
        let mut pages_written = 0usize;
        for (index, page) in crawl.pages.iter().enumerate() {
            control.checkpoint().await?;
            let html = processor.process_html(&page.html, &page.url);
            let path = mapper.path_for_page(&page.url);
            match write_bytes(&path, html.as_bytes()) {
                Ok(written) => {
                    pages_written += 1;
                    mirror_info!("Wrote page {} to {}", page.url, written.display());
                }
                Err(err) => {
                    mirror_warn!("Failed to write page {}: {}", page.url, err);
                    errors.push(UrlError::new(page.url.as_str(), err.to_string()));
                }
            }
            sink.emit(EngineEvent::Progress(ProgressUpdate::percent(
                Phase::Processing.scale(index + 1, total),
                format!("Processed page {}/{}", index + 1, total),
            )));
        }

        enter_phase(sink, Phase::Downloading);
        let resources: Vec<Url> = crawl.resources.keys().cloned().collect();
        let downloader = Downloader::new(resource_fetcher, mapper, policy);
        let banded = BandSink {
            inner: sink,
            phase: Phase::Downloading,
        };
        let downloads = downloader
            .download_all(&resources, &crawl.resources, &banded, control)
            .await?;

        control.checkpoint().await?;
        enter_phase(sink, Phase::Finishing);
        if let Err(err) = write_launcher(output_dir, &base_url) {
            mirror_warn!("Failed to write launcher page: {}", err);
        }

        Ok(RunTotals {
            pages_written,
            crawl: crawl.stats,
            downloads,
            errors,
        })
    }
}

/// Rescales a stage's own 0-100 percents into its phase band.
struct BandSink<'a> {
    inner: &'a dyn ProgressSink,
    phase: Phase,
}

impl ProgressSink for BandSink<'_> {
    fn emit(&self, event: EngineEvent) {
        let event = match event {
            EngineEvent::Progress(ProgressUpdate::Percent { percent, message }) => {
                EngineEvent::Progress(ProgressUpdate::percent(
                    self.phase.scale(usize::from(percent), 100),
                    message,
                ))
            }
            other => other,
        };
        self.inner.emit(event);
    }
}

fn enter_phase(sink: &dyn ProgressSink, phase: Phase) {
    mirror_info!("Phase: {}", phase.label());
    sink.emit(EngineEvent::PhaseChanged(phase));
    sink.emit(EngineEvent::Progress(ProgressUpdate::percent(
        phase.band().0,
        phase.label(),
    )));
}
