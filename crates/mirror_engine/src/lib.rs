//! Mirror engine: fetching, crawling, rewriting and writing the offline copy.
mod control;
mod crawler;
mod decode;
mod downloader;
mod engine;
mod fetch;
mod launcher;
mod links;
mod persist;
mod pipeline;
mod policy;
mod report;
mod rewrite;
mod types;

pub use control::{Cancelled, RunControl};
pub use crawler::{resolve_seed_url, CrawlOutput, CrawlStats, Crawler, PageRecord};
pub use decode::{decode_html, DecodedHtml};
pub use downloader::{DownloadStats, Downloader};
pub use engine::EngineHandle;
pub use fetch::{
    ChannelProgressSink, FetchSettings, Fetcher, NullProgressSink, ProgressSink, ReqwestFetcher,
    DEFAULT_USER_AGENT,
};
pub use launcher::write_launcher;
pub use links::{DiscoveredRefs, LinkExtractor};
pub use persist::{
    ensure_output_dir, remove_output_tree, unique_output_dir, write_bytes, AtomicFileWriter,
    PersistError,
};
pub use pipeline::{default_output_dir, MirrorConfig, MirrorPipeline, PipelineError};
pub use policy::{ResourcePolicy, SkipReason};
pub use report::{write_report, MirrorReport, REPORT_FILE_NAME};
pub use rewrite::ContentProcessor;
pub use types::{EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, UrlError};
