use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mirror_core::RunSummary;
use serde::Serialize;

use crate::crawler::CrawlStats;
use crate::downloader::DownloadStats;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::UrlError;

pub const REPORT_FILE_NAME: &str = "mirror-report.json";

/// Summary of a finished run, also written next to the mirror as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct MirrorReport {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages_discovered: usize,
    pub pages_processed: usize,
    pub pages_written: usize,
    pub resources_found: usize,
    pub resources_downloaded: usize,
    pub resources_failed: usize,
    pub resources_skipped: usize,
    pub bytes_written: u64,
    pub crawl_seconds: f64,
    pub pages_per_second: f64,
    pub errors: Vec<UrlError>,
}

impl MirrorReport {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        base_url: String,
        output_dir: PathBuf,
        started_at: DateTime<Utc>,
        crawl: &CrawlStats,
        pages_written: usize,
        downloads: &DownloadStats,
        mut errors: Vec<UrlError>,
    ) -> Self {
        errors.extend(downloads.errors.iter().cloned());
        Self {
            base_url,
            output_dir,
            started_at,
            finished_at: Utc::now(),
            pages_discovered: crawl.pages_discovered,
            pages_processed: crawl.pages_processed,
            pages_written,
            resources_found: crawl.resources_found,
            resources_downloaded: downloads.downloaded,
            resources_failed: downloads.failed,
            resources_skipped: downloads.skipped,
            bytes_written: downloads.bytes_written,
            crawl_seconds: crawl.elapsed.as_secs_f64(),
            pages_per_second: crawl.pages_per_second,
            errors,
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            pages_written: self.pages_written,
            resources_downloaded: self.resources_downloaded,
            resources_failed: self.resources_failed,
            errors: self.errors.len(),
        }
    }
}

pub fn write_report(dir: &Path, report: &MirrorReport) -> Result<PathBuf, PersistError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|err| PersistError::Io(std::io::Error::other(err)))?;
    AtomicFileWriter::new(dir.to_path_buf()).write(REPORT_FILE_NAME, &json)
}
