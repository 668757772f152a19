use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use mirror_core::{
    extract_css_urls, mime_for_extension, url_extension, PathMapper, ProgressUpdate,
    ResourceCategory,
};
use mirror_logging::{mirror_debug, mirror_info, mirror_warn};
use url::Url;

use crate::control::{Cancelled, RunControl};
use crate::fetch::{Fetcher, ProgressSink};
use crate::persist::write_bytes;
use crate::policy::ResourcePolicy;
use crate::rewrite::ContentProcessor;
use crate::{EngineEvent, UrlError};

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub downloaded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub bytes_written: u64,
    pub errors: Vec<UrlError>,
}

/// Fetches admitted assets one at a time and writes them where the path
/// mapper says. Stylesheets are rewritten, and the assets they reference are
/// queued behind the original set.
pub struct Downloader {
    fetcher: Arc<dyn Fetcher>,
    mapper: PathMapper,
    policy: ResourcePolicy,
    processor: ContentProcessor,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn Fetcher>, mapper: PathMapper, policy: ResourcePolicy) -> Self {
        let processor = ContentProcessor::new()
            .with_mapper(mapper.clone())
            .with_resource_policy(policy.clone());
        Self {
            fetcher,
            mapper,
            policy,
            processor,
        }
    }

    pub async fn download_all(
        &self,
        resources: &[Url],
        sources: &BTreeMap<Url, Url>,
        sink: &dyn ProgressSink,
        control: &RunControl,
    ) -> Result<DownloadStats, Cancelled> {
        let mut stats = DownloadStats::default();
        let mut queue: VecDeque<Url> = VecDeque::new();
        let mut seen: HashSet<Url> = HashSet::new();
        for url in resources {
            if seen.insert(url.clone()) {
                queue.push_back(url.clone());
            }
        }
        let mut nested_sources: BTreeMap<Url, Url> = BTreeMap::new();
        let mut done = 0usize;

        while let Some(url) = queue.pop_front() {
            control.checkpoint().await?;

            match self.policy.decide(&url) {
                Err(reason) => {
                    mirror_debug!("Skipping resource {}: {}", url, reason);
                    stats.skipped += 1;
                }
                Ok(category) => {
                    let source = sources.get(&url).or_else(|| nested_sources.get(&url));
                    let nested = self
                        .download_one(&url, category, source, &mut stats, control)
                        .await?;
                    for nested_url in nested {
                        if seen.insert(nested_url.clone()) {
                            nested_sources.insert(nested_url.clone(), url.clone());
                            queue.push_back(nested_url);
                        }
                    }
                }
            }

            done += 1;
            let total = done + queue.len();
            let percent = (done * 100 / total.max(1)).min(100) as u8;
            sink.emit(EngineEvent::Progress(ProgressUpdate::percent(
                percent,
                format!("Downloaded {done}/{total}: {url}"),
            )));
        }

        sink.emit(EngineEvent::Progress(ProgressUpdate::percent(100, "done")));
        mirror_info!(
            "Downloads finished: {} written, {} failed, {} skipped, {} bytes",
            stats.downloaded,
            stats.failed,
            stats.skipped,
            stats.bytes_written
        );
        Ok(stats)
    }

    /// Returns asset URLs found inside a downloaded stylesheet.
    async fn download_one(
        &self,
        url: &Url,
        category: ResourceCategory,
        source: Option<&Url>,
        stats: &mut DownloadStats,
        control: &RunControl,
    ) -> Result<Vec<Url>, Cancelled> {
        let fetched = self.fetcher.fetch(url).await;
        if control.is_cancelled() {
            return Err(Cancelled);
        }
        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(err) => {
                match source {
                    Some(page) => mirror_warn!("Failed to download {} (from {}): {}", url, page, err),
                    None => mirror_warn!("Failed to download {}: {}", url, err),
                }
                stats.failed += 1;
                stats.errors.push(UrlError::new(url.as_str(), err.to_string()));
                return Ok(Vec::new());
            }
        };

        let mime = resolve_mime(fetched.metadata.mime(), url);
        let path = self.mapper.path_for_resource_in(category, url, Some(&mime));

        let mut nested = Vec::new();
        let bytes = if category == ResourceCategory::Styles || mime == "text/css" {
            match String::from_utf8(fetched.bytes) {
                Ok(css) => {
                    nested = extract_css_urls(&css, url)
                        .into_iter()
                        .filter(|u| matches!(u.scheme(), "http" | "https"))
                        .collect();
                    self.processor
                        .process_stylesheet(&css, url, &path)
                        .into_bytes()
                }
                Err(err) => err.into_bytes(),
            }
        } else {
            fetched.bytes
        };

        match write_bytes(&path, &bytes) {
            Ok(written) => {
                mirror_debug!("Saved {} to {}", url, written.display());
                stats.downloaded += 1;
                stats.bytes_written += bytes.len() as u64;
            }
            Err(err) => {
                mirror_warn!("Failed to save {}: {}", url, err);
                stats.failed += 1;
                stats.errors.push(UrlError::new(url.as_str(), err.to_string()));
            }
        }
        Ok(nested)
    }
}

/// Response header, then the extension table, then a generic binary type.
fn resolve_mime(header_mime: Option<String>, url: &Url) -> String {
    header_mime
        .filter(|m| !m.is_empty())
        .or_else(|| {
            url_extension(url)
                .and_then(|ext| mime_for_extension(&ext))
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_falls_back_through_extension_table() {
        let url = Url::parse("https://example.com/a/logo.png").unwrap();
        assert_eq!(resolve_mime(Some("image/webp".into()), &url), "image/webp");
        assert_eq!(resolve_mime(None, &url), "image/png");
        let bare = Url::parse("https://example.com/blob").unwrap();
        assert_eq!(resolve_mime(None, &bare), FALLBACK_MIME);
    }
}
