//! URL → local path mapping for the offline mirror.
//!
//! Pages land at `<root>/<host>/<segments…>/index.html`, resources under
//! `<root>/<resource root>/<category>/<host>/<segments…>/<file>`. Every
//! function here is pure: the same URL under the same mapper always maps to
//! the same path, which is what lets the content processor and the downloader
//! agree on file locations without sharing state.

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use url::Url;

use crate::category::{extension_for_mime, is_page_path, path_extension, ResourceCategory};

pub const DEFAULT_RESOURCE_ROOT: &str = "__res__";
/// Upper bound, in bytes, for a single cleaned path segment.
pub const MAX_SEGMENT_LEN: usize = 80;
pub const PLACEHOLDER_SEGMENT: &str = "file";
pub const PAGE_FILE_NAME: &str = "index.html";
const FALLBACK_EXTENSION: &str = ".bin";
const MISSING_PAGE_HOST: &str = "root";
const MISSING_RESOURCE_HOST: &str = "ext";
const RESOURCE_INDEX_NAME: &str = "index";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapper {
    output_root: PathBuf,
    resource_root: String,
}

impl PathMapper {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            resource_root: DEFAULT_RESOURCE_ROOT.to_string(),
        }
    }

    pub fn with_resource_root(mut self, name: impl Into<String>) -> Self {
        let name = clean_segment(&name.into());
        self.resource_root = name;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn resource_root(&self) -> &str {
        &self.resource_root
    }

    /// `<root>/<host>/<segments…>/index.html`; query and fragment are ignored.
    pub fn path_for_page(&self, url: &Url) -> PathBuf {
        let host = host_segment(url).unwrap_or_else(|| MISSING_PAGE_HOST.to_string());
        let mut path = self.output_root.join(host);
        for segment in clean_path_segments(url) {
            path.push(segment);
        }
        path.push(PAGE_FILE_NAME);
        path
    }

    /// Resource path without a category directory:
    /// `<root>/<resource root>/<host>/<dirs…>/<file>`.
    pub fn path_for_resource(
        &self,
        url: &Url,
        mime_hint: Option<&str>,
        _source_page: Option<&Url>,
    ) -> PathBuf {
        self.resource_path(None, url, mime_hint)
    }

    /// Resource path namespaced by category, the layout written to disk:
    /// `<root>/<resource root>/<category>/<host>/<dirs…>/<file>`.
    pub fn path_for_resource_in(
        &self,
        category: ResourceCategory,
        url: &Url,
        mime_hint: Option<&str>,
    ) -> PathBuf {
        self.resource_path(Some(category), url, mime_hint)
    }

    fn resource_path(
        &self,
        category: Option<ResourceCategory>,
        url: &Url,
        mime_hint: Option<&str>,
    ) -> PathBuf {
        let host = host_segment(url).unwrap_or_else(|| MISSING_RESOURCE_HOST.to_string());
        let mut segments = clean_path_segments(url);
        let file_name = segments
            .pop()
            .unwrap_or_else(|| RESOURCE_INDEX_NAME.to_string());

        let file_name = if path_extension(&file_name).is_some() {
            file_name
        } else {
            let ext = mime_hint
                .and_then(extension_for_mime)
                .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
            bound_length(&format!("{file_name}{ext}"), MAX_SEGMENT_LEN)
        };

        let mut path = self.output_root.join(&self.resource_root);
        if let Some(category) = category {
            path.push(category.dir_name());
        }
        path.push(host);
        for segment in segments {
            path.push(segment);
        }
        path.push(file_name);
        path
    }

    /// Local path a same-site target would be written to: as a page when
    /// `is_page` is set or the path looks like a page, else as a resource.
    pub fn path_for_target(&self, url: &Url, is_page: bool) -> PathBuf {
        if is_page || is_page_path(url.path()) {
            self.path_for_page(url)
        } else {
            self.path_for_resource_in(ResourceCategory::from_url(url), url, None)
        }
    }

    /// Link from the page `from_page` to `to`, relative to the directory
    /// holding the page's `index.html`. Foreign hosts stay absolute.
    pub fn rel_href(&self, from_page: &Url, to: &Url, is_page: bool) -> String {
        if !same_site(from_page, to) {
            return to.to_string();
        }
        let from_path = self.path_for_page(from_page);
        let to_path = self.path_for_target(to, is_page);
        let from_dir = from_path.parent().unwrap_or(&self.output_root);
        relative_path(from_dir, &to_path)
    }
}

/// Hosts compare case-insensitively and ignore a leading `www.`.
pub fn same_site(a: &Url, b: &Url) -> bool {
    fn site(url: &Url) -> String {
        let netloc = netloc(url).unwrap_or_default().to_ascii_lowercase();
        match netloc.strip_prefix("www.") {
            Some(rest) => rest.to_string(),
            None => netloc,
        }
    }
    site(a) == site(b)
}

/// `host[:port]` as written in the URL authority, default ports omitted.
pub fn netloc(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Directory name used for the URL's host.
pub fn host_segment(url: &Url) -> Option<String> {
    netloc(url).map(|n| clean_segment(&n))
}

fn clean_path_segments(url: &Url) -> Vec<String> {
    url.path()
        .split('/')
        .filter(|part| !part.is_empty())
        .map(clean_segment)
        .collect()
}

/// Makes one path segment safe on the most restrictive supported filesystem.
///
/// The result is never empty, contains none of `< > : " | ? *`, slashes or
/// control characters, has no leading/trailing whitespace or dots, and is at
/// most [`MAX_SEGMENT_LEN`] bytes.
pub fn clean_segment(segment: &str) -> String {
    if segment.is_empty() {
        return PLACEHOLDER_SEGMENT.to_string();
    }

    let decoded = urlencoding::decode_binary(segment.as_bytes());
    let mut cleaned = String::from_utf8_lossy(&decoded).into_owned();

    // Nested URLs (`u_https://…`) would otherwise expand into deep trees.
    let lower = cleaned.to_ascii_lowercase();
    if lower.contains("http://") || lower.contains("https://") {
        cleaned = format!("url-{}", short_hash(&cleaned, 12));
    }
    let cleaned = cleaned.replace(['\\', '/'], "_");

    let cleaned: String = cleaned
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let mut cleaned = cleaned
        .trim_matches(|c: char| c.is_whitespace() || c == '.')
        .to_string();

    if cleaned.is_empty() {
        return PLACEHOLDER_SEGMENT.to_string();
    }
    if is_reserved_windows_name(&cleaned) {
        let stem_len = cleaned.find('.').unwrap_or(cleaned.len());
        cleaned.insert(stem_len, '_');
    }
    bound_length(&cleaned, MAX_SEGMENT_LEN)
}

/// Extra-strict variant used when the filesystem rejected a cleaned name:
/// only ASCII alphanumerics, `-`, `_` and `.` survive.
pub fn strict_file_name(name: &str) -> String {
    let strict: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let strict = strict.trim_matches('.').to_string();
    if strict.is_empty() {
        return PLACEHOLDER_SEGMENT.to_string();
    }
    bound_length(&strict, MAX_SEGMENT_LEN)
}

/// Truncates to `max` bytes, keeping the extension and appending a hash of
/// the full name so distinct long names stay distinct.
fn bound_length(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    let hash = short_hash(name, 8);
    let ext = path_extension(name)
        .filter(|ext| ext.len() <= 16)
        .map(|_| &name[name.rfind('.').unwrap_or(name.len())..])
        .unwrap_or("");
    let stem = &name[..name.len() - ext.len()];
    let budget = max.saturating_sub(ext.len() + hash.len() + 1);
    let mut end = budget.min(stem.len());
    while end > 0 && !stem.is_char_boundary(end) {
        end -= 1;
    }
    let stem = stem[..end].trim_end_matches(|c: char| c.is_whitespace() || c == '.');
    if stem.is_empty() {
        format!("{hash}{ext}")
    } else {
        format!("{stem}-{hash}{ext}")
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}' | '\u{7F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem))
}

fn short_hash(input: &str, hex_len: usize) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(hex_len + 1);
    for byte in digest.iter() {
        if hex.len() >= hex_len {
            break;
        }
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex.truncate(hex_len);
    hex
}

/// Lexical relative path from directory `from_dir` to `to`, always with
/// forward slashes. Both paths are expected under the same root.
pub fn relative_path(from_dir: &Path, to: &Path) -> String {
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &to[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    if parts.is_empty() {
        return ".".to_string();
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_has_requested_length() {
        assert_eq!(short_hash("abc", 12).len(), 12);
        assert_eq!(short_hash("abc", 8).len(), 8);
        assert_eq!(short_hash("abc", 8), short_hash("abc", 8));
    }

    #[test]
    fn bound_length_keeps_extension() {
        let long = format!("{}.png", "a".repeat(200));
        let bounded = bound_length(&long, MAX_SEGMENT_LEN);
        assert!(bounded.len() <= MAX_SEGMENT_LEN);
        assert!(bounded.ends_with(".png"));
    }

    #[test]
    fn reserved_names_are_patched() {
        assert_eq!(clean_segment("CON"), "CON_");
        assert_eq!(clean_segment("nul.txt"), "nul_.txt");
    }

    #[test]
    fn relative_path_between_siblings() {
        let from = Path::new("/out/site/a");
        let to = Path::new("/out/site/b/index.html");
        assert_eq!(relative_path(from, to), "../b/index.html");
    }
}
