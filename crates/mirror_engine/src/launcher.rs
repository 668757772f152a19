use std::fs;
use std::path::{Path, PathBuf};

use mirror_core::{host_segment, relative_path, PAGE_FILE_NAME};
use mirror_logging::{mirror_debug, mirror_info};
use url::Url;

use crate::persist::{AtomicFileWriter, PersistError};

/// Writes `<root>/index.html` redirecting to the mirrored start page.
///
/// Candidates, in order: the base host's `index.html`, the first
/// `index.html` in a sorted walk of the tree, the largest `.html`/`.htm`
/// file. Returns `None` and writes nothing when the tree has no page.
pub fn write_launcher(root: &Path, base_url: &Url) -> Result<Option<PathBuf>, PersistError> {
    let Some(target) = find_start_page(root, base_url)? else {
        mirror_info!("No page found under {}, launcher not written", root.display());
        return Ok(None);
    };
    let href = relative_path(root, &target);
    mirror_debug!("Launcher points at {}", href);

    let html = launcher_html(&href);
    let written = AtomicFileWriter::new(root.to_path_buf()).write(PAGE_FILE_NAME, &html)?;
    Ok(Some(written))
}

fn find_start_page(root: &Path, base_url: &Url) -> Result<Option<PathBuf>, PersistError> {
    let launcher = root.join(PAGE_FILE_NAME);

    if let Some(host) = host_segment(base_url) {
        let preferred = root.join(host).join(PAGE_FILE_NAME);
        if preferred.is_file() {
            return Ok(Some(preferred));
        }
    }

    let mut pages = Vec::new();
    collect_html_files(root, &mut pages)?;
    pages.retain(|(path, _)| *path != launcher);

    if let Some((path, _)) = pages
        .iter()
        .find(|(path, _)| path.file_name().is_some_and(|n| n == PAGE_FILE_NAME))
    {
        return Ok(Some(path.clone()));
    }

    let mut largest: Option<&(PathBuf, u64)> = None;
    for entry in &pages {
        let bigger = match largest {
            None => true,
            Some(best) => entry.1 > best.1,
        };
        if bigger {
            largest = Some(entry);
        }
    }
    Ok(largest.map(|(path, _)| path.clone()))
}

/// Depth-first, entries sorted by name, so the walk order is stable.
fn collect_html_files(dir: &Path, out: &mut Vec<(PathBuf, u64)>) -> Result<(), PersistError> {
    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());
    for entry in entries {
        let path = entry.path();
        let meta = entry.metadata()?;
        if meta.is_dir() {
            collect_html_files(&path, out)?;
        } else if is_html_file(&path) {
            out.push((path, meta.len()));
        }
    }
    Ok(())
}

fn is_html_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

fn launcher_html(href: &str) -> String {
    let escaped = href.replace('&', "&amp;").replace('"', "&quot;");
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta http-equiv=\"refresh\" content=\"0; url={escaped}\">\n\
         <title>Offline mirror</title>\n</head>\n<body>\n\
         <p><a href=\"{escaped}\">Open the mirrored site</a></p>\n</body>\n</html>\n"
    )
}
