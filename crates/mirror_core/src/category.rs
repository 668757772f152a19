use std::fmt;

use url::Url;

/// Extensions never crawled, localized or downloaded: archives, executables,
/// office documents and disc images.
pub const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".rar", ".tar", ".gz", ".7z", ".exe", ".dmg", ".iso", ".msi", ".deb", ".rpm",
    ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
];

/// Extensions that look like server-rendered pages rather than assets.
pub const PAGE_EXTENSIONS: &[&str] = &[
    ".html", ".htm", ".xhtml", ".php", ".asp", ".aspx", ".jsp",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".bmp", ".avif",
];
const STYLE_EXTENSIONS: &[&str] = &[".css"];
const SCRIPT_EXTENSIONS: &[&str] = &[".js", ".mjs"];
const FONT_EXTENSIONS: &[&str] = &[".woff", ".woff2", ".ttf", ".otf", ".eot"];
const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".webm", ".ogg", ".ogv", ".mov", ".avi", ".m4v", ".mp3", ".wav",
];

/// Storage namespace and inclusion toggle for a downloaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceCategory {
    Images,
    Styles,
    Scripts,
    Fonts,
    Videos,
    Other,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 6] = [
        ResourceCategory::Images,
        ResourceCategory::Styles,
        ResourceCategory::Scripts,
        ResourceCategory::Fonts,
        ResourceCategory::Videos,
        ResourceCategory::Other,
    ];

    /// Classify a lowercase extension including the leading dot.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            ResourceCategory::Images
        } else if STYLE_EXTENSIONS.contains(&ext) {
            ResourceCategory::Styles
        } else if SCRIPT_EXTENSIONS.contains(&ext) {
            ResourceCategory::Scripts
        } else if FONT_EXTENSIONS.contains(&ext) {
            ResourceCategory::Fonts
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            ResourceCategory::Videos
        } else {
            ResourceCategory::Other
        }
    }

    pub fn from_url(url: &Url) -> Self {
        url_extension(url)
            .map(|ext| Self::from_extension(&ext))
            .unwrap_or(ResourceCategory::Other)
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            ResourceCategory::Images => "images",
            ResourceCategory::Styles => "styles",
            ResourceCategory::Scripts => "scripts",
            ResourceCategory::Fonts => "fonts",
            ResourceCategory::Videos => "videos",
            ResourceCategory::Other => "other",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Per-category inclusion switches for the downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceToggles {
    pub images: bool,
    pub styles: bool,
    pub scripts: bool,
    pub fonts: bool,
    pub videos: bool,
}

impl Default for ResourceToggles {
    fn default() -> Self {
        Self {
            images: true,
            styles: true,
            scripts: true,
            fonts: true,
            videos: false,
        }
    }
}

impl ResourceToggles {
    pub fn all() -> Self {
        Self {
            videos: true,
            ..Self::default()
        }
    }

    /// `Other` has no switch and is always allowed.
    pub fn allows(&self, category: ResourceCategory) -> bool {
        match category {
            ResourceCategory::Images => self.images,
            ResourceCategory::Styles => self.styles,
            ResourceCategory::Scripts => self.scripts,
            ResourceCategory::Fonts => self.fonts,
            ResourceCategory::Videos => self.videos,
            ResourceCategory::Other => true,
        }
    }
}

/// Lowercase extension (with the dot) of the last segment of a path.
pub fn path_extension(path: &str) -> Option<String> {
    let last = path.rsplit('/').next().unwrap_or(path);
    let idx = last.rfind('.')?;
    // ".htaccess" style names have no extension.
    if idx == 0 || idx + 1 == last.len() {
        return None;
    }
    Some(last[idx..].to_ascii_lowercase())
}

pub fn url_extension(url: &Url) -> Option<String> {
    path_extension(url.path())
}

pub fn is_excluded_extension(ext: &str) -> bool {
    EXCLUDED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

pub fn is_excluded_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    EXCLUDED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Pages are paths without an extension or with a server-page extension.
pub fn is_page_path(path: &str) -> bool {
    match path_extension(path) {
        None => true,
        Some(ext) => PAGE_EXTENSIONS.contains(&ext.as_str()),
    }
}

pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        ".html" | ".htm" => "text/html",
        ".xhtml" => "application/xhtml+xml",
        ".css" => "text/css",
        ".js" | ".mjs" => "application/javascript",
        ".json" => "application/json",
        ".webmanifest" => "application/manifest+json",
        ".xml" => "application/xml",
        ".txt" => "text/plain",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".svg" => "image/svg+xml",
        ".webp" => "image/webp",
        ".ico" => "image/x-icon",
        ".bmp" => "image/bmp",
        ".avif" => "image/avif",
        ".woff" => "font/woff",
        ".woff2" => "font/woff2",
        ".ttf" => "font/ttf",
        ".otf" => "font/otf",
        ".eot" => "application/vnd.ms-fontobject",
        ".mp4" | ".m4v" => "video/mp4",
        ".webm" => "video/webm",
        ".ogg" | ".ogv" => "video/ogg",
        ".mov" => "video/quicktime",
        ".mp3" => "audio/mpeg",
        ".wav" => "audio/wav",
        _ => return None,
    };
    Some(mime)
}

/// Extension to synthesize for a file that has none, from its MIME type.
pub fn extension_for_mime(content_type: &str) -> Option<String> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    let ext = match mime.as_str() {
        "text/css" => ".css",
        "application/javascript" | "text/javascript" | "application/x-javascript" => ".js",
        "text/html" | "application/xhtml+xml" => ".html",
        "application/json" => ".json",
        "application/manifest+json" => ".webmanifest",
        "image/svg+xml" => ".svg",
        "image/x-icon" | "image/vnd.microsoft.icon" => ".ico",
        "image/jpeg" => ".jpg",
        "font/woff" => ".woff",
        "font/woff2" => ".woff2",
        "font/ttf" => ".ttf",
        "font/otf" => ".otf",
        _ => {
            let subtype = mime.strip_prefix("image/")?;
            if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
                return None;
            }
            return Some(format!(".{subtype}"));
        }
    };
    Some(ext.to_string())
}
