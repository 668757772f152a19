//! Mirror core: pure URL/path rules, crawl scope, CSS scanning and the run
//! progress state machine. Nothing in here performs IO.
mod category;
mod css;
mod effect;
mod msg;
mod pathmap;
mod progress;
mod scope;
mod state;
mod update;
mod view_model;

pub use category::{
    extension_for_mime, is_excluded_extension, is_excluded_path, is_page_path,
    mime_for_extension, path_extension, url_extension, ResourceCategory, ResourceToggles,
    EXCLUDED_EXTENSIONS, PAGE_EXTENSIONS,
};
pub use css::{css_references, extract_css_urls, is_skippable_css_value, rewrite_css_urls};
pub use effect::Effect;
pub use msg::Msg;
pub use pathmap::{
    clean_segment, host_segment, netloc, relative_path, same_site, strict_file_name, PathMapper,
    DEFAULT_RESOURCE_ROOT, MAX_SEGMENT_LEN, PAGE_FILE_NAME, PLACEHOLDER_SEGMENT,
};
pub use progress::{Phase, ProgressUpdate};
pub use scope::{
    parse_seed, CrawlScope, CrawlScopeBuilder, ExcludePattern, ScopeError, SeedUrl,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES, MAX_DEPTH_LIMIT, MAX_EXCLUDE_PATTERNS, MAX_PATTERN_LEN,
};
pub use state::{AppState, RunResultKind, RunState, RunSummary};
pub use update::update;
pub use view_model::RunViewModel;
