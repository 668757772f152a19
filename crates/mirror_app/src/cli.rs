use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use crate::settings::{LogTarget, MirrorSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Category {
    Images,
    Styles,
    Scripts,
    Fonts,
    Videos,
}

/// Mirror a website into a folder that can be browsed offline.
///
/// While running, type `p` to pause, `r` to resume and `c` (or Ctrl-C) to
/// cancel and discard the partial output.
#[derive(Debug, Parser)]
#[command(name = "site-mirror", version, about)]
pub struct Cli {
    /// Start URL; a bare host name is probed for https then http
    pub url: Option<String>,

    /// RON settings file; command-line flags override its values
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Write the effective settings to this RON file before running
    #[arg(long, value_name = "FILE")]
    pub save_settings: Option<PathBuf>,

    /// Output directory (default: captures_<domain>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum link depth from the start page (0-20)
    #[arg(short, long)]
    pub depth: Option<u32>,

    /// Maximum number of pages to mirror
    #[arg(short = 'n', long)]
    pub max_pages: Option<usize>,

    /// Mirror only the start page and its assets
    #[arg(long)]
    pub single_page: bool,

    /// Follow links to other domains
    #[arg(long)]
    pub follow_external: bool,

    /// Treat subdomains of the start host as foreign
    #[arg(long)]
    pub no_subdomains: bool,

    /// Skip URLs matching this glob (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Download assets hosted on other domains too
    #[arg(long)]
    pub external_resources: bool,

    /// Do not download this kind of asset (repeatable)
    #[arg(long, value_enum, value_name = "CATEGORY")]
    pub skip: Vec<Category>,

    /// Download audio and video files
    #[arg(long)]
    pub videos: bool,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Force a <base href> into every page
    #[arg(long)]
    pub base_href: Option<String>,

    #[arg(long, value_enum)]
    pub log: Option<LogTarget>,

    /// Log debug detail
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Overlays the flags that were given onto `settings`.
    pub fn apply_to(&self, settings: &mut MirrorSettings) {
        if let Some(url) = &self.url {
            settings.url = Some(url.clone());
        }
        if let Some(output) = &self.output {
            settings.output_dir = Some(output.clone());
        }
        if let Some(depth) = self.depth {
            settings.max_depth = depth;
        }
        if let Some(pages) = self.max_pages {
            settings.max_pages = pages;
        }
        if self.single_page {
            settings.single_page = true;
        }
        if self.follow_external {
            settings.same_domain = false;
        }
        if self.no_subdomains {
            settings.include_subdomains = false;
        }
        settings.exclude_patterns.extend(self.exclude.iter().cloned());
        if self.external_resources {
            settings.same_domain_resources = false;
        }
        if self.videos {
            settings.resources.videos = true;
        }
        for category in &self.skip {
            let toggle = match category {
                Category::Images => &mut settings.resources.images,
                Category::Styles => &mut settings.resources.styles,
                Category::Scripts => &mut settings.resources.scripts,
                Category::Fonts => &mut settings.resources.fonts,
                Category::Videos => &mut settings.resources.videos,
            };
            *toggle = false;
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = timeout;
        }
        if let Some(base_href) = &self.base_href {
            settings.base_href = Some(base_href.clone());
        }
        if let Some(log) = self.log {
            settings.log = log;
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
