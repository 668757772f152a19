use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use mirror_core::{ResourceToggles, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES};
use mirror_engine::{AtomicFileWriter, MirrorConfig};
use mirror_logging::{mirror_info, LogDestination};
use serde::{Deserialize, Serialize};

/// Where log records go. The terminal is shared with the status lines.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum LogTarget {
    #[default]
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    pub images: bool,
    pub styles: bool,
    pub scripts: bool,
    pub fonts: bool,
    pub videos: bool,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        let toggles = ResourceToggles::default();
        Self {
            images: toggles.images,
            styles: toggles.styles,
            scripts: toggles.scripts,
            fonts: toggles.fonts,
            videos: toggles.videos,
        }
    }
}

impl From<ResourceSettings> for ResourceToggles {
    fn from(s: ResourceSettings) -> Self {
        ResourceToggles {
            images: s.images,
            styles: s.styles,
            scripts: s.scripts,
            fonts: s.fonts,
            videos: s.videos,
        }
    }
}

/// Settings file contents. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorSettings {
    pub url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub max_depth: u32,
    pub max_pages: usize,
    pub same_domain: bool,
    pub include_subdomains: bool,
    pub exclude_patterns: Vec<String>,
    pub resources: ResourceSettings,
    pub same_domain_resources: bool,
    pub timeout_secs: u64,
    pub single_page: bool,
    pub base_href: Option<String>,
    pub user_agent: Option<String>,
    pub log: LogTarget,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            url: None,
            output_dir: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            same_domain: true,
            include_subdomains: true,
            exclude_patterns: Vec::new(),
            resources: ResourceSettings::default(),
            same_domain_resources: true,
            timeout_secs: 10,
            single_page: false,
            base_href: None,
            user_agent: None,
            log: LogTarget::default(),
        }
    }
}

impl MirrorSettings {
    pub fn to_config(&self) -> anyhow::Result<MirrorConfig> {
        let Some(url) = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
            bail!("no start URL given; pass one on the command line or in the settings file");
        };
        if self.timeout_secs == 0 {
            bail!("timeout must be at least one second");
        }

        let mut config = MirrorConfig::new(url);
        config.output_dir = self.output_dir.clone();
        config.max_depth = self.max_depth;
        config.max_pages = self.max_pages;
        config.same_domain_only = self.same_domain;
        config.include_subdomains = self.include_subdomains;
        config.exclude_patterns = self.exclude_patterns.clone();
        config.resources = self.resources.into();
        config.same_domain_resources = self.same_domain_resources;
        config.single_page = self.single_page;
        config.base_href = self.base_href.clone();
        config.fetch.request_timeout = Duration::from_secs(self.timeout_secs);
        if let Some(agent) = &self.user_agent {
            config.fetch.user_agent = agent.clone();
        }
        Ok(config)
    }
}

pub fn load_settings(path: &Path) -> anyhow::Result<MirrorSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings from {}", path.display()))?;
    let settings = ron::from_str(&content)
        .with_context(|| format!("failed to parse settings in {}", path.display()))?;
    mirror_info!("Loaded settings from {:?}", path);
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &MirrorSettings) -> anyhow::Result<()> {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        bail!("settings path {} has no file name", path.display());
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content =
        ron::ser::to_string_pretty(settings, pretty).context("failed to serialize settings")?;
    AtomicFileWriter::new(dir)
        .write(file_name, &content)
        .with_context(|| format!("failed to write settings to {}", path.display()))?;
    mirror_info!("Saved settings to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: MirrorSettings = ron::from_str(
            r#"(
                url: Some("https://example.com/"),
                max_depth: 1,
                resources: (videos: true),
                exclude_patterns: ["/private/*"],
                log: Both,
            )"#,
        )
        .unwrap();

        assert_eq!(settings.url.as_deref(), Some("https://example.com/"));
        assert_eq!(settings.max_depth, 1);
        assert_eq!(settings.max_pages, DEFAULT_MAX_PAGES);
        assert!(settings.resources.videos);
        assert!(settings.resources.images);
        assert_eq!(settings.log, LogTarget::Both);
    }

    #[test]
    fn config_carries_every_setting() {
        let settings = MirrorSettings {
            url: Some(" https://example.com/ ".into()),
            max_pages: 5,
            same_domain: false,
            single_page: true,
            timeout_secs: 3,
            user_agent: Some("agent/1".into()),
            resources: ResourceSettings {
                fonts: false,
                ..ResourceSettings::default()
            },
            ..MirrorSettings::default()
        };
        let config = settings.to_config().unwrap();

        assert_eq!(config.url, "https://example.com/");
        assert_eq!(config.max_pages, 5);
        assert!(!config.same_domain_only);
        assert!(config.single_page);
        assert!(!config.resources.fonts);
        assert_eq!(config.fetch.request_timeout, Duration::from_secs(3));
        assert_eq!(config.fetch.user_agent, "agent/1");
    }

    #[test]
    fn missing_url_is_rejected() {
        let err = MirrorSettings::default().to_config().unwrap_err();
        assert!(err.to_string().contains("no start URL"));
    }

    #[test]
    fn saved_settings_load_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mirror.ron");
        let settings = MirrorSettings {
            url: Some("https://example.com/docs/".into()),
            exclude_patterns: vec!["*.zip".into()],
            ..MirrorSettings::default()
        };

        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn unreadable_file_reports_its_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.ron");
        fs::write(&path, "(max_depth: \"deep\")").unwrap();
        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }
}
