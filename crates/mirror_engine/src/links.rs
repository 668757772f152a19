use ego_tree::NodeRef;
use scraper::node::{Element, Node};
use scraper::Html;
use url::Url;

use mirror_core::{extract_css_urls, is_excluded_path, is_page_path};

const DEFAULT_MAX_REFS: usize = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TargetKind {
    Page,
    Resource,
    ResourceSet,
}

/// Element, attribute, what the attribute points at. The extractor and the
/// content processor both read this table, so every reference that gets a
/// local path is also one that gets downloaded.
pub(crate) const URL_ATTRIBUTES: &[(&str, &str, TargetKind)] = &[
    ("a", "href", TargetKind::Page),
    ("area", "href", TargetKind::Page),
    ("form", "action", TargetKind::Page),
    ("img", "src", TargetKind::Resource),
    ("img", "srcset", TargetKind::ResourceSet),
    ("img", "data-src", TargetKind::Resource),
    ("input", "src", TargetKind::Resource),
    ("source", "src", TargetKind::Resource),
    ("source", "srcset", TargetKind::ResourceSet),
    ("link", "href", TargetKind::Resource),
    ("script", "src", TargetKind::Resource),
    ("video", "src", TargetKind::Resource),
    ("video", "poster", TargetKind::Resource),
    ("audio", "src", TargetKind::Resource),
];

pub(crate) fn target_kind(tag: &str, attr: &str) -> Option<TargetKind> {
    URL_ATTRIBUTES
        .iter()
        .find(|(t, a, _)| *t == tag && a.eq_ignore_ascii_case(attr))
        .map(|(_, _, kind)| *kind)
}

/// Attributes without a namespace prefix. `xlink:href` and `xml:lang` are
/// skipped.
pub(crate) fn unprefixed_attrs<'a>(
    element: &'a Element,
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    element
        .attrs
        .iter()
        .filter(|(name, _)| name.prefix.is_none())
        .map(|(name, value)| (&*name.local, &**value))
}

/// The first `<base href>` resolved against the page URL, else the page URL.
pub(crate) fn document_base(document: &Html, page_url: &Url) -> Url {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| node.value().as_element())
        .filter(|el| el.name().eq_ignore_ascii_case("base"))
        .find_map(|el| el.attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Hyperlinks and static resources referenced by one page, in document order,
/// each list free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredRefs {
    pub links: Vec<Url>,
    pub resources: Vec<Url>,
}

pub struct LinkExtractor {
    max_refs_per_page: usize,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self::with_max_refs(DEFAULT_MAX_REFS)
    }

    pub fn with_max_refs(max_refs_per_page: usize) -> Self {
        Self { max_refs_per_page }
    }

    /// Walks the parsed page once. Hyperlinks are only collected when
    /// `collect_links` is set; resources always are. References resolve
    /// against the page's `<base href>` when it has one.
    pub fn extract(&self, html: &str, page_url: &Url, collect_links: bool) -> DiscoveredRefs {
        let document = Html::parse_document(html);
        let base = document_base(&document, page_url);
        let mut ctx = ExtractContext::new(&base, self.max_refs_per_page);

        for node in document.tree.root().descendants() {
            self.visit_node(node, collect_links, &mut ctx);
        }

        ctx.refs
    }

    fn visit_node(&self, node: NodeRef<'_, Node>, collect_links: bool, ctx: &mut ExtractContext) {
        let Node::Element(element) = node.value() else {
            return;
        };
        let tag = element.name().to_ascii_lowercase();

        if collect_links && matches!(tag.as_str(), "a" | "link" | "area") {
            if let Some(href) = element.attr("href") {
                if let Some(url) = resolve_link(href, ctx.base) {
                    ctx.add_link(url);
                }
            }
        }

        for (name, value) in unprefixed_attrs(element) {
            match target_kind(&tag, name) {
                // hyperlinks to assets are localized like any other asset
                Some(TargetKind::Page) => {
                    if let Some(url) = resolve_link(value, ctx.base) {
                        if !is_excluded_path(url.path()) {
                            ctx.add_resource(url);
                        }
                    }
                }
                Some(TargetKind::Resource) => ctx.add_resource_ref(value),
                Some(TargetKind::ResourceSet) => {
                    for candidate in srcset_candidates(value) {
                        ctx.add_resource_ref(candidate.url);
                    }
                }
                None if name.eq_ignore_ascii_case("style") => ctx.add_css(value),
                None => {}
            }
        }

        if tag == "style" {
            let css: String = node
                .children()
                .filter_map(|child| child.value().as_text().map(|t| t.text.to_string()))
                .collect();
            ctx.add_css(&css);
        }
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// One `url [descriptor]` entry of a `srcset` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SrcsetCandidate<'a> {
    pub url: &'a str,
    pub descriptor: Option<&'a str>,
}

pub(crate) fn srcset_candidates(srcset: &str) -> Vec<SrcsetCandidate<'_>> {
    srcset
        .split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            match entry.split_once(char::is_whitespace) {
                Some((url, descriptor)) => Some(SrcsetCandidate {
                    url,
                    descriptor: Some(descriptor.trim()).filter(|d| !d.is_empty()),
                }),
                None => Some(SrcsetCandidate {
                    url: entry,
                    descriptor: None,
                }),
            }
        })
        .collect()
}

/// Schemes and forms that never name a crawlable document or asset.
pub(crate) fn is_passthrough_ref(reference: &str) -> bool {
    const PASSTHROUGH: &[&str] = &[
        "mailto:",
        "tel:",
        "javascript:",
        "data:",
        "about:",
        "chrome:",
        "edge:",
        "file:",
    ];
    let trimmed = reference.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return true;
    }
    let lower = trimmed.to_ascii_lowercase();
    PASSTHROUGH.iter().any(|scheme| lower.starts_with(scheme))
}

/// Resolves an `href`-like reference to an absolute http(s) URL without a
/// fragment.
pub(crate) fn resolve_link(reference: &str, base: &Url) -> Option<Url> {
    if is_passthrough_ref(reference) {
        return None;
    }
    let mut url = base.join(reference.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

struct ExtractContext<'a> {
    refs: DiscoveredRefs,
    base: &'a Url,
    max_refs: usize,
}

impl<'a> ExtractContext<'a> {
    fn new(base: &'a Url, max_refs: usize) -> Self {
        Self {
            refs: DiscoveredRefs::default(),
            base,
            max_refs,
        }
    }

    fn add_link(&mut self, url: Url) {
        if self.refs.links.len() >= self.max_refs || self.refs.links.contains(&url) {
            return;
        }
        self.refs.links.push(url);
    }

    fn add_resource_ref(&mut self, reference: &str) {
        if let Some(url) = resolve_link(reference, self.base) {
            self.add_resource(url);
        }
    }

    fn add_css(&mut self, css: &str) {
        for mut url in extract_css_urls(css, self.base) {
            if matches!(url.scheme(), "http" | "https") {
                url.set_fragment(None);
                self.add_resource(url);
            }
        }
    }

    /// Page-like paths are left to the hyperlink side; pages point at them
    /// as pages.
    fn add_resource(&mut self, url: Url) {
        if is_page_path(url.path()) {
            return;
        }
        if self.refs.resources.len() >= self.max_refs || self.refs.resources.contains(&url) {
            return;
        }
        self.refs.resources.push(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srcset_keeps_descriptors() {
        let parsed = srcset_candidates("a.png 1x, b.png 2x,c.png");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].url, "a.png");
        assert_eq!(parsed[0].descriptor, Some("1x"));
        assert_eq!(parsed[2].descriptor, None);
    }

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    /// Sorted, since attribute order inside one element is not guaranteed.
    fn resource_paths(html: &str) -> Vec<String> {
        let mut paths: Vec<String> = LinkExtractor::new()
            .extract(html, &url("https://example.com/blog/post"), true)
            .resources
            .iter()
            .map(|u| u.path().to_string())
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn every_image_candidate_is_collected() {
        let paths = resource_paths(
            r#"<img src="/small.png" srcset="/small.png 1x, /big.png 2x" data-src="/lazy.png">"#,
        );
        assert_eq!(paths, vec!["/big.png", "/lazy.png", "/small.png"]);
    }

    #[test]
    fn posters_inputs_preloads_and_asset_links_are_resources() {
        let paths = resource_paths(
            r#"<video poster="/poster.jpg"></video>
<input type="image" src="/button.gif">
<link rel="preload" href="/font.woff2">
<a href="/photo.jpg">photo</a>
<a href="/about">about</a>
<a href="/manual.pdf">manual</a>"#,
        );
        assert_eq!(
            paths,
            vec!["/button.gif", "/font.woff2", "/photo.jpg", "/poster.jpg"]
        );
    }

    #[test]
    fn extension_less_targets_are_not_resources() {
        let paths = resource_paths(
            r#"<link rel="canonical" href="/blog/post">
<script src="/api/loader"></script>
<img src="/avatar">
<div style="background: url(/bg)"></div>
<img src="/ok.png">"#,
        );
        assert_eq!(paths, vec!["/ok.png"]);
    }

    #[test]
    fn base_href_is_used_for_resolution() {
        let refs = LinkExtractor::new().extract(
            r#"<html><head><base href="/assets/"></head>
<body><img src="pic.png"><a href="next">n</a></body></html>"#,
            &url("https://example.com/page"),
            true,
        );
        assert_eq!(refs.resources, vec![url("https://example.com/assets/pic.png")]);
        assert_eq!(refs.links, vec![url("https://example.com/assets/next")]);
    }

    #[test]
    fn prefixed_attributes_are_ignored() {
        let paths = resource_paths(
            r#"<svg><a xlink:href="/sprite.svg"><text>t</text></a></svg>"#,
        );
        assert!(paths.is_empty());
    }

    #[test]
    fn passthrough_schemes() {
        assert!(is_passthrough_ref("mailto:a@b.c"));
        assert!(is_passthrough_ref("  #top"));
        assert!(is_passthrough_ref("JavaScript:void(0)"));
        assert!(!is_passthrough_ref("/about"));
    }
}
