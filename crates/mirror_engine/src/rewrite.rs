//! HTML and CSS rewriting for offline browsing.
//!
//! Pages are parsed with `scraper` and serialized back into a fresh string
//! while URL-bearing attributes are rewritten on the way out. The parsed tree
//! is never mutated, so one processor can be shared across pages.

use std::path::{Path, PathBuf};

use ego_tree::NodeRef;
use scraper::node::{Doctype, Element, Node};
use scraper::Html;
use url::Url;

use mirror_core::{
    is_excluded_path, is_page_path, relative_path, rewrite_css_urls, same_site, PathMapper,
    ResourceCategory,
};

use crate::links::{
    document_base, is_passthrough_ref, srcset_candidates, target_kind, TargetKind,
};
use crate::policy::ResourcePolicy;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

#[derive(Debug, Clone, Default)]
pub struct ContentProcessor {
    mapper: Option<PathMapper>,
    base_href: Option<String>,
    policy: Option<ResourcePolicy>,
}

impl ContentProcessor {
    /// Without a mapper every reference is made absolute.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapper(mut self, mapper: PathMapper) -> Self {
        self.mapper = Some(mapper);
        self
    }

    /// Forces `<base href>` to this value, injecting the element if needed.
    pub fn with_base_href(mut self, base_href: impl Into<String>) -> Self {
        self.base_href = Some(base_href.into());
        self
    }

    /// Only assets the policy admits are pointed at local copies. Without a
    /// policy, same-site assets are.
    pub fn with_resource_policy(mut self, policy: ResourcePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn mapper(&self) -> Option<&PathMapper> {
        self.mapper.as_ref()
    }

    pub fn process_html(&self, html: &str, source_url: &Url) -> String {
        let document = Html::parse_document(html);
        let root = document.tree.root();

        let has_base_element = root
            .descendants()
            .filter_map(|node| node.value().as_element())
            .any(|el| el.name().eq_ignore_ascii_case("base"));

        let ctx = RewriteContext {
            processor: self,
            resolve_base: document_base(&document, source_url),
            source: source_url,
            from_dir: self.page_dir(source_url),
            inject_base: !has_base_element,
        };

        let mut out = String::with_capacity(html.len() + 64);
        out.push_str(&format!("<!-- Cloned from: {source_url} -->\n"));
        for child in root.children() {
            ctx.write_node(child, &mut out);
        }
        out
    }

    /// Rewrites CSS that belongs to the page at `source_url` (inline styles,
    /// `<style>` blocks).
    pub fn process_css(&self, css: &str, source_url: &Url) -> String {
        let from_dir = self.page_dir(source_url);
        rewrite_css_urls(css, |raw| {
            Some(self.convert_from(raw, source_url, source_url, from_dir.as_deref(), false))
        })
    }

    /// Rewrites a stylesheet saved at `local_path`; references become
    /// relative to that file.
    pub fn process_stylesheet(&self, css: &str, sheet_url: &Url, local_path: &Path) -> String {
        let from_dir = local_path.parent();
        rewrite_css_urls(css, |raw| {
            Some(self.convert_from(raw, sheet_url, sheet_url, from_dir, false))
        })
    }

    /// The replacement for one reference found on the page at `source`.
    pub fn convert_url(&self, raw: &str, source: &Url, is_page: bool) -> String {
        let from_dir = self.page_dir(source);
        self.convert_from(raw, source, source, from_dir.as_deref(), is_page)
    }

    fn page_dir(&self, page: &Url) -> Option<PathBuf> {
        let mapper = self.mapper.as_ref()?;
        mapper.path_for_page(page).parent().map(Path::to_path_buf)
    }

    fn convert_from(
        &self,
        raw: &str,
        resolve_base: &Url,
        source: &Url,
        from_dir: Option<&Path>,
        is_page: bool,
    ) -> String {
        if is_passthrough_ref(raw) {
            return raw.to_string();
        }
        let Ok(resolved) = resolve_base.join(raw.trim()) else {
            return raw.to_string();
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            return raw.to_string();
        }
        let Some(mapper) = self.mapper.as_ref() else {
            return resolved.to_string();
        };

        // extension-less targets map like pages whichever attribute names them
        let path = resolved.path();
        if !is_page_path(path) {
            if is_excluded_path(path) {
                return if is_page {
                    resolved.to_string()
                } else {
                    raw.to_string()
                };
            }
            let category = match self.resource_category(&resolved, source) {
                Some(category) => category,
                None => return resolved.to_string(),
            };
            let Some(from_dir) = from_dir else {
                return resolved.to_string();
            };
            let target = mapper.path_for_resource_in(category, &resolved, None);
            return relative_path(from_dir, &target);
        }

        if !same_site(source, &resolved) {
            return resolved.to_string();
        }
        let Some(from_dir) = from_dir else {
            return resolved.to_string();
        };
        let target = mapper.path_for_page(&resolved);
        let mut href = relative_path(from_dir, &target);
        if let Some(fragment) = resolved.fragment().filter(|f| !f.is_empty()) {
            href.push('#');
            href.push_str(fragment);
        }
        href
    }

    fn resource_category(&self, url: &Url, source: &Url) -> Option<ResourceCategory> {
        match &self.policy {
            Some(policy) => policy.decide(url).ok(),
            None if same_site(source, url) => Some(ResourceCategory::from_url(url)),
            None => None,
        }
    }

    fn convert_srcset(&self, srcset: &str, ctx: &RewriteContext<'_>) -> String {
        srcset_candidates(srcset)
            .into_iter()
            .map(|candidate| {
                let url = ctx.convert(candidate.url, false);
                match candidate.descriptor {
                    Some(descriptor) => format!("{url} {descriptor}"),
                    None => url,
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

struct RewriteContext<'a> {
    processor: &'a ContentProcessor,
    /// `<base href>` of the page if it had one, else the page URL.
    resolve_base: Url,
    source: &'a Url,
    from_dir: Option<PathBuf>,
    inject_base: bool,
}

impl RewriteContext<'_> {
    fn convert(&self, raw: &str, is_page: bool) -> String {
        self.processor.convert_from(
            raw,
            &self.resolve_base,
            self.source,
            self.from_dir.as_deref(),
            is_page,
        )
    }

    fn convert_css(&self, css: &str) -> String {
        rewrite_css_urls(css, |raw| Some(self.convert(raw, false)))
    }

    fn write_node(&self, node: NodeRef<'_, Node>, out: &mut String) {
        match node.value() {
            Node::Document | Node::Fragment => {
                for child in node.children() {
                    self.write_node(child, out);
                }
            }
            Node::Doctype(doctype) => write_doctype(doctype, out),
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(&comment.comment);
                out.push_str("-->");
            }
            Node::Text(text) => {
                let parent_tag = node
                    .parent()
                    .and_then(|p| p.value().as_element().map(|el| el.name().to_ascii_lowercase()));
                match parent_tag.as_deref() {
                    Some("style") => out.push_str(&self.convert_css(&text.text)),
                    Some(tag) if RAW_TEXT_ELEMENTS.contains(&tag) => out.push_str(&text.text),
                    _ => escape_text(&text.text, out),
                }
            }
            Node::Element(element) => self.write_element(node, element, out),
            Node::ProcessingInstruction(pi) => {
                out.push_str("<?");
                out.push_str(&pi.target);
                out.push(' ');
                out.push_str(&pi.data);
                out.push('>');
            }
        }
    }

    fn write_element(&self, node: NodeRef<'_, Node>, element: &Element, out: &mut String) {
        let tag = element.name();
        let lower = tag.to_ascii_lowercase();
        let base_href = self.processor.base_href.as_deref();
        let localizing = self.processor.mapper.is_some();

        out.push('<');
        out.push_str(tag);
        for (qual, value) in element.attrs.iter() {
            let value: &str = value;
            if let Some(prefix) = &qual.prefix {
                write_attr(&format!("{}:{}", &**prefix, &*qual.local), value, out);
                continue;
            }
            let name: &str = &qual.local;
            if lower == "base" && name.eq_ignore_ascii_case("href") {
                match base_href {
                    Some(forced) => write_attr(name, forced, out),
                    // local links must not resolve against the live site
                    None if localizing => {}
                    None => write_attr(name, value, out),
                }
                continue;
            }
            let rewritten = match target_kind(&lower, name) {
                Some(TargetKind::Page) => self.convert(value, true),
                Some(TargetKind::Resource) => self.convert(value, false),
                Some(TargetKind::ResourceSet) => self.processor.convert_srcset(value, self),
                None if name.eq_ignore_ascii_case("style") => self.convert_css(value),
                None => value.to_string(),
            };
            write_attr(name, &rewritten, out);
        }
        out.push('>');

        if lower == "head" && self.inject_base {
            if let Some(forced) = base_href {
                out.push_str("<base");
                write_attr("href", forced, out);
                out.push('>');
            }
        }

        if VOID_ELEMENTS.contains(&lower.as_str()) {
            return;
        }
        for child in node.children() {
            self.write_node(child, out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

fn write_doctype(doctype: &Doctype, out: &mut String) {
    out.push_str("<!DOCTYPE ");
    out.push_str(doctype.name());
    let public_id = doctype.public_id();
    let system_id = doctype.system_id();
    if !public_id.is_empty() {
        out.push_str(&format!(" PUBLIC \"{public_id}\""));
        if !system_id.is_empty() {
            out.push_str(&format!(" \"{system_id}\""));
        }
    } else if !system_id.is_empty() {
        out.push_str(&format!(" SYSTEM \"{system_id}\""));
    }
    out.push('>');
}

fn write_attr(name: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_table_is_case_insensitive_on_attr() {
        assert_eq!(target_kind("img", "SRC"), Some(TargetKind::Resource));
        assert_eq!(target_kind("a", "href"), Some(TargetKind::Page));
        assert_eq!(target_kind("div", "href"), None);
    }

    #[test]
    fn namespaced_attributes_keep_their_prefix() {
        let out = ContentProcessor::new().process_html(
            r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#icon" href="#other"></use><text xml:lang="en">t</text></svg>"##,
            &Url::parse("https://example.com/").unwrap(),
        );
        assert!(out.contains(r##"xlink:href="#icon""##));
        assert!(out.contains(r##"href="#other""##));
        assert!(out.contains(r#"xml:lang="en""#));
        assert!(out.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#));
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let mut out = String::new();
        escape_text("a < b & c", &mut out);
        assert_eq!(out, "a &lt; b &amp; c");
        let mut out = String::new();
        write_attr("title", "say \"hi\"", &mut out);
        assert_eq!(out, " title=\"say &quot;hi&quot;\"");
    }
}
