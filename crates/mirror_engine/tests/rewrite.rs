use std::path::Path;

use mirror_core::{relative_path, PathMapper, ResourceCategory};
use mirror_engine::{ContentProcessor, ResourcePolicy};
use pretty_assertions::assert_eq;
use url::Url;

fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

fn processor() -> ContentProcessor {
    let base = url("https://example.com/");
    ContentProcessor::new()
        .with_mapper(PathMapper::new("/out"))
        .with_resource_policy(ResourcePolicy::new(base))
}

#[test]
fn page_links_become_relative_index_files() {
    let source = url("https://example.com/blog/post");
    let p = processor();
    assert_eq!(p.convert_url("/about", &source, true), "../../about/index.html");
    assert_eq!(p.convert_url("../", &source, true), "../../index.html");
    assert_eq!(
        p.convert_url("/docs/guide.html#install", &source, true),
        "../../docs/guide.html/index.html#install"
    );
}

#[test]
fn passthrough_references_are_untouched() {
    let source = url("https://example.com/");
    let p = processor();
    for raw in ["mailto:a@b.c", "tel:123", "javascript:void(0)", "#top", "data:image/png;base64,AA", ""] {
        assert_eq!(p.convert_url(raw, &source, true), raw);
    }
}

#[test]
fn foreign_pages_and_assets_stay_absolute() {
    let source = url("https://example.com/");
    let p = processor();
    assert_eq!(
        p.convert_url("https://other.org/page", &source, true),
        "https://other.org/page"
    );
    assert_eq!(
        p.convert_url("https://cdn.other.org/lib.js", &source, false),
        "https://cdn.other.org/lib.js"
    );
}

#[test]
fn cross_domain_assets_are_localized_when_policy_allows() {
    let source = url("https://example.com/");
    let p = ContentProcessor::new()
        .with_mapper(PathMapper::new("/out"))
        .with_resource_policy(ResourcePolicy::new(source.clone()).same_domain_only(false));
    assert_eq!(
        p.convert_url("https://cdn.other.org/lib.js", &source, false),
        "../__res__/scripts/cdn.other.org/lib.js"
    );
}

#[test]
fn resources_point_at_the_category_layout() {
    let mapper = PathMapper::new("/out");
    let source = url("https://example.com/a/b");
    let converted = processor().convert_url("img/logo.png", &source, false);

    let page_dir = mapper.path_for_page(&source);
    let expected = mapper.path_for_resource_in(
        ResourceCategory::Images,
        &url("https://example.com/a/img/logo.png"),
        None,
    );
    assert_eq!(
        converted,
        relative_path(page_dir.parent().unwrap(), &expected)
    );
    assert_eq!(converted, "../../../__res__/images/example.com/a/img/logo.png");
}

#[test]
fn excluded_and_disabled_assets_are_not_localized() {
    let source = url("https://example.com/");
    let p = processor();
    assert_eq!(p.convert_url("files/a.zip", &source, false), "files/a.zip");
    assert_eq!(
        p.convert_url("/report.pdf", &source, true),
        "https://example.com/report.pdf"
    );
    // videos are off by default
    assert_eq!(
        p.convert_url("/clip.mp4", &source, false),
        "https://example.com/clip.mp4"
    );
}

#[test]
fn no_mapper_means_absolute_urls() {
    let source = url("https://example.com/dir/page");
    let p = ContentProcessor::new();
    assert_eq!(
        p.convert_url("other", &source, true),
        "https://example.com/dir/other"
    );
}

#[test]
fn html_is_rewritten_with_provenance_comment() {
    let source = url("https://example.com/");
    let html = r#"<!DOCTYPE html>
<html><head><title>Home &amp; more</title>
<link rel="stylesheet" href="/css/site.css">
<style>body { background: url("/img/bg.png") }</style>
</head><body>
<a href="/about#team">About</a>
<img src="/img/a.png" srcset="/img/a.png 1x, /img/a@2x.png 2x" alt="A &quot;quoted&quot; alt">
<div style="background-image: url(/img/c.gif)"></div>
<a href="mailto:me@example.com">Mail</a>
<script>if (a < b && c) { run(); }</script>
<br>
</body></html>"#;

    let out = processor().process_html(html, &source);

    assert!(out.starts_with("<!-- Cloned from: https://example.com/ -->\n<!DOCTYPE html>"));
    assert!(out.contains("<title>Home &amp; more</title>"));
    assert!(out.contains(r#"href="../__res__/styles/example.com/css/site.css""#));
    assert!(out.contains(r#"url("../__res__/images/example.com/img/bg.png")"#));
    assert!(out.contains(r#"<a href="about/index.html#team">"#));
    assert!(out.contains(r#"src="../__res__/images/example.com/img/a.png""#));
    assert!(out.contains(
        r#"srcset="../__res__/images/example.com/img/a.png 1x, ../__res__/images/example.com/img/a@2x.png 2x""#
    ));
    assert!(out.contains(r#"alt="A &quot;quoted&quot; alt""#));
    assert!(out.contains("url(../__res__/images/example.com/img/c.gif)"));
    assert!(out.contains(r#"href="mailto:me@example.com""#));
    assert!(out.contains("if (a < b && c) { run(); }"));
    assert!(out.contains("<br>"));
    assert!(!out.contains("</br>"));
}

#[test]
fn base_href_is_injected_or_overwritten() {
    let source = url("https://example.com/");
    let p = processor().with_base_href("./");

    let injected = p.process_html("<html><head><title>t</title></head><body></body></html>", &source);
    assert!(injected.contains(r#"<head><base href="./"><title>"#));

    let replaced = p.process_html(
        r#"<html><head><base href="https://example.com/app/"></head><body></body></html>"#,
        &source,
    );
    assert!(replaced.contains(r#"<base href="./">"#));
    assert!(!replaced.contains("https://example.com/app/\""));
}

#[test]
fn existing_base_is_used_for_resolution() {
    let source = url("https://example.com/");
    let html = r#"<html><head><base href="https://example.com/app/"></head>
<body><a href="settings">s</a></body></html>"#;
    let out = processor().process_html(html, &source);
    assert!(out.contains(r#"<a href="app/settings/index.html">"#));
    assert!(out.contains("<base>"));
}

#[test]
fn stylesheet_references_are_relative_to_the_sheet() {
    let mapper = PathMapper::new("/out");
    let sheet = url("https://example.com/css/site.css");
    let sheet_path = mapper.path_for_resource_in(ResourceCategory::Styles, &sheet, None);
    assert_eq!(
        sheet_path,
        Path::new("/out/__res__/styles/example.com/css/site.css")
    );

    let css = "@import 'reset.css'; h1 { background: url(../img/h.png) } i { src: url(data:font/woff;base64,AA) }";
    let out = processor().process_stylesheet(css, &sheet, &sheet_path);
    assert_eq!(
        out,
        "@import 'reset.css'; h1 { background: url(../../../images/example.com/img/h.png) } i { src: url(data:font/woff;base64,AA) }"
    );
}

#[test]
fn inline_css_uses_the_page_directory() {
    let source = url("https://example.com/blog/");
    let out = processor().process_css("a { background: url('/i/x.png') }", &source);
    assert_eq!(
        out,
        "a { background: url('../../__res__/images/example.com/i/x.png') }"
    );
}
