use std::fs;

use mirror_engine::write_launcher;
use tempfile::TempDir;
use url::Url;

fn base() -> Url {
    Url::parse("https://example.com/").unwrap()
}

#[test]
fn prefers_the_base_host_index() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("a-other")).unwrap();
    fs::write(root.join("a-other").join("index.html"), "other").unwrap();
    fs::create_dir_all(root.join("example.com")).unwrap();
    fs::write(root.join("example.com").join("index.html"), "home").unwrap();

    let written = write_launcher(root, &base()).unwrap().unwrap();
    assert_eq!(written, root.join("index.html"));
    let html = fs::read_to_string(written).unwrap();
    assert!(html.contains(r#"content="0; url=example.com/index.html""#));
    assert!(html.contains(r#"<a href="example.com/index.html">"#));
}

#[test]
fn falls_back_to_first_index_in_sorted_order() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("b").join("deep")).unwrap();
    fs::write(root.join("b").join("deep").join("index.html"), "b").unwrap();
    fs::create_dir_all(root.join("a")).unwrap();
    fs::write(root.join("a").join("index.html"), "a").unwrap();

    write_launcher(root, &base()).unwrap();
    let html = fs::read_to_string(root.join("index.html")).unwrap();
    assert!(html.contains("url=a/index.html"));
}

#[test]
fn falls_back_to_largest_html_file() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("pages")).unwrap();
    fs::write(root.join("pages").join("small.html"), "s").unwrap();
    fs::write(root.join("pages").join("big.htm"), "a much larger page").unwrap();

    write_launcher(root, &base()).unwrap();
    let html = fs::read_to_string(root.join("index.html")).unwrap();
    assert!(html.contains("url=pages/big.htm"));
}

#[test]
fn writes_nothing_without_pages() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("notes.txt"), "x").unwrap();
    assert_eq!(write_launcher(temp.path(), &base()).unwrap(), None);
    assert!(!temp.path().join("index.html").exists());
}
