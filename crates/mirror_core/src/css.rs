use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

/// `@import "x"` (groups 1-3) or `url(x)` (groups 4-8), case-insensitive.
/// `@import url(x)` is covered by the `url(...)` branch.
static CSS_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(@import\s+)(["'])([^"']+)["']|(url\s*\(\s*)(["']?)([^"'()]+)(["']?)(\s*\))"#,
    )
    .expect("Failed to compile CSS url regex")
});

/// Values that never point at a fetchable resource.
pub fn is_skippable_css_value(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    lower.is_empty()
        || lower.starts_with("data:")
        || lower.starts_with("javascript:")
        || lower.starts_with('#')
}

/// Raw (unresolved) URL references found in a style sheet, in order.
pub fn css_references(css: &str) -> Vec<String> {
    CSS_URL_REGEX
        .captures_iter(css)
        .filter_map(|caps| caps.get(3).or_else(|| caps.get(6)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !is_skippable_css_value(value))
        .collect()
}

/// Style sheet references resolved against `base`, deduplicated in order.
pub fn extract_css_urls(css: &str, base: &Url) -> Vec<Url> {
    let mut urls: Vec<Url> = Vec::new();
    for raw in css_references(css) {
        if let Ok(url) = base.join(&raw) {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}

/// Rewrites every `url(...)` / `@import "..."` target through `convert`,
/// keeping quotes and surrounding syntax. `None` leaves a reference as is.
pub fn rewrite_css_urls<F>(css: &str, mut convert: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    CSS_URL_REGEX
        .replace_all(css, |caps: &Captures<'_>| {
            let original = caps[0].to_string();
            if let Some(value) = caps.get(3) {
                let raw = value.as_str().trim();
                if is_skippable_css_value(raw) {
                    return original;
                }
                return match convert(raw) {
                    Some(new_value) => format!("{}{}{}{}", &caps[1], &caps[2], new_value, &caps[2]),
                    None => original,
                };
            }
            let raw = caps.get(6).map(|m| m.as_str().trim()).unwrap_or_default();
            if is_skippable_css_value(raw) {
                return original;
            }
            match convert(raw) {
                Some(new_value) => format!(
                    "{}{}{}{}{}",
                    &caps[4], &caps[5], new_value, &caps[7], &caps[8]
                ),
                None => original,
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_url_is_reported_once() {
        let refs = css_references(r#"@import url("a.css"); @import 'b.css';"#);
        assert_eq!(refs, vec!["a.css".to_string(), "b.css".to_string()]);
    }

    #[test]
    fn data_and_fragment_values_are_skipped() {
        let refs = css_references("a{background:url(data:image/png;base64,AAA)} b{mask:url(#m)}");
        assert!(refs.is_empty());
    }

    #[test]
    fn rewrite_preserves_quotes_and_spacing() {
        let css = r#"div { background: URL( 'img/a.png' ) }"#;
        let out = rewrite_css_urls(css, |raw| Some(format!("local/{raw}")));
        assert_eq!(out, r#"div { background: URL( 'local/img/a.png' ) }"#);
    }
}
