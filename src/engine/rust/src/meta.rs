/* src/engine/rust/src/meta.rs */

// <meta> tag generation from a page's `state.meta` object.

use crate::escape::escape_html;
use crate::state::{StateMap, StateValue};

// Keys rendered by dedicated rules below; everything else becomes `<meta name=..>`.
const HANDLED_KEYS: &[&str] = &["title", "description", "image", "url", "twitter", "card", "site"];

fn name_tag(out: &mut String, name: &str, content: &str) {
  out.push_str(&format!(r#"<meta name="{}" content="{}">"#, escape_html(name), escape_html(content)));
}

fn property_tag(out: &mut String, property: &str, content: &str) {
  out.push_str(&format!(r#"<meta property="{property}" content="{}">"#, escape_html(content)));
}

fn string_at<'a>(meta: &'a StateMap, key: &str) -> Option<&'a str> {
  meta.get(key).and_then(StateValue::as_str).filter(|s| !s.is_empty())
}

/// Render social/SEO meta tags for a page. `title` itself is not emitted here;
/// the document builder owns the `<title>` element.
pub fn meta_tags(meta: &StateValue) -> String {
  let Some(map) = meta.as_object() else {
    return String::new();
  };
  let mut out = String::new();

  if let Some(title) = string_at(map, "title") {
    property_tag(&mut out, "og:title", title);
    name_tag(&mut out, "twitter:title", title);
  }
  if let Some(description) = string_at(map, "description") {
    name_tag(&mut out, "description", description);
    property_tag(&mut out, "og:description", description);
    name_tag(&mut out, "twitter:description", description);
  }
  let image = string_at(map, "image");
  if let Some(image) = image {
    property_tag(&mut out, "og:image", image);
    name_tag(&mut out, "twitter:image", image);
  }
  if let Some(url) = string_at(map, "url") {
    property_tag(&mut out, "og:url", url);
    out.push_str(&format!(r#"<link rel="canonical" href="{}">"#, escape_html(url)));
  }

  let card = string_at(map, "card").or(image.map(|_| "summary_large_image"));
  if let Some(card) = card {
    name_tag(&mut out, "twitter:card", card);
  }
  if let Some(handle) = string_at(map, "twitter") {
    name_tag(&mut out, "twitter:site", handle);
    name_tag(&mut out, "twitter:creator", handle);
  }
  if let Some(site) = string_at(map, "site") {
    property_tag(&mut out, "og:site_name", site);
  }

  for (key, value) in map {
    if HANDLED_KEYS.contains(&key.as_str()) {
      continue;
    }
    if let Some(content) = value.as_str() {
      name_tag(&mut out, key, content);
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn empty_meta_renders_nothing() {
    assert_eq!(meta_tags(&StateValue::Null), "");
    assert_eq!(meta_tags(&StateValue::empty_object()), "");
  }

  #[test]
  fn title_and_description() {
    let meta = StateValue::from(json!({"title": "Home", "description": "Welcome"}));
    let tags = meta_tags(&meta);
    assert!(tags.contains(r#"<meta property="og:title" content="Home">"#));
    assert!(tags.contains(r#"<meta name="twitter:title" content="Home">"#));
    assert!(tags.contains(r#"<meta name="description" content="Welcome">"#));
    assert!(tags.contains(r#"<meta property="og:description" content="Welcome">"#));
    assert!(!tags.contains("<title>"));
  }

  #[test]
  fn image_implies_large_card() {
    let meta = StateValue::from(json!({"image": "/og.png"}));
    let tags = meta_tags(&meta);
    assert!(tags.contains(r#"<meta name="twitter:card" content="summary_large_image">"#));
    let meta = StateValue::from(json!({"image": "/og.png", "card": "summary"}));
    assert!(meta_tags(&meta).contains(r#"content="summary">"#));
  }

  #[test]
  fn url_adds_canonical_link() {
    let meta = StateValue::from(json!({"url": "https://example.com/a"}));
    assert!(meta_tags(&meta).contains(r#"<link rel="canonical" href="https://example.com/a">"#));
  }

  #[test]
  fn unknown_string_keys_become_name_tags() {
    let meta = StateValue::from(json!({"author": "Ada", "robots": "noindex", "count": 3}));
    let tags = meta_tags(&meta);
    assert!(tags.contains(r#"<meta name="author" content="Ada">"#));
    assert!(tags.contains(r#"<meta name="robots" content="noindex">"#));
    assert!(!tags.contains("count"));
  }

  #[test]
  fn values_are_escaped() {
    let meta = StateValue::from(json!({"description": "\"><script>"}));
    let tags = meta_tags(&meta);
    assert!(!tags.contains("<script>"));
    assert!(tags.contains("&quot;&gt;&lt;script&gt;"));
  }
}
