/* src/engine/rust/src/document.rs */

use crate::escape::{escape_html, escape_script_json};
use crate::flatted;
use crate::meta::meta_tags;
use crate::state::StateValue;

pub const DEFAULT_TITLE: &str = "rola";

#[derive(Debug, Clone)]
pub struct DocumentOptions {
  /// Used when `state.meta.title` is absent.
  pub default_title: String,
  /// `id` of the element the view is rendered into.
  pub root_id: String,
  /// `window` property the serialized state is assigned to.
  pub global: String,
  pub stylesheet: Option<String>,
  pub client_script: Option<String>,
}

impl Default for DocumentOptions {
  fn default() -> Self {
    Self {
      default_title: DEFAULT_TITLE.to_string(),
      root_id: "root".to_string(),
      global: "__rola".to_string(),
      stylesheet: Some("/client.css".to_string()),
      client_script: Some("/client.js".to_string()),
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
  options: DocumentOptions,
}

impl DocumentBuilder {
  pub fn new(options: DocumentOptions) -> Self {
    Self { options }
  }

  pub fn options(&self) -> &DocumentOptions {
    &self.options
  }

  /// Assemble a full HTML document around already-rendered view markup.
  ///
  /// `head` and `body` are the concatenated preset fragments. The page state is
  /// embedded in flatted form so shared sub-objects survive hydration.
  pub fn build(&self, state: &StateValue, view: &str, head: &str, body: &str) -> String {
    let opts = &self.options;
    let meta = state.get("meta").cloned().unwrap_or_else(StateValue::empty_object);
    let title = meta
      .get("title")
      .and_then(StateValue::as_str)
      .filter(|t| !t.trim().is_empty())
      .unwrap_or(opts.default_title.as_str());

    let mut doc = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    doc.push_str(r#"<meta name="viewport" content="width=device-width,initial-scale=1">"#);
    doc.push_str(&format!("<title>{}</title>", escape_html(title)));
    doc.push_str(&meta_tags(&meta));
    doc.push_str(head);
    if let Some(href) = &opts.stylesheet {
      doc.push_str(&format!(r#"<link rel="stylesheet" href="{}">"#, escape_html(href)));
    }
    doc.push_str("</head><body>");
    doc.push_str(&format!(r#"<div id="{}">"#, escape_html(&opts.root_id)));
    doc.push_str(view);
    doc.push_str("</div>");
    doc.push_str(body);
    doc.push_str(&format!(
      "<script>window.{} = {}</script>",
      opts.global,
      escape_script_json(&flatted::stringify(state))
    ));
    if let Some(src) = &opts.client_script {
      doc.push_str(&format!(r#"<script src="{}"></script>"#, escape_html(src)));
    }
    doc.push_str("</body></html>");
    doc
  }
}

/// Locate the serialized state payload a document assigns to `window.<global>`.
pub fn hydration_payload<'a>(html: &'a str, global: &str) -> Option<&'a str> {
  let marker = format!("<script>window.{global} = ");
  let start = html.find(&marker)? + marker.len();
  let len = html[start..].find("</script>")?;
  Some(&html[start..start + len])
}
