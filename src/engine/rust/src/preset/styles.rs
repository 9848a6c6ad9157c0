/* src/engine/rust/src/preset/styles.rs */

// Collects `<style>` blocks emitted inside the view and moves them into the
// document head. The sheet lives in the render scope between `wrapApp` and
// `postServerRender`, never in process-wide state.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use regex::Regex;

use super::{Fragment, Hook, Preset};
use crate::context::Context;
use crate::errors::{HookError, ViewError};
use crate::route::{Component, Root, ViewProps};
use crate::scope::RenderScope;

const STASH_KEY: &str = "styles.sheet";

fn style_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?is)<style\b[^>]*>(.*?)</style>").expect("style pattern"))
}

/// CSS gathered during one render. Sealed once collected; later pushes are dropped.
#[derive(Debug, Default)]
pub struct StyleSheet {
  rules: Vec<String>,
  sealed: bool,
}

impl StyleSheet {
  pub fn push(&mut self, css: &str) {
    if !self.sealed && !css.trim().is_empty() {
      self.rules.push(css.trim().to_string());
    }
  }

  pub fn seal(&mut self) -> String {
    self.sealed = true;
    self.rules.join("\n")
  }

  pub fn is_sealed(&self) -> bool {
    self.sealed
  }
}

type SharedSheet = Arc<Mutex<StyleSheet>>;

struct CollectStyles {
  inner: Root,
  sheet: SharedSheet,
}

impl Component for CollectStyles {
  fn render(&self, props: &ViewProps) -> Result<String, ViewError> {
    let markup = self.inner.render(props)?;
    let mut sheet = self.sheet.lock().unwrap_or_else(PoisonError::into_inner);
    for cap in style_re().captures_iter(&markup) {
      sheet.push(&cap[1]);
    }
    Ok(style_re().replace_all(&markup, "").into_owned())
  }
}

#[derive(Debug, Default)]
pub struct StylesPreset;

impl StylesPreset {
  pub const NAME: &'static str = "styles";
}

impl Preset for StylesPreset {
  fn name(&self) -> &str {
    Self::NAME
  }

  fn hooks(&self) -> &[Hook] {
    &[Hook::WrapApp, Hook::PostServerRender, Hook::CreateDocument]
  }

  fn wrap_app(&self, app: Root, _ctx: &Context, scope: &mut RenderScope) -> Root {
    let sheet = SharedSheet::default();
    scope.stash(STASH_KEY, Arc::clone(&sheet));
    Arc::new(CollectStyles { inner: app, sheet })
  }

  fn post_server_render(
    &self,
    _ctx: &Context,
    scope: &mut RenderScope,
  ) -> Result<Fragment, HookError> {
    let Some(sheet) = scope.take::<SharedSheet>(STASH_KEY) else {
      return Ok(Fragment::default());
    };
    let css = sheet.lock().unwrap_or_else(PoisonError::into_inner).seal();
    Ok(if css.is_empty() { Fragment::default() } else { Fragment::style(css) })
  }

  fn create_document(&self, _ctx: &Context, style: Option<&str>) -> Result<Fragment, HookError> {
    Ok(match style {
      Some(css) if !css.is_empty() => Fragment::head(format!("<style data-rola>{css}</style>")),
      _ => Fragment::default(),
    })
  }
}
