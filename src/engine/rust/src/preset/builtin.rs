/* src/engine/rust/src/preset/builtin.rs */

use super::{Fragment, Hook, Preset};
use crate::config::BuildConfig;
use crate::context::Context;
use crate::errors::HookError;

/// Platform shims for server bundles. Appended to every server config.
pub struct RuntimePreset;

impl RuntimePreset {
  pub const NAME: &'static str = "runtime";
  pub const TRANSFORMS: &'static [&'static str] = &["env:node=current", "shim:fetch"];
}

impl Preset for RuntimePreset {
  fn name(&self) -> &str {
    Self::NAME
  }

  fn hooks(&self) -> &[Hook] {
    &[Hook::CreateConfig]
  }

  fn is_runtime(&self) -> bool {
    true
  }

  fn create_config(&self, config: &mut BuildConfig, _ctx: &Context) {
    if config.is_server() {
      config.transforms.extend(Self::TRANSFORMS.iter().map(|t| (*t).to_string()));
    }
  }
}

/// Fixed head/body markup added to every document.
pub struct SnippetPreset {
  name: String,
  head: Option<String>,
  body: Option<String>,
}

impl SnippetPreset {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), head: None, body: None }
  }

  pub fn with_head(mut self, html: impl Into<String>) -> Self {
    self.head = Some(html.into());
    self
  }

  pub fn with_body(mut self, html: impl Into<String>) -> Self {
    self.body = Some(html.into());
    self
  }
}

impl Preset for SnippetPreset {
  fn name(&self) -> &str {
    &self.name
  }

  fn hooks(&self) -> &[Hook] {
    &[Hook::CreateDocument]
  }

  fn create_document(&self, _ctx: &Context, _style: Option<&str>) -> Result<Fragment, HookError> {
    Ok(Fragment { head: self.head.clone(), body: self.body.clone(), style: None })
  }
}

/// Appends one compiler transform directive to every config.
pub struct TransformPreset {
  name: String,
  directive: String,
}

impl TransformPreset {
  pub fn new(directive: impl Into<String>) -> Self {
    Self { name: "transform".to_string(), directive: directive.into() }
  }

  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }
}

impl Preset for TransformPreset {
  fn name(&self) -> &str {
    &self.name
  }

  fn hooks(&self) -> &[Hook] {
    &[Hook::CreateConfig]
  }

  fn create_config(&self, config: &mut BuildConfig, _ctx: &Context) {
    config.transforms.push(self.directive.clone());
  }
}
