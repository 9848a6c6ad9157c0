/* src/engine/rust/src/preset/mod.rs */

mod builtin;
mod registry;
mod styles;

pub use builtin::{RuntimePreset, SnippetPreset, TransformPreset};
pub use registry::{PresetRegistry, RegistryBuilder};
pub use styles::{StyleSheet, StylesPreset};

use crate::config::BuildConfig;
use crate::context::Context;
use crate::errors::HookError;
use crate::route::Root;
use crate::scope::RenderScope;

/// Named lifecycle extension points, listed in global invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
  CreateConfig,
  WrapApp,
  CreateServerRoot,
  AppDidRender,
  PostServerRender,
  CreateDocument,
}

impl Hook {
  pub const ALL: [Hook; 6] = [
    Hook::CreateConfig,
    Hook::WrapApp,
    Hook::CreateServerRoot,
    Hook::AppDidRender,
    Hook::PostServerRender,
    Hook::CreateDocument,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::CreateConfig => "createConfig",
      Self::WrapApp => "wrapApp",
      Self::CreateServerRoot => "createServerRoot",
      Self::AppDidRender => "appDidRender",
      Self::PostServerRender => "postServerRender",
      Self::CreateDocument => "createDocument",
    }
  }

  /// Wrapping hooks run over presets in reverse so the first registered preset
  /// ends up outermost; every other hook runs in registration order.
  pub fn is_reversed(self) -> bool {
    matches!(self, Self::WrapApp | Self::CreateServerRoot)
  }
}

impl std::fmt::Display for Hook {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Document fragments contributed by one hook call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
  pub head: Option<String>,
  pub body: Option<String>,
  pub style: Option<String>,
}

impl Fragment {
  pub fn head(html: impl Into<String>) -> Self {
    Self { head: Some(html.into()), ..Self::default() }
  }

  pub fn body(html: impl Into<String>) -> Self {
    Self { body: Some(html.into()), ..Self::default() }
  }

  pub fn style(css: impl Into<String>) -> Self {
    Self { style: Some(css.into()), ..Self::default() }
  }

  pub fn is_empty(&self) -> bool {
    self.head.is_none() && self.body.is_none() && self.style.is_none()
  }
}

/// Concatenation of fragments across presets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
  pub head: String,
  pub body: String,
  pub style: String,
}

impl Fragments {
  pub fn push(&mut self, fragment: Fragment) {
    if let Some(head) = fragment.head {
      self.head.push_str(&head);
    }
    if let Some(body) = fragment.body {
      self.body.push_str(&body);
    }
    if let Some(style) = fragment.style {
      self.style.push_str(&style);
    }
  }

  pub fn style(&self) -> Option<&str> {
    (!self.style.is_empty()).then_some(self.style.as_str())
  }
}

/// A named bundle of hook implementations.
///
/// `hooks()` declares which hooks the preset implements; the registry only
/// invokes declared hooks, so the default bodies below are never reached for
/// undeclared ones.
pub trait Preset: Send + Sync {
  fn name(&self) -> &str;

  fn hooks(&self) -> &[Hook];

  /// True only for the built-in platform runtime preset, which owns the
  /// reserved `runtime` name.
  fn is_runtime(&self) -> bool {
    false
  }

  fn create_config(&self, _config: &mut BuildConfig, _ctx: &Context) {}

  fn create_document(&self, _ctx: &Context, _style: Option<&str>) -> Result<Fragment, HookError> {
    Ok(Fragment::default())
  }

  fn wrap_app(&self, app: Root, _ctx: &Context, _scope: &mut RenderScope) -> Root {
    app
  }

  fn create_server_root(&self, root: Root, _ctx: &Context, _scope: &mut RenderScope) -> Root {
    root
  }

  fn app_did_render(&self, _ctx: &Context, _scope: &mut RenderScope) -> Result<Fragment, HookError> {
    Ok(Fragment::default())
  }

  fn post_server_render(
    &self,
    _ctx: &Context,
    _scope: &mut RenderScope,
  ) -> Result<Fragment, HookError> {
    Ok(Fragment::default())
  }
}
