/* src/engine/rust/src/preset/registry.rs */

use std::collections::HashSet;
use std::sync::Arc;

use super::{Fragments, Hook, Preset, RuntimePreset};
use crate::config::BuildConfig;
use crate::context::Context;
use crate::errors::{ConfigError, HookError, PageRenderError};
use crate::route::Root;
use crate::scope::RenderScope;

struct Entry {
  preset: Arc<dyn Preset>,
  hooks: Vec<Hook>,
}

/// Ordered, validated preset list. Cheap to clone; shared by every config and
/// render of one build.
#[derive(Clone, Default)]
pub struct PresetRegistry {
  entries: Arc<[Entry]>,
}

#[derive(Default)]
pub struct RegistryBuilder {
  presets: Vec<Arc<dyn Preset>>,
}

impl RegistryBuilder {
  pub fn register(self, preset: impl Preset + 'static) -> Self {
    self.register_arc(Arc::new(preset))
  }

  pub fn register_arc(mut self, preset: Arc<dyn Preset>) -> Self {
    self.presets.push(preset);
    self
  }

  /// Validate names and hook declarations, freezing registration order.
  pub fn build(self) -> Result<PresetRegistry, ConfigError> {
    let mut names = HashSet::new();
    let mut entries = Vec::with_capacity(self.presets.len());
    for (idx, preset) in self.presets.into_iter().enumerate() {
      let name = preset.name();
      if name.trim().is_empty() {
        return Err(ConfigError::UnnamedPreset(idx));
      }
      if name == RuntimePreset::NAME && !preset.is_runtime() {
        return Err(ConfigError::ReservedPreset(name.to_string()));
      }
      if !names.insert(name.to_string()) {
        return Err(ConfigError::DuplicatePreset(name.to_string()));
      }
      let declared = preset.hooks();
      if declared.is_empty() {
        return Err(ConfigError::NoHooks(name.to_string()));
      }
      let mut hooks = Vec::with_capacity(declared.len());
      for hook in declared {
        if hooks.contains(hook) {
          return Err(ConfigError::DuplicateHook { name: name.to_string(), hook: hook.as_str() });
        }
        hooks.push(*hook);
      }
      entries.push(Entry { preset, hooks });
    }
    Ok(PresetRegistry { entries: entries.into() })
  }
}

impl PresetRegistry {
  pub fn builder() -> RegistryBuilder {
    RegistryBuilder::default()
  }

  /// Builder seeded with this registry's presets, for appending more.
  pub fn to_builder(&self) -> RegistryBuilder {
    RegistryBuilder { presets: self.entries.iter().map(|e| Arc::clone(&e.preset)).collect() }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn names(&self) -> Vec<&str> {
    self.entries.iter().map(|e| e.preset.name()).collect()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.entries.iter().any(|e| e.preset.name() == name)
  }

  /// Whether the built-in runtime preset itself is registered.
  pub fn contains_runtime(&self) -> bool {
    self.entries.iter().any(|e| e.preset.is_runtime())
  }

  fn implementing(&self, hook: Hook) -> Vec<&dyn Preset> {
    let mut presets: Vec<&dyn Preset> =
      self.entries.iter().filter(|e| e.hooks.contains(&hook)).map(|e| e.preset.as_ref()).collect();
    if hook.is_reversed() {
      presets.reverse();
    }
    presets
  }

  /// Preset names in the order `hook` is invoked over them.
  pub fn invocation_order(&self, hook: Hook) -> Vec<&str> {
    self.implementing(hook).into_iter().map(Preset::name).collect()
  }

  pub fn run_create_config(&self, config: &mut BuildConfig, ctx: &Context) {
    for preset in self.implementing(Hook::CreateConfig) {
      preset.create_config(config, ctx);
    }
  }

  /// Compose the render root: the `wrapApp` chain, then the `createServerRoot` chain.
  pub fn wrap_root(&self, view: Root, ctx: &Context, scope: &mut RenderScope) -> Root {
    let mut root = view;
    for preset in self.implementing(Hook::WrapApp) {
      root = preset.wrap_app(root, ctx, scope);
    }
    for preset in self.implementing(Hook::CreateServerRoot) {
      root = preset.create_server_root(root, ctx, scope);
    }
    root
  }

  /// Run `appDidRender` then `postServerRender` and concatenate contributions.
  pub fn run_post_render(
    &self,
    ctx: &Context,
    scope: &mut RenderScope,
  ) -> Result<Fragments, PageRenderError> {
    let mut out = Fragments::default();
    for preset in self.implementing(Hook::AppDidRender) {
      let fragment = preset
        .app_did_render(ctx, scope)
        .map_err(|e| hook_error(ctx, preset, Hook::AppDidRender, e))?;
      out.push(fragment);
    }
    for preset in self.implementing(Hook::PostServerRender) {
      let fragment = preset
        .post_server_render(ctx, scope)
        .map_err(|e| hook_error(ctx, preset, Hook::PostServerRender, e))?;
      out.push(fragment);
    }
    Ok(out)
  }

  pub fn run_create_document(
    &self,
    ctx: &Context,
    style: Option<&str>,
  ) -> Result<Fragments, PageRenderError> {
    let mut out = Fragments::default();
    for preset in self.implementing(Hook::CreateDocument) {
      let fragment = preset
        .create_document(ctx, style)
        .map_err(|e| hook_error(ctx, preset, Hook::CreateDocument, e))?;
      out.push(fragment);
    }
    Ok(out)
  }
}

fn hook_error(ctx: &Context, preset: &dyn Preset, hook: Hook, err: HookError) -> PageRenderError {
  PageRenderError::Hook {
    pathname: ctx.pathname.clone(),
    preset: preset.name().to_string(),
    hook: hook.as_str(),
    message: err.0,
  }
}

impl std::fmt::Debug for PresetRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_list().entries(self.names()).finish()
  }
}
