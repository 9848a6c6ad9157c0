/* src/engine/rust/src/config.rs */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::errors::ConfigError;
use crate::preset::{PresetRegistry, RuntimePreset};

/// Prepended to the server bundle so stack traces map back to sources.
pub const SOURCE_MAP_BANNER: &str = "require('source-map-support').install();";

/// Module format requested for the server bundle.
pub const SERVER_LIBRARY_TARGET: &str = "commonjs2";

/// Client assets land in this subdirectory of the output directory.
pub const ASSETS_DIR: &str = "assets";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
  Client,
  Server,
}

impl OutputTarget {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Client => "client",
      Self::Server => "server",
    }
  }
}

impl std::fmt::Display for OutputTarget {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Client/server discriminator shared by config assembly, stats
/// classification and the dev server. Only the last path component is tested.
pub fn is_server_name(name: &str) -> bool {
  let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
  file.contains("server")
}

pub fn target_for(entry: &Path) -> OutputTarget {
  if is_server_name(&entry.to_string_lossy()) { OutputTarget::Server } else { OutputTarget::Client }
}

/// Raw input for one compilation target.
#[derive(Debug, Clone, Default)]
pub struct ConfigInput {
  pub entry_path: PathBuf,
  pub out_dir: PathBuf,
  pub environment: BTreeMap<String, String>,
  pub aliases: BTreeMap<String, String>,
  pub presets: PresetRegistry,
  /// Client banner; ignored for server configs.
  pub banner: Option<String>,
}

/// One bundler invocation for one target. Not mutated after `assemble` returns.
#[derive(Debug, Clone)]
pub struct BuildConfig {
  pub entry_path: PathBuf,
  pub output_target: OutputTarget,
  pub output_path: PathBuf,
  /// `Some("commonjs2")` for server bundles, `None` for browser bundles.
  pub library_target: Option<&'static str>,
  pub environment: BTreeMap<String, String>,
  pub aliases: BTreeMap<String, String>,
  pub presets: PresetRegistry,
  pub banner: String,
  /// Compiler transform directives appended by `createConfig` hooks.
  pub transforms: Vec<String>,
}

impl BuildConfig {
  pub fn is_server(&self) -> bool {
    self.output_target == OutputTarget::Server
  }

  /// File name of the emitted bundle, e.g. `server.js`.
  pub fn bundle_name(&self) -> String {
    self
      .entry_path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| format!("{}.js", self.output_target))
  }
}

/// Build one BuildConfig and run every `createConfig` hook over it.
pub fn assemble(input: ConfigInput, ctx: &Context) -> Result<BuildConfig, ConfigError> {
  if input.entry_path.as_os_str().is_empty() {
    return Err(ConfigError::MissingEntry);
  }
  let output_target = target_for(&input.entry_path);

  let (output_path, library_target, banner, presets) = match output_target {
    OutputTarget::Server => {
      let presets = if input.presets.contains_runtime() {
        input.presets
      } else {
        input.presets.to_builder().register(RuntimePreset).build()?
      };
      (input.out_dir, Some(SERVER_LIBRARY_TARGET), SOURCE_MAP_BANNER.to_string(), presets)
    }
    OutputTarget::Client => {
      (input.out_dir.join(ASSETS_DIR), None, input.banner.unwrap_or_default(), input.presets)
    }
  };

  let mut config = BuildConfig {
    entry_path: input.entry_path,
    output_target,
    output_path,
    library_target,
    environment: input.environment,
    aliases: input.aliases,
    presets: presets.clone(),
    banner,
    transforms: Vec::new(),
  };
  presets.run_create_config(&mut config, ctx);
  Ok(config)
}

/// Assemble every input, rejecting two configs for the same target.
pub fn assemble_all(
  inputs: Vec<ConfigInput>,
  ctx: &Context,
) -> Result<Vec<BuildConfig>, ConfigError> {
  let mut configs: Vec<BuildConfig> = Vec::with_capacity(inputs.len());
  for input in inputs {
    let config = assemble(input, ctx)?;
    if configs.iter().any(|c| c.output_target == config.output_target) {
      return Err(ConfigError::DuplicateTarget(config.output_target));
    }
    configs.push(config);
  }
  Ok(configs)
}
