/* src/cli/core/src/config/loader.rs */

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;

use super::RolaConfig;

pub const CONFIG_FILE: &str = "rola.toml";

/// Walk upward from `start` to find `rola.toml`, like Cargo.toml discovery.
/// Absence is not an error: the project runs on defaults.
pub fn find_rola_config(start: &Path) -> Result<Option<PathBuf>> {
  let mut dir =
    start.canonicalize().with_context(|| format!("failed to canonicalize {}", start.display()))?;
  loop {
    let candidate = dir.join(CONFIG_FILE);
    if candidate.is_file() {
      return Ok(Some(candidate));
    }
    if !dir.pop() {
      return Ok(None);
    }
  }
}

pub fn load_rola_config(path: &Path) -> Result<RolaConfig> {
  let content =
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  let config: RolaConfig =
    toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
  validate(&config)?;
  Ok(config)
}

fn identifier_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern"))
}

pub fn validate(config: &RolaConfig) -> Result<()> {
  // Inlined as `window.<global> = ...`, so it must be a plain identifier.
  if !identifier_re().is_match(&config.document.global) {
    bail!("document.global \"{}\" is not a valid identifier", config.document.global);
  }
  if config.document.root_id.trim().is_empty() {
    bail!("document.root_id must not be empty");
  }
  if config.build.out_dir.trim().is_empty() {
    bail!("build.out_dir must not be empty");
  }
  if config.build.out_dir == config.build.temp_dir {
    bail!("build.out_dir and build.temp_dir must differ");
  }
  if config.dev.reload_port.is_some_and(|p| p == config.dev.port) {
    bail!("dev.reload_port must differ from dev.port");
  }
  Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct PackageJson {
  name: Option<String>,
  version: Option<String>,
}

/// `name` / `version` from `package.json` in `dir`, when present and parseable.
pub fn read_package_identity(dir: &Path) -> (Option<String>, Option<String>) {
  let Ok(content) = std::fs::read_to_string(dir.join("package.json")) else {
    return (None, None);
  };
  match serde_json::from_str::<PackageJson>(&content) {
    Ok(pkg) => (pkg.name, pkg.version),
    Err(e) => {
      tracing::warn!("ignoring unparseable package.json: {e}");
      (None, None)
    }
  }
}
