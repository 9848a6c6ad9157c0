/* src/cli/core/src/config/types.rs */

use std::collections::BTreeMap;

use serde::Deserialize;

/// Parsed `rola.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolaConfig {
  #[serde(default)]
  pub project: ProjectSection,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
  #[serde(default)]
  pub alias: BTreeMap<String, String>,
  #[serde(default)]
  pub entries: EntriesSection,
  #[serde(default)]
  pub build: BuildSection,
  #[serde(default)]
  pub dev: DevSection,
  #[serde(default)]
  pub document: DocumentSection,
  #[serde(default)]
  pub presets: Vec<PresetSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectSection {
  pub name: Option<String>,
  pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntriesSection {
  pub client: Option<String>,
  pub server: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
  /// Shell command run once per BuildConfig. Unset: entries are copied as-is.
  pub bundler_command: Option<String>,
  #[serde(default = "default_out_dir")]
  pub out_dir: String,
  #[serde(default = "default_static_dir")]
  pub static_dir: String,
  #[serde(default = "default_temp_dir")]
  pub temp_dir: String,
  pub runtime: Option<String>,
  pub banner: Option<String>,
}

impl Default for BuildSection {
  fn default() -> Self {
    Self {
      bundler_command: None,
      out_dir: default_out_dir(),
      static_dir: default_static_dir(),
      temp_dir: default_temp_dir(),
      runtime: None,
      banner: None,
    }
  }
}

fn default_out_dir() -> String {
  "build".to_string()
}

fn default_static_dir() -> String {
  "static".to_string()
}

fn default_temp_dir() -> String {
  ".rola".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevSection {
  #[serde(default = "default_port")]
  pub port: u16,
  /// Defaults to `port + 1`.
  pub reload_port: Option<u16>,
  #[serde(default = "default_watch")]
  pub watch: Vec<String>,
}

impl Default for DevSection {
  fn default() -> Self {
    Self { port: default_port(), reload_port: None, watch: default_watch() }
  }
}

fn default_port() -> u16 {
  3000
}

fn default_watch() -> Vec<String> {
  vec![".".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSection {
  #[serde(default = "default_title")]
  pub title: String,
  #[serde(default = "default_root_id")]
  pub root_id: String,
  #[serde(default = "default_global")]
  pub global: String,
  /// Empty string disables the stylesheet link.
  #[serde(default = "default_stylesheet")]
  pub stylesheet: String,
}

impl Default for DocumentSection {
  fn default() -> Self {
    Self {
      title: default_title(),
      root_id: default_root_id(),
      global: default_global(),
      stylesheet: default_stylesheet(),
    }
  }
}

fn default_title() -> String {
  rola_engine::document::DEFAULT_TITLE.to_string()
}

fn default_root_id() -> String {
  "root".to_string()
}

fn default_global() -> String {
  "__rola".to_string()
}

fn default_stylesheet() -> String {
  "/client.css".to_string()
}

/// Built-in preset selected by `name` in a `[[presets]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum PresetSpec {
  Styles,
  Snippet {
    /// Distinguishes several snippets; defaults to `snippet`.
    label: Option<String>,
    head: Option<String>,
    body: Option<String>,
  },
  Transform {
    directive: String,
  },
}
