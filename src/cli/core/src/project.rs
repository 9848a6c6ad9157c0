/* src/cli/core/src/project.rs */

// Resolved project: rola.toml (or defaults) plus everything derived from the
// working directory, the environment and the command line.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use rola_engine::config::ASSETS_DIR;
use rola_engine::preset::{SnippetPreset, StylesPreset, TransformPreset};
use rola_engine::{ConfigInput, Context, DocumentOptions, PresetRegistry};

use crate::config::{PresetSpec, RolaConfig, find_rola_config, load_rola_config, read_package_identity};
use crate::shell::{EnvVars, VERSION_ENV, pick_runtime};
use crate::ui;

const DEFAULT_CLIENT_ENTRY: &str = "client.js";
const DEFAULT_SERVER_ENTRY: &str = "server.js";
const FALLBACK_VERSION: &str = "0.0.0";

#[derive(Debug, Clone)]
pub struct Project {
  pub base_dir: PathBuf,
  pub config: RolaConfig,
  pub name: String,
  pub version: String,
  pub port: u16,
  pub reload_port: u16,
  pub runtime: String,
  /// Relative to `base_dir`; `None` when the entry file does not exist.
  pub client_entry: Option<PathBuf>,
  pub server_entry: Option<PathBuf>,
}

impl Project {
  /// Locate and load config (explicit path or upward discovery from cwd).
  pub fn discover(explicit: Option<PathBuf>, port: Option<u16>) -> Result<Self> {
    let (base_dir, config) = match explicit {
      Some(path) => {
        let config = load_rola_config(&path)?;
        let base = match path.parent() {
          Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
          _ => PathBuf::from("."),
        };
        // Watch events carry absolute paths; ignore prefixes must match them.
        let base = base
          .canonicalize()
          .with_context(|| format!("failed to canonicalize {}", base.display()))?;
        (base, config)
      }
      None => {
        let cwd = std::env::current_dir().context("failed to get cwd")?;
        match find_rola_config(&cwd)? {
          Some(path) => {
            let config = load_rola_config(&path)?;
            (path.parent().map_or(cwd, Path::to_path_buf), config)
          }
          None => (cwd, RolaConfig::default()),
        }
      }
    };
    Self::from_config(base_dir, config, port)
  }

  pub fn from_config(base_dir: PathBuf, config: RolaConfig, port: Option<u16>) -> Result<Self> {
    let (pkg_name, pkg_version) = read_package_identity(&base_dir);
    let name = config
      .project
      .name
      .clone()
      .or(pkg_name)
      .or_else(|| base_dir.file_name().map(|n| n.to_string_lossy().into_owned()))
      .unwrap_or_else(|| "app".to_string());
    let version =
      config.project.version.clone().or(pkg_version).unwrap_or_else(|| FALLBACK_VERSION.into());

    let port = port.unwrap_or(config.dev.port);
    let reload_port = config.dev.reload_port.unwrap_or_else(|| port.saturating_add(1));
    if reload_port == port {
      bail!("reload port {reload_port} collides with the server port");
    }

    let client_entry =
      resolve_entry(&base_dir, config.entries.client.as_deref(), DEFAULT_CLIENT_ENTRY)?;
    let server_entry =
      resolve_entry(&base_dir, config.entries.server.as_deref(), DEFAULT_SERVER_ENTRY)?;
    let runtime = pick_runtime(config.build.runtime.as_deref());

    Ok(Self {
      base_dir,
      config,
      name,
      version,
      port,
      reload_port,
      runtime,
      client_entry,
      server_entry,
    })
  }

  pub fn out_dir(&self) -> PathBuf {
    self.base_dir.join(&self.config.build.out_dir)
  }

  /// Pages are written next to the client assets so one web root serves both.
  pub fn pages_dir(&self) -> PathBuf {
    self.out_dir().join(ASSETS_DIR)
  }

  pub fn static_dir(&self) -> PathBuf {
    self.base_dir.join(&self.config.build.static_dir)
  }

  pub fn temp_dir(&self) -> PathBuf {
    self.base_dir.join(&self.config.build.temp_dir)
  }

  /// Where the compiled server bundle lands.
  pub fn server_bundle(&self) -> Option<PathBuf> {
    let entry = self.server_entry.as_ref()?;
    let file = entry.file_name()?;
    Some(self.out_dir().join(file))
  }

  pub fn context(&self) -> Context {
    Context::project(&self.name, &self.version)
  }

  /// `[env]` plus the version marker, for every spawned collaborator.
  pub fn child_env(&self) -> EnvVars {
    let mut env: EnvVars = self.config.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    env.push((VERSION_ENV.to_string(), ui::VERSION.to_string()));
    env
  }

  pub fn presets(&self) -> Result<PresetRegistry> {
    let mut builder = PresetRegistry::builder();
    for spec in &self.config.presets {
      builder = match spec {
        PresetSpec::Styles => builder.register(StylesPreset),
        PresetSpec::Snippet { label, head, body } => {
          let mut snippet = SnippetPreset::new(label.as_deref().unwrap_or("snippet"));
          if let Some(head) = head {
            snippet = snippet.with_head(head);
          }
          if let Some(body) = body {
            snippet = snippet.with_body(body);
          }
          builder.register(snippet)
        }
        PresetSpec::Transform { directive } => {
          builder.register(TransformPreset::new(directive).named(format!("transform:{directive}")))
        }
      };
    }
    builder.build().context("invalid [[presets]]")
  }

  /// One input per present entry. `client_banner` overrides `build.banner`.
  pub fn config_inputs(
    &self,
    presets: &PresetRegistry,
    client_banner: Option<String>,
  ) -> Vec<ConfigInput> {
    let entries = [self.client_entry.as_ref(), self.server_entry.as_ref()];
    entries
      .into_iter()
      .flatten()
      .map(|entry| ConfigInput {
        entry_path: entry.clone(),
        out_dir: PathBuf::from(&self.config.build.out_dir),
        environment: self.config.env.clone(),
        aliases: self.config.alias.clone(),
        presets: presets.clone(),
        banner: client_banner.clone().or_else(|| self.config.build.banner.clone()),
      })
      .collect()
  }

  /// `dev.watch` resolved against the project root.
  pub fn watch_dirs(&self) -> Vec<PathBuf> {
    self.config.dev.watch.iter().map(|dir| self.base_dir.join(dir)).collect()
  }

  /// Generated paths the compile watcher must not react to.
  pub fn watch_ignore(&self) -> Vec<PathBuf> {
    vec![self.out_dir(), self.temp_dir(), self.static_dir()]
  }

  pub fn document_options(&self) -> DocumentOptions {
    let doc = &self.config.document;
    DocumentOptions {
      default_title: doc.title.clone(),
      root_id: doc.root_id.clone(),
      global: doc.global.clone(),
      stylesheet: (!doc.stylesheet.is_empty()).then(|| doc.stylesheet.clone()),
      client_script: self.client_entry.as_ref().map(|_| "/client.js".to_string()),
    }
  }
}

/// An explicit entry must exist; a default entry is used only when it does.
fn resolve_entry(base_dir: &Path, explicit: Option<&str>, default: &str) -> Result<Option<PathBuf>> {
  match explicit {
    Some(entry) => {
      if !base_dir.join(entry).is_file() {
        bail!("entry {entry} not found in {}", base_dir.display());
      }
      Ok(Some(PathBuf::from(entry)))
    }
    None => Ok(base_dir.join(default).is_file().then(|| PathBuf::from(default))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn project_in(dir: &Path, toml_str: &str) -> Result<Project> {
    let config: RolaConfig = toml::from_str(toml_str).unwrap();
    Project::from_config(dir.to_path_buf(), config, None)
  }

  #[test]
  fn defaults_without_entries() {
    let tmp = tempfile::tempdir().unwrap();
    let project = project_in(tmp.path(), "").unwrap();
    assert!(project.client_entry.is_none());
    assert!(project.server_entry.is_none());
    assert_eq!(project.version, "0.0.0");
    assert_eq!(project.port, 3000);
    assert_eq!(project.reload_port, 3001);
    assert!(project.config_inputs(&PresetRegistry::default(), None).is_empty());
    assert!(project.server_bundle().is_none());
    assert_eq!(project.document_options().client_script, None);
  }

  #[test]
  fn default_entries_picked_up_when_present() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("client.js"), "").unwrap();
    std::fs::write(tmp.path().join("server.js"), "").unwrap();
    let project = project_in(tmp.path(), "").unwrap();
    let inputs = project.config_inputs(&PresetRegistry::default(), None);
    assert_eq!(inputs.len(), 2);
    assert_eq!(project.server_bundle(), Some(tmp.path().join("build/server.js")));
    assert_eq!(project.pages_dir(), tmp.path().join("build/assets"));
    assert_eq!(project.document_options().client_script.as_deref(), Some("/client.js"));
  }

  #[test]
  fn explicit_missing_entry_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let err = project_in(tmp.path(), "[entries]\nserver = \"src/server.js\"").unwrap_err();
    assert!(err.to_string().contains("src/server.js"));
  }

  #[test]
  fn identity_falls_back_to_package_json() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("package.json"), r#"{"name":"pkg","version":"3.0.0"}"#).unwrap();
    let project = project_in(tmp.path(), "").unwrap();
    assert_eq!((project.name.as_str(), project.version.as_str()), ("pkg", "3.0.0"));

    let project = project_in(tmp.path(), "[project]\nname = \"cfg\"").unwrap();
    assert_eq!((project.name.as_str(), project.version.as_str()), ("cfg", "3.0.0"));
  }

  #[test]
  fn port_override_shifts_reload_port() {
    let tmp = tempfile::tempdir().unwrap();
    let project = Project::from_config(tmp.path().into(), RolaConfig::default(), Some(4000)).unwrap();
    assert_eq!((project.port, project.reload_port), (4000, 4001));
  }

  #[test]
  fn child_env_carries_version_marker() {
    let tmp = tempfile::tempdir().unwrap();
    let project = project_in(tmp.path(), "[env]\nAPI = \"x\"").unwrap();
    let env = project.child_env();
    assert!(env.contains(&("API".to_string(), "x".to_string())));
    assert!(env.iter().any(|(k, v)| k == VERSION_ENV && v == ui::VERSION));
  }

  #[test]
  fn presets_from_config_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let toml_str = r#"
[[presets]]
name = "snippet"
body = "<i></i>"

[[presets]]
name = "styles"

[[presets]]
name = "transform"
directive = "jsx"
"#;
    let presets = project_in(tmp.path(), toml_str).unwrap().presets().unwrap();
    assert_eq!(presets.names(), vec!["snippet", "styles", "transform:jsx"]);
  }

  #[test]
  fn duplicate_snippets_need_labels() {
    let tmp = tempfile::tempdir().unwrap();
    let toml_str = "[[presets]]\nname = \"snippet\"\n[[presets]]\nname = \"snippet\"\n";
    let err = project_in(tmp.path(), toml_str).unwrap().presets().unwrap_err();
    assert!(format!("{err:#}").contains("registered more than once"));
  }

  #[test]
  fn snippet_label_cannot_shadow_runtime() {
    let tmp = tempfile::tempdir().unwrap();
    let toml_str = "[[presets]]\nname = \"snippet\"\nlabel = \"runtime\"\n";
    let err = project_in(tmp.path(), toml_str).unwrap().presets().unwrap_err();
    assert!(format!("{err:#}").contains("reserved"));
  }

  #[test]
  fn watch_dirs_are_rooted() {
    let tmp = tempfile::tempdir().unwrap();
    let project = project_in(tmp.path(), "[dev]\nwatch = [\"src\"]").unwrap();
    assert_eq!(project.watch_dirs(), vec![tmp.path().join("src")]);
    assert!(project.watch_ignore().contains(&tmp.path().join("build")));
  }

  #[test]
  fn explicit_config_path_roots_project() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("rola.toml");
    std::fs::write(&path, "[project]\nname = \"explicit\"").unwrap();
    let project = Project::discover(Some(path), None).unwrap();
    assert_eq!(project.name, "explicit");
    assert_eq!(project.base_dir, tmp.path().canonicalize().unwrap());
  }

  #[test]
  fn empty_stylesheet_disables_link() {
    let tmp = tempfile::tempdir().unwrap();
    let project = project_in(tmp.path(), "[document]\nstylesheet = \"\"").unwrap();
    assert!(project.document_options().stylesheet.is_none());
  }
}
