/* src/cli/core/src/bundler/command.rs */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::join_all;
use rola_engine::{BuildConfig, BuildStats, CompileError, CompileWarning};
use tokio::sync::mpsc;

use super::stats::{read_report, scan_outputs};
use super::{Bundler, BundlerEvent};
use crate::shell::{EnvVars, capture};
use crate::watch::{next_change, watch_paths};

/// Runs `bundler_command` once per BuildConfig through `sh -c`, or, when no
/// command is configured, copies each entry to its output with the banner prepended.
#[derive(Debug, Clone)]
pub struct CommandBundler {
  base_dir: PathBuf,
  command: Option<String>,
  env: EnvVars,
  watch_dirs: Vec<PathBuf>,
  ignore: Vec<PathBuf>,
}

enum Compiled {
  Ok(BuildStats),
  /// A bundler command that wrote no report; assets come from the output scan.
  Unreported(BuildStats, CompileWarning),
  Failed(CompileError),
}

impl CommandBundler {
  pub fn new(base_dir: impl Into<PathBuf>, command: Option<String>, env: EnvVars) -> Self {
    let base_dir = base_dir.into();
    Self { watch_dirs: vec![base_dir.clone()], base_dir, command, env, ignore: Vec::new() }
  }

  pub fn watching(mut self, dirs: Vec<PathBuf>, ignore: Vec<PathBuf>) -> Self {
    self.watch_dirs = dirs;
    self.ignore = ignore;
    self
  }

  fn config_env(&self, config: &BuildConfig) -> EnvVars {
    let mut env = self.env.clone();
    let out_dir = self.base_dir.join(&config.output_path);
    env.extend([
      ("ROLA_ENTRY".to_string(), config.entry_path.to_string_lossy().into_owned()),
      ("ROLA_TARGET".to_string(), config.output_target.to_string()),
      ("ROLA_OUT_DIR".to_string(), out_dir.to_string_lossy().into_owned()),
      ("ROLA_BUNDLE".to_string(), config.bundle_name()),
      ("ROLA_LIBRARY_TARGET".to_string(), config.library_target.unwrap_or("").to_string()),
      ("ROLA_BANNER".to_string(), config.banner.clone()),
      ("ROLA_ALIASES".to_string(), map_json(&config.aliases)),
      ("ROLA_ENV".to_string(), map_json(&config.environment)),
      ("ROLA_TRANSFORMS".to_string(), config.transforms.join(",")),
    ]);
    env
  }

  async fn run_command(&self, command: &str, config: &BuildConfig) -> Result<(), CompileError> {
    let env = self.config_env(config);
    let entry = config.entry_path.to_string_lossy().into_owned();
    tracing::debug!("bundling {entry} ({})", config.output_target);
    let out = capture("sh", &["-c", command], &self.base_dir, &env, None)
      .await
      .map_err(|e| CompileError::new(format!("{e:#}")).in_file(entry.clone()))?;
    if !out.success {
      let mut msg = format!("bundler exited with status {}", out.status);
      let diag = out.diagnostics();
      if !diag.is_empty() {
        msg.push('\n');
        msg.push_str(&diag);
      }
      return Err(CompileError::new(msg).in_file(entry));
    }
    Ok(())
  }

  async fn copy_entry(&self, config: &BuildConfig) -> Result<(), CompileError> {
    let entry = config.entry_path.to_string_lossy().into_owned();
    let fail = |what: &str, path: &Path, e: std::io::Error| {
      CompileError::new(format!("failed to {what} {}: {e}", path.display())).in_file(entry.clone())
    };
    let src = self.base_dir.join(&config.entry_path);
    let source = tokio::fs::read_to_string(&src).await.map_err(|e| fail("read", &src, e))?;
    let out_dir = self.base_dir.join(&config.output_path);
    tokio::fs::create_dir_all(&out_dir).await.map_err(|e| fail("create", &out_dir, e))?;
    let dest = out_dir.join(config.bundle_name());
    let body =
      if config.banner.is_empty() { source } else { format!("{}\n{source}", config.banner) };
    tokio::fs::write(&dest, body).await.map_err(|e| fail("write", &dest, e))?;
    Ok(())
  }

  async fn compile(&self, config: &BuildConfig) -> Compiled {
    let result = match &self.command {
      Some(command) => self.run_command(command, config).await,
      None => self.copy_entry(config).await,
    };
    if let Err(e) = result {
      return Compiled::Failed(e);
    }
    let out_dir = self.base_dir.join(&config.output_path);
    match read_report(&out_dir).await {
      Ok(Some(stats)) => Compiled::Ok(stats),
      Ok(None) if self.command.is_some() => {
        let entry = config.entry_path.to_string_lossy().into_owned();
        let warning =
          CompileWarning::new("bundler wrote no rola-stats.json, listing outputs instead")
            .in_file(entry);
        Compiled::Unreported(scan_outputs(&out_dir, config).await, warning)
      }
      Ok(None) => Compiled::Ok(scan_outputs(&out_dir, config).await),
      Err(msg) => Compiled::Failed(CompileError::new(msg)),
    }
  }

  /// One cycle over every config, concurrently. Returns false if the receiver is gone.
  async fn cycle(&self, configs: &[BuildConfig], tx: &mpsc::Sender<BundlerEvent>) -> bool {
    let results = join_all(configs.iter().map(|c| self.compile(c))).await;
    let mut stats = Vec::with_capacity(results.len());
    for result in results {
      match result {
        Compiled::Ok(s) => stats.push(s),
        Compiled::Unreported(s, warning) => {
          if tx.send(BundlerEvent::Warn(warning)).await.is_err() {
            return false;
          }
          stats.push(s);
        }
        Compiled::Failed(e) => {
          if tx.send(BundlerEvent::Error(e)).await.is_err() {
            return false;
          }
        }
      }
    }
    tx.send(BundlerEvent::Stats(stats)).await.is_ok()
  }
}

impl Bundler for CommandBundler {
  fn build(&self, configs: Arc<[BuildConfig]>) -> mpsc::Receiver<BundlerEvent> {
    let (tx, rx) = mpsc::channel(32);
    let this = self.clone();
    tokio::spawn(async move {
      this.cycle(&configs, &tx).await;
    });
    rx
  }

  fn watch(&self, configs: Arc<[BuildConfig]>) -> anyhow::Result<mpsc::Receiver<BundlerEvent>> {
    let (watcher, mut changes) = watch_paths(&self.watch_dirs, self.ignore.clone())?;
    let (tx, rx) = mpsc::channel(32);
    let this = self.clone();
    tokio::spawn(async move {
      let _watcher = watcher;
      if !this.cycle(&configs, &tx).await {
        return;
      }
      while next_change(&mut changes).await {
        tracing::debug!("source change, recompiling");
        if !this.cycle(&configs, &tx).await {
          break;
        }
      }
    });
    Ok(rx)
  }
}

fn map_json(map: &BTreeMap<String, String>) -> String {
  serde_json::to_string(map).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
  use rola_engine::{ConfigInput, Context, assemble};

  use super::*;

  fn configs(entries: &[&str]) -> Arc<[BuildConfig]> {
    let ctx = Context::project("app", "1.0.0");
    entries
      .iter()
      .map(|e| {
        let input =
          ConfigInput { entry_path: (*e).into(), out_dir: "build".into(), ..Default::default() };
        assemble(input, &ctx).unwrap()
      })
      .collect()
  }

  async fn drain(mut rx: mpsc::Receiver<BundlerEvent>) -> Vec<BundlerEvent> {
    let mut events = Vec::new();
    while let Some(e) = rx.recv().await {
      events.push(e);
    }
    events
  }

  #[tokio::test]
  async fn copy_mode_prepends_banner() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("server.js"), "module.exports = 1;").unwrap();
    std::fs::write(tmp.path().join("client.js"), "boot();").unwrap();
    let bundler = CommandBundler::new(tmp.path(), None, Vec::new());

    let events = drain(bundler.build(configs(&["client.js", "server.js"]))).await;
    let [BundlerEvent::Stats(stats)] = events.as_slice() else { panic!("{events:?}") };
    assert_eq!(stats.len(), 2);

    let server = std::fs::read_to_string(tmp.path().join("build/server.js")).unwrap();
    assert!(server.starts_with("require('source-map-support').install();\n"));
    let client = std::fs::read_to_string(tmp.path().join("build/assets/client.js")).unwrap();
    assert_eq!(client, "boot();");
  }

  #[tokio::test]
  async fn failing_command_reports_error_then_stats() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("client.js"), "").unwrap();
    let cmd = "echo \"cannot bundle $ROLA_ENTRY\" >&2; exit 1".to_string();
    let bundler = CommandBundler::new(tmp.path(), Some(cmd), Vec::new());

    let events = drain(bundler.build(configs(&["client.js"]))).await;
    assert_eq!(events.len(), 2);
    let BundlerEvent::Error(err) = &events[0] else { panic!("{events:?}") };
    assert!(err.message.contains("cannot bundle client.js"));
    assert_eq!(err.file.as_deref(), Some("client.js"));
    assert!(matches!(&events[1], BundlerEvent::Stats(s) if s.is_empty()));
  }

  #[tokio::test]
  async fn command_sees_config_env_and_report() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("server.js"), "").unwrap();
    let cmd = concat!(
      "mkdir -p \"$ROLA_OUT_DIR\" && ",
      "printf '%s' \"$ROLA_TARGET:$ROLA_LIBRARY_TARGET:$ROLA_TRANSFORMS\" > \"$ROLA_OUT_DIR/$ROLA_BUNDLE\" && ",
      "echo '{\"assets\":[{\"name\":\"server.js\",\"size\":1}],\"warnings\":[\"slow\"]}' ",
      "> \"$ROLA_OUT_DIR/rola-stats.json\""
    );
    let bundler = CommandBundler::new(tmp.path(), Some(cmd.to_string()), Vec::new());

    let events = drain(bundler.build(configs(&["server.js"]))).await;
    let [BundlerEvent::Stats(stats)] = events.as_slice() else { panic!("{events:?}") };
    assert_eq!(stats[0].warnings.len(), 1);
    let out = std::fs::read_to_string(tmp.path().join("build/server.js")).unwrap();
    assert_eq!(out, "server:commonjs2:env:node=current,shim:fetch");
  }

  #[tokio::test]
  async fn command_without_report_warns_and_scans() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("server.js"), "").unwrap();
    let cmd = "mkdir -p \"$ROLA_OUT_DIR\" && printf 'x' > \"$ROLA_OUT_DIR/$ROLA_BUNDLE\"";
    let bundler = CommandBundler::new(tmp.path(), Some(cmd.to_string()), Vec::new());

    let events = drain(bundler.build(configs(&["server.js"]))).await;
    let [BundlerEvent::Warn(warning), BundlerEvent::Stats(stats)] = events.as_slice() else {
      panic!("{events:?}")
    };
    assert!(warning.message.contains("rola-stats.json"));
    assert_eq!(warning.file.as_deref(), Some("server.js"));
    assert_eq!(stats[0].assets[0].name, "server.js");
    assert!(stats[0].warnings.is_empty());
  }

  #[tokio::test]
  async fn empty_config_list_emits_empty_stats() {
    let tmp = tempfile::tempdir().unwrap();
    let bundler = CommandBundler::new(tmp.path(), None, Vec::new());
    let events = drain(bundler.build(configs(&[]))).await;
    assert!(matches!(events.as_slice(), [BundlerEvent::Stats(s)] if s.is_empty()));
  }
}
