/* src/cli/core/src/run/tests.rs */

use std::path::Path;
use std::time::Duration;

use rola_engine::route::RouteSet;
use rola_engine::{BoxError, CompileWarning, RouteDef, RouteSource, StateValue, component};

use super::*;
use crate::bundler::BundlerEvent;
use crate::config::RolaConfig;
use crate::props::PROPS_FILE;
use crate::testing::{ScriptedBundler, both_stats};

fn free_port() -> u16 {
  std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

fn project(dir: &Path, entries: &[&str], toml_str: &str) -> Project {
  for entry in entries {
    std::fs::write(dir.join(entry), "").unwrap();
  }
  let config: RolaConfig = toml::from_str(toml_str).unwrap();
  Project::from_config(dir.to_path_buf(), config, None).unwrap()
}

fn page(pathname: &str, body: &'static str) -> RouteDef {
  RouteDef::new(pathname, component(move |_| Ok(body.to_string())))
}

fn routes(defs: Vec<RouteDef>) -> RouteSources {
  vec![Arc::new(RouteSet(defs)) as Arc<dyn RouteSource>]
}

#[tokio::test]
async fn build_compiles_both_entries_and_renders() {
  let tmp = tempfile::tempdir().unwrap();
  let project = project(tmp.path(), &["client.js", "server.js"], "");
  let pages_dir = project.pages_dir();
  let bundler = ScriptedBundler::new(vec![vec![both_stats()]]);
  let log = LogStore::silent();
  let pipeline = Pipeline::new(project, bundler.clone(), log.clone(), Cleanup::new())
    .with_routes(routes(vec![page("/", "<h1>home</h1>"), page("/about", "about")]));

  let summary = pipeline.run_build(false).await.unwrap();
  assert_eq!(summary.configs, 2);
  assert_eq!(bundler.seen().len(), 2);
  assert!(!summary.outcome.failed);
  assert_eq!(summary.outcome.stats.iter().flatten().count(), 2);
  assert_eq!(summary.report.rendered, vec!["/", "/about"]);

  let props = std::fs::read_to_string(tmp.path().join(".rola").join(PROPS_FILE)).unwrap();
  assert!(props.contains("/client.js?v"));
  let home = std::fs::read_to_string(pages_dir.join("index.html")).unwrap();
  assert!(home.contains("<h1>home</h1>"));
  assert!(pages_dir.join("about/index.html").is_file());

  let state = log.snapshot();
  assert!(state.error.is_empty());
  assert_eq!(state.pages, vec!["/", "/about"]);
}

#[tokio::test]
async fn failed_load_keeps_sibling_pages() {
  let tmp = tempfile::tempdir().unwrap();
  let project = project(tmp.path(), &["client.js"], "");
  let pages_dir = project.pages_dir();
  let broken = page("/broken", "never")
    .with_load(|_, _| async { Err::<StateValue, BoxError>("api unreachable".into()) });
  let log = LogStore::silent();
  let bundler = ScriptedBundler::new(vec![vec![both_stats()]]);
  let pipeline = Pipeline::new(project, bundler, log.clone(), Cleanup::new())
    .with_routes(routes(vec![broken, page("/ok", "fine")]));

  let summary = pipeline.run_build(false).await.unwrap();
  assert_eq!(summary.report.failed, vec!["/broken"]);
  assert!(pages_dir.join("ok/index.html").is_file());

  let state = log.snapshot();
  assert_eq!(state.pages, vec!["/ok"]);
  assert_eq!(state.error.len(), 1);
  assert!(state.error[0].contains("api unreachable"));
}

#[tokio::test]
async fn invalid_presets_abort_before_compiling() {
  let tmp = tempfile::tempdir().unwrap();
  let toml_str = "[[presets]]\nname = \"styles\"\n[[presets]]\nname = \"styles\"\n";
  let project = project(tmp.path(), &["client.js"], toml_str);
  let bundler = ScriptedBundler::new(vec![vec![both_stats()]]);
  let pipeline = Pipeline::new(project, bundler.clone(), LogStore::silent(), Cleanup::new());

  assert!(pipeline.run_build(false).await.is_err());
  assert_eq!(bundler.calls(), 0);
}

#[tokio::test]
async fn watch_serves_and_resets_each_cycle() {
  let tmp = tempfile::tempdir().unwrap();
  let (port, reload_port) = (free_port(), free_port());
  let toml_str = format!("[dev]\nport = {port}\nreload_port = {reload_port}\n");
  let project = project(tmp.path(), &["client.js"], &toml_str);
  let pages_dir = project.pages_dir();
  let bundler = ScriptedBundler::new(vec![
    vec![BundlerEvent::Warn(CompileWarning::new("first warning")), both_stats()],
    vec![BundlerEvent::Warn(CompileWarning::new("second warning")), both_stats()],
  ]);
  let log = LogStore::silent();
  let cleanup = Cleanup::new();
  let pipeline = Pipeline::new(project, bundler.clone(), log.clone(), cleanup.clone())
    .with_routes(routes(vec![page("/", "live")]));

  let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
  let run = tokio::spawn(async move {
    pipeline
      .run_watch(async {
        let _ = stopped.await;
      })
      .await
  });

  let mut settled = false;
  for _ in 0..100 {
    let state = log.snapshot();
    if state.warn == vec!["second warning"] && !state.pages.is_empty() && !state.server.is_empty() {
      settled = true;
      break;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
  }
  assert!(settled, "{:?}", log.snapshot());

  let state = log.snapshot();
  assert!(state.error.is_empty(), "{:?}", state.error);
  assert_eq!(state.actions, vec!["watch"]);
  assert_eq!(state.server, vec![format!("http://localhost:{port}")]);
  assert!(pages_dir.join("index.html").is_file());

  // Client configs carry the reloader in watch mode.
  let client = bundler.seen().into_iter().find(|c| c.entry_path.ends_with("client.js")).unwrap();
  assert!(client.banner.contains(&reload_port.to_string()));

  let _ = stop.send(());
  run.await.unwrap().unwrap();
  assert_eq!(cleanup.pending(), 1);
}
