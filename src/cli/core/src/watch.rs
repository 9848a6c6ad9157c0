/* src/cli/core/src/watch.rs */

// File watching shared by the bundler and the static page watcher.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

pub const DEBOUNCE: Duration = Duration::from_millis(300);

fn is_ignored(path: &Path, ignore: &[PathBuf]) -> bool {
  ignore.iter().any(|dir| path.starts_with(dir))
    || path.components().any(|c| matches!(c.as_os_str().to_str(), Some("node_modules" | ".git")))
}

/// Watch `paths` recursively. Events whose paths all fall under `ignore` are dropped.
/// The watcher must be kept alive for as long as the receiver is used.
pub fn watch_paths(
  paths: &[PathBuf],
  ignore: Vec<PathBuf>,
) -> Result<(RecommendedWatcher, mpsc::Receiver<()>)> {
  let (tx, rx) = mpsc::channel(16);
  let mut watcher = RecommendedWatcher::new(
    move |res: std::result::Result<notify::Event, notify::Error>| {
      let Ok(event) = res else { return };
      if event.kind.is_access() || event.paths.iter().all(|p| is_ignored(p, &ignore)) {
        return;
      }
      let _ = tx.blocking_send(());
    },
    notify::Config::default(),
  )?;
  for path in paths {
    if path.exists() {
      watcher
        .watch(path, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", path.display()))?;
    }
  }
  Ok((watcher, rx))
}

/// Wait out the debounce window and drain everything queued meanwhile.
/// Returns false once the channel is closed.
pub async fn next_change(rx: &mut mpsc::Receiver<()>) -> bool {
  if rx.recv().await.is_none() {
    return false;
  }
  tokio::time::sleep(DEBOUNCE).await;
  while rx.try_recv().is_ok() {}
  true
}
