/* src/cli/core/src/testing.rs */

// Test doubles shared across module tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rola_engine::{BuildConfig, BuildStats};
use tokio::sync::mpsc;

use crate::bundler::{Bundler, BundlerEvent};

/// Replays scripted cycles: `build` sends the first, `watch` sends them all.
pub struct ScriptedBundler {
  cycles: Vec<Vec<BundlerEvent>>,
  calls: AtomicUsize,
  seen: Mutex<Vec<BuildConfig>>,
}

impl ScriptedBundler {
  pub fn new(cycles: Vec<Vec<BundlerEvent>>) -> Arc<Self> {
    Arc::new(Self { cycles, calls: AtomicUsize::new(0), seen: Mutex::new(Vec::new()) })
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  /// Configs handed over by the last call.
  pub fn seen(&self) -> Vec<BuildConfig> {
    self.seen.lock().unwrap().clone()
  }

  fn replay(
    &self,
    configs: &[BuildConfig],
    cycles: Vec<Vec<BundlerEvent>>,
  ) -> mpsc::Receiver<BundlerEvent> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    *self.seen.lock().unwrap() = configs.to_vec();
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
      for event in cycles.into_iter().flatten() {
        if tx.send(event).await.is_err() {
          return;
        }
      }
    });
    rx
  }
}

impl Bundler for ScriptedBundler {
  fn build(&self, configs: Arc<[BuildConfig]>) -> mpsc::Receiver<BundlerEvent> {
    self.replay(&configs, self.cycles.iter().take(1).cloned().collect())
  }

  fn watch(&self, configs: Arc<[BuildConfig]>) -> anyhow::Result<mpsc::Receiver<BundlerEvent>> {
    Ok(self.replay(&configs, self.cycles.clone()))
  }
}

/// Stats for a compiled client and server bundle.
pub fn both_stats() -> BundlerEvent {
  BundlerEvent::Stats(vec![
    BuildStats::with_assets([("server.bundle.js", 10)]),
    BuildStats::with_assets([("client.bundle.js", 20)]),
  ])
}
