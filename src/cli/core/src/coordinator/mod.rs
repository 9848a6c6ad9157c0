/* src/cli/core/src/coordinator/mod.rs */

// Build Coordinator: assembles configs, drives the bundler, classifies the
// stats of each cycle and records diagnostics in the LogState. Bundler
// failures are logged, never returned.

mod phase;


use std::sync::{Arc, Mutex};

use rola_engine::{
  BuildConfig, BuildStats, ConfigError, ConfigInput, Context, assemble_all, classify,
};
use tokio::sync::mpsc;

pub use phase::Phase;

use crate::bundler::{Bundler, BundlerEvent};
use crate::log::{LogPatch, LogStore, merge};

/// Result of one compile cycle, delivered after the LogState reflects it.
/// The classified stats live in the LogState.
#[derive(Debug, Clone, Copy)]
pub struct CycleOutcome {
  pub cycle: u32,
  pub failed: bool,
}

impl CycleOutcome {
  /// No configs: the bundler is never contacted.
  fn nothing_to_compile() -> Self {
    Self { cycle: 1, failed: false }
  }
}

pub struct BuildCoordinator<B> {
  bundler: Arc<B>,
  log: LogStore,
  phase: Arc<Mutex<Phase>>,
}

impl<B> Clone for BuildCoordinator<B> {
  fn clone(&self) -> Self {
    Self { bundler: self.bundler.clone(), log: self.log.clone(), phase: self.phase.clone() }
  }
}

fn set_phase(cell: &Mutex<Phase>, next: Phase) {
  let mut phase = cell.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
  if !phase.can_transition_to(next) {
    tracing::warn!("unexpected build phase change {:?} -> {next:?}", *phase);
  }
  tracing::debug!("build phase {:?} -> {next:?}", *phase);
  *phase = next;
}

/// Per-cycle accumulator shared by `build` and `watch`.
struct CycleState<'a> {
  log: &'a LogStore,
  failed: bool,
}

impl CycleState<'_> {
  /// Returns the classified stats when `event` closes the cycle.
  fn apply(&mut self, event: BundlerEvent) -> Option<Vec<BuildStats>> {
    match event {
      BundlerEvent::Error(e) => {
        self.failed = true;
        self.log.error(e.to_string());
        None
      }
      BundlerEvent::Warn(w) => {
        self.log.warn(w.to_string());
        None
      }
      BundlerEvent::Stats(stats) => {
        for entry in &stats {
          self.failed |= entry.has_errors();
          for e in &entry.errors {
            self.log.error(e.to_string());
          }
          for w in &entry.warnings {
            self.log.warn(w.to_string());
          }
        }
        Some(stats)
      }
    }
  }
}

impl<B: Bundler> BuildCoordinator<B> {
  pub fn new(bundler: Arc<B>, log: LogStore) -> Self {
    Self { bundler, log, phase: Arc::new(Mutex::new(Phase::Idle)) }
  }

  pub fn phase(&self) -> Phase {
    *self.phase.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
  }

  /// Assemble one BuildConfig per input; `createConfig` hooks have run on
  /// each before this returns.
  pub fn configure(
    &self,
    inputs: Vec<ConfigInput>,
    ctx: &Context,
  ) -> Result<Arc<[BuildConfig]>, ConfigError> {
    set_phase(&self.phase, Phase::Configuring);
    match assemble_all(inputs, ctx) {
      Ok(configs) => Ok(configs.into()),
      Err(e) => {
        set_phase(&self.phase, Phase::Failed);
        Err(e)
      }
    }
  }

  /// One compile cycle. Stats are classified and logged before this returns.
  pub async fn build(&self, configs: Arc<[BuildConfig]>) -> CycleOutcome {
    if configs.is_empty() {
      set_phase(&self.phase, Phase::Succeeded);
      set_phase(&self.phase, Phase::Idle);
      return CycleOutcome::nothing_to_compile();
    }
    set_phase(&self.phase, Phase::Compiling);
    let mut rx = self.bundler.build(configs);
    let mut state = CycleState { log: &self.log, failed: false };
    let mut stats = None;
    while let Some(event) = rx.recv().await {
      if let Some(s) = state.apply(event) {
        stats = Some(s);
        break;
      }
    }
    let Some(stats) = stats else {
      self.log.error("bundler finished without reporting stats");
      set_phase(&self.phase, Phase::Failed);
      set_phase(&self.phase, Phase::Idle);
      return CycleOutcome { cycle: 1, failed: true };
    };
    let slots = classify(stats);
    // One-shot builds close out the action list along with the stats.
    self.log.dispatch(merge(LogPatch {
      actions: Some(Vec::new()),
      stats: Some(slots),
      ..LogPatch::default()
    }));
    let failed = state.failed;
    set_phase(&self.phase, if failed { Phase::Failed } else { Phase::Succeeded });
    set_phase(&self.phase, Phase::Idle);
    CycleOutcome { cycle: 1, failed }
  }

  /// Continuous cycles. The first event of every cycle clears the previous
  /// cycle's errors and warnings; actions and server entries stay.
  pub fn watch(&self, configs: Arc<[BuildConfig]>) -> anyhow::Result<mpsc::Receiver<CycleOutcome>> {
    let (tx, rx) = mpsc::channel(8);
    if configs.is_empty() {
      set_phase(&self.phase, Phase::Succeeded);
      let _ = tx.try_send(CycleOutcome::nothing_to_compile());
      return Ok(rx);
    }
    let mut events = self.bundler.watch(configs)?;
    let log = self.log.clone();
    let phase = self.phase.clone();
    tokio::spawn(async move {
      let mut cycle = 0;
      let mut state = CycleState { log: &log, failed: false };
      let mut fresh = true;
      while let Some(event) = events.recv().await {
        if fresh {
          fresh = false;
          state.failed = false;
          log.reset_cycle();
          set_phase(&phase, Phase::Compiling);
        }
        let Some(stats) = state.apply(event) else { continue };
        cycle += 1;
        fresh = true;
        let slots = classify(stats);
        log.dispatch(merge(LogPatch { stats: Some(slots), ..LogPatch::default() }));
        let failed = state.failed;
        set_phase(&phase, if failed { Phase::Failed } else { Phase::Succeeded });
        let outcome = CycleOutcome { cycle, failed };
        if tx.send(outcome).await.is_err() {
          break;
        }
      }
      tracing::debug!("bundler watch stream ended after {cycle} cycle(s)");
    });
    Ok(rx)
  }
}
