/* src/cli/core/src/bundler/mod.rs */

// Bundler collaborator: takes the assembled BuildConfigs and reports each
// compile cycle as a stream of typed events ending in `Stats`.

mod command;
mod stats;

use std::sync::Arc;

use rola_engine::{BuildConfig, BuildStats, CompileError, CompileWarning};
use tokio::sync::mpsc;

pub use command::CommandBundler;

#[derive(Debug, Clone)]
pub enum BundlerEvent {
  Error(CompileError),
  Warn(CompileWarning),
  /// Closes a compile cycle: one entry per target that produced output.
  Stats(Vec<BuildStats>),
}

pub trait Bundler: Send + Sync + 'static {
  /// One cycle. The channel closes after the `Stats` event.
  fn build(&self, configs: Arc<[BuildConfig]>) -> mpsc::Receiver<BundlerEvent>;

  /// An initial cycle, then one per source change, until the receiver is dropped.
  fn watch(&self, configs: Arc<[BuildConfig]>) -> anyhow::Result<mpsc::Receiver<BundlerEvent>>;
}
