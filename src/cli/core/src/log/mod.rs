/* src/cli/core/src/log/mod.rs */

// Process-wide LogState. Every mutation is a reducer `LogState -> LogState`;
// partial updates are lifted into reducers with `merge`.

mod render;

use std::sync::{Arc, Mutex, MutexGuard};

use rola_engine::StatsSlots;

pub use render::TerminalSink;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogState {
  pub actions: Vec<String>,
  pub error: Vec<String>,
  pub warn: Vec<String>,
  pub stats: StatsSlots,
  /// Addresses the dev server listens on.
  pub server: Vec<String>,
  /// Pathnames of the latest rendered batch.
  pub pages: Vec<String>,
}

/// Shallow partial update: every `Some` field replaces the previous value.
#[derive(Debug, Clone, Default)]
pub struct LogPatch {
  pub actions: Option<Vec<String>>,
  pub error: Option<Vec<String>>,
  pub warn: Option<Vec<String>>,
  pub stats: Option<StatsSlots>,
  pub server: Option<Vec<String>>,
  pub pages: Option<Vec<String>>,
}

pub fn merge(patch: LogPatch) -> impl FnOnce(LogState) -> LogState {
  move |prev| LogState {
    actions: patch.actions.unwrap_or(prev.actions),
    error: patch.error.unwrap_or(prev.error),
    warn: patch.warn.unwrap_or(prev.warn),
    stats: patch.stats.unwrap_or(prev.stats),
    server: patch.server.unwrap_or(prev.server),
    pages: patch.pages.unwrap_or(prev.pages),
  }
}

/// Receives every transition; the terminal sink prints the difference.
pub trait LogSink: Send {
  fn render(&mut self, prev: &LogState, next: &LogState);
}

/// Discards transitions.
#[cfg(test)]
pub struct NullSink;

#[cfg(test)]
impl LogSink for NullSink {
  fn render(&mut self, _prev: &LogState, _next: &LogState) {}
}

struct Inner {
  state: LogState,
  sink: Box<dyn LogSink>,
}

#[derive(Clone)]
pub struct LogStore {
  inner: Arc<Mutex<Inner>>,
}

impl LogStore {
  pub fn new(sink: impl LogSink + 'static) -> Self {
    Self { inner: Arc::new(Mutex::new(Inner { state: LogState::default(), sink: Box::new(sink) })) }
  }

  #[cfg(test)]
  pub fn silent() -> Self {
    Self::new(NullSink)
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
  }

  /// Apply `reducer` to the current state and hand the transition to the sink.
  pub fn dispatch(&self, reducer: impl FnOnce(LogState) -> LogState) {
    let mut inner = self.lock();
    let prev = std::mem::take(&mut inner.state);
    let next = reducer(prev.clone());
    inner.sink.render(&prev, &next);
    inner.state = next;
  }

  #[cfg(test)]
  pub fn snapshot(&self) -> LogState {
    self.lock().state.clone()
  }

  pub fn action(&self, action: impl Into<String>) {
    let action = action.into();
    self.dispatch(move |mut s| {
      s.actions.push(action);
      s
    });
  }

  pub fn error(&self, message: impl Into<String>) {
    let message = message.into();
    self.dispatch(move |mut s| {
      s.error.push(message);
      s
    });
  }

  pub fn warn(&self, message: impl Into<String>) {
    let message = message.into();
    self.dispatch(move |mut s| {
      s.warn.push(message);
      s
    });
  }

  /// Start of a watch cycle: errors and warnings of the previous cycle go away.
  pub fn reset_cycle(&self) {
    self.dispatch(merge(LogPatch {
      error: Some(Vec::new()),
      warn: Some(Vec::new()),
      ..LogPatch::default()
    }));
  }
}

#[cfg(test)]
mod tests {
  use rola_engine::BuildStats;

  use super::*;

  struct Recording(Arc<Mutex<Vec<(usize, usize)>>>);

  impl LogSink for Recording {
    fn render(&mut self, prev: &LogState, next: &LogState) {
      self.0.lock().unwrap().push((prev.actions.len(), next.actions.len()));
    }
  }

  #[test]
  fn merge_replaces_only_given_fields() {
    let prev = LogState {
      actions: vec!["build".into()],
      error: vec!["e".into()],
      server: vec!["http://localhost:3000".into()],
      ..LogState::default()
    };
    let next = merge(LogPatch { error: Some(vec![]), ..LogPatch::default() })(prev);
    assert_eq!(next.actions, vec!["build"]);
    assert!(next.error.is_empty());
    assert_eq!(next.server.len(), 1);
  }

  #[test]
  fn sink_sees_each_transition() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let store = LogStore::new(Recording(seen.clone()));
    store.action("build");
    store.action("watch");
    assert_eq!(*seen.lock().unwrap(), vec![(0, 1), (1, 2)]);
  }

  #[test]
  fn reset_cycle_keeps_actions_and_server() {
    let store = LogStore::silent();
    store.action("watch");
    store.error("boom");
    store.warn("careful");
    store.dispatch(merge(LogPatch {
      server: Some(vec!["http://localhost:3000".into()]),
      stats: Some([Some(BuildStats::default()), None]),
      ..LogPatch::default()
    }));
    store.reset_cycle();

    let state = store.snapshot();
    assert!(state.error.is_empty());
    assert!(state.warn.is_empty());
    assert_eq!(state.actions, vec!["watch"]);
    assert_eq!(state.server.len(), 1);
    assert!(state.stats[0].is_some());
  }
}
