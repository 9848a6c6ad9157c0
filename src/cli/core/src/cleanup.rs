/* src/cli/core/src/cleanup.rs */

// Exit-time cleanup registry. Tasks run once, newest first, whichever path
// ends the process. Returns and shutdown signals reach the `ExitGuard`; a
// panic runs the registry from the hook, since release builds abort without
// unwinding.

use std::sync::{Arc, Mutex};

type Task = Box<dyn FnOnce() + Send>;

#[derive(Clone, Default)]
pub struct Cleanup {
  tasks: Arc<Mutex<Vec<(String, Task)>>>,
}

impl Cleanup {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&self, label: impl Into<String>, task: impl FnOnce() + Send + 'static) {
    if let Ok(mut tasks) = self.tasks.lock() {
      tasks.push((label.into(), Box::new(task)));
    }
  }

  /// Remove a directory tree at exit. Missing directories are ignored.
  pub fn remove_dir(&self, dir: std::path::PathBuf) {
    let label = format!("remove {}", dir.display());
    self.register(label, move || {
      if let Err(e) = std::fs::remove_dir_all(&dir)
        && e.kind() != std::io::ErrorKind::NotFound
      {
        tracing::warn!("failed to remove {}: {e}", dir.display());
      }
    });
  }

  #[cfg(test)]
  pub fn pending(&self) -> usize {
    self.tasks.lock().map(|t| t.len()).unwrap_or(0)
  }

  /// Drain and run every task. A second call finds nothing left.
  pub fn run(&self) {
    let drained = match self.tasks.lock() {
      Ok(mut tasks) => std::mem::take(&mut *tasks),
      Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    };
    for (label, task) in drained.into_iter().rev() {
      tracing::debug!("cleanup: {label}");
      task();
    }
  }

  pub fn guard(&self) -> ExitGuard {
    ExitGuard(self.clone())
  }

  /// Chain a panic hook that drains the registry after the previous hook reports.
  pub fn run_on_panic(&self) {
    let cleanup = self.clone();
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
      previous(info);
      cleanup.run();
    }));
  }
}

/// Runs the registry when dropped.
pub struct ExitGuard(Cleanup);

impl Drop for ExitGuard {
  fn drop(&mut self) {
    self.0.run();
  }
}
