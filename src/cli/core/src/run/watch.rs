/* src/cli/core/src/run/watch.rs */

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use super::{Pipeline, forward_events};
use crate::bundler::Bundler;
use crate::coordinator::CycleOutcome;
use crate::dev::{Supervisor, reloader_script};
use crate::watch::{next_change, watch_paths};

impl<B: Bundler> Pipeline<B> {
  /// Compile, render and serve continuously until `shutdown` resolves.
  pub async fn run_watch(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
    self.log.action("watch");
    let banner = reloader_script(self.project.reload_port);
    let (presets, coordinator, configs) = self.prepare(Some(banner))?;
    let supervisor = self.supervisor();

    let (generator, events) = self.generator(presets);
    let forwarder = forward_events(events, self.log.clone(), Some(supervisor.clone()));
    let (trigger, triggers) = mpsc::channel::<()>(8);
    let routes = self.routes.clone();
    let render_loop = tokio::spawn(async move { generator.watch(routes, triggers).await });

    // Template edits re-render without a compile.
    let static_dir = self.project.static_dir();
    let static_loop = match watch_paths(&[static_dir], Vec::new()) {
      Ok((watcher, mut changes)) => {
        let trigger = trigger.clone();
        Some(tokio::spawn(async move {
          let _watcher = watcher;
          while next_change(&mut changes).await {
            if trigger.send(()).await.is_err() {
              break;
            }
          }
        }))
      }
      Err(e) => {
        self.log.warn(format!("not watching static pages: {e:#}"));
        None
      }
    };

    let mut outcomes = coordinator.watch(configs)?;
    tokio::pin!(shutdown);
    loop {
      tokio::select! {
        () = &mut shutdown => break,
        outcome = outcomes.recv() => match outcome {
          Some(outcome) => self.on_cycle(&outcome, &supervisor, &trigger).await,
          None => {
            let phase = coordinator.phase();
            tracing::debug!("compile stream closed in phase {phase:?} (done: {})", phase.is_done());
            // No further compiles; keep serving until shutdown.
            (&mut shutdown).await;
            break;
          }
        },
      }
    }

    drop(trigger);
    for task in [Some(render_loop), static_loop, Some(forwarder)].into_iter().flatten() {
      task.abort();
    }
    supervisor.close();
    Ok(())
  }

  /// A failed cycle leaves the last good pages and server in place.
  async fn on_cycle(
    &self,
    outcome: &CycleOutcome,
    supervisor: &Arc<Supervisor>,
    trigger: &mpsc::Sender<()>,
  ) {
    if outcome.failed {
      tracing::debug!("cycle {} failed, keeping previous output", outcome.cycle);
      return;
    }
    let started =
      if supervisor.is_running() { supervisor.update().await } else { supervisor.init().await };
    if let Err(e) = started {
      self.log.error(e.to_string());
    }
    let _ = trigger.send(()).await;
  }
}
