/* src/cli/core/src/run/build.rs */

use anyhow::Result;

use super::{Pipeline, forward_events};
use crate::bundler::Bundler;
use crate::coordinator::CycleOutcome;
use crate::generator::RenderReport;

#[derive(Debug)]
pub struct BuildSummary {
  pub configs: usize,
  pub outcome: CycleOutcome,
  pub report: RenderReport,
}

impl<B: Bundler> Pipeline<B> {
  /// Compile once, render every page once. With `serve`, the server bundle
  /// runs while pages render so loaders can reach it; it is closed at exit.
  pub async fn run_build(&self, serve: bool) -> Result<BuildSummary> {
    self.log.action("build");
    let (presets, coordinator, configs) = self.prepare(None)?;
    let config_count = configs.len();
    let outcome = coordinator.build(configs).await;

    if serve && !outcome.failed && self.project.server_bundle().is_some_and(|b| b.is_file()) {
      let supervisor = self.supervisor();
      if let Err(e) = supervisor.init().await {
        self.log.error(e.to_string());
      }
    }

    let (generator, events) = self.generator(presets);
    let forwarder = forward_events(events, self.log.clone(), None);
    let report = generator.render(&self.routes).await;
    drop(generator);
    // Every page event is in the log before the summary is returned.
    let _ = forwarder.await;

    Ok(BuildSummary { configs: config_count, outcome, report: report? })
  }
}
