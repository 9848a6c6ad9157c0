/* src/cli/core/src/run/mod.rs */

// The two CLI passes. Both assemble configs, write the properties file, run
// the coordinator and feed the generator; they differ in how long they live.

mod build;
mod watch;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use rola_engine::{BuildConfig, DocumentBuilder, PresetRegistry, RenderPipeline};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bundler::Bundler;
use crate::cleanup::Cleanup;
use crate::coordinator::BuildCoordinator;
use crate::dev::{Strategy, Supervisor};
use crate::generator::{GeneratorEvent, StaticGenerator};
use crate::log::{LogPatch, LogStore, merge};
use crate::project::Project;
use crate::props::write_props;
use crate::routes::{BundleRoutes, RouteSources, StaticDirRoutes};

pub struct Pipeline<B> {
  project: Project,
  bundler: Arc<B>,
  log: LogStore,
  cleanup: Cleanup,
  routes: RouteSources,
}

impl<B: Bundler> Pipeline<B> {
  pub fn new(project: Project, bundler: Arc<B>, log: LogStore, cleanup: Cleanup) -> Self {
    let routes = default_routes(&project);
    Self { project, bundler, log, cleanup, routes }
  }

  /// Replace the page set, e.g. with in-memory routes.
  #[cfg(test)]
  pub fn with_routes(mut self, routes: RouteSources) -> Self {
    self.routes = routes;
    self
  }

  /// Presets, assembled configs and the properties file. Any failure here is fatal.
  fn prepare(
    &self,
    client_banner: Option<String>,
  ) -> Result<(PresetRegistry, BuildCoordinator<B>, Arc<[BuildConfig]>)> {
    let presets = self.project.presets()?;
    let ctx = self.project.context();
    let coordinator = BuildCoordinator::new(self.bundler.clone(), self.log.clone());
    let inputs = self.project.config_inputs(&presets, client_banner);
    let configs = coordinator.configure(inputs, &ctx).context("invalid build configuration")?;
    write_props(&self.project.temp_dir(), &ctx, &presets, self.project.client_entry.is_some())?;
    Ok((presets, coordinator, configs))
  }

  fn generator(
    &self,
    presets: PresetRegistry,
  ) -> (StaticGenerator, mpsc::UnboundedReceiver<GeneratorEvent>) {
    let document = DocumentBuilder::new(self.project.document_options());
    let pipeline = RenderPipeline::new(presets, document, self.project.context());
    StaticGenerator::new(pipeline, self.project.pages_dir())
  }

  fn supervisor(&self) -> Arc<Supervisor> {
    let project = &self.project;
    let strategy = match project.server_bundle() {
      Some(bundle) => Strategy::Process {
        runtime: project.runtime.clone(),
        bundle,
        base_dir: project.base_dir.clone(),
        env: project.child_env(),
      },
      None => Strategy::Static { root: project.pages_dir() },
    };
    let supervisor = Supervisor::new(strategy, project.port, project.reload_port, self.log.clone());
    let handle = supervisor.clone();
    self.cleanup.register("dev server", move || handle.close());
    supervisor
  }
}

fn default_routes(project: &Project) -> RouteSources {
  let mut routes: RouteSources = Vec::new();
  if let Some(bundle) = project.server_bundle() {
    routes.push(Arc::new(BundleRoutes::new(
      project.runtime.clone(),
      bundle,
      project.base_dir.clone(),
      project.child_env(),
    )));
  }
  routes.push(Arc::new(StaticDirRoutes::new(project.static_dir())));
  routes
}

/// Move generator events into the LogState. After each finished pass the
/// supervisor, when given, is updated so browsers pick up the new pages.
fn forward_events(
  mut events: mpsc::UnboundedReceiver<GeneratorEvent>,
  log: LogStore,
  supervisor: Option<Arc<Supervisor>>,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    while let Some(event) = events.recv().await {
      match event {
        GeneratorEvent::Rendered(pages) => {
          log.dispatch(merge(LogPatch { pages: Some(pages), ..LogPatch::default() }));
          if let Some(supervisor) = &supervisor
            && let Err(e) = supervisor.update().await
          {
            log.error(e.to_string());
          }
        }
        GeneratorEvent::Warn(msg) => log.warn(msg),
        GeneratorEvent::PageFailed(e) => log.error(e.to_string()),
        GeneratorEvent::Error(msg) => log.error(msg),
      }
    }
  })
}
