/* src/cli/core/src/generator/mod.rs */

// Static Generator: renders every route of every source to a file. A page's
// failure is reported and isolated; only an unusable output directory is fatal.

mod output;


use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use futures_util::future::join_all;
use rola_engine::{PageRenderError, RenderPipeline, RenderedPage, RouteDef, RouteSource};
use tokio::sync::mpsc;

pub use output::page_file;

#[derive(Debug)]
pub enum GeneratorEvent {
  /// Pathnames written by one pass, in route order. Failed pages are absent.
  Rendered(Vec<String>),
  Warn(String),
  PageFailed(PageRenderError),
  /// A route source or the pass itself failed.
  Error(String),
}

#[derive(Debug, Default)]
pub struct RenderReport {
  pub rendered: Vec<String>,
  pub failed: Vec<String>,
}

fn write_error(pathname: &str, path: &Path, source: std::io::Error) -> PageRenderError {
  PageRenderError::Write { pathname: pathname.to_string(), path: path.to_path_buf(), source }
}

#[derive(Clone)]
pub struct StaticGenerator {
  pipeline: RenderPipeline,
  out_dir: PathBuf,
  events: mpsc::UnboundedSender<GeneratorEvent>,
}

impl StaticGenerator {
  pub fn new(
    pipeline: RenderPipeline,
    out_dir: impl Into<PathBuf>,
  ) -> (Self, mpsc::UnboundedReceiver<GeneratorEvent>) {
    let (events, rx) = mpsc::unbounded_channel();
    (Self { pipeline, out_dir: out_dir.into(), events }, rx)
  }

  fn emit(&self, event: GeneratorEvent) {
    // Nobody listening is fine for one-shot callers that only read the report.
    let _ = self.events.send(event);
  }

  async fn collect_routes(&self, sources: &[Arc<dyn RouteSource>]) -> Vec<RouteDef> {
    let mut routes = Vec::new();
    let mut seen = HashSet::new();
    for source in sources {
      match source.routes().await {
        Ok(found) => {
          for route in found {
            if seen.insert(route.pathname.clone()) {
              routes.push(route);
            } else {
              let dup = PageRenderError::Duplicate { pathname: route.pathname };
              self.emit(GeneratorEvent::Warn(dup.to_string()));
            }
          }
        }
        Err(e) => self.emit(GeneratorEvent::Error(format!("failed to list routes: {e}"))),
      }
    }
    routes
  }

  async fn render_page(&self, route: RouteDef) -> Result<RenderedPage, PageRenderError> {
    let pathname = route.pathname.clone();
    let state = route
      .resolve_state()
      .await
      .map_err(|source| PageRenderError::Load { pathname: pathname.clone(), source })?;

    // Views may block (the bundle protocol spawns a process per view).
    let pipeline = self.pipeline.clone();
    let page = tokio::task::spawn_blocking(move || pipeline.render_with_state(&route, state))
      .await
      .map_err(|e| PageRenderError::View {
        pathname: pathname.clone(),
        message: format!("render task failed: {e}"),
      })??;

    let fail = |path: &Path, source| write_error(&pathname, path, source);
    let file = page_file(&self.out_dir, &page.pathname).map_err(|e| fail(&self.out_dir, e))?;
    if let Some(parent) = file.parent() {
      tokio::fs::create_dir_all(parent).await.map_err(|e| fail(parent, e))?;
    }
    tokio::fs::write(&file, &page.html).await.map_err(|e| fail(&file, e))?;
    tracing::debug!("wrote {}", file.display());
    Ok(page)
  }

  /// One pass over every route. Pages render concurrently; each owns its
  /// render scope, so repeated pathnames could not interfere even if allowed.
  pub async fn render(&self, sources: &[Arc<dyn RouteSource>]) -> Result<RenderReport> {
    tokio::fs::create_dir_all(&self.out_dir)
      .await
      .with_context(|| format!("failed to create {}", self.out_dir.display()))?;

    let routes = self.collect_routes(sources).await;
    let pathnames: Vec<String> = routes.iter().map(|r| r.pathname.clone()).collect();
    let results = join_all(routes.into_iter().map(|r| self.render_page(r))).await;

    let mut report = RenderReport::default();
    for (pathname, result) in pathnames.into_iter().zip(results) {
      match result {
        Ok(page) => {
          for warning in page.warnings {
            self.emit(GeneratorEvent::Warn(warning));
          }
          report.rendered.push(pathname);
        }
        Err(e) => {
          self.emit(GeneratorEvent::PageFailed(e));
          report.failed.push(pathname);
        }
      }
    }
    self.emit(GeneratorEvent::Rendered(report.rendered.clone()));
    Ok(report)
  }

  /// Re-render the full page set on every trigger until the trigger channel closes.
  pub async fn watch(&self, sources: Vec<Arc<dyn RouteSource>>, mut triggers: mpsc::Receiver<()>) {
    while triggers.recv().await.is_some() {
      // Coalesce triggers that queued up during the previous pass.
      while triggers.try_recv().is_ok() {}
      if let Err(e) = self.render(&sources).await {
        self.emit(GeneratorEvent::Error(format!("{e:#}")));
      }
    }
  }
}
