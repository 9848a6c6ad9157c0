/* src/engine/rust/src/render.rs */

use std::sync::Arc;

use crate::context::Context;
use crate::document::DocumentBuilder;
use crate::errors::PageRenderError;
use crate::preset::PresetRegistry;
use crate::route::{RouteDef, ViewProps};
use crate::scope::RenderScope;
use crate::state::StateValue;

/// Accumulated output for one page after every hook has run.
#[derive(Debug, Clone)]
pub struct PageResult {
  pub state: StateValue,
  pub head: String,
  pub body: String,
  pub view_markup: String,
}

#[derive(Debug, Clone)]
pub struct RenderedPage {
  pub pathname: String,
  pub html: String,
  /// Non-fatal findings, e.g. stash entries no post-render hook collected.
  pub warnings: Vec<String>,
}

/// Single-page render: load, pre-render hooks, view, post-render hooks,
/// document hooks, document assembly. Safe to run concurrently; every call
/// owns its own `RenderScope`.
#[derive(Clone)]
pub struct RenderPipeline {
  presets: PresetRegistry,
  document: Arc<DocumentBuilder>,
  project: Context,
}

impl RenderPipeline {
  pub fn new(presets: PresetRegistry, document: DocumentBuilder, project: Context) -> Self {
    Self { presets, document: Arc::new(document), project }
  }

  pub fn presets(&self) -> &PresetRegistry {
    &self.presets
  }

  pub fn project(&self) -> &Context {
    &self.project
  }

  pub async fn render_route(&self, route: &RouteDef) -> Result<RenderedPage, PageRenderError> {
    let state = route
      .resolve_state()
      .await
      .map_err(|source| PageRenderError::Load { pathname: route.pathname.clone(), source })?;
    self.render_with_state(route, state)
  }

  /// Render with already-resolved state.
  pub fn render_with_state(
    &self,
    route: &RouteDef,
    state: StateValue,
  ) -> Result<RenderedPage, PageRenderError> {
    let (result, warnings) = self.resolve(route, state)?;
    let html = self.document.build(&result.state, &result.view_markup, &result.head, &result.body);
    Ok(RenderedPage { pathname: route.pathname.clone(), html, warnings })
  }

  fn resolve(
    &self,
    route: &RouteDef,
    state: StateValue,
  ) -> Result<(PageResult, Vec<String>), PageRenderError> {
    let pathname = route.pathname.as_str();
    let ctx = self.project.for_page(pathname, state.clone());
    let mut scope = RenderScope::new(pathname);

    let root = self.presets.wrap_root(Arc::clone(&route.view), &ctx, &mut scope);
    let props = ViewProps { pathname: pathname.to_string(), state: state.clone() };
    let view_markup = root
      .render(&props)
      .map_err(|e| PageRenderError::View { pathname: pathname.to_string(), message: e.0 })?;

    let post = self.presets.run_post_render(&ctx, &mut scope)?;
    let doc = self.presets.run_create_document(&ctx, post.style())?;

    let warnings = scope
      .into_leftovers()
      .into_iter()
      .map(|key| format!("{pathname}: render stash \"{key}\" was never collected"))
      .collect();

    let result = PageResult {
      state,
      head: doc.head + &post.head,
      body: doc.body + &post.body,
      view_markup,
    };
    Ok((result, warnings))
  }
}
