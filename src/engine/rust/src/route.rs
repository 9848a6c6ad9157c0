/* src/engine/rust/src/route.rs */

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::{BoxError, ViewError};
use crate::state::StateValue;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Props passed to the root component of a page.
#[derive(Debug, Clone)]
pub struct ViewProps {
  pub pathname: String,
  pub state: StateValue,
}

/// Opaque renderer contract: something that turns props into markup.
/// Presets wrap components in other components (higher-order composition).
pub trait Component: Send + Sync {
  fn render(&self, props: &ViewProps) -> Result<String, ViewError>;
}

pub type Root = Arc<dyn Component>;

struct FnComponent<F>(F);

impl<F> Component for FnComponent<F>
where
  F: Fn(&ViewProps) -> Result<String, ViewError> + Send + Sync,
{
  fn render(&self, props: &ViewProps) -> Result<String, ViewError> {
    (self.0)(props)
  }
}

/// Lift a closure into a `Root`.
pub fn component<F>(f: F) -> Root
where
  F: Fn(&ViewProps) -> Result<String, ViewError> + Send + Sync + 'static,
{
  Arc::new(FnComponent(f))
}

/// Request-like input given to a route loader. Static generation has no HTTP
/// request, so this carries only what a loader can rely on.
#[derive(Debug, Clone)]
pub struct RenderRequest {
  pub pathname: String,
  pub url: String,
}

impl RenderRequest {
  pub fn for_pathname(pathname: &str) -> Self {
    Self { pathname: pathname.to_string(), url: pathname.to_string() }
  }
}

pub type ConfigFn = Arc<dyn Fn() -> StateValue + Send + Sync>;

pub type LoadFn =
  Arc<dyn Fn(StateValue, RenderRequest) -> BoxFuture<Result<StateValue, BoxError>> + Send + Sync>;

/// One page: default state, optional async loader, and the view.
#[derive(Clone)]
pub struct RouteDef {
  pub pathname: String,
  pub config: ConfigFn,
  pub load: Option<LoadFn>,
  pub view: Root,
}

impl RouteDef {
  pub fn new(pathname: impl Into<String>, view: Root) -> Self {
    Self {
      pathname: pathname.into(),
      config: Arc::new(StateValue::empty_object),
      load: None,
      view,
    }
  }

  pub fn with_config(mut self, config: impl Fn() -> StateValue + Send + Sync + 'static) -> Self {
    self.config = Arc::new(config);
    self
  }

  pub fn with_load<F, Fut>(mut self, load: F) -> Self
  where
    F: Fn(StateValue, RenderRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StateValue, BoxError>> + Send + 'static,
  {
    self.load = Some(Arc::new(move |state, req| Box::pin(load(state, req))));
    self
  }

  /// Default state merged with whatever the loader returns.
  pub async fn resolve_state(&self) -> Result<StateValue, BoxError> {
    let defaults = (self.config)();
    match &self.load {
      Some(load) => {
        let loaded = load(defaults.clone(), RenderRequest::for_pathname(&self.pathname)).await?;
        Ok(defaults.merged(&loaded))
      }
      None => Ok(defaults),
    }
  }
}

impl std::fmt::Debug for RouteDef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RouteDef")
      .field("pathname", &self.pathname)
      .field("load", &self.load.is_some())
      .finish_non_exhaustive()
  }
}

/// Supplier of the page set for one generation pass.
pub trait RouteSource: Send + Sync {
  fn routes(&self) -> BoxFuture<Result<Vec<RouteDef>, BoxError>>;
}

/// Fixed in-memory route set.
#[derive(Clone, Default)]
pub struct RouteSet(pub Vec<RouteDef>);

impl RouteSource for RouteSet {
  fn routes(&self) -> BoxFuture<Result<Vec<RouteDef>, BoxError>> {
    let routes = self.0.clone();
    Box::pin(async move { Ok(routes) })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn state_without_loader_is_config() {
    let route = RouteDef::new("/", component(|_| Ok(String::new())))
      .with_config(|| StateValue::from(json!({"title": "t"})));
    assert_eq!(route.resolve_state().await.unwrap().to_json(), json!({"title": "t"}));
  }

  #[tokio::test]
  async fn loader_output_merges_over_config() {
    let route = RouteDef::new("/a", component(|_| Ok(String::new())))
      .with_config(|| StateValue::from(json!({"title": "default", "keep": true})))
      .with_load(|state, req| async move {
        assert_eq!(state.get("title").and_then(StateValue::as_str), Some("default"));
        Ok(StateValue::from(json!({"title": req.pathname})))
      });
    let state = route.resolve_state().await.unwrap();
    assert_eq!(state.to_json(), json!({"title": "/a", "keep": true}));
  }

  #[tokio::test]
  async fn loader_error_propagates() {
    let route = RouteDef::new("/", component(|_| Ok(String::new()))).with_load(|_, _| async {
      Err::<StateValue, BoxError>(Box::new(std::io::Error::other("disk gone")))
    });
    let err = route.resolve_state().await.unwrap_err();
    assert_eq!(err.to_string(), "disk gone");
  }

  #[test]
  fn component_renders_props() {
    let view = component(|props| Ok(format!("<p>{}</p>", props.pathname)));
    let props = ViewProps { pathname: "/x".into(), state: StateValue::Null };
    assert_eq!(view.render(&props).unwrap(), "<p>/x</p>");
  }
}
