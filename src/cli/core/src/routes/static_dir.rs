/* src/cli/core/src/routes/static_dir.rs */

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use rola_engine::escape::escape_html;
use rola_engine::{BoxError, BoxFuture, RouteDef, RouteSource, StateValue, component};

/// `static/**/*.html` as pages. `a/b.html` is served at `/a/b`, `a/index.html`
/// at `/a`. A sibling `a/b.json` becomes the page's loaded state.
#[derive(Debug, Clone)]
pub struct StaticDirRoutes {
  dir: PathBuf,
}

fn slot_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_$.\-]+)\s*\}\}").expect("slot pattern"))
}

/// Replace `{{ path.to.key }}` with the escaped value at that path of `state`.
/// Missing or null values render as nothing.
pub fn interpolate(template: &str, state: &StateValue) -> String {
  slot_re()
    .replace_all(template, |caps: &Captures<'_>| {
      let text = match state.get_path(&caps[1]) {
        None | Some(StateValue::Null | StateValue::Ref(_)) => String::new(),
        Some(StateValue::String(s)) => s.clone(),
        Some(StateValue::Bool(b)) => b.to_string(),
        Some(StateValue::Number(n)) => n.to_string(),
        Some(other) => other.to_json().to_string(),
      };
      escape_html(&text)
    })
    .into_owned()
}

fn pathname_for(rel: &Path) -> String {
  let mut parts: Vec<String> =
    rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
  if let Some(last) = parts.pop() {
    let stem = last.strip_suffix(".html").unwrap_or(&last).to_string();
    if stem != "index" {
      parts.push(stem);
    }
  }
  format!("/{}", parts.join("/"))
}

async fn collect_html(root: &Path) -> std::io::Result<Vec<PathBuf>> {
  let mut found = Vec::new();
  let mut pending = vec![root.to_path_buf()];
  while let Some(dir) = pending.pop() {
    let mut entries = tokio::fs::read_dir(&dir).await?;
    while let Some(entry) = entries.next_entry().await? {
      let path = entry.path();
      if entry.file_type().await?.is_dir() {
        pending.push(path);
      } else if path.extension().is_some_and(|e| e == "html") {
        found.push(path);
      }
    }
  }
  found.sort();
  Ok(found)
}

async fn read_state(path: PathBuf) -> Result<StateValue, BoxError> {
  let text = tokio::fs::read_to_string(&path)
    .await
    .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
  let json: serde_json::Value =
    serde_json::from_str(&text).map_err(|e| format!("invalid {}: {e}", path.display()))?;
  Ok(StateValue::from(json))
}

impl StaticDirRoutes {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  async fn load_routes(dir: PathBuf) -> Result<Vec<RouteDef>, BoxError> {
    if !dir.is_dir() {
      return Ok(Vec::new());
    }
    let mut routes = Vec::new();
    for path in collect_html(&dir).await? {
      let rel = path.strip_prefix(&dir).unwrap_or(&path);
      let template = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
      let view = component(move |props| Ok(interpolate(&template, &props.state)));
      let mut route = RouteDef::new(pathname_for(rel), view);
      let data = path.with_extension("json");
      if data.is_file() {
        route = route.with_load(move |_defaults, _req| read_state(data.clone()));
      }
      routes.push(route);
    }
    Ok(routes)
  }
}

impl RouteSource for StaticDirRoutes {
  fn routes(&self) -> BoxFuture<Result<Vec<RouteDef>, BoxError>> {
    Box::pin(Self::load_routes(self.dir.clone()))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn pathnames_from_files() {
    assert_eq!(pathname_for(Path::new("index.html")), "/");
    assert_eq!(pathname_for(Path::new("about.html")), "/about");
    assert_eq!(pathname_for(Path::new("blog/index.html")), "/blog");
    assert_eq!(pathname_for(Path::new("blog/first.html")), "/blog/first");
  }

  #[test]
  fn interpolation_escapes_and_tolerates_gaps() {
    let state = StateValue::from(json!({
      "title": "<Hi>",
      "meta": {"count": 3, "draft": false},
      "tags": ["a"]
    }));
    let out = interpolate("{{title}}|{{ meta.count }}|{{meta.draft}}|{{missing}}|{{tags}}", &state);
    assert_eq!(out, "&lt;Hi&gt;|3|false||[&quot;a&quot;]");
  }

  #[tokio::test]
  async fn routes_from_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    std::fs::create_dir_all(dir.join("blog")).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>{{ title }}</h1>").unwrap();
    std::fs::write(dir.join("index.json"), r#"{"title":"Home"}"#).unwrap();
    std::fs::write(dir.join("blog/first.html"), "<p>first</p>").unwrap();
    std::fs::write(dir.join("style.css"), "p{}").unwrap();

    let routes = StaticDirRoutes::new(dir).routes().await.unwrap();
    let names: Vec<_> = routes.iter().map(|r| r.pathname.as_str()).collect();
    assert_eq!(names, vec!["/blog/first", "/"]);

    let home = &routes[1];
    assert!(home.load.is_some());
    let state = home.resolve_state().await.unwrap();
    assert_eq!(state.get("title").and_then(StateValue::as_str), Some("Home"));
    let props = rola_engine::ViewProps { pathname: "/".into(), state };
    assert_eq!(home.view.render(&props).unwrap(), "<h1>Home</h1>");
  }

  #[tokio::test]
  async fn missing_dir_has_no_routes() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(StaticDirRoutes::new(tmp.path().join("static")).routes().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn vanished_data_file_fails_that_load() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("a.html"), "a").unwrap();
    std::fs::write(tmp.path().join("a.json"), "{}").unwrap();
    let routes = StaticDirRoutes::new(tmp.path()).routes().await.unwrap();
    std::fs::remove_file(tmp.path().join("a.json")).unwrap();
    let err = routes[0].resolve_state().await.unwrap_err();
    assert!(err.to_string().contains("a.json"));
  }
}
