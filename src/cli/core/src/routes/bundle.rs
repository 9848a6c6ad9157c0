/* src/cli/core/src/routes/bundle.rs */

// Process protocol with the compiled server bundle. Each call runs
// `<runtime> <bundle>` with `ROLA_COMMAND` set:
//
//   routes  stdout: JSON array of {pathname, load?, config?}; `config` is flatted text
//   load    stdin: flatted {state, request}, stdout: flatted state
//   view    stdin: flatted {pathname, state}, stdout: markup

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

use rola_engine::flatted;
use rola_engine::{
  BoxError, BoxFuture, RenderRequest, RouteDef, RouteSource, StateValue, ViewError, ViewProps,
  component,
};
use serde::Deserialize;

use crate::shell::{EnvVars, capture};

pub const COMMAND_ENV: &str = "ROLA_COMMAND";
pub const PATHNAME_ENV: &str = "ROLA_PATHNAME";

#[derive(Debug, Deserialize)]
struct RouteEntry {
  pathname: String,
  #[serde(default)]
  load: bool,
  config: Option<String>,
}

#[derive(Debug)]
struct BundleProcess {
  runtime: String,
  bundle: PathBuf,
  base_dir: PathBuf,
  env: EnvVars,
}

impl BundleProcess {
  fn env_for(&self, command: &str, pathname: &str) -> EnvVars {
    let mut env = self.env.clone();
    env.push((COMMAND_ENV.to_string(), command.to_string()));
    env.push((PATHNAME_ENV.to_string(), pathname.to_string()));
    env
  }

  async fn call(
    &self,
    command: &str,
    pathname: &str,
    input: Option<&str>,
  ) -> Result<String, BoxError> {
    let bundle = self.bundle.to_string_lossy().into_owned();
    let env = self.env_for(command, pathname);
    let out = capture(&self.runtime, &[bundle.as_str()], &self.base_dir, &env, input)
      .await
      .map_err(|e| format!("{e:#}"))?;
    if !out.success {
      return Err(format!("{command} exited with status {}: {}", out.status, out.diagnostics()).into());
    }
    Ok(out.stdout)
  }

  /// Views run inside the generator's blocking render task.
  fn call_blocking(&self, command: &str, pathname: &str, input: &str) -> Result<String, String> {
    let mut cmd = Command::new(&self.runtime);
    cmd.arg(&self.bundle).current_dir(&self.base_dir);
    cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
    for (k, v) in self.env_for(command, pathname) {
      cmd.env(k, v);
    }
    let mut child = cmd.spawn().map_err(|e| format!("failed to run {}: {e}", self.runtime))?;
    if let Some(mut stdin) = child.stdin.take() {
      stdin.write_all(input.as_bytes()).map_err(|e| format!("failed to write stdin: {e}"))?;
    }
    let output = child.wait_with_output().map_err(|e| format!("{command} did not finish: {e}"))?;
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(format!("{command} exited with status {}: {}", output.status, stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }
}

fn request_state(state: StateValue, req: &RenderRequest) -> StateValue {
  let request = StateValue::object([
    ("pathname", StateValue::string(&req.pathname)),
    ("url", StateValue::string(&req.url)),
  ]);
  StateValue::object([("state", state), ("request", request)])
}

/// Routes exported by the compiled server bundle.
#[derive(Debug, Clone)]
pub struct BundleRoutes {
  process: Arc<BundleProcess>,
}

impl BundleRoutes {
  pub fn new(runtime: impl Into<String>, bundle: PathBuf, base_dir: PathBuf, env: EnvVars) -> Self {
    Self { process: Arc::new(BundleProcess { runtime: runtime.into(), bundle, base_dir, env }) }
  }

  fn route(&self, entry: RouteEntry) -> Result<RouteDef, BoxError> {
    let view_process = self.process.clone();
    let view = component(move |props: &ViewProps| {
      let payload = StateValue::object([
        ("pathname", StateValue::string(&props.pathname)),
        ("state", props.state.clone()),
      ]);
      view_process
        .call_blocking("view", &props.pathname, &flatted::stringify(&payload))
        .map_err(ViewError::new)
    });
    let mut route = RouteDef::new(entry.pathname, view);
    if let Some(config) = entry.config {
      let defaults = flatted::parse(&config)?;
      route = route.with_config(move || defaults.clone());
    }
    if entry.load {
      let process = self.process.clone();
      route = route.with_load(move |state, req| {
        let process = process.clone();
        async move {
          let input = flatted::stringify(&request_state(state, &req));
          let out = process.call("load", &req.pathname, Some(input.as_str())).await?;
          let loaded = flatted::parse(out.trim())?;
          Ok::<_, BoxError>(loaded)
        }
      });
    }
    Ok(route)
  }

  async fn list(self) -> Result<Vec<RouteDef>, BoxError> {
    if !self.process.bundle.is_file() {
      return Err(format!("server bundle {} not found", self.process.bundle.display()).into());
    }
    let out = self.process.call("routes", "", None).await?;
    let entries: Vec<RouteEntry> =
      serde_json::from_str(out.trim()).map_err(|e| format!("invalid route list: {e}"))?;
    entries.into_iter().map(|e| self.route(e)).collect()
  }
}

impl RouteSource for BundleRoutes {
  fn routes(&self) -> BoxFuture<Result<Vec<RouteDef>, BoxError>> {
    Box::pin(self.clone().list())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// A shell script standing in for the server bundle: `sh bundle.sh`.
  const FAKE_BUNDLE: &str = r#"
case "$ROLA_COMMAND" in
  routes) printf '%s' '[{"pathname":"/","config":"[{\"title\":\"1\"},\"Home\"]"},{"pathname":"/data","load":true}]' ;;
  load) cat > /dev/null; printf '%s' '[{"from":"1","self":"0"},"loader"]' ;;
  view) cat > /dev/null; printf '<main>%s</main>' "$ROLA_PATHNAME" ;;
  *) exit 2 ;;
esac
"#;

  fn fake(dir: &std::path::Path) -> BundleRoutes {
    let bundle = dir.join("server.js");
    std::fs::write(&bundle, FAKE_BUNDLE).unwrap();
    BundleRoutes::new("sh", bundle, dir.to_path_buf(), Vec::new())
  }

  #[tokio::test]
  async fn lists_routes_with_defaults_and_loaders() {
    let tmp = tempfile::tempdir().unwrap();
    let routes = fake(tmp.path()).routes().await.unwrap();
    assert_eq!(routes.len(), 2);

    let home = routes[0].resolve_state().await.unwrap();
    assert_eq!(home.get("title").and_then(StateValue::as_str), Some("Home"));

    let data = routes[1].resolve_state().await.unwrap();
    assert_eq!(data.get("from").and_then(StateValue::as_str), Some("loader"));
    // The loader's payload refers to itself; the loop survives the merge.
    let looped = data.get("self").unwrap();
    assert!(looped.get("self").unwrap().same_node(looped));
    assert_eq!(flatted::stringify(looped), r#"[{"from":"1","self":"0"},"loader"]"#);
  }

  #[tokio::test]
  async fn view_renders_through_the_bundle() {
    let tmp = tempfile::tempdir().unwrap();
    let routes = fake(tmp.path()).routes().await.unwrap();
    let view = routes[1].view.clone();
    let markup = tokio::task::spawn_blocking(move || {
      view.render(&ViewProps { pathname: "/data".into(), state: StateValue::empty_object() })
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(markup, "<main>/data</main>");
  }

  #[tokio::test]
  async fn missing_bundle_is_a_source_error() {
    let tmp = tempfile::tempdir().unwrap();
    let routes = BundleRoutes::new("sh", tmp.path().join("server.js"), tmp.path().into(), vec![]);
    let err = routes.routes().await.unwrap_err();
    assert!(err.to_string().contains("not found"));
  }
}
