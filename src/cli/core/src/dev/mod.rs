/* src/cli/core/src/dev/mod.rs */

// Dev Server Supervisor. With a server bundle it runs `<runtime> <bundle>` as
// a child on the configured port and restarts it when the bundle changes;
// without one it serves the page directory itself. Either way a reload hub on
// the reload port tells browsers to refresh after every update.

mod network;
mod process;
mod reload;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use axum::Router;
use rola_engine::ServerProcessError;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;

pub use reload::reloader_script;

use self::network::{is_port_free, wait_for_port};
use self::process::{ChildProcess, pipe_output, spawn_server, stop};
use self::reload::ReloadHub;
use crate::log::LogStore;
use crate::shell::EnvVars;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum Strategy {
  /// Supervise the compiled server bundle as a child process.
  Process { runtime: String, bundle: PathBuf, base_dir: PathBuf, env: EnvVars },
  /// Serve a directory of rendered pages and client assets.
  Static { root: PathBuf },
}

pub struct Supervisor {
  strategy: Strategy,
  port: u16,
  reload_port: u16,
  hub: ReloadHub,
  log: LogStore,
  started: AtomicBool,
  child: Mutex<Option<ChildProcess>>,
  bundle_mtime: Mutex<Option<SystemTime>>,
  tasks: Mutex<Vec<JoinHandle<()>>>,
  restart: tokio::sync::Mutex<()>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
  m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn modified(path: &Path) -> Option<SystemTime> {
  std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Sibling copy of the last bundle that started, so relative imports still resolve.
fn last_good_path(bundle: &Path) -> PathBuf {
  let name = bundle.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
  bundle.with_file_name(format!(".last-good-{name}"))
}

fn keep_last_good(bundle: &Path) {
  if let Err(e) = std::fs::copy(bundle, last_good_path(bundle)) {
    tracing::warn!("could not keep a copy of {}: {e}", bundle.display());
  }
}

async fn bind(port: u16) -> Result<tokio::net::TcpListener, ServerProcessError> {
  tokio::net::TcpListener::bind(("0.0.0.0", port))
    .await
    .map_err(|source| ServerProcessError::Bind { port, source })
}

impl Supervisor {
  pub fn new(strategy: Strategy, port: u16, reload_port: u16, log: LogStore) -> Arc<Self> {
    Arc::new(Self {
      strategy,
      port,
      reload_port,
      hub: ReloadHub::default(),
      log,
      started: AtomicBool::new(false),
      child: Mutex::new(None),
      bundle_mtime: Mutex::new(None),
      tasks: Mutex::new(Vec::new()),
      restart: tokio::sync::Mutex::new(()),
    })
  }

  #[cfg(test)]
  pub fn hub(&self) -> &ReloadHub {
    &self.hub
  }

  pub fn is_running(&self) -> bool {
    self.started.load(Ordering::SeqCst)
  }

  fn serve(&self, listener: tokio::net::TcpListener, app: Router, what: &'static str) {
    let handle = tokio::spawn(async move {
      if let Err(e) = axum::serve(listener, app).await {
        tracing::warn!("{what} server stopped: {e}");
      }
    });
    lock(&self.tasks).push(handle);
  }

  /// Start serving. A second call while running does nothing.
  pub async fn init(&self) -> Result<(), ServerProcessError> {
    let _guard = self.restart.lock().await;
    if self.started.swap(true, Ordering::SeqCst) {
      return Ok(());
    }
    if let Err(e) = self.start().await {
      self.close();
      return Err(e);
    }
    let addr = format!("http://localhost:{}", self.port);
    self.log.dispatch(move |mut s| {
      if !s.server.contains(&addr) {
        s.server.push(addr);
      }
      s
    });
    Ok(())
  }

  async fn start(&self) -> Result<(), ServerProcessError> {
    let reload = bind(self.reload_port).await?;
    self.serve(reload, self.hub.router(), "reload");

    match &self.strategy {
      Strategy::Static { root } => {
        let listener = bind(self.port).await?;
        let app = Router::new().fallback_service(ServeDir::new(root));
        self.serve(listener, app, "static");
        Ok(())
      }
      Strategy::Process { runtime, bundle, base_dir, env } => {
        *lock(&self.bundle_mtime) = modified(bundle);
        let proc = self.spawn_and_wait(runtime, bundle, base_dir, env).await?;
        *lock(&self.child) = Some(proc);
        keep_last_good(bundle);
        Ok(())
      }
    }
  }

  async fn spawn_and_wait(
    &self,
    runtime: &str,
    bundle: &Path,
    base_dir: &Path,
    env: &[(String, String)],
  ) -> Result<ChildProcess, ServerProcessError> {
    if !is_port_free(self.port) {
      let source = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port already in use");
      return Err(ServerProcessError::Bind { port: self.port, source });
    }
    let mut proc = spawn_server(runtime, bundle, base_dir, self.port, env)?;
    pipe_output(&mut proc);
    let ready = tokio::select! {
      status = proc.child.wait() => {
        let status = status.map_or_else(|e| e.to_string(), |s| s.to_string());
        Err(ServerProcessError::Exited(status))
      }
      ready = wait_for_port(self.port, STARTUP_TIMEOUT) => ready,
    };
    ready?;
    Ok(proc)
  }

  /// Called after every successful cycle and page pass. Restarts the server
  /// process only when its bundle changed; always asks browsers to reload.
  /// A bundle that fails to start is reported and the last build that did
  /// start is brought back on the same port.
  pub async fn update(&self) -> Result<(), ServerProcessError> {
    if !self.is_running() {
      return Ok(());
    }
    if let Strategy::Process { runtime, bundle, base_dir, env } = &self.strategy {
      let _guard = self.restart.lock().await;
      if !self.is_running() {
        return Ok(());
      }
      let current = modified(bundle);
      let changed = current != *lock(&self.bundle_mtime);
      if changed {
        if current.is_none() {
          // Keep serving the previous build.
          return Err(ServerProcessError::MissingBundle(bundle.clone()));
        }
        *lock(&self.bundle_mtime) = current;
        let previous = lock(&self.child).take();
        if let Some(mut proc) = previous {
          stop(&mut proc, SHUTDOWN_GRACE).await;
        }
        match self.spawn_and_wait(runtime, bundle, base_dir, env).await {
          Ok(proc) => {
            *lock(&self.child) = Some(proc);
            keep_last_good(bundle);
            tracing::debug!("server restarted on port {}", self.port);
          }
          Err(e) => {
            self.restore_last_good(runtime, bundle, base_dir, env).await;
            return Err(e);
          }
        }
      }
    }
    self.hub.broadcast(reload::RELOAD_EVENT);
    Ok(())
  }

  async fn restore_last_good(
    &self,
    runtime: &str,
    bundle: &Path,
    base_dir: &Path,
    env: &[(String, String)],
  ) {
    let copy = last_good_path(bundle);
    if !copy.is_file() {
      return;
    }
    match self.spawn_and_wait(runtime, &copy, base_dir, env).await {
      Ok(proc) => {
        *lock(&self.child) = Some(proc);
        tracing::warn!("new server bundle did not start, serving the previous build");
      }
      Err(e) => tracing::warn!("previous server build did not restart: {e}"),
    }
  }

  /// Synchronous shutdown for exit-time cleanup. Safe to call repeatedly.
  pub fn close(&self) {
    self.started.store(false, Ordering::SeqCst);
    if let Some(mut proc) = lock(&self.child).take() {
      let _ = proc.child.start_kill();
    }
    for task in lock(&self.tasks).drain(..) {
      task.abort();
    }
    if let Strategy::Process { bundle, .. } = &self.strategy {
      let _ = std::fs::remove_file(last_good_path(bundle));
    }
  }
}
