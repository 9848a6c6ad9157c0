/* src/engine/rust/src/errors.rs */

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::OutputTarget;

/// Boxed error returned by route collaborators (loaders, route sources).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Malformed build input. Fatal: reported before any compilation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("entry path is required")]
  MissingEntry,
  #[error("preset at position {0} has an empty name")]
  UnnamedPreset(usize),
  #[error("preset \"{0}\" is registered more than once")]
  DuplicatePreset(String),
  #[error("preset name \"{0}\" is reserved for the built-in runtime preset")]
  ReservedPreset(String),
  #[error("preset \"{0}\" declares no hooks")]
  NoHooks(String),
  #[error("preset \"{name}\" declares hook {hook} twice")]
  DuplicateHook { name: String, hook: &'static str },
  #[error("more than one {0} build config")]
  DuplicateTarget(OutputTarget),
}

/// A compile failure reported by the bundler. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
  pub message: String,
  pub file: Option<String>,
}

/// A compile warning reported by the bundler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileWarning {
  pub message: String,
  pub file: Option<String>,
}

impl CompileError {
  pub fn new(message: impl Into<String>) -> Self {
    Self { message: message.into(), file: None }
  }

  pub fn in_file(mut self, file: impl Into<String>) -> Self {
    self.file = Some(file.into());
    self
  }
}

impl CompileWarning {
  pub fn new(message: impl Into<String>) -> Self {
    Self { message: message.into(), file: None }
  }

  pub fn in_file(mut self, file: impl Into<String>) -> Self {
    self.file = Some(file.into());
    self
  }
}

impl fmt::Display for CompileError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.file {
      Some(file) => write!(f, "{file}: {}", self.message),
      None => f.write_str(&self.message),
    }
  }
}

impl fmt::Display for CompileWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.file {
      Some(file) => write!(f, "{file}: {}", self.message),
      None => f.write_str(&self.message),
    }
  }
}

impl std::error::Error for CompileError {}

/// Failure of a single route. Isolated to that page; siblings still render.
#[derive(Debug, Error)]
pub enum PageRenderError {
  #[error("{pathname}: load failed: {source}")]
  Load {
    pathname: String,
    #[source]
    source: BoxError,
  },
  #[error("{pathname}: view failed: {message}")]
  View { pathname: String, message: String },
  #[error("{pathname}: preset \"{preset}\" failed in {hook}: {message}")]
  Hook { pathname: String, preset: String, hook: &'static str, message: String },
  #[error("{pathname}: failed to write {}: {source}", path.display())]
  Write {
    pathname: String,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("{pathname}: duplicate route, rendered once")]
  Duplicate { pathname: String },
}

impl PageRenderError {
  pub fn pathname(&self) -> &str {
    match self {
      Self::Load { pathname, .. }
      | Self::View { pathname, .. }
      | Self::Hook { pathname, .. }
      | Self::Write { pathname, .. }
      | Self::Duplicate { pathname } => pathname,
    }
  }
}

/// Error raised by a component while producing markup.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ViewError(pub String);

impl ViewError {
  pub fn new(message: impl Into<String>) -> Self {
    Self(message.into())
  }
}

/// Error raised by a post-render or document hook.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HookError(pub String);

/// Dev server failed to start or restart. The previous instance, if any, keeps serving.
#[derive(Debug, Error)]
pub enum ServerProcessError {
  #[error("failed to start {}: {source}", bundle.display())]
  Spawn {
    bundle: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("server bundle {} not found", .0.display())]
  MissingBundle(PathBuf),
  #[error("server exited before listening ({0})")]
  Exited(String),
  #[error("server did not listen on port {port} within {secs}s")]
  PortTimeout { port: u16, secs: u64 },
  #[error("failed to bind port {port}: {source}")]
  Bind {
    port: u16,
    #[source]
    source: std::io::Error,
  },
}
