/* src/engine/rust/src/lib.rs */

pub mod config;
pub mod context;
pub mod document;
pub mod errors;
pub mod escape;
pub mod flatted;
pub mod meta;
pub mod preset;
pub mod render;
pub mod route;
pub mod scope;
pub mod state;
pub mod stats;

pub use config::{BuildConfig, ConfigInput, OutputTarget, assemble, assemble_all, is_server_name};
pub use context::Context;
pub use document::{DocumentBuilder, DocumentOptions};
pub use errors::{
  BoxError, CompileError, CompileWarning, ConfigError, HookError, PageRenderError,
  ServerProcessError, ViewError,
};
pub use preset::{Fragment, Fragments, Hook, Preset, PresetRegistry};
pub use render::{PageResult, RenderPipeline, RenderedPage};
pub use route::{BoxFuture, Component, RenderRequest, Root, RouteDef, RouteSource, ViewProps, component};
pub use scope::RenderScope;
pub use state::{BackRef, StateMap, StateValue};
pub use stats::{Asset, BuildStats, StatsSlots, classify};
