/* src/cli/core/src/routes/mod.rs */

// Route sources the generator renders: the compiled server bundle, spoken to
// over a process protocol, and plain HTML templates under the static dir.

mod bundle;
mod static_dir;

use std::sync::Arc;

use rola_engine::RouteSource;

pub use bundle::BundleRoutes;
pub use static_dir::StaticDirRoutes;

/// The page set of one pass: every source, in order.
pub type RouteSources = Vec<Arc<dyn RouteSource>>;
