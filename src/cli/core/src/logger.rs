/* src/cli/core/src/logger.rs */

// Diagnostic tracing. User-facing output goes through `ui` and the log store;
// this is for `--verbose` / `RUST_LOG` debugging of the orchestration itself.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "rola=debug,rola_cli=debug,rola_engine=debug";
const DEFAULT_FILTER: &str = "rola=warn,rola_cli=warn";

pub fn filter_for(verbose: bool) -> EnvFilter {
  if verbose {
    EnvFilter::new(VERBOSE_FILTER)
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
  }
}

/// Install the global subscriber. Call once, before any spans are entered.
pub fn init_logger(verbose: bool) {
  let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();
  // A second init (tests, embedding) keeps the first subscriber.
  let _ = tracing_subscriber::registry().with(filter_for(verbose)).with(fmt_layer).try_init();
}
