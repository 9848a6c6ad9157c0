/* src/engine/rust/src/stats.rs */

use serde::{Deserialize, Serialize};

use crate::config::{OutputTarget, is_server_name};
use crate::errors::{CompileError, CompileWarning};

pub const CLIENT_SLOT: usize = 0;
pub const SERVER_SLOT: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
  pub name: String,
  pub size: u64,
}

/// One compiled target's output for one cycle, as reported by the bundler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
  pub assets: Vec<Asset>,
  pub errors: Vec<CompileError>,
  pub warnings: Vec<CompileWarning>,
}

impl BuildStats {
  pub fn with_assets(assets: impl IntoIterator<Item = (&'static str, u64)>) -> Self {
    Self {
      assets: assets.into_iter().map(|(name, size)| Asset { name: name.into(), size }).collect(),
      ..Self::default()
    }
  }

  /// Derived from emitted asset names, never from the originating config.
  pub fn target(&self) -> OutputTarget {
    if self.assets.iter().any(|a| is_server_name(&a.name)) {
      OutputTarget::Server
    } else {
      OutputTarget::Client
    }
  }

  pub fn total_size(&self) -> u64 {
    self.assets.iter().map(|a| a.size).sum()
  }

  pub fn has_errors(&self) -> bool {
    !self.errors.is_empty()
  }
}

/// Fixed two-slot array: client at 0, server at 1.
pub type StatsSlots = [Option<BuildStats>; 2];

/// Place each stats entry in its slot regardless of input order. A later entry
/// for an occupied slot replaces the earlier one.
pub fn classify(stats: impl IntoIterator<Item = BuildStats>) -> StatsSlots {
  let mut slots: StatsSlots = [None, None];
  for entry in stats {
    let slot = match entry.target() {
      OutputTarget::Client => CLIENT_SLOT,
      OutputTarget::Server => SERVER_SLOT,
    };
    slots[slot] = Some(entry);
  }
  slots
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn server_bundle_goes_to_slot_one() {
    let server = BuildStats::with_assets([("server.bundle.js", 10)]);
    let client = BuildStats::with_assets([("client.bundle.js", 20)]);

    let slots = classify([server.clone(), client.clone()]);
    assert_eq!(slots[SERVER_SLOT].as_ref(), Some(&server));
    assert_eq!(slots[CLIENT_SLOT].as_ref(), Some(&client));

    let slots = classify([client.clone(), server.clone()]);
    assert_eq!(slots[SERVER_SLOT].as_ref(), Some(&server));
    assert_eq!(slots[CLIENT_SLOT].as_ref(), Some(&client));
  }

  #[test]
  fn single_target_leaves_other_slot_empty() {
    let slots = classify([BuildStats::with_assets([("client.js", 1), ("client.css", 2)])]);
    assert!(slots[SERVER_SLOT].is_none());
    assert_eq!(slots[CLIENT_SLOT].as_ref().map(BuildStats::total_size), Some(3));
  }

  #[test]
  fn any_server_asset_marks_server() {
    let stats = BuildStats::with_assets([("vendor.js", 1), ("assets/server.js.map", 1)]);
    assert_eq!(stats.target(), OutputTarget::Server);
    assert_eq!(BuildStats::default().target(), OutputTarget::Client);
  }
}
