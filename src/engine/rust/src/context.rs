/* src/engine/rust/src/context.rs */

use crate::state::StateValue;

/// Per-page identity handed to every hook. Built once per render and never
/// mutated while hooks run, so all hooks of one pass observe the same values.
#[derive(Debug, Clone, Default)]
pub struct Context {
  /// Empty for project-level hook calls (`createConfig`, props generation).
  pub pathname: String,
  pub name: String,
  pub version: String,
  pub state: StateValue,
}

impl Context {
  pub fn project(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      pathname: String::new(),
      name: name.into(),
      version: version.into(),
      state: StateValue::empty_object(),
    }
  }

  pub fn for_page(&self, pathname: impl Into<String>, state: StateValue) -> Self {
    Self { pathname: pathname.into(), name: self.name.clone(), version: self.version.clone(), state }
  }

  pub fn is_page(&self) -> bool {
    !self.pathname.is_empty()
  }
}
