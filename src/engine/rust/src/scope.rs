/* src/engine/rust/src/scope.rs */

// Render-scoped stash. One scope exists per page render and is threaded through
// pre-render hooks, the view, and post-render hooks, then dropped. Resources a
// preset parks here cannot outlive the render or collide with a concurrent
// render of the same pathname.

use std::any::Any;
use std::collections::HashMap;

pub struct RenderScope {
  pathname: String,
  stash: HashMap<String, Box<dyn Any + Send>>,
}

impl RenderScope {
  pub fn new(pathname: impl Into<String>) -> Self {
    Self { pathname: pathname.into(), stash: HashMap::new() }
  }

  pub fn pathname(&self) -> &str {
    &self.pathname
  }

  /// Park a value under `key`. Returns true if an earlier value was replaced.
  pub fn stash<T: Any + Send>(&mut self, key: &str, value: T) -> bool {
    self.stash.insert(key.to_string(), Box::new(value)).is_some()
  }

  /// Remove and return the value under `key`. A missing key, or a value of a
  /// different type, yields `None`; a mismatched value stays in place.
  pub fn take<T: Any + Send>(&mut self, key: &str) -> Option<T> {
    let boxed = self.stash.remove(key)?;
    match boxed.downcast::<T>() {
      Ok(value) => Some(*value),
      Err(original) => {
        self.stash.insert(key.to_string(), original);
        None
      }
    }
  }

  pub fn contains(&self, key: &str) -> bool {
    self.stash.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.stash.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stash.is_empty()
  }

  /// Consume the scope, returning keys nobody collected (sorted).
  pub fn into_leftovers(self) -> Vec<String> {
    let mut keys: Vec<String> = self.stash.into_keys().collect();
    keys.sort();
    keys
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn take_removes_entry() {
    let mut scope = RenderScope::new("/");
    assert!(!scope.stash("styles", vec![1u8, 2]));
    assert_eq!(scope.len(), 1);
    assert_eq!(scope.take::<Vec<u8>>("styles"), Some(vec![1, 2]));
    assert!(scope.is_empty());
    assert_eq!(scope.take::<Vec<u8>>("styles"), None);
  }

  #[test]
  fn stash_replaces_existing() {
    let mut scope = RenderScope::new("/");
    scope.stash("k", 1u32);
    assert!(scope.stash("k", 2u32));
    assert_eq!(scope.take::<u32>("k"), Some(2));
  }

  #[test]
  fn wrong_type_keeps_value() {
    let mut scope = RenderScope::new("/a");
    scope.stash("k", String::from("v"));
    assert_eq!(scope.take::<u32>("k"), None);
    assert!(scope.contains("k"));
    assert_eq!(scope.into_leftovers(), vec!["k".to_string()]);
  }
}
