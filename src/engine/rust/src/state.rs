/* src/engine/rust/src/state.rs */

// Page state as an object graph. Containers sit behind `Arc` so a sub-object
// can appear under several keys and still be the same node; the flatted codec
// preserves that sharing across serialization. A container that reaches one of
// its own ancestors holds a `Ref`, a weak back-edge, so cycles never own
// themselves.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type StateMap = BTreeMap<String, StateValue>;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum StateValue {
  #[default]
  Null,
  Bool(bool),
  Number(serde_json::Number),
  String(String),
  Array(Arc<Vec<StateValue>>),
  Object(Arc<StateMap>),
  /// Back-edge to an enclosing container.
  Ref(BackRef),
}

/// Weak pointer to a container that is an ancestor of the value holding it.
#[derive(Debug, Clone)]
pub enum BackRef {
  Array(Weak<Vec<StateValue>>),
  Object(Weak<StateMap>),
}

impl BackRef {
  /// The referenced container, or `None` once it has been dropped.
  pub fn upgrade(&self) -> Option<StateValue> {
    match self {
      Self::Array(weak) => weak.upgrade().map(StateValue::Array),
      Self::Object(weak) => weak.upgrade().map(StateValue::Object),
    }
  }

  fn node_id(&self) -> usize {
    match self {
      Self::Array(weak) => weak.as_ptr() as usize,
      Self::Object(weak) => weak.as_ptr() as usize,
    }
  }
}

/// Back-edges compare by identity; comparing contents would never terminate.
impl PartialEq for BackRef {
  fn eq(&self, other: &Self) -> bool {
    self.node_id() == other.node_id()
  }
}

impl StateValue {
  pub fn empty_object() -> Self {
    Self::Object(Arc::new(StateMap::new()))
  }

  pub fn object<K, I>(entries: I) -> Self
  where
    K: Into<String>,
    I: IntoIterator<Item = (K, StateValue)>,
  {
    Self::Object(Arc::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()))
  }

  /// Build an object that may refer to itself. `build` receives a `Ref` to the
  /// object under construction.
  pub fn cyclic_object(build: impl FnOnce(StateValue) -> StateMap) -> Self {
    Self::Object(Arc::new_cyclic(|weak| build(Self::Ref(BackRef::Object(weak.clone())))))
  }

  pub fn array(items: impl IntoIterator<Item = StateValue>) -> Self {
    Self::Array(Arc::new(items.into_iter().collect()))
  }

  pub fn string(s: impl Into<String>) -> Self {
    Self::String(s.into())
  }

  pub fn get(&self, key: &str) -> Option<&StateValue> {
    match self {
      Self::Object(map) => map.get(key),
      _ => None,
    }
  }

  /// Resolve a dotted path such as `meta.title`.
  pub fn get_path(&self, path: &str) -> Option<&StateValue> {
    let mut current = self;
    for key in path.split('.') {
      current = current.get(key)?;
    }
    Some(current)
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_object(&self) -> Option<&StateMap> {
    match self {
      Self::Object(map) => Some(map),
      _ => None,
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Self::Null)
  }

  /// Follow a back-edge. Other values are returned as they are; a dangling
  /// edge resolves to `Null`.
  pub fn resolve(&self) -> StateValue {
    match self {
      Self::Ref(back) => back.upgrade().unwrap_or_default(),
      other => other.clone(),
    }
  }

  /// Insert into an object, cloning the map first if it is shared.
  /// Non-object values are replaced by a fresh object.
  pub fn insert(&mut self, key: impl Into<String>, value: StateValue) {
    if !matches!(self, Self::Object(_)) {
      *self = Self::empty_object();
    }
    if let Self::Object(map) = self {
      Arc::make_mut(map).insert(key.into(), value);
    }
  }

  /// Shallow merge of `other`'s keys over this object. A key of `other` that
  /// points back at `other` keeps pointing at it, now as a strong edge, since
  /// the merged object is a different node.
  pub fn merged(&self, other: &StateValue) -> StateValue {
    let mut out = match self {
      Self::Object(_) => self.clone(),
      _ => Self::empty_object(),
    };
    if let Some(map) = other.as_object() {
      for (k, v) in map {
        out.insert(k.clone(), v.resolve());
      }
    }
    out
  }

  /// Identity of a container node; `None` for scalars.
  pub fn node_id(&self) -> Option<usize> {
    match self {
      Self::Array(items) => Some(Arc::as_ptr(items) as usize),
      Self::Object(map) => Some(Arc::as_ptr(map) as usize),
      Self::Ref(back) => Some(back.node_id()),
      _ => None,
    }
  }

  /// True when both values are the same container node, not merely equal.
  pub fn same_node(&self, other: &StateValue) -> bool {
    match (self.node_id(), other.node_id()) {
      (Some(a), Some(b)) => a == b,
      _ => false,
    }
  }

  /// Plain JSON view. Shared nodes are expanded into independent copies and
  /// back-edges are cut to `null`.
  pub fn to_json(&self) -> serde_json::Value {
    match self {
      Self::Null | Self::Ref(_) => serde_json::Value::Null,
      Self::Bool(b) => serde_json::Value::Bool(*b),
      Self::Number(n) => serde_json::Value::Number(n.clone()),
      Self::String(s) => serde_json::Value::String(s.clone()),
      Self::Array(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
      Self::Object(map) => serde_json::Value::Object(
        map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
      ),
    }
  }
}

impl From<serde_json::Value> for StateValue {
  fn from(value: serde_json::Value) -> Self {
    match value {
      serde_json::Value::Null => Self::Null,
      serde_json::Value::Bool(b) => Self::Bool(b),
      serde_json::Value::Number(n) => Self::Number(n),
      serde_json::Value::String(s) => Self::String(s),
      serde_json::Value::Array(items) => Self::array(items.into_iter().map(Self::from)),
      serde_json::Value::Object(map) => Self::object(map.into_iter().map(|(k, v)| (k, v.into()))),
    }
  }
}

impl From<&str> for StateValue {
  fn from(s: &str) -> Self {
    Self::String(s.to_string())
  }
}

impl From<String> for StateValue {
  fn from(s: String) -> Self {
    Self::String(s)
  }
}

impl From<bool> for StateValue {
  fn from(b: bool) -> Self {
    Self::Bool(b)
  }
}

impl From<i64> for StateValue {
  fn from(n: i64) -> Self {
    Self::Number(n.into())
  }
}

impl Serialize for StateValue {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Null | Self::Ref(_) => serializer.serialize_unit(),
      Self::Bool(b) => serializer.serialize_bool(*b),
      Self::Number(n) => n.serialize(serializer),
      Self::String(s) => serializer.serialize_str(s),
      Self::Array(items) => items.serialize(serializer),
      Self::Object(map) => map.serialize(serializer),
    }
  }
}

impl<'de> Deserialize<'de> for StateValue {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Self::from)
  }
}
