/* src/engine/rust/src/flatted.rs */

//! Reference-preserving serialization in the `flatted` wire format.
//!
//! The output is a JSON array. Entry 0 is the root. Every string and every
//! container reachable from the root is stored once as its own entry; inside
//! containers such values are replaced by their entry index written as a JSON
//! string (`"3"`). Numbers, booleans and null stay inline. A container that is
//! reachable through several keys is therefore emitted once and decodes back
//! into a single shared node. A reference to an entry that is still being
//! decoded (an ancestor) becomes a `StateValue::Ref` back-edge, so cyclic
//! payloads such as `[{"self":"0"}]` decode and re-encode unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::state::{BackRef, StateMap, StateValue};

#[derive(Debug, Error)]
pub enum FlattedError {
  #[error("invalid JSON: {0}")]
  Json(#[from] serde_json::Error),
  #[error("payload must be a non-empty JSON array")]
  NotAnArray,
  #[error("reference \"{0}\" does not point at an entry")]
  BadReference(String),
  #[error("entry {0} contains an inline container")]
  InlineContainer(usize),
}

/// Encode a state graph to flatted text.
pub fn stringify(value: &StateValue) -> String {
  to_entries(value).to_string()
}

/// Encode a state graph to the flatted entry array without rendering it.
pub fn to_entries(value: &StateValue) -> serde_json::Value {
  let mut encoder = Encoder::default();
  encoder.set(value.resolve());
  let mut output = Vec::new();
  let mut i = 0;
  while i < encoder.input.len() {
    let entry = encoder.input[i].clone();
    output.push(encoder.encode_entry(&entry));
    i += 1;
  }
  serde_json::Value::Array(output)
}

/// Decode flatted text back into a state graph.
pub fn parse(text: &str) -> Result<StateValue, FlattedError> {
  from_entries(serde_json::from_str(text)?)
}

/// Decode an already-parsed flatted entry array.
pub fn from_entries(value: serde_json::Value) -> Result<StateValue, FlattedError> {
  let serde_json::Value::Array(entries) = value else {
    return Err(FlattedError::NotAnArray);
  };
  if entries.is_empty() {
    return Err(FlattedError::NotAnArray);
  }
  let mut decoder =
    Decoder { memo: vec![None; entries.len()], open: vec![None; entries.len()], entries };
  decoder.decode_entry(0)
}

/// Entries are owned clones; containers are `Arc`s, so cloning is shallow.
#[derive(Default)]
struct Encoder {
  input: Vec<StateValue>,
  nodes: HashMap<usize, usize>,
  strings: HashMap<String, usize>,
}

impl Encoder {
  fn set(&mut self, value: StateValue) -> usize {
    let index = self.input.len();
    match &value {
      StateValue::String(s) => {
        self.strings.insert(s.clone(), index);
      }
      other => {
        if let Some(id) = other.node_id() {
          self.nodes.insert(id, index);
        }
      }
    }
    self.input.push(value);
    index
  }

  fn reference(&mut self, value: &StateValue) -> serde_json::Value {
    let known = match value {
      StateValue::String(s) => self.strings.get(s.as_str()).copied(),
      other => other.node_id().and_then(|id| self.nodes.get(&id).copied()),
    };
    let index = known.unwrap_or_else(|| self.set(value.clone()));
    serde_json::Value::String(index.to_string())
  }

  fn encode_child(&mut self, value: &StateValue) -> serde_json::Value {
    match value {
      StateValue::String(_) | StateValue::Array(_) | StateValue::Object(_) => {
        self.reference(value)
      }
      // An ancestor is always registered before its descendants are encoded.
      StateValue::Ref(back) => match back.upgrade() {
        Some(target) => self.reference(&target),
        None => serde_json::Value::Null,
      },
      scalar => scalar.to_json(),
    }
  }

  fn encode_entry(&mut self, value: &StateValue) -> serde_json::Value {
    match value {
      StateValue::Array(items) => {
        serde_json::Value::Array(items.iter().map(|item| self.encode_child(item)).collect())
      }
      StateValue::Object(map) => serde_json::Value::Object(
        map.iter().map(|(k, v)| (k.clone(), self.encode_child(v))).collect(),
      ),
      scalar => scalar.to_json(),
    }
  }
}

struct Decoder {
  entries: Vec<serde_json::Value>,
  memo: Vec<Option<StateValue>>,
  /// Containers under construction, by entry index.
  open: Vec<Option<BackRef>>,
}

impl Decoder {
  fn decode_entry(&mut self, index: usize) -> Result<StateValue, FlattedError> {
    if let Some(done) = &self.memo[index] {
      return Ok(done.clone());
    }
    if let Some(back) = &self.open[index] {
      return Ok(StateValue::Ref(back.clone()));
    }

    let entry = self.entries[index].clone();
    let mut failure = None;
    let value = match entry {
      serde_json::Value::Array(items) => StateValue::Array(Arc::new_cyclic(|weak| {
        self.open[index] = Some(BackRef::Array(weak.clone()));
        let mut out = Vec::with_capacity(items.len());
        for item in &items {
          match self.decode_child(index, item) {
            Ok(child) => out.push(child),
            Err(e) => {
              failure = Some(e);
              break;
            }
          }
        }
        out
      })),
      serde_json::Value::Object(map) => StateValue::Object(Arc::new_cyclic(|weak| {
        self.open[index] = Some(BackRef::Object(weak.clone()));
        let mut out = StateMap::new();
        for (k, v) in &map {
          match self.decode_child(index, v) {
            Ok(child) => {
              out.insert(k.clone(), child);
            }
            Err(e) => {
              failure = Some(e);
              break;
            }
          }
        }
        out
      })),
      scalar => StateValue::from(scalar),
    };
    self.open[index] = None;
    if let Some(e) = failure {
      return Err(e);
    }
    self.memo[index] = Some(value.clone());
    Ok(value)
  }

  fn decode_child(
    &mut self,
    parent: usize,
    child: &serde_json::Value,
  ) -> Result<StateValue, FlattedError> {
    match child {
      serde_json::Value::String(reference) => {
        let index = reference
          .parse::<usize>()
          .ok()
          .filter(|i| *i < self.entries.len())
          .ok_or_else(|| FlattedError::BadReference(reference.clone()))?;
        self.decode_entry(index)
      }
      serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
        Err(FlattedError::InlineContainer(parent))
      }
      scalar => Ok(StateValue::from(scalar.clone())),
    }
  }
}
