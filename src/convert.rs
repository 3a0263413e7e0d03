use std::{
  any::{Any, TypeId},
  cell::RefCell,
  collections::HashMap,
};

use base64::Engine as _;
use chrono::TimeDelta;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::value::{Fields, Value};

/// Per-writer cache of public field names, keyed by concrete object type.
///
/// Populated lazily from `Fields::field_names` and never invalidated; the
/// type key is what makes "same-named but differently-shaped objects" the
/// caller's responsibility. Owned by each writer instance, so its lifetime is
/// scoped to the writer rather than being ambient process state.
#[derive(Debug, Default)]
pub(crate) struct NameCache {
  names: RefCell<HashMap<TypeId, Vec<&'static str>>>,
}

impl NameCache {
  pub(crate) fn names_for(&self, obj: &dyn Fields) -> Vec<&'static str> {
    // Upcast before taking the TypeId so it names the concrete type, not
    // `dyn Fields` itself.
    let key = (obj as &dyn Any).type_id();
    self
      .names
      .borrow_mut()
      .entry(key)
      .or_insert_with(|| obj.field_names())
      .clone()
  }
}

/// Normalize a runtime value to a JSON tree.
///
/// `include_empty=false` drops container entries whose *converted* form is
/// empty, so a map of all-empty entries collapses to `{}`.
pub(crate) fn json_value(value: Value, include_empty: bool, cache: &NameCache) -> JsonValue {
  match value {
    Value::Null => JsonValue::Null,
    Value::Bool(b) => JsonValue::Bool(b),
    Value::Int(n) => JsonValue::Number(n.into()),
    Value::Float(f) => float_value(f),
    Value::Str(s) => JsonValue::String(s),
    Value::Bytes(bytes) => JsonValue::String(bytes_to_string(&bytes)),
    Value::DateTime(dt) => JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
    Value::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
    Value::Time(t) => JsonValue::String(t.format("%H:%M:%S%.f").to_string()),
    Value::Duration(d) => float_value(duration_seconds(&d)),
    Value::Enum(inner) => json_value(*inner, include_empty, cache),
    Value::List(items) => JsonValue::Array(
      items
        .into_iter()
        .map(|item| json_value(item, include_empty, cache))
        .filter(|item| include_empty || !json_is_empty(item))
        .collect(),
    ),
    Value::Map(entries) => {
      let mut out = JsonMap::new();
      for (key, entry) in entries {
        let entry = json_value(entry, include_empty, cache);
        if include_empty || !json_is_empty(&entry) {
          out.insert(key, entry);
        }
      }
      JsonValue::Object(out)
    }
    Value::Record(record) => record_to_json(record.as_ref(), include_empty, cache),
  }
}

/// Generic conversion of a record with no explicit spec: a JSON object of its
/// public fields, recursively normalized.
pub(crate) fn record_to_json(obj: &dyn Fields, include_empty: bool, cache: &NameCache) -> JsonValue {
  let mut out = JsonMap::new();
  for name in cache.names_for(obj) {
    let value = obj.field(name).unwrap_or(Value::Null);
    let value = json_value(value, include_empty, cache);
    if include_empty || !json_is_empty(&value) {
      out.insert(name.to_string(), value);
    }
  }
  JsonValue::Object(out)
}

/// Convert a spec-built sub-object. Unlike [`json_value`] on a map, every
/// final-segment key is kept: the keys come from the spec, not the data, so
/// `include_empty=false` never removes them.
pub(crate) fn group_to_json(
  entries: Vec<(String, Value)>,
  include_empty: bool,
  cache: &NameCache,
) -> JsonValue {
  let mut out = JsonMap::new();
  for (key, entry) in entries {
    out.insert(key, json_value(entry, include_empty, cache));
  }
  JsonValue::Object(out)
}

/// Emptiness of a *converted* value, used for inclusion decisions. Tested
/// after normalization so that a container whose entries all filtered away
/// counts as empty, which its raw form would not.
pub(crate) fn json_is_empty(value: &JsonValue) -> bool {
  match value {
    JsonValue::Null => true,
    JsonValue::Bool(b) => !b,
    JsonValue::Number(n) => n.as_f64() == Some(0.0),
    JsonValue::String(s) => s.is_empty(),
    JsonValue::Array(items) => items.is_empty(),
    JsonValue::Object(entries) => entries.is_empty(),
  }
}

/// Spreadsheet cell representation produced by [`cell_value`].
#[derive(Debug, Clone)]
pub(crate) enum Cell {
  Blank,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  DateTime(chrono::NaiveDateTime),
  Date(chrono::NaiveDate),
}

/// Normalize a runtime value to a spreadsheet cell.
///
/// Dates keep their native temporal representation; maps and lists are
/// flattened to their JSON string form since cells cannot hold nesting;
/// records reaching this writer without a spec degrade to their debug string.
/// `include_empty=false` blanks a cell when its converted form is empty.
pub(crate) fn cell_value(value: Value, include_empty: bool, cache: &NameCache) -> Cell {
  let cell = match value {
    Value::Null => Cell::Blank,
    Value::Bool(b) => Cell::Bool(b),
    Value::Int(n) => Cell::Int(n),
    Value::Float(f) => Cell::Float(f),
    Value::Str(s) => Cell::Str(s),
    Value::Bytes(bytes) => Cell::Str(bytes_to_string(&bytes)),
    Value::DateTime(dt) => Cell::DateTime(dt),
    Value::Date(d) => Cell::Date(d),
    Value::Time(t) => Cell::Str(t.format("%H:%M:%S%.f").to_string()),
    Value::Duration(d) => Cell::Float(duration_seconds(&d)),
    Value::Enum(inner) => cell_value(*inner, include_empty, cache),
    value @ (Value::List(_) | Value::Map(_)) => {
      let json = json_value(value, include_empty, cache);
      if !include_empty && json_is_empty(&json) {
        Cell::Blank
      } else {
        Cell::Str(serde_json::to_string(&json).unwrap_or_default())
      }
    }
    Value::Record(record) => Cell::Str(format!("{record:?}")),
  };
  if !include_empty && cell_is_empty(&cell) {
    return Cell::Blank;
  }
  cell
}

fn cell_is_empty(cell: &Cell) -> bool {
  match cell {
    Cell::Blank => true,
    Cell::Bool(b) => !b,
    Cell::Int(n) => *n == 0,
    Cell::Float(f) => *f == 0.0,
    Cell::Str(s) => s.is_empty(),
    Cell::DateTime(_) | Cell::Date(_) => false,
  }
}

/// UTF-8 decode, or base64 when the bytes are not valid UTF-8.
fn bytes_to_string(bytes: &[u8]) -> String {
  match std::str::from_utf8(bytes) {
    Ok(s) => s.to_string(),
    Err(_) => base64::engine::general_purpose::STANDARD.encode(bytes),
  }
}

// NaN/inf cannot be JSON numbers; degrade to their string form.
fn float_value(f: f64) -> JsonValue {
  Number::from_f64(f)
    .map(JsonValue::Number)
    .unwrap_or_else(|| JsonValue::String(f.to_string()))
}

fn duration_seconds(d: &TimeDelta) -> f64 {
  match d.num_microseconds() {
    Some(us) => us as f64 / 1_000_000.0,
    // Overflowed microseconds: fall back to millisecond precision.
    None => d.num_milliseconds() as f64 / 1_000.0,
  }
}
