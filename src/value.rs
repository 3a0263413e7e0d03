use std::{any::Any, fmt};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// Named-field accessor implemented by every exportable domain object.
///
/// `field` returns one public attribute by name (`None` when the object has no
/// such attribute), `field_names` lists the public attribute names in
/// declaration order. The resolver and both writers depend only on this trait,
/// never on concrete domain types. The `Any` supertrait provides the type key
/// used by the per-writer field-name cache.
pub trait Fields: Any + fmt::Debug {
  fn field(&self, name: &str) -> Option<Value>;
  fn field_names(&self) -> Vec<&'static str>;
}

/// Runtime value produced by field access.
///
/// `Enum` wraps the member's underlying value. `Map` preserves insertion
/// order. `Record` is a nested object behind the [`Fields`] accessor, which is
/// what lets dotted paths walk into it.
#[derive(Debug)]
pub enum Value {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  Bytes(Vec<u8>),
  DateTime(NaiveDateTime),
  Date(NaiveDate),
  Time(NaiveTime),
  Duration(TimeDelta),
  Enum(Box<Value>),
  List(Vec<Value>),
  Map(Vec<(String, Value)>),
  Record(Box<dyn Fields>),
}

impl Value {
  pub fn record(obj: impl Fields + 'static) -> Self {
    Value::Record(Box::new(obj))
  }

  pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
    Value::Bytes(bytes.into())
  }

  pub fn enum_member(underlying: impl Into<Value>) -> Self {
    Value::Enum(Box::new(underlying.into()))
  }

  pub fn list<I>(items: I) -> Self
  where
    I: IntoIterator,
    I::Item: Into<Value>,
  {
    Value::List(items.into_iter().map(Into::into).collect())
  }

  pub fn map<K, V, I>(entries: I) -> Self
  where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
  {
    Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }

  /// Raw emptiness predicate used by fallback-chain evaluation, which tests
  /// values before conversion. Output filtering tests the converted value
  /// instead.
  ///
  /// Empty: absent, `false`, zero-length string/bytes/list/map, numeric zero.
  /// Dates, times, durations and records are never empty; enum members are as
  /// empty as their underlying value.
  pub fn is_empty(&self) -> bool {
    match self {
      Value::Null => true,
      Value::Bool(b) => !b,
      Value::Int(n) => *n == 0,
      Value::Float(f) => *f == 0.0,
      Value::Str(s) => s.is_empty(),
      Value::Bytes(b) => b.is_empty(),
      Value::List(items) => items.is_empty(),
      Value::Map(entries) => entries.is_empty(),
      Value::Enum(inner) => inner.is_empty(),
      _ => false,
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::Str(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::Str(s)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<i64> for Value {
  fn from(n: i64) -> Self {
    Value::Int(n)
  }
}

impl From<i32> for Value {
  fn from(n: i32) -> Self {
    Value::Int(n as i64)
  }
}

impl From<u32> for Value {
  fn from(n: u32) -> Self {
    Value::Int(n as i64)
  }
}

impl From<f64> for Value {
  fn from(f: f64) -> Self {
    Value::Float(f)
  }
}

impl From<f32> for Value {
  fn from(f: f32) -> Self {
    Value::Float(f as f64)
  }
}

impl From<NaiveDateTime> for Value {
  fn from(dt: NaiveDateTime) -> Self {
    Value::DateTime(dt)
  }
}

impl From<NaiveDate> for Value {
  fn from(d: NaiveDate) -> Self {
    Value::Date(d)
  }
}

impl From<NaiveTime> for Value {
  fn from(t: NaiveTime) -> Self {
    Value::Time(t)
  }
}

impl From<TimeDelta> for Value {
  fn from(d: TimeDelta) -> Self {
    Value::Duration(d)
  }
}

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Self {
    Value::List(items)
  }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(opt: Option<T>) -> Self {
    match opt {
      Some(v) => v.into(),
      None => Value::Null,
    }
  }
}
