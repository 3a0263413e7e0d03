use tracing::warn;

use crate::{
  attr::{last_segment, Rule},
  value::{Fields, Value},
};

/// Resolve a (possibly dotted) attribute path against one object.
///
/// A missing attribute, or any absent / non-record intermediate value,
/// short-circuits to `Value::Null`. Resolution never fails and costs one
/// `field` lookup per segment.
pub fn resolve(obj: &dyn Fields, path: &str) -> Value {
  if !path.contains('.') {
    return obj.field(path).unwrap_or(Value::Null);
  }

  let mut segments = path.split('.');
  let first = match segments.next() {
    Some(seg) => seg,
    None => return Value::Null,
  };
  let mut current = match obj.field(first) {
    Some(value) => value,
    None => return Value::Null,
  };
  for segment in segments {
    current = match current {
      Value::Record(record) => match record.field(segment) {
        Some(value) => value,
        None => return Value::Null,
      },
      // Absent or scalar intermediate: the whole path is absent.
      _ => return Value::Null,
    };
  }
  current
}

/// Outcome of one extraction rule.
///
/// Sub-objects built from a multi-path rule are kept distinct from
/// `Value::Map`: their keys come from the spec, not the data, so writers
/// must never filter them away.
pub(crate) enum Resolved {
  One(Value),
  Group(Vec<(String, Value)>),
}

/// Evaluate one extraction rule against a row's related objects.
///
/// `objects[0]` is the primary object. An empty row resolves every rule to
/// the absent value (transforms included) rather than panicking.
pub(crate) fn resolve_rule(rule: &Rule, objects: &[&dyn Fields]) -> Resolved {
  if objects.is_empty() {
    return Resolved::One(Value::Null);
  }
  match rule {
    Rule::Transform(func) => Resolved::One(func(objects[0]).unwrap_or(Value::Null)),
    Rule::Fallback(paths) => {
      let mut value = Value::Null;
      for (index, path) in paths {
        value = resolve(target(objects, *index), path);
        if !value.is_empty() {
          break;
        }
      }
      // All entries empty: the last attempted value is kept.
      Resolved::One(value)
    }
    Rule::Paths(paths) => {
      if paths.len() == 1 {
        let (index, path) = &paths[0];
        Resolved::One(resolve(target(objects, *index), path))
      } else {
        Resolved::Group(
          paths
            .iter()
            .map(|(index, path)| {
              (
                last_segment(path).to_string(),
                resolve(target(objects, *index), path),
              )
            })
            .collect(),
        )
      }
    }
  }
}

/// An out-of-range object index falls back to the primary object instead of
/// failing; the fallback is logged but does not change the value contract.
fn target<'a>(objects: &[&'a dyn Fields], index: usize) -> &'a dyn Fields {
  match objects.get(index) {
    Some(obj) => *obj,
    None => {
      warn!(
        index,
        available = objects.len(),
        "object index out of range, using primary object"
      );
      objects[0]
    }
  }
}
