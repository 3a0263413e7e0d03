use std::{fmt, sync::Arc};

use crate::value::{Fields, Value};

/// Computes one output value directly from the primary object, bypassing path
/// resolution. Returning `None` is the swallowed-failure channel: the field
/// becomes absent instead of aborting the export.
pub type Transform = Arc<dyn Fn(&dyn Fields) -> Option<Value> + Send + Sync>;

/// Extraction rule of one normalized attribute. Exhaustively matched at
/// resolution time.
#[derive(Clone)]
pub enum Rule {
  /// Ordered `(object index, dotted path)` pairs. One entry resolves to the
  /// value directly; several entries build a sub-object keyed by each path's
  /// final segment.
  Paths(Vec<(usize, String)>),
  /// Tried left to right; the first non-empty value wins. When every entry is
  /// empty the last attempted (empty) value is kept.
  Fallback(Vec<(usize, String)>),
  Transform(Transform),
}

impl fmt::Debug for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Rule::Paths(paths) => f.debug_tuple("Paths").field(paths).finish(),
      Rule::Fallback(paths) => f.debug_tuple("Fallback").field(paths).finish(),
      Rule::Transform(_) => f.write_str("Transform(<fn>)"),
    }
  }
}

/// One normalized attribute: output label plus extraction rule. Immutable once
/// built; exporters normalize the caller's specs once and reuse them per row.
#[derive(Debug, Clone)]
pub struct NormalizedAttr {
  pub label: String,
  pub rule: Rule,
}

/// Fluent builder for one attribute spec.
///
/// ```
/// use attrex::Attr;
///
/// // Explicit label with a fallback chain:
/// let email = Attr::new("Email").path("email").fallback("company.email");
///
/// // Label inferred from the last path segment ("city"):
/// let city = Attr::from_path("address.city");
/// ```
#[derive(Clone)]
pub struct Attr {
  label: Option<String>,
  paths: Vec<(usize, String)>,
  transform: Option<Transform>,
  is_fallback: bool,
}

impl Attr {
  /// Builder with an explicit output label.
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: Some(label.into()),
      paths: Vec::new(),
      transform: None,
      is_fallback: false,
    }
  }

  /// Builder whose label is inferred from the final segment of its first path.
  pub fn from_path(path: impl Into<String>) -> Self {
    Self {
      label: None,
      paths: vec![(0, path.into())],
      transform: None,
      is_fallback: false,
    }
  }

  /// Append a path on the primary object (index 0).
  pub fn path(self, path: impl Into<String>) -> Self {
    self.path_at(0, path)
  }

  /// Append a path on the object at `index`.
  pub fn path_at(mut self, index: usize, path: impl Into<String>) -> Self {
    self.paths.push((index, path.into()));
    self
  }

  /// Append a fallback path and mark the whole spec as a fallback chain.
  ///
  /// The flag is spec-wide, not per path: once any fallback call is made, all
  /// paths added before and after are tried in order.
  pub fn fallback(self, path: impl Into<String>) -> Self {
    self.fallback_at(0, path)
  }

  pub fn fallback_at(mut self, index: usize, path: impl Into<String>) -> Self {
    self.paths.push((index, path.into()));
    self.is_fallback = true;
    self
  }

  /// Set a transform function. Last call wins; once set, accumulated paths are
  /// ignored at resolution time.
  pub fn transform<F>(mut self, func: F) -> Self
  where
    F: Fn(&dyn Fields) -> Option<Value> + Send + Sync + 'static,
  {
    self.transform = Some(Arc::new(func));
    self
  }

  /// Produce the normalized attribute. Idempotent; the builder is not
  /// consumed or mutated.
  pub fn normalize(&self) -> NormalizedAttr {
    let label = match &self.label {
      Some(label) => label.clone(),
      None => self
        .paths
        .first()
        .map(|(_, path)| last_segment(path).to_string())
        .unwrap_or_else(|| "value".to_string()),
    };
    let rule = if let Some(func) = &self.transform {
      Rule::Transform(Arc::clone(func))
    } else if self.is_fallback {
      Rule::Fallback(self.paths.clone())
    } else {
      Rule::Paths(self.paths.clone())
    };
    NormalizedAttr { label, rule }
  }
}

impl fmt::Debug for Attr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Attr")
      .field("label", &self.label)
      .field("paths", &self.paths)
      .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
      .field("is_fallback", &self.is_fallback)
      .finish()
  }
}

/// Paths accepted by a labeled spec entry.
#[derive(Debug, Clone)]
pub enum PathSet {
  One(String),
  /// Several paths, all on the primary object.
  Many(Vec<String>),
  /// Several paths with explicit object indices.
  Indexed(Vec<(usize, String)>),
}

impl From<&str> for PathSet {
  fn from(path: &str) -> Self {
    PathSet::One(path.to_string())
  }
}

impl From<String> for PathSet {
  fn from(path: String) -> Self {
    PathSet::One(path)
  }
}

impl From<Vec<&str>> for PathSet {
  fn from(paths: Vec<&str>) -> Self {
    PathSet::Many(paths.into_iter().map(str::to_string).collect())
  }
}

impl From<Vec<String>> for PathSet {
  fn from(paths: Vec<String>) -> Self {
    PathSet::Many(paths)
  }
}

impl From<Vec<(usize, &str)>> for PathSet {
  fn from(paths: Vec<(usize, &str)>) -> Self {
    PathSet::Indexed(paths.into_iter().map(|(i, p)| (i, p.to_string())).collect())
  }
}

impl From<Vec<(usize, String)>> for PathSet {
  fn from(paths: Vec<(usize, String)>) -> Self {
    PathSet::Indexed(paths)
  }
}

/// Heterogeneous spec input accepted by both writers: a bare path (used as
/// both label and path), a labeled path set, or a builder.
#[derive(Debug, Clone)]
pub enum AttrSpec {
  Path(String),
  Labeled(String, PathSet),
  Field(Attr),
}

impl From<&str> for AttrSpec {
  fn from(path: &str) -> Self {
    AttrSpec::Path(path.to_string())
  }
}

impl From<String> for AttrSpec {
  fn from(path: String) -> Self {
    AttrSpec::Path(path)
  }
}

impl From<Attr> for AttrSpec {
  fn from(attr: Attr) -> Self {
    AttrSpec::Field(attr)
  }
}

impl<L: Into<String>, P: Into<PathSet>> From<(L, P)> for AttrSpec {
  fn from((label, paths): (L, P)) -> Self {
    AttrSpec::Labeled(label.into(), paths.into())
  }
}

/// Normalize heterogeneous spec inputs into the uniform form both writers
/// consume. Input order is preserved.
pub fn normalize_attrs(specs: &[AttrSpec]) -> Vec<NormalizedAttr> {
  specs
    .iter()
    .map(|spec| match spec {
      AttrSpec::Path(path) => NormalizedAttr {
        label: path.clone(),
        rule: Rule::Paths(vec![(0, path.clone())]),
      },
      AttrSpec::Labeled(label, paths) => {
        let paths = match paths {
          PathSet::One(path) => vec![(0, path.clone())],
          PathSet::Many(paths) => paths.iter().map(|p| (0, p.clone())).collect(),
          PathSet::Indexed(paths) => paths.clone(),
        };
        NormalizedAttr {
          label: label.clone(),
          rule: Rule::Paths(paths),
        }
      }
      AttrSpec::Field(attr) => attr.normalize(),
    })
    .collect()
}

/// Final segment of a dotted path ("company.email" -> "email").
pub(crate) fn last_segment(path: &str) -> &str {
  path.rsplit('.').next().unwrap_or(path)
}
