mod attr;
mod convert;
mod error;
mod formats;
mod resolve;
mod value;

pub use crate::attr::{normalize_attrs, Attr, AttrSpec, NormalizedAttr, PathSet, Rule, Transform};
pub use crate::error::ExportError;
pub use crate::formats::{ExcelExporter, ExcelOptions, ExportResult, JsonExporter, JsonOptions};
pub use crate::resolve::resolve;
pub use crate::value::{Fields, Value};
