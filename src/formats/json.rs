use std::{
  fs::File,
  io::{BufWriter, Write},
  path::Path,
};

use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::{
  attr::{normalize_attrs, AttrSpec, NormalizedAttr},
  convert::{group_to_json, json_is_empty, json_value, record_to_json, NameCache},
  error::ExportError,
  formats::ExportResult,
  resolve::{resolve_rule, Resolved},
  value::Fields,
};

#[derive(Debug, Clone)]
pub struct JsonOptions {
  /// Include empty-valued fields in the output.
  pub include_empty: bool,
  /// Pretty-print width in spaces; `None` renders compact output.
  pub indent: Option<usize>,
  /// Escape every non-ASCII character as `\uXXXX`.
  pub ensure_ascii: bool,
}

impl Default for JsonOptions {
  fn default() -> Self {
    Self {
      include_empty: true,
      indent: Some(4),
      ensure_ascii: false,
    }
  }
}

/// JSON writer: converts objects (optionally filtered through attribute
/// specs) into a JSON document.
#[derive(Debug)]
pub struct JsonExporter {
  options: JsonOptions,
  cache: NameCache,
}

impl JsonExporter {
  pub fn new(options: JsonOptions) -> Self {
    Self {
      options,
      cache: NameCache::default(),
    }
  }

  /// Write the objects to a file in one pass.
  ///
  /// Without `attrs`, each object is converted generically from its public
  /// fields. With `attrs`, each object becomes an object keyed by the spec
  /// labels. `root_key` wraps the resulting list in a single-entry object.
  pub fn export(
    &self,
    path: &Path,
    objects: &[&dyn Fields],
    root_key: Option<&str>,
    attrs: Option<&[AttrSpec]>,
  ) -> Result<ExportResult, ExportError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let out_file = File::create(path)?;
    let mut writer = BufWriter::new(out_file);
    let rows_written = self.write(&mut writer, objects, root_key, attrs)?;
    writer.flush()?;
    Ok(ExportResult {
      output_path: path.to_string_lossy().to_string(),
      rows_written,
    })
  }

  /// Write the rendered document to a caller-supplied sink.
  pub fn write<W: Write>(
    &self,
    writer: &mut W,
    objects: &[&dyn Fields],
    root_key: Option<&str>,
    attrs: Option<&[AttrSpec]>,
  ) -> Result<u64, ExportError> {
    let text = self.to_string(objects, root_key, attrs)?;
    writer.write_all(text.as_bytes())?;
    Ok(objects.len() as u64)
  }

  /// Render the document to a string.
  pub fn to_string(
    &self,
    objects: &[&dyn Fields],
    root_key: Option<&str>,
    attrs: Option<&[AttrSpec]>,
  ) -> Result<String, ExportError> {
    let data = self.build(objects, root_key, attrs);
    self.render(&data)
  }

  /// Convert a single object to a JSON value.
  pub fn serialize(&self, obj: &dyn Fields, attrs: Option<&[AttrSpec]>) -> JsonValue {
    match attrs {
      Some(attrs) => self.serialize_related(&[obj], attrs),
      None => record_to_json(obj, self.options.include_empty, &self.cache),
    }
  }

  /// Convert one row of related objects (`objects[0]` is the primary object)
  /// to a JSON value using the given specs.
  pub fn serialize_related(&self, objects: &[&dyn Fields], attrs: &[AttrSpec]) -> JsonValue {
    let specs = normalize_attrs(attrs);
    self.convert_row(objects, &specs)
  }

  fn build(
    &self,
    objects: &[&dyn Fields],
    root_key: Option<&str>,
    attrs: Option<&[AttrSpec]>,
  ) -> JsonValue {
    let specs = attrs.map(normalize_attrs);
    let items: Vec<JsonValue> = objects
      .iter()
      .map(|obj| match &specs {
        Some(specs) => self.convert_row(&[*obj], specs),
        None => record_to_json(*obj, self.options.include_empty, &self.cache),
      })
      .collect();
    match root_key {
      Some(key) => {
        let mut doc = JsonMap::new();
        doc.insert(key.to_string(), JsonValue::Array(items));
        JsonValue::Object(doc)
      }
      None => JsonValue::Array(items),
    }
  }

  fn convert_row(&self, objects: &[&dyn Fields], specs: &[NormalizedAttr]) -> JsonValue {
    let include_empty = self.options.include_empty;
    let mut row = JsonMap::new();
    for spec in specs {
      let value = match resolve_rule(&spec.rule, objects) {
        Resolved::One(value) => json_value(value, include_empty, &self.cache),
        Resolved::Group(entries) => group_to_json(entries, include_empty, &self.cache),
      };
      // Inclusion is decided on the converted value.
      if include_empty || !json_is_empty(&value) {
        row.insert(spec.label.clone(), value);
      }
    }
    JsonValue::Object(row)
  }

  fn render(&self, data: &JsonValue) -> Result<String, ExportError> {
    let rendered = match self.options.indent {
      None => serde_json::to_string(data)?,
      Some(width) => {
        let indent = vec![b' '; width];
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        data.serialize(&mut ser)?;
        String::from_utf8_lossy(&buf).to_string()
      }
    };
    if self.options.ensure_ascii {
      Ok(escape_non_ascii(&rendered))
    } else {
      Ok(rendered)
    }
  }
}

// Safe on a whole rendered document: non-ASCII characters can only occur
// inside JSON string literals, where \uXXXX escapes are equivalent.
fn escape_non_ascii(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut units = [0u16; 2];
  for ch in text.chars() {
    if ch.is_ascii() {
      out.push(ch);
    } else {
      for unit in ch.encode_utf16(&mut units) {
        out.push_str(&format!("\\u{unit:04x}"));
      }
    }
  }
  out
}
