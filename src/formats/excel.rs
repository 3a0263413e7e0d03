use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::{
  attr::{normalize_attrs, AttrSpec, NormalizedAttr, Rule},
  convert::{cell_value, group_to_json, json_is_empty, Cell, NameCache},
  error::ExportError,
  formats::ExportResult,
  resolve::{resolve_rule, Resolved},
  value::Fields,
};

#[derive(Debug, Clone)]
pub struct ExcelOptions {
  /// Include empty-valued cells in the output.
  pub include_empty: bool,
  pub sheet_name: String,
  /// Stream rows through the constant-memory worksheet, bounding memory for
  /// large exports. Rows are always produced strictly top-down, which is the
  /// only ordering that mode accepts.
  pub constant_memory: bool,
}

impl Default for ExcelOptions {
  fn default() -> Self {
    Self {
      include_empty: true,
      sheet_name: "Sheet1".to_string(),
      constant_memory: true,
    }
  }
}

/// Spreadsheet writer: one sheet, optional merged title banner, bold header
/// row, one data row per input object.
#[derive(Debug)]
pub struct ExcelExporter {
  options: ExcelOptions,
  cache: NameCache,
}

impl ExcelExporter {
  pub fn new(options: ExcelOptions) -> Self {
    Self {
      options,
      cache: NameCache::default(),
    }
  }

  /// Write the objects to an xlsx file.
  ///
  /// Column headers are the spec labels in declared order; without `attrs`,
  /// columns are inferred from the first object's public fields, sorted
  /// lexicographically. An empty `objects` slice is a no-op: no file is
  /// created.
  pub fn export(
    &self,
    path: &Path,
    objects: &[&dyn Fields],
    title: Option<&str>,
    attrs: Option<&[AttrSpec]>,
  ) -> Result<ExportResult, ExportError> {
    if objects.is_empty() {
      return Ok(ExportResult {
        output_path: path.to_string_lossy().to_string(),
        rows_written: 0,
      });
    }
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let specs = match attrs {
      Some(attrs) => normalize_attrs(attrs),
      None => self.infer_columns(objects[0]),
    };
    let headers: Vec<&str> = specs.iter().map(|spec| spec.label.as_str()).collect();

    let mut workbook = Workbook::new();
    let worksheet = if self.options.constant_memory {
      workbook.add_worksheet_with_constant_memory()
    } else {
      workbook.add_worksheet()
    };
    worksheet.set_name(&self.options.sheet_name)?;

    let header_format = Format::new().set_bold();
    let title_format = Format::new().set_bold().set_align(FormatAlign::Center);
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut current_row: u32 = 0;
    if let Some(text) = title {
      if headers.len() > 1 {
        worksheet.merge_range(
          current_row,
          0,
          current_row,
          (headers.len() - 1) as u16,
          text,
          &title_format,
        )?;
      } else {
        worksheet.write_string_with_format(current_row, 0, text, &title_format)?;
      }
      current_row += 1;
    }

    if !headers.is_empty() {
      for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(current_row, col as u16, *header, &header_format)?;
      }
      current_row += 1;
    }
    worksheet.set_freeze_panes(current_row, 0)?;

    for (offset, obj) in objects.iter().enumerate() {
      self.write_row(worksheet, current_row + offset as u32, *obj, &specs, &date_format)?;
    }

    workbook.save(path)?;
    Ok(ExportResult {
      output_path: path.to_string_lossy().to_string(),
      rows_written: objects.len() as u64,
    })
  }

  fn infer_columns(&self, obj: &dyn Fields) -> Vec<NormalizedAttr> {
    let mut names = self.cache.names_for(obj);
    names.sort_unstable();
    names
      .into_iter()
      .map(|name| NormalizedAttr {
        label: name.to_string(),
        rule: Rule::Paths(vec![(0, name.to_string())]),
      })
      .collect()
  }

  fn write_row(
    &self,
    worksheet: &mut Worksheet,
    row: u32,
    obj: &dyn Fields,
    specs: &[NormalizedAttr],
    date_format: &Format,
  ) -> Result<(), ExportError> {
    for (col, spec) in specs.iter().enumerate() {
      let col = col as u16;
      let cell = match resolve_rule(&spec.rule, &[obj]) {
        Resolved::One(value) => cell_value(value, self.options.include_empty, &self.cache),
        // Sub-objects keep every spec-declared key when flattened.
        Resolved::Group(entries) => {
          let json = group_to_json(entries, self.options.include_empty, &self.cache);
          if !self.options.include_empty && json_is_empty(&json) {
            Cell::Blank
          } else {
            Cell::Str(serde_json::to_string(&json).unwrap_or_default())
          }
        }
      };
      match cell {
        Cell::Blank => {}
        Cell::Bool(b) => {
          worksheet.write_boolean(row, col, b)?;
        }
        Cell::Int(n) => {
          worksheet.write_number(row, col, n as f64)?;
        }
        Cell::Float(f) => {
          worksheet.write_number(row, col, f)?;
        }
        Cell::Str(s) => {
          worksheet.write_string(row, col, &s)?;
        }
        Cell::DateTime(dt) => {
          worksheet.write_datetime_with_format(row, col, &dt, date_format)?;
        }
        Cell::Date(d) => {
          worksheet.write_datetime_with_format(row, col, &d, date_format)?;
        }
      }
    }
    Ok(())
  }
}
