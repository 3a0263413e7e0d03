use serde::{Deserialize, Serialize};

/// Summary of a completed export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
  pub output_path: String,
  pub rows_written: u64,
}

mod excel;
mod json;

pub use excel::{ExcelExporter, ExcelOptions};
pub use json::{JsonExporter, JsonOptions};
