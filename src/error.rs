use thiserror::Error;

/// Sink-level failures surfaced to the caller.
///
/// Attribute resolution never errors: missing attributes, absent path
/// intermediates and transform failures all converge to an absent value.
#[derive(Debug, Error)]
pub enum ExportError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("json serialization failed: {0}")]
  Json(#[from] serde_json::Error),
  #[error("spreadsheet error: {0}")]
  Sheet(#[from] rust_xlsxwriter::XlsxError),
}
