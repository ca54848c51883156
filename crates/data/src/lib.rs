pub mod csv_loader;
pub mod frame;
pub mod json_writer;

pub use csv_loader::{load_frame_from_csv, write_frame_to_csv};
pub use frame::{Frame, TextColumn};
pub use json_writer::{frame_to_json, write_frame_to_json};

use quantcol_core::TableError;

/// Errors that can occur while loading or writing data files.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Data not found: {0}")]
    NotFound(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Table error: {0}")]
    Table(#[from] TableError),
}
