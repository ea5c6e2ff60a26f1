//! Flower AI Common Library
//!
//! CLI・テストで共有される型とユーティリティ

pub mod types;
pub mod error;
pub mod parser;
pub mod prompts;
pub mod mime;
pub mod export;

pub use types::{AnalysisResult, BatchSummary, ItemStatus, UNKNOWN};
pub use error::{Error, Result};
pub use parser::{extract_json, normalize_confidence, parse_flower_response, FlowerFields};
pub use prompts::{build_response_schema, ANALYSIS_INSTRUCTION};
pub use mime::{is_accepted_mime, ACCEPTED_MIME_TYPES};
pub use export::{export_file_name, EXPORT_FILE_PREFIX};
#[cfg(feature = "csv-export")]
pub use export::csv_core::{build_csv, format_confidence, CSV_HEADERS};
