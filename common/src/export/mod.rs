//! Export core modules shared by the CLI and tests.

#[cfg(feature = "csv-export")]
pub mod csv_core;

/// エクスポートファイル名の接頭辞
pub const EXPORT_FILE_PREFIX: &str = "Flower_Analysis_Results_";

/// `Flower_Analysis_Results_<epoch-millis>.<ext>` 形式のファイル名
pub fn export_file_name(epoch_millis: i64, extension: &str) -> String {
    format!("{}{}.{}", EXPORT_FILE_PREFIX, epoch_millis, extension)
}
