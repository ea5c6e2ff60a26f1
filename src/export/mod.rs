use crate::cli::ExportFormat;
use crate::error::{FlowerAiError, Result};
use crate::pipeline::ItemView;
use flower_ai_common::{build_csv, export_file_name, AnalysisResult, ItemStatus};
use std::path::{Path, PathBuf};
use tracing::info;

/// 完了アイテムの解析結果を入力順に取り出す
pub fn collect_completed(items: &[ItemView]) -> Vec<AnalysisResult> {
    items
        .iter()
        .filter(|i| i.status == ItemStatus::Completed)
        .filter_map(|i| i.result.clone())
        .collect()
}

pub fn write_csv(results: &[AnalysisResult], path: &Path) -> Result<()> {
    let content = build_csv(results)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn write_json(results: &[AnalysisResult], path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(results)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// 完了アイテムをファイルに書き出す
///
/// 完了アイテムが無い場合はファイルを作らずに `NothingToExport` を返す。
pub fn export_results(
    items: &[ItemView],
    format: &ExportFormat,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let results = collect_completed(items);
    if results.is_empty() {
        return Err(FlowerAiError::NothingToExport);
    }

    std::fs::create_dir_all(output_dir)?;
    let millis = chrono::Utc::now().timestamp_millis();
    let mut written = Vec::new();

    if format.includes_csv() {
        let path = output_dir.join(export_file_name(millis, "csv"));
        println!("- CSVを生成中...");
        write_csv(&results, &path)?;
        println!("✔ CSV出力: {}", path.display());
        written.push(path);
    }

    if format.includes_json() {
        let path = output_dir.join(export_file_name(millis, "json"));
        println!("- JSONを生成中...");
        write_json(&results, &path)?;
        println!("✔ JSON出力: {}", path.display());
        written.push(path);
    }

    info!("{}件の結果をエクスポート", results.len());
    Ok(written)
}
