//! CSV生成（共通ライブラリ）
//!
//! 全フィールドをダブルクォートで囲み、内部の `"` は `""` に二重化する。
//! 行は `\n` で連結し、末尾に改行は付けない。

use crate::error::{Error, Result};
use crate::types::AnalysisResult;
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// ヘッダ行
pub const CSV_HEADERS: [&str; 5] = [
    "File Name",
    "Flower Type",
    "Geographic Area",
    "Confidence",
    "Timestamp",
];

/// 確信度を `92%` 形式に整形
pub fn format_confidence(confidence: f64) -> String {
    format!("{}%", confidence)
}

/// 解析結果をCSV文字列に変換
///
/// 入力が同じなら出力はバイト単位で一致する。
pub fn build_csv(results: &[AnalysisResult]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;

    for r in results {
        writer.write_record([
            r.file_name.as_str(),
            r.flower_name.as_str(),
            r.geographic_area.as_str(),
            format_confidence(r.confidence).as_str(),
            r.timestamp_string().as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    let mut csv = String::from_utf8(bytes)
        .map_err(|e| Error::Parse(format!("CSVのUTF-8変換に失敗: {}", e)))?;

    if csv.ends_with('\n') {
        csv.pop();
    }

    Ok(csv)
}
