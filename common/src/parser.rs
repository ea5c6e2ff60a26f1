//! APIレスポンスパーサー
//!
//! Gemini のレスポンステキストからJSONを抽出し、
//! 花の識別結果を正規化する。
//!
//! 欠損・不正なフィールドはデフォルト値で補い、
//! JSONオブジェクトが得られない場合のみエラーとする。

use crate::error::{Error, Result};
use crate::types::{AnalysisResult, UNKNOWN};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// 確信度の上限
pub const MAX_CONFIDENCE: f64 = 100.0;

/// 正規化済みの識別フィールド（ファイル名・時刻は呼び出し側が付与）
#[derive(Debug, Clone, PartialEq)]
pub struct FlowerFields {
    pub flower_name: String,
    pub geographic_area: String,
    pub confidence: f64,
}

impl FlowerFields {
    pub fn into_result(self, file_name: &str, timestamp: DateTime<Utc>) -> AnalysisResult {
        AnalysisResult {
            file_name: file_name.to_string(),
            flower_name: self.flower_name,
            geographic_area: self.geographic_area,
            confidence: self.confidence,
            timestamp,
        }
    }
}

/// APIレスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 最初に現れる生の {...} または [...]
///
/// # Examples
/// ```
/// use flower_ai_common::extract_json;
///
/// let response = "結果: {\"flowerName\": \"Rose\"}";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"flowerName\": \"Rose\"}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    // 先に現れた括弧の種類で切り出す
    let first_open = [('{', '}'), ('[', ']')]
        .into_iter()
        .filter_map(|(open, close)| response.find(open).map(|pos| (pos, close)))
        .min_by_key(|(pos, _)| *pos);

    if let Some((start, close)) = first_open {
        if let Some(end) = response.rfind(close) {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSONが見つかりません".into()))
}

/// 識別レスポンスをパース
///
/// # Arguments
/// * `response` - モデルが返したテキスト
///
/// # Returns
/// * `Ok(FlowerFields)` - 正規化済みフィールド
/// * `Err` - 本文が空、JSONとして読めない、または値が null の場合
pub fn parse_flower_response(response: &str) -> Result<FlowerFields> {
    if response.trim().is_empty() {
        return Err(Error::Parse("レスポンス本文が空です".into()));
    }

    // 本文全体がJSONならそのまま、そうでなければ埋め込まれたJSONを探す
    let value: Value = match serde_json::from_str(response.trim()) {
        Ok(value) => value,
        Err(_) => {
            let json_str = extract_json(response)?;
            serde_json::from_str(json_str.trim())
                .map_err(|e| Error::Parse(format!("JSONパースエラー: {}", e)))?
        }
    };

    // 配列で返ってきた場合は先頭要素を採用
    let value = match value {
        Value::Array(arr) => arr.into_iter().next().unwrap_or(Value::Object(Map::new())),
        other => other,
    };

    if value.is_null() {
        return Err(Error::Parse("JSONの値がnullです".into()));
    }

    // オブジェクト以外はすべての項目をデフォルト値で補う
    let empty = Map::new();
    let map = value.as_object().unwrap_or(&empty);

    Ok(FlowerFields {
        flower_name: get_string(map, "flowerName").unwrap_or_else(|| UNKNOWN.to_string()),
        geographic_area: get_string(map, "geographicArea").unwrap_or_else(|| UNKNOWN.to_string()),
        confidence: get_number(map, "confidence")
            .map(normalize_confidence)
            .unwrap_or(0.0),
    })
}

/// 確信度を 0〜100 に丸める（非有限値は0）
pub fn normalize_confidence(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, MAX_CONFIDENCE)
}

fn get_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    let value = map.get(key)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Some(text)
}

fn get_number(map: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = map.get(key)?;
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    if let Some(s) = value.as_str() {
        return s.trim().trim_end_matches('%').trim().parse::<f64>().ok();
    }
    None
}
