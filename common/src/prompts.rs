//! プロンプト・レスポンススキーマ定義
//!
//! 画像1枚ごとに送る固定の指示文と、
//! Gemini の構造化出力（responseSchema）に渡すスキーマ。

use serde_json::{json, Value};

/// 画像に添える固定の指示文
pub const ANALYSIS_INSTRUCTION: &str =
    "Analyze this image. Identify the flower species and its native geographic origin.";

/// スキーマの必須フィールド
pub const REQUIRED_FIELDS: &[&str] = &["flowerName", "geographicArea", "confidence"];

/// 構造化出力スキーマを生成
///
/// `{flowerName: string, geographicArea: string, confidence: number}`（すべて必須）
pub fn build_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "flowerName": {
                "type": "STRING",
                "description": "The common name of the flower identified in the image."
            },
            "geographicArea": {
                "type": "STRING",
                "description": "The primary geographic region or continent where this flower is natively most widespread."
            },
            "confidence": {
                "type": "NUMBER",
                "description": "A confidence score between 0 and 100 representing certainty."
            }
        },
        "required": REQUIRED_FIELDS,
    })
}
