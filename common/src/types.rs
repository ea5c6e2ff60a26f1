//! 解析結果・バッチ状態の型定義
//!
//! CLIとテストで共有される型:
//! - AnalysisResult: 1画像の解析結果（正規化済み）
//! - ItemStatus: 処理アイテムの状態
//! - BatchSummary: バッチ全体の集計

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 文字列フィールドが取得できなかった場合の値
pub const UNKNOWN: &str = "Unknown";

/// AI解析結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub file_name: String,

    pub flower_name: String,      // 花の名前

    pub geographic_area: String,  // 原産地域

    /// 確信度（0〜100）
    pub confidence: f64,

    /// 解析成功時刻（UTC）
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    /// `2024-01-01T00:00:00.000Z` 形式の時刻文字列
    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// 処理アイテムのステータス
///
/// 遷移は `Pending → Processing → (Completed | Error)` の前進のみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Completed => "completed",
            ItemStatus::Error => "error",
        }
    }

    /// 終端状態（completed / error）か
    pub fn is_finished(&self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Error)
    }

    /// `self` から `next` への遷移が許可されているか
    pub fn can_transition_to(&self, next: ItemStatus) -> bool {
        matches!(
            (self, next),
            (ItemStatus::Pending, ItemStatus::Processing)
                | (ItemStatus::Processing, ItemStatus::Completed)
                | (ItemStatus::Processing, ItemStatus::Error)
        )
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// バッチ集計
///
/// `success + failed == processed <= total` を常に満たす。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
        self.success += 1;
    }

    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }

    /// 進捗率（0.0〜1.0）
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.processed as f32 / self.total as f32
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed)
    }

    pub fn is_consistent(&self) -> bool {
        self.success + self.failed == self.processed && self.processed <= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            file_name: "rose.jpg".to_string(),
            flower_name: "Rose".to_string(),
            geographic_area: "Asia".to_string(),
            confidence: 92.0,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_timestamp_string_millis() {
        let result = sample_result();
        assert_eq!(result.timestamp_string(), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_analysis_result_serialize() {
        let json = serde_json::to_string(&sample_result()).expect("シリアライズ失敗");
        assert!(json.contains("\"fileName\":\"rose.jpg\""));
        assert!(json.contains("\"flowerName\":\"Rose\""));
        assert!(json.contains("\"geographicArea\":\"Asia\""));
        assert!(json.contains("\"confidence\":92.0"));
    }

    #[test]
    fn test_analysis_result_deserialize() {
        let json = r#"{
            "fileName": "tulip.png",
            "flowerName": "Tulip",
            "geographicArea": "Central Asia",
            "confidence": 88.5,
            "timestamp": "2024-05-01T12:30:00.250Z"
        }"#;

        let result: AnalysisResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(result.flower_name, "Tulip");
        assert_eq!(result.confidence, 88.5);
        assert_eq!(result.timestamp_string(), "2024-05-01T12:30:00.250Z");
    }

    #[test]
    fn test_status_forward_transitions() {
        assert!(ItemStatus::Pending.can_transition_to(ItemStatus::Processing));
        assert!(ItemStatus::Processing.can_transition_to(ItemStatus::Completed));
        assert!(ItemStatus::Processing.can_transition_to(ItemStatus::Error));
    }

    #[test]
    fn test_status_rejects_backward_and_lateral() {
        assert!(!ItemStatus::Pending.can_transition_to(ItemStatus::Completed));
        assert!(!ItemStatus::Processing.can_transition_to(ItemStatus::Pending));
        assert!(!ItemStatus::Completed.can_transition_to(ItemStatus::Error));
        assert!(!ItemStatus::Error.can_transition_to(ItemStatus::Completed));
        assert!(!ItemStatus::Completed.can_transition_to(ItemStatus::Processing));
        assert!(!ItemStatus::Error.can_transition_to(ItemStatus::Pending));
    }

    #[test]
    fn test_status_serialize_lowercase() {
        let json = serde_json::to_string(&ItemStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        assert_eq!(ItemStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = BatchSummary::new(3);
        assert_eq!(summary.processed, 0);
        assert!(summary.is_consistent());

        summary.record_success();
        summary.record_failure();
        assert_eq!(summary, BatchSummary { total: 3, processed: 2, success: 1, failed: 1 });
        assert_eq!(summary.remaining(), 1);
        assert!(summary.is_consistent());
    }

    #[test]
    fn test_summary_progress() {
        assert_eq!(BatchSummary::default().progress(), 0.0);

        let mut summary = BatchSummary::new(4);
        summary.record_success();
        assert!((summary.progress() - 0.25).abs() < f32::EPSILON);
    }
}
