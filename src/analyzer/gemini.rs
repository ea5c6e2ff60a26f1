//! Gemini API連携
//!
//! 画像1枚につき1回 `generateContent` を呼び出し、
//! 構造化出力（JSON）を AnalysisResult に正規化する。

use super::ImageAnalyzer;
use crate::error::{FlowerAiError, Result};
use crate::scanner::ImageFile;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use flower_ai_common::{
    build_response_schema, parse_flower_response, AnalysisResult, ANALYSIS_INSTRUCTION,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    InlineData { inline_data: InlineData },
    Text { text: String },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// エラー時のレスポンス本文
#[derive(Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: String,
}

/// 画像バイト列をBase64に変換
pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

fn build_request(mime_type: &str, base64_data: String) -> GeminiRequest {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data: base64_data,
                    },
                },
                Part::Text {
                    text: ANALYSIS_INSTRUCTION.to_string(),
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: build_response_schema(),
        },
    }
}

/// 先頭候補のテキストパートを連結
fn extract_text(response: GeminiResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<GeminiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => {
            format!("API error {}: {}", status, parsed.error.message)
        }
        _ => format!("API error {}", status),
    }
}

/// Gemini クライアント
///
/// APIキーとモデルは生成時に注入する。
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| FlowerAiError::ApiCall(format!("HTTPクライアント生成エラー: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            api_base: GEMINI_API_BASE.to_string(),
        })
    }

    /// 接続先を差し替える（プロキシ・テスト用）
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.api_base, self.model)
    }

    /// Gemini API呼び出し（レスポンステキストを返す）
    async fn call_gemini_api(&self, request: &GeminiRequest) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| FlowerAiError::ApiCall(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FlowerAiError::ApiCall(e.to_string()))?;

        if !status.is_success() {
            return Err(FlowerAiError::ApiCall(error_message(status, &body)));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| FlowerAiError::ApiParse(format!("レスポンスJSONが不正: {}", e)))?;

        extract_text(parsed)
            .ok_or_else(|| FlowerAiError::ApiParse("No response text from Gemini".into()))
    }
}

#[async_trait]
impl ImageAnalyzer for GeminiClient {
    async fn analyze(&self, file: &ImageFile) -> Result<AnalysisResult> {
        let bytes = file.read().await?;
        debug!("解析リクエスト: {} ({}, {} bytes)", file.name(), file.mime_type(), bytes.len());

        let request = build_request(file.mime_type(), encode_image(&bytes));
        let text = self.call_gemini_api(&request).await?;

        let fields = parse_flower_response(&text)
            .map_err(|e| FlowerAiError::ApiParse(e.to_string()))?;

        Ok(fields.into_result(file.name(), Utc::now()))
    }
}
