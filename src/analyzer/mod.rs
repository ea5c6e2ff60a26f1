mod gemini;

pub use gemini::{encode_image, GeminiClient, GEMINI_API_BASE};
pub use flower_ai_common::AnalysisResult;

use crate::error::Result;
use crate::scanner::ImageFile;
use async_trait::async_trait;

/// 画像1枚を解析するクライアント
///
/// 失敗はそのまま呼び出し側へ返す（記録はパイプラインの責務）。
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, file: &ImageFile) -> Result<AnalysisResult>;
}

#[async_trait]
impl<T: ImageAnalyzer + ?Sized> ImageAnalyzer for std::sync::Arc<T> {
    async fn analyze(&self, file: &ImageFile) -> Result<AnalysisResult> {
        (**self).analyze(file).await
    }
}
