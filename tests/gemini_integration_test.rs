//! 実APIを使う統合テスト（GEMINI_API_KEY 未設定ならスキップ）

use flower_ai_rust::analyzer::{GeminiClient, ImageAnalyzer};
use flower_ai_rust::scanner::ImageFile;
use std::io::Cursor;

fn sample_png() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        32,
        32,
        image::Rgb([220, 40, 90]),
    ));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)
        .expect("PNG生成失敗");
    buffer.into_inner()
}

#[tokio::test]
async fn gemini_flower_integration() {
    let api_key = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            eprintln!("GEMINI_API_KEY not set; skipping integration test");
            return;
        }
    };

    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
    let client = GeminiClient::new(api_key, model).expect("client build failed");
    let file = ImageFile::from_bytes("integration-test.png", "image/png", sample_png());

    let result = client.analyze(&file).await.expect("gemini api failed");

    assert_eq!(result.file_name, "integration-test.png");
    assert!(!result.flower_name.is_empty());
    assert!(!result.geographic_area.is_empty());
    assert!((0.0..=100.0).contains(&result.confidence));
}
