//! プレビュー画像の確保と解放
//!
//! アイテム生成時に縮小画像を書き出し、バッチ破棄時に明示的に解放する。
//! デコードできない画像は元のバイト列をそのまま書き出す。

use crate::error::{FlowerAiError, Result};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PLACEHOLDER_SIZE: u32 = 64;
const PLACEHOLDER_COLOR: [u8; 3] = [200, 200, 200];

/// プレビュー保存先
pub struct PreviewStore {
    dir: PathBuf,
    max_size: u32,
}

/// 1アイテム分のプレビュー（所有は1か所のみ）
#[derive(Debug)]
pub struct PreviewHandle {
    path: PathBuf,
}

impl PreviewHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// プレビューファイルを削除
    pub fn release(self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl PreviewStore {
    pub fn new(dir: PathBuf, max_size: u32) -> Self {
        Self {
            dir,
            max_size: max_size.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// プレビューを生成
    pub fn acquire(&self, id: &str, mime_type: &str, bytes: &[u8]) -> Result<PreviewHandle> {
        std::fs::create_dir_all(&self.dir)?;

        match self.write_thumbnail(id, bytes) {
            Ok(path) => Ok(PreviewHandle { path }),
            Err(reason) => {
                debug!("縮小画像を生成できないため原本を複製: {} ({})", id, reason);
                let ext = mime_guess::get_mime_extensions_str(mime_type)
                    .and_then(|exts| exts.first().copied())
                    .unwrap_or("bin");
                let path = self.dir.join(format!("{}.{}", id, ext));
                std::fs::write(&path, bytes)
                    .map_err(|e| FlowerAiError::Preview(format!("{}: {}", path.display(), e)))?;
                Ok(PreviewHandle { path })
            }
        }
    }

    /// 内容を読めないファイル用の無地プレビュー
    pub fn acquire_placeholder(&self, id: &str) -> Result<PreviewHandle> {
        std::fs::create_dir_all(&self.dir)?;

        let size = self.max_size.min(PLACEHOLDER_SIZE);
        let path = self.dir.join(format!("{}.png", id));
        image::RgbImage::from_pixel(size, size, image::Rgb(PLACEHOLDER_COLOR))
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| FlowerAiError::Preview(format!("{}: {}", path.display(), e)))?;
        Ok(PreviewHandle { path })
    }

    fn write_thumbnail(&self, id: &str, bytes: &[u8]) -> std::result::Result<PathBuf, String> {
        let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
        let thumb = img.thumbnail(self.max_size, self.max_size);

        let path = self.dir.join(format!("{}.png", id));
        thumb
            .to_rgba8()
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| e.to_string())?;
        Ok(path)
    }
}

impl Drop for PreviewStore {
    fn drop(&mut self) {
        if self.dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.dir) {
                warn!("プレビューディレクトリを削除できません: {} ({})", self.dir.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_thumbnail_for_decodable_image() {
        let root = tempfile::tempdir().unwrap();
        let store = PreviewStore::new(root.path().join("previews"), 16);

        let handle = store.acquire("item-1", "image/png", &png_bytes(64, 32)).unwrap();
        assert_eq!(handle.path().extension().unwrap(), "png");

        let thumb = image::open(handle.path()).unwrap();
        assert!(thumb.width() <= 16 && thumb.height() <= 16);
    }

    #[test]
    fn test_copy_for_undecodable_bytes() {
        let root = tempfile::tempdir().unwrap();
        let store = PreviewStore::new(root.path().join("previews"), 16);

        let handle = store.acquire("item-2", "image/webp", b"not an image").unwrap();
        assert_eq!(std::fs::read(handle.path()).unwrap(), b"not an image");
    }

    #[test]
    fn test_release_removes_file() {
        let root = tempfile::tempdir().unwrap();
        let store = PreviewStore::new(root.path().join("previews"), 16);

        let handle = store.acquire("item-3", "image/jpeg", b"raw").unwrap();
        let path = handle.path().to_path_buf();
        assert!(path.exists());

        handle.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_placeholder_is_bounded_png() {
        let root = tempfile::tempdir().unwrap();
        let store = PreviewStore::new(root.path().join("previews"), 16);

        let handle = store.acquire_placeholder("item-5").unwrap();
        let img = image::open(handle.path()).unwrap();
        assert_eq!((img.width(), img.height()), (16, 16));
    }

    #[test]
    fn test_store_drop_removes_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("previews");
        {
            let store = PreviewStore::new(dir.clone(), 16);
            store.acquire("item-4", "image/jpeg", b"raw").unwrap();
            assert!(dir.exists());
        }
        assert!(!dir.exists());
    }
}
