//! 画像フォルダのスキャンとMIMEタイプによる選別

use crate::error::{FlowerAiError, Result};
use flower_ai_common::is_accepted_mime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
enum Content {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

/// 画像ファイルハンドル（表示名・宣言MIMEタイプ・内容）
#[derive(Debug, Clone)]
pub struct ImageFile {
    name: String,
    mime_type: String,
    content: Content,
}

impl ImageFile {
    /// パスから生成（MIMEタイプは拡張子から推定）
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self {
            name,
            mime_type,
            content: Content::File(path.to_path_buf()),
        }
    }

    /// メモリ上のバイト列から生成
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content: Content::Memory(bytes.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.content {
            Content::File(path) => Some(path),
            Content::Memory(_) => None,
        }
    }

    /// 内容を読み込む（非同期）
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.content {
            Content::File(path) => tokio::fs::read(path).await,
            Content::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }

    /// 内容を読み込む（同期）
    pub fn read_blocking(&self) -> std::io::Result<Vec<u8>> {
        match &self.content {
            Content::File(path) => std::fs::read(path),
            Content::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// 選別結果
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    /// 受け付けたファイル（入力順）
    pub accepted: Vec<ImageFile>,
    /// 対象外MIMEタイプで除外したファイル名
    pub skipped: Vec<String>,
}

/// フォルダ内のファイルを列挙（ファイル名順）
pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<ImageFile>> {
    if !folder.is_dir() {
        return Err(FlowerAiError::FolderNotFound(folder.display().to_string()));
    }

    let walker = if recursive {
        WalkDir::new(folder)
    } else {
        WalkDir::new(folder).max_depth(1) // 直下のみ
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in walker.into_iter() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("スキャン中のエラーを無視: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }

    paths.sort();

    Ok(paths.iter().map(|p| ImageFile::from_path(p)).collect())
}

/// MIMEタイプのホワイトリストで選別
pub fn filter_accepted(files: Vec<ImageFile>) -> FileSelection {
    let mut selection = FileSelection::default();

    for file in files {
        if is_accepted_mime(file.mime_type()) {
            selection.accepted.push(file);
        } else {
            debug!("対象外のファイルを除外: {} ({})", file.name(), file.mime_type());
            selection.skipped.push(file.name().to_string());
        }
    }

    selection
}

/// スキャンして選別。受け付けるファイルが無い場合は `NoValidFiles`
pub fn select_images(folder: &Path, recursive: bool) -> Result<FileSelection> {
    let selection = filter_accepted(scan_folder(folder, recursive)?);

    if !selection.skipped.is_empty() {
        warn!("{}件のファイルを対象外として除外", selection.skipped.len());
    }

    if selection.accepted.is_empty() {
        return Err(FlowerAiError::NoValidFiles(folder.display().to_string()));
    }

    Ok(selection)
}
