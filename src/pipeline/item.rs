//! 処理アイテム
//!
//! ステータスは前進のみ（pending → processing → completed | error）。
//! `result` は completed のとき、`error` は error のときだけ保持する。

use super::preview::{PreviewHandle, PreviewStore};
use crate::error::{FlowerAiError, Result};
use crate::scanner::ImageFile;
use flower_ai_common::{AnalysisResult, ItemStatus};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct ProcessingItem {
    id: String,
    file: Arc<ImageFile>,
    status: ItemStatus,
    result: Option<AnalysisResult>,
    error: Option<String>,
    preview: PreviewHandle,
}

/// 表示用の読み取り専用ビュー
#[derive(Debug, Clone, PartialEq)]
pub struct ItemView {
    pub id: String,
    pub file_name: String,
    pub mime_type: String,
    pub status: ItemStatus,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
    pub preview_path: PathBuf,
}

impl ProcessingItem {
    pub fn new(id: String, file: Arc<ImageFile>, preview: PreviewHandle) -> Self {
        Self {
            id,
            file,
            status: ItemStatus::Pending,
            result: None,
            error: None,
            preview,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn file(&self) -> &Arc<ImageFile> {
        &self.file
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn start_processing(&mut self) -> Result<()> {
        self.transition(ItemStatus::Processing)
    }

    pub fn complete(&mut self, result: AnalysisResult) -> Result<()> {
        self.transition(ItemStatus::Completed)?;
        self.result = Some(result);
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(ItemStatus::Error)?;
        self.error = Some(message.into());
        Ok(())
    }

    fn transition(&mut self, next: ItemStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(FlowerAiError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn view(&self) -> ItemView {
        ItemView {
            id: self.id.clone(),
            file_name: self.file.name().to_string(),
            mime_type: self.file.mime_type().to_string(),
            status: self.status,
            result: self.result.clone(),
            error: self.error.clone(),
            preview_path: self.preview.path().to_path_buf(),
        }
    }

    /// アイテムを破棄してプレビューを返す
    pub fn into_preview(self) -> PreviewHandle {
        self.preview
    }
}

/// アイテムID: `b<バッチ番号>-<連番>-<内容ハッシュ先頭12桁>`
pub fn item_id(batch: u64, index: usize, bytes: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    format!("b{}-{:04}-{}", batch, index, &digest[..12])
}

/// 内容を読めないファイルのID: `b<バッチ番号>-<連番>`
pub fn fallback_item_id(batch: u64, index: usize) -> String {
    format!("b{}-{:04}", batch, index)
}

fn build_item(
    batch: u64,
    index: usize,
    file: ImageFile,
    previews: &PreviewStore,
) -> Result<ProcessingItem> {
    let (id, preview) = match file.read_blocking() {
        Ok(bytes) => {
            let id = item_id(batch, index, &bytes);
            let preview = previews.acquire(&id, file.mime_type(), &bytes)?;
            (id, preview)
        }
        // 読み込みエラーは解析時にアイテムのエラーとして記録される
        Err(e) => {
            warn!("内容を読めないためプレビューを省略: {} ({})", file.name(), e);
            let id = fallback_item_id(batch, index);
            let preview = previews.acquire_placeholder(&id)?;
            (id, preview)
        }
    };
    Ok(ProcessingItem::new(id, Arc::new(file), preview))
}

/// 受け付けたファイルからアイテムを生成（入力順を維持）
///
/// プレビュー生成はローカル処理のみなので並列に行う。
/// ファイルを読めなくても失敗しない。失敗するのはプレビューを書き出せない場合のみ。
pub fn build_items(
    batch: u64,
    files: Vec<ImageFile>,
    previews: &PreviewStore,
) -> Result<Vec<ProcessingItem>> {
    let built: Vec<Result<ProcessingItem>> = files
        .into_par_iter()
        .enumerate()
        .map(|(index, file)| build_item(batch, index, file, previews))
        .collect();

    let mut items = Vec::with_capacity(built.len());
    let mut first_error = None;
    for entry in built {
        match entry {
            Ok(item) => items.push(item),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    // 確保済みのプレビューを解放して中止
    if let Some(e) = first_error {
        for item in items {
            let _ = item.into_preview().release();
        }
        return Err(e);
    }

    Ok(items)
}
