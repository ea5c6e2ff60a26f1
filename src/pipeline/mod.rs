//! バッチ処理パイプライン
//!
//! - start: アイテム生成と集計の初期化
//! - drive: 入力順に1件ずつ解析（同時に複数のリクエストは出さない）
//! - reset: アイテム破棄とプレビュー解放
//!
//! 状態が変わるたびに `BatchSnapshot` を購読者へ配信する。
//! 状態を書き換えるのはパイプラインのみ。

mod item;
mod preview;

pub use item::{build_items, fallback_item_id, item_id, ItemView, ProcessingItem};
pub use preview::{PreviewHandle, PreviewStore};

use crate::analyzer::ImageAnalyzer;
use crate::error::{FlowerAiError, Result};
use crate::scanner::ImageFile;
use flower_ai_common::{AnalysisResult, BatchSummary, ItemStatus};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// パイプライン設定
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// 1回のAPI呼び出しの上限時間（None で無制限）
    pub call_timeout: Option<Duration>,
    /// プレビュー保存先
    pub preview_dir: PathBuf,
    /// プレビュー画像の長辺（px）
    pub preview_max_size: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            call_timeout: Some(Duration::from_secs(120)),
            preview_dir: std::env::temp_dir()
                .join("flower-ai-previews")
                .join(std::process::id().to_string()),
            preview_max_size: 256,
        }
    }
}

/// ある時点の状態（不変）
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSnapshot {
    pub batch: u64,
    pub items: Vec<ItemView>,
    pub summary: BatchSummary,
    pub is_processing: bool,
}

impl BatchSnapshot {
    /// 完了したアイテムの解析結果（入力順）
    pub fn completed_results(&self) -> Vec<AnalysisResult> {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Completed)
            .filter_map(|i| i.result.clone())
            .collect()
    }

    /// 処理中のアイテム
    pub fn current(&self) -> Option<&ItemView> {
        self.items.iter().find(|i| i.status == ItemStatus::Processing)
    }
}

pub struct BatchPipeline<A: ImageAnalyzer> {
    analyzer: A,
    options: PipelineOptions,
    previews: PreviewStore,
    items: Vec<ProcessingItem>,
    summary: BatchSummary,
    is_processing: bool,
    batch: u64,
    observers: Vec<mpsc::UnboundedSender<Arc<BatchSnapshot>>>,
}

impl<A: ImageAnalyzer> BatchPipeline<A> {
    pub fn new(analyzer: A, options: PipelineOptions) -> Self {
        let previews = PreviewStore::new(options.preview_dir.clone(), options.preview_max_size);
        Self {
            analyzer,
            options,
            previews,
            items: Vec::new(),
            summary: BatchSummary::default(),
            is_processing: false,
            batch: 0,
            observers: Vec::new(),
        }
    }

    /// 以降のスナップショットをすべて順に受け取る
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Arc<BatchSnapshot>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot {
            batch: self.batch,
            items: self.items.iter().map(ProcessingItem::view).collect(),
            summary: self.summary,
            is_processing: self.is_processing,
        }
    }

    pub fn summary(&self) -> BatchSummary {
        self.summary
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn items(&self) -> &[ProcessingItem] {
        &self.items
    }

    /// 新しいバッチを開始（前のバッチは破棄）
    pub fn start(&mut self, files: Vec<ImageFile>) -> Result<()> {
        if self.is_processing {
            return Err(FlowerAiError::BatchInProgress);
        }
        if files.is_empty() {
            return Err(FlowerAiError::NoValidFiles("選択されたファイルがありません".into()));
        }

        self.discard_items();

        self.batch += 1;
        self.items = build_items(self.batch, files, &self.previews)?;
        self.summary = BatchSummary::new(self.items.len());
        self.is_processing = true;

        info!("バッチ{}を開始: {}件", self.batch, self.summary.total);
        self.publish();
        Ok(())
    }

    /// 待機中のアイテムを入力順に1件ずつ処理
    ///
    /// 個別の失敗はアイテムに記録し、ループは止めない。
    pub async fn drive(&mut self) -> Result<BatchSummary> {
        for index in 0..self.items.len() {
            if self.items[index].status() != ItemStatus::Pending {
                continue;
            }

            self.items[index].start_processing()?;
            let file = Arc::clone(self.items[index].file());
            debug!("処理開始 [{}/{}]: {}", index + 1, self.summary.total, file.name());
            self.publish();

            let outcome = self.call_analyzer(&file).await;

            let item = &mut self.items[index];
            match outcome {
                Ok(result) => {
                    debug!("解析成功: {} → {}", file.name(), result.flower_name);
                    item.complete(result)?;
                    self.summary.record_success();
                }
                Err(e) => {
                    warn!("解析失敗: {}: {}", file.name(), e);
                    item.fail(e.to_string())?;
                    self.summary.record_failure();
                }
            }
            self.publish();
        }

        self.is_processing = false;
        info!(
            "バッチ{}が完了: 成功{}件 / 失敗{}件",
            self.batch, self.summary.success, self.summary.failed
        );
        self.publish();
        Ok(self.summary)
    }

    /// start + drive
    pub async fn run(&mut self, files: Vec<ImageFile>) -> Result<BatchSummary> {
        self.start(files)?;
        self.drive().await
    }

    /// アイテムを破棄して集計をゼロに戻す（処理中は不可）
    pub fn reset(&mut self) -> Result<()> {
        if self.is_processing {
            return Err(FlowerAiError::BatchInProgress);
        }

        self.discard_items();
        self.summary = BatchSummary::default();
        self.publish();
        Ok(())
    }

    async fn call_analyzer(&self, file: &ImageFile) -> Result<AnalysisResult> {
        match self.options.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.analyzer.analyze(file))
                .await
                .map_err(|_| FlowerAiError::Timeout(limit.as_secs()))?,
            None => self.analyzer.analyze(file).await,
        }
    }

    fn discard_items(&mut self) {
        for item in self.items.drain(..) {
            let id = item.id().to_string();
            if let Err(e) = item.into_preview().release() {
                warn!("プレビューを解放できません: {} ({})", id, e);
            }
        }
    }

    fn publish(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = Arc::new(self.snapshot());
        self.observers
            .retain(|tx| tx.send(Arc::clone(&snapshot)).is_ok());
    }
}

impl<A: ImageAnalyzer> Drop for BatchPipeline<A> {
    fn drop(&mut self) {
        self.discard_items();
    }
}
