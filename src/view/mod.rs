//! 結果表示
//!
//! スナップショットからの純粋な射影（表・集計行）と、
//! スナップショットを購読して進捗バーを更新するオブザーバ。

use crate::pipeline::{BatchSnapshot, ItemView};
use flower_ai_common::{BatchSummary, ItemStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const FILE_NAME_WIDTH: usize = 28;
const EMPTY_CELL: &str = "-";

pub fn status_marker(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Pending => "○",
        ItemStatus::Processing => "…",
        ItemStatus::Completed => "✔",
        ItemStatus::Error => "✖",
    }
}

/// 表示幅に収まるよう末尾を省略
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

fn row_cells(item: &ItemView) -> [String; 5] {
    let (flower, region) = match &item.result {
        Some(r) => (r.flower_name.clone(), r.geographic_area.clone()),
        None => (EMPTY_CELL.to_string(), EMPTY_CELL.to_string()),
    };
    [
        status_marker(item.status).to_string(),
        truncate(&item.file_name, FILE_NAME_WIDTH),
        flower,
        region,
        item.preview_path.display().to_string(),
    ]
}

/// 結果表を文字列で生成
pub fn render_table(snapshot: &BatchSnapshot) -> String {
    if snapshot.items.is_empty() {
        return String::new();
    }

    let header = ["Status", "File Name", "Flower Type", "Region", "Preview"];
    let rows: Vec<[String; 5]> = snapshot.items.iter().map(row_cells).collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(c, w)| pad(c, *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 3);
    lines.push(format!("Analysis Results ({})", snapshot.items.len()));
    lines.push(format_row(header.map(String::from).as_slice()));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &rows {
        lines.push(format_row(row.as_slice()));
    }

    // 失敗理由は表の下にまとめる
    for item in snapshot.items.iter().filter(|i| i.status == ItemStatus::Error) {
        if let Some(message) = &item.error {
            lines.push(format!("  ✖ {}: {}", item.file_name, message));
        }
    }

    lines.join("\n")
}

/// 集計行
pub fn render_summary(summary: &BatchSummary) -> String {
    format!(
        "{} / {} images ({:.0}%) | Identified: {} | Failed: {}",
        summary.processed,
        summary.total,
        summary.progress() * 100.0,
        summary.success,
        summary.failed
    )
}

fn progress_message(snapshot: &BatchSnapshot) -> String {
    let counts = format!("✔{} ✖{}", snapshot.summary.success, snapshot.summary.failed);
    match snapshot.current() {
        Some(item) => format!("{} {}", counts, truncate(&item.file_name, FILE_NAME_WIDTH)),
        None => counts,
    }
}

/// スナップショットを購読して進捗バーを更新
///
/// バッチ完了（`is_processing == false`）のスナップショットで終了し、
/// 最後に受け取ったスナップショットを返す。
pub fn spawn_progress(
    mut rx: mpsc::UnboundedReceiver<Arc<BatchSnapshot>>,
    hidden: bool,
) -> JoinHandle<Option<Arc<BatchSnapshot>>> {
    tokio::spawn(async move {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.green/white}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        bar.set_style(style);

        let mut last = None;
        while let Some(snapshot) = rx.recv().await {
            bar.set_length(snapshot.summary.total as u64);
            bar.set_position(snapshot.summary.processed as u64);
            bar.set_message(progress_message(&snapshot));

            let finished = !snapshot.is_processing;
            last = Some(snapshot);
            if finished {
                break;
            }
        }

        bar.finish_and_clear();
        last
    })
}
