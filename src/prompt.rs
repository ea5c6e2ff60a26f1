//! 対話プロンプト
//!
//! 端末が無い（パイプ・CI）場合や入力を読めない場合は既定値を採用し、
//! 完了したバッチの後でプロセスを異常終了させない。

use dialoguer::{Confirm, Input};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::warn;

pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal()
}

/// 回答を確定（非対話・読み取り失敗時は既定値）
pub fn resolve_answer<F>(interactive: bool, default: bool, ask: F) -> bool
where
    F: FnOnce() -> dialoguer::Result<bool>,
{
    if !interactive {
        return default;
    }
    match ask() {
        Ok(answer) => answer,
        Err(e) => {
            warn!("入力を読み取れないため既定値を使用: {}", e);
            default
        }
    }
}

/// はい/いいえの確認
pub fn confirm(prompt: &str, default: bool) -> bool {
    resolve_answer(is_interactive(), default, || {
        Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
    })
}

/// フォルダのパスを入力（非対話・読み取り失敗時は None）
pub fn folder_path(prompt: &str) -> Option<PathBuf> {
    if !is_interactive() {
        return None;
    }
    match Input::<String>::new().with_prompt(prompt).interact_text() {
        Ok(text) if !text.trim().is_empty() => Some(PathBuf::from(text.trim())),
        Ok(_) => None,
        Err(e) => {
            warn!("入力を読み取れません: {}", e);
            None
        }
    }
}
