//! ログ初期化
//!
//! 進捗表示（stdout）と混ざらないよう、ログは stderr に出力する。

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "flower_ai_rust=debug,flower_ai_common=debug"
    } else {
        "flower_ai_rust=warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // 二重初期化（テスト等）は無視
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
