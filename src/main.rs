use anyhow::Context;
use clap::Parser;
use flower_ai_rust::{analyzer, cli, config, error, export, logging, pipeline, prompt, scanner, view};
use cli::{Cli, Commands, ExportFormat};
use config::Config;
use error::FlowerAiError;
use pipeline::{BatchPipeline, PipelineOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

struct AnalyzeArgs {
    output: Option<PathBuf>,
    format: ExportFormat,
    recursive: bool,
    timeout: Option<u64>,
    no_export: bool,
    yes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::load().context("設定ファイルを読み込めません")?;

    match cli.command {
        Commands::Analyze { folder, output, format, recursive, timeout, no_export, yes } => {
            let args = AnalyzeArgs { output, format, recursive, timeout, no_export, yes };
            run_analyze(&config, folder, &args).await?;
        }

        Commands::Config { set_api_key, set_model, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if let Some(model) = set_model {
                config.set_model(model)?;
                println!("✔ モデルを設定しました: {}", config.model);
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  プレビューサイズ: {}px", config.preview_max_size);
                println!(
                    "  APIキー: {}",
                    if config.get_api_key().is_ok() { "設定済み" } else { "未設定" }
                );
                if let Ok(path) = Config::config_path() {
                    println!("  設定ファイル: {}", path.display());
                }
            }
        }
    }

    Ok(())
}

/// フォルダを解析し、結果表示・エクスポート・次のバッチを対話的に繰り返す
async fn run_analyze(config: &Config, mut folder: PathBuf, args: &AnalyzeArgs) -> anyhow::Result<()> {
    let api_key = config.get_api_key()?;
    let client = analyzer::GeminiClient::new(api_key, config.model.clone())?;

    let timeout_seconds = args.timeout.unwrap_or(config.timeout_seconds);
    let options = PipelineOptions {
        call_timeout: (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds)),
        preview_max_size: config.preview_max_size,
        ..PipelineOptions::default()
    };
    let mut pipeline = BatchPipeline::new(client, options);

    println!("🌸 flower-ai - 花画像解析 (モデル: {})\n", config.model);

    loop {
        // 1. スキャン
        println!("[1/3] 画像をスキャン中: {}", folder.display());
        match scanner::select_images(&folder, args.recursive) {
            Ok(selection) => {
                println!("✔ {}枚の画像を検出\n", selection.accepted.len());
                if !selection.skipped.is_empty() {
                    println!("- 対象外のためスキップ: {}件", selection.skipped.len());
                    for name in &selection.skipped {
                        println!("    {}", name);
                    }
                    println!();
                }

                // 2. 解析
                println!("[2/3] AI解析中...");
                let progress = view::spawn_progress(pipeline.subscribe(), false);
                pipeline.start(selection.accepted)?;
                let summary = pipeline.drive().await?;
                progress.await.context("進捗表示タスクが異常終了しました")?;

                let snapshot = pipeline.snapshot();
                println!("{}\n", view::render_table(&snapshot));
                println!("{}\n", view::render_summary(&summary));

                // 3. エクスポート
                if !args.no_export {
                    let output_dir = args.output.clone().unwrap_or_else(|| folder.clone());
                    export_batch(&snapshot.items, args, &output_dir)?;
                }
            }
            Err(e @ FlowerAiError::NoValidFiles(_)) => {
                println!("⚠ {}\n", e);
            }
            Err(e) => return Err(e.into()),
        }

        if args.yes || !prompt::confirm("別のフォルダを解析しますか?", false) {
            break;
        }

        let Some(next) = prompt::folder_path("画像フォルダのパス") else {
            break;
        };
        pipeline.reset()?;
        folder = next;
    }

    println!("\n✅ 完了");
    Ok(())
}

fn export_batch(items: &[pipeline::ItemView], args: &AnalyzeArgs, output_dir: &Path) -> anyhow::Result<()> {
    if !export::collect_completed(items).is_empty()
        && !args.yes
        && !prompt::confirm("結果をエクスポートしますか?", true)
    {
        return Ok(());
    }

    println!("[3/3] エクスポート中...");
    match export::export_results(items, &args.format, output_dir) {
        Ok(_) => Ok(()),
        Err(FlowerAiError::NothingToExport) => {
            println!("⚠ {}", FlowerAiError::NothingToExport);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
