use flower_ai_common::ItemStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowerAiError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`flower-ai config --set-api-key YOUR_KEY` で設定するか、環境変数 GEMINI_API_KEY を指定してください")]
    MissingApiKey,

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("有効な画像ファイルが見つかりません: {0}")]
    NoValidFiles(String),

    #[error("エクスポートできる解析結果がありません")]
    NothingToExport,

    #[error("バッチ処理中のため操作できません")]
    BatchInProgress,

    #[error("不正なステータス遷移: {from} → {to}")]
    InvalidTransition { from: ItemStatus, to: ItemStatus },

    #[error("プレビュー生成エラー: {0}")]
    Preview(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("API呼び出しがタイムアウトしました（{0}秒）")]
    Timeout(u64),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] flower_ai_common::Error),
}

pub type Result<T> = std::result::Result<T, FlowerAiError>;
