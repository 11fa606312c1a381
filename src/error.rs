use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisitRosterError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ログストアのURLが設定されていません。`visit-roster config --set-sheets-url URL` で設定してください")]
    MissingSheetsUrl,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("ログインしていません。`visit-roster login` を実行してください")]
    NotLoggedIn,

    #[error("パスワードが正しくありません")]
    InvalidPassword,

    #[error("権限がありません: {0}")]
    Unauthorized(String),

    #[error("訪問が見つかりません: {0}")]
    VisitNotFound(String),

    #[error("レコードが見つかりません: {0}")]
    RecordNotFound(usize),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ログストアが予期しないステータスを返しました: {0}")]
    UnexpectedStatus(u16),

    #[error("入力エラー: {0}")]
    Input(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] visit_roster_common::Error),
}

pub type Result<T> = std::result::Result<T, VisitRosterError>;
