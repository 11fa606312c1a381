//! CSVリソースの読み込み
//!
//! 読み込みに失敗しても処理は止めず、警告を出して空のデータで続行する。

use crate::config::Config;
use crate::error::{Result, VisitRosterError};
use std::path::Path;
use visit_roster_common::schema::{Schema, DIRECTORY_SCHEMA, ROSTER_SCHEMA};
use visit_roster_common::{
    ClientAttributor, Credentials, DirectoryIndex, MatchConfig, Roster, StoreDirectory, Table,
};

/// CSVファイルを表として読み込み
pub async fn read_table(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(VisitRosterError::FileNotFound(path.display().to_string()));
    }
    let content = tokio::fs::read_to_string(path).await?;
    Ok(Table::parse_semicolon(&content))
}

async fn read_or_empty(path: Option<&Path>, what: &str) -> Table {
    let Some(path) = path else {
        tracing::warn!("{}のパスが未設定です", what);
        return Table::default();
    };
    match read_table(path).await {
        Ok(table) => {
            tracing::debug!(rows = table.len(), path = %path.display(), "{}を読み込みました", what);
            table
        }
        Err(e) => {
            tracing::warn!(error = %e, "{}を読み込めません、空として続行します", what);
            Table::default()
        }
    }
}

fn warn_missing_columns(table: &Table, schema: &Schema, required: &[&str], what: &str) {
    if table.headers.is_empty() {
        return;
    }
    if let Err(e) = schema.validate(&table.headers, required) {
        tracing::warn!(error = %e, "{}の列が不足しています", what);
    }
}

/// 店舗マスタ
pub async fn load_directory(path: Option<&Path>) -> StoreDirectory {
    let table = read_or_empty(path, "店舗マスタ").await;
    warn_missing_columns(&table, &DIRECTORY_SCHEMA, &["store", "client"], "店舗マスタ");
    StoreDirectory::from_table(&table)
}

/// ロスター
pub async fn load_roster(path: Option<&Path>) -> Roster {
    let table = read_or_empty(path, "ロスター").await;
    warn_missing_columns(&table, &ROSTER_SCHEMA, &["date", "consultant", "store"], "ロスター");
    Roster::from_table(&table)
}

/// パスワード表（ログインには必須なので失敗はエラーにする）
pub async fn load_credentials(path: Option<&Path>) -> Result<Credentials> {
    let path = path.ok_or_else(|| VisitRosterError::Config("passwords_path が未設定です".into()))?;
    if !path.exists() {
        return Err(VisitRosterError::FileNotFound(path.display().to_string()));
    }
    let content = tokio::fs::read_to_string(path).await?;
    Ok(Credentials::from_csv_str(&content))
}

/// 店舗マスタと照合インデックスの組
///
/// マスタを読み直したら作り直す（インデックスと帰属キャッシュが古くなるため）。
pub struct Catalog {
    pub directory: StoreDirectory,
    pub config: MatchConfig,
    pub index: DirectoryIndex,
}

impl Catalog {
    pub fn new(directory: StoreDirectory, config: MatchConfig) -> Self {
        let index = config.build_index(&directory);
        tracing::debug!(entries = index.len(), "照合インデックスを構築しました");
        Self {
            directory,
            config,
            index,
        }
    }

    /// 設定に従って読み込み
    pub async fn load(config: &Config) -> Result<Self> {
        let directory = load_directory(config.directory_path.as_deref()).await;
        Ok(Self::new(directory, config.match_config()?))
    }

    /// 集計1回分の帰属判定器
    pub fn attributor(&self) -> ClientAttributor<'_> {
        ClientAttributor::new(&self.directory, &self.index, &self.config)
    }
}
