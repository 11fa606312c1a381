use crate::error::{Result, VisitRosterError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use visit_roster_common::{AliasConfig, MatchConfig, Roles, PAGE_SIZE};

/// ログストアURLの環境変数
pub const SHEETS_URL_ENV: &str = "VISIT_ROSTER_SHEETS_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ログストア（スプレッドシートWebアプリ）のURL
    pub sheets_url: Option<String>,
    /// 店舗マスタ（BASE）CSV
    pub directory_path: Option<PathBuf>,
    /// ロスター（JP）CSV
    pub roster_path: Option<PathBuf>,
    /// パスワードCSV
    pub passwords_path: Option<PathBuf>,
    pub approver_name: String,
    /// 承認者のWhatsApp番号（未設定なら連絡先選択リンク）
    pub approver_phone: Option<String>,
    pub roles: Roles,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub backoff_base_secs: u64,
    #[serde(rename = "match")]
    pub match_config: MatchConfig,
    /// 追加のエイリアス規則（JSON）
    pub alias_file: Option<PathBuf>,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheets_url: None,
            directory_path: None,
            roster_path: None,
            passwords_path: None,
            approver_name: "André".into(),
            approver_phone: None,
            roles: Roles::default(),
            timeout_seconds: 30,
            max_retries: 0,
            backoff_base_secs: 1,
            match_config: MatchConfig::default(),
            alias_file: None,
            page_size: PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| VisitRosterError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("visit-roster").join("config.json"))
    }

    /// ローカル状態ファイルの場所
    pub fn state_path() -> Result<PathBuf> {
        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| VisitRosterError::Config("データディレクトリが見つかりません".into()))?;
        Ok(base.join("visit-roster").join("state.json"))
    }

    pub fn sheets_url(&self) -> Option<String> {
        // 環境変数を優先
        if let Ok(url) = std::env::var(SHEETS_URL_ENV) {
            if !url.trim().is_empty() {
                return Some(url);
            }
        }

        self.sheets_url.clone().filter(|u| !u.trim().is_empty())
    }

    pub fn require_sheets_url(&self) -> Result<String> {
        self.sheets_url().ok_or(VisitRosterError::MissingSheetsUrl)
    }

    /// 照合設定（エイリアスファイルがあれば規則を追加）
    pub fn match_config(&self) -> Result<MatchConfig> {
        let mut config = self.match_config.clone();
        if let Some(path) = &self.alias_file {
            if !path.exists() {
                return Err(VisitRosterError::FileNotFound(path.display().to_string()));
            }
            let extra = AliasConfig::from_file(path)?;
            config.aliases.merge(&extra);
        }
        Ok(config)
    }

    pub fn set_sheets_url(&mut self, url: String) -> Result<()> {
        self.sheets_url = Some(url);
        self.save()
    }
}
