//! ログインと権限
//!
//! パスワードファイルは `名前;パスワード` のセミコロン区切り（1行目はヘッダー）。

use crate::table::Table;
use serde::{Deserialize, Serialize};

/// パスワード表
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    entries: Vec<(String, String)>,
}

impl Credentials {
    pub fn from_csv_str(content: &str) -> Self {
        let table = Table::parse_semicolon(content);
        let entries = table
            .rows
            .iter()
            .filter_map(|cols| match (cols.first(), cols.get(1)) {
                (Some(name), Some(password)) if !name.trim().is_empty() => {
                    Some((name.trim().to_string(), password.trim().to_string()))
                }
                _ => None,
            })
            .collect();
        Self { entries }
    }

    /// パスワードから担当者名を引く（前後空白を除いた完全一致）
    pub fn login(&self, password: &str) -> Option<&str> {
        let password = password.trim();
        if password.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(_, p)| p == password)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 権限設定（名前は大文字小文字を無視して比較）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Roles {
    /// ダッシュボードを閲覧できる
    pub admins: Vec<String>,
    /// ステータスを更新できる
    pub masters: Vec<String>,
    /// ログ一覧を表示しない
    pub super_masters: Vec<String>,
}

impl Default for Roles {
    fn default() -> Self {
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
        Self {
            admins: names(&["GABRIEL", "ANDRE", "GABRIEL AMORIM", "MASTERPRO2026", "MASTER", "SMASTERPRO"]),
            masters: names(&["MASTERPRO2026", "MASTER"]),
            super_masters: names(&["SMASTERPRO"]),
        }
    }
}

fn contains(list: &[String], user: &str) -> bool {
    let user = user.trim().to_uppercase();
    !user.is_empty() && list.iter().any(|n| n.trim().to_uppercase() == user)
}

impl Roles {
    pub fn is_admin(&self, user: &str) -> bool {
        contains(&self.admins, user)
    }

    pub fn is_master(&self, user: &str) -> bool {
        contains(&self.masters, user)
    }

    pub fn is_super_master(&self, user: &str) -> bool {
        contains(&self.super_masters, user)
    }
}
