//! 店舗マスタ（店舗 → クライアント）モジュール
//!
//! 正規キー（前後空白除去＋大文字）で引く対応表と、
//! 照合用に事前トークン化したインデックスを管理する。

use crate::alias::AliasConfig;
use crate::normalizer::{normalize, store_key};
use crate::schema::DIRECTORY_SCHEMA;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// マスタの1エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// 正規キー（大文字・前後空白除去）
    pub store: String,
    pub client: String,
}

/// マスタの元行（担当店舗一覧の抽出に使う）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryRow {
    pub store: String,
    pub client: String,
    pub consultant: String,
}

/// 店舗マスタ
///
/// 同じキーが複数回現れた場合はクライアントを後勝ちで上書きし、
/// キーの並び順は最初に現れた位置を保つ。
#[derive(Debug, Clone, Default)]
pub struct StoreDirectory {
    entries: Vec<DirectoryEntry>,
    positions: HashMap<String, usize>,
    rows: Vec<DirectoryRow>,
}

impl StoreDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// セミコロン区切りの文字列から読み込み
    pub fn from_csv_str(content: &str) -> Self {
        Self::from_table(&Table::parse_semicolon(content))
    }

    /// 読み込み済みの表から構築
    pub fn from_table(table: &Table) -> Self {
        let mut directory = Self::new();
        for record in DIRECTORY_SCHEMA.records(table) {
            let row = DirectoryRow {
                store: record.get("store").to_string(),
                client: record.get("client").to_string(),
                consultant: record.get("consultant").to_string(),
            };
            directory.insert(&row.store, &row.client);
            directory.rows.push(row);
        }
        directory
    }

    /// エントリを追加（店舗名・クライアント名のどちらかが空なら無視）
    pub fn insert(&mut self, store: &str, client: &str) {
        let key = store_key(store);
        let client = client.trim();
        if key.is_empty() || client.is_empty() {
            return;
        }

        match self.positions.get(&key) {
            Some(&idx) => self.entries[idx].client = client.to_string(),
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push(DirectoryEntry {
                    store: key,
                    client: client.to_string(),
                });
            }
        }
    }

    /// 完全一致で検索（大文字小文字・前後空白を無視）
    pub fn client_for(&self, store: &str) -> Option<&str> {
        self.positions
            .get(&store_key(store))
            .map(|&idx| self.entries[idx].client.as_str())
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn rows(&self) -> &[DirectoryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 担当者名を含む行の店舗一覧（前後空白除去・重複除去・ソート済み）
    pub fn stores_for_consultant(&self, user: &str) -> Vec<String> {
        let user = user.to_uppercase();
        let mut stores: Vec<String> = self
            .rows
            .iter()
            .filter(|r| !r.consultant.is_empty() && r.consultant.to_uppercase().contains(&user))
            .map(|r| r.store.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        stores.sort();
        stores.dedup();
        stores
    }
}

/// 照合用にトークン化したエントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedEntry {
    pub original: String,
    pub tokens: Vec<String>,
}

/// トークン化済みインデックス
///
/// マスタの読み込みごとに一度だけ構築し、以後は変更しない。
#[derive(Debug, Clone, Default)]
pub struct DirectoryIndex {
    entries: Vec<TokenizedEntry>,
}

impl DirectoryIndex {
    /// マスタからインデックスを構築（O(n)、マスタの順序を保つ）
    ///
    /// `aliases` が指定された場合はマスタ側のトークンにもエイリアスを注入する。
    /// マスタ側はトリガーがトークンと完全一致したときだけ注入する。
    pub fn build(directory: &StoreDirectory, aliases: Option<&AliasConfig>) -> Self {
        let entries = directory
            .entries()
            .iter()
            .map(|entry| {
                let mut tokens = normalize(&entry.store);
                if let Some(aliases) = aliases {
                    aliases.inject_whole_tokens(&mut tokens);
                }
                TokenizedEntry {
                    original: entry.store.clone(),
                    tokens,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[TokenizedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CSV: &str = "LOJA;CLIENTE;CONSULTOR
 loja a ;C1;Ana Souza
LOJA B STR;C2;Bruno
LOJA A;C3;Ana Souza
;C4;Ana Souza
LOJA D;;Bruno
";

    #[test]
    fn test_load_csv_last_write_wins() {
        let directory = StoreDirectory::from_csv_str(TEST_CSV);
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.client_for("LOJA A"), Some("C3"));
        // 上書きされてもキーの位置は最初のまま
        assert_eq!(directory.entries()[0].store, "LOJA A");
        assert_eq!(directory.entries()[1].store, "LOJA B STR");
    }

    #[test]
    fn test_client_for_is_case_insensitive() {
        let directory = StoreDirectory::from_csv_str(TEST_CSV);
        assert_eq!(directory.client_for("  loja b str "), Some("C2"));
        assert_eq!(directory.client_for("LOJA D"), None);
    }

    #[test]
    fn test_stores_for_consultant() {
        let directory = StoreDirectory::from_csv_str(TEST_CSV);
        assert_eq!(directory.stores_for_consultant("ana"), vec!["LOJA A", "loja a"]);
    }

    #[test]
    fn test_build_index() {
        let directory = StoreDirectory::from_csv_str(TEST_CSV);
        let index = DirectoryIndex::build(&directory, None);
        assert_eq!(index.len(), 2);
        assert_eq!(index.entries()[1].tokens, vec!["LOJA", "STR"]);
    }

    #[test]
    fn test_build_index_with_aliases() {
        let directory = StoreDirectory::from_csv_str(TEST_CSV);
        let aliases = AliasConfig::default_preset();
        let index = DirectoryIndex::build(&directory, Some(&aliases));
        assert_eq!(index.entries()[1].tokens, vec!["LOJA", "STR", "UNIAR"]);
        assert_eq!(index.entries()[0].tokens, vec!["LOJA"]);
    }

    #[test]
    fn test_quoted_names_survive_loading() {
        let csv = "LOJA;CLIENTE\n\"LOJA \"\"CENTRO\"\"\";C1\n\"LOJA\nNOVA\";C2\n";
        let directory = StoreDirectory::from_csv_str(csv);
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.client_for("LOJA \"CENTRO\""), Some("C1"));
        assert_eq!(directory.client_for("LOJA\nNOVA"), Some("C2"));
    }

    #[test]
    fn test_empty_directory() {
        let directory = StoreDirectory::from_csv_str("");
        assert!(directory.is_empty());
        assert!(DirectoryIndex::build(&directory, None).is_empty());
    }
}
