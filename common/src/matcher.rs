//! 店舗名のあいまい照合
//!
//! クエリのトークンとマスタ各エントリのトークンの重なりでスコアを付け、
//! 閾値以上の最良エントリを返す。
//!
//! ## スコア
//! - 共通トークン数（クエリ側は重複を数えない）
//! - 先頭トークン（ブランド名）がエントリに含まれれば `brand_boost`
//! - 両方にエイリアスマーカー（`UNIAR`）があれば `alias_boost`
//!
//! クエリの全トークンがエントリに含まれる場合はその時点で確定する。
//! 同点は先に現れたエントリを優先する。

use crate::alias::AliasConfig;
use crate::directory::{DirectoryIndex, TokenizedEntry};
use crate::error::Result;
use crate::normalizer::normalize;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 照合パラメータ
///
/// 既定値は本番データから経験的に決められたもの。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchConfig {
    /// 採用する最低スコア
    pub threshold: f64,
    /// 先頭トークン一致の加点
    pub brand_boost: f64,
    /// エイリアスマーカー一致の加点
    pub alias_boost: f64,
    /// エイリアス加点の対象トークン
    pub alias_marker: String,
    /// マスタ側のトークンにもエイリアスを注入する
    pub inject_directory_aliases: bool,
    /// 表記ゆれルール
    pub aliases: AliasConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 2.5,
            brand_boost: 1.5,
            alias_boost: 2.0,
            alias_marker: "UNIAR".into(),
            inject_directory_aliases: true,
            aliases: AliasConfig::default_preset(),
        }
    }
}

impl MatchConfig {
    /// マスタ側へのエイリアス注入を行わない旧来の挙動
    pub fn legacy() -> Self {
        Self {
            inject_directory_aliases: false,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// このパラメータでインデックスを構築
    pub fn build_index(&self, directory: &crate::directory::StoreDirectory) -> DirectoryIndex {
        let aliases = self.inject_directory_aliases.then_some(&self.aliases);
        DirectoryIndex::build(directory, aliases)
    }
}

/// 照合結果
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientMatch {
    Matched(String),
    Unmatched,
}

impl ClientMatch {
    /// 未照合の集計バケット名
    pub const UNMATCHED_LABEL: &'static str = "N/A";

    pub fn label(&self) -> &str {
        match self {
            ClientMatch::Matched(name) => name,
            ClientMatch::Unmatched => Self::UNMATCHED_LABEL,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, ClientMatch::Matched(_))
    }
}

impl std::fmt::Display for ClientMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 1エントリに対するスコア
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryScore {
    pub intersection: usize,
    pub score: f64,
}

/// クエリ文字列をトークン化してエイリアスを注入する
pub fn query_tokens(raw: &str, aliases: &AliasConfig) -> Vec<String> {
    let mut tokens = normalize(raw);
    aliases.inject(&raw.to_uppercase(), &mut tokens);
    tokens
}

/// 1エントリのスコアを計算
pub fn score_entry(query: &[String], entry: &TokenizedEntry, config: &MatchConfig) -> EntryScore {
    let distinct: HashSet<&str> = query.iter().map(String::as_str).collect();
    let intersection = distinct
        .iter()
        .filter(|t| entry.tokens.iter().any(|e| e == *t))
        .count();

    let mut score = intersection as f64;

    if let Some(first) = query.first() {
        if entry.tokens.contains(first) {
            score += config.brand_boost;
        }
    }

    let marker = config.alias_marker.as_str();
    if query.iter().any(|t| t == marker) && entry.tokens.iter().any(|t| t == marker) {
        score += config.alias_boost;
    }

    EntryScore { intersection, score }
}

/// 生の店舗名をインデックスのエントリ名に解決する
///
/// 一致しなければ `None`。
pub fn resolve<'a>(raw: &str, index: &'a DirectoryIndex, config: &MatchConfig) -> Option<&'a str> {
    if raw.is_empty() {
        return None;
    }

    let query = query_tokens(raw, &config.aliases);
    if query.is_empty() {
        return None;
    }
    let distinct_len = query.iter().collect::<HashSet<_>>().len();

    let mut best: Option<&TokenizedEntry> = None;
    let mut max_score = 0.0;

    for entry in index.entries() {
        let EntryScore { intersection, score } = score_entry(&query, entry, config);

        if score > max_score {
            max_score = score;
            best = Some(entry);
        }

        // 完全な部分集合一致は即確定
        if intersection == distinct_len && intersection > 0 {
            return Some(entry.original.as_str());
        }
    }

    if max_score >= config.threshold {
        best.map(|e| e.original.as_str())
    } else {
        None
    }
}
