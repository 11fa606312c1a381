//! エイリアス注入モジュール
//!
//! ロスター側と店舗マスタ側の表記ゆれを吸収するため、
//! 生の店舗名に特定の部分文字列が含まれる場合に同義トークンを追加する。

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// エイリアスルール
///
/// `triggers` のいずれかが大文字化済みの生文字列に含まれていれば `tokens` を末尾に追加する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    pub triggers: Vec<String>,
    pub tokens: Vec<String>,
}

impl AliasRule {
    pub fn new(triggers: &[&str], tokens: &[&str]) -> Self {
        Self {
            triggers: triggers.iter().map(|s| s.to_string()).collect(),
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn matches(&self, raw_upper: &str) -> bool {
        self.triggers
            .iter()
            .any(|t| !t.is_empty() && raw_upper.contains(t.as_str()))
    }

    fn matches_token(&self, tokens: &[String]) -> bool {
        self.triggers
            .iter()
            .any(|t| tokens.iter().any(|tok| tok.eq_ignore_ascii_case(t)))
    }
}

/// エイリアス定義
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasConfig {
    #[serde(default)]
    pub rules: Vec<AliasRule>,
}

impl AliasConfig {
    /// 組み込みプリセットを取得
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" | "legacy" => Some(Self::default_preset()),
            "none" => Some(Self::default()),
            _ => None,
        }
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// 既存マスタの綴りに合わせた標準ルール
    pub fn default_preset() -> Self {
        Self {
            rules: vec![
                AliasRule::new(&["POLOAR", "STR"], &["UNIAR"]),
                // マスタ側の誤記 TRAVENIDAESSA を補う
                AliasRule::new(&["WEBCONTINENTAL"], &["TRAVENIDAESSA", "WEBCONTINENTAL"]),
            ],
        }
    }

    /// トークン列にエイリアスを追加する（追加のみ、削除はしない）
    ///
    /// 判定は区切り文字で分割される前の大文字化済み文字列に対して行う。
    pub fn inject(&self, raw_upper: &str, tokens: &mut Vec<String>) {
        for rule in &self.rules {
            if rule.matches(raw_upper) {
                tokens.extend(rule.tokens.iter().cloned());
            }
        }
    }

    /// トリガーがトークンと完全に一致するルールだけ適用する（マスタ側用）
    ///
    /// `ESTRADA` や `INDUSTRIAL` のように部分文字列として含むだけでは発火しない。
    pub fn inject_whole_tokens(&self, tokens: &mut Vec<String>) {
        let fired: Vec<&AliasRule> = self
            .rules
            .iter()
            .filter(|r| r.matches_token(tokens.as_slice()))
            .collect();
        for rule in fired {
            tokens.extend(rule.tokens.iter().cloned());
        }
    }

    /// 設定をマージ（後から追加したルールは末尾に付く）
    pub fn merge(&mut self, other: &AliasConfig) {
        for rule in &other.rules {
            if !self.rules.contains(rule) {
                self.rules.push(rule.clone());
            }
        }
    }
}

/// エイリアスを注入したトークン列を返す
pub fn inject_aliases(config: &AliasConfig, raw_upper: &str, tokens: Vec<String>) -> Vec<String> {
    let mut tokens = tokens;
    config.inject(raw_upper, &mut tokens);
    tokens
}
