//! 店舗名の正規化・トークン化
//!
//! 処理順序（再現性のため固定）:
//! 1. 空文字なら空のトークン列
//! 2. 大文字化
//! 3. NFD分解して結合文字（アクセント記号）を除去
//! 4. `[A-Z0-9]` 以外を区切り文字に置換
//! 5. 区切り文字で分割
//! 6. 1文字以下のトークンを除外

use unicode_normalization::UnicodeNormalization;

/// 結合用ダイアクリティカルマーク (U+0300–U+036F)
fn is_combining_mark(ch: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&ch)
}

/// 文字列をトークン列に変換する
///
/// 純粋関数。同じ入力には常に同じトークン列を返す。
///
/// # Examples
/// ```
/// use visit_roster_common::normalize;
///
/// assert_eq!(normalize("Pão de Açúcar - Loja 12"), vec!["PAO", "DE", "ACUCAR", "LOJA", "12"]);
/// ```
pub fn normalize(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }

    let upper = raw.to_uppercase();
    let mut cleaned = String::with_capacity(upper.len());
    for ch in upper.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_ascii_uppercase() || ch.is_ascii_digit() {
            cleaned.push(ch);
        } else {
            cleaned.push(' ');
        }
    }

    cleaned
        .split(' ')
        .filter(|t| t.len() > 1)
        .map(str::to_string)
        .collect()
}

/// 大文字化・前後空白除去（ディレクトリのキー空間）
pub fn store_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}
