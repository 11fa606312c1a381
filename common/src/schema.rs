//! ヘッダーのスキーマ対応表
//!
//! 論理フィールド → 受け入れるヘッダー表記のリスト。
//! 行ごとではなく、読み込み単位で一度だけ解決する。

use crate::error::{Error, Result};
use crate::table::Table;
use std::collections::HashMap;
use std::sync::Arc;

/// 論理フィールドと候補ヘッダー
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: &'static str,
    pub candidates: &'static [&'static str],
}

/// スキーマ定義
#[derive(Debug, Clone)]
pub struct Schema {
    pub fields: &'static [FieldSpec],
}

/// 店舗マスタ（BASE）
pub const DIRECTORY_SCHEMA: Schema = Schema {
    fields: &[
        FieldSpec { field: "store", candidates: &["LOJA", "NOME PDV", "NOME_PDV"] },
        FieldSpec { field: "client", candidates: &["CLIENTE", "CLIENT"] },
        FieldSpec { field: "consultant", candidates: &["CONSULTOR"] },
    ],
};

/// ロスター（JP）
pub const ROSTER_SCHEMA: Schema = Schema {
    fields: &[
        FieldSpec { field: "date", candidates: &["DATA"] },
        FieldSpec { field: "weekday", candidates: &["DIA DA SEMANA", "DIA"] },
        FieldSpec { field: "consultant", candidates: &["CONSULTOR"] },
        FieldSpec { field: "store", candidates: &["LOJA"] },
        FieldSpec { field: "client", candidates: &["CLIENTE"] },
        FieldSpec { field: "check_in", candidates: &["CHECK IN", "ENTRADA"] },
        FieldSpec { field: "check_out", candidates: &["CHECK OUT", "SAIDA"] },
    ],
};

/// 解決済みスキーマ（論理フィールド → 列番号）
#[derive(Debug, Clone, Default)]
pub struct ResolvedSchema {
    columns: HashMap<&'static str, usize>,
}

impl Schema {
    /// ヘッダー行に対して解決する
    ///
    /// 候補ごとに、まず前後空白を除いた大文字での完全一致、次に部分一致を試す。
    pub fn resolve(&self, headers: &[String]) -> ResolvedSchema {
        let cleaned: Vec<String> = headers.iter().map(|h| h.trim().to_uppercase()).collect();
        let mut columns = HashMap::new();

        for spec in self.fields {
            if let Some(idx) = find_column(&cleaned, spec.candidates) {
                columns.insert(spec.field, idx);
            }
        }

        ResolvedSchema { columns }
    }

    /// 必須フィールドがすべて解決できるか確認（最初に欠けたものをエラーにする）
    pub fn validate(&self, headers: &[String], required: &[&str]) -> Result<()> {
        let resolved = self.resolve(headers);
        match required.iter().find(|field| !resolved.has(field)) {
            Some(field) => Err(Error::Schema((*field).to_string())),
            None => Ok(()),
        }
    }

    /// 表に適用してレコード列を返す
    pub fn records<'a>(&self, table: &'a Table) -> Vec<Record<'a>> {
        let resolved = Arc::new(self.resolve(&table.headers));
        table
            .rows
            .iter()
            .map(|row| Record {
                schema: Arc::clone(&resolved),
                row,
            })
            .collect()
    }
}

fn find_column(cleaned: &[String], candidates: &[&str]) -> Option<usize> {
    for candidate in candidates {
        let candidate = candidate.to_uppercase();
        if let Some(idx) = cleaned.iter().position(|h| *h == candidate) {
            return Some(idx);
        }
        if let Some(idx) = cleaned.iter().position(|h| h.contains(candidate.as_str())) {
            return Some(idx);
        }
    }
    None
}

impl ResolvedSchema {
    pub fn column(&self, field: &str) -> Option<usize> {
        self.columns.get(field).copied()
    }

    pub fn has(&self, field: &str) -> bool {
        self.columns.contains_key(field)
    }

    /// 行から値を取得（列がなければ空文字）
    pub fn get<'r>(&self, row: &'r [String], field: &str) -> &'r str {
        self.column(field)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// 列名で参照できる1行
#[derive(Debug, Clone)]
pub struct Record<'a> {
    schema: Arc<ResolvedSchema>,
    row: &'a [String],
}

impl<'a> Record<'a> {
    pub fn get(&self, field: &str) -> &'a str {
        self.schema.get(self.row, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_match_preferred_over_partial() {
        // "LOJA ANTIGA" は部分一致だが、完全一致の "LOJA" を優先
        let resolved = DIRECTORY_SCHEMA.resolve(&headers(&["LOJA ANTIGA", " loja ", "CLIENTE"]));
        assert_eq!(resolved.column("store"), Some(1));
    }

    #[test]
    fn test_historical_spellings() {
        let resolved = DIRECTORY_SCHEMA.resolve(&headers(&["NOME_PDV", "Client Name"]));
        assert_eq!(resolved.column("store"), Some(0));
        assert_eq!(resolved.column("client"), Some(1));
    }

    #[test]
    fn test_missing_column_yields_empty() {
        let resolved = DIRECTORY_SCHEMA.resolve(&headers(&["LOJA"]));
        assert!(!resolved.has("client"));
        let row = vec!["LOJA A".to_string()];
        assert_eq!(resolved.get(&row, "client"), "");
        assert_eq!(resolved.get(&row, "store"), "LOJA A");
    }

    #[test]
    fn test_weekday_prefers_full_header() {
        let resolved = ROSTER_SCHEMA.resolve(&headers(&["DATA", "DIA DA SEMANA", "CHECK IN", "CHECK OUT"]));
        assert_eq!(resolved.column("date"), Some(0));
        assert_eq!(resolved.column("weekday"), Some(1));
        assert_eq!(resolved.column("check_in"), Some(2));
        assert_eq!(resolved.column("check_out"), Some(3));
    }

    #[test]
    fn test_validate_reports_missing_field() {
        assert!(DIRECTORY_SCHEMA.validate(&headers(&["LOJA", "CLIENTE"]), &["store", "client"]).is_ok());
        let err = DIRECTORY_SCHEMA
            .validate(&headers(&["LOJA", "CONSULTOR"]), &["store", "client"])
            .unwrap_err();
        assert!(matches!(err, Error::Schema(ref f) if f == "client"));
    }

    #[test]
    fn test_records_short_row() {
        let table = Table::parse_semicolon("LOJA;CLIENTE\nLOJA A\n");
        let records = DIRECTORY_SCHEMA.records(&table);
        assert_eq!(records[0].get("store"), "LOJA A");
        assert_eq!(records[0].get("client"), "");
    }
}
