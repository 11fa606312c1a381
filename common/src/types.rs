//! 共有データ型
//!
//! - LogRecord: 変更ログ（スプレッドシート）の1行
//! - ChangeRecord / StatusUpdate: ログストアへ送るペイロード
//! - Visit / VisitKey: ロスター上の訪問
//! - PendingTimeChange / PendingStoreChange / NewInclusion: ローカルに保持する申請状態

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 完了ステータス
pub const STATUS_DONE: &str = "Feito";

/// 変更ログの1行
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogRecord {
    /// シート上の行番号（ヘッダーが1行目）
    pub id: usize,
    pub date: String,
    pub consultant: String,
    #[serde(rename = "type")]
    pub change_type: String,
    pub original_date: String,
    pub original_time: String,
    pub store_from: String,
    pub store_to: String,
    pub new_date: String,
    pub new_time: String,
    pub visit_type: String,
    pub reason: String,
    pub status: String,
}

impl LogRecord {
    /// シートの行オブジェクトから変換
    ///
    /// ポルトガル語ヘッダー由来のキーと英語キーの両方を大文字小文字を無視して受け付ける。
    pub fn from_row(index: usize, row: &Map<String, Value>) -> Self {
        let get = |candidates: &[&str]| row_value(row, candidates);
        Self {
            id: index + 2,
            date: get(&["Data da Solicitação", "date"]),
            consultant: get(&["Consultor", "consultant"]),
            change_type: get(&["Tipo (Horário/JP/Massa)", "type"]),
            original_date: get(&["Data Original", "originalDate"]),
            original_time: get(&["Horário Original", "originalTime"]),
            store_from: get(&["Loja Original", "storeFrom", "originalStore"]),
            store_to: get(&["Nova Loja", "storeTo", "newStore"]),
            new_date: get(&["Nova Data", "newDate"]),
            new_time: get(&["Novo Horário", "newTime"]),
            visit_type: get(&["Tipo de Visita", "visitType"]),
            reason: get(&["Motivo", "reason"]),
            status: get(&["Status", "status"]),
        }
    }

    /// JSON配列（GETレスポンス）から変換。オブジェクト以外の要素は空レコードになる。
    pub fn from_rows(rows: &[Value]) -> Vec<Self> {
        let empty = Map::new();
        rows.iter()
            .enumerate()
            .map(|(i, v)| Self::from_row(i, v.as_object().unwrap_or(&empty)))
            .collect()
    }

    pub fn is_done(&self) -> bool {
        self.status == STATUS_DONE
    }

    /// 帰属判定に使う店舗キー（元店舗を優先）
    pub fn store_key(&self) -> Option<String> {
        let raw = if self.store_from.trim().is_empty() {
            &self.store_to
        } else {
            &self.store_from
        };
        let key = raw.trim().to_uppercase();
        (!key.is_empty()).then_some(key)
    }

    /// 日付フィルタに使う日付（申請日がなければ元の日付）
    pub fn effective_date(&self) -> &str {
        if self.date.is_empty() {
            &self.original_date
        } else {
            &self.date
        }
    }
}

fn row_value(row: &Map<String, Value>, candidates: &[&str]) -> String {
    for candidate in candidates {
        let lower = candidate.to_lowercase();
        if let Some((_, value)) = row.iter().find(|(k, _)| k.to_lowercase() == lower) {
            return value_to_string(value);
        }
    }
    String::new()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 変更種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Time,
    Store,
    NewInclusion,
    MassStore,
    MassTime,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Time => "Horário",
            ChangeType::Store => "JP (Loja)",
            ChangeType::NewInclusion => "Nova Inclusão",
            ChangeType::MassStore => "Massa JP",
            ChangeType::MassTime => "Massa Horário",
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ログストアへ追記する変更申請
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub consultant: String,
    #[serde(rename = "type")]
    pub change_type: String,
    pub original_date: String,
    pub original_time: String,
    pub store_from: String,
    pub store_to: String,
    pub new_date: String,
    pub new_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_type: Option<String>,
    pub reason: String,
}

/// ステータス更新ペイロード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub action: String,
    pub row_index: usize,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusUpdate {
    pub fn new(row_index: usize, status: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            action: "updateStatus".into(),
            row_index,
            status: status.into(),
            timestamp,
        }
    }
}

/// 訪問の複合キー（日付 + 店舗）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisitKey {
    pub date: String,
    pub store: String,
}

impl VisitKey {
    pub fn new(date: &str, store: &str) -> Self {
        Self {
            date: date.to_string(),
            store: store.to_string(),
        }
    }
}

impl std::fmt::Display for VisitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.date, self.store)
    }
}

/// ロスター上の訪問
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Visit {
    /// dd/MM/yyyy
    pub date: String,
    pub weekday: String,
    pub store: String,
    pub client: String,
    pub check_in: String,
    pub check_out: String,
    pub visit_type: String,
    pub reason: String,
    /// ローカルで追加した訪問
    pub is_new_inclusion: bool,
    pub has_pending: bool,
    pub pending_store_change: Option<PendingStoreChange>,
}

impl Visit {
    pub fn key(&self) -> VisitKey {
        VisitKey::new(&self.date, &self.store)
    }
}

/// 保留中の時間変更申請
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTimeChange {
    pub store: String,
    pub date: String,
    pub original_check_in: String,
    pub original_check_out: String,
    pub new_check_in: String,
    pub new_check_out: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_mass_edit: bool,
}

/// 保留中の店舗（JP）変更申請
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingStoreChange {
    pub original_store: String,
    pub new_store: String,
    pub new_time: String,
    pub new_time_end: String,
    pub new_date: String,
    pub visit_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_mass_edit: bool,
    /// 新店舗のクライアント（表示時にマスタから補完）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_client: Option<String>,
}

/// ローカルで下書きした新規訪問
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInclusion {
    pub id: String,
    pub date: String,
    pub store: String,
    pub check_in: String,
    pub check_out: String,
    pub visit_type: String,
    pub reason: String,
    pub consultant: String,
    pub timestamp: DateTime<Utc>,
}

/// 一括変更のモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// 時間変更
    Time,
    /// 店舗（JP）変更
    Store,
}

impl std::str::FromStr for EditMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "time" | "horario" | "horário" => Ok(EditMode::Time),
            "store" | "jp" | "loja" => Ok(EditMode::Store),
            _ => Err(format!("Unknown mode: {}. Use time or store", s)),
        }
    }
}

impl std::fmt::Display for EditMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditMode::Time => write!(f, "time"),
            EditMode::Store => write!(f, "store"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_row_portuguese_headers() {
        let row = json!({
            "Data da Solicitação": "2026-01-05T12:00:00.000Z",
            "CONSULTOR": "Ana",
            "Tipo (Horário/JP/Massa)": "Horário",
            "Loja Original": "LOJA A",
            "Nova Loja": "LOJA B",
            "Status": "Feito",
            "Motivo": 42
        });
        let record = LogRecord::from_row(0, row.as_object().unwrap());
        assert_eq!(record.id, 2);
        assert_eq!(record.consultant, "Ana");
        assert_eq!(record.change_type, "Horário");
        assert_eq!(record.store_from, "LOJA A");
        assert_eq!(record.reason, "42");
        assert!(record.is_done());
    }

    #[test]
    fn test_from_row_english_keys() {
        let row = json!({"originalStore": "x", "newstore": "y", "status": null});
        let record = LogRecord::from_row(3, row.as_object().unwrap());
        assert_eq!(record.id, 5);
        assert_eq!(record.store_from, "x");
        assert_eq!(record.store_to, "y");
        assert_eq!(record.status, "");
        assert!(!record.is_done());
    }

    #[test]
    fn test_from_rows_tolerates_non_objects() {
        let rows = vec![json!({"consultant": "Ana"}), json!(["a", "b"])];
        let records = LogRecord::from_rows(&rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].consultant, "");
        assert_eq!(records[1].id, 3);
    }

    #[test]
    fn test_effective_date_fallback() {
        let record = LogRecord {
            original_date: "05/01/2026".into(),
            ..Default::default()
        };
        assert_eq!(record.effective_date(), "05/01/2026");
    }

    #[test]
    fn test_change_record_serialization() {
        let record = ChangeRecord {
            consultant: "Ana".into(),
            change_type: ChangeType::Time.to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "Horário");
        assert!(value.get("storeFrom").is_some());
        assert!(value.get("visitType").is_none());
    }

    #[test]
    fn test_status_update_shape() {
        let ts = DateTime::parse_from_rfc3339("2026-01-05T10:00:00Z").unwrap().with_timezone(&Utc);
        let value = serde_json::to_value(StatusUpdate::new(7, STATUS_DONE, ts)).unwrap();
        assert_eq!(value["action"], "updateStatus");
        assert_eq!(value["rowIndex"], 7);
        assert_eq!(value["status"], "Feito");
    }

    #[test]
    fn test_visit_key_display() {
        assert_eq!(VisitKey::new("05/01/2026", "LOJA A").to_string(), "05/01/2026-LOJA A");
    }

    #[test]
    fn test_edit_mode_from_str() {
        assert_eq!("JP".parse::<EditMode>().unwrap(), EditMode::Store);
        assert_eq!("time".parse::<EditMode>().unwrap(), EditMode::Time);
        assert!("x".parse::<EditMode>().is_err());
    }
}
