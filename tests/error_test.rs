//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use std::path::Path;
use tempfile::tempdir;
use visit_roster::config::Config;
use visit_roster::error::VisitRosterError;
use visit_roster::loader::{load_credentials, read_table};
use visit_roster_common::requests::{mass_edit, MassEditEntry};
use visit_roster_common::EditMode;

/// 存在しないCSVを読んだ場合
#[tokio::test]
async fn test_read_missing_table() {
    let result = read_table(Path::new("/nonexistent/path/BASE.csv")).await;
    assert!(matches!(result, Err(VisitRosterError::FileNotFound(_))));
}

/// 空のパスワード表ではログインできない
#[tokio::test]
async fn test_empty_credentials() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("senhas.csv");
    std::fs::write(&path, "").unwrap();

    let creds = load_credentials(Some(&path)).await.unwrap();
    assert!(creds.is_empty());
    assert_eq!(creds.login("1234"), None);
}

/// URL未設定ならログストア操作はエラー
#[test]
fn test_missing_sheets_url() {
    let config = Config::default();
    if std::env::var("VISIT_ROSTER_SHEETS_URL").is_err() {
        assert!(matches!(config.require_sheets_url(), Err(VisitRosterError::MissingSheetsUrl)));
    }
}

/// 一括変更の検証エラーは共通エラーとして伝わる
#[test]
fn test_mass_edit_validation_propagates() {
    fn plan(entries: &[MassEditEntry]) -> visit_roster::error::Result<usize> {
        let ts = chrono::Utc::now();
        let plan = mass_edit("Ana", "André", EditMode::Time, entries, ts)?;
        Ok(plan.records.len())
    }

    let err = plan(&[]).unwrap_err();
    assert!(matches!(err, VisitRosterError::Common(_)));
    assert!(format!("{}", err).contains("Validation"));
}

/// VisitRosterErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        VisitRosterError::Config("テスト設定エラー".to_string()),
        VisitRosterError::FileNotFound("BASE.csv".to_string()),
        VisitRosterError::NotLoggedIn,
        VisitRosterError::InvalidPassword,
        VisitRosterError::Unauthorized("Ana".to_string()),
        VisitRosterError::VisitNotFound("05/01/2026-LOJA A".to_string()),
        VisitRosterError::RecordNotFound(12),
        VisitRosterError::UnexpectedStatus(503),
        VisitRosterError::Input("時刻が不正".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// MissingSheetsUrlエラーのメッセージ確認
#[test]
fn test_missing_sheets_url_message() {
    let display = format!("{}", VisitRosterError::MissingSheetsUrl);
    assert!(display.contains("URL"));
    assert!(display.contains("visit-roster config"));
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: VisitRosterError = io_err.into();

    assert!(matches!(err, VisitRosterError::Io(_)));
    assert!(format!("{}", err).contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: VisitRosterError = json_err.into();

    assert!(matches!(err, VisitRosterError::JsonParse(_)));
    assert!(format!("{}", err).contains("JSON"));
}
