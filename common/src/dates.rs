//! 日付文字列の解釈

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// ロスターの日付形式
pub const ROSTER_DATE_FORMAT: &str = "%d/%m/%Y";

/// ロスターの日付（dd/MM/yyyy）を解釈
pub fn parse_roster_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), ROSTER_DATE_FORMAT).ok()
}

/// ログの日付を解釈
///
/// シートからは ISO 8601 のタイムスタンプ、または dd/MM/yyyy が返ってくる。
pub fn parse_log_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y-%m-%d", ROSTER_DATE_FORMAT] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_roster_date() {
        assert_eq!(parse_roster_date("05/01/2026"), Some(ymd(2026, 1, 5)));
        assert_eq!(parse_roster_date("2026-01-05"), None);
    }

    #[test]
    fn test_parse_log_date_formats() {
        assert_eq!(parse_log_date("2026-01-05T23:10:00.000Z"), Some(ymd(2026, 1, 5)));
        assert_eq!(parse_log_date("2026-01-05 08:00:00"), Some(ymd(2026, 1, 5)));
        assert_eq!(parse_log_date("2026-01-05"), Some(ymd(2026, 1, 5)));
        assert_eq!(parse_log_date("05/01/2026 14:30:00"), Some(ymd(2026, 1, 5)));
        assert_eq!(parse_log_date("05/01/2026"), Some(ymd(2026, 1, 5)));
        assert_eq!(parse_log_date(""), None);
        assert_eq!(parse_log_date("ontem"), None);
    }
}
