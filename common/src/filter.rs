//! ダッシュボードのフィルタ・並び替え・ページング

use crate::attribution::ClientAttributor;
use crate::dates::parse_log_date;
use crate::matcher::ClientMatch;
use crate::types::LogRecord;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// 1ページあたりの件数
pub const PAGE_SIZE: usize = 20;

/// 期間フィルタ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    All,
    /// 今週（月曜始まり）
    ThisWeek,
    /// 指定期間（両端を含む）
    Range { start: NaiveDate, end: NaiveDate },
}

impl DateFilter {
    /// 期間の開始日・終了日を返す（全期間なら `None`）
    pub fn bounds(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            DateFilter::All => None,
            DateFilter::ThisWeek => {
                let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                Some((start, start + Duration::days(6)))
            }
            DateFilter::Range { start, end } => Some((start, end)),
        }
    }
}

/// ダッシュボードのフィルタ状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub date: DateFilter,
    pub consultant: Option<String>,
    pub change_type: Option<String>,
    pub client: Option<String>,
}

impl Filters {
    /// フィルタを適用（期間 → 担当者 → 種別 → クライアントの順）
    pub fn apply(
        &self,
        records: &[LogRecord],
        today: NaiveDate,
        attributor: &mut ClientAttributor<'_>,
    ) -> Vec<LogRecord> {
        let bounds = self.date.bounds(today);
        let consultant = self.consultant.as_ref().map(|s| s.to_uppercase());
        let change_type = self.change_type.as_ref().map(|s| s.to_uppercase());

        records
            .iter()
            .filter(|r| match bounds {
                None => true,
                Some((start, end)) => parse_log_date(r.effective_date())
                    .map(|d| d >= start && d <= end)
                    .unwrap_or(false),
            })
            .filter(|r| {
                consultant
                    .as_ref()
                    .is_none_or(|c| r.consultant.to_uppercase() == *c)
            })
            .filter(|r| {
                change_type
                    .as_ref()
                    .is_none_or(|t| r.change_type.to_uppercase() == *t)
            })
            .filter(|r| match &self.client {
                None => true,
                Some(client) => {
                    // 店舗フィールドが空のレコードも "N/A" として扱う
                    let label = attributor
                        .attribute_record(r)
                        .map(|(_, m)| m)
                        .unwrap_or(ClientMatch::Unmatched);
                    label.label() == client
                }
            })
            .cloned()
            .collect()
    }
}

/// 保留中を先頭に、次に申請日の新しい順
pub fn sort_pending_first(records: &mut [LogRecord]) {
    records.sort_by(|a, b| {
        a.is_done()
            .cmp(&b.is_done())
            .then_with(|| parse_log_date(&b.date).cmp(&parse_log_date(&a.date)))
    });
}

/// 表示用のリスト（保留のみ表示オプション付き）
pub fn display_order(records: &[LogRecord], pending_only: bool) -> Vec<LogRecord> {
    let mut list: Vec<LogRecord> = records
        .iter()
        .filter(|r| !pending_only || !r.is_done())
        .cloned()
        .collect();
    sort_pending_first(&mut list);
    list
}

/// 1ページ分
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1始まり
    pub page: usize,
    pub total_pages: usize,
}

/// ページング（範囲外のページは末尾に丸める）
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = items.len().div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());

    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        page,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StoreDirectory;
    use crate::matcher::MatchConfig;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rec(date: &str, consultant: &str, status: &str) -> LogRecord {
        LogRecord {
            date: date.into(),
            consultant: consultant.into(),
            change_type: "Horário".into(),
            status: status.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_this_week_bounds_monday_start() {
        // 2026-01-07 は水曜日
        let (start, end) = DateFilter::ThisWeek.bounds(ymd(2026, 1, 7)).unwrap();
        assert_eq!(start, ymd(2026, 1, 5));
        assert_eq!(end, ymd(2026, 1, 11));
    }

    #[test]
    fn test_filters() {
        let directory = StoreDirectory::new();
        let config = MatchConfig::default();
        let index = config.build_index(&directory);
        let mut attributor = ClientAttributor::new(&directory, &index, &config);

        let mut undated = rec("", "ana", "");
        undated.original_date = "06/01/2026".into();
        let records = vec![
            rec("2026-01-05T10:00:00Z", "Ana", ""),
            rec("2026-01-12T10:00:00Z", "Ana", ""),
            rec("2026-01-06T10:00:00Z", "Bia", ""),
            undated,
            rec("sem data", "Ana", ""),
        ];

        let filters = Filters {
            date: DateFilter::ThisWeek,
            consultant: Some("ANA".into()),
            ..Default::default()
        };
        let out = filters.apply(&records, ymd(2026, 1, 7), &mut attributor);
        assert_eq!(out.len(), 2);

        let all = Filters::default().apply(&records, ymd(2026, 1, 7), &mut attributor);
        assert_eq!(all.len(), 5);

        let range = Filters {
            date: DateFilter::Range { start: ymd(2026, 1, 12), end: ymd(2026, 1, 12) },
            ..Default::default()
        };
        assert_eq!(range.apply(&records, ymd(2026, 1, 7), &mut attributor).len(), 1);

        // 店舗なしは "N/A"
        let by_client = Filters {
            client: Some("N/A".into()),
            ..Default::default()
        };
        assert_eq!(by_client.apply(&records, ymd(2026, 1, 7), &mut attributor).len(), 5);
    }

    #[test]
    fn test_sort_pending_first_then_date_desc() {
        let records = vec![
            rec("2026-01-01", "a", "Feito"),
            rec("2026-01-02", "b", ""),
            rec("2026-01-03", "c", "Feito"),
            rec("2026-01-04", "d", "Pendente"),
        ];
        let list = display_order(&records, false);
        let names: Vec<_> = list.iter().map(|r| r.consultant.as_str()).collect();
        assert_eq!(names, vec!["d", "b", "c", "a"]);

        let pending = display_order(&records, true);
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<usize> = (0..45).collect();
        let page = paginate(&items, 3, PAGE_SIZE);
        assert_eq!(page.items, vec![40, 41, 42, 43, 44]);
        assert_eq!(page.total_pages, 3);

        let clamped = paginate(&items, 9, PAGE_SIZE);
        assert_eq!(clamped.page, 3);

        let empty: Page<usize> = paginate(&[], 1, PAGE_SIZE);
        assert!(empty.items.is_empty());
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.page, 1);
    }
}
