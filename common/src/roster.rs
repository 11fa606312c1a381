//! ロスター（訪問予定表）とタイムライン構築
//!
//! 担当者の行を日付ごとにまとめ、ローカルの下書き・保留状態を重ねて表示用の
//! タイムラインを作る。

use crate::dates::parse_roster_date;
use crate::directory::StoreDirectory;
use crate::schema::ROSTER_SCHEMA;
use crate::table::Table;
use crate::types::{NewInclusion, PendingStoreChange, PendingTimeChange, Visit, VisitKey};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// ロスターの1行
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterRow {
    pub date: String,
    pub weekday: String,
    pub consultant: String,
    pub store: String,
    pub client: String,
    pub check_in: String,
    pub check_out: String,
}

impl RosterRow {
    fn to_visit(&self) -> Visit {
        Visit {
            date: self.date.trim().to_string(),
            weekday: self.weekday.clone(),
            store: self.store.clone(),
            client: self.client.clone(),
            check_in: self.check_in.clone(),
            check_out: self.check_out.clone(),
            ..Default::default()
        }
    }
}

/// ロスター
#[derive(Debug, Clone, Default)]
pub struct Roster {
    rows: Vec<RosterRow>,
}

impl Roster {
    pub fn from_csv_str(content: &str) -> Self {
        Self::from_table(&Table::parse_semicolon(content))
    }

    pub fn from_table(table: &Table) -> Self {
        let rows = ROSTER_SCHEMA
            .records(table)
            .into_iter()
            .map(|r| RosterRow {
                date: r.get("date").to_string(),
                weekday: r.get("weekday").to_string(),
                consultant: r.get("consultant").to_string(),
                store: r.get("store").to_string(),
                client: r.get("client").to_string(),
                check_in: r.get("check_in").to_string(),
                check_out: r.get("check_out").to_string(),
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[RosterRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 担当者名を含む行（大文字小文字を無視）
    pub fn rows_for<'a>(&'a self, user: &str) -> impl Iterator<Item = &'a RosterRow> + 'a {
        let user = user.trim().to_uppercase();
        self.rows
            .iter()
            .filter(move |r| !user.is_empty() && r.consultant.to_uppercase().contains(&user))
    }
}

/// タイムラインに重ねるローカル状態
pub trait PendingSource {
    fn pending_time(&self, key: &VisitKey) -> Option<PendingTimeChange>;
    fn pending_store(&self, key: &VisitKey) -> Option<PendingStoreChange>;
    fn inclusions(&self) -> Vec<NewInclusion>;
}

/// 1日分の訪問
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySchedule {
    pub date: String,
    pub weekday: String,
    pub visits: Vec<Visit>,
}

impl DaySchedule {
    /// 指定キーの訪問
    pub fn visit(&self, key: &VisitKey) -> Option<&Visit> {
        self.visits.iter().find(|v| v.key() == *key)
    }
}

/// 担当者のタイムラインを構築
///
/// 過去日・解釈できない日付は除外し、日付の昇順に並べる。
/// 下書きの新規訪問は既存の日付にだけ追加する。
pub fn build_timeline(
    roster: &Roster,
    directory: &StoreDirectory,
    user: &str,
    today: NaiveDate,
    pending: &impl PendingSource,
) -> Vec<DaySchedule> {
    let mut days: Vec<(NaiveDate, DaySchedule)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in roster.rows_for(user) {
        let date = row.date.trim();
        let Some(parsed) = parse_roster_date(date) else {
            continue;
        };
        if parsed < today {
            continue;
        }

        let idx = *positions.entry(date.to_string()).or_insert_with(|| {
            days.push((
                parsed,
                DaySchedule {
                    date: date.to_string(),
                    weekday: row.weekday.clone(),
                    visits: Vec::new(),
                },
            ));
            days.len() - 1
        });
        days[idx].1.visits.push(row.to_visit());
    }

    for inclusion in pending.inclusions() {
        if !inclusion.consultant.eq_ignore_ascii_case(user.trim()) {
            continue;
        }
        let Some(&idx) = positions.get(inclusion.date.trim()) else {
            continue;
        };
        let day = &mut days[idx].1;
        day.visits.push(Visit {
            date: day.date.clone(),
            weekday: day.weekday.clone(),
            store: inclusion.store.clone(),
            client: directory.client_for(&inclusion.store).unwrap_or_default().to_string(),
            check_in: inclusion.check_in.clone(),
            check_out: inclusion.check_out.clone(),
            visit_type: inclusion.visit_type.clone(),
            reason: inclusion.reason.clone(),
            is_new_inclusion: true,
            ..Default::default()
        });
    }

    days.sort_by_key(|(date, _)| *date);

    days.into_iter()
        .map(|(_, mut day)| {
            for visit in &mut day.visits {
                let key = visit.key();
                let store_change = pending.pending_store(&key).map(|mut change| {
                    change.new_client = directory.client_for(&change.new_store).map(str::to_string);
                    change
                });
                visit.has_pending = store_change.is_some() || pending.pending_time(&key).is_some();
                visit.pending_store_change = store_change;
            }
            day
        })
        .collect()
}

/// 変更先として選べる店舗
///
/// マスタの担当者列から探し、見つからなければロスター上の担当店舗を使う。
pub fn available_stores(directory: &StoreDirectory, roster: &Roster, user: &str) -> Vec<String> {
    let stores = directory.stores_for_consultant(user);
    if !stores.is_empty() {
        return stores;
    }

    let mut stores: Vec<String> = roster
        .rows_for(user)
        .map(|r| r.store.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    stores.sort();
    stores.dedup();
    stores
}
