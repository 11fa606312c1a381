//! 集計レイヤー
//!
//! 帰属判定済みのログから担当者別・種別別・クライアント別の件数を作る。

use crate::attribution::ClientAttributor;
use crate::types::LogRecord;
use serde::Serialize;
use std::collections::HashMap;

/// 上位N件に切り詰める件数
pub const TOP_N: usize = 5;
/// 未照合店舗の診断リスト上限
pub const UNMATCHED_CAP: usize = 50;

const UNKNOWN_CONSULTANT: &str = "Desconhecido";
const OTHER_TYPE: &str = "Outros";

/// 名前と件数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub name: String,
    pub value: usize,
}

/// 出現順を保つカウンタ
#[derive(Debug, Clone, Default)]
struct Counter {
    order: Vec<String>,
    counts: HashMap<String, usize>,
}

impl Counter {
    fn add(&mut self, name: &str) {
        match self.counts.get_mut(name) {
            Some(count) => *count += 1,
            None => {
                self.order.push(name.to_string());
                self.counts.insert(name.to_string(), 1);
            }
        }
    }

    /// 出現順
    fn buckets(&self) -> Vec<Bucket> {
        self.order
            .iter()
            .map(|name| Bucket {
                name: name.clone(),
                value: self.counts[name],
            })
            .collect()
    }

    /// 件数の降順で上位n件（同数は出現順）
    fn top(&self, n: usize) -> Vec<Bucket> {
        let mut buckets = self.buckets();
        buckets.sort_by(|a, b| b.value.cmp(&a.value));
        buckets.truncate(n);
        buckets
    }
}

/// ダッシュボード統計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    /// 保留中（ステータスが Feito 以外）の件数
    pub pending: usize,
    /// 種別別（全件、出現順）
    pub by_type: Vec<Bucket>,
    /// 担当者別（上位5件）
    pub by_consultant: Vec<Bucket>,
    /// クライアント別（上位5件、未照合は "N/A"）
    pub by_client: Vec<Bucket>,
    /// 担当者別（全件）
    pub all_consultants: Vec<Bucket>,
    /// 未照合の店舗キー（最大50件）
    pub unmatched_stores: Vec<String>,
}

/// ログを集計する
///
/// 未照合のレコードも合計から落とさない。店舗フィールドが空のレコードは
/// クライアント別集計の対象外。
pub fn aggregate(records: &[LogRecord], attributor: &mut ClientAttributor<'_>) -> DashboardStats {
    let mut consultants = Counter::default();
    let mut types = Counter::default();
    let mut clients = Counter::default();
    let mut unmatched: Vec<String> = Vec::new();

    for record in records {
        let name = if record.consultant.is_empty() {
            UNKNOWN_CONSULTANT
        } else {
            record.consultant.as_str()
        };
        consultants.add(name);

        let change_type = if record.change_type.is_empty() {
            OTHER_TYPE
        } else {
            record.change_type.as_str()
        };
        types.add(change_type);

        if let Some((key, client)) = attributor.attribute_record(record) {
            if !client.is_matched() && unmatched.len() < UNMATCHED_CAP && !unmatched.contains(&key) {
                unmatched.push(key);
            }
            clients.add(client.label());
        }
    }

    DashboardStats {
        total: records.len(),
        pending: records.iter().filter(|r| !r.is_done()).count(),
        by_type: types.buckets(),
        by_consultant: consultants.top(TOP_N),
        by_client: clients.top(TOP_N),
        all_consultants: consultants.buckets(),
        unmatched_stores: unmatched,
    }
}
