//! 管理者ダッシュボード
//!
//! ログの取得には世代番号を付け、後から始まった取得がある場合は古い結果を捨てる。

use crate::error::{Result, VisitRosterError};
use crate::loader::Catalog;
use crate::log_store::LogStore;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use visit_roster_common::filter::{display_order, paginate};
use visit_roster_common::{
    aggregate, DashboardStats, Filters, LogRecord, Page, Roles, StatusUpdate, PAGE_SIZE, STATUS_DONE,
};

/// 画面1枚分
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub stats: DashboardStats,
    /// フィルタ後のクライアント候補（照合できたもののみ、昇順）
    pub clients: Vec<String>,
    pub page: Page<LogRecord>,
    /// 一覧を表示しない（スーパーマスタ）
    pub hide_table: bool,
}

/// 表示条件
#[derive(Debug, Clone)]
pub struct DashboardQuery {
    pub filters: Filters,
    pub today: NaiveDate,
    pub pending_only: bool,
    /// 1始まり
    pub page: usize,
    pub page_size: usize,
}

impl DashboardQuery {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            filters: Filters::default(),
            today,
            pending_only: false,
            page: 1,
            page_size: PAGE_SIZE,
        }
    }
}

/// ダッシュボードのセッション
pub struct DashboardSession<S> {
    store: S,
    generation: u64,
    records: Vec<LogRecord>,
}

impl<S: LogStore> DashboardSession<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            generation: 0,
            records: Vec::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 取得開始（世代番号を進めて返す）
    pub fn begin_fetch(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// 取得結果を反映（古い世代なら捨てて `false`）
    pub fn finish_fetch(&mut self, generation: u64, records: Vec<LogRecord>) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "古い取得結果を破棄しました");
            return false;
        }
        self.records = records;
        true
    }

    /// ログを取り直す（失敗時は空のまま続行）
    ///
    /// `&mut self` を取るので、この中で古い世代になることはない。取得を並行させる
    /// 呼び出し側は `begin_fetch` / `finish_fetch` を直接使う。
    pub async fn refresh(&mut self) -> bool {
        let generation = self.begin_fetch();
        let records = match self.store.fetch_all().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "ログの取得に失敗しました");
                Vec::new()
            }
        };
        self.finish_fetch(generation, records)
    }

    /// 集計と一覧を作る
    pub fn view(&self, catalog: &Catalog, query: &DashboardQuery, user: &str, roles: &Roles) -> DashboardView {
        let mut attributor = catalog.attributor();
        let filtered = query.filters.apply(&self.records, query.today, &mut attributor);
        let stats = aggregate(&filtered, &mut attributor);

        let clients: BTreeSet<String> = filtered
            .iter()
            .filter_map(|r| attributor.attribute_record(r))
            .filter(|(_, m)| m.is_matched())
            .map(|(_, m)| m.label().to_string())
            .collect();

        let list = display_order(&filtered, query.pending_only);
        tracing::debug!(
            total = self.records.len(),
            filtered = filtered.len(),
            fuzzy = attributor.fuzzy_lookups(),
            "ダッシュボードを集計しました"
        );

        DashboardView {
            stats,
            clients: clients.into_iter().collect(),
            page: paginate(&list, query.page, query.page_size),
            hide_table: roles.is_super_master(user),
        }
    }

    /// ステータスを「Feito」にする（マスタのみ）
    ///
    /// ローカルを先に更新してから送信する。既に完了なら何もしない。
    pub async fn mark_done(&mut self, user: &str, roles: &Roles, row_index: usize, now: DateTime<Utc>) -> Result<bool> {
        if !roles.is_master(user) {
            return Err(VisitRosterError::Unauthorized(user.to_string()));
        }

        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == row_index)
            .ok_or(VisitRosterError::RecordNotFound(row_index))?;
        if record.is_done() {
            return Ok(false);
        }

        record.status = STATUS_DONE.to_string();
        self.store
            .update_status(&StatusUpdate::new(row_index, STATUS_DONE, now))
            .await;
        Ok(true)
    }
}
