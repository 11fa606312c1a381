//! サブコマンドの実装

use crate::cli::{parse_visit_ref, ExecuteKind};
use crate::config::Config;
use crate::dashboard::{DashboardQuery, DashboardSession};
use crate::error::{Result, VisitRosterError};
use crate::loader::{self, Catalog};
use crate::log_store::{LogStore, RetryPolicy, SheetLogStore};
use crate::state::LocalStore;
use chrono::{Local, NaiveDate, Utc};
use dialoguer::{Confirm, Password};
use visit_roster_common::message::{self, whatsapp_link};
use visit_roster_common::requests::{self, InclusionDraft, MassEdit, MassEditEntry, StoreChange, TimeChange};
use visit_roster_common::roster::available_stores;
use visit_roster_common::{
    build_timeline, DateFilter, DaySchedule, EditMode, Filters, Roster, StoreDirectory, Visit, VisitKey,
};

/// 実行中のコマンドが使う状態
pub struct App {
    pub config: Config,
    pub state: LocalStore,
}

impl App {
    pub fn new(config: Config, state: LocalStore) -> Self {
        Self { config, state }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn user(&self) -> Result<String> {
        self.state.user().map(str::to_string).ok_or(VisitRosterError::NotLoggedIn)
    }

    fn log_store(&self) -> Result<SheetLogStore> {
        SheetLogStore::new(
            self.config.sheets_url(),
            self.config.timeout_seconds,
            RetryPolicy::new(self.config.max_retries, self.config.backoff_base_secs),
        )
    }

    fn approver_link(&self, text: &str) -> String {
        whatsapp_link(self.config.approver_phone.as_deref(), text)
    }

    /// 既に送信済みなら再送するか確認
    fn confirm_resend(prompt: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| VisitRosterError::Input(e.to_string()))
    }

    pub async fn login(&mut self, password: Option<String>) -> Result<()> {
        let credentials = loader::load_credentials(self.config.passwords_path.as_deref()).await?;
        let password = match password {
            Some(p) => p,
            None => Password::new()
                .with_prompt("Senha")
                .interact()
                .map_err(|e| VisitRosterError::Input(e.to_string()))?,
        };

        let name = credentials
            .login(&password)
            .ok_or(VisitRosterError::InvalidPassword)?
            .to_string();
        self.state.set_user(&name)?;
        tracing::info!(user = %name, "ログインしました");
        println!("✔ {} としてログインしました", name);
        if self.config.roles.is_admin(&name) {
            println!("  管理者: `visit-roster dashboard` でダッシュボードを表示できます");
        }
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.state.clear_user()?;
        println!("✔ ログアウトしました");
        Ok(())
    }

    async fn timeline(&self, user: &str) -> (Vec<DaySchedule>, StoreDirectory, Roster) {
        let roster = loader::load_roster(self.config.roster_path.as_deref()).await;
        let directory = loader::load_directory(self.config.directory_path.as_deref()).await;
        let days = build_timeline(&roster, &directory, user, Self::today(), &self.state);
        (days, directory, roster)
    }

    async fn find_visit(&self, user: &str, date: &str, store: &str) -> Result<Visit> {
        let (days, _, _) = self.timeline(user).await;
        let key = VisitKey::new(date.trim(), store.trim());
        days.iter()
            .find_map(|d| d.visits.iter().find(|v| v.date == key.date && v.store.eq_ignore_ascii_case(&key.store)))
            .cloned()
            .ok_or_else(|| VisitRosterError::VisitNotFound(key.to_string()))
    }

    pub async fn roster(&self, json: bool) -> Result<()> {
        let user = self.user()?;
        let (days, directory, roster) = self.timeline(&user).await;

        if json {
            println!("{}", serde_json::to_string_pretty(&days)?);
            return Ok(());
        }

        println!("📅 {} の訪問予定\n", user);
        if days.is_empty() {
            println!("予定はありません");
        }
        for day in &days {
            println!("{} ({})", day.date, day.weekday);
            for visit in &day.visits {
                let mut flags = String::new();
                if visit.is_new_inclusion {
                    flags.push_str(" [NOVA]");
                }
                if visit.has_pending {
                    flags.push_str(" [PENDENTE]");
                }
                println!(
                    "  {} - {}  {} ({}){}",
                    visit.check_in, visit.check_out, visit.store, visit.client, flags
                );
                if let Some(change) = &visit.pending_store_change {
                    println!(
                        "      ➡️ {} ({}) {} - {}",
                        change.new_store,
                        change.new_client.as_deref().unwrap_or("N/A"),
                        change.new_time,
                        change.new_time_end
                    );
                }
            }
            println!();
        }

        let stores = available_stores(&directory, &roster, &user);
        if !stores.is_empty() {
            println!("変更先として選べる店舗: {}", stores.join(", "));
        }
        Ok(())
    }

    pub async fn request_time(&mut self, date: &str, store: &str, change: TimeChange) -> Result<()> {
        let user = self.user()?;
        let visit = self.find_visit(&user, date, store).await?;
        if self.state.time_change(&visit.key()).is_some()
            && !Self::confirm_resend("Você já solicitou alteração de horário para esta visita. Deseja enviar novamente?")?
        {
            return Ok(());
        }

        let plan = requests::time_change(&user, &self.config.approver_name, &visit, &change, Utc::now());
        self.state.record_pending(&plan.key, plan.pending)?;
        self.log_store()?.append(&plan.record).await;

        println!("✔ 時間変更を申請しました\n");
        println!("{}", self.approver_link(&plan.message));
        Ok(())
    }

    pub async fn request_store(&mut self, date: &str, store: &str, change: StoreChange) -> Result<()> {
        let user = self.user()?;
        let visit = self.find_visit(&user, date, store).await?;
        if self.state.store_change(&visit.key()).is_some()
            && !Self::confirm_resend("Você já solicitou alteração de JP para esta visita. Deseja enviar novamente?")?
        {
            return Ok(());
        }

        let plan = requests::store_change(&user, &self.config.approver_name, &visit, &change, Utc::now());
        self.state.record_pending(&plan.key, plan.pending)?;
        self.log_store()?.append(&plan.record).await;

        println!("✔ 店舗変更を申請しました\n");
        println!("{}", self.approver_link(&plan.message));
        Ok(())
    }

    pub async fn include(&mut self, draft: InclusionDraft) -> Result<()> {
        let user = self.user()?;
        let plan = requests::inclusion(&user, &self.config.approver_name, &draft, Utc::now());
        self.state.add_inclusion(plan.inclusion)?;
        self.log_store()?.append(&plan.record).await;

        println!("✔ 新規訪問を申請しました\n");
        println!("{}", self.approver_link(&plan.message));
        Ok(())
    }

    async fn mass_entries(&self, user: &str, visits: &[String], edit: &MassEdit) -> Result<Vec<MassEditEntry>> {
        let mut entries = Vec::with_capacity(visits.len());
        for raw in visits {
            let (date, store) =
                parse_visit_ref(raw).ok_or_else(|| VisitRosterError::Input(format!("日付@店舗 の形式で指定してください: {}", raw)))?;
            let visit = self.find_visit(user, &date, &store).await?;
            let mut this_edit = MassEdit::for_visit(&visit);
            this_edit.new_store = edit.new_store.clone();
            this_edit.visit_type = edit.visit_type.clone();
            this_edit.reason = edit.reason.clone();
            if !edit.new_start_time.is_empty() {
                this_edit.new_start_time = edit.new_start_time.clone();
            }
            if !edit.new_end_time.is_empty() {
                this_edit.new_end_time = edit.new_end_time.clone();
            }
            entries.push(MassEditEntry { visit, edit: this_edit });
        }
        Ok(entries)
    }

    pub async fn mass_edit(&mut self, mode: EditMode, visits: &[String], edit: MassEdit) -> Result<()> {
        let user = self.user()?;
        let entries = self.mass_entries(&user, visits, &edit).await?;
        if self.state.mass_flags(mode).request_sent
            && !Self::confirm_resend("Você já enviou a solicitação em massa. Deseja enviar novamente?")?
        {
            return Ok(());
        }

        let plan = requests::mass_edit(&user, &self.config.approver_name, mode, &entries, Utc::now())?;
        self.state.record_pending_all(plan.pending)?;
        self.state.mark_mass_request_sent(mode)?;

        let store = self.log_store()?;
        for record in &plan.records {
            store.append(record).await;
        }

        println!("✔ {}件の一括変更を申請しました\n", plan.records.len());
        println!("{}", self.approver_link(&plan.message));
        Ok(())
    }

    pub async fn execute(
        &mut self,
        kind: ExecuteKind,
        date: Option<String>,
        store: Option<String>,
        mode: Option<EditMode>,
        visits: &[String],
    ) -> Result<()> {
        let user = self.user()?;
        let approver = self.config.approver_name.clone();

        let text = match kind {
            ExecuteKind::Mass => {
                let mode = mode.ok_or_else(|| VisitRosterError::Input("--mode を指定してください".into()))?;
                let entries = self.mass_entries(&user, visits, &MassEdit::default()).await?;
                let entries: Vec<MassEditEntry> = entries
                    .into_iter()
                    .map(|mut entry| {
                        // 申請時の内容を復元
                        let key = entry.visit.key();
                        match mode {
                            EditMode::Store => {
                                if let Some(c) = self.state.store_change(&key) {
                                    entry.edit.new_store = c.new_store.clone();
                                    entry.edit.visit_type = c.visit_type.clone();
                                    entry.edit.new_start_time = c.new_time.clone();
                                    entry.edit.new_end_time = c.new_time_end.clone();
                                }
                            }
                            EditMode::Time => {
                                if let Some(c) = self.state.time_change(&key) {
                                    entry.edit.new_start_time = c.new_check_in.clone();
                                    entry.edit.new_end_time = c.new_check_out.clone();
                                }
                            }
                        }
                        entry
                    })
                    .collect();
                if entries.is_empty() {
                    return Err(VisitRosterError::Input("--visit を指定してください".into()));
                }
                if self.state.mass_flags(mode).executed
                    && !Self::confirm_resend("Você já enviou o comprovante. Deseja enviar novamente?")?
                {
                    return Ok(());
                }
                self.state.mark_mass_executed(mode)?;
                message::mass_edit(&approver, mode, true, &entries)
            }
            _ => {
                let (date, store) = date
                    .zip(store)
                    .ok_or_else(|| VisitRosterError::Input("--date と --store を指定してください".into()))?;
                let visit = self.find_visit(&user, &date, &store).await?;
                let key = visit.key();
                match kind {
                    ExecuteKind::Time => {
                        let pending = self
                            .state
                            .time_change(&key)
                            .ok_or_else(|| VisitRosterError::Input("Nenhuma alteração pendente encontrada.".into()))?;
                        message::time_change_execution(&approver, pending, &visit.date)
                    }
                    ExecuteKind::Store => {
                        let pending = self.state.store_change(&key).ok_or_else(|| {
                            VisitRosterError::Input("Nenhuma alteração de JP pendente encontrada.".into())
                        })?;
                        message::store_change_execution(&approver, pending)
                    }
                    _ => message::inclusion_execution(&approver, &visit),
                }
            }
        };

        // 実行確認は連絡先を選ばせる
        println!("{}", whatsapp_link(None, &text));
        Ok(())
    }

    fn require_admin(&self) -> Result<String> {
        let user = self.user()?;
        if !self.config.roles.is_admin(&user) {
            return Err(VisitRosterError::Unauthorized(user));
        }
        Ok(user)
    }

    pub async fn dashboard(&self, filters: Filters, pending_only: bool, page: usize, json: bool) -> Result<()> {
        let user = self.require_admin()?;
        let catalog = Catalog::load(&self.config).await?;
        let mut session = DashboardSession::new(self.log_store()?);
        session.refresh().await;

        let query = DashboardQuery {
            filters,
            today: Self::today(),
            pending_only,
            page,
            page_size: self.config.page_size,
        };
        let view = session.view(&catalog, &query, &user, &self.config.roles);

        if json {
            println!("{}", serde_json::to_string_pretty(&view)?);
            return Ok(());
        }

        let stats = &view.stats;
        println!("📊 Dashboard\n");
        println!("  Total: {}   Pendentes: {}", stats.total, stats.pending);
        println!("\n  Por tipo:");
        for b in &stats.by_type {
            println!("    {:<20} {}", b.name, b.value);
        }
        println!("\n  Por consultor (top 5):");
        for b in &stats.by_consultant {
            println!("    {:<20} {}", b.name, b.value);
        }
        println!("\n  Por cliente (top 5):");
        for b in &stats.by_client {
            println!("    {:<20} {}", b.name, b.value);
        }

        if view.hide_table {
            return Ok(());
        }

        println!("\n  Página {}/{}", view.page.page, view.page.total_pages.max(1));
        for r in &view.page.items {
            println!(
                "  #{:<5} {:<10} {:<20} {:<14} {} ➡️ {}  [{}]",
                r.id,
                r.effective_date(),
                r.consultant,
                r.change_type,
                r.store_from,
                r.store_to,
                if r.is_done() { "Feito" } else { "Pendente" }
            );
        }
        Ok(())
    }

    pub async fn unmatched(&self) -> Result<()> {
        self.require_admin()?;
        let catalog = Catalog::load(&self.config).await?;
        let mut session = DashboardSession::new(self.log_store()?);
        session.refresh().await;

        let view = session.view(&catalog, &DashboardQuery::new(Self::today()), "", &self.config.roles);
        if view.stats.unmatched_stores.is_empty() {
            println!("✔ すべての店舗がクライアントに照合されました");
            return Ok(());
        }
        println!("照合できなかった店舗 ({}件):", view.stats.unmatched_stores.len());
        for store in &view.stats.unmatched_stores {
            println!("  {}", store);
        }
        Ok(())
    }

    pub async fn mark_done(&self, row: usize) -> Result<()> {
        let user = self.require_admin()?;
        let mut session = DashboardSession::new(self.log_store()?);
        session.refresh().await;

        if session.mark_done(&user, &self.config.roles, row, Utc::now()).await? {
            println!("✔ #{} を Feito にしました", row);
        } else {
            println!("#{} は既に Feito です", row);
        }
        Ok(())
    }
}

/// ダッシュボードの期間指定を解釈
pub fn date_filter(week: bool, from: Option<&str>, to: Option<&str>) -> Result<DateFilter> {
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| VisitRosterError::Input(format!("日付は yyyy-mm-dd で指定してください: {}", s)))
    };
    match (week, from, to) {
        (true, _, _) => Ok(DateFilter::ThisWeek),
        (false, Some(start), Some(end)) => Ok(DateFilter::Range {
            start: parse(start)?,
            end: parse(end)?,
        }),
        _ => Ok(DateFilter::All),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_filter() {
        assert_eq!(date_filter(true, None, None).unwrap(), DateFilter::ThisWeek);
        assert_eq!(date_filter(false, None, None).unwrap(), DateFilter::All);
        let range = date_filter(false, Some("2026-01-01"), Some("2026-01-31")).unwrap();
        assert!(matches!(range, DateFilter::Range { .. }));
        assert!(date_filter(false, Some("01/01/2026"), Some("2026-01-31")).is_err());
    }
}
