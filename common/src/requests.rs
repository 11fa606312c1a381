//! 変更申請の組み立て
//!
//! 各申請について、ログストアへ送るレコード・ローカルに残す保留状態・
//! 承認者宛てメッセージをまとめて作る。副作用は呼び出し側で行う。

use crate::error::{Error, Result};
use crate::message;
use crate::types::{
    ChangeRecord, ChangeType, EditMode, NewInclusion, PendingStoreChange, PendingTimeChange, Visit, VisitKey,
};
use chrono::{DateTime, Utc};

/// 一括変更で送るときの訪問種別（時間モード）
const MASS_TIME_VISIT_TYPE: &str = "Alteração Horário";

/// 保留状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    Time(PendingTimeChange),
    Store(PendingStoreChange),
}

/// 申請1件分の出力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPlan {
    pub record: ChangeRecord,
    pub key: VisitKey,
    pub pending: PendingChange,
    pub message: String,
}

/// 時間変更の入力
#[derive(Debug, Clone, Default)]
pub struct TimeChange {
    pub new_check_in: String,
    pub new_check_out: String,
    pub reason: String,
}

/// 店舗（JP）変更の入力
#[derive(Debug, Clone, Default)]
pub struct StoreChange {
    pub new_store: String,
    pub new_time: String,
    pub new_time_end: String,
    pub visit_type: String,
    pub reason: String,
}

/// 時間変更を申請する
pub fn time_change(user: &str, approver: &str, visit: &Visit, change: &TimeChange, now: DateTime<Utc>) -> RequestPlan {
    let pending = PendingTimeChange {
        store: visit.store.clone(),
        date: visit.date.clone(),
        original_check_in: visit.check_in.clone(),
        original_check_out: visit.check_out.clone(),
        new_check_in: change.new_check_in.clone(),
        new_check_out: change.new_check_out.clone(),
        timestamp: now,
        is_mass_edit: false,
    };

    let record = ChangeRecord {
        consultant: user.to_string(),
        change_type: ChangeType::Time.to_string(),
        original_date: visit.date.clone(),
        original_time: format!("{}-{}", visit.check_in, visit.check_out),
        store_from: visit.store.clone(),
        store_to: visit.store.clone(),
        new_date: visit.date.clone(),
        new_time: format!("{}-{}", change.new_check_in, change.new_check_out),
        visit_type: None,
        reason: change.reason.clone(),
    };

    RequestPlan {
        record,
        key: visit.key(),
        message: message::time_change_request(
            approver,
            visit,
            &change.new_check_in,
            &change.new_check_out,
            &change.reason,
        ),
        pending: PendingChange::Time(pending),
    }
}

/// 店舗（JP）変更を申請する
pub fn store_change(user: &str, approver: &str, visit: &Visit, change: &StoreChange, now: DateTime<Utc>) -> RequestPlan {
    let pending = PendingStoreChange {
        original_store: visit.store.clone(),
        new_store: change.new_store.clone(),
        new_time: change.new_time.clone(),
        new_time_end: change.new_time_end.clone(),
        new_date: visit.date.clone(),
        visit_type: change.visit_type.clone(),
        timestamp: now,
        is_mass_edit: false,
        new_client: None,
    };

    let record = ChangeRecord {
        consultant: user.to_string(),
        change_type: ChangeType::Store.to_string(),
        original_date: visit.date.clone(),
        original_time: format!("{}-{}", visit.check_in, visit.check_out),
        store_from: visit.store.clone(),
        store_to: change.new_store.clone(),
        new_date: visit.date.clone(),
        new_time: format!("{}-{}", change.new_time, change.new_time_end),
        visit_type: Some(change.visit_type.clone()),
        reason: change.reason.clone(),
    };

    RequestPlan {
        record,
        key: visit.key(),
        message: message::store_change_request(approver, visit, &pending, &change.reason),
        pending: PendingChange::Store(pending),
    }
}

/// 新規訪問の入力
#[derive(Debug, Clone, Default)]
pub struct InclusionDraft {
    pub date: String,
    pub store: String,
    pub check_in: String,
    pub check_out: String,
    pub visit_type: String,
    pub reason: String,
}

/// 新規訪問申請の出力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionPlan {
    pub record: ChangeRecord,
    pub inclusion: NewInclusion,
    pub message: String,
}

/// 新規訪問を申請する
pub fn inclusion(user: &str, approver: &str, draft: &InclusionDraft, now: DateTime<Utc>) -> InclusionPlan {
    let inclusion = NewInclusion {
        id: now.timestamp_millis().to_string(),
        date: draft.date.clone(),
        store: draft.store.clone(),
        check_in: draft.check_in.clone(),
        check_out: draft.check_out.clone(),
        visit_type: draft.visit_type.clone(),
        reason: draft.reason.clone(),
        consultant: user.to_string(),
        timestamp: now,
    };

    let record = ChangeRecord {
        consultant: user.to_string(),
        change_type: ChangeType::NewInclusion.to_string(),
        original_date: draft.date.clone(),
        original_time: String::new(),
        store_from: String::new(),
        store_to: draft.store.clone(),
        new_date: draft.date.clone(),
        new_time: format!("{}-{}", draft.check_in, draft.check_out),
        visit_type: Some(draft.visit_type.clone()),
        reason: draft.reason.clone(),
    };

    let visit = Visit {
        date: draft.date.clone(),
        store: draft.store.clone(),
        check_in: draft.check_in.clone(),
        check_out: draft.check_out.clone(),
        visit_type: draft.visit_type.clone(),
        reason: draft.reason.clone(),
        ..Default::default()
    };

    InclusionPlan {
        record,
        inclusion,
        message: message::inclusion_request(approver, &visit),
    }
}

/// 一括変更の1件分の編集内容
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MassEdit {
    pub new_store: String,
    pub visit_type: String,
    pub reason: String,
    pub new_start_time: String,
    pub new_end_time: String,
}

impl MassEdit {
    /// 選択した訪問の時刻で初期化
    pub fn for_visit(visit: &Visit) -> Self {
        Self {
            new_start_time: visit.check_in.clone(),
            new_end_time: visit.check_out.clone(),
            ..Default::default()
        }
    }

    /// 送信可能か（店舗モード: 新店舗・種別・理由・開始・終了、時間モード: 開始・終了・理由）
    pub fn is_complete(&self, mode: EditMode) -> bool {
        let required: &[&String] = match mode {
            EditMode::Store => &[
                &self.new_store,
                &self.visit_type,
                &self.reason,
                &self.new_start_time,
                &self.new_end_time,
            ],
            EditMode::Time => &[&self.new_start_time, &self.new_end_time, &self.reason],
        };
        required.iter().all(|v| !v.trim().is_empty())
    }
}

/// 一括変更の対象
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MassEditEntry {
    pub visit: Visit,
    pub edit: MassEdit,
}

/// 一括変更の出力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MassEditPlan {
    pub records: Vec<ChangeRecord>,
    pub pending: Vec<(VisitKey, PendingChange)>,
    pub message: String,
}

/// 一括変更の入力を検証
pub fn validate_mass_edit(mode: EditMode, entries: &[MassEditEntry]) -> Result<()> {
    if entries.is_empty() {
        return Err(Error::Validation("nenhuma visita selecionada".into()));
    }
    if let Some(entry) = entries.iter().find(|e| !e.edit.is_complete(mode)) {
        return Err(Error::Validation(format!(
            "preencha todos os campos: {} {}",
            entry.visit.date, entry.visit.store
        )));
    }
    Ok(())
}

/// 一括変更を申請する
pub fn mass_edit(
    user: &str,
    approver: &str,
    mode: EditMode,
    entries: &[MassEditEntry],
    now: DateTime<Utc>,
) -> Result<MassEditPlan> {
    validate_mass_edit(mode, entries)?;

    let mut records = Vec::with_capacity(entries.len());
    let mut pending = Vec::with_capacity(entries.len());

    for MassEditEntry { visit, edit } in entries {
        let original_time = format!("{}-{}", visit.check_in, visit.check_out);
        match mode {
            EditMode::Store => {
                let start = if edit.new_start_time.is_empty() { &visit.check_in } else { &edit.new_start_time };
                let end = if edit.new_end_time.is_empty() { &visit.check_out } else { &edit.new_end_time };
                records.push(ChangeRecord {
                    consultant: user.to_string(),
                    change_type: ChangeType::MassStore.to_string(),
                    original_date: visit.date.clone(),
                    original_time,
                    store_from: visit.store.clone(),
                    store_to: edit.new_store.clone(),
                    new_date: visit.date.clone(),
                    new_time: format!("{}-{}", start, end),
                    visit_type: Some(edit.visit_type.clone()),
                    reason: edit.reason.clone(),
                });
                pending.push((
                    visit.key(),
                    PendingChange::Store(PendingStoreChange {
                        original_store: visit.store.clone(),
                        new_store: edit.new_store.clone(),
                        new_time: start.clone(),
                        new_time_end: end.clone(),
                        new_date: visit.date.clone(),
                        visit_type: edit.visit_type.clone(),
                        timestamp: now,
                        is_mass_edit: true,
                        new_client: None,
                    }),
                ));
            }
            EditMode::Time => {
                records.push(ChangeRecord {
                    consultant: user.to_string(),
                    change_type: ChangeType::MassTime.to_string(),
                    original_date: visit.date.clone(),
                    original_time,
                    store_from: visit.store.clone(),
                    store_to: visit.store.clone(),
                    new_date: visit.date.clone(),
                    new_time: format!("{}-{}", edit.new_start_time, edit.new_end_time),
                    visit_type: Some(MASS_TIME_VISIT_TYPE.to_string()),
                    reason: edit.reason.clone(),
                });
                pending.push((
                    visit.key(),
                    PendingChange::Time(PendingTimeChange {
                        store: visit.store.clone(),
                        date: visit.date.clone(),
                        original_check_in: visit.check_in.clone(),
                        original_check_out: visit.check_out.clone(),
                        new_check_in: edit.new_start_time.clone(),
                        new_check_out: edit.new_end_time.clone(),
                        timestamp: now,
                        is_mass_edit: true,
                    }),
                ));
            }
        }
    }

    Ok(MassEditPlan {
        records,
        pending,
        message: message::mass_edit(approver, mode, false, entries),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-05T10:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn visit(store: &str) -> Visit {
        Visit {
            date: "06/01/2026".into(),
            store: store.into(),
            check_in: "08:00".into(),
            check_out: "10:00".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_time_change_plan() {
        let change = TimeChange {
            new_check_in: "09:00".into(),
            new_check_out: "11:00".into(),
            reason: "médico".into(),
        };
        let plan = time_change("Ana", "André", &visit("LOJA A"), &change, now());
        assert_eq!(plan.record.change_type, "Horário");
        assert_eq!(plan.record.original_time, "08:00-10:00");
        assert_eq!(plan.record.new_time, "09:00-11:00");
        assert_eq!(plan.record.store_to, "LOJA A");
        assert_eq!(plan.key.to_string(), "06/01/2026-LOJA A");
        assert!(matches!(plan.pending, PendingChange::Time(ref p) if p.new_check_in == "09:00"));
    }

    #[test]
    fn test_store_change_plan() {
        let change = StoreChange {
            new_store: "LOJA B".into(),
            new_time: "13:00".into(),
            new_time_end: "14:00".into(),
            visit_type: "Visita".into(),
            reason: "fechada".into(),
        };
        let plan = store_change("Ana", "André", &visit("LOJA A"), &change, now());
        assert_eq!(plan.record.change_type, "JP (Loja)");
        assert_eq!(plan.record.store_to, "LOJA B");
        assert_eq!(plan.record.visit_type.as_deref(), Some("Visita"));
        assert!(plan.message.contains("📍 *Nova Loja:* LOJA B"));
    }

    #[test]
    fn test_inclusion_plan() {
        let draft = InclusionDraft {
            date: "06/01/2026".into(),
            store: "LOJA C".into(),
            check_in: "15:00".into(),
            check_out: "16:00".into(),
            visit_type: String::new(),
            reason: "pedido".into(),
        };
        let plan = inclusion("Ana", "André", &draft, now());
        assert_eq!(plan.record.store_from, "");
        assert_eq!(plan.record.change_type, "Nova Inclusão");
        assert_eq!(plan.inclusion.consultant, "Ana");
        assert_eq!(plan.inclusion.id, now().timestamp_millis().to_string());
        assert!(plan.message.contains("🏷️ *Tipo:* N/A"));
    }

    #[test]
    fn test_mass_edit_validation() {
        let mut entry = MassEditEntry {
            visit: visit("LOJA A"),
            edit: MassEdit::for_visit(&visit("LOJA A")),
        };
        assert!(validate_mass_edit(EditMode::Time, &[]).is_err());
        assert!(validate_mass_edit(EditMode::Time, &[entry.clone()]).is_err());
        entry.edit.reason = "rota".into();
        assert!(validate_mass_edit(EditMode::Time, &[entry.clone()]).is_ok());
        assert!(validate_mass_edit(EditMode::Store, &[entry]).is_err());
    }

    #[test]
    fn test_mass_edit_store_plan() {
        let entries = vec![
            MassEditEntry {
                visit: visit("LOJA A"),
                edit: MassEdit {
                    new_store: "LOJA B".into(),
                    visit_type: "Visita".into(),
                    reason: "rota".into(),
                    new_start_time: "08:00".into(),
                    new_end_time: "09:00".into(),
                },
            },
            MassEditEntry {
                visit: visit("LOJA C"),
                edit: MassEdit {
                    new_store: "LOJA D".into(),
                    visit_type: "Visita".into(),
                    reason: "rota".into(),
                    new_start_time: "10:00".into(),
                    new_end_time: "11:00".into(),
                },
            },
        ];
        let plan = mass_edit("Ana", "André", EditMode::Store, &entries, now()).unwrap();
        assert_eq!(plan.records.len(), 2);
        assert_eq!(plan.records[1].change_type, "Massa JP");
        assert_eq!(plan.records[1].new_time, "10:00-11:00");
        assert!(matches!(&plan.pending[0].1, PendingChange::Store(p) if p.is_mass_edit));
        assert!(plan.message.contains("PARA: LOJA D"));
    }

    #[test]
    fn test_mass_edit_time_plan() {
        let entries = vec![MassEditEntry {
            visit: visit("LOJA A"),
            edit: MassEdit {
                reason: "rota".into(),
                new_start_time: "12:00".into(),
                new_end_time: "13:00".into(),
                ..Default::default()
            },
        }];
        let plan = mass_edit("Ana", "André", EditMode::Time, &entries, now()).unwrap();
        assert_eq!(plan.records[0].change_type, "Massa Horário");
        assert_eq!(plan.records[0].visit_type.as_deref(), Some("Alteração Horário"));
        assert_eq!(plan.records[0].store_to, "LOJA A");
    }
}
