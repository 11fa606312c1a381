//! ローカル状態ファイル
//!
//! ログイン中の担当者、保留中の申請、新規訪問の下書き、一括変更の送信フラグを
//! JSONファイルに保持する。ロックはせず、最後に書いたものが残る。

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use visit_roster_common::requests::PendingChange;
use visit_roster_common::roster::PendingSource;
use visit_roster_common::{EditMode, NewInclusion, PendingStoreChange, PendingTimeChange, VisitKey};

/// 一括変更の送信状況
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MassFlags {
    pub request_sent: bool,
    pub executed: bool,
}

/// 状態ファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateFile {
    /// バージョン（互換性チェック用）
    version: u32,
    user: Option<String>,
    /// 訪問キー（日付-店舗）→ 時間変更
    #[serde(default)]
    pending_time: BTreeMap<String, PendingTimeChange>,
    /// 訪問キー（日付-店舗）→ 店舗変更
    #[serde(default)]
    pending_store: BTreeMap<String, PendingStoreChange>,
    #[serde(default)]
    inclusions: Vec<NewInclusion>,
    #[serde(default)]
    mass_time: MassFlags,
    #[serde(default)]
    mass_store: MassFlags,
}

impl StateFile {
    const CURRENT_VERSION: u32 = 1;
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            user: None,
            pending_time: BTreeMap::new(),
            pending_store: BTreeMap::new(),
            inclusions: Vec::new(),
            mass_time: MassFlags::default(),
            mass_store: MassFlags::default(),
        }
    }
}

/// ローカル状態のリポジトリ
///
/// 変更系の操作はその場でファイルへ書き戻す。
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    state: StateFile,
}

impl LocalStore {
    /// 状態ファイルを読み込み（存在しない・壊れている場合は空の状態）
    pub fn load(path: &Path) -> Self {
        let state = Self::read(path).unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            state,
        }
    }

    fn read(path: &Path) -> Option<StateFile> {
        if !path.exists() {
            return None;
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "状態ファイルを開けません");
                return None;
            }
        };

        match serde_json::from_reader::<_, StateFile>(BufReader::new(file)) {
            Ok(state) if state.version == StateFile::CURRENT_VERSION => Some(state),
            Ok(state) => {
                tracing::warn!(version = state.version, "状態ファイルのバージョン不一致、初期化します");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "状態ファイルを解析できません、初期化します");
                None
            }
        }
    }

    /// 状態ファイルを保存
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.state)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn user(&self) -> Option<&str> {
        self.state.user.as_deref()
    }

    pub fn set_user(&mut self, user: &str) -> Result<()> {
        self.state.user = Some(user.to_string());
        self.save()
    }

    /// ログアウト（下書き・保留状態は残す）
    pub fn clear_user(&mut self) -> Result<()> {
        self.state.user = None;
        self.save()
    }

    pub fn time_change(&self, key: &VisitKey) -> Option<&PendingTimeChange> {
        self.state.pending_time.get(&key.to_string())
    }

    pub fn store_change(&self, key: &VisitKey) -> Option<&PendingStoreChange> {
        self.state.pending_store.get(&key.to_string())
    }

    pub fn has_pending(&self, key: &VisitKey) -> bool {
        self.time_change(key).is_some() || self.store_change(key).is_some()
    }

    /// 保留中の申請を記録（同じ訪問の同種の申請は上書き）
    pub fn record_pending(&mut self, key: &VisitKey, change: PendingChange) -> Result<()> {
        self.put_pending(key, change);
        self.save()
    }

    /// まとめて記録して一度だけ保存
    pub fn record_pending_all(&mut self, changes: Vec<(VisitKey, PendingChange)>) -> Result<()> {
        for (key, change) in changes {
            self.put_pending(&key, change);
        }
        self.save()
    }

    fn put_pending(&mut self, key: &VisitKey, change: PendingChange) {
        match change {
            PendingChange::Time(c) => {
                self.state.pending_time.insert(key.to_string(), c);
            }
            PendingChange::Store(c) => {
                self.state.pending_store.insert(key.to_string(), c);
            }
        }
    }

    pub fn inclusions(&self) -> &[NewInclusion] {
        &self.state.inclusions
    }

    pub fn add_inclusion(&mut self, inclusion: NewInclusion) -> Result<()> {
        self.state.inclusions.push(inclusion);
        self.save()
    }

    pub fn mass_flags(&self, mode: EditMode) -> MassFlags {
        match mode {
            EditMode::Time => self.state.mass_time,
            EditMode::Store => self.state.mass_store,
        }
    }

    fn mass_flags_mut(&mut self, mode: EditMode) -> &mut MassFlags {
        match mode {
            EditMode::Time => &mut self.state.mass_time,
            EditMode::Store => &mut self.state.mass_store,
        }
    }

    pub fn mark_mass_request_sent(&mut self, mode: EditMode) -> Result<()> {
        self.mass_flags_mut(mode).request_sent = true;
        self.save()
    }

    pub fn mark_mass_executed(&mut self, mode: EditMode) -> Result<()> {
        self.mass_flags_mut(mode).executed = true;
        self.save()
    }
}

impl PendingSource for LocalStore {
    fn pending_time(&self, key: &VisitKey) -> Option<PendingTimeChange> {
        self.time_change(key).cloned()
    }

    fn pending_store(&self, key: &VisitKey) -> Option<PendingStoreChange> {
        self.store_change(key).cloned()
    }

    fn inclusions(&self) -> Vec<NewInclusion> {
        self.state.inclusions.clone()
    }
}
