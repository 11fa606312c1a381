use clap::{Parser, Subcommand};
use std::path::PathBuf;
use visit_roster_common::EditMode;

#[derive(Parser)]
#[command(name = "visit-roster")]
#[command(about = "訪問ロスターの変更申請・店舗クライアント照合ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// パスワードでログイン
    Login {
        /// パスワード（省略時は入力を求める）
        #[arg(short, long)]
        password: Option<String>,
    },

    /// ログアウト
    Logout,

    /// 今日以降の訪問予定を表示
    Roster {
        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 時間変更を申請
    RequestTime {
        /// 訪問日 (dd/MM/yyyy)
        #[arg(short, long)]
        date: String,

        /// 店舗名
        #[arg(short, long)]
        store: String,

        /// 新しい開始時刻
        #[arg(long)]
        start: String,

        /// 新しい終了時刻
        #[arg(long)]
        end: String,

        /// 理由
        #[arg(short, long)]
        reason: String,
    },

    /// 店舗（JP）変更を申請
    RequestStore {
        /// 訪問日 (dd/MM/yyyy)
        #[arg(short, long)]
        date: String,

        /// 現在の店舗名
        #[arg(short, long)]
        store: String,

        /// 新しい店舗名
        #[arg(long)]
        new_store: String,

        /// 開始時刻
        #[arg(long)]
        start: String,

        /// 終了時刻
        #[arg(long)]
        end: String,

        /// 訪問種別
        #[arg(short = 't', long, default_value = "")]
        visit_type: String,

        /// 理由
        #[arg(short, long)]
        reason: String,
    },

    /// 新規訪問を申請
    Include {
        /// 訪問日 (dd/MM/yyyy)
        #[arg(short, long)]
        date: String,

        /// 店舗名
        #[arg(short, long)]
        store: String,

        /// 開始時刻
        #[arg(long)]
        start: String,

        /// 終了時刻
        #[arg(long)]
        end: String,

        /// 訪問種別
        #[arg(short = 't', long, default_value = "")]
        visit_type: String,

        /// 理由
        #[arg(short, long)]
        reason: String,
    },

    /// 一括変更を申請
    MassEdit {
        /// モード (time/store)
        #[arg(short, long)]
        mode: EditMode,

        /// 対象の訪問（`日付@店舗` 形式、複数指定可）
        #[arg(long = "visit", required = true)]
        visits: Vec<String>,

        /// 新しい店舗名（storeモード）
        #[arg(long, default_value = "")]
        new_store: String,

        /// 訪問種別（storeモード）
        #[arg(short = 't', long, default_value = "")]
        visit_type: String,

        /// 開始時刻（省略時は現在の時刻）
        #[arg(long)]
        start: Option<String>,

        /// 終了時刻（省略時は現在の時刻）
        #[arg(long)]
        end: Option<String>,

        /// 理由
        #[arg(short, long, default_value = "")]
        reason: String,
    },

    /// 承認済みの変更の実行確認メッセージを作成
    Execute {
        /// 種類 (time/store/inclusion/mass)
        #[arg(required = true)]
        kind: ExecuteKind,

        /// 訪問日 (dd/MM/yyyy)
        #[arg(short, long)]
        date: Option<String>,

        /// 店舗名
        #[arg(short, long)]
        store: Option<String>,

        /// 一括変更のモード (time/store)
        #[arg(short, long)]
        mode: Option<EditMode>,

        /// 一括変更の対象（`日付@店舗` 形式）
        #[arg(long = "visit")]
        visits: Vec<String>,
    },

    /// 管理者ダッシュボード
    Dashboard {
        /// 今週（月曜〜日曜）のみ
        #[arg(long, conflicts_with_all = ["from", "to"])]
        week: bool,

        /// 期間の開始日 (yyyy-mm-dd)
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// 期間の終了日 (yyyy-mm-dd)
        #[arg(long, requires = "from")]
        to: Option<String>,

        /// 担当者で絞り込み
        #[arg(short, long)]
        consultant: Option<String>,

        /// 変更種別で絞り込み
        #[arg(short = 't', long)]
        change_type: Option<String>,

        /// クライアントで絞り込み（"N/A" で未照合）
        #[arg(long)]
        client: Option<String>,

        /// 保留中のみ表示
        #[arg(long)]
        pending_only: bool,

        /// ページ番号
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// クライアントに照合できなかった店舗名を表示
    Unmatched,

    /// ログのステータスを完了にする（マスタのみ）
    MarkDone {
        /// シートの行番号
        #[arg(required = true)]
        row: usize,
    },

    /// 設定を表示/編集
    Config {
        /// ログストアのURLを設定
        #[arg(long)]
        set_sheets_url: Option<String>,

        /// 承認者のWhatsApp番号を設定
        #[arg(long)]
        set_approver_phone: Option<String>,

        /// 店舗マスタCSVを設定
        #[arg(long)]
        set_directory: Option<PathBuf>,

        /// ロスターCSVを設定
        #[arg(long)]
        set_roster: Option<PathBuf>,

        /// パスワードCSVを設定
        #[arg(long)]
        set_passwords: Option<PathBuf>,

        /// エイリアス規則JSONを設定
        #[arg(long)]
        set_alias_file: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 実行確認の種類
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecuteKind {
    Time,
    Store,
    Inclusion,
    Mass,
}

impl std::str::FromStr for ExecuteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "time" | "horario" | "horário" => Ok(ExecuteKind::Time),
            "store" | "jp" | "loja" => Ok(ExecuteKind::Store),
            "inclusion" | "inclusao" | "inclusão" => Ok(ExecuteKind::Inclusion),
            "mass" | "massa" => Ok(ExecuteKind::Mass),
            _ => Err(format!("Unknown kind: {}. Use time, store, inclusion, or mass", s)),
        }
    }
}

/// `日付@店舗` を分解
pub fn parse_visit_ref(s: &str) -> Option<(String, String)> {
    let (date, store) = s.split_once('@')?;
    let (date, store) = (date.trim(), store.trim());
    if date.is_empty() || store.is_empty() {
        return None;
    }
    Some((date.to_string(), store.to_string()))
}
