//! visit-roster
//!
//! 担当者の訪問予定（ロスター）に対する変更申請と、管理者向けの集計ダッシュボード。
//! 店舗名のあいまい照合・クライアント帰属は `visit_roster_common` にある。

pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod log_store;
pub mod state;
