use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use visit_roster::commands::{date_filter, App};
use visit_roster::{cli, config, error, state};
use visit_roster_common::requests::{InclusionDraft, MassEdit, StoreChange, TimeChange};
use visit_roster_common::Filters;
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use state::LocalStore;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

struct ConfigChanges {
    sheets_url: Option<String>,
    approver_phone: Option<String>,
    directory: Option<PathBuf>,
    roster: Option<PathBuf>,
    passwords: Option<PathBuf>,
    alias_file: Option<PathBuf>,
    show: bool,
}

fn configure(mut config: Config, changes: ConfigChanges) -> Result<()> {
    if let Some(url) = changes.sheets_url {
        config.set_sheets_url(url)?;
        println!("✔ ログストアのURLを設定しました");
    }

    let mut changed = false;
    if let Some(phone) = changes.approver_phone {
        config.approver_phone = Some(phone);
        changed = true;
    }
    if let Some(path) = changes.directory {
        config.directory_path = Some(path);
        changed = true;
    }
    if let Some(path) = changes.roster {
        config.roster_path = Some(path);
        changed = true;
    }
    if let Some(path) = changes.passwords {
        config.passwords_path = Some(path);
        changed = true;
    }
    if let Some(path) = changes.alias_file {
        config.alias_file = Some(path);
        changed = true;
    }
    if changed {
        config.save()?;
        println!("✔ 設定を保存しました");
    }

    if changes.show {
        let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "未設定".into());
        println!("設定:");
        println!("  ログストア: {}", if config.sheets_url().is_some() { "設定済み" } else { "未設定" });
        println!("  店舗マスタ: {}", path(&config.directory_path));
        println!("  ロスター: {}", path(&config.roster_path));
        println!("  パスワード: {}", path(&config.passwords_path));
        println!("  エイリアス: {}", path(&config.alias_file));
        println!("  承認者: {}", config.approver_name);
        println!("  承認者番号: {}", config.approver_phone.as_deref().unwrap_or("未設定"));
        println!("  照合閾値: {}", config.match_config.threshold);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load()?;

    let state = LocalStore::load(&Config::state_path()?);
    let mut app = App::new(config, state);

    match cli.command {
        Commands::Login { password } => app.login(password).await?,

        Commands::Logout => app.logout()?,

        Commands::Roster { json } => app.roster(json).await?,

        Commands::RequestTime { date, store, start, end, reason } => {
            let change = TimeChange {
                new_check_in: start,
                new_check_out: end,
                reason,
            };
            app.request_time(&date, &store, change).await?;
        }

        Commands::RequestStore { date, store, new_store, start, end, visit_type, reason } => {
            let change = StoreChange {
                new_store,
                new_time: start,
                new_time_end: end,
                visit_type,
                reason,
            };
            app.request_store(&date, &store, change).await?;
        }

        Commands::Include { date, store, start, end, visit_type, reason } => {
            let draft = InclusionDraft {
                date,
                store,
                check_in: start,
                check_out: end,
                visit_type,
                reason,
            };
            app.include(draft).await?;
        }

        Commands::MassEdit { mode, visits, new_store, visit_type, start, end, reason } => {
            let edit = MassEdit {
                new_store,
                visit_type,
                reason,
                new_start_time: start.unwrap_or_default(),
                new_end_time: end.unwrap_or_default(),
            };
            app.mass_edit(mode, &visits, edit).await?;
        }

        Commands::Execute { kind, date, store, mode, visits } => {
            app.execute(kind, date, store, mode, &visits).await?;
        }

        Commands::Dashboard { week, from, to, consultant, change_type, client, pending_only, page, json } => {
            let filters = Filters {
                date: date_filter(week, from.as_deref(), to.as_deref())?,
                consultant,
                change_type,
                client,
            };
            app.dashboard(filters, pending_only, page, json).await?;
        }

        Commands::Unmatched => app.unmatched().await?,

        Commands::MarkDone { row } => app.mark_done(row).await?,

        Commands::Config {
            set_sheets_url,
            set_approver_phone,
            set_directory,
            set_roster,
            set_passwords,
            set_alias_file,
            show,
        } => configure(
            app.config,
            ConfigChanges {
                sheets_url: set_sheets_url,
                approver_phone: set_approver_phone,
                directory: set_directory,
                roster: set_roster,
                passwords: set_passwords,
                alias_file: set_alias_file,
                show,
            },
        )?,
    }

    Ok(())
}
