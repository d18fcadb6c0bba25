mod commands;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rota_config::AppConfig;
use rota_runtime::{Connector, Notice, NoticeLevel, RosterSession};
use rota_sync::GithubContentStore;

#[derive(Debug, Parser)]
#[command(
    name = "rota",
    version,
    about = "Browse, edit and synchronise a shift roster kept in a hosted repository"
)]
struct Cli {
    /// Configuration file; missing files fall back to defaults.
    #[arg(long, global = true, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the cycle documents available in the repository.
    Streams {
        #[arg(long)]
        json: bool,
    },
    /// Fetch the active cycle document.
    Pull,
    /// Write the local document back to the repository.
    Push,
    /// Make another cycle document active and pull it.
    Switch {
        #[arg(value_name = "PATH")]
        path: String,
    },
    /// Show who is on duty on one day (today by default).
    Day {
        /// Absolute day index within the cycle.
        #[arg(long, conflicts_with_all = ["step", "month"])]
        index: Option<usize>,
        /// Move this many days from today.
        #[arg(long, allow_negative_numbers = true, conflicts_with = "month")]
        step: Option<isize>,
        /// Move this many months from the current one.
        #[arg(long, allow_negative_numbers = true)]
        month: Option<isize>,
        #[arg(long)]
        json: bool,
    },
    /// Print the whole cycle as a grid.
    Table,
    /// List operators, optionally filtered by name.
    Operators {
        /// Case-insensitive name fragment.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show one operator's statistics.
    Operator {
        #[arg(value_name = "INDEX")]
        index: usize,
        #[arg(long)]
        json: bool,
    },
    /// Show duty-hour totals for the whole cycle.
    Fleet {
        #[arg(long)]
        json: bool,
    },
    /// Change one cell of the local document.
    Set {
        worker: usize,
        day: usize,
        code: String,
        /// Lift the edit lock for this change.
        #[arg(long)]
        unlock: bool,
        /// Push the document right after the edit.
        #[arg(long)]
        push: bool,
    },
    /// Inspect and edit the operator group matrix.
    Groups {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Store a credential and repository for later runs.
    Login {
        #[arg(long)]
        token: String,
        /// `owner/repo`; empty restores the default repository.
        #[arg(long, default_value = "")]
        repo: String,
    },
}

#[derive(Debug, Subcommand)]
enum GroupCommands {
    List,
    /// Move a group's lower identifier bound.
    SetFrom { key: String, from: i64 },
    /// Publish the matrix to the shared settings file.
    Publish,
}

fn github_connector() -> Connector<GithubContentStore> {
    Box::new(|config: &AppConfig| -> Result<GithubContentStore> {
        let timeout = Duration::from_secs(config.sync.request_timeout_secs);
        Ok(GithubContentStore::new(&config.remote, timeout)?)
    })
}

/// Print a notice; failures end the process with a non-zero status.
fn finish(notice: Notice) -> Result<()> {
    if notice.is_failure() {
        error!(level = ?notice.level, message = %notice.message, "command failed");
        bail!("{notice}");
    }
    println!("{notice}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    info!(
        config = %cli.config.display(),
        repo = %config.remote.repo,
        branch = %config.remote.branch,
        "starting rota"
    );

    let mut session = RosterSession::open(config, github_connector()).await?;

    match cli.command.unwrap_or(Commands::Day {
        index: None,
        step: None,
        month: None,
        json: false,
    }) {
        Commands::Streams { json } => commands::run_streams(&session, json)?,
        Commands::Pull => finish(session.pull().await)?,
        Commands::Push => finish(session.push().await)?,
        Commands::Switch { path } => finish(session.switch_stream(&path).await)?,
        Commands::Day {
            index,
            step,
            month,
            json,
        } => {
            if let Some(index) = index {
                session.jump_to_day(index);
            }
            if let Some(step) = step {
                if !session.step_day(step) {
                    eprintln!("day step out of range; staying on the current day");
                }
            }
            if let Some(month) = month {
                let notice = session.step_month(month);
                eprintln!("{notice}");
            }
            commands::run_day(&session, json)?;
        }
        Commands::Table => commands::run_table(&session),
        Commands::Operators { search, json } => {
            commands::run_operators(&session, search.as_deref().unwrap_or(""), json)?
        }
        Commands::Operator { index, json } => commands::run_operator(&session, index, json)?,
        Commands::Fleet { json } => commands::run_fleet(&session, json)?,
        Commands::Set {
            worker,
            day,
            code,
            unlock,
            push,
        } => {
            if unlock {
                session.set_locked(false);
            }
            let notice = session.set_shift(worker, day, &code);
            let edited = !notice.is_failure() && notice.level != NoticeLevel::Warning;
            finish(notice)?;
            if push && edited {
                finish(session.push().await)?;
            }
        }
        Commands::Groups { command } => match command {
            GroupCommands::List => commands::run_groups_list(&session),
            GroupCommands::SetFrom { key, from } => finish(session.set_group_from(&key, from))?,
            GroupCommands::Publish => finish(session.publish_groups().await)?,
        },
        Commands::Login { token, repo } => finish(session.login(&token, &repo))?,
    }

    Ok(())
}
