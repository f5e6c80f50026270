mod input;
mod logging;
mod model;
mod pipeline;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{info, warn};

use crate::input::StoreError;
use crate::input::store::Store;
use crate::model::profile::{PlacementProfile, ReportProfile};
use crate::pipeline::placement::{PlacementRequest, place_organization};
use crate::pipeline::rank::RankError;
use crate::pipeline::validate::audit;
use crate::report::json::{render_audit_json, render_placement_json};
use crate::report::text::{render_audit_text, render_placement_text};
use crate::report::{build_summary, ranked_rows, write_reports};

/// Tie-aware ranking, percentiles and integrity audits for scored
/// organization databases.
#[derive(Debug, Parser)]
#[command(name = "quality-rank", version, about, long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank every organization and write ranks and percentiles back.
    Rank {
        #[arg(long)]
        db: PathBuf,
        /// Directory for the snapshot taken before writing.
        #[arg(long)]
        backup_dir: Option<PathBuf>,
        /// Rank in memory only; leave the database untouched.
        #[arg(long)]
        dry_run: bool,
        /// Also write reports into this directory.
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = ReportProfile::default_v1().top_n)]
        top: usize,
    },
    /// Audit stored ranks and percentiles; exits with status 2 on defects.
    Verify {
        #[arg(long)]
        db: PathBuf,
        /// Print the audit as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Rank in memory and write rankings.tsv, summary.json and report.txt.
    Report {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = ReportProfile::default_v1().top_n)]
        top: usize,
    },
    /// Show the rank an organization would take in the stored population.
    /// Stored entries with the same name are left out first.
    Place {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        score: f64,
        /// Region for the regional ranking; defaults to the stored entry's.
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List snapshots of the database, oldest first.
    Backups {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        backup_dir: Option<PathBuf>,
    },
    /// Replace the database with a snapshot (the current file is snapshotted first).
    Restore {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        backup: PathBuf,
        #[arg(long)]
        backup_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Rank { dry_run: bool },
    Verify,
    Report,
    Place(PlacementRequest),
    Backups,
    Restore { backup: PathBuf },
}

/// Everything one invocation needs, resolved from the command line.
#[derive(Debug, Clone)]
struct RunConfig {
    action: Action,
    db: PathBuf,
    backup_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    json: bool,
    report: ReportProfile,
    placement: PlacementProfile,
}

impl RunConfig {
    fn new(action: Action, db: PathBuf) -> Self {
        Self {
            action,
            db,
            backup_dir: None,
            out_dir: None,
            json: false,
            report: ReportProfile::default_v1(),
            placement: PlacementProfile::default_v1(),
        }
    }
}

impl From<Command> for RunConfig {
    fn from(command: Command) -> Self {
        match command {
            Command::Rank {
                db,
                backup_dir,
                dry_run,
                out,
                top,
            } => {
                let mut cfg = RunConfig::new(Action::Rank { dry_run }, db);
                cfg.backup_dir = backup_dir;
                cfg.out_dir = out;
                cfg.report = cfg.report.with_top_n(top);
                cfg
            }
            Command::Verify { db, json } => {
                let mut cfg = RunConfig::new(Action::Verify, db);
                cfg.json = json;
                cfg
            }
            Command::Report { db, out, top } => {
                let mut cfg = RunConfig::new(Action::Report, db);
                cfg.out_dir = Some(out);
                cfg.report = cfg.report.with_top_n(top);
                cfg
            }
            Command::Place {
                db,
                name,
                score,
                region,
                json,
            } => {
                let mut cfg =
                    RunConfig::new(Action::Place(PlacementRequest { name, score, region }), db);
                cfg.json = json;
                cfg
            }
            Command::Backups { db, backup_dir } => {
                let mut cfg = RunConfig::new(Action::Backups, db);
                cfg.backup_dir = backup_dir;
                cfg
            }
            Command::Restore {
                db,
                backup,
                backup_dir,
            } => {
                let mut cfg = RunConfig::new(Action::Restore { backup }, db);
                cfg.backup_dir = backup_dir;
                cfg
            }
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Rank(#[from] RankError),
    #[error("failed to write reports to {path}: {source}")]
    Report {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    AuditFailed,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::AuditFailed => ExitCode::from(2),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = RunConfig::from(cli.command);
    match run(&config) {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &RunConfig) -> Result<Outcome, CliError> {
    let store = open_store(config);
    match &config.action {
        Action::Rank { dry_run } => {
            let mut database = store.load()?;
            let outcome = database.apply_ranking()?;
            info!(
                db = %store.path().display(),
                population = outcome.population,
                distinct_scores = outcome.distinct_scores,
                "ranked"
            );
            if *dry_run {
                info!("dry run; database not written");
            } else if let Some(snapshot) = store.commit(&database)? {
                info!(snapshot = %snapshot.display(), "previous database preserved");
            }
            emit_reports(&database, config)?;
            Ok(Outcome::Success)
        }
        Action::Verify => {
            let database = store.load()?;
            let report = audit(&database.organizations);
            if config.json {
                print!("{}", render_audit_json(&report)?);
            } else {
                print!("{}", render_audit_text(&report));
            }
            if report.is_clean() {
                info!(population = report.population, "audit clean");
                Ok(Outcome::Success)
            } else {
                warn!(defects = report.defect_count(), "audit found defects");
                Ok(Outcome::AuditFailed)
            }
        }
        Action::Report => {
            let mut database = store.load()?;
            database.apply_ranking()?;
            emit_reports(&database, config)?;
            Ok(Outcome::Success)
        }
        Action::Place(request) => {
            let database = store.load()?;
            let placement = place_organization(&database.organizations, request, &config.placement)?;
            if config.json {
                print!("{}", render_placement_json(&placement)?);
            } else {
                print!("{}", render_placement_text(&placement, config.report.decimals));
            }
            Ok(Outcome::Success)
        }
        Action::Backups => {
            for path in store.backups()? {
                println!("{}", path.display());
            }
            Ok(Outcome::Success)
        }
        Action::Restore { backup } => {
            if let Some(snapshot) = store.restore(backup)? {
                info!(snapshot = %snapshot.display(), "replaced database preserved");
            }
            Ok(Outcome::Success)
        }
    }
}

fn open_store(config: &RunConfig) -> Store {
    let store = Store::open(config.db.clone());
    match &config.backup_dir {
        Some(dir) => store.with_backup_dir(dir.clone()),
        None => store,
    }
}

/// Writes reports when an output directory is configured.
fn emit_reports(database: &input::Database, config: &RunConfig) -> Result<(), CliError> {
    let Some(out_dir) = &config.out_dir else {
        return Ok(());
    };
    let rows = ranked_rows(database);
    let summary = build_summary(&rows, &config.report);
    write_reports(&rows, &summary, &config.report, out_dir).map_err(|source| CliError::Report {
        path: out_dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
