#![warn(missing_docs)]
//! # sarif-dash binary
//!
//! Command-line entry point: validates, views, and keeps a session history of
//! SARIF documents.

use std::io::Read as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use sarif_dash_app::{
    AppConfig, AppError, DashboardSession, LOG_ENV, ViewOptions, app_version, load_entry, now_ms,
    record_document, render_charts, render_row_detail, render_summary, render_table, table_state,
};
use sarif_dash_contract::parse_analysis_log;
use sarif_dash_history::{DirSessionBackend, HistoryStore};
use sarif_dash_intake::{BlobSource, FileBlob, MemoryBlob, decode_text};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sarif-dash", version = app_version(), about = "Terminal dashboard for SARIF logs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a document against the minimal SARIF shape.
    Validate {
        /// File path, or `-` for stdin.
        input: String,
    },
    /// Show metrics, charts, and findings for a document.
    View {
        /// File path, or `-` for stdin.
        input: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Manage the session history.
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List live entries.
    List,
    /// Admit a document and record it.
    Add {
        /// File path, or `-` for stdin.
        input: String,
    },
    /// Reopen an entry by id.
    Show {
        id: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Remove one entry.
    Delete { id: String },
    /// Discard the whole history.
    Clear,
}

#[derive(Args)]
struct ViewArgs {
    /// Case-insensitive text matched against visible columns.
    #[arg(long)]
    filter: Option<String>,
    /// Column to sort by.
    #[arg(long)]
    sort: Option<String>,
    /// Sort descending.
    #[arg(long)]
    desc: bool,
    /// One-based page number.
    #[arg(long)]
    page: Option<usize>,
    /// Rows per page.
    #[arg(long)]
    page_size: Option<usize>,
    /// Extra columns to show (tags, description, help).
    #[arg(long, value_delimiter = ',')]
    show: Vec<String>,
    /// Columns to hide.
    #[arg(long, value_delimiter = ',')]
    hide: Vec<String>,
    /// Print expanded detail for the N-th row of the page (one-based).
    #[arg(long)]
    detail: Option<usize>,
    /// Emit the dashboard as JSON.
    #[arg(long)]
    json: bool,
}

impl ViewArgs {
    fn options(&self) -> ViewOptions {
        ViewOptions {
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            descending: self.desc,
            page: self.page,
            page_size: self.page_size,
            show: self.show.clone(),
            hide: self.hide.clone(),
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Command::Validate { input } => run_validate(&input),
        Command::View { input, view } => {
            let mut session = DashboardSession::new();
            let blob = open_input(&input)?;
            session.load(blob.as_ref()).with_context(|| format!("cannot load {input}"))?;
            print_dashboard(&mut session, &view, &config)
        }
        Command::History { action } => run_history(action, &config),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_input(input: &str) -> Result<Box<dyn BlobSource>> {
    if input == "-" {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("failed to read stdin")?;
        return Ok(Box::new(MemoryBlob::new("stdin", bytes)));
    }
    Ok(Box::new(FileBlob::new(PathBuf::from(input))))
}

fn run_validate(input: &str) -> Result<()> {
    let blob = open_input(input)?;
    let text = decode_text(blob.name(), &blob.read_bytes()?)?;
    match parse_analysis_log(&text) {
        Ok(log) => {
            println!(
                "{}: valid SARIF ({} runs, {} findings)",
                blob.name(),
                log.runs.len(),
                log.finding_count()
            );
            Ok(())
        }
        Err(error) => bail!("{}: {error}", blob.name()),
    }
}

fn open_history(config: &AppConfig) -> HistoryStore {
    HistoryStore::open(Arc::new(DirSessionBackend::new(&config.history_dir)))
}

fn run_history(action: HistoryCommand, config: &AppConfig) -> Result<()> {
    let history = open_history(config);
    let now = now_ms();

    match action {
        HistoryCommand::List => {
            let entries = history.entries(now)?;
            if entries.is_empty() {
                println!("No SARIF history available.");
            }
            for entry in entries {
                println!("{}  {}  ({} bytes)", entry.id, entry.name, entry.content.len());
            }
            Ok(())
        }
        HistoryCommand::Add { input } => {
            let mut session = DashboardSession::new();
            let blob = open_input(&input)?;
            session.load(blob.as_ref()).with_context(|| format!("cannot load {input}"))?;
            let Some(document) = session.current() else {
                bail!("{input}: read was superseded");
            };
            let entry = record_document(&history, document, now)?;
            println!("{}", entry.id);
            Ok(())
        }
        HistoryCommand::Show { id, view } => {
            let document = match load_entry(&history, &id, now) {
                Ok(document) => document,
                Err(error) if error.is_not_found() => {
                    bail!("SARIF entry {id} was not found or has expired; add the document again")
                }
                Err(error) => return Err(error.into()),
            };
            let mut session = DashboardSession::new();
            session.replace(document);
            print_dashboard(&mut session, &view, config)
        }
        HistoryCommand::Delete { id } => {
            history.delete(&id, now).map_err(AppError::from)?;
            println!("Deleted {id}");
            Ok(())
        }
        HistoryCommand::Clear => {
            history.close()?;
            println!("History cleared");
            Ok(())
        }
    }
}

fn print_dashboard(session: &mut DashboardSession, view: &ViewArgs, config: &AppConfig) -> Result<()> {
    let Some(dashboard) = session.dashboard() else {
        bail!("no document loaded");
    };

    if view.json {
        println!("{}", serde_json::to_string_pretty(dashboard.as_ref())?);
        return Ok(());
    }

    let state = table_state(&view.options(), config.page_size)?;
    let page = state.view(&dashboard.rows);

    print!("{}", render_summary(&dashboard.metrics));
    println!();
    print!("{}", render_charts(&dashboard.charts));
    println!();
    print!("{}", render_table(&page));

    if let Some(position) = view.detail {
        let Some(row) = position.checked_sub(1).and_then(|index| page.rows.get(index)) else {
            bail!("row {position} is not on this page");
        };
        println!();
        print!("{}", render_row_detail(row));
    }

    Ok(())
}
