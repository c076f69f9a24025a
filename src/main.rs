//! CLI entry point for PHARS, the public health analytics & reporting tool.
//!
//! Provides subcommands for listing API metadata, rendering a dashboard for
//! one selection, exporting the CSV report, and running an interactive
//! session that re-evaluates on every filter change.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use phars::api::{
    ApiSource, DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS, HttpApi, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS,
};
use phars::console::{Command, HELP, parse_command};
use phars::dates::parse_date;
use phars::render::{dashboard_json, render_dashboard, render_metadata};
use phars::report::write_export;
use phars::error::PharsError;
use phars::session::{NO_SELECTION_HINT, Session, UNREACHABLE_HINT};
use phars::view::Dashboard;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "phars")]
#[command(about = "Public Health Analytics & Reporting System", long_about = None)]
struct Cli {
    /// Base URL of the statistics API
    #[arg(long, global = true, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Per-request timeout in seconds
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS)
    )]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List levels, locations and the available date range
    Metadata,
    /// Render KPIs, trends, the situation report and quality checks
    Dashboard {
        #[command(flatten)]
        selection: Selection,

        /// Print the dashboard as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the CSV report for a selection
    Export {
        #[command(flatten)]
        selection: Selection,

        /// Directory to write the report into
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Gzip compress the CSV
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Start an interactive session reading commands from stdin
    Interactive {
        /// Directory that `export` writes into
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Args)]
struct Selection {
    /// Location level (defaults to the first level)
    #[arg(long)]
    level: Option<String>,

    /// Location (defaults to Indonesia or the first location of the level)
    #[arg(long)]
    location: Option<String>,

    /// Window start, YYYY-MM-DD (defaults to the earliest date)
    #[arg(long, value_parser = parse_date_arg)]
    start: Option<NaiveDate>,

    /// Window end, YYYY-MM-DD (defaults to the latest date)
    #[arg(long, value_parser = parse_date_arg)]
    end: Option<NaiveDate>,
}

fn parse_date_arg(raw: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing();
    let cli = Cli::parse();

    let api = HttpApi::new(&cli.api_base, cli.timeout);
    info!(api_base = api.base_url(), timeout = cli.timeout, "Starting session");

    let mut session = start_session(api).await?;

    match cli.command {
        Commands::Metadata => {
            render_metadata(&mut std::io::stdout().lock(), session.metadata())?;
        }
        Commands::Dashboard { selection, json } => {
            apply_selection(&mut session, &selection)?;
            let dashboard = session.evaluate(today()).await?;
            let mut out = std::io::stdout().lock();
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&dashboard_json(&dashboard))?)?;
            } else {
                render_dashboard(&mut out, &dashboard)?;
            }
        }
        Commands::Export {
            selection,
            dir,
            gzip,
        } => {
            apply_selection(&mut session, &selection)?;
            match session.evaluate(today()).await? {
                Dashboard::NoData { notice } => warn!(%notice, "Nothing to export"),
                Dashboard::Ready(sections) => {
                    let path = write_export(&dir, &sections.report.filename, &sections.report.csv, gzip)?;
                    println!("{}", path.display());
                }
            }
        }
        Commands::Interactive { dir } => {
            run_interactive(&mut session, &dir).await?;
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/phars.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"))
        .to_path_buf();
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("phars.log"))
        .to_os_string();

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info"));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", "debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    file_guard
}

fn env_filter(var: &str, default: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Starts a session, explaining a failure by whether the API or its
/// metadata was at fault.
async fn start_session(api: HttpApi) -> Result<Session<HttpApi>> {
    Session::start(api).await.map_err(|e| {
        error!(error = %e, "Session could not start");
        let hint = match &e {
            PharsError::Api(_) => UNREACHABLE_HINT,
            _ => NO_SELECTION_HINT,
        };
        anyhow::anyhow!("{hint}\n{e}")
    })
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Applies CLI flags through the filter operations so invalid input fails
/// before any summary or cases request.
fn apply_selection<A: ApiSource>(session: &mut Session<A>, selection: &Selection) -> Result<()> {
    if let Some(level) = &selection.level {
        session.set_level(level)?;
    }
    if let Some(location) = &selection.location {
        session.set_location(location)?;
    }
    if selection.start.is_some() || selection.end.is_some() {
        let start = selection.start.unwrap_or(session.filter().start());
        let end = selection.end.unwrap_or(session.filter().end());
        session.set_date_range(start, end)?;
    }
    Ok(())
}

/// Reads commands until `quit` or end of input. Errors from a single
/// command are reported and the session continues. `api` and `timeout`
/// replace the session, and its cache, only once the new one has started.
async fn run_interactive(session: &mut Session<HttpApi>, dir: &Path) -> Result<()> {
    println!("{HELP}");
    show(session).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("phars> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(msg) => {
                println!("  {msg}");
                continue;
            }
        };

        let outcome = match &command {
            Command::Level(level) => session.set_level(level).map_err(anyhow::Error::from),
            Command::Location(location) => {
                session.set_location(location).map_err(anyhow::Error::from)
            }
            Command::Range(start, end) => {
                session.set_date_range(*start, *end).map_err(anyhow::Error::from)
            }
            Command::Show => {
                show(session).await;
                Ok(())
            }
            Command::Export { gzip } => export(session, dir, *gzip).await,
            Command::Meta => render_metadata(&mut std::io::stdout().lock(), session.metadata())
                .map_err(anyhow::Error::from),
            Command::Api(base_url) => {
                let timeout = session.api().inner().timeout().as_secs();
                reconnect(session, HttpApi::new(base_url, timeout)).await
            }
            Command::Timeout(secs) => {
                let base_url = session.api().inner().base_url().to_string();
                reconnect(session, HttpApi::new(&base_url, *secs)).await
            }
            Command::Help => {
                println!("{HELP}");
                Ok(())
            }
            Command::Quit => break,
        };

        match outcome {
            Ok(()) if command.changes_filter() => show(session).await,
            Ok(()) => {}
            Err(e) => {
                warn!(error = %e, "Command rejected");
                println!("  error: {e}");
            }
        }
    }

    info!(cached_responses = session.api().len(), "Session ended");
    Ok(())
}

/// Runs one pass and prints it, or prints the error in place of content.
async fn show<A: ApiSource>(session: &Session<A>) {
    let result = session.evaluate(today()).await;
    let mut out = std::io::stdout().lock();
    let rendered = match result {
        Ok(dashboard) => render_dashboard(&mut out, &dashboard),
        Err(e) => {
            error!(error = %e, "Evaluation failed");
            writeln!(out, "  error: {e}")
        }
    };
    if let Err(e) = rendered {
        error!(error = %e, "Failed to write output");
    }
}

/// Swaps in a session over `api`, keeping the current one if it cannot start.
async fn reconnect(session: &mut Session<HttpApi>, api: HttpApi) -> Result<()> {
    info!(
        api_base = api.base_url(),
        timeout = api.timeout().as_secs(),
        "Reconnecting"
    );
    *session = start_session(api).await?;
    show(session).await;
    Ok(())
}

async fn export<A: ApiSource>(session: &Session<A>, dir: &Path, gzip: bool) -> Result<()> {
    match session.evaluate(today()).await? {
        Dashboard::NoData { notice } => println!("  {notice}"),
        Dashboard::Ready(sections) => {
            let path = write_export(dir, &sections.report.filename, &sections.report.csv, gzip)?;
            println!("  wrote {}", path.display());
        }
    }
    Ok(())
}
