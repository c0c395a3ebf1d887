mod chains;
mod config;
mod data;
mod error;
mod heatmap;
mod params;
mod regime;
mod rolling;
mod sample;
mod series;
mod snapshot;
mod ui;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use eyre::Result;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{Stdout, stdout},
    path::PathBuf,
    time::Duration,
};
use tokio::time;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use config::{DEFAULT_MAX_BLOCK_HISTORY, DEFAULT_POLL_INTERVAL_SECS};
use data::{Collector, CollectorConfig};
use params::{BLOB_SIZE_BYTES, ParamSchedule, ProtocolParams};
use snapshot::{MarketSnapshot, compute_snapshot};
use ui::Dashboard;

type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Terminal dashboard for the Ethereum blob market
#[derive(Debug, Parser)]
#[command(name = "blobsight", version, about)]
struct Cli {
    /// Execution-layer RPC endpoint
    #[arg(long, env = "BLOBSIGHT_RPC_URL", default_value = "http://localhost:8545")]
    rpc_url: String,

    /// Seconds between refresh cycles
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    poll_interval: u64,

    /// Blocks of history kept in memory
    #[arg(long, default_value_t = DEFAULT_MAX_BLOCK_HISTORY)]
    history: usize,

    /// Override the blob target for the whole timeline (needs --blob-max)
    #[arg(long, requires = "blob_max")]
    blob_target: Option<u64>,

    /// Override the blob max for the whole timeline (needs --blob-target)
    #[arg(long, requires = "blob_target")]
    blob_max: Option<u64>,

    /// Append logs here; the terminal itself belongs to the dashboard
    #[arg(long, env = "BLOBSIGHT_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Collect a bounded history, print one snapshot as JSON, and exit
    #[arg(long)]
    dump_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    // Parameter validation is fatal here, before any computation runs.
    let schedule = match (cli.blob_target, cli.blob_max) {
        (Some(target), Some(max)) => {
            ParamSchedule::fixed(ProtocolParams::new(target, max, BLOB_SIZE_BYTES)?)
        }
        _ => ParamSchedule::mainnet(),
    };

    let mut collector = Collector::new(CollectorConfig {
        rpc_url: cli.rpc_url.clone(),
        max_block_history: cli.history,
    })?;

    if cli.dump_json {
        return dump_snapshot(&mut collector, &schedule).await;
    }

    println!("Starting blob market monitor...");
    println!("RPC URL: {}", cli.rpc_url);
    println!("Press 'q' to quit");

    let mut terminal = setup_terminal()?;
    let mut dashboard = Dashboard::new();
    let mut snapshot: Option<MarketSnapshot> = None;

    let poll_interval = Duration::from_secs(cli.poll_interval.max(1));
    let mut last_update: Option<std::time::Instant> = None;

    loop {
        if last_update.is_none_or(|t| t.elapsed() >= poll_interval) {
            collector.collect().await;
            last_update = Some(std::time::Instant::now());

            let (samples, txs) = collector.metrics().snapshot_inputs();
            match compute_snapshot(&samples, &txs, &schedule, unix_now()) {
                Ok(fresh) => snapshot = Some(fresh),
                // Keep showing the previous snapshot; one bad cycle must
                // not blank a running dashboard.
                Err(e) => warn!(error = %e, "refresh cycle failed"),
            }
        }

        collector.check_staleness();

        let metrics = collector.metrics();
        terminal.draw(|frame| dashboard.render(frame, metrics, snapshot.as_ref()))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        dashboard.quit();
                        break;
                    }
                    _ => {}
                }
            }
        }

        if dashboard.should_quit {
            break;
        }

        time::sleep(Duration::from_millis(100)).await;
    }

    cleanup_terminal(&mut terminal)?;
    println!("Goodbye!");
    Ok(())
}

/// One-shot mode: backfill until the history stops growing (or a bounded
/// number of cycles), then print the snapshot JSON to stdout.
async fn dump_snapshot(collector: &mut Collector, schedule: &ParamSchedule) -> Result<()> {
    let mut previous_len = 0usize;
    for _ in 0..32 {
        collector.collect().await;
        let len = collector.metrics().samples.len();
        if len == previous_len {
            break;
        }
        previous_len = len;
    }

    let (samples, txs) = collector.metrics().snapshot_inputs();
    let snapshot = compute_snapshot(&samples, &txs, schedule, unix_now())?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn init_tracing(log_file: Option<&std::path::Path>) -> Result<()> {
    let Some(path) = log_file else {
        // No sink requested: leave tracing uninitialized so the TUI owns
        // the terminal alone.
        return Ok(());
    };
    let file = std::fs::File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn setup_terminal() -> Result<CrosstermTerminal> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn cleanup_terminal(terminal: &mut CrosstermTerminal) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
