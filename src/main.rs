use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use hcitrace::config::Config;
use hcitrace::replay;
use hcitrace::sink::{NdjsonSink, TraceSink};
use hcitrace::source;

/// Bundles HCI packet traces into per-window summary records.
#[derive(Parser)]
#[command(name = "hcitrace", about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Logging verbosity level (trace, debug, info, warn, error).
    /// Overrides the configured level.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a textual HCI capture and write bundle records as NDJSON.
    Replay(ReplayArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args)]
struct ReplayArgs {
    /// Capture file to read, or "-" for stdin.
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write records, or "-" for stdout.
    #[arg(short, long, default_value = "-")]
    output: PathBuf,
}

/// Build-time version info.
mod version {
    /// Release version string (set at build time).
    pub const RELEASE: &str = env!("CARGO_PKG_VERSION");

    /// Git commit hash (set at build time via env, or "unknown").
    pub fn git_commit() -> &'static str {
        option_env!("GIT_COMMIT").unwrap_or("unknown")
    }

    /// Full version string with platform info.
    pub fn full() -> String {
        format!(
            "{} (commit: {}, {}/{})",
            RELEASE,
            git_commit(),
            std::env::consts::OS,
            std::env::consts::ARCH,
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = match cli.command {
        Command::Version => {
            println!("hcitrace {}", version::full());
            return Ok(());
        }
        Command::Replay(args) => args,
    };

    let cfg = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };

    // Records may go to stdout, so logs always go to stderr.
    let level = cli.log_level.as_deref().unwrap_or(&cfg.log_level);
    let filter =
        EnvFilter::try_new(level).with_context(|| format!("invalid log level: {level}"))?;
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    tracing::info!(
        version = version::RELEASE,
        commit = version::git_commit(),
        input = %args.input.display(),
        output = %args.output.display(),
        "starting hcitrace replay",
    );

    run(&cfg, &args)
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn run(cfg: &Config, args: &ReplayArgs) -> Result<()> {
    let input: Box<dyn BufRead> = if is_stdio(&args.input) {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("opening input {}", args.input.display()))?;
        Box::new(BufReader::new(file))
    };

    let sink: Arc<dyn TraceSink> = if is_stdio(&args.output) {
        Arc::new(NdjsonSink::stdout(cfg.output.pretty))
    } else {
        Arc::new(
            NdjsonSink::create(&args.output, cfg.output.pretty)
                .with_context(|| format!("creating output {}", args.output.display()))?,
        )
    };

    let data_source = source::initialize(&cfg.tracing);
    let summary = replay::run(data_source, input, sink).context("replaying capture")?;

    tracing::info!(
        lines = summary.lines,
        packets = summary.packets,
        rejected_lines = summary.rejected_lines,
        skipped = summary.stats.packets_skipped,
        malformed = summary.stats.packets_malformed,
        records_written = summary.stats.records_written,
        records_dropped = summary.stats.records_dropped,
        flushes = summary.stats.flushes,
        "replay complete",
    );

    Ok(())
}
