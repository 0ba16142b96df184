//! Backup retention filter.
//!
//! Reads a listing of backup names from stdin (JSON array or literal list)
//! and prints `<dest_prefix>/<name>` for every backup whose embedded
//! `backup-YYYYMMDD-HHMMSS` timestamp is older than the retention window.
//! Deleting the printed paths is up to the caller.
//!
//! Usage:
//!   backup-retention <retention_days> <dest_prefix> < listing.json
//!
//! Exit codes: 0 on success (including no candidates), 2 on missing
//! arguments, 1 on an unusable retention value.

use std::io::{self, BufWriter, Read, Write};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::{debug, info};

use retention_core::{parse_payload, DestinationPrefix, RetentionFilter, RetentionWindow};
use telemetry::{init_tracing, TracingConfig, DEFAULT_FILTER};

/// Print the paths of backups older than the retention window.
#[derive(Debug, Parser)]
#[command(name = "backup-retention", version, about)]
struct Cli {
    /// Days to keep backups; older ones are printed
    #[arg(allow_negative_numbers = true, allow_hyphen_values = true)]
    retention_days: String,

    /// Directory prefix joined with each selected backup name
    #[arg(allow_hyphen_values = true)]
    dest_prefix: String,

    /// Additional positional arguments are ignored
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    extra: Vec<String>,

    /// Log debug diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    /// Tracing filter directive; `RUST_LOG` still wins
    #[serde(default = "default_log_filter")]
    log_filter: String,

    #[serde(default)]
    log_json: bool,
}

fn default_log_filter() -> String {
    DEFAULT_FILTER.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            log_json: false,
        }
    }
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config()?;

    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.log_filter.clone()
    };
    init_tracing(
        TracingConfig::new()
            .with_filter(filter)
            .with_json(config.log_json),
    );

    // An unusable retention value is fatal before stdin is touched
    let window = RetentionWindow::from_days_str(&cli.retention_days)?;
    let prefix = DestinationPrefix::new(&cli.dest_prefix);
    if !cli.extra.is_empty() {
        debug!(ignored = ?cli.extra, "Ignoring extra arguments");
    }

    let mut raw = Vec::new();
    io::stdin()
        .read_to_end(&mut raw)
        .context("Failed to read backup listing from stdin")?;
    let input = String::from_utf8_lossy(&raw);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    run(window, prefix, &input, Utc::now(), &mut out)?;
    out.flush().context("Failed to flush stdout")?;

    Ok(())
}

/// Load configuration from defaults, an optional file and the environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/retention")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables (RETENTION_LOG_FILTER, ...)
        .add_source(
            config::Environment::with_prefix("RETENTION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Filters the payload and writes one candidate path per line.
///
/// Returns the number of paths written.
fn run<W: Write>(
    window: RetentionWindow,
    prefix: DestinationPrefix,
    input: &str,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<usize> {
    let parsed = parse_payload(input);
    let cutoff = window.cutoff(now)?;
    info!(
        retention_days = window.days(),
        cutoff = %cutoff,
        notation = parsed.notation().map(|n| n.as_str()).unwrap_or("none"),
        items = parsed.items().len(),
        "Filtering backup listing"
    );

    let filter = RetentionFilter::new(cutoff, prefix);
    let outcome = filter.scan(parsed.items());

    for candidate in &outcome.candidates {
        writeln!(out, "{}", candidate).context("Failed to write candidate path")?;
    }

    Ok(outcome.candidates.len())
}
