//! Rankwise CLI: terminal front end for the Rankwise catalog and leak probe.
//!
//! Every subcommand prints plain text by default or JSON with `--json`.

mod commands;
mod render;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Rankwise: rankings, head-to-heads, and leak checks for comparison sites
#[derive(Parser, Debug)]
#[command(name = "rankwise", version, about, long_about = None)]
struct Cli {
    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Catalog file (JSON or TOML); overrides `catalog.path`
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List active verticals
    Verticals,
    /// List a vertical's products, highest rated first
    Products {
        /// Vertical slug
        vertical: String,
    },
    /// Show the best alternatives to a product
    Alternatives {
        /// Vertical slug
        vertical: String,
        /// Product slug
        product: String,
        /// Maximum number of alternatives (defaults to `ranking.alternatives_limit`)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// List every canonical head-to-head comparison in a vertical
    Pairs {
        /// Vertical slug
        vertical: String,
    },
    /// Resolve and show a `{a}-vs-{b}` comparison
    Compare {
        /// Vertical slug
        vertical: String,
        /// Comparison segment, e.g. `nordvpn-vs-surfshark`
        segment: String,
    },
    /// Show the FAQ block for a product
    Faq {
        /// Vertical slug
        vertical: String,
        /// Product slug
        product: String,
    },
    /// Aggregate figures for a vertical
    Stats {
        /// Vertical slug
        vertical: String,
    },
    /// Check whether WebRTC exposes your real address
    LeakTest,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default configuration file
    Init,
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "rankwise", "rankwise")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "rankwise.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let options = commands::Options {
        catalog: cli.catalog,
        json: cli.json,
    };
    commands::handle_command(cli.command, &workspace, &options).await
}
