//! patent-reporter - Google Patents search to document report
//!
//! A CLI tool that sends a patent search query to SerpAPI, ranks the
//! most frequent inventors and assignees, and writes a Word, Markdown
//! or JSON report.
//!
//! Exit codes:
//!   0 - Success (report written)
//!   1 - Runtime error (provider, malformed response, write failure)
//!   2 - Invalid arguments or configuration (e.g. missing API key)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod normalizer;
mod pipeline;
mod provider;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use error::PipelineError;
use indicatif::{ProgressBar, ProgressStyle};
use pipeline::PipelineConfig;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads environment-backed flags
    dotenvy::dotenv().ok();

    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("patent-reporter v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_search(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Search failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(exit_code(&e));
        }
    }
}

/// Handle --init-config: generate a default .patent-reporter.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Set SERPAPI_API_KEY in your environment or a .env file.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

/// Run one search, write the report and print a summary.
async fn run_search(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.apply_env();

    let pipeline_config = PipelineConfig::from_config(&config)?;
    let query = args.query_text();
    let top_n = config.report.top_n;

    println!("🔎 Searching patents: {}", query);
    println!("   Results requested: {}", config.provider.num_results);
    println!("   Top N: {}", top_n);
    println!("   Format: {:?}", config.report.format);

    let spinner = (!args.quiet).then(|| search_spinner(config.provider.enrich));
    let outcome = pipeline::search_and_report(query, top_n, &pipeline_config).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let generated = outcome?;

    let report = &generated.report;
    println!("\n📊 Search Summary:");
    println!("   Patents found: {}", report.metadata.total_records);

    if report.summary.is_empty() {
        println!("   No inventor or assignee names in the results.");
    }

    println!("   Top inventors:");
    if report.summary.top_inventors.is_empty() {
        println!("     (none)");
    }
    for entry in &report.summary.top_inventors {
        println!("     - {}", entry);
    }

    println!("   Top assignees:");
    if report.summary.top_assignees.is_empty() {
        println!("     (none)");
    }
    for entry in &report.summary.top_assignees {
        println!("     - {}", entry);
    }

    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Report saved to: {} ({} bytes)",
        generated.path.display(),
        generated.bytes_written
    );

    Ok(())
}

fn search_spinner(enrich: bool) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(if enrich {
        "Searching patents and fetching full text..."
    } else {
        "Searching patents... Please wait."
    });
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Exit code for a failed run.
fn exit_code(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<PipelineError>() {
        Some(PipelineError::Configuration(_)) => 2,
        _ => 1,
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
