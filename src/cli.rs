//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Defaults live in [`crate::config`], so most
//! options here are `Option`s that only override the config when given.

use crate::report::ReportFormat;
use clap::Parser;
use std::path::PathBuf;

/// patent-reporter - search Google Patents and build a report
///
/// Sends the query to SerpAPI's Google Patents engine, ranks the most
/// frequent inventors and assignees, and writes a Word, Markdown or JSON
/// report.
///
/// Examples:
///   patent-reporter "AI for manufacturing in the domain of shoes"
///   patent-reporter "solid state battery" --num-results 30 --top-n 5
///   patent-reporter "lidar" --format markdown -o lidar.md
///   patent-reporter --init-config
#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Natural-language patent search query
    #[arg(value_name = "QUERY", required_unless_present = "init_config")]
    pub query: Option<String>,

    /// Number of top inventors and assignees to list
    #[arg(short = 'n', long, value_name = "N")]
    pub top_n: Option<usize>,

    /// Number of patents to fetch (1-100)
    #[arg(long, value_name = "COUNT")]
    pub num_results: Option<usize>,

    /// Output file path for the report
    ///
    /// Defaults to patent_report.<ext> for the chosen format.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (docx, markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// SerpAPI key
    ///
    /// Also read from SERPAPI_API_KEY (or API) and from a .env file.
    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// SerpAPI base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Do not retry when the connection to the provider fails
    #[arg(long)]
    pub no_retry: bool,

    /// Fetch each patent page for the full title and abstract
    #[arg(long)]
    pub enrich: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .patent-reporter.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .patent-reporter.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Hand-written so the API key never reaches a log line.
impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("query", &self.query)
            .field("top_n", &self.top_n)
            .field("num_results", &self.num_results)
            .field("output", &self.output)
            .field("format", &self.format)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("no_retry", &self.no_retry)
            .field("enrich", &self.enrich)
            .field("config", &self.config)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .field("init_config", &self.init_config)
            .finish()
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The query, or an empty string if not given (validate first).
    pub fn query_text(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.query_text().trim().is_empty() {
            return Err("Query must not be empty".to_string());
        }

        if self.top_n == Some(0) {
            return Err("Top N must be at least 1".to_string());
        }

        if let Some(num) = self.num_results {
            if !(1..=100).contains(&num) {
                return Err("Number of results must be between 1 and 100".to_string());
            }
        }

        if let Some(ref url) = self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
