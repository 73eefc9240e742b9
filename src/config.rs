//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.patent-reporter.toml` files and the environment.

use crate::report::ReportFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".patent-reporter.toml";

/// Environment variables checked for the SerpAPI key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["SERPAPI_API_KEY", "API"];

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Search provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file path. When unset the report goes to
    /// `patent_report.<ext>` for the chosen format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// File stem used when no output path is configured.
const DEFAULT_OUTPUT_STEM: &str = "patent_report";

/// Search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// SerpAPI key. Usually supplied through the environment instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// SerpAPI base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// SerpAPI engine.
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Number of patents to request.
    #[serde(default = "default_num_results")]
    pub num_results: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Retry once on connection failures.
    #[serde(default = "default_true")]
    pub retry_on_network_error: bool,

    /// Fetch each patent page for the full title and abstract.
    #[serde(default)]
    pub enrich: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            engine: default_engine(),
            num_results: default_num_results(),
            timeout_seconds: default_timeout(),
            retry_on_network_error: true,
            enrich: false,
        }
    }
}

fn default_base_url() -> String {
    "https://serpapi.com".to_string()
}

fn default_engine() -> String {
    "google_patents".to_string()
}

fn default_num_results() -> usize {
    11
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Length of the top inventor / assignee lists.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Output format.
    #[serde(default)]
    pub format: ReportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            format: ReportFormat::default(),
        }
    }
}

fn default_top_n() -> usize {
    3
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values the user actually passed on the command line (or through
    /// a flag's environment variable) override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref key) = args.api_key {
            self.provider.api_key = Some(key.clone());
        }
        if let Some(ref url) = args.base_url {
            self.provider.base_url = url.clone();
        }
        if let Some(num) = args.num_results {
            self.provider.num_results = num;
        }
        if let Some(timeout) = args.timeout {
            self.provider.timeout_seconds = timeout;
        }
        if args.no_retry {
            self.provider.retry_on_network_error = false;
        }
        if args.enrich {
            self.provider.enrich = true;
        }

        if let Some(top_n) = args.top_n {
            self.report.top_n = top_n;
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }
    }

    /// Check ranges that the file can set as well as the command line.
    pub fn validate(&self) -> Result<(), String> {
        let provider = &self.provider;

        if !(1..=100).contains(&provider.num_results) {
            return Err(format!(
                "provider.num_results must be between 1 and 100 (got {})",
                provider.num_results
            ));
        }

        if provider.timeout_seconds == 0 {
            return Err("provider.timeout_seconds must be at least 1".to_string());
        }

        if !provider.base_url.starts_with("http://") && !provider.base_url.starts_with("https://")
        {
            return Err(format!(
                "provider.base_url must start with 'http://' or 'https://' (got '{}')",
                provider.base_url
            ));
        }

        if provider.engine.trim().is_empty() {
            return Err("provider.engine must not be empty".to_string());
        }

        if self.report.top_n == 0 {
            return Err("report.top_n must be at least 1".to_string());
        }

        Ok(())
    }

    /// Output path. An explicit path is used as given; otherwise the
    /// default file name takes the format's extension.
    pub fn output_path(&self) -> PathBuf {
        match self.general.output {
            Some(ref output) => PathBuf::from(output),
            None => PathBuf::from(DEFAULT_OUTPUT_STEM).with_extension(self.report.format.extension()),
        }
    }

    /// Fill a missing API key from the environment.
    pub fn apply_env(&mut self) {
        if self.provider.api_key.is_none() {
            self.provider.api_key = api_key_from_env(|name| std::env::var(name).ok());
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

/// First non-blank key among [`API_KEY_ENV_VARS`].
fn api_key_from_env<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}
