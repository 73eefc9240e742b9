//! Report rendering and output.
//!
//! Rendering into memory never fails for any record content. Writing goes
//! through a temporary file in the destination directory, so a failed
//! write leaves nothing behind at the destination.

pub mod docx;
pub mod generator;

pub use docx::generate_docx_report;
pub use generator::{generate_json_report, generate_markdown_report};

use crate::error::RenderError;
use crate::models::Report;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Word document (default)
    #[default]
    Docx,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}

impl ReportFormat {
    /// Conventional file extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Docx => "docx",
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

/// Render a report into bytes.
pub fn render(report: &Report, format: ReportFormat) -> io::Result<Vec<u8>> {
    match format {
        ReportFormat::Docx => generate_docx_report(report),
        ReportFormat::Markdown => Ok(generate_markdown_report(report).into_bytes()),
        ReportFormat::Json => generate_json_report(report)
            .map(String::into_bytes)
            .map_err(io::Error::other),
    }
}

/// Render a report and write it to `path`. Returns the number of bytes written.
pub fn write_report(report: &Report, format: ReportFormat, path: &Path) -> Result<usize, RenderError> {
    let fail = |source: io::Error| RenderError {
        path: path.to_path_buf(),
        source,
    };

    let bytes = render(report, format).map_err(fail)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut file = NamedTempFile::new_in(&dir).map_err(fail)?;
    file.write_all(&bytes).map_err(fail)?;
    file.flush().map_err(fail)?;
    file.persist(path).map_err(|e| fail(e.error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "Report written");
    Ok(bytes.len())
}
