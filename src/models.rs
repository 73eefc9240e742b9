//! Data models for the patent reporter.
//!
//! This module contains the core data structures passed between the
//! pipeline stages: normalized patent records, the search result that
//! wraps them, the aggregate summary and the final report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single patent after normalization.
///
/// Every field is always present; anything the provider left out is an
/// empty string or an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatentRecord {
    /// Patent title.
    pub title: String,
    /// Abstract or search snippet.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Publication date as reported by the provider (usually `YYYY-MM-DD`).
    pub publication_date: String,
    /// Inventor names, in provider order.
    pub inventors: Vec<String>,
    /// Assignee names, in provider order.
    pub assignees: Vec<String>,
    /// Provider identifier such as `patent/US1234567B2/en`.
    pub patent_id: String,
    /// Link to the public patent page.
    pub patent_link: String,
    /// Link to the patent PDF.
    pub pdf_link: String,
}

/// The normalized outcome of one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The query exactly as submitted.
    pub query: String,
    /// Records in provider order.
    pub records: Vec<PatentRecord>,
}

impl SearchResult {
    pub fn new(query: impl Into<String>, records: Vec<PatentRecord>) -> Self {
        Self {
            query: query.into(),
            records,
        }
    }
}

/// A name together with how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedName {
    pub name: String,
    pub count: usize,
}

impl RankedName {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

impl fmt::Display for RankedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.count)
    }
}

/// Ranked inventor and assignee counts for one search result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    /// Most frequent inventors, highest count first.
    pub top_inventors: Vec<RankedName>,
    /// Most frequent assignees, highest count first.
    pub top_assignees: Vec<RankedName>,
}

impl AggregateSummary {
    pub fn is_empty(&self) -> bool {
        self.top_inventors.is_empty() && self.top_assignees.is_empty()
    }
}

/// Metadata about the generated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// The search query.
    pub query: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Provider engine used for the search.
    pub engine: String,
    /// Number of patents in the report.
    pub total_records: usize,
    /// Length limit applied to the ranked lists.
    pub top_n: usize,
}

/// The complete patent search report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Top inventors and assignees.
    pub summary: AggregateSummary,
    /// Every record, in search order.
    pub records: Vec<PatentRecord>,
}

impl Report {
    /// Assembles a report from a search result and its summary.
    pub fn new(
        result: SearchResult,
        summary: AggregateSummary,
        engine: impl Into<String>,
        top_n: usize,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let metadata = ReportMetadata {
            total_records: result.records.len(),
            query: result.query,
            generated_at,
            engine: engine.into(),
            top_n,
        };

        Self {
            metadata,
            summary,
            records: result.records,
        }
    }
}
