//! Markdown and JSON report generation.

use crate::models::{AggregateSummary, PatentRecord, RankedName, Report, ReportMetadata};

/// Placeholder for fields the provider left empty.
pub const MISSING: &str = "N/A";

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Patent Search Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_details_section(&report.records));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Query:** {}\n", metadata.query));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Engine:** `{}`\n", metadata.engine));
    section.push_str(&format!(
        "- **Total Patents Found:** {}\n",
        metadata.total_records
    ));
    section.push('\n');

    section
}

/// Generate the summary section with both ranked tables.
fn generate_summary_section(summary: &AggregateSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&generate_ranked_table(
        "Top Inventors",
        "Inventor",
        &summary.top_inventors,
    ));
    section.push_str(&generate_ranked_table(
        "Top Assignees",
        "Assignee",
        &summary.top_assignees,
    ));

    section
}

fn generate_ranked_table(heading: &str, column: &str, names: &[RankedName]) -> String {
    let mut table = String::new();

    table.push_str(&format!("### {}\n\n", heading));

    if names.is_empty() {
        table.push_str("_None listed._\n\n");
        return table;
    }

    table.push_str(&format!("| Rank | {} | Patents |\n", column));
    table.push_str("|:---:|:---|:---:|\n");
    for (i, entry) in names.iter().enumerate() {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            i + 1,
            table_cell(&entry.name),
            entry.count
        ));
    }
    table.push('\n');

    table
}

/// Generate the per-patent details section.
fn generate_details_section(records: &[PatentRecord]) -> String {
    let mut section = String::new();

    section.push_str("## Patent Details\n\n");

    if records.is_empty() {
        section.push_str("No patents matched this query.\n\n");
        return section;
    }

    for (i, record) in records.iter().enumerate() {
        section.push_str(&generate_record_block(i + 1, record));
    }

    section
}

/// Generate a single patent block.
fn generate_record_block(number: usize, record: &PatentRecord) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {}. {}\n\n", number, or_missing(&record.title)));
    block.push_str(&format!(
        "**Abstract:** {}\n\n",
        or_missing(&record.abstract_text)
    ));
    block.push_str(&format!(
        "- **Publication Date:** {}\n",
        or_missing(&record.publication_date)
    ));
    block.push_str(&format!("- **Inventors:** {}\n", join_or_missing(&record.inventors)));
    block.push_str(&format!("- **Assignees:** {}\n", join_or_missing(&record.assignees)));
    if !record.patent_link.is_empty() {
        block.push_str(&format!("- **Patent Link:** <{}>\n", record.patent_link));
    }
    if !record.pdf_link.is_empty() {
        block.push_str(&format!("- **PDF Link:** <{}>\n", record.pdf_link));
    }
    block.push_str("\n---\n\n");

    block
}

/// Generate the report footer.
fn generate_footer() -> String {
    "*Report generated by patent-reporter*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Make text safe inside a single Markdown table cell.
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn or_missing(value: &str) -> &str {
    if value.trim().is_empty() {
        MISSING
    } else {
        value
    }
}

pub(crate) fn join_or_missing(names: &[String]) -> String {
    if names.is_empty() {
        MISSING.to_string()
    } else {
        names.join(", ")
    }
}
