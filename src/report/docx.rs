//! Word (.docx) report generation.
//!
//! The document is built with `docx-rust`. Its package is then rewritten
//! entry by entry with one fixed timestamp, so identical reports produce
//! identical bytes.

use crate::models::{PatentRecord, RankedName, Report};
use crate::report::generator::{join_or_missing, or_missing};
use docx_rust::document::{BreakType, Paragraph, Run};
use docx_rust::formatting::{CharacterProperty, ParagraphProperty};
use docx_rust::Docx;
use std::io::{self, Cursor, Read, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Generate a complete .docx package in memory.
pub fn generate_docx_report(report: &Report) -> io::Result<Vec<u8>> {
    let mut docx = build_document(report);
    let packed = docx
        .write(Cursor::new(Vec::new()))
        .map_err(|e| io::Error::other(e.to_string()))?;

    let mut output = Cursor::new(Vec::new());
    restamp_package(Cursor::new(packed.into_inner()), &mut output)?;
    Ok(output.into_inner())
}

/// Copy every entry of a zip package, in order, with a fixed timestamp.
fn restamp_package<R: Read + Seek, W: Write + Seek>(source: R, writer: W) -> io::Result<()> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut archive = ZipArchive::new(source).map_err(io::Error::other)?;
    let mut zip = ZipWriter::new(writer);

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(io::Error::other)?;
        let name = entry.name().to_string();
        zip.start_file(name, options).map_err(io::Error::other)?;
        io::copy(&mut entry, &mut zip)?;
    }
    zip.finish().map_err(io::Error::other)?;

    Ok(())
}

fn build_document<'a>(report: &Report) -> Docx<'a> {
    let meta = &report.metadata;
    let mut docx = Docx::default();

    docx.document.push(heading("Heading1", "Patent Search Report"));
    docx.document.push(labeled("Query: ", &meta.query));
    docx.document.push(labeled(
        "Total Patents Found: ",
        &meta.total_records.to_string(),
    ));
    docx.document.push(labeled(
        "Generated: ",
        &meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    ));

    for paragraph in ranked_list("Top Inventors", &report.summary.top_inventors) {
        docx.document.push(paragraph);
    }
    for paragraph in ranked_list("Top Assignees", &report.summary.top_assignees) {
        docx.document.push(paragraph);
    }

    if !report.records.is_empty() {
        docx.document.push(page_break());
    }
    docx.document.push(heading("Heading2", "Patent Details"));
    if report.records.is_empty() {
        docx.document.push(plain("No patents matched this query."));
    }
    for (i, record) in report.records.iter().enumerate() {
        for paragraph in record_section(i + 1, record) {
            docx.document.push(paragraph);
        }
    }

    docx
}

fn ranked_list<'a>(title: &str, names: &[RankedName]) -> Vec<Paragraph<'a>> {
    let mut section = vec![heading("Heading2", title)];
    if names.is_empty() {
        section.push(plain("None listed."));
    }
    for entry in names {
        section.push(plain(&format!("\u{2022} {}", entry)));
    }
    section
}

fn record_section<'a>(number: usize, record: &PatentRecord) -> Vec<Paragraph<'a>> {
    vec![
        heading(
            "Heading3",
            &format!("{}. {}", number, or_missing(&record.title)),
        ),
        labeled("Abstract: ", or_missing(&record.abstract_text)),
        labeled("Publication Date: ", or_missing(&record.publication_date)),
        labeled("Inventors: ", &join_or_missing(&record.inventors)),
        labeled("Assignees: ", &join_or_missing(&record.assignees)),
        labeled("Patent Link: ", or_missing(&record.patent_link)),
        labeled("PDF Link: ", or_missing(&record.pdf_link)),
    ]
}

fn heading<'a>(style: &'static str, text: &str) -> Paragraph<'a> {
    Paragraph::default()
        .property(ParagraphProperty::default().style_id(style))
        .push(run(text, true))
}

fn plain<'a>(text: &str) -> Paragraph<'a> {
    Paragraph::default().push(run(text, false))
}

/// A paragraph with a bold label followed by plain text.
fn labeled<'a>(label: &str, value: &str) -> Paragraph<'a> {
    Paragraph::default()
        .push(run(label, true))
        .push(run(value, false))
}

/// One run; embedded newlines become line breaks.
fn run<'a>(text: &str, bold: bool) -> Run<'a> {
    let mut run = Run::default();
    if bold {
        run = run.property(CharacterProperty::default().bold(true));
    }
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.push_break(BreakType::TextWrapping);
        }
        run = run.push_text(xml_text(line));
    }
    run
}

fn page_break<'a>() -> Paragraph<'a> {
    Paragraph::default().push(Run::default().push_break(BreakType::Page))
}

/// Drop characters XML 1.0 cannot carry. Escaping is left to the writer.
pub fn xml_text(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\r')
                || ('\u{20}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || c >= '\u{10000}'
        })
        .collect()
}
