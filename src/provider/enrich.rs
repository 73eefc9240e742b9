//! Optional full-text enrichment from the public patent page.
//!
//! Search results only carry a shortened title and a snippet. The patent
//! page exposes the full title and abstract in `<meta>` tags. Any failure
//! here keeps the short values.

use crate::models::PatentRecord;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

/// A `<meta>` tag; quoted attribute values may contain `>`.
static META_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("valid meta tag pattern")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute pattern")
});

const PAGE_TIMEOUT_SECS: u64 = 10;

/// Fetches patent pages and fills in full titles and abstracts.
pub struct PageEnricher {
    http_client: reqwest::Client,
}

impl PageEnricher {
    pub fn new() -> reqwest::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PAGE_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http_client })
    }

    /// Return a copy of `record` with title and abstract taken from its
    /// patent page where the page provides them.
    pub async fn enrich(&self, record: PatentRecord) -> PatentRecord {
        if record.patent_link.is_empty() {
            return record;
        }

        match self.fetch_page(&record.patent_link).await {
            Some(html) => apply_page(record, &html),
            None => record,
        }
    }

    /// Enrich every record in order.
    pub async fn enrich_all(&self, records: Vec<PatentRecord>) -> Vec<PatentRecord> {
        let mut enriched = Vec::with_capacity(records.len());
        for record in records {
            enriched.push(self.enrich(record).await);
        }
        enriched
    }

    async fn fetch_page(&self, url: &str) -> Option<String> {
        let response = match self.http_client.get(url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!(url = %url, status = %r.status(), "Patent page unavailable");
                return None;
            }
            Err(e) => {
                debug!(url = %url, "Patent page fetch failed: {}", e);
                return None;
            }
        };
        response.text().await.ok()
    }
}

fn apply_page(mut record: PatentRecord, html: &str) -> PatentRecord {
    if let Some(title) = meta_content(html, "citation_title") {
        record.title = title;
    }
    if let Some(description) = meta_content(html, "description") {
        record.abstract_text = description;
    }
    record
}

/// Content of the first `<meta name="...">` tag with the given name.
pub fn meta_content(html: &str, name: &str) -> Option<String> {
    META_TAG.find_iter(html).find_map(|tag| {
        let mut tag_name = None;
        let mut content = None;

        for caps in ATTRIBUTE.captures_iter(tag.as_str()) {
            let value = caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str());
            match caps[1].to_ascii_lowercase().as_str() {
                "name" => tag_name = value,
                "content" => content = value,
                _ => {}
            }
        }

        match (tag_name, content) {
            (Some(n), Some(c)) if n.eq_ignore_ascii_case(name) => {
                let text = decode_entities(c.trim());
                (!text.is_empty()).then_some(text)
            }
            _ => None,
        }
    })
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
