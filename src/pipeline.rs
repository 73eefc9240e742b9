//! Search-to-report pipeline.
//!
//! Query client, normalizer, aggregator and renderer run once each, in
//! order. A query either produces one document or fails with nothing
//! written.

use crate::analysis::summarize;
use crate::config::Config;
use crate::error::{PipelineError, ProviderError};
use crate::models::{PatentRecord, Report, SearchResult};
use crate::normalizer::normalize_records;
use crate::provider::{PageEnricher, ProviderSettings, SerpApiClient};
use crate::report::{self, ReportFormat};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, info};

/// Everything the pipeline needs, resolved up front.
#[derive(Clone)]
pub struct PipelineConfig {
    pub provider: ProviderSettings,
    /// Fetch patent pages for full titles and abstracts.
    pub enrich: bool,
    pub format: ReportFormat,
    pub output: PathBuf,
}

impl PipelineConfig {
    /// Resolve from a loaded configuration. Fails if a value is out of
    /// range or no API key is set.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Configuration)?;

        let api_key = config
            .provider
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                PipelineError::Configuration(
                    "SerpAPI key not found. Set SERPAPI_API_KEY (or add it to .env).".to_string(),
                )
            })?;

        Ok(Self {
            provider: ProviderSettings {
                base_url: config.provider.base_url.clone(),
                engine: config.provider.engine.clone(),
                api_key: api_key.to_string(),
                num_results: config.provider.num_results,
                timeout_seconds: config.provider.timeout_seconds,
                retry_on_network_error: config.provider.retry_on_network_error,
            },
            enrich: config.provider.enrich,
            format: config.report.format,
            output: config.output_path(),
        })
    }
}

/// A successfully written report.
#[derive(Debug)]
pub struct Generated {
    pub report: Report,
    pub path: PathBuf,
    pub bytes_written: usize,
}

/// Run a search and write its report to `config.output`.
pub async fn search_and_report(
    query: &str,
    top_n: usize,
    config: &PipelineConfig,
) -> Result<Generated, PipelineError> {
    let report = build_report(query, top_n, config).await?;

    let bytes_written = report::write_report(&report, config.format, &config.output)?;
    info!(
        path = %config.output.display(),
        bytes = bytes_written,
        "Report written"
    );

    Ok(Generated {
        report,
        path: config.output.clone(),
        bytes_written,
    })
}

/// Run a search and build the report without writing it.
pub async fn build_report(
    query: &str,
    top_n: usize,
    config: &PipelineConfig,
) -> Result<Report, PipelineError> {
    check_inputs(query, config)?;

    let client = SerpApiClient::new(config.provider.clone())?;
    let raw = client.search(query).await?;

    let mut records = normalize_records(&raw)?;
    debug!("Normalized {} records", records.len());

    if config.enrich {
        info!("Fetching full text for {} patents", records.len());
        let enricher = PageEnricher::new()
            .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {}", e)))?;
        records = enricher.enrich_all(records).await;
    }

    Ok(assemble_report(
        query,
        records,
        top_n,
        &config.provider.engine,
        Utc::now(),
    ))
}

/// Aggregate normalized records into a report.
pub fn assemble_report(
    query: &str,
    records: Vec<PatentRecord>,
    top_n: usize,
    engine: &str,
    generated_at: DateTime<Utc>,
) -> Report {
    let summary = summarize(&records, top_n);
    Report::new(
        SearchResult::new(query, records),
        summary,
        engine,
        top_n,
        generated_at,
    )
}

fn check_inputs(query: &str, config: &PipelineConfig) -> Result<(), PipelineError> {
    if query.trim().is_empty() {
        return Err(PipelineError::Configuration(
            "Query must not be empty".to_string(),
        ));
    }
    if config.provider.api_key.trim().is_empty() {
        return Err(PipelineError::Configuration(
            "SerpAPI key is empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RankedName;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pipeline_config(base_url: &str, output: PathBuf) -> PipelineConfig {
        PipelineConfig {
            provider: ProviderSettings {
                base_url: base_url.to_string(),
                engine: "google_patents".to_string(),
                api_key: "test-key".to_string(),
                num_results: 10,
                timeout_seconds: 5,
                retry_on_network_error: false,
            },
            enrich: false,
            format: ReportFormat::Docx,
            output,
        }
    }

    async fn mount_results(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_search_and_report_end_to_end() {
        let server = MockServer::start().await;
        mount_results(
            &server,
            json!({"organic_results": [
                {"title": "A", "inventors": ["Jane Doe", "John Smith"], "assignees": ["Acme Corp"]},
                {"title": "B", "inventors": ["Jane Doe"], "assignees": ["Acme Corp"]}
            ]}),
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.docx");
        let config = pipeline_config(&server.uri(), output.clone());

        let generated = search_and_report("shoes", 1, &config).await.unwrap();

        assert_eq!(
            generated.report.summary.top_inventors,
            vec![RankedName::new("Jane Doe", 2)]
        );
        assert_eq!(
            generated.report.summary.top_assignees,
            vec![RankedName::new("Acme Corp", 2)]
        );
        assert_eq!(generated.path, output);
        assert_eq!(std::fs::metadata(&output).unwrap().len() as usize, generated.bytes_written);
    }

    #[tokio::test]
    async fn test_unauthorized_produces_no_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key."})))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.docx");
        let config = pipeline_config(&server.uri(), output.clone());

        let err = search_and_report("shoes", 3, &config).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Provider(ProviderError::Authentication { status: 401 })
        ));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_malformed_record_fails_whole_query() {
        let server = MockServer::start().await;
        mount_results(
            &server,
            json!({"organic_results": [{"title": "ok"}, "not an object"]}),
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.docx");
        let config = pipeline_config(&server.uri(), output.clone());

        let err = search_and_report("shoes", 3, &config).await.unwrap_err();

        assert!(matches!(err, PipelineError::MalformedRecord(ref e) if e.index == 1));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_empty_results_still_write_document() {
        let server = MockServer::start().await;
        mount_results(&server, json!({"search_metadata": {"status": "Success"}})).await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.md");
        let mut config = pipeline_config(&server.uri(), output.clone());
        config.format = ReportFormat::Markdown;

        let generated = search_and_report("nothing matches", 3, &config).await.unwrap();

        assert!(generated.report.summary.is_empty());
        let contents = std::fs::read_to_string(&output).unwrap();
        assert!(contents.contains("nothing matches"));
    }

    #[tokio::test]
    async fn test_blank_api_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = pipeline_config(&server.uri(), dir.path().join("report.docx"));
        config.provider.api_key = "  ".to_string();

        let err = build_report("shoes", 3, &config).await.unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_enrich_uses_patent_page() {
        let server = MockServer::start().await;
        let link = format!("{}/patent/US1/en", server.uri());
        mount_results(
            &server,
            json!({"organic_results": [{"title": "Short…", "snippet": "Short…", "patent_link": link}]}),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/patent/US1/en"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<meta name="citation_title" content="Full title"><meta name="description" content="Full abstract">"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = pipeline_config(&server.uri(), dir.path().join("report.docx"));
        config.enrich = true;

        let report = build_report("shoes", 3, &config).await.unwrap();

        assert_eq!(report.records[0].title, "Full title");
        assert_eq!(report.records[0].abstract_text, "Full abstract");
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = Config::default();
        assert!(matches!(
            PipelineConfig::from_config(&config),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_config_resolves_settings() {
        let mut config = Config::default();
        config.provider.api_key = Some(" key ".to_string());
        config.report.format = ReportFormat::Json;

        let resolved = PipelineConfig::from_config(&config).unwrap();

        assert_eq!(resolved.provider.api_key, "key");
        assert_eq!(resolved.output, PathBuf::from("patent_report.json"));
        assert_eq!(resolved.provider.num_results, 11);
    }

    #[test]
    fn test_from_config_rejects_out_of_range_file_values() {
        let file = r#"
[provider]
api_key = "key"
num_results = 0

[report]
top_n = 0
"#;
        let config: Config = toml::from_str(file).unwrap();
        assert!(matches!(
            PipelineConfig::from_config(&config),
            Err(PipelineError::Configuration(_))
        ));

        let file = r#"
[provider]
api_key = "key"
timeout_seconds = 0
"#;
        let config: Config = toml::from_str(file).unwrap();
        assert!(matches!(
            PipelineConfig::from_config(&config),
            Err(PipelineError::Configuration(_))
        ));

        let mut config = Config::default();
        config.provider.api_key = Some("key".to_string());
        config.report.top_n = 0;
        assert!(matches!(
            PipelineConfig::from_config(&config),
            Err(PipelineError::Configuration(msg)) if msg.contains("top_n")
        ));
    }

    #[test]
    fn test_assemble_report() {
        let records = vec![PatentRecord {
            inventors: vec!["Jane Doe".to_string()],
            ..Default::default()
        }];
        let report = assemble_report("q", records, 3, "google_patents", Utc::now());

        assert_eq!(report.metadata.total_records, 1);
        assert_eq!(report.summary.top_inventors[0], RankedName::new("Jane Doe", 1));
    }
}
