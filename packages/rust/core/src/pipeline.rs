//! End-to-end `collect` pipeline: fetch → normalize → export → report.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::Value;
use tracing::{info, instrument, warn};

use cairn_export::{collect_stats, CollectionReport, Exporter};
use cairn_fetch::ApiClient;
use cairn_normalize::{assembler, completeness, PipelineConfig};
use cairn_shared::{CairnError, CanonicalRecord, ContentType, FetchConfig, Result};

/// Configuration for a collection run.
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// Output root directory for this run.
    pub output_root: PathBuf,
    /// Content types to collect, in run order.
    pub content_types: Vec<ContentType>,
    /// API client settings.
    pub fetch: FetchConfig,
    /// Normalization settings.
    pub pipeline: PipelineConfig,
}

/// Result of a completed collection run.
#[derive(Debug)]
pub struct CollectResult {
    /// Path to the output directory.
    pub output_path: PathBuf,
    /// Total canonical records written.
    pub total_records: usize,
    /// Records per content-type tag.
    pub by_type: BTreeMap<String, usize>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as documents arrive for a content type.
    fn documents_fetched(&self, content_type: &str, current: usize, total_estimate: Option<u64>);
    /// Called when the pipeline completes.
    fn done(&self, result: &CollectResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn documents_fetched(&self, _content_type: &str, _current: usize, _total: Option<u64>) {}
    fn done(&self, _result: &CollectResult) {}
}

/// Run the full collection pipeline.
///
/// 1. Fetch raw documents per content type
/// 2. Snapshot the raw documents
/// 3. Normalize into canonical records
/// 4. Write JSONL per content type
/// 5. Analyze completeness and write the run report
#[instrument(skip_all, fields(output = %config.output_root.display()))]
pub async fn collect_corpus(
    config: &CollectConfig,
    progress: &dyn ProgressReporter,
) -> Result<CollectResult> {
    let start = Instant::now();

    if config.content_types.is_empty() {
        return Err(CairnError::validation("no content types selected"));
    }

    info!(
        types = config.content_types.len(),
        max_items = config.fetch.max_items_per_category,
        "starting collection run"
    );

    let exporter = Exporter::new(&config.output_root)?;
    let client = ApiClient::new(config.fetch.clone())?;

    let mut corpus: Vec<CanonicalRecord> = Vec::new();
    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();

    for &content_type in &config.content_types {
        progress.phase(&format!("Collecting {content_type}s"));

        let documents = client
            .fetch_documents_with(content_type, |current, total| {
                progress.documents_fetched(content_type.as_str(), current, total);
            })
            .await?;

        exporter.write_raw(content_type, &documents)?;

        progress.phase(&format!("Normalizing {content_type}s"));
        let items: Vec<(ContentType, Value)> = documents
            .into_iter()
            .map(|doc| (content_type, doc))
            .collect();
        let records = assembler::assemble_batch(&items, &config.pipeline);

        exporter.write_records(content_type, &records)?;
        by_type.insert(content_type.as_str().to_string(), records.len());
        corpus.extend(records);
    }

    progress.phase("Writing run report");
    let report = CollectionReport::new(
        collect_stats(&corpus),
        completeness::analyze(&corpus, &config.pipeline),
    );
    exporter.write_report(&report)?;

    let result = CollectResult {
        output_path: config.output_root.clone(),
        total_records: corpus.len(),
        by_type,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        total_records = result.total_records,
        elapsed_ms = result.elapsed.as_millis(),
        "collection run complete"
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// Offline operations
// ---------------------------------------------------------------------------

/// Normalize an existing raw snapshot file (a JSON array of documents)
/// into a JSONL file under `output_root`, without touching the network.
#[instrument(skip_all, fields(input = %input.display(), content_type = %content_type))]
pub fn normalize_snapshot(
    input: &Path,
    content_type: ContentType,
    output_root: &Path,
    cfg: &PipelineConfig,
) -> Result<(PathBuf, usize)> {
    let content = std::fs::read_to_string(input).map_err(|e| CairnError::io(input, e))?;
    let documents: Vec<Value> = serde_json::from_str(&content)
        .map_err(|e| CairnError::validation(format!("invalid snapshot {}: {e}", input.display())))?;

    let items: Vec<(ContentType, Value)> = documents
        .into_iter()
        .map(|doc| (content_type, doc))
        .collect();
    let records = assembler::assemble_batch(&items, cfg);

    let exporter = Exporter::new(output_root)?;
    let path = exporter.write_records(content_type, &records)?;

    info!(count = records.len(), "snapshot normalized");
    Ok((path, records.len()))
}

/// Analyze normalized JSONL data and build a run report.
///
/// `input` may be a single `.jsonl` file or a directory of them.
/// Unreadable lines are skipped with a warning so one corrupt record
/// cannot sink the whole analysis.
#[instrument(skip_all, fields(input = %input.display()))]
pub fn report_corpus(input: &Path, cfg: &PipelineConfig) -> Result<CollectionReport> {
    let mut corpus: Vec<CanonicalRecord> = Vec::new();

    if input.is_dir() {
        let entries = std::fs::read_dir(input).map_err(|e| CairnError::io(input, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| CairnError::io(input, e))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
                continue;
            }
            corpus.extend(read_records(&path)?);
        }
    } else {
        corpus.extend(read_records(input)?);
    }

    if corpus.is_empty() {
        return Err(CairnError::validation(format!(
            "no normalized records found under {}",
            input.display()
        )));
    }

    Ok(CollectionReport::new(
        collect_stats(&corpus),
        completeness::analyze(&corpus, cfg),
    ))
}

/// Read canonical records from a JSONL file.
pub fn read_records(path: &Path) -> Result<Vec<CanonicalRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| CairnError::io(path, e))?;

    let mut records = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CanonicalRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    line = line_no + 1,
                    error = %e,
                    "skipping unreadable record"
                );
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_root(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cairn-pipeline-test-{tag}-{}", std::process::id()))
    }

    fn test_fetch_config(base_url: String) -> FetchConfig {
        FetchConfig {
            base_url,
            user_agent: "cairn-test/0".into(),
            rate_limit: 1000,
            timeout_secs: 5,
            max_items_per_category: 100,
            bbox: None,
        }
    }

    fn route_doc(id: u64, title: &str) -> Value {
        json!({
            "document_id": id,
            "activities": ["alpinism"],
            "global_rating": "AD",
            "locales": [{"lang": "fr", "title": title}],
            "geometry": {"geom": "POINT(6.8 45.8 3500)"}
        })
    }

    #[tokio::test]
    async fn collect_writes_full_output_layout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(url_path("/routes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 2,
                "documents": [route_doc(1, "Voie A"), route_doc(2, "Voie B")]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(url_path("/huts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 1,
                "documents": [{"document_id": 3, "locales": [{"lang": "fr", "title": "Refuge"}]}]
            })))
            .mount(&server)
            .await;

        let root = temp_root("collect");
        let config = CollectConfig {
            output_root: root.clone(),
            content_types: vec![ContentType::Route, ContentType::Hut],
            fetch: test_fetch_config(server.uri()),
            pipeline: PipelineConfig::default(),
        };

        let result = collect_corpus(&config, &SilentProgress).await.unwrap();
        assert_eq!(result.total_records, 3);
        assert_eq!(result.by_type["route"], 2);
        assert_eq!(result.by_type["hut"], 1);

        assert!(root.join("raw/route.json").exists());
        assert!(root.join("raw/hut.json").exists());
        assert!(root.join("normalized/route.jsonl").exists());
        assert!(root.join("normalized/hut.jsonl").exists());
        assert!(root.join("report.json").exists());

        let records = read_records(&root.join("normalized/route.jsonl")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("title_fr"), Some(&json!("Voie A")));
        assert_eq!(records[0].get("elevation"), Some(&json!(3500)));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn collect_rejects_empty_type_selection() {
        let root = temp_root("empty");
        let config = CollectConfig {
            output_root: root.clone(),
            content_types: vec![],
            fetch: test_fetch_config("http://localhost:1".into()),
            pipeline: PipelineConfig::default(),
        };

        let err = collect_corpus(&config, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, CairnError::Validation { .. }));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn normalize_snapshot_roundtrip() {
        let root = temp_root("snapshot");
        std::fs::create_dir_all(&root).unwrap();

        let input = root.join("routes.json");
        std::fs::write(
            &input,
            serde_json::to_string_pretty(&vec![route_doc(9, "Traversée")]).unwrap(),
        )
        .unwrap();

        let out = root.join("out");
        let (path, count) = normalize_snapshot(
            &input,
            ContentType::Route,
            &out,
            &PipelineConfig::default(),
        )
        .unwrap();

        assert_eq!(count, 1);
        let records = read_records(&path).unwrap();
        assert_eq!(records[0].get("title_fr"), Some(&json!("Traversée")));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn report_covers_all_jsonl_files() {
        let root = temp_root("report");
        let cfg = PipelineConfig::default();
        let records = assembler::assemble_batch(
            &[
                (ContentType::Route, route_doc(1, "A")),
                (ContentType::Route, route_doc(2, "B")),
            ],
            &cfg,
        );
        let hut_records = assembler::assemble_batch(
            &[(ContentType::Hut, json!({"document_id": 3}))],
            &cfg,
        );

        let exporter = Exporter::new(&root).unwrap();
        exporter
            .write_records(ContentType::Route, &records)
            .unwrap();
        exporter
            .write_records(ContentType::Hut, &hut_records)
            .unwrap();

        let report = report_corpus(&root.join("normalized"), &cfg).unwrap();
        assert_eq!(report.stats.total_records, 3);
        assert_eq!(report.stats.by_type["route"], 2);
        assert!(report.completeness.field("title_fr").is_some());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn report_fails_on_empty_directory() {
        let root = temp_root("report-empty");
        std::fs::create_dir_all(&root).unwrap();

        let err = report_corpus(&root, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, CairnError::Validation { .. }));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn read_records_skips_corrupt_lines() {
        let root = temp_root("corrupt");
        std::fs::create_dir_all(&root).unwrap();

        let path = root.join("route.jsonl");
        std::fs::write(&path, "{\"content_type\":\"route\"}\nnot json\n\n{\"content_type\":\"hut\"}\n")
            .unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);

        let _ = std::fs::remove_dir_all(&root);
    }
}
