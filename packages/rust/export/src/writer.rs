//! Corpus directory writer.
//!
//! A collection run produces one output directory:
//!
//! ```text
//! <output_root>/
//! ├── raw/<content_type>.json        (pretty-printed raw API documents)
//! ├── normalized/<content_type>.jsonl (one canonical record per line)
//! └── report.json                    (run stats + field completeness)
//! ```
//!
//! Files are written to a temp name and renamed into place, so a crashed
//! run never leaves a half-written file under its final name.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use cairn_shared::{
    CairnError, CanonicalRecord, CollectionStats, CompletenessReport, ContentType, Result,
    CURRENT_SCHEMA_VERSION,
};

/// The run report written as `report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionReport {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub stats: CollectionStats,
    pub completeness: CompletenessReport,
}

impl CollectionReport {
    pub fn new(stats: CollectionStats, completeness: CompletenessReport) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            stats,
            completeness,
        }
    }
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

/// Writes one collection run's outputs under a root directory.
pub struct Exporter {
    root: PathBuf,
}

impl Exporter {
    /// Create the output directory structure under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [root.clone(), root.join("raw"), root.join("normalized")] {
            std::fs::create_dir_all(&dir).map_err(|e| CairnError::io(&dir, e))?;
        }
        debug!(path = %root.display(), "output directory ready");
        Ok(Self { root })
    }

    /// The run's output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the raw API documents for one content type as a pretty JSON
    /// array, preserving exactly what the server returned.
    #[instrument(skip_all, fields(content_type = %content_type, count = documents.len()))]
    pub fn write_raw(&self, content_type: ContentType, documents: &[Value]) -> Result<PathBuf> {
        let path = self
            .root
            .join("raw")
            .join(format!("{}.json", content_type.as_str()));

        let json = serde_json::to_string_pretty(documents)
            .map_err(|e| CairnError::Export(format!("raw serialization failed: {e}")))?;
        write_atomic(&path, json.as_bytes())?;

        info!(path = %path.display(), "wrote raw snapshot");
        Ok(path)
    }

    /// Write canonical records for one content type as JSON Lines, one
    /// record per line in input order.
    #[instrument(skip_all, fields(content_type = %content_type, count = records.len()))]
    pub fn write_records(
        &self,
        content_type: ContentType,
        records: &[CanonicalRecord],
    ) -> Result<PathBuf> {
        let path = self
            .root
            .join("normalized")
            .join(format!("{}.jsonl", content_type.as_str()));

        let mut buf = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buf, record)
                .map_err(|e| CairnError::Export(format!("record serialization failed: {e}")))?;
            buf.push(b'\n');
        }
        write_atomic(&path, &buf)?;

        info!(path = %path.display(), "wrote normalized records");
        Ok(path)
    }

    /// Write the run report.
    #[instrument(skip_all)]
    pub fn write_report(&self, report: &CollectionReport) -> Result<PathBuf> {
        let path = self.root.join("report.json");

        let json = serde_json::to_string_pretty(report)
            .map_err(|e| CairnError::Export(format!("report serialization failed: {e}")))?;
        write_atomic(&path, json.as_bytes())?;

        info!(path = %path.display(), "wrote run report");
        Ok(path)
    }
}

/// Compute run stats over an assembled corpus.
pub fn collect_stats(records: &[CanonicalRecord]) -> CollectionStats {
    let mut stats = CollectionStats {
        total_records: records.len(),
        ..CollectionStats::default()
    };

    for record in records {
        if let Some(ct) = record.content_type() {
            *stats.by_type.entry(ct.as_str().to_string()).or_insert(0) += 1;
        }
        if record
            .get("is_multilingual")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            stats.multilingual_records += 1;
        }
        if record.is_present("lat") && record.is_present("lon") {
            stats.records_with_coordinates += 1;
        }
    }

    stats
}

/// Write bytes to `path` via a temp file in the same directory, then
/// rename into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CairnError::Export(format!("invalid output path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    let mut file = std::fs::File::create(&temp).map_err(|e| CairnError::io(&temp, e))?;
    file.write_all(bytes).map_err(|e| CairnError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| CairnError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_root(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "cairn-export-test-{tag}-{}",
            std::process::id()
        ))
    }

    fn record(pairs: Value) -> CanonicalRecord {
        CanonicalRecord::new(pairs.as_object().expect("object fixture").clone())
    }

    #[test]
    fn writes_jsonl_one_record_per_line() {
        let root = temp_root("jsonl");
        let exporter = Exporter::new(&root).unwrap();

        let records = vec![
            record(json!({"content_type": "route", "document_id": 1})),
            record(json!({"content_type": "route", "document_id": 2})),
        ];
        let path = exporter.write_records(ContentType::Route, &records).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["document_id"], json!(1));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn jsonl_lines_are_key_sorted() {
        let root = temp_root("sorted");
        let exporter = Exporter::new(&root).unwrap();

        let records = vec![record(json!({"zeta": 1, "alpha": 2, "mid": 3}))];
        let path = exporter
            .write_records(ContentType::Summit, &records)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), r#"{"alpha":2,"mid":3,"zeta":1}"#);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn raw_snapshot_roundtrips() {
        let root = temp_root("raw");
        let exporter = Exporter::new(&root).unwrap();

        let docs = vec![json!({"document_id": 7, "locales": []})];
        let path = exporter.write_raw(ContentType::Hut, &docs).unwrap();
        assert!(path.ends_with("raw/hut.json"));

        let parsed: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, docs);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn report_roundtrips() {
        let root = temp_root("report");
        let exporter = Exporter::new(&root).unwrap();

        let mut stats = CollectionStats {
            total_records: 3,
            ..CollectionStats::default()
        };
        stats.by_type.insert("route".into(), 3);

        let report = CollectionReport::new(stats, CompletenessReport::default());
        let path = exporter.write_report(&report).unwrap();

        let read: CollectionReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(read.stats.total_records, 3);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let root = temp_root("atomic");
        let exporter = Exporter::new(&root).unwrap();

        exporter.write_raw(ContentType::Route, &[]).unwrap();
        exporter.write_records(ContentType::Route, &[]).unwrap();

        for dir in [root.join("raw"), root.join("normalized")] {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let name = entry.unwrap().file_name().to_string_lossy().to_string();
                assert!(!name.starts_with('.'), "temp file left behind: {name}");
            }
        }

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn stats_count_multilingual_and_coordinates() {
        let records = vec![
            record(json!({
                "content_type": "route",
                "is_multilingual": true,
                "lat": 45.8,
                "lon": 6.8
            })),
            record(json!({
                "content_type": "hut",
                "is_multilingual": false,
                "lat": null,
                "lon": null
            })),
        ];

        let stats = collect_stats(&records);
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.by_type["route"], 1);
        assert_eq!(stats.by_type["hut"], 1);
        assert_eq!(stats.multilingual_records, 1);
        assert_eq!(stats.records_with_coordinates, 1);
    }
}
