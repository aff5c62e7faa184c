//! Corpus-level field completeness analysis.
//!
//! Walks a set of canonical records and reports, per field, how often the
//! field carries a present value among the records that define it at all.
//! Because record schemas differ by content type, "defined" and "present"
//! are counted separately: a field never defined by a record's type does
//! not drag its ratio down.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::instrument;

use cairn_shared::{
    CanonicalRecord, CompletenessReport, FieldCompleteness, QualityTier, value_is_present,
};

use crate::schema::PipelineConfig;

/// Analyze field completeness across a corpus of canonical records.
///
/// Tier thresholds come from the pipeline config; ratios are compared
/// inclusively (a field exactly at the high threshold is high-tier).
#[instrument(skip_all, fields(records = records.len()))]
pub fn analyze(records: &[CanonicalRecord], cfg: &PipelineConfig) -> CompletenessReport {
    let mut defined: BTreeMap<String, usize> = BTreeMap::new();
    let mut present: BTreeMap<String, usize> = BTreeMap::new();

    for record in records {
        for (key, value) in record.iter() {
            *defined.entry(key.clone()).or_insert(0) += 1;
            if value_is_present(value) {
                *present.entry(key.clone()).or_insert(0) += 1;
            }
        }
    }

    let fields = defined
        .into_iter()
        .map(|(key, defined)| {
            let present = present.get(&key).copied().unwrap_or(0);
            let ratio = if defined == 0 {
                0.0
            } else {
                present as f64 / defined as f64
            };
            let stats = FieldCompleteness {
                present,
                defined,
                ratio,
                tier: tier_for(ratio, cfg),
            };
            (key, stats)
        })
        .collect();

    CompletenessReport {
        record_count: records.len(),
        fields,
    }
}

fn tier_for(ratio: f64, cfg: &PipelineConfig) -> QualityTier {
    if ratio >= cfg.high_threshold {
        QualityTier::High
    } else if ratio >= cfg.medium_threshold {
        QualityTier::Medium
    } else {
        QualityTier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler;
    use cairn_shared::ContentType;
    use serde_json::json;

    fn cfg() -> PipelineConfig {
        PipelineConfig::default()
    }

    fn record(ct: ContentType, raw: Value) -> CanonicalRecord {
        assembler::assemble(ct, &raw, &cfg())
    }

    #[test]
    fn counts_present_and_defined_separately() {
        let records = vec![
            record(
                ContentType::Summit,
                json!({"document_id": 1, "locales": [{"lang": "fr", "title": "Cervin"}]}),
            ),
            record(ContentType::Summit, json!({"document_id": 2})),
        ];
        let report = analyze(&records, &cfg());

        assert_eq!(report.record_count, 2);
        let title_fr = &report.fields["title_fr"];
        assert_eq!(title_fr.defined, 2);
        assert_eq!(title_fr.present, 1);
        assert_eq!(title_fr.ratio, 0.5);
        assert_eq!(title_fr.tier, QualityTier::Medium);

        let document_id = &report.fields["document_id"];
        assert_eq!(document_id.present, 2);
        assert_eq!(document_id.tier, QualityTier::High);
    }

    #[test]
    fn mixed_content_types_do_not_dilute_each_other() {
        // `global_rating` only exists on route records.
        let records = vec![
            record(ContentType::Route, json!({"global_rating": "AD"})),
            record(ContentType::Hut, json!({"document_id": 5})),
        ];
        let report = analyze(&records, &cfg());

        let rating = &report.fields["global_rating"];
        assert_eq!(rating.defined, 1);
        assert_eq!(rating.present, 1);
        assert_eq!(rating.ratio, 1.0);
    }

    #[test]
    fn tier_thresholds_are_inclusive() {
        let c = cfg();
        assert_eq!(tier_for(c.high_threshold, &c), QualityTier::High);
        assert_eq!(tier_for(c.medium_threshold, &c), QualityTier::Medium);
        assert_eq!(tier_for(c.medium_threshold - 0.01, &c), QualityTier::Low);
        assert_eq!(tier_for(0.0, &c), QualityTier::Low);
        assert_eq!(tier_for(1.0, &c), QualityTier::High);
    }

    #[test]
    fn adding_a_fuller_record_never_lowers_present_counts() {
        let sparse = record(ContentType::Waypoint, json!({"document_id": 1}));
        let full = record(
            ContentType::Waypoint,
            json!({
                "document_id": 2,
                "elevation": 2500,
                "locales": [{"lang": "en", "title": "Col"}]
            }),
        );

        let before = analyze(std::slice::from_ref(&sparse), &cfg());
        let after = analyze(&[sparse, full], &cfg());

        for (key, stats) in &before.fields {
            let later = &after.fields[key];
            assert!(later.present >= stats.present, "{key} regressed");
            assert!(later.defined >= stats.defined, "{key} regressed");
        }
    }

    #[test]
    fn presence_ratio_never_drops_when_present_records_arrive() {
        let records = vec![
            record(
                ContentType::Summit,
                json!({"document_id": 1, "locales": [{"lang": "fr", "title": "Cervin"}]}),
            ),
            record(ContentType::Summit, json!({"document_id": 2})),
        ];
        let before = analyze(&records, &cfg());
        assert_eq!(before.fields["title_fr"].ratio, 0.5);

        let mut extended = records;
        extended.push(record(
            ContentType::Summit,
            json!({"document_id": 3, "locales": [{"lang": "fr", "title": "Dom"}]}),
        ));
        let after = analyze(&extended, &cfg());

        let field = &after.fields["title_fr"];
        assert!(field.ratio >= before.fields["title_fr"].ratio);
        assert!((field.ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_corpus_yields_empty_report() {
        let report = analyze(&[], &cfg());
        assert_eq!(report.record_count, 0);
        assert!(report.fields.is_empty());
    }
}
