//! Record assembly: one raw record + content-type tag → one canonical record.
//!
//! The assembler never emits a partial record. Every sub-resolver degrades
//! to its defined absent representation, so the output always carries the
//! full key set for its content type. Assembly is a pure function of
//! (raw record, config); re-running it yields byte-identical output.

use rayon::prelude::*;
use serde_json::{Map, Value, json};
use tracing::instrument;

use cairn_shared::{
    CairnError, CanonicalRecord, ContentType, CoordinatePrecision, Result, value_is_present,
};

use crate::schema::{self, PipelineConfig};
use crate::{areas, geometry, locale, search};

/// Assemble a canonical record from a raw record with a known content type.
///
/// Never fails: sub-resolvers produce absent sentinels for anything they
/// cannot parse. The only fatal condition — an unknown content-type tag —
/// is handled before this point (see [`assemble_tagged`]).
#[instrument(skip_all, fields(content_type = %content_type))]
pub fn assemble(
    content_type: ContentType,
    raw: &Value,
    cfg: &PipelineConfig,
) -> CanonicalRecord {
    let mut fields = Map::new();

    // --- Identity ---
    fields.insert("content_type".into(), json!(content_type.as_str()));
    fields.insert("document_id".into(), document_id(raw));

    // --- Language-independent passthrough ---
    for key in schema::scalar_fields(content_type) {
        let value = raw
            .get(*key)
            .filter(|v| value_is_present(v))
            .cloned()
            .unwrap_or(Value::Null);
        fields.insert((*key).to_string(), value);
    }
    for (key, _) in schema::rating_fields(content_type) {
        let value = raw
            .get(*key)
            .filter(|v| value_is_present(v))
            .cloned()
            .unwrap_or(Value::Null);
        fields.insert((*key).to_string(), value);
    }

    // --- Locale flattening ---
    let locales = locale::flatten(raw, content_type, cfg);
    fields.extend(locales.fields);
    fields.insert(
        "available_languages".into(),
        json!(locales.available_languages.join(",")),
    );
    fields.insert("is_multilingual".into(), json!(locales.is_multilingual));

    // --- Geometry ---
    let geom = geometry::resolve(raw);
    fields.insert("lat".into(), opt_number(geom.lat));
    fields.insert("lon".into(), opt_number(geom.lon));
    fields.insert(
        "coordinate_precision".into(),
        json!(geom.precision.as_str()),
    );
    match geom.elevation {
        // Canonical geometry wins over any passthrough elevation.
        Some(elev) => {
            fields.insert("elevation".into(), opt_number(Some(elev)));
        }
        // Keep a passthrough elevation if the type defines one; otherwise
        // the key must still exist.
        None => {
            fields.entry("elevation").or_insert(Value::Null);
        }
    }

    // --- Areas ---
    fields.extend(areas::resolve(raw, cfg));

    // --- Semantic context ---
    fields.insert("primary_activity".into(), primary_activity(&fields));
    fields.insert(
        "difficulty_summary".into(),
        difficulty_summary(content_type, &fields),
    );
    fields.insert(
        "data_quality".into(),
        json!(data_quality(content_type, geom.precision, &fields)),
    );

    // --- Search blob (composed last: it reads the flattened fields) ---
    let blob = search::compose(&fields, cfg);
    fields.insert("search_blob".into(), json!(blob.blob));
    fields.insert("search_terms".into(), json!(blob.terms));

    CanonicalRecord::new(fields)
}

/// Assemble from a raw tag string, failing on tags outside the closed set.
pub fn assemble_tagged(tag: &str, raw: &Value, cfg: &PipelineConfig) -> Result<CanonicalRecord> {
    let content_type = ContentType::parse(tag).ok_or_else(|| CairnError::dispatch(tag))?;
    Ok(assemble(content_type, raw, cfg))
}

/// Normalize a batch in parallel, preserving input order.
///
/// Per-record assembly has no ordering dependency on other records and no
/// shared mutable state, so a parallel map is safe.
pub fn assemble_batch(
    items: &[(ContentType, Value)],
    cfg: &PipelineConfig,
) -> Vec<CanonicalRecord> {
    items
        .par_iter()
        .map(|(content_type, raw)| assemble(*content_type, raw, cfg))
        .collect()
}

// ---------------------------------------------------------------------------
// Derivation helpers
// ---------------------------------------------------------------------------

/// Upstream identifier, with the legacy `id` key as a fallback.
fn document_id(raw: &Value) -> Value {
    raw.get("document_id")
        .or_else(|| raw.get("id"))
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null)
}

/// First entry of the activities list, or null.
fn primary_activity(fields: &Map<String, Value>) -> Value {
    fields
        .get("activities")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .filter(|v| value_is_present(v))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Pipe-joined "label: value" over every non-null technical rating the
/// content type defines; null when none are present.
fn difficulty_summary(content_type: ContentType, fields: &Map<String, Value>) -> Value {
    let parts: Vec<String> = schema::rating_fields(content_type)
        .iter()
        .filter_map(|(key, label)| {
            let value = fields.get(*key).filter(|v| value_is_present(v))?;
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(format!("{label}: {rendered}"))
        })
        .collect();

    if parts.is_empty() {
        Value::Null
    } else {
        json!(parts.join(" | "))
    }
}

/// Fixed quality-tier policy: "fine" needs high-precision coordinates,
/// multilingual content, and at least one technical rating.
fn data_quality(
    content_type: ContentType,
    precision: CoordinatePrecision,
    fields: &Map<String, Value>,
) -> &'static str {
    let multilingual = fields
        .get("is_multilingual")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let has_rating = schema::rating_fields(content_type)
        .iter()
        .any(|(key, _)| fields.get(*key).is_some_and(value_is_present));

    if precision == CoordinatePrecision::High && multilingual && has_rating {
        "fine"
    } else {
        "coarse"
    }
}

/// Render an optional coordinate value, coercing whole numbers to JSON
/// integers (matching the upstream convention for elevations).
fn opt_number(value: Option<f64>) -> Value {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => json!(v as i64),
        Some(v) => json!(v),
        None => Value::Null,
    }
}
