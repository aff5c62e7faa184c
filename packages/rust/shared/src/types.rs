//! Core domain types for the cairn normalization pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current schema version for the canonical record format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// ContentType
// ---------------------------------------------------------------------------

/// The closed set of content-type variants the pipeline can dispatch.
///
/// Every raw record arrives tagged with one of these; an unrecognized tag is
/// the only fatal condition in the pipeline ([`CairnError::Dispatch`]).
///
/// [`CairnError::Dispatch`]: crate::error::CairnError::Dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Route,
    Waypoint,
    Summit,
    Hut,
    Article,
    ClimbingSite,
}

impl ContentType {
    /// All variants, in stable order.
    pub const ALL: [ContentType; 6] = [
        ContentType::Route,
        ContentType::Waypoint,
        ContentType::Summit,
        ContentType::Hut,
        ContentType::Article,
        ContentType::ClimbingSite,
    ];

    /// The canonical tag string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Route => "route",
            ContentType::Waypoint => "waypoint",
            ContentType::Summit => "summit",
            ContentType::Hut => "hut",
            ContentType::Article => "article",
            ContentType::ClimbingSite => "climbing_site",
        }
    }

    /// Parse a tag string. Accepts the plural forms the upstream API uses
    /// for its endpoints ("routes", "climbing_sites", ...) as well.
    pub fn parse(tag: &str) -> Option<ContentType> {
        match tag {
            "route" | "routes" => Some(ContentType::Route),
            "waypoint" | "waypoints" => Some(ContentType::Waypoint),
            "summit" | "summits" => Some(ContentType::Summit),
            "hut" | "huts" => Some(ContentType::Hut),
            "article" | "articles" => Some(ContentType::Article),
            "climbing_site" | "climbing_sites" => Some(ContentType::ClimbingSite),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = crate::error::CairnError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ContentType::parse(s).ok_or_else(|| crate::error::CairnError::dispatch(s))
    }
}

// ---------------------------------------------------------------------------
// Value presence
// ---------------------------------------------------------------------------

/// Whether a JSON value counts as "present" for completeness purposes.
///
/// Null, empty strings, and empty arrays are the defined absent sentinels;
/// everything else (including `0` and `false`) is present.
pub fn value_is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        _ => true,
    }
}

// ---------------------------------------------------------------------------
// CanonicalRecord
// ---------------------------------------------------------------------------

/// The pipeline's schema-stable, fully-keyed output representation.
///
/// Every key the record's content type defines is present, possibly with a
/// null/empty value — absence is never represented by a missing key. A
/// record is constructed once by the assembler and never mutated afterward.
///
/// The backing `serde_json::Map` is BTreeMap-based, so serialization is
/// key-sorted and byte-stable across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRecord {
    fields: Map<String, Value>,
}

impl CanonicalRecord {
    /// Seal a fully-built field map into a record.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Look up a field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether the field exists in the schema (even if null).
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Whether the field exists and holds a non-null, non-empty value.
    pub fn is_present(&self, key: &str) -> bool {
        self.fields.get(key).is_some_and(value_is_present)
    }

    /// The record's content-type tag, if well-formed.
    pub fn content_type(&self) -> Option<ContentType> {
        self.fields
            .get("content_type")
            .and_then(Value::as_str)
            .and_then(ContentType::parse)
    }

    /// Iterate over all (key, value) pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the record has no fields (never the case for assembled records).
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CoordinatePrecision
// ---------------------------------------------------------------------------

/// Classification of coordinate accuracy derived from the source's
/// detail marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinatePrecision {
    /// The source carried an explicit detail/accuracy marker.
    High,
    /// Coordinates were parsed but carried no detail marker.
    Standard,
    /// No coordinates could be parsed.
    None,
}

impl CoordinatePrecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinatePrecision::High => "high",
            CoordinatePrecision::Standard => "standard",
            CoordinatePrecision::None => "none",
        }
    }
}

impl std::fmt::Display for CoordinatePrecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Completeness reporting
// ---------------------------------------------------------------------------

/// Per-field quality tier based on presence ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
        }
    }
}

/// Presence statistics for a single field across a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCompleteness {
    /// Records where the field is non-null/non-empty.
    pub present: usize,
    /// Records of a content type that defines the field.
    pub defined: usize,
    /// `present / defined`, in [0, 1].
    pub ratio: f64,
    /// Tier derived from the configured thresholds.
    pub tier: QualityTier,
}

/// Aggregate statistics over a batch of canonical records.
///
/// Recomputed per batch; holds no persistent identity across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletenessReport {
    /// Total records in the analyzed batch.
    pub record_count: usize,
    /// Per-field presence stats, key-sorted.
    pub fields: BTreeMap<String, FieldCompleteness>,
}

impl CompletenessReport {
    /// Look up a field's stats.
    pub fn field(&self, name: &str) -> Option<&FieldCompleteness> {
        self.fields.get(name)
    }
}

// ---------------------------------------------------------------------------
// CollectionStats
// ---------------------------------------------------------------------------

/// Summary counters for a collection run, written into the run report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total_records: usize,
    /// Records per content-type tag.
    pub by_type: BTreeMap<String, usize>,
    pub multilingual_records: usize,
    pub records_with_coordinates: usize,
}
