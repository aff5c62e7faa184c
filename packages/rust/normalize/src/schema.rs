//! Closed field/language sets and pipeline configuration.
//!
//! The per-content-type field sets are explicit configuration data, not
//! inferred from whatever keys happen to appear on a raw record. This is
//! what makes the no-missing-keys guarantee of [`CanonicalRecord`]
//! enforceable: the assembler emits exactly these fields, with explicit
//! nulls for anything the source lacks.
//!
//! [`CanonicalRecord`]: cairn_shared::CanonicalRecord

use cairn_shared::{AppConfig, ContentType};

/// The closed language set. Locale blocks in any other language are
/// dropped (with a warning) during flattening.
pub const LANGUAGES: &[&str] = &["fr", "en", "de", "it", "es", "ca", "eu", "sl", "zh"];

/// Language preference order for area display names and the search blob's
/// primary language. French first: it is by far the best-covered language
/// in the upstream corpus.
pub const LANGUAGE_PRIORITY: &[&str] = &["fr", "en", "de", "it", "es", "ca", "eu", "sl", "zh"];

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Immutable configuration passed into every pipeline entry point.
///
/// The pipeline is a pure function of (raw record, config); there is no
/// ambient global state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Closed language set for flattening.
    pub languages: Vec<String>,
    /// Language fallback order for display names.
    pub language_priority: Vec<String>,
    /// Presence ratio at or above which a field is tier "high".
    pub high_threshold: f64,
    /// Presence ratio at or above which a field is tier "medium".
    pub medium_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            languages: LANGUAGES.iter().map(|s| s.to_string()).collect(),
            language_priority: LANGUAGE_PRIORITY.iter().map(|s| s.to_string()).collect(),
            high_threshold: 0.80,
            medium_threshold: 0.50,
        }
    }
}

impl PipelineConfig {
    /// Build a pipeline config from the app config's `[pipeline]` policy
    /// section, keeping the built-in field/language sets.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            high_threshold: config.pipeline.high_threshold,
            medium_threshold: config.pipeline.medium_threshold,
            ..Self::default()
        }
    }

    /// Whether a language code belongs to the closed set.
    pub fn is_known_language(&self, lang: &str) -> bool {
        self.languages.iter().any(|l| l == lang)
    }
}

// ---------------------------------------------------------------------------
// Per-content-type field sets
// ---------------------------------------------------------------------------

/// Per-language text fields shared by every content type.
const LOCALE_FIELDS_BASE: [&str; 9] = [
    "title",
    "title_prefix",
    "summary",
    "description",
    "access",
    "access_period",
    "remarks",
    "gear",
    "external_resources",
];

const LOCALE_FIELDS_ROUTE: [&str; 23] = [
    "title",
    "title_prefix",
    "summary",
    "description",
    "access",
    "access_period",
    "remarks",
    "gear",
    "external_resources",
    "route_history",
    "approach",
    "descent",
    "conditions",
    "weather",
    "snow_conditions",
    "rock_conditions",
    "ice_conditions",
    "mixed_conditions",
    "avalanche_conditions",
    "glacier_conditions",
    "slope",
    "slackline_anchor1",
    "slackline_anchor2",
];

const LOCALE_FIELDS_CLIMBING_SITE: [&str; 11] = [
    "title",
    "title_prefix",
    "summary",
    "description",
    "access",
    "access_period",
    "remarks",
    "gear",
    "external_resources",
    "approach",
    "descent",
];

const LOCALE_FIELDS_ARTICLE: [&str; 5] = [
    "title",
    "title_prefix",
    "summary",
    "description",
    "external_resources",
];

/// The closed per-language content-field set for a content type.
pub fn locale_fields(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Route => &LOCALE_FIELDS_ROUTE,
        ContentType::ClimbingSite => &LOCALE_FIELDS_CLIMBING_SITE,
        ContentType::Article => &LOCALE_FIELDS_ARTICLE,
        ContentType::Waypoint | ContentType::Summit | ContentType::Hut => &LOCALE_FIELDS_BASE,
    }
}

const SCALAR_FIELDS_COMMON: [&str; 8] = [
    "version",
    "quality",
    "license",
    "url",
    "protected",
    "activities",
    "created_at",
    "updated_at",
];

const SCALAR_FIELDS_ROUTE: [&str; 24] = [
    "version",
    "quality",
    "license",
    "url",
    "protected",
    "activities",
    "created_at",
    "updated_at",
    "orientation",
    "orientations",
    "height_diff_up",
    "height_diff_down",
    "height_diff_difficulties",
    "elevation_min",
    "elevation_max",
    "length",
    "duration",
    "durations",
    "seasons",
    "route_types",
    "configuration",
    "lift_access",
    "rock_types",
    "climbing_outdoor_type",
];

const SCALAR_FIELDS_WAYPOINT: [&str; 22] = [
    "version",
    "quality",
    "license",
    "url",
    "protected",
    "activities",
    "created_at",
    "updated_at",
    "waypoint_type",
    "elevation",
    "prominence",
    "length",
    "slope",
    "orientations",
    "best_periods",
    "routes_quantity",
    "climbing_outdoor_types",
    "climbing_styles",
    "rock_types",
    "capacity",
    "lift_access",
    "maps_info",
];

const SCALAR_FIELDS_SUMMIT: [&str; 11] = [
    "version",
    "quality",
    "license",
    "url",
    "protected",
    "activities",
    "created_at",
    "updated_at",
    "elevation",
    "elevation_confidence",
    "prominence",
];

const SCALAR_FIELDS_HUT: [&str; 12] = [
    "version",
    "quality",
    "license",
    "url",
    "protected",
    "activities",
    "created_at",
    "updated_at",
    "elevation",
    "capacity",
    "phone",
    "email",
];

const SCALAR_FIELDS_ARTICLE: [&str; 9] = [
    "version",
    "quality",
    "license",
    "url",
    "protected",
    "activities",
    "created_at",
    "updated_at",
    "article_type",
];

const SCALAR_FIELDS_CLIMBING_SITE: [&str; 13] = [
    "version",
    "quality",
    "license",
    "url",
    "protected",
    "activities",
    "created_at",
    "updated_at",
    "elevation",
    "climbing_outdoor_type",
    "climbing_rating_scale",
    "rock_types",
    "orientations",
];

/// Language-independent passthrough fields for a content type. Copied
/// verbatim from the raw record, explicit null when absent.
pub fn scalar_fields(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Route => &SCALAR_FIELDS_ROUTE,
        ContentType::Waypoint => &SCALAR_FIELDS_WAYPOINT,
        ContentType::Summit => &SCALAR_FIELDS_SUMMIT,
        ContentType::Hut => &SCALAR_FIELDS_HUT,
        ContentType::Article => &SCALAR_FIELDS_ARTICLE,
        ContentType::ClimbingSite => &SCALAR_FIELDS_CLIMBING_SITE,
    }
}

const RATING_FIELDS_ROUTE: [(&str, &str); 14] = [
    ("global_rating", "global"),
    ("engagement_rating", "engagement"),
    ("risk_rating", "risk"),
    ("equipment_rating", "equipment"),
    ("rock_free_rating", "rock free"),
    ("rock_required_rating", "rock required"),
    ("aid_rating", "aid"),
    ("ski_rating", "ski"),
    ("labande_ski_rating", "labande ski"),
    ("via_ferrata_rating", "via ferrata"),
    ("hiking_rating", "hiking"),
    ("snowshoe_rating", "snowshoe"),
    ("mtb_up_rating", "mtb up"),
    ("mtb_down_rating", "mtb down"),
];

const RATING_FIELDS_WAYPOINT: [(&str, &str); 6] = [
    ("climbing_rating_min", "climbing min"),
    ("climbing_rating_max", "climbing max"),
    ("climbing_rating_median", "climbing median"),
    ("paragliding_rating", "paragliding"),
    ("exposition_rating", "exposition"),
    ("snow_clearance_rating", "snow clearance"),
];

const RATING_FIELDS_CLIMBING_SITE: [(&str, &str); 3] = [
    ("climbing_rating_min", "climbing min"),
    ("climbing_rating_max", "climbing max"),
    ("equipment_rating", "equipment"),
];

/// Technical rating fields for a content type, as `(field, label)` pairs.
/// The label is used in the human-readable `difficulty_summary`.
pub fn rating_fields(content_type: ContentType) -> &'static [(&'static str, &'static str)] {
    match content_type {
        ContentType::Route => &RATING_FIELDS_ROUTE,
        ContentType::Waypoint => &RATING_FIELDS_WAYPOINT,
        ContentType::ClimbingSite => &RATING_FIELDS_CLIMBING_SITE,
        ContentType::Summit | ContentType::Hut | ContentType::Article => &[],
    }
}
