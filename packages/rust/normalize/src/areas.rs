//! Area denormalization: hierarchical area references → flat tag fields.
//!
//! Each record carries zero or more references to administrative or
//! geographic areas. These are grouped by kind and flattened into a joined
//! display string plus a parallel array per kind, so downstream filters
//! never have to walk the hierarchy. Missing kinds produce an empty
//! string / empty array, never a missing key.

use serde_json::{Map, Value, json};

use crate::schema::PipelineConfig;

/// The closed set of area kinds and their output field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AreaKind {
    Country,
    Region,
    AdminBoundary,
}

impl AreaKind {
    /// Map the upstream `area_type` discriminator to a kind.
    fn from_tag(tag: &str) -> Option<AreaKind> {
        match tag {
            "country" => Some(AreaKind::Country),
            "range" | "region" => Some(AreaKind::Region),
            "admin_limits" | "admin_boundary" => Some(AreaKind::AdminBoundary),
            _ => None,
        }
    }

    /// Output field name for the joined string form.
    fn field(&self) -> &'static str {
        match self {
            AreaKind::Country => "countries",
            AreaKind::Region => "regions",
            AreaKind::AdminBoundary => "admin_boundaries",
        }
    }

    /// Output field name for the parallel array form.
    fn array_field(&self) -> &'static str {
        match self {
            AreaKind::Country => "countries_array",
            AreaKind::Region => "regions_array",
            AreaKind::AdminBoundary => "admin_boundaries_array",
        }
    }
}

/// Denormalize a record's area references into flat tag fields.
///
/// Emits, for every kind: `<kind>` (joined names) and `<kind>_array`, plus
/// the combined `area_names` and `all_areas_array` spanning every kind.
pub fn resolve(raw: &Value, cfg: &PipelineConfig) -> Map<String, Value> {
    let mut names_by_kind: [(AreaKind, Vec<String>); 3] = [
        (AreaKind::Country, Vec::new()),
        (AreaKind::Region, Vec::new()),
        (AreaKind::AdminBoundary, Vec::new()),
    ];

    if let Some(areas) = raw.get("areas").and_then(Value::as_array) {
        for area in areas {
            let Some(obj) = area.as_object() else {
                continue;
            };
            let Some(kind) = obj
                .get("area_type")
                .and_then(Value::as_str)
                .and_then(AreaKind::from_tag)
            else {
                continue;
            };
            let Some(name) = display_name(obj, cfg) else {
                continue;
            };
            for (k, names) in names_by_kind.iter_mut() {
                if *k == kind {
                    names.push(name);
                    break;
                }
            }
        }
    }

    let mut out = Map::new();
    let mut all_names: Vec<String> = Vec::new();

    for (kind, names) in &names_by_kind {
        out.insert(kind.field().to_string(), json!(names.join(", ")));
        out.insert(kind.array_field().to_string(), json!(names));
        all_names.extend(names.iter().cloned());
    }

    out.insert("area_names".to_string(), json!(all_names.join(", ")));
    out.insert("all_areas_array".to_string(), json!(all_names));
    out
}

/// Pick an area's display name, preferring languages in the configured
/// priority order and falling back through the list until a non-null
/// title is found. Tolerates both locale shapes (sequence or mapping).
fn display_name(area: &Map<String, Value>, cfg: &PipelineConfig) -> Option<String> {
    let locales = area.get("locales")?;

    let title_for = |lang: &str| -> Option<String> {
        let title = match locales {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_object)
                .find(|b| b.get("lang").and_then(Value::as_str) == Some(lang))
                .and_then(|b| b.get("title")),
            Value::Object(map) => map.get(lang).and_then(|b| b.get("title")),
            _ => None,
        };
        title
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    cfg.language_priority.iter().find_map(|lang| title_for(lang))
}
