//! Search blob composition from already-normalized fields.
//!
//! Builds one retrieval-oriented text field plus the parallel list of its
//! segments. Segment order is fixed; a segment whose source is null or
//! empty is omitted from both outputs so the blob never carries
//! placeholder tokens.

use serde_json::{Map, Value};

use crate::schema::PipelineConfig;

/// The composed retrieval text and its constituent segments.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBlob {
    pub blob: String,
    pub terms: Vec<String>,
}

/// Separator between blob segments.
const SEPARATOR: &str = " | ";

/// Compose the search blob from a fully-flattened field map.
///
/// Segment order: primary-language title, primary-language summary,
/// activities, difficulty summary, height/elevation highlight,
/// orientation, area names.
pub fn compose(fields: &Map<String, Value>, cfg: &PipelineConfig) -> SearchBlob {
    let mut terms: Vec<String> = Vec::new();
    let mut push = |segment: Option<String>| {
        if let Some(s) = segment {
            if !s.is_empty() {
                terms.push(s);
            }
        }
    };

    let primary = primary_language(fields, cfg);

    push(primary.and_then(|lang| text_field(fields, &format!("title_{lang}"))));
    push(primary.and_then(|lang| text_field(fields, &format!("summary_{lang}"))));
    push(joined_array(fields, "activities", " "));
    push(text_field(fields, "difficulty_summary"));
    push(height_highlight(fields));
    push(orientation(fields));
    push(text_field(fields, "area_names"));

    SearchBlob {
        blob: terms.join(SEPARATOR),
        terms,
    }
}

/// First language in priority order with a non-empty title.
fn primary_language<'a>(fields: &Map<String, Value>, cfg: &'a PipelineConfig) -> Option<&'a str> {
    cfg.language_priority
        .iter()
        .find(|lang| {
            fields
                .get(&format!("title_{lang}"))
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty())
        })
        .map(String::as_str)
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn joined_array(fields: &Map<String, Value>, key: &str, sep: &str) -> Option<String> {
    let items: Vec<&str> = fields
        .get(key)?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items.join(sep))
    }
}

/// A compact vertical highlight: height gain for routes, elevation for
/// everything that has one.
fn height_highlight(fields: &Map<String, Value>) -> Option<String> {
    if let Some(gain) = fields.get("height_diff_up").and_then(Value::as_f64) {
        return Some(format!("{gain}m D+"));
    }
    fields
        .get("elevation")
        .and_then(Value::as_f64)
        .map(|elev| format!("{elev}m"))
}

/// Scalar `orientation`, falling back to the joined `orientations` list.
fn orientation(fields: &Map<String, Value>) -> Option<String> {
    text_field(fields, "orientation").or_else(|| joined_array(fields, "orientations", " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cfg() -> PipelineConfig {
        PipelineConfig::default()
    }

    fn fields(pairs: Value) -> Map<String, Value> {
        pairs.as_object().expect("object fixture").clone()
    }

    #[test]
    fn full_composition_in_fixed_order() {
        let f = fields(json!({
            "title_fr": "Voie normale",
            "summary_fr": "Itinéraire classique",
            "activities": ["alpinism", "hiking"],
            "difficulty_summary": "global: PD",
            "height_diff_up": 1200,
            "orientation": "N",
            "area_names": "France, Mont Blanc massif"
        }));
        let result = compose(&f, &cfg());
        assert_eq!(
            result.terms,
            vec![
                "Voie normale",
                "Itinéraire classique",
                "alpinism hiking",
                "global: PD",
                "1200m D+",
                "N",
                "France, Mont Blanc massif"
            ]
        );
        assert_eq!(
            result.blob,
            "Voie normale | Itinéraire classique | alpinism hiking | global: PD | 1200m D+ | N | France, Mont Blanc massif"
        );
    }

    #[test]
    fn null_summary_is_omitted_entirely() {
        let f = fields(json!({
            "title_en": "Matterhorn",
            "summary_en": null,
            "area_names": "Switzerland"
        }));
        let result = compose(&f, &cfg());
        assert_eq!(result.terms, vec!["Matterhorn", "Switzerland"]);
        assert!(!result.blob.contains("||"));
        assert!(!result.blob.contains(" |  | "));
    }

    #[test]
    fn primary_language_follows_priority() {
        let f = fields(json!({
            "title_fr": "Cervin",
            "title_en": "Matterhorn",
            "summary_en": "Iconic peak"
        }));
        let result = compose(&f, &cfg());
        // fr has a title so fr is primary; its summary is absent, so the
        // en summary must not leak in.
        assert_eq!(result.terms, vec!["Cervin"]);
    }

    #[test]
    fn elevation_used_when_no_height_gain() {
        let f = fields(json!({"title_fr": "Dom", "elevation": 4545}));
        let result = compose(&f, &cfg());
        assert_eq!(result.terms, vec!["Dom", "4545m"]);
    }

    #[test]
    fn empty_input_yields_empty_blob() {
        let result = compose(&Map::new(), &cfg());
        assert!(result.blob.is_empty());
        assert!(result.terms.is_empty());
    }
}
