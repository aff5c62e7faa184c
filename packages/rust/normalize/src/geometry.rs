//! Geometry resolution: any supported encoding → canonical coordinates.
//!
//! Parse attempts run in priority order; the first success wins. Absence
//! of coordinates is a first-class result, not an error — malformed or
//! unrecognized encodings degrade silently to `precision: none`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use cairn_shared::CoordinatePrecision;

/// Canonical geometry tuple. Always complete: unparseable input yields
/// all-null coordinates with [`CoordinatePrecision::None`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGeometry {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub elevation: Option<f64>,
    pub precision: CoordinatePrecision,
}

impl ResolvedGeometry {
    /// The all-null, no-precision result.
    pub fn absent() -> Self {
        Self {
            lat: None,
            lon: None,
            elevation: None,
            precision: CoordinatePrecision::None,
        }
    }

    fn parsed(lon: f64, lat: f64, elevation: Option<f64>, detailed: bool) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
            elevation,
            precision: if detailed {
                CoordinatePrecision::High
            } else {
                CoordinatePrecision::Standard
            },
        }
    }
}

/// A parsed (lon, lat, elevation) triple, before precision is attached.
type Coords = (f64, f64, Option<f64>);

/// Resolve a raw record's geometry.
///
/// Attempts, in order:
/// 1. a GeoJSON-like point object (inline under `geometry`, or JSON-encoded
///    in `geometry.geom`) with a `coordinates` array of length ≥ 2;
/// 2. a `TYPE(lon lat [elev])` textual encoding in `geometry.geom` or a
///    bare `geometry` string;
/// 3. a top-level `geom` string on the record itself;
/// 4. direct `lat`/`lon`/`elevation` fields on the record itself.
///
/// Source order is always (longitude, latitude); output is normalized to
/// (latitude, longitude). The precision flag is "high" only when the
/// geometry object carries a truthy `has_geom_detail` marker.
pub fn resolve(raw: &Value) -> ResolvedGeometry {
    let geometry = raw.get("geometry");

    // Detail marker lives on the geometry object, next to the encoding.
    let detailed = geometry
        .and_then(|g| g.get("has_geom_detail"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if let Some(geom) = geometry {
        if let Some(coords) = parse_geometry_value(geom) {
            return ResolvedGeometry::parsed(coords.0, coords.1, coords.2, detailed);
        }
    }

    // Some feeds hoist the encoded payload to a top-level `geom` key.
    if let Some(encoded) = raw.get("geom").and_then(Value::as_str) {
        if let Some(coords) = parse_geometry_text(encoded) {
            return ResolvedGeometry::parsed(coords.0, coords.1, coords.2, detailed);
        }
    }

    // Fall back to direct numeric fields on the record.
    if let (Some(lat), Some(lon)) = (
        raw.get("lat").and_then(Value::as_f64),
        raw.get("lon").and_then(Value::as_f64),
    ) {
        let elevation = raw.get("elevation").and_then(Value::as_f64);
        return ResolvedGeometry::parsed(lon, lat, elevation, detailed);
    }

    ResolvedGeometry::absent()
}

/// Parse a geometry value in any supported shape.
fn parse_geometry_value(geom: &Value) -> Option<Coords> {
    match geom {
        Value::Object(obj) => {
            // Inline GeoJSON-like point object.
            if let Some(coords) = obj.get("coordinates") {
                return parse_coordinates_array(coords);
            }
            // Nested `geom` payload: JSON-encoded point or WKT-style text.
            if let Some(encoded) = obj.get("geom").and_then(Value::as_str) {
                return parse_geometry_text(encoded);
            }
            None
        }
        Value::String(s) => parse_geometry_text(s),
        _ => None,
    }
}

/// Parse a textual geometry payload: JSON-encoded point first, then the
/// `TYPE(lon lat [elev])` pattern.
fn parse_geometry_text(text: &str) -> Option<Coords> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
            return parsed
                .get("coordinates")
                .and_then(parse_coordinates_array);
        }
        return None;
    }

    parse_wkt_point(trimmed)
}

/// `(longitude, latitude, optional elevation)` from a coordinates array.
fn parse_coordinates_array(coords: &Value) -> Option<Coords> {
    let arr = coords.as_array()?;
    if arr.len() < 2 {
        return None;
    }
    let lon = arr[0].as_f64()?;
    let lat = arr[1].as_f64()?;
    let elevation = arr.get(2).and_then(Value::as_f64);
    Some((lon, lat, elevation))
}

/// Parse a `TYPE(lon lat [elev])` textual point, e.g.
/// `POINT(6.8653 45.8325 4807)`.
fn parse_wkt_point(text: &str) -> Option<Coords> {
    static POINT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)^[a-z]+\s*\(\s*(-?\d+(?:\.\d+)?)\s+(-?\d+(?:\.\d+)?)(?:\s+(-?\d+(?:\.\d+)?))?\s*\)$",
        )
        .expect("valid regex")
    });

    let caps = POINT_RE.captures(text)?;
    let lon = caps[1].parse::<f64>().ok()?;
    let lat = caps[2].parse::<f64>().ok()?;
    let elevation = caps.get(3).and_then(|m| m.as_str().parse::<f64>().ok());
    Some((lon, lat, elevation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wkt_point_with_elevation() {
        let raw = json!({"geometry": {"geom": "POINT(6.8653 45.8325 4807)"}});
        let g = resolve(&raw);
        assert_eq!(g.lat, Some(45.8325));
        assert_eq!(g.lon, Some(6.8653));
        assert_eq!(g.elevation, Some(4807.0));
        assert_eq!(g.precision, CoordinatePrecision::Standard);
    }

    #[test]
    fn wkt_point_without_elevation() {
        let raw = json!({"geometry": {"geom": "POINT(7.65 45.97)"}});
        let g = resolve(&raw);
        assert_eq!(g.lat, Some(45.97));
        assert_eq!(g.elevation, None);
        assert_eq!(g.precision, CoordinatePrecision::Standard);
    }

    #[test]
    fn null_geometry_yields_absent() {
        let raw = json!({"geometry": null});
        let g = resolve(&raw);
        assert_eq!(g, ResolvedGeometry::absent());
        assert_eq!(g.precision, CoordinatePrecision::None);

        let raw = json!({});
        assert_eq!(resolve(&raw), ResolvedGeometry::absent());
    }

    #[test]
    fn geojson_object_inline() {
        let raw = json!({"geometry": {"type": "Point", "coordinates": [6.8653, 45.8325, 4807]}});
        let g = resolve(&raw);
        assert_eq!(g.lat, Some(45.8325));
        assert_eq!(g.lon, Some(6.8653));
        assert_eq!(g.elevation, Some(4807.0));
    }

    #[test]
    fn geojson_encoded_string() {
        let raw = json!({"geometry": {"geom": "{\"type\":\"Point\",\"coordinates\":[7.0,46.0]}"}});
        let g = resolve(&raw);
        assert_eq!(g.lat, Some(46.0));
        assert_eq!(g.lon, Some(7.0));
        assert_eq!(g.elevation, None);
    }

    #[test]
    fn detail_marker_raises_precision() {
        let raw = json!({
            "geometry": {"geom": "POINT(6.8653 45.8325)", "has_geom_detail": true}
        });
        assert_eq!(resolve(&raw).precision, CoordinatePrecision::High);

        let raw = json!({
            "geometry": {"geom": "POINT(6.8653 45.8325)", "has_geom_detail": false}
        });
        assert_eq!(resolve(&raw).precision, CoordinatePrecision::Standard);
    }

    #[test]
    fn detail_marker_without_coordinates_stays_none() {
        let raw = json!({"geometry": {"has_geom_detail": true}});
        assert_eq!(resolve(&raw).precision, CoordinatePrecision::None);
    }

    #[test]
    fn top_level_geom_string_parses() {
        let raw = json!({"geom": "POINT(6.8653 45.8325 4807)"});
        let g = resolve(&raw);
        assert_eq!(g.lat, Some(45.8325));
        assert_eq!(g.lon, Some(6.8653));
        assert_eq!(g.elevation, Some(4807.0));
        assert_eq!(g.precision, CoordinatePrecision::Standard);

        // A nested geometry object still takes priority.
        let raw = json!({
            "geometry": {"geom": "POINT(7.0 46.0)"},
            "geom": "POINT(1.0 2.0)"
        });
        assert_eq!(resolve(&raw).lat, Some(46.0));
    }

    #[test]
    fn direct_fields_as_last_resort() {
        let raw = json!({"lat": 45.9, "lon": 7.1, "elevation": 3200});
        let g = resolve(&raw);
        assert_eq!(g.lat, Some(45.9));
        assert_eq!(g.lon, Some(7.1));
        assert_eq!(g.elevation, Some(3200.0));
        assert_eq!(g.precision, CoordinatePrecision::Standard);
    }

    #[test]
    fn geometry_object_wins_over_direct_fields() {
        let raw = json!({
            "geometry": {"geom": "POINT(6.0 45.0)"},
            "lat": 1.0,
            "lon": 2.0
        });
        let g = resolve(&raw);
        assert_eq!(g.lat, Some(45.0));
        assert_eq!(g.lon, Some(6.0));
    }

    #[test]
    fn malformed_encodings_degrade_silently() {
        for geom in [
            json!({"geometry": {"geom": "POINT(6.8653)"}}),
            json!({"geometry": {"geom": "not a geometry"}}),
            json!({"geometry": {"geom": "{\"type\":\"Point\""}}),
            json!({"geometry": {"coordinates": [6.8]}}),
            json!({"geometry": 42}),
            json!({"geometry": {"coordinates": "6.8,45.8"}}),
        ] {
            assert_eq!(resolve(&geom), ResolvedGeometry::absent(), "input: {geom}");
        }
    }

    #[test]
    fn linestring_style_point_pattern_parses() {
        // Any TYPE(lon lat) textual point is accepted, case-insensitive.
        let raw = json!({"geometry": {"geom": "point(6.5 45.5)"}});
        let g = resolve(&raw);
        assert_eq!(g.lat, Some(45.5));
    }
}
