//! Parses and validates district boundaries from `GeoJSON`.
//!
//! The boundary file is a `FeatureCollection` with one feature per council
//! district:
//!
//! ```json
//! {
//!   "type": "Feature",
//!   "properties": {
//!     "district": "5",
//!     "description": "City Council District 5",
//!     "demographics": { "total_population": 20000, "percent_white": 40.0, ... }
//!   },
//!   "geometry": { "type": "Polygon", "coordinates": [[[lon, lat], ...]] }
//! }
//! ```
//!
//! Rings are validated here, at load time: a feature whose ring is not
//! closed, has fewer than three distinct vertices, or contains
//! non-numeric positions is skipped with a warning. One bad feature never
//! fails the whole file.

use std::collections::BTreeSet;

use chattanooga_vote_district_models::{Demographics, DistrictMetadata, normalize_district_id};
use geo::{LineString, MultiPolygon, Polygon};
use geojson::{Feature, GeoJson};

use crate::SpatialError;

/// A council district polygon with its metadata.
#[derive(Debug, Clone)]
pub struct DistrictBoundary {
    pub metadata: DistrictMetadata,
    /// Exterior rings and holes in `(lon, lat)` order.
    pub polygon: MultiPolygon<f64>,
}

/// Parses a `GeoJSON` `FeatureCollection` into district boundaries.
///
/// Features with missing or malformed geometry or properties are skipped
/// with a warning. Later features repeating an earlier district id are
/// skipped as well.
///
/// # Errors
///
/// Returns [`SpatialError`] if the text is not `GeoJSON` or is not a
/// `FeatureCollection`.
pub fn parse_boundaries(geojson_str: &str) -> Result<Vec<DistrictBoundary>, SpatialError> {
    let geojson: GeoJson = geojson_str.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(SpatialError::Structure {
            message: "boundary file is not a FeatureCollection".to_string(),
        });
    };

    let mut seen = BTreeSet::new();
    let mut boundaries = Vec::with_capacity(collection.features.len());

    for (i, feature) in collection.features.iter().enumerate() {
        match parse_feature(feature) {
            Ok(boundary) => {
                if seen.insert(boundary.metadata.id.clone()) {
                    boundaries.push(boundary);
                } else {
                    log::warn!(
                        "Skipping boundary feature {i}: duplicate district {}",
                        boundary.metadata.id
                    );
                }
            }
            Err(reason) => log::warn!("Skipping boundary feature {i}: {reason}"),
        }
    }

    Ok(boundaries)
}

fn parse_feature(feature: &Feature) -> Result<DistrictBoundary, String> {
    let props = feature
        .properties
        .as_ref()
        .ok_or_else(|| "missing properties".to_string())?;

    let raw_id = match props.get("district") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => return Err("missing 'district' property".to_string()),
    };
    let id = normalize_district_id(&raw_id)
        .ok_or_else(|| format!("empty district id '{raw_id}'"))?;

    let description = props
        .get("description")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let demographics = props.get("demographics").and_then(|v| {
        serde_json::from_value::<Demographics>(v.clone())
            .inspect_err(|e| log::warn!("Ignoring demographics for district {id}: {e}"))
            .ok()
    });

    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| format!("district {id} has no geometry"))?;

    let polygon = match &geometry.value {
        geojson::Value::Polygon(rings) => {
            MultiPolygon(vec![build_polygon(rings).map_err(|e| format!("district {id}: {e}"))?])
        }
        geojson::Value::MultiPolygon(polygons) => {
            let parts = polygons
                .iter()
                .map(|rings| build_polygon(rings))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("district {id}: {e}"))?;
            if parts.is_empty() {
                return Err(format!("district {id}: empty MultiPolygon"));
            }
            MultiPolygon(parts)
        }
        _ => {
            return Err(format!(
                "district {id}: geometry is not a Polygon or MultiPolygon"
            ));
        }
    };

    Ok(DistrictBoundary {
        metadata: DistrictMetadata {
            id,
            description,
            demographics,
        },
        polygon,
    })
}

fn build_polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, String> {
    let (exterior, holes) = rings
        .split_first()
        .ok_or_else(|| "polygon has no rings".to_string())?;

    let exterior = validate_ring(exterior).map_err(|e| format!("exterior ring {e}"))?;
    let interiors = holes
        .iter()
        .enumerate()
        .map(|(i, ring)| validate_ring(ring).map_err(|e| format!("hole {i} {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Polygon::new(exterior, interiors))
}

/// Checks that a ring is closed and has at least three distinct vertices.
pub(crate) fn validate_ring(positions: &[Vec<f64>]) -> Result<LineString<f64>, String> {
    let mut coords = Vec::with_capacity(positions.len());
    for (i, pos) in positions.iter().enumerate() {
        match pos.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => coords.push((*lon, *lat)),
            _ => return Err(format!("has an invalid position at vertex {i}")),
        }
    }

    let (Some(first), Some(last)) = (coords.first(), coords.last()) else {
        return Err("is empty".to_string());
    };
    if first != last {
        return Err("is not closed (first and last vertices differ)".to_string());
    }

    let distinct: BTreeSet<(u64, u64)> = coords
        .iter()
        .map(|(x, y)| (x.to_bits(), y.to_bits()))
        .collect();
    if distinct.len() < 3 {
        return Err(format!(
            "has {} distinct vertices (at least 3 required)",
            distinct.len()
        ));
    }

    Ok(LineString::from(coords))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn square_ring(min_lon: f64, min_lat: f64, size: f64) -> serde_json::Value {
        json!([[
            [min_lon, min_lat],
            [min_lon + size, min_lat],
            [min_lon + size, min_lat + size],
            [min_lon, min_lat + size],
            [min_lon, min_lat]
        ]])
    }

    fn collection(features: Vec<serde_json::Value>) -> String {
        json!({ "type": "FeatureCollection", "features": features }).to_string()
    }

    #[test]
    fn parses_polygon_feature_with_metadata() {
        let text = collection(vec![json!({
            "type": "Feature",
            "properties": {
                "district": "District 5",
                "description": "City Council District 5",
                "demographics": {
                    "total_population": 20211,
                    "percent_white": 31.5,
                    "percent_black": 55.2,
                    "percent_hispanic": 8.1,
                    "percent_other": 5.2
                }
            },
            "geometry": { "type": "Polygon", "coordinates": square_ring(-85.25, 35.0, 0.05) }
        })]);

        let boundaries = parse_boundaries(&text).unwrap();
        assert_eq!(boundaries.len(), 1);
        let b = &boundaries[0];
        assert_eq!(b.metadata.id, "5");
        assert_eq!(
            b.metadata.description.as_deref(),
            Some("City Council District 5")
        );
        assert_eq!(b.metadata.demographics.as_ref().unwrap().total_population, 20211);
        assert_eq!(b.polygon.0.len(), 1);
    }

    #[test]
    fn accepts_numeric_district_and_multipolygon() {
        let text = collection(vec![json!({
            "type": "Feature",
            "properties": { "district": 7 },
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [square_ring(-85.3, 35.0, 0.01), square_ring(-85.2, 35.0, 0.01)]
            }
        })]);

        let boundaries = parse_boundaries(&text).unwrap();
        assert_eq!(boundaries[0].metadata.id, "7");
        assert_eq!(boundaries[0].polygon.0.len(), 2);
        assert!(boundaries[0].metadata.description.is_none());
    }

    #[test]
    fn skips_malformed_features_but_keeps_the_rest() {
        let text = collection(vec![
            // Missing district property.
            json!({
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Polygon", "coordinates": square_ring(-85.3, 35.0, 0.05) }
            }),
            // Open ring.
            json!({
                "type": "Feature",
                "properties": { "district": "2" },
                "geometry": { "type": "Polygon", "coordinates": [[
                    [-85.3, 35.0], [-85.25, 35.0], [-85.25, 35.05], [-85.3, 35.05]
                ]] }
            }),
            // Missing geometry.
            json!({ "type": "Feature", "properties": { "district": "3" }, "geometry": null }),
            // Point geometry.
            json!({
                "type": "Feature",
                "properties": { "district": "4" },
                "geometry": { "type": "Point", "coordinates": [-85.3, 35.0] }
            }),
            json!({
                "type": "Feature",
                "properties": { "district": "1" },
                "geometry": { "type": "Polygon", "coordinates": square_ring(-85.3, 35.0, 0.05) }
            }),
        ]);

        let boundaries = parse_boundaries(&text).unwrap();
        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].metadata.id, "1");
    }

    #[test]
    fn skips_duplicate_districts() {
        let feature = json!({
            "type": "Feature",
            "properties": { "district": "1" },
            "geometry": { "type": "Polygon", "coordinates": square_ring(-85.3, 35.0, 0.05) }
        });
        let boundaries = parse_boundaries(&collection(vec![feature.clone(), feature])).unwrap();
        assert_eq!(boundaries.len(), 1);
    }

    #[test]
    fn rejects_non_collection() {
        let text = json!({ "type": "Point", "coordinates": [-85.3, 35.0] }).to_string();
        assert!(matches!(
            parse_boundaries(&text),
            Err(SpatialError::Structure { .. })
        ));
        assert!(parse_boundaries("not json").is_err());
    }

    #[test]
    fn ring_needs_three_distinct_vertices() {
        let degenerate = vec![
            vec![-85.3, 35.0],
            vec![-85.2, 35.0],
            vec![-85.3, 35.0],
            vec![-85.2, 35.0],
            vec![-85.3, 35.0],
        ];
        assert!(validate_ring(&degenerate).unwrap_err().contains("2 distinct"));
    }

    #[test]
    fn ring_rejects_short_positions() {
        let ring = vec![vec![-85.3, 35.0], vec![-85.2], vec![-85.2, 35.1], vec![-85.3, 35.0]];
        assert!(validate_ring(&ring).unwrap_err().contains("vertex 1"));
    }

    #[test]
    fn ring_accepts_closed_triangle() {
        let ring = vec![
            vec![-85.3, 35.0],
            vec![-85.2, 35.0],
            vec![-85.25, 35.1],
            vec![-85.3, 35.0],
        ];
        assert_eq!(validate_ring(&ring).unwrap().0.len(), 4);
    }
}
