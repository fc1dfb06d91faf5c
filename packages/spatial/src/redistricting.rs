//! Converts the city's redistricting CSV export into a district boundary
//! `GeoJSON` file.
//!
//! The export has one row per district with a WKT `POLYGON` column and
//! population columns:
//!
//! ```csv
//! District Name,polygon,Total Population,Percent White,Percent Black,Percent Hispanic,Percent Other
//! District 1,"POLYGON ((-85.30 35.00, -85.25 35.00, ...))",20211,61.2,28.4,5.1,5.3
//! ```
//!
//! Rows that cannot be converted are skipped with a warning.

use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use chattanooga_vote_district_models::{Demographics, normalize_district_id};
use geojson::{Feature, FeatureCollection, Geometry};
use regex::Regex;
use serde::Deserialize;

use crate::SpatialError;
use crate::boundary::validate_ring;

/// Outer ring of a WKT polygon: the text between `((` and the first `)`.
static OUTER_RING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*POLYGON\s*\(\(([^)]*)\)").expect("valid regex"));

#[derive(Debug, Deserialize)]
struct RedistrictingRow {
    #[serde(rename = "District Name")]
    district_name: String,
    polygon: String,
    #[serde(rename = "Total Population")]
    total_population: u64,
    #[serde(rename = "Percent White")]
    percent_white: f64,
    #[serde(rename = "Percent Black")]
    percent_black: f64,
    #[serde(rename = "Percent Hispanic")]
    percent_hispanic: f64,
    #[serde(rename = "Percent Other")]
    percent_other: f64,
}

/// Reads redistricting CSV rows into a `FeatureCollection` of districts.
///
/// # Errors
///
/// Returns [`SpatialError::Csv`] if the header row cannot be read.
pub fn features_from_csv<R: Read>(reader: R) -> Result<FeatureCollection, SpatialError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    rdr.headers()?;

    let mut features = Vec::new();
    for (i, result) in rdr.deserialize::<RedistrictingRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Skipping redistricting row {}: {e}", i + 1);
                continue;
            }
        };
        match row_to_feature(&row) {
            Ok(feature) => features.push(feature),
            Err(reason) => log::warn!("Skipping {}: {reason}", row.district_name),
        }
    }

    log::info!("Converted {} districts from redistricting CSV", features.len());

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Converts a redistricting CSV file and writes the boundary `GeoJSON`.
/// Returns the number of districts written.
///
/// # Errors
///
/// Returns [`SpatialError`] if either file cannot be accessed, or if no
/// row produced a usable district.
pub fn convert_file(csv_path: &Path, out_path: &Path) -> Result<usize, SpatialError> {
    let file = std::fs::File::open(csv_path)?;
    let collection = features_from_csv(file)?;
    if collection.features.is_empty() {
        return Err(SpatialError::Structure {
            message: format!("no valid districts in {}", csv_path.display()),
        });
    }

    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out_path, serde_json::to_string_pretty(&collection)?)?;

    log::info!(
        "Wrote {} district boundaries to {}",
        collection.features.len(),
        out_path.display()
    );
    Ok(collection.features.len())
}

fn row_to_feature(row: &RedistrictingRow) -> Result<Feature, String> {
    let id = normalize_district_id(&row.district_name)
        .ok_or_else(|| "empty district name".to_string())?;

    let ring = parse_outer_ring(&row.polygon)?;
    validate_ring(&ring)?;

    let demographics = Demographics {
        total_population: row.total_population,
        percent_white: row.percent_white,
        percent_black: row.percent_black,
        percent_hispanic: row.percent_hispanic,
        percent_other: row.percent_other,
    };

    let mut properties = serde_json::Map::new();
    properties.insert("district".to_string(), serde_json::Value::from(id.clone()));
    properties.insert(
        "description".to_string(),
        serde_json::Value::from(format!("City Council District {id}")),
    );
    properties.insert(
        "demographics".to_string(),
        serde_json::to_value(&demographics).map_err(|e| e.to_string())?,
    );

    Ok(Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Polygon(vec![ring]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Parses the outer ring of a WKT `POLYGON` into `[lon, lat]` positions,
/// closing the ring if the source left it open.
fn parse_outer_ring(wkt: &str) -> Result<Vec<Vec<f64>>, String> {
    let body = OUTER_RING_RE
        .captures(wkt)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| "polygon column is not a WKT POLYGON".to_string())?
        .as_str();

    let mut ring: Vec<Vec<f64>> = Vec::new();
    for pair in body.split(',') {
        let mut parts = pair.split_whitespace();
        let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("malformed coordinate pair '{}'", pair.trim()));
        };
        let (Ok(lon), Ok(lat)) = (lon.parse::<f64>(), lat.parse::<f64>()) else {
            return Err(format!("non-numeric coordinate pair '{}'", pair.trim()));
        };
        ring.push(vec![lon, lat]);
    }

    if let (Some(first), Some(last)) = (ring.first(), ring.last())
        && first != last
    {
        ring.push(first.clone());
    }

    Ok(ring)
}
