//! Polling place and council member CSV loaders.
//!
//! Both files are small, hand-maintained tables. Malformed rows are skipped
//! with a warning rather than failing the load.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chattanooga_vote_district_models::{CouncilMember, PollingPlace, normalize_district_id};
use serde::Deserialize;

use crate::ReferenceError;

/// `polling_places.csv` row.
#[derive(Debug, Deserialize)]
struct PollingPlaceRow {
    precinct: String,
    location_name: String,
    address: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    zip: String,
}

/// `council_members.csv` row.
#[derive(Debug, Deserialize)]
struct CouncilMemberRow {
    district: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
}

/// Loads `polling_places.csv`.
///
/// # Errors
///
/// Returns [`ReferenceError`] if the file cannot be opened.
pub fn load_polling_places(path: &Path) -> Result<Vec<PollingPlace>, ReferenceError> {
    let file = std::fs::File::open(path).map_err(|e| ReferenceError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let places = parse_polling_places(file);
    log::info!("Loaded {} polling places from {}", places.len(), path.display());
    Ok(places)
}

/// Parses polling place rows in file order, skipping rows without a
/// location name or street address.
pub fn parse_polling_places(reader: impl Read) -> Vec<PollingPlace> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut places = Vec::new();
    for (i, result) in rdr.deserialize::<PollingPlaceRow>().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping polling place row {}: {e}", i + 1);
                continue;
            }
        };
        if row.location_name.is_empty() || row.address.is_empty() {
            log::warn!(
                "Skipping polling place row {}: missing location name or address",
                i + 1
            );
            continue;
        }
        places.push(PollingPlace {
            precinct: row.precinct,
            location_name: row.location_name,
            address: row.address,
            city: row.city,
            state: row.state,
            zip: row.zip,
        });
    }
    places
}

/// Loads `council_members.csv`, keyed by bare district id.
///
/// # Errors
///
/// Returns [`ReferenceError`] if the file cannot be opened.
pub fn load_council_members(
    path: &Path,
) -> Result<BTreeMap<String, CouncilMember>, ReferenceError> {
    let file = std::fs::File::open(path).map_err(|e| ReferenceError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let members = parse_council_members(file);
    log::info!(
        "Loaded {} council members from {}",
        members.len(),
        path.display()
    );
    Ok(members)
}

/// Parses council member rows. The first row for a district wins.
pub fn parse_council_members(reader: impl Read) -> BTreeMap<String, CouncilMember> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut members = BTreeMap::new();
    for (i, result) in rdr.deserialize::<CouncilMemberRow>().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping council member row {}: {e}", i + 1);
                continue;
            }
        };
        let Some(district) = normalize_district_id(&row.district) else {
            log::warn!("Skipping council member row {}: no district", i + 1);
            continue;
        };
        if row.name.is_empty() {
            log::warn!("Skipping council member row {}: no name", i + 1);
            continue;
        }
        if members.contains_key(&district) {
            log::warn!(
                "Duplicate council member row for district {district}; keeping the first"
            );
            continue;
        }

        members.insert(
            district.clone(),
            CouncilMember {
                district,
                name: row.name,
                email: row.email.filter(|s| !s.is_empty()),
                phone: row.phone.filter(|s| !s.is_empty()),
            },
        );
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_polling_places_in_order() {
        let csv = "precinct,location_name,address,city,state,zip\n\
                   Early Voting,Election Commission,700 River Terminal Rd,Chattanooga,TN,37406\n\
                   Early Voting,Hixson Community Center,5401 School Dr,Hixson,TN,37343\n";
        let places = parse_polling_places(csv.as_bytes());
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].location_name, "Election Commission");
        assert_eq!(
            places[1].full_address(),
            "5401 School Dr, Hixson, TN 37343"
        );
    }

    #[test]
    fn skips_polling_rows_without_address() {
        let csv = "precinct,location_name,address,city,state,zip\n\
                   1,Somewhere,,Chattanooga,TN,37402\n\
                   2,Brainerd Recreation Center,1010 N Moore Rd,Chattanooga,TN,37411\n";
        let places = parse_polling_places(csv.as_bytes());
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].precinct, "2");
    }

    #[test]
    fn parses_council_members() {
        let csv = "district,name,email,phone\n\
                   District 5,Isiah Hester,ihester@chattanooga.gov,(423) 643-7180\n\
                   7,Raquetta Dotley,,\n";
        let members = parse_council_members(csv.as_bytes());
        assert_eq!(members.len(), 2);
        assert_eq!(members["5"].name, "Isiah Hester");
        assert_eq!(members["5"].district, "5");
        assert!(members["7"].email.is_none());
        assert!(members["7"].phone.is_none());
    }

    #[test]
    fn duplicate_council_rows_keep_first() {
        let csv = "district,name,email,phone\n\
                   1,First,,\n\
                   1,Second,,\n\
                   ,Nobody,,\n";
        let members = parse_council_members(csv.as_bytes());
        assert_eq!(members.len(), 1);
        assert_eq!(members["1"].name, "First");
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("chattanooga_vote_missing_polling.csv");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            load_polling_places(&path),
            Err(ReferenceError::Io { .. })
        ));
    }
}
