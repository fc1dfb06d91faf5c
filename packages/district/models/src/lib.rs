#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Council district, polling place, and candidate types.
//!
//! These are the plain data types shared by the geocoder, the spatial
//! resolver, the reference-data loader, and the lookup aggregator. None
//! of them carry geometry; polygons live in `chattanooga_vote_spatial`.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Sentinel for [`DistrictInfo::district_number`] when no district matched.
pub const DISTRICT_NOT_FOUND: &str = "District not found";

/// Sentinel for the precinct and polling-place fields of [`DistrictInfo`].
pub const NOT_FOUND: &str = "Not found";

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude (north positive).
    pub latitude: f64,
    /// Longitude (east positive).
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Bit-exact key for caches keyed by coordinate pair.
    #[must_use]
    pub const fn cache_key(&self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }

    /// Returns `true` if both components are finite numbers.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// An axis-aligned latitude/longitude rectangle (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Returns `true` if the coordinate lies inside the box (edges included).
    #[must_use]
    pub fn contains(&self, coord: &Coordinate) -> bool {
        coord.is_finite()
            && (self.min_latitude..=self.max_latitude).contains(&coord.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&coord.longitude)
    }
}

/// The geographic area this deployment answers questions about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceArea {
    /// City name appended to addresses that omit it.
    pub city: &'static str,
    /// Two-letter state abbreviation.
    pub state: &'static str,
    /// Full state name, accepted in place of the abbreviation.
    pub state_name: &'static str,
    /// County name, used to bound address suggestions.
    pub county: &'static str,
    /// Sanity box every accepted coordinate must fall inside.
    pub bounding_box: BoundingBox,
    /// ZIP codes assigned to the service area.
    pub zip_codes: &'static [&'static str],
}

impl ServiceArea {
    /// Chattanooga, TN.
    pub const CHATTANOOGA: Self = Self {
        city: "Chattanooga",
        state: "TN",
        state_name: "Tennessee",
        county: "Hamilton County",
        bounding_box: BoundingBox {
            min_latitude: 34.9,
            max_latitude: 35.2,
            min_longitude: -85.4,
            max_longitude: -85.1,
        },
        zip_codes: &[
            "37401", "37402", "37403", "37404", "37405", "37406", "37407", "37408", "37409",
            "37410", "37411", "37412", "37415", "37416", "37419", "37421", "37450", "37351",
        ],
    };

    #[must_use]
    pub fn contains_zip(&self, zip: &str) -> bool {
        self.zip_codes.contains(&zip)
    }

    #[must_use]
    pub fn contains(&self, coord: &Coordinate) -> bool {
        self.bounding_box.contains(coord)
    }
}

impl Default for ServiceArea {
    fn default() -> Self {
        Self::CHATTANOOGA
    }
}

/// Normalizes a raw district label (`"District 5"`, `" 5 "`, `5`) to its
/// bare identifier (`"5"`).
///
/// Returns `None` for labels that are empty after normalization.
#[must_use]
pub fn normalize_district_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let bare = match trimmed.get(..8) {
        Some(prefix)
            if prefix.eq_ignore_ascii_case("district")
                && trimmed[8..].chars().next().is_none_or(char::is_whitespace) =>
        {
            trimmed[8..].trim()
        }
        _ => trimmed,
    };

    if bare.is_empty() {
        None
    } else {
        Some(bare.to_string())
    }
}

/// Orders district identifiers numerically when both parse as integers,
/// lexicographically otherwise. Numeric ids sort before non-numeric ones.
#[must_use]
pub fn compare_district_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Population breakdown attached to a district boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub total_population: u64,
    pub percent_white: f64,
    pub percent_black: f64,
    pub percent_hispanic: f64,
    pub percent_other: f64,
}

/// Non-geometric properties of a council district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictMetadata {
    /// Bare district identifier (e.g. `"5"`).
    pub id: String,
    /// Human-readable description (e.g. `"City Council District 5"`).
    pub description: Option<String>,
    pub demographics: Option<Demographics>,
}

/// Which tier of the resolver produced a match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResolutionTier {
    /// The exact polygon ring contains the point.
    Contained,
    /// The point lies within the boundary tolerance of a polygon.
    Buffered,
    /// The point is outside every polygon but within the nearest-district
    /// threshold.
    Nearest,
}

/// A polling place row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingPlace {
    /// Precinct identifier served by this location.
    pub precinct: String,
    /// Location name (e.g. `"Election Commission"`).
    pub location_name: String,
    /// Street portion of the postal address.
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl PollingPlace {
    /// Full one-line postal address, e.g.
    /// `"700 River Terminal Rd, Chattanooga, TN 37406"`.
    #[must_use]
    pub fn full_address(&self) -> String {
        let locality = [self.city.trim(), self.state.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        let tail = [locality.as_str(), self.zip.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if tail.is_empty() {
            self.address.trim().to_string()
        } else {
            format!("{}, {tail}", self.address.trim())
        }
    }
}

/// The sitting council member for a district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilMember {
    /// Bare district identifier.
    pub district: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Optional contact channels for a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateContact {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
}

/// A candidate for a council seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    /// Bare district identifier.
    pub district: String,
    #[serde(default)]
    pub contact: CandidateContact,
}

impl Candidate {
    /// Display string handed to the presentation layer: the name, followed
    /// by a markdown campaign link when a website is known.
    #[must_use]
    pub fn display_label(&self) -> String {
        match self.contact.website.as_deref() {
            Some(url) if !url.trim().is_empty() => {
                format!("{} [Campaign Website]({})", self.name, url.trim())
            }
            _ => self.name.clone(),
        }
    }
}

/// The fact sheet produced for one coordinate.
///
/// "Not found" is a regular value: [`DistrictInfo::not_found`] fills every
/// field with its sentinel so callers branch on [`DistrictInfo::is_found`]
/// instead of handling errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictInfo {
    /// Bare district id, or [`DISTRICT_NOT_FOUND`].
    pub district_number: String,
    pub district_description: Option<String>,
    /// Precinct of the nearest polling place, or [`NOT_FOUND`].
    pub precinct: String,
    /// Name of the nearest polling place, or [`NOT_FOUND`].
    pub polling_place: String,
    /// Address of the nearest polling place, or [`NOT_FOUND`].
    pub polling_address: String,
    /// Candidate display strings for the district, in registry order.
    pub candidates: Vec<String>,
    pub council_member: Option<CouncilMember>,
    /// Resolver tier that matched, absent when not found.
    pub resolution: Option<ResolutionTier>,
}

impl DistrictInfo {
    /// The fact sheet for a coordinate outside every district.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            district_number: DISTRICT_NOT_FOUND.to_string(),
            district_description: None,
            precinct: NOT_FOUND.to_string(),
            polling_place: NOT_FOUND.to_string(),
            polling_address: NOT_FOUND.to_string(),
            candidates: Vec::new(),
            council_member: None,
            resolution: None,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        self.district_number != DISTRICT_NOT_FOUND
    }

    #[must_use]
    pub fn has_polling_place(&self) -> bool {
        self.polling_place != NOT_FOUND
    }
}
