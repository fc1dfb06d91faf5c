#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address to council district fact sheet.
//!
//! [`DistrictLookup`] chains the pieces together for one user request:
//!
//! ```text
//! address ──validate──> geocode ──resolve──> district ──join──> DistrictInfo
//!                                               │
//!                                               ├── description (boundaries)
//!                                               ├── council member
//!                                               ├── candidates
//!                                               └── nearest polling place
//! ```
//!
//! Every failure along the way is a regular value: an invalid address,
//! an address the geocoder cannot place, and a point outside every
//! district all come back as a [`LookupOutcome`] the caller renders.

pub mod polling;
pub mod registration;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use chattanooga_vote_district_models::{Candidate, Coordinate, DistrictInfo, NOT_FOUND};
use chattanooga_vote_geocoder::Geocoder;
use chattanooga_vote_geocoder::address::{AddressError, check_address};
use chattanooga_vote_geocoder::cache::TtlCache;
use chattanooga_vote_reference::{ReferenceData, ReferenceStore};
use chattanooga_vote_spatial::{Resolution, ResolverConfig};
use serde::Serialize;

pub use polling::{NearestPollingPlace, PollingPlaceLocator};

/// How long a coordinate's fact sheet is reused.
pub const DISTRICT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Who to contact when a lookup fails.
pub const ELECTION_COMMISSION_CONTACT: &str =
    "Hamilton County Election Commission: (423) 493-5100, vote@hamiltontn.gov";

/// Result of looking up a free-text address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupOutcome {
    /// The address failed validation; nothing was sent to the geocoder.
    InvalidAddress {
        #[serde(serialize_with = "serialize_display")]
        error: AddressError,
    },
    /// The geocoder found nothing inside the service area.
    AddressNotFound,
    /// The address was placed. `info` may still be the not-found sheet if
    /// the point is outside every district.
    Found {
        coordinate: Coordinate,
        info: DistrictInfo,
    },
}

impl LookupOutcome {
    /// Message for the person who entered the address.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidAddress { error } => error.to_string(),
            Self::AddressNotFound => format!(
                "Could not find this address. Please ensure you've entered a valid \
                 Chattanooga address including street number, street name, and ZIP code. \
                 For help, contact the {ELECTION_COMMISSION_CONTACT}."
            ),
            Self::Found { info, .. } if !info.is_found() => format!(
                "This address does not appear to be inside a Chattanooga City Council \
                 district. For help, contact the {ELECTION_COMMISSION_CONTACT}."
            ),
            Self::Found { info, .. } => format!("Your district is District {}", info.district_number),
        }
    }

    #[must_use]
    pub const fn info(&self) -> Option<&DistrictInfo> {
        match self {
            Self::Found { info, .. } => Some(info),
            Self::InvalidAddress { .. } | Self::AddressNotFound => None,
        }
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &AddressError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Validates, geocodes, resolves, and assembles district fact sheets.
pub struct DistrictLookup {
    geocoder: Arc<Geocoder>,
    reference: Arc<ReferenceStore>,
    locator: PollingPlaceLocator,
    resolver: ResolverConfig,
    cache: TtlCache<(u64, u64), DistrictInfo>,
}

impl DistrictLookup {
    #[must_use]
    pub fn new(geocoder: Arc<Geocoder>, reference: Arc<ReferenceStore>) -> Self {
        Self {
            locator: PollingPlaceLocator::new(Arc::clone(&geocoder)),
            geocoder,
            reference,
            resolver: ResolverConfig::DEFAULT,
            cache: TtlCache::new(DISTRICT_CACHE_TTL),
        }
    }

    /// Overrides the resolver tolerances.
    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    /// Overrides how long fact sheets are cached.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TtlCache::new(ttl);
        self
    }

    #[must_use]
    pub fn geocoder(&self) -> &Geocoder {
        &self.geocoder
    }

    /// Current reference data snapshot.
    #[must_use]
    pub fn reference(&self) -> Arc<ReferenceData> {
        self.reference.snapshot()
    }

    /// Resolves a coordinate to its district without joining anything else.
    #[must_use]
    pub fn resolve(&self, coord: &Coordinate) -> Resolution {
        self.reference.snapshot().districts.resolve(coord, &self.resolver)
    }

    /// Builds the fact sheet for a coordinate.
    ///
    /// A coordinate that resolves to no district gets
    /// [`DistrictInfo::not_found`] without any polling place geocoding.
    ///
    /// A sheet whose polling place could not be geocoded (e.g. during a
    /// provider outage) is returned but not cached, so the next request
    /// retries the polling place lookup.
    pub async fn get_district_info(&self, coord: &Coordinate) -> DistrictInfo {
        let key = coord.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            log::debug!(
                "District cache hit for ({}, {})",
                coord.latitude,
                coord.longitude
            );
            return cached;
        }

        let data = self.reference.snapshot();
        let resolution = data.districts.resolve(coord, &self.resolver);
        let (info, complete) = match resolution.district() {
            Some(district) => self.assemble(&data, coord, district, &resolution).await,
            None => (DistrictInfo::not_found(), true),
        };

        if complete {
            self.cache.insert(key, info.clone());
        } else {
            log::info!(
                "Not caching district {} sheet: no polling place could be geocoded",
                info.district_number
            );
        }
        info
    }

    /// Joins the reference data for `district`. The flag is `false` when
    /// polling places exist but none could be geocoded.
    async fn assemble(
        &self,
        data: &ReferenceData,
        coord: &Coordinate,
        district: &str,
        resolution: &Resolution,
    ) -> (DistrictInfo, bool) {
        let district_description = data
            .districts
            .get(district)
            .and_then(|m| m.description.clone());

        let council_member = data.council_member(district).cloned();
        if council_member.is_none() {
            log::warn!("No council member on file for district {district}");
        }

        let candidates = data
            .candidates_for(district)
            .iter()
            .map(Candidate::display_label)
            .collect();

        let nearest = self
            .locator
            .find_nearest(coord, &data.polling_places)
            .await;
        let complete = nearest.is_some() || data.polling_places.is_empty();

        let (precinct, polling_place, polling_address) = match nearest {
            Some(nearest) => (
                nearest.place.precinct.clone(),
                nearest.place.location_name.clone(),
                nearest.place.full_address(),
            ),
            None => (
                NOT_FOUND.to_string(),
                NOT_FOUND.to_string(),
                NOT_FOUND.to_string(),
            ),
        };

        let info = DistrictInfo {
            district_number: district.to_string(),
            district_description,
            precinct,
            polling_place,
            polling_address,
            candidates,
            council_member,
            resolution: resolution.tier(),
        };
        (info, complete)
    }

    /// Looks up a free-text address end to end.
    pub async fn lookup_address(&self, address: &str) -> LookupOutcome {
        if let Err(error) = check_address(address, self.geocoder.area()) {
            log::info!("Rejected address '{address}': {error}");
            return LookupOutcome::InvalidAddress { error };
        }

        let Some(coordinate) = self.geocoder.geocode(address).await else {
            return LookupOutcome::AddressNotFound;
        };

        let info = self.get_district_info(&coordinate).await;
        LookupOutcome::Found { coordinate, info }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chattanooga_vote_district_models::{
        CouncilMember, DISTRICT_NOT_FOUND, PollingPlace, ResolutionTier,
    };
    use chattanooga_vote_reference::candidates::candidates_2025;
    use chattanooga_vote_spatial::{DistrictBoundary, DistrictIndex, parse_boundaries};

    use super::*;
    use crate::test_support::{MockProvider, geocoder, polling_place};

    fn rect(id: &str, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> DistrictBoundary {
        let text = serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "district": id, "description": format!("City Council District {id}") },
                "geometry": { "type": "Polygon", "coordinates": [[
                    [min_lon, min_lat], [max_lon, min_lat], [max_lon, max_lat],
                    [min_lon, max_lat], [min_lon, min_lat]
                ]] }
            }]
        })
        .to_string();
        parse_boundaries(&text).unwrap().remove(0)
    }

    const ELECTION_COMMISSION: (f64, f64) = (35.0402, -85.2384);

    fn provider() -> Arc<MockProvider> {
        Arc::new(
            MockProvider::default()
                .with_place("700 River Terminal Rd", ELECTION_COMMISSION.0, ELECTION_COMMISSION.1)
                .with_place("1010 N Moore Rd", 35.0305, -85.2100)
                .with_place("5401 School Dr", 35.1282, -85.2380),
        )
    }

    fn reference() -> ReferenceData {
        let mut council_members = BTreeMap::new();
        council_members.insert(
            "6".to_string(),
            CouncilMember {
                district: "6".to_string(),
                name: "Carol Berz".to_string(),
                email: None,
                phone: None,
            },
        );

        ReferenceData {
            // District 6 covers the Election Commission, district 5 lies
            // east of it.
            districts: DistrictIndex::new(vec![
                rect("6", -85.26, 35.02, -85.22, 35.06),
                rect("5", -85.22, 35.02, -85.18, 35.06),
            ]),
            polling_places: vec![
                polling_place("Early Voting", "Election Commission", "700 River Terminal Rd", "37406"),
                polling_place("Early Voting", "Chris L. Ramsey Sr. Community Center", "1010 N Moore Rd", "37411"),
                PollingPlace {
                    city: "Hixson".to_string(),
                    zip: "37343".to_string(),
                    ..polling_place("Early Voting", "Hixson Community Center", "5401 School Dr", "37343")
                },
            ],
            council_members,
            candidates: candidates_2025().by_district(),
        }
    }

    fn lookup(provider: &Arc<MockProvider>) -> DistrictLookup {
        DistrictLookup::new(
            geocoder(provider),
            Arc::new(ReferenceStore::from_data(reference())),
        )
    }

    #[tokio::test]
    async fn end_to_end_election_commission() {
        let provider = provider();
        let lookup = lookup(&provider);

        let outcome = lookup.lookup_address("700 River Terminal Rd, 37406").await;
        let LookupOutcome::Found { info, .. } = &outcome else {
            panic!("expected a match, got {outcome:?}");
        };

        assert_eq!(info.district_number, "6");
        assert_eq!(info.district_description.as_deref(), Some("City Council District 6"));
        assert_eq!(info.polling_place, "Election Commission");
        assert_eq!(info.polling_address, "700 River Terminal Rd, Chattanooga, TN 37406");
        assert_eq!(info.precinct, "Early Voting");
        assert_eq!(info.council_member.as_ref().unwrap().name, "Carol Berz");
        assert_eq!(info.resolution, Some(ResolutionTier::Contained));
        assert_eq!(
            info.candidates.first().map(String::as_str),
            Some("Jenni Berz [Campaign Website](https://jenniberz.com/)")
        );
        assert_eq!(info.candidates.len(), 5);
        assert_eq!(outcome.user_message(), "Your district is District 6");
    }

    #[tokio::test]
    async fn rejected_zip_makes_no_geocoding_call() {
        let provider = provider();
        let lookup = lookup(&provider);

        let outcome = lookup.lookup_address("1 Main St, 90210").await;
        assert!(matches!(
            outcome,
            LookupOutcome::InvalidAddress {
                error: AddressError::OutsideServiceArea { .. }
            }
        ));
        assert!(outcome.user_message().contains("90210"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_address_is_not_found() {
        let provider = provider();
        let lookup = lookup(&provider);

        let outcome = lookup.lookup_address("1 Nowhere Ln, 37402").await;
        assert_eq!(outcome, LookupOutcome::AddressNotFound);
        assert!(outcome.user_message().contains("(423) 493-5100"));
        assert!(outcome.info().is_none());
    }

    #[tokio::test]
    async fn out_of_area_point_short_circuits() {
        let provider = provider();
        let lookup = lookup(&provider);

        // Nashville.
        let info = lookup
            .get_district_info(&Coordinate::new(36.1627, -86.7816))
            .await;
        assert_eq!(info, DistrictInfo::not_found());
        assert_eq!(info.district_number, DISTRICT_NOT_FOUND);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn point_outside_every_district_skips_polling_lookup() {
        let provider = provider();
        let lookup = lookup(&provider);

        // Inside the bounding box, far from both synthetic districts.
        let info = lookup.get_district_info(&Coordinate::new(35.18, -85.11)).await;
        assert!(!info.is_found());
        assert!(!info.has_polling_place());
        assert_eq!(provider.calls(), 0);

        let outcome = LookupOutcome::Found {
            coordinate: Coordinate::new(35.18, -85.11),
            info,
        };
        assert!(outcome.user_message().contains("vote@hamiltontn.gov"));
    }

    #[tokio::test]
    async fn repeated_lookups_are_stable_and_cached() {
        let provider = provider();
        let lookup = lookup(&provider);
        let coord = Coordinate::new(35.04, -85.20);

        let first = lookup.get_district_info(&coord).await;
        let calls = provider.calls();
        let second = lookup.get_district_info(&coord).await;

        assert_eq!(first, second);
        assert_eq!(first.district_number, "5");
        assert_eq!(first.polling_place, "Chris L. Ramsey Sr. Community Center");
        assert!(first.council_member.is_none());
        assert_eq!(provider.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_outage_is_retried_on_next_request() {
        let provider = provider();
        let lookup = lookup(&provider);
        let coord = Coordinate::new(35.04, -85.24);

        provider.set_outage(true);
        let during = lookup.get_district_info(&coord).await;
        assert_eq!(during.district_number, "6");
        assert_eq!(during.polling_place, NOT_FOUND);

        provider.set_outage(false);
        let calls = provider.calls();
        let after = lookup.get_district_info(&coord).await;
        assert!(provider.calls() > calls);
        assert_eq!(after.polling_place, "Election Commission");

        // Complete sheets are cached again.
        let calls = provider.calls();
        assert_eq!(lookup.get_district_info(&coord).await, after);
        assert_eq!(provider.calls(), calls);
    }

    #[tokio::test]
    async fn no_polling_places_leaves_sentinels() {
        let provider = Arc::new(MockProvider::default());
        let data = ReferenceData {
            polling_places: Vec::new(),
            ..reference()
        };
        let lookup = DistrictLookup::new(
            geocoder(&provider),
            Arc::new(ReferenceStore::from_data(data)),
        );

        let info = lookup.get_district_info(&Coordinate::new(35.04, -85.24)).await;
        assert_eq!(info.district_number, "6");
        assert_eq!(info.polling_place, NOT_FOUND);
        assert_eq!(info.precinct, NOT_FOUND);
        assert_eq!(info.polling_address, NOT_FOUND);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(LookupOutcome::InvalidAddress {
            error: AddressError::MissingZip,
        })
        .unwrap();
        assert_eq!(json["status"], "invalid_address");
        assert_eq!(json["error"], AddressError::MissingZip.to_string());

        let json = serde_json::to_value(LookupOutcome::AddressNotFound).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "address_not_found" }));
    }
}
