//! Nearest polling place by great-circle distance.

use std::sync::Arc;

use chattanooga_vote_district_models::{Coordinate, PollingPlace};
use chattanooga_vote_geocoder::Geocoder;
use chattanooga_vote_spatial::distance::haversine_km;

/// The closest polling place to a query point.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestPollingPlace {
    pub place: PollingPlace,
    /// Where the polling place geocoded to.
    pub coordinate: Coordinate,
    pub distance_km: f64,
}

/// Finds the nearest polling place, geocoding each location's address
/// through the shared (cached) [`Geocoder`].
///
/// Locations are geocoded with their own city, state, and ZIP, so sites
/// outside the city limits (Hixson, East Ridge) are queried as written.
pub struct PollingPlaceLocator {
    geocoder: Arc<Geocoder>,
}

impl PollingPlaceLocator {
    #[must_use]
    pub const fn new(geocoder: Arc<Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Returns the candidate with the smallest haversine distance to
    /// `coord`. Candidates that fail to geocode are skipped; ties keep
    /// the earlier candidate.
    ///
    /// Returns `None` only if no candidate could be geocoded.
    pub async fn find_nearest(
        &self,
        coord: &Coordinate,
        candidates: &[PollingPlace],
    ) -> Option<NearestPollingPlace> {
        let mut best: Option<NearestPollingPlace> = None;

        // Sequential; the provider throttles to its request rate.
        for place in candidates {
            let address = place.full_address();
            let Some(location) = self.geocoder.geocode_exact(&address).await else {
                log::warn!(
                    "Could not geocode polling place {} ({address}); skipping",
                    place.location_name
                );
                continue;
            };

            let distance_km = haversine_km(coord, &location);
            if best.as_ref().is_none_or(|b| distance_km < b.distance_km) {
                best = Some(NearestPollingPlace {
                    place: place.clone(),
                    coordinate: location,
                    distance_km,
                });
            }
        }

        if best.is_none() && !candidates.is_empty() {
            log::warn!(
                "None of {} polling places could be geocoded",
                candidates.len()
            );
        }
        best
    }
}
