use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chattanooga_vote_district_models::{BoundingBox, Coordinate, PollingPlace, ServiceArea};
use chattanooga_vote_geocoder::retry::RetryPolicy;
use chattanooga_vote_geocoder::{GeocodeError, GeocodedAddress, Geocoder, GeocodingProvider};

/// Provider that answers from a fixed street table and counts calls.
#[derive(Default)]
pub struct MockProvider {
    /// `(street prefix, coordinate)`; a query matches when it starts with
    /// the prefix.
    places: Vec<(String, Coordinate)>,
    pub geocode_calls: AtomicUsize,
    /// While set, every geocode fails with HTTP 503.
    pub outage: AtomicBool,
    queries: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn with_place(mut self, street: &str, latitude: f64, longitude: f64) -> Self {
        self.places
            .push((street.to_string(), Coordinate::new(latitude, longitude)));
        self
    }

    pub fn calls(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }

    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl GeocodingProvider for MockProvider {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        if self.outage.load(Ordering::SeqCst) {
            return Err(GeocodeError::Unavailable {
                message: "HTTP 503".to_string(),
            });
        }
        Ok(self
            .places
            .iter()
            .find(|(street, _)| query.starts_with(street.as_str()))
            .map(|(street, coordinate)| GeocodedAddress {
                coordinate: *coordinate,
                matched_address: Some(street.clone()),
            }))
    }

    async fn suggest(
        &self,
        _query: &str,
        _viewbox: &BoundingBox,
        _limit: usize,
    ) -> Result<Vec<GeocodedAddress>, GeocodeError> {
        Ok(Vec::new())
    }
}

pub fn geocoder(provider: &Arc<MockProvider>) -> Arc<Geocoder> {
    let provider: Arc<dyn GeocodingProvider> = Arc::clone(provider) as Arc<dyn GeocodingProvider>;
    Arc::new(Geocoder::new(
        provider,
        ServiceArea::CHATTANOOGA,
        RetryPolicy::DEFAULT,
        Duration::from_secs(3600),
    ))
}

pub fn polling_place(precinct: &str, name: &str, street: &str, zip: &str) -> PollingPlace {
    PollingPlace {
        precinct: precinct.to_string(),
        location_name: name.to_string(),
        address: street.to_string(),
        city: "Chattanooga".to_string(),
        state: "TN".to_string(),
        zip: zip.to_string(),
    }
}
