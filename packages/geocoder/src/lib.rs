#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address validation and geocoding for council district lookups.
//!
//! Turns a free-text street address into a WGS84 [`Coordinate`]:
//!
//! 1. [`address::check_address`] rejects input without a street number or
//!    a service-area ZIP code before anything touches the network.
//! 2. [`Geocoder::geocode`] normalizes the address, asks the configured
//!    [`GeocodingProvider`] (Nominatim by default, see
//!    [`service_registry`]) with retry and exponential backoff on
//!    transient failures, and drops results outside the service-area
//!    bounding box.
//!
//! Results are cached per normalized address in a [`cache::TtlCache`], so
//! repeated lookups of the same polling place never re-issue the request.

pub mod address;
pub mod cache;
pub mod nominatim;
pub mod retry;
pub mod service_registry;
pub mod throttle;

use std::sync::Arc;
use std::time::Duration;

use chattanooga_vote_district_models::{BoundingBox, Coordinate, ServiceArea};
use thiserror::Error;

use crate::cache::TtlCache;
use crate::retry::RetryPolicy;
use crate::service_registry::{GeocodingService, ProviderConfig};

/// How many raw suggestions to request before filtering to the city.
const SUGGESTION_FETCH_LIMIT: usize = 10;

/// Minimum number of characters before suggestions are requested.
const MIN_SUGGESTION_CHARS: usize = 3;

/// A geocoding result with coordinates and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    pub coordinate: Coordinate,
    /// The matched/canonical address returned by the provider.
    pub matched_address: Option<String>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed for a reason other than a timeout or an
    /// unreachable host.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The request exceeded its timeout.
    #[error("Request timed out")]
    Timeout,

    /// The provider could not be reached or answered with a server error.
    #[error("Geocoding service unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The provider refused the request (HTTP 4xx other than 429).
    #[error("Geocoding request rejected with HTTP {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The service configuration cannot be used to build a client.
    #[error("Invalid geocoding configuration: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },
}

impl GeocodeError {
    /// Returns `true` if the failure is worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Unavailable { .. } | Self::RateLimited
        )
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Unavailable {
                message: e.to_string(),
            }
        } else {
            Self::Http(e)
        }
    }
}

/// A remote geocoding backend.
#[async_trait::async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Resolves a one-line address to its best match.
    ///
    /// Returns `Ok(None)` when the provider has no match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError>;

    /// Searches for up to `limit` matches restricted to `viewbox`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn suggest(
        &self,
        query: &str,
        viewbox: &BoundingBox,
        limit: usize,
    ) -> Result<Vec<GeocodedAddress>, GeocodeError>;
}

/// Service-area aware geocoder with retry and a per-address cache.
pub struct Geocoder {
    provider: Arc<dyn GeocodingProvider>,
    area: ServiceArea,
    retry: RetryPolicy,
    cache: TtlCache<String, Option<Coordinate>>,
    suggestion_limit: usize,
}

impl Geocoder {
    /// Wraps `provider` for the given service area.
    #[must_use]
    pub fn new(
        provider: Arc<dyn GeocodingProvider>,
        area: ServiceArea,
        retry: RetryPolicy,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            area,
            retry,
            cache: TtlCache::new(cache_ttl),
            suggestion_limit: 5,
        }
    }

    /// Builds a geocoder from a service definition.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the HTTP client cannot be built.
    pub fn from_service(service: &GeocodingService, area: ServiceArea) -> Result<Self, GeocodeError> {
        let provider: Arc<dyn GeocodingProvider> = match &service.provider {
            ProviderConfig::Nominatim {
                base_url,
                country_code,
                ..
            } => Arc::new(nominatim::NominatimProvider::new(
                base_url,
                country_code,
                &service.user_agent,
                service.timeout(),
                service.rate_limit(),
            )?),
        };

        log::info!(
            "Using geocoding service '{}' ({}) at {}",
            service.id,
            service.name,
            service.base_url()
        );

        Ok(
            Self::new(provider, area, service.retry_policy(), service.cache_ttl())
                .with_suggestion_limit(service.suggestion_limit),
        )
    }

    /// Caps the number of suggestions returned by [`Self::suggest`].
    #[must_use]
    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit;
        self
    }

    /// The service area results are checked against.
    #[must_use]
    pub const fn area(&self) -> &ServiceArea {
        &self.area
    }

    /// Converts an address into a coordinate inside the service area.
    ///
    /// Returns `None` when the provider has no match, when every attempt
    /// failed, or when the match falls outside the service-area bounding
    /// box (e.g. a same-named street in another state).
    pub async fn geocode(&self, address: &str) -> Option<Coordinate> {
        let query = address::normalize_address(address, &self.area);
        self.geocode_query(query).await
    }

    /// Geocodes a complete address as written (whitespace collapsed),
    /// without adding the service-area city or state.
    ///
    /// Used for reference addresses that already carry their own city,
    /// such as polling places outside the city limits. Results go through
    /// the same retry, bounding box check, and cache as [`Self::geocode`].
    pub async fn geocode_exact(&self, address: &str) -> Option<Coordinate> {
        self.geocode_query(address::collapse_whitespace(address)).await
    }

    async fn geocode_query(&self, query: String) -> Option<Coordinate> {
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = self.cache.get(&query) {
            log::debug!("Geocode cache hit for '{query}'");
            return cached;
        }

        match retry::with_retry(&self.retry, || self.provider.geocode(&query)).await {
            Ok(Some(found)) => {
                let accepted = if self.area.contains(&found.coordinate) {
                    Some(found.coordinate)
                } else {
                    log::warn!(
                        "Geocoded '{query}' to ({}, {}) outside the {} service area ({:?})",
                        found.coordinate.latitude,
                        found.coordinate.longitude,
                        self.area.city,
                        found.matched_address,
                    );
                    None
                };
                self.cache.insert(query, accepted);
                accepted
            }
            Ok(None) => {
                log::info!("No geocoding match for '{query}'");
                self.cache.insert(query, None);
                None
            }
            Err(e) => {
                // Not cached: a later request may find the service healthy.
                log::error!("Geocoding '{query}' failed: {e}");
                None
            }
        }
    }

    /// Returns up to the configured number of address suggestions for a
    /// partially typed address, restricted to the service area.
    ///
    /// Inputs shorter than three characters return nothing without a
    /// network call. Provider failures are logged and yield an empty list.
    pub async fn suggest(&self, partial: &str) -> Vec<String> {
        let partial = address::collapse_whitespace(partial);
        if partial.chars().count() < MIN_SUGGESTION_CHARS {
            return Vec::new();
        }

        let county_word = self
            .area
            .county
            .split_whitespace()
            .next()
            .unwrap_or(self.area.county)
            .to_lowercase();
        let query = if partial.to_lowercase().contains(&county_word) {
            partial
        } else {
            format!("{partial} {} {}", self.area.county, self.area.state)
        };

        let results = match self
            .provider
            .suggest(&query, &self.area.bounding_box, SUGGESTION_FETCH_LIMIT)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                log::warn!("Address suggestions for '{query}' failed: {e}");
                return Vec::new();
            }
        };

        let city = self.area.city.to_lowercase();
        results
            .into_iter()
            .filter_map(|r| r.matched_address)
            .filter(|addr| addr.to_lowercase().contains(&city))
            .take(self.suggestion_limit)
            .collect()
    }
}
