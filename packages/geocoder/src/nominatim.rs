//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance allows **1 request per second** and requires a
//! `User-Agent` identifying the application. Every request waits on a
//! [`RequestThrottle`] sized from `rate_limit_ms` in the service TOML.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use chattanooga_vote_district_models::{BoundingBox, Coordinate};

use crate::throttle::RequestThrottle;
use crate::{GeocodeError, GeocodedAddress, GeocodingProvider};

/// Nominatim free-form search client.
pub struct NominatimProvider {
    client: reqwest::Client,
    base_url: String,
    country_code: String,
    throttle: RequestThrottle,
}

impl NominatimProvider {
    /// Builds a client with the given user agent and request timeout,
    /// sending at most one request per `rate_limit`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        country_code: &str,
        user_agent: &str,
        timeout: Duration,
        rate_limit: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| GeocodeError::Config {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            country_code: country_code.to_string(),
            throttle: RequestThrottle::new(rate_limit),
        })
    }
}

#[async_trait::async_trait]
impl GeocodingProvider for NominatimProvider {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        self.throttle.wait().await;
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("countrycodes", self.country_code.as_str()),
                ("format", "jsonv2"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        check_status(resp.status())?;

        let body: serde_json::Value = resp.json().await?;
        Ok(parse_response(&body)?.into_iter().next())
    }

    async fn suggest(
        &self,
        query: &str,
        viewbox: &BoundingBox,
        limit: usize,
    ) -> Result<Vec<GeocodedAddress>, GeocodeError> {
        let viewbox = format_viewbox(viewbox);
        let limit = limit.to_string();

        self.throttle.wait().await;
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("countrycodes", self.country_code.as_str()),
                ("viewbox", viewbox.as_str()),
                ("bounded", "1"),
                ("format", "jsonv2"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        check_status(resp.status())?;

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Maps non-success HTTP statuses to errors the retry loop understands.
fn check_status(status: reqwest::StatusCode) -> Result<(), GeocodeError> {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }
    if status.is_server_error() {
        return Err(GeocodeError::Unavailable {
            message: format!("HTTP {status}"),
        });
    }
    if status.is_client_error() {
        return Err(GeocodeError::Rejected {
            status: status.as_u16(),
        });
    }
    Ok(())
}

/// Nominatim `viewbox` parameter: `<left>,<top>,<right>,<bottom>`.
fn format_viewbox(bbox: &BoundingBox) -> String {
    format!(
        "{},{},{},{}",
        bbox.min_longitude, bbox.max_latitude, bbox.max_longitude, bbox.min_latitude
    )
}

/// Parses a Nominatim JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Vec<GeocodedAddress>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    results.iter().map(parse_result).collect()
}

fn parse_result(result: &serde_json::Value) -> Result<GeocodedAddress, GeocodeError> {
    let lat = result["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = result["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    Ok(GeocodedAddress {
        coordinate: Coordinate::new(lat, lon),
        matched_address: result["display_name"].as_str().map(String::from),
    })
}
