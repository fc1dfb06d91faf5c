//! Compile-time geocoding service configuration.
//!
//! The provider is defined in a TOML file under `services/`, embedded at
//! compile time and exposed via [`default_service`]. The base URL can be
//! pointed at a self-hosted instance with the
//! `CHATTANOOGA_VOTE_NOMINATIM_URL` environment variable (see
//! [`service_from_env`]).

use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;

/// Environment variable overriding the provider base URL.
pub const BASE_URL_ENV: &str = "CHATTANOOGA_VOTE_NOMINATIM_URL";

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// `User-Agent` header identifying this application to the provider.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// How long geocoding results stay cached, in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum number of address suggestions returned.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
    /// Retry budget for transient failures.
    pub retry: RetryConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Nominatim / `OpenStreetMap` geocoder.
    Nominatim {
        /// Search endpoint (e.g., `"https://nominatim.openstreetmap.org/search"`).
        base_url: String,
        /// ISO country code results are restricted to.
        country_code: String,
        /// Minimum delay between requests in milliseconds.
        rate_limit_ms: u64,
    },
}

/// Retry settings as written in TOML.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
}

const fn default_suggestion_limit() -> usize {
    5
}

impl GeocodingService {
    /// Returns the provider's base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Nominatim { base_url, .. } => base_url,
        }
    }

    /// Minimum spacing between requests to the provider.
    #[must_use]
    pub const fn rate_limit(&self) -> Duration {
        match &self.provider {
            ProviderConfig::Nominatim { rate_limit_ms, .. } => Duration::from_millis(*rate_limit_ms),
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_secs(self.retry.base_delay_secs),
            max_delay: Duration::from_secs(self.retry.max_delay_secs),
        }
    }

    /// Replaces the provider base URL.
    pub fn set_base_url(&mut self, url: String) {
        match &mut self.provider {
            ProviderConfig::Nominatim { base_url, .. } => *base_url = url,
        }
    }
}

// ── Compile-time embedded TOML file ─────────────────────────────────

const SERVICE_TOML: &str = include_str!("../services/nominatim.toml");

/// Returns the embedded geocoding service configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (this is a compile-time
/// guarantee since the config is embedded).
#[must_use]
pub fn default_service() -> GeocodingService {
    toml::de::from_str(SERVICE_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded geocoding service: {e}"))
}

/// Returns the embedded configuration with [`BASE_URL_ENV`] applied.
#[must_use]
pub fn service_from_env() -> GeocodingService {
    let mut service = default_service();
    if let Ok(url) = std::env::var(BASE_URL_ENV)
        && !url.trim().is_empty()
    {
        log::info!("Overriding geocoding base URL from {BASE_URL_ENV}: {url}");
        service.set_base_url(url.trim().to_string());
    }
    service
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_embedded_service() {
        let service = default_service();
        assert_eq!(service.id, "nominatim");
        assert_eq!(service.user_agent, "chattanooga_voting_info");
        assert!(!service.base_url().is_empty());
        assert_eq!(service.suggestion_limit, 5);
    }

    #[test]
    fn timeout_within_expected_range() {
        let timeout = default_service().timeout();
        assert!(timeout >= Duration::from_secs(10) && timeout <= Duration::from_secs(20));
    }

    #[test]
    fn public_nominatim_gets_one_request_per_second() {
        assert_eq!(default_service().rate_limit(), Duration::from_secs(1));
    }

    #[test]
    fn retry_policy_matches_defaults() {
        assert_eq!(default_service().retry_policy(), RetryPolicy::DEFAULT);
    }

    #[test]
    fn overrides_base_url() {
        let mut service = default_service();
        service.set_base_url("http://localhost:8080/search".to_string());
        assert_eq!(service.base_url(), "http://localhost:8080/search");
    }
}
