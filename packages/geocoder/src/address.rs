//! Address validation and normalization.
//!
//! Users type addresses in many shapes:
//! - `"700 River Terminal Rd, 37406"`
//! - `"700  river terminal rd chattanooga tn 37406-1234"`
//! - `"River Terminal Rd, 37406"` (no street number, rejected)
//!
//! [`check_address`] decides whether an address is worth geocoding and,
//! when it is not, which correction to ask the user for.
//! [`normalize_address`] turns an accepted address into a one-line query
//! that the geocoding provider resolves inside the service area.

use std::sync::LazyLock;

use chattanooga_vote_district_models::ServiceArea;
use regex::Regex;
use thiserror::Error;

/// Inputs longer than this are rejected outright, which keeps validation
/// cost bounded regardless of what is pasted into the form.
pub const MAX_ADDRESS_LEN: usize = 200;

/// Five-digit ZIP code, optionally followed by a ZIP+4 suffix.
static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{5})(?:-\d{4})?\b").expect("valid regex"));

/// Leading house number (optionally with a unit letter, e.g. "12B")
/// followed by a street name.
static STREET_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+[A-Za-z]?)\s+[A-Za-z0-9]").expect("valid regex"));

/// Why an address was rejected. The `Display` text is the correction hint
/// shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Nothing but whitespace was entered.
    #[error("Please enter your street address and ZIP code")]
    Empty,

    /// The input exceeds [`MAX_ADDRESS_LEN`].
    #[error("That address is too long; enter just the street address and ZIP code")]
    TooLong,

    /// No five-digit ZIP code was found.
    #[error("Include a 5-digit ZIP code (for example 37402)")]
    MissingZip,

    /// The ZIP code does not belong to the service area.
    #[error("ZIP code {zip} is not a Chattanooga ZIP code")]
    OutsideServiceArea {
        /// The ZIP code that was found.
        zip: String,
    },

    /// The address does not start with a house number.
    #[error("Start the address with a street number (for example 700 River Terminal Rd)")]
    MissingStreetNumber,
}

/// An address that passed [`check_address`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAddress {
    /// Whitespace-collapsed address text.
    pub text: String,
    /// Leading house number.
    pub street_number: String,
    /// Five-digit ZIP code.
    pub zip: String,
}

/// Checks that an address has a leading street number and a ZIP code
/// belonging to `area`.
///
/// When several five-digit tokens are present the last one is taken as the
/// ZIP, so five-digit house numbers do not shadow it.
///
/// # Errors
///
/// Returns the [`AddressError`] describing the first problem found.
pub fn check_address(address: &str, area: &ServiceArea) -> Result<ValidatedAddress, AddressError> {
    if address.len() > MAX_ADDRESS_LEN {
        return Err(AddressError::TooLong);
    }

    let text = collapse_whitespace(address);
    if text.is_empty() {
        return Err(AddressError::Empty);
    }

    let zip = ZIP_RE
        .captures_iter(&text)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(AddressError::MissingZip)?;

    if !area.contains_zip(&zip) {
        return Err(AddressError::OutsideServiceArea { zip });
    }

    let street_number = STREET_NUMBER_RE
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(AddressError::MissingStreetNumber)?;

    Ok(ValidatedAddress {
        text,
        street_number,
        zip,
    })
}

/// Returns `true` if the address is plausible for the Chattanooga service
/// area. Pure: the same input always gives the same answer.
#[must_use]
pub fn validate(address: &str) -> bool {
    check_address(address, &ServiceArea::CHATTANOOGA).is_ok()
}

/// Trims and collapses runs of whitespace to single spaces.
#[must_use]
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds the one-line geocoding query for an address, appending the
/// city and state when the user left them out.
///
/// An address that already names the state is taken to carry its own
/// locality (e.g. `"5401 School Dr, Hixson, TN 37343"`), so the service
/// city is only added when neither the city nor the state appears.
#[must_use]
pub fn normalize_address(address: &str, area: &ServiceArea) -> String {
    let mut query = collapse_whitespace(address);
    if query.is_empty() {
        return query;
    }

    let lower = query.to_lowercase();
    let has_city = lower.contains(&area.city.to_lowercase());
    let has_state = lower.contains(&area.state_name.to_lowercase())
        || lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| token.eq_ignore_ascii_case(area.state));

    if !has_city && !has_state {
        query.push_str(", ");
        query.push_str(area.city);
    }
    if !has_state {
        query.push_str(", ");
        query.push_str(area.state);
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA: ServiceArea = ServiceArea::CHATTANOOGA;

    #[test]
    fn accepts_street_and_zip() {
        let validated = check_address("700 River Terminal Rd, 37406", &AREA).unwrap();
        assert_eq!(validated.street_number, "700");
        assert_eq!(validated.zip, "37406");
        assert_eq!(validated.text, "700 River Terminal Rd, 37406");
    }

    #[test]
    fn accepts_zip_plus_four() {
        assert!(validate("1010 N Moore Rd, Chattanooga, TN 37411-2201"));
    }

    #[test]
    fn accepts_unit_letter_house_number() {
        assert!(validate("12B Vine St, 37403"));
    }

    #[test]
    fn five_digit_house_number_does_not_shadow_zip() {
        let validated = check_address("10001 Hixson Pike, 37415", &AREA).unwrap();
        assert_eq!(validated.zip, "37415");
        assert_eq!(validated.street_number, "10001");
    }

    #[test]
    fn rejects_missing_zip() {
        assert_eq!(
            check_address("700 River Terminal Rd", &AREA),
            Err(AddressError::MissingZip)
        );
    }

    #[test]
    fn rejects_zip_outside_service_area() {
        assert_eq!(
            check_address("1 Main St, 90210", &AREA),
            Err(AddressError::OutsideServiceArea {
                zip: "90210".to_string()
            })
        );
        // Regardless of street number presence.
        assert!(!validate("Main St, 90210"));
        assert!(!validate("37413"));
    }

    #[test]
    fn rejects_missing_street_number() {
        assert_eq!(
            check_address("River Terminal Rd, 37406", &AREA),
            Err(AddressError::MissingStreetNumber)
        );
        assert_eq!(
            check_address("37406", &AREA),
            Err(AddressError::MissingStreetNumber)
        );
    }

    #[test]
    fn rejects_empty_and_oversized_input() {
        assert_eq!(check_address("   ", &AREA), Err(AddressError::Empty));
        let long = format!("700 {} Rd, 37406", "A".repeat(MAX_ADDRESS_LEN));
        assert_eq!(check_address(&long, &AREA), Err(AddressError::TooLong));
    }

    #[test]
    fn validation_is_repeatable() {
        for addr in ["700 River Terminal Rd, 37406", "1 Main St, 90210", ""] {
            assert_eq!(validate(addr), validate(addr));
        }
    }

    #[test]
    fn hint_mentions_zip() {
        assert!(AddressError::MissingZip.to_string().contains("5-digit ZIP"));
    }

    #[test]
    fn normalizes_whitespace_and_appends_region() {
        assert_eq!(
            normalize_address("  700   River Terminal Rd,  37406 ", &AREA),
            "700 River Terminal Rd, 37406, Chattanooga, TN"
        );
    }

    #[test]
    fn keeps_existing_city_and_state() {
        assert_eq!(
            normalize_address("700 River Terminal Rd, Chattanooga, TN 37406", &AREA),
            "700 River Terminal Rd, Chattanooga, TN 37406"
        );
        assert_eq!(
            normalize_address("5401 School Dr, chattanooga tennessee", &AREA),
            "5401 School Dr, chattanooga tennessee"
        );
    }

    #[test]
    fn keeps_a_neighboring_city() {
        assert_eq!(
            normalize_address("5401 School Dr, Hixson, TN 37343", &AREA),
            "5401 School Dr, Hixson, TN 37343"
        );
    }

    #[test]
    fn state_must_be_a_whole_token() {
        // "Tn" inside "Station" is not the state.
        assert_eq!(
            normalize_address("1 Station St, Chattanooga", &AREA),
            "1 Station St, Chattanooga, TN"
        );
    }
}
