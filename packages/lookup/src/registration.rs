//! Voter registration check.
//!
//! Registration status lives in the state's voter lookup, which offers no
//! public API. This module checks the details a voter enters and, when
//! they are plausible, points them at the official lookup tool.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::ELECTION_COMMISSION_CONTACT;

/// Tennessee's official voter registration lookup.
pub const VOTER_LOOKUP_URL: &str = "https://tnmap.tn.gov/voterlookup/";

/// Election Commission office, for in-person help.
pub const ELECTION_COMMISSION_OFFICE: &str = "700 River Terminal Rd, Chattanooga, TN 37406";

pub const MIN_VOTING_AGE: u32 = 18;
pub const MAX_PLAUSIBLE_AGE: u32 = 120;

/// Letters, spaces, hyphens, and apostrophes.
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s\-']+$").expect("valid regex"));

/// Why registration details were rejected. The `Display` text is shown to
/// the voter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Please fill in all required fields")]
    MissingFields,

    #[error("Please enter valid names using only letters, spaces, hyphens, and apostrophes")]
    InvalidName,

    #[error("Invalid date of birth. You must be at least 18 years old to register to vote")]
    InvalidDateOfBirth,
}

/// Details that passed [`check_registration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationCheck {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
}

impl RegistrationCheck {
    /// Where to confirm registration, with Election Commission contacts.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "To check your voter registration status, visit the official Tennessee \
             voter lookup tool: {VOTER_LOOKUP_URL}\n\
             For assistance, contact the {ELECTION_COMMISSION_CONTACT}, or visit \
             their office at {ELECTION_COMMISSION_OFFICE}."
        )
    }
}

/// Returns `true` for a non-empty name of letters, spaces, hyphens, and
/// apostrophes.
#[must_use]
pub fn validate_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && NAME_RE.is_match(name)
}

/// Parses a `YYYY-MM-DD` birth date and checks the voter is between 18 and
/// 120 years old on `today`.
///
/// # Errors
///
/// Returns [`RegistrationError::InvalidDateOfBirth`] for unparseable dates,
/// future dates, and ages outside that range.
pub fn parse_date_of_birth(raw: &str, today: NaiveDate) -> Result<NaiveDate, RegistrationError> {
    let dob = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| RegistrationError::InvalidDateOfBirth)?;

    match today.years_since(dob) {
        Some(age) if (MIN_VOTING_AGE..=MAX_PLAUSIBLE_AGE).contains(&age) => Ok(dob),
        _ => Err(RegistrationError::InvalidDateOfBirth),
    }
}

/// Checks the details a voter entered before sending them to the state's
/// lookup tool.
///
/// # Errors
///
/// Returns the first [`RegistrationError`] found: missing fields, then
/// names, then date of birth.
pub fn check_registration(
    first_name: &str,
    last_name: &str,
    date_of_birth: &str,
    today: NaiveDate,
) -> Result<RegistrationCheck, RegistrationError> {
    if [first_name, last_name, date_of_birth]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(RegistrationError::MissingFields);
    }

    if !validate_name(first_name) || !validate_name(last_name) {
        return Err(RegistrationError::InvalidName);
    }

    let date_of_birth = parse_date_of_birth(date_of_birth, today)?;

    Ok(RegistrationCheck {
        first_name: first_name.trim().to_string(),
        last_name: last_name.trim().to_string(),
        date_of_birth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
    }

    #[test]
    fn accepts_valid_details() {
        let check = check_registration(" Mary-Ann ", "O'Neil", "1980-07-15", today()).unwrap();
        assert_eq!(check.first_name, "Mary-Ann");
        assert_eq!(check.last_name, "O'Neil");
        assert_eq!(check.date_of_birth, NaiveDate::from_ymd_opt(1980, 7, 15).unwrap());

        let message = check.message();
        assert!(message.contains(VOTER_LOOKUP_URL));
        assert!(message.contains("(423) 493-5100"));
        assert!(message.contains("700 River Terminal Rd"));
    }

    #[test]
    fn missing_fields_come_first() {
        assert_eq!(
            check_registration("", "Smith!", "not a date", today()),
            Err(RegistrationError::MissingFields)
        );
        assert_eq!(
            check_registration("Ann", "Lee", "  ", today()),
            Err(RegistrationError::MissingFields)
        );
    }

    #[test]
    fn rejects_names_with_digits_or_symbols() {
        assert!(!validate_name("R2D2"));
        assert!(!validate_name("Ann;"));
        assert!(!validate_name("   "));
        assert!(validate_name("De La Cruz"));
        assert_eq!(
            check_registration("Ann", "Lee3", "1980-01-01", today()),
            Err(RegistrationError::InvalidName)
        );
    }

    #[test]
    fn age_boundaries() {
        // 18th birthday today.
        assert!(parse_date_of_birth("2007-03-04", today()).is_ok());
        // 18th birthday tomorrow.
        assert!(parse_date_of_birth("2007-03-05", today()).is_err());
        assert!(parse_date_of_birth("1905-03-04", today()).is_ok());
        assert!(parse_date_of_birth("1904-03-03", today()).is_err());
    }

    #[test]
    fn rejects_bad_dates() {
        for raw in ["2030-01-01", "1980-02-30", "07/15/1980", "yesterday"] {
            assert_eq!(
                parse_date_of_birth(raw, today()),
                Err(RegistrationError::InvalidDateOfBirth),
                "{raw}"
            );
        }
    }
}
