//! Compile-time candidate registry.
//!
//! The ballot is fixed for an election cycle, so candidates live in a TOML
//! file under `candidates/` that is embedded at compile time with
//! `include_str!()` and parsed on first access.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chattanooga_vote_district_models::{Candidate, normalize_district_id};
use serde::Deserialize;

/// A parsed candidate registry file.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateRegistry {
    /// Election the registry describes.
    pub election: String,
    /// Candidates in ballot order.
    pub candidates: Vec<Candidate>,
}

impl CandidateRegistry {
    /// Parses a registry from TOML, normalizing district labels.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text is malformed.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let mut registry: Self = toml::de::from_str(text)?;
        registry.candidates.retain_mut(|c| {
            if let Some(id) = normalize_district_id(&c.district) {
                c.district = id;
                true
            } else {
                log::warn!("Dropping candidate {} with no district", c.name);
                false
            }
        });
        Ok(registry)
    }

    /// Candidates grouped by district, each group in ballot order.
    #[must_use]
    pub fn by_district(&self) -> BTreeMap<String, Vec<Candidate>> {
        let mut map: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();
        for candidate in &self.candidates {
            map.entry(candidate.district.clone())
                .or_default()
                .push(candidate.clone());
        }
        map
    }
}

// ── Compile-time embedded TOML file ─────────────────────────────────

const CANDIDATES_2025_TOML: &str = include_str!("../candidates/2025.toml");

static CANDIDATES_2025: LazyLock<CandidateRegistry> = LazyLock::new(|| {
    CandidateRegistry::from_toml(CANDIDATES_2025_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded candidate registry: {e}"))
});

/// Returns the embedded 2025 city council candidate registry.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (this is a compile-time
/// guarantee since the registry is embedded).
#[must_use]
pub fn candidates_2025() -> &'static CandidateRegistry {
    &CANDIDATES_2025
}
