#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reference data behind district lookups.
//!
//! Bundles the council district boundaries, polling places, sitting
//! council members, and the embedded candidate registry into one
//! immutable [`ReferenceData`] value. [`ReferenceStore`] hands out shared
//! snapshots of it and reloads from disk once the snapshot is older than
//! its TTL.
//!
//! A missing or unreadable file never fails the store: that source is
//! logged and left empty, and lookups degrade to "not found". On a
//! refresh, a source that fails to reload keeps its previous contents.

pub mod candidates;
pub mod csv_data;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chattanooga_vote_district_models::{Candidate, CouncilMember, PollingPlace};
use chattanooga_vote_spatial::DistrictIndex;
use thiserror::Error;

/// How long a loaded snapshot is served before it is reloaded.
pub const REFERENCE_TTL: Duration = Duration::from_secs(60 * 60);

pub const BOUNDARIES_FILE: &str = "district_boundaries.geojson";
pub const POLLING_PLACES_FILE: &str = "polling_places.csv";
pub const COUNCIL_MEMBERS_FILE: &str = "council_members.csv";

/// Errors from loading reference files.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Locations of the on-disk reference files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePaths {
    pub boundaries: PathBuf,
    pub polling_places: PathBuf,
    pub council_members: PathBuf,
}

impl ReferencePaths {
    /// The standard file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            boundaries: dir.join(BOUNDARIES_FILE),
            polling_places: dir.join(POLLING_PLACES_FILE),
            council_members: dir.join(COUNCIL_MEMBERS_FILE),
        }
    }
}

/// One consistent snapshot of every reference source.
pub struct ReferenceData {
    pub districts: DistrictIndex,
    /// In file order.
    pub polling_places: Vec<PollingPlace>,
    pub council_members: BTreeMap<String, CouncilMember>,
    /// Grouped by district, ballot order within each group.
    pub candidates: BTreeMap<String, Vec<Candidate>>,
}

impl ReferenceData {
    /// Reference data with no boundaries, polling places, or council
    /// members, and the embedded candidates.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            districts: DistrictIndex::empty(),
            polling_places: Vec::new(),
            council_members: BTreeMap::new(),
            candidates: candidates::candidates_2025().by_district(),
        }
    }

    /// Loads every source, leaving any source that fails to load empty.
    #[must_use]
    pub fn load(paths: &ReferencePaths) -> Self {
        Self::load_with_fallback(paths, None)
    }

    /// Reloads every source, keeping `previous`'s copy of any source that
    /// fails to load.
    #[must_use]
    pub fn reload(paths: &ReferencePaths, previous: &Self) -> Self {
        Self::load_with_fallback(paths, Some(previous))
    }

    fn load_with_fallback(paths: &ReferencePaths, previous: Option<&Self>) -> Self {
        let districts = DistrictIndex::load(&paths.boundaries).unwrap_or_else(|e| {
            log::error!(
                "Failed to load district boundaries from {}: {e}",
                paths.boundaries.display()
            );
            previous.map_or_else(DistrictIndex::empty, |p| {
                keep_previous("district boundaries", p.districts.len());
                p.districts.clone()
            })
        });

        let polling_places =
            csv_data::load_polling_places(&paths.polling_places).unwrap_or_else(|e| {
                log::error!("Failed to load polling places: {e}");
                previous.map_or_else(Vec::new, |p| {
                    keep_previous("polling places", p.polling_places.len());
                    p.polling_places.clone()
                })
            });

        let council_members =
            csv_data::load_council_members(&paths.council_members).unwrap_or_else(|e| {
                log::error!("Failed to load council members: {e}");
                previous.map_or_else(BTreeMap::new, |p| {
                    keep_previous("council members", p.council_members.len());
                    p.council_members.clone()
                })
            });

        Self {
            districts,
            polling_places,
            council_members,
            candidates: candidates::candidates_2025().by_district(),
        }
    }

    #[must_use]
    pub fn council_member(&self, district: &str) -> Option<&CouncilMember> {
        self.council_members.get(district)
    }

    /// Candidates on the ballot for `district`, empty if none.
    #[must_use]
    pub fn candidates_for(&self, district: &str) -> &[Candidate] {
        self.candidates
            .get(district)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn keep_previous(source: &str, count: usize) {
    if count > 0 {
        log::warn!("Keeping {count} previously loaded {source}");
    }
}

struct Snapshot {
    data: Arc<ReferenceData>,
    loaded_at: Instant,
}

/// Shared, periodically refreshed [`ReferenceData`].
///
/// Readers get an `Arc` to a complete snapshot; a refresh swaps in a new
/// snapshot without disturbing readers holding the old one.
pub struct ReferenceStore {
    paths: Option<ReferencePaths>,
    ttl: Duration,
    current: RwLock<Snapshot>,
}

impl ReferenceStore {
    /// Loads reference data from `paths`, reloading after `ttl`.
    #[must_use]
    pub fn load(paths: ReferencePaths, ttl: Duration) -> Self {
        let data = ReferenceData::load(&paths);
        Self {
            paths: Some(paths),
            ttl,
            current: RwLock::new(Snapshot {
                data: Arc::new(data),
                loaded_at: Instant::now(),
            }),
        }
    }

    /// Wraps fixed data that is never reloaded.
    #[must_use]
    pub fn from_data(data: ReferenceData) -> Self {
        Self {
            paths: None,
            ttl: Duration::MAX,
            current: RwLock::new(Snapshot {
                data: Arc::new(data),
                loaded_at: Instant::now(),
            }),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The current snapshot, reloading first if it has expired.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ReferenceData> {
        {
            let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
            if self.paths.is_none() || current.loaded_at.elapsed() < self.ttl {
                return Arc::clone(&current.data);
            }
        }
        self.refresh()
    }

    /// Reloads from disk now. Stores built with [`Self::from_data`] return
    /// their fixed data.
    pub fn refresh(&self) -> Arc<ReferenceData> {
        let Some(paths) = &self.paths else {
            return Arc::clone(
                &self
                    .current
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .data,
            );
        };

        log::info!("Refreshing reference data");
        let previous = Arc::clone(
            &self
                .current
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .data,
        );
        let data = Arc::new(ReferenceData::reload(paths, &previous));

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Snapshot {
            data: Arc::clone(&data),
            loaded_at: Instant::now(),
        };
        data
    }
}
