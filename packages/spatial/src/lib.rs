#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory council district index and point-to-district resolution.
//!
//! Loads district polygons from a `GeoJSON` file at startup, builds an
//! R-tree over their bounding boxes, and answers "which district contains
//! this coordinate" with a tiered fallback:
//!
//! 1. Points outside the service-area bounding box are rejected outright.
//! 2. Exact point-in-polygon containment.
//! 3. Containment within a small buffer around each boundary, which
//!    absorbs geocoder jitter for addresses on a district line.
//! 4. The nearest district boundary, if it is close enough.
//!
//! Every tier breaks ties deterministically so the same coordinate always
//! resolves to the same district regardless of file order.

pub mod boundary;
pub mod distance;
pub mod redistricting;

use std::path::Path;

use chattanooga_vote_district_models::{
    BoundingBox, Coordinate, DistrictMetadata, ResolutionTier, ServiceArea, compare_district_ids,
};
use geo::{Contains, MultiPolygon, Point};
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

pub use boundary::{DistrictBoundary, parse_boundaries};

/// Errors from loading boundary data.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// CSV read error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input is well-formed but not shaped as expected.
    #[error("{message}")]
    Structure {
        /// What was wrong.
        message: String,
    },
}

/// Bounding box of one district, stored in the R-tree.
struct EnvelopeEntry {
    /// Position in [`DistrictIndex::districts`].
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for EnvelopeEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Tolerances for [`DistrictIndex::resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    /// Points outside this box never resolve.
    pub service_area: BoundingBox,
    /// Buffer around each boundary, in degrees (about 55 m at this
    /// latitude for the default).
    pub buffer_degrees: f64,
    /// Nearest-boundary fallback cutoff in kilometers.
    pub max_nearest_km: f64,
}

impl ResolverConfig {
    pub const DEFAULT: Self = Self {
        service_area: ServiceArea::CHATTANOOGA.bounding_box,
        buffer_degrees: 5e-4,
        max_nearest_km: 5.0,
    };
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Outcome of resolving a coordinate to a council district.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The point lies strictly inside the district.
    Contained { district: String },
    /// The point lies within the buffer of the district boundary.
    Buffered { district: String },
    /// No district contains the point; this is the closest one.
    Nearest { district: String, distance_km: f64 },
    /// Outside the service area or too far from every district.
    NotFound,
}

impl Resolution {
    #[must_use]
    pub fn district(&self) -> Option<&str> {
        match self {
            Self::Contained { district }
            | Self::Buffered { district }
            | Self::Nearest { district, .. } => Some(district),
            Self::NotFound => None,
        }
    }

    #[must_use]
    pub const fn tier(&self) -> Option<ResolutionTier> {
        match self {
            Self::Contained { .. } => Some(ResolutionTier::Contained),
            Self::Buffered { .. } => Some(ResolutionTier::Buffered),
            Self::Nearest { .. } => Some(ResolutionTier::Nearest),
            Self::NotFound => None,
        }
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// Council district polygons with an R-tree over their envelopes.
///
/// Built once and shared read-only across lookups.
pub struct DistrictIndex {
    /// Sorted by district id (numeric ids in numeric order).
    districts: Vec<DistrictBoundary>,
    tree: RTree<EnvelopeEntry>,
}

impl Clone for DistrictIndex {
    fn clone(&self) -> Self {
        Self::new(self.districts.clone())
    }
}

impl DistrictIndex {
    /// An index with no districts. Every point resolves to
    /// [`Resolution::NotFound`].
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Builds an index over the given boundaries.
    #[must_use]
    pub fn new(mut districts: Vec<DistrictBoundary>) -> Self {
        districts.sort_by(|a, b| compare_district_ids(&a.metadata.id, &b.metadata.id));

        let entries = districts
            .iter()
            .enumerate()
            .filter_map(|(index, d)| {
                compute_envelope(&d.polygon).map(|envelope| EnvelopeEntry { index, envelope })
            })
            .collect();

        Self {
            districts,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Parses a `GeoJSON` `FeatureCollection` into an index.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the text is not a `FeatureCollection`.
    pub fn from_geojson_str(geojson_str: &str) -> Result<Self, SpatialError> {
        Ok(Self::new(parse_boundaries(geojson_str)?))
    }

    /// Loads a boundary file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SpatialError> {
        let text = std::fs::read_to_string(path)?;
        let index = Self::from_geojson_str(&text)?;
        log::info!(
            "Loaded {} council districts from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Districts in id order.
    #[must_use]
    pub fn districts(&self) -> &[DistrictBoundary] {
        &self.districts
    }

    /// Metadata for a district, if present.
    #[must_use]
    pub fn get(&self, district: &str) -> Option<&DistrictMetadata> {
        self.districts
            .iter()
            .find(|d| d.metadata.id == district)
            .map(|d| &d.metadata)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.districts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    /// Resolves a coordinate to a council district.
    #[must_use]
    pub fn resolve(&self, coord: &Coordinate, config: &ResolverConfig) -> Resolution {
        if !coord.is_finite() || !config.service_area.contains(coord) {
            log::debug!(
                "({}, {}) is outside the service area",
                coord.latitude,
                coord.longitude
            );
            return Resolution::NotFound;
        }
        if self.districts.is_empty() {
            log::warn!("No district boundaries loaded; cannot resolve districts");
            return Resolution::NotFound;
        }

        let point = Point::new(coord.longitude, coord.latitude);

        if let Some(district) = self.contained(&point) {
            return Resolution::Contained { district };
        }
        if let Some(district) = self.buffered(&point, config.buffer_degrees) {
            return Resolution::Buffered { district };
        }
        self.nearest(coord, config.max_nearest_km)
    }

    fn contained(&self, point: &Point<f64>) -> Option<String> {
        let query = AABB::from_point([point.x(), point.y()]);

        let mut matches: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.index)
            .filter(|&i| self.districts[i].polygon.contains(point))
            .collect();
        matches.sort_unstable();

        let first = *matches.first()?;
        if matches.len() > 1 {
            log::warn!(
                "({}, {}) is inside overlapping districts {}; using {}",
                point.y(),
                point.x(),
                self.ids(&matches),
                self.districts[first].metadata.id
            );
        }
        Some(self.districts[first].metadata.id.clone())
    }

    fn buffered(&self, point: &Point<f64>, buffer: f64) -> Option<String> {
        let query = AABB::from_corners(
            [point.x() - buffer, point.y() - buffer],
            [point.x() + buffer, point.y() + buffer],
        );

        let mut matches: Vec<(f64, usize)> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .filter_map(|entry| {
                distance::closest_boundary_point(&self.districts[entry.index].polygon, point)
                    .map(|(_, degrees)| (degrees, entry.index))
            })
            .filter(|(degrees, _)| *degrees <= buffer)
            .collect();
        matches.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let (_, first) = *matches.first()?;
        if matches.len() > 1 {
            let indices: Vec<usize> = matches.iter().map(|(_, i)| *i).collect();
            log::warn!(
                "({}, {}) is within {buffer} degrees of districts {}; using {}",
                point.y(),
                point.x(),
                self.ids(&indices),
                self.districts[first].metadata.id
            );
        }
        Some(self.districts[first].metadata.id.clone())
    }

    fn nearest(&self, coord: &Coordinate, max_km: f64) -> Resolution {
        let closest = self
            .districts
            .iter()
            .enumerate()
            .filter_map(|(i, d)| distance::boundary_distance_km(&d.polygon, coord).map(|km| (km, i)))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        match closest {
            Some((distance_km, i)) if distance_km <= max_km => {
                let district = self.districts[i].metadata.id.clone();
                log::info!(
                    "({}, {}) is outside every district; nearest is {district} at {distance_km:.2} km",
                    coord.latitude,
                    coord.longitude
                );
                Resolution::Nearest {
                    district,
                    distance_km,
                }
            }
            Some((distance_km, i)) => {
                log::info!(
                    "({}, {}) is {distance_km:.2} km from the nearest district ({}); not assigning",
                    coord.latitude,
                    coord.longitude,
                    self.districts[i].metadata.id
                );
                Resolution::NotFound
            }
            None => Resolution::NotFound,
        }
    }

    fn ids(&self, indices: &[usize]) -> String {
        indices
            .iter()
            .map(|&i| self.districts[i].metadata.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    use geo::BoundingRect;

    mp.bounding_rect().map(|rect| {
        AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
    })
}
