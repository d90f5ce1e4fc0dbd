//! # Landfence
//!
//! Field geofencing and parcel activity scoring for land management.
//!
//! This library provides:
//! - Parcel area from a drawn boundary ring (acres), and the inverse square generator
//! - A polygon/rectangle draw engine driven by map clicks
//! - Per-field activity scores from water, expense, temperature and register records
//!
//! ## Features
//!
//! - **`parallel`** - Score large field sets with rayon
//! - **`http`** - Nominatim geocoding client
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use landfence::{area_of_ring, square_from_center_and_area, GeoPoint};
//!
//! let center = GeoPoint::new(31.5204, 74.3587);
//! let ring = square_from_center_and_area(&center, 2.0);
//!
//! let acres = area_of_ring(&ring);
//! assert!((acres - 2.0).abs() < 0.02);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{LandfenceError, OptionExt, Result};

// Geographic utilities (area, centroid, distance, parsing)
pub mod geo_utils;
pub use geo_utils::{
    area_of_ring, centroid_of, haversine_distance, parse_point_list, perimeter_of_ring,
    ring_contains, square_from_center_and_area,
};

// Parcels and their operational status
pub mod field;
pub use field::{field_from_coordinates, Field, FieldStatus, MIN_RING_POINTS};

// Time-stamped operational records
pub mod records;
pub use records::{ExpenseRecord, FieldRecord, RegisterEntry, TemperatureRecord, WaterRecord};

// Interactive polygon/rectangle drawing
pub mod draw;
pub use draw::{
    rectangle_from_corners, DrawConfig, DrawEvent, DrawSession, Projection, ScreenPoint, ShapeMode,
    WebMercator,
};

// Field activity/health scoring
pub mod activity;
#[cfg(feature = "parallel")]
pub use activity::compute_activity_parallel;
pub use activity::{
    activity_score, compute_activity, compute_activity_at, ActivityConfig, ActivitySnapshot,
    FieldActivityStats, RecordCounts,
};

// Dashboard totals
pub mod summary;
pub use summary::{summarize_land, LandSummary};

// Field store with spatial index
pub mod store;
pub use store::{with_field_store, FieldStore, MemoryFieldStore, StoreStats, FIELD_STORE};

// Geocoding collaborator and search-by-place field creation
pub mod geocode;
pub use geocode::{
    field_from_search, human_address, DetailedAddress, GeoResult, Geocoder, NominatimAddress,
    NominatimPlace,
};
#[cfg(feature = "http")]
pub use geocode::NominatimClient;

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate with latitude and longitude.
///
/// Serialized as `{ "lat": .., "lng": .. }` to match the map layer.
///
/// # Example
/// ```
/// use landfence::GeoPoint;
/// let point = GeoPoint::new(31.5204, 74.3587); // Lahore
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    ///
    /// The engines never call this themselves; device and geocoder output is
    /// trusted. It exists for callers that accept hand-typed coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from points.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Check whether a point lies inside (or on the edge of) the bounds.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }
}

// ============================================================================
// Tests
// ============================================================================
