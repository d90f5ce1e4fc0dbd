//! Parcels ("fields") and their operational status.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{LandfenceError, Result};
use crate::geo_utils::{area_of_ring, centroid_of, parse_point_list, square_from_center_and_area};
use crate::{Bounds, GeoPoint};

/// Minimum number of boundary points for a parcel.
pub const MIN_RING_POINTS: usize = 3;

/// Operational state of a parcel.
///
/// Serialized as snake_case strings. A status this library does not know is
/// kept verbatim in [`FieldStatus::Other`] and written back unchanged, so one
/// odd record never blocks a whole snapshot or gets rewritten on save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldStatus {
    /// Crops currently growing
    Cultivated,
    /// Ready for planting
    #[default]
    Available,
    /// Bare earth, no current activity
    Uncultivated,
    /// Unsuitable for farming
    NotUsable,
    /// Leased to a tenant ("thaka"); `"leased"` is read as this too
    Thaka,
    /// Unrecognized status string
    Other(String),
}

impl FieldStatus {
    /// Wire value.
    pub fn as_str(&self) -> &str {
        match self {
            FieldStatus::Cultivated => "cultivated",
            FieldStatus::Available => "available",
            FieldStatus::Uncultivated => "uncultivated",
            FieldStatus::NotUsable => "not_usable",
            FieldStatus::Thaka => "thaka",
            FieldStatus::Other(raw) => raw,
        }
    }

    /// Human-readable label for dashboards.
    pub fn label(&self) -> &str {
        match self {
            FieldStatus::Cultivated => "Cultivated",
            FieldStatus::Available => "Available",
            FieldStatus::Uncultivated => "Uncultivated",
            FieldStatus::NotUsable => "Not Usable",
            FieldStatus::Thaka => "Thaka (Leased)",
            FieldStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for FieldStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "cultivated" => FieldStatus::Cultivated,
            "available" => FieldStatus::Available,
            "uncultivated" => FieldStatus::Uncultivated,
            "not_usable" => FieldStatus::NotUsable,
            "thaka" | "leased" => FieldStatus::Thaka,
            _ => FieldStatus::Other(raw),
        }
    }
}

impl From<FieldStatus> for String {
    fn from(status: FieldStatus) -> Self {
        match status {
            FieldStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A durable land parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub name: String,
    /// Boundary ring in drawing order
    pub coordinates: Vec<GeoPoint>,
    /// Area in acres (computed from the ring unless the owner overrode it)
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub status: FieldStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_usable_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    /// RFC 3339 creation time
    #[serde(default)]
    pub created_at: String,
    /// RFC 3339 last update time
    #[serde(default)]
    pub updated_at: String,
}

impl Field {
    /// Create a parcel from a finished ring.
    ///
    /// The area is computed from the ring. Fails with
    /// [`LandfenceError::InsufficientPoints`] when the ring has fewer than
    /// [`MIN_RING_POINTS`] points.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        coordinates: Vec<GeoPoint>,
        status: FieldStatus,
    ) -> Result<Self> {
        let id = id.into();
        if coordinates.len() < MIN_RING_POINTS {
            return Err(LandfenceError::InsufficientPoints {
                field_id: id,
                point_count: coordinates.len(),
                minimum_required: MIN_RING_POINTS,
            });
        }

        let now = chrono::Utc::now().to_rfc3339();
        let area = area_of_ring(&coordinates);
        Ok(Self {
            id,
            name: name.into(),
            coordinates,
            area: Some(area),
            status,
            not_usable_reason: None,
            address: None,
            location_name: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Replace the computed area with an owner-supplied value.
    pub fn with_area(mut self, acres: f64) -> Self {
        self.area = Some(acres);
        self
    }

    /// Attach address and location labels (typically from reverse geocoding).
    pub fn with_address(mut self, address: Option<String>, location_name: Option<String>) -> Self {
        self.address = address;
        self.location_name = location_name;
        self
    }

    /// Stored area, or the ring's computed area when none was stored.
    pub fn area_acres(&self) -> f64 {
        self.area.unwrap_or_else(|| area_of_ring(&self.coordinates))
    }

    /// Center of the boundary, `None` if the ring is empty.
    pub fn center(&self) -> Option<GeoPoint> {
        centroid_of(&self.coordinates)
    }

    /// Bounding box of the boundary.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.coordinates)
    }
}

/// Draft a field from typed coordinates (`lat,lng` per line or `;`-separated).
///
/// - One point: a square of `acres` centered on it. `acres` must be given and
///   positive; unlike [`square_from_center_and_area`] nothing is substituted.
/// - Two points: rejected with [`LandfenceError::InsufficientPoints`].
/// - Three or more: the points are the ring and the area is computed from it.
///
/// The draft has no id (the store assigns one) and status `Available`.
pub fn field_from_coordinates(text: &str, acres: Option<f64>, name: &str) -> Result<Field> {
    let mut points = parse_point_list(text);
    debug!("[Field] Parsed {} coordinates", points.len());

    match points.len() {
        0 => Err(LandfenceError::InvalidInput {
            message: "no valid coordinates, use lat,lng (e.g. 31.52, 74.35) or one per line".to_string(),
        }),
        1 => {
            let acres = acres
                .filter(|a| a.is_finite() && *a > 0.0)
                .ok_or_else(|| LandfenceError::InvalidInput {
                    message: "a single point needs an area in acres".to_string(),
                })?;
            let center = points.remove(0);
            let ring = square_from_center_and_area(&center, acres).to_vec();
            Ok(Field::new("", name, ring, FieldStatus::Available)?.with_area(acres))
        }
        _ => Field::new("", name, points, FieldStatus::Available),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::square_from_center_and_area;

    #[test]
    fn test_new_field_computes_area() {
        let ring = square_from_center_and_area(&GeoPoint::new(31.5, 74.35), 3.0).to_vec();
        let field = Field::new("f1", "North Plot", ring, FieldStatus::Cultivated).unwrap();

        assert!((field.area_acres() - 3.0).abs() < 0.03);
        assert_eq!(field.created_at, field.updated_at);
        assert!(!field.created_at.is_empty());
    }

    #[test]
    fn test_new_field_rejects_short_ring() {
        let ring = vec![GeoPoint::new(31.5, 74.35), GeoPoint::new(31.6, 74.36)];
        let err = Field::new("f1", "Line", ring, FieldStatus::Available).unwrap_err();
        assert!(matches!(
            err,
            LandfenceError::InsufficientPoints {
                point_count: 2,
                minimum_required: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_area_override() {
        let ring = square_from_center_and_area(&GeoPoint::new(31.5, 74.35), 3.0).to_vec();
        let field = Field::new("f1", "North Plot", ring, FieldStatus::Cultivated)
            .unwrap()
            .with_area(2.5);
        assert_eq!(field.area_acres(), 2.5);
    }

    #[test]
    fn test_status_deserialization() {
        let parse = |s: &str| serde_json::from_str::<FieldStatus>(&format!("\"{}\"", s)).unwrap();
        assert_eq!(parse("cultivated"), FieldStatus::Cultivated);
        assert_eq!(parse("not_usable"), FieldStatus::NotUsable);
        assert_eq!(parse("thaka"), FieldStatus::Thaka);
        assert_eq!(parse("leased"), FieldStatus::Thaka);
        assert_eq!(parse("flooded"), FieldStatus::Other("flooded".to_string()));
    }

    #[test]
    fn test_unknown_status_survives_round_trip() {
        let json = r#"{"id":"f1","name":"Low Plot","coordinates":[],"status":"flooded"}"#;
        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.status.label(), "flooded");

        let saved = serde_json::to_value(&field).unwrap();
        assert_eq!(saved["status"], "flooded");

        let known = serde_json::to_value(FieldStatus::NotUsable).unwrap();
        assert_eq!(known, "not_usable");
        let leased: FieldStatus = serde_json::from_str("\"leased\"").unwrap();
        assert_eq!(serde_json::to_value(leased).unwrap(), "thaka");
    }

    #[test]
    fn test_field_from_coordinates_without_points() {
        for text in ["", "north field", "31.5"] {
            assert!(matches!(
                field_from_coordinates(text, Some(2.0), "x"),
                Err(LandfenceError::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn test_field_from_single_coordinate() {
        let field = field_from_coordinates("31.52, 74.35", Some(2.5), "Well Plot").unwrap();
        assert_eq!(field.name, "Well Plot");
        assert_eq!(field.coordinates.len(), 4);
        assert_eq!(field.area, Some(2.5));
        assert_eq!(field.status, FieldStatus::Available);

        let center = field.center().unwrap();
        assert!((center.latitude - 31.52).abs() < 1e-9);
        assert!((center.longitude - 74.35).abs() < 1e-9);
        assert!((area_of_ring(&field.coordinates) - 2.5).abs() < 0.025);
    }

    #[test]
    fn test_single_coordinate_requires_area() {
        for acres in [None, Some(0.0), Some(-3.0), Some(f64::NAN)] {
            assert!(
                matches!(
                    field_from_coordinates("31.52, 74.35", acres, "x"),
                    Err(LandfenceError::InvalidInput { .. })
                ),
                "{:?}",
                acres
            );
        }
    }

    #[test]
    fn test_two_coordinates_rejected() {
        let err = field_from_coordinates("31.52, 74.35\n31.53, 74.36", Some(2.0), "x").unwrap_err();
        assert!(matches!(
            err,
            LandfenceError::InsufficientPoints {
                point_count: 2,
                minimum_required: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_ring_from_coordinates() {
        let text = "31.500, 74.300\n31.500, 74.302; 31.502, 74.302\n31.502, 74.300";
        let field = field_from_coordinates(text, Some(99.0), "Block B").unwrap();

        assert_eq!(field.coordinates.len(), 4);
        assert_eq!(field.coordinates[2], GeoPoint::new(31.502, 74.302));
        // Typed acres are ignored when the ring defines the area
        assert_eq!(field.area, Some(area_of_ring(&field.coordinates)));
        let center = field.center().unwrap();
        assert!((center.latitude - 31.501).abs() < 1e-9);
        assert!((center.longitude - 74.301).abs() < 1e-9);
    }

    #[test]
    fn test_status_display_uses_label() {
        assert_eq!(FieldStatus::Thaka.to_string(), "Thaka (Leased)");
        assert_eq!(FieldStatus::NotUsable.to_string(), "Not Usable");
        assert_eq!(FieldStatus::Other("fallow".to_string()).to_string(), "fallow");
    }

    #[test]
    fn test_field_from_app_json() {
        let json = r#"{
            "id": "abc",
            "name": "Canal Side",
            "coordinates": [
                {"lat": 31.50, "lng": 74.30},
                {"lat": 31.50, "lng": 74.31},
                {"lat": 31.51, "lng": 74.31}
            ],
            "status": "thaka",
            "locationName": "Raiwind, Lahore",
            "createdAt": "2026-01-02T00:00:00Z",
            "updatedAt": "2026-01-02T00:00:00Z"
        }"#;
        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.status, FieldStatus::Thaka);
        assert!(field.area.is_none());
        assert!(field.area_acres() > 0.0);
        assert_eq!(field.location_name.as_deref(), Some("Raiwind, Lahore"));
    }
}
