//! Whole-farm totals for the dashboard header.

use serde::{Deserialize, Serialize};

use crate::field::{Field, FieldStatus};
use crate::records::ExpenseRecord;

/// Land and spending totals across all fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandSummary {
    pub total_fields: usize,
    /// Acres
    pub total_area: f64,
    pub cultivated_area: f64,
    pub available_area: f64,
    pub uncultivated_area: f64,
    pub not_usable_area: f64,
    pub thaka_area: f64,
    pub total_expenses: f64,
    /// Cultivated area as a percentage of total area; 0 when there is no area.
    pub cultivated_share: f64,
}

/// Sum areas per status and expense amounts.
///
/// Fields without a stored area use their ring's computed area. Fields with an
/// unrecognized status count toward the total only.
pub fn summarize_land(fields: &[Field], expenses: &[ExpenseRecord]) -> LandSummary {
    let mut summary = LandSummary {
        total_fields: fields.len(),
        ..Default::default()
    };

    for field in fields {
        let acres = field.area_acres();
        summary.total_area += acres;
        match &field.status {
            FieldStatus::Cultivated => summary.cultivated_area += acres,
            FieldStatus::Available => summary.available_area += acres,
            FieldStatus::Uncultivated => summary.uncultivated_area += acres,
            FieldStatus::NotUsable => summary.not_usable_area += acres,
            FieldStatus::Thaka => summary.thaka_area += acres,
            FieldStatus::Other(_) => {}
        }
    }

    summary.total_expenses = expenses.iter().map(|e| e.amount).sum();
    if summary.total_area > 0.0 {
        summary.cultivated_share = summary.cultivated_area / summary.total_area * 100.0;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::square_from_center_and_area;
    use crate::GeoPoint;

    fn field(id: &str, status: FieldStatus, acres: f64) -> Field {
        let ring = square_from_center_and_area(&GeoPoint::new(31.5, 74.35), acres).to_vec();
        Field::new(id, id, ring, status).unwrap().with_area(acres)
    }

    #[test]
    fn test_empty_farm() {
        let summary = summarize_land(&[], &[]);
        assert_eq!(summary, LandSummary::default());
        assert_eq!(summary.cultivated_share, 0.0);
    }

    #[test]
    fn test_totals_by_status() {
        let fields = vec![
            field("a", FieldStatus::Cultivated, 6.0),
            field("b", FieldStatus::Cultivated, 2.0),
            field("c", FieldStatus::Available, 4.0),
            field("d", FieldStatus::Thaka, 3.0),
            field("e", FieldStatus::NotUsable, 1.0),
            field("f", FieldStatus::Uncultivated, 4.0),
        ];
        let expenses = vec![
            ExpenseRecord::new("a", "2026-10-01", 1200.0),
            ExpenseRecord::new("c", "2026-10-02", 300.5),
        ];

        let summary = summarize_land(&fields, &expenses);
        assert_eq!(summary.total_fields, 6);
        assert_eq!(summary.total_area, 20.0);
        assert_eq!(summary.cultivated_area, 8.0);
        assert_eq!(summary.available_area, 4.0);
        assert_eq!(summary.thaka_area, 3.0);
        assert_eq!(summary.not_usable_area, 1.0);
        assert_eq!(summary.uncultivated_area, 4.0);
        assert_eq!(summary.total_expenses, 1500.5);
        assert!((summary.cultivated_share - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_area_falls_back_to_ring() {
        let ring = square_from_center_and_area(&GeoPoint::new(31.5, 74.35), 5.0).to_vec();
        let mut f = Field::new("a", "a", ring, FieldStatus::Available).unwrap();
        f.area = None;

        let summary = summarize_land(&[f], &[]);
        assert!((summary.total_area - 5.0).abs() < 0.05);
        assert_eq!(summary.cultivated_share, 0.0);
    }
}
