//! Time-stamped operational records kept against a field.
//!
//! The scoring engine only needs the field reference and the ISO date of each
//! record, exposed through [`FieldRecord`]. Payload fields are carried so the
//! same types can load the application's JSON snapshots directly.

use serde::{Deserialize, Serialize};

/// Common view over every record kind: which field, and when.
pub trait FieldRecord {
    /// Id of the field this record belongs to.
    fn field_id(&self) -> &str;
    /// ISO 8601 date or date-time string.
    fn date(&self) -> &str;
}

/// An irrigation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterRecord {
    #[serde(default)]
    pub id: String,
    pub field_id: String,
    pub date: String,
    #[serde(default)]
    pub duration_minutes: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Money spent on a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    #[serde(default)]
    pub id: String,
    pub field_id: String,
    pub date: String,
    /// seeds, fertilizer, labor, water, fencing, equipment, other
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A temperature reading for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureRecord {
    #[serde(default)]
    pub id: String,
    pub field_id: String,
    pub date: String,
    #[serde(rename = "temperatureC")]
    pub temperature_c: f64,
    #[serde(default, rename = "minTempC", skip_serializing_if = "Option::is_none")]
    pub min_temp_c: Option<f64>,
    #[serde(default, rename = "maxTempC", skip_serializing_if = "Option::is_none")]
    pub max_temp_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A daily activity register entry (sowing, spraying, harvesting, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEntry {
    #[serde(default)]
    pub id: String,
    pub field_id: String,
    pub date: String,
    #[serde(default)]
    pub activity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labor_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

macro_rules! impl_field_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldRecord for $ty {
                fn field_id(&self) -> &str {
                    &self.field_id
                }

                fn date(&self) -> &str {
                    &self.date
                }
            }
        )*
    };
}

impl_field_record!(WaterRecord, ExpenseRecord, TemperatureRecord, RegisterEntry);

impl WaterRecord {
    pub fn new(field_id: impl Into<String>, date: impl Into<String>, duration_minutes: f64) -> Self {
        Self {
            id: String::new(),
            field_id: field_id.into(),
            date: date.into(),
            duration_minutes,
            notes: None,
        }
    }
}

impl ExpenseRecord {
    pub fn new(field_id: impl Into<String>, date: impl Into<String>, amount: f64) -> Self {
        Self {
            id: String::new(),
            field_id: field_id.into(),
            date: date.into(),
            category: "other".to_string(),
            amount,
            description: None,
        }
    }
}

impl TemperatureRecord {
    pub fn new(field_id: impl Into<String>, date: impl Into<String>, temperature_c: f64) -> Self {
        Self {
            id: String::new(),
            field_id: field_id.into(),
            date: date.into(),
            temperature_c,
            min_temp_c: None,
            max_temp_c: None,
            notes: None,
        }
    }
}

impl RegisterEntry {
    pub fn new(field_id: impl Into<String>, date: impl Into<String>, activity: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            field_id: field_id.into(),
            date: date.into(),
            activity: activity.into(),
            labor_cost: None,
            water_minutes: None,
            notes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_json_keys() {
        let json = r#"{"id":"t1","fieldId":"f1","date":"2026-10-01","temperatureC":31.5,"maxTempC":38.0}"#;
        let record: TemperatureRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.field_id(), "f1");
        assert_eq!(record.temperature_c, 31.5);
        assert_eq!(record.max_temp_c, Some(38.0));
        assert!(record.min_temp_c.is_none());
    }

    #[test]
    fn test_register_entry_ignores_unknown_payload() {
        let json = r#"{
            "id": "r1",
            "date": "2026-10-03",
            "fieldId": "f2",
            "activity": "spraying",
            "materialsUsed": [{"materialId": "m1", "quantity": 2}],
            "laborCost": 1500
        }"#;
        let entry: RegisterEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.date(), "2026-10-03");
        assert_eq!(entry.labor_cost, Some(1500.0));
    }
}
