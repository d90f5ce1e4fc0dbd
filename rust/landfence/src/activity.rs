//! Field activity and health scoring.
//!
//! Aggregates water, expense, temperature and daily register records per field
//! into a 0-100 activity score plus "last seen" dates for dashboards.
//!
//! ## Scoring
//! - Status base: cultivated 35, thaka (leased) 25, available 20, anything else 10
//! - Water: 4 per record, up to 20
//! - Expenses: 3 per record, up to 15
//! - Temperature readings: 3 per record, up to 15
//! - Register entries: 2 per record, up to 15
//! - Recent activity (within the recency window): +10, never past 100
//!
//! The weights are a product heuristic kept for parity with existing
//! dashboards, not a derived model.
//!
//! ## Example
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use landfence::{compute_activity_at, ActivityConfig, Field, FieldStatus, GeoPoint, WaterRecord};
//!
//! let ring = vec![
//!     GeoPoint::new(31.50, 74.30),
//!     GeoPoint::new(31.50, 74.31),
//!     GeoPoint::new(31.51, 74.31),
//! ];
//! let field = Field::new("f1", "Canal Side", ring, FieldStatus::Cultivated).unwrap();
//! let water = vec![WaterRecord::new("f1", "2026-10-15", 45.0)];
//!
//! let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
//! let stats = compute_activity_at(now, &ActivityConfig::default(), &[field], &water, &[], &[], &[]);
//! assert_eq!(stats[0].activity_score, 35 + 4 + 10);
//! assert!(stats[0].has_recent_activity);
//! ```

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{LandfenceError, Result};
use crate::field::{Field, FieldStatus};
use crate::records::{ExpenseRecord, FieldRecord, RegisterEntry, TemperatureRecord, WaterRecord};

const WATER_POINTS: u32 = 4;
const WATER_CAP: u32 = 20;
const EXPENSE_POINTS: u32 = 3;
const EXPENSE_CAP: u32 = 15;
const TEMPERATURE_POINTS: u32 = 3;
const TEMPERATURE_CAP: u32 = 15;
const REGISTER_POINTS: u32 = 2;
const REGISTER_CAP: u32 = 15;
const RECENT_BONUS: u32 = 10;
const MAX_SCORE: u32 = 100;

/// Configuration for activity scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityConfig {
    /// A field whose latest record is at most this many days old counts as recently active.
    /// Default: 30
    pub recent_days: u32,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self { recent_days: 30 }
    }
}

impl ActivityConfig {
    /// Load a config from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.recent_days == 0 {
            return Err(LandfenceError::InvalidConfig {
                message: "recent_days must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Derived activity metrics for one field. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldActivityStats {
    pub field_id: String,
    pub field_name: String,
    pub area_acres: Option<f64>,
    pub status: FieldStatus,
    pub last_water_date: Option<String>,
    pub last_expense_date: Option<String>,
    pub last_register_date: Option<String>,
    pub last_temperature_date: Option<String>,
    pub water_count: u32,
    pub expense_count: u32,
    pub temp_record_count: u32,
    pub register_count: u32,
    #[serde(rename = "latestTempC")]
    pub latest_temp_c: Option<f64>,
    /// 0-100
    pub activity_score: u8,
    /// Any record within the recency window
    pub has_recent_activity: bool,
}

/// Record counts feeding the score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounts {
    pub water: u32,
    pub expenses: u32,
    pub temperatures: u32,
    pub register: u32,
}

/// Status contribution to the score.
pub fn status_base(status: &FieldStatus) -> u32 {
    match status {
        FieldStatus::Cultivated => 35,
        FieldStatus::Thaka => 25,
        FieldStatus::Available => 20,
        _ => 10,
    }
}

/// Composite activity score, always within 0..=100.
pub fn activity_score(status: &FieldStatus, counts: &RecordCounts, has_recent_activity: bool) -> u8 {
    let capped = |count: u32, points: u32, cap: u32| count.saturating_mul(points).min(cap);

    let mut score = status_base(status)
        + capped(counts.water, WATER_POINTS, WATER_CAP)
        + capped(counts.expenses, EXPENSE_POINTS, EXPENSE_CAP)
        + capped(counts.temperatures, TEMPERATURE_POINTS, TEMPERATURE_CAP)
        + capped(counts.register, REGISTER_POINTS, REGISTER_CAP);
    score = score.min(MAX_SCORE);

    if has_recent_activity {
        score = (score + RECENT_BONUS).min(MAX_SCORE);
    }

    score.min(MAX_SCORE) as u8
}

/// Compute activity stats for every field against the current time.
pub fn compute_activity(
    fields: &[Field],
    water_records: &[WaterRecord],
    expenses: &[ExpenseRecord],
    temperature_records: &[TemperatureRecord],
    register_entries: &[RegisterEntry],
) -> Vec<FieldActivityStats> {
    compute_activity_at(
        Utc::now(),
        &ActivityConfig::default(),
        fields,
        water_records,
        expenses,
        temperature_records,
        register_entries,
    )
}

/// Compute activity stats for every field as of `now`.
///
/// Output order follows `fields`. Records pointing at unknown fields are ignored.
///
/// `config` is used as given. Configs from outside the program should come
/// through [`ActivityConfig::from_json`] or [`ActivitySnapshot::compute_at`],
/// which validate; a zero window here only counts records dated at or after `now`.
pub fn compute_activity_at(
    now: DateTime<Utc>,
    config: &ActivityConfig,
    fields: &[Field],
    water_records: &[WaterRecord],
    expenses: &[ExpenseRecord],
    temperature_records: &[TemperatureRecord],
    register_entries: &[RegisterEntry],
) -> Vec<FieldActivityStats> {
    let start = Instant::now();
    let index = RecordIndex::build(water_records, expenses, temperature_records, register_entries);

    let stats: Vec<FieldActivityStats> = fields
        .iter()
        .map(|field| index.stats_for(field, now, config))
        .collect();

    debug!(
        "[Activity] Scored {} fields from {} records in {:?}",
        fields.len(),
        index.record_count,
        start.elapsed()
    );
    stats
}

/// Compute activity stats using parallel processing.
/// More efficient for large farms (> 1,000 fields).
#[cfg(feature = "parallel")]
pub fn compute_activity_parallel(
    now: DateTime<Utc>,
    config: &ActivityConfig,
    fields: &[Field],
    water_records: &[WaterRecord],
    expenses: &[ExpenseRecord],
    temperature_records: &[TemperatureRecord],
    register_entries: &[RegisterEntry],
) -> Vec<FieldActivityStats> {
    if fields.len() < 1_000 {
        // Fall back to sequential for small farms
        return compute_activity_at(
            now,
            config,
            fields,
            water_records,
            expenses,
            temperature_records,
            register_entries,
        );
    }

    let index = RecordIndex::build(water_records, expenses, temperature_records, register_entries);
    fields
        .par_iter()
        .map(|field| index.stats_for(field, now, config))
        .collect()
}

/// A full application snapshot, as exported by the field store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivitySnapshot {
    pub fields: Vec<Field>,
    pub water_records: Vec<WaterRecord>,
    pub expenses: Vec<ExpenseRecord>,
    pub temperature_records: Vec<TemperatureRecord>,
    pub daily_register: Vec<RegisterEntry>,
}

impl ActivitySnapshot {
    /// Parse a snapshot; missing collections are treated as empty.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Score the snapshot. Fails with `InvalidConfig` for an invalid config.
    pub fn compute_at(&self, now: DateTime<Utc>, config: &ActivityConfig) -> Result<Vec<FieldActivityStats>> {
        config.validate()?;
        Ok(compute_activity_at(
            now,
            config,
            &self.fields,
            &self.water_records,
            &self.expenses,
            &self.temperature_records,
            &self.daily_register,
        ))
    }
}

// ============================================================================
// Internals
// ============================================================================

/// Records grouped by field id, built once per computation.
struct RecordIndex<'a> {
    water: HashMap<&'a str, Vec<&'a WaterRecord>>,
    expenses: HashMap<&'a str, Vec<&'a ExpenseRecord>>,
    temperatures: HashMap<&'a str, Vec<&'a TemperatureRecord>>,
    register: HashMap<&'a str, Vec<&'a RegisterEntry>>,
    record_count: usize,
}

impl<'a> RecordIndex<'a> {
    fn build(
        water: &'a [WaterRecord],
        expenses: &'a [ExpenseRecord],
        temperatures: &'a [TemperatureRecord],
        register: &'a [RegisterEntry],
    ) -> Self {
        Self {
            water: group_by_field(water),
            expenses: group_by_field(expenses),
            temperatures: group_by_field(temperatures),
            register: group_by_field(register),
            record_count: water.len() + expenses.len() + temperatures.len() + register.len(),
        }
    }

    fn stats_for(&self, field: &Field, now: DateTime<Utc>, config: &ActivityConfig) -> FieldActivityStats {
        let id = field.id.as_str();
        let water = self.water.get(id).map(Vec::as_slice).unwrap_or_default();
        let expenses = self.expenses.get(id).map(Vec::as_slice).unwrap_or_default();
        let temperatures = self.temperatures.get(id).map(Vec::as_slice).unwrap_or_default();
        let register = self.register.get(id).map(Vec::as_slice).unwrap_or_default();

        let last_water = latest(water);
        let last_expense = latest(expenses);
        let last_temperature = latest(temperatures);
        let last_register = latest(register);

        let most_recent = [
            last_water.map(|r| r.date()),
            last_expense.map(|r| r.date()),
            last_register.map(|r| r.date()),
            last_temperature.map(|r| r.date()),
        ]
        .into_iter()
        .flatten()
        .max();

        let has_recent_activity = most_recent
            .and_then(|date| days_since(date, now))
            .map_or(false, |days| days <= config.recent_days as f64);

        let counts = RecordCounts {
            water: water.len() as u32,
            expenses: expenses.len() as u32,
            temperatures: temperatures.len() as u32,
            register: register.len() as u32,
        };

        FieldActivityStats {
            field_id: field.id.clone(),
            field_name: field.name.clone(),
            area_acres: field.area,
            status: field.status.clone(),
            last_water_date: last_water.map(|r| r.date.clone()),
            last_expense_date: last_expense.map(|r| r.date.clone()),
            last_register_date: last_register.map(|r| r.date.clone()),
            last_temperature_date: last_temperature.map(|r| r.date.clone()),
            water_count: counts.water,
            expense_count: counts.expenses,
            temp_record_count: counts.temperatures,
            register_count: counts.register,
            latest_temp_c: last_temperature.map(|r| r.temperature_c),
            activity_score: activity_score(&field.status, &counts, has_recent_activity),
            has_recent_activity,
        }
    }
}

fn group_by_field<R: FieldRecord>(records: &[R]) -> HashMap<&str, Vec<&R>> {
    let mut grouped: HashMap<&str, Vec<&R>> = HashMap::new();
    for record in records {
        grouped.entry(record.field_id()).or_default().push(record);
    }
    grouped
}

/// Record with the greatest ISO date; on equal dates the later record wins.
fn latest<'a, R: FieldRecord>(records: &[&'a R]) -> Option<&'a R> {
    records
        .iter()
        .copied()
        .reduce(|best, r| if r.date() >= best.date() { r } else { best })
}

/// Days between `date` and `now`; negative for future dates, `None` if unparseable.
///
/// Accepts RFC 3339 timestamps, naive date-times (taken as UTC) and plain
/// `YYYY-MM-DD` dates (midnight UTC).
fn days_since(date: &str, now: DateTime<Utc>) -> Option<f64> {
    let parsed = parse_record_date(date)?;
    Some((now - parsed).num_seconds() as f64 / 86_400.0)
}

fn parse_record_date(date: &str) -> Option<DateTime<Utc>> {
    let date = date.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
