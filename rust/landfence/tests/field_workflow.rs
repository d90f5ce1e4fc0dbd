//! End-to-end field workflow tests.
//!
//! Tests the full pipeline: map clicks -> finished ring -> stored field ->
//! activity scores and dashboard totals.
//!
//! Run with: `cd rust/landfence && cargo test --test field_workflow`

use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use landfence::{
    area_of_ring, compute_activity_at, summarize_land, ActivityConfig, ActivitySnapshot,
    DrawConfig, DrawEvent, DrawSession, Field, FieldStatus, FieldStore, GeoPoint,
    MemoryFieldStore, Projection, ShapeMode, TemperatureRecord, WaterRecord, WebMercator,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Offset a point by meters (small distances only).
fn offset(origin: &GeoPoint, north_m: f64, east_m: f64) -> GeoPoint {
    let lat = origin.latitude + north_m / 111_319.9;
    let lng = origin.longitude + east_m / (111_319.9 * origin.latitude.to_radians().cos());
    GeoPoint::new(lat, lng)
}

// ============================================================================
// Test: Polygon drawn at street zoom
// ============================================================================

#[test]
fn test_draw_store_and_score_polygon() {
    init_logging();

    let origin = GeoPoint::new(31.4664, 74.0410);
    let projection = WebMercator::centered_on(&origin, 18.0, 1024.0, 768.0);

    let corners = [
        origin,
        offset(&origin, 0.0, 100.0),
        offset(&origin, 80.0, 100.0),
        offset(&origin, 80.0, 0.0),
    ];

    let mut session = DrawSession::new();
    session.start(ShapeMode::Polygon);

    let t0 = Instant::now();
    for (i, corner) in corners.iter().enumerate() {
        let at = t0 + Duration::from_secs(2 * i as u64);
        assert_eq!(session.click(*corner, ShapeMode::Polygon, &projection, at), DrawEvent::Continue);
    }
    assert_eq!(session.points().len(), 4);

    // A couple of meters from the start marker is a handful of pixels at z18
    let near_start = offset(&origin, 2.0, 2.0);
    let px = projection.project(&near_start).distance_to(&projection.project(&origin));
    assert!(px < DrawConfig::default().close_pixel_threshold);

    let ring = match session.click(near_start, ShapeMode::Polygon, &projection, t0 + Duration::from_secs(10)) {
        DrawEvent::Finished(ring) => ring,
        other => panic!("expected finished ring, got {:?}", other),
    };
    assert_eq!(ring, corners.to_vec());
    assert!(!session.is_active());

    // 100 m x 80 m = 8000 m^2 ~ 1.98 acres
    let acres = area_of_ring(&ring);
    assert!((acres - 8000.0 / 4046.86).abs() < 0.02, "got {}", acres);

    let mut store = MemoryFieldStore::new();
    let draft = Field::new("", "Tube Well Plot", ring, FieldStatus::Cultivated).unwrap();
    let field = store.create_field(draft).unwrap();
    assert_eq!(store.field_at(&offset(&origin, 40.0, 50.0)), Some(field.id.clone()));

    let now = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
    let water: Vec<WaterRecord> = (10..15)
        .map(|day| WaterRecord::new(field.id.clone(), format!("2026-10-{}", day), 45.0))
        .collect();
    let temps = vec![TemperatureRecord::new(field.id.clone(), "2026-10-15", 33.5)];

    let stats = compute_activity_at(
        now,
        &ActivityConfig::default(),
        &store.list_fields(),
        &water,
        &[],
        &temps,
        &[],
    );
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].activity_score, 35 + 20 + 3 + 10);
    assert_eq!(stats[0].latest_temp_c, Some(33.5));
    assert_eq!(stats[0].last_water_date.as_deref(), Some("2026-10-14"));
}

// ============================================================================
// Test: Rectangle shortcut
// ============================================================================

#[test]
fn test_rectangle_shortcut_into_summary() {
    init_logging();

    let a = GeoPoint::new(31.50, 74.30);
    let b = offset(&a, -120.0, 150.0);
    let projection = WebMercator::centered_on(&a, 17.0, 800.0, 600.0);

    let mut session = DrawSession::new();
    session.start(ShapeMode::Rectangle);
    let t0 = Instant::now();
    assert_eq!(session.click(a, ShapeMode::Rectangle, &projection, t0), DrawEvent::Continue);

    let ring = match session.click(b, ShapeMode::Rectangle, &projection, t0 + Duration::from_secs(1)) {
        DrawEvent::Finished(ring) => ring,
        other => panic!("expected rectangle, got {:?}", other),
    };
    assert_eq!(ring.len(), 4);

    let min_lat = ring.iter().map(|p| p.latitude).fold(f64::MAX, f64::min);
    let max_lng = ring.iter().map(|p| p.longitude).fold(f64::MIN, f64::max);
    assert_eq!(min_lat, b.latitude);
    assert_eq!(max_lng, b.longitude);

    let mut store = MemoryFieldStore::new();
    store
        .create_field(Field::new("rect", "Orchard", ring, FieldStatus::Thaka).unwrap())
        .unwrap();

    let summary = summarize_land(&store.list_fields(), &[]);
    assert_eq!(summary.total_fields, 1);
    assert!((summary.thaka_area - 18_000.0 / 4046.86).abs() < 0.05);
    assert_eq!(summary.cultivated_share, 0.0);
}

// ============================================================================
// Test: Saved snapshot round through the store
// ============================================================================

#[test]
fn test_snapshot_loads_into_store() {
    init_logging();

    let json = r#"{
        "fields": [
            {
                "id": "north",
                "name": "North",
                "coordinates": [
                    {"lat": 31.500, "lng": 74.300},
                    {"lat": 31.500, "lng": 74.302},
                    {"lat": 31.502, "lng": 74.302},
                    {"lat": 31.502, "lng": 74.300}
                ],
                "status": "cultivated",
                "createdAt": "2026-01-01T00:00:00Z",
                "updatedAt": "2026-01-01T00:00:00Z"
            },
            {
                "id": "broken",
                "name": "Broken",
                "coordinates": [{"lat": 31.0, "lng": 74.0}],
                "status": "available"
            }
        ],
        "expenses": [
            {"id": "e1", "fieldId": "north", "date": "2026-10-01", "category": "seeds", "amount": 2500}
        ],
        "dailyRegister": [
            {"id": "r1", "fieldId": "north", "date": "2026-10-02T06:30:00Z", "activity": "sowing"}
        ]
    }"#;

    let snapshot = ActivitySnapshot::from_json(json).unwrap();
    let mut store = MemoryFieldStore::new();
    assert_eq!(store.load_fields(snapshot.fields.clone()), 1);

    let north = store.get_field("north").unwrap();
    assert!(north.area.unwrap() > 0.0);

    let now = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap();
    let stats = snapshot.compute_at(now, &ActivityConfig::default()).unwrap();
    let north_stats = stats.iter().find(|s| s.field_id == "north").unwrap();
    assert_eq!(north_stats.expense_count, 1);
    assert_eq!(north_stats.register_count, 1);
    assert_eq!(north_stats.activity_score, 35 + 3 + 2 + 10);

    let summary = summarize_land(&store.list_fields(), &snapshot.expenses);
    assert_eq!(summary.total_expenses, 2500.0);
    assert!((summary.cultivated_share - 100.0).abs() < 1e-9);
}
