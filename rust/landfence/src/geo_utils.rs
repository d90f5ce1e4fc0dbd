//! Geographic utilities for parcel rings.
//!
//! Area is computed with a local equirectangular approximation: the shoelace
//! formula runs in (lat, lng) degree space and the result is scaled by the
//! meters-per-degree factors at the ring's mean latitude. This is accurate for
//! farm-sized parcels and degrades for polygons spanning many degrees.
//!
//! None of these functions fail. Degenerate input yields `0.0`, `None` or an
//! empty list so that a half-drawn boundary never interrupts the UI.

use geo::{Contains, Coord, Distance, Haversine, LineString, Point, Polygon};

use crate::GeoPoint;

/// Meters per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_319.9;

/// Square meters in one acre.
pub const SQ_METERS_PER_ACRE: f64 = 4046.86;

/// Area substituted when a non-positive area is requested.
const MIN_SQUARE_ACRES: f64 = 1.0;

/// Area of a closed ring in acres.
///
/// The ring is implicitly closed (the last point connects back to the first)
/// and winding direction does not matter. Rings with fewer than 3 points have
/// no area and return `0.0`.
///
/// # Example
/// ```
/// use landfence::{area_of_ring, GeoPoint};
///
/// let ring = vec![
///     GeoPoint::new(31.5000, 74.3000),
///     GeoPoint::new(31.5000, 74.3010),
///     GeoPoint::new(31.5010, 74.3010),
///     GeoPoint::new(31.5010, 74.3000),
/// ];
/// let acres = area_of_ring(&ring);
/// assert!(acres > 2.0 && acres < 3.0);
/// ```
pub fn area_of_ring(ring: &[GeoPoint]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    let n = ring.len();
    let mut twice_signed = 0.0;
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        twice_signed += a.latitude * b.longitude - b.latitude * a.longitude;
    }
    let area_deg2 = (twice_signed / 2.0).abs();

    let mean_lat = ring.iter().map(|p| p.latitude).sum::<f64>() / n as f64;
    let m_per_deg_lat = METERS_PER_DEGREE;
    let m_per_deg_lng = METERS_PER_DEGREE * mean_lat.to_radians().cos();

    area_deg2 * m_per_deg_lat * m_per_deg_lng / SQ_METERS_PER_ACRE
}

/// Axis-aligned square ring of roughly `acres` centered on `center`.
///
/// Used to create a parcel from a searched place plus a known size. A
/// non-positive or non-finite area is replaced by 1 acre. Corners are returned
/// counter-clockwise starting south-west.
pub fn square_from_center_and_area(center: &GeoPoint, acres: f64) -> [GeoPoint; 4] {
    let acres = if acres.is_finite() && acres > 0.0 {
        acres
    } else {
        MIN_SQUARE_ACRES
    };

    let half_side_m = (acres * SQ_METERS_PER_ACRE).sqrt() / 2.0;
    let delta_lat = half_side_m / METERS_PER_DEGREE;
    let delta_lng = half_side_m / (METERS_PER_DEGREE * center.latitude.to_radians().cos());

    let (lat, lng) = (center.latitude, center.longitude);
    [
        GeoPoint::new(lat - delta_lat, lng - delta_lng),
        GeoPoint::new(lat - delta_lat, lng + delta_lng),
        GeoPoint::new(lat + delta_lat, lng + delta_lng),
        GeoPoint::new(lat + delta_lat, lng - delta_lng),
    ]
}

/// Arithmetic mean of the ring's coordinates.
///
/// Returns `None` for an empty ring, so "no geometry yet" is distinguishable
/// from a parcel at the origin.
pub fn centroid_of(ring: &[GeoPoint]) -> Option<GeoPoint> {
    if ring.is_empty() {
        return None;
    }
    let n = ring.len() as f64;
    let (lat_sum, lng_sum) = ring
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.latitude, lng + p.longitude));
    Some(GeoPoint::new(lat_sum / n, lng_sum / n))
}

/// Parse free-form coordinate text into points.
///
/// Pairs are separated by newlines or `;`, and latitude/longitude within a
/// pair by commas and/or whitespace. Extra tokens on a line are ignored.
/// Each token contributes its leading number, so `31.52N` reads as `31.52`.
/// Lines that do not start with two finite numbers are skipped.
///
/// # Example
/// ```
/// use landfence::parse_point_list;
///
/// let points = parse_point_list("31.52, 74.35\nnot a point\n31.53 74.36; 31.54,74.37");
/// assert_eq!(points.len(), 3);
/// ```
pub fn parse_point_list(text: &str) -> Vec<GeoPoint> {
    text.split(['\n', ';'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_pair)
        .collect()
}

fn parse_pair(line: &str) -> Option<GeoPoint> {
    let mut parts = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());
    let lat = leading_number(parts.next()?)?;
    let lng = leading_number(parts.next()?)?;
    if lat.is_finite() && lng.is_finite() {
        Some(GeoPoint::new(lat, lng))
    } else {
        None
    }
}

/// The longest prefix of `token` that reads as a decimal number, if any.
fn leading_number(token: &str) -> Option<f64> {
    let bytes = token.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digit_count = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        digit_count += frac_end - (end + 1);
        end = frac_end;
    }
    if digit_count == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    token[..end].parse().ok()
}

/// Great-circle distance between two points in meters.
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let point1 = Point::new(a.longitude, a.latitude);
    let point2 = Point::new(b.longitude, b.latitude);
    Haversine::distance(point1, point2)
}

/// Length of the closed boundary in meters, including the closing edge.
pub fn perimeter_of_ring(ring: &[GeoPoint]) -> f64 {
    if ring.len() < 2 {
        return 0.0;
    }
    let open: f64 = ring
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum();
    // A two-point "ring" would count the same edge twice.
    if ring.len() == 2 {
        return open;
    }
    open + haversine_distance(&ring[ring.len() - 1], &ring[0])
}

/// Whether `point` lies strictly inside the ring.
///
/// Points exactly on the boundary are not contained. Rings with fewer than 3
/// points contain nothing.
pub fn ring_contains(ring: &[GeoPoint], point: &GeoPoint) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let coords: Vec<Coord> = ring
        .iter()
        .map(|p| Coord {
            x: p.longitude,
            y: p.latitude,
        })
        .collect();
    let polygon = Polygon::new(LineString::new(coords), vec![]);
    polygon.contains(&Point::new(point.longitude, point.latitude))
}
