//! Geo Kernel
//!
//! Distance, bearing, projection and containment on a golf-hole scale.
//! Distances use the haversine formula; lateral and containment math treat
//! lat/lng as a local plane, which is accurate to well under a yard at the
//! few-mile extents of a course.
//!
//! All functions are pure. Bearings are compass degrees (0 = north,
//! clockwise) and distances are yards.

use crate::config::defaults::{EARTH_RADIUS_M, YARDS_PER_METRE};
use crate::types::LatLng;

const EARTH_RADIUS_YARDS: f64 = EARTH_RADIUS_M * YARDS_PER_METRE;

/// Great-circle distance between two coordinates, in yards.
///
/// Symmetric, and exactly zero for identical points.
pub fn distance_yards(a: LatLng, b: LatLng) -> f64 {
    if a == b {
        return 0.0;
    }
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_YARDS * c
}

/// Initial compass bearing from `from` to `to`, in [0, 360).
pub fn bearing_deg(from: LatLng, to: LatLng) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    normalize_bearing(y.atan2(x).to_degrees())
}

/// Wrap any angle into [0, 360).
pub fn normalize_bearing(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Point reached by travelling `yards` from `origin` along `bearing`.
///
/// Negative distances travel backwards along the same bearing.
pub fn project(origin: LatLng, bearing: f64, yards: f64) -> LatLng {
    if yards == 0.0 {
        return origin;
    }
    let delta = yards / EARTH_RADIUS_YARDS;
    let theta = bearing.to_radians();
    let lat1 = origin.lat.to_radians();
    let lng1 = origin.lng.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lng2 = lng1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    LatLng::new(lat2.to_degrees(), lng2.to_degrees())
}

/// Forward projection followed by a perpendicular step.
///
/// Positive `lateral` moves to the right of the direction of travel.
pub fn offset_point(origin: LatLng, bearing: f64, forward: f64, lateral: f64) -> LatLng {
    let ahead = project(origin, bearing, forward);
    project(ahead, normalize_bearing(bearing + 90.0), lateral)
}

/// Move from `from` toward `to` by at most `yards`; never overshoots `to`.
pub fn move_toward(from: LatLng, to: LatLng, yards: f64) -> LatLng {
    let total = distance_yards(from, to);
    if total <= yards {
        return to;
    }
    project(from, bearing_deg(from, to), yards)
}

/// Ray-casting point-in-polygon on the lat/lng plane.
///
/// Rings with fewer than three vertices contain nothing. The ring may be
/// open or closed (first vertex repeated).
pub fn point_in_polygon(point: LatLng, polygon: &[LatLng]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let (px, py) = (point.lng, point.lat);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (polygon[i].lng, polygon[i].lat);
        let (xj, yj) = (polygon[j].lng, polygon[j].lat);
        if (yi > py) != (yj > py) {
            let intersect_x = (xj - xi) * (py - yi) / (yj - yi) + xi;
            if px < intersect_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Vertex-mean centroid. `None` for an empty ring.
pub fn polygon_centroid(polygon: &[LatLng]) -> Option<LatLng> {
    if polygon.is_empty() {
        return None;
    }
    let n = polygon.len() as f64;
    let (lat, lng) = polygon
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    Some(LatLng::new(lat / n, lng / n))
}

// ============================================================================
// Local planar frame
// ============================================================================

/// East/north offsets of `p` from `origin`, in yards.
fn local_xy(origin: LatLng, p: LatLng) -> (f64, f64) {
    let yards_per_deg = EARTH_RADIUS_YARDS.to_radians();
    let x = (p.lng - origin.lng) * yards_per_deg * origin.lat.to_radians().cos();
    let y = (p.lat - origin.lat) * yards_per_deg;
    (x, y)
}

/// Perpendicular distance from `p` to the segment `a`→`b`, clamping the
/// projection to the segment's ends.
pub fn distance_to_segment_yards(p: LatLng, a: LatLng, b: LatLng) -> f64 {
    let (bx, by) = local_xy(a, b);
    let (px, py) = local_xy(a, p);
    let len_sq = bx * bx + by * by;
    if len_sq == 0.0 {
        return (px * px + py * py).sqrt();
    }
    let t = ((px * bx + py * by) / len_sq).clamp(0.0, 1.0);
    let (dx, dy) = (px - t * bx, py - t * by);
    (dx * dx + dy * dy).sqrt()
}

/// Signed lateral distance of `p` from the infinite line `start`→`end`.
///
/// Positive means right of the direction of travel.
pub fn signed_lateral_yards(start: LatLng, end: LatLng, p: LatLng) -> f64 {
    let (ex, ey) = local_xy(start, end);
    let (px, py) = local_xy(start, p);
    let len = (ex * ex + ey * ey).sqrt();
    if len == 0.0 {
        return 0.0;
    }
    // Cross product is positive for points counter-clockwise (left) of travel.
    -(ex * py - ey * px) / len
}

/// Distance of `p`'s projection along the line `start`→`end`, from `start`.
pub fn along_track_yards(start: LatLng, end: LatLng, p: LatLng) -> f64 {
    let (ex, ey) = local_xy(start, end);
    let (px, py) = local_xy(start, p);
    let len = (ex * ex + ey * ey).sqrt();
    if len == 0.0 {
        return 0.0;
    }
    (ex * px + ey * py) / len
}

// ============================================================================
// Polylines
// ============================================================================

/// Total length of a polyline.
pub fn path_length_yards(path: &[LatLng]) -> f64 {
    path.windows(2).map(|w| distance_yards(w[0], w[1])).sum()
}

/// Point `yards` along a polyline from its first vertex.
///
/// Clamps to the final vertex when the path is shorter than `yards`.
/// Returns `None` only for an empty path.
pub fn point_along_path(path: &[LatLng], yards: f64) -> Option<LatLng> {
    let first = *path.first()?;
    if yards <= 0.0 {
        return Some(first);
    }
    let mut remaining = yards;
    for w in path.windows(2) {
        let seg = distance_yards(w[0], w[1]);
        if seg >= remaining {
            return Some(project(w[0], bearing_deg(w[0], w[1]), remaining));
        }
        remaining -= seg;
    }
    path.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tee() -> LatLng {
        LatLng::new(40.0, -75.0)
    }

    fn square(center: LatLng, half_yards: f64) -> Vec<LatLng> {
        vec![
            offset_point(center, 0.0, half_yards, -half_yards),
            offset_point(center, 0.0, half_yards, half_yards),
            offset_point(center, 0.0, -half_yards, half_yards),
            offset_point(center, 0.0, -half_yards, -half_yards),
        ]
    }

    #[test]
    fn test_distance_symmetric_and_zero() {
        let a = tee();
        let b = LatLng::new(40.0031, -74.9982);
        assert_eq!(distance_yards(a, a), 0.0);
        assert!((distance_yards(a, b) - distance_yards(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = LatLng::new(0.0, 0.0);
        let b = LatLng::new(1.0, 0.0);
        // 111.195 km
        let expected = 111_195.0 * YARDS_PER_METRE;
        assert!((distance_yards(a, b) - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn test_bearing_cardinals() {
        let o = tee();
        assert!(bearing_deg(o, LatLng::new(40.01, -75.0)).abs() < 1e-6);
        assert!((bearing_deg(o, LatLng::new(40.0, -74.99)) - 90.0).abs() < 0.01);
        assert!((bearing_deg(o, LatLng::new(39.99, -75.0)) - 180.0).abs() < 1e-6);
        assert!((bearing_deg(o, LatLng::new(40.0, -75.01)) - 270.0).abs() < 0.01);
    }

    #[test]
    fn test_project_round_trip() {
        let o = tee();
        for bearing in [0.0, 45.0, 137.0, 270.0, 359.0] {
            let p = project(o, bearing, 250.0);
            assert!((distance_yards(o, p) - 250.0).abs() < 0.01);
            let back = bearing_deg(o, p);
            let diff = (back - bearing).abs().min(360.0 - (back - bearing).abs());
            assert!(diff < 0.01, "bearing {bearing} came back as {back}");
        }
    }

    #[test]
    fn test_offset_point_right_is_positive_lateral() {
        let o = tee();
        let pin = project(o, 0.0, 400.0);
        let p = offset_point(o, 0.0, 200.0, 15.0);
        assert!((signed_lateral_yards(o, pin, p) - 15.0).abs() < 0.05);
        assert!((along_track_yards(o, pin, p) - 200.0).abs() < 0.05);
        let q = offset_point(o, 0.0, 200.0, -15.0);
        assert!((signed_lateral_yards(o, pin, q) + 15.0).abs() < 0.05);
    }

    #[test]
    fn test_point_in_polygon() {
        let c = project(tee(), 0.0, 200.0);
        let poly = square(c, 10.0);
        assert!(point_in_polygon(c, &poly));
        assert!(!point_in_polygon(project(c, 90.0, 20.0), &poly));
    }

    #[test]
    fn test_point_in_degenerate_polygon_is_false() {
        let c = tee();
        assert!(!point_in_polygon(c, &[]));
        assert!(!point_in_polygon(c, &[c]));
        assert!(!point_in_polygon(c, &[c, project(c, 0.0, 5.0)]));
    }

    #[test]
    fn test_distance_to_segment_clamps() {
        let a = tee();
        let b = project(a, 0.0, 300.0);
        let beside = offset_point(a, 0.0, 150.0, 25.0);
        assert!((distance_to_segment_yards(beside, a, b) - 25.0).abs() < 0.05);

        let beyond = project(a, 0.0, 340.0);
        assert!((distance_to_segment_yards(beyond, a, b) - 40.0).abs() < 0.05);
    }

    #[test]
    fn test_point_along_path_walks_segments() {
        let a = tee();
        let b = project(a, 0.0, 200.0);
        let c = project(b, 90.0, 100.0);
        let path = [a, b, c];
        assert!((path_length_yards(&path) - 300.0).abs() < 0.01);

        let p = point_along_path(&path, 250.0).unwrap();
        assert!((distance_yards(b, p) - 50.0).abs() < 0.05);
        let end = point_along_path(&path, 1_000.0).unwrap();
        assert_eq!(end, c);
        assert!(point_along_path(&[], 10.0).is_none());
    }

    #[test]
    fn test_move_toward_never_overshoots() {
        let a = tee();
        let b = project(a, 45.0, 8.0);
        assert_eq!(move_toward(a, b, 10.0), b);
        let c = project(a, 45.0, 50.0);
        assert!((distance_yards(a, move_toward(a, c, 10.0)) - 10.0).abs() < 0.01);
    }
}
