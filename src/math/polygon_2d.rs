use super::{Point3, Vector3, TOL};
use crate::geom::Points;

/// Where a point lies relative to a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    Inside,
    OnBoundary,
    Outside,
}

/// Computes the signed area of a polygon loop in the XY plane (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(face: &[usize], points: &Points) -> f64 {
    let n = face.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = points.get(face[i]);
        let b = points.get(face[(i + 1) % n]);
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Newell's method sum for a polygon loop.
///
/// The result is not normalized; its length is twice the projected area,
/// which makes it usable as an area-weighted normal.
#[must_use]
pub fn newell_sum(face: &[usize], points: &Points) -> Vector3 {
    let n = face.len();
    let mut sum = Vector3::zeros();
    for i in 0..n {
        let a = points.get(face[i]);
        let b = points.get(face[(i + 1) % n]);
        sum.x += (a.y - b.y) * (a.z + b.z);
        sum.y += (a.z - b.z) * (a.x + b.x);
        sum.z += (a.x - b.x) * (a.y + b.y);
    }
    sum
}

/// Unit normal of a polygon loop by Newell's method.
///
/// Falls back to `+Z` when the loop has no measurable area.
#[must_use]
pub fn newell_normal(face: &[usize], points: &Points) -> Vector3 {
    normalize_or_z(newell_sum(face, points))
}

fn normalize_or_z(v: Vector3) -> Vector3 {
    let len = v.norm();
    if len < TOL {
        Vector3::z()
    } else {
        v / len
    }
}

/// Rotates a closed loop so it starts at its leftmost vertex (smallest x),
/// breaking ties by smallest y.
#[must_use]
pub fn rotate_to_canonical_start(face: &[usize], points: &Points) -> Vec<usize> {
    if face.len() < 2 {
        return face.to_vec();
    }
    let mut best = 0;
    for (i, &v) in face.iter().enumerate().skip(1) {
        let pt = points.get(v);
        let b = points.get(face[best]);
        if pt.x < b.x || (pt.x == b.x && pt.y < b.y) {
            best = i;
        }
    }
    let mut rotated = Vec::with_capacity(face.len());
    rotated.extend_from_slice(&face[best..]);
    rotated.extend_from_slice(&face[..best]);
    rotated
}

/// Classifies `p` against the loop `face` by crossing number in the XY plane.
///
/// Points within [`TOL`] of an edge count as [`Containment::OnBoundary`].
#[must_use]
pub fn point_inside(p: &Point3, face: &[usize], points: &Points) -> Containment {
    let n = face.len();
    if n == 0 {
        return Containment::Outside;
    }
    let mut inside = false;
    for i in 0..n {
        let a = points.get(face[i]);
        let b = points.get(face[(i + 1) % n]);
        if on_segment(p, a, b) {
            return Containment::OnBoundary;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    if inside {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

fn on_segment(p: &Point3, a: &Point3, b: &Point3) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq < TOL * TOL {
        return (p.x - a.x).abs() < TOL && (p.y - a.y).abs() < TOL;
    }
    let cross = (p.x - a.x) * dy - (p.y - a.y) * dx;
    if cross.abs() > TOL * len_sq.sqrt() {
        return false;
    }
    let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq;
    (-TOL..=1.0 + TOL).contains(&t)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square() -> (Points, Vec<usize>) {
        let points = Points::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        (points, vec![0, 1, 2, 3])
    }

    #[test]
    fn signed_area_ccw_square() {
        let (points, face) = square();
        assert!((signed_area(&face, &points) - 1.0).abs() < TOL);
    }

    #[test]
    fn signed_area_cw_square() {
        let (points, _) = square();
        assert!((signed_area(&[0, 3, 2, 1], &points) + 1.0).abs() < TOL);
    }

    #[test]
    fn signed_area_degenerate() {
        let (points, _) = square();
        assert!(signed_area(&[0, 1], &points).abs() < TOL);
        assert!(signed_area(&[], &points).abs() < TOL);
    }

    #[test]
    fn newell_of_flat_ccw_loop_is_up() {
        let (mut points, face) = square();
        points.add_z_coord(2.0).unwrap();
        let n = newell_normal(&face, &points);
        assert!((n - Vector3::z()).norm() < TOL);
    }

    #[test]
    fn newell_of_vertical_loop() {
        let points = Points::from_xyz(&[
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (1.0, 0.0, 1.0),
            (0.0, 0.0, 1.0),
        ]);
        let n = newell_normal(&[0, 1, 2, 3], &points);
        assert!((n - Vector3::new(0.0, -1.0, 0.0)).norm() < TOL);
    }

    #[test]
    fn canonical_start_rotation() {
        let points = Points::from_xy(&[(1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        assert_eq!(rotate_to_canonical_start(&[0, 1, 2, 3], &points), vec![3, 0, 1, 2]);
    }

    #[test]
    fn point_inside_classification() {
        let (points, face) = square();
        assert_eq!(
            point_inside(&Point3::new(0.5, 0.5, 0.0), &face, &points),
            Containment::Inside
        );
        assert_eq!(
            point_inside(&Point3::new(1.0, 0.5, 0.0), &face, &points),
            Containment::OnBoundary
        );
        assert_eq!(
            point_inside(&Point3::new(0.0, 0.0, 0.0), &face, &points),
            Containment::OnBoundary
        );
        assert_eq!(
            point_inside(&Point3::new(1.5, 0.5, 0.0), &face, &points),
            Containment::Outside
        );
    }
}
