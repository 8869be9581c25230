use super::TOL;
use crate::geom::Points;

/// Returns true if `a, b, c` turn counter-clockwise in the XY plane.
///
/// Collinear triples (within [`TOL`]) are not counter-clockwise.
#[must_use]
pub fn ccw(a: usize, b: usize, c: usize, points: &Points) -> bool {
    let pa = points.get(a);
    let pb = points.get(b);
    let pc = points.get(c);
    let d = (pb.x - pa.x) * (pc.y - pa.y) - (pb.y - pa.y) * (pc.x - pa.x);
    d > TOL
}

/// Returns true if `d` lies strictly inside the circle through `a, b, c`.
///
/// The triangle `a, b, c` is put in counter-clockwise order first, so the
/// answer does not depend on how the caller oriented it.
#[must_use]
pub fn in_circle(a: usize, b: usize, c: usize, d: usize, points: &Points) -> bool {
    let (b, c) = if ccw(a, c, b, points) { (c, b) } else { (b, c) };
    let pa = points.get(a);
    let pb = points.get(b);
    let pc = points.get(c);
    let pd = points.get(d);
    let (adx, ady) = (pa.x - pd.x, pa.y - pd.y);
    let (bdx, bdy) = (pb.x - pd.x, pb.y - pd.y);
    let (cdx, cdy) = (pc.x - pd.x, pc.y - pd.y);
    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;
    let det = adx * (bdy * cd - bd * cdy) - ady * (bdx * cd - bd * cdx) + ad * (bdx * cdy - bdy * cdx);
    det > TOL * TOL
}

/// Unsigned angle at `b` formed by `a-b-c`, in degrees within `[0, 180]`.
///
/// Zero-length arms give 0.
#[must_use]
pub fn angle(a: usize, b: usize, c: usize, points: &Points) -> f64 {
    let pa = points.get(a);
    let pb = points.get(b);
    let pc = points.get(c);
    let (ux, uy) = (pa.x - pb.x, pa.y - pb.y);
    let (vx, vy) = (pc.x - pb.x, pc.y - pb.y);
    let lu = (ux * ux + uy * uy).sqrt();
    let lv = (vx * vx + vy * vy).sqrt();
    if lu < TOL || lv < TOL {
        return 0.0;
    }
    let cos = ((ux * vx + uy * vy) / (lu * lv)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Classification of the corner `a-b-c` of a counter-clockwise loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleKind {
    /// Interior angle below 180°.
    Convex,
    /// Interior angle above 180°.
    Reflex,
    /// Straight continuation.
    Tangential,
    /// The loop doubles back on itself (a spike of zero angle).
    Zero,
}

/// Classifies the corner at `b` of a loop that continues `a -> b -> c`.
#[must_use]
pub fn angle_kind(a: usize, b: usize, c: usize, points: &Points) -> AngleKind {
    if ccw(a, b, c, points) {
        AngleKind::Convex
    } else if ccw(a, c, b, points) {
        AngleKind::Reflex
    } else {
        let pa = points.get(a);
        let pb = points.get(b);
        let pc = points.get(c);
        let dot = (pb.x - pa.x) * (pc.x - pb.x) + (pb.y - pa.y) * (pc.y - pb.y);
        if dot > 0.0 {
            AngleKind::Tangential
        } else {
            AngleKind::Zero
        }
    }
}

/// Returns true if `test` lies in the interior cone of the corner `a-b-c`,
/// whose kind is `kind`.
#[must_use]
pub fn in_cone(test: usize, a: usize, b: usize, c: usize, kind: AngleKind, points: &Points) -> bool {
    match kind {
        AngleKind::Convex => ccw(a, b, test, points) && ccw(b, c, test, points),
        AngleKind::Reflex => ccw(a, b, test, points) || ccw(b, c, test, points),
        AngleKind::Tangential => ccw(a, b, test, points),
        AngleKind::Zero => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts() -> Points {
        Points::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (2.0, 0.0), (0.5, 0.5)])
    }

    #[test]
    fn ccw_orientation() {
        let p = pts();
        assert!(ccw(0, 1, 2, &p));
        assert!(!ccw(0, 2, 1, &p));
        assert!(!ccw(0, 1, 4, &p));
    }

    #[test]
    fn in_circle_ignores_triangle_orientation() {
        let p = pts();
        assert!(in_circle(0, 1, 3, 5, &p));
        assert!(in_circle(0, 3, 1, 5, &p));
        assert!(!in_circle(0, 1, 3, 4, &p));
        // Cocircular points are not strictly inside.
        assert!(!in_circle(0, 1, 2, 3, &p));
    }

    #[test]
    fn angle_degrees() {
        let p = pts();
        assert!((angle(1, 0, 3, &p) - 90.0).abs() < 1e-9);
        assert!((angle(1, 0, 2, &p) - 45.0).abs() < 1e-9);
        assert!((angle(0, 1, 4, &p) - 180.0).abs() < 1e-9);
        assert!(angle(0, 0, 1, &p).abs() < 1e-9);
    }

    #[test]
    fn angle_kinds() {
        let p = pts();
        assert_eq!(angle_kind(0, 1, 2, &p), AngleKind::Convex);
        assert_eq!(angle_kind(2, 1, 0, &p), AngleKind::Reflex);
        assert_eq!(angle_kind(0, 1, 4, &p), AngleKind::Tangential);
        assert_eq!(angle_kind(0, 4, 1, &p), AngleKind::Zero);
    }

    #[test]
    fn cone_membership() {
        let p = pts();
        // Corner at 1 of the square 0-1-2-3.
        assert!(in_cone(3, 0, 1, 2, AngleKind::Convex, &p));
        assert!(!in_cone(4, 0, 1, 2, AngleKind::Convex, &p));
        // The same corner walked the other way is reflex.
        assert!(in_cone(4, 2, 1, 0, AngleKind::Reflex, &p));
        assert!(!in_cone(5, 2, 1, 0, AngleKind::Reflex, &p));
    }
}
