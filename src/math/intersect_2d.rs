use super::{Point3, Vector3, TOL};
use crate::geom::Points;

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point3,
    d1: &Vector3,
    p2: &Point3,
    d2: &Vector3,
) -> Option<(f64, f64)> {
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < TOL {
        return None;
    }
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let t = (dx * d2.y - dy * d2.x) / cross;
    let u = (dx * d1.y - dy * d1.x) / cross;
    Some((t, u))
}

/// Returns true if the open segments `a-b` and `c-d` cross.
///
/// Both parameters must lie strictly inside `(0, 1)`, so segments that only
/// touch at an endpoint do not intersect. Collinear segments intersect when
/// their projections onto the dominant axis overlap by more than [`TOL`].
#[must_use]
pub fn segs_intersect(a: usize, b: usize, c: usize, d: usize, points: &Points) -> bool {
    let pa = points.get(a);
    let pb = points.get(b);
    let pc = points.get(c);
    let pd = points.get(d);
    let (abx, aby) = (pb.x - pa.x, pb.y - pa.y);
    let (cdx, cdy) = (pd.x - pc.x, pd.y - pc.y);
    let (acx, acy) = (pc.x - pa.x, pc.y - pa.y);

    let denom = abx * cdy - aby * cdx;
    if denom.abs() < TOL {
        let along = abx * acy - aby * acx;
        if along.abs() > TOL {
            return false;
        }
        let (lo1, hi1, lo2, hi2) = if abx.abs() >= aby.abs() {
            (pa.x.min(pb.x), pa.x.max(pb.x), pc.x.min(pd.x), pc.x.max(pd.x))
        } else {
            (pa.y.min(pb.y), pa.y.max(pb.y), pc.y.min(pd.y), pc.y.max(pd.y))
        };
        return hi1.min(hi2) - lo1.max(lo2) > TOL;
    }

    let t = (acx * cdy - acy * cdx) / denom;
    let u = (acx * aby - acy * abx) / denom;
    t > TOL && t < 1.0 - TOL && u > TOL && u < 1.0 - TOL
}
