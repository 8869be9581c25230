use crate::error::Diagnostics;
use crate::geom::Points;
use crate::math::intersect_2d::segs_intersect;
use crate::math::polygon_2d::rotate_to_canonical_start;
use crate::math::predicates::{angle_kind, ccw, in_cone, AngleKind};
use crate::math::TOL;

/// Number of ear-search modes, from strict to accept-anything.
const EAR_MODES: u8 = 5;

/// Splices every hole into `face`, producing one (possibly self-touching)
/// loop that covers the same region.
///
/// Holes are rotated to start at their leftmost-lowest vertex and joined
/// from left to right.
pub(crate) fn join_islands(
    face: &[usize],
    holes: &[Vec<usize>],
    points: &Points,
    diags: &mut Diagnostics,
) -> Vec<usize> {
    let mut sorted: Vec<Vec<usize>> = holes
        .iter()
        .filter(|h| !h.is_empty())
        .map(|h| rotate_to_canonical_start(h, points))
        .collect();
    sorted.sort_by(|a, b| {
        let pa = points.get(a[0]);
        let pb = points.get(b[0]);
        pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
    });

    let mut joined = face.to_vec();
    for (k, hole) in sorted.iter().enumerate() {
        joined = join_island(&joined, hole, &sorted[k + 1..], points, diags);
    }
    joined
}

/// Splices `hole` into `face` through a diagonal ending at the hole's first
/// vertex. `pending` are holes not joined yet, which the diagonal must avoid.
fn join_island(
    face: &[usize],
    hole: &[usize],
    pending: &[Vec<usize>],
    points: &Points,
    diags: &mut Diagnostics,
) -> Vec<usize> {
    if face.is_empty() {
        return hole.to_vec();
    }
    let d = find_diag(face, hole, pending, points, diags);
    let mut joined = Vec::with_capacity(face.len() + hole.len() + 2);
    joined.extend_from_slice(&face[..=d]);
    joined.extend_from_slice(hole);
    joined.push(hole[0]);
    joined.extend_from_slice(&face[d..]);
    joined
}

/// Finds the position in `face` of the vertex to connect to `hole[0]`.
///
/// Candidates are tried by increasing distance. The first pass only accepts
/// vertices left of the hole vertex, the second accepts any side, the last
/// takes the nearest vertex even if the diagonal crosses an edge.
fn find_diag(
    face: &[usize],
    hole: &[usize],
    pending: &[Vec<usize>],
    points: &Points,
    diags: &mut Diagnostics,
) -> usize {
    let hv = hole[0];
    let hp = *points.get(hv);
    let dist_sq = |i: usize| {
        let p = points.get(face[i]);
        (p.x - hp.x).powi(2) + (p.y - hp.y).powi(2)
    };
    let mut order: Vec<usize> = (0..face.len()).collect();
    order.sort_by(|&i, &j| dist_sq(i).total_cmp(&dist_sq(j)));

    if let Some(&i) = order
        .iter()
        .find(|&&i| points.get(face[i]).x <= hp.x && is_diag(i, face, hole, pending, points))
    {
        return i;
    }
    if let Some(&i) = order
        .iter()
        .find(|&&i| is_diag(i, face, hole, pending, points))
    {
        tracing::debug!(hole_vertex = hv, "hole joined through a right-side diagonal");
        return i;
    }
    diags.fallback(format!(
        "no crossing-free diagonal to hole vertex {hv}, joining through the nearest vertex"
    ));
    order[0]
}

/// Returns true if the segment from `face[i]` to `hole[0]` is a valid
/// diagonal: inside the corner cones at both ends and crossing no edge.
fn is_diag(
    i: usize,
    face: &[usize],
    hole: &[usize],
    pending: &[Vec<usize>],
    points: &Points,
) -> bool {
    let n = face.len();
    let fv = face[i];
    let hv = hole[0];
    if same_point(fv, hv, points) {
        return true;
    }
    if n >= 3 {
        let prev = face[(i + n - 1) % n];
        let next = face[(i + 1) % n];
        let kind = angle_kind(prev, fv, next, points);
        if !in_cone(hv, prev, fv, next, kind, points) {
            return false;
        }
    }
    let m = hole.len();
    if m >= 3 {
        let hprev = hole[m - 1];
        let hnext = hole[1];
        let kind = angle_kind(hprev, hv, hnext, points);
        if !in_cone(fv, hprev, hv, hnext, kind, points) {
            return false;
        }
    }
    let crosses = |lp: &[usize]| {
        let k = lp.len();
        (0..k).any(|j| segs_intersect(fv, hv, lp[j], lp[(j + 1) % k], points))
    };
    !crosses(face) && !crosses(hole) && !pending.iter().any(|h| crosses(h))
}

/// Triangulates a simple (possibly self-touching) counter-clockwise loop by
/// ear clipping.
///
/// The scan direction alternates after every ear. When no strict ear
/// exists the search escalates: degenerate ears, then ears whose diagonal
/// crosses other edges, then any convex vertex, then any vertex.
pub(crate) fn ear_chop_tri_face(
    face: &[usize],
    points: &Points,
    diags: &mut Diagnostics,
) -> Vec<[usize; 3]> {
    let mut f = face.to_vec();
    let mut tris = Vec::with_capacity(f.len().saturating_sub(2));
    let mut start = 0;
    let mut forward = true;

    while f.len() > 3 {
        let n = f.len();
        let (i, mode) = find_ear(&f, start, forward, points);
        let vm1 = f[(i + n - 1) % n];
        let v0 = f[i];
        let v1 = f[(i + 1) % n];
        match mode {
            0 => {}
            1 => diags.degenerate(format!("clipped degenerate ear at vertex {v0}")),
            _ => diags.fallback(format!("ear search mode {mode} used at vertex {v0}")),
        }
        if is_degenerate(vm1, v0, v1, points) {
            if mode == 0 {
                diags.degenerate(format!("dropped zero-area ear at vertex {v0}"));
            }
        } else {
            tris.push([vm1, v0, v1]);
        }
        f.remove(i);
        let n = f.len();
        start = if forward { i % n } else { (i + n - 1) % n };
        forward = !forward;
    }

    if f.len() == 3 {
        if ccw(f[0], f[1], f[2], points) {
            tris.push([f[0], f[1], f[2]]);
        } else {
            diags.degenerate(format!("dropped final degenerate triangle {f:?}"));
        }
    }
    tris
}

/// Finds an ear position, returning it with the search mode that accepted it.
fn find_ear(f: &[usize], start: usize, forward: bool, points: &Points) -> (usize, u8) {
    let n = f.len();
    for mode in 0..EAR_MODES {
        let mut i = start;
        for _ in 0..n {
            if is_ear(f, i, mode, points) {
                return (i, mode);
            }
            i = if forward { (i + 1) % n } else { (i + n - 1) % n };
        }
    }
    (start, EAR_MODES - 1)
}

fn is_ear(f: &[usize], i: usize, mode: u8, points: &Points) -> bool {
    let n = f.len();
    let vm2 = f[(i + n - 2) % n];
    let vm1 = f[(i + n - 1) % n];
    let v0 = f[i];
    let v1 = f[(i + 1) % n];
    let v2 = f[(i + 2) % n];

    if same_point(vm1, v0, points) || same_point(v0, v1, points) || same_point(vm1, v1, points) {
        return mode >= 1;
    }
    let k0 = angle_kind(vm1, v0, v1, points);
    match mode {
        0..=2 => {
            if k0 != AngleKind::Convex {
                return mode == 1 && k0 == AngleKind::Zero;
            }
            let km1 = angle_kind(vm2, vm1, v0, points);
            let k1 = angle_kind(v0, v1, v2, points);
            if !in_cone(v1, vm2, vm1, v0, km1, points) || !in_cone(vm1, v0, v1, v2, k1, points) {
                return false;
            }
            mode == 2 || !diagonal_blocked(f, vm1, v0, v1, points)
        }
        3 => k0 == AngleKind::Convex,
        _ => true,
    }
}

/// Returns true if the diagonal `vm1-v1` crosses an edge of `f`, or another
/// vertex lies inside the ear triangle or on the diagonal.
fn diagonal_blocked(f: &[usize], vm1: usize, v0: usize, v1: usize, points: &Points) -> bool {
    let n = f.len();
    if (0..n).any(|j| segs_intersect(vm1, v1, f[j], f[(j + 1) % n], points)) {
        return true;
    }
    f.iter().any(|&w| {
        if same_point(w, vm1, points) || same_point(w, v0, points) || same_point(w, v1, points) {
            return false;
        }
        let inside =
            ccw(vm1, v0, w, points) && ccw(v0, v1, w, points) && ccw(v1, vm1, w, points);
        inside || on_open_segment(w, vm1, v1, points)
    })
}

fn on_open_segment(w: usize, a: usize, b: usize, points: &Points) -> bool {
    let pa = points.get(a);
    let pb = points.get(b);
    let pw = points.get(w);
    let (dx, dy) = (pb.x - pa.x, pb.y - pa.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq < TOL * TOL {
        return false;
    }
    let cross = (pw.x - pa.x) * dy - (pw.y - pa.y) * dx;
    if cross.abs() > TOL * len_sq.sqrt() {
        return false;
    }
    let t = ((pw.x - pa.x) * dx + (pw.y - pa.y) * dy) / len_sq;
    t > TOL && t < 1.0 - TOL
}

/// Returns true if `a` and `b` are the same index or coincide in XY.
fn same_point(a: usize, b: usize, points: &Points) -> bool {
    if a == b {
        return true;
    }
    let pa = points.get(a);
    let pb = points.get(b);
    (pa.x - pb.x).abs() < TOL && (pa.y - pb.y).abs() < TOL
}

fn is_degenerate(a: usize, b: usize, c: usize, points: &Points) -> bool {
    same_point(a, b, points)
        || same_point(b, c, points)
        || same_point(a, c, points)
        || !(ccw(a, b, c, points) || ccw(a, c, b, points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area;

    fn tri_area(t: &[usize; 3], points: &Points) -> f64 {
        signed_area(t, points)
    }

    #[test]
    fn square_gives_two_ccw_triangles() {
        let points = Points::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let mut diags = Diagnostics::new();
        let tris = ear_chop_tri_face(&[0, 1, 2, 3], &points, &mut diags);
        assert_eq!(tris.len(), 2);
        let total: f64 = tris.iter().map(|t| tri_area(t, &points)).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(tris.iter().all(|t| tri_area(t, &points) > 0.0));
        assert!(diags.is_empty());
    }

    #[test]
    fn concave_polygon_area_is_preserved() {
        // An L shape.
        let points = Points::from_xy(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
        ]);
        let mut diags = Diagnostics::new();
        let tris = ear_chop_tri_face(&[0, 1, 2, 3, 4, 5], &points, &mut diags);
        assert_eq!(tris.len(), 4);
        let total: f64 = tris.iter().map(|t| tri_area(t, &points)).sum();
        assert!((total - 3.0).abs() < 1e-9);
        assert!(tris.iter().all(|t| tri_area(t, &points) > 0.0));
    }

    #[test]
    fn join_hole_builds_bridge() {
        let points = Points::from_xy(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.25, 0.25),
            (0.25, 0.75),
            (0.75, 0.75),
            (0.75, 0.25),
        ]);
        let mut diags = Diagnostics::new();
        let joined = join_islands(&[0, 1, 2, 3], &[vec![6, 7, 4, 5]], &points, &mut diags);
        assert_eq!(joined, vec![0, 4, 5, 6, 7, 4, 0, 1, 2, 3]);
        assert!(diags.is_empty());
        assert!((signed_area(&joined, &points) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn holed_square_triangulates_to_its_area() {
        let points = Points::from_xy(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.25, 0.25),
            (0.25, 0.75),
            (0.75, 0.75),
            (0.75, 0.25),
        ]);
        let mut diags = Diagnostics::new();
        let joined = join_islands(&[0, 1, 2, 3], &[vec![4, 5, 6, 7]], &points, &mut diags);
        let tris = ear_chop_tri_face(&joined, &points, &mut diags);
        assert_eq!(tris.len(), 8);
        let total: f64 = tris.iter().map(|t| tri_area(t, &points)).sum();
        assert!((total - 0.75).abs() < 1e-9);
        assert!(tris.iter().all(|t| tri_area(t, &points) > 0.0));
    }

    #[test]
    fn spike_is_removed_without_a_triangle() {
        // Square with a zero-width spike poking out of the top edge.
        let points = Points::from_xy(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (1.0, 2.0),
            (1.0, 3.0),
            (0.0, 2.0),
        ]);
        let mut diags = Diagnostics::new();
        let face = [0, 1, 2, 3, 4, 3, 5];
        let tris = ear_chop_tri_face(&face, &points, &mut diags);
        let total: f64 = tris.iter().map(|t| tri_area(t, &points)).sum();
        assert!((total - 4.0).abs() < 1e-9);
        assert!(tris.iter().all(|t| tri_area(t, &points) > 0.0));
    }
}
