use tracing::debug;

use super::spoke::Spoke;
use crate::error::Diagnostics;
use crate::geom::{PolyArea, Points};
use crate::math::polygon_2d::{point_inside, signed_area, Containment};
use crate::math::AREATOL;

/// A wavefront loop after advancing, with the position of every spoke's
/// destination inside `verts`.
#[derive(Debug, Clone)]
pub(crate) struct AdvancedLoop {
    pub verts: Vec<usize>,
    pub spoke_pos: Vec<usize>,
}

/// Which spoke hit which wavefront edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EdgeHit {
    pub face: usize,
    pub spoke: usize,
    pub edge_face: usize,
    pub edge: usize,
}

/// Moves every spoke for `t`, recording destinations in `points`.
///
/// Consecutive destinations that land on the same point merge, which is how
/// vanished edges leave the topology.
pub(crate) fn make_new_faces(
    facespokes: &mut [Vec<Spoke>],
    t: f64,
    vspeed: f64,
    points: &mut Points,
) -> Vec<AdvancedLoop> {
    facespokes
        .iter_mut()
        .map(|spokes| {
            let mut verts: Vec<usize> = Vec::with_capacity(spokes.len());
            let mut spoke_pos = Vec::with_capacity(spokes.len());
            for s in spokes.iter_mut() {
                let d = points.add_point(s.end_point(t, vspeed));
                s.dest = Some(d);
                if verts.last() != Some(&d) {
                    verts.push(d);
                }
                spoke_pos.push(verts.len() - 1);
            }
            if verts.len() > 1 && verts.first() == verts.last() {
                let last = verts.len() - 1;
                verts.pop();
                for p in &mut spoke_pos {
                    if *p == last {
                        *p = 0;
                    }
                }
            }
            AdvancedLoop { verts, spoke_pos }
        })
        .collect()
}

/// Rewires the advanced loops for an edge hit.
///
/// A hit within one loop splits it in two at the hit point; a hit between
/// two loops joins them into one loop that passes the hit point twice.
pub(crate) fn split_join_faces(
    loops: &[AdvancedLoop],
    hit: EdgeHit,
    diags: &mut Diagnostics,
) -> Vec<Vec<usize>> {
    let unchanged = || loops.iter().map(|l| l.verts.clone()).collect::<Vec<_>>();
    let (Some(lf), Some(lg)) = (loops.get(hit.face), loops.get(hit.edge_face)) else {
        diags.fallback("edge hit refers to a missing wavefront loop");
        return unchanged();
    };
    let (Some(&pr), Some(&pe1)) = (lf.spoke_pos.get(hit.spoke), lg.spoke_pos.get(hit.edge)) else {
        diags.fallback("edge hit refers to a missing spoke");
        return unchanged();
    };
    let m = lg.spoke_pos.len();
    let pe2 = lg.spoke_pos[(hit.edge + 1) % m];
    let d = lf.verts[pr];

    let mut out = Vec::with_capacity(loops.len() + 1);
    if hit.face == hit.edge_face {
        let n = lf.verts.len();
        if n < 3 {
            diags.fallback(format!(
                "split at spoke {} in a loop of {n} vertices, loop kept whole",
                hit.spoke
            ));
            return unchanged();
        }
        if pr == pe1 || pr == pe2 {
            // The spoke merged into an end of the edge it hit: a vertex event.
            debug!(spoke = hit.spoke, edge = hit.edge, "edge hit lands on the edge's end");
            return unchanged();
        }
        let first = cyclic(&lf.verts, pr, pe1);
        let mut second = vec![d];
        second.extend(cyclic(&lf.verts, pe2, (pr + n - 1) % n));
        for (k, l) in loops.iter().enumerate() {
            if k == hit.face {
                out.push(dedup_cyclic(first.clone()));
                out.push(dedup_cyclic(second.clone()));
            } else {
                out.push(l.verts.clone());
            }
        }
    } else {
        let n = lf.verts.len();
        let mut merged = vec![d];
        merged.extend(cyclic(&lg.verts, pe2, pe1));
        merged.extend(cyclic(&lf.verts, pr, (pr + n - 1) % n));
        for (k, l) in loops.iter().enumerate() {
            if k == hit.face {
                out.push(dedup_cyclic(merged.clone()));
            } else if k != hit.edge_face {
                out.push(l.verts.clone());
            }
        }
    }
    out
}

/// Groups loops into regions: counter-clockwise loops become outer loops
/// and each clockwise loop becomes a hole of the smallest outer loop that
/// contains it. Loops below [`AREATOL`] are dropped, and so are regions whose
/// holes leave less than [`AREATOL`] of their area.
pub(crate) fn loops_to_polyareas<D: Clone>(
    loops: Vec<Vec<usize>>,
    points: &Points,
    data: &D,
    diags: &mut Diagnostics,
) -> Vec<PolyArea<D>> {
    let mut outers: Vec<(f64, Vec<usize>)> = Vec::new();
    let mut holes: Vec<Vec<usize>> = Vec::new();
    for l in loops {
        if l.len() < 3 {
            continue;
        }
        let area = signed_area(&l, points);
        if area.abs() < AREATOL {
            continue;
        }
        if area > 0.0 {
            outers.push((area, l));
        } else {
            holes.push(l);
        }
    }
    let mut assigned: Vec<Vec<Vec<usize>>> = vec![Vec::new(); outers.len()];
    for h in holes {
        let owner = outers
            .iter()
            .enumerate()
            .filter(|(_, (_, o))| {
                h.iter()
                    .all(|&v| point_inside(points.get(v), o, points) != Containment::Outside)
            })
            .min_by(|a, b| a.1 .0.total_cmp(&b.1 .0))
            .map(|(k, _)| k);
        match owner {
            Some(k) => assigned[k].push(h),
            None => diags.fallback(format!(
                "hole of {} vertices lies in no outer loop, dropped",
                h.len()
            )),
        }
    }
    outers
        .into_iter()
        .zip(assigned)
        .map(|((_, poly), holes)| PolyArea::new(poly, holes, data.clone()))
        .filter(|pa| {
            let area = pa.net_area(points);
            if area < AREATOL {
                debug!(area, holes = pa.holes.len(), "region covered by its holes, dropped");
            }
            area >= AREATOL
        })
        .collect()
}

/// Elements of `v` from `from` to `to` inclusive, wrapping around.
fn cyclic(v: &[usize], from: usize, to: usize) -> Vec<usize> {
    let n = v.len();
    let mut out = Vec::new();
    if n == 0 {
        return out;
    }
    let mut i = from % n;
    loop {
        out.push(v[i]);
        if i == to % n || out.len() == n {
            break;
        }
        i = (i + 1) % n;
    }
    out
}

/// Removes consecutive repeats, including a repeat across the wrap.
fn dedup_cyclic(mut v: Vec<usize>) -> Vec<usize> {
    v.dedup();
    while v.len() > 1 && v.first() == v.last() {
        v.pop();
    }
    v
}
