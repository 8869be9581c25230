use std::collections::HashMap;

use crate::error::{Diagnosed, Diagnostics, OperationError, Result};
use crate::geom::{PolyArea, Points};
use crate::math::polygon_2d::newell_sum;
use crate::math::Vector3;
use crate::tessellation::{edge_key, EdgeKey};

/// Reconstructs regions from mesh faces.
///
/// Faces sharing an edge belong to the same region. Edges used by a single
/// face of a region form its boundary, which is chained into loops. The loop
/// whose normal agrees best with the region's summed face normal becomes
/// the outer loop and the others become holes. Each region takes the data
/// of its first face.
///
/// # Errors
///
/// Returns an error if `data` and `faces` differ in length or a face has an
/// out-of-range index.
pub fn region_to_poly_areas<D: Clone>(
    faces: &[Vec<usize>],
    points: &Points,
    data: &[D],
) -> Result<Diagnosed<Vec<PolyArea<D>>>> {
    if faces.len() != data.len() {
        return Err(OperationError::InvalidInput(format!(
            "{} faces but {} data entries",
            faces.len(),
            data.len()
        ))
        .into());
    }
    for f in faces {
        points.check_indices(f)?;
    }
    let mut diags = Diagnostics::new();
    let mut out = Vec::new();
    for comp in face_components(faces) {
        let loops = boundary_loops(&comp, faces, &mut diags);
        if loops.is_empty() {
            diags.degenerate(format!(
                "region of {} faces has no boundary",
                comp.len()
            ));
            continue;
        }
        let normal: Vector3 = comp.iter().map(|&f| newell_sum(&faces[f], points)).sum();
        let outer = loops
            .iter()
            .enumerate()
            .map(|(k, l)| (k, newell_sum(l, points).dot(&normal)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(0, |(k, _)| k);
        let mut poly = Vec::new();
        let mut holes = Vec::new();
        for (k, l) in loops.into_iter().enumerate() {
            if k == outer {
                poly = l;
            } else {
                holes.push(l);
            }
        }
        out.push(PolyArea::new(poly, holes, data[comp[0]].clone()));
    }
    tracing::debug!(regions = out.len(), faces = faces.len(), "regions extracted");
    Ok(Diagnosed::new(out, diags))
}

/// Groups face indices into edge-connected components, each in increasing
/// order.
fn face_components(faces: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut edge_faces: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
    for (f, face) in faces.iter().enumerate() {
        for (a, b) in loop_edges(face) {
            edge_faces.entry(edge_key(a, b)).or_default().push(f);
        }
    }
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); faces.len()];
    for fs in edge_faces.values() {
        for w in fs.windows(2) {
            adj[w[0]].push(w[1]);
            adj[w[1]].push(w[0]);
        }
    }
    let mut comp_of = vec![usize::MAX; faces.len()];
    let mut comps = Vec::new();
    for start in 0..faces.len() {
        if comp_of[start] != usize::MAX {
            continue;
        }
        let id = comps.len();
        comp_of[start] = id;
        let mut members = vec![start];
        let mut stack = vec![start];
        while let Some(f) = stack.pop() {
            for &g in &adj[f] {
                if comp_of[g] == usize::MAX {
                    comp_of[g] = id;
                    members.push(g);
                    stack.push(g);
                }
            }
        }
        members.sort_unstable();
        comps.push(members);
    }
    comps
}

/// Chains the boundary edges of a face component into closed loops.
///
/// A walk that cannot be closed is reported and kept if it still spans
/// three vertices.
fn boundary_loops(comp: &[usize], faces: &[Vec<usize>], diags: &mut Diagnostics) -> Vec<Vec<usize>> {
    let mut uses: HashMap<EdgeKey, usize> = HashMap::new();
    for &f in comp {
        for (a, b) in loop_edges(&faces[f]) {
            *uses.entry(edge_key(a, b)).or_insert(0) += 1;
        }
    }
    let mut boundary: Vec<(usize, usize)> = Vec::new();
    for &f in comp {
        for (a, b) in loop_edges(&faces[f]) {
            if uses.get(&edge_key(a, b)) == Some(&1) {
                boundary.push((a, b));
            }
        }
    }
    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for (k, &(a, _)) in boundary.iter().enumerate() {
        outgoing.entry(a).or_default().push(k);
    }
    let mut used = vec![false; boundary.len()];
    let mut loops = Vec::new();
    for k0 in 0..boundary.len() {
        if used[k0] {
            continue;
        }
        used[k0] = true;
        let (start, mut cur) = boundary[k0];
        let mut lp = vec![start];
        let mut closed = false;
        while lp.len() <= boundary.len() {
            if cur == start {
                closed = true;
                break;
            }
            lp.push(cur);
            let next = outgoing
                .get(&cur)
                .and_then(|ks| ks.iter().copied().find(|&k| !used[k]));
            let Some(k) = next else {
                break;
            };
            used[k] = true;
            cur = boundary[k].1;
        }
        if !closed {
            diags.fallback(format!(
                "boundary walk from vertex {start} could not close after {} vertices",
                lp.len()
            ));
        }
        if lp.len() >= 3 {
            loops.push(lp);
        }
    }
    loops
}

fn loop_edges(face: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    let n = face.len();
    (0..n).map(move |i| (face[i], face[(i + 1) % n]))
}
