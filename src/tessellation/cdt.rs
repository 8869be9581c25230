use std::collections::{HashMap, HashSet};

use crate::error::Diagnostics;
use crate::geom::Points;
use crate::math::predicates::{ccw, in_circle};

/// Undirected edge key with the smaller index first.
pub(crate) type EdgeKey = (usize, usize);

pub(crate) fn edge_key(a: usize, b: usize) -> EdgeKey {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Collects the undirected edges of every loop.
pub(crate) fn border_edges<'a>(loops: impl IntoIterator<Item = &'a [usize]>) -> HashSet<EdgeKey> {
    let mut bord = HashSet::new();
    for face in loops {
        let n = face.len();
        for i in 0..n {
            bord.insert(edge_key(face[i], face[(i + 1) % n]));
        }
    }
    bord
}

/// Maps every directed edge to the triangle that contains it.
pub(crate) fn tri_dict(tris: &[[usize; 3]]) -> HashMap<(usize, usize), usize> {
    let mut td = HashMap::with_capacity(tris.len() * 3);
    for (t, tri) in tris.iter().enumerate() {
        for k in 0..3 {
            td.entry((tri[k], tri[(k + 1) % 3])).or_insert(t);
        }
    }
    td
}

/// Third vertex of `tri` given one of its directed edges.
pub(crate) fn opposite(tri: &[usize; 3], a: usize, b: usize) -> usize {
    tri.iter()
        .copied()
        .find(|&v| v != a && v != b)
        .unwrap_or(tri[0])
}

/// Improves a triangulation towards constrained Delaunay by edge flipping.
///
/// Edges in `bord` are never flipped. An internal edge is flipped when the
/// apex of one neighbour lies inside the circumcircle of the other.
pub(crate) fn cdt(
    mut tris: Vec<[usize; 3]>,
    bord: &HashSet<EdgeKey>,
    points: &Points,
    diags: &mut Diagnostics,
) -> Vec<[usize; 3]> {
    let mut td = tri_dict(&tris);
    let mut queue: Vec<(usize, usize)> = td
        .keys()
        .copied()
        .filter(|&(a, b)| a < b && is_reversed(a, b, &tris, &td, bord, points))
        .collect();
    queue.sort_unstable();

    let flip_cap = 16 + tris.len() * tris.len();
    let mut flips = 0;
    while let Some((a, b)) = queue.pop() {
        if !is_reversed(a, b, &tris, &td, bord, points) {
            continue;
        }
        if flips >= flip_cap {
            diags.fallback(format!("edge flipping stopped after {flips} flips"));
            break;
        }
        let Some(new_edges) = flip(a, b, &mut tris, &mut td, points) else {
            continue;
        };
        flips += 1;
        for (x, y) in new_edges {
            if is_reversed(x, y, &tris, &td, bord, points) {
                queue.push((x, y));
            }
        }
    }
    tracing::debug!(triangles = tris.len(), flips, "constrained delaunay pass done");
    tris
}

/// Returns true if the internal edge `a-b` is locally non-Delaunay.
fn is_reversed(
    a: usize,
    b: usize,
    tris: &[[usize; 3]],
    td: &HashMap<(usize, usize), usize>,
    bord: &HashSet<EdgeKey>,
    points: &Points,
) -> bool {
    if bord.contains(&edge_key(a, b)) {
        return false;
    }
    let (Some(&t1), Some(&t2)) = (td.get(&(a, b)), td.get(&(b, a))) else {
        return false;
    };
    if t1 == t2 {
        return false;
    }
    let c = opposite(&tris[t1], a, b);
    let d = opposite(&tris[t2], b, a);
    in_circle(a, b, c, d, points)
}

/// Replaces the triangles `(a, b, c)` and `(b, a, d)` by `(a, d, c)` and
/// `(d, b, c)`. Returns the four outer edges of the quad, or `None` if the
/// flip would produce a degenerate or duplicate edge.
fn flip(
    a: usize,
    b: usize,
    tris: &mut [[usize; 3]],
    td: &mut HashMap<(usize, usize), usize>,
    points: &Points,
) -> Option<[(usize, usize); 4]> {
    let t1 = *td.get(&(a, b))?;
    let t2 = *td.get(&(b, a))?;
    let c = opposite(&tris[t1], a, b);
    let d = opposite(&tris[t2], b, a);
    if c == d || td.contains_key(&(c, d)) || td.contains_key(&(d, c)) {
        return None;
    }
    if !ccw(a, d, c, points) || !ccw(d, b, c, points) {
        return None;
    }
    for (x, y) in [(a, b), (b, c), (c, a)] {
        td.remove(&(x, y));
    }
    for (x, y) in [(b, a), (a, d), (d, b)] {
        td.remove(&(x, y));
    }
    tris[t1] = [a, d, c];
    tris[t2] = [d, b, c];
    for (x, y) in [(a, d), (d, c), (c, a)] {
        td.insert((x, y), t1);
    }
    for (x, y) in [(d, b), (b, c), (c, d)] {
        td.insert((x, y), t2);
    }
    Some([(a, d), (d, b), (b, c), (c, a)])
}
