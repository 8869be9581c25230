use std::collections::{HashMap, HashSet};

use rand::Rng;

use super::cdt::{edge_key, opposite, tri_dict, EdgeKey};
use super::matching::{greedy_match, max_match, MatchEdge};
use super::TriQuadParams;
use crate::error::Diagnostics;
use crate::geom::Points;
use crate::math::predicates::angle;

/// An edge of the edge-removal graph: triangles `ta` and `tb` share the
/// diagonal `(x, y)` and merge into a convex quad when it is removed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RemovalEdge {
    pub ta: usize,
    pub tb: usize,
    pub x: usize,
    pub y: usize,
    pub weight: f64,
}

/// Builds the edge-removal graph of a triangulation.
///
/// Only pairs whose merged quad keeps every interior angle at or below 180°
/// are linked. The weight favours near-right corners and high-degree shared
/// vertices.
pub(crate) fn er_graph(
    tris: &[[usize; 3]],
    bord: &HashSet<EdgeKey>,
    points: &Points,
    params: &TriQuadParams,
) -> Vec<RemovalEdge> {
    let td = tri_dict(tris);
    let mut degree: HashMap<usize, usize> = HashMap::new();
    for t in tris {
        for &v in t {
            *degree.entry(v).or_insert(0) += 1;
        }
    }
    let mut edges = Vec::new();
    for (ta, tri) in tris.iter().enumerate() {
        for k in 0..3 {
            let x = tri[k];
            let y = tri[(k + 1) % 3];
            let z = tri[(k + 2) % 3];
            if bord.contains(&edge_key(x, y)) {
                continue;
            }
            let Some(&tb) = td.get(&(y, x)) else {
                continue;
            };
            if tb <= ta {
                continue;
            }
            let w = opposite(&tris[tb], y, x);
            let ang_x = angle(z, x, y, points) + angle(y, x, w, points);
            let ang_y = angle(x, y, z, points) + angle(w, y, x, points);
            if ang_x > 180.0 || ang_y > 180.0 {
                continue;
            }
            let ang_z = angle(y, z, x, points);
            let ang_w = angle(x, w, y, points);
            let max_ang = ang_x.max(ang_y).max(ang_z).max(ang_w);
            #[allow(clippy::cast_precision_loss)]
            let deg = (degree.get(&x).copied().unwrap_or(0) + degree.get(&y).copied().unwrap_or(0))
                as f64;
            let weight = params.angle_factor * (180.0 - max_ang) + params.degree_factor * deg;
            edges.push(RemovalEdge {
                ta,
                tb,
                x,
                y,
                weight,
            });
        }
    }
    edges
}

/// Merges matched triangle pairs into quads.
///
/// Uses the exact matching below `params.exact_match_threshold` graph
/// edges and the greedy one above it.
pub(crate) fn quadrangulate<R: Rng>(
    tris: &[[usize; 3]],
    bord: &HashSet<EdgeKey>,
    points: &Points,
    params: &TriQuadParams,
    rng: &mut R,
    diags: &mut Diagnostics,
) -> Vec<Vec<usize>> {
    let er = er_graph(tris, bord, points, params);
    let graph: Vec<MatchEdge> = er
        .iter()
        .map(|e| MatchEdge::new(e.ta, e.tb, e.weight))
        .collect();
    let matched = if er.len() > params.exact_match_threshold {
        tracing::debug!(edges = er.len(), "greedy quad matching");
        greedy_match(&graph)
    } else {
        max_match(&graph, rng)
    };

    let by_pair: HashMap<(usize, usize), &RemovalEdge> =
        er.iter().map(|e| ((e.ta, e.tb), e)).collect();
    let mut merged = vec![false; tris.len()];
    let mut faces = Vec::with_capacity(tris.len());
    for m in &matched {
        let Some(e) = by_pair.get(&(m.a, m.b)) else {
            diags.fallback(format!(
                "matched triangles {} and {} are not in the removal graph",
                m.a, m.b
            ));
            continue;
        };
        let z = opposite(&tris[e.ta], e.x, e.y);
        let w = opposite(&tris[e.tb], e.y, e.x);
        faces.push(lowest_first(vec![e.x, w, e.y, z]));
        merged[e.ta] = true;
        merged[e.tb] = true;
    }
    for (t, tri) in tris.iter().enumerate() {
        if !merged[t] {
            faces.push(tri.to_vec());
        }
    }
    faces
}

/// Rotates a loop so it starts at its smallest vertex index.
fn lowest_first(mut face: Vec<usize>) -> Vec<usize> {
    if let Some(k) = (0..face.len()).min_by_key(|&k| face[k]) {
        face.rotate_left(k);
    }
    face
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area;
    use crate::tessellation::cdt::border_edges;
    use crate::tessellation::matching::{is_matching, total_weight};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn square_pair_becomes_one_quad() {
        let points = Points::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let tris = [[0, 1, 2], [0, 2, 3]];
        let bord = border_edges([&[0usize, 1, 2, 3][..]]);
        let params = TriQuadParams::default();
        let er = er_graph(&tris, &bord, &points, &params);
        assert_eq!(er.len(), 1);
        // Max angle 90 and four triangle corners at the shared vertices.
        assert!((er[0].weight - (90.0 + 10.0 * 4.0)).abs() < 1e-9);
        let mut rng = StdRng::seed_from_u64(0);
        let mut diags = Diagnostics::new();
        let faces = quadrangulate(&tris, &bord, &points, &params, &mut rng, &mut diags);
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0], vec![0, 1, 2, 3]);
    }

    #[test]
    fn concave_pair_is_not_merged() {
        // Arrow-head: merging would give a reflex corner at 3.
        let points = Points::from_xy(&[(0.0, 0.0), (2.0, 1.0), (0.0, 2.0), (0.5, 1.0)]);
        let tris = [[0, 1, 3], [3, 1, 2]];
        let bord = border_edges([&[0usize, 1, 2, 3][..]]);
        let params = TriQuadParams::default();
        assert!(er_graph(&tris, &bord, &points, &params).is_empty());
        let mut rng = StdRng::seed_from_u64(0);
        let mut diags = Diagnostics::new();
        let faces = quadrangulate(&tris, &bord, &points, &params, &mut rng, &mut diags);
        assert_eq!(faces.len(), 2);
    }

    /// A 1 by `n` strip with vertices on every integer x.
    fn strip(n: u32) -> (Points, Vec<usize>) {
        let mut coords: Vec<(f64, f64)> = (0..=n).map(|i| (f64::from(i), 0.0)).collect();
        coords.extend((0..=n).rev().map(|i| (f64::from(i), 1.0)));
        let face = (0..coords.len()).collect();
        (Points::from_xy(&coords), face)
    }

    fn assert_convex(face: &[usize], points: &Points) {
        let n = face.len();
        for i in 0..n {
            let a = points.get(face[(i + n - 1) % n]);
            let b = points.get(face[i]);
            let c = points.get(face[(i + 1) % n]);
            assert!((b - a).xy().perp(&(c - b).xy()) > -1e-9, "reflex corner at {}", face[i]);
        }
    }

    fn strip_triangles(n: u32) -> (Points, Vec<[usize; 3]>, HashSet<EdgeKey>) {
        let (points, face) = strip(n);
        let tris = crate::tessellation::triangulate_face(&face, &points).into_value();
        let bord = border_edges([face.as_slice()]);
        (points, tris, bord)
    }

    #[test]
    fn long_strip_uses_exact_matching_quickly() {
        let (points, tris, bord) = strip_triangles(20);
        let params = TriQuadParams::default();
        let er = er_graph(&tris, &bord, &points, &params);
        assert!(er.len() <= params.exact_match_threshold);

        let mut rng = StdRng::seed_from_u64(0);
        let mut diags = Diagnostics::new();
        let start = std::time::Instant::now();
        let faces = quadrangulate(&tris, &bord, &points, &params, &mut rng, &mut diags);
        assert!(start.elapsed().as_secs() < 5);
        assert!(diags.is_empty());

        let area: f64 = faces.iter().map(|f| signed_area(f, &points)).sum();
        assert!((area - 20.0).abs() < 1e-9);
        for f in &faces {
            assert_convex(f, &points);
        }

        let graph: Vec<MatchEdge> = er
            .iter()
            .map(|e| MatchEdge::new(e.ta, e.tb, e.weight))
            .collect();
        let exact = max_match(&graph, &mut rng);
        let greedy = greedy_match(&graph);
        assert!(total_weight(&exact) + 1e-9 >= total_weight(&greedy));
    }

    #[test]
    fn greedy_matching_uses_each_triangle_once() {
        let (points, tris, bord) = strip_triangles(12);
        let params = TriQuadParams {
            exact_match_threshold: 0,
            ..TriQuadParams::default()
        };
        let er = er_graph(&tris, &bord, &points, &params);
        let graph: Vec<MatchEdge> = er
            .iter()
            .map(|e| MatchEdge::new(e.ta, e.tb, e.weight))
            .collect();
        assert!(is_matching(&greedy_match(&graph)));

        let mut rng = StdRng::seed_from_u64(0);
        let mut diags = Diagnostics::new();
        let faces = quadrangulate(&tris, &bord, &points, &params, &mut rng, &mut diags);
        let used: usize = faces.iter().map(|f| if f.len() == 4 { 2 } else { 1 }).sum();
        assert_eq!(used, tris.len());
        let area: f64 = faces.iter().map(|f| signed_area(f, &points)).sum();
        assert!((area - 12.0).abs() < 1e-9);
        for f in &faces {
            assert_convex(f, &points);
        }
    }
}
