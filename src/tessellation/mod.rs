mod cdt;
pub mod matching;
mod quadrangulate;
mod triangulate;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Diagnosed, Diagnostics};
use crate::geom::Points;

pub(crate) use cdt::{edge_key, EdgeKey};

/// Parameters controlling quadrangulation.
#[derive(Debug, Clone, Copy)]
pub struct TriQuadParams {
    /// Largest edge-removal graph solved by exact matching; bigger graphs
    /// use the greedy matching.
    pub exact_match_threshold: usize,
    /// Weight given to how close the merged quad's largest angle is to 90°.
    pub angle_factor: f64,
    /// Weight given to the triangle degree of the removed diagonal's ends.
    pub degree_factor: f64,
    /// Seed for the random pivot of the exact matching.
    pub seed: u64,
}

impl Default for TriQuadParams {
    fn default() -> Self {
        Self {
            exact_match_threshold: 75,
            angle_factor: 1.0,
            degree_factor: 10.0,
            seed: 0,
        }
    }
}

/// Triangulates a counter-clockwise face.
#[must_use]
pub fn triangulate_face(face: &[usize], points: &Points) -> Diagnosed<Vec<[usize; 3]>> {
    triangulate_face_with_holes(face, &[], points)
}

/// Triangulates a counter-clockwise face with clockwise holes.
///
/// Every hole is spliced into the outer loop, the result is ear clipped,
/// and the triangulation is improved by constrained Delaunay flipping.
/// Loop edges of the face and the holes are never flipped.
#[must_use]
pub fn triangulate_face_with_holes(
    face: &[usize],
    holes: &[Vec<usize>],
    points: &Points,
) -> Diagnosed<Vec<[usize; 3]>> {
    let mut diags = Diagnostics::new();
    let tris = triangulate_into(face, holes, points, &mut diags);
    Diagnosed::new(tris, diags)
}

/// Splits a counter-clockwise face into triangles and convex quads.
#[must_use]
pub fn quadrangulate_face(face: &[usize], points: &Points) -> Diagnosed<Vec<Vec<usize>>> {
    quadrangulate_face_with_params(face, &[], points, &TriQuadParams::default())
}

/// Splits a counter-clockwise face with clockwise holes into triangles and
/// convex quads.
#[must_use]
pub fn quadrangulate_face_with_holes(
    face: &[usize],
    holes: &[Vec<usize>],
    points: &Points,
) -> Diagnosed<Vec<Vec<usize>>> {
    quadrangulate_face_with_params(face, holes, points, &TriQuadParams::default())
}

/// [`quadrangulate_face_with_holes`] with explicit parameters. The matching
/// pivot is drawn from a [`StdRng`] seeded with `params.seed`.
#[must_use]
pub fn quadrangulate_face_with_params(
    face: &[usize],
    holes: &[Vec<usize>],
    points: &Points,
    params: &TriQuadParams,
) -> Diagnosed<Vec<Vec<usize>>> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    quadrangulate_face_with_rng(face, holes, points, params, &mut rng)
}

/// [`quadrangulate_face_with_holes`] drawing matching pivots from `rng`.
#[must_use]
pub fn quadrangulate_face_with_rng<R: Rng>(
    face: &[usize],
    holes: &[Vec<usize>],
    points: &Points,
    params: &TriQuadParams,
    rng: &mut R,
) -> Diagnosed<Vec<Vec<usize>>> {
    let mut diags = Diagnostics::new();
    if holes.is_empty() && face.len() <= 3 {
        return Diagnosed::clean(vec![face.to_vec()]);
    }
    let tris = triangulate_into(face, holes, points, &mut diags);
    let bord = cdt::border_edges(std::iter::once(face).chain(holes.iter().map(Vec::as_slice)));
    let quads = quadrangulate::quadrangulate(&tris, &bord, points, params, rng, &mut diags);
    tracing::debug!(faces = quads.len(), triangles = tris.len(), "quadrangulated face");
    Diagnosed::new(quads, diags)
}

fn triangulate_into(
    face: &[usize],
    holes: &[Vec<usize>],
    points: &Points,
    diags: &mut Diagnostics,
) -> Vec<[usize; 3]> {
    let joined = if holes.is_empty() {
        face.to_vec()
    } else {
        triangulate::join_islands(face, holes, points, diags)
    };
    match joined.len() {
        0..=2 => {
            diags.degenerate(format!("face with {} vertices has no area", joined.len()));
            return Vec::new();
        }
        3 => return vec![[joined[0], joined[1], joined[2]]],
        _ => {}
    }
    let tris = triangulate::ear_chop_tri_face(&joined, points, diags);
    let bord = cdt::border_edges(std::iter::once(face).chain(holes.iter().map(Vec::as_slice)));
    cdt::cdt(tris, &bord, points, diags)
}
