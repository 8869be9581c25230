use super::Points;
use crate::math::polygon_2d::{newell_normal, point_inside, signed_area, Containment};
use crate::math::{Point3, Vector3};

/// A polygon with holes over a shared [`Points`] set.
///
/// The outer loop is counter-clockwise, every hole is clockwise and lies
/// inside the outer loop. `data` is an opaque payload carried to every face
/// derived from this region.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyArea<D> {
    pub poly: Vec<usize>,
    pub holes: Vec<Vec<usize>>,
    pub data: D,
}

impl<D> PolyArea<D> {
    /// Creates a region from an outer loop and hole loops.
    #[must_use]
    pub fn new(poly: Vec<usize>, holes: Vec<Vec<usize>>, data: D) -> Self {
        Self { poly, holes, data }
    }

    /// Adds `hole` (a region over `hole_points`) as a hole of this region.
    ///
    /// The hole's points are imported into `points` and its outer loop is
    /// reversed, since holes wind opposite to the outer loop.
    pub fn add_hole<E>(&mut self, points: &mut Points, hole: &PolyArea<E>, hole_points: &Points) {
        let vmap = points.add_points(hole_points, false);
        let mut hole_poly: Vec<usize> = hole.poly.iter().map(|&i| vmap[i]).collect();
        hole_poly.reverse();
        self.holes.push(hole_poly);
    }

    /// Returns true if every vertex of `poly` lies inside or on the outer loop.
    #[must_use]
    pub fn contains_poly(&self, poly: &[usize], points: &Points) -> bool {
        poly.iter()
            .all(|&v| point_inside(points.get(v), &self.poly, points) != Containment::Outside)
    }

    /// Classifies a single point against the outer loop.
    #[must_use]
    pub fn point_inside(&self, p: &Point3, points: &Points) -> Containment {
        point_inside(p, &self.poly, points)
    }

    /// Average normal of the outer loop by Newell's method.
    ///
    /// Two-dimensional point sets and loops with fewer than three vertices
    /// have no usable normal; `+Z` is returned and a warning logged.
    #[must_use]
    pub fn normal(&self, points: &Points) -> Vector3 {
        if points.is_empty() || !points.is_3d() || self.poly.len() < 3 {
            tracing::warn!(
                vertices = self.poly.len(),
                is_3d = points.is_3d(),
                "not enough data to compute a polygon normal, using +Z"
            );
            return Vector3::z();
        }
        newell_normal(&self.poly, points)
    }

    /// Signed XY area of the outer loop plus the (negative) areas of the
    /// holes.
    #[must_use]
    pub fn net_area(&self, points: &Points) -> f64 {
        self.loops().map(|l| signed_area(l, points)).sum()
    }

    /// Iterates the outer loop followed by every hole.
    pub fn loops(&self) -> impl Iterator<Item = &Vec<usize>> {
        std::iter::once(&self.poly).chain(self.holes.iter())
    }
}

/// A collection of regions sharing one point set.
#[derive(Debug, Clone)]
pub struct PolyAreas<D> {
    pub points: Points,
    pub polyareas: Vec<PolyArea<D>>,
}

impl<D> Default for PolyAreas<D> {
    fn default() -> Self {
        Self {
            points: Points::new(),
            polyareas: Vec::new(),
        }
    }
}

impl<D> PolyAreas<D> {
    /// Creates an empty collection with an empty point set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection over an existing point set.
    #[must_use]
    pub fn with_points(points: Points) -> Self {
        Self {
            points,
            polyareas: Vec::new(),
        }
    }

    /// Axis-aligned bounds `(min, max)` of every point in the set.
    ///
    /// Returns `None` for an empty set.
    #[must_use]
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let first = *self.points.pos().first()?;
        let mut min = first;
        let mut max = first;
        for p in self.points.pos() {
            min = min.inf(p);
            max = max.sup(p);
        }
        Some((min, max))
    }

    /// Uniformly scales and recenters all points so the larger XY side of the
    /// bounding box equals `target_span` and the box is centered on the
    /// origin. Heights are scaled but not recentered.
    pub fn scale_and_center(&mut self, target_span: f64) {
        let Some((min, max)) = self.bounds() else {
            return;
        };
        let max_side = (max.x - min.x).max(max.y - min.y);
        let scale = if max_side > 0.0 {
            target_span / max_side
        } else {
            1.0
        };
        let cx = 0.5 * (max.x + min.x);
        let cy = 0.5 * (max.y + min.y);
        self.points
            .transform(|p| Point3::new(scale * (p.x - cx), scale * (p.y - cy), scale * p.z));
    }
}
