use crate::geom::Points;
use crate::math::intersect_2d::line_line_intersect_2d;
use crate::math::predicates::{angle, ccw};
use crate::math::{Point3, Vector3, TOL};

/// Speed given to spokes at spikes and near-zero angles.
const MAX_SPEED: f64 = 1e7;

/// The path of one wavefront vertex during a generation.
///
/// The vertex starts at `origin` and moves along the unit bisector `dir` at
/// `speed`, which keeps both adjacent edges moving at unit speed.
#[derive(Debug, Clone, PartialEq)]
pub struct Spoke {
    pub origin: usize,
    pub dest: Option<usize>,
    /// Loop of the generation this spoke belongs to, outer loop first.
    pub face: usize,
    /// Position of `origin` within that loop.
    pub index: usize,
    pub(crate) start: Point3,
    pub(crate) dir: Vector3,
    pub(crate) speed: f64,
    pub is_reflex: bool,
}

impl Spoke {
    /// Builds the spoke at `v` of a loop where `prev` and `next` are its
    /// neighbours. The region lies to the left of the loop.
    pub(crate) fn new(v: usize, prev: usize, next: usize, points: &Points) -> Self {
        let vo = points.get(v);
        let vp = points.get(prev);
        let vn = points.get(next);
        let uin = unit_xy(vo - vp);
        let uout = unit_xy(vn - vo);
        let sum = uin + uout;
        let start = *vo;
        if sum.norm() < TOL {
            // In and out directions cancel: a spike.
            return Self {
                origin: v,
                dest: None,
                face: 0,
                index: 0,
                start,
                dir: uout,
                speed: MAX_SPEED,
                is_reflex: false,
            };
        }
        let uavg = sum.normalize();
        let half = angle(prev, v, next, points).to_radians() / 2.0;
        let sin_half = half.sin();
        let speed = if sin_half.abs() < TOL {
            MAX_SPEED
        } else {
            (1.0 / sin_half).min(MAX_SPEED)
        };
        Self {
            origin: v,
            dest: None,
            face: 0,
            index: 0,
            start,
            dir: Vector3::new(-uavg.y, uavg.x, 0.0),
            speed,
            is_reflex: ccw(next, v, prev, points),
        }
    }

    /// Places the spoke at position `index` of loop `face`.
    #[must_use]
    pub(crate) fn in_loop(mut self, face: usize, index: usize) -> Self {
        self.face = face;
        self.index = index;
        self
    }

    /// Position after moving for `t`, rising by `vspeed * t`.
    pub(crate) fn end_point(&self, t: f64, vspeed: f64) -> Point3 {
        let st = self.speed * t;
        Point3::new(
            self.start.x + self.dir.x * st,
            self.start.y + self.dir.y * st,
            self.start.z + vspeed * t,
        )
    }

    /// Time at which this spoke and `other` reach the crossing of their
    /// rays, or `None` if the rays are parallel or cross behind either start.
    ///
    /// The later of the two arrival times is used: the edge between them
    /// only vanishes once both ends reach the crossing.
    pub(crate) fn vertex_event(&self, other: &Spoke) -> Option<f64> {
        if self.origin == other.origin {
            return None;
        }
        let (s, u) = line_line_intersect_2d(&self.start, &self.dir, &other.start, &other.dir)?;
        if s < -TOL || u < -TOL {
            return None;
        }
        Some((s.max(0.0) / self.speed).max(u.max(0.0) / other.speed))
    }

    /// Time at which this (reflex) spoke hits the wavefront edge running
    /// from spoke `e1` to spoke `e2`, or `None` if it never does while the
    /// hit point stays between the edge's moving ends.
    pub(crate) fn edge_event(&self, e1: &Spoke, e2: &Spoke) -> Option<f64> {
        let edge = e2.start - e1.start;
        let len = edge.xy().norm();
        if len < TOL {
            return None;
        }
        let along = Vector3::new(edge.x / len, edge.y / len, 0.0);
        let normal = Vector3::new(-along.y, along.x, 0.0);
        let d0 = normal.dot(&flat(self.start - e1.start));
        if d0 < -TOL {
            return None;
        }
        let closing = 1.0 - self.speed * normal.dot(&self.dir);
        if closing < TOL {
            return None;
        }
        let t = d0.max(0.0) / closing;
        let hit = self.end_point(t, 0.0);
        let end1 = e1.end_point(t, 0.0);
        let end2 = e2.end_point(t, 0.0);
        let from_start = along.dot(&flat(hit - end1));
        let to_end = along.dot(&flat(end2 - hit));
        if from_start < -TOL || to_end < -TOL {
            return None;
        }
        Some(t)
    }
}

fn flat(v: Vector3) -> Vector3 {
    Vector3::new(v.x, v.y, 0.0)
}

fn unit_xy(v: Vector3) -> Vector3 {
    let f = flat(v);
    let len = f.norm();
    if len < TOL {
        Vector3::zeros()
    } else {
        f / len
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A 10x10 square with a notch pointing right towards the edge x = 10.
    fn notch() -> Points {
        Points::from_xy(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (0.0, 6.0),
            (8.0, 5.0),
            (0.0, 4.0),
        ])
    }

    #[test]
    fn square_corner_moves_along_diagonal() {
        let points = Points::from_xy(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let s = Spoke::new(0, 3, 1, &points);
        assert!(!s.is_reflex);
        assert_relative_eq!(s.speed, std::f64::consts::SQRT_2, epsilon = 1e-12);
        let p = s.end_point(1.0, 0.0);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn opposite_corners_meet_at_center() {
        let points = Points::from_xy(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let a = Spoke::new(0, 3, 1, &points);
        let b = Spoke::new(1, 0, 2, &points);
        assert_relative_eq!(a.vertex_event(&b).unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn reflex_vertex_hits_far_edge() {
        let points = notch();
        let r = Spoke::new(5, 4, 6, &points);
        assert!(r.is_reflex);
        let e1 = Spoke::new(1, 0, 2, &points);
        let e2 = Spoke::new(2, 1, 3, &points);
        let t = r.edge_event(&e1, &e2).unwrap();
        let hit = r.end_point(t, 0.0);
        assert_relative_eq!(hit.x, 10.0 - t, epsilon = 1e-9);
        assert_relative_eq!(hit.y, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn edge_behind_spoke_is_ignored() {
        let points = notch();
        let r = Spoke::new(5, 4, 6, &points);
        // The edge 3 -> 4 on x = 0 is behind the notch tip.
        let e1 = Spoke::new(3, 2, 4, &points);
        let e2 = Spoke::new(4, 3, 5, &points);
        assert!(r.edge_event(&e1, &e2).is_none());
    }
}
