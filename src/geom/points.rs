use std::collections::HashMap;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, INVDISTTOL};

/// Quantized coordinate used as the deduplication key.
pub type QuantKey = (i64, i64, i64);

/// An append-only set of points with quantized deduplication.
///
/// Points whose coordinates round to the same grid cell (spacing
/// [`DISTTOL`](crate::math::DISTTOL)) share one index unless duplicates are
/// requested explicitly. Two-dimensional sets keep `z == 0` until
/// [`add_z_coord`](Self::add_z_coord) promotes them.
#[derive(Debug, Clone, Default)]
pub struct Points {
    pos: Vec<Point3>,
    invmap: HashMap<QuantKey, usize>,
    three_d: bool,
}

impl Points {
    /// Creates a new, empty two-dimensional point set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a two-dimensional point set from `(x, y)` pairs.
    #[must_use]
    pub fn from_xy(coords: &[(f64, f64)]) -> Self {
        let mut points = Self::new();
        for &(x, y) in coords {
            points.add_point(Point3::new(x, y, 0.0));
        }
        points
    }

    /// Creates a three-dimensional point set from `(x, y, z)` triples.
    #[must_use]
    pub fn from_xyz(coords: &[(f64, f64, f64)]) -> Self {
        let mut points = Self {
            three_d: true,
            ..Self::default()
        };
        for &(x, y, z) in coords {
            points.add_point(Point3::new(x, y, z));
        }
        points
    }

    /// Quantizes `p` to the deduplication grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn quantize(&self, p: &Point3) -> QuantKey {
        let q = |v: f64| (v * INVDISTTOL).round() as i64;
        let z = if self.three_d { q(p.z) } else { 0 };
        (q(p.x), q(p.y), z)
    }

    /// Adds `p`, reusing the index of an existing point in the same grid cell.
    pub fn add_point(&mut self, p: Point3) -> usize {
        self.insert(p, false)
    }

    /// Adds `p` as a new point even if an equal point exists.
    pub fn add_point_dup(&mut self, p: Point3) -> usize {
        self.insert(p, true)
    }

    fn insert(&mut self, p: Point3, allow_dups: bool) -> usize {
        let p = if self.three_d { p } else { Point3::new(p.x, p.y, 0.0) };
        let key = self.quantize(&p);
        if !allow_dups {
            if let Some(&i) = self.invmap.get(&key) {
                return i;
            }
        }
        let i = self.pos.len();
        // A duplicate never takes over the cell of the point it copies.
        self.invmap.entry(key).or_insert(i);
        self.pos.push(p);
        i
    }

    /// Imports every point of `other`, returning the index map from `other`'s
    /// indices to this set's indices.
    pub fn add_points(&mut self, other: &Points, allow_dups: bool) -> Vec<usize> {
        other.pos.iter().map(|&p| self.insert(p, allow_dups)).collect()
    }

    /// Promotes a two-dimensional set to three dimensions by giving every
    /// point the height `z`. Indices are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::AlreadyThreeDimensional`] if the set was
    /// already promoted.
    pub fn add_z_coord(&mut self, z: f64) -> Result<()> {
        if self.three_d {
            return Err(GeometryError::AlreadyThreeDimensional.into());
        }
        self.three_d = true;
        let mut invmap = HashMap::with_capacity(self.pos.len());
        for i in 0..self.pos.len() {
            self.pos[i].z = z;
            let key = self.quantize(&self.pos[i]);
            invmap.entry(key).or_insert(i);
        }
        self.invmap = invmap;
        Ok(())
    }

    /// Moves point `i` vertically by `delta`.
    ///
    /// The lookup key of the point is not updated, so later insertions
    /// deduplicate against its original height.
    ///
    /// # Errors
    ///
    /// Returns an error if the set is two-dimensional or `i` is out of range.
    pub fn add_to_z(&mut self, i: usize, delta: f64) -> Result<()> {
        if !self.three_d {
            return Err(GeometryError::NotThreeDimensional.into());
        }
        let len = self.pos.len();
        let p = self
            .pos
            .get_mut(i)
            .ok_or(GeometryError::IndexOutOfRange { index: i, len })?;
        p.z += delta;
        Ok(())
    }

    /// Overwrites every position through `f` and rebuilds the lookup table.
    pub fn transform(&mut self, f: impl Fn(&Point3) -> Point3) {
        for p in &mut self.pos {
            *p = f(p);
            if !self.three_d {
                p.z = 0.0;
            }
        }
        let mut invmap = HashMap::with_capacity(self.pos.len());
        for (i, p) in self.pos.iter().enumerate() {
            invmap.entry(self.quantize(p)).or_insert(i);
        }
        self.invmap = invmap;
    }

    /// Returns the position of point `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range; indices handed out by this set are
    /// always valid.
    #[must_use]
    pub fn get(&self, i: usize) -> &Point3 {
        &self.pos[i]
    }

    /// Returns all positions in index order.
    #[must_use]
    pub fn pos(&self) -> &[Point3] {
        &self.pos
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    /// Returns true once [`add_z_coord`](Self::add_z_coord) has run, or for
    /// sets created from 3D coordinates.
    #[must_use]
    pub fn is_3d(&self) -> bool {
        self.three_d
    }

    /// Checks that every index of `face` is valid for this set.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::IndexOutOfRange`] for the first bad index.
    pub fn check_indices(&self, face: &[usize]) -> Result<()> {
        let len = self.pos.len();
        match face.iter().find(|&&i| i >= len) {
            Some(&index) => Err(GeometryError::IndexOutOfRange { index, len }.into()),
            None => Ok(()),
        }
    }
}
