use super::Points;
use crate::error::Result;
use crate::math::polygon_2d::newell_sum;

/// A polygon mesh over a shared point set.
///
/// Faces are counter-clockwise index loops of length three or more;
/// `face_data` runs parallel to `faces`.
#[derive(Debug, Clone)]
pub struct Model<D> {
    pub points: Points,
    pub faces: Vec<Vec<usize>>,
    pub face_data: Vec<D>,
}

impl<D> Default for Model<D> {
    fn default() -> Self {
        Self {
            points: Points::new(),
            faces: Vec::new(),
            face_data: Vec::new(),
        }
    }
}

impl<D> Model<D> {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model with no faces over `points`.
    #[must_use]
    pub fn with_points(points: Points) -> Self {
        Self {
            points,
            faces: Vec::new(),
            face_data: Vec::new(),
        }
    }

    /// Appends a face after checking its indices against the point set.
    ///
    /// # Errors
    ///
    /// Returns an error if any index is out of range.
    pub fn add_face(&mut self, face: Vec<usize>, data: D) -> Result<()> {
        self.points.check_indices(&face)?;
        self.push_face(face, data);
        Ok(())
    }

    /// Appends a face whose indices are known to be valid.
    pub(crate) fn push_face(&mut self, face: Vec<usize>, data: D) {
        self.faces.push(face);
        self.face_data.push(data);
    }

    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Area of face `f` measured in its own plane.
    #[must_use]
    pub fn face_area(&self, f: usize) -> f64 {
        self.faces
            .get(f)
            .map_or(0.0, |face| 0.5 * newell_sum(face, &self.points).norm())
    }

    /// Sum of all face areas.
    #[must_use]
    pub fn total_area(&self) -> f64 {
        (0..self.faces.len()).map(|f| self.face_area(f)).sum()
    }
}
