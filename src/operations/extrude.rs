use std::collections::HashMap;

use super::bevel::add_filled_region;
use crate::error::{Diagnostics, GeometryError, OperationError, Result};
use crate::geom::{Model, PolyArea};
use crate::math::{Point3, TOL};

/// Extrudes regions of a model downwards along `-Z`.
pub struct Extrude {
    depth: f64,
    cap_back: bool,
}

impl Extrude {
    /// Creates a new `Extrude` operation.
    #[must_use]
    pub fn new(depth: f64, cap_back: bool) -> Self {
        Self { depth, cap_back }
    }

    /// Adds a side wall for every edge of every loop of `polyareas`, whose
    /// indices refer to `model.points`. With `cap_back` the lowered regions
    /// are also filled, facing `-Z`.
    ///
    /// # Errors
    ///
    /// Returns an error if the depth is negative or not finite, the model's
    /// points are not three-dimensional, or a loop has an out-of-range index.
    pub fn execute<D: Clone>(
        &self,
        model: &mut Model<D>,
        polyareas: &[PolyArea<D>],
    ) -> Result<Diagnostics> {
        if !self.depth.is_finite() || self.depth < 0.0 {
            return Err(OperationError::InvalidParameter {
                parameter: "depth",
                value: self.depth,
                reason: "must be finite and non-negative",
            }
            .into());
        }
        if !model.points.is_3d() {
            return Err(GeometryError::NotThreeDimensional.into());
        }
        for pa in polyareas {
            for l in pa.loops() {
                model.points.check_indices(l)?;
            }
        }
        let mut diags = Diagnostics::new();
        if self.depth < TOL {
            diags.degenerate("zero extrusion depth, nothing added");
            return Ok(diags);
        }
        let mut lowered = HashMap::new();
        for pa in polyareas {
            let poly = self.extrude_loop(model, &pa.poly, &pa.data, &mut lowered);
            let holes = pa
                .holes
                .iter()
                .map(|h| self.extrude_loop(model, h, &pa.data, &mut lowered))
                .collect();
            if self.cap_back {
                let back = PolyArea::new(poly, holes, pa.data.clone());
                let first = model.num_faces();
                add_filled_region(model, &back, true, &mut diags);
                for f in &mut model.faces[first..] {
                    f.reverse();
                }
            }
        }
        tracing::debug!(
            regions = polyareas.len(),
            faces = model.num_faces(),
            "extruded"
        );
        Ok(diags)
    }

    /// Adds the side quads of one loop and returns the lowered loop.
    ///
    /// Lowered points are always new points, even when the depth is below
    /// the point-merge precision; `lowered` maps each top vertex to its copy
    /// so regions sharing a vertex share its copy too.
    fn extrude_loop<D: Clone>(
        &self,
        model: &mut Model<D>,
        lp: &[usize],
        data: &D,
        lowered_of: &mut HashMap<usize, usize>,
    ) -> Vec<usize> {
        let lowered: Vec<usize> = lp
            .iter()
            .map(|&v| {
                *lowered_of.entry(v).or_insert_with(|| {
                    let p = *model.points.get(v);
                    model
                        .points
                        .add_point_dup(Point3::new(p.x, p.y, p.z - self.depth))
                })
            })
            .collect();
        let n = lp.len();
        for i in 0..n {
            let j = (i + 1) % n;
            model.push_face(vec![lp[i], lowered[i], lowered[j], lp[j]], data.clone());
        }
        lowered
    }
}

/// Extrudes `polyareas` in `model` by `depth`. See [`Extrude::execute`].
///
/// # Errors
///
/// Returns an error if the depth is invalid or the model's points are not
/// three-dimensional.
pub fn extrude_poly_areas_in_model<D: Clone>(
    model: &mut Model<D>,
    polyareas: &[PolyArea<D>],
    depth: f64,
    cap_back: bool,
) -> Result<Diagnostics> {
    Extrude::new(depth, cap_back).execute(model, polyareas)
}
