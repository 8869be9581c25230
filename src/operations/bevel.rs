use super::offset::Offset;
use super::region::region_to_poly_areas;
use crate::error::{Diagnosed, Diagnostics, GeometryError, OperationError, Result};
use crate::geom::{Model, PolyArea, PolyAreas, Points};
use crate::math::{Matrix3, Vector3, TOL};
use crate::tessellation::{quadrangulate_face_with_holes, triangulate_face_with_holes};

/// Parameters of a bevel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BevelParams {
    /// Inset distance, or a percentage of the full inset when `as_percent`.
    pub amount: f64,
    /// Bevel slope in radians; `0` keeps the inset flat.
    pub pitch: f64,
    /// Fill the inner regions with quads where possible instead of triangles.
    pub quadrangulate: bool,
    /// Treat `amount` as a percentage of the distance at which the region
    /// collapses.
    pub as_percent: bool,
    /// Merge adjacent selected faces into regions before beveling.
    pub as_region: bool,
}

impl BevelParams {
    fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(OperationError::InvalidParameter {
                parameter: "amount",
                value: self.amount,
                reason: "must be finite and non-negative",
            }
            .into());
        }
        if !self.pitch.is_finite() || self.pitch.abs() >= std::f64::consts::FRAC_PI_2 {
            return Err(OperationError::InvalidParameter {
                parameter: "pitch",
                value: self.pitch,
                reason: "must lie strictly between -pi/2 and pi/2",
            }
            .into());
        }
        Ok(())
    }
}

/// Bevels one region into a model.
pub struct Bevel {
    params: BevelParams,
}

impl Bevel {
    /// Creates a new `Bevel` operation.
    #[must_use]
    pub fn new(params: BevelParams) -> Self {
        Self { params }
    }

    /// Insets `pa` (whose indices refer to `model.points`) and adds the bevel
    /// walls and the filled inner regions to `model`.
    ///
    /// The region is rotated into the XY plane through its Newell normal,
    /// offset there, and rotated back.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid, `model.points` is
    /// not three-dimensional, or `pa` has an out-of-range index.
    pub fn execute<D: Clone>(&self, model: &mut Model<D>, pa: &PolyArea<D>) -> Result<Diagnostics> {
        self.params.validate()?;
        if !model.points.is_3d() {
            return Err(GeometryError::NotThreeDimensional.into());
        }
        for l in pa.loops() {
            model.points.check_indices(l)?;
        }
        let mut diags = Diagnostics::new();
        let rot = plane_rotation(&pa.normal(&model.points));

        let mut local = Points::new();
        local.add_z_coord(0.0)?;
        let mut map_loop = |l: &[usize]| -> Vec<usize> {
            l.iter()
                .map(|&v| local.add_point(rot * *model.points.get(v)))
                .collect()
        };
        let poly = map_loop(&pa.poly);
        let holes = pa.holes.iter().map(|h| map_loop(h)).collect();
        let local_pa = PolyArea::new(poly, holes, pa.data.clone());

        let vspeed = self.params.pitch.tan();
        let amount = if self.params.as_percent {
            let mut trial_points = local.clone();
            let mut trial = Offset::new(local_pa.clone(), &trial_points, 0.0, vspeed);
            trial.build(&mut trial_points, f64::INFINITY);
            trial.max_amount() * self.params.amount / 100.0
        } else {
            self.params.amount
        };

        let mut lmodel: Model<D> = Model::with_points(local);
        let inner = if amount > 0.0 {
            let mut off = Offset::new(local_pa, &lmodel.points, 0.0, vspeed);
            off.build(&mut lmodel.points, amount);
            diags.extend(off.take_diagnostics());
            off.add_offset_faces_to_model(&mut lmodel)
        } else {
            vec![local_pa]
        };
        for ipa in &inner {
            add_filled_region(&mut lmodel, ipa, self.params.quadrangulate, &mut diags);
        }

        let back = rot.transpose();
        let vmap: Vec<usize> = lmodel
            .points
            .pos()
            .iter()
            .map(|&p| model.points.add_point(back * p))
            .collect();
        for (face, data) in lmodel.faces.into_iter().zip(lmodel.face_data) {
            let mut mapped: Vec<usize> = face.iter().map(|&v| vmap[v]).collect();
            mapped.dedup();
            while mapped.len() > 1 && mapped.first() == mapped.last() {
                mapped.pop();
            }
            if mapped.len() < 3 {
                diags.degenerate("bevel face collapsed when mapped back");
                continue;
            }
            model.push_face(mapped, data);
        }
        Ok(diags)
    }
}

/// Bevels `pa` into `model`. See [`Bevel::execute`].
///
/// # Errors
///
/// Returns an error if the parameters are invalid or the model's points
/// are not three-dimensional.
pub fn bevel_poly_area_in_model<D: Clone>(
    model: &mut Model<D>,
    pa: &PolyArea<D>,
    params: &BevelParams,
) -> Result<Diagnostics> {
    Bevel::new(*params).execute(model, pa)
}

/// Builds a model from regions lying in the XY plane.
///
/// Points are promoted to three dimensions at `z = 0`. Each region is
/// beveled when `amount > 0`, filled with quads and triangles when
/// `quadrangulate` is set, and otherwise added as its outer face (regions
/// with holes are triangulated instead).
///
/// # Errors
///
/// Returns an error if `amount` or `pitch` is invalid or a region has an
/// out-of-range index.
pub fn polyareas_to_model<D: Clone>(
    pas: &PolyAreas<D>,
    amount: f64,
    pitch: f64,
    quadrangulate: bool,
) -> Result<Diagnosed<Model<D>>> {
    let params = BevelParams {
        amount,
        pitch,
        quadrangulate,
        ..BevelParams::default()
    };
    params.validate()?;
    let mut model: Model<D> = Model::with_points(pas.points.clone());
    if !model.points.is_3d() {
        model.points.add_z_coord(0.0)?;
    }
    let mut diags = Diagnostics::new();
    for pa in &pas.polyareas {
        for l in pa.loops() {
            model.points.check_indices(l)?;
        }
        if amount > 0.0 {
            diags.extend(bevel_poly_area_in_model(&mut model, pa, &params)?);
        } else if quadrangulate || !pa.holes.is_empty() {
            add_filled_region(&mut model, pa, quadrangulate, &mut diags);
        } else {
            model.push_face(pa.poly.clone(), pa.data.clone());
        }
    }
    tracing::debug!(faces = model.num_faces(), points = model.points.len(), "model built");
    Ok(Diagnosed::new(model, diags))
}

/// Replaces the faces of `model` by their bevels.
///
/// With `as_region` the faces are first merged into regions, so shared
/// edges are not beveled.
///
/// # Errors
///
/// Returns an error if the parameters are invalid, the model's points are
/// not three-dimensional, or a face has an out-of-range index.
pub fn bevel_selection_in_model<D: Clone>(
    model: &mut Model<D>,
    params: &BevelParams,
) -> Result<Diagnostics> {
    params.validate()?;
    if !model.points.is_3d() {
        return Err(GeometryError::NotThreeDimensional.into());
    }
    let faces = std::mem::take(&mut model.faces);
    let data = std::mem::take(&mut model.face_data);
    let mut diags = Diagnostics::new();
    let pas = if params.as_region {
        region_to_poly_areas(&faces, &model.points, &data)?.merge_into(&mut diags)
    } else {
        faces
            .into_iter()
            .zip(data)
            .map(|(f, d)| PolyArea::new(f, Vec::new(), d))
            .collect()
    };
    for pa in &pas {
        diags.extend(bevel_poly_area_in_model(model, pa, params)?);
    }
    Ok(diags)
}

/// Triangulates or quadrangulates `pa` and appends the faces to `model`.
pub(crate) fn add_filled_region<D: Clone>(
    model: &mut Model<D>,
    pa: &PolyArea<D>,
    quadrangulate: bool,
    diags: &mut Diagnostics,
) {
    let faces: Vec<Vec<usize>> = if quadrangulate {
        quadrangulate_face_with_holes(&pa.poly, &pa.holes, &model.points).merge_into(diags)
    } else {
        triangulate_face_with_holes(&pa.poly, &pa.holes, &model.points)
            .merge_into(diags)
            .into_iter()
            .map(|t| t.to_vec())
            .collect()
    };
    for f in faces {
        model.push_face(f, pa.data.clone());
    }
}

/// Rotation taking `normal` to `+Z`.
///
/// The in-plane axes are built from the world axis least parallel to
/// `normal`.
fn plane_rotation(normal: &Vector3) -> Matrix3 {
    let n = normal.normalize();
    if (n - Vector3::z()).norm() < TOL {
        return Matrix3::identity();
    }
    let axis = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
        Vector3::x()
    } else if n.y.abs() <= n.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let u = axis.cross(&n).normalize();
    let v = n.cross(&u);
    Matrix3::from_rows(&[u.transpose(), v.transpose(), n.transpose()])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::InsetError;
    use crate::math::Point3;
    use approx::assert_relative_eq;

    fn square(side: f64) -> PolyAreas<u32> {
        let points = Points::from_xy(&[(0.0, 0.0), (side, 0.0), (side, side), (0.0, side)]);
        let mut pas = PolyAreas::with_points(points);
        pas.polyareas.push(PolyArea::new(vec![0, 1, 2, 3], vec![], 7));
        pas
    }

    #[test]
    fn rotation_maps_normal_to_z() {
        for n in [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(1.0, 2.0, 3.0).normalize(),
            Vector3::new(0.0, 0.0, -1.0),
        ] {
            let r = plane_rotation(&n);
            let z = r * n;
            assert_relative_eq!(z, Vector3::z(), epsilon = 1e-12);
            assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn flat_model_keeps_raw_face() {
        let out = polyareas_to_model(&square(1.0), 0.0, 0.0, false).unwrap();
        let model = out.value;
        assert!(model.points.is_3d());
        assert_eq!(model.faces, vec![vec![0, 1, 2, 3]]);
        assert_eq!(model.face_data, vec![7]);
    }

    #[test]
    fn flat_bevel_covers_the_square() {
        let out = polyareas_to_model(&square(4.0), 1.0, 0.0, true).unwrap();
        let model = out.value;
        // Four walls plus one inner quad.
        assert_eq!(model.num_faces(), 5);
        assert_relative_eq!(model.total_area(), 16.0, epsilon = 1e-6);
        assert!(model.face_data.iter().all(|&d| d == 7));
    }

    #[test]
    fn pitched_bevel_raises_the_inner_face() {
        let pitch = std::f64::consts::FRAC_PI_4;
        let model = polyareas_to_model(&square(4.0), 1.0, pitch, true).unwrap().value;
        let top = model.points.pos().iter().map(|p| p.z).fold(f64::MIN, f64::max);
        assert_relative_eq!(top, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn percent_bevel_uses_collapse_distance() {
        let pas = square(4.0);
        let mut model: Model<u32> = Model::with_points(pas.points.clone());
        model.points.add_z_coord(0.0).unwrap();
        let params = BevelParams {
            amount: 50.0,
            as_percent: true,
            quadrangulate: true,
            ..BevelParams::default()
        };
        bevel_poly_area_in_model(&mut model, &pas.polyareas[0], &params).unwrap();
        // Half of the collapse distance 2 is an inset of 1.
        let inner = model.faces.iter().find(|f| {
            f.iter().all(|&v| {
                let p = model.points.get(v);
                (p.x - 1.0).abs() < 1e-6 || (p.x - 3.0).abs() < 1e-6
            })
        });
        assert!(inner.is_some());
    }

    #[test]
    fn vertical_face_is_beveled_in_its_plane() {
        let points = Points::from_xyz(&[
            (0.0, 0.0, 0.0),
            (4.0, 0.0, 0.0),
            (4.0, 0.0, 4.0),
            (0.0, 0.0, 4.0),
        ]);
        let mut model: Model<()> = Model::with_points(points);
        // Counter-clockwise seen from -Y.
        model.add_face(vec![0, 1, 2, 3], ()).unwrap();
        let params = BevelParams {
            amount: 1.0,
            quadrangulate: true,
            ..BevelParams::default()
        };
        bevel_selection_in_model(&mut model, &params).unwrap();
        assert_eq!(model.num_faces(), 5);
        assert_relative_eq!(model.total_area(), 16.0, epsilon = 1e-6);
        assert!(model.points.pos().iter().all(|p| p.y.abs() < 1e-9));
        assert!(model
            .points
            .pos()
            .iter()
            .any(|p| (p - Point3::new(1.0, 0.0, 1.0)).norm() < 1e-6));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = polyareas_to_model(&square(1.0), -1.0, 0.0, false).unwrap_err();
        assert!(matches!(
            err,
            InsetError::Operation(OperationError::InvalidParameter { parameter: "amount", .. })
        ));
    }

    #[test]
    fn selection_needs_3d_points() {
        let mut model: Model<()> =
            Model::with_points(Points::from_xy(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]));
        let err = bevel_selection_in_model(&mut model, &BevelParams::default()).unwrap_err();
        assert!(matches!(err, InsetError::Geometry(GeometryError::NotThreeDimensional)));
    }

    /// Two unit squares sharing the edge 1 -> 4.
    fn two_squares() -> Model<u32> {
        let points = Points::from_xyz(&[
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (2.0, 0.0, 0.0),
            (2.0, 1.0, 0.0),
            (1.0, 1.0, 0.0),
            (0.0, 1.0, 0.0),
        ]);
        let mut model = Model::with_points(points);
        model.add_face(vec![0, 1, 4, 5], 1).unwrap();
        model.add_face(vec![1, 2, 3, 4], 2).unwrap();
        model
    }

    fn spans_shared_edge(model: &Model<u32>) -> bool {
        model.faces.iter().any(|f| f.contains(&1) && f.contains(&4))
    }

    #[test]
    fn region_bevel_leaves_shared_edge_alone() {
        let mut model = two_squares();
        let params = BevelParams {
            amount: 0.25,
            quadrangulate: true,
            as_region: true,
            ..BevelParams::default()
        };
        bevel_selection_in_model(&mut model, &params).unwrap();
        assert!(!spans_shared_edge(&model));
        assert_relative_eq!(model.total_area(), 2.0, epsilon = 1e-6);
        assert!(model.face_data.iter().all(|&d| d == 1));

        let mut separate = two_squares();
        let params = BevelParams {
            as_region: false,
            ..params
        };
        bevel_selection_in_model(&mut separate, &params).unwrap();
        assert!(spans_shared_edge(&separate));
        assert_relative_eq!(separate.total_area(), 2.0, epsilon = 1e-6);
    }
}
