pub mod intersect_2d;
pub mod polygon_2d;
pub mod predicates;

/// 3D point type. Two-dimensional data keeps `z == 0`.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix, used for orthonormal basis changes.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Tolerance of the orientation, in-circle and intersection predicates.
///
/// Governs what every higher-level algorithm treats as degenerate.
pub const TOL: f64 = 1e-7;

/// Loops with an absolute area below this are dropped.
pub const AREATOL: f64 = 1e-4;

/// Grid spacing used to quantize coordinates for point deduplication.
pub const DISTTOL: f64 = 1e-3;

/// Reciprocal of [`DISTTOL`].
pub const INVDISTTOL: f64 = 1e3;
