mod mesh;
mod points;
mod polyarea;

pub use mesh::Model;
pub use points::{Points, QuantKey};
pub use polyarea::{PolyArea, PolyAreas};
