mod bevel;
mod extrude;
pub mod offset;
mod region;

pub use bevel::{
    bevel_poly_area_in_model, bevel_selection_in_model, polyareas_to_model, Bevel, BevelParams,
};
pub use extrude::{extrude_poly_areas_in_model, Extrude};
pub use region::region_to_poly_areas;
