pub mod error;
pub mod geom;
pub mod math;
pub mod operations;
pub mod tessellation;

pub use error::{Diagnosed, Diagnostic, DiagnosticKind, Diagnostics, InsetError, Outcome, Result};
