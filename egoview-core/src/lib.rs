mod dataset;
pub use dataset::*;
mod error;
pub use error::*;
mod log_sink;
pub use log_sink::*;
pub mod geometry;
pub mod scene;

use nalgebra::Vector3;

pub type Real = f64;

/// 3D point stored as `(y, x, z)`: image row (or camera Y), image column (or
/// camera X), depth. Every consumer keeps this order; only presentation code
/// swaps to `(x, y, z)`.
pub type PointCoordinates = Vector3<Real>;

/// Label standing for the capturing viewpoint itself.
pub const CAMERA_PERSPECTIVE: &str = "camera";
