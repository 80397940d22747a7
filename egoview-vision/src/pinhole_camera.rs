use egoview_core::{PointCoordinates, Real};
use sophus::{
    core::linalg::VecF64, image::ImageSize,
    sensor::camera_enum::perspective_camera::PinholeCameraF64,
};

#[derive(Clone, Debug)]
pub struct PinholeCamera {
    pub model: PinholeCameraF64,
}

impl PinholeCamera {
    pub fn new(model: PinholeCameraF64) -> Self {
        Self { model }
    }

    /// Square pixels, principal point at the image centre.
    pub fn from_focal_length(focal_length_px: Real, width: usize, height: usize) -> Self {
        Self::new(PinholeCameraF64::from_params_and_size(
            &VecF64::<4>::new(
                focal_length_px,
                focal_length_px,
                width as Real / 2.0,
                height as Real / 2.0,
            ),
            ImageSize::new(width, height),
        ))
    }

    pub fn cols(&self) -> usize {
        self.model.image_size().width
    }

    pub fn rows(&self) -> usize {
        self.model.image_size().height
    }

    /// Lift an image point `(row, col, depth)` into the camera frame,
    /// returned as `(Y, X, Z)` so the axis order is unchanged.
    pub fn back_project(&self, image_point: &PointCoordinates) -> PointCoordinates {
        let params = self.model.params();
        let (fx, fy, cx, cy) = (params[0], params[1], params[2], params[3]);
        let (row, col, depth) = (image_point[0], image_point[1], image_point[2]);
        PointCoordinates::new(
            (row - cy) * depth / fy,
            (col - cx) * depth / fx,
            depth,
        )
    }
}
