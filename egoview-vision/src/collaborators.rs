//! Interfaces of the pretrained models the scene abstraction sequences.
//!
//! Implementations own their weights and device placement; errors they
//! return are propagated unchanged.

use anyhow::Result;
use egoview_core::scene::{BoundingBox, DepthMap, Mask, Orientation};
use image::RgbImage;

use crate::model_scope::ModelLifecycle;

/// Detector output; `boxes[i]` was matched to `labels[i]`.
#[derive(Clone, Debug, Default)]
pub struct Detections {
    pub boxes: Vec<BoundingBox>,
    pub labels: Vec<String>,
}

impl Detections {
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct DepthEstimate {
    pub depth_map: DepthMap,
    /// Reported when the estimator also recovers the camera focal length.
    pub focal_length_px: Option<f64>,
}

/// Image region handed to the orientation estimator, with the box it was cut
/// from.
#[derive(Clone, Debug)]
pub struct ObjectCrop {
    pub pixels: RgbImage,
    pub bbox: BoundingBox,
}

pub trait ObjectDetector: ModelLifecycle {
    fn detect(&mut self, image: &RgbImage, names: &[String]) -> Result<Detections>;
}

pub trait Segmenter: ModelLifecycle {
    /// One `[height, width]` mask per box, in box order.
    fn segment(&mut self, image: &RgbImage, boxes: &[BoundingBox]) -> Result<Vec<Mask>>;
}

pub trait DepthEstimator: ModelLifecycle {
    fn estimate_depth(&mut self, image: &RgbImage) -> Result<DepthEstimate>;
}

pub trait OrientationEstimator: ModelLifecycle {
    fn estimate_orientation(&mut self, crop: &ObjectCrop) -> Result<Orientation>;
}

/// Prompt text for open-vocabulary detectors: `"dog. chair."`.
pub fn detector_prompt(names: &[String]) -> String {
    let mut text = names.join(". ");
    text.push('.');
    text
}
