//! Offline stand-ins for the vision models, replaying a scene captured as
//! JSON. Masks are the box rectangles; depth is painted per box over a
//! constant background.

use std::ops::Range;

use anyhow::{anyhow, Result};
use egoview_core::scene::{BoundingBox, DepthMap, Mask, Orientation};
use image::RgbImage;
use ndarray::s;
use serde::{Deserialize, Serialize};

use crate::{
    collaborators::{
        DepthEstimate, DepthEstimator, Detections, ObjectCrop, ObjectDetector,
        OrientationEstimator, Segmenter,
    },
    model_scope::ModelLifecycle,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedDetection {
    pub label: String,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub orientation: Orientation,
    /// Depth painted over the box; the background depth when absent.
    #[serde(default)]
    pub depth: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedScene {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_background_depth")]
    pub background_depth: f32,
    #[serde(default)]
    pub focal_length_px: Option<f64>,
    pub detections: Vec<RecordedDetection>,
}

fn default_background_depth() -> f32 {
    10.0
}

impl RecordedScene {
    pub fn blank_image(&self) -> RgbImage {
        RgbImage::new(self.width, self.height)
    }

    pub fn detector(&self) -> RecordedDetector {
        RecordedDetector {
            detections: self.detections.clone(),
            loaded: false,
        }
    }

    pub fn segmenter(&self) -> RecordedSegmenter {
        RecordedSegmenter { loaded: false }
    }

    pub fn depth_estimator(&self) -> RecordedDepthEstimator {
        RecordedDepthEstimator {
            detections: self.detections.clone(),
            background_depth: self.background_depth,
            focal_length_px: self.focal_length_px,
            loaded: false,
        }
    }

    pub fn orientation_estimator(&self) -> RecordedOrientationEstimator {
        RecordedOrientationEstimator {
            detections: self.detections.clone(),
            loaded: false,
        }
    }
}

pub struct RecordedDetector {
    detections: Vec<RecordedDetection>,
    loaded: bool,
}

pub struct RecordedSegmenter {
    loaded: bool,
}

pub struct RecordedDepthEstimator {
    detections: Vec<RecordedDetection>,
    background_depth: f32,
    focal_length_px: Option<f64>,
    loaded: bool,
}

pub struct RecordedOrientationEstimator {
    detections: Vec<RecordedDetection>,
    loaded: bool,
}

macro_rules! recorded_lifecycle {
    ($($model:ty),+) => {
        $(
            impl ModelLifecycle for $model {
                fn load(&mut self) -> Result<()> {
                    self.loaded = true;
                    Ok(())
                }

                fn unload(&mut self) {
                    self.loaded = false;
                }

                fn is_loaded(&self) -> bool {
                    self.loaded
                }
            }
        )+
    };
}

recorded_lifecycle!(
    RecordedDetector,
    RecordedSegmenter,
    RecordedDepthEstimator,
    RecordedOrientationEstimator
);

fn ensure_loaded(loaded: bool, model: &str) -> Result<()> {
    if loaded {
        Ok(())
    } else {
        Err(anyhow!("{model} used before load()"))
    }
}

/// Open-vocabulary style matching: either string contains the other.
fn label_matches(label: &str, name: &str) -> bool {
    let label = label.trim().to_lowercase();
    let name = name.trim().to_lowercase();
    !label.is_empty() && !name.is_empty() && (label.contains(&name) || name.contains(&label))
}

/// Pixel rows and columns covered by a box, clipped to the image.
fn box_pixels(bbox: &BoundingBox, width: usize, height: usize) -> (Range<usize>, Range<usize>) {
    let clip = |lo: f64, hi: f64, size: usize| {
        let start = (lo.floor().max(0.0) as usize).min(size);
        let end = (hi.ceil().max(0.0) as usize).min(size);
        start..end.max(start)
    };
    (
        clip(bbox.y0(), bbox.y1(), height),
        clip(bbox.x0(), bbox.x1(), width),
    )
}

impl ObjectDetector for RecordedDetector {
    fn detect(&mut self, _image: &RgbImage, names: &[String]) -> Result<Detections> {
        ensure_loaded(self.loaded, "recorded detector")?;
        let mut detections = Detections::default();
        for detection in &self.detections {
            if names.iter().any(|name| label_matches(&detection.label, name)) {
                detections.boxes.push(detection.bbox);
                detections.labels.push(detection.label.clone());
            }
        }
        Ok(detections)
    }
}

impl Segmenter for RecordedSegmenter {
    fn segment(&mut self, image: &RgbImage, boxes: &[BoundingBox]) -> Result<Vec<Mask>> {
        ensure_loaded(self.loaded, "recorded segmenter")?;
        let (width, height) = (image.width() as usize, image.height() as usize);
        Ok(boxes
            .iter()
            .map(|bbox| {
                let mut mask = Mask::from_elem((height, width), false);
                let (rows, cols) = box_pixels(bbox, width, height);
                mask.slice_mut(s![rows, cols]).fill(true);
                mask
            })
            .collect())
    }
}

impl DepthEstimator for RecordedDepthEstimator {
    fn estimate_depth(&mut self, image: &RgbImage) -> Result<DepthEstimate> {
        ensure_loaded(self.loaded, "recorded depth estimator")?;
        let (width, height) = (image.width() as usize, image.height() as usize);
        let mut depth_map = DepthMap::from_elem((height, width), self.background_depth);
        for detection in &self.detections {
            if let Some(depth) = detection.depth {
                let (rows, cols) = box_pixels(&detection.bbox, width, height);
                depth_map.slice_mut(s![rows, cols]).fill(depth);
            }
        }
        Ok(DepthEstimate {
            depth_map,
            focal_length_px: self.focal_length_px,
        })
    }
}

impl OrientationEstimator for RecordedOrientationEstimator {
    fn estimate_orientation(&mut self, crop: &ObjectCrop) -> Result<Orientation> {
        ensure_loaded(self.loaded, "recorded orientation estimator")?;
        self.detections
            .iter()
            .find(|d| d.bbox == crop.bbox)
            .map(|d| d.orientation)
            .ok_or_else(|| anyhow!("no recorded orientation for box {:?}", crop.bbox.to_array()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_scope::ModelScope;

    fn scene() -> RecordedScene {
        serde_json::from_str(
            r#"{
                "width": 8,
                "height": 6,
                "focal_length_px": 400.0,
                "detections": [
                    {"label": "dog", "bbox": [1.0, 1.0, 3.0, 4.0],
                     "orientation": {"azimuth": 90.0, "elevation": 0.0, "tilt": 0.0, "confidence": 0.8},
                     "depth": 2.5},
                    {"label": "chair", "bbox": [4.5, 0.0, 7.2, 2.0]}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_scene_defaults() {
        let scene = scene();
        assert_eq!(scene.background_depth, 10.0);
        assert_eq!(scene.detections[1].orientation, Orientation::default());
        assert_eq!(scene.detections[1].depth, None);
    }

    #[test]
    fn rejects_degenerate_recorded_box() {
        let err = serde_json::from_str::<RecordedDetection>(
            r#"{"label": "dog", "bbox": [3.0, 1.0, 1.0, 4.0]}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn detector_filters_by_requested_names() {
        let scene = scene();
        let image = scene.blank_image();
        let mut detector = scene.detector();
        assert!(detector.detect(&image, &["dog".to_string()]).is_err());

        let mut detector = ModelScope::acquire(&mut detector).unwrap();
        let detections = detector
            .detect(&image, &["the chair".to_string(), "cat".to_string()])
            .unwrap();
        assert_eq!(detections.labels, vec!["chair"]);
        assert_eq!(detections.len(), 1);
    }

    #[test]
    fn masks_and_depth_cover_boxes() {
        let scene = scene();
        let image = scene.blank_image();
        let boxes: Vec<_> = scene.detections.iter().map(|d| d.bbox).collect();

        let mut segmenter = scene.segmenter();
        let masks = ModelScope::acquire(&mut segmenter)
            .unwrap()
            .segment(&image, &boxes)
            .unwrap();
        assert_eq!(masks.len(), 2);
        assert_eq!(masks[0].dim(), (6, 8));
        assert_eq!(masks[0].iter().filter(|m| **m).count(), 2 * 3);
        // x 4.5..7.2 widens to columns 4..8
        assert_eq!(masks[1].iter().filter(|m| **m).count(), 4 * 2);

        let mut depth = scene.depth_estimator();
        let estimate = ModelScope::acquire(&mut depth)
            .unwrap()
            .estimate_depth(&image)
            .unwrap();
        assert_eq!(estimate.focal_length_px, Some(400.0));
        assert_eq!(estimate.depth_map[[2, 2]], 2.5);
        assert_eq!(estimate.depth_map[[0, 5]], 10.0);
    }

    #[test]
    fn orientation_is_looked_up_by_box() {
        let scene = scene();
        let mut estimator = scene.orientation_estimator();
        let mut estimator = ModelScope::acquire(&mut estimator).unwrap();
        let crop = ObjectCrop {
            pixels: RgbImage::new(2, 3),
            bbox: scene.detections[0].bbox,
        };
        assert_eq!(estimator.estimate_orientation(&crop).unwrap().azimuth, 90.0);

        let unknown = ObjectCrop {
            pixels: RgbImage::new(1, 1),
            bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap(),
        };
        assert!(estimator.estimate_orientation(&unknown).is_err());
    }
}
