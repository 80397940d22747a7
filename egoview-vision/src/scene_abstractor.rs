use egoview_core::{
    geometry::position_from_mask,
    scene::{BoundingBox, DetectedObject, Mask, ScenePoseTable},
    EgoviewError, LogSink, Result,
};
use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};

use crate::{
    collaborators::{
        detector_prompt, DepthEstimate, DepthEstimator, ObjectCrop, ObjectDetector,
        OrientationEstimator, Segmenter,
    },
    model_scope::ModelScope,
    pinhole_camera::PinholeCamera,
};

/// What happens to an object whose mask has no foreground pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyMaskPolicy {
    /// Leave the object out of the table and keep going.
    #[default]
    Drop,
    /// Fail the whole scene.
    Abort,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionMode {
    /// `(median row, median col, median depth)`
    #[default]
    ImagePlane,
    /// Medians lifted through a pinhole camera into `(Y, X, Z)`.
    PinholeBackProjection,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneAbstractorCfg {
    pub empty_mask_policy: EmptyMaskPolicy,
    pub position_mode: PositionMode,
    // used when the depth estimator does not report a focal length
    pub fallback_focal_length_px: Option<f64>,
}

impl Default for SceneAbstractorCfg {
    fn default() -> Self {
        Self {
            empty_mask_policy: EmptyMaskPolicy::Drop,
            position_mode: PositionMode::ImagePlane,
            fallback_focal_length_px: None,
        }
    }
}

impl SceneAbstractorCfg {
    pub fn finalize<D, S, E, O>(
        self,
        detector: D,
        segmenter: S,
        depth_estimator: E,
        orientation_estimator: O,
        log: LogSink,
    ) -> Result<SceneAbstractor<D, S, E, O>> {
        if let Some(focal) = self.fallback_focal_length_px {
            if !(focal.is_finite() && focal > 0.0) {
                return Err(EgoviewError::Config(format!(
                    "fallback focal length must be positive, got {focal}"
                )));
            }
        }

        Ok(SceneAbstractor {
            cfg: self,
            detector,
            segmenter,
            depth_estimator,
            orientation_estimator,
            log,
        })
    }
}

/// Turns an image and a list of object names into a [`ScenePoseTable`].
pub trait SceneAbstraction {
    fn abstract_scene(&mut self, image: &RgbImage, object_names: &[String])
        -> Result<ScenePoseTable>;
}

/// Runs detection, segmentation, depth and orientation one model at a time;
/// each model is loaded for its own stage only.
pub struct SceneAbstractor<D, S, E, O> {
    cfg: SceneAbstractorCfg,
    detector: D,
    segmenter: S,
    depth_estimator: E,
    orientation_estimator: O,
    log: LogSink,
}

impl<D, S, E, O> SceneAbstractor<D, S, E, O> {
    pub fn cfg(&self) -> &SceneAbstractorCfg {
        &self.cfg
    }
}

impl<D, S, E, O> SceneAbstraction for SceneAbstractor<D, S, E, O>
where
    D: ObjectDetector,
    S: Segmenter,
    E: DepthEstimator,
    O: OrientationEstimator,
{
    fn abstract_scene(
        &mut self,
        image: &RgbImage,
        object_names: &[String],
    ) -> Result<ScenePoseTable> {
        let shape = (image.height() as usize, image.width() as usize);

        self.log
            .debug(format_args!("detecting {:?}", detector_prompt(object_names)));
        let detections = {
            let mut detector = ModelScope::acquire(&mut self.detector)?;
            detector.detect(image, object_names)?
        };
        if detections.labels.len() != detections.boxes.len() {
            return Err(EgoviewError::ShapeMismatch(format!(
                "detector returned {} boxes but {} labels",
                detections.boxes.len(),
                detections.labels.len()
            )));
        }
        self.log
            .info(format_args!("detected labels: {:?}", detections.labels));
        if detections.is_empty() {
            return Ok(ScenePoseTable::default());
        }

        let masks = {
            let mut segmenter = ModelScope::acquire(&mut self.segmenter)?;
            segmenter.segment(image, &detections.boxes)?
        };
        check_masks(&masks, detections.len(), shape)?;

        let depth = {
            let mut depth_estimator = ModelScope::acquire(&mut self.depth_estimator)?;
            depth_estimator.estimate_depth(image)?
        };
        if depth.depth_map.dim() != shape {
            return Err(EgoviewError::ShapeMismatch(format!(
                "depth map is {:?}, image is {:?}",
                depth.depth_map.dim(),
                shape
            )));
        }

        let orientations = {
            let mut orientation_estimator =
                ModelScope::acquire(&mut self.orientation_estimator)?;
            let mut orientations = Vec::with_capacity(detections.len());
            for bbox in &detections.boxes {
                let crop = crop_to_box(image, bbox)?;
                orientations.push(orientation_estimator.estimate_orientation(&crop)?);
            }
            orientations
        };

        let camera = self.camera(&depth, image)?;

        let mut objects = Vec::with_capacity(detections.len());
        for (((label, bbox), mask), orientation) in detections
            .labels
            .into_iter()
            .zip(detections.boxes)
            .zip(masks)
            .zip(orientations)
        {
            let position = match position_from_mask(&mask, &depth.depth_map) {
                Ok(position) => position,
                Err(EgoviewError::EmptyMask)
                    if self.cfg.empty_mask_policy == EmptyMaskPolicy::Drop =>
                {
                    self.log
                        .warn(format_args!("dropping {label:?}: empty segmentation mask"));
                    continue;
                }
                Err(err) => return Err(err),
            };
            let position = match &camera {
                Some(camera) => camera.back_project(&position),
                None => position,
            };
            self.log.debug(format_args!(
                "{label}: position (y, x, z) = {:?}, orientation = {:?}",
                position.as_slice(),
                orientation.angles()
            ));
            objects.push(DetectedObject {
                label,
                bbox,
                mask,
                position,
                orientation,
            });
        }

        self.log
            .info(format_args!("scene abstraction finished with {} objects", objects.len()));
        Ok(ScenePoseTable::new(objects))
    }
}

impl<D, S, E, O> SceneAbstractor<D, S, E, O> {
    fn camera(&self, depth: &DepthEstimate, image: &RgbImage) -> Result<Option<PinholeCamera>> {
        match self.cfg.position_mode {
            PositionMode::ImagePlane => Ok(None),
            PositionMode::PinholeBackProjection => {
                let focal = depth
                    .focal_length_px
                    .or(self.cfg.fallback_focal_length_px)
                    .ok_or_else(|| {
                        EgoviewError::Config(
                            "pinhole back-projection needs a focal length".to_string(),
                        )
                    })?;
                Ok(Some(PinholeCamera::from_focal_length(
                    focal,
                    image.width() as usize,
                    image.height() as usize,
                )))
            }
        }
    }
}

fn check_masks(masks: &[Mask], expected: usize, shape: (usize, usize)) -> Result<()> {
    if masks.len() != expected {
        return Err(EgoviewError::ShapeMismatch(format!(
            "segmenter returned {} masks for {} boxes",
            masks.len(),
            expected
        )));
    }
    if let Some(mask) = masks.iter().find(|m| m.dim() != shape) {
        return Err(EgoviewError::ShapeMismatch(format!(
            "mask is {:?}, image is {:?}",
            mask.dim(),
            shape
        )));
    }
    Ok(())
}

/// Cut a box out of the image. The near edges are truncated and the far
/// edges rounded up to whole pixels, matching the box masks, then clipped to
/// the image.
pub fn crop_to_box(image: &RgbImage, bbox: &BoundingBox) -> Result<ObjectCrop> {
    let (width, height) = image.dimensions();
    let x0 = (bbox.x0() as u32).min(width);
    let y0 = (bbox.y0() as u32).min(height);
    let x1 = (bbox.x1().ceil() as u32).min(width);
    let y1 = (bbox.y1().ceil() as u32).min(height);
    if x1 <= x0 || y1 <= y0 {
        return Err(EgoviewError::ShapeMismatch(format!(
            "box {:?} has no pixels inside a {width}x{height} image",
            bbox.to_array()
        )));
    }
    Ok(ObjectCrop {
        pixels: imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image(),
        bbox: *bbox,
    })
}
