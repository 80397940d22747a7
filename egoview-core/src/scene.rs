use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{EgoviewError, PointCoordinates, Real, Result, CAMERA_PERSPECTIVE};

/// Binary segmentation mask, indexed `[row, col]`, same size as the image.
pub type Mask = Array2<bool>;
/// Per-pixel depth, indexed `[row, col]`.
pub type DepthMap = Array2<f32>;

/// Pixel-space box `[x0, y0, x1, y1]` with `x0 < x1` and `y0 < y1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[Real; 4]", into = "[Real; 4]")]
pub struct BoundingBox {
    x0: Real,
    y0: Real,
    x1: Real,
    y1: Real,
}

impl BoundingBox {
    pub fn new(x0: Real, y0: Real, x1: Real, y1: Real) -> Result<Self> {
        if !(x0 < x1 && y0 < y1) {
            return Err(EgoviewError::ShapeMismatch(format!(
                "degenerate bounding box [{x0}, {y0}, {x1}, {y1}]"
            )));
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    pub fn x0(&self) -> Real {
        self.x0
    }

    pub fn y0(&self) -> Real {
        self.y0
    }

    pub fn x1(&self) -> Real {
        self.x1
    }

    pub fn y1(&self) -> Real {
        self.y1
    }

    pub fn width(&self) -> Real {
        self.x1 - self.x0
    }

    pub fn height(&self) -> Real {
        self.y1 - self.y0
    }

    pub fn center(&self) -> (Real, Real) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn to_array(&self) -> [Real; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

impl TryFrom<[Real; 4]> for BoundingBox {
    type Error = EgoviewError;

    fn try_from([x0, y0, x1, y1]: [Real; 4]) -> Result<Self> {
        BoundingBox::new(x0, y0, x1, y1)
    }
}

impl From<BoundingBox> for [Real; 4] {
    fn from(bbox: BoundingBox) -> Self {
        bbox.to_array()
    }
}

/// Orientation estimate in degrees, as reported by the orientation estimator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub azimuth: Real,
    pub elevation: Real,
    pub tilt: Real,
    pub confidence: Real,
}

impl Orientation {
    pub fn new(azimuth: Real, elevation: Real, tilt: Real, confidence: Real) -> Self {
        Self {
            azimuth,
            elevation,
            tilt,
            confidence,
        }
    }

    /// `(azimuth, elevation, tilt)`
    pub fn angles(&self) -> [Real; 3] {
        [self.azimuth, self.elevation, self.tilt]
    }
}

impl From<[Real; 4]> for Orientation {
    fn from([azimuth, elevation, tilt, confidence]: [Real; 4]) -> Self {
        Self::new(azimuth, elevation, tilt, confidence)
    }
}

#[derive(Clone, Debug)]
pub struct DetectedObject {
    pub label: String,
    pub bbox: BoundingBox,
    pub mask: Mask,
    // (y, x, z)
    pub position: PointCoordinates,
    pub orientation: Orientation,
}

/// How a requested perspective label is compared against scene labels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMatching {
    #[default]
    Exact,
    CaseInsensitive,
}

impl LabelMatching {
    pub fn matches(&self, candidate: &str, wanted: &str) -> bool {
        match self {
            LabelMatching::Exact => candidate == wanted,
            LabelMatching::CaseInsensitive => candidate.trim().eq_ignore_ascii_case(wanted.trim()),
        }
    }

    pub fn is_camera(&self, label: &str) -> bool {
        self.matches(label, CAMERA_PERSPECTIVE)
    }
}

/// Per-object poses for one image, in detector order.
///
/// Rows are stored whole, so label, box, mask, position and orientation of
/// index `i` always describe the same object. The table is immutable once
/// built.
#[derive(Clone, Debug, Default)]
pub struct ScenePoseTable {
    objects: Vec<DetectedObject>,
}

impl ScenePoseTable {
    pub fn new(objects: Vec<DetectedObject>) -> Self {
        Self { objects }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[DetectedObject] {
        &self.objects
    }

    pub fn get(&self, index: usize) -> Option<&DetectedObject> {
        self.objects.get(index)
    }

    pub fn labels(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.label.clone()).collect()
    }

    pub fn boxes(&self) -> Vec<BoundingBox> {
        self.objects.iter().map(|o| o.bbox).collect()
    }

    pub fn positions(&self) -> Vec<PointCoordinates> {
        self.objects.iter().map(|o| o.position).collect()
    }

    pub fn orientations(&self) -> Vec<Orientation> {
        self.objects.iter().map(|o| o.orientation).collect()
    }

    /// Index of the first row whose label matches.
    pub fn position_of(&self, label: &str, matching: LabelMatching) -> Option<usize> {
        self.objects
            .iter()
            .position(|o| matching.matches(&o.label, label))
    }
}

impl FromIterator<DetectedObject> for ScenePoseTable {
    fn from_iter<T: IntoIterator<Item = DetectedObject>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
