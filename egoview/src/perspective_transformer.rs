use std::{collections::HashSet, fmt};

use egoview_core::{
    geometry::{basis_change, positions_excluding_matching, rotation_from_angles},
    scene::{LabelMatching, ScenePoseTable},
    EgoviewError, LogSink, PointCoordinates, Real, Result,
};
use nalgebra::Rotation3;
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

pub const DEFAULT_DECIMALS: u32 = 2;

/// How the egocentric scene is handed to the language model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerspectiveType {
    /// Coordinates written into the prompt.
    #[default]
    Numerical,
    /// Rendered egocentric view. Not available yet; always an error.
    Visual,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EgocentricEntry {
    pub label: String,
    /// `[x, y, z]`, rounded.
    pub coordinates: [Real; 3],
}

/// Positions of the non-central objects in the central object's frame, in
/// scene order. This is the only place coordinates are `(x, y, z)`.
/// Labels are unique, so the table renders as a JSON object without
/// repeated keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EgocentricCoordinateTable {
    entries: Vec<EgocentricEntry>,
}

impl EgocentricCoordinateTable {
    pub fn new(entries: Vec<EgocentricEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[EgocentricEntry] {
        &self.entries
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    /// Coordinates of the first entry with this label.
    pub fn get(&self, label: &str) -> Option<[Real; 3]> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.coordinates)
    }
}

/// `{"chair": [-3.0, 0.0, 0.0], "tree": [1.5, 2.0, 4.25]}`
impl fmt::Display for EgocentricCoordinateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let [x, y, z] = entry.coordinates;
            write!(f, "{:?}: [{x:?}, {y:?}, {z:?}]", entry.label)?;
        }
        f.write_str("}")
    }
}

impl Serialize for EgocentricCoordinateTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.label, &entry.coordinates)?;
        }
        map.end()
    }
}

#[derive(Clone, Debug)]
pub struct PerspectiveTransformer {
    decimals: u32,
    label_matching: LabelMatching,
    log: LogSink,
}

impl Default for PerspectiveTransformer {
    fn default() -> Self {
        Self::new(LogSink::default())
    }
}

impl PerspectiveTransformer {
    pub fn new(log: LogSink) -> Self {
        Self {
            decimals: DEFAULT_DECIMALS,
            label_matching: LabelMatching::Exact,
            log,
        }
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_label_matching(mut self, label_matching: LabelMatching) -> Self {
        self.label_matching = label_matching;
        self
    }

    /// Rotation and translation of the central perspective. The camera is
    /// the identity pivot.
    pub fn pivot(
        &self,
        table: &ScenePoseTable,
        central_label: &str,
    ) -> Result<(Rotation3<Real>, PointCoordinates)> {
        if self.label_matching.is_camera(central_label) {
            return Ok((Rotation3::identity(), PointCoordinates::zeros()));
        }
        let central = table
            .position_of(central_label, self.label_matching)
            .and_then(|index| table.get(index))
            .ok_or_else(|| EgoviewError::NotFound {
                label: central_label.to_string(),
                available: table.labels(),
            })?;
        Ok((
            rotation_from_angles(central.orientation.angles()),
            central.position,
        ))
    }

    pub fn transform_to_egocentric(
        &self,
        table: &ScenePoseTable,
        central_label: &str,
    ) -> Result<EgocentricCoordinateTable> {
        let (rotation, translation) = self.pivot(table, central_label)?;
        let (labels, positions) =
            positions_excluding_matching(table, central_label, self.label_matching)?;
        let transformed = basis_change(&rotation, &translation, &positions);

        let entries: Vec<_> = unique_labels(labels)
            .into_iter()
            .zip(transformed.iter())
            .map(|(label, point)| EgocentricEntry {
                label,
                coordinates: to_presentation(point, self.decimals),
            })
            .collect();
        self.log.debug(format_args!(
            "{} objects re-expressed around {central_label:?}",
            entries.len()
        ));
        Ok(EgocentricCoordinateTable::new(entries))
    }
}

/// [`PerspectiveTransformer::transform_to_egocentric`] with exact label
/// matching and two decimals.
pub fn transform_to_egocentric(
    table: &ScenePoseTable,
    central_label: &str,
) -> Result<EgocentricCoordinateTable> {
    PerspectiveTransformer::default().transform_to_egocentric(table, central_label)
}

/// Repeated labels get a `_2`, `_3`, ... suffix so every key of the
/// presented mapping is distinct. The first occurrence keeps its label.
pub fn unique_labels(labels: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(labels.len());
    labels
        .into_iter()
        .map(|label| {
            let mut unique = label.clone();
            let mut n = 1;
            while taken.contains(&unique) {
                n += 1;
                unique = format!("{label}_{n}");
            }
            taken.insert(unique.clone());
            unique
        })
        .collect()
}

/// `(y, x, z)` to rounded `[x, y, z]`.
pub fn to_presentation(point: &PointCoordinates, decimals: u32) -> [Real; 3] {
    [
        round_to(point[1], decimals),
        round_to(point[0], decimals),
        round_to(point[2], decimals),
    ]
}

fn round_to(value: Real, decimals: u32) -> Real {
    let scale = 10f64.powi(decimals as i32);
    // + 0.0 folds -0.0 into 0.0
    (value * scale).round_ties_even() / scale + 0.0
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use egoview_core::scene::{BoundingBox, DetectedObject, Mask, Orientation};

    use super::*;

    fn object(label: &str, position: (Real, Real, Real), orientation: [Real; 4]) -> DetectedObject {
        DetectedObject {
            label: label.to_string(),
            bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap(),
            mask: Mask::from_elem((1, 1), true),
            position: PointCoordinates::new(position.0, position.1, position.2),
            orientation: Orientation::from(orientation),
        }
    }

    fn dog_and_chair() -> ScenePoseTable {
        ScenePoseTable::new(vec![
            object("dog", (2.0, 0.0, 5.0), [0.0, 0.0, 0.0, 0.9]),
            object("chair", (2.0, 3.0, 5.0), [0.0, 0.0, 0.0, 0.9]),
        ])
    }

    #[test]
    fn dog_perspective_on_chair() {
        let egocentric = transform_to_egocentric(&dog_and_chair(), "dog").unwrap();
        assert_eq!(egocentric.labels(), vec!["chair"]);
        // offset (0, 3, 0) · Rx(-180) = (0, -3, 0) in (y, x, z)
        assert_eq!(egocentric.get("chair"), Some([-3.0, 0.0, 0.0]));
        assert_eq!(egocentric.to_string(), r#"{"chair": [-3.0, 0.0, 0.0]}"#);
    }

    #[test]
    fn turned_pivot_follows_rotation_formula() {
        let table = ScenePoseTable::new(vec![
            object("car", (1.0, 1.0, 4.0), [90.0, 0.0, 0.0, 0.8]),
            object("tree", (1.0, 4.0, 6.0), [0.0, 0.0, 0.0, 0.8]),
        ]);
        let egocentric = transform_to_egocentric(&table, "car").unwrap();
        let expected = basis_change(
            &rotation_from_angles([90.0, 0.0, 0.0]),
            &PointCoordinates::new(1.0, 1.0, 4.0),
            &[PointCoordinates::new(1.0, 4.0, 6.0)],
        )[0];
        let [x, y, z] = egocentric.get("tree").unwrap();
        assert_relative_eq!(x, expected[1], epsilon = 0.005);
        assert_relative_eq!(y, expected[0], epsilon = 0.005);
        assert_relative_eq!(z, expected[2], epsilon = 0.005);
        // Rx(90): (0, 3, 2) -> (0, 2, -3) in (y, x, z)
        assert_eq!([x, y, z], [2.0, 0.0, -3.0]);
    }

    #[test]
    fn camera_keeps_all_objects_unrotated() {
        let egocentric = transform_to_egocentric(&dog_and_chair(), "camera").unwrap();
        assert_eq!(egocentric.labels(), vec!["dog", "chair"]);
        assert_eq!(egocentric.get("dog"), Some([0.0, 2.0, 5.0]));
        assert_eq!(egocentric.get("chair"), Some([3.0, 2.0, 5.0]));
    }

    #[test]
    fn empty_table() {
        let empty = ScenePoseTable::default();
        assert!(transform_to_egocentric(&empty, "camera").unwrap().is_empty());
        assert!(matches!(
            transform_to_egocentric(&empty, "dog"),
            Err(EgoviewError::NotFound { .. })
        ));
        assert_eq!(EgocentricCoordinateTable::default().to_string(), "{}");
    }

    #[test]
    fn only_central_object_leaves_empty_mapping() {
        let table = ScenePoseTable::new(vec![object("dog", (0.0, 0.0, 1.0), [0.0; 4])]);
        assert!(transform_to_egocentric(&table, "dog").unwrap().is_empty());
    }

    #[test]
    fn unknown_label_is_not_found() {
        assert!(matches!(
            transform_to_egocentric(&dog_and_chair(), "Dog"),
            Err(EgoviewError::NotFound { .. })
        ));
        let egocentric = PerspectiveTransformer::default()
            .with_label_matching(LabelMatching::CaseInsensitive)
            .transform_to_egocentric(&dog_and_chair(), "Dog")
            .unwrap();
        assert_eq!(egocentric.labels(), vec!["chair"]);
    }

    #[test]
    fn duplicate_labels_are_suffixed() {
        let table = ScenePoseTable::new(vec![
            object("dog", (0.0, 0.0, 1.0), [0.0; 4]),
            object("chair", (0.0, 1.0, 1.0), [0.0; 4]),
            object("chair", (0.0, 5.0, 1.0), [0.0; 4]),
        ]);
        let egocentric = transform_to_egocentric(&table, "camera").unwrap();
        assert_eq!(egocentric.labels(), vec!["dog", "chair", "chair_2"]);

        let json = serde_json::to_string(&egocentric).unwrap();
        let parsed: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed["chair_2"], serde_json::json!([5.0, 0.0, 1.0]));
        assert_eq!(
            egocentric.to_string(),
            r#"{"dog": [0.0, 0.0, 1.0], "chair": [1.0, 0.0, 1.0], "chair_2": [5.0, 0.0, 1.0]}"#
        );

        // the first chair is the pivot; the remaining one keeps its own label
        let egocentric = transform_to_egocentric(&table, "chair").unwrap();
        assert_eq!(egocentric.labels(), vec!["dog", "chair"]);
    }

    #[test]
    fn suffix_skips_labels_already_present() {
        let labels = ["cup", "cup_2", "cup", "cup"].map(String::from).to_vec();
        assert_eq!(unique_labels(labels), vec!["cup", "cup_2", "cup_3", "cup_4"]);
    }

    #[test]
    fn rounds_half_to_even_and_drops_negative_zero() {
        assert_eq!(
            to_presentation(&PointCoordinates::new(-0.001, 1.23456, 2.5), 2),
            [1.23, 0.0, 2.5]
        );
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(-0.0, 2).to_string(), "0");
        assert_eq!(round_to(7.777, 0), 8.0);
    }

    #[test]
    fn serializes_as_ordered_map() {
        let table = EgocentricCoordinateTable::new(vec![
            EgocentricEntry {
                label: "tree".to_string(),
                coordinates: [1.5, 2.0, 4.25],
            },
            EgocentricEntry {
                label: "chair".to_string(),
                coordinates: [-3.0, 0.0, 0.0],
            },
        ]);
        assert_eq!(
            serde_json::to_string(&table).unwrap(),
            r#"{"tree":[1.5,2.0,4.25],"chair":[-3.0,0.0,0.0]}"#
        );
    }
}
