//! Frame bookkeeping shared by the scene abstraction and the perspective
//! transform. All points are `(y, x, z)`, see [`PointCoordinates`].

use nalgebra::{Rotation3, Vector3};

use crate::{
    scene::{DepthMap, LabelMatching, Mask, ScenePoseTable},
    EgoviewError, PointCoordinates, Real, Result,
};

/// Fixed correction between the orientation estimator's reference heading
/// and the scene axes: the azimuth is negated and shifted by this amount.
pub const AZIMUTH_OFFSET_DEGREES: Real = 180.0;

/// Direction an object faces in its own frame, as a row vector.
pub const ESTIMATOR_FORWARD: Vector3<Real> = Vector3::new(0.0, 0.0, -1.0);

/// Rotation for an `(azimuth, elevation, tilt)` triple in degrees.
///
/// The azimuth is corrected to `-azimuth - 180` and the three angles are
/// applied as extrinsic rotations about x, y and z in that order
/// (`R = Rz(tilt) * Ry(elevation) * Rx(azimuth')`).
pub fn rotation_from_angles(angles: [Real; 3]) -> Rotation3<Real> {
    let [azimuth, elevation, tilt] = angles;
    let azimuth = -azimuth - AZIMUTH_OFFSET_DEGREES;
    Rotation3::from_euler_angles(
        azimuth.to_radians(),
        elevation.to_radians(),
        tilt.to_radians(),
    )
}

/// World direction of [`ESTIMATOR_FORWARD`] for an orientation estimate,
/// using the same row-vector product as [`basis_change`].
pub fn facing_direction(angles: [Real; 3]) -> Vector3<Real> {
    rotation_from_angles(angles).matrix().tr_mul(&ESTIMATOR_FORWARD)
}

/// Re-express `points` in the frame pivoted at `translation`: every point
/// becomes `(p - t) · R` with `p` read as a row vector. Row order is kept.
pub fn basis_change(
    rotation: &Rotation3<Real>,
    translation: &PointCoordinates,
    points: &[PointCoordinates],
) -> Vec<PointCoordinates> {
    let matrix = rotation.matrix();
    points
        .iter()
        .map(|p| matrix.tr_mul(&(p - translation)))
        .collect()
}

/// Labels and positions of every row except the central one.
///
/// The camera sentinel keeps all rows. Any other label must be in the table.
pub fn positions_excluding(
    table: &ScenePoseTable,
    central_label: &str,
) -> Result<(Vec<String>, Vec<PointCoordinates>)> {
    positions_excluding_matching(table, central_label, LabelMatching::Exact)
}

/// [`positions_excluding`] with an explicit label comparison. When several
/// rows match, only the first one (the pivot) is removed.
pub fn positions_excluding_matching(
    table: &ScenePoseTable,
    central_label: &str,
    matching: LabelMatching,
) -> Result<(Vec<String>, Vec<PointCoordinates>)> {
    let excluded = if matching.is_camera(central_label) {
        None
    } else {
        let index = table
            .position_of(central_label, matching)
            .ok_or_else(|| EgoviewError::NotFound {
                label: central_label.to_string(),
                available: table.labels(),
            })?;
        Some(index)
    };

    Ok(table
        .objects()
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != excluded)
        .map(|(_, object)| (object.label.clone(), object.position))
        .unzip())
}

/// `(median row, median column, median depth)` over the masked pixels.
pub fn position_from_mask(mask: &Mask, depth_map: &DepthMap) -> Result<PointCoordinates> {
    if mask.dim() != depth_map.dim() {
        return Err(EgoviewError::ShapeMismatch(format!(
            "mask is {:?} but depth map is {:?}",
            mask.dim(),
            depth_map.dim()
        )));
    }

    let mut rows = vec![];
    let mut cols = vec![];
    let mut depths = vec![];
    for ((row, col), _) in mask.indexed_iter().filter(|(_, inside)| **inside) {
        rows.push(row as Real);
        cols.push(col as Real);
        depths.push(depth_map[[row, col]] as Real);
    }

    match (median(&mut rows), median(&mut cols), median(&mut depths)) {
        (Some(y), Some(x), Some(z)) => Ok(PointCoordinates::new(y, x, z)),
        _ => Err(EgoviewError::EmptyMask),
    }
}

/// Median that averages the two middle values for even lengths.
pub fn median(values: &mut [Real]) -> Option<Real> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
