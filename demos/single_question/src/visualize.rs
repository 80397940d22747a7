use std::path::Path;

use egoview::PerspectiveAnswer;
use egoview_core::{geometry::facing_direction, PointCoordinates};
use image::RgbImage;

// rerun wants (x, y, z)
fn xyz(point: &PointCoordinates) -> [f32; 3] {
    [point[1] as f32, point[0] as f32, point[2] as f32]
}

/// Image with boxes, object positions and facing arrows as a `.rrd` file.
pub fn save_recording(path: &Path, image: &RgbImage, answer: &PerspectiveAnswer) -> anyhow::Result<()> {
    let rec = rerun::RecordingStreamBuilder::new("egoview_single_question").save(path)?;

    rec.log(
        "image",
        &rerun::Image::from_rgb24(image.as_raw().clone(), [image.width(), image.height()]),
    )?;

    let scene = &answer.scene;
    let labels = scene.labels();
    let boxes = scene.boxes();
    let depth_labels: Vec<String> = scene
        .objects()
        .iter()
        .map(|o| format!("{} (z = {:.2})", o.label, o.position[2]))
        .collect();
    rec.log(
        "image/boxes",
        &rerun::Boxes2D::from_mins_and_sizes(
            boxes.iter().map(|b| [b.x0() as f32, b.y0() as f32]),
            boxes.iter().map(|b| [b.width() as f32, b.height() as f32]),
        )
        .with_labels(depth_labels),
    )?;

    let positions: Vec<[f32; 3]> = scene.positions().iter().map(xyz).collect();
    rec.log(
        "scene/positions",
        &rerun::Points3D::new(positions.clone()).with_labels(labels),
    )?;

    let facing: Vec<[f32; 3]> = scene
        .orientations()
        .iter()
        .map(|o| xyz(&facing_direction(o.angles())))
        .collect();
    rec.log(
        "scene/facing",
        &rerun::Arrows3D::from_vectors(facing).with_origins(positions),
    )?;

    Ok(())
}
