//! Loaders for the files the demo and the evaluation read besides the
//! question table.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use egoview_vision::recorded::RecordedScene;
use image::RgbImage;

pub fn load_recorded_scene(path: &Path) -> Result<RecordedScene> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read recorded scene {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid recorded scene {}", path.display()))
}

/// Any supported image format, converted to RGB.
pub fn load_rgb_image(path: &Path) -> Result<RgbImage> {
    let image =
        image::open(path).with_context(|| format!("cannot open image {}", path.display()))?;
    Ok(image.to_rgb8())
}

/// JSON array of language model responses, replayed in order.
pub fn load_transcript(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read transcript {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid transcript {}", path.display()))
}
