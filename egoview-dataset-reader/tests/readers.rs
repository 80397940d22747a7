use std::{fs, path::PathBuf};

use egoview_core::{Dataset, LogSink};
use egoview_dataset_reader::{
    fixtures::{load_recorded_scene, load_rgb_image, load_transcript},
    question_csv_reader::{QuestionCsvReader, QUESTIONS_FILE},
};
use image::{Rgb, RgbImage};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("egoview-reader-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn reads_questions_relative_to_dataset() {
    let dir = scratch_dir("questions");
    fs::write(
        dir.join(QUESTIONS_FILE),
        "image,prompt,label\n\
         images/0.png,\"From the dog's perspective, is the chair on its left?\",1\n\
         images/1.png, Is the car behind the tree? ,0\n",
    )
    .unwrap();

    let mut reader = QuestionCsvReader::new(&dir, LogSink::default());
    reader.load_records().unwrap();

    assert_eq!(reader.len(), 2);
    let indexed: Vec<_> = reader.iter().collect();
    assert_eq!(indexed[0].0, 0);
    assert_eq!(indexed[0].1.image_path, dir.join("images/0.png"));
    assert_eq!(
        indexed[0].1.prompt,
        "From the dog's perspective, is the chair on its left?"
    );
    assert_eq!(indexed[1].1.prompt, "Is the car behind the tree?");
    assert_eq!(indexed[1].1.label, 0);
    assert!(reader.get(2).is_none());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn rejects_non_binary_labels() {
    let dir = scratch_dir("labels");
    fs::write(dir.join(QUESTIONS_FILE), "image,prompt,label\na.png,q,2\n").unwrap();
    assert!(QuestionCsvReader::new(&dir, LogSink::default()).load_records().is_err());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_dataset_is_an_error() {
    assert!(QuestionCsvReader::new("/nonexistent/egoview", LogSink::default())
        .load_records()
        .is_err());
}

#[test]
fn loads_fixtures() {
    let dir = scratch_dir("fixtures");

    fs::write(
        dir.join("scene.json"),
        r#"{"width": 4, "height": 3, "detections": [{"label": "dog", "bbox": [0, 0, 2, 2]}]}"#,
    )
    .unwrap();
    let scene = load_recorded_scene(&dir.join("scene.json")).unwrap();
    assert_eq!(scene.detections[0].label, "dog");
    assert_eq!(scene.background_depth, 10.0);

    fs::write(dir.join("transcript.json"), r#"["[dog]", "++camera++"]"#).unwrap();
    assert_eq!(
        load_transcript(&dir.join("transcript.json")).unwrap(),
        vec!["[dog]", "++camera++"]
    );

    RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]))
        .save(dir.join("image.png"))
        .unwrap();
    let image = load_rgb_image(&dir.join("image.png")).unwrap();
    assert_eq!(image.dimensions(), (3, 2));
    assert_eq!(image.get_pixel(1, 1), &Rgb([10, 20, 30]));

    assert!(load_recorded_scene(&dir.join("missing.json")).is_err());
    fs::remove_dir_all(&dir).unwrap();
}
