use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use egoview::{
    config::load_config, evaluation::ERRORS_FILE, language_model::ScriptedLanguageModel,
};
use egoview_core::LogSink;
use egoview_dataset_reader::{
    fixtures::{load_recorded_scene, load_rgb_image, load_transcript},
    question_csv_reader::QuestionCsvReader,
};

const USAGE: &str = "usage: evaluate_dataset <dataset_dir> <recorded_scene.json> <transcript.json> [config.json] [output_dir]";

fn init_logging(output_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create output folder {}", output_dir.display()))?;
    let log_file = fs::File::create(output_dir.join("project.log"))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        bail!("{USAGE}");
    }
    let dataset_dir = PathBuf::from(&args[1]);
    let scene_path = PathBuf::from(&args[2]);
    let transcript_path = PathBuf::from(&args[3]);
    let config_path = args.get(4).map(PathBuf::from);
    let output_dir = args
        .get(5)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("output"));

    init_logging(&output_dir)?;

    let log = LogSink::new("egoview");
    let config = match &config_path {
        Some(path) => load_config(path, &log)?,
        None => Default::default(),
    };

    let mut reader = QuestionCsvReader::new(&dataset_dir, log.child("dataset"));
    reader.load_records()?;

    // every record is answered against the same recorded scene
    let scene = load_recorded_scene(&scene_path)?;
    let scene_abstractor = config.scene_abstractor.finalize(
        scene.detector(),
        scene.segmenter(),
        scene.depth_estimator(),
        scene.orientation_estimator(),
        log.child("scene"),
    )?;
    let mut router = config.question_router.finalize(
        ScriptedLanguageModel::new(load_transcript(&transcript_path)?),
        scene_abstractor,
        log.child("router"),
    )?;

    let report = config
        .evaluation
        .finalize(log.child("evaluation"))
        .run(&mut router, &reader, load_rgb_image);

    report.write_to(&output_dir)?;
    print!("{}", report.stats());
    println!(
        "{} failed records, see {}",
        report.failures.len(),
        output_dir.join(ERRORS_FILE).display()
    );

    Ok(())
}
