use std::{fs, path::PathBuf};

use anyhow::{bail, Context};
use egoview::{config::load_config, language_model::ScriptedLanguageModel};
use egoview_core::LogSink;
use egoview_dataset_reader::fixtures::{load_recorded_scene, load_transcript};

#[cfg(feature = "rerun")]
mod visualize;

const USAGE: &str =
    "usage: single_question <recorded_scene.json> <transcript.json> <question> [config.json] [output_dir]";

fn init_logging(output_dir: Option<&PathBuf>) -> anyhow::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create output folder {}", dir.display()))?;
        let log_file = fs::File::create(dir.join("project.log"))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }
    builder.init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        bail!("{USAGE}");
    }
    let scene_path = PathBuf::from(&args[1]);
    let transcript_path = PathBuf::from(&args[2]);
    let question = &args[3];
    let config_path = args.get(4).map(PathBuf::from);
    let output_dir = args.get(5).map(PathBuf::from);

    init_logging(output_dir.as_ref())?;

    let log = LogSink::new("egoview");
    let config = match &config_path {
        Some(path) => load_config(path, &log)?,
        None => Default::default(),
    };

    let scene = load_recorded_scene(&scene_path)?;
    let transcript = load_transcript(&transcript_path)?;
    let image = scene.blank_image();
    let scene_abstractor = config.scene_abstractor.finalize(
        scene.detector(),
        scene.segmenter(),
        scene.depth_estimator(),
        scene.orientation_estimator(),
        log.child("scene"),
    )?;
    let mut router = config.question_router.finalize(
        ScriptedLanguageModel::new(transcript),
        scene_abstractor,
        log.child("router"),
    )?;

    let answer = router.answer_with_trace(question, &image)?;

    println!("central perspective: {}", answer.central_perspective);
    println!("egocentric question: {}", answer.egocentric_question);
    println!("coordinates: {}", answer.coordinates);
    println!("prompt:\n{}", answer.prompt);
    println!("answer: {}", answer.answer);

    #[cfg(feature = "rerun")]
    {
        let recording = output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scene.rrd");
        visualize::save_recording(&recording, &image, &answer)?;
        log.info(format_args!("debug recording saved to {}", recording.display()));
    }

    Ok(())
}
