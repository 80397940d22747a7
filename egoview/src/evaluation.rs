//! Batch question answering over a labelled dataset.
//!
//! Every record is answered independently; a failing record is logged with
//! its index and collected, the batch always runs to the end.

use std::{
    collections::BTreeMap,
    fmt,
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use egoview_core::{Dataset, LogSink, QuestionRecord};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::question_router::PerspectiveQuestionAnswering;

pub const STATS_FILE: &str = "stats.txt";
pub const RESULTS_FILE: &str = "results.json";
pub const ERRORS_FILE: &str = "errors.log";

/// A model answer mapped onto the label space when possible.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedAnswer {
    Binary(u8),
    Verbatim(String),
}

/// `yes` is 1, `no` is 0, anything else is kept (lowercased) and never
/// counts as correct.
pub fn normalize_answer(answer: &str) -> NormalizedAnswer {
    let answer = answer.trim().to_lowercase();
    match answer.as_str() {
        "yes" => NormalizedAnswer::Binary(1),
        "no" => NormalizedAnswer::Binary(0),
        _ => NormalizedAnswer::Verbatim(answer),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub prompt: String,
    pub label: u8,
    pub answer: NormalizedAnswer,
}

impl RecordOutcome {
    pub fn is_correct(&self) -> bool {
        self.answer == NormalizedAnswer::Binary(self.label)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordFailure {
    pub index: usize,
    pub message: String,
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error processing record {}: {}", self.index, self.message)
    }
}

#[derive(Clone, Debug, Default)]
pub struct EvaluationReport {
    pub results: BTreeMap<usize, RecordOutcome>,
    pub failures: Vec<RecordFailure>,
}

impl EvaluationReport {
    pub fn correct_count(&self) -> usize {
        self.results.values().filter(|r| r.is_correct()).count()
    }

    /// Records that produced an answer; failures are not counted.
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// `None` when no record was answered.
    pub fn accuracy(&self) -> Option<f64> {
        match self.total_count() {
            0 => None,
            total => Some(self.correct_count() as f64 / total as f64),
        }
    }

    pub fn stats(&self) -> String {
        let accuracy = match self.accuracy() {
            Some(accuracy) => accuracy.to_string(),
            None => "n/a".to_string(),
        };
        format!(
            "Correct count: {}\nTotal count: {}\nAccuracy: {}\n",
            self.correct_count(),
            self.total_count(),
            accuracy
        )
    }

    /// Writes `stats.txt`, `results.json` and `errors.log` into `dir`,
    /// creating it if needed.
    pub fn write_to(&self, dir: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create output folder {}", dir.display()))?;

        fs::write(dir.join(STATS_FILE), self.stats())
            .with_context(|| format!("cannot write {STATS_FILE}"))?;

        let results = File::create(dir.join(RESULTS_FILE))
            .with_context(|| format!("cannot create {RESULTS_FILE}"))?;
        serde_json::to_writer_pretty(BufWriter::new(results), &self.results)
            .with_context(|| format!("cannot write {RESULTS_FILE}"))?;

        let mut errors = BufWriter::new(
            File::create(dir.join(ERRORS_FILE))
                .with_context(|| format!("cannot create {ERRORS_FILE}"))?,
        );
        for failure in &self.failures {
            writeln!(errors, "{failure}")?;
        }
        errors.flush()?;
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorCfg {
    /// Questions are lowercased before they are asked.
    pub lowercase_prompts: bool,
    /// Only the first `limit` records are evaluated.
    pub limit: Option<usize>,
}

impl Default for EvaluatorCfg {
    fn default() -> Self {
        Self {
            lowercase_prompts: true,
            limit: None,
        }
    }
}

impl EvaluatorCfg {
    pub fn finalize(self, log: LogSink) -> Evaluator {
        Evaluator { cfg: self, log }
    }
}

pub struct Evaluator {
    cfg: EvaluatorCfg,
    log: LogSink,
}

impl Evaluator {
    pub fn run<Q, D, F>(&self, answerer: &mut Q, dataset: &D, mut load_image: F) -> EvaluationReport
    where
        Q: PerspectiveQuestionAnswering,
        D: Dataset<QuestionRecord>,
        F: FnMut(&Path) -> anyhow::Result<RgbImage>,
    {
        let limit = self.cfg.limit.unwrap_or(usize::MAX);
        let mut report = EvaluationReport::default();

        for (index, record) in dataset.iter().take(limit) {
            let prompt = if self.cfg.lowercase_prompts {
                record.prompt.to_lowercase()
            } else {
                record.prompt.clone()
            };

            let answer = load_image(&record.image_path)
                .with_context(|| format!("cannot load image {}", record.image_path.display()))
                .and_then(|image| Ok(answerer.ask_question_with_perspective(&prompt, &image)?));

            match answer {
                Ok(answer) => {
                    let outcome = RecordOutcome {
                        prompt,
                        label: record.label,
                        answer: normalize_answer(&answer),
                    };
                    self.log.info(format_args!(
                        "record {index}: answer {:?}, label {}, correct {}",
                        outcome.answer,
                        outcome.label,
                        outcome.is_correct()
                    ));
                    report.results.insert(index, outcome);
                }
                Err(err) => {
                    let failure = RecordFailure {
                        index,
                        message: format!("{err:#}"),
                    };
                    self.log.error(format_args!("{failure}"));
                    report.failures.push(failure);
                }
            }
        }

        self.log.info(format_args!(
            "evaluated {} records, {} failed",
            report.total_count() + report.failures.len(),
            report.failures.len()
        ));
        report
    }
}
