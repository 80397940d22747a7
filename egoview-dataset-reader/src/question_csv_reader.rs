use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use egoview_core::{Dataset, LogSink, QuestionRecord};
use serde::Deserialize;

pub const QUESTIONS_FILE: &str = "questions.csv";

#[derive(Debug, Deserialize)]
struct QuestionRow {
    image: PathBuf,
    prompt: String,
    label: u8,
}

/// Question dataset stored as `<dataset>/questions.csv` with an
/// `image,prompt,label` header. Image paths are relative to the dataset
/// folder.
pub struct QuestionCsvReader {
    dataset_path: PathBuf,
    records: Vec<QuestionRecord>,
    log: LogSink,
}

impl QuestionCsvReader {
    pub fn new(dataset_path: impl AsRef<Path>, log: LogSink) -> Self {
        QuestionCsvReader {
            dataset_path: dataset_path.as_ref().to_path_buf(),
            records: vec![],
            log,
        }
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    pub fn load_records(&mut self) -> Result<()> {
        let questions_path = self.dataset_path.join(QUESTIONS_FILE);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&questions_path)
            .with_context(|| format!("cannot open {}", questions_path.display()))?;

        let mut records = vec![];
        for (line, row) in reader.deserialize::<QuestionRow>().enumerate() {
            let row = row.with_context(|| {
                format!("bad row {} in {}", line + 1, questions_path.display())
            })?;
            if row.label > 1 {
                bail!(
                    "row {} in {}: label must be 0 or 1, got {}",
                    line + 1,
                    questions_path.display(),
                    row.label
                );
            }
            records.push(QuestionRecord {
                image_path: self.dataset_path.join(row.image),
                prompt: row.prompt,
                label: row.label,
            });
        }

        self.log.info(format_args!(
            "loaded {} questions from {}",
            records.len(),
            questions_path.display()
        ));
        self.records = records;
        Ok(())
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }
}

impl Dataset<QuestionRecord> for QuestionCsvReader {
    fn get(&self, index: usize) -> Option<QuestionRecord> {
        self.records.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
