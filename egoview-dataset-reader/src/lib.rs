pub mod fixtures;
pub mod question_csv_reader;
