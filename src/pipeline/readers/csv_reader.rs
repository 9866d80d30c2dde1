use std::io::Read;

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::data_model::{QuestionRecord, RawResponseRow};
use crate::error::Result;
use crate::pipeline::readers::base_reader::{open_source, SurveyReader};

/// Reads survey inputs from CSV files with a header row.
/// Empty fields become `None`; unknown columns are ignored.
#[derive(Debug, Clone)]
pub struct CsvSurveyReader {
    delimiter: u8,
}

impl Default for CsvSurveyReader {
    fn default() -> Self {
        CsvSurveyReader { delimiter: b',' }
    }
}

impl CsvSurveyReader {
    pub fn new() -> Self {
        CsvSurveyReader::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Deserializes every record of `input` into `T`.
    pub fn read_records<T: DeserializeOwned, R: Read>(&self, input: R) -> Result<Vec<T>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .trim(Trim::Headers)
            .from_reader(input);
        let mut records = Vec::new();
        for record in reader.deserialize() {
            records.push(record?);
        }
        Ok(records)
    }
}

impl SurveyReader for CsvSurveyReader {
    fn read_responses(&self, source: &str) -> Result<Vec<RawResponseRow>> {
        let rows: Vec<RawResponseRow> = self.read_records(open_source(source)?)?;
        info!(source, rows = rows.len(), "Read survey responses");
        Ok(rows)
    }

    fn read_question_records(&self, source: &str) -> Result<Vec<QuestionRecord>> {
        let records: Vec<QuestionRecord> = self.read_records(open_source(source)?)?;
        info!(source, records = records.len(), "Read question metadata");
        Ok(records)
    }
}
