// src/pipeline/readers/mod.rs

pub mod base_reader;
pub mod csv_reader;
pub mod parquet_reader;

pub use base_reader::SurveyReader;
pub use csv_reader::CsvSurveyReader;
pub use parquet_reader::ParquetSurveyReader;

use crate::config::InputFormat;

/// Reader for the configured input format.
pub fn reader_for(format: InputFormat) -> Box<dyn SurveyReader> {
    match format {
        InputFormat::Csv => Box::new(CsvSurveyReader::new()),
        InputFormat::Parquet => Box::new(ParquetSurveyReader::default()),
    }
}
