use std::fs::File;
use std::io::{Cursor, Read};

use tracing::debug;

use crate::data_model::{QuestionRecord, RawResponseRow};
use crate::error::Result;

/// Loads the two inputs of an analysis run from a path or URL.
pub trait SurveyReader {
    fn read_responses(&self, source: &str) -> Result<Vec<RawResponseRow>>;

    fn read_question_records(&self, source: &str) -> Result<Vec<QuestionRecord>>;
}

/// True for `http://` and `https://` sources.
pub fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// GETs a remote source, failing on non-success status codes.
pub fn fetch_remote(url: &str) -> Result<reqwest::blocking::Response> {
    debug!(url, "Fetching remote source");
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(response)
}

/// Opens a local file or downloads a remote source into memory.
pub fn open_source(source: &str) -> Result<Box<dyn Read>> {
    if is_remote(source) {
        let body = fetch_remote(source)?.bytes()?;
        Ok(Box::new(Cursor::new(body)))
    } else {
        Ok(Box::new(File::open(source)?))
    }
}
