// src/pipeline/readers/parquet_reader.rs

use std::collections::HashMap;
use std::fs::File;

use arrow::array::{Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use tracing::{debug, info};

use crate::data_model::{QuestionRecord, QuestionType, RawResponseRow};
use crate::error::{PipelineError, Result};
use crate::pipeline::readers::base_reader::{fetch_remote, is_remote, SurveyReader};

/// Every column of a Parquet file, cast to UTF-8, in row-major order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl StringTable {
    fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }
}

/// Reads survey inputs from Parquet files; columns of any type are read as text.
#[derive(Debug, Clone, Default)]
pub struct ParquetSurveyReader {
    batch_size: Option<usize>,
}

impl ParquetSurveyReader {
    pub fn new(batch_size: Option<usize>) -> Self {
        ParquetSurveyReader { batch_size }
    }

    /// Reads all record batches of `input`.
    pub fn read_table<R: ChunkReader + 'static>(&self, input: R) -> Result<StringTable> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(input)?;
        let builder = if let Some(batch_size) = self.batch_size {
            builder.with_batch_size(batch_size)
        } else {
            builder
        };
        let record_batch_reader = builder.build()?;

        let mut table = StringTable::default();
        for batch_result in record_batch_reader {
            let batch = batch_result?;
            if table.columns.is_empty() {
                table.columns = batch
                    .schema()
                    .fields()
                    .iter()
                    .map(|f| f.name().clone())
                    .collect();
            }

            let mut string_columns = Vec::with_capacity(batch.num_columns());
            for (i, column) in batch.columns().iter().enumerate() {
                let casted = cast(column.as_ref(), &DataType::Utf8)?;
                let strings = casted
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| {
                        PipelineError::Unexpected(format!(
                            "Column '{}' could not be read as a Utf8 StringArray",
                            table.columns[i]
                        ))
                    })?
                    .clone();
                string_columns.push(strings);
            }

            for row in 0..batch.num_rows() {
                table.rows.push(
                    string_columns
                        .iter()
                        .map(|array| {
                            if array.is_null(row) {
                                None
                            } else {
                                Some(array.value(row).to_string())
                            }
                        })
                        .collect(),
                );
            }
        }
        debug!(
            columns = table.columns.len(),
            rows = table.rows.len(),
            "Read Parquet table"
        );
        Ok(table)
    }

    fn read_source(&self, source: &str) -> Result<StringTable> {
        if is_remote(source) {
            let body = fetch_remote(source)?.bytes()?;
            self.read_table(body)
        } else {
            self.read_table(File::open(source)?)
        }
    }
}

fn parse_f64(value: Option<&String>) -> Option<f64> {
    value.and_then(|v| v.trim().parse::<f64>().ok())
}

/// Turns a string table into raw response rows.
pub fn responses_from_table(table: &StringTable) -> Result<Vec<RawResponseRow>> {
    let response_id = table.require("response_id")?;
    let survey_item_id = table.require("survey_item_id")?;
    let created_at = table.require("created_at")?;
    let optional: HashMap<&str, Option<usize>> = [
        "response",
        "quest_completion_time",
        "city",
        "country",
        "region",
        "latitude",
        "longitude",
    ]
    .into_iter()
    .map(|name| (name, table.index_of(name)))
    .collect();

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| -> Result<RawResponseRow> {
            let required = |idx: usize, name: &str| {
                row[idx].clone().ok_or_else(|| {
                    PipelineError::Unexpected(format!("Row {} has a null '{}'", i, name))
                })
            };
            let get = |name: &str| {
                optional
                    .get(name)
                    .copied()
                    .flatten()
                    .and_then(|idx| row[idx].as_ref())
            };
            Ok(RawResponseRow {
                response_id: required(response_id, "response_id")?,
                survey_item_id: required(survey_item_id, "survey_item_id")?,
                created_at: required(created_at, "created_at")?,
                response: get("response").cloned(),
                quest_completion_time: parse_f64(get("quest_completion_time")),
                city: get("city").cloned(),
                country: get("country").cloned(),
                region: get("region").cloned(),
                latitude: parse_f64(get("latitude")),
                longitude: parse_f64(get("longitude")),
            })
        })
        .collect()
}

/// Turns a string table into question records.
pub fn question_records_from_table(table: &StringTable) -> Result<Vec<QuestionRecord>> {
    let id = table.require("id")?;
    let question = table.require("question")?;
    let question_type = table.require("type")?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| -> Result<QuestionRecord> {
            let required = |idx: usize, name: &str| {
                row[idx].clone().ok_or_else(|| {
                    PipelineError::Unexpected(format!("Row {} has a null '{}'", i, name))
                })
            };
            Ok(QuestionRecord {
                id: required(id, "id")?,
                question: required(question, "question")?,
                question_type: QuestionType::from(required(question_type, "type")?),
            })
        })
        .collect()
}

impl SurveyReader for ParquetSurveyReader {
    fn read_responses(&self, source: &str) -> Result<Vec<RawResponseRow>> {
        let rows = responses_from_table(&self.read_source(source)?)?;
        info!(source, rows = rows.len(), "Read survey responses");
        Ok(rows)
    }

    fn read_question_records(&self, source: &str) -> Result<Vec<QuestionRecord>> {
        let records = question_records_from_table(&self.read_source(source)?)?;
        info!(source, records = records.len(), "Read question metadata");
        Ok(records)
    }
}
