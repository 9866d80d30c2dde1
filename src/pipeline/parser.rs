// Long raw rows -> wide analysis table

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument};

use crate::data_model::{
    parse_timestamp, CellValue, Column, Frame, QuestionMetadata, QuestionRecord, RawResponseRow,
    ResponseMetadata, WideTable, RESPONSE_METADATA_COLUMNS,
};
use crate::error::{PipelineError, Result};

/// Output of [`parse`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSurvey {
    pub table: WideTable,
    pub questions: Vec<QuestionMetadata>,
    pub response_metadata: ResponseMetadata,
}

/// Joins raw responses to their question records and pivots them into one
/// row per response timestamp and one column per question.
#[instrument(skip_all, fields(raw_rows = raw_rows.len(), question_records = question_records.len()))]
pub fn parse(
    raw_rows: &[RawResponseRow],
    question_records: &[QuestionRecord],
) -> Result<ParsedSurvey> {
    let joined = join_on_survey_item_id(raw_rows, question_records);
    if joined.is_empty() {
        return Err(PipelineError::Join {
            responses: raw_rows.len(),
            questions: question_records.len(),
        });
    }
    debug!(joined = joined.len(), "Joined responses to question metadata");

    let questions = project_questions(&joined)?;
    let response_metadata = project_response_metadata(&joined)?;
    let table = pivot(&joined, &questions)?;

    info!(
        responses = table.row_count(),
        questions = questions.len(),
        respondents = response_metadata.row_count(),
        "Parsed survey data"
    );

    Ok(ParsedSurvey {
        table,
        questions,
        response_metadata,
    })
}

// Inner join, raw-row order. The first record wins when an id is listed twice.
fn join_on_survey_item_id<'a>(
    raw_rows: &'a [RawResponseRow],
    question_records: &'a [QuestionRecord],
) -> Vec<(&'a RawResponseRow, &'a QuestionRecord)> {
    let mut by_id: HashMap<&str, &QuestionRecord> = HashMap::new();
    for record in question_records {
        if by_id.contains_key(record.id.as_str()) {
            debug!(id = %record.id, "Ignoring repeated question record id");
            continue;
        }
        by_id.insert(record.id.as_str(), record);
    }

    raw_rows
        .iter()
        .filter_map(|row| {
            by_id
                .get(row.survey_item_id.as_str())
                .map(|record| (row, *record))
        })
        .collect()
}

fn project_questions(
    joined: &[(&RawResponseRow, &QuestionRecord)],
) -> Result<Vec<QuestionMetadata>> {
    let mut seen = HashSet::new();
    let mut questions: Vec<QuestionMetadata> = Vec::new();
    for (row, record) in joined {
        let metadata = QuestionMetadata {
            question: record.question.clone(),
            question_type: record.question_type.clone(),
            survey_item_id: row.survey_item_id.clone(),
        };
        if !seen.insert(metadata.clone()) {
            continue;
        }
        if let Some(existing) = questions.iter().find(|q| q.question == metadata.question) {
            return Err(PipelineError::DuplicateQuestion {
                question: metadata.question,
                first_id: existing.survey_item_id.clone(),
                second_id: metadata.survey_item_id,
            });
        }
        questions.push(metadata);
    }
    Ok(questions)
}

fn project_response_metadata(
    joined: &[(&RawResponseRow, &QuestionRecord)],
) -> Result<ResponseMetadata> {
    let rows: Vec<Vec<CellValue>> = joined
        .iter()
        .map(|(row, _)| {
            vec![
                CellValue::from_raw(&row.response_id),
                CellValue::from_opt_f64(row.quest_completion_time),
                CellValue::from_opt_str(row.city.as_deref()),
                CellValue::from_opt_str(row.country.as_deref()),
                CellValue::from_opt_str(row.region.as_deref()),
                CellValue::from_opt_f64(row.latitude),
                CellValue::from_opt_f64(row.longitude),
            ]
        })
        .collect();
    let mut frame = Frame::from_rows(&RESPONSE_METADATA_COLUMNS, rows)?;
    frame.drop_duplicate_rows();
    Ok(frame)
}

fn pivot(
    joined: &[(&RawResponseRow, &QuestionRecord)],
    questions: &[QuestionMetadata],
) -> Result<WideTable> {
    let column_of: HashMap<&str, usize> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| (q.question.as_str(), i))
        .collect();

    // Exact (question, response, created_at) duplicates collapse first.
    let mut seen_triples = HashSet::new();
    let mut rows: BTreeMap<NaiveDateTime, Vec<Option<CellValue>>> = BTreeMap::new();

    for (row, record) in joined {
        let triple = (
            record.question.as_str(),
            row.response.as_deref(),
            row.created_at.as_str(),
        );
        if !seen_triples.insert(triple) {
            continue;
        }
        let Some(&column) = column_of.get(record.question.as_str()) else {
            continue;
        };
        let timestamp = parse_timestamp(&row.created_at)?;
        let cell = CellValue::from_opt_str(row.response.as_deref());

        let slots = rows
            .entry(timestamp)
            .or_insert_with(|| vec![None; questions.len()]);
        if slots[column].is_none() {
            slots[column] = Some(cell);
        } else if slots[column].as_ref() != Some(&cell) {
            return Err(PipelineError::DuplicateKey {
                created_at: row.created_at.clone(),
                question: record.question.clone(),
            });
        }
    }

    let index: Vec<NaiveDateTime> = rows.keys().copied().collect();
    let mut columns: Vec<Column> = questions
        .iter()
        .map(|q| Column::new(q.question.clone(), Vec::with_capacity(index.len())))
        .collect();
    for slots in rows.into_values() {
        for (column, slot) in columns.iter_mut().zip(slots) {
            column.values.push(slot.unwrap_or_default());
        }
    }

    WideTable::new(index, Frame::from_columns(columns)?)
}
