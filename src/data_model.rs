use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

// Column names of the response metadata table
pub const RESPONSE_ID: &str = "response_id";
pub const COMPLETION_TIME: &str = "quest_completion_time";
pub const CITY: &str = "city";
pub const COUNTRY: &str = "country";
pub const REGION: &str = "region";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

pub const RESPONSE_METADATA_COLUMNS: [&str; 7] = [
    RESPONSE_ID,
    COMPLETION_TIME,
    CITY,
    COUNTRY,
    REGION,
    LATITUDE,
    LONGITUDE,
];

/// Raw answer strings treated as missing values.
const MISSING_MARKERS: &[&str] = &["nan", "NaN", "null", "NULL", "None"];

/// A single cell of an analysis table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Parses a raw answer the way a CSV loader infers cell types.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
            return CellValue::Missing;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::Float(f),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    pub fn from_opt_str(raw: Option<&str>) -> Self {
        raw.map(CellValue::from_raw).unwrap_or(CellValue::Missing)
    }

    pub fn from_opt_f64(value: Option<f64>) -> Self {
        match value {
            Some(f) if f.is_finite() => CellValue::Float(f),
            _ => CellValue::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Int(_) | CellValue::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text form of a present value; `None` for missing cells.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Missing => None,
            other => Some(other.to_string()),
        }
    }

    /// Hashable identity of the cell, used for distinct counts and row dedup.
    pub fn key(&self) -> CellKey<'_> {
        match self {
            CellValue::Missing => CellKey::Missing,
            CellValue::Int(i) => CellKey::Int(*i),
            CellValue::Float(f) => CellKey::Float(f.to_bits()),
            CellValue::Text(s) => CellKey::Text(s),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKey<'a> {
    Missing,
    Int(i64),
    Float(u64),
    Text(&'a str),
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }

    /// Present (non-missing) cells in row order.
    pub fn present(&self) -> impl Iterator<Item = &CellValue> {
        self.values.iter().filter(|v| !v.is_missing())
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// Number of distinct non-missing values.
    pub fn distinct_count(&self) -> usize {
        self.present().map(CellValue::key).collect::<HashSet<_>>().len()
    }

    /// True when at least one value is present and every present value is a number.
    pub fn is_numeric(&self) -> bool {
        let mut present = self.present().peekable();
        present.peek().is_some() && present.all(CellValue::is_numeric)
    }
}

/// A small column-oriented table; every column has the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<Column>,
    rows: usize,
}

impl Frame {
    pub fn new() -> Self {
        Frame::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut frame = Frame::new();
        for column in columns {
            frame.push_column(column)?;
        }
        Ok(frame)
    }

    /// Builds a frame from row-major data.
    pub fn from_rows(names: &[&str], rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let mut columns: Vec<Column> = names
            .iter()
            .map(|n| Column::new(*n, Vec::with_capacity(rows.len())))
            .collect();
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(PipelineError::Unexpected(format!(
                    "Row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    names.len()
                )));
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.values.push(cell);
            }
        }
        Frame::from_columns(columns)
    }

    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.column(&column.name).is_some() {
            return Err(PipelineError::Unexpected(format!(
                "Column '{}' already exists",
                column.name
            )));
        }
        if self.columns.is_empty() {
            self.rows = column.values.len();
        } else if column.values.len() != self.rows {
            return Err(PipelineError::Unexpected(format!(
                "Column '{}' has {} rows, expected {}",
                column.name,
                column.values.len(),
                self.rows
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Replaces the values of an existing column of the same name in place,
    /// or appends the column when there is none.
    pub fn replace_or_push_column(&mut self, column: Column) -> Result<()> {
        let Some(existing) = self.columns.iter_mut().find(|c| c.name == column.name) else {
            return self.push_column(column);
        };
        if column.values.len() != self.rows {
            return Err(PipelineError::Unexpected(format!(
                "Column '{}' has {} rows, expected {}",
                column.name,
                column.values.len(),
                self.rows
            )));
        }
        *existing = column;
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.columns.len()
    }

    pub fn cells(&self) -> impl Iterator<Item = &CellValue> {
        self.columns.iter().flat_map(|c| c.values.iter())
    }

    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index >= self.rows {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// Removes whole-row duplicates, keeping the first occurrence.
    pub fn drop_duplicate_rows(&mut self) {
        let keep: Vec<bool> = {
            let mut seen = HashSet::new();
            (0..self.rows)
                .map(|i| {
                    let key: Vec<CellKey<'_>> =
                        self.columns.iter().map(|c| c.values[i].key()).collect();
                    seen.insert(key)
                })
                .collect()
        };
        if keep.iter().all(|k| *k) {
            return;
        }
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.values.retain(|_| *flags.next().unwrap_or(&true));
        }
        self.rows = keep.iter().filter(|k| **k).count();
    }
}

/// Wide analysis table: one row per response instance (keyed by its
/// timestamp), one column per question named by the question text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WideTable {
    index: Vec<NaiveDateTime>,
    frame: Frame,
}

impl WideTable {
    pub fn new(index: Vec<NaiveDateTime>, frame: Frame) -> Result<Self> {
        if frame.column_count() > 0 && frame.row_count() != index.len() {
            return Err(PipelineError::Unexpected(format!(
                "Index has {} entries but the table has {} rows",
                index.len(),
                frame.row_count()
            )));
        }
        Ok(WideTable { index, frame })
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.frame.column(name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.frame.require_column(name)
    }
}

/// Deduplicated per-response metadata (timing and geography).
pub type ResponseMetadata = Frame;

/// One raw response row: the answer of one response instance to one question.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawResponseRow {
    pub response_id: String,
    pub survey_item_id: String,
    #[serde(default)]
    pub response: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub quest_completion_time: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Declared question type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    OpenEnded,
    Scaling,
    MultipleChoice,
    Profiling,
    Unrecognized(String),
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::OpenEnded => "open_ended",
            QuestionType::Scaling => "scaling",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Profiling => "profiling",
            QuestionType::Unrecognized(tag) => tag,
        }
    }
}

impl From<String> for QuestionType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "open_ended" => QuestionType::OpenEnded,
            "scaling" => QuestionType::Scaling,
            "multiple_choice" => QuestionType::MultipleChoice,
            "profiling" => QuestionType::Profiling,
            _ => QuestionType::Unrecognized(tag),
        }
    }
}

impl From<&str> for QuestionType {
    fn from(tag: &str) -> Self {
        QuestionType::from(tag.to_string())
    }
}

impl From<QuestionType> for String {
    fn from(question_type: QuestionType) -> Self {
        question_type.as_str().to_string()
    }
}

/// A raw question metadata row as supplied by the survey backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
}

/// Deduplicated question metadata produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionMetadata {
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub survey_item_id: String,
}

/// Resolves the survey_item_id of a question by exact text match.
pub fn lookup_survey_item_id(questions: &[QuestionMetadata], question: &str) -> Option<String> {
    questions
        .iter()
        .find(|q| q.question == question)
        .map(|q| q.survey_item_id.clone())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Categorical,
    Numeric,
    OpenEnded,
    Others,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Categorical,
        Category::Numeric,
        Category::OpenEnded,
        Category::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Categorical => "categorical",
            Category::Numeric => "numeric",
            Category::OpenEnded => "open_ended",
            Category::Others => "others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category name → ordered question list. A question is in at most one list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
    pub open_ended: Vec<String>,
    pub others: Vec<String>,
}

impl CategoryAssignment {
    pub fn questions(&self, category: Category) -> &[String] {
        match category {
            Category::Categorical => &self.categorical,
            Category::Numeric => &self.numeric,
            Category::OpenEnded => &self.open_ended,
            Category::Others => &self.others,
        }
    }

    pub fn category_of(&self, question: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| self.questions(*c).iter().any(|q| q == question))
    }

    /// Appends `question` to `category`; returns false if it is already assigned.
    pub fn assign(&mut self, category: Category, question: &str) -> bool {
        if self.category_of(question).is_some() {
            return false;
        }
        let list = match category {
            Category::Categorical => &mut self.categorical,
            Category::Numeric => &mut self.numeric,
            Category::OpenEnded => &mut self.open_ended,
            Category::Others => &mut self.others,
        };
        list.push(question.to_string());
        true
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.questions(*c).len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentCategory {
    Positive,
    Neutral,
    Negative,
}

impl SentimentCategory {
    pub const POSITIVE_THRESHOLD: f64 = 0.3;
    pub const NEGATIVE_THRESHOLD: f64 = -0.3;

    /// Buckets a polarity in [-1, 1]. The bounds are symmetric and both
    /// belong to neutral: exactly 0.3 and exactly -0.3 are neutral, only
    /// values strictly beyond them are positive or negative.
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > Self::POSITIVE_THRESHOLD {
            SentimentCategory::Positive
        } else if polarity < Self::NEGATIVE_THRESHOLD {
            SentimentCategory::Negative
        } else {
            SentimentCategory::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentCategory::Positive => "positive",
            SentimentCategory::Neutral => "neutral",
            SentimentCategory::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal conditions met during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    UnresolvedQuestionId { title: String },
    EmptyCategory { category: Category },
    MissingColumn { column: String },
    DroppedProfilingQuestion { question: String, distinct_values: usize },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::UnresolvedQuestionId { title } => {
                write!(f, "no survey_item_id found for '{}'", title)
            }
            AnalysisWarning::EmptyCategory { category } => {
                write!(f, "category '{}' is empty", category)
            }
            AnalysisWarning::MissingColumn { column } => {
                write!(f, "column '{}' is missing", column)
            }
            AnalysisWarning::DroppedProfilingQuestion {
                question,
                distinct_values,
            } => write!(
                f,
                "profiling question '{}' ({} distinct values) was not classified",
                question, distinct_values
            ),
        }
    }
}

/// State handed from one enrichment step to the next.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisContext {
    pub table: WideTable,
    pub categories: CategoryAssignment,
    /// Sentiment columns added to the table, in creation order.
    pub sentiment_columns: Vec<String>,
}

impl AnalysisContext {
    pub fn new(table: WideTable, categories: CategoryAssignment) -> Self {
        AnalysisContext {
            table,
            categories,
            sentiment_columns: Vec::new(),
        }
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a response timestamp in any of the accepted layouts.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| PipelineError::InvalidTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_from_raw() {
        assert_eq!(CellValue::from_raw(""), CellValue::Missing);
        assert_eq!(CellValue::from_raw("nan"), CellValue::Missing);
        assert_eq!(CellValue::from_raw("42"), CellValue::Int(42));
        assert_eq!(CellValue::from_raw("4.5"), CellValue::Float(4.5));
        assert_eq!(CellValue::from_raw("inf"), CellValue::Text("inf".into()));
        assert_eq!(CellValue::from_raw("N/A"), CellValue::Text("N/A".into()));
    }

    #[test]
    fn test_cell_value_serializes_untagged() {
        let cells = vec![
            CellValue::Missing,
            CellValue::Int(3),
            CellValue::Float(1.5),
            CellValue::Text("Yes".into()),
        ];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[null,3,1.5,"Yes"]"#);
    }

    #[test]
    fn test_column_numeric_and_distinct() {
        let col = Column::new(
            "age",
            vec![CellValue::Int(20), CellValue::Missing, CellValue::Float(31.5)],
        );
        assert!(col.is_numeric());
        assert_eq!(col.distinct_count(), 2);

        let empty = Column::new("blank", vec![CellValue::Missing]);
        assert!(!empty.is_numeric());

        let mixed = Column::new("mixed", vec![CellValue::Int(1), CellValue::Text("x".into())]);
        assert!(!mixed.is_numeric());
    }

    #[test]
    fn test_frame_rejects_ragged_columns() {
        let mut frame = Frame::new();
        frame
            .push_column(Column::new("a", vec![CellValue::Int(1)]))
            .unwrap();
        let err = frame
            .push_column(Column::new("b", vec![CellValue::Int(1), CellValue::Int(2)]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Unexpected(_)));
        assert!(frame
            .push_column(Column::new("a", vec![CellValue::Int(9)]))
            .is_err());
    }

    #[test]
    fn test_frame_replace_or_push_column() {
        let mut frame = Frame::new();
        frame
            .push_column(Column::new("a", vec![CellValue::Int(1)]))
            .unwrap();
        frame
            .replace_or_push_column(Column::new("b", vec![CellValue::Int(2)]))
            .unwrap();
        frame
            .replace_or_push_column(Column::new("a", vec![CellValue::Int(3)]))
            .unwrap();
        assert_eq!(frame.column_names(), vec!["a", "b"]);
        assert_eq!(frame.require_column("a").unwrap().values, vec![CellValue::Int(3)]);
        assert!(frame
            .replace_or_push_column(Column::new("a", vec![CellValue::Int(1), CellValue::Int(2)]))
            .is_err());
    }

    #[test]
    fn test_frame_drop_duplicate_rows() {
        let mut frame = Frame::from_rows(
            &["id", "city"],
            vec![
                vec![CellValue::Int(1), CellValue::Text("Lagos".into())],
                vec![CellValue::Int(2), CellValue::Text("Abuja".into())],
                vec![CellValue::Int(1), CellValue::Text("Lagos".into())],
            ],
        )
        .unwrap();
        frame.drop_duplicate_rows();
        assert_eq!(frame.row_count(), 2);
        assert_eq!(
            frame.require_column("city").unwrap().values,
            vec![CellValue::Text("Lagos".into()), CellValue::Text("Abuja".into())]
        );
    }

    #[test]
    fn test_require_column_missing() {
        let frame = Frame::new();
        assert!(matches!(
            frame.require_column(COMPLETION_TIME),
            Err(PipelineError::MissingColumn(c)) if c == COMPLETION_TIME
        ));
    }

    #[test]
    fn test_question_type_tags() {
        assert_eq!(QuestionType::from("scaling"), QuestionType::Scaling);
        assert_eq!(
            QuestionType::from("matrix"),
            QuestionType::Unrecognized("matrix".into())
        );
        let json = serde_json::to_string(&QuestionType::MultipleChoice).unwrap();
        assert_eq!(json, "\"multiple_choice\"");
    }

    #[test]
    fn test_category_assignment_rejects_reassignment() {
        let mut categories = CategoryAssignment::default();
        assert!(categories.assign(Category::Categorical, "Gender"));
        assert!(!categories.assign(Category::Numeric, "Gender"));
        assert_eq!(categories.category_of("Gender"), Some(Category::Categorical));
        assert_eq!(categories.total(), 1);
    }

    #[test]
    fn test_sentiment_bucket_boundaries() {
        assert_eq!(SentimentCategory::from_polarity(0.3), SentimentCategory::Neutral);
        assert_eq!(SentimentCategory::from_polarity(-0.3), SentimentCategory::Neutral);
        assert_eq!(SentimentCategory::from_polarity(0.31), SentimentCategory::Positive);
        assert_eq!(SentimentCategory::from_polarity(-0.31), SentimentCategory::Negative);
        assert_eq!(SentimentCategory::from_polarity(-0.29), SentimentCategory::Neutral);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let a = parse_timestamp("2023-10-01 12:30:00").unwrap();
        let b = parse_timestamp("2023-10-01T12:30:00Z").unwrap();
        let c = parse_timestamp("2023-10-01T12:30:00.250").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.date(), c.date());
        assert_eq!(
            parse_timestamp("2023-10-01").unwrap().format("%H:%M").to_string(),
            "00:00"
        );
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(PipelineError::InvalidTimestamp(_))
        ));
    }
}
