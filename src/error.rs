use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The Error type for survey analysis operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration validation error: {0}")]
    ConfigValidationError(String),

    #[error("Join error: no response row matched any question metadata on survey_item_id ({responses} responses, {questions} questions)")]
    Join { responses: usize, questions: usize },

    #[error("Duplicate reshape key: two different answers to '{question}' at '{created_at}'")]
    DuplicateKey { created_at: String, question: String },

    #[error("Question text '{question}' is bound to more than one survey_item_id ('{first_id}', '{second_id}')")]
    DuplicateQuestion {
        question: String,
        first_id: String,
        second_id: String,
    },

    #[error("Missing column: '{0}'")]
    MissingColumn(String),

    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV error: {source}")]
    CsvError {
        #[from]
        source: csv::Error,
    },

    #[error("Parquet reading error: {source}")]
    ParquetError {
        #[from]
        source: parquet::errors::ParquetError,
    },

    #[error("Arrow conversion error: {source}")]
    ArrowError {
        #[from]
        source: arrow::error::ArrowError,
    },

    #[error("HTTP error: {source}")]
    HttpError {
        #[from]
        source: reqwest::Error,
    },

    #[error("Serialization/Deserialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("YAML error: {source}")]
    YamlError {
        #[from]
        source: serde_yaml::Error,
    },

    #[error("Error in processing step '{step_name}': {source}")]
    StepError {
        step_name: String,
        source: Box<PipelineError>,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl PipelineError {
    /// Wraps `self` into a `StepError` for the named stage.
    pub fn in_step(self, step_name: &str) -> Self {
        PipelineError::StepError {
            step_name: step_name.to_string(),
            source: Box::new(self),
        }
    }

    /// Innermost error beneath any `StepError` wrapping.
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::StepError { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Name of the outermost failed stage, if the error was raised inside one.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            PipelineError::StepError { step_name, .. } => Some(step_name),
            _ => None,
        }
    }
}
