use crate::error::{PipelineError, Result};
use crate::utils::spelling::DEFAULT_FREQUENCY_DICTIONARY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overall analysis configuration read from YAML.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub input: InputConfig,
    /// Ordered enrichment steps. Absent means every step with defaults.
    #[serde(default = "default_enrichment")]
    pub enrichment: Vec<StepConfig>,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            input: InputConfig::default(),
            enrichment: default_enrichment(),
            summary: SummaryConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

fn default_enrichment() -> Vec<StepConfig> {
    vec![
        StepConfig::TextCorrection(TextCorrectionParams::default()),
        StepConfig::SentimentAnalysis(SentimentAnalysisParams::default()),
    ]
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        self.input.validate()?;
        for step_config in &self.enrichment {
            step_config.validate()?;
        }
        self.summary.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    #[default]
    Csv,
    Parquet,
}

/// Where the raw responses and the question metadata come from.
/// Sources are local paths or http(s) URLs.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct InputConfig {
    #[serde(default)]
    pub format: InputFormat,
    #[serde(default = "default_responses_source")]
    pub responses: String,
    #[serde(default = "default_metadata_source")]
    pub metadata: String,
}

fn default_responses_source() -> String {
    "data/responses.csv".to_string()
}

fn default_metadata_source() -> String {
    "data/metadata.csv".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            format: InputFormat::default(),
            responses: default_responses_source(),
            metadata: default_metadata_source(),
        }
    }
}

impl InputConfig {
    pub fn validate(&self) -> Result<()> {
        if self.responses.trim().is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "InputConfig: responses source cannot be empty".to_string(),
            ));
        }
        if self.metadata.trim().is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "InputConfig: metadata source cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single enrichment step, selected by the `type` field.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum StepConfig {
    TextCorrection(TextCorrectionParams),
    SentimentAnalysis(SentimentAnalysisParams),
}

impl StepConfig {
    /// Returns a string slice representing the name of the step type.
    pub fn name(&self) -> &'static str {
        match self {
            StepConfig::TextCorrection(_) => "TextCorrection",
            StepConfig::SentimentAnalysis(_) => "SentimentAnalysis",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            StepConfig::TextCorrection(params) => params.validate(),
            StepConfig::SentimentAnalysis(params) => params.validate(),
        }
    }
}

/// Parameters for the TextCorrection step.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TextCorrectionParams {
    #[serde(default = "default_max_edit_distance")]
    pub max_edit_distance: usize,
    /// Path or http(s) URL of a `term count` frequency dictionary.
    #[serde(default = "default_frequency_dictionary")]
    pub frequency_dictionary: String,
    /// Optional text corpus whose words extend the dictionary.
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,
}

fn default_max_edit_distance() -> usize {
    2
}

fn default_frequency_dictionary() -> String {
    DEFAULT_FREQUENCY_DICTIONARY.to_string()
}

impl Default for TextCorrectionParams {
    fn default() -> Self {
        TextCorrectionParams {
            max_edit_distance: default_max_edit_distance(),
            frequency_dictionary: default_frequency_dictionary(),
            corpus_path: None,
        }
    }
}

impl TextCorrectionParams {
    pub fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.max_edit_distance) {
            return Err(PipelineError::ConfigValidationError(format!(
                "TextCorrectionParams: max_edit_distance must be 1 or 2, got {}",
                self.max_edit_distance
            )));
        }
        if self.frequency_dictionary.trim().is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "TextCorrectionParams: frequency_dictionary cannot be empty".to_string(),
            ));
        }
        if let Some(path) = &self.corpus_path {
            if path.as_os_str().is_empty() {
                return Err(PipelineError::ConfigValidationError(
                    "TextCorrectionParams: corpus_path cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Parameters for the SentimentAnalysis step. The step has no options yet;
/// the struct keeps `- type: SentimentAnalysis` entries uniform with the
/// other steps.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SentimentAnalysisParams {}

impl SentimentAnalysisParams {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SummaryConfig {
    /// Answers counted as invalid responses.
    #[serde(default = "default_invalid_values")]
    pub invalid_values: Vec<String>,
}

pub fn default_invalid_values() -> Vec<String> {
    vec!["N/A".to_string(), "Unknown".to_string()]
}

impl Default for SummaryConfig {
    fn default() -> Self {
        SummaryConfig {
            invalid_values: default_invalid_values(),
        }
    }
}

impl SummaryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.invalid_values.iter().any(|v| v.is_empty()) {
            return Err(PipelineError::ConfigValidationError(
                "SummaryConfig: invalid_values cannot contain empty strings".to_string(),
            ));
        }
        Ok(())
    }
}

/// How chart specs end up in the report.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// The report carries the plot specs themselves.
    #[default]
    Spec,
    /// Each spec is persisted under the storage directory and the report
    /// carries the resulting paths.
    StoragePath,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub render_mode: RenderMode,
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    #[serde(default = "default_survey_id")]
    pub survey_id: String,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("survey_images")
}

fn default_survey_id() -> String {
    "survey".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            render_mode: RenderMode::default(),
            storage_dir: default_storage_dir(),
            survey_id: default_survey_id(),
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<()> {
        if self.survey_id.trim().is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "OutputConfig: survey_id cannot be empty".to_string(),
            ));
        }
        if self.storage_dir.as_os_str().is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "OutputConfig: storage_dir cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads, parses and validates the analysis configuration YAML file.
pub fn load_analysis_config<P: AsRef<Path>>(config_path: P) -> Result<AnalysisConfig> {
    let path_ref = config_path.as_ref();
    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to read analysis config file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    let config: AnalysisConfig = serde_yaml::from_str(&config_content).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to parse analysis config YAML from '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // Helper to create a temporary config file with given content
    fn create_temp_config_file(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "{}", content).expect("Failed to write to temp file");
        temp_file
    }

    #[test]
    fn test_load_full_config() {
        let yaml_content = r#"
input:
  format: parquet
  responses: https://example.com/responses.parquet
  metadata: data/questions.parquet
enrichment:
  - type: SentimentAnalysis
  - type: TextCorrection
    max_edit_distance: 1
    frequency_dictionary: dictionaries/en.txt
summary:
  invalid_values: ["N/A", "Unknown", "-"]
output:
  render_mode: storage_path
  storage_dir: out/images
  survey_id: sample_001
"#;
        let temp_file = create_temp_config_file(yaml_content);
        let config = load_analysis_config(temp_file.path()).expect("Should load valid config");

        assert_eq!(config.input.format, InputFormat::Parquet);
        assert_eq!(config.enrichment.len(), 2);
        assert_eq!(config.enrichment[0].name(), "SentimentAnalysis");
        match &config.enrichment[1] {
            StepConfig::TextCorrection(params) => {
                assert_eq!(params.max_edit_distance, 1);
                assert_eq!(params.frequency_dictionary, "dictionaries/en.txt");
                assert!(params.corpus_path.is_none());
            }
            _ => panic!("Expected TextCorrection"),
        }
        assert_eq!(config.summary.invalid_values.len(), 3);
        assert_eq!(config.output.render_mode, RenderMode::StoragePath);
        assert_eq!(config.output.storage_dir, PathBuf::from("out/images"));
    }

    #[test]
    fn test_missing_enrichment_runs_every_step() {
        let temp_file = create_temp_config_file("output:\n  survey_id: s1\n");
        let config = load_analysis_config(temp_file.path()).unwrap();
        let names: Vec<&str> = config.enrichment.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["TextCorrection", "SentimentAnalysis"]);
        match &config.enrichment[0] {
            StepConfig::TextCorrection(params) => {
                assert_eq!(params.frequency_dictionary, DEFAULT_FREQUENCY_DICTIONARY)
            }
            _ => panic!("Expected TextCorrection"),
        }
        assert_eq!(config.summary.invalid_values, default_invalid_values());
        assert_eq!(config.output.render_mode, RenderMode::Spec);
    }

    #[test]
    fn test_empty_enrichment_runs_nothing() {
        let temp_file = create_temp_config_file("enrichment: []\n");
        let config = load_analysis_config(temp_file.path()).unwrap();
        assert!(config.enrichment.is_empty());
    }

    #[test]
    fn test_invalid_edit_distance_rejected() {
        let temp_file = create_temp_config_file(
            "enrichment:\n  - type: TextCorrection\n    max_edit_distance: 3\n",
        );
        let err = load_analysis_config(temp_file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigValidationError(msg) if msg.contains("max_edit_distance")));
    }

    #[test]
    fn test_empty_frequency_dictionary_rejected() {
        let temp_file = create_temp_config_file(
            "enrichment:\n  - type: TextCorrection\n    frequency_dictionary: \"\"\n",
        );
        let err = load_analysis_config(temp_file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigValidationError(msg) if msg.contains("frequency_dictionary")));
    }

    #[test]
    fn test_unknown_step_type_is_a_parse_error() {
        let temp_file = create_temp_config_file("enrichment:\n  - type: Translate\n");
        let err = load_analysis_config(temp_file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(_)));
    }

    #[test]
    fn test_empty_sentinel_and_survey_id_rejected() {
        let mut config = AnalysisConfig::default();
        config.summary.invalid_values.push(String::new());
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.output.survey_id = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_analysis_config("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(msg) if msg.contains("Failed to read")));
    }
}
