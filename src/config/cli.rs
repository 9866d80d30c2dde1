use std::path::PathBuf;

use clap::Parser;

use crate::config::analysis::{AnalysisConfig, InputFormat, RenderMode};

/// Command-line arguments of the survey analyzer.
/// Flags given here override the matching fields of the YAML config.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path or http(s) URL of the raw survey responses
    #[arg(short, long)]
    pub responses: Option<String>,

    /// Path or http(s) URL of the question metadata
    #[arg(short, long)]
    pub metadata: Option<String>,

    /// Input format of both sources
    #[arg(short, long, value_enum)]
    pub format: Option<InputFormatArg>,

    /// Path to the analysis configuration YAML file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Path of the JSON report to write
    #[arg(short = 'o', long, default_value = "analysis_report.json")]
    pub output: PathBuf,

    /// Survey identifier used for storage paths
    #[arg(long)]
    pub survey_id: Option<String>,

    /// Whether the report carries chart specs or storage paths
    #[arg(long, value_enum)]
    pub render_mode: Option<RenderModeArg>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Optional directory for a daily-rotated log file
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    pub validate_config: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormatArg {
    Csv,
    Parquet,
}

impl From<InputFormatArg> for InputFormat {
    fn from(arg: InputFormatArg) -> Self {
        match arg {
            InputFormatArg::Csv => InputFormat::Csv,
            InputFormatArg::Parquet => InputFormat::Parquet,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderModeArg {
    Spec,
    StoragePath,
}

impl From<RenderModeArg> for RenderMode {
    fn from(arg: RenderModeArg) -> Self {
        match arg {
            RenderModeArg::Spec => RenderMode::Spec,
            RenderModeArg::StoragePath => RenderMode::StoragePath,
        }
    }
}

impl Args {
    /// Applies the command-line overrides on top of a loaded config.
    pub fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(responses) = &self.responses {
            config.input.responses = responses.clone();
        }
        if let Some(metadata) = &self.metadata {
            config.input.metadata = metadata.clone();
        }
        if let Some(format) = self.format {
            config.input.format = format.into();
        }
        if let Some(survey_id) = &self.survey_id {
            config.output.survey_id = survey_id.clone();
        }
        if let Some(mode) = self.render_mode {
            config.output.render_mode = mode.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config_fields() {
        let args = Args::parse_from([
            "survey_analyzer",
            "--responses",
            "r.parquet",
            "--format",
            "parquet",
            "--render-mode",
            "storage-path",
            "--survey-id",
            "abc",
        ]);
        let mut config = AnalysisConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.input.responses, "r.parquet");
        assert_eq!(config.input.metadata, "data/metadata.csv");
        assert_eq!(config.input.format, InputFormat::Parquet);
        assert_eq!(config.output.render_mode, RenderMode::StoragePath);
        assert_eq!(config.output.survey_id, "abc");
        assert_eq!(args.output, PathBuf::from("analysis_report.json"));
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = Args::parse_from(["survey_analyzer"]);
        let mut config = AnalysisConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config, AnalysisConfig::default());
    }
}
