// src/config.rs

pub mod analysis;
pub mod cli;

pub use analysis::{
    load_analysis_config, AnalysisConfig, InputConfig, InputFormat, OutputConfig, RenderMode,
    SentimentAnalysisParams, StepConfig, SummaryConfig, TextCorrectionParams,
};
