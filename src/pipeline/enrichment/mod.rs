// Text enrichment steps run by the PipelineExecutor

pub mod correction;
pub mod sentiment;

pub use correction::{correct_text, TextCorrection};
pub use sentiment::{perform_sentiment_analysis, sentiment_column_name, SentimentAnalysis};

use tracing::info;

use crate::config::StepConfig;
use crate::error::Result;
use crate::executor::ProcessingStep;

/// Builds the configured enrichment steps, in configuration order.
pub fn build_enrichment_steps(configs: &[StepConfig]) -> Result<Vec<Box<dyn ProcessingStep>>> {
    let mut steps: Vec<Box<dyn ProcessingStep>> = Vec::with_capacity(configs.len());
    for step_config in configs {
        let step: Result<Box<dyn ProcessingStep>> = match step_config {
            StepConfig::TextCorrection(params) => TextCorrection::from_params(params)
                .map(|s| Box::new(s) as Box<dyn ProcessingStep>),
            StepConfig::SentimentAnalysis(params) => SentimentAnalysis::from_params(params)
                .map(|s| Box::new(s) as Box<dyn ProcessingStep>),
        };
        let step = step.map_err(|e| e.in_step(step_config.name()))?;
        info!("Adding step: {}", step_config.name());
        steps.push(step);
    }
    Ok(steps)
}
