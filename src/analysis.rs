// End-to-end survey analysis

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::{AnalysisConfig, RenderMode};
use crate::data_model::{
    AnalysisContext, AnalysisWarning, CategoryAssignment, QuestionRecord, RawResponseRow,
    LATITUDE, LONGITUDE, RESPONSE_ID,
};
use crate::error::Result;
use crate::executor::PipelineExecutor;
use crate::pipeline::charts::compute_charts;
use crate::pipeline::classifier::classify;
use crate::pipeline::enrichment::build_enrichment_steps;
use crate::pipeline::geo::{create_geojson, FeatureCollection};
use crate::pipeline::parser::parse;
use crate::pipeline::render::{ChartArtifact, ChartRenderer, SpecRenderer, StoragePathRenderer};
use crate::pipeline::summary::{summarize, SummaryStatistics};

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub survey_id: String,
    pub summary: SummaryStatistics,
    pub categories: CategoryAssignment,
    pub charts: Vec<ChartArtifact>,
    pub geojson: FeatureCollection,
    pub warnings: Vec<AnalysisWarning>,
}

/// Runs parse, classify, enrichment, charts and summary over one survey.
///
/// Any structural error aborts the run as a `StepError` naming the stage;
/// nothing is returned for a failed run.
#[instrument(skip_all, fields(survey_id = %config.output.survey_id))]
pub fn run_analysis(
    raw_rows: &[RawResponseRow],
    question_records: &[QuestionRecord],
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    let parsed = parse(raw_rows, question_records).map_err(|e| e.in_step("parse"))?;
    let classified =
        classify(&parsed.table, &parsed.questions).map_err(|e| e.in_step("classify"))?;
    let mut warnings = classified.warnings;

    let executor = PipelineExecutor::new(build_enrichment_steps(&config.enrichment)?);
    info!(steps = ?executor.step_names(), "Running enrichment");
    let context = executor.run(AnalysisContext::new(parsed.table, classified.categories))?;

    let (charts, (summary, summary_warnings)) = rayon::join(
        || {
            compute_charts(
                &context.categories,
                &context.sentiment_columns,
                &context.table,
                &parsed.questions,
                &parsed.response_metadata,
            )
        },
        || {
            summarize(
                &context.table,
                &parsed.response_metadata,
                &config.summary.invalid_values,
            )
        },
    );
    let charts = charts.map_err(|e| e.in_step("charts"))?;
    warnings.extend(charts.warnings);
    warnings.extend(summary_warnings);

    let geojson = create_geojson(&parsed.response_metadata, RESPONSE_ID, LATITUDE, LONGITUDE)
        .map_err(|e| e.in_step("geojson"))?;

    let mut renderer: Box<dyn ChartRenderer> = match config.output.render_mode {
        RenderMode::Spec => Box::new(SpecRenderer),
        RenderMode::StoragePath => Box::new(
            StoragePathRenderer::new(&config.output.storage_dir, &config.output.survey_id)
                .map_err(|e| e.in_step("render"))?,
        ),
    };
    let artifacts = charts
        .charts
        .iter()
        .map(|spec| renderer.render(spec))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| e.in_step("render"))?;

    info!(
        charts = artifacts.len(),
        warnings = warnings.len(),
        "Analysis complete"
    );

    Ok(AnalysisReport {
        survey_id: config.output.survey_id.clone(),
        summary,
        categories: context.categories,
        charts: artifacts,
        geojson,
        warnings,
    })
}
