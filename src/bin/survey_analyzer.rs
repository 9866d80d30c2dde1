// src/bin/survey_analyzer.rs

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use SurveyBlaster::config::cli::Args;
use SurveyBlaster::config::{load_analysis_config, AnalysisConfig};
use SurveyBlaster::pipeline::readers::reader_for;
use SurveyBlaster::pipeline::writers::{BaseWriter, JsonReportWriter};
use SurveyBlaster::run_analysis;

// The returned guard must outlive main so buffered file logs are flushed.
fn init_tracing(args: &Args) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = args.log_json.then(|| fmt::layer().json());
    let text_layer = (!args.log_json).then(|| fmt::layer());

    let (file_layer, guard) = match &args.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "survey_analyzer.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(&args);

    let mut config = match &args.config {
        Some(path) => load_analysis_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    args.apply_overrides(&mut config);
    config.validate().context("Invalid analysis configuration")?;

    if args.validate_config {
        info!(
            steps = ?config.enrichment.iter().map(|s| s.name()).collect::<Vec<_>>(),
            render_mode = ?config.output.render_mode,
            "Configuration is valid"
        );
        return Ok(());
    }

    info!(
        responses = %config.input.responses,
        metadata = %config.input.metadata,
        format = ?config.input.format,
        "Starting survey analysis"
    );

    let reader = reader_for(config.input.format);
    let raw_rows = reader
        .read_responses(&config.input.responses)
        .with_context(|| format!("Failed to read responses from {}", config.input.responses))?;
    let question_records = reader
        .read_question_records(&config.input.metadata)
        .with_context(|| format!("Failed to read metadata from {}", config.input.metadata))?;

    let report = match run_analysis(&raw_rows, &question_records, &config) {
        Ok(report) => report,
        Err(e) => {
            error!(
                step = e.failed_step().unwrap_or("unknown"),
                error = %e.root_cause(),
                "Survey analysis failed"
            );
            return Err(e.into());
        }
    };

    let mut writer = JsonReportWriter::new(&args.output)?;
    writer.write_report(&report)?;
    writer.close()?;

    info!(
        output = %args.output.display(),
        charts = report.charts.len(),
        warnings = report.warnings.len(),
        "Survey analysis finished"
    );
    Ok(())
}
