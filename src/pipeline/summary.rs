use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::data_model::{AnalysisWarning, Frame, ResponseMetadata, WideTable, COMPLETION_TIME};
use crate::error::{PipelineError, Result};

/// Survey-wide figures reported next to the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub responses: usize,
    pub completion_percentage: f64,
    pub average_response_time: Option<f64>,
    pub invalid_responses: usize,
}

/// Mean completion time over respondents that reported one.
pub fn average_response_time(response_metadata: &ResponseMetadata) -> Result<Option<f64>> {
    let column = response_metadata.require_column(COMPLETION_TIME)?;
    let (sum, count) = column
        .present()
        .filter_map(|v| v.as_f64())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return Ok(None);
    }
    Ok(Some(sum / count as f64))
}

/// Share of non-missing cells, in percent, rounded to two decimals.
pub fn calculate_completion_percentage(frame: &Frame) -> f64 {
    let total = frame.cell_count();
    if total == 0 {
        return 100.0;
    }
    let missing = frame.cells().filter(|c| c.is_missing()).count();
    let percentage = 100.0 * (1.0 - missing as f64 / total as f64);
    (percentage * 100.0).round() / 100.0
}

/// Number of text answers equal to one of `invalid_values`.
pub fn count_invalid_responses(frame: &Frame, invalid_values: &[String]) -> usize {
    frame
        .cells()
        .filter_map(|c| c.as_text())
        .filter(|text| invalid_values.iter().any(|v| v == text))
        .count()
}

#[instrument(skip_all)]
pub fn summarize(
    table: &WideTable,
    response_metadata: &ResponseMetadata,
    invalid_values: &[String],
) -> (SummaryStatistics, Vec<AnalysisWarning>) {
    let mut warnings = Vec::new();
    let average = match average_response_time(response_metadata) {
        Ok(average) => average,
        Err(PipelineError::MissingColumn(column)) => {
            warn!(column = %column, "Cannot compute average response time");
            warnings.push(AnalysisWarning::MissingColumn { column });
            None
        }
        Err(e) => {
            warn!(error = %e, "Cannot compute average response time");
            None
        }
    };

    let statistics = SummaryStatistics {
        responses: table.row_count(),
        completion_percentage: calculate_completion_percentage(table.frame()),
        average_response_time: average,
        invalid_responses: count_invalid_responses(table.frame(), invalid_values),
    };
    info!(
        responses = statistics.responses,
        completion = statistics.completion_percentage,
        invalid = statistics.invalid_responses,
        "Computed summary statistics"
    );
    (statistics, warnings)
}
