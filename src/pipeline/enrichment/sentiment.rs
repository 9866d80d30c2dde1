use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::config::SentimentAnalysisParams;
use crate::data_model::{AnalysisContext, CellValue, Column, WideTable};
use crate::error::Result;
use crate::executor::ProcessingStep;
use crate::utils::SentimentAnalyzer;

pub const SENTIMENT_SUFFIX: &str = "_sentiment";

pub fn sentiment_column_name(question: &str) -> String {
    format!("{}{}", question, SENTIMENT_SUFFIX)
}

/// Writes a `<question>_sentiment` column for each of `columns` holding the
/// sentiment category of every present answer. A sentiment column left by an
/// earlier run is overwritten. Returns the column names in `columns` order.
pub fn perform_sentiment_analysis(
    table: &mut WideTable,
    columns: &[String],
    analyzer: &SentimentAnalyzer,
) -> Result<Vec<String>> {
    let mut added = Vec::with_capacity(columns.len());
    for name in columns {
        let source = table.require_column(name)?;
        let values: Vec<CellValue> = source
            .values
            .par_iter()
            .map(|cell| match cell.to_text() {
                Some(text) => Ok(CellValue::Text(analyzer.categorize(&text)?.to_string())),
                None => Ok(CellValue::Missing),
            })
            .collect::<Result<_>>()?;

        let sentiment_name = sentiment_column_name(name);
        debug!(column = %sentiment_name, "Wrote sentiment column");
        table
            .frame_mut()
            .replace_or_push_column(Column::new(sentiment_name.clone(), values))?;
        added.push(sentiment_name);
    }
    Ok(added)
}

/// Sentiment categorisation of the open-ended questions.
pub struct SentimentAnalysis {
    analyzer: SentimentAnalyzer,
}

impl SentimentAnalysis {
    pub fn new(analyzer: SentimentAnalyzer) -> Self {
        SentimentAnalysis { analyzer }
    }

    pub fn from_params(params: &SentimentAnalysisParams) -> Result<Self> {
        params.validate()?;
        Ok(SentimentAnalysis::new(SentimentAnalyzer::new()))
    }
}

impl ProcessingStep for SentimentAnalysis {
    fn name(&self) -> &'static str {
        "SentimentAnalysis"
    }

    #[instrument(skip_all, name = "SentimentAnalysis")]
    fn process(&self, mut context: AnalysisContext) -> Result<AnalysisContext> {
        let added = perform_sentiment_analysis(
            &mut context.table,
            &context.categories.open_ended,
            &self.analyzer,
        )?;
        info!(columns = added.len(), "Categorised open-ended answers by sentiment");
        for name in added {
            if !context.sentiment_columns.contains(&name) {
                context.sentiment_columns.push(name);
            }
        }
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::{Category, CategoryAssignment, Frame};
    use crate::error::PipelineError;
    use chrono::NaiveDate;

    fn context() -> AnalysisContext {
        let ts = NaiveDate::from_ymd_opt(2023, 10, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let frame = Frame::from_columns(vec![Column::new(
            "Feedback",
            vec![
                CellValue::Text("Excellent service".into()),
                CellValue::Text("Terrible, bad wait".into()),
                CellValue::Text("I came on Tuesday".into()),
                CellValue::Missing,
            ],
        )])
        .unwrap();
        let table = WideTable::new(vec![ts; 4], frame).unwrap();
        let mut categories = CategoryAssignment::default();
        categories.assign(Category::OpenEnded, "Feedback");
        AnalysisContext::new(table, categories)
    }

    #[test]
    fn test_adds_sentiment_column() {
        let step = SentimentAnalysis::new(SentimentAnalyzer::new());
        let context = step.process(context()).unwrap();

        assert_eq!(context.sentiment_columns, vec!["Feedback_sentiment"]);
        let values = &context
            .table
            .require_column("Feedback_sentiment")
            .unwrap()
            .values;
        assert_eq!(
            values,
            &vec![
                CellValue::Text("positive".into()),
                CellValue::Text("negative".into()),
                CellValue::Text("neutral".into()),
                CellValue::Missing,
            ]
        );
        // The source column is unchanged.
        assert_eq!(
            context.table.require_column("Feedback").unwrap().values[0],
            CellValue::Text("Excellent service".into())
        );
    }

    #[test]
    fn test_numeric_answers_are_coerced_to_text() {
        let mut ctx = context();
        ctx.table
            .frame_mut()
            .push_column(Column::new(
                "Score",
                vec![
                    CellValue::Int(5),
                    CellValue::Missing,
                    CellValue::Float(2.5),
                    CellValue::Missing,
                ],
            ))
            .unwrap();
        let added =
            perform_sentiment_analysis(&mut ctx.table, &["Score".to_string()], &SentimentAnalyzer::new())
                .unwrap();
        assert_eq!(added, vec!["Score_sentiment"]);
        let values = &ctx.table.require_column("Score_sentiment").unwrap().values;
        assert_eq!(values[0], CellValue::Text("neutral".into()));
        assert_eq!(values[1], CellValue::Missing);
    }

    #[test]
    fn test_missing_source_column() {
        let mut ctx = context();
        let err =
            perform_sentiment_analysis(&mut ctx.table, &["Nope".to_string()], &SentimentAnalyzer::new())
                .unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(_)));
    }

    #[test]
    fn test_rerun_overwrites_sentiment_column() {
        let step = SentimentAnalysis::from_params(&SentimentAnalysisParams::default()).unwrap();
        let once = step.process(context()).unwrap();
        let twice = step.process(once.clone()).unwrap();

        assert_eq!(twice.sentiment_columns, vec!["Feedback_sentiment"]);
        assert_eq!(twice.table, once.table);
        assert_eq!(twice.table.frame().column_count(), 2);
    }
}
