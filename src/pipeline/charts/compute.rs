use std::collections::HashMap;

use itertools::Itertools;
use tracing::{debug, info, instrument, warn};

use crate::data_model::{
    lookup_survey_item_id, AnalysisWarning, Category, CategoryAssignment, CellKey, CellValue, Column,
    QuestionMetadata, ResponseMetadata, WideTable, CITY, COUNTRY, REGION,
};
use crate::error::Result;
use crate::pipeline::charts::spec::{
    BarGraphSpec, HistogramSpec, LineChartSpec, PieChartSpec, PlotSpec,
    RespondentDistributionSpec, RespondentGroups, ValuesSpec, WordcloudSpec,
};
use crate::pipeline::enrichment::sentiment::SENTIMENT_SUFFIX;

// Tokens dropped from word cloud text.
const WORDCLOUD_STOP_TOKEN: &str = "nan";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComputedCharts {
    pub charts: Vec<PlotSpec>,
    pub warnings: Vec<AnalysisWarning>,
}

/// Distinct present values with their counts, most frequent first.
/// Equal counts keep the order in which the values first appear.
pub fn value_counts(column: &Column) -> Vec<(CellValue, usize)> {
    let mut position: HashMap<CellKey<'_>, usize> = HashMap::new();
    let mut counts: Vec<(CellValue, usize)> = Vec::new();
    for cell in column.present() {
        let key = cell.key();
        match position.get(&key).copied() {
            Some(i) => counts[i].1 += 1,
            None => {
                position.insert(key, counts.len());
                counts.push((cell.clone(), 1));
            }
        }
    }
    // sort_by is stable, so ties stay in first-appearance order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn daily_response_counts(table: &WideTable) -> PlotSpec {
    let mut dates: Vec<String> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    for timestamp in table.index() {
        let date = timestamp.format("%Y-%m-%d").to_string();
        if dates.last() == Some(&date) {
            if let Some(last) = counts.last_mut() {
                *last += 1;
            }
        } else {
            dates.push(date);
            counts.push(1);
        }
    }
    PlotSpec::LineChart(LineChartSpec {
        title: "Daily Response Counts Over Time".to_string(),
        x_label: "Date".to_string(),
        y_label: "Response Counts".to_string(),
        dates,
        counts,
    })
}

/// Respondent counts per city, country or region.
pub fn respondent_distribution(
    response_metadata: &ResponseMetadata,
    field: &str,
) -> Result<PlotSpec> {
    let column = response_metadata.require_column(field)?;
    let (labels, user_count): (Vec<CellValue>, Vec<usize>) =
        value_counts(column).into_iter().unzip();
    let (groups, x_label) = match field {
        CITY => (RespondentGroups::City(labels), "City"),
        COUNTRY => (RespondentGroups::Country(labels), "Country"),
        _ => (RespondentGroups::Region(labels), "Region"),
    };
    Ok(PlotSpec::HorizontalBarChart(RespondentDistributionSpec {
        alternative_chart: "bar_graph".to_string(),
        title: format!("Distribution of Survey Respondents by {}.", x_label),
        x_label: x_label.to_string(),
        y_label: "Count".to_string(),
        groups,
        user_count,
    }))
}

pub fn bar_graph(column: &Column, title: &str, survey_item_id: Option<String>) -> PlotSpec {
    let (x_values, y_values) = value_counts(column).into_iter().unzip();
    PlotSpec::BarGraph(BarGraphSpec {
        alternative_chart: "horizontal_bar_graph".to_string(),
        title: title.to_string(),
        x_values,
        y_values,
        x_label: "Values".to_string(),
        y_label: "Count".to_string(),
        survey_item_id,
    })
}

pub fn pie_chart(column: &Column, title: &str, survey_item_id: Option<String>) -> PlotSpec {
    let (labels, sizes) = value_counts(column).into_iter().unzip();
    PlotSpec::PieChart(PieChartSpec {
        alternative_chart: "donut_chart".to_string(),
        title: title.to_string(),
        labels,
        sizes,
        survey_item_id,
    })
}

fn numeric_values(column: &Column) -> Vec<f64> {
    column.present().filter_map(CellValue::as_f64).collect()
}

pub fn histogram(column: &Column, title: &str, survey_item_id: Option<String>) -> PlotSpec {
    PlotSpec::Histogram(HistogramSpec {
        alternative_charts: vec!["density_plot".to_string()],
        title: title.to_string(),
        values: numeric_values(column),
        x_label: "Values".to_string(),
        y_label: "Frequency".to_string(),
        survey_item_id,
    })
}

pub fn violin_plot(column: &Column, title: &str, survey_item_id: Option<String>) -> PlotSpec {
    PlotSpec::ViolinPlot(ValuesSpec {
        title: title.to_string(),
        values: numeric_values(column),
        y_label: "Value".to_string(),
        survey_item_id,
    })
}

pub fn box_plot(column: &Column, title: &str, survey_item_id: Option<String>) -> PlotSpec {
    PlotSpec::BoxPlot(ValuesSpec {
        title: title.to_string(),
        values: numeric_values(column),
        y_label: "Value".to_string(),
        survey_item_id,
    })
}

pub fn wordcloud(column: &Column, title: &str, survey_item_id: Option<String>) -> PlotSpec {
    let joined = column.present().filter_map(CellValue::to_text).join(" ");
    let text = joined
        .split_whitespace()
        .filter(|token| *token != WORDCLOUD_STOP_TOKEN)
        .join(" ");
    PlotSpec::Wordcloud(WordcloudSpec {
        title: title.to_string(),
        text,
        survey_item_id,
    })
}

struct ChartBuilder<'a> {
    questions: &'a [QuestionMetadata],
    charts: Vec<PlotSpec>,
    warnings: Vec<AnalysisWarning>,
}

impl ChartBuilder<'_> {
    fn resolve_id(&mut self, question: &str, title: &str) -> Option<String> {
        let id = lookup_survey_item_id(self.questions, question);
        if id.is_none() {
            warn!(title, "No survey_item_id found; chart id left empty");
            self.warnings.push(AnalysisWarning::UnresolvedQuestionId {
                title: title.to_string(),
            });
        }
        id
    }

    // Returns false (and records a warning) when the category has no questions.
    fn check_not_empty(&mut self, category: Category, questions: &[String]) -> bool {
        if questions.is_empty() {
            warn!(%category, "No questions in category; skipping its charts");
            self.warnings
                .push(AnalysisWarning::EmptyCategory { category });
            return false;
        }
        true
    }
}

/// Builds the ordered chart list: the survey-wide prefix, then categorical,
/// sentiment, numeric and open-ended charts.
#[instrument(skip_all, fields(rows = table.row_count()))]
pub fn compute_charts(
    categories: &CategoryAssignment,
    sentiment_columns: &[String],
    table: &WideTable,
    questions: &[QuestionMetadata],
    response_metadata: &ResponseMetadata,
) -> Result<ComputedCharts> {
    let mut builder = ChartBuilder {
        questions,
        charts: Vec::new(),
        warnings: Vec::new(),
    };

    builder.charts.push(daily_response_counts(table));
    for field in [CITY, COUNTRY, REGION] {
        builder
            .charts
            .push(respondent_distribution(response_metadata, field)?);
    }

    if builder.check_not_empty(Category::Categorical, &categories.categorical) {
        for question in &categories.categorical {
            let column = table.require_column(question)?;
            let id = builder.resolve_id(question, question);
            builder.charts.push(bar_graph(column, question, id.clone()));
            builder.charts.push(pie_chart(column, question, id));
            debug!(question = %question, "Computed categorical charts");
        }
    }

    for sentiment_column in sentiment_columns {
        let column = table.require_column(sentiment_column)?;
        let question = sentiment_column
            .strip_suffix(SENTIMENT_SUFFIX)
            .unwrap_or(sentiment_column);
        let id = builder.resolve_id(question, sentiment_column);
        builder.charts.push(bar_graph(column, sentiment_column, id));
        debug!(column = %sentiment_column, "Computed sentiment chart");
    }

    if builder.check_not_empty(Category::Numeric, &categories.numeric) {
        for question in &categories.numeric {
            let column = table.require_column(question)?;
            let id = builder.resolve_id(question, question);
            builder.charts.push(histogram(column, question, id.clone()));
            builder.charts.push(violin_plot(column, question, id.clone()));
            builder.charts.push(box_plot(column, question, id));
            debug!(question = %question, "Computed numeric charts");
        }
    }

    if builder.check_not_empty(Category::OpenEnded, &categories.open_ended) {
        for question in &categories.open_ended {
            let column = table.require_column(question)?;
            let id = builder.resolve_id(question, question);
            builder.charts.push(wordcloud(column, question, id));
            debug!(question = %question, "Computed word cloud");
        }
    }

    info!(
        charts = builder.charts.len(),
        warnings = builder.warnings.len(),
        "Computed chart specs"
    );
    Ok(ComputedCharts {
        charts: builder.charts,
        warnings: builder.warnings,
    })
}
