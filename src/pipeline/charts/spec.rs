use serde::Serialize;

use crate::data_model::CellValue;

/// Renderer-independent description of one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "plot_type", rename_all = "snake_case")]
pub enum PlotSpec {
    LineChart(LineChartSpec),
    HorizontalBarChart(RespondentDistributionSpec),
    BarGraph(BarGraphSpec),
    PieChart(PieChartSpec),
    Histogram(HistogramSpec),
    ViolinPlot(ValuesSpec),
    #[serde(rename = "boxplot")]
    BoxPlot(ValuesSpec),
    Wordcloud(WordcloudSpec),
}

impl PlotSpec {
    pub fn plot_type(&self) -> &'static str {
        match self {
            PlotSpec::LineChart(_) => "line_chart",
            PlotSpec::HorizontalBarChart(_) => "horizontal_bar_chart",
            PlotSpec::BarGraph(_) => "bar_graph",
            PlotSpec::PieChart(_) => "pie_chart",
            PlotSpec::Histogram(_) => "histogram",
            PlotSpec::ViolinPlot(_) => "violin_plot",
            PlotSpec::BoxPlot(_) => "boxplot",
            PlotSpec::Wordcloud(_) => "wordcloud",
        }
    }

    pub fn title(&self) -> &str {
        match self {
            PlotSpec::LineChart(s) => &s.title,
            PlotSpec::HorizontalBarChart(s) => &s.title,
            PlotSpec::BarGraph(s) => &s.title,
            PlotSpec::PieChart(s) => &s.title,
            PlotSpec::Histogram(s) => &s.title,
            PlotSpec::ViolinPlot(s) | PlotSpec::BoxPlot(s) => &s.title,
            PlotSpec::Wordcloud(s) => &s.title,
        }
    }

    /// Question id of per-question charts; `None` for the survey-wide prefix
    /// charts and for questions whose id could not be resolved.
    pub fn survey_item_id(&self) -> Option<&str> {
        match self {
            PlotSpec::LineChart(_) | PlotSpec::HorizontalBarChart(_) => None,
            PlotSpec::BarGraph(s) => s.survey_item_id.as_deref(),
            PlotSpec::PieChart(s) => s.survey_item_id.as_deref(),
            PlotSpec::Histogram(s) => s.survey_item_id.as_deref(),
            PlotSpec::ViolinPlot(s) | PlotSpec::BoxPlot(s) => s.survey_item_id.as_deref(),
            PlotSpec::Wordcloud(s) => s.survey_item_id.as_deref(),
        }
    }
}

/// Daily response volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub dates: Vec<String>,
    pub counts: Vec<usize>,
}

/// Which respondent attribute a distribution chart groups by, with the
/// group labels. Serialised as a `city`, `country` or `region` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RespondentGroups {
    City(Vec<CellValue>),
    Country(Vec<CellValue>),
    Region(Vec<CellValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RespondentDistributionSpec {
    pub alternative_chart: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    #[serde(flatten)]
    pub groups: RespondentGroups,
    pub user_count: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarGraphSpec {
    pub alternative_chart: String,
    pub title: String,
    pub x_values: Vec<CellValue>,
    pub y_values: Vec<usize>,
    pub x_label: String,
    pub y_label: String,
    pub survey_item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChartSpec {
    pub alternative_chart: String,
    pub title: String,
    pub labels: Vec<CellValue>,
    pub sizes: Vec<usize>,
    pub survey_item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSpec {
    pub alternative_charts: Vec<String>,
    pub title: String,
    pub values: Vec<f64>,
    pub x_label: String,
    pub y_label: String,
    pub survey_item_id: Option<String>,
}

/// Raw numeric values, used by violin plots and box plots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuesSpec {
    pub title: String,
    pub values: Vec<f64>,
    pub y_label: String,
    pub survey_item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordcloudSpec {
    pub title: String,
    pub text: String,
    pub survey_item_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bar_graph_wire_shape() {
        let spec = PlotSpec::BarGraph(BarGraphSpec {
            alternative_chart: "horizontal_bar_graph".into(),
            title: "Gender".into(),
            x_values: vec![CellValue::Text("F".into()), CellValue::Int(3)],
            y_values: vec![2, 1],
            x_label: "Values".into(),
            y_label: "Count".into(),
            survey_item_id: None,
        });
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "plot_type": "bar_graph",
                "alternative_chart": "horizontal_bar_graph",
                "title": "Gender",
                "x_values": ["F", 3],
                "y_values": [2, 1],
                "x_label": "Values",
                "y_label": "Count",
                "survey_item_id": null
            })
        );
    }

    #[test]
    fn test_boxplot_tag_and_flattened_groups() {
        let boxplot = PlotSpec::BoxPlot(ValuesSpec {
            title: "Age".into(),
            values: vec![20.0],
            y_label: "Value".into(),
            survey_item_id: Some("q3".into()),
        });
        let value = serde_json::to_value(&boxplot).unwrap();
        assert_eq!(value["plot_type"], "boxplot");
        assert_eq!(boxplot.survey_item_id(), Some("q3"));

        let region = PlotSpec::HorizontalBarChart(RespondentDistributionSpec {
            alternative_chart: "bar_graph".into(),
            title: "Distribution of Survey Respondents by Region.".into(),
            x_label: "Region".into(),
            y_label: "Count".into(),
            groups: RespondentGroups::Region(vec![CellValue::Text("West".into())]),
            user_count: vec![4],
        });
        let value = serde_json::to_value(&region).unwrap();
        assert_eq!(value["plot_type"], "horizontal_bar_chart");
        assert_eq!(value["region"], json!(["West"]));
        assert_eq!(value["user_count"], json!([4]));
        assert!(value.get("groups").is_none());
    }
}
