// Chart-spec computation

pub mod compute;
pub mod spec;

pub use compute::{compute_charts, value_counts, ComputedCharts};
pub use spec::{
    BarGraphSpec, HistogramSpec, LineChartSpec, PieChartSpec, PlotSpec,
    RespondentDistributionSpec, RespondentGroups, ValuesSpec, WordcloudSpec,
};
