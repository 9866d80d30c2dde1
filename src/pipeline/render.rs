// Turning chart specs into report artifacts

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::pipeline::charts::PlotSpec;

/// What the report carries for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartArtifact {
    Spec(PlotSpec),
    StoragePath(String),
}

pub trait ChartRenderer {
    fn render(&mut self, spec: &PlotSpec) -> Result<ChartArtifact>;
}

/// Passes the spec through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpecRenderer;

impl ChartRenderer for SpecRenderer {
    fn render(&mut self, spec: &PlotSpec) -> Result<ChartArtifact> {
        Ok(ChartArtifact::Spec(spec.clone()))
    }
}

/// Creates `base/survey_id` (and any missing parents) and returns it.
pub fn create_storage_path(base: &Path, survey_id: &str) -> Result<PathBuf> {
    let storage_path = base.join(survey_id);
    fs::create_dir_all(&storage_path)?;
    Ok(storage_path)
}

// Characters that cannot appear in a file name on common filesystems.
static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*"<>|\x00-\x1f]"#).expect("valid file name pattern"));

fn plot_suffix(spec: &PlotSpec) -> &'static str {
    match spec {
        PlotSpec::LineChart(_) => "_line_chart",
        PlotSpec::HorizontalBarChart(_) => "_horizontal_bar_chart",
        PlotSpec::BarGraph(_) => "_bar_chart",
        PlotSpec::PieChart(_) => "_pie_chart",
        PlotSpec::Histogram(_) => "_histogram",
        PlotSpec::ViolinPlot(_) => "_violin_chart",
        PlotSpec::BoxPlot(_) => "_boxplot",
        PlotSpec::Wordcloud(_) => "_wordcloud",
    }
}

fn file_safe(text: &str) -> String {
    let text = text.replace(' ', "_").replace('?', "");
    UNSAFE_FILENAME_CHARS.replace_all(&text, "").into_owned()
}

fn chart_file_stem(spec: &PlotSpec) -> String {
    format!("{}{}", file_safe(spec.title()), plot_suffix(spec))
}

/// File name of a persisted spec: spaces become `_`, `?` is dropped.
pub fn chart_file_name(spec: &PlotSpec) -> String {
    format!("{}.json", chart_file_stem(spec))
}

/// Persists every spec as JSON under a per-survey directory and reports
/// the resulting path.
///
/// Titles that reduce to the same file name within one run get the
/// question's survey_item_id appended, then a counter if still taken.
#[derive(Debug, Clone)]
pub struct StoragePathRenderer {
    storage_path: PathBuf,
    used_stems: HashSet<String>,
}

impl StoragePathRenderer {
    pub fn new(base: &Path, survey_id: &str) -> Result<Self> {
        Ok(StoragePathRenderer {
            storage_path: create_storage_path(base, survey_id)?,
            used_stems: HashSet::new(),
        })
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    fn claim_file_name(&mut self, spec: &PlotSpec) -> String {
        let mut stem = chart_file_stem(spec);
        if self.used_stems.contains(&stem) {
            if let Some(id) = spec.survey_item_id() {
                stem = format!("{}_{}", stem, file_safe(id));
            }
        }
        let base = stem.clone();
        let mut n = 2;
        while self.used_stems.contains(&stem) {
            stem = format!("{}_{}", base, n);
            n += 1;
        }
        self.used_stems.insert(stem.clone());
        format!("{}.json", stem)
    }
}

impl ChartRenderer for StoragePathRenderer {
    fn render(&mut self, spec: &PlotSpec) -> Result<ChartArtifact> {
        let file_name = self.claim_file_name(spec);
        let full_path = self.storage_path.join(file_name);
        let mut writer = BufWriter::new(File::create(&full_path)?);
        serde_json::to_writer_pretty(&mut writer, spec)?;
        writer.flush()?;
        debug!(path = %full_path.display(), "Persisted chart spec");
        Ok(ChartArtifact::StoragePath(
            full_path.to_string_lossy().into_owned(),
        ))
    }
}
