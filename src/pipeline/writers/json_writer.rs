use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::analysis::AnalysisReport;
use crate::error::{PipelineError, Result};
use crate::pipeline::writers::BaseWriter;

/// Writes reports as pretty-printed JSON.
pub struct JsonReportWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl JsonReportWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        Ok(JsonReportWriter {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }
}

impl BaseWriter for JsonReportWriter {
    fn write_report(&mut self, report: &AnalysisReport) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            PipelineError::Unexpected("Attempted to write with a closed writer".to_string())
        })?;
        serde_json::to_writer_pretty(&mut *writer, report)?;
        writer.write_all(b"\n")?;
        info!(path = %self.path.display(), charts = report.charts.len(), "Wrote analysis report");
        Ok(())
    }

    fn close(mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
