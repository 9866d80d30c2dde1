use crate::analysis::AnalysisReport;
use crate::error::Result;

/// Trait for writing analysis reports to an output sink (e.g. file).
pub trait BaseWriter {
    /// Write one report to the sink.
    fn write_report(&mut self, report: &AnalysisReport) -> Result<()>;

    /// Finalize and close the output writer.
    fn close(self) -> Result<()>;
}
