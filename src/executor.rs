use crate::data_model::AnalysisContext;
use crate::error::Result;
use tracing::{debug, warn};

pub trait ProcessingStep: Send + Sync {
    fn name(&self) -> &'static str; // For logging/error reporting

    fn process(&self, context: AnalysisContext) -> Result<AnalysisContext>;
}

pub struct PipelineExecutor {
    steps: Vec<Box<dyn ProcessingStep>>, // Holds the ordered steps
}

impl PipelineExecutor {
    pub fn new(steps: Vec<Box<dyn ProcessingStep>>) -> Self {
        if steps.is_empty() {
            warn!("Pipeline created with no steps.");
        }
        PipelineExecutor { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Runs every step in order; the first failure aborts the run and is
    /// reported as a `StepError` naming the step.
    pub fn run(&self, initial_context: AnalysisContext) -> Result<AnalysisContext> {
        let mut current = initial_context;
        for step in &self.steps {
            debug!("Running step: {}", step.name());
            current = step
                .process(current)
                .map_err(|e| e.in_step(step.name()))?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::{CategoryAssignment, WideTable};
    use crate::error::PipelineError;

    struct RecordStep(&'static str);

    impl ProcessingStep for RecordStep {
        fn name(&self) -> &'static str {
            self.0
        }

        fn process(&self, mut context: AnalysisContext) -> Result<AnalysisContext> {
            context.sentiment_columns.push(self.0.to_string());
            Ok(context)
        }
    }

    struct FailingStep;

    impl ProcessingStep for FailingStep {
        fn name(&self) -> &'static str {
            "FailingStep"
        }

        fn process(&self, _context: AnalysisContext) -> Result<AnalysisContext> {
            Err(PipelineError::MissingColumn("Feedback".to_string()))
        }
    }

    fn empty_context() -> AnalysisContext {
        AnalysisContext::new(WideTable::default(), CategoryAssignment::default())
    }

    #[test]
    fn test_steps_run_in_order() {
        let executor = PipelineExecutor::new(vec![
            Box::new(RecordStep("first")),
            Box::new(RecordStep("second")),
        ]);
        assert_eq!(executor.step_names(), vec!["first", "second"]);
        let context = executor.run(empty_context()).unwrap();
        assert_eq!(context.sentiment_columns, vec!["first", "second"]);
    }

    #[test]
    fn test_failure_is_wrapped_with_step_name() {
        let executor = PipelineExecutor::new(vec![
            Box::new(RecordStep("first")),
            Box::new(FailingStep),
            Box::new(RecordStep("never")),
        ]);
        let err = executor.run(empty_context()).unwrap_err();
        assert_eq!(err.failed_step(), Some("FailingStep"));
        assert!(matches!(err.root_cause(), PipelineError::MissingColumn(_)));
    }

    #[test]
    fn test_no_steps_passes_context_through() {
        let executor = PipelineExecutor::new(Vec::new());
        let context = executor.run(empty_context()).unwrap();
        assert_eq!(context, empty_context());
    }
}
