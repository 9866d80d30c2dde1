use tracing::{debug, info, instrument, warn};

use crate::data_model::{
    AnalysisWarning, Category, CategoryAssignment, QuestionMetadata, QuestionType, WideTable,
};
use crate::error::Result;

/// Profiling questions with at least this many distinct answers are not
/// treated as categorical.
pub const CARDINALITY_THRESHOLD: usize = 11;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassifiedQuestions {
    pub categories: CategoryAssignment,
    pub warnings: Vec<AnalysisWarning>,
}

/// Assigns every question to a chart category, in metadata order.
#[instrument(skip_all, fields(questions = questions.len()))]
pub fn classify(table: &WideTable, questions: &[QuestionMetadata]) -> Result<ClassifiedQuestions> {
    let mut result = ClassifiedQuestions::default();

    for metadata in questions {
        let question = metadata.question.as_str();
        let category = match &metadata.question_type {
            QuestionType::OpenEnded => Some(Category::OpenEnded),
            QuestionType::Scaling | QuestionType::MultipleChoice => Some(Category::Categorical),
            QuestionType::Profiling => {
                let column = table.require_column(question)?;
                let distinct_values = column.distinct_count();
                if column.is_numeric() {
                    Some(Category::Numeric)
                } else if distinct_values < CARDINALITY_THRESHOLD
                    && distinct_values != table.row_count()
                {
                    Some(Category::Categorical)
                } else {
                    // Unique-per-row or high-cardinality text lands in no category.
                    warn!(
                        question,
                        distinct_values, "Profiling question left out of every category"
                    );
                    result.warnings.push(AnalysisWarning::DroppedProfilingQuestion {
                        question: question.to_string(),
                        distinct_values,
                    });
                    None
                }
            }
            QuestionType::Unrecognized(tag) => {
                debug!(question, tag = %tag, "Unrecognized question type");
                Some(Category::Others)
            }
        };

        if let Some(category) = category {
            if !result.categories.assign(category, question) {
                debug!(question, "Question already classified; keeping first category");
            }
        }
    }

    info!(
        categorical = result.categories.categorical.len(),
        numeric = result.categories.numeric.len(),
        open_ended = result.categories.open_ended.len(),
        others = result.categories.others.len(),
        "Classified questions"
    );
    Ok(result)
}
