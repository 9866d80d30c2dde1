use std::io::Read;

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::config::TextCorrectionParams;
use crate::data_model::{AnalysisContext, CellValue, WideTable};
use crate::error::{PipelineError, Result};
use crate::executor::ProcessingStep;
use crate::pipeline::readers::base_reader::open_source;
use crate::utils::SpellCorrector;

/// Replaces every text answer in `columns` with its spell-corrected form.
/// Non-text cells are left as they are.
pub fn correct_text(
    table: &mut WideTable,
    columns: &[String],
    corrector: &SpellCorrector,
) -> Result<()> {
    for name in columns {
        let column = table
            .frame_mut()
            .column_mut(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.clone()))?;

        let changed: usize = column
            .values
            .par_iter_mut()
            .map(|cell| match cell {
                CellValue::Text(text) => {
                    let corrected = corrector.correct(text);
                    if corrected != *text {
                        *text = corrected;
                        1
                    } else {
                        0
                    }
                }
                _ => 0,
            })
            .sum();
        debug!(column = %name, changed, "Corrected text column");
    }
    Ok(())
}

/// Spelling correction over the open-ended questions.
pub struct TextCorrection {
    corrector: SpellCorrector,
}

impl TextCorrection {
    pub fn new(corrector: SpellCorrector) -> Self {
        TextCorrection { corrector }
    }

    /// Loads the configured frequency dictionary (local or remote) and the
    /// optional extra corpus.
    pub fn from_params(params: &TextCorrectionParams) -> Result<Self> {
        let source = params.frequency_dictionary.as_str();
        let mut content = String::new();
        open_source(source)
            .and_then(|mut reader| {
                reader.read_to_string(&mut content)?;
                Ok(())
            })
            .map_err(|e| {
                PipelineError::ConfigError(format!(
                    "Failed to read frequency dictionary '{}': {}",
                    source, e
                ))
            })?;

        let mut corrector = SpellCorrector::new(params.max_edit_distance);
        let terms = corrector.load_frequency_dictionary(&content)?;
        if let Some(path) = &params.corpus_path {
            corrector.add_corpus_file(path)?;
        }
        info!(source, terms, "Loaded spelling dictionary");
        Ok(TextCorrection::new(corrector))
    }
}

impl ProcessingStep for TextCorrection {
    fn name(&self) -> &'static str {
        "TextCorrection"
    }

    #[instrument(skip_all, name = "TextCorrection")]
    fn process(&self, mut context: AnalysisContext) -> Result<AnalysisContext> {
        correct_text(
            &mut context.table,
            &context.categories.open_ended,
            &self.corrector,
        )?;
        info!(
            columns = context.categories.open_ended.len(),
            "Corrected open-ended answers"
        );
        Ok(context)
    }
}
