// Lexicon-based polarity scoring

use aprender::text::sentiment::SentimentAnalyzer as LexiconAnalyzer;
use tracing::debug;

use crate::data_model::SentimentCategory;
use crate::error::{PipelineError, Result};

/// Scores answer polarity with aprender's English sentiment lexicon.
///
/// Lexicon scores are clamped to [-1, 1] before being bucketed, so a single
/// strong opinion word is enough to move an answer out of neutral.
pub struct SentimentAnalyzer {
    lexicon: LexiconAnalyzer,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        let lexicon = LexiconAnalyzer::default();
        debug!(words = lexicon.lexicon_size(), "Loaded sentiment lexicon");
        SentimentAnalyzer { lexicon }
    }
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        SentimentAnalyzer::default()
    }

    /// Polarity of `text` in [-1, 1]. Blank text scores 0.0.
    pub fn polarity(&self, text: &str) -> Result<f64> {
        if text.trim().is_empty() {
            return Ok(0.0);
        }
        let score = self.lexicon.score(text).map_err(|e| {
            PipelineError::Unexpected(format!("Sentiment scoring failed: {:?}", e))
        })?;
        Ok(if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        })
    }

    pub fn categorize(&self, text: &str) -> Result<SentimentCategory> {
        Ok(SentimentCategory::from_polarity(self.polarity(text)?))
    }
}
