// Frequency-dictionary spelling correction

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use symspell::{AsciiStringStrategy, SymSpell, Verbosity};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::utils::text::{segment_words, split_into_words};

/// English frequency dictionary (82,765 terms) published with SymSpell.
pub const DEFAULT_FREQUENCY_DICTIONARY: &str =
    "https://raw.githubusercontent.com/reneklacan/symspell/master/data/frequency_dictionary_en_82_765.txt";

/// Word-level corrector backed by a SymSpell frequency dictionary.
///
/// Words found in the dictionary are kept as written. Anything else is
/// replaced by the most frequent dictionary term within the configured edit
/// distance, or left alone when there is none.
pub struct SpellCorrector {
    symspell: SymSpell<AsciiStringStrategy>,
    max_edit_distance: i64,
    terms_loaded: usize,
}

impl SpellCorrector {
    /// Corrector with an empty dictionary; load one before use.
    pub fn new(max_edit_distance: usize) -> Self {
        SpellCorrector {
            symspell: SymSpell::default(),
            max_edit_distance: max_edit_distance.clamp(1, 2) as i64,
            terms_loaded: 0,
        }
    }

    /// Loads `term count` lines (whitespace separated). Blank lines are
    /// skipped; any other malformed line is an error.
    pub fn load_frequency_dictionary(&mut self, content: &str) -> Result<usize> {
        let mut loaded = 0;
        for (line_number, line) in content.lines().enumerate() {
            let mut parts = line.split_whitespace();
            let (term, count) = match (parts.next(), parts.next()) {
                (None, _) => continue,
                (Some(term), Some(count)) => (term, count),
                (Some(_), None) => {
                    return Err(PipelineError::ConfigError(format!(
                        "Frequency dictionary line {} has no count: '{}'",
                        line_number + 1,
                        line
                    )))
                }
            };
            let count: i64 = count.parse().map_err(|_| {
                PipelineError::ConfigError(format!(
                    "Frequency dictionary line {} has an invalid count: '{}'",
                    line_number + 1,
                    line
                ))
            })?;
            self.insert_term(&term.to_lowercase(), count);
            loaded += 1;
        }
        debug!(loaded, total = self.terms_loaded, "Loaded frequency dictionary");
        Ok(loaded)
    }

    /// Adds the word counts of a text corpus to the dictionary.
    pub fn add_corpus(&mut self, corpus: &str) {
        let mut counts: HashMap<String, i64> = HashMap::new();
        for word in split_into_words(corpus) {
            *counts.entry(word.to_lowercase()).or_insert(0) += 1;
        }
        for (word, count) in counts {
            self.insert_term(&word, count);
        }
    }

    /// Adds the words of a corpus file to the dictionary.
    pub fn add_corpus_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let corpus = fs::read_to_string(path_ref).map_err(|e| {
            PipelineError::ConfigError(format!(
                "Failed to read spelling corpus '{}': {}",
                path_ref.display(),
                e
            ))
        })?;
        self.add_corpus(&corpus);
        debug!(path = %path_ref.display(), total = self.terms_loaded, "Extended spelling dictionary");
        Ok(())
    }

    // Terms with whitespace never reach here, so the line always splits in two.
    fn insert_term(&mut self, term: &str, count: i64) {
        self.symspell
            .load_dictionary_line(&format!("{} {}", term, count), 0, 1, " ");
        self.terms_loaded += 1;
    }

    pub fn is_known(&self, word: &str) -> bool {
        !self
            .symspell
            .lookup(&word.to_lowercase(), Verbosity::Top, 0)
            .is_empty()
    }

    /// Corrects every word of `text`, leaving whitespace and punctuation untouched.
    pub fn correct(&self, text: &str) -> String {
        segment_words(text)
            .into_iter()
            .map(|segment| {
                if segment.is_word {
                    self.correct_word(segment.text)
                } else {
                    segment.text.to_string()
                }
            })
            .collect()
    }

    /// Corrects a single word.
    pub fn correct_word(&self, word: &str) -> String {
        if !Self::is_correctable(word) {
            return word.to_string();
        }
        let suggestions =
            self.symspell
                .lookup(&word.to_lowercase(), Verbosity::Top, self.max_edit_distance);
        match suggestions.first() {
            Some(best) if best.distance > 0 => restore_case(word, &best.term),
            _ => word.to_string(),
        }
    }

    // Upper-case words are treated as acronyms and never changed.
    fn is_correctable(word: &str) -> bool {
        word.chars().all(|c| c.is_ascii_alphabetic())
            && !(word.len() > 1 && word.chars().all(|c| c.is_ascii_uppercase()))
    }
}

fn restore_case(original: &str, candidate: &str) -> String {
    let starts_upper = original.chars().next().is_some_and(|c| c.is_uppercase());
    if !starts_upper {
        return candidate.to_string();
    }
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DICTIONARY: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/frequency_dictionary_sample.txt"
    ));

    fn corrector(max_edit_distance: usize) -> SpellCorrector {
        let mut corrector = SpellCorrector::new(max_edit_distance);
        corrector
            .load_frequency_dictionary(SAMPLE_DICTIONARY)
            .unwrap();
        corrector
    }

    #[test]
    fn test_known_words_are_kept() {
        let corrector = corrector(2);
        assert_eq!(corrector.correct_word("service"), "service");
        assert_eq!(corrector.correct_word("Great"), "Great");
        assert_eq!(corrector.correct_word("Tea"), "Tea");
    }

    #[test]
    fn test_correct_sentences_are_unchanged() {
        let corrector = corrector(2);
        for sentence in [
            "The cat sat on the mat",
            "My dog ate lunch",
            "Delivery was late",
            "Tea",
            "The staff were friendly and the food was good.",
        ] {
            assert_eq!(corrector.correct(sentence), sentence);
        }
    }

    #[test]
    fn test_single_edit_corrections() {
        let corrector = corrector(2);
        assert_eq!(corrector.correct_word("teh"), "the");
        assert_eq!(corrector.correct_word("recieve"), "receive");
        assert_eq!(corrector.correct_word("experiance"), "experience");
        assert_eq!(corrector.correct_word("Servise"), "Service");
    }

    #[test]
    fn test_unfixable_and_protected_words() {
        let corrector = corrector(2);
        assert_eq!(corrector.correct_word("xqzvvk"), "xqzvvk");
        assert_eq!(corrector.correct_word("NPS"), "NPS");
        assert_eq!(corrector.correct_word("abc123"), "abc123");
    }

    #[test]
    fn test_correct_preserves_layout() {
        let corrector = corrector(2);
        assert_eq!(
            corrector.correct("Teh staff were helpful, thanks!"),
            "The staff were helpful, thanks!"
        );
    }

    #[test]
    fn test_correction_is_a_fixed_point() {
        let corrector = corrector(2);
        let once = corrector.correct("I recieve teh servise quickly, xqzvvk.");
        let twice = corrector.correct(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_dictionary_changes_nothing() {
        let corrector = SpellCorrector::new(2);
        assert_eq!(corrector.correct("Teh servise"), "Teh servise");
    }

    #[test]
    fn test_corpus_extends_dictionary() {
        let mut corrector = corrector(1);
        assert!(!corrector.is_known("onboarding"));
        corrector.add_corpus("Onboarding was smooth. onboarding again");
        assert!(corrector.is_known("onboarding"));
        assert_eq!(corrector.correct_word("onbording"), "onboarding");
    }

    #[test]
    fn test_malformed_dictionary_line() {
        let mut corrector = SpellCorrector::new(2);
        let err = corrector
            .load_frequency_dictionary("the 100\n\nservice\n")
            .unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(msg) if msg.contains("line 3")));

        let err = corrector
            .load_frequency_dictionary("the lots\n")
            .unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(msg) if msg.contains("invalid count")));
    }
}
