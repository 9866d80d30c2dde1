// Utils

pub mod sentiment;
pub mod spelling;
pub mod text;

pub use sentiment::SentimentAnalyzer;
pub use spelling::SpellCorrector;
pub use text::{segment_words, split_into_words, PUNCTUATION};
