// Text utils

use icu::segmenter::WordSegmenter;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Punctuation and symbol characters that never make a segment word-like.
const PUNCTUATION_LIT: &str =
    "!/—”:％&(、#%「」，；+^]~“《„';’{|∶´[=-`*．（–？！：$～«〉,><》)?）。…@_.\"}►»";

/// Control codepoint ranges treated as punctuation (0..9, 11..13, 13..32, 127..160)
const PUNCTUATION_RANGES: &[(u32, u32)] = &[(0, 9), (11, 13), (13, 32), (127, 160)];

pub static PUNCTUATION: Lazy<HashSet<char>> = Lazy::new(|| {
    let mut set: HashSet<char> = PUNCTUATION_LIT.chars().collect();
    for &(start, end) in PUNCTUATION_RANGES {
        set.extend((start..end).filter_map(std::char::from_u32));
    }
    set
});

/// A slice of the input produced by word segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub is_word: bool,
}

fn contains_word_char(segment: &str) -> bool {
    segment
        .chars()
        .any(|ch| !PUNCTUATION.contains(&ch) && !ch.is_whitespace())
}

/// Splits `text` into consecutive segments covering the whole input.
/// Concatenating the segments gives back `text` unchanged.
pub fn segment_words(text: &str) -> Vec<Segment<'_>> {
    if text.is_empty() {
        return Vec::new();
    }
    let segmenter = WordSegmenter::new_auto();
    let mut segments = Vec::new();
    let mut prev_break = 0;

    for current_break in segmenter.segment_str(text) {
        if current_break > prev_break {
            let piece = &text[prev_break..current_break];
            segments.push(Segment {
                text: piece,
                is_word: contains_word_char(piece),
            });
        }
        prev_break = current_break;
    }

    // The segmenter normally reports the end of input as a break; cover it if not.
    if text.len() > prev_break {
        let piece = &text[prev_break..];
        segments.push(Segment {
            text: piece,
            is_word: contains_word_char(piece),
        });
    }
    segments
}

/// Word-like segments of `text`, trimmed.
pub fn split_into_words(text: &str) -> Vec<&str> {
    segment_words(text)
        .into_iter()
        .filter(|s| s.is_word)
        .map(|s| s.text.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words_empty_and_simple() {
        assert_eq!(split_into_words(""), Vec::new() as Vec<&str>);
        assert_eq!(split_into_words("hello"), vec!["hello"]);
        assert_eq!(split_into_words("hello world"), vec!["hello", "world"]);
    }

    #[test]
    fn test_split_words_with_punctuation() {
        assert_eq!(split_into_words("hello, world!"), vec!["hello", "world"]);
        assert_eq!(
            split_into_words("first. second; third?"),
            vec!["first", "second", "third"]
        );
        assert_eq!(split_into_words("trailing..."), vec!["trailing"]);
    }

    #[test]
    fn test_segments_cover_input() {
        let text = "The app is  slow, but the staff were great!";
        let rebuilt: String = segment_words(text).iter().map(|s| s.text).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_punctuation_set_contents() {
        assert!(PUNCTUATION.contains(&'.'));
        assert!(PUNCTUATION.contains(&'?'));
        assert!(PUNCTUATION.contains(&'\u{0000}'));
        assert!(!PUNCTUATION.contains(&'a'));
        assert!(!PUNCTUATION.contains(&'5'));
    }
}
