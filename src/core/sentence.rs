// File: src/core/sentence.rs
use crate::core::types::{phrase_to_string, Phrase, Word};
use crate::error::{DecoderError, Result};
use std::ops::Index;

/// A tokenised source sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    words: Phrase,
}

impl Sentence {
    /// Splits on whitespace; each token is split into factors on `delimiter`.
    pub fn parse(text: &str, delimiter: &str) -> Result<Self> {
        let words: Phrase = text
            .split_whitespace()
            .map(|token| Word::from_token(token, delimiter))
            .collect();
        if words.is_empty() {
            return Err(DecoderError::EmptySource);
        }
        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn into_words(self) -> Phrase {
        self.words
    }
}

impl Index<usize> for Sentence {
    type Output = Word;

    fn index(&self, idx: usize) -> &Word {
        &self.words[idx]
    }
}

impl std::fmt::Display for Sentence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&phrase_to_string(&self.words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_splits_factors() {
        let s = Sentence::parse("  das|ART   haus|NN\t", "|").unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s[1].surface().as_ref(), "haus");
        assert_eq!(s[1].factors[1].as_ref(), "NN");
        assert_eq!(s.to_string(), "das haus");
    }

    #[test]
    fn blank_input_is_rejected() {
        assert!(matches!(Sentence::parse(" \t ", "|"), Err(DecoderError::EmptySource)));
    }
}
