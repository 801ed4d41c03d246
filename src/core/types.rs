// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One linguistic factor (surface form, lemma, POS tag, ...).
/// Shared so that phrase-table entries and hypotheses can point at the same text.
pub type Factor = Arc<str>;

/// A translation as produced by a hypothesis: the target surface factors in order.
pub type Translation = Vec<Factor>;

/// A sequence of words, source or target side.
pub type Phrase = Vec<Word>;

/// Per-feature score values, positionally aligned with the engine's feature names.
pub type ScoreComponents = Vec<f32>;

/// Floor for log-domain scores; also the penalty for unknown words.
pub const LOWEST_SCORE: f32 = -100.0;

/// Natural log of a probability, floored at [`LOWEST_SCORE`].
pub fn transform_score(prob: f32) -> f32 {
    if prob <= 0.0 {
        LOWEST_SCORE
    } else {
        prob.ln().max(LOWEST_SCORE)
    }
}

/// Weighted sum of a score vector.
pub fn inner_product(weights: &[f32], scores: &[f32]) -> f32 {
    weights.iter().zip(scores).map(|(w, s)| w * s).sum()
}

/// A word with one or more factors. Factor 0 is the surface form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word {
    pub factors: Vec<Factor>,
}

impl Word {
    pub fn new(surface: &str) -> Self {
        Self { factors: vec![Arc::from(surface)] }
    }

    /// Splits a token like `house|NN` on the given delimiter.
    pub fn from_token(token: &str, delimiter: &str) -> Self {
        if delimiter.is_empty() {
            return Self::new(token);
        }
        Self {
            factors: token.split(delimiter).map(Arc::from).collect(),
        }
    }

    pub fn surface(&self) -> &Factor {
        &self.factors[0]
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.surface())
    }
}

/// Inclusive source span `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordsRange {
    pub start: usize,
    pub end: usize,
}

impl WordsRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

impl fmt::Display for WordsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.start, self.end)
    }
}

/// Joins the surface forms of a phrase with single spaces.
pub fn phrase_to_string(phrase: &[Word]) -> String {
    phrase
        .iter()
        .map(|w| w.surface().as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}
