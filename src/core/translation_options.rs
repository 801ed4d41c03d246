// File: src/core/translation_options.rs
use crate::core::hypothesis::WordsBitmap;
use crate::core::sentence::Sentence;
use crate::core::static_data::{
    StaticData, LANGUAGE_MODEL, PHRASE_MODEL_START, UNKNOWN_WORD_PENALTY, WORD_PENALTY,
};
use crate::core::types::{inner_product, Phrase, ScoreComponents, Word, WordsRange, LOWEST_SCORE};
use log::trace;
use std::rc::Rc;

/// A phrase translation for one source span with its context-free scores.
///
/// `scores` holds the phrase-model, word-penalty and unknown-word components;
/// distortion and LM are filled in when the option extends a hypothesis.
#[derive(Debug, Clone)]
pub struct TranslationOption {
    range: WordsRange,
    target: Phrase,
    scores: ScoreComponents,
    lm_estimate: f32,
    future_score: f32,
}

impl TranslationOption {
    pub fn range(&self) -> WordsRange {
        self.range
    }

    pub fn target(&self) -> &[Word] {
        &self.target
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// LM score of the target phrase with no outside context.
    pub fn lm_estimate(&self) -> f32 {
        self.lm_estimate
    }

    /// Weighted estimate used for pruning and future costs.
    pub fn future_score(&self) -> f32 {
        self.future_score
    }

    /// Pass-through option for a source word the phrase table does not know.
    pub fn is_unknown(&self) -> bool {
        self.scores[UNKNOWN_WORD_PENALTY] != 0.0
    }
}

/// All translation options for one sentence, indexed by span, plus the
/// future-cost estimate for every span.
#[derive(Debug)]
pub struct TranslationOptionCollection {
    source_len: usize,
    /// `options[start][len - 1]`
    options: Vec<Vec<Vec<Rc<TranslationOption>>>>,
    /// `future_cost[start][end]`, best achievable weighted estimate
    future_cost: Vec<Vec<f32>>,
}

impl TranslationOptionCollection {
    pub fn new(sentence: &Sentence, data: &StaticData, weights: &[f32]) -> Self {
        let n = sentence.len();
        let settings = data.settings();
        let num_features = data.feature_names().len();
        let lm = data.language_model();
        let mut options: Vec<Vec<Vec<Rc<TranslationOption>>>> = Vec::with_capacity(n);

        for start in 0..n {
            let max_len = settings.max_phrase_length.min(n - start);
            let mut by_len: Vec<Vec<Rc<TranslationOption>>> = vec![Vec::new(); max_len];

            for (len, targets) in data.phrase_table().matches_from(&sentence.words()[start..], max_len) {
                let range = WordsRange::new(start, start + len - 1);
                let mut span_options: Vec<TranslationOption> = targets
                    .iter()
                    .map(|tp| {
                        let mut scores = vec![0.0; num_features];
                        scores[WORD_PENALTY] = -(tp.words.len() as f32);
                        scores[PHRASE_MODEL_START..PHRASE_MODEL_START + tp.scores.len()]
                            .copy_from_slice(&tp.scores);
                        let lm_estimate = lm.estimate(&tp.words);
                        let future_score = inner_product(weights, &scores) + weights[LANGUAGE_MODEL] * lm_estimate;
                        TranslationOption { range, target: tp.words.clone(), scores, lm_estimate, future_score }
                    })
                    .collect();

                span_options.sort_by(|a, b| b.future_score.total_cmp(&a.future_score));
                if settings.ttable_limit > 0 {
                    span_options.truncate(settings.ttable_limit);
                }
                trace!("span {} has {} options", range, span_options.len());
                by_len[len - 1] = span_options.into_iter().map(Rc::new).collect();
            }

            if by_len[0].is_empty() {
                let word = sentence[start].clone();
                trace!("unknown source word '{}' at {}", word, start);
                let mut scores = vec![0.0; num_features];
                scores[WORD_PENALTY] = -1.0;
                scores[UNKNOWN_WORD_PENALTY] = LOWEST_SCORE;
                let target = vec![word];
                let lm_estimate = lm.estimate(&target);
                let future_score = inner_product(weights, &scores) + weights[LANGUAGE_MODEL] * lm_estimate;
                by_len[0].push(Rc::new(TranslationOption {
                    range: WordsRange::new(start, start),
                    target,
                    scores,
                    lm_estimate,
                    future_score,
                }));
            }
            options.push(by_len);
        }

        let future_cost = compute_future_cost(n, &options);
        Self { source_len: n, options, future_cost }
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn get(&self, range: WordsRange) -> &[Rc<TranslationOption>] {
        self.options
            .get(range.start)
            .and_then(|by_len| by_len.get(range.len() - 1))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every option in the collection.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<TranslationOption>> {
        self.options.iter().flatten().flatten()
    }

    /// Total number of options.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn future_cost(&self, range: WordsRange) -> f32 {
        self.future_cost[range.start][range.end]
    }

    /// Future cost of every uncovered stretch of the sentence.
    pub fn future_score_for(&self, coverage: &WordsBitmap) -> f32 {
        coverage
            .uncovered_ranges()
            .into_iter()
            .map(|r| self.future_cost(r))
            .sum()
    }
}

/// Dynamic programme over span splits: a span is as good as its best
/// option or the best pair of adjacent sub-spans.
fn compute_future_cost(n: usize, options: &[Vec<Vec<Rc<TranslationOption>>>]) -> Vec<Vec<f32>> {
    let mut cost = vec![vec![f32::NEG_INFINITY; n]; n];
    for len in 1..=n {
        for start in 0..=(n - len) {
            let end = start + len - 1;
            let mut best = options[start]
                .get(len - 1)
                .and_then(|opts| opts.iter().map(|o| o.future_score).reduce(f32::max))
                .unwrap_or(f32::NEG_INFINITY);
            for split in start..end {
                best = best.max(cost[start][split] + cost[split + 1][end]);
            }
            cost[start][end] = best;
        }
    }
    cost
}
