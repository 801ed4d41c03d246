// File: src/core/hypothesis.rs
use crate::core::language_model::{LanguageModel, LmState};
use crate::core::static_data::{DISTORTION, LANGUAGE_MODEL};
use crate::core::translation_options::{TranslationOption, TranslationOptionCollection};
use crate::core::types::{inner_product, phrase_to_string, Phrase, ScoreComponents, Translation, WordsRange};
use std::cmp::Ordering;
use std::rc::Rc;

/// Which source words a hypothesis has translated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WordsBitmap {
    covered: Vec<bool>,
}

impl WordsBitmap {
    pub fn new(len: usize) -> Self {
        Self { covered: vec![false; len] }
    }

    pub fn len(&self) -> usize {
        self.covered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.covered.is_empty()
    }

    pub fn is_covered(&self, pos: usize) -> bool {
        self.covered[pos]
    }

    pub fn overlaps(&self, range: WordsRange) -> bool {
        self.covered[range.start..=range.end].iter().any(|&c| c)
    }

    /// Copy with `range` marked as covered.
    pub fn with_range(&self, range: WordsRange) -> Self {
        let mut next = self.clone();
        next.covered[range.start..=range.end].iter_mut().for_each(|c| *c = true);
        next
    }

    pub fn covered_count(&self) -> usize {
        self.covered.iter().filter(|&&c| c).count()
    }

    pub fn is_complete(&self) -> bool {
        self.covered.iter().all(|&c| c)
    }

    pub fn first_gap(&self) -> Option<usize> {
        self.covered.iter().position(|&c| !c)
    }

    /// Maximal runs of uncovered positions, left to right.
    pub fn uncovered_ranges(&self) -> Vec<WordsRange> {
        let mut ranges = Vec::new();
        let mut start: Option<usize> = None;
        for (pos, &c) in self.covered.iter().enumerate() {
            match (c, start) {
                (false, None) => start = Some(pos),
                (true, Some(s)) => {
                    ranges.push(WordsRange::new(s, pos - 1));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            ranges.push(WordsRange::new(s, self.covered.len() - 1));
        }
        ranges
    }
}

/// Hypotheses with equal keys score every possible continuation identically,
/// so only the better one needs to be kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecombinationKey {
    coverage: WordsBitmap,
    next_start: usize,
    lm_state: LmState,
}

/// A partial or complete translation built by applying translation options
/// left to right in target order.
#[derive(Debug)]
pub struct Hypothesis {
    id: usize,
    prev: Option<Rc<Hypothesis>>,
    option: Option<Rc<TranslationOption>>,
    coverage: WordsBitmap,
    lm_state: LmState,
    scores: ScoreComponents,
    score: f32,
    future_score: f32,
}

impl Hypothesis {
    /// The hypothesis with nothing translated yet.
    pub fn empty(id: usize, toc: &TranslationOptionCollection, lm: &LanguageModel, weights: &[f32]) -> Self {
        let coverage = WordsBitmap::new(toc.source_len());
        let future_score = toc.future_score_for(&coverage);
        Self {
            id,
            prev: None,
            option: None,
            coverage,
            lm_state: lm.begin_state(),
            scores: vec![0.0; weights.len()],
            score: 0.0,
            future_score,
        }
    }

    /// Applies `option` after `prev`. The caller checks [`Hypothesis::can_extend`] first.
    pub fn expand(
        prev: &Rc<Hypothesis>,
        option: &Rc<TranslationOption>,
        id: usize,
        toc: &TranslationOptionCollection,
        lm: &LanguageModel,
        weights: &[f32],
    ) -> Self {
        let range = option.range();
        let coverage = prev.coverage.with_range(range);

        let mut scores = prev.scores.clone();
        for (acc, s) in scores.iter_mut().zip(option.scores()) {
            *acc += s;
        }
        scores[DISTORTION] -= distortion(prev.next_start(), range.start) as f32;

        let (mut lm_score, lm_state) = lm.score_phrase(&prev.lm_state, option.target());
        if coverage.is_complete() {
            lm_score += lm.score_end(&lm_state);
        }
        scores[LANGUAGE_MODEL] += lm_score;

        let score = inner_product(weights, &scores);
        let future_score = toc.future_score_for(&coverage);
        Self {
            id,
            prev: Some(Rc::clone(prev)),
            option: Some(Rc::clone(option)),
            coverage,
            lm_state,
            scores,
            score,
            future_score,
        }
    }

    /// Whether `range` may be translated next: it must be uncovered, within
    /// the distortion limit, and leave a legal jump back to the first gap.
    pub fn can_extend(&self, range: WordsRange, distortion_limit: Option<usize>) -> bool {
        if range.end >= self.coverage.len() || self.coverage.overlaps(range) {
            return false;
        }
        let Some(limit) = distortion_limit else {
            return true;
        };
        if distortion(self.next_start(), range.start) > limit {
            return false;
        }
        match self.coverage.first_gap() {
            Some(gap) if range.start != gap => range.end + 1 - gap <= limit,
            _ => true,
        }
    }

    /// Source position right after the last translated span.
    pub fn next_start(&self) -> usize {
        self.option.as_ref().map_or(0, |o| o.range().end + 1)
    }

    pub fn recombination_key(&self) -> RecombinationKey {
        RecombinationKey {
            coverage: self.coverage.clone(),
            next_start: self.next_start(),
            lm_state: self.lm_state.clone(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn prev(&self) -> Option<&Rc<Hypothesis>> {
        self.prev.as_ref()
    }

    pub fn option(&self) -> Option<&Rc<TranslationOption>> {
        self.option.as_ref()
    }

    pub fn coverage(&self) -> &WordsBitmap {
        &self.coverage
    }

    pub fn current_range(&self) -> Option<WordsRange> {
        self.option.as_ref().map(|o| o.range())
    }

    pub fn lm_state(&self) -> &LmState {
        &self.lm_state
    }

    /// Unweighted per-feature scores accumulated so far.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Weighted model score of what has been translated.
    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn future_score(&self) -> f32 {
        self.future_score
    }

    /// Model score plus the estimate for the untranslated remainder.
    pub fn total_score(&self) -> f32 {
        self.score + self.future_score
    }

    pub fn is_complete(&self) -> bool {
        self.coverage.is_complete()
    }

    /// Options applied to reach this hypothesis, in target order.
    pub fn options(&self) -> Vec<Rc<TranslationOption>> {
        let mut chain = Vec::new();
        let mut cur = Some(self);
        while let Some(hypo) = cur {
            if let Some(option) = &hypo.option {
                chain.push(Rc::clone(option));
            }
            cur = hypo.prev.as_deref();
        }
        chain.reverse();
        chain
    }

    pub fn target_phrase(&self) -> Phrase {
        self.options().iter().flat_map(|o| o.target().iter().cloned()).collect()
    }

    /// Target surface factors in order.
    pub fn translation(&self) -> Translation {
        self.options()
            .iter()
            .flat_map(|o| o.target().iter().map(|w| w.surface().clone()))
            .collect()
    }

    pub fn output_phrase(&self) -> String {
        phrase_to_string(&self.target_phrase())
    }
}

fn distortion(next_start: usize, start: usize) -> usize {
    next_start.abs_diff(start)
}

/// Orders hypotheses best first by total score. `f32::total_cmp` keeps the
/// order total even for NaN; equal scores compare equal.
pub fn hyp_compare(a: &Hypothesis, b: &Hypothesis) -> Ordering {
    b.total_score().total_cmp(&a.total_score())
}

/// Sorts best first, so total scores are non-increasing.
pub fn sort_hypotheses(hypotheses: &mut [Rc<Hypothesis>]) {
    hypotheses.sort_by(|a, b| hyp_compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sentence::Sentence;
    use crate::test_utils::ModelDir;

    #[test]
    fn bitmap_tracks_gaps() {
        let bitmap = WordsBitmap::new(5)
            .with_range(WordsRange::new(1, 1))
            .with_range(WordsRange::new(3, 3));
        assert_eq!(bitmap.first_gap(), Some(0));
        assert_eq!(bitmap.covered_count(), 2);
        assert!(bitmap.overlaps(WordsRange::new(0, 1)));
        assert!(!bitmap.overlaps(WordsRange::new(2, 2)));
        assert_eq!(
            bitmap.uncovered_ranges(),
            vec![WordsRange::new(0, 0), WordsRange::new(2, 2), WordsRange::new(4, 4)]
        );
        let full = bitmap
            .with_range(WordsRange::new(0, 0))
            .with_range(WordsRange::new(2, 2))
            .with_range(WordsRange::new(4, 4));
        assert!(full.is_complete());
        assert_eq!(full.first_gap(), None);
    }

    struct Fixture {
        _dir: ModelDir,
        data: std::sync::Arc<crate::core::static_data::StaticData>,
        toc: TranslationOptionCollection,
    }

    fn fixture(text: &str) -> Fixture {
        let dir = ModelDir::new();
        let data = dir.static_data();
        let sentence = Sentence::parse(text, "|").unwrap();
        let toc = TranslationOptionCollection::new(&sentence, &data, &data.weights());
        Fixture { _dir: dir, data, toc }
    }

    #[test]
    fn expansion_accumulates_scores_and_translation() {
        let f = fixture("das haus");
        let lm = f.data.language_model();
        let weights = f.data.weights();
        let empty = Rc::new(Hypothesis::empty(0, &f.toc, lm, &weights));
        assert_eq!(empty.future_score(), f.toc.future_cost(WordsRange::new(0, 1)));

        let opt = Rc::clone(&f.toc.get(WordsRange::new(0, 1))[0]);
        let done = Hypothesis::expand(&empty, &opt, 1, &f.toc, lm, &weights);
        assert!(done.is_complete());
        assert_eq!(done.future_score(), 0.0);
        assert_eq!(done.output_phrase(), "the house");
        assert_eq!(done.scores()[DISTORTION], 0.0);
        assert!((done.score() - inner_product(&weights, done.scores())).abs() < 1e-4);
        let translation = done.translation();
        let words: Vec<&str> = translation.iter().map(|f| f.as_ref()).collect();
        assert_eq!(words, ["the", "house"]);
    }

    #[test]
    fn reordering_is_penalised() {
        let f = fixture("das haus");
        let lm = f.data.language_model();
        let weights = f.data.weights();
        let empty = Rc::new(Hypothesis::empty(0, &f.toc, lm, &weights));
        let haus = Rc::clone(&f.toc.get(WordsRange::new(1, 1))[0]);
        let jumped = Hypothesis::expand(&empty, &haus, 1, &f.toc, lm, &weights);
        assert_eq!(jumped.scores()[DISTORTION], -1.0);
        assert_eq!(jumped.next_start(), 2);
    }

    #[test]
    fn distortion_limit_keeps_a_path_back_to_the_first_gap() {
        let f = fixture("das haus ist klein");
        let lm = f.data.language_model();
        let weights = f.data.weights();
        let empty = Hypothesis::empty(0, &f.toc, lm, &weights);
        assert!(empty.can_extend(WordsRange::new(0, 0), Some(1)));
        // the jump back from 2 to 0 would exceed the limit
        assert!(!empty.can_extend(WordsRange::new(1, 1), Some(1)));
        assert!(empty.can_extend(WordsRange::new(1, 1), Some(2)));
        // a jump of 2 is over the limit
        assert!(!empty.can_extend(WordsRange::new(2, 2), Some(1)));
        // within reach, but returning to position 0 would need a jump of 3
        assert!(!empty.can_extend(WordsRange::new(1, 2), Some(2)));
        assert!(empty.can_extend(WordsRange::new(3, 3), None));
    }

    #[test]
    fn compare_orders_best_first() {
        let f = fixture("das haus");
        let lm = f.data.language_model();
        let weights = f.data.weights();
        let empty = Rc::new(Hypothesis::empty(0, &f.toc, lm, &weights));
        let mut hyps: Vec<Rc<Hypothesis>> = f
            .toc
            .get(WordsRange::new(0, 0))
            .iter()
            .chain(f.toc.get(WordsRange::new(0, 1)))
            .enumerate()
            .map(|(i, opt)| Rc::new(Hypothesis::expand(&empty, opt, i + 1, &f.toc, lm, &weights)))
            .collect();
        sort_hypotheses(&mut hyps);
        assert!(hyps.windows(2).all(|w| w[0].total_score() >= w[1].total_score()));
        assert_eq!(hyp_compare(&hyps[0], &hyps[0]), Ordering::Equal);
    }
}
