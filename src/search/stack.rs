// File: src/search/stack.rs
use crate::core::hypothesis::{hyp_compare, Hypothesis, RecombinationKey};
use std::collections::HashMap;
use std::rc::Rc;

/// Hypotheses covering the same number of source words.
///
/// Adding recombines with an equivalent hypothesis; [`HypothesisStack::prune`]
/// applies the beam threshold and the histogram limit.
pub struct HypothesisStack {
    max_size: usize,
    beam_threshold: f32,
    hypotheses: Vec<Rc<Hypothesis>>,
    index: HashMap<RecombinationKey, usize>,
    best_score: f32,
    recombined: usize,
    pruned: usize,
}

impl HypothesisStack {
    pub fn new(max_size: usize, beam_threshold: f32) -> Self {
        Self {
            max_size,
            beam_threshold,
            hypotheses: Vec::new(),
            index: HashMap::new(),
            best_score: f32::NEG_INFINITY,
            recombined: 0,
            pruned: 0,
        }
    }

    /// Adds a hypothesis. Returns false if it was discarded, either by the
    /// beam threshold or because an equivalent better hypothesis exists.
    pub fn add(&mut self, hypo: Hypothesis) -> bool {
        let total = hypo.total_score();
        if total < self.best_score + self.beam_threshold {
            self.pruned += 1;
            return false;
        }
        let key = hypo.recombination_key();
        if let Some(&pos) = self.index.get(&key) {
            self.recombined += 1;
            if self.hypotheses[pos].total_score() >= total {
                return false;
            }
            self.hypotheses[pos] = Rc::new(hypo);
        } else {
            self.index.insert(key, self.hypotheses.len());
            self.hypotheses.push(Rc::new(hypo));
        }
        if total > self.best_score {
            self.best_score = total;
        }
        true
    }

    /// Drops hypotheses below the beam and keeps at most `max_size`, best first.
    pub fn prune(&mut self) {
        let floor = self.best_score + self.beam_threshold;
        let before = self.hypotheses.len();
        self.hypotheses.retain(|h| h.total_score() >= floor);
        self.hypotheses.sort_by(|a, b| hyp_compare(a, b));
        self.hypotheses.truncate(self.max_size);
        self.pruned += before - self.hypotheses.len();
        self.index = self
            .hypotheses
            .iter()
            .enumerate()
            .map(|(pos, h)| (h.recombination_key(), pos))
            .collect();
    }

    pub fn best(&self) -> Option<&Rc<Hypothesis>> {
        self.hypotheses.iter().min_by(|a, b| hyp_compare(a, b))
    }

    pub fn hypotheses(&self) -> &[Rc<Hypothesis>] {
        &self.hypotheses
    }

    pub fn len(&self) -> usize {
        self.hypotheses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hypotheses.is_empty()
    }

    pub fn recombined(&self) -> usize {
        self.recombined
    }

    pub fn pruned(&self) -> usize {
        self.pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sentence::Sentence;
    use crate::core::translation_options::TranslationOptionCollection;
    use crate::core::types::WordsRange;
    use crate::test_utils::ModelDir;

    fn expansions(text: &str, range: WordsRange) -> Vec<Hypothesis> {
        let dir = ModelDir::new();
        let data = dir.static_data();
        let weights = data.weights();
        let sentence = Sentence::parse(text, "|").unwrap();
        let toc = TranslationOptionCollection::new(&sentence, &data, &weights);
        let empty = Rc::new(Hypothesis::empty(0, &toc, data.language_model(), &weights));
        toc.get(range)
            .iter()
            .enumerate()
            .map(|(i, opt)| Hypothesis::expand(&empty, opt, i + 1, &toc, data.language_model(), &weights))
            .collect()
    }

    #[test]
    fn histogram_pruning_keeps_the_best() {
        // "haus" -> house / home: different LM states, no recombination
        let hyps = expansions("haus ist", WordsRange::new(0, 0));
        let best = hyps.iter().map(|h| h.total_score()).fold(f32::NEG_INFINITY, f32::max);
        let mut stack = HypothesisStack::new(1, f32::NEG_INFINITY);
        for h in hyps {
            stack.add(h);
        }
        assert_eq!(stack.len(), 2);
        stack.prune();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.best().unwrap().total_score(), best);
        assert_eq!(stack.pruned(), 1);
    }

    #[test]
    fn equivalent_hypotheses_are_recombined() {
        let mut hyps = expansions("haus", WordsRange::new(0, 0));
        let first = hyps.remove(0);
        let key = first.recombination_key();
        let again = expansions("haus", WordsRange::new(0, 0)).remove(0);
        assert_eq!(again.recombination_key(), key);

        let mut stack = HypothesisStack::new(10, f32::NEG_INFINITY);
        assert!(stack.add(first));
        assert!(!stack.add(again));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.recombined(), 1);
    }

    #[test]
    fn beam_threshold_rejects_weak_hypotheses() {
        // house beats home by more than 1.0 (phrase and LM scores)
        let mut hyps = expansions("haus ist", WordsRange::new(0, 0)).into_iter();
        let mut stack = HypothesisStack::new(10, -0.5);
        assert!(stack.add(hyps.next().unwrap()));
        assert!(!stack.add(hyps.next().unwrap()));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.pruned(), 1);
    }
}
