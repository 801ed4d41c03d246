// File: src/search/normal.rs
use super::stack::HypothesisStack;
use super::{legal_extensions, Search};
use crate::core::hypothesis::Hypothesis;
use crate::core::static_data::StaticData;
use crate::core::translation_options::TranslationOptionCollection;
use crate::error::{DecoderError, Result};
use log::debug;
use std::rc::Rc;
use std::sync::Arc;

/// Stack decoding: stack `i` holds hypotheses covering `i` source words.
/// Each stack is pruned before its hypotheses are expanded.
pub struct SearchNormal {
    toc: Rc<TranslationOptionCollection>,
    data: Arc<StaticData>,
    weights: Vec<f32>,
    stacks: Vec<HypothesisStack>,
    next_id: usize,
}

impl SearchNormal {
    pub fn new(toc: Rc<TranslationOptionCollection>, data: Arc<StaticData>, weights: Vec<f32>) -> Self {
        Self { toc, data, weights, stacks: Vec::new(), next_id: 0 }
    }

    fn expand(&mut self, hypo: &Rc<Hypothesis>) {
        let lm = self.data.language_model();
        for option in legal_extensions(hypo, &self.toc, &self.data) {
            let id = self.next_id;
            self.next_id += 1;
            let next = Hypothesis::expand(hypo, &option, id, &self.toc, lm, &self.weights);
            let covered = next.coverage().covered_count();
            self.stacks[covered].add(next);
        }
    }

    pub fn stacks(&self) -> &[HypothesisStack] {
        &self.stacks
    }
}

impl Search for SearchNormal {
    fn process_sentence(&mut self) -> Result<()> {
        let n = self.toc.source_len();
        let settings = self.data.settings();
        self.stacks = (0..=n)
            .map(|_| HypothesisStack::new(settings.stack_size, settings.beam_threshold))
            .collect();
        self.next_id = 1;
        let empty = Hypothesis::empty(0, &self.toc, self.data.language_model(), &self.weights);
        self.stacks[0].add(empty);

        for i in 0..n {
            self.stacks[i].prune();
            let hypotheses = self.stacks[i].hypotheses().to_vec();
            for hypo in &hypotheses {
                self.expand(hypo);
            }
        }
        self.stacks[n].prune();

        debug!(
            "search created {} hypotheses, recombined {}, pruned {}",
            self.next_id,
            self.stacks.iter().map(HypothesisStack::recombined).sum::<usize>(),
            self.stacks.iter().map(HypothesisStack::pruned).sum::<usize>()
        );
        if self.stacks[n].is_empty() {
            return Err(DecoderError::NoTranslation);
        }
        Ok(())
    }

    fn best_hypothesis(&self) -> Option<Rc<Hypothesis>> {
        self.stacks.last().and_then(|s| s.best()).cloned()
    }

    fn final_hypotheses(&self) -> Vec<Rc<Hypothesis>> {
        self.stacks.last().map(|s| s.hypotheses().to_vec()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sentence::Sentence;
    use crate::test_utils::ModelDir;

    fn search(dir: &ModelDir, args: &[&str], text: &str) -> SearchNormal {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let data = Arc::new(StaticData::load(&dir.ini(), 0, &args).unwrap());
        let weights = data.weights();
        let sentence = Sentence::parse(text, "|").unwrap();
        let toc = Rc::new(TranslationOptionCollection::new(&sentence, &data, &weights));
        let mut search = SearchNormal::new(toc, data, weights);
        search.process_sentence().unwrap();
        search
    }

    #[test]
    fn finds_the_monotone_translation() {
        let dir = ModelDir::new();
        let s = search(&dir, &[], "das haus ist klein");
        let best = s.best_hypothesis().unwrap();
        assert!(best.is_complete());
        assert_eq!(best.output_phrase(), "the house is small");
        assert_eq!(s.stacks().len(), 5);
    }

    #[test]
    fn final_hypotheses_are_sorted_and_complete() {
        let dir = ModelDir::new();
        let s = search(&dir, &["-beam-threshold", "0"], "das haus ist klein");
        let finals = s.final_hypotheses();
        assert!(finals.len() > 1);
        assert!(finals.iter().all(|h| h.is_complete()));
        assert!(finals.windows(2).all(|w| w[0].total_score() >= w[1].total_score()));
        assert_eq!(finals[0].id(), s.best_hypothesis().unwrap().id());
    }

    #[test]
    fn stack_size_bounds_every_stack() {
        let dir = ModelDir::new();
        let s = search(&dir, &["-stack", "2", "-beam-threshold", "0"], "das haus ist klein");
        assert!(s.stacks().iter().all(|st| st.len() <= 2));
        assert!(s.best_hypothesis().is_some());
    }

    #[test]
    fn unknown_words_pass_through() {
        let dir = ModelDir::new();
        let s = search(&dir, &[], "das auto ist klein");
        let best = s.best_hypothesis().unwrap();
        assert!(best.output_phrase().contains("auto"));
    }
}
