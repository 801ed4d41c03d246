// File: src/search/random.rs
use super::{legal_extensions, Search};
use crate::core::hypothesis::Hypothesis;
use crate::core::static_data::StaticData;
use crate::core::translation_options::TranslationOptionCollection;
use crate::error::{DecoderError, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::rc::Rc;
use std::sync::Arc;

/// Builds one complete hypothesis by repeatedly applying a uniformly chosen
/// legal translation option. Used to seed samplers with a random starting point.
pub struct SearchRandom {
    toc: Rc<TranslationOptionCollection>,
    data: Arc<StaticData>,
    weights: Vec<f32>,
    rng: StdRng,
    best: Option<Rc<Hypothesis>>,
}

impl SearchRandom {
    pub fn new(
        toc: Rc<TranslationOptionCollection>,
        data: Arc<StaticData>,
        weights: Vec<f32>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { toc, data, weights, rng, best: None }
    }
}

impl Search for SearchRandom {
    fn process_sentence(&mut self) -> Result<()> {
        let lm = self.data.language_model();
        let mut hypo = Rc::new(Hypothesis::empty(0, &self.toc, lm, &self.weights));
        let mut steps = 0;
        while !hypo.is_complete() {
            let candidates = legal_extensions(&hypo, &self.toc, &self.data);
            let option = candidates.choose(&mut self.rng).ok_or(DecoderError::NoTranslation)?;
            steps += 1;
            hypo = Rc::new(Hypothesis::expand(&hypo, option, steps, &self.toc, lm, &self.weights));
        }
        debug!("random search applied {} options, score {:.4}", steps, hypo.score());
        self.best = Some(hypo);
        Ok(())
    }

    fn best_hypothesis(&self) -> Option<Rc<Hypothesis>> {
        self.best.clone()
    }

    fn final_hypotheses(&self) -> Vec<Rc<Hypothesis>> {
        self.best.iter().cloned().collect()
    }
}
