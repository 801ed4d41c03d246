// File: src/search/mod.rs
//! Search strategies over the hypothesis space of one sentence.

mod normal;
mod random;
pub mod stack;

pub use normal::SearchNormal;
pub use random::SearchRandom;

use crate::core::hypothesis::Hypothesis;
use crate::core::static_data::StaticData;
use crate::core::translation_options::{TranslationOption, TranslationOptionCollection};
use crate::core::types::WordsRange;
use crate::error::Result;
use std::rc::Rc;
use std::sync::Arc;

/// A search over one sentence's translation options.
pub trait Search {
    /// Runs the search to completion.
    fn process_sentence(&mut self) -> Result<()>;

    /// Best complete hypothesis, once the search has run.
    fn best_hypothesis(&self) -> Option<Rc<Hypothesis>>;

    /// Every complete hypothesis the search kept, best first.
    fn final_hypotheses(&self) -> Vec<Rc<Hypothesis>>;
}

/// The closed set of search strategies a decoder can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchAlgorithm {
    /// Deterministic stack decoding with beam pruning.
    #[default]
    Normal,
    /// A single randomly built complete hypothesis. A seed makes it reproducible.
    Random { seed: Option<u64> },
}

/// Builds the search object for `algorithm`.
pub fn create_search(
    algorithm: SearchAlgorithm,
    toc: Rc<TranslationOptionCollection>,
    data: Arc<StaticData>,
    weights: Vec<f32>,
) -> Box<dyn Search> {
    match algorithm {
        SearchAlgorithm::Normal => Box::new(SearchNormal::new(toc, data, weights)),
        SearchAlgorithm::Random { seed } => Box::new(SearchRandom::new(toc, data, weights, seed)),
    }
}

/// Every option that may legally extend `hypo`.
pub(crate) fn legal_extensions(
    hypo: &Hypothesis,
    toc: &TranslationOptionCollection,
    data: &StaticData,
) -> Vec<Rc<TranslationOption>> {
    let settings = data.settings();
    let n = toc.source_len();
    let mut found = Vec::new();
    for start in 0..n {
        if hypo.coverage().is_covered(start) {
            continue;
        }
        let max_len = settings.max_phrase_length.min(n - start);
        for len in 1..=max_len {
            let range = WordsRange::new(start, start + len - 1);
            if hypo.coverage().is_covered(range.end) {
                break;
            }
            if !hypo.can_extend(range, settings.distortion_limit) {
                continue;
            }
            found.extend(toc.get(range).iter().cloned());
        }
    }
    found
}
