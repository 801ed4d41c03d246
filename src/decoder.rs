// File: src/decoder.rs
//! Entry points a sampler uses to drive the engine: one-time initialisation,
//! feature-weight access and the [`Decoder`] wrappers around the search.

use crate::core::hypothesis::{sort_hypotheses, Hypothesis};
use crate::core::sentence::Sentence;
use crate::core::static_data::StaticData;
use crate::core::translation_options::TranslationOptionCollection;
use crate::core::types::{Phrase, Translation};
use crate::error::{DecoderError, Result};
use crate::search::{create_search, Search, SearchAlgorithm};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

/// Initialises the engine from `inifile`, passing `args` through as
/// `-section value...` overrides. Must be called once before anything else,
/// even by callers that never decode, since the weight accessors and the
/// sampler rely on the loaded tables.
pub fn init_moses(inifile: &Path, debug_level: i32, args: &[String]) -> Result<()> {
    if StaticData::is_installed() {
        return Err(DecoderError::AlreadyInitialized);
    }
    let data = StaticData::load(inifile, debug_level, args)?;
    StaticData::install(data)?;
    info!("decoder initialised from {}", inifile.display());
    Ok(())
}

pub fn get_feature_names() -> Result<Vec<String>> {
    Ok(StaticData::instance()?.feature_names().to_vec())
}

pub fn get_feature_weights() -> Result<Vec<f32>> {
    Ok(StaticData::instance()?.weights())
}

/// Replaces the engine's weights. The list must line up with [`get_feature_names`].
pub fn set_feature_weights(weights: &[f32]) -> Result<()> {
    StaticData::instance()?.set_weights(weights)
}

/// Writes the active weights, one `name weight` line per feature.
pub fn output_weights<W: Write>(out: &mut W) -> Result<()> {
    let data = StaticData::instance()?;
    write_weights(data.feature_names(), &data.weights(), out)
}

/// Writes `weights` in the same format, labelled with the engine's feature names.
pub fn output_weights_from<W: Write>(weights: &[f32], out: &mut W) -> Result<()> {
    let data = StaticData::instance()?;
    write_weights(data.feature_names(), weights, out)
}

pub(crate) fn write_weights<W: Write>(names: &[String], weights: &[f32], out: &mut W) -> Result<()> {
    if names.len() != weights.len() {
        return Err(DecoderError::WeightCount { expected: names.len(), actual: weights.len() });
    }
    for (name, weight) in names.iter().zip(weights) {
        writeln!(out, "{} {}", name, weight).map_err(DecoderError::Output)?;
    }
    out.flush().map_err(DecoderError::Output)
}

/// Result of decoding one sentence.
///
/// Everything here is owned by the caller; the hypothesis keeps its chain of
/// predecessors and options alive through reference counting.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub best: Rc<Hypothesis>,
    pub options: Rc<TranslationOptionCollection>,
    pub sentence: Phrase,
}

impl Decoded {
    pub fn translation(&self) -> Translation {
        self.best.translation()
    }
}

/// Anything that turns a source sentence into a best hypothesis.
pub trait Decoder {
    fn decode(&mut self, source: &str) -> Result<Decoded>;
}

/// Runs the engine's search: build the sentence, generate translation
/// options, create a search via [`MosesDecoder::create_search`], run it and
/// take the best complete hypothesis.
pub struct MosesDecoder {
    data: Arc<StaticData>,
    algorithm: SearchAlgorithm,
    searcher: Option<Box<dyn Search>>,
    toc: Option<Rc<TranslationOptionCollection>>,
    translations: Vec<(Translation, f32)>,
}

impl MosesDecoder {
    /// A decoder on the process-wide engine.
    pub fn new() -> Result<Self> {
        Ok(Self::with_static_data(StaticData::instance()?))
    }

    pub fn with_static_data(data: Arc<StaticData>) -> Self {
        Self {
            data,
            algorithm: SearchAlgorithm::Normal,
            searcher: None,
            toc: None,
            translations: Vec::new(),
        }
    }

    pub fn algorithm(&self) -> SearchAlgorithm {
        self.algorithm
    }

    /// Creates the search object for one sentence with this decoder's strategy.
    pub fn create_search(&self, toc: Rc<TranslationOptionCollection>, weights: Vec<f32>) -> Box<dyn Search> {
        create_search(self.algorithm, toc, Arc::clone(&self.data), weights)
    }

    /// Distinct translations from the last search with their total scores, best first.
    pub fn translations(&self) -> &[(Translation, f32)] {
        &self.translations
    }

    /// Up to `n` complete hypotheses from the last search, best first.
    pub fn n_best(&self, n: usize) -> Vec<Rc<Hypothesis>> {
        let mut finals = self.searcher.as_ref().map(|s| s.final_hypotheses()).unwrap_or_default();
        sort_hypotheses(&mut finals);
        finals.truncate(n);
        finals
    }

    /// Option collection of the last decoded sentence.
    pub fn options(&self) -> Option<&Rc<TranslationOptionCollection>> {
        self.toc.as_ref()
    }
}

impl Decoder for MosesDecoder {
    fn decode(&mut self, source: &str) -> Result<Decoded> {
        self.searcher = None;
        self.toc = None;
        self.translations.clear();

        let sentence = Sentence::parse(source, self.data.factor_delimiter())?;
        let weights = self.data.weights();
        let toc = Rc::new(TranslationOptionCollection::new(&sentence, &self.data, &weights));
        debug!("{} words, {} translation options", sentence.len(), toc.len());

        let mut search = self.create_search(Rc::clone(&toc), weights);
        search.process_sentence()?;
        let best = search.best_hypothesis().ok_or(DecoderError::NoTranslation)?;

        let mut finals = search.final_hypotheses();
        sort_hypotheses(&mut finals);
        for hypo in &finals {
            let translation = hypo.translation();
            if !self.translations.iter().any(|(t, _)| *t == translation) {
                self.translations.push((translation, hypo.total_score()));
            }
        }
        if self.data.verbosity() > 0 {
            info!("BEST TRANSLATION: {} [{:.4}]", best.output_phrase(), best.total_score());
        }

        self.searcher = Some(search);
        self.toc = Some(Rc::clone(&toc));
        Ok(Decoded { best, options: toc, sentence: sentence.into_words() })
    }
}

/// A [`MosesDecoder`] whose search picks options at random instead of
/// searching for the best. Each call draws a fresh search seed from the
/// decoder's own generator, so a seeded decoder is reproducible across runs.
pub struct RandomDecoder {
    inner: MosesDecoder,
    seeds: StdRng,
}

impl RandomDecoder {
    pub fn new() -> Result<Self> {
        Ok(Self::with_static_data(StaticData::instance()?, None))
    }

    pub fn with_seed(seed: u64) -> Result<Self> {
        Ok(Self::with_static_data(StaticData::instance()?, Some(seed)))
    }

    pub fn with_static_data(data: Arc<StaticData>, seed: Option<u64>) -> Self {
        let seeds = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut inner = MosesDecoder::with_static_data(data);
        inner.algorithm = SearchAlgorithm::Random { seed };
        Self { inner, seeds }
    }

    /// The wrapped decoder, for reading back the last search.
    pub fn engine(&self) -> &MosesDecoder {
        &self.inner
    }
}


impl Decoder for RandomDecoder {
    fn decode(&mut self, source: &str) -> Result<Decoded> {
        self.inner.algorithm = SearchAlgorithm::Random { seed: Some(self.seeds.gen()) };
        self.inner.decode(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::static_data::WORD_PENALTY;
    use crate::test_utils::ModelDir;

    #[test]
    fn moses_decoder_returns_best_and_keeps_search_state() {
        let dir = ModelDir::new();
        let mut decoder = MosesDecoder::with_static_data(dir.static_data());
        let decoded = decoder.decode("das haus ist klein").unwrap();
        assert_eq!(decoded.best.output_phrase(), "the house is small");
        assert_eq!(decoded.sentence.len(), 4);
        assert!(Rc::ptr_eq(&decoded.options, decoder.options().unwrap()));

        let translations = decoder.translations();
        assert!(!translations.is_empty());
        assert_eq!(translations[0].0, decoded.translation());
        assert!(translations.windows(2).all(|w| w[0].1 >= w[1].1));

        let nbest = decoder.n_best(3);
        assert!(nbest.len() <= 3);
        assert_eq!(nbest[0].id(), decoded.best.id());
    }

    #[test]
    fn random_decoder_changes_only_the_strategy() {
        let dir = ModelDir::new();
        let data = dir.static_data();
        let mut decoder = RandomDecoder::with_static_data(Arc::clone(&data), Some(11));
        assert!(matches!(decoder.engine().algorithm(), SearchAlgorithm::Random { .. }));
        let decoded = decoder.decode("das haus ist klein").unwrap();
        assert!(decoded.best.is_complete());
        assert_eq!(decoder.engine().translations().len(), 1);

        let mut again = RandomDecoder::with_static_data(data, Some(11));
        let replay = again.decode("das haus ist klein").unwrap();
        assert_eq!(replay.best.output_phrase(), decoded.best.output_phrase());
    }

    #[test]
    fn empty_source_is_propagated() {
        let dir = ModelDir::new();
        let mut decoder = MosesDecoder::with_static_data(dir.static_data());
        assert!(matches!(decoder.decode("   "), Err(DecoderError::EmptySource)));
        assert!(decoder.options().is_none());
    }

    #[test]
    fn weight_lines_pair_names_and_values() {
        let names = vec!["LM".to_string(), "WordPenalty".to_string()];
        let mut out = Vec::new();
        write_weights(&names, &[0.5, -1.0], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "LM 0.5\nWordPenalty -1\n");

        let mut out = Vec::new();
        assert!(matches!(
            write_weights(&names, &[0.5], &mut out),
            Err(DecoderError::WeightCount { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn weights_steer_the_search() {
        let dir = ModelDir::new();
        let data = dir.static_data();
        let mut weights = data.weights();
        // a more negative word-penalty weight rewards output length
        let mut decoder = MosesDecoder::with_static_data(Arc::clone(&data));
        let before = decoder.decode("das haus").unwrap().best.score();
        weights[WORD_PENALTY] = -3.0;
        data.set_weights(&weights).unwrap();
        let after = decoder.decode("das haus").unwrap().best.score();
        assert!(after > before);
    }
}
