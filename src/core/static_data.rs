// File: src/core/static_data.rs
use crate::core::language_model::LanguageModel;
use crate::core::parameter::Parameter;
use crate::core::phrase_table::PhraseTable;
use crate::error::{DecoderError, Result};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

pub const DISTORTION: usize = 0;
pub const WORD_PENALTY: usize = 1;
pub const UNKNOWN_WORD_PENALTY: usize = 2;
pub const LANGUAGE_MODEL: usize = 3;
pub const PHRASE_MODEL_START: usize = 4;

static INSTANCE: OnceLock<Arc<StaticData>> = OnceLock::new();

/// Search limits read from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// `None` means reordering is unrestricted.
    pub distortion_limit: Option<usize>,
    pub stack_size: usize,
    /// Log-domain margin below the best hypothesis in a stack; `-inf` disables it.
    pub beam_threshold: f32,
    /// Options kept per source span; 0 keeps all.
    pub ttable_limit: usize,
    pub max_phrase_length: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            distortion_limit: Some(6),
            stack_size: 100,
            beam_threshold: 0.00001f32.ln(),
            ttable_limit: 20,
            max_phrase_length: 20,
        }
    }
}

/// Process-wide engine state: models, feature layout and the live weight vector.
///
/// Every decoder and every weight accessor reads the same instance once
/// [`StaticData::install`] has run.
pub struct StaticData {
    phrase_table: PhraseTable,
    language_model: LanguageModel,
    feature_names: Vec<String>,
    weights: RwLock<Vec<f32>>,
    settings: SearchSettings,
    factor_delimiter: String,
    verbosity: i32,
}

impl StaticData {
    /// Reads the ini file, applies pass-through arguments and loads every model.
    pub fn load(ini: &Path, verbosity: i32, args: &[String]) -> Result<Self> {
        let mut parameter = Parameter::load(ini)?;
        parameter.override_with_args(args)?;
        Self::from_parameter(&parameter, verbosity)
    }

    pub fn from_parameter(parameter: &Parameter, verbosity: i32) -> Result<Self> {
        let factor_delimiter = parameter.single("factor-delimiter", "|".to_string())?;

        let (num_scores, table_path) = model_entry(parameter, "ttable-file")?;
        let phrase_table = PhraseTable::load(&table_path, num_scores, &factor_delimiter)?;

        let (order, lm_path) = model_entry(parameter, "lmodel-file")?;
        let language_model = LanguageModel::load(&lm_path, order)?;

        let mut weights = Vec::with_capacity(PHRASE_MODEL_START + num_scores);
        weights.push(exactly_one(parameter, "weight-d")?);
        weights.push(exactly_one(parameter, "weight-w")?);
        weights.push(if parameter.is_set("weight-u") { exactly_one(parameter, "weight-u")? } else { 1.0 });
        weights.push(exactly_one(parameter, "weight-l")?);
        let tm_weights = parameter.floats("weight-t")?;
        if tm_weights.len() != num_scores {
            return Err(DecoderError::InvalidConfig(format!(
                "[weight-t] has {} values but the phrase table has {} scores",
                tm_weights.len(),
                num_scores
            )));
        }
        weights.extend(tm_weights);
        let feature_names = feature_names(num_scores);
        check_finite(&feature_names, &weights)?;

        let settings = search_settings(parameter)?;
        let verbosity = parameter.single("verbose", verbosity)?.max(verbosity);

        info!(
            "engine initialised from {}: {} features, distortion limit {:?}, stack {}",
            parameter.origin().display(),
            weights.len(),
            settings.distortion_limit,
            settings.stack_size
        );

        Ok(Self {
            phrase_table,
            language_model,
            feature_names,
            weights: RwLock::new(weights),
            settings,
            factor_delimiter,
            verbosity,
        })
    }

    /// Makes `data` the process-wide instance. Fails if one is already installed.
    pub fn install(data: Self) -> Result<Arc<Self>> {
        let data = Arc::new(data);
        INSTANCE
            .set(Arc::clone(&data))
            .map_err(|_| DecoderError::AlreadyInitialized)?;
        Ok(data)
    }

    pub fn is_installed() -> bool {
        INSTANCE.get().is_some()
    }

    pub fn instance() -> Result<Arc<Self>> {
        INSTANCE.get().cloned().ok_or(DecoderError::NotInitialized)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Snapshot of the current weights.
    pub fn weights(&self) -> Vec<f32> {
        self.weights.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Rejects a list of the wrong length or with a NaN/infinite entry; the
    /// current weights are left as they were.
    pub fn set_weights(&self, weights: &[f32]) -> Result<()> {
        if weights.len() != self.feature_names.len() {
            return Err(DecoderError::WeightCount {
                expected: self.feature_names.len(),
                actual: weights.len(),
            });
        }
        check_finite(&self.feature_names, weights)?;
        let mut current = self.weights.write().unwrap_or_else(PoisonError::into_inner);
        current.clear();
        current.extend_from_slice(weights);
        Ok(())
    }

    pub fn phrase_table(&self) -> &PhraseTable {
        &self.phrase_table
    }

    pub fn language_model(&self) -> &LanguageModel {
        &self.language_model
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn factor_delimiter(&self) -> &str {
        &self.factor_delimiter
    }

    pub fn verbosity(&self) -> i32 {
        self.verbosity
    }
}

fn feature_names(num_scores: usize) -> Vec<String> {
    let mut names: Vec<String> = ["Distortion", "WordPenalty", "UnknownWordPenalty", "LM"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    names.extend((1..=num_scores).map(|i| format!("PhraseModel_{}", i)));
    names
}

fn check_finite(names: &[String], weights: &[f32]) -> Result<()> {
    match names.iter().zip(weights).find(|(_, w)| !w.is_finite()) {
        Some((name, &value)) => Err(DecoderError::NonFiniteWeight { feature: name.clone(), value }),
        None => Ok(()),
    }
}

/// `[ttable-file]` / `[lmodel-file]` lines end in `<count> <path>`; any
/// leading Moses-style factor columns are ignored.
fn model_entry(parameter: &Parameter, key: &str) -> Result<(usize, PathBuf)> {
    let lines = parameter.values(key);
    if lines.len() != 1 {
        return Err(DecoderError::InvalidConfig(format!(
            "[{}] must name exactly one model, found {}",
            key,
            lines.len()
        )));
    }
    let fields: Vec<&str> = lines[0].split_whitespace().collect();
    if fields.len() < 2 {
        return Err(DecoderError::InvalidConfig(format!("[{}] expects '<count> <path>'", key)));
    }
    let count = fields[fields.len() - 2]
        .parse()
        .map_err(|_| DecoderError::InvalidConfig(format!("[{}] has a non-numeric count", key)))?;
    Ok((count, parameter.resolve_path(fields[fields.len() - 1])))
}

fn exactly_one(parameter: &Parameter, key: &str) -> Result<f32> {
    let values = parameter.floats(key)?;
    match values.as_slice() {
        [w] => Ok(*w),
        _ => Err(DecoderError::InvalidConfig(format!(
            "[{}] needs exactly one weight, found {}",
            key,
            values.len()
        ))),
    }
}

fn search_settings(parameter: &Parameter) -> Result<SearchSettings> {
    let defaults = SearchSettings::default();
    let limit: i64 = parameter.single("distortion-limit", 6)?;
    let threshold: f32 = parameter.single("beam-threshold", 0.00001)?;
    let stack_size: usize = parameter.single("stack", defaults.stack_size)?;
    if stack_size == 0 {
        return Err(DecoderError::InvalidConfig("[stack] must be at least 1".into()));
    }
    let max_phrase_length: usize = parameter.single("max-phrase-length", defaults.max_phrase_length)?;
    if max_phrase_length == 0 {
        return Err(DecoderError::InvalidConfig("[max-phrase-length] must be at least 1".into()));
    }
    Ok(SearchSettings {
        distortion_limit: usize::try_from(limit).ok(),
        stack_size,
        beam_threshold: if threshold > 0.0 { threshold.ln() } else { f32::NEG_INFINITY },
        ttable_limit: parameter.single("ttable-limit", defaults.ttable_limit)?,
        max_phrase_length,
    })
}
