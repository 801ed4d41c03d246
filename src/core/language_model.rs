// File: src/core/language_model.rs
use crate::core::types::{Factor, Word, LOWEST_SCORE};
use crate::error::{DecoderError, Result};
use log::{info, warn};
use std::collections::HashMap;
use std::f32::consts::LN_10;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

pub const BOS: &str = "<s>";
pub const EOS: &str = "</s>";
const UNK: &str = "<unk>";

#[derive(Debug, Clone, Copy)]
struct NgramEntry {
    prob: f32,
    backoff: f32,
}

/// The last `order - 1` target words, which is all a back-off n-gram model
/// needs to score what comes next. Two hypotheses with equal state are
/// interchangeable for future LM scoring.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LmState(Vec<Factor>);

impl LmState {
    pub fn words(&self) -> &[Factor] {
        &self.0
    }
}

/// Back-off n-gram model read from an ARPA file. Scores are natural logs.
#[derive(Debug, Clone)]
pub struct LanguageModel {
    order: usize,
    ngrams: HashMap<Vec<Factor>, NgramEntry>,
    bos: Factor,
    eos: Factor,
}

impl LanguageModel {
    pub fn load(path: &Path, order: usize) -> Result<Self> {
        let file = File::open(path).map_err(|e| DecoderError::io(path, e))?;
        let lm = Self::parse_arpa(BufReader::new(file), path, order)?;
        info!("loaded {}-gram language model ({} n-grams) from {}", lm.order, lm.ngrams.len(), path.display());
        Ok(lm)
    }

    /// Reads ARPA text. `max_order` caps the order actually used.
    pub fn parse_arpa<R: BufRead>(reader: R, path: &Path, max_order: usize) -> Result<Self> {
        let mut ngrams = HashMap::new();
        let mut declared: Vec<(usize, usize)> = Vec::new();
        let mut section: Option<usize> = None;
        let mut seen_data = false;

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| DecoderError::io(path, e))?;
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "\\data\\" {
                seen_data = true;
                continue;
            }
            if line == "\\end\\" {
                break;
            }
            if let Some(n) = line.strip_prefix('\\').and_then(|l| l.strip_suffix("-grams:")) {
                let n: usize = n
                    .parse()
                    .map_err(|_| DecoderError::format(path, line_no, "bad n-gram section header"))?;
                section = Some(n);
                continue;
            }
            match section {
                None => {
                    if let Some(counts) = line.strip_prefix("ngram ") {
                        let (n, count) = counts
                            .split_once('=')
                            .and_then(|(n, c)| Some((n.trim().parse::<usize>().ok()?, c.trim().parse::<usize>().ok()?)))
                            .ok_or_else(|| DecoderError::format(path, line_no, "bad 'ngram N=count' line"))?;
                        declared.push((n, count));
                    } else if seen_data {
                        return Err(DecoderError::format(path, line_no, "unexpected line in \\data\\ header"));
                    }
                }
                Some(n) => {
                    let fields: Vec<&str> = line.split_whitespace().collect();
                    if fields.len() != n + 1 && fields.len() != n + 2 {
                        return Err(DecoderError::format(
                            path,
                            line_no,
                            format!("expected {}-gram entry, got {} fields", n, fields.len()),
                        ));
                    }
                    let parse = |s: &str| {
                        s.parse::<f32>()
                            .map_err(|_| DecoderError::format(path, line_no, format!("bad log probability '{}'", s)))
                    };
                    let prob = (parse(fields[0])? * LN_10).max(LOWEST_SCORE);
                    let backoff = if fields.len() == n + 2 { parse(fields[n + 1])? * LN_10 } else { 0.0 };
                    let key: Vec<Factor> = fields[1..=n].iter().map(|w| Arc::from(*w)).collect();
                    ngrams.insert(key, NgramEntry { prob, backoff });
                }
            }
        }

        if !seen_data {
            return Err(DecoderError::format(path, 1, "missing \\data\\ header"));
        }
        let file_order = declared.iter().map(|&(n, _)| n).max().unwrap_or(0);
        if file_order == 0 {
            return Err(DecoderError::format(path, 1, "no n-gram counts declared"));
        }
        for &(n, count) in &declared {
            let found = ngrams.keys().filter(|k| k.len() == n).count();
            if found != count {
                warn!("{}: header declares {} {}-grams, found {}", path.display(), count, n, found);
            }
        }
        let order = if max_order == 0 { file_order } else { max_order.min(file_order) };
        if max_order > file_order {
            warn!("{}: configured order {} exceeds file order {}", path.display(), max_order, file_order);
        }
        ngrams.retain(|k, _| k.len() <= order);

        Ok(Self { order, ngrams, bos: Arc::from(BOS), eos: Arc::from(EOS) })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// State before any target word has been produced.
    pub fn begin_state(&self) -> LmState {
        LmState(vec![self.bos.clone()])
    }

    /// ln P(word | context) with Katz back-off over the longest known history.
    pub fn score(&self, context: &[Factor], word: &Factor) -> f32 {
        let max_hist = self.order.saturating_sub(1).min(context.len());
        let ctx = &context[context.len() - max_hist..];
        let mut key: Vec<Factor> = Vec::with_capacity(max_hist + 1);

        for n in (0..=ctx.len()).rev() {
            key.clear();
            key.extend_from_slice(&ctx[ctx.len() - n..]);
            key.push(word.clone());
            if let Some(entry) = self.ngrams.get(&key) {
                return entry.prob + self.backoff_sum(ctx, n);
            }
        }
        match self.ngrams.get([Arc::<str>::from(UNK)].as_slice()) {
            Some(unk) => unk.prob + self.backoff_sum(ctx, 0),
            None => LOWEST_SCORE,
        }
    }

    /// Sum of back-off weights for histories longer than `matched`.
    fn backoff_sum(&self, ctx: &[Factor], matched: usize) -> f32 {
        ((matched + 1)..=ctx.len())
            .filter_map(|m| self.ngrams.get(&ctx[ctx.len() - m..]))
            .map(|e| e.backoff)
            .sum()
    }

    /// Scores `words` after `state`, returning the score and the successor state.
    pub fn score_phrase(&self, state: &LmState, words: &[Word]) -> (f32, LmState) {
        let mut context: Vec<Factor> = state.0.clone();
        let mut total = 0.0;
        for word in words {
            total += self.score(&context, word.surface());
            context.push(word.surface().clone());
        }
        (total, self.truncate(context))
    }

    /// Score of the sentence-end marker after `state`.
    pub fn score_end(&self, state: &LmState) -> f32 {
        self.score(&state.0, &self.eos)
    }

    /// Context-free estimate of a phrase: each word sees only the words before it in the phrase.
    pub fn estimate(&self, words: &[Word]) -> f32 {
        let mut context: Vec<Factor> = Vec::with_capacity(words.len());
        let mut total = 0.0;
        for word in words {
            total += self.score(&context, word.surface());
            context.push(word.surface().clone());
        }
        total
    }

    fn truncate(&self, mut context: Vec<Factor>) -> LmState {
        let keep = self.order.saturating_sub(1);
        if context.len() > keep {
            context.drain(..context.len() - keep);
        }
        LmState(context)
    }
}
