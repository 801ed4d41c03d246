// --- File: src/core/phrase_table.rs
use crate::core::types::{transform_score, Factor, Phrase, Word};
use crate::error::{DecoderError, Result};
use crate::persistence::load_phrase_table;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One target side of a phrase pair with its log-domain phrase-model scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPhrase {
    pub words: Phrase,
    pub scores: Vec<f32>,
}

#[derive(Clone, Serialize, Deserialize)]
struct TrieNode {
    children: HashMap<Factor, usize>,
    targets: Vec<TargetPhrase>,
}

impl TrieNode {
    fn new() -> Self {
        Self { children: HashMap::new(), targets: Vec::new() }
    }
}

/// Phrase table stored as a trie over source surface forms.
///
/// Walking the trie word by word lets option generation stop extending a
/// source span as soon as no phrase starts with it.
#[derive(Clone, Serialize, Deserialize)]
pub struct PhraseTable {
    nodes: Vec<TrieNode>,
    num_scores: usize,
    entries: usize,
}

impl PhraseTable {
    pub fn new(num_scores: usize) -> Self {
        Self { nodes: vec![TrieNode::new()], num_scores, entries: 0 }
    }

    /// Loads a text table, or the binary cache when the path ends in `.bin`.
    pub fn load(path: &Path, num_scores: usize, delimiter: &str) -> Result<Self> {
        let table = if path.extension().is_some_and(|ext| ext == "bin") {
            let table = load_phrase_table(path)?;
            if table.num_scores != num_scores {
                return Err(DecoderError::InvalidConfig(format!(
                    "binary phrase table {} has {} scores, configuration says {}",
                    path.display(),
                    table.num_scores,
                    num_scores
                )));
            }
            table
        } else {
            let file = File::open(path).map_err(|e| DecoderError::io(path, e))?;
            Self::parse_text(BufReader::new(file), path, num_scores, delimiter)?
        };
        info!(
            "loaded {} phrase pairs with {} scores from {}",
            table.entries,
            num_scores,
            path.display()
        );
        Ok(table)
    }

    /// Parses `source ||| target ||| p1 ... pn` lines. Extra `|||` fields are ignored.
    pub fn parse_text<R: BufRead>(reader: R, path: &Path, num_scores: usize, delimiter: &str) -> Result<Self> {
        let mut table = Self::new(num_scores);
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| DecoderError::io(path, e))?;
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split("|||").map(str::trim).collect();
            if fields.len() < 3 {
                return Err(DecoderError::format(path, line_no, "expected 'source ||| target ||| scores'"));
            }
            let source: Phrase = fields[0].split_whitespace().map(|t| Word::from_token(t, delimiter)).collect();
            let target: Phrase = fields[1].split_whitespace().map(|t| Word::from_token(t, delimiter)).collect();
            if source.is_empty() || target.is_empty() {
                return Err(DecoderError::format(path, line_no, "empty source or target phrase"));
            }
            let scores = fields[2]
                .split_whitespace()
                .map(|s| s.parse::<f32>().map(transform_score))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| DecoderError::format(path, line_no, format!("bad score: {}", e)))?;
            if scores.len() != num_scores {
                return Err(DecoderError::format(
                    path,
                    line_no,
                    format!("expected {} scores, found {}", num_scores, scores.len()),
                ));
            }
            table.insert(&source, TargetPhrase { words: target, scores });
        }
        Ok(table)
    }

    /// Adds a phrase pair. O(k) in the source length.
    pub fn insert(&mut self, source: &[Word], target: TargetPhrase) {
        let mut node_idx = 0;
        for word in source {
            let next_idx = if let Some(&id) = self.nodes[node_idx].children.get(word.surface()) {
                id
            } else {
                let new_node_id = self.nodes.len();
                self.nodes.push(TrieNode::new());
                self.nodes[node_idx].children.insert(word.surface().clone(), new_node_id);
                new_node_id
            };
            node_idx = next_idx;
        }
        self.nodes[node_idx].targets.push(target);
        self.entries += 1;
    }

    fn find_node(&self, source: &[Word]) -> Option<usize> {
        let mut node_idx = 0;
        for word in source {
            node_idx = *self.nodes[node_idx].children.get(word.surface().as_ref())?;
        }
        Some(node_idx)
    }

    pub fn lookup(&self, source: &[Word]) -> Option<&[TargetPhrase]> {
        self.find_node(source)
            .map(|idx| self.nodes[idx].targets.as_slice())
            .filter(|targets| !targets.is_empty())
    }

    pub fn has_prefix(&self, source: &[Word]) -> bool {
        self.find_node(source).is_some()
    }

    /// Every phrase starting at `words[0]`, up to `max_len` words long,
    /// as `(length, targets)` pairs in increasing length.
    pub fn matches_from(&self, words: &[Word], max_len: usize) -> Vec<(usize, &[TargetPhrase])> {
        let mut found = Vec::new();
        let mut node_idx = 0;
        for (i, word) in words.iter().take(max_len).enumerate() {
            match self.nodes[node_idx].children.get(word.surface().as_ref()) {
                Some(&next) => node_idx = next,
                None => break,
            }
            let targets = &self.nodes[node_idx].targets;
            if !targets.is_empty() {
                found.push((i + 1, targets.as_slice()));
            }
        }
        found
    }

    pub fn num_scores(&self) -> usize {
        self.num_scores
    }

    /// Number of phrase pairs.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}
