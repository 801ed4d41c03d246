// src/lib.rs

pub mod core;
pub mod decoder;
pub mod error;
pub mod persistence;
pub mod search;

#[cfg(test)]
mod test_utils;

pub use crate::core::hypothesis::{hyp_compare, sort_hypotheses, Hypothesis};
pub use crate::core::static_data::StaticData;
pub use crate::core::types::{Factor, Translation, Word};
pub use crate::decoder::{
    get_feature_names, get_feature_weights, init_moses, output_weights, output_weights_from,
    set_feature_weights, Decoded, Decoder, MosesDecoder, RandomDecoder,
};
pub use crate::error::{DecoderError, Result};
pub use crate::search::SearchAlgorithm;
