mod common;

use decoder_core::{
    get_feature_names, get_feature_weights, init_moses, set_feature_weights, DecoderError, MosesDecoder,
    RandomDecoder,
};
use std::path::Path;

// One test so the order of initialisation steps is fixed.
#[test]
fn accessors_require_initialisation() {
    assert!(matches!(get_feature_names(), Err(DecoderError::NotInitialized)));
    assert!(matches!(get_feature_weights(), Err(DecoderError::NotInitialized)));
    assert!(matches!(set_feature_weights(&[1.0]), Err(DecoderError::NotInitialized)));
    assert!(matches!(MosesDecoder::new(), Err(DecoderError::NotInitialized)));
    assert!(matches!(RandomDecoder::new(), Err(DecoderError::NotInitialized)));

    // a failed initialisation leaves the engine uninitialised
    let missing = Path::new("/nonexistent/moses.ini");
    assert!(matches!(init_moses(missing, 0, &[]), Err(DecoderError::Io { .. })));
    assert!(matches!(get_feature_names(), Err(DecoderError::NotInitialized)));

    common::init();
    assert_eq!(get_feature_names().unwrap().len(), common::FEATURES.len());
}
