mod common;

use decoder_core::{get_feature_weights, set_feature_weights, DecoderError};

// The only test binary that changes the global weights.
#[test]
fn set_then_get_weights_round_trips() {
    common::init();
    let original = get_feature_weights().unwrap();
    let scaled: Vec<f32> = original.iter().map(|w| w * 1.5).collect();
    set_feature_weights(&scaled).unwrap();
    assert_eq!(get_feature_weights().unwrap(), scaled);

    assert!(matches!(
        set_feature_weights(&scaled[1..]),
        Err(DecoderError::WeightCount { .. })
    ));
    assert_eq!(get_feature_weights().unwrap(), scaled);

    set_feature_weights(&original).unwrap();
    assert_eq!(get_feature_weights().unwrap(), original);
}
