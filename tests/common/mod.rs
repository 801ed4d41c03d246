#![allow(dead_code)]

//! Writes a small German-English model once per test binary and
//! initialises the process-wide engine from it.

use decoder_core::init_moses;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use tempfile::TempDir;

const PHRASE_TABLE: &str = "\
das ||| the ||| 0.7 0.6 0.9
das ||| that ||| 0.3 0.4 0.9
das ||| this ||| 0.1 0.2 0.9
haus ||| house ||| 0.8 0.9 0.9
haus ||| home ||| 0.2 0.1 0.9
ist ||| is ||| 0.9 0.9 0.9
klein ||| small ||| 0.6 0.7 0.9
klein ||| little ||| 0.4 0.3 0.9
sehr ||| very ||| 0.9 0.8 0.9
das haus ||| the house ||| 0.6 0.5 0.9
ist klein ||| is small ||| 0.5 0.5 0.9
";

const LM: &str = "\
\\data\\
ngram 1=11
ngram 2=8

\\1-grams:
-99 <s> -0.4
-1.2 </s>
-0.9 the -0.3
-1.4 that -0.3
-1.5 this -0.3
-1.1 house -0.3
-1.6 home -0.3
-1.0 is -0.3
-1.3 small -0.3
-1.5 little -0.3
-1.2 very -0.3

\\2-grams:
-0.3 <s> the
-0.2 the house
-0.3 house is
-0.4 is small
-0.2 small </s>
-0.5 that house
-0.6 is little
-0.4 is very

\\end\\
";

const INI: &str = "\
# test model
[ttable-file]
0 0 3 phrase-table.txt

[lmodel-file]
0 0 2 lm.arpa

[weight-d]
0.3

[weight-l]
0.5

[weight-t]
0.2
0.2
0.1

[weight-w]
-1

[distortion-limit]
4
";

pub const FEATURES: [&str; 7] = [
    "Distortion",
    "WordPenalty",
    "UnknownWordPenalty",
    "LM",
    "PhraseModel_1",
    "PhraseModel_2",
    "PhraseModel_3",
];

static MODEL: OnceLock<TempDir> = OnceLock::new();
static INIT: OnceLock<()> = OnceLock::new();

pub fn model_dir() -> PathBuf {
    MODEL
        .get_or_init(|| {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("phrase-table.txt"), PHRASE_TABLE).unwrap();
            fs::write(dir.path().join("lm.arpa"), LM).unwrap();
            fs::write(dir.path().join("moses.ini"), INI).unwrap();
            dir
        })
        .path()
        .to_path_buf()
}

pub fn ini() -> PathBuf {
    model_dir().join("moses.ini")
}

/// Initialises the engine the first time it is called.
pub fn init() {
    INIT.get_or_init(|| init_moses(&ini(), 0, &[]).unwrap());
}
