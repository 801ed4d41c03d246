// File: src/test_utils.rs
//! Small German-English model written to a temporary directory for unit tests.

use crate::core::static_data::StaticData;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const PHRASE_TABLE: &str = "\
das ||| the ||| 0.7 0.6
das ||| that ||| 0.3 0.4
haus ||| house ||| 0.8 0.9
haus ||| home ||| 0.2 0.1
ist ||| is ||| 0.9 0.9
klein ||| small ||| 0.6 0.7
klein ||| little ||| 0.4 0.3
das haus ||| the house ||| 0.6 0.5
ist klein ||| is small ||| 0.5 0.5
";

pub const LM: &str = "\
\\data\\
ngram 1=9
ngram 2=7

\\1-grams:
-99 <s> -0.4
-1.2 </s>
-0.9 the -0.3
-1.4 that -0.3
-1.1 house -0.3
-1.6 home -0.3
-1.0 is -0.3
-1.3 small -0.3
-1.5 little -0.3

\\2-grams:
-0.3 <s> the
-0.2 the house
-0.3 house is
-0.4 is small
-0.2 small </s>
-0.5 that house
-0.6 is little

\\end\\
";

pub const INI: &str = "\
[ttable-file]
2 phrase-table.txt

[lmodel-file]
2 lm.arpa

[weight-d]
0.3

[weight-l]
0.5

[weight-t]
0.2
0.2

[weight-w]
-1

[distortion-limit]
4

[stack]
50
";

pub struct ModelDir {
    dir: TempDir,
}

impl ModelDir {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("phrase-table.txt"), PHRASE_TABLE).unwrap();
        fs::write(dir.path().join("lm.arpa"), LM).unwrap();
        fs::write(dir.path().join("moses.ini"), INI).unwrap();
        Self { dir }
    }

    pub fn ini(&self) -> PathBuf {
        self.dir.path().join("moses.ini")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn static_data(&self) -> Arc<StaticData> {
        Arc::new(StaticData::load(&self.ini(), 0, &[]).unwrap())
    }
}
