// ============================================================
// Layer 4 - Parallel Corpus Loader
// ============================================================
// Reads a tab-separated parallel corpus, one pair per line:
//
//   Go.\tVe.
//   Hi.\tHola.\tCC-BY 2.0 (France) Attribution: tatoeba.org ...
//
// Column 0 is the source sentence, column 1 the target; any
// further columns (attribution etc.) are ignored. Lines with
// fewer than two columns or an empty side are skipped with a
// warning rather than aborting the whole load.

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use crate::data::preprocessor::Preprocessor;
use crate::domain::sentence_pair::SentencePair;
use crate::domain::traits::CorpusSource;

pub struct TsvCorpusLoader {
    path:      PathBuf,
    /// Keep at most this many pairs (in file order)
    max_pairs: Option<usize>,
}

impl TsvCorpusLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), max_pairs: None }
    }

    pub fn with_max_pairs(mut self, max_pairs: usize) -> Self {
        self.max_pairs = Some(max_pairs);
        self
    }
}

impl CorpusSource for TsvCorpusLoader {
    fn load_pairs(&self) -> Result<Vec<SentencePair>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open corpus '{}'", self.path.display()))?;
        let reader = BufReader::new(file);
        let prep   = Preprocessor::new();
        let limit  = self.max_pairs.unwrap_or(usize::MAX);

        let mut pairs   = Vec::new();
        let mut skipped = 0usize;

        for (line_no, line) in reader.lines().enumerate() {
            if pairs.len() >= limit {
                break;
            }
            let line = line
                .with_context(|| format!("Cannot read line {} of '{}'", line_no + 1, self.path.display()))?;

            let mut columns = line.split('\t');
            let (Some(source), Some(target)) = (columns.next(), columns.next()) else {
                skipped += 1;
                continue;
            };

            let pair = SentencePair::new(prep.clean(source), prep.clean(target));
            if pair.is_empty() {
                skipped += 1;
                continue;
            }
            pairs.push(pair);
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} malformed lines in '{}'", skipped, self.path.display());
        }
        tracing::debug!("Loaded {} sentence pairs", pairs.len());
        Ok(pairs)
    }
}
