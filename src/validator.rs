use crate::combiner::Combiner;
use crate::error::{TunerError, TunerResult};
use crate::hyphenator::Hyphenator;
use crate::setting::Stats;
use crate::translate::TranslationTable;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct FoldResult {
    pub fold: usize,
    pub patterns: PathBuf,
    pub stats: Stats,
    pub precision: f64,
    pub recall: f64,
}

/// Per-fold results and their unweighted mean.
#[derive(Debug, Clone, Serialize)]
pub struct CrossValidationReport {
    pub folds: Vec<FoldResult>,
    pub precision: f64,
    pub recall: f64,
}

impl CrossValidationReport {
    pub fn from_folds(folds: Vec<FoldResult>) -> Self {
        let n = folds.len().max(1) as f64;
        let precision = folds.iter().map(|f| f.precision).sum::<f64>() / n;
        let recall = folds.iter().map(|f| f.recall).sum::<f64>() / n;
        Self {
            folds,
            precision,
            recall,
        }
    }
}

pub trait Validator {
    fn validate(&mut self, wordlist: &Path) -> TunerResult<CrossValidationReport>;
}

pub struct NFoldCrossValidator {
    combiner: Box<dyn Combiner>,
    n: usize,
    marker: char,
    out_dir: PathBuf,
}

impl std::fmt::Debug for NFoldCrossValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NFoldCrossValidator")
            .field("n", &self.n)
            .field("marker", &self.marker)
            .field("out_dir", &self.out_dir)
            .finish_non_exhaustive()
    }
}

impl NFoldCrossValidator {
    pub fn new<P: Into<PathBuf>>(
        combiner: Box<dyn Combiner>,
        n: usize,
        marker: char,
        out_dir: P,
    ) -> TunerResult<Self> {
        if n < 2 {
            return Err(TunerError::Config(format!(
                "Cross-validation needs at least 2 folds, got {}",
                n
            )));
        }
        Ok(Self {
            combiner,
            n,
            marker,
            out_dir: out_dir.into(),
        })
    }

    pub fn folds(&self) -> usize {
        self.n
    }

    pub fn combiner(&self) -> &dyn Combiner {
        self.combiner.as_ref()
    }

    /// Writes line `i` of `wordlist` to the test split when `i % n == index`
    /// and to the train split otherwise. Splits default to
    /// `<wordlist>.train` and `<wordlist>.test`.
    pub fn n_fold_split(
        &self,
        wordlist: &Path,
        index: usize,
        train: Option<&Path>,
        test: Option<&Path>,
    ) -> TunerResult<(PathBuf, PathBuf)> {
        let with_suffix = |suffix: &str| {
            let mut name = wordlist.as_os_str().to_owned();
            name.push(suffix);
            PathBuf::from(name)
        };
        let train_path = train.map_or_else(|| with_suffix(".train"), Path::to_path_buf);
        let test_path = test.map_or_else(|| with_suffix(".test"), Path::to_path_buf);

        let mut train_out = BufWriter::new(File::create(&train_path)?);
        let mut test_out = BufWriter::new(File::create(&test_path)?);
        for (i, line) in BufReader::new(File::open(wordlist)?).lines().enumerate() {
            let line = line?;
            if i % self.n == index {
                writeln!(test_out, "{}", line)?;
            } else {
                writeln!(train_out, "{}", line)?;
            }
        }
        train_out.flush()?;
        test_out.flush()?;
        Ok((train_path, test_path))
    }

    /// Trains on `train` from a clean engine state and returns the final
    /// pattern file, `out_dir/<name>`. The scorer's wordlist is restored
    /// whether or not training succeeds.
    pub fn train_patterns(&mut self, train: &Path, name: &str) -> TunerResult<PathBuf> {
        let previous = self
            .combiner
            .meta_mut()
            .state_mut()
            .scorer
            .set_wordlist(train.to_path_buf());

        let result = self
            .combiner
            .reset()
            .and_then(|_| self.combiner.run(&self.out_dir, Some(name)));

        self.combiner
            .meta_mut()
            .state_mut()
            .scorer
            .set_wordlist(previous);
        result
    }

    /// Hyphenates every word of `test` with `patterns` and counts agreeing,
    /// spurious and missed hyphens against the gold marks.
    pub fn validate_patterns(&self, test: &Path, patterns: &Path) -> TunerResult<Stats> {
        let table = TranslationTable::load(self.combiner.meta().state().scorer.translate())?;
        let hyphenator = Hyphenator::from_files(patterns, &table, self.marker)?;

        let mut stats = Stats::default();
        for line in fs::read_to_string(test)?.lines() {
            let gold = line.trim();
            if gold.is_empty() || gold.starts_with('#') {
                continue;
            }
            let word: String = gold.chars().filter(|&c| c != self.marker).collect();
            stats += compare(gold, &hyphenator.hyphenate(&word), self.marker)?;
        }
        Ok(stats)
    }
}

impl Validator for NFoldCrossValidator {
    fn validate(&mut self, wordlist: &Path) -> TunerResult<CrossValidationReport> {
        let splits = Builder::new().prefix("patgen-tuner-folds-").tempdir()?;
        fs::create_dir_all(&self.out_dir)?;

        let mut folds = Vec::with_capacity(self.n);
        for fold in 0..self.n {
            info!("Cross-validation fold {}/{}", fold + 1, self.n);
            let (train, test) = self.n_fold_split(
                wordlist,
                fold,
                Some(&splits.path().join(format!("fold-{}.train", fold))),
                Some(&splits.path().join(format!("fold-{}.test", fold))),
            )?;
            let patterns = self.train_patterns(&train, &format!("fold-{}.pat", fold))?;
            let stats = self.validate_patterns(&test, &patterns)?;
            debug!("Fold {} stats: {:?}", fold, stats);
            folds.push(FoldResult {
                fold,
                patterns,
                stats,
                precision: stats.precision(),
                recall: stats.recall(),
            });
        }

        let report = CrossValidationReport::from_folds(folds);
        info!(
            "Cross-validation done: precision {:.4}, recall {:.4}",
            report.precision, report.recall
        );
        Ok(report)
    }
}

/// Consumes a run of markers and reports whether there was one.
fn skip_marks<I: Iterator<Item = char>>(it: &mut Peekable<I>, marker: char) -> bool {
    let mut seen = false;
    while it.next_if_eq(&marker).is_some() {
        seen = true;
    }
    seen
}

/// Aligns two hyphenations of the same word gap by gap. A hyphen in both is
/// a true positive, one only in `predicted` a false positive and one only in
/// `gold` a false negative.
pub fn compare(gold: &str, predicted: &str, marker: char) -> TunerResult<Stats> {
    let mut g = gold.chars().peekable();
    let mut p = predicted.chars().peekable();
    let mut stats = Stats::default();
    loop {
        match (skip_marks(&mut g, marker), skip_marks(&mut p, marker)) {
            (true, true) => stats.tp += 1,
            (false, true) => stats.fp += 1,
            (true, false) => stats.fn_ += 1,
            (false, false) => {}
        }
        match (g.next(), p.next()) {
            (None, None) => return Ok(stats),
            (Some(a), Some(b)) if a == b => {}
            _ => {
                return Err(TunerError::Misaligned {
                    gold: gold.to_string(),
                    predicted: predicted.to_string(),
                })
            }
        }
    }
}
