use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

/// Identifier of one scored run. `ROOT_RUN` names the empty pattern set every
/// first-level run starts from.
pub type RunId = u64;
pub const ROOT_RUN: RunId = 0;

/// Returned by the accuracy accessors of a setting that was never scored.
pub const UNSCORED: f64 = -1.0;

/// The five hyperparameters the search is allowed to move.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Param {
    PatStart,
    PatFinish,
    GoodWeight,
    BadWeight,
    Threshold,
}

/// Accuracy counters reported by patgen for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub tp: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
}

impl Stats {
    pub fn new(tp: u64, fp: u64, fn_: u64) -> Self {
        Self { tp, fp, fn_ }
    }

    /// TP / (TP + FP). A run that predicts nothing has precision 0.
    pub fn precision(&self) -> f64 {
        let total = self.tp + self.fp;
        if total == 0 {
            return 0.0;
        }
        self.tp as f64 / total as f64
    }

    /// TP / (TP + FN). An empty gold set has recall 0.
    pub fn recall(&self) -> f64 {
        let total = self.tp + self.fn_;
        if total == 0 {
            return 0.0;
        }
        self.tp as f64 / total as f64
    }
}

impl std::ops::AddAssign for Stats {
    fn add_assign(&mut self, rhs: Self) {
        self.tp += rhs.tp;
        self.fp += rhs.fp;
        self.fn_ += rhs.fn_;
    }
}

/// Dedup key of a setting. Weights are stored reduced by their GCD so that
/// `2:4` and `1:2` collapse; `level` and `run_id` are not part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey {
    pub prev: RunId,
    pub pat_start: u32,
    pub pat_finish: u32,
    pub good_weight: u32,
    pub bad_weight: u32,
    pub threshold: u32,
}

/// One point in patgen's hyperparameter space, plus its lineage and, once
/// scored, its accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub level: u32,
    pub prev: RunId,
    pub pat_start: u32,
    pub pat_finish: u32,
    pub good_weight: u32,
    pub bad_weight: u32,
    pub threshold: u32,

    pub run_id: Option<RunId>,
    pub stats: Option<Stats>,
    pub n_patterns: Option<usize>,
    pub timestamp: Option<String>,
}

impl Default for Setting {
    fn default() -> Self {
        Self {
            level: 1,
            prev: ROOT_RUN,
            pat_start: 2,
            pat_finish: 2,
            good_weight: 1,
            bad_weight: 1,
            threshold: 1,
            run_id: None,
            stats: None,
            n_patterns: None,
            timestamp: None,
        }
    }
}

impl Setting {
    pub fn new(pat_start: u32, pat_finish: u32, good_weight: u32, bad_weight: u32, threshold: u32) -> Self {
        Self {
            pat_start,
            pat_finish,
            good_weight,
            bad_weight,
            threshold,
            ..Default::default()
        }
    }

    /// Unscored copy carrying the same parameters and lineage. Chain with the
    /// `with_*` methods to override fields.
    pub fn copy(&self) -> Self {
        Self {
            level: self.level,
            prev: self.prev,
            pat_start: self.pat_start,
            pat_finish: self.pat_finish,
            good_weight: self.good_weight,
            bad_weight: self.bad_weight,
            threshold: self.threshold,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_prev(mut self, prev: RunId) -> Self {
        self.prev = prev;
        self
    }

    pub fn with_param(mut self, param: Param, value: u32) -> Self {
        match param {
            Param::PatStart => self.pat_start = value,
            Param::PatFinish => self.pat_finish = value,
            Param::GoodWeight => self.good_weight = value,
            Param::BadWeight => self.bad_weight = value,
            Param::Threshold => self.threshold = value,
        }
        self
    }

    pub fn get(&self, param: Param) -> u32 {
        match param {
            Param::PatStart => self.pat_start,
            Param::PatFinish => self.pat_finish,
            Param::GoodWeight => self.good_weight,
            Param::BadWeight => self.bad_weight,
            Param::Threshold => self.threshold,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.stats.is_some() && self.n_patterns.is_some()
    }

    pub fn reduced_weights(&self) -> (u32, u32) {
        let divisor = gcd(self.good_weight, self.bad_weight);
        if divisor == 0 {
            return (self.good_weight, self.bad_weight);
        }
        (self.good_weight / divisor, self.bad_weight / divisor)
    }

    pub fn canonical_key(&self) -> CanonicalKey {
        let (good_weight, bad_weight) = self.reduced_weights();
        CanonicalKey {
            prev: self.prev,
            pat_start: self.pat_start,
            pat_finish: self.pat_finish,
            good_weight,
            bad_weight,
            threshold: self.threshold,
        }
    }

    pub fn is_equivalent(&self, other: &Setting) -> bool {
        self.canonical_key() == other.canonical_key()
    }

    pub fn precision(&self) -> f64 {
        self.stats.map_or(UNSCORED, |s| s.precision())
    }

    pub fn recall(&self) -> f64 {
        self.stats.map_or(UNSCORED, |s| s.recall())
    }

    /// Weighted harmonic mean of precision and recall; `n > 1` favours recall.
    pub fn f_score(&self, n: f64) -> f64 {
        if n <= 0.0 {
            return UNSCORED;
        }
        let (p, r) = (self.precision(), self.recall());
        if p == UNSCORED || r == UNSCORED {
            return UNSCORED;
        }
        let n_sq = n * n;
        let denominator = n_sq * p + r;
        if denominator == 0.0 {
            return 0.0;
        }
        (1.0 + n_sq) * p * r / denominator
    }
}

/// Ordering used to pick survivors: fewer patterns first, then higher
/// precision, then higher recall. Unscored settings sort last.
pub fn rank(a: &Setting, b: &Setting) -> Ordering {
    let patterns = |s: &Setting| s.n_patterns.unwrap_or(usize::MAX);
    patterns(a)
        .cmp(&patterns(b))
        .then_with(|| b.precision().total_cmp(&a.precision()))
        .then_with(|| b.recall().total_cmp(&a.recall()))
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = self
            .run_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let patterns = self
            .n_patterns
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        write!(
            f,
            "Setting {}: level={} prev={} pat_start={} pat_finish={} good_weight={} bad_weight={} \
             threshold={} n_patterns={} precision={:.3} recall={:.3}",
            run,
            self.level,
            self.prev,
            self.pat_start,
            self.pat_finish,
            self.good_weight,
            self.bad_weight,
            self.threshold,
            patterns,
            self.precision(),
            self.recall()
        )
    }
}
