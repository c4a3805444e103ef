use crate::error::TunerResult;
use crate::setting::{RunId, Setting};
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Populations selected at the end of each level, in order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LearningInfo {
    pub level_outputs: Vec<Vec<Setting>>,
}

/// One exported line of the learning history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelRow {
    pub level: u32,
    pub run_id: Option<RunId>,
    pub prev: RunId,
    pub pat_start: u32,
    pub pat_finish: u32,
    pub good_weight: u32,
    pub bad_weight: u32,
    pub threshold: u32,
    pub n_patterns: Option<usize>,
    pub precision: f64,
    pub recall: f64,
    pub f_score: f64,
}

impl LearningInfo {
    pub fn record(&mut self, population: &[Setting]) {
        self.level_outputs.push(population.to_vec());
    }

    pub fn reset(&mut self) {
        self.level_outputs.clear();
    }

    pub fn rows(&self, f_weight: f64) -> Vec<LevelRow> {
        self.level_outputs
            .iter()
            .flatten()
            .map(|s| LevelRow {
                level: s.level,
                run_id: s.run_id,
                prev: s.prev,
                pat_start: s.pat_start,
                pat_finish: s.pat_finish,
                good_weight: s.good_weight,
                bad_weight: s.bad_weight,
                threshold: s.threshold,
                n_patterns: s.n_patterns,
                precision: s.precision(),
                recall: s.recall(),
                f_score: s.f_score(f_weight),
            })
            .collect()
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P, f_weight: f64) -> TunerResult<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        for row in self.rows(f_weight) {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_json(&self) -> TunerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `<lang>/<dataset>/<file>` naming convention of the data directory.
fn lang_and_dataset(path: &Path) -> (String, String) {
    let abs = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let name_of = |p: Option<&Path>| {
        p.and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let dataset_dir = abs.parent();
    let lang_dir = dataset_dir.and_then(Path::parent);
    (name_of(lang_dir), name_of(dataset_dir))
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub lang: String,
    pub dataset_name: String,
    pub size_lines: usize,
    pub size_bytes: u64,
}

impl DatasetInfo {
    pub fn from_file<P: AsRef<Path>>(path: P) -> TunerResult<Self> {
        let path = path.as_ref();
        let (lang, dataset_name) = lang_and_dataset(path);
        let size_lines = BufReader::new(File::open(path)?).split(b'\n').count();
        let size_bytes = fs::metadata(path)?.len();
        Ok(Self {
            lang,
            dataset_name,
            size_lines,
            size_bytes,
        })
    }
}

impl fmt::Display for DatasetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dataset {}: lang = {}, {} B, {} lines",
            self.dataset_name, self.lang, self.size_bytes, self.size_lines
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternsInfo {
    pub lang: String,
    pub dataset_name: String,
    pub size_bytes: u64,
    pub n_patterns: Option<usize>,
    pub precision: f64,
    pub recall: f64,
}

impl PatternsInfo {
    pub fn new<P: AsRef<Path>>(pattern_file: P, setting: &Setting) -> TunerResult<Self> {
        let path = pattern_file.as_ref();
        let (lang, dataset_name) = lang_and_dataset(path);
        Ok(Self {
            lang,
            dataset_name,
            size_bytes: fs::metadata(path)?.len(),
            n_patterns: setting.n_patterns,
            precision: setting.precision(),
            recall: setting.recall(),
        })
    }
}

impl fmt::Display for PatternsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .n_patterns
            .map_or_else(|| "?".to_string(), |n| n.to_string());
        write!(
            f,
            "Patterns for {}/{}: {} B, {} patterns, precision {:.4}, recall {:.4}",
            self.lang, self.dataset_name, self.size_bytes, count, self.precision, self.recall
        )
    }
}
