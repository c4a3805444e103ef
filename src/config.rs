use crate::error::{TunerError, TunerResult};
use crate::setting::{Param, Setting};
use clap::{parser::ValueSource, ArgMatches, Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};

/// patgen refuses to work with more hyphenation levels than this.
pub const PATGEN_MAX_LEVELS: u32 = 9;
/// Longest pattern patgen is able to generate.
pub const MAX_PAT_FINISH: u32 = 15;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub ranges: ParamRanges,
    #[command(flatten)]
    pub paths: DataPaths,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MetaheuristicKind {
    HillClimbing,
    #[value(name = "none")]
    #[strum(serialize = "none")]
    #[serde(rename = "none")]
    NoOp,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CombinerKind {
    Simple,
    AllWithAll,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SamplerKind {
    Random,
    File,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    #[arg(long, default_value_t = 1)]
    pub population_size: usize,
    #[arg(long, default_value_t = 4)]
    pub n_levels: u32,
    #[arg(long, value_enum, default_value_t = MetaheuristicKind::HillClimbing)]
    pub metaheuristic: MetaheuristicKind,
    #[arg(long, value_enum, default_value_t = CombinerKind::Simple)]
    pub combiner: CombinerKind,
    #[arg(long, value_enum, default_value_t = SamplerKind::File)]
    pub sampler: SamplerKind,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long, default_value_t = false)]
    pub repeat: bool,
    #[arg(long, default_value_t = 1.0)]
    pub f_weight: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            population_size: 1,
            n_levels: 4,
            metaheuristic: MetaheuristicKind::HillClimbing,
            combiner: CombinerKind::Simple,
            sampler: SamplerKind::File,
            seed: None,
            repeat: false,
            f_weight: 1.0,
        }
    }
}

/// Inclusive bounds for every tunable parameter.
#[derive(Args, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamRanges {
    #[arg(long, default_value_t = 1)]
    pub pat_start_min: u32,
    #[arg(long, default_value_t = MAX_PAT_FINISH)]
    pub pat_start_max: u32,
    #[arg(long, default_value_t = 1)]
    pub pat_finish_min: u32,
    #[arg(long, default_value_t = MAX_PAT_FINISH)]
    pub pat_finish_max: u32,
    #[arg(long, default_value_t = 1)]
    pub good_weight_min: u32,
    #[arg(long, default_value_t = 15)]
    pub good_weight_max: u32,
    #[arg(long, default_value_t = 1)]
    pub bad_weight_min: u32,
    #[arg(long, default_value_t = 15)]
    pub bad_weight_max: u32,
    #[arg(long, default_value_t = 1)]
    pub threshold_min: u32,
    #[arg(long, default_value_t = 15)]
    pub threshold_max: u32,
}

impl Default for ParamRanges {
    fn default() -> Self {
        Self {
            pat_start_min: 1,
            pat_start_max: MAX_PAT_FINISH,
            pat_finish_min: 1,
            pat_finish_max: MAX_PAT_FINISH,
            good_weight_min: 1,
            good_weight_max: 15,
            bad_weight_min: 1,
            bad_weight_max: 15,
            threshold_min: 1,
            threshold_max: 15,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    #[arg(long, default_value = "patgen")]
    pub patgen: PathBuf,
    #[arg(long, default_value = "data/words.wlh")]
    pub wordlist: PathBuf,
    #[arg(long, default_value = "data/words.tra")]
    pub translate: PathBuf,
    #[arg(long, default_value = "data/patgen_params.in")]
    pub params: PathBuf,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
    #[arg(long, default_value_t = '-')]
    pub marker: char,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            patgen: PathBuf::from("patgen"),
            wordlist: PathBuf::from("data/words.wlh"),
            translate: PathBuf::from("data/words.tra"),
            params: PathBuf::from("data/patgen_params.in"),
            out_dir: PathBuf::from("."),
            marker: '-',
        }
    }
}

impl ParamRanges {
    pub fn range(&self, param: Param) -> (u32, u32) {
        match param {
            Param::PatStart => (self.pat_start_min, self.pat_start_max),
            Param::PatFinish => (self.pat_finish_min, self.pat_finish_max),
            Param::GoodWeight => (self.good_weight_min, self.good_weight_max),
            Param::BadWeight => (self.bad_weight_min, self.bad_weight_max),
            Param::Threshold => (self.threshold_min, self.threshold_max),
        }
    }

    /// Whether `setting` may take `value` for `param` without leaving its
    /// bounds or breaking `pat_start <= pat_finish`.
    pub fn is_ok_value(&self, setting: &Setting, param: Param, value: u32) -> bool {
        let (min, max) = self.range(param);
        if value < min || value > max {
            return false;
        }
        match param {
            Param::PatStart => value <= setting.pat_finish,
            Param::PatFinish => value >= setting.pat_start,
            _ => true,
        }
    }

    pub fn validate(&self) -> TunerResult<()> {
        for param in <Param as strum::IntoEnumIterator>::iter() {
            let (min, max) = self.range(param);
            if min == 0 {
                return Err(TunerError::Config(format!(
                    "Lower bound of {} must be at least 1",
                    param
                )));
            }
            if min > max {
                return Err(TunerError::Config(format!(
                    "Empty range for {}: {}..={}",
                    param, min, max
                )));
            }
        }
        if self.pat_finish_max < self.pat_start_min {
            return Err(TunerError::Config(
                "pat_finish range lies entirely below pat_start range".to_string(),
            ));
        }
        if self.pat_finish_max > MAX_PAT_FINISH {
            return Err(TunerError::Config(format!(
                "pat_finish_max {} exceeds patgen limit {}",
                self.pat_finish_max, MAX_PAT_FINISH
            )));
        }
        Ok(())
    }

    pub fn merge_from_cli(&mut self, cli: &ParamRanges, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field;
                }
            };
        }

        update_if_present!(pat_start_min);
        update_if_present!(pat_start_max);
        update_if_present!(pat_finish_min);
        update_if_present!(pat_finish_max);
        update_if_present!(good_weight_min);
        update_if_present!(good_weight_max);
        update_if_present!(bad_weight_min);
        update_if_present!(bad_weight_max);
        update_if_present!(threshold_min);
        update_if_present!(threshold_max);
    }
}

impl SearchParams {
    pub fn validate(&self) -> TunerResult<()> {
        if self.population_size == 0 {
            return Err(TunerError::Config(
                "population_size must be at least 1".to_string(),
            ));
        }
        if self.n_levels == 0 || self.n_levels > PATGEN_MAX_LEVELS {
            return Err(TunerError::Config(format!(
                "n_levels must lie in 1..={}, got {}",
                PATGEN_MAX_LEVELS, self.n_levels
            )));
        }
        if self.f_weight <= 0.0 {
            return Err(TunerError::Config("f_weight must be positive".to_string()));
        }
        Ok(())
    }

    pub fn merge_from_cli(&mut self, cli: &SearchParams, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(population_size);
        update_if_present!(n_levels);
        update_if_present!(metaheuristic);
        update_if_present!(combiner);
        update_if_present!(sampler);
        update_if_present!(seed);
        update_if_present!(repeat);
        update_if_present!(f_weight);
    }
}

impl DataPaths {
    /// Fails if one of the inputs the scorer reads on every run is missing.
    pub fn validate(&self) -> TunerResult<()> {
        if !self.wordlist.is_file() {
            return Err(TunerError::Config(format!(
                "Wordlist not found: {}",
                self.wordlist.display()
            )));
        }
        if !self.translate.is_file() {
            return Err(TunerError::Config(format!(
                "Translation table not found: {}",
                self.translate.display()
            )));
        }
        Ok(())
    }

    pub fn merge_from_cli(&mut self, cli: &DataPaths, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(patgen);
        update_if_present!(wordlist);
        update_if_present!(translate);
        update_if_present!(params);
        update_if_present!(out_dir);
        update_if_present!(marker);
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> TunerResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            TunerError::Config(format!(
                "Failed to read config '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Explicit command-line flags win over values read from a config file.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        self.search.merge_from_cli(&cli.search, matches);
        self.ranges.merge_from_cli(&cli.ranges, matches);
        self.paths.merge_from_cli(&cli.paths, matches);
    }

    pub fn validate(&self) -> TunerResult<()> {
        self.search.validate()?;
        self.ranges.validate()
    }
}
