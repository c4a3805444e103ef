use crate::config::ParamRanges;
use crate::error::{TunerError, TunerResult};
use crate::setting::{Param, Setting};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use strum::IntoEnumIterator;
use tracing::{debug, warn};

static PARAM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s+(\d+)").expect("static regex")
});

/// Source of candidate settings. `None` from `sample` means the source is
/// exhausted; it is a normal end of stream, not an error.
pub trait Sampler {
    fn sample(&mut self) -> TunerResult<Option<Setting>>;

    fn ranges(&self) -> &ParamRanges;

    /// Rewind to the initial state so a fresh run sees the same sequence.
    fn reset(&mut self);

    /// Up to `n` samples; stops early once the source runs dry.
    fn sample_n(&mut self, n: usize) -> TunerResult<Vec<Setting>> {
        let mut samples = Vec::with_capacity(n);
        for _ in 0..n {
            match self.sample()? {
                Some(s) => samples.push(s),
                None => break,
            }
        }
        Ok(samples)
    }

    fn is_ok_value(&self, setting: &Setting, param: Param, value: u32) -> bool {
        self.ranges().is_ok_value(setting, param, value)
    }
}

/// Uniform draws from the configured ranges.
pub struct RandomSampler {
    ranges: ParamRanges,
    seed: Option<u64>,
    rng: fastrand::Rng,
}

impl RandomSampler {
    pub fn new(ranges: ParamRanges, seed: Option<u64>) -> TunerResult<Self> {
        ranges.validate()?;
        Ok(Self {
            ranges,
            seed,
            rng: Self::make_rng(seed),
        })
    }

    fn make_rng(seed: Option<u64>) -> fastrand::Rng {
        if let Some(s) = seed {
            fastrand::Rng::with_seed(s)
        } else {
            fastrand::Rng::new()
        }
    }

    fn draw(&mut self, param: Param) -> u32 {
        let (min, max) = self.ranges.range(param);
        self.rng.u32(min..=max)
    }
}

impl Sampler for RandomSampler {
    fn sample(&mut self) -> TunerResult<Option<Setting>> {
        let r = &self.ranges;
        // pat_start above pat_finish_max would leave no admissible finish
        let start_max = r.pat_start_max.min(r.pat_finish_max);
        let pat_start = self.rng.u32(r.pat_start_min..=start_max);
        let finish_min = r.pat_finish_min.max(pat_start);
        let pat_finish = self.rng.u32(finish_min..=r.pat_finish_max);

        let good_weight = self.draw(Param::GoodWeight);
        let bad_weight = self.draw(Param::BadWeight);
        let threshold = self.draw(Param::Threshold);

        Ok(Some(Setting::new(
            pat_start,
            pat_finish,
            good_weight,
            bad_weight,
            threshold,
        )))
    }

    fn ranges(&self) -> &ParamRanges {
        &self.ranges
    }

    fn reset(&mut self) {
        self.rng = Self::make_rng(self.seed);
    }
}

/// Replays `pat_start pat_finish good_weight bad_weight threshold` tuples from
/// a parameter file, one per line. `#` lines are comments (leading whitespace
/// allowed); a blank line or the end of the file closes the stream. Values
/// outside the sampler's ranges are a configuration error.
pub struct FileSampler {
    path: PathBuf,
    lines: Vec<String>,
    cursor: usize,
    open: bool,
    repeat: bool,
    ranges: ParamRanges,
}

impl FileSampler {
    pub fn open<P: AsRef<Path>>(path: P, repeat: bool) -> TunerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path).map_err(|e| {
            TunerError::Config(format!(
                "Could not open parameter file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::from_lines(path, content.lines().map(str::to_string).collect(), repeat))
    }

    pub fn from_content(content: &str, repeat: bool) -> Self {
        Self::from_lines(
            PathBuf::from("<memory>"),
            content.lines().map(str::to_string).collect(),
            repeat,
        )
    }

    fn from_lines(path: PathBuf, lines: Vec<String>, repeat: bool) -> Self {
        Self {
            path,
            lines,
            cursor: 0,
            open: true,
            repeat,
            ranges: ParamRanges::default(),
        }
    }

    pub fn with_ranges(mut self, ranges: ParamRanges) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn close(&mut self) {
        self.open = false;
        self.cursor = 0;
    }
}

impl Sampler for FileSampler {
    fn sample(&mut self) -> TunerResult<Option<Setting>> {
        if !self.open {
            if !self.repeat {
                return Ok(None);
            }
            debug!("Restarting parameter file {}", self.path.display());
            self.open = true;
        }

        while self
            .lines
            .get(self.cursor)
            .is_some_and(|l| l.trim_start().starts_with('#'))
        {
            self.cursor += 1;
        }

        let line = match self.lines.get(self.cursor) {
            Some(l) if !l.trim().is_empty() => l.clone(),
            _ => {
                self.close();
                return Ok(None);
            }
        };
        self.cursor += 1;

        let Some(caps) = PARAM_LINE.captures(&line) else {
            warn!(
                "Malformed line {} in {}: '{}'",
                self.cursor,
                self.path.display(),
                line
            );
            return Ok(None);
        };

        let mut values = [0u32; 5];
        for (i, v) in values.iter_mut().enumerate() {
            match caps[i + 1].parse() {
                Ok(parsed) => *v = parsed,
                Err(_) => {
                    warn!("Value out of range on line {}: '{}'", self.cursor, line);
                    return Ok(None);
                }
            }
        }
        let [pat_start, pat_finish, good_weight, bad_weight, threshold] = values;
        if pat_start > pat_finish {
            warn!(
                "Line {} has pat_start {} > pat_finish {}",
                self.cursor, pat_start, pat_finish
            );
            return Ok(None);
        }

        let setting = Setting::new(pat_start, pat_finish, good_weight, bad_weight, threshold);
        for param in Param::iter() {
            let (min, max) = self.ranges.range(param);
            let value = setting.get(param);
            if value < min || value > max {
                return Err(TunerError::Config(format!(
                    "Line {} of {}: {} = {} outside {}..={}",
                    self.cursor,
                    self.path.display(),
                    param,
                    value,
                    min,
                    max
                )));
            }
        }
        Ok(Some(setting))
    }

    fn ranges(&self) -> &ParamRanges {
        &self.ranges
    }

    fn reset(&mut self) {
        self.open = true;
        self.cursor = 0;
    }
}
