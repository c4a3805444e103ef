use crate::error::{TunerError, TunerResult};
use crate::setting::{RunId, Setting, Stats};
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

static ACCURACY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+) good, (\d+) bad, (\d+) missed").expect("static regex")
});

/// Everything one patgen invocation consumes.
#[derive(Debug, Clone)]
pub struct PatgenRequest {
    pub run_id: RunId,
    pub wordlist: PathBuf,
    pub input_patterns: PathBuf,
    pub output_patterns: PathBuf,
    pub translate: PathBuf,
    pub level: u32,
    pub pat_start: u32,
    pub pat_finish: u32,
    pub good_weight: u32,
    pub bad_weight: u32,
    pub threshold: u32,
}

impl PatgenRequest {
    pub fn for_setting(
        run_id: RunId,
        setting: &Setting,
        wordlist: &Path,
        input_patterns: PathBuf,
        output_patterns: PathBuf,
        translate: &Path,
    ) -> Self {
        Self {
            run_id,
            wordlist: wordlist.to_path_buf(),
            input_patterns,
            output_patterns,
            translate: translate.to_path_buf(),
            level: setting.level,
            pat_start: setting.pat_start,
            pat_finish: setting.pat_finish,
            good_weight: setting.good_weight,
            bad_weight: setting.bad_weight,
            threshold: setting.threshold,
        }
    }

    /// Answers to patgen's interactive prompts: hyphenation level range,
    /// pattern length range, weights and threshold, and `n` to skip writing
    /// a hyphenated copy of the wordlist.
    pub fn parameter_block(&self) -> String {
        format!(
            "{} {}\n{} {}\n{} {} {}\nn\n",
            self.level,
            self.level,
            self.pat_start,
            self.pat_finish,
            self.good_weight,
            self.bad_weight,
            self.threshold
        )
    }
}

#[derive(Debug, Clone)]
pub struct PatgenOutput {
    pub pattern_file: PathBuf,
    pub log: String,
}

/// The external pattern generator. Implementations must leave the generated
/// patterns at `request.output_patterns`.
pub trait PatternGenerator {
    fn invoke(&self, request: &PatgenRequest) -> TunerResult<PatgenOutput>;
}

/// Runs the real `patgen` binary.
#[derive(Debug, Clone)]
pub struct PatgenCommand {
    binary: PathBuf,
}

impl PatgenCommand {
    pub fn new<P: Into<PathBuf>>(binary: P) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl PatternGenerator for PatgenCommand {
    fn invoke(&self, request: &PatgenRequest) -> TunerResult<PatgenOutput> {
        let failed = |reason: String| TunerError::Generator {
            run_id: request.run_id,
            reason,
        };

        let mut child = Command::new(&self.binary)
            .arg(&request.wordlist)
            .arg(&request.input_patterns)
            .arg(&request.output_patterns)
            .arg(&request.translate)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failed(format!("could not start {}: {}", self.binary.display(), e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.parameter_block().as_bytes())
                .map_err(|e| failed(format!("could not write parameters: {}", e)))?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(failed(format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(PatgenOutput {
            pattern_file: request.output_patterns.clone(),
            log: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Accuracy of the last `"<tp> good, <fp> bad, <fn> missed"` line in a log.
/// patgen prints one such line per pass; the final one describes the
/// finished pattern set.
pub fn parse_accuracy(log: &str) -> Option<Stats> {
    log.lines().rev().find_map(|line| {
        let caps = ACCURACY_LINE.captures(line)?;
        Some(Stats::new(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        ))
    })
}

pub fn count_patterns(path: &Path) -> TunerResult<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut n = 0;
    for line in reader.lines() {
        if !line?.trim().is_empty() {
            n += 1;
        }
    }
    Ok(n)
}
