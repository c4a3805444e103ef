#![allow(dead_code)]

use patgen_tuner::error::{TunerError, TunerResult};
use patgen_tuner::patgen::{PatgenOutput, PatgenRequest, PatternGenerator};
use patgen_tuner::scorer::Scorer;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

/// How the stand-in for patgen behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Pattern count and accuracy are simple functions of the parameters:
    /// a higher threshold gives fewer patterns and better accuracy, a higher
    /// `pat_start` gives fewer patterns at unchanged accuracy. Weights have
    /// no effect.
    Landscape,
    /// Around `CROWDED_BASE` several single-step neighbours beat the base,
    /// with different and with equal pattern counts. See `crowded_outcome`.
    Crowded,
    /// Learns `x1y` for every hyphen between `x` and `y` in the wordlist.
    Bigrams,
    /// Writes patterns but a log without an accuracy line.
    NoAccuracy,
    /// Every invocation fails.
    Fail,
}

pub type Calls = Rc<RefCell<Vec<PatgenRequest>>>;

pub struct FakePatgen {
    behaviour: Behaviour,
    calls: Calls,
}

impl FakePatgen {
    pub fn new(behaviour: Behaviour) -> (Self, Calls) {
        let calls = Calls::default();
        (
            Self {
                behaviour,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

pub fn landscape_patterns(pat_start: u32, threshold: u32) -> usize {
    40usize
        .saturating_sub((2 * threshold + pat_start) as usize)
        .max(1)
}

/// `(pat_start, pat_finish, good_weight, bad_weight, threshold)` the
/// `Crowded` behaviour is centred on.
pub const CROWDED_BASE: (u32, u32, u32, u32, u32) = (2, 4, 2, 2, 5);

/// Pattern count and true positives (10 bad, `100 - tp` missed) for the
/// `Crowded` behaviour. Settings that are not one step from the base score
/// like the base itself.
pub fn crowded_outcome(r: &PatgenRequest) -> (usize, u32) {
    match (r.pat_start, r.pat_finish, r.good_weight, r.bad_weight, r.threshold) {
        (3, 4, 2, 2, 5) => (20, 61),
        (1, 4, 2, 2, 5) => (35, 61),
        (2, 5, 2, 2, 5) => (15, 61),
        // same count as the one above, better accuracy, scanned later
        (2, 3, 2, 2, 5) => (15, 62),
        (2, 4, 3, 2, 5) => (25, 70),
        (2, 4, 1, 2, 5) => (40, 70),
        (2, 4, 2, 3, 5) | (2, 4, 2, 1, 5) => (30, 65),
        // fewest patterns but worse accuracy
        (2, 4, 2, 2, 6) => (10, 59),
        (2, 4, 2, 2, 4) => (50, 59),
        _ => (30, 60),
    }
}

impl PatternGenerator for FakePatgen {
    fn invoke(&self, request: &PatgenRequest) -> TunerResult<PatgenOutput> {
        self.calls.borrow_mut().push(request.clone());

        let inherited = fs::read_to_string(&request.input_patterns)?;
        let mut patterns: BTreeSet<String> = inherited
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();

        let log = match self.behaviour {
            Behaviour::Fail => {
                return Err(TunerError::Generator {
                    run_id: request.run_id,
                    reason: "fake failure".to_string(),
                })
            }
            Behaviour::Landscape | Behaviour::Crowded | Behaviour::NoAccuracy => {
                let (n, tp) = if self.behaviour == Behaviour::Crowded {
                    crowded_outcome(request)
                } else {
                    (
                        landscape_patterns(request.pat_start, request.threshold),
                        50 + 2 * request.threshold,
                    )
                };
                let level_letter = char::from(b'a' + request.level as u8);
                for i in 0..n {
                    patterns.insert(format!("{}{}1z", level_letter, "y".repeat(i + 1)));
                }
                let fn_ = if self.behaviour == Behaviour::Crowded {
                    100 - tp
                } else {
                    100 - 2 * request.threshold
                };
                if self.behaviour == Behaviour::NoAccuracy {
                    "This is PATGEN\nno report today\n".to_string()
                } else {
                    format!(
                        "This is PATGEN\n1 good, 1 bad, 1 missed\n{} good, 10 bad, {} missed\n",
                        tp, fn_
                    )
                }
            }
            Behaviour::Bigrams => {
                let words = fs::read_to_string(&request.wordlist)?;
                let mut good = 0;
                for word in words.lines() {
                    let chars: Vec<char> = word.trim().to_lowercase().chars().collect();
                    for w in chars.windows(3) {
                        if w[1] == '-' {
                            patterns.insert(format!("{}1{}", w[0], w[2]));
                            good += 1;
                        }
                    }
                }
                format!("{} good, 0 bad, 0 missed\n", good)
            }
        };

        let mut content = String::new();
        for p in &patterns {
            content.push_str(p);
            content.push('\n');
        }
        fs::write(&request.output_patterns, content)?;

        Ok(PatgenOutput {
            pattern_file: request.output_patterns.clone(),
            log,
        })
    }
}

/// Wordlist, translation table and parameter file in a scratch directory.
pub struct Fixture {
    pub dir: TempDir,
    pub wordlist: PathBuf,
    pub translate: PathBuf,
    pub params: PathBuf,
}

impl Fixture {
    pub fn new(words: &[&str], params: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let wordlist = dir.path().join("words.wlh");
        let translate = dir.path().join("words.tra");
        let params_path = dir.path().join("params.in");

        fs::write(&wordlist, words.join("\n") + "\n").unwrap();
        let mut letters: BTreeSet<char> = BTreeSet::new();
        for w in words {
            letters.extend(w.chars().filter(|&c| c != '-').flat_map(char::to_lowercase));
        }
        let mut table = String::from(" 1 1  -\n");
        for c in letters {
            table.push_str(&format!(" {} {}\n", c, c.to_uppercase()));
        }
        fs::write(&translate, table).unwrap();
        fs::write(&params_path, params).unwrap();

        Self {
            dir,
            wordlist,
            translate,
            params: params_path,
        }
    }

    pub fn out_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn scorer(&self, behaviour: Behaviour) -> (Scorer, Calls) {
        let (fake, calls) = FakePatgen::new(behaviour);
        let scorer = Scorer::new(Box::new(fake), &self.wordlist, &self.translate).unwrap();
        (scorer, calls)
    }
}

/// `count` words that all break between `b` and `c`.
pub fn bc_words(count: usize) -> Vec<String> {
    let heads = ["ab", "xb", "ob", "ub", "eb"];
    let tails = ["cd", "ce", "cy", "co", "ca"];
    (0..count)
        .map(|i| format!("{}-{}", heads[i % heads.len()], tails[(i / heads.len()) % tails.len()]))
        .collect()
}
