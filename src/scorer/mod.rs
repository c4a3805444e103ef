pub mod workspace;

use self::workspace::{Artifact, Workspace};
use crate::error::{TunerError, TunerResult};
use crate::patgen::{count_patterns, parse_accuracy, PatgenRequest, PatternGenerator};
use crate::setting::{CanonicalKey, RunId, Setting, Stats};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of scoring one setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub n_patterns: usize,
    pub precision: f64,
    pub recall: f64,
}

#[derive(Debug, Clone)]
struct CachedRun {
    run_id: RunId,
    n_patterns: usize,
    stats: Stats,
    timestamp: String,
}

/// Turns settings into patgen runs and memoizes them by canonical key.
///
/// A cache hit does not reserve a new run id: the setting adopts the id and
/// timestamp of the run that produced the cached patterns, so its id always
/// names a pattern file that exists in the workspace.
pub struct Scorer {
    generator: Box<dyn PatternGenerator>,
    wordlist: PathBuf,
    translate: PathBuf,
    workspace: Workspace,
    max_id: RunId,
    invocations: usize,
    cache: HashMap<CanonicalKey, CachedRun>,
}

impl Scorer {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        generator: Box<dyn PatternGenerator>,
        wordlist: P,
        translate: Q,
    ) -> TunerResult<Self> {
        let translate = translate.as_ref().to_path_buf();
        if !translate.is_file() {
            return Err(TunerError::Config(format!(
                "Translation table not found: {}",
                translate.display()
            )));
        }
        Ok(Self {
            generator,
            wordlist: wordlist.as_ref().to_path_buf(),
            translate,
            workspace: Workspace::create()?,
            max_id: 0,
            invocations: 0,
            cache: HashMap::new(),
        })
    }

    pub fn score(&mut self, setting: &mut Setting) -> TunerResult<Score> {
        let key = setting.canonical_key();
        if let Some(hit) = self.cache.get(&key) {
            setting.run_id = Some(hit.run_id);
            setting.stats = Some(hit.stats);
            setting.n_patterns = Some(hit.n_patterns);
            setting.timestamp = Some(hit.timestamp.clone());
            debug!("Cache hit (run {}): {}", hit.run_id, setting);
            return Ok(Self::score_of(setting, hit.n_patterns));
        }

        if !self.wordlist.is_file() {
            return Err(TunerError::Config(format!(
                "Wordlist not found: {}",
                self.wordlist.display()
            )));
        }
        let input_patterns = self.workspace.artifact(setting.prev, Artifact::Patterns);
        if !input_patterns.is_file() {
            return Err(TunerError::Config(format!(
                "Predecessor run {} has no pattern file",
                setting.prev
            )));
        }

        self.max_id += 1;
        let run_id = self.max_id;
        let request = PatgenRequest::for_setting(
            run_id,
            setting,
            &self.wordlist,
            input_patterns,
            self.workspace.artifact(run_id, Artifact::Patterns),
            &self.translate,
        );
        fs::write(
            self.workspace.artifact(run_id, Artifact::Parameters),
            request.parameter_block(),
        )?;

        let output = self.generator.invoke(&request)?;
        self.invocations += 1;
        fs::write(self.workspace.artifact(run_id, Artifact::Log), &output.log)?;

        let stats = parse_accuracy(&output.log).ok_or_else(|| TunerError::Generator {
            run_id,
            reason: "log has no '<tp> good, <fp> bad, <fn> missed' line".to_string(),
        })?;
        let n_patterns = count_patterns(&output.pattern_file)?;
        let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();

        self.cache.insert(
            key,
            CachedRun {
                run_id,
                n_patterns,
                stats,
                timestamp: timestamp.clone(),
            },
        );

        setting.run_id = Some(run_id);
        setting.stats = Some(stats);
        setting.n_patterns = Some(n_patterns);
        setting.timestamp = Some(timestamp);
        debug!("Scored {}", setting);

        Ok(Self::score_of(setting, n_patterns))
    }

    fn score_of(setting: &Setting, n_patterns: usize) -> Score {
        Score {
            n_patterns,
            precision: setting.precision(),
            recall: setting.recall(),
        }
    }

    /// Removes the artifacts of every run not in `active` (the root run is
    /// never removed) and forgets cache entries that pointed at them.
    pub fn clean_unused(&mut self, active: &BTreeSet<RunId>) -> TunerResult<usize> {
        let removed = self.workspace.remove_except(active)?;
        self.cache.retain(|_, run| active.contains(&run.run_id));
        debug!("Removed {} artifacts, kept runs {:?}", removed, active);
        Ok(removed)
    }

    /// Pattern counts from different levels are not comparable, so this must
    /// run at every level boundary.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Fresh workspace and empty cache for an independent run. Run ids keep
    /// increasing so that ids stay unique for the scorer's lifetime.
    pub fn reset(&mut self) -> TunerResult<()> {
        self.workspace = Workspace::create()?;
        self.clear_cache();
        Ok(())
    }

    /// Moves the patterns of `best` out of the workspace into `out_dir`, named
    /// `<timestamp>-<run_id>.pat` unless `name` is given.
    pub fn finalize(
        &mut self,
        best: &Setting,
        out_dir: &Path,
        name: Option<&str>,
    ) -> TunerResult<PathBuf> {
        let run_id = best.run_id.ok_or_else(|| {
            TunerError::Config("Cannot finalize a setting that was never scored".to_string())
        })?;
        let file_name = match name {
            Some(n) => n.to_string(),
            None => format!(
                "{}-{}.pat",
                best.timestamp.as_deref().unwrap_or("unscored"),
                run_id
            ),
        };
        let dest = out_dir.join(file_name);
        self.workspace.move_patterns(run_id, &dest)?;
        info!("Final patterns of run {} written to {}", run_id, dest.display());
        Ok(dest)
    }

    /// Drops every remaining temporary except the root pattern file.
    pub fn release(&mut self) -> TunerResult<()> {
        self.clean_unused(&BTreeSet::new())?;
        self.clear_cache();
        Ok(())
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Number of times the external generator actually ran.
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    pub fn max_id(&self) -> RunId {
        self.max_id
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn wordlist(&self) -> &Path {
        &self.wordlist
    }

    pub fn translate(&self) -> &Path {
        &self.translate
    }

    /// Points the scorer at another wordlist and returns the previous one.
    pub fn set_wordlist(&mut self, wordlist: PathBuf) -> PathBuf {
        std::mem::replace(&mut self.wordlist, wordlist)
    }
}
