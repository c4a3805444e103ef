use crate::config::{CombinerKind, PATGEN_MAX_LEVELS};
use crate::error::{TunerError, TunerResult};
use crate::metaheuristic::Metaheuristic;
use crate::setting::{rank, Setting};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Carries populations across levels and emits the final pattern file.
pub trait Combiner {
    fn meta(&self) -> &dyn Metaheuristic;

    fn meta_mut(&mut self) -> &mut dyn Metaheuristic;

    /// Last level that was run.
    fn level(&self) -> u32;

    /// Runs every level and returns the path of the winning pattern file,
    /// written to `out_dir` under `name` or `<timestamp>-<run_id>.pat`.
    fn run(&mut self, out_dir: &Path, name: Option<&str>) -> TunerResult<PathBuf>;

    fn reset(&mut self) -> TunerResult<()>;

    /// The surviving setting with the fewest patterns, ties broken by
    /// precision and then recall.
    fn best(&self) -> Option<&Setting> {
        self.meta().state().population.iter().min_by(|a, b| rank(a, b))
    }

    /// Moves the best run's patterns out of the workspace and releases the
    /// remaining temporaries.
    fn final_patterns(&mut self, out_dir: &Path, name: Option<&str>) -> TunerResult<PathBuf> {
        let best = self.best().cloned().ok_or(TunerError::EmptyPopulation)?;
        let scorer = &mut self.meta_mut().state_mut().scorer;
        let path = scorer.finalize(&best, out_dir, name)?;
        scorer.release()?;
        Ok(path)
    }
}

fn log_population(level: u32, population: &[Setting]) {
    info!("Population selected after level {}:", level);
    for s in population {
        info!("    {}", s);
    }
}

/// One fresh sample per level, chained onto the single previous survivor.
/// Stops when the sampler runs dry.
pub struct SimpleCombiner {
    meta: Box<dyn Metaheuristic>,
    level: u32,
}

impl SimpleCombiner {
    pub fn new(meta: Box<dyn Metaheuristic>) -> Self {
        Self { meta, level: 0 }
    }
}

impl Combiner for SimpleCombiner {
    fn meta(&self) -> &dyn Metaheuristic {
        self.meta.as_ref()
    }

    fn meta_mut(&mut self) -> &mut dyn Metaheuristic {
        self.meta.as_mut()
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn run(&mut self, out_dir: &Path, name: Option<&str>) -> TunerResult<PathBuf> {
        loop {
            if self.level == PATGEN_MAX_LEVELS {
                warn!("Stopping at patgen's level limit {}", PATGEN_MAX_LEVELS);
                break;
            }
            let Some(sample) = self.meta.state_mut().sampler.sample()? else {
                break;
            };
            self.level += 1;
            info!("Running metaheuristic on level {}", self.level);

            let state = self.meta.state_mut();
            let prev = state.active_ids().into_iter().next_back().unwrap_or_default();
            let mut candidate = sample.copy().with_level(self.level).with_prev(prev);
            state.scorer.score(&mut candidate)?;
            state.population = vec![candidate];

            self.meta.run_level()?;

            let state = self.meta.state_mut();
            log_population(self.level, &state.population);
            state.history.record(&state.population);
        }
        self.final_patterns(out_dir, name)
    }

    fn reset(&mut self) -> TunerResult<()> {
        self.meta.reset()?;
        self.level = 0;
        Ok(())
    }
}

/// Every fresh sample is tried on top of every survivor of the previous
/// level; the best `population_size` combinations go on.
pub struct AllWithAllCombiner {
    meta: Box<dyn Metaheuristic>,
    n_levels: u32,
    level: u32,
}

impl AllWithAllCombiner {
    pub fn new(meta: Box<dyn Metaheuristic>, n_levels: u32) -> Self {
        Self {
            meta,
            n_levels: n_levels.min(PATGEN_MAX_LEVELS),
            level: 0,
        }
    }
}

impl Combiner for AllWithAllCombiner {
    fn meta(&self) -> &dyn Metaheuristic {
        self.meta.as_ref()
    }

    fn meta_mut(&mut self) -> &mut dyn Metaheuristic {
        self.meta.as_mut()
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn run(&mut self, out_dir: &Path, name: Option<&str>) -> TunerResult<PathBuf> {
        while self.level < self.n_levels {
            let state = self.meta.state_mut();
            let fresh = state.sampler.sample_n(state.population_size)?;
            if fresh.is_empty() {
                warn!("Sampler exhausted before level {}", self.level + 1);
                break;
            }
            self.level += 1;
            info!("Running metaheuristic on level {}", self.level);

            let mut candidates = Vec::new();
            for prev in state.active_ids() {
                for f in &fresh {
                    let mut candidate = f.copy().with_level(self.level).with_prev(prev);
                    state.scorer.score(&mut candidate)?;
                    candidates.push(candidate);
                }
            }
            candidates.sort_by(rank);
            candidates.truncate(state.population_size);
            state.population = candidates;

            self.meta.run_level()?;

            let state = self.meta.state_mut();
            log_population(self.level, &state.population);
            state.history.record(&state.population);
        }
        self.final_patterns(out_dir, name)
    }

    fn reset(&mut self) -> TunerResult<()> {
        self.meta.reset()?;
        self.level = 0;
        Ok(())
    }
}

pub fn build_combiner(
    kind: CombinerKind,
    meta: Box<dyn Metaheuristic>,
    n_levels: u32,
) -> Box<dyn Combiner> {
    match kind {
        CombinerKind::Simple => Box::new(SimpleCombiner::new(meta)),
        CombinerKind::AllWithAll => Box::new(AllWithAllCombiner::new(meta, n_levels)),
    }
}
