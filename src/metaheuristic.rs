use crate::config::MetaheuristicKind;
use crate::error::TunerResult;
use crate::sampler::Sampler;
use crate::scorer::Scorer;
use crate::setting::{CanonicalKey, Param, RunId, Setting, ROOT_RUN};
use crate::stats::LearningInfo;
use std::collections::{BTreeSet, HashSet};
use strum::IntoEnumIterator;
use tracing::debug;

/// Everything a metaheuristic works on: the scorer, the sampler and the
/// current population.
pub struct SearchState {
    pub scorer: Scorer,
    pub sampler: Box<dyn Sampler>,
    pub population: Vec<Setting>,
    pub population_size: usize,
    pub history: LearningInfo,
}

impl SearchState {
    pub fn new(scorer: Scorer, sampler: Box<dyn Sampler>, population_size: usize) -> Self {
        Self {
            scorer,
            sampler,
            population: Vec::new(),
            population_size: population_size.max(1),
            history: LearningInfo::default(),
        }
    }

    /// Run ids held by the population, or the root run when it is empty.
    pub fn active_ids(&self) -> BTreeSet<RunId> {
        if self.population.is_empty() {
            return BTreeSet::from([ROOT_RUN]);
        }
        self.population.iter().filter_map(|s| s.run_id).collect()
    }

    pub fn reset(&mut self) -> TunerResult<()> {
        self.scorer.reset()?;
        self.sampler.reset();
        self.history.reset();
        self.population.clear();
        Ok(())
    }
}

/// Drives one level of pattern generation to a stable population.
pub trait Metaheuristic {
    fn state(&self) -> &SearchState;

    fn state_mut(&mut self) -> &mut SearchState;

    /// Replaces the population with a better one. Returns `false` once no
    /// improvement is possible.
    fn new_population(&mut self) -> TunerResult<bool>;

    /// Hook run before the first `new_population` of a level.
    fn begin_level(&mut self) {}

    /// Iterates to convergence, then drops every artifact and cache entry
    /// the final population does not use.
    fn run_level(&mut self) -> TunerResult<()> {
        self.begin_level();
        let mut passes = 0;
        while self.new_population()? {
            passes += 1;
        }
        let state = self.state_mut();
        let ids = state.active_ids();
        state.scorer.clean_unused(&ids)?;
        state.scorer.clear_cache();
        debug!("Level settled after {} improving passes", passes);
        Ok(())
    }

    fn reset(&mut self) -> TunerResult<()> {
        self.state_mut().reset()
    }
}

/// Keeps whatever population it is given.
pub struct NoMetaheuristic {
    state: SearchState,
}

impl NoMetaheuristic {
    pub fn new(scorer: Scorer, sampler: Box<dyn Sampler>, population_size: usize) -> Self {
        Self {
            state: SearchState::new(scorer, sampler, population_size),
        }
    }
}

impl Metaheuristic for NoMetaheuristic {
    fn state(&self) -> &SearchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SearchState {
        &mut self.state
    }

    fn new_population(&mut self) -> TunerResult<bool> {
        Ok(false)
    }
}

/// Moves every member to its best neighbour, one parameter step at a time.
pub struct HillClimbing {
    state: SearchState,
    visited: HashSet<CanonicalKey>,
}

impl HillClimbing {
    pub fn new(scorer: Scorer, sampler: Box<dyn Sampler>, population_size: usize) -> Self {
        Self {
            state: SearchState::new(scorer, sampler, population_size),
            visited: HashSet::new(),
        }
    }

    /// Settings that differ from `setting` by one in exactly one tunable
    /// parameter, stay in bounds, and were not seen earlier this level.
    pub fn neighbours(&mut self, setting: &Setting) -> Vec<Setting> {
        let mut found = Vec::new();
        for param in Param::iter() {
            let value = setting.get(param);
            for candidate in [value.checked_add(1), value.checked_sub(1)]
                .into_iter()
                .flatten()
            {
                if !self.state.sampler.is_ok_value(setting, param, candidate) {
                    continue;
                }
                let neighbour = setting.copy().with_param(param, candidate);
                if !self.visited.insert(neighbour.canonical_key()) {
                    continue;
                }
                found.push(neighbour);
            }
        }
        found
    }

    pub fn visited(&self) -> &HashSet<CanonicalKey> {
        &self.visited
    }
}

impl Metaheuristic for HillClimbing {
    fn state(&self) -> &SearchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SearchState {
        &mut self.state
    }

    fn begin_level(&mut self) {
        self.visited.clear();
    }

    fn new_population(&mut self) -> TunerResult<bool> {
        let mut climbed = false;

        for i in 0..self.state.population.len() {
            if !self.state.population[i].is_scored() {
                self.state.scorer.score(&mut self.state.population[i])?;
            }

            // Every neighbour is judged against the member as it was before
            // this pass, even after the slot has been overwritten.
            let incumbent = self.state.population[i].clone();
            let patterns_old = incumbent.n_patterns.unwrap_or(usize::MAX);
            let accuracy_old = (incumbent.precision(), incumbent.recall());
            let mut patterns_best = patterns_old;

            for mut n in self.neighbours(&incumbent) {
                let score = self.state.scorer.score(&mut n)?;
                if score.n_patterns < patterns_old
                    && (score.precision, score.recall) > accuracy_old
                    && score.n_patterns < patterns_best
                {
                    debug!(
                        "Climbed {} -> {} patterns via run {:?}",
                        patterns_best, score.n_patterns, n.run_id
                    );
                    patterns_best = score.n_patterns;
                    self.state.population[i] = n;
                    climbed = true;
                }
            }
        }

        Ok(climbed)
    }

    fn reset(&mut self) -> TunerResult<()> {
        self.visited.clear();
        self.state.reset()
    }
}

pub fn build_metaheuristic(
    kind: MetaheuristicKind,
    scorer: Scorer,
    sampler: Box<dyn Sampler>,
    population_size: usize,
) -> Box<dyn Metaheuristic> {
    match kind {
        MetaheuristicKind::HillClimbing => {
            Box::new(HillClimbing::new(scorer, sampler, population_size))
        }
        MetaheuristicKind::NoOp => {
            Box::new(NoMetaheuristic::new(scorer, sampler, population_size))
        }
    }
}
